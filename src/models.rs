use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked product. Owned by the catalog; the monitoring core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub link: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
}

impl Product {
    /// Label for logging, falling back to the link when the product was
    /// enrolled without a name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.link)
    }
}

/// One (product, price, timestamp) observation. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub id: i64,
    pub product_id: i64,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

/// Everything a single page fetch may yield. Fields are extracted
/// independently; any subset may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub review_count: Option<u32>,
}

impl ScrapeResult {
    /// An all-absent result counts as a total failure, not partial success.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.rating.is_none()
            && self.price.is_none()
            && self.review_count.is_none()
    }
}
