use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{PriceSample, Product};

mod sqlite;
pub use sqlite::SqliteStorage;

/// Catalog and price-history persistence. The monitoring loop only needs
/// `list_products` and `append_price_sample`; the remaining operations serve
/// the enrollment/removal/history surface.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn migrate(&self) -> Result<()>;

    async fn list_products(&self) -> Result<Vec<Product>>;
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>>;
    async fn find_product_by_link(&self, link: &str) -> Result<Option<Product>>;
    async fn insert_product(
        &self,
        link: &str,
        name: Option<String>,
        description: Option<String>,
        rating: Option<f64>,
    ) -> Result<Product>;
    /// Removes the product and all of its samples. Returns false when the
    /// product does not exist.
    async fn delete_product(&self, product_id: i64) -> Result<bool>;

    async fn append_price_sample(
        &self,
        product_id: i64,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<PriceSample>;
    /// Samples for one product, newest first.
    async fn price_history(&self, product_id: i64) -> Result<Vec<PriceSample>>;
    async fn latest_price(&self, product_id: i64) -> Result<Option<f64>>;
}
