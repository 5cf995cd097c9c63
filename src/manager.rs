use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use url::Url;

use crate::models::{PriceSample, Product};
use crate::scraper::ProductScraper;
use crate::storage::Storage;

/// Catalog management surface consumed by presentation layers (CLI here,
/// an HTTP API or chat bot elsewhere). Enrollment performs one full-info
/// scrape to seed product metadata; monitoring itself is driven separately.
pub struct PriceManager {
    storage: Arc<dyn Storage>,
    scraper: Arc<ProductScraper>,
}

impl PriceManager {
    pub fn new(storage: Arc<dyn Storage>, scraper: Arc<ProductScraper>) -> Self {
        Self { storage, scraper }
    }

    /// Start tracking a product. The page is scraped once for name,
    /// description and rating; scrape failures leave those fields empty but
    /// do not block enrollment.
    pub async fn enroll(&self, link: &str, name: Option<String>) -> Result<Product> {
        Url::parse(link).context("invalid product link")?;

        if self.storage.find_product_by_link(link).await?.is_some() {
            bail!("product with this link is already tracked");
        }

        let info = self.scraper.fetch_full_info(link).await;
        if info.is_empty() {
            warn!(link, "no product info obtained during enrollment");
        }

        let product = self
            .storage
            .insert_product(link, name.or(info.name), info.description, info.rating)
            .await?;

        info!(id = product.id, name = ?product.name, "product enrolled");
        Ok(product)
    }

    /// Stop tracking a product and drop its accumulated samples.
    pub async fn remove(&self, product_id: i64) -> Result<()> {
        if !self.storage.delete_product(product_id).await? {
            bail!("product not found: {product_id}");
        }
        info!(id = product_id, "product removed");
        Ok(())
    }

    pub async fn products(&self) -> Result<Vec<Product>> {
        self.storage.list_products().await
    }

    /// Sample history for one product, newest first.
    pub async fn history(&self, product_id: i64) -> Result<Vec<PriceSample>> {
        if self.storage.get_product(product_id).await?.is_none() {
            bail!("product not found: {product_id}");
        }
        self.storage.price_history(product_id).await
    }

    pub async fn latest_price(&self, product_id: i64) -> Result<Option<f64>> {
        self.storage.latest_price(product_id).await
    }
}
