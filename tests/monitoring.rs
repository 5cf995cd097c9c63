use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use price_monitor::models::{PriceSample, Product};
use price_monitor::monitor::{MonitorJob, MonitoringLoop};
use price_monitor::scraper::{PageFetcher, ProductScraper, RetryPolicy};
use price_monitor::storage::Storage;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{product_page, test_settings};

/// Storage double that records sample writes and can be told to fail.
#[derive(Default)]
struct RecordingStorage {
    products: Vec<Product>,
    fail_listing: bool,
    fail_append_for: Option<i64>,
    samples: Mutex<Vec<(i64, f64)>>,
}

impl RecordingStorage {
    fn recorded(&self) -> Vec<(i64, f64)> {
        self.samples.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn migrate(&self) -> Result<()> {
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        if self.fail_listing {
            bail!("catalog unavailable");
        }
        Ok(self.products.clone())
    }

    async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        Ok(self.products.iter().find(|p| p.id == product_id).cloned())
    }

    async fn find_product_by_link(&self, link: &str) -> Result<Option<Product>> {
        Ok(self.products.iter().find(|p| p.link == link).cloned())
    }

    async fn insert_product(
        &self,
        _link: &str,
        _name: Option<String>,
        _description: Option<String>,
        _rating: Option<f64>,
    ) -> Result<Product> {
        bail!("read-only test storage");
    }

    async fn delete_product(&self, _product_id: i64) -> Result<bool> {
        Ok(false)
    }

    async fn append_price_sample(
        &self,
        product_id: i64,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<PriceSample> {
        if self.fail_append_for == Some(product_id) {
            bail!("disk full");
        }
        self.samples.lock().unwrap().push((product_id, price));
        Ok(PriceSample {
            id: self.samples.lock().unwrap().len() as i64,
            product_id,
            price,
            created_at: at,
        })
    }

    async fn price_history(&self, _product_id: i64) -> Result<Vec<PriceSample>> {
        Ok(vec![])
    }

    async fn latest_price(&self, _product_id: i64) -> Result<Option<f64>> {
        Ok(None)
    }
}

fn product(id: i64, link: String) -> Product {
    Product {
        id,
        link,
        name: Some(format!("product-{id}")),
        description: None,
        rating: None,
    }
}

fn scraper() -> Arc<ProductScraper> {
    Arc::new(ProductScraper::new(
        Arc::new(PageFetcher::new(&test_settings())),
        RetryPolicy {
            attempts: 3,
            backoff: Duration::ZERO,
        },
    ))
}

async fn mount_page(server: &MockServer, route: &str, title: &str, price: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(product_page(title, price, "4.5", "10 отзывов")),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn one_failing_product_does_not_abort_the_run() {
    let server = MockServer::start().await;
    mount_page(&server, "/p/a", "Товар А", "1 000 ₽").await;
    Mock::given(method("GET"))
        .and(path("/p/b"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/p/c", "Товар В", "3 000 ₽").await;

    let storage = Arc::new(RecordingStorage {
        products: vec![
            product(1, format!("{}/p/a", server.uri())),
            product(2, format!("{}/p/b", server.uri())),
            product(3, format!("{}/p/c", server.uri())),
        ],
        ..Default::default()
    });

    let monitor = MonitoringLoop::new(scraper(), storage.clone());
    monitor.run_once().await;

    assert_eq!(storage.recorded(), vec![(1, 1000.0), (3, 3000.0)]);
}

#[tokio::test]
async fn catalog_listing_failure_aborts_the_run_quietly() {
    let storage = Arc::new(RecordingStorage {
        fail_listing: true,
        ..Default::default()
    });

    let monitor = MonitoringLoop::new(scraper(), storage.clone());
    monitor.run_once().await;

    assert!(storage.recorded().is_empty());
}

#[tokio::test]
async fn sample_write_failure_is_isolated_per_product() {
    let server = MockServer::start().await;
    mount_page(&server, "/p/a", "Товар А", "1 000 ₽").await;
    mount_page(&server, "/p/c", "Товар В", "3 000 ₽").await;

    let storage = Arc::new(RecordingStorage {
        products: vec![
            product(1, format!("{}/p/a", server.uri())),
            product(3, format!("{}/p/c", server.uri())),
        ],
        fail_append_for: Some(1),
        ..Default::default()
    });

    let monitor = MonitoringLoop::new(scraper(), storage.clone());
    monitor.run_once().await;

    assert_eq!(storage.recorded(), vec![(3, 3000.0)]);
}

#[tokio::test]
async fn priceless_products_accumulate_no_samples() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page(
            "Товар без цены",
            "нет в продаже",
            "4.0",
            "2 отзыва",
        )))
        .mount(&server)
        .await;

    let storage = Arc::new(RecordingStorage {
        products: vec![product(1, format!("{}/p/a", server.uri()))],
        ..Default::default()
    });

    let monitor = MonitoringLoop::new(scraper(), storage.clone());
    monitor.run_once().await;

    assert!(storage.recorded().is_empty());
}
