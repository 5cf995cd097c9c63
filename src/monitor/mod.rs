use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::models::Product;
use crate::scraper::ProductScraper;
use crate::storage::Storage;

/// Unit of work the scheduler drives. Implementations never return errors;
/// every failure is handled and logged inside the run.
#[async_trait]
pub trait MonitorJob: Send + Sync {
    async fn run_once(&self);
}

/// One monitoring run: list the catalog, then sample each product in turn.
/// Products are visited sequentially, which caps outbound concurrency to the
/// shop at one request at a time.
pub struct MonitoringLoop {
    scraper: Arc<ProductScraper>,
    storage: Arc<dyn Storage>,
}

impl MonitoringLoop {
    pub fn new(scraper: Arc<ProductScraper>, storage: Arc<dyn Storage>) -> Self {
        Self { scraper, storage }
    }

    async fn process_product(&self, product: &Product) {
        let label = product.display_name();
        info!(product = %label, link = %product.link, "sampling product price");

        match self.scraper.fetch_price(&product.link).await {
            Some(price) => {
                match self
                    .storage
                    .append_price_sample(product.id, price, Utc::now())
                    .await
                {
                    Ok(_) => info!(product = %label, price, "price sample recorded"),
                    Err(e) => {
                        error!(product = %label, error = %e, "failed to store price sample")
                    }
                }
            }
            None => warn!(product = %label, "no price obtained this cycle"),
        }
    }
}

#[async_trait]
impl MonitorJob for MonitoringLoop {
    async fn run_once(&self) {
        info!("starting price monitoring run");

        let products = match self.storage.list_products().await {
            Ok(products) => products,
            Err(e) => {
                error!(error = %e, "failed to list tracked products, aborting run");
                return;
            }
        };

        info!("monitoring {} products", products.len());
        for product in &products {
            self.process_product(product).await;
        }

        info!("price monitoring run completed");
    }
}

/// Drives a job on a fixed wall-clock interval, with one immediate run at
/// startup. Runs execute inline on this task, so a new tick can never start
/// a run while the previous one is still in flight; ticks missed by a long
/// run are skipped rather than replayed in a burst.
pub struct Scheduler {
    period: Duration,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub async fn run(&self, job: Arc<dyn MonitorJob>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(period_secs = self.period.as_secs(), "scheduler started");
        loop {
            tokio::select! {
                _ = ticker.tick() => job.run_once().await,
                _ = shutdown.changed() => {
                    info!("scheduler stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingJob {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl MonitorJob for CountingJob {
        async fn run_once(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_runs_immediately_then_on_interval() {
        let job = Arc::new(CountingJob::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn({
            let job = job.clone() as Arc<dyn MonitorJob>;
            async move {
                Scheduler::new(Duration::from_secs(3600))
                    .run(job, shutdown_rx)
                    .await
            }
        });

        // first run fires without waiting for the period
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3600)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 2);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
