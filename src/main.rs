use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};

use price_monitor::config::Settings;
use price_monitor::manager::PriceManager;
use price_monitor::monitor::{MonitoringLoop, Scheduler};
use price_monitor::scraper::{PageFetcher, ProductScraper, RetryPolicy};
use price_monitor::storage::{SqliteStorage, Storage};

#[derive(Parser)]
#[command(name = "price-monitor", about = "Track product prices over time")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the periodic monitoring daemon (default)
    Run,
    /// Start tracking a product by its page link
    Add {
        link: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Stop tracking a product and drop its sample history
    Remove { id: i64 },
    /// List tracked products with their latest sampled price
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show a product's price history, newest first
    History {
        id: i64,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("price_monitor=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;

    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(&settings.database_path)?);
    storage.migrate().await?;

    let fetcher = Arc::new(PageFetcher::new(&settings));
    let scraper = Arc::new(ProductScraper::new(
        fetcher.clone(),
        RetryPolicy::from_settings(&settings),
    ));
    let manager = PriceManager::new(storage.clone(), scraper.clone());

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!("Starting Price Monitor");

            let monitor = Arc::new(MonitoringLoop::new(scraper, storage));
            let scheduler = Scheduler::new(Duration::from_secs(settings.check_interval_secs));

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("shutdown signal received");
                        let _ = shutdown_tx.send(true);
                    }
                    Err(e) => error!(error = %e, "failed to listen for shutdown signal"),
                }
            });

            scheduler.run(monitor, shutdown_rx).await;
        }
        Command::Add { link, name } => {
            let product = manager.enroll(&link, name).await?;
            println!(
                "Tracking product {} ({})",
                product.id,
                product.display_name()
            );
        }
        Command::Remove { id } => {
            manager.remove(id).await?;
            println!("Removed product {id} and its price history");
        }
        Command::List { json } => {
            let products = manager.products().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&products)?);
            } else {
                for product in &products {
                    let latest = manager.latest_price(product.id).await?;
                    let price = latest
                        .map(|p| format!("{p} ₽"))
                        .unwrap_or_else(|| "no samples yet".to_string());
                    println!("{:>4}  {}  [{}]", product.id, product.display_name(), price);
                }
            }
        }
        Command::History { id, json } => {
            let history = manager.history(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                for sample in &history {
                    println!("{}  {} ₽", sample.created_at.to_rfc3339(), sample.price);
                }
            }
        }
    }

    fetcher.close();
    Ok(())
}
