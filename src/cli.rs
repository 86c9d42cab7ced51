//! Command-line interface and command dispatch.

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::AppConfig;
use crate::monitor::Monitor;
use crate::scheduler::PassTicker;

#[derive(Parser, Debug)]
#[command(name = "pricewatch", version, about = "Tracks product prices and alerts on drops")]
pub struct Cli {
    /// Config file path. Defaults and environment overrides apply either way.
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start tracking a product by URL or bare catalog ID
    Add {
        url: String,

        /// Alert as soon as any seller's price is at or below this
        #[arg(long)]
        target_price: Option<f64>,
    },
    /// List tracked products with price statistics
    List,
    /// Run a single monitoring pass now
    Check,
    /// Check on the configured interval until interrupted
    Monitor,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let mut monitor = Monitor::new(&config).await?;

    match cli.command {
        Command::Add { url, target_price } => {
            let product = monitor.add_product(&url, target_price).await?;
            println!(
                "Added product {} ({})",
                product.id,
                product.title.as_deref().unwrap_or("untitled")
            );
        }
        Command::List => {
            let listings = monitor.repository().list_products().await?;
            if listings.is_empty() {
                println!("No tracked products");
                return Ok(());
            }

            println!("Tracked products ({}):", listings.len());
            for listing in listings {
                println!("\n{}", listing.title.as_deref().unwrap_or("untitled"));
                println!(
                    "   id: {} | catalog: {}",
                    listing.id,
                    listing.catalog_id.as_deref().unwrap_or("-")
                );
                match listing.target_price {
                    Some(target) => println!("   target: ${target:.2}"),
                    None => println!("   target: none"),
                }
                match (listing.min_price, listing.max_price) {
                    (Some(min), Some(max)) => println!(
                        "   min: ${min:.2} | max: ${max:.2} | records: {}",
                        listing.price_records
                    ),
                    _ => println!("   no price history yet"),
                }
                match listing.last_checked {
                    Some(at) => println!("   last check: {}", at.format("%Y-%m-%d %H:%M UTC")),
                    None => println!("   last check: never"),
                }
            }
        }
        Command::Check => {
            let summary = monitor.run_pass().await?;
            println!(
                "Checked {} products: {} significant drops, {} failures",
                summary.products_checked, summary.significant_events, summary.failures
            );
        }
        Command::Monitor => {
            let (ticker, handle) = PassTicker::from_hours(config.tracking.check_interval_hours);

            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, stopping after current pass");
                    handle.shutdown();
                }
            });

            ticker.run(&mut monitor).await?;
        }
    }

    Ok(())
}
