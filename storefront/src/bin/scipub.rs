//! SciPub storefront demo.
//!
//! Walks the storefront end to end: browse Physics, add a title, check out
//! through the simulated payment gateway, then search the catalog.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin scipub
//! ```
//!
//! Set `ANTHROPIC_API_KEY` to fetch AI insights for the purchased title;
//! `RUST_LOG` or `SCIPUB_LOG` adjusts logging.

use anyhow::Context;
use scipub_core::PublicationId;
use scipub_storefront::{
    Catalog, InsightsStatus, Storefront, StorefrontConfig, StorefrontEnvironment,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = StorefrontConfig::from_env().context("invalid storefront configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let catalog = Catalog::scipub().context("seed catalog is invalid")?;
    let storefront = Storefront::new(catalog, StorefrontEnvironment::live(config));

    println!("=== SciPub Storefront ===\n");

    // Browse
    storefront.set_category("Physics").await?;
    println!("Physics:");
    for publication in storefront.filtered_catalog().await {
        println!(
            "  [{}] {} by {} ({})",
            publication.id, publication.title, publication.author, publication.price
        );
    }

    // Buy
    let quantum = PublicationId::new("1");
    storefront.add_to_cart(&quantum).await?;
    println!("\nCart total: {}", storefront.cart_total().await);
    println!("Processing payment...");
    let receipt = storefront.checkout().await?;
    println!(
        "Paid {} for {} publication(s), confirmation {}",
        receipt.total,
        receipt.publications.len(),
        receipt.confirmation
    );

    println!("\nLibrary:");
    for owned in storefront.library().await {
        println!(
            "  {} (purchased {})",
            owned.publication.title,
            owned.purchased_at.format("%Y-%m-%d %H:%M")
        );
    }

    // Details and insights
    storefront.open_details(&quantum).await?;
    if let Some(action) = storefront.detail_action().await {
        println!("\nDetail action: {action}");
    }
    match storefront.request_insights().await? {
        InsightsStatus::Ready(insights) => {
            println!("Insights: {}", insights.summary);
            for takeaway in &insights.key_takeaways {
                println!("  - {takeaway}");
            }
        }
        InsightsStatus::Failed(error) => println!("Insights unavailable: {error}"),
        InsightsStatus::NotRequested | InsightsStatus::Loading { .. } => {
            println!("Insights still loading");
        }
    }
    storefront.close_details().await?;

    // Search
    storefront.set_category("All").await?;
    storefront.set_search_query("kahneman").await?;
    println!("\nSearch \"kahneman\":");
    for publication in storefront.filtered_catalog().await {
        println!("  [{}] {} by {}", publication.id, publication.title, publication.author);
    }

    storefront.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
