use anyhow::Result;
use chrono::Local;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, warn};

mod browser;
mod config;
mod error;
mod extract;
mod models;
mod navigate;
mod parsers;
mod rates;
mod scrapers;
mod screenshots;
mod session;
mod storage;

use crate::browser::{BrowserEngine, ChromeEngine};
use crate::config::Config;
use crate::models::{Country, PriceRecord, ScrapeResult};
use crate::rates::{DolarRateClient, DollarRates};
use crate::scrapers::{AdidasScraper, NikeScraper, PriceScraper};
use crate::storage::{SqliteStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("price_monitor=info".parse()?),
        )
        .init();

    info!("Starting price monitor");

    // Load configuration
    let config = Arc::new(Config::load()?);

    // Initialize storage
    let storage = Arc::new(SqliteStorage::new(&config.database_path).await?);
    storage.migrate().await?;

    // HTTP client for the rate API
    let http = reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36")
        .timeout(Duration::from_secs(25))
        .build()?;

    let rate_client = DolarRateClient::new(config.rates_base_url.clone());
    let engine = ChromeEngine::new();

    let scrapers: Vec<Box<dyn PriceScraper>> = vec![
        Box::new(NikeScraper::new(&config)),
        Box::new(AdidasScraper::new(&config)),
    ];

    match config.check_interval_seconds {
        Some(seconds) => {
            let mut ticker = interval(Duration::from_secs(seconds));
            loop {
                ticker.tick().await;
                info!(
                    "--- Starting check cycle at {} ---",
                    Local::now().format("%Y-%m-%d %H:%M:%S")
                );
                run_cycle(&engine, &scrapers, &http, &rate_client, storage.as_ref()).await;
                info!("Check cycle completed, waiting {} seconds", seconds);
            }
        }
        None => {
            run_cycle(&engine, &scrapers, &http, &rate_client, storage.as_ref()).await;
            info!("Price scraping completed");
        }
    }

    Ok(())
}

/// One full cycle: fan out the brand scrapers, join, enrich with dollar
/// rates and hand everything to persistence. Each scraper fails
/// independently.
async fn run_cycle(
    engine: &dyn BrowserEngine,
    scrapers: &[Box<dyn PriceScraper>],
    http: &reqwest::Client,
    rate_client: &DolarRateClient,
    storage: &dyn Storage,
) {
    let scraping_futures = scrapers.iter().map(|scraper| async move {
        let product_key = scraper.default_product();
        info!("Processing brand: {}", scraper.brand());
        match scraper.scrape(engine, product_key).await {
            Ok(result) => Some(result),
            Err(e) => {
                error!("{} scraper error: {}", scraper.brand(), e);
                None
            }
        }
    });

    let results: Vec<ScrapeResult> = join_all(scraping_futures)
        .await
        .into_iter()
        .flatten()
        .collect();

    let rates = resolve_rates(http, rate_client, storage).await;

    for result in &results {
        if !result.has_any_price() {
            warn!("No price recovered for {} in any country", result.product_key);
            continue;
        }
        record_result(result, &rates, storage).await;
    }
}

/// Fresh rates when the API answers, the latest persisted rates otherwise.
async fn resolve_rates(
    http: &reqwest::Client,
    rate_client: &DolarRateClient,
    storage: &dyn Storage,
) -> DollarRates {
    match rate_client.current_rates(http).await {
        Ok(rates) => {
            if let Some(blue) = rates.blue {
                if let Err(e) = storage.insert_rate("blue", blue).await {
                    error!("Failed to persist blue rate: {}", e);
                }
            }
            if let Some(oficial) = rates.oficial {
                if let Err(e) = storage.insert_rate("oficial", oficial).await {
                    error!("Failed to persist oficial rate: {}", e);
                }
            }
            rates
        }
        Err(e) => {
            error!("Dollar rate lookup failed, falling back to storage: {}", e);
            DollarRates {
                blue: storage.latest_rate("blue").await.unwrap_or(None),
                oficial: storage.latest_rate("oficial").await.unwrap_or(None),
            }
        }
    }
}

fn product_display_name(product_key: &str) -> &str {
    match product_key {
        "air_force_1" => "Nike Air Force 1",
        "argentina_jersey" => "Argentina Anniversary Jersey",
        other => other,
    }
}

async fn record_result(result: &ScrapeResult, rates: &DollarRates, storage: &dyn Storage) {
    let product_name = product_display_name(&result.product_key);

    match (result.ar_price, &result.ar_url) {
        (Some(price), Some(url)) => {
            let value_usd_blue = rates.blue.map(|rate| price / rate);
            if let Some(usd) = value_usd_blue {
                info!("{} AR price in USD blue: ${:.2}", product_name, usd);
            }
            if let Some(rate) = rates.oficial {
                info!(
                    "{} AR price in USD oficial: ${:.2}",
                    product_name,
                    price / rate
                );
            }
            persist(
                storage,
                PriceRecord {
                    product_name: product_name.to_string(),
                    country: Country::Ar,
                    value: price,
                    currency: "ARS".to_string(),
                    value_usd_blue,
                    source_type: "scraping".to_string(),
                    description: format!("Scraped from {}", url),
                },
            )
            .await;
        }
        (None, Some(url)) => {
            error!(
                "Price unknown for {} on the Argentina site: {}",
                product_name, url
            );
        }
        _ => {}
    }

    match (result.us_price, &result.us_url) {
        (Some(price), Some(url)) => {
            if let (Some(ar_price), Some(blue)) = (result.ar_price, rates.blue) {
                let ratio = (price / (ar_price / blue)) * 100.0;
                info!(
                    "{} price comparison: US is {:.2}% of AR price (blue dollar)",
                    product_name, ratio
                );
            }
            persist(
                storage,
                PriceRecord {
                    product_name: product_name.to_string(),
                    country: Country::Us,
                    value: price,
                    currency: "USD".to_string(),
                    value_usd_blue: None,
                    source_type: "scraping".to_string(),
                    description: format!("Scraped from {}", url),
                },
            )
            .await;
        }
        (None, Some(url)) => {
            error!("Price unknown for {} on the US site: {}", product_name, url);
        }
        _ => {}
    }
}

async fn persist(storage: &dyn Storage, record: PriceRecord) {
    if let Err(e) = storage.insert_price(&record).await {
        error!(
            "Failed to persist {} {} price: {}",
            record.product_name, record.country, e
        );
    }
}
