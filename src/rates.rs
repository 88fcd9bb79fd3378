use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{error, info};

/// One quote from the dolarapi.com `/v1/dolares` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct DolarQuote {
    pub casa: String,
    pub nombre: String,
    pub compra: Option<f64>,
    pub venta: Option<f64>,
}

/// The two sell rates downstream reporting cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DollarRates {
    pub blue: Option<f64>,
    pub oficial: Option<f64>,
}

#[derive(Debug, Clone, Default)]
struct RateCache {
    rates: Option<DollarRates>,
    last_updated: Option<DateTime<Utc>>,
}

/// ARS/USD rate lookup with a one-hour cache. A failed fetch falls back to
/// the stale cache before surfacing an error.
pub struct DolarRateClient {
    base_url: String,
    cache: Mutex<RateCache>,
}

impl DolarRateClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            cache: Mutex::new(RateCache::default()),
        }
    }

    pub async fn current_rates(&self, client: &Client) -> Result<DollarRates> {
        let mut cache = self.cache.lock().await;

        if let (Some(rates), Some(last_updated)) = (cache.rates, cache.last_updated) {
            if Utc::now() - last_updated < Duration::hours(1) {
                info!("Using cached dollar rates: {:?}", rates);
                return Ok(rates);
            }
        }

        info!("Fetching fresh dollar rates");
        match self.fetch(client).await {
            Ok(rates) => {
                cache.rates = Some(rates);
                cache.last_updated = Some(Utc::now());
                Ok(rates)
            }
            Err(e) => {
                error!("Failed to fetch dollar rates: {}", e);
                if let Some(rates) = cache.rates {
                    info!("Using stale cached rates: {:?}", rates);
                    Ok(rates)
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn fetch(&self, client: &Client) -> Result<DollarRates> {
        let url = format!("{}/v1/dolares", self.base_url);
        let response = client
            .get(&url)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Rate API returned HTTP {}", response.status());
        }

        let quotes: Vec<DolarQuote> = response
            .json()
            .await
            .context("Failed to parse rate API response")?;

        let mut rates = DollarRates::default();
        for quote in quotes {
            match quote.casa.as_str() {
                "blue" => rates.blue = quote.venta,
                "oficial" => rates.oficial = quote.venta,
                _ => {}
            }
        }

        info!(
            "Current dollar rates: blue={:?} oficial={:?}",
            rates.blue, rates.oficial
        );
        Ok(rates)
    }
}
