use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::browser::{BrowserEngine, CookieSpec, DomRecipe};
use crate::error::ScrapeError;
use crate::models::{Brand, Country, ProductTarget, ScrapeResult};
use crate::navigate::{backoff_for_attempt, navigate, NavigationOutcome, MAX_NAV_ATTEMPTS};
use crate::screenshots::Screenshots;
use crate::session::{build_session, SessionOverrides};

mod adidas;
mod nike;

pub use adidas::AdidasScraper;
pub use nike::NikeScraper;

/// One brand's scraper. Unknown product keys fail hard before any network
/// activity; everything else degrades to unknown prices per country.
#[async_trait]
pub trait PriceScraper: Send + Sync {
    async fn scrape(
        &self,
        engine: &dyn BrowserEngine,
        product_key: &str,
    ) -> Result<ScrapeResult, ScrapeError>;

    fn brand(&self) -> Brand;

    fn default_product(&self) -> &'static str;
}

/// Everything needed to scrape one country storefront: where to go, how the
/// session must look, and the extraction strategies ordered by observed
/// reliability.
pub(crate) struct CountryTarget {
    pub country: Country,
    pub url: String,
    pub selectors: Vec<&'static str>,
    pub recipes: Vec<DomRecipe>,
    pub cookies: Vec<CookieSpec>,
    pub referer: Option<String>,
}

/// Per-country state machine: session built → navigated → retry while
/// challenged → price extracted. The session is closed on every exit path.
pub(crate) async fn scrape_country(
    engine: &dyn BrowserEngine,
    brand: Brand,
    target: &CountryTarget,
    screenshots: &Screenshots,
) -> Result<f64, ScrapeError> {
    let overrides = SessionOverrides {
        cookies: target.cookies.clone(),
        referer: target.referer.clone(),
        user_agent: None,
    };

    for attempt in 1..=MAX_NAV_ATTEMPTS {
        let mut page = build_session(engine, target.country, &overrides, attempt)
            .await
            .map_err(|e| ScrapeError::Session(e.to_string()))?;

        let outcome = navigate(&*page, &target.url, attempt).await;
        match outcome {
            NavigationOutcome::Loaded => {
                screenshots
                    .capture(
                        &*page,
                        &format!("{}_{}", brand.key(), target.country.code().to_lowercase()),
                    )
                    .await;
                let price =
                    crate::extract::extract_price(&*page, &target.selectors, &target.recipes).await;
                close_page(&mut page).await;
                return price.ok_or_else(|| ScrapeError::Extraction {
                    url: target.url.clone(),
                });
            }
            NavigationOutcome::Challenged => {
                close_page(&mut page).await;
                let backoff = backoff_for_attempt(attempt);
                info!(
                    "Rotating session for {} after challenge, retrying in {:?}",
                    target.url, backoff
                );
                tokio::time::sleep(backoff).await;
            }
            NavigationOutcome::ChallengeExhausted => {
                close_page(&mut page).await;
                return Err(ScrapeError::BotChallengeExhausted {
                    url: target.url.clone(),
                    attempts: attempt,
                });
            }
            NavigationOutcome::Failed => {
                close_page(&mut page).await;
                return Err(ScrapeError::Navigation {
                    url: target.url.clone(),
                    reason: "page failed to load".to_string(),
                });
            }
        }
    }

    Err(ScrapeError::BotChallengeExhausted {
        url: target.url.clone(),
        attempts: MAX_NAV_ATTEMPTS,
    })
}

async fn close_page(page: &mut Box<dyn crate::browser::BrowserPage>) {
    if let Err(e) = page.close().await {
        warn!("Error releasing browser session: {}", e);
    }
}

/// Scrape every country of a product target independently; a failure in one
/// country never aborts the sibling. Only the price stays unknown.
pub(crate) async fn scrape_product(
    engine: &dyn BrowserEngine,
    brand: Brand,
    product: &ProductTarget,
    countries: &[Country],
    screenshots: &Screenshots,
    target_for: impl Fn(Country, String) -> CountryTarget,
) -> ScrapeResult {
    let mut result = ScrapeResult::new(&product.key);

    for &country in countries {
        let Some(url) = product.url(country) else {
            warn!("No {} URL configured for {}", country, product.key);
            continue;
        };
        let target = target_for(country, url.to_string());

        match scrape_country(engine, brand, &target, screenshots).await {
            Ok(price) => {
                info!(
                    "{} {} price for {}: {} {}",
                    brand,
                    country,
                    product.key,
                    price,
                    country.currency()
                );
                result.record(country, url, Some(price));
            }
            Err(e) => {
                error!(
                    "Failed to extract {} price for {} (country: {}, url: {}, stage: {}): {}",
                    brand,
                    product.key,
                    country,
                    url,
                    e.stage(),
                    e
                );
                result.record(country, url, None);
            }
        }
    }

    result
}
