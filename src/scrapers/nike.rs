use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

use crate::browser::{BrowserEngine, CookieSpec, DomRecipe};
use crate::config::Config;
use crate::error::ScrapeError;
use crate::models::{Brand, Country, ProductTarget, ScrapeResult};
use crate::scrapers::{scrape_product, CountryTarget, PriceScraper};
use crate::screenshots::Screenshots;

// Ordered by observed reliability; the VTEX selector is the one that works
// on the Argentine storefront today.
static AR_SELECTORS: &[&str] = &[
    ".vtex-product-price-1-x-sellingPriceValue",
    ".vtex-product-price-1-x-currencyContainer",
    ".vtex-product-price-1-x-sellingPrice",
    ".product-price",
    ".product-price__wrapper",
    ".price-tag-text",
    ".price",
    ".price-best-price",
    "[data-testid=\"price\"]",
    ".product__price",
];

static US_SELECTORS: &[&str] = &[
    "div#price-container",
    "div.price-container",
    ".product-price",
    ".product-price__wrapper",
    ".css-b9fpep",
    ".css-1eqfhge",
    ".css-xf3ahq",
    "[data-test=\"product-price\"]",
    ".price-container",
    ".price",
];

pub struct NikeScraper {
    targets: HashMap<String, ProductTarget>,
    screenshots: Screenshots,
}

impl NikeScraper {
    pub fn new(config: &Config) -> Self {
        let mut targets = HashMap::new();
        targets.insert(
            "air_force_1".to_string(),
            ProductTarget::new(
                "air_force_1",
                "Nike Air Force 1",
                &[
                    (
                        Country::Ar,
                        "https://www.nike.com.ar/nike-air-force-1--07-cw2288-111/p",
                    ),
                    (
                        Country::Us,
                        "https://www.nike.com/t/air-force-1-07-mens-shoes-5QFp5Z/CW2288-111",
                    ),
                ],
            ),
        );

        Self {
            targets,
            screenshots: Screenshots::from_config(config),
        }
    }

    fn country_target(country: Country, url: String) -> CountryTarget {
        match country {
            Country::Ar => CountryTarget {
                country,
                url,
                selectors: AR_SELECTORS.to_vec(),
                recipes: vec![
                    DomRecipe::QueryText(".vtex-product-price-1-x-sellingPriceValue".to_string()),
                    DomRecipe::CurrencyScan,
                ],
                cookies: vec![CookieSpec::new("accept_cookies", "true", ".nike.com.ar")],
                referer: None,
            },
            _ => CountryTarget {
                country,
                url,
                selectors: US_SELECTORS.to_vec(),
                recipes: vec![
                    DomRecipe::QueryText("#price-container, div.price-container".to_string()),
                    DomRecipe::CurrencyScan,
                ],
                cookies: vec![
                    CookieSpec::new("NIKE_COMMERCE_COUNTRY", "US", ".nike.com"),
                    CookieSpec::new("NIKE_COMMERCE_LANG_LOCALE", "en_US", ".nike.com"),
                ],
                referer: None,
            },
        }
    }
}

#[async_trait]
impl PriceScraper for NikeScraper {
    async fn scrape(
        &self,
        engine: &dyn BrowserEngine,
        product_key: &str,
    ) -> Result<ScrapeResult, ScrapeError> {
        let product = self
            .targets
            .get(product_key)
            .ok_or_else(|| ScrapeError::InvalidInput(product_key.to_string()))?;

        info!("Scraping Nike prices for {}", product.display_name);
        Ok(scrape_product(
            engine,
            Brand::Nike,
            product,
            &[Country::Ar, Country::Us],
            &self.screenshots,
            Self::country_target,
        )
        .await)
    }

    fn brand(&self) -> Brand {
        Brand::Nike
    }

    fn default_product(&self) -> &'static str {
        "air_force_1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{MockEngine, PageScript};
    use pretty_assertions::assert_eq;

    fn test_config() -> Config {
        Config::default()
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_product_key_fails_before_any_network_activity() {
        let engine = MockEngine::new(vec![]);
        let scraper = NikeScraper::new(&test_config());

        let err = scraper.scrape(&engine, "dunk_low").await.unwrap_err();

        assert!(matches!(err, ScrapeError::InvalidInput(ref key) if key == "dunk_low"));
        assert!(err.is_fatal());
        assert_eq!(engine.sessions_started(), 0);
        assert_eq!(engine.goto_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_failure_keeps_sibling_price() {
        // AR page renders a price; the US navigation dies.
        let engine = MockEngine::new(vec![
            PageScript::with_content("<html>ok</html>")
                .with_selector(".vtex-product-price-1-x-sellingPriceValue", "$ 219.999"),
            PageScript::failing_navigation(),
        ]);
        let scraper = NikeScraper::new(&test_config());

        let result = scraper.scrape(&engine, "air_force_1").await.unwrap();

        assert_eq!(result.ar_price, Some(219_999.0));
        assert_eq!(result.us_price, None);
        assert!(result.ar_url.is_some());
        assert!(result.us_url.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn identical_pages_yield_identical_results() {
        let scripts = || {
            vec![
                PageScript::with_content("<html>ok</html>")
                    .with_selector(".vtex-product-price-1-x-sellingPriceValue", "$ 219.999"),
                PageScript::with_content("<html>ok</html>").with_selector("div#price-container", "$115"),
            ]
        };
        let scraper = NikeScraper::new(&test_config());

        let first = scraper
            .scrape(&MockEngine::new(scripts()), "air_force_1")
            .await
            .unwrap();
        let second = scraper
            .scrape(&MockEngine::new(scripts()), "air_force_1")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.ar_price, Some(219_999.0));
        assert_eq!(first.us_price, Some(115.0));
    }
}
