use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

use crate::browser::{BrowserEngine, CookieSpec, DomRecipe};
use crate::config::Config;
use crate::error::ScrapeError;
use crate::models::{Brand, Country, ProductTarget, ScrapeResult};
use crate::scrapers::{scrape_product, CountryTarget, PriceScraper};
use crate::screenshots::Screenshots;

// Both storefronts share the data-testid scheme; the sale-price variants
// come first so discounted prices win over struck-through ones.
static AR_SELECTORS: &[&str] = &[
    "[data-testid=\"main-price\"]",
    "[data-testid=\"product-price\"]",
    "[data-testid=\"price-component\"]",
    "div.gl-price-item--sale",
    ".product-price-container .price",
    ".product-price",
    ".gl-price-item",
    ".gl-price__value",
    "[data-auto-id=\"product-price\"]",
    "[data-auto-id=\"sale-price\"]",
];

static US_SELECTORS: &[&str] = &[
    "[data-testid=\"main-price\"]",
    "[data-testid=\"product-price\"]",
    "[data-testid=\"price-component\"]",
    "div.gl-price-item--sale",
    ".gl-price-item",
    ".gl-price__value",
    "[data-auto-id=\"product-price\"]",
    "[data-auto-id=\"sale-price\"]",
    ".product-price",
];

pub struct AdidasScraper {
    targets: HashMap<String, ProductTarget>,
    screenshots: Screenshots,
}

impl AdidasScraper {
    pub fn new(config: &Config) -> Self {
        let mut targets = HashMap::new();
        targets.insert(
            "argentina_jersey".to_string(),
            ProductTarget::new(
                "argentina_jersey",
                "Argentina Anniversary Jersey",
                &[
                    (
                        Country::Ar,
                        "https://www.adidas.com.ar/camiseta-aniversario-50-anos-seleccion-argentina/JF0395.html",
                    ),
                    (
                        Country::Us,
                        "https://www.adidas.com/us/argentina-anniversary-jersey/JF2641.html",
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
        let recipes = vec![
            DomRecipe::QueryText("[data-testid=\"main-price\"]".to_string()),
            DomRecipe::CurrencyScan,
        ];
        match country {
            Country::Ar => CountryTarget {
                country,
                url,
                selectors: AR_SELECTORS.to_vec(),
                recipes,
                cookies: vec![CookieSpec::new("accept_cookies", "true", ".adidas.com.ar")],
                referer: Some("https://www.adidas.com.ar/ropa-seleccion-argentina".to_string()),
            },
            _ => CountryTarget {
                country,
                url,
                selectors: US_SELECTORS.to_vec(),
                recipes,
                cookies: vec![
                    CookieSpec::new("geo_country", "US", ".adidas.com"),
                    CookieSpec::new("languageLocale", "en_US", ".adidas.com"),
                ],
                referer: Some("https://www.adidas.com/us/soccer-jerseys".to_string()),
            },
        }
    }
}

#[async_trait]
impl PriceScraper for AdidasScraper {
    async fn scrape(
        &self,
        engine: &dyn BrowserEngine,
        product_key: &str,
    ) -> Result<ScrapeResult, ScrapeError> {
        let product = self
            .targets
            .get(product_key)
            .ok_or_else(|| ScrapeError::InvalidInput(product_key.to_string()))?;

        info!("Scraping Adidas prices for {}", product.display_name);
        Ok(scrape_product(
            engine,
            Brand::Adidas,
            product,
            &[Country::Ar, Country::Us],
            &self.screenshots,
            Self::country_target,
        )
        .await)
    }

    fn brand(&self) -> Brand {
        Brand::Adidas
    }

    fn default_product(&self) -> &'static str {
        "argentina_jersey"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{MockEngine, PageScript};
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn unknown_product_key_is_invalid_input() {
        let engine = MockEngine::new(vec![]);
        let scraper = AdidasScraper::new(&Config::default());

        let err = scraper.scrape(&engine, "samba").await.unwrap_err();

        assert!(matches!(err, ScrapeError::InvalidInput(_)));
        assert_eq!(engine.sessions_started(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn recipe_covers_missing_selectors() {
        // Neither storefront exposes a selector; the main-price recipe does.
        let recipe = DomRecipe::QueryText("[data-testid=\"main-price\"]".to_string());
        let engine = MockEngine::new(vec![
            PageScript::with_content("<html>ok</html>").with_recipe(recipe.clone(), "$ 89.999"),
            PageScript::with_content("<html>ok</html>").with_recipe(recipe, "$90"),
        ]);
        let scraper = AdidasScraper::new(&Config::default());

        let result = scraper.scrape(&engine, "argentina_jersey").await.unwrap();

        assert_eq!(result.ar_price, Some(89_999.0));
        assert_eq!(result.us_price, Some(90.0));
    }

    #[test]
    fn referers_are_brand_specific() {
        let target = AdidasScraper::country_target(Country::Ar, "https://x".to_string());
        assert_eq!(
            target.referer.as_deref(),
            Some("https://www.adidas.com.ar/ropa-seleccion-argentina")
        );
    }
}
