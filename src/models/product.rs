use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Country;

/// Immutable configuration of one product: a stable key plus the storefront
/// URL for each country it is tracked in.
#[derive(Debug, Clone)]
pub struct ProductTarget {
    pub key: String,
    pub display_name: String,
    pub urls: HashMap<Country, String>,
}

impl ProductTarget {
    pub fn new(key: &str, display_name: &str, urls: &[(Country, &str)]) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            urls: urls
                .iter()
                .map(|(country, url)| (*country, url.to_string()))
                .collect(),
        }
    }

    pub fn url(&self, country: Country) -> Option<&str> {
        self.urls.get(&country).map(String::as_str)
    }
}

/// Outcome of one scrape invocation. A missing price is "unknown", which is
/// a distinct state from zero and never defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub product_key: String,
    pub ar_price: Option<f64>,
    pub us_price: Option<f64>,
    pub ar_url: Option<String>,
    pub us_url: Option<String>,
}

impl ScrapeResult {
    pub fn new(product_key: &str) -> Self {
        Self {
            product_key: product_key.to_string(),
            ar_price: None,
            us_price: None,
            ar_url: None,
            us_url: None,
        }
    }

    pub fn record(&mut self, country: Country, url: &str, price: Option<f64>) {
        match country {
            Country::Ar => {
                self.ar_url = Some(url.to_string());
                self.ar_price = price;
            }
            Country::Us => {
                self.us_url = Some(url.to_string());
                self.us_price = price;
            }
            // Only AR/US storefronts are tracked today.
            _ => {}
        }
    }

    pub fn has_any_price(&self) -> bool {
        self.ar_price.is_some() || self.us_price.is_some()
    }
}

/// One strategy tried during extraction: which selector or recipe, what raw
/// text it produced, and what that parsed to. Diagnostics only.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub strategy: String,
    pub raw_text: Option<String>,
    pub value: Option<f64>,
}

/// Row handed to the persistence collaborator once a price is known.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub product_name: String,
    pub country: Country,
    pub value: f64,
    pub currency: String,
    pub value_usd_blue: Option<f64>,
    pub source_type: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_result_keeps_known_price() {
        let mut result = ScrapeResult::new("air_force_1");
        result.record(Country::Ar, "https://example.com.ar/p", Some(54999.0));
        result.record(Country::Us, "https://example.com/p", None);

        assert_eq!(result.ar_price, Some(54999.0));
        assert_eq!(result.us_price, None);
        assert!(result.has_any_price());
    }

    #[test]
    fn target_lookup_by_country() {
        let target = ProductTarget::new(
            "argentina_jersey",
            "Argentina Anniversary Jersey",
            &[(Country::Ar, "https://ar.example/p"), (Country::Us, "https://us.example/p")],
        );
        assert_eq!(target.url(Country::Ar), Some("https://ar.example/p"));
        assert_eq!(target.url(Country::Cl), None);
    }
}
