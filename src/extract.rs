use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::browser::{BrowserPage, DomRecipe};
use crate::models::ExtractionAttempt;
use crate::parsers::{clean_text, parse_price};

const SELECTOR_WAIT: Duration = Duration::from_secs(3);

// Label-anchored patterns for the raw-markup fallback, in confidence order.
static CONTENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\$\s*(\d+(?:[.,]\d+)*)").expect("Invalid dollar pattern"),
        Regex::new(r"(?i)precio[^\d]+(\d+(?:[.,]\d+)*)").expect("Invalid precio pattern"),
        Regex::new(r"(?i)price[^\d]+(\d+(?:[.,]\d+)*)").expect("Invalid price pattern"),
        Regex::new(r"(?i)valor[^\d]+(\d+(?:[.,]\d+)*)").expect("Invalid valor pattern"),
    ]
});

/// Run the extraction cascade: ordered selectors first, then the site's
/// in-page recipes, finally the raw-markup scan. Returns on the first
/// strategy that parses; lower-confidence stages are never reached after a
/// success.
pub async fn extract_price(
    page: &dyn BrowserPage,
    selectors: &[&str],
    recipes: &[DomRecipe],
) -> Option<f64> {
    let mut attempts: Vec<ExtractionAttempt> = Vec::new();

    for selector in selectors {
        let text = read_selector_text(page, selector).await;
        let value = text.as_deref().map(clean_text).as_deref().and_then(parse_price);
        record(&mut attempts, selector, text, value);
        if let Some(price) = value {
            info!("Extracted price {} with selector {}", price, selector);
            return Some(price);
        }
    }

    for recipe in recipes {
        let text = match page.run_recipe(recipe).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Recipe {} failed: {}", recipe.name(), e);
                None
            }
        };
        let value = text.as_deref().map(clean_text).as_deref().and_then(parse_price);
        record(&mut attempts, &recipe.name(), text, value);
        if let Some(price) = value {
            info!("Extracted price {} via recipe {}", price, recipe.name());
            return Some(price);
        }
    }

    match page.content().await {
        Ok(markup) => {
            if let Some((raw, price)) = scan_markup(&markup) {
                record(&mut attempts, "content-scan", Some(raw), Some(price));
                info!("Extracted price {} from raw page content", price);
                return Some(price);
            }
            if let Some((raw, price)) = scan_rendered_text(&markup) {
                record(&mut attempts, "text-node-scan", Some(raw), Some(price));
                info!("Extracted price {} from rendered text nodes", price);
                return Some(price);
            }
        }
        Err(e) => warn!("Content fallback failed: {}", e),
    }

    warn!(
        "No extraction strategy succeeded after {} attempts",
        attempts.len()
    );
    None
}

/// Immediate lookup, bounded wait plus one retried lookup, then the raw
/// text-content read as a last resort for this selector.
async fn read_selector_text(page: &dyn BrowserPage, selector: &str) -> Option<String> {
    if let Ok(Some(text)) = page.inner_text(selector).await {
        return Some(text);
    }

    match page.wait_for_selector(selector, SELECTOR_WAIT).await {
        Ok(true) => {
            if let Ok(Some(text)) = page.inner_text(selector).await {
                return Some(text);
            }
        }
        Ok(false) => return None,
        Err(e) => {
            warn!("Wait for selector {} failed: {}", selector, e);
            return None;
        }
    }

    page.text_content(selector).await.ok().flatten()
}

/// Label-anchored scan over the raw markup. Separators are stripped rather
/// than disambiguated: at this confidence level the match is treated as an
/// integer amount, matching how the storefronts render grouped prices.
fn scan_markup(markup: &str) -> Option<(String, f64)> {
    for pattern in CONTENT_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(markup) {
            let raw = captures.get(1)?.as_str();
            let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
            if !digits.is_empty() {
                if let Ok(value) = digits.parse::<f64>() {
                    return Some((raw.to_string(), value));
                }
            }
        }
    }
    None
}

/// Lowest-confidence stage: parse the rendered document and look for a
/// short text node carrying a currency symbol.
fn scan_rendered_text(markup: &str) -> Option<(String, f64)> {
    let document = Html::parse_document(markup);
    for node in document.root_element().text() {
        let text = node.trim();
        if text.len() < 20 && text.contains('$') {
            if let Some(value) = parse_price(text) {
                return Some((text.to_string(), value));
            }
        }
    }
    None
}

fn record(
    attempts: &mut Vec<ExtractionAttempt>,
    strategy: &str,
    raw_text: Option<String>,
    value: Option<f64>,
) {
    let attempt = ExtractionAttempt {
        strategy: strategy.to_string(),
        raw_text,
        value,
    };
    debug!("Extraction attempt: {:?}", attempt);
    attempts.push(attempt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{MockEngine, PageScript};
    use crate::models::Country;
    use crate::session::{build_session, SessionOverrides};
    use pretty_assertions::assert_eq;

    async fn run(
        script: PageScript,
        selectors: &[&str],
        recipes: &[DomRecipe],
    ) -> (Option<f64>, MockEngine) {
        let engine = MockEngine::new(vec![script]);
        let page = build_session(&engine, Country::Us, &SessionOverrides::default(), 1)
            .await
            .unwrap();
        let price = extract_price(&*page, selectors, recipes).await;
        (price, engine)
    }

    #[tokio::test(start_paused = true)]
    async fn third_selector_wins_without_fallback() {
        let script = PageScript::with_content("<html>precio: 99999</html>")
            .with_selector(".price", "$ 115");
        let selectors = [".missing-a", ".missing-b", ".price"];
        let (price, engine) = run(script, &selectors, &[]).await;

        assert_eq!(price, Some(115.0));
        // Lower-confidence stages must not run once a selector succeeds.
        assert_eq!(engine.content_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn text_content_recovers_when_visible_text_read_fails() {
        let script = PageScript::default().with_text_content_only(".hidden-price", "$ 54.999");
        let (price, engine) = run(script, &[".hidden-price"], &[]).await;

        assert_eq!(price, Some(54999.0));
        assert_eq!(engine.content_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waited_selector_is_retried_once() {
        let script = PageScript::default().with_waited_selector(".late-price", "$1,234.56");
        let (price, _) = run(script, &[".late-price"], &[]).await;
        assert_eq!(price, Some(1234.56));
    }

    #[tokio::test(start_paused = true)]
    async fn recipe_runs_after_selectors_exhaust() {
        let recipe = DomRecipe::QueryText(".vtex-price".to_string());
        let script = PageScript::default().with_recipe(recipe.clone(), "$ 219.999");
        let (price, _) = run(script, &[".missing"], &[recipe]).await;
        assert_eq!(price, Some(219_999.0));
    }

    #[tokio::test(start_paused = true)]
    async fn content_fallback_finds_labeled_price() {
        let script =
            PageScript::with_content("<html><body><div data-x=\"precio: 54999\"></div></body></html>");
        let (price, _) = run(script, &[".missing"], &[DomRecipe::CurrencyScan]).await;
        assert_eq!(price, Some(54999.0));
    }

    #[tokio::test(start_paused = true)]
    async fn rendered_text_scan_is_last_resort() {
        // The &nbsp; keeps the raw-markup patterns from matching; only the
        // decoded text node carries a parseable amount.
        let script = PageScript::with_content(
            "<html><body><p>Great kicks</p><span>$&nbsp;110,00</span></body></html>",
        );
        let (price, _) = run(script, &[], &[]).await;
        assert_eq!(price, Some(110.0));
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_found_is_none() {
        let script = PageScript::with_content("<html><body>Sold out</body></html>");
        let (price, _) = run(script, &[".missing"], &[DomRecipe::CurrencyScan]).await;
        assert_eq!(price, None);
    }
}
