use once_cell::sync::Lazy;
use regex::Regex;

// Ordered by confidence: symbol-prefixed, symbol-suffixed, bare number.
static PRICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\$\s*(\d+(?:[.,]\d+)*)").expect("Invalid prefixed price regex"),
        Regex::new(r"(\d+(?:[.,]\d+)*)\s*\$").expect("Invalid suffixed price regex"),
        Regex::new(r"(\d+(?:[.,]\d+)*)").expect("Invalid bare price regex"),
    ]
});

/// Parse a monetary value out of an arbitrary text fragment.
///
/// Handles both Argentine (`1.234,56`) and US (`1,234.56`) separator
/// conventions. Returns `None` for anything that does not contain a
/// parseable number; malformed input never panics.
pub fn parse_price(text: &str) -> Option<f64> {
    for pattern in PRICE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            let raw = captures.get(1)?.as_str();
            if let Ok(value) = normalize_separators(raw).parse::<f64>() {
                return Some(value);
            }
        }
    }
    None
}

/// Disambiguate thousands vs. decimal separators in a numeric fragment.
///
/// When both are present, the leftmost one is the thousands separator. A
/// lone separator is decimal only if at most two digits follow it.
fn normalize_separators(raw: &str) -> String {
    let has_comma = raw.contains(',');
    let has_dot = raw.contains('.');

    match (has_comma, has_dot) {
        (true, true) => {
            let comma_first = raw.find(',') < raw.find('.');
            if comma_first {
                raw.replace(',', "")
            } else {
                raw.replace('.', "").replace(',', ".")
            }
        }
        (true, false) => {
            let after = raw.rsplit(',').next().unwrap_or("");
            if after.len() > 2 {
                raw.replace(',', "")
            } else {
                raw.replace(',', ".")
            }
        }
        (false, true) => {
            let after = raw.rsplit('.').next().unwrap_or("");
            if after.len() > 2 {
                raw.replace('.', "")
            } else {
                raw.to_string()
            }
        }
        (false, false) => raw.to_string(),
    }
}
