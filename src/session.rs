use anyhow::{Context, Result};

use crate::browser::{BrowserEngine, BrowserPage, CookieSpec};
use crate::models::Country;

/// Standard desktop viewport used for every session.
pub const VIEWPORT: (u32, u32) = (1280, 800);

// Desktop Chrome user agents, rotated across retry attempts when a site
// throws a bot challenge.
static USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

/// Everything an engine needs to produce an isolated, country-appropriate
/// session. Derived deterministically from the country code; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub country: Country,
    pub locale: String,
    pub accept_language: String,
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub cookies: Vec<CookieSpec>,
    pub referer: Option<String>,
}

/// Brand-specific additions layered over the country defaults.
#[derive(Debug, Clone, Default)]
pub struct SessionOverrides {
    pub cookies: Vec<CookieSpec>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

/// User agent for a 1-based navigation attempt, wrapping around the pool.
pub fn user_agent_for_attempt(attempt: u32) -> &'static str {
    let index = attempt.saturating_sub(1) as usize % USER_AGENT_POOL.len();
    USER_AGENT_POOL[index]
}

pub fn session_config(
    country: Country,
    overrides: &SessionOverrides,
    attempt: u32,
) -> SessionConfig {
    SessionConfig {
        country,
        locale: country.locale().to_string(),
        accept_language: country.accept_language().to_string(),
        user_agent: overrides
            .user_agent
            .clone()
            .unwrap_or_else(|| user_agent_for_attempt(attempt).to_string()),
        viewport: VIEWPORT,
        cookies: overrides.cookies.clone(),
        referer: overrides.referer.clone(),
    }
}

/// Build one isolated session for a country target, ready to navigate.
pub async fn build_session(
    engine: &dyn BrowserEngine,
    country: Country,
    overrides: &SessionOverrides,
    attempt: u32,
) -> Result<Box<dyn BrowserPage>> {
    let config = session_config(country, overrides, attempt);
    engine
        .new_session(&config)
        .await
        .with_context(|| format!("Failed to create session for {}", country))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn config_derives_locale_from_country() {
        let config = session_config(Country::Ar, &SessionOverrides::default(), 1);
        assert_eq!(config.locale, "es-AR");
        assert_eq!(config.accept_language, "es-AR,es;q=0.9");
        assert_eq!(config.viewport, VIEWPORT);
        assert!(config.cookies.is_empty());
    }

    #[test]
    fn user_agent_rotates_per_attempt() {
        let first = user_agent_for_attempt(1);
        let second = user_agent_for_attempt(2);
        let wrapped = user_agent_for_attempt(1 + USER_AGENT_POOL.len() as u32);
        assert_ne!(first, second);
        assert_eq!(first, wrapped);
    }

    #[test]
    fn overrides_take_precedence() {
        let overrides = SessionOverrides {
            cookies: vec![CookieSpec::new("accept_cookies", "true", ".example.com")],
            referer: Some("https://example.com/list".to_string()),
            user_agent: Some("custom-agent".to_string()),
        };
        let config = session_config(Country::Us, &overrides, 3);
        assert_eq!(config.user_agent, "custom-agent");
        assert_eq!(config.cookies.len(), 1);
        assert_eq!(config.referer.as_deref(), Some("https://example.com/list"));
    }
}
