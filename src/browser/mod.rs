use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::session::SessionConfig;

mod chrome;
#[cfg(test)]
pub mod mock;

pub use chrome::ChromeEngine;

/// A named in-page DOM query. Sites configure a fixed recipe list instead of
/// handing free-form script to the engine, so the contract stays narrow and
/// mockable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomRecipe {
    /// Text content of the first element matching a selector, read in-page.
    QueryText(String),
    /// Scan the rendered DOM for a short text node that looks like a
    /// currency amount.
    CurrencyScan,
}

impl DomRecipe {
    pub fn name(&self) -> String {
        match self {
            DomRecipe::QueryText(selector) => format!("query-text({})", selector),
            DomRecipe::CurrencyScan => "currency-scan".to_string(),
        }
    }
}

/// Cookie pre-seeded into a session before the first navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSpec {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl CookieSpec {
    pub fn new(name: &str, value: &str, domain: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
        }
    }
}

/// Handle to one isolated, ready-to-navigate page. All waits are bounded;
/// a timeout is reported as an `Ok` value, not an error.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait for a selector to appear. `Ok(false)` when the wait times out.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Visible text of the first element matching the selector.
    async fn inner_text(&self, selector: &str) -> Result<Option<String>>;

    /// Raw text content, the fallback when the visible-text read fails.
    async fn text_content(&self, selector: &str) -> Result<Option<String>>;

    async fn run_recipe(&self, recipe: &DomRecipe) -> Result<Option<String>>;

    /// Full rendered page markup.
    async fn content(&self) -> Result<String>;

    /// Best-effort wait for network quiescence; `Ok(false)` on timeout.
    async fn wait_for_quiescence(&self, timeout: Duration) -> Result<bool>;

    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Release the underlying browser resources. Must be called on every
    /// exit path; the session is unusable afterwards.
    async fn close(&mut self) -> Result<()>;
}

/// Creates isolated browsing sessions. One session per country scrape;
/// nothing is shared between sessions.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn new_session(&self, config: &SessionConfig) -> Result<Box<dyn BrowserPage>>;
}
