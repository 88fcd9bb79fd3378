use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, Headers, SetCookiesParams, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use crate::browser::{BrowserEngine, BrowserPage, DomRecipe};
use crate::session::SessionConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

// Mirrors the lowest-confidence strategy the sites need: any short text
// node carrying a currency symbol and digits.
const CURRENCY_SCAN_JS: &str = r#"() => {
    const pattern = /[$€]\s*\d+(?:[.,]\d+)*/;
    for (const el of document.querySelectorAll('*')) {
        const text = el.textContent && el.textContent.trim();
        if (text && text.length < 20 && pattern.test(text)) {
            return text;
        }
    }
    return null;
}"#;

/// Launches one headless Chromium per session so concurrent country scrapes
/// never share cookies, cache or profile state.
pub struct ChromeEngine;

impl ChromeEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserEngine for ChromeEngine {
    async fn new_session(&self, config: &SessionConfig) -> Result<Box<dyn BrowserPage>> {
        let (width, height) = config.viewport;
        let browser_config = BrowserConfig::builder()
            .window_size(width, height)
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--lang={}", config.locale))
            .build()
            .map_err(|e| anyhow!(e))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match self.prepare_page(&browser, config).await {
            Ok(page) => page,
            Err(e) => {
                // Do not leak the browser process when setup fails.
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(e);
            }
        };

        Ok(Box::new(ChromeSession {
            browser,
            page,
            handler_task,
        }))
    }
}

impl ChromeEngine {
    async fn prepare_page(&self, browser: &Browser, config: &SessionConfig) -> Result<Page> {
        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;

        let override_params = SetUserAgentOverrideParams::builder()
            .user_agent(&config.user_agent)
            .accept_language(&config.accept_language)
            .build()
            .map_err(|e| anyhow!(e))?;
        page.execute(override_params).await?;

        let mut headers = json!({ "Accept-Language": config.accept_language });
        if let Some(referer) = &config.referer {
            headers["Referer"] = json!(referer);
        }
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(headers)))
            .await?;

        if !config.cookies.is_empty() {
            let cookies = config
                .cookies
                .iter()
                .map(|cookie| {
                    CookieParam::builder()
                        .name(&cookie.name)
                        .value(&cookie.value)
                        .domain(&cookie.domain)
                        .path(&cookie.path)
                        .build()
                        .map_err(|e| anyhow!(e))
                })
                .collect::<Result<Vec<_>>>()?;
            page.execute(SetCookiesParams::new(cookies)).await?;
        }

        Ok(page)
    }
}

struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserPage for ChromeSession {
    async fn goto(&self, url: &str, nav_timeout: Duration) -> Result<()> {
        timeout(nav_timeout, self.page.goto(url))
            .await
            .map_err(|_| anyhow!("navigation timed out after {:?}", nav_timeout))?
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, wait: Duration) -> Result<bool> {
        let deadline = Instant::now() + wait;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(element.inner_text().await.unwrap_or(None)),
            Err(_) => Ok(None),
        }
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        let expression = format!(
            "() => {{ const el = document.querySelector({}); return el ? el.textContent : null; }}",
            serde_json::to_string(selector)?
        );
        let result = self.page.evaluate_function(expression).await?;
        Ok(result.into_value::<Option<String>>().unwrap_or(None))
    }

    async fn run_recipe(&self, recipe: &DomRecipe) -> Result<Option<String>> {
        match recipe {
            DomRecipe::QueryText(selector) => self.text_content(selector).await,
            DomRecipe::CurrencyScan => {
                let result = self.page.evaluate_function(CURRENCY_SCAN_JS).await?;
                Ok(result.into_value::<Option<String>>().unwrap_or(None))
            }
        }
    }

    async fn content(&self) -> Result<String> {
        self.page.content().await.context("Failed to read page content")
    }

    async fn wait_for_quiescence(&self, wait: Duration) -> Result<bool> {
        let deadline = Instant::now() + wait;
        loop {
            let state = self
                .page
                .evaluate("document.readyState")
                .await?
                .into_value::<String>()
                .unwrap_or_default();
            if state == "complete" {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                debug!("Page never reached readyState=complete within {:?}", wait);
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.page
            .save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
                path,
            )
            .await
            .with_context(|| format!("Failed to save screenshot to {}", path.display()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("Error closing browser: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}
