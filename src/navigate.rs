use std::time::Duration;
use tracing::{debug, info, warn};

use crate::browser::BrowserPage;

/// Retry budget for a single country target.
pub const MAX_NAV_ATTEMPTS: u32 = 3;

// Primary load timeout grows with the attempt number; the quiescence wait
// and the settle delay are fixed.
const PRIMARY_TIMEOUT: Duration = Duration::from_secs(30);
const QUIESCENCE_TIMEOUT: Duration = Duration::from_secs(10);
const SETTLE_DELAY: Duration = Duration::from_secs(3);
const RETRY_BACKOFF: Duration = Duration::from_secs(2);

// Marker selectors of known interstitial verification pages.
static CHALLENGE_SELECTORS: &[&str] = &[
    "#challenge-form",
    "#cf-challenge-running",
    "#px-captcha",
    "iframe[src*=\"captcha\"]",
];

// Lowercase text signatures scanned against the rendered markup.
static CHALLENGE_SIGNATURES: &[&str] = &[
    "verify you are human",
    "prove you are human",
    "checking your browser",
    "pardon our interruption",
    "access denied",
    "request blocked",
    "comprueba que eres humano",
    "un momento",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Page settled with no challenge; safe to extract.
    Loaded,
    /// Challenge detected and retry budget remains; rotate the session.
    Challenged,
    /// Challenge still present on the final attempt.
    ChallengeExhausted,
    /// Page failed to load.
    Failed,
}

/// Backoff delay before retrying a challenged navigation.
pub fn backoff_for_attempt(attempt: u32) -> Duration {
    RETRY_BACKOFF * attempt
}

/// Staged load of `url`: bounded primary navigation, tolerated wait for
/// network quiescence, fixed settle delay, then a bot-challenge scan.
pub async fn navigate(page: &dyn BrowserPage, url: &str, attempt: u32) -> NavigationOutcome {
    let nav_timeout = PRIMARY_TIMEOUT * attempt;
    info!(
        "Navigating to {} (attempt {}/{}, timeout {:?})",
        url, attempt, MAX_NAV_ATTEMPTS, nav_timeout
    );

    if let Err(e) = page.goto(url, nav_timeout).await {
        warn!("Navigation error for {}: {}", url, e);
        return NavigationOutcome::Failed;
    }

    match page.wait_for_quiescence(QUIESCENCE_TIMEOUT).await {
        Ok(true) => {}
        Ok(false) => debug!("Network idle timeout for {}, continuing anyway", url),
        Err(e) => warn!("Quiescence wait failed for {}: {}", url, e),
    }

    // Let deferred client-side rendering finish.
    tokio::time::sleep(SETTLE_DELAY).await;

    match challenge_present(page).await {
        false => NavigationOutcome::Loaded,
        true if attempt < MAX_NAV_ATTEMPTS => {
            warn!("Bot challenge detected at {} on attempt {}", url, attempt);
            NavigationOutcome::Challenged
        }
        true => {
            warn!(
                "Bot challenge still present at {} after {} attempts",
                url, attempt
            );
            NavigationOutcome::ChallengeExhausted
        }
    }
}

async fn challenge_present(page: &dyn BrowserPage) -> bool {
    for selector in CHALLENGE_SELECTORS {
        if matches!(page.inner_text(selector).await, Ok(Some(_))) {
            debug!("Challenge marker selector matched: {}", selector);
            return true;
        }
    }

    match page.content().await {
        Ok(markup) => {
            let lowered = markup.to_lowercase();
            CHALLENGE_SIGNATURES
                .iter()
                .any(|signature| lowered.contains(signature))
        }
        Err(e) => {
            warn!("Could not read page content for challenge scan: {}", e);
            false
        }
    }
}
