use thiserror::Error;

/// Failure taxonomy for a single product scrape. Only `InvalidInput` is
/// fatal to the caller; every other variant is caught per country and turns
/// that country's price into "unknown".
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("unknown product key: {0}")]
    InvalidInput(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("bot challenge still present after {attempts} attempts at {url}")]
    BotChallengeExhausted { url: String, attempts: u32 },

    #[error("no extraction strategy yielded a price for {url}")]
    Extraction { url: String },

    #[error("browser session error: {0}")]
    Session(String),
}

impl ScrapeError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScrapeError::InvalidInput(_))
    }

    /// Pipeline stage the failure belongs to, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            ScrapeError::InvalidInput(_) => "input",
            ScrapeError::Navigation { .. } => "navigation",
            ScrapeError::BotChallengeExhausted { .. } => "bot-challenge",
            ScrapeError::Extraction { .. } => "extraction",
            ScrapeError::Session(_) => "session",
        }
    }
}
