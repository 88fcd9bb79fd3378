use chrono::Local;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::browser::BrowserPage;
use crate::config::Config;

/// Debug-only screenshot sink. Disabled unless the debug flag is set;
/// a failed capture is logged and never fatal.
#[derive(Debug, Clone)]
pub struct Screenshots {
    dir: Option<PathBuf>,
}

impl Screenshots {
    pub fn from_config(config: &Config) -> Self {
        if !config.debug {
            return Self::disabled();
        }
        let dir = config.screenshots_dir.clone();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(
                "Could not create screenshots directory {}: {}",
                dir.display(),
                e
            );
            return Self::disabled();
        }
        Self { dir: Some(dir) }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Capture the page under `<label>_<timestamp>.png`.
    pub async fn capture(&self, page: &dyn BrowserPage, label: &str) {
        let Some(dir) = &self.dir else {
            return;
        };
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{}_{}.png", label, timestamp));
        match page.screenshot(&path).await {
            Ok(()) => info!("Screenshot saved to {}", path.display()),
            Err(e) => warn!("Could not save screenshot {}: {}", path.display(), e),
        }
    }
}
