//! Scripted engine/page pair for unit tests. Each session pops the next
//! `PageScript`, so a test can model a challenge on the first attempts and
//! a clean page on the last.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::browser::{BrowserEngine, BrowserPage, DomRecipe};
use crate::session::SessionConfig;

#[derive(Debug, Clone, Default)]
pub struct PageScript {
    /// Selector text available on first lookup.
    pub immediate_text: HashMap<String, String>,
    /// Selector text that only appears after a bounded wait.
    pub waited_text: HashMap<String, String>,
    /// Raw text-content reads, for elements whose visible-text read fails.
    pub text_content: HashMap<String, String>,
    pub recipes: HashMap<DomRecipe, String>,
    pub content: String,
    pub fail_navigation: bool,
}

impl PageScript {
    pub fn with_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            ..Default::default()
        }
    }

    pub fn with_selector(mut self, selector: &str, text: &str) -> Self {
        self.immediate_text.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn with_waited_selector(mut self, selector: &str, text: &str) -> Self {
        self.waited_text.insert(selector.to_string(), text.to_string());
        self
    }

    /// Element present but its visible-text read yields nothing; only the
    /// raw text-content read sees the value.
    pub fn with_text_content_only(mut self, selector: &str, text: &str) -> Self {
        self.text_content.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn with_recipe(mut self, recipe: DomRecipe, text: &str) -> Self {
        self.recipes.insert(recipe, text.to_string());
        self
    }

    pub fn failing_navigation() -> Self {
        Self {
            fail_navigation: true,
            ..Default::default()
        }
    }
}

#[derive(Default)]
pub struct MockCounters {
    pub sessions_started: AtomicUsize,
    pub goto_calls: AtomicUsize,
    pub content_calls: AtomicUsize,
    pub pages_closed: AtomicUsize,
}

pub struct MockEngine {
    scripts: Mutex<VecDeque<PageScript>>,
    pub counters: Arc<MockCounters>,
    pub user_agents: Mutex<Vec<String>>,
}

impl MockEngine {
    pub fn new(scripts: Vec<PageScript>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            counters: Arc::new(MockCounters::default()),
            user_agents: Mutex::new(Vec::new()),
        }
    }

    pub fn sessions_started(&self) -> usize {
        self.counters.sessions_started.load(Ordering::SeqCst)
    }

    pub fn goto_calls(&self) -> usize {
        self.counters.goto_calls.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self) -> usize {
        self.counters.content_calls.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.counters.pages_closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserEngine for MockEngine {
    async fn new_session(&self, config: &SessionConfig) -> Result<Box<dyn BrowserPage>> {
        self.counters.sessions_started.fetch_add(1, Ordering::SeqCst);
        self.user_agents
            .lock()
            .unwrap()
            .push(config.user_agent.clone());

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();

        Ok(Box::new(MockPage {
            script,
            appeared: Mutex::new(HashSet::new()),
            counters: self.counters.clone(),
        }))
    }
}

pub struct MockPage {
    script: PageScript,
    appeared: Mutex<HashSet<String>>,
    counters: Arc<MockCounters>,
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.counters.goto_calls.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_navigation {
            bail!("simulated navigation failure for {}", url);
        }
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        if self.script.waited_text.contains_key(selector)
            || self.script.immediate_text.contains_key(selector)
            || self.script.text_content.contains_key(selector)
        {
            self.appeared.lock().unwrap().insert(selector.to_string());
            return Ok(true);
        }
        Ok(false)
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        if let Some(text) = self.script.immediate_text.get(selector) {
            return Ok(Some(text.clone()));
        }
        if self.appeared.lock().unwrap().contains(selector) {
            return Ok(self.script.waited_text.get(selector).cloned());
        }
        Ok(None)
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        Ok(self.script.text_content.get(selector).cloned())
    }

    async fn run_recipe(&self, recipe: &DomRecipe) -> Result<Option<String>> {
        Ok(self.script.recipes.get(recipe).cloned())
    }

    async fn content(&self) -> Result<String> {
        self.counters.content_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.script.content.clone())
    }

    async fn wait_for_quiescence(&self, _timeout: Duration) -> Result<bool> {
        Ok(true)
    }

    async fn screenshot(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.counters.pages_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
