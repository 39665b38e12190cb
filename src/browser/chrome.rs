use crate::core::config::BrowserConfig;
use crate::core::source::{PageInfo, SnapshotSource};
use crate::dom::raw::RawSnapshot;
use crate::errors::{DomError, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use tracing::debug;

/// Snapshot source backed by a Chrome tab and a caller-supplied extraction routine.
pub struct ChromeSnapshotSource {
    // Keeps the launched process alive for the lifetime of the tab.
    _browser: Option<Browser>,
    tab: Arc<Tab>,
    script: String,
}

impl ChromeSnapshotSource {
    /// Launches Chrome with `config` and opens a blank tab.
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let script = config
            .extraction_script
            .clone()
            .ok_or_else(|| DomError::Extraction("no extraction script configured".to_string()))?;

        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );
        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];
        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }
        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| DomError::ChromeError(e.to_string()))?;
        let browser =
            Browser::new(launch_options).map_err(|e| DomError::ChromeError(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| DomError::ChromeError(e.to_string()))?;

        Ok(Self {
            _browser: Some(browser),
            tab,
            script,
        })
    }

    /// Wraps a tab owned elsewhere.
    pub fn from_tab(tab: Arc<Tab>, script: impl Into<String>) -> Self {
        Self {
            _browser: None,
            tab,
            script: script.into(),
        }
    }

    fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| DomError::Extraction(e.to_string()))?;
        Ok(result.value.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl SnapshotSource for ChromeSnapshotSource {
    async fn raw_snapshot(&self) -> Result<RawSnapshot> {
        let value = self.evaluate(&format!("JSON.stringify({})", self.script))?;
        let payload = value.as_str().ok_or_else(|| {
            DomError::Extraction(format!("extraction routine returned {}", value))
        })?;
        debug!("Extracted snapshot payload ({} bytes)", payload.len());
        parse_payload(payload)
    }

    async fn page_info(&self) -> Result<PageInfo> {
        let title = self.evaluate("document.title")?;
        Ok(PageInfo {
            url: self.tab.get_url(),
            title: title.as_str().unwrap_or_default().to_string(),
        })
    }
}

fn parse_payload(payload: &str) -> Result<RawSnapshot> {
    serde_json::from_str(payload).map_err(|e| DomError::MalformedSnapshot(e.to_string()))
}
