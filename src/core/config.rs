use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dom: DomConfig,
    pub safety: SafetyConfig,
    pub replay: ReplayConfig,
    pub browser: BrowserConfig,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DomConfig {
    /// Adds class names and test-id attributes to synthesized selectors.
    pub include_dynamic_attributes: bool,
    /// Attributes shown next to each element in the interactive listing.
    pub include_attributes: Vec<String>,
    /// Static extraction only: index controls that markup hints say are hidden.
    pub include_hidden_elements: bool,
    /// Static extraction only: stop assigning indices after this many elements.
    pub max_interactive_elements: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub check_for_new_elements: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub max_retries: u32,
    pub skip_failures: bool,
    pub retry_delay_ms: u64,
    pub delay_between_actions_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
    /// In-page routine returning the snapshot payload (`{ map, rootId }`).
    pub extraction_script: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for DomConfig {
    fn default() -> Self {
        Self {
            include_dynamic_attributes: true,
            include_attributes: [
                "title",
                "type",
                "name",
                "role",
                "tabindex",
                "aria-label",
                "placeholder",
                "value",
                "alt",
                "aria-expanded",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            include_hidden_elements: false,
            max_interactive_elements: None,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            check_for_new_elements: true,
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            skip_failures: true,
            retry_delay_ms: 2000,
            delay_between_actions_ms: 2000,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            args: vec![],
            extraction_script: None,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"replay": {"max_retries": 1}, "dom": {"include_dynamic_attributes": false}}"#,
        )
        .unwrap();
        assert_eq!(config.replay.max_retries, 1);
        assert!(config.replay.skip_failures);
        assert!(!config.dom.include_dynamic_attributes);
        assert!(config.dom.include_attributes.contains(&"placeholder".to_string()));
        assert!(config.safety.check_for_new_elements);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("dom-anchor-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"browser": {"headless": false}}"#).unwrap();
        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(!config.browser.headless);
        assert_eq!(config.browser.viewport.width, 1280);
    }
}
