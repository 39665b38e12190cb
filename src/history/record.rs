use crate::actions::{ActionModel, ActionResult};
use crate::dom::DomState;
use crate::errors::Result;
use crate::history::element::HistoryElement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    #[serde(default)]
    pub action: Vec<ActionModel>,
    /// Planner bookkeeping, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<Value>,
}

/// What the page looked like when a step was taken.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// One entry per action; `None` where the action targeted no element.
    #[serde(default)]
    pub interacted_element: Option<Vec<Option<HistoryElement>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl StepState {
    pub fn from_state(state: &DomState, interacted: Vec<Option<HistoryElement>>) -> Self {
        Self {
            url: state.url.clone(),
            title: state.title.clone(),
            interacted_element: Some(interacted),
            screenshot: None,
        }
    }

    pub fn interacted_elements(&self) -> &[Option<HistoryElement>] {
        self.interacted_element.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMetadata {
    pub step_number: usize,
    pub step_start_time: DateTime<Utc>,
    pub step_end_time: DateTime<Utc>,
}

impl StepMetadata {
    pub fn duration_seconds(&self) -> f64 {
        (self.step_end_time - self.step_start_time).num_milliseconds() as f64 / 1000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentHistory {
    pub model_output: Option<AgentOutput>,
    #[serde(default)]
    pub result: Vec<ActionResult>,
    pub state: StepState,
    #[serde(default)]
    pub metadata: Option<StepMetadata>,
}

impl AgentHistory {
    /// History elements for the targets of `actions` on `state`, aligned with the actions.
    pub fn interacted_elements(
        actions: &[ActionModel],
        state: &DomState,
        include_dynamic_attributes: bool,
    ) -> Vec<Option<HistoryElement>> {
        actions
            .iter()
            .map(|action| {
                let id = state.selector_map().get(action.index()?)?;
                HistoryElement::capture(&state.tree, id, include_dynamic_attributes)
            })
            .collect()
    }

    /// Record of one completed step. `state` is the page the actions were chosen on.
    pub fn record(
        step_number: usize,
        started: DateTime<Utc>,
        actions: Vec<ActionModel>,
        result: Vec<ActionResult>,
        state: &DomState,
        include_dynamic_attributes: bool,
    ) -> Self {
        let interacted = Self::interacted_elements(&actions, state, include_dynamic_attributes);
        Self {
            model_output: Some(AgentOutput {
                action: actions,
                current_state: None,
            }),
            result,
            state: StepState::from_state(state, interacted),
            metadata: Some(StepMetadata {
                step_number,
                step_start_time: started,
                step_end_time: Utc::now(),
            }),
        }
    }

    pub fn actions(&self) -> &[ActionModel] {
        self.model_output
            .as_ref()
            .map(|output| output.action.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentHistoryList {
    pub history: Vec<AgentHistory>,
}

impl AgentHistoryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: AgentHistory) {
        self.history.push(item);
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.history
            .iter()
            .filter_map(|item| item.metadata.as_ref())
            .map(StepMetadata::duration_seconds)
            .sum()
    }

    /// Visited urls, one per step.
    pub fn urls(&self) -> Vec<&str> {
        self.history
            .iter()
            .map(|item| item.state.url.as_str())
            .collect()
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let list: Self = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} history steps from {}",
            list.len(),
            path.as_ref().display()
        );
        Ok(list)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DomError;
    use crate::testing::{ElementSpec, SnapshotFixture};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn state() -> DomState {
        let mut fx = SnapshotFixture::new("body", "/html/body");
        let root = fx.root_id();
        fx.element(
            &root,
            ElementSpec::new("input", "/html/body/input")
                .index(0)
                .attr("name", "q"),
        );
        DomState::new(
            "https://example.com".to_string(),
            "Search".to_string(),
            fx.tree().unwrap(),
        )
    }

    #[test]
    fn test_interacted_elements_align_with_actions() {
        let state = state();
        let actions = vec![
            ActionModel::new("input_text", json!({"index": 0, "text": "rust"})),
            ActionModel::new("go_back", json!({})),
            ActionModel::new("click_element", json!({"index": 8})),
        ];

        let elements = AgentHistory::interacted_elements(&actions, &state, true);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].as_ref().unwrap().tag_name, "input");
        assert!(elements[1].is_none());
        assert!(elements[2].is_none());
    }

    #[test]
    fn test_record_honours_dynamic_attribute_policy() {
        let mut fx = SnapshotFixture::new("body", "/html/body");
        let root = fx.root_id();
        fx.element(
            &root,
            ElementSpec::new("button", "/html/body/button")
                .index(0)
                .attr("class", "btn primary")
                .attr("data-testid", "save"),
        );
        let state = DomState::new(
            "https://example.com".to_string(),
            "Save".to_string(),
            fx.tree().unwrap(),
        );
        let actions = || vec![ActionModel::new("click_element", json!({"index": 0}))];
        let selector = |item: &AgentHistory| {
            item.state.interacted_elements()[0]
                .as_ref()
                .and_then(|element| element.css_selector.clone())
                .unwrap()
        };

        let stable = AgentHistory::record(1, Utc::now(), actions(), vec![], &state, false);
        assert_eq!(selector(&stable), "html > body > button");

        let dynamic = AgentHistory::record(1, Utc::now(), actions(), vec![], &state, true);
        let with_dynamic = selector(&dynamic);
        assert!(with_dynamic.contains(".btn.primary"));
        assert!(with_dynamic.contains("[data-testid=\"save\"]"));
    }

    #[test]
    fn test_missing_interacted_element_loads_as_none() {
        let item: AgentHistory = serde_json::from_value(json!({
            "model_output": {"action": [{"click_element": {"index": 1}}]},
            "result": [{"success": true, "message": "ok"}],
            "state": {"url": "https://example.com", "title": ""}
        }))
        .unwrap();

        assert_eq!(item.state.interacted_element, None);
        assert!(item.state.interacted_elements().is_empty());
        assert_eq!(item.actions()[0].index(), Some(1));
        assert_eq!(item.metadata, None);
    }

    #[test]
    fn test_save_and_load_file() {
        let state = state();
        let started = Utc::now();
        let mut list = AgentHistoryList::new();
        list.push(AgentHistory::record(
            1,
            started,
            vec![ActionModel::new("input_text", json!({"index": 0, "text": "rust"}))],
            vec![ActionResult::success("typed".to_string())],
            &state,
            true,
        ));

        let path = std::env::temp_dir()
            .join(format!("dom-anchor-history-{}", std::process::id()))
            .join("history.json");
        list.save_to_file(&path).unwrap();
        let loaded = AgentHistoryList::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, list);
        assert_eq!(loaded.urls(), vec!["https://example.com"]);
        assert!(loaded.total_duration_seconds() >= 0.0);
    }

    #[test]
    fn test_load_errors() {
        let missing = AgentHistoryList::load_from_file("/nonexistent/dom-anchor/history.json");
        assert!(matches!(missing, Err(DomError::Io(_))));

        let path = std::env::temp_dir().join(format!("dom-anchor-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{not json").unwrap();
        let bad = AgentHistoryList::load_from_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(bad, Err(DomError::Serialization(_))));
    }
}
