use crate::dom::DomState;
use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of an action execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub execution_time_ms: u64,
    /// Set by terminal actions; a batch stops after it.
    pub is_done: bool,
}

impl ActionResult {
    pub fn success(message: String) -> Self {
        Self {
            success: true,
            message,
            ..Default::default()
        }
    }

    pub fn success_with_data(message: String, data: Value) -> Self {
        Self {
            success: true,
            message,
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            ..Default::default()
        }
    }

    pub fn done(message: String) -> Self {
        Self {
            success: true,
            message,
            is_done: true,
            ..Default::default()
        }
    }

    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_time_ms = time_ms;
        self
    }
}

/// Error types for actions
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// One recorded action in its persisted shape: `{ "<action_name>": { ...params } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionModel(Map<String, Value>);

impl ActionModel {
    pub fn new(name: &str, params: Value) -> Self {
        let mut map = Map::new();
        map.insert(name.to_string(), params);
        Self(map)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.keys().next().map(String::as_str)
    }

    pub fn params(&self) -> Option<&Value> {
        self.0.values().next()
    }

    /// Element index carried by the action's parameters, if any.
    pub fn index(&self) -> Option<usize> {
        self.0
            .values()
            .find_map(|params| params.get("index"))
            .and_then(Value::as_u64)
            .map(|index| index as usize)
    }

    /// Overwrites an existing `index` parameter. Returns false when there is none.
    pub fn set_index(&mut self, index: usize) -> bool {
        for params in self.0.values_mut() {
            if let Some(params) = params.as_object_mut() {
                if params.contains_key("index") {
                    params.insert("index".to_string(), Value::from(index));
                    return true;
                }
            }
        }
        false
    }
}

/// Runs actions against the live page. Implemented by drivers and by [`ActionRegistry`].
///
/// [`ActionRegistry`]: crate::actions::ActionRegistry
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &ActionModel, state: &DomState) -> Result<ActionResult>;
}

/// Base trait for a single named action handler
#[async_trait]
pub trait Action: Send + Sync {
    /// Name of the action, the key it is recorded under
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn execute(&self, params: &Value, state: &DomState) -> Result<ActionResult>;

    /// Rejects an `index` parameter that the current page does not expose.
    fn validate_params(&self, params: &Value, state: &DomState) -> Result<()> {
        match params.get("index") {
            None => Ok(()),
            Some(index) => {
                let index = index.as_u64().ok_or_else(|| {
                    ActionError::InvalidParameters(format!("index must be a number, got {}", index))
                })?;
                if state.selector_map().contains(index as usize) {
                    Ok(())
                } else {
                    Err(ActionError::InvalidParameters(format!(
                        "element index {} does not exist on the page",
                        index
                    ))
                    .into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_model_index() {
        let mut action: ActionModel =
            serde_json::from_value(json!({"click_element": {"index": 5}})).unwrap();
        assert_eq!(action.name(), Some("click_element"));
        assert_eq!(action.index(), Some(5));

        assert!(action.set_index(2));
        assert_eq!(serde_json::to_value(&action).unwrap(), json!({"click_element": {"index": 2}}));
    }

    #[test]
    fn test_action_without_index() {
        let mut action = ActionModel::new("go_to_url", json!({"url": "https://example.com"}));
        assert_eq!(action.index(), None);
        assert!(!action.set_index(1));
        assert_eq!(action.params(), Some(&json!({"url": "https://example.com"})));
    }

    #[test]
    fn test_result_defaults_on_load() {
        let result: ActionResult = serde_json::from_value(json!({"message": "ok"})).unwrap();
        assert!(!result.success);
        assert!(!result.is_done);
        assert_eq!(result.execution_time_ms, 0);
        assert!(ActionResult::done("finished".to_string()).is_done);
    }
}
