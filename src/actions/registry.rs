use crate::actions::base::{Action, ActionError, ActionExecutor, ActionModel, ActionResult};
use crate::dom::DomState;
use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Dispatches recorded actions to handlers by action name.
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    pub fn register<A: Action + 'static>(&mut self, action: A) {
        let name = action.name().to_string();
        self.actions.insert(name, Arc::new(action));
    }

    pub fn get_action(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn list_actions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionExecutor for ActionRegistry {
    async fn execute(&self, action: &ActionModel, state: &DomState) -> Result<ActionResult> {
        let name = action.name().unwrap_or_default();
        let handler = self
            .get_action(name)
            .ok_or_else(|| ActionError::ActionNotFound(name.to_string()))?;

        let params = action.params().cloned().unwrap_or(Value::Null);
        handler.validate_params(&params, state)?;

        let start_time = std::time::Instant::now();
        let result = handler.execute(&params, state).await?;
        let execution_time = start_time.elapsed().as_millis() as u64;

        Ok(result.with_execution_time(execution_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomState;
    use crate::errors::DomError;
    use crate::testing::{ElementSpec, SnapshotFixture};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    struct Click;

    #[async_trait]
    impl Action for Click {
        fn name(&self) -> &str {
            "click_element"
        }

        fn description(&self) -> &str {
            "Click the element with the given index"
        }

        async fn execute(&self, params: &Value, _state: &DomState) -> Result<ActionResult> {
            Ok(ActionResult::success(format!("clicked {}", params["index"])))
        }
    }

    fn state() -> DomState {
        let mut fx = SnapshotFixture::new("body", "/html/body");
        let root = fx.root_id();
        fx.element(&root, ElementSpec::new("button", "/html/body/button").index(0));
        DomState::new(
            "https://example.com".to_string(),
            "Example".to_string(),
            fx.tree().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_dispatches_by_name() {
        let mut registry = ActionRegistry::new();
        registry.register(Click);
        assert_eq!(registry.list_actions(), vec!["click_element"]);

        let action = ActionModel::new("click_element", json!({"index": 0}));
        let result = assert_ok!(registry.execute(&action, &state()).await);
        assert!(result.success);
        assert_eq!(result.message, "clicked 0");
    }

    #[tokio::test]
    async fn test_rejects_unknown_index_and_action() {
        let mut registry = ActionRegistry::new();
        registry.register(Click);
        let state = state();

        let stale = ActionModel::new("click_element", json!({"index": 9}));
        let err = assert_err!(registry.execute(&stale, &state).await);
        assert!(matches!(
            err,
            DomError::ActionError(ActionError::InvalidParameters(_))
        ));

        let unknown = ActionModel::new("scroll", json!({}));
        let err = assert_err!(registry.execute(&unknown, &state).await);
        assert!(matches!(err, DomError::ActionError(ActionError::ActionNotFound(_))));
    }
}
