use crate::actions::base::{ActionExecutor, ActionModel, ActionResult};
use crate::actions::gate::ActionBatch;
use crate::core::config::{ReplayConfig, SafetyConfig};
use crate::core::source::SnapshotSource;
use crate::dom::{DomProcessor, DomTree};
use crate::errors::{DomError, Result};
use crate::history::{AgentHistory, AgentHistoryList, HistoryElement, HistoryTreeProcessor};
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    Unchanged,
    Rewritten { from: usize, to: usize },
    NotFound,
}

/// Points `action` at the current index of the element it was recorded against.
///
/// Only the action is modified, and only on `Rewritten`.
pub fn rewrite_action_index(
    history: Option<&HistoryElement>,
    action: &mut ActionModel,
    tree: &DomTree,
) -> RewriteOutcome {
    let (Some(history), Some(recorded)) = (history, action.index()) else {
        return RewriteOutcome::Unchanged;
    };

    let Some(current) = HistoryTreeProcessor::find_history_element_in_tree(history, tree)
        .and_then(|id| tree.element(id))
        .and_then(|element| element.interaction_index)
    else {
        return RewriteOutcome::NotFound;
    };

    if current == recorded {
        return RewriteOutcome::Unchanged;
    }
    action.set_index(current);
    RewriteOutcome::Rewritten {
        from: recorded,
        to: current,
    }
}

/// Re-executes recorded steps against the live page, remapping element indices.
pub struct Replayer<'a> {
    processor: &'a DomProcessor,
    config: ReplayConfig,
    safety: SafetyConfig,
}

impl<'a> Replayer<'a> {
    pub fn new(processor: &'a DomProcessor, config: ReplayConfig) -> Self {
        Self {
            processor,
            config,
            safety: SafetyConfig::default(),
        }
    }

    pub fn with_safety(mut self, safety: SafetyConfig) -> Self {
        self.safety = safety;
        self
    }

    /// Remaps every action of `item` onto a fresh capture without executing anything.
    pub async fn remap_step<S>(&self, item: &AgentHistory, source: &S) -> Result<Vec<ActionModel>>
    where
        S: SnapshotSource + ?Sized,
    {
        let state = self.processor.capture(source).await?;
        remap_actions(item, &state.tree)
    }

    pub async fn replay_step<S, E>(
        &self,
        item: &AgentHistory,
        source: &S,
        executor: &E,
    ) -> Result<Vec<ActionResult>>
    where
        S: SnapshotSource + ?Sized,
        E: ActionExecutor + ?Sized,
    {
        let state = self.processor.capture(source).await?;
        let actions = remap_actions(item, &state.tree)?;

        let outcome = ActionBatch::new(self.processor, self.safety.clone())
            .with_delay(Duration::from_millis(self.config.delay_between_actions_ms))
            .run_from(state, source, executor, &actions)
            .await?;
        Ok(outcome.results)
    }

    pub async fn rerun_history<S, E>(
        &self,
        history: &AgentHistoryList,
        source: &S,
        executor: &E,
    ) -> Result<Vec<ActionResult>>
    where
        S: SnapshotSource + ?Sized,
        E: ActionExecutor + ?Sized,
    {
        let mut results = Vec::new();
        let attempts = self.config.max_retries.max(1);

        for (i, item) in history.history.iter().enumerate() {
            if item.actions().is_empty() {
                debug!("Step {}: no actions recorded, skipping", i + 1);
                results.push(ActionResult::failure("No action to replay".to_string()));
                continue;
            }

            let mut attempt = 0;
            loop {
                attempt += 1;
                match self.replay_step(item, source, executor).await {
                    Ok(step_results) => {
                        results.extend(step_results);
                        break;
                    }
                    Err(e) if attempt >= attempts => {
                        let message = format!(
                            "Step {} failed after {} attempts: {}",
                            i + 1,
                            attempt,
                            e
                        );
                        error!("{}", message);
                        if !self.config.skip_failures {
                            return Err(e);
                        }
                        results.push(ActionResult::failure(message));
                        break;
                    }
                    Err(e) => {
                        warn!(
                            "Step {} failed (attempt {}/{}), retrying: {}",
                            i + 1,
                            attempt,
                            attempts,
                            e
                        );
                        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    }
                }
            }
        }

        Ok(results)
    }
}

/// Copies of the step's actions with every recorded target remapped onto `tree`.
pub fn remap_actions(item: &AgentHistory, tree: &DomTree) -> Result<Vec<ActionModel>> {
    let interacted = item.state.interacted_elements();
    let mut actions = item.actions().to_vec();

    for (i, action) in actions.iter_mut().enumerate() {
        let history = interacted.get(i).and_then(Option::as_ref);
        match rewrite_action_index(history, action, tree) {
            RewriteOutcome::Unchanged => {}
            RewriteOutcome::Rewritten { from, to } => {
                info!("Element moved in DOM, updated index from {} to {}", from, to);
            }
            RewriteOutcome::NotFound => {
                let target = history.map(ToString::to_string).unwrap_or_default();
                return Err(DomError::ReplayStepFailed {
                    action: i,
                    reason: format!("could not find matching element {} in current page", target),
                });
            }
        }
    }

    Ok(actions)
}
