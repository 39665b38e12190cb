use crate::actions::base::{ActionExecutor, ActionModel, ActionResult};
use crate::core::config::SafetyConfig;
use crate::core::source::SnapshotSource;
use crate::dom::{DomProcessor, DomState, DomTree};
use crate::errors::Result;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Clear,
    /// Branch-path hashes present now that were absent before the batch started.
    NewElements { hashes: Vec<String> },
}

impl GateVerdict {
    pub fn is_clear(&self) -> bool {
        matches!(self, GateVerdict::Clear)
    }
}

/// Detects elements that appeared since the indices of a batch were chosen.
#[derive(Debug, Clone)]
pub struct SafetyGate {
    cached: HashSet<String>,
}

impl SafetyGate {
    pub fn new(cached: HashSet<String>) -> Self {
        Self { cached }
    }

    pub fn from_selector_map(tree: &DomTree) -> Self {
        Self::new(branch_path_hashes(tree))
    }

    pub fn from_state(state: &DomState) -> Self {
        Self::new(state.branch_path_hashes())
    }

    pub fn cached_hashes(&self) -> &HashSet<String> {
        &self.cached
    }

    pub fn check(&self, tree: &DomTree) -> GateVerdict {
        self.check_hashes(&branch_path_hashes(tree))
    }

    pub fn check_hashes(&self, current: &HashSet<String>) -> GateVerdict {
        let mut hashes: Vec<String> = current.difference(&self.cached).cloned().collect();
        if hashes.is_empty() {
            GateVerdict::Clear
        } else {
            hashes.sort();
            GateVerdict::NewElements { hashes }
        }
    }
}

fn branch_path_hashes(tree: &DomTree) -> HashSet<String> {
    tree.selector_map()
        .iter()
        .filter_map(|(_, id)| tree.element(id))
        .map(|element| element.hash().branch_path_hash.clone())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub results: Vec<ActionResult>,
    /// Position of the first action not executed because the page changed.
    pub aborted_at: Option<usize>,
}

/// Executes a sequence of actions, re-checking the page between element-targeted ones.
pub struct ActionBatch<'a> {
    processor: &'a DomProcessor,
    config: SafetyConfig,
    delay_between_actions: Duration,
}

impl<'a> ActionBatch<'a> {
    pub fn new(processor: &'a DomProcessor, config: SafetyConfig) -> Self {
        Self {
            processor,
            config,
            delay_between_actions: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_between_actions = delay;
        self
    }

    pub async fn run<S, E>(
        &self,
        source: &S,
        executor: &E,
        actions: &[ActionModel],
    ) -> Result<BatchOutcome>
    where
        S: SnapshotSource + ?Sized,
        E: ActionExecutor + ?Sized,
    {
        let state = self.processor.capture(source).await?;
        self.run_from(state, source, executor, actions).await
    }

    /// Like [`run`](Self::run), with `state` as the page the indices were chosen on.
    pub async fn run_from<S, E>(
        &self,
        mut state: DomState,
        source: &S,
        executor: &E,
        actions: &[ActionModel],
    ) -> Result<BatchOutcome>
    where
        S: SnapshotSource + ?Sized,
        E: ActionExecutor + ?Sized,
    {
        let gate = SafetyGate::from_state(&state);
        let mut outcome = BatchOutcome::default();

        for (i, action) in actions.iter().enumerate() {
            if i > 0 && action.index().is_some() {
                state = self.processor.capture(source).await?;

                if self.config.check_for_new_elements {
                    if let GateVerdict::NewElements { hashes } = gate.check(&state.tree) {
                        let message = format!(
                            "Something new appeared after action {} / {}",
                            i,
                            actions.len()
                        );
                        warn!("{} ({} new element paths)", message, hashes.len());
                        outcome.results.push(ActionResult::success_with_data(
                            message,
                            json!({ "new_hashes": hashes }),
                        ));
                        outcome.aborted_at = Some(i);
                        break;
                    }
                }
            }

            let result = executor.execute(action, &state).await?;
            debug!(
                "Action {}/{} ({}) -> {}",
                i + 1,
                actions.len(),
                action.name().unwrap_or("?"),
                result.message
            );

            let stop = result.is_done || !result.success;
            outcome.results.push(result);
            if stop || i + 1 == actions.len() {
                break;
            }

            if !self.delay_between_actions.is_zero() {
                tokio::time::sleep(self.delay_between_actions).await;
            }
        }

        Ok(outcome)
    }
}
