//! Builders for snapshot payloads, shared by unit and integration tests.

use crate::actions::{ActionExecutor, ActionModel, ActionResult};
use crate::core::source::{PageInfo, SnapshotSource};
use crate::dom::raw::{RawId, RawNode, RawSnapshot};
use crate::dom::{DomState, DomTree};
use crate::errors::{DomError, Result};
use crate::types::{CoordinateSet, ViewportInfo};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Element record under construction. Defaults to visible, top-most and in viewport.
#[derive(Debug, Clone)]
pub struct ElementSpec {
    node: RawNode,
}

impl ElementSpec {
    pub fn new(tag_name: &str, xpath: &str) -> Self {
        let mut node = RawNode::element(tag_name, xpath);
        node.is_visible = true;
        node.is_top_element = true;
        node.is_in_viewport = true;
        Self { node }
    }

    /// Marks the element as agent-actionable under `index`.
    pub fn index(mut self, index: usize) -> Self {
        self.node.highlight_index = Some(index);
        self.node.is_interactive = true;
        self
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.node.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn shadow_root(mut self) -> Self {
        self.node.shadow_root = true;
        self
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.node.page_coordinates = Some(CoordinateSet::from_rect(x, y, width, height));
        self.node.viewport_coordinates = Some(CoordinateSet::from_rect(x, y, width, height));
        self.node.viewport = Some(ViewportInfo::new(1280, 720));
        self
    }
}

/// Assembles a [`RawSnapshot`] node by node, assigning sequential string ids.
#[derive(Debug, Clone)]
pub struct SnapshotFixture {
    nodes: HashMap<String, RawNode>,
    root: String,
    next_id: usize,
}

impl SnapshotFixture {
    pub fn new(root_tag: &str, root_xpath: &str) -> Self {
        Self::with_root(ElementSpec::new(root_tag, root_xpath))
    }

    pub fn with_root(root: ElementSpec) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert("0".to_string(), root.node);
        Self {
            nodes,
            root: "0".to_string(),
            next_id: 1,
        }
    }

    pub fn root_id(&self) -> String {
        self.root.clone()
    }

    pub fn element(&mut self, parent: &str, spec: ElementSpec) -> String {
        self.push(parent, spec.node)
    }

    pub fn text(&mut self, parent: &str, text: &str) -> String {
        self.push(parent, RawNode::text(text, true))
    }

    fn push(&mut self, parent: &str, node: RawNode) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(RawId::Text(id.clone()));
        }
        self.nodes.insert(id.clone(), node);
        id
    }

    pub fn build(&self) -> RawSnapshot {
        RawSnapshot {
            nodes: self.nodes.clone(),
            root_id: RawId::Text(self.root.clone()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.build()).unwrap_or_default()
    }

    pub fn tree(&self) -> Result<DomTree> {
        DomTree::from_raw(&self.build())
    }
}

/// Serves queued snapshots one capture at a time, repeating the last one once drained.
pub struct ScriptedSource {
    page: PageInfo,
    queue: Mutex<VecDeque<RawSnapshot>>,
    last: Mutex<Option<RawSnapshot>>,
    captures: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(url: &str, snapshots: Vec<RawSnapshot>) -> Self {
        Self {
            page: PageInfo {
                url: url.to_string(),
                title: String::new(),
            },
            queue: Mutex::new(snapshots.into()),
            last: Mutex::new(None),
            captures: Mutex::new(0),
        }
    }

    pub fn captures(&self) -> usize {
        self.captures.lock().map(|count| *count).unwrap_or_default()
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn raw_snapshot(&self) -> Result<RawSnapshot> {
        *self.captures.lock().map_err(poisoned)? += 1;

        let next = self.queue.lock().map_err(poisoned)?.pop_front();
        let mut last = self.last.lock().map_err(poisoned)?;
        if let Some(snapshot) = next {
            *last = Some(snapshot);
        }
        last.clone()
            .ok_or_else(|| DomError::Extraction("no snapshot scripted".to_string()))
    }

    async fn page_info(&self) -> Result<PageInfo> {
        Ok(self.page.clone())
    }
}

fn poisoned<E>(_: E) -> DomError {
    DomError::Extraction("scripted source lock poisoned".to_string())
}

/// Executor that records every action it receives and reports success.
#[derive(Default)]
pub struct RecordingExecutor {
    executed: Mutex<Vec<ActionModel>>,
    fail_on: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions named `name` come back as failed results.
    pub fn failing_on(name: &str) -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            fail_on: Some(name.to_string()),
        }
    }

    pub fn executed(&self) -> Vec<ActionModel> {
        self.executed
            .lock()
            .map(|executed| executed.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, action: &ActionModel, _state: &DomState) -> Result<ActionResult> {
        self.executed
            .lock()
            .map_err(|_| DomError::Extraction("executor lock poisoned".to_string()))?
            .push(action.clone());

        let name = action.name().unwrap_or_default();
        if self.fail_on.as_deref() == Some(name) {
            return Ok(ActionResult::failure(format!("{} failed", name)));
        }
        let message = match action.index() {
            Some(index) => format!("{} on {}", name, index),
            None => name.to_string(),
        };
        Ok(ActionResult::success(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_json_round_trips_through_ingestion() {
        let mut fx = SnapshotFixture::new("body", "/html/body");
        let root = fx.root_id();
        let link = fx.element(&root, ElementSpec::new("a", "/html/body/a").index(0));
        fx.text(&link, "Home");

        let tree = DomTree::from_value(fx.to_json()).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.selector_map().len(), 1);
    }
}
