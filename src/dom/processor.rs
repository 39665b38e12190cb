use crate::core::config::DomConfig;
use crate::core::SnapshotSource;
use crate::dom::element::{DomNode, ElementNode, NodeId, TextNode};
use crate::dom::raw::{RawNode, RawSnapshot};
use crate::dom::selector::{self, LocatorPath};
use crate::dom::selector_map::SelectorMap;
use crate::dom::{DomState, DomTree};
use crate::errors::{DomError, Result};
use crate::actions::{ActionModel, ActionResult};
use crate::history::{AgentHistory, HistoryElement};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

impl DomTree {
    /// Builds a tree from an extractor payload given as JSON.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawSnapshot = serde_json::from_value(value)
            .map_err(|e| DomError::MalformedSnapshot(e.to_string()))?;
        Self::from_raw(&raw)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawSnapshot =
            serde_json::from_str(json).map_err(|e| DomError::MalformedSnapshot(e.to_string()))?;
        Self::from_raw(&raw)
    }

    /// Builds a tree from a decoded payload.
    ///
    /// Children are attached strictly in `children` order. Missing child ids are skipped;
    /// an id reached a second time is a cycle and aborts the whole ingestion.
    pub fn from_raw(raw: &RawSnapshot) -> Result<Self> {
        let root_key = raw.root_id.key();
        let root_record = raw
            .nodes
            .get(&root_key)
            .ok_or_else(|| DomError::MissingRoot(root_key.clone()))?;
        if root_record.is_text() {
            return Err(DomError::NonElementRoot(root_key));
        }

        let mut nodes: Vec<DomNode> = Vec::with_capacity(raw.nodes.len());
        let mut selector_map = SelectorMap::new();
        let mut visited: HashSet<String> = HashSet::with_capacity(raw.nodes.len());
        let mut orphans = 0usize;
        let mut stack: Vec<(String, Option<NodeId>)> = vec![(root_key, None)];

        while let Some((key, parent)) = stack.pop() {
            let Some(record) = raw.nodes.get(&key) else {
                debug!("Skipping child '{}': not present in snapshot", key);
                orphans += 1;
                continue;
            };
            if !visited.insert(key.clone()) {
                return Err(DomError::CycleDetected(key));
            }

            let id = NodeId(u32::try_from(nodes.len()).map_err(|_| {
                DomError::MalformedSnapshot("snapshot has too many nodes".to_string())
            })?);
            let node = build_node(&key, record, parent)?;

            if let DomNode::Element(element) = &node {
                if let Some(index) = element.interaction_index {
                    if selector_map.insert(index, id).is_some() {
                        return Err(DomError::DuplicateInteractionIndex { index, id: key });
                    }
                }
                for child in record.children.iter().rev() {
                    stack.push((child.key(), Some(id)));
                }
            }

            nodes.push(node);
            if let Some(parent) = parent {
                if let DomNode::Element(parent_element) = &mut nodes[parent.index()] {
                    parent_element.children.push(id);
                }
            }
        }

        let unreachable = raw.nodes.len() - visited.len();
        debug!(
            "Ingested {} nodes ({} indexed, {} orphan refs, {} unreachable records)",
            nodes.len(),
            selector_map.len(),
            orphans,
            unreachable
        );

        Ok(DomTree::assemble(nodes, NodeId(0), selector_map))
    }
}

fn build_node(key: &str, record: &RawNode, parent: Option<NodeId>) -> Result<DomNode> {
    if record.is_text() {
        let mut text = TextNode::new(record.text.clone().unwrap_or_default(), record.is_visible);
        text.parent = parent;
        return Ok(DomNode::Text(text));
    }

    let tag_name = record.tag_name.clone().ok_or_else(|| {
        DomError::MalformedSnapshot(format!(
            "node '{}' has no tagName and is not a text node",
            key
        ))
    })?;

    let mut element = ElementNode::new(tag_name, record.xpath.clone().unwrap_or_default())
        .with_attributes(record.attributes.clone())
        .with_parent(parent);
    element.is_visible = record.is_visible;
    element.is_interactive = record.is_interactive;
    element.is_top_element = record.is_top_element;
    element.is_in_viewport = record.is_in_viewport;
    element.shadow_root = record.shadow_root;
    element.interaction_index = record.highlight_index;
    element.viewport_info = record.viewport.clone();
    element.page_coordinates = record.page_coordinates.clone();
    element.viewport_coordinates = record.viewport_coordinates.clone();

    Ok(DomNode::Element(element))
}

/// Turns snapshots from a [`SnapshotSource`] into page states and answers
/// selector/history questions about them with the configured options.
pub struct DomProcessor {
    config: DomConfig,
}

impl DomProcessor {
    pub fn new(config: DomConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DomConfig {
        &self.config
    }

    pub fn ingest(&self, raw: &RawSnapshot) -> Result<DomTree> {
        DomTree::from_raw(raw)
    }

    pub async fn capture<S: SnapshotSource + ?Sized>(&self, source: &S) -> Result<DomState> {
        let page = source.page_info().await?;
        let raw = source.raw_snapshot().await?;
        let tree = self.ingest(&raw)?;

        debug!(
            "Captured {} ({} nodes, {} interactive)",
            page.url,
            tree.len(),
            tree.selector_map().len()
        );

        Ok(DomState::new(page.url, page.title, tree))
    }

    /// Locator for the element holding `index`, frame chain included.
    pub fn locator_for_index(&self, tree: &DomTree, index: usize) -> Option<LocatorPath> {
        let id = tree.selector_map().get(index)?;
        selector::locator_path(tree, id, self.config.include_dynamic_attributes)
    }

    pub fn history_element_for_index(
        &self,
        tree: &DomTree,
        index: usize,
    ) -> Option<HistoryElement> {
        let id = tree.selector_map().get(index)?;
        HistoryElement::capture(tree, id, self.config.include_dynamic_attributes)
    }

    /// Records a completed step, capturing selectors with the configured attribute policy.
    pub fn record_step(
        &self,
        step_number: usize,
        started: DateTime<Utc>,
        actions: Vec<ActionModel>,
        result: Vec<ActionResult>,
        state: &DomState,
    ) -> AgentHistory {
        AgentHistory::record(
            step_number,
            started,
            actions,
            result,
            state,
            self.config.include_dynamic_attributes,
        )
    }

    pub fn describe(&self, tree: &DomTree) -> String {
        tree.interactive_elements_to_string(&self.config.include_attributes)
    }
}
