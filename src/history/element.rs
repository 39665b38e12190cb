use crate::dom::hash::HashedIdentity;
use crate::dom::selector::enhanced_css_selector;
use crate::dom::{DomTree, NodeId};
use crate::errors::Result;
use crate::types::{CoordinateSet, ViewportInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Detached record of an element an agent interacted with.
///
/// Holds no handles into any tree; it can be persisted and matched against later
/// snapshots of the same page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryElement {
    pub tag_name: String,
    pub xpath: String,
    #[serde(default)]
    pub highlight_index: Option<usize>,
    /// Ancestor tag names, root first, excluding the element itself.
    #[serde(default)]
    pub entire_parent_branch_path: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub shadow_root: bool,
    #[serde(default)]
    pub css_selector: Option<String>,
    #[serde(default)]
    pub page_coordinates: Option<CoordinateSet>,
    #[serde(default)]
    pub viewport_coordinates: Option<CoordinateSet>,
    #[serde(default)]
    pub viewport_info: Option<ViewportInfo>,
}

impl HistoryElement {
    /// Snapshot of element `id`. Text nodes and unknown ids yield `None`.
    pub fn capture(tree: &DomTree, id: NodeId, include_dynamic_attributes: bool) -> Option<Self> {
        let element = tree.element(id)?;
        Some(Self {
            tag_name: element.tag_name.clone(),
            xpath: element.xpath.clone(),
            highlight_index: element.interaction_index,
            entire_parent_branch_path: tree.ancestor_tag_path(id),
            attributes: element.attributes.clone(),
            shadow_root: element.shadow_root,
            css_selector: Some(enhanced_css_selector(element, include_dynamic_attributes)),
            page_coordinates: element.page_coordinates.clone(),
            viewport_coordinates: element.viewport_coordinates.clone(),
            viewport_info: element.viewport_info.clone(),
        })
    }

    pub fn hash(&self) -> HashedIdentity {
        HashedIdentity::of_parts(&self.entire_parent_branch_path, &self.attributes, &self.xpath)
    }

    pub fn to_record(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_record(record: Value) -> Result<Self> {
        Ok(serde_json::from_value(record)?)
    }
}

impl fmt::Display for HistoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = self.entire_parent_branch_path.join(" > ");
        if !path.is_empty() {
            path.push_str(" > ");
        }
        write!(f, "<{}> ", self.tag_name)?;
        if let Some(index) = self.highlight_index {
            write!(f, "[index={}] ", index)?;
        }
        write!(f, "{}{}", path, self.tag_name)
    }
}
