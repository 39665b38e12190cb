use crate::types::{CoordinateSet, ViewportInfo};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub const TEXT_NODE_TYPE: &str = "TEXT_NODE";

/// Node id as emitted by an extractor: either a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Text(id) => write!(f, "{}", id),
            RawId::Number(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for RawId {
    fn from(id: &str) -> Self {
        RawId::Text(id.to_string())
    }
}

impl From<String> for RawId {
    fn from(id: String) -> Self {
        RawId::Text(id)
    }
}

/// Flat snapshot payload produced by the extraction step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    #[serde(alias = "map")]
    pub nodes: HashMap<String, RawNode>,
    #[serde(alias = "root_id")]
    pub root_id: RawId,
}

/// One node record. Text records carry `type: "TEXT_NODE"`; everything else must name a tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, alias = "tag", skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(
        default,
        alias = "childIds",
        alias = "child_ids",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<RawId>,
    #[serde(default, alias = "visible")]
    pub is_visible: bool,
    #[serde(default, alias = "interactive")]
    pub is_interactive: bool,
    #[serde(default, alias = "top_element")]
    pub is_top_element: bool,
    #[serde(default, alias = "in_viewport")]
    pub is_in_viewport: bool,
    #[serde(
        default,
        alias = "interaction_index",
        alias = "interactionIndex",
        skip_serializing_if = "Option::is_none"
    )]
    pub highlight_index: Option<usize>,
    #[serde(default, alias = "shadow_root")]
    pub shadow_root: bool,
    #[serde(
        default,
        alias = "viewportSize",
        alias = "viewport_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub viewport: Option<ViewportInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_coordinates: Option<CoordinateSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport_coordinates: Option<CoordinateSet>,
}

impl RawNode {
    pub fn text(text: impl Into<String>, is_visible: bool) -> Self {
        Self {
            node_type: Some(TEXT_NODE_TYPE.to_string()),
            text: Some(text.into()),
            is_visible,
            ..Default::default()
        }
    }

    pub fn element(tag_name: impl Into<String>, xpath: impl Into<String>) -> Self {
        Self {
            tag_name: Some(tag_name.into()),
            xpath: Some(xpath.into()),
            ..Default::default()
        }
    }

    /// Tagged `TEXT_NODE`, or carrying `text` without any tag name.
    pub fn is_text(&self) -> bool {
        self.node_type.as_deref() == Some(TEXT_NODE_TYPE)
            || (self.text.is_some() && self.tag_name.is_none())
    }
}
