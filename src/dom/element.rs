use crate::dom::hash::HashedIdentity;
use crate::types::{CoordinateSet, ViewportInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Handle into a [`crate::dom::DomTree`] arena. Only meaningful for the tree that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(TextNode),
}

impl DomNode {
    pub fn parent(&self) -> Option<NodeId> {
        match self {
            DomNode::Element(element) => element.parent,
            DomNode::Text(text) => text.parent,
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            DomNode::Element(element) => element.is_visible,
            DomNode::Text(text) => text.is_visible,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            DomNode::Element(element) => Some(element),
            DomNode::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            DomNode::Text(text) => Some(text),
            DomNode::Element(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag_name: String,
    pub xpath: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<NodeId>,
    pub is_visible: bool,
    pub is_interactive: bool,
    pub is_top_element: bool,
    pub is_in_viewport: bool,
    pub shadow_root: bool,
    pub interaction_index: Option<usize>,
    pub page_coordinates: Option<CoordinateSet>,
    pub viewport_coordinates: Option<CoordinateSet>,
    pub viewport_info: Option<ViewportInfo>,
    pub parent: Option<NodeId>,
    pub(crate) hash: HashedIdentity,
}

impl ElementNode {
    pub fn new(tag_name: String, xpath: String) -> Self {
        Self {
            tag_name,
            xpath,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            is_visible: false,
            is_interactive: false,
            is_top_element: false,
            is_in_viewport: false,
            shadow_root: false,
            interaction_index: None,
            page_coordinates: None,
            viewport_coordinates: None,
            viewport_info: None,
            parent: None,
            hash: HashedIdentity::of_parts::<&str>(&[], &BTreeMap::new(), ""),
        }
    }

    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_parent(mut self, parent: Option<NodeId>) -> Self {
        self.parent = parent;
        self
    }

    /// Fingerprint computed once at ingestion.
    pub fn hash(&self) -> &HashedIdentity {
        &self.hash
    }

    pub fn is_frame_boundary(&self) -> bool {
        self.tag_name.eq_ignore_ascii_case("iframe")
    }
}

impl fmt::Display for ElementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag_name)?;
        for (key, value) in &self.attributes {
            write!(f, " {}=\"{}\"", key, value)?;
        }
        write!(f, ">")?;

        let mut extras = Vec::new();
        if self.is_interactive {
            extras.push("interactive".to_string());
        }
        if self.is_top_element {
            extras.push("top".to_string());
        }
        if self.shadow_root {
            extras.push("shadow-root".to_string());
        }
        if let Some(index) = self.interaction_index {
            extras.push(format!("highlight:{}", index));
        }
        if !extras.is_empty() {
            write!(f, " [{}]", extras.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TextNode {
    pub text: String,
    pub is_visible: bool,
    pub parent: Option<NodeId>,
}

impl TextNode {
    pub fn new(text: String, is_visible: bool) -> Self {
        Self {
            text,
            is_visible,
            parent: None,
        }
    }
}
