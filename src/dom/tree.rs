use crate::dom::element::{DomNode, ElementNode, NodeId, TextNode};
use crate::dom::hash::HashedIdentity;
use crate::dom::selector_map::SelectorMap;

/// One ingested snapshot: a flat node store plus the derived selector map.
///
/// Nodes never change after ingestion. Parent links are handles into the same store and
/// are only followed upwards; ownership and iteration go through `children`.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<DomNode>,
    root: NodeId,
    selector_map: SelectorMap,
}

impl DomTree {
    /// Finalizes a tree assembled by the ingestor: fills in every element's fingerprint.
    pub(crate) fn assemble(nodes: Vec<DomNode>, root: NodeId, selector_map: SelectorMap) -> Self {
        let mut tree = Self {
            nodes,
            root,
            selector_map,
        };

        let hashes: Vec<Option<HashedIdentity>> = (0..tree.nodes.len())
            .map(|i| {
                let id = NodeId(i as u32);
                tree.element(id).map(|element| {
                    HashedIdentity::of_parts(
                        &tree.ancestor_tag_path(id),
                        &element.attributes,
                        &element.xpath,
                    )
                })
            })
            .collect();

        for (node, hash) in tree.nodes.iter_mut().zip(hashes) {
            if let (DomNode::Element(element), Some(hash)) = (node, hash) {
                element.hash = hash;
            }
        }

        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_element(&self) -> &ElementNode {
        match &self.nodes[self.root.index()] {
            DomNode::Element(element) => element,
            DomNode::Text(_) => unreachable!("ingestion rejects text roots"),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn selector_map(&self) -> &SelectorMap {
        &self.selector_map
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.index())
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementNode> {
        self.node(id).and_then(DomNode::as_element)
    }

    pub fn text(&self, id: NodeId) -> Option<&TextNode> {
        self.node(id).and_then(DomNode::as_text)
    }

    /// Element currently carrying `index`.
    pub fn element_by_index(&self, index: usize) -> Option<(NodeId, &ElementNode)> {
        let id = self.selector_map.get(index)?;
        self.element(id).map(|element| (id, element))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(DomNode::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id)
            .map(|element| element.children.as_slice())
            .unwrap_or(&[])
    }

    /// Walks parent links, nearest ancestor first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Tag names from the root down to the element's parent. The element itself is excluded.
    pub fn ancestor_tag_path(&self, id: NodeId) -> Vec<String> {
        let mut path: Vec<String> = self
            .ancestors(id)
            .filter_map(|ancestor| self.element(ancestor))
            .map(|element| element.tag_name.clone())
            .collect();
        path.reverse();
        path
    }

    /// Document-order traversal of every node reachable from the root.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![self.root],
        }
    }

    pub fn has_indexed_ancestor(&self, id: NodeId) -> bool {
        self.ancestors(id).any(|ancestor| {
            self.element(ancestor)
                .is_some_and(|element| element.interaction_index.is_some())
        })
    }

    pub fn parent_in_viewport(&self, id: NodeId) -> bool {
        self.parent(id)
            .and_then(|parent| self.element(parent))
            .is_some_and(|element| element.is_in_viewport)
    }

    pub fn parent_is_top_element(&self, id: NodeId) -> bool {
        self.parent(id)
            .and_then(|parent| self.element(parent))
            .is_some_and(|element| element.is_top_element)
    }

    /// Text under `id`, stopping at any descendant that carries its own interaction index.
    pub fn text_until_next_interactive(&self, id: NodeId, max_depth: Option<usize>) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let mut stack = vec![(id, 0usize)];

        while let Some((current, depth)) = stack.pop() {
            if max_depth.is_some_and(|max| depth > max) {
                continue;
            }
            match self.node(current) {
                Some(DomNode::Text(text)) => parts.push(&text.text),
                Some(DomNode::Element(element)) => {
                    if current != id && element.interaction_index.is_some() {
                        continue;
                    }
                    for child in element.children.iter().rev() {
                        stack.push((*child, depth + 1));
                    }
                }
                None => {}
            }
        }

        parts.join("\n").trim().to_string()
    }

    /// Compact listing of indexed elements and free-standing visible text, one per line.
    pub fn interactive_elements_to_string(&self, include_attributes: &[String]) -> String {
        let mut lines = Vec::new();

        for id in self.preorder() {
            match self.node(id) {
                Some(DomNode::Element(element)) => {
                    let Some(index) = element.interaction_index else {
                        continue;
                    };
                    let text = self.text_until_next_interactive(id, None);

                    let mut attribute_values: Vec<&str> = Vec::new();
                    for (key, value) in &element.attributes {
                        if !include_attributes.iter().any(|wanted| wanted == key) {
                            continue;
                        }
                        if value == &element.tag_name || value == &text {
                            continue;
                        }
                        if !attribute_values.contains(&value.as_str()) {
                            attribute_values.push(value);
                        }
                    }
                    let attributes = attribute_values.join(";");

                    let mut line = format!("[{}]<{} ", index, element.tag_name);
                    line.push_str(&attributes);
                    if !text.is_empty() {
                        if !attributes.is_empty() {
                            line.push('>');
                        }
                        line.push_str(&text);
                    }
                    line.push_str("/>");
                    lines.push(line);
                }
                Some(DomNode::Text(text)) => {
                    if text.is_visible && !self.has_indexed_ancestor(id) {
                        lines.push(text.text.clone());
                    }
                }
                None => {}
            }
        }

        lines.join("\n")
    }
}

pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct Preorder<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ElementSpec, SnapshotFixture};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn sample_tree() -> DomTree {
        let mut fx = SnapshotFixture::new("html", "/html");
        let body = fx.element(&fx.root_id(), ElementSpec::new("body", "/html/body"));
        fx.text(&body, "Welcome");
        let form = fx.element(&body, ElementSpec::new("form", "/html/body/form"));
        let button = fx.element(
            &form,
            ElementSpec::new("button", "/html/body/form/button")
                .index(0)
                .attr("type", "submit")
                .attr("title", "Send"),
        );
        fx.text(&button, "Send it");
        let link = fx.element(
            &body,
            ElementSpec::new("a", "/html/body/a").index(1).attr("href", "/next"),
        );
        let span = fx.element(&link, ElementSpec::new("span", "/html/body/a/span"));
        fx.text(&span, "Next page");
        fx.tree().unwrap()
    }

    #[test]
    fn test_every_child_points_back_to_parent() {
        let tree = sample_tree();
        for id in tree.preorder() {
            if id == tree.root() {
                assert_eq!(tree.parent(id), None);
                continue;
            }
            let parent = tree.parent(id).expect("non-root has a parent");
            assert!(tree.children(parent).contains(&id));
        }
    }

    #[test]
    fn test_preorder_visits_each_node_once() {
        let tree = sample_tree();
        let visited: Vec<NodeId> = tree.preorder().collect();
        let unique: HashSet<NodeId> = visited.iter().copied().collect();
        assert_eq!(visited.len(), tree.len());
        assert_eq!(unique.len(), tree.len());
    }

    #[test]
    fn test_ancestor_tag_path_is_root_first() {
        let tree = sample_tree();
        let (button, _) = tree.element_by_index(0).unwrap();
        assert_eq!(tree.ancestor_tag_path(button), vec!["html", "body", "form"]);
        assert!(tree.ancestor_tag_path(tree.root()).is_empty());
    }

    #[test]
    fn test_text_collection_stops_at_indexed_descendants() {
        let tree = sample_tree();
        let (link, _) = tree.element_by_index(1).unwrap();
        assert_eq!(tree.text_until_next_interactive(link, None), "Next page");
        assert_eq!(tree.text_until_next_interactive(link, Some(1)), "");

        let body = tree.children(tree.root())[0];
        assert_eq!(tree.text_until_next_interactive(body, None), "Welcome");
    }

    #[test]
    fn test_interactive_listing() {
        let tree = sample_tree();
        let listing = tree.interactive_elements_to_string(&["title".to_string()]);
        assert_eq!(
            listing,
            "Welcome\n[0]<button Send>Send it/>\n[1]<a Next page/>"
        );
    }

    #[test]
    fn test_parent_flag_lookups() {
        let tree = sample_tree();
        let (button, _) = tree.element_by_index(0).unwrap();
        let label = tree.children(button)[0];
        assert!(tree.has_indexed_ancestor(label));
        assert!(tree.parent_in_viewport(label));
        assert!(tree.parent_is_top_element(label));
        assert!(!tree.has_indexed_ancestor(button));
    }
}
