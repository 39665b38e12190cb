use crate::dom::{DomTree, NodeId};
use crate::history::element::HistoryElement;
use tracing::debug;

/// Re-identifies recorded elements in fresh snapshots by structural fingerprint.
pub struct HistoryTreeProcessor;

impl HistoryTreeProcessor {
    pub fn convert_dom_element_to_history_element(
        tree: &DomTree,
        id: NodeId,
        include_dynamic_attributes: bool,
    ) -> Option<HistoryElement> {
        HistoryElement::capture(tree, id, include_dynamic_attributes)
    }

    /// First indexed element, in pre-order, whose fingerprint equals the recorded one.
    pub fn find_history_element_in_tree(
        history: &HistoryElement,
        tree: &DomTree,
    ) -> Option<NodeId> {
        let wanted = history.hash();
        let found = tree.preorder().find(|id| {
            tree.element(*id).is_some_and(|element| {
                element.interaction_index.is_some() && *element.hash() == wanted
            })
        });

        if found.is_none() {
            debug!("No element in current tree matches {}", history);
        }
        found
    }

    pub fn compare_history_element_and_dom_element(
        history: &HistoryElement,
        tree: &DomTree,
        id: NodeId,
    ) -> bool {
        tree.element(id)
            .is_some_and(|element| *element.hash() == history.hash())
    }
}
