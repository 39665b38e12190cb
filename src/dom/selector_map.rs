use crate::dom::element::NodeId;
use std::collections::BTreeMap;

/// Interaction index to element handle, derived once per tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorMap {
    entries: BTreeMap<usize, NodeId>,
}

impl SelectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous holder of `index`, if any.
    pub(crate) fn insert(&mut self, index: usize, id: NodeId) -> Option<NodeId> {
        self.entries.insert(index, id)
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.entries.get(&index).copied()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.entries.iter().map(|(index, id)| (*index, *id))
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_previous_holder() {
        let mut map = SelectorMap::new();
        assert!(map.is_empty());
        assert_eq!(map.insert(4, NodeId(1)), None);
        assert_eq!(map.insert(4, NodeId(2)), Some(NodeId(1)));
        assert_eq!(map.get(4), Some(NodeId(2)));
        assert!(!map.contains(5));
    }

    #[test]
    fn test_iteration_is_ordered() {
        let mut map = SelectorMap::new();
        map.insert(7, NodeId(0));
        map.insert(2, NodeId(1));
        map.insert(5, NodeId(2));
        assert_eq!(map.indices().collect::<Vec<_>>(), vec![2, 5, 7]);
    }
}
