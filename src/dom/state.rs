use crate::dom::selector_map::SelectorMap;
use crate::dom::DomTree;
use std::collections::HashSet;

/// One observation of a page: where it was, what it looked like, and when.
#[derive(Debug, Clone)]
pub struct DomState {
    pub url: String,
    pub title: String,
    pub tree: DomTree,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DomState {
    pub fn new(url: String, title: String, tree: DomTree) -> Self {
        Self {
            url,
            title,
            tree,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn selector_map(&self) -> &SelectorMap {
        self.tree.selector_map()
    }

    pub fn interactive_count(&self) -> usize {
        self.tree.selector_map().len()
    }

    /// Branch-path fingerprints of every indexed element.
    pub fn branch_path_hashes(&self) -> HashSet<String> {
        self.tree
            .selector_map()
            .iter()
            .filter_map(|(_, id)| self.tree.element(id))
            .map(|element| element.hash().branch_path_hash.clone())
            .collect()
    }

    pub fn find_elements_by_tag(&self, tag_name: &str) -> Vec<usize> {
        self.tree
            .selector_map()
            .iter()
            .filter(|(_, id)| {
                self.tree
                    .element(*id)
                    .is_some_and(|element| element.tag_name == tag_name)
            })
            .map(|(index, _)| index)
            .collect()
    }

    pub fn find_elements_by_text(&self, text: &str) -> Vec<usize> {
        let needle = text.to_lowercase();
        self.tree
            .selector_map()
            .iter()
            .filter(|(_, id)| {
                self.tree
                    .text_until_next_interactive(*id, None)
                    .to_lowercase()
                    .contains(&needle)
            })
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ElementSpec, SnapshotFixture};

    fn state() -> DomState {
        let mut fx = SnapshotFixture::new("body", "/html/body");
        let root = fx.root_id();
        let first = fx.element(&root, ElementSpec::new("a", "/html/body/a[1]").index(0));
        fx.text(&first, "Pricing");
        let nav = fx.element(&root, ElementSpec::new("nav", "/html/body/nav"));
        let second = fx.element(&nav, ElementSpec::new("a", "/html/body/nav/a").index(1));
        fx.text(&second, "Docs");
        fx.element(&root, ElementSpec::new("button", "/html/body/button").index(2));
        DomState::new(
            "https://example.com".to_string(),
            "Example".to_string(),
            fx.tree().unwrap(),
        )
    }

    #[test]
    fn test_lookups() {
        let state = state();
        assert_eq!(state.interactive_count(), 3);
        assert_eq!(state.find_elements_by_tag("a"), vec![0, 1]);
        assert_eq!(state.find_elements_by_text("docs"), vec![1]);
    }

    #[test]
    fn test_branch_path_hashes_group_by_ancestry() {
        // `a[1]` and `button` share the body-only ancestry; the nav link does not.
        assert_eq!(state().branch_path_hashes().len(), 2);
    }
}
