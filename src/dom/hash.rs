use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Structural fingerprint of an element.
///
/// Built only from the ancestor tag path, the attribute map and the xpath. Interaction
/// index, coordinates and text are left out so the same logical element keeps its
/// fingerprint across snapshots where those values shift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashedIdentity {
    pub branch_path_hash: String,
    pub attributes_hash: String,
    pub xpath_hash: String,
}

impl HashedIdentity {
    /// `branch_path` is root-first and excludes the element itself.
    pub fn of_parts<S: AsRef<str>>(
        branch_path: &[S],
        attributes: &BTreeMap<String, String>,
        xpath: &str,
    ) -> Self {
        Self {
            branch_path_hash: branch_path_hash(branch_path),
            attributes_hash: attributes_hash(attributes),
            xpath_hash: sha256_hex(xpath),
        }
    }
}

pub fn branch_path_hash<S: AsRef<str>>(branch_path: &[S]) -> String {
    let joined = branch_path
        .iter()
        .map(|tag| tag.as_ref())
        .collect::<Vec<_>>()
        .join("/");
    sha256_hex(&joined)
}

pub fn attributes_hash(attributes: &BTreeMap<String, String>) -> String {
    let rendered: String = attributes
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    sha256_hex(&rendered)
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ElementSpec, SnapshotFixture};

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_hash_is_idempotent() {
        let a = HashedIdentity::of_parts(&["html", "body"], &attrs(&[("id", "x")]), "/html/body/a");
        let b = HashedIdentity::of_parts(&["html", "body"], &attrs(&[("id", "x")]), "/html/body/a");
        assert_eq!(a, b);
        assert_eq!(a.xpath_hash.len(), 64);
    }

    #[test]
    fn test_each_part_is_sensitive() {
        let base = HashedIdentity::of_parts(&["html", "body"], &attrs(&[("id", "x")]), "/html/body/a");

        let path = HashedIdentity::of_parts(&["html", "main"], &attrs(&[("id", "x")]), "/html/body/a");
        assert_ne!(base.branch_path_hash, path.branch_path_hash);
        assert_eq!(base.attributes_hash, path.attributes_hash);

        let attr = HashedIdentity::of_parts(&["html", "body"], &attrs(&[("id", "y")]), "/html/body/a");
        assert_ne!(base.attributes_hash, attr.attributes_hash);

        let xpath = HashedIdentity::of_parts(&["html", "body"], &attrs(&[("id", "x")]), "/html/body/b");
        assert_ne!(base.xpath_hash, xpath.xpath_hash);
    }

    fn identity_of(tag_name: &str, xpath: &str) -> HashedIdentity {
        let mut fx = SnapshotFixture::new("body", "/body");
        let root = fx.root_id();
        fx.element(&root, ElementSpec::new(tag_name, xpath).index(0));
        let tree = fx.tree().unwrap();
        tree.element_by_index(0).unwrap().1.hash().clone()
    }

    #[test]
    fn test_tag_change_reaches_identity_through_xpath() {
        let button = identity_of("button", "/body/button");
        let link = identity_of("a", "/body/a");
        assert_ne!(button.xpath_hash, link.xpath_hash);
        assert_ne!(button, link);

        // Tag name is not hashed on its own; a retagged element at the same xpath collides.
        assert_eq!(identity_of("button", "/body/x"), identity_of("a", "/body/x"));
    }

    #[test]
    fn test_attribute_insertion_order_is_irrelevant() {
        let mut first = BTreeMap::new();
        first.insert("type".to_string(), "submit".to_string());
        first.insert("id".to_string(), "go".to_string());
        let mut second = BTreeMap::new();
        second.insert("id".to_string(), "go".to_string());
        second.insert("type".to_string(), "submit".to_string());
        assert_eq!(attributes_hash(&first), attributes_hash(&second));
    }
}
