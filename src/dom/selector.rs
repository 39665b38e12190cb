use crate::dom::element::{ElementNode, NodeId};
use crate::dom::DomTree;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Attribute the extractor stamps on indexed elements; used by the coarse fallback selector.
pub const INDEX_MARKER_ATTRIBUTE: &str = "highlight_index";

const SAFE_ATTRIBUTES: &[&str] = &[
    "id",
    "name",
    "type",
    "placeholder",
    "role",
    "for",
    "autocomplete",
    "required",
    "readonly",
    "alt",
    "title",
    "src",
    "href",
    "target",
];

const DYNAMIC_ATTRIBUTES: &[&str] = &["data-id", "data-qa", "data-cy", "data-testid"];

const UNSAFE_VALUE_CHARS: &[char] = &['"', '\'', '<', '>', '`', '\n', '\r', '\t'];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("xpath is empty")]
    EmptyXPath,

    #[error("unbalanced predicate in xpath segment '{0}'")]
    UnbalancedPredicate(String),

    #[error("invalid tag in xpath segment '{0}'")]
    InvalidSegment(String),
}

fn class_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_-]*$").expect("class name pattern is valid")
    })
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Converts a positional xpath (`/html/body/div[2]/a`) into a child-combinator CSS path.
pub fn xpath_to_css(xpath: &str) -> Result<String, SelectorError> {
    let mut css_parts = Vec::new();

    for part in xpath.trim_start_matches('/').split('/') {
        if part.is_empty() {
            continue;
        }

        let (tag, predicates) = match part.find('[') {
            Some(start) => (&part[..start], Some(&part[start..])),
            None => (part, None),
        };
        if tag.is_empty()
            || tag
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | ']' | '>' | '<'))
        {
            return Err(SelectorError::InvalidSegment(part.to_string()));
        }

        let mut css = tag.replace(':', "\\:");
        if let Some(predicates) = predicates {
            for predicate in split_predicates(part, predicates)? {
                if !predicate.is_empty() && predicate.chars().all(|c| c.is_ascii_digit()) {
                    css.push_str(&format!(":nth-of-type({})", predicate));
                } else if predicate == "last()" {
                    css.push_str(":last-of-type");
                } else if predicate.contains("position()") && predicate.contains(">1") {
                    css.push_str(":nth-of-type(n+2)");
                }
            }
        }
        css_parts.push(css);
    }

    if css_parts.is_empty() {
        return Err(SelectorError::EmptyXPath);
    }
    Ok(css_parts.join(" > "))
}

fn split_predicates<'a>(part: &str, predicates: &'a str) -> Result<Vec<&'a str>, SelectorError> {
    let mut found = Vec::new();
    let mut rest = predicates;
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .ok_or_else(|| SelectorError::UnbalancedPredicate(part.to_string()))?;
        let end = inner
            .find(']')
            .ok_or_else(|| SelectorError::UnbalancedPredicate(part.to_string()))?;
        found.push(inner[..end].trim());
        rest = &inner[end + 1..];
    }
    Ok(found)
}

fn is_safe_attribute(name: &str, include_dynamic_attributes: bool) -> bool {
    SAFE_ATTRIBUTES.contains(&name)
        || name.starts_with("aria-")
        || (include_dynamic_attributes && DYNAMIC_ATTRIBUTES.contains(&name))
}

fn attribute_term(name: &str, value: &str) -> String {
    let name = name.replace(':', "\\:");
    if value.is_empty() {
        format!("[{}]", name)
    } else if value.contains(UNSAFE_VALUE_CHARS) {
        let collapsed = whitespace_pattern().replace_all(value, " ");
        let escaped = collapsed.trim().replace('"', "\\\"");
        format!("[{}*=\"{}\"]", name, escaped)
    } else {
        format!("[{}=\"{}\"]", name, value)
    }
}

fn try_enhanced_selector(
    element: &ElementNode,
    include_dynamic_attributes: bool,
) -> Result<String, SelectorError> {
    let mut selector = xpath_to_css(&element.xpath)?;

    if include_dynamic_attributes {
        if let Some(classes) = element.attributes.get("class") {
            for class_name in classes.split_whitespace() {
                if class_name_pattern().is_match(class_name) {
                    selector.push('.');
                    selector.push_str(class_name);
                }
            }
        }
    }

    for (name, value) in &element.attributes {
        if name == "class" || name.trim().is_empty() {
            continue;
        }
        if !is_safe_attribute(name, include_dynamic_attributes) {
            continue;
        }
        selector.push_str(&attribute_term(name, value));
    }

    Ok(selector)
}

/// Coarse selector matching the extractor's index marker.
pub fn fallback_selector(element: &ElementNode) -> String {
    let tag = if element.tag_name.trim().is_empty() {
        "*"
    } else {
        element.tag_name.as_str()
    };
    match element.interaction_index {
        Some(index) => format!("{}[{}='{}']", tag, INDEX_MARKER_ATTRIBUTE, index),
        None => tag.to_string(),
    }
}

/// CSS selector for `element`. Never fails: falls back to [`fallback_selector`].
pub fn enhanced_css_selector(element: &ElementNode, include_dynamic_attributes: bool) -> String {
    match try_enhanced_selector(element, include_dynamic_attributes) {
        Ok(selector) => selector,
        Err(e) => {
            debug!(
                "Selector synthesis failed for <{}> ({}), using fallback",
                element.tag_name, e
            );
            fallback_selector(element)
        }
    }
}

/// Frame-boundary ancestors of `id`, outermost first.
pub fn frame_chain(tree: &DomTree, id: NodeId) -> Vec<NodeId> {
    let mut frames: Vec<NodeId> = tree
        .ancestors(id)
        .filter(|ancestor| {
            tree.element(*ancestor)
                .is_some_and(ElementNode::is_frame_boundary)
        })
        .collect();
    frames.reverse();
    frames
}

/// Frame selectors to enter, in order, followed by the selector inside the innermost frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorPath {
    pub frames: Vec<String>,
    pub target: String,
}

impl LocatorPath {
    pub fn in_frame(&self) -> bool {
        !self.frames.is_empty()
    }
}

impl fmt::Display for LocatorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            write!(f, "{} >> ", frame)?;
        }
        write!(f, "{}", self.target)
    }
}

pub fn locator_path(
    tree: &DomTree,
    id: NodeId,
    include_dynamic_attributes: bool,
) -> Option<LocatorPath> {
    let element = tree.element(id)?;
    let frames = frame_chain(tree, id)
        .into_iter()
        .filter_map(|frame| tree.element(frame))
        .map(|frame| enhanced_css_selector(frame, include_dynamic_attributes))
        .collect();

    Some(LocatorPath {
        frames,
        target: enhanced_css_selector(element, include_dynamic_attributes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ElementSpec, SnapshotFixture};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn element(tag: &str, xpath: &str, attributes: &[(&str, &str)]) -> ElementNode {
        let attributes: BTreeMap<String, String> = attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ElementNode::new(tag.to_string(), xpath.to_string()).with_attributes(attributes)
    }

    #[test]
    fn test_xpath_predicates() {
        assert_eq!(
            xpath_to_css("/html/body/div[2]/ul/li[last()]").unwrap(),
            "html > body > div:nth-of-type(2) > ul > li:last-of-type"
        );
        assert_eq!(
            xpath_to_css("html/body/p[position()>1]").unwrap(),
            "html > body > p:nth-of-type(n+2)"
        );
        assert_eq!(
            xpath_to_css("/html/body/svg:svg/svg:path[3]").unwrap(),
            "html > body > svg\\:svg > svg\\:path:nth-of-type(3)"
        );
    }

    #[test]
    fn test_xpath_errors() {
        assert_eq!(xpath_to_css(""), Err(SelectorError::EmptyXPath));
        assert_eq!(xpath_to_css("///"), Err(SelectorError::EmptyXPath));
        assert!(matches!(
            xpath_to_css("/html/body/div[2"),
            Err(SelectorError::UnbalancedPredicate(_))
        ));
        assert!(matches!(
            xpath_to_css("/html/[1]"),
            Err(SelectorError::InvalidSegment(_))
        ));
    }

    #[test]
    fn test_safelisted_attributes_and_classes() {
        let button = element(
            "button",
            "/html/body/button",
            &[
                ("type", "submit"),
                ("class", "btn primary 9bad"),
                ("onclick", "go()"),
                ("aria-pressed", "false"),
                ("data-testid", "send"),
            ],
        );

        assert_eq!(
            enhanced_css_selector(&button, true),
            "html > body > button.btn.primary[aria-pressed=\"false\"][data-testid=\"send\"][type=\"submit\"]"
        );
        assert_eq!(
            enhanced_css_selector(&button, false),
            "html > body > button[aria-pressed=\"false\"][type=\"submit\"]"
        );
    }

    #[test]
    fn test_awkward_values_use_contains_match() {
        let input = element(
            "input",
            "/html/body/input",
            &[
                ("title", "Say \"hi\"\n  <now>"),
                ("required", ""),
            ],
        );
        assert_eq!(
            enhanced_css_selector(&input, true),
            "html > body > input[required][title*=\"Say \\\"hi\\\" <now>\"]"
        );
    }

    #[test]
    fn test_fallback_never_fails() {
        let mut broken = element("a", "", &[("href", "'\n<>\"")]);
        broken.interaction_index = Some(7);
        assert_eq!(enhanced_css_selector(&broken, true), "a[highlight_index='7']");

        let anonymous = element("", "/html/body/[", &[]);
        assert_eq!(enhanced_css_selector(&anonymous, true), "*");
    }

    #[test]
    fn test_nested_frames_are_listed_outermost_first() {
        let mut fx = SnapshotFixture::new("html", "/html");
        let outer = fx.element(
            &fx.root_id(),
            ElementSpec::new("iframe", "/html/iframe").attr("id", "outer"),
        );
        let body = fx.element(&outer, ElementSpec::new("body", "/html/body"));
        let inner = fx.element(
            &body,
            ElementSpec::new("iframe", "/html/body/iframe").attr("name", "inner"),
        );
        fx.element(
            &inner,
            ElementSpec::new("button", "/html/body/button").index(0),
        );
        let tree = fx.tree().unwrap();

        let (button, _) = tree.element_by_index(0).unwrap();
        assert_eq!(frame_chain(&tree, button).len(), 2);

        let path = locator_path(&tree, button, true).unwrap();
        assert!(path.in_frame());
        assert_eq!(
            path.frames,
            vec![
                "html > iframe[id=\"outer\"]".to_string(),
                "html > body > iframe[name=\"inner\"]".to_string(),
            ]
        );
        assert_eq!(
            path.to_string(),
            "html > iframe[id=\"outer\"] >> html > body > iframe[name=\"inner\"] >> html > body > button"
        );
    }
}
