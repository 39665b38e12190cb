use crate::core::config::DomConfig;
use crate::dom::raw::{RawId, RawNode, RawSnapshot};
use crate::errors::{DomError, Result};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "meta", "link",
];

/// Offline extractor: turns static HTML into the same payload the in-page script emits.
///
/// There is no layout here, so visibility comes from markup hints only and every element
/// is treated as top-most and inside the viewport.
pub struct HtmlSnapshotBuilder {
    config: DomConfig,
}

struct Pending<'a> {
    element: ElementRef<'a>,
    key: String,
    xpath: String,
    parent_hidden: bool,
}

impl HtmlSnapshotBuilder {
    pub fn new(config: DomConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, html: &str) -> Result<RawSnapshot> {
        let document = Html::parse_document(html);
        let body_selector = Selector::parse("body")
            .map_err(|e| DomError::Extraction(format!("invalid body selector: {:?}", e)))?;
        let start = document
            .select(&body_selector)
            .next()
            .unwrap_or_else(|| document.root_element());

        let mut nodes: HashMap<String, RawNode> = HashMap::new();
        let mut next_id = 0usize;
        let mut next_index = 0usize;
        let mut stack = vec![Pending {
            element: start,
            key: allocate(&mut next_id),
            xpath: absolute_xpath(start),
            parent_hidden: false,
        }];
        let root_key = stack[0].key.clone();

        while let Some(pending) = stack.pop() {
            let element = pending.element;
            let tag_name = element.value().name().to_lowercase();
            let attributes: BTreeMap<String, String> = element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();

            let hidden = pending.parent_hidden || is_hidden_element(&attributes);
            let interactive = is_clickable_element(&tag_name, &attributes)
                || is_interactable_element(&tag_name, &attributes);

            let mut node = RawNode::element(tag_name, pending.xpath.clone());
            node.is_visible = !hidden;
            node.is_interactive = interactive;
            node.is_top_element = true;
            node.is_in_viewport = true;
            if interactive
                && (!hidden || self.config.include_hidden_elements)
                && self
                    .config
                    .max_interactive_elements
                    .map_or(true, |max| next_index < max)
            {
                node.highlight_index = Some(next_index);
                next_index += 1;
            }
            node.attributes = attributes;

            let mut children = Vec::new();
            for child in element.children() {
                match child.value() {
                    Node::Element(_) => {
                        let Some(child_element) = ElementRef::wrap(child) else {
                            continue;
                        };
                        if SKIPPED_TAGS.contains(&child_element.value().name()) {
                            continue;
                        }
                        let key = allocate(&mut next_id);
                        node.children.push(RawId::Text(key.clone()));
                        children.push(Pending {
                            element: child_element,
                            key,
                            xpath: format!("{}/{}", pending.xpath, xpath_segment(child_element)),
                            parent_hidden: hidden,
                        });
                    }
                    Node::Text(text) => {
                        let content = text.trim();
                        if content.is_empty() {
                            continue;
                        }
                        let key = allocate(&mut next_id);
                        node.children.push(RawId::Text(key.clone()));
                        nodes.insert(key, RawNode::text(content, !hidden));
                    }
                    _ => {}
                }
            }

            nodes.insert(pending.key, node);
            stack.extend(children.into_iter().rev());
        }

        debug!(
            "Built static snapshot with {} nodes, {} interactive",
            nodes.len(),
            next_index
        );

        Ok(RawSnapshot {
            nodes,
            root_id: RawId::Text(root_key),
        })
    }
}

fn allocate(next_id: &mut usize) -> String {
    let id = next_id.to_string();
    *next_id += 1;
    id
}

fn xpath_segment(element: ElementRef) -> String {
    let tag_name = element.value().name();
    let Some(parent) = element.parent() else {
        return tag_name.to_string();
    };

    let same_tag: Vec<ElementRef> = parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|sibling| sibling.value().name() == tag_name)
        .collect();
    if same_tag.len() <= 1 {
        return tag_name.to_string();
    }

    let position = same_tag
        .iter()
        .position(|sibling| sibling.id() == element.id())
        .map_or(1, |p| p + 1);
    format!("{}[{}]", tag_name, position)
}

fn absolute_xpath(element: ElementRef) -> String {
    let mut segments: Vec<String> = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .map(xpath_segment)
        .collect();
    segments.reverse();
    segments.push(xpath_segment(element));
    format!("/{}", segments.join("/"))
}

fn is_clickable_element(tag_name: &str, attributes: &BTreeMap<String, String>) -> bool {
    // Standard clickable elements
    if matches!(tag_name, "a" | "button" | "summary" | "area" | "menuitem") {
        return true;
    }

    if tag_name == "input" {
        let input_type = attributes.get("type").map(String::as_str).unwrap_or("text");
        return input_type != "hidden";
    }

    if attributes.contains_key("onclick")
        || attributes.contains_key("onchange")
        || attributes.contains_key("onsubmit")
    {
        return true;
    }

    if let Some(role) = attributes.get("role") {
        if matches!(
            role.as_str(),
            "button"
                | "link"
                | "checkbox"
                | "radio"
                | "tab"
                | "menuitem"
                | "option"
                | "switch"
                | "slider"
        ) {
            return true;
        }
    }

    attributes.contains_key("tabindex")
        || attributes.contains_key("aria-expanded")
        || attributes.contains_key("aria-haspopup")
        || attributes.get("draggable").map(String::as_str) == Some("true")
}

fn is_interactable_element(tag_name: &str, attributes: &BTreeMap<String, String>) -> bool {
    if matches!(tag_name, "input" | "textarea" | "select" | "button") {
        let input_type = attributes.get("type").map(String::as_str).unwrap_or("text");
        return input_type != "hidden";
    }

    if attributes.get("contenteditable").map(String::as_str) == Some("true") {
        return true;
    }

    if let Some(role) = attributes.get("role") {
        if matches!(
            role.as_str(),
            "textbox" | "searchbox" | "combobox" | "listbox" | "slider" | "spinbutton" | "switch"
        ) {
            return true;
        }
    }

    attributes.contains_key("onfocus")
        || attributes.contains_key("onblur")
        || attributes.contains_key("onkeydown")
        || attributes.contains_key("onkeyup")
}

fn is_hidden_element(attributes: &BTreeMap<String, String>) -> bool {
    if attributes.get("type").map(String::as_str) == Some("hidden") {
        return true;
    }

    if let Some(style) = attributes.get("style") {
        let style = style.to_lowercase().replace(' ', "");
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return true;
        }
    }

    if attributes.contains_key("hidden") {
        return true;
    }

    if let Some(class) = attributes.get("class") {
        return class
            .split_whitespace()
            .any(|c| matches!(c.to_lowercase().as_str(), "hidden" | "invisible" | "d-none"));
    }

    false
}
