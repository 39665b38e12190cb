pub mod element;
pub mod hash;
pub mod html;
pub mod processor;
pub mod raw;
pub mod selector;
pub mod selector_map;
pub mod state;
pub mod tree;

pub use element::{DomNode, ElementNode, NodeId, TextNode};
pub use hash::HashedIdentity;
pub use html::HtmlSnapshotBuilder;
pub use processor::DomProcessor;
pub use raw::{RawId, RawNode, RawSnapshot};
pub use selector::{enhanced_css_selector, LocatorPath};
pub use selector_map::SelectorMap;
pub use state::DomState;
pub use tree::DomTree;
