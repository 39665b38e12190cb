pub mod actions;
#[cfg(feature = "chrome")]
pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod history;
pub mod testing;
pub mod types;

pub use actions::{
    rewrite_action_index, ActionBatch, ActionExecutor, ActionModel, ActionResult, Replayer,
    RewriteOutcome, SafetyGate,
};
#[cfg(feature = "chrome")]
pub use browser::ChromeSnapshotSource;
pub use crate::core::{Config, HtmlSnapshotSource, SnapshotSource};
pub use dom::{DomProcessor, DomState, DomTree, ElementNode, HashedIdentity, NodeId};
pub use errors::{DomError, Result};
pub use history::{AgentHistory, AgentHistoryList, HistoryElement, HistoryTreeProcessor};
pub use types::*;
