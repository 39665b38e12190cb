pub mod element;
pub mod processor;
pub mod record;

pub use crate::dom::hash::HashedIdentity;
pub use element::HistoryElement;
pub use processor::HistoryTreeProcessor;
pub use record::{AgentHistory, AgentHistoryList, AgentOutput, StepMetadata, StepState};
