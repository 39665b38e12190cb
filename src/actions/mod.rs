pub mod base;
pub mod gate;
pub mod registry;
pub mod replay;

pub use base::{Action, ActionError, ActionExecutor, ActionModel, ActionResult};
pub use gate::{ActionBatch, BatchOutcome, GateVerdict, SafetyGate};
pub use registry::ActionRegistry;
pub use replay::{remap_actions, rewrite_action_index, Replayer, RewriteOutcome};
