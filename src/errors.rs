use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Snapshot root '{0}' is not present in the node map")]
    MissingRoot(String),

    #[error("Snapshot root '{0}' is a text node, expected an element")]
    NonElementRoot(String),

    #[error("Snapshot node '{0}' is reachable more than once (cycle or shared child)")]
    CycleDetected(String),

    #[error("Interaction index {index} is assigned twice (second at node '{id}')")]
    DuplicateInteractionIndex { index: usize, id: String },

    #[error("Snapshot extraction failed: {0}")]
    Extraction(String),

    #[error("Cannot replay action {action}: {reason}")]
    ReplayStepFailed { action: usize, reason: String },

    #[error("Action error: {0}")]
    ActionError(#[from] crate::actions::ActionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chrome error: {0}")]
    ChromeError(String),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, DomError>;

// Driver crates report through anyhow
impl From<anyhow::Error> for DomError {
    fn from(err: anyhow::Error) -> Self {
        DomError::AnyhowError(err.to_string())
    }
}

impl DomError {
    /// True for failures caused by the shape of the input payload.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            DomError::MalformedSnapshot(_)
                | DomError::MissingRoot(_)
                | DomError::NonElementRoot(_)
                | DomError::CycleDetected(_)
                | DomError::DuplicateInteractionIndex { .. }
        )
    }
}
