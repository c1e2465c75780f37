//! Stage Trait: single contract for every pipeline stage
use crate::context::ExecutionContext;

/// A step of the message pipeline. Stages exchange serialized state so the
/// runner can hash what goes in and out of each one.
pub trait Stage: Send + Sync {
    /// Unique stage id (ex: "build.message.v1")
    fn id(&self) -> &'static str;

    /// Whether identical input always yields identical output (default: true)
    fn deterministic(&self) -> bool {
        true
    }

    fn run(&self, input: &[u8], ctx: &ExecutionContext) -> Result<Vec<u8>, StageError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// Input could not be decoded or is missing a prerequisite
    ValidationFailed(String),
    ExecutionFailed(String),
    /// A catalog entry the stage needs does not exist
    Lookup(String),
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "VALIDATION: {}", msg),
            Self::ExecutionFailed(msg) => write!(f, "EXEC: {}", msg),
            Self::Lookup(msg) => write!(f, "LOOKUP: {}", msg),
        }
    }
}

impl std::error::Error for StageError {}
