//! Error taxonomy shared by the statistical stages.

/// Failures that abort a whole batch.
///
/// Zero joint counts and drugs missing from one side of a join are part of
/// normal semantics and never surface here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("no rows to process in {stage}")]
    EmptyInput { stage: &'static str },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn empty(stage: &'static str) -> Self {
        Self::EmptyInput { stage }
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
