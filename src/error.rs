// Pipeline error kinds.
//
// Module boundaries return anyhow::Result like the rest of the crate. The
// fatal kinds below are wrapped inside those anyhow errors so callers (and
// tests) can recover the kind with `downcast_ref::<PipelineError>()`.
//
// Degenerate similarity and labeling failures are not listed here: both are
// handled where they happen and never abort a run.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A required field is absent from a survey record. Raised before encoding.
    #[error("Missing input for question {question:?}: {field}")]
    MissingInput { question: String, field: String },

    /// The encoder failed, was given an empty text, or returned vectors that
    /// don't line up with the input batch.
    #[error("Encoding failed: {0}")]
    EncodingFailure(String),

    /// Two items share a node id, so cluster fields couldn't be attached to
    /// both. Raised before encoding.
    #[error("Duplicate node id {0:?}")]
    DuplicateId(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    pub fn missing(question: impl Into<String>, field: impl Into<String>) -> Self {
        PipelineError::MissingInput {
            question: question.into(),
            field: field.into(),
        }
    }
}
