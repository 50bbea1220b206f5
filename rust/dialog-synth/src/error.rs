//! Error types for method synthesis.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("utterance has no tokens")]
    EmptyUtterance,

    #[error("utterance carries no SRL annotations")]
    NoSrlAnnotations,

    #[error("two tokens share position {position}")]
    DuplicatePosition { position: usize },

    #[error("token at position {position} has {count} successors")]
    AmbiguousSuccessor { position: usize, count: usize },

    #[error("annotation refers to unknown token position {position}")]
    UnknownPosition { position: usize },

    #[error("token chain is broken: {reason}")]
    BrokenTokenChain { reason: String },

    #[error("token at position {position} carries no teaching-part label")]
    MissingLabel { position: usize },

    #[error("unexpected teaching-part label '{label}' at position {position}")]
    InvalidLabel { position: usize, label: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("ontology references unknown {kind} '{name}'")]
    UnknownReference { kind: &'static str, name: String },

    #[error("ontology defines {kind} '{name}' more than once")]
    DuplicateName { kind: &'static str, name: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SynthError {
    /// Whether this error means the upstream annotations were incomplete.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            SynthError::EmptyUtterance
                | SynthError::NoSrlAnnotations
                | SynthError::DuplicatePosition { .. }
                | SynthError::AmbiguousSuccessor { .. }
                | SynthError::UnknownPosition { .. }
                | SynthError::BrokenTokenChain { .. }
                | SynthError::MissingLabel { .. }
        )
    }
}
