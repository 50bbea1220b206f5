//! Annotated tokens as delivered by the upstream linguistic pipeline.
//!
//! Tokens arrive already tagged: lemma, part of speech, chunk name and IOB
//! tag, the instruction number assigned by the instruction splitter, and the
//! teaching-part label produced by the multiclass classifier. Nothing in this
//! crate mutates a token after it has been read.

use serde::{Deserialize, Serialize};

/// A single annotated token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Position in the utterance. Unique per utterance.
    pub position: usize,
    /// The surface form.
    pub value: String,
    #[serde(default)]
    pub lemma: Option<String>,
    /// Penn Treebank part of speech ("NN", "VB", "CD", ...).
    pub pos: String,
    /// Chunk the token belongs to ("VP", "NP", ...).
    #[serde(default)]
    pub chunk_name: String,
    /// IOB tag of the chunk ("B-VP", "I-NP", ...).
    #[serde(default)]
    pub chunk_iob: String,
    #[serde(default)]
    pub instruction_number: usize,
    /// Raw classifier label: "DECL", "DESC" or "ELSE".
    #[serde(default)]
    pub teaching_part: Option<String>,
}

impl Token {
    pub fn new(position: usize, value: impl Into<String>, pos: impl Into<String>) -> Self {
        Token {
            position,
            value: value.into(),
            lemma: None,
            pos: pos.into(),
            chunk_name: String::new(),
            chunk_iob: String::new(),
            instruction_number: 0,
            teaching_part: None,
        }
    }

    pub fn lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    pub fn chunk(mut self, name: impl Into<String>, iob: impl Into<String>) -> Self {
        self.chunk_name = name.into();
        self.chunk_iob = iob.into();
        self
    }

    pub fn instruction(mut self, number: usize) -> Self {
        self.instruction_number = number;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.teaching_part = Some(label.into());
        self
    }

    /// The lemma, falling back to the surface form.
    pub fn lemma_or_value(&self) -> &str {
        self.lemma.as_deref().unwrap_or(&self.value)
    }

    pub fn is_verb(&self) -> bool {
        self.pos.starts_with("VB")
    }

    pub fn is_modal(&self) -> bool {
        self.pos == "MD"
    }

    pub fn is_determiner(&self) -> bool {
        self.pos == "DT"
    }

    /// Cardinal numbers carry the "CD" tag.
    pub fn is_cardinal(&self) -> bool {
        self.pos == "CD"
    }
}

/// Join the surface forms of `tokens` with single spaces.
pub fn join_values<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    tokens
        .into_iter()
        .map(|token| token.value.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
