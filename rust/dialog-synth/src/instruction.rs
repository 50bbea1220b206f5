//! Instructions and their parameters.
//!
//! An [`Instruction`] is one verb-anchored unit of a command: its name tokens
//! (the main verb followed by modifier verbs) and one [`Parameter`] per SRL
//! role found in its chunk. Before matching, both are cleared of stopwords,
//! lemmatized, and enriched with context annotations. The cleared form is
//! attached exactly once; the raw form stays available for provenance.

use std::sync::Arc;

use serde::Serialize;

use crate::role::Label;
use crate::token::{Token, join_values};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InstructionKind {
    Declaration,
    Description,
    Else,
}

impl From<Label> for InstructionKind {
    fn from(label: Label) -> Self {
        match label {
            Label::Declaration => InstructionKind::Declaration,
            Label::Description => InstructionKind::Description,
            Label::Else => InstructionKind::Else,
        }
    }
}

/// The tokens filling one SRL role of an instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// The SRL role, e.g. "A1".
    pub role: String,
    pub tokens: Vec<Token>,
    /// Surface forms joined by spaces.
    pub name: String,
    cleared: Option<ClearedParameter>,
}

/// A parameter after stopword removal and coreference substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearedParameter {
    /// Tokens that contributed a word.
    pub tokens: Vec<Token>,
    pub name: String,
    /// Synonyms from the context analysis.
    pub synonyms: Vec<String>,
}

impl Parameter {
    pub fn new(role: impl Into<String>, tokens: Vec<Token>) -> Self {
        let name = join_values(&tokens);
        Parameter {
            role: role.into(),
            tokens,
            name,
            cleared: None,
        }
    }

    /// All `parameters` merged into one, keeping every raw token.
    ///
    /// The merged parameter counts as already cleared.
    pub fn concatenated(parameters: &[Arc<Parameter>]) -> Self {
        let tokens: Vec<Token> = parameters
            .iter()
            .flat_map(|parameter| parameter.tokens.iter().cloned())
            .collect();
        let role = parameters
            .iter()
            .map(|parameter| parameter.role.as_str())
            .collect::<Vec<_>>()
            .join("+");
        let parameter = Parameter::new(role, tokens);
        let cleared = ClearedParameter {
            tokens: parameter.tokens.clone(),
            name: parameter.name.clone(),
            synonyms: Vec::new(),
        };
        parameter.with_cleared(cleared)
    }

    pub fn cleared(&self) -> Option<&ClearedParameter> {
        self.cleared.as_ref()
    }

    /// The cleared name, or the raw name before clearing.
    pub fn cleared_name(&self) -> &str {
        self.cleared
            .as_ref()
            .map_or(self.name.as_str(), |cleared| cleared.name.as_str())
    }

    pub fn synonyms(&self) -> &[String] {
        self.cleared
            .as_ref()
            .map_or(&[][..], |cleared| cleared.synonyms.as_slice())
    }

    /// Attach the cleared form unless one is already attached.
    pub fn with_cleared(mut self, cleared: ClearedParameter) -> Self {
        if self.cleared.is_none() {
            self.cleared = Some(cleared);
        }
        self
    }

    pub fn has_cardinal(&self) -> bool {
        self.tokens.iter().any(Token::is_cardinal)
    }

    pub fn positions(&self) -> Vec<usize> {
        self.tokens.iter().map(|token| token.position).collect()
    }
}

/// One instruction of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub kind: InstructionKind,
    /// Main verb first, then modifier verbs.
    pub name_tokens: Vec<Token>,
    pub name: String,
    pub parameters: Vec<Parameter>,
    cleared: Option<ClearedInstruction>,
}

/// An instruction name after stopword removal and lemmatization, together
/// with the cleared parameters that survived.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearedInstruction {
    pub name_tokens: Vec<Token>,
    /// Lemmas joined by spaces.
    pub name: String,
    /// Surface forms of the same tokens.
    pub surface_name: String,
    pub synonyms: Vec<String>,
    pub parameters: Vec<Arc<Parameter>>,
}

impl Instruction {
    pub fn new(kind: InstructionKind, name_tokens: Vec<Token>, parameters: Vec<Parameter>) -> Self {
        let name = join_values(&name_tokens);
        Instruction {
            kind,
            name_tokens,
            name,
            parameters,
            cleared: None,
        }
    }

    pub fn with_kind(mut self, kind: InstructionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn cleared(&self) -> Option<&ClearedInstruction> {
        self.cleared.as_ref()
    }

    /// The cleared name, or an empty string before clearing.
    pub fn cleared_name(&self) -> &str {
        self.cleared.as_ref().map_or("", |cleared| cleared.name.as_str())
    }

    pub fn cleared_parameters(&self) -> &[Arc<Parameter>] {
        self.cleared
            .as_ref()
            .map_or(&[][..], |cleared| cleared.parameters.as_slice())
    }

    /// Attach the cleared form unless one is already attached.
    pub fn with_cleared(mut self, cleared: ClearedInstruction) -> Self {
        if self.cleared.is_none() {
            self.cleared = Some(cleared);
        }
        self
    }

    /// Positions of every token that belongs to this instruction.
    pub fn positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .name_tokens
            .iter()
            .chain(self.parameters.iter().flat_map(|p| p.tokens.iter()))
            .map(|token| token.position)
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn door() -> Parameter {
        Parameter::new(
            "A1",
            vec![Token::new(1, "the", "DT"), Token::new(2, "door", "NN")],
        )
    }

    #[test]
    fn parameter_name_joins_surface_forms() {
        let parameter = door();
        assert_eq!(parameter.name, "the door");
        assert_eq!(parameter.cleared_name(), "the door");
        assert_eq!(parameter.positions(), vec![1, 2]);
    }

    #[test]
    fn cleared_form_is_set_once() {
        let first = ClearedParameter {
            tokens: vec![Token::new(2, "door", "NN")],
            name: "door".into(),
            synonyms: vec![],
        };
        let second = ClearedParameter {
            name: "portal".into(),
            ..first.clone()
        };
        let parameter = door().with_cleared(first).with_cleared(second);
        assert_eq!(parameter.cleared_name(), "door");
    }

    #[test]
    fn concatenation_keeps_all_tokens() {
        let two = Parameter::new("A2", vec![Token::new(4, "2", "CD")]);
        let merged = Parameter::concatenated(&[Arc::new(door()), Arc::new(two)]);
        assert_eq!(merged.name, "the door 2");
        assert_eq!(merged.cleared_name(), "the door 2");
        assert_eq!(merged.role, "A1+A2");
        assert!(merged.has_cardinal());
    }

    #[test]
    fn instruction_positions_cover_name_and_parameters() {
        let instruction = Instruction::new(
            InstructionKind::Description,
            vec![Token::new(0, "open", "VB")],
            vec![door()],
        );
        assert_eq!(instruction.name, "open");
        assert_eq!(instruction.cleared_name(), "");
        assert!(instruction.cleared_parameters().is_empty());
        assert_eq!(instruction.positions(), vec![0, 1, 2]);
    }
}
