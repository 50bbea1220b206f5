//! Candidate hypotheses linking extracted text to ontology members.
//!
//! Candidates are built fresh for every utterance and never outlive it. They
//! hold ontology handles rather than references, and share instructions and
//! parameters through `Arc`, so a finished [`CommandCandidate`] can be handed
//! to whatever persists it.

use std::sync::Arc;

use crate::instruction::{Instruction, Parameter};
use crate::ontology::{Individual, MethodId};

/// An ontology method that an instruction name may refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNameCandidate {
    pub score: f64,
    pub method: MethodId,
    pub instruction: Arc<Instruction>,
}

/// A value for a method parameter: an ontology individual, or the raw
/// extracted text when `individual` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameterCandidate {
    pub score: f64,
    pub individual: Option<Individual>,
    pub parameter: Arc<Parameter>,
}

impl FunctionParameterCandidate {
    pub fn matched(score: f64, individual: Individual, parameter: Arc<Parameter>) -> Self {
        FunctionParameterCandidate {
            score,
            individual: Some(individual),
            parameter,
        }
    }

    pub fn primitive(score: f64, parameter: Arc<Parameter>) -> Self {
        FunctionParameterCandidate {
            score,
            individual: None,
            parameter,
        }
    }

    /// Whether the raw extracted value is used instead of an individual.
    pub fn is_primitive(&self) -> bool {
        self.individual.is_none()
    }
}

/// A parameter candidate assigned to one declared parameter of the method.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMapping {
    pub candidate: FunctionParameterCandidate,
    /// Index into the method's declared parameters.
    pub parameter: usize,
}

/// A complete call hypothesis.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallCandidate {
    pub name: FunctionNameCandidate,
    pub parameters: Vec<FunctionParameterCandidate>,
    /// Set by the scorer once parameters are type-checked against the method.
    pub mapping: Option<Vec<ParameterMapping>>,
    pub score: f64,
}

impl FunctionCallCandidate {
    pub fn new(name: FunctionNameCandidate, parameters: Vec<FunctionParameterCandidate>) -> Self {
        FunctionCallCandidate {
            name,
            parameters,
            mapping: None,
            score: 0.0,
        }
    }

    pub fn method(&self) -> MethodId {
        self.name.method
    }

    pub fn mapping(&self) -> &[ParameterMapping] {
        self.mapping.as_deref().unwrap_or_default()
    }

    /// Whether two calls assign the same candidates to the same parameters,
    /// in any order.
    pub fn same_mapping(&self, other: &FunctionCallCandidate) -> bool {
        match (&self.mapping, &other.mapping) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.len() == b.len()
                    && a.iter().all(|entry| b.contains(entry))
                    && b.iter().all(|entry| a.contains(entry))
            }
            _ => false,
        }
    }
}

/// The synthesized signature of a method being taught.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignatureCandidate {
    pub name: String,
    pub parameters: Vec<FunctionParameterCandidate>,
    /// The declaration the name was taken from.
    pub instruction: Option<Arc<Instruction>>,
}

/// Ranked calls for one description instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEntry {
    pub instruction: Arc<Instruction>,
    /// Best first. Empty when nothing matched.
    pub calls: Vec<FunctionCallCandidate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingStats {
    pub attempted: usize,
    pub mapped: usize,
}

/// The final result for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandCandidate {
    pub signature: Option<MethodSignatureCandidate>,
    pub script: Vec<ScriptEntry>,
    pub stats: MappingStats,
}

impl CommandCandidate {
    /// The best call of every script entry that has one.
    pub fn best_calls(&self) -> impl Iterator<Item = &FunctionCallCandidate> {
        self.script.iter().filter_map(|entry| entry.calls.first())
    }
}
