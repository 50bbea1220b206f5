//! Serializable view of a [`CommandCandidate`].
//!
//! Candidates refer to the ontology by handle. A report resolves every handle
//! to a name and records which token positions each part was read from, so a
//! writer can persist it without access to the ontology.

use serde::Serialize;

use crate::candidate::{CommandCandidate, FunctionCallCandidate, FunctionParameterCandidate};
use crate::error::SynthError;
use crate::instruction::InstructionKind;
use crate::ontology::Ontology;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReport {
    pub signature: Option<SignatureReport>,
    pub script: Vec<InstructionReport>,
    pub attempted: usize,
    pub mapped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignatureReport {
    pub name: String,
    pub arguments: Vec<ArgumentReport>,
    pub positions: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionReport {
    pub kind: InstructionKind,
    pub text: String,
    pub positions: Vec<usize>,
    /// Best first.
    pub calls: Vec<CallReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallReport {
    pub method: String,
    pub score: f64,
    pub arguments: Vec<ArgumentReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentReport {
    /// The declared method parameter this argument fills, once mapped.
    pub parameter: Option<String>,
    pub value: ArgumentValue,
    pub score: f64,
    pub positions: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum ArgumentValue {
    /// An ontology object, value or state, by name.
    Individual(String),
    /// Raw extracted text.
    Primitive(String),
}

impl CommandReport {
    pub fn to_json(&self) -> Result<String, SynthError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl CommandCandidate {
    pub fn report(&self, ontology: &Ontology) -> CommandReport {
        let signature = self.signature.as_ref().map(|signature| SignatureReport {
            name: signature.name.clone(),
            arguments: signature
                .parameters
                .iter()
                .map(|candidate| argument(ontology, candidate, None))
                .collect(),
            positions: signature
                .instruction
                .as_ref()
                .map(|instruction| instruction.positions())
                .unwrap_or_default(),
        });

        let script = self
            .script
            .iter()
            .map(|entry| InstructionReport {
                kind: entry.instruction.kind,
                text: entry.instruction.name.clone(),
                positions: entry.instruction.positions(),
                calls: entry.calls.iter().map(|call| call_report(ontology, call)).collect(),
            })
            .collect();

        CommandReport {
            signature,
            script,
            attempted: self.stats.attempted,
            mapped: self.stats.mapped,
        }
    }
}

fn call_report(ontology: &Ontology, call: &FunctionCallCandidate) -> CallReport {
    let method = ontology.method(call.method());
    let arguments = match &call.mapping {
        Some(mapping) => mapping
            .iter()
            .map(|entry| {
                let declared = method
                    .parameters
                    .get(entry.parameter)
                    .map(|parameter| parameter.name.as_str());
                argument(ontology, &entry.candidate, declared)
            })
            .collect(),
        None => call
            .parameters
            .iter()
            .map(|candidate| argument(ontology, candidate, None))
            .collect(),
    };
    CallReport {
        method: method.name.clone(),
        score: call.score,
        arguments,
    }
}

fn argument(
    ontology: &Ontology,
    candidate: &FunctionParameterCandidate,
    declared: Option<&str>,
) -> ArgumentReport {
    let value = match candidate.individual {
        Some(individual) => ArgumentValue::Individual(ontology.individual_name(individual).to_string()),
        None => ArgumentValue::Primitive(candidate.parameter.name.clone()),
    };
    ArgumentReport {
        parameter: declared.map(String::from),
        value,
        score: candidate.score,
        positions: candidate.parameter.positions(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::config::Config;
    use crate::input::{Utterance, UtteranceInput};
    use crate::instruction::{Instruction, Parameter};
    use crate::mapper::OntologyMapper;
    use crate::ontology::kitchen;
    use crate::token::Token;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_names_and_positions() {
        let ontology = kitchen().unwrap();
        let config = Config::default();
        let tokens = vec![
            Token::new(0, "open", "VB"),
            Token::new(1, "the", "DT"),
            Token::new(2, "fridge", "NN"),
        ];
        let utterance = Utterance::new(UtteranceInput::chained(tokens.clone()).arc(0, 0, "V")).unwrap();
        let command = Command::Execution {
            descriptions: vec![Instruction::new(
                InstructionKind::Description,
                vec![tokens[0].clone()],
                vec![Parameter::new("A1", tokens[1..].to_vec())],
            )],
        };
        let report = OntologyMapper::new(&ontology, &config)
            .map(&command, &utterance)
            .report(&ontology);

        assert_eq!(report.attempted, 1);
        assert_eq!(report.script[0].positions, vec![0, 1, 2]);
        let best = &report.script[0].calls[0];
        assert_eq!(best.method, "open");
        assert_eq!(best.arguments[0].parameter.as_deref(), Some("what"));
        assert_eq!(best.arguments[0].value, ArgumentValue::Individual("Fridge".into()));
        assert_eq!(best.arguments[0].positions, vec![1, 2]);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"kind\": \"individual\""));
    }
}
