//! Maps a command onto the ontology.
//!
//! Descriptions are mapped one by one into a script of ranked calls.
//! Declarations of a teaching command are read as synonymous phrasings of the
//! one method being taught: their name and parameter candidates are pooled
//! to synthesize a single signature.

use std::sync::Arc;

use convert_case::{Case, Casing};
use itertools::Itertools;
use tracing::{debug, error, info, warn};

use crate::candidate::{
    CommandCandidate, FunctionNameCandidate, FunctionParameterCandidate, MappingStats,
    MethodSignatureCandidate, ScriptEntry,
};
use crate::command::Command;
use crate::config::Config;
use crate::finder::FunctionCallFinder;
use crate::input::Utterance;
use crate::instruction::Instruction;
use crate::matcher::StringOntologyMatcher;
use crate::name::FunctionNameMapper;
use crate::ontology::Ontology;
use crate::parameter::{FunctionParameterMapper, add_without_duplicates};
use crate::scorer::FunctionCallScorer;

/// Prefix of a signature name synthesized from the raw declaration because
/// every declaration name was a stopword.
pub const NAME_PLACEHOLDER: &str = "NAME_PLACEHOLDER_";

/// Prefix of a signature name that collides with an existing method.
pub const NAME_CONFLICT: &str = "NAMECONFLICT_";

/// Name and parameter candidates at least this good count as exact.
pub const PERFECT_MATCH: f64 = 0.95;

/// An existing call scoring at least this means the taught method exists.
pub const CONFLICT_SCORE: f64 = 0.9;

pub struct OntologyMapper<'o> {
    matcher: StringOntologyMatcher<'o>,
    config: &'o Config,
}

impl<'o> OntologyMapper<'o> {
    pub fn new(ontology: &'o Ontology, config: &'o Config) -> Self {
        OntologyMapper {
            matcher: StringOntologyMatcher::new(ontology),
            config,
        }
    }

    pub fn map(&self, command: &Command, utterance: &Utterance) -> CommandCandidate {
        let use_context = self.config.use_context && utterance.has_context();
        let session = Session {
            ontology: self.matcher.ontology(),
            config: self.config,
            utterance,
            names: FunctionNameMapper::new(&self.matcher, self.config, use_context),
            parameters: FunctionParameterMapper::new(&self.matcher, self.config, use_context),
            finder: FunctionCallFinder::new(self.matcher.ontology()),
            scorer: FunctionCallScorer::new(&self.matcher),
        };

        info!(teaching = command.is_teaching(), use_context, "mapping command to ontology");
        let signature = if command.is_teaching() {
            session.method_signature(command.declarations())
        } else {
            None
        };
        let (script, stats) = session.script(command.descriptions());
        CommandCandidate {
            signature,
            script,
            stats,
        }
    }
}

/// Everything needed to map the instructions of one utterance.
struct Session<'a, 'o> {
    ontology: &'o Ontology,
    config: &'a Config,
    utterance: &'a Utterance,
    names: FunctionNameMapper<'a, 'o>,
    parameters: FunctionParameterMapper<'a, 'o>,
    finder: FunctionCallFinder<'o>,
    scorer: FunctionCallScorer<'a, 'o>,
}

impl Session<'_, '_> {
    /// Clear names and parameters. Instructions whose name is all
    /// stopwords are dropped.
    fn prepare(&self, instructions: &[Instruction]) -> Vec<Arc<Instruction>> {
        instructions
            .iter()
            .filter_map(|instruction| {
                let mut cleared = self.names.clear(instruction, self.utterance)?;
                cleared.parameters = self.parameters.clear(&instruction.parameters, self.utterance);
                Some(Arc::new(instruction.clone().with_cleared(cleared)))
            })
            .collect()
    }

    fn method_signature(&self, declarations: &[Instruction]) -> Option<MethodSignatureCandidate> {
        let raw = declarations.first()?;
        let prepared = self.prepare(declarations);

        let mut names = Vec::new();
        let mut groups = Vec::new();
        for declaration in &prepared {
            names.extend(self.names.candidates(declaration));
            add_without_duplicates(
                &mut groups,
                self.parameters.candidates(declaration.cleared_parameters()),
            );
        }

        let (instruction, mut name) = match prepared.first() {
            Some(first) => (first.clone(), first.cleared_name().to_case(Case::Camel)),
            None => {
                error!(name = %raw.name, "no declaration has a usable name");
                (Arc::new(raw.clone()), format!("{NAME_PLACEHOLDER}{}", raw.name))
            }
        };

        if let Some(existing) = self.existing_method(&names, &groups) {
            warn!(name = %name, existing = %existing, "taught method already exists");
            name.insert_str(0, NAME_CONFLICT);
        }

        let parameters: Vec<FunctionParameterCandidate> = groups
            .iter()
            .flatten()
            .filter(|candidate| candidate.score >= PERFECT_MATCH)
            .cloned()
            .collect();
        name.push_str(&self.name_suffix(&parameters));

        info!(name = %name, parameters = parameters.len(), "synthesized method signature");
        Some(MethodSignatureCandidate {
            name,
            parameters,
            instruction: Some(instruction),
        })
    }

    /// The name of an ontology method that already does what the
    /// declarations describe.
    fn existing_method(
        &self,
        names: &[FunctionNameCandidate],
        groups: &[Vec<FunctionParameterCandidate>],
    ) -> Option<String> {
        let similar: Vec<FunctionNameCandidate> = names
            .iter()
            .filter(|candidate| candidate.score >= PERFECT_MATCH)
            .cloned()
            .collect();
        if similar.is_empty() {
            return None;
        }
        let calls = self.scorer.score(self.finder.find(&similar, groups));
        calls
            .into_iter()
            .find(|call| call.score >= CONFLICT_SCORE)
            .map(|call| self.ontology.method(call.method()).name.clone())
    }

    /// The cleared names of the exactly matched parameters, stopwords
    /// removed, in PascalCase.
    fn name_suffix(&self, parameters: &[FunctionParameterCandidate]) -> String {
        parameters
            .iter()
            .map(|candidate| candidate.parameter.cleared_name())
            .unique()
            .flat_map(str::split_whitespace)
            .filter(|word| {
                !self.config.is_name_stop_word(word) && !self.config.is_parameter_stop_word(word)
            })
            .join(" ")
            .to_case(Case::Pascal)
    }

    fn script(&self, descriptions: &[Instruction]) -> (Vec<ScriptEntry>, MappingStats) {
        let prepared = self.prepare(descriptions);
        let mut stats = MappingStats {
            attempted: prepared.len(),
            mapped: 0,
        };

        let mut script = Vec::with_capacity(prepared.len());
        for instruction in prepared {
            let names = self.names.candidates(&instruction);
            let groups = self.parameters.candidates(instruction.cleared_parameters());
            let calls = self
                .scorer
                .rank(self.finder.find(&names, &groups), self.config.top_n);

            match calls.first() {
                Some(best) => {
                    stats.mapped += 1;
                    debug!(
                        instruction = %instruction.name,
                        method = %self.ontology.method(best.method()).name,
                        score = best.score,
                        "mapped description"
                    );
                }
                None => warn!(instruction = %instruction.name, "no function call found"),
            }
            script.push(ScriptEntry { instruction, calls });
        }

        info!(
            mapped = stats.mapped,
            attempted = stats.attempted,
            "mapped descriptions"
        );
        (script, stats)
    }
}
