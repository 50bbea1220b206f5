//! Instruction names to ontology methods.

use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::candidate::FunctionNameCandidate;
use crate::combinatorics::word_permutations;
use crate::config::Config;
use crate::input::Utterance;
use crate::instruction::{ClearedInstruction, Instruction};
use crate::matcher::StringOntologyMatcher;
use crate::token::{Token, join_values};

/// Context synonyms must match at least this well to count.
pub const SYNONYM_ACCEPTANCE: f64 = 0.9;

/// Synonym matches are scaled by this.
pub const SYNONYM_WEIGHT: f64 = 0.5;

pub struct FunctionNameMapper<'m, 'o> {
    matcher: &'m StringOntologyMatcher<'o>,
    config: &'m Config,
    use_context: bool,
}

impl<'m, 'o> FunctionNameMapper<'m, 'o> {
    pub fn new(matcher: &'m StringOntologyMatcher<'o>, config: &'m Config, use_context: bool) -> Self {
        FunctionNameMapper {
            matcher,
            config,
            use_context,
        }
    }

    /// The cleared name of `instruction`, or `None` when only stopwords
    /// remain. The cleared form carries no parameters yet.
    pub fn clear(&self, instruction: &Instruction, utterance: &Utterance) -> Option<ClearedInstruction> {
        let name_tokens: Vec<Token> = instruction
            .name_tokens
            .iter()
            .filter(|token| !self.config.is_name_stop_word(token.lemma_or_value()))
            .cloned()
            .collect();
        if name_tokens.is_empty() {
            debug!(name = %instruction.name, "instruction name is all stopwords");
            return None;
        }

        let name = name_tokens.iter().map(Token::lemma_or_value).join(" ");
        let surface_name = join_values(&name_tokens);
        let synonyms = if self.use_context {
            name_tokens
                .iter()
                .flat_map(|token| utterance.action_synonyms(token))
                .map(String::from)
                .unique()
                .collect()
        } else {
            Vec::new()
        };

        Some(ClearedInstruction {
            name_tokens,
            name,
            surface_name,
            synonyms,
            parameters: Vec::new(),
        })
    }

    /// Search strings for a cleared instruction: the name, each of its words,
    /// and the name followed by each cleared parameter.
    pub fn search_strings(&self, instruction: &Instruction) -> Vec<String> {
        let Some(cleared) = instruction.cleared() else {
            return Vec::new();
        };
        let mut strings = name_strings(&cleared.name, instruction);
        if self.config.match_unlemmatized && cleared.surface_name != cleared.name {
            strings.extend(name_strings(&cleared.surface_name, instruction));
        }
        if self.config.use_permutations {
            let permuted: Vec<String> = strings
                .iter()
                .flat_map(|string| word_permutations(string))
                .collect();
            strings.extend(permuted);
        }
        strings.into_iter().unique().collect()
    }

    pub fn candidates(&self, instruction: &Arc<Instruction>) -> Vec<FunctionNameCandidate> {
        let queries = self.search_strings(instruction);
        let mut candidates: Vec<FunctionNameCandidate> = self
            .matcher
            .method_matches(&queries)
            .into_iter()
            .map(|(method, score)| FunctionNameCandidate {
                score,
                method,
                instruction: instruction.clone(),
            })
            .collect();

        let synonyms = instruction
            .cleared()
            .map(|cleared| cleared.synonyms.as_slice())
            .unwrap_or_default();
        if self.use_context && !synonyms.is_empty() {
            candidates.extend(
                self.matcher
                    .method_matches(synonyms)
                    .into_iter()
                    .filter(|(_, score)| *score > SYNONYM_ACCEPTANCE)
                    .map(|(method, score)| FunctionNameCandidate {
                        score: score * SYNONYM_WEIGHT,
                        method,
                        instruction: instruction.clone(),
                    }),
            );
        }

        debug!(
            name = instruction.cleared_name(),
            candidates = candidates.len(),
            "name candidates"
        );
        candidates
    }
}

fn name_strings(name: &str, instruction: &Instruction) -> Vec<String> {
    let mut strings = vec![name.to_string()];
    let words: Vec<&str> = name.split_whitespace().collect();
    if words.len() > 1 {
        strings.extend(words.iter().map(|word| word.to_string()));
    }
    strings.extend(
        instruction
            .cleared_parameters()
            .iter()
            .map(|parameter| format!("{name} {}", parameter.cleared_name())),
    );
    strings
}
