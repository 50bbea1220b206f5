//! Extracted parameters to ontology individuals.

use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::candidate::FunctionParameterCandidate;
use crate::combinatorics::word_permutations;
use crate::config::Config;
use crate::input::Utterance;
use crate::instruction::{ClearedParameter, Parameter};
use crate::matcher::StringOntologyMatcher;
use crate::name::{SYNONYM_ACCEPTANCE, SYNONYM_WEIGHT};

pub struct FunctionParameterMapper<'m, 'o> {
    matcher: &'m StringOntologyMatcher<'o>,
    config: &'m Config,
    use_context: bool,
}

impl<'m, 'o> FunctionParameterMapper<'m, 'o> {
    pub fn new(matcher: &'m StringOntologyMatcher<'o>, config: &'m Config, use_context: bool) -> Self {
        FunctionParameterMapper {
            matcher,
            config,
            use_context,
        }
    }

    /// Clear every parameter; parameters left without words are dropped.
    ///
    /// A token resolved by coreference contributes its referent unless the
    /// referent is a stopword. Other tokens contribute their lemma if their
    /// POS tag is whitelisted. Either way, stopwords are skipped.
    pub fn clear(&self, parameters: &[Parameter], utterance: &Utterance) -> Vec<Arc<Parameter>> {
        parameters
            .iter()
            .filter_map(|parameter| {
                let mut tokens = Vec::new();
                let mut words = Vec::new();
                for token in &parameter.tokens {
                    let referent = if self.use_context && !token.is_determiner() {
                        utterance
                            .coreference(token)
                            .filter(|referent| {
                                !referent.is_empty()
                                    && !self.config.is_parameter_stop_word(referent)
                            })
                    } else {
                        None
                    };
                    let word = match referent {
                        Some(referent) => referent,
                        None if self.config.parameter_pos.contains(&token.pos) => {
                            token.lemma_or_value()
                        }
                        None => continue,
                    };
                    if !self.config.is_parameter_stop_word(word) {
                        words.push(word.to_string());
                        tokens.push(token.clone());
                    }
                }

                if tokens.is_empty() {
                    debug!(parameter = %parameter.name, "parameter has no content words");
                    return None;
                }

                let synonyms = if self.use_context {
                    tokens
                        .iter()
                        .flat_map(|token| utterance.entity_synonyms(token))
                        .map(String::from)
                        .unique()
                        .collect()
                } else {
                    Vec::new()
                };
                let cleared = ClearedParameter {
                    tokens,
                    name: words.join(" "),
                    synonyms,
                };
                Some(Arc::new(parameter.clone().with_cleared(cleared)))
            })
            .collect()
    }

    /// One candidate group per parameter, in parameter order. Groups may be
    /// empty.
    pub fn candidates(&self, parameters: &[Arc<Parameter>]) -> Vec<Vec<FunctionParameterCandidate>> {
        parameters
            .iter()
            .map(|parameter| {
                let queries = word_permutations(parameter.cleared_name());
                let mut group: Vec<FunctionParameterCandidate> = self
                    .matcher
                    .parameter_matches(&queries)
                    .into_iter()
                    .map(|(individual, score)| {
                        FunctionParameterCandidate::matched(score, individual, parameter.clone())
                    })
                    .collect();

                if self.use_context && !parameter.synonyms().is_empty() {
                    group.extend(
                        self.matcher
                            .parameter_matches(parameter.synonyms())
                            .into_iter()
                            .filter(|(_, score)| *score > SYNONYM_ACCEPTANCE)
                            .map(|(individual, score)| {
                                FunctionParameterCandidate::matched(
                                    score * SYNONYM_WEIGHT,
                                    individual,
                                    parameter.clone(),
                                )
                            }),
                    );
                }

                debug!(
                    parameter = parameter.cleared_name(),
                    candidates = group.len(),
                    "parameter candidates"
                );
                group
            })
            .collect()
    }
}

/// Merge candidate groups of a synonymous instruction into `groups`.
///
/// Candidates whose individual already appears anywhere in `groups` are
/// dropped; the rest form one new group, added only if non-empty.
pub fn add_without_duplicates(
    groups: &mut Vec<Vec<FunctionParameterCandidate>>,
    additions: Vec<Vec<FunctionParameterCandidate>>,
) {
    let fresh: Vec<FunctionParameterCandidate> = additions
        .into_iter()
        .flatten()
        .filter(|candidate| {
            candidate.individual.is_none()
                || !groups
                    .iter()
                    .flatten()
                    .any(|present| present.individual == candidate.individual)
        })
        .collect();
    if !fresh.is_empty() {
        groups.push(fresh);
    }
}
