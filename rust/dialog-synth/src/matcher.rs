//! Dual-strategy string matching against the ontology.
//!
//! Every lookup runs two independent [`SearchStrategy`]s over the same search
//! strings: a precise, distance-based one ([`JaroWinkler`]) and a lenient
//! subsequence one ([`FuzzySubsequence`]). A member survives only if both
//! strategies find it above their thresholds, and its score is the mean of
//! the two. The precise strategy keeps the fuzzy one from matching on shared
//! letters alone; the fuzzy one keeps the precise one from rewarding short
//! names that merely share a prefix.
//!
//! Ontology names are CamelCase identifiers and are normalized before
//! comparison: `"MicrowaveDoor2"` reads as `"microwave door"`.

use std::collections::BTreeMap;

use convert_case::{Boundary, Case, Casing};
use tracing::debug;

use crate::ontology::{Individual, MethodId, Ontology};

/// A string similarity measure with an acceptance threshold.
pub trait SearchStrategy {
    fn name(&self) -> &'static str;

    /// Scores below this are not matches.
    fn threshold(&self) -> f64;

    /// Similarity in `[0, 1]` between a lowercase search string and an
    /// ontology name.
    fn similarity(&self, query: &str, name: &str) -> f64;
}

/// Jaro-Winkler similarity over normalized names.
///
/// Dotted compound names are scored per part and averaged.
#[derive(Debug, Clone, Copy)]
pub struct JaroWinkler {
    pub threshold: f64,
}

impl Default for JaroWinkler {
    fn default() -> Self {
        JaroWinkler { threshold: 0.40 }
    }
}

impl SearchStrategy for JaroWinkler {
    fn name(&self) -> &'static str {
        "jaro-winkler"
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn similarity(&self, query: &str, name: &str) -> f64 {
        let parts: Vec<&str> = name.split('.').filter(|part| !part.is_empty()).collect();
        if parts.len() < 2 {
            return strsim::jaro_winkler(query, &normalize(name));
        }
        let total: f64 = parts
            .iter()
            .map(|part| strsim::jaro_winkler(query, &normalize(part)))
            .sum();
        total / parts.len() as f64
    }
}

/// Subsequence scoring: one point per search-string character found in order
/// in the name, two bonus points when it directly follows the previous hit.
///
/// The raw score is divided by `3 * max(len) - 2`, the best score a string of
/// that length can reach.
#[derive(Debug, Clone, Copy)]
pub struct FuzzySubsequence {
    pub threshold: f64,
}

impl Default for FuzzySubsequence {
    fn default() -> Self {
        FuzzySubsequence { threshold: 0.15 }
    }
}

impl SearchStrategy for FuzzySubsequence {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn similarity(&self, query: &str, name: &str) -> f64 {
        let term = normalize(&name.replace('.', " "));
        let longest = term.chars().count().max(query.chars().count());
        if longest == 0 {
            return 0.0;
        }
        fuzzy_score(&term, query) as f64 / (3 * longest - 2) as f64
    }
}

/// Raw subsequence score of `query` against `term`, ignoring case.
pub fn fuzzy_score(term: &str, query: &str) -> usize {
    let term: Vec<char> = term.to_lowercase().chars().collect();
    let mut score = 0;
    let mut term_index = 0;
    let mut previous: Option<usize> = None;
    for query_char in query.to_lowercase().chars() {
        while term_index < term.len() {
            let current = term_index;
            term_index += 1;
            if term[current] == query_char {
                score += 1;
                if previous.is_some_and(|p| p + 1 == current) {
                    score += 2;
                }
                previous = Some(current);
                break;
            }
        }
    }
    score
}

/// Lowercase, space-separated words of a CamelCase or snake_case identifier,
/// with digits removed.
pub fn normalize(name: &str) -> String {
    let words = name.replace('_', " ").to_case(Case::Lower);
    words
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

const PLACEHOLDER_PERSON: &str = "Person";

/// Final mean a parameter match must exceed.
pub const PARAMETER_ACCEPTANCE: f64 = 0.4;

/// Queries the ontology with two strategies and intersects the results.
pub struct StringOntologyMatcher<'o> {
    ontology: &'o Ontology,
    precise: Box<dyn SearchStrategy + 'o>,
    fuzzy: Box<dyn SearchStrategy + 'o>,
}

impl<'o> StringOntologyMatcher<'o> {
    pub fn new(ontology: &'o Ontology) -> Self {
        Self::with_strategies(
            ontology,
            JaroWinkler::default(),
            FuzzySubsequence::default(),
        )
    }

    pub fn with_strategies(
        ontology: &'o Ontology,
        precise: impl SearchStrategy + 'o,
        fuzzy: impl SearchStrategy + 'o,
    ) -> Self {
        StringOntologyMatcher {
            ontology,
            precise: Box::new(precise),
            fuzzy: Box::new(fuzzy),
        }
    }

    pub fn ontology(&self) -> &'o Ontology {
        self.ontology
    }

    /// Methods found by both strategies for any of `queries`, with the mean
    /// of each strategy's best score. Ordered by method.
    pub fn method_matches(&self, queries: &[String]) -> Vec<(MethodId, f64)> {
        let precise = self.best_methods(queries, self.precise.as_ref());
        let fuzzy = self.best_methods(queries, self.fuzzy.as_ref());
        let matches = intersect(&precise, &fuzzy);
        debug!(?queries, found = matches.len(), "method matches");
        matches
    }

    /// Objects, values and states found by both strategies for any of
    /// `queries` whose mean score exceeds [`PARAMETER_ACCEPTANCE`].
    pub fn parameter_matches(&self, queries: &[String]) -> Vec<(Individual, f64)> {
        let precise = self.best_individuals(queries, self.precise.as_ref());
        let fuzzy = self.best_individuals(queries, self.fuzzy.as_ref());
        let matches: Vec<(Individual, f64)> = intersect(&precise, &fuzzy)
            .into_iter()
            .filter(|(individual, score)| {
                let keep = *score > PARAMETER_ACCEPTANCE;
                if !keep {
                    debug!(
                        name = self.ontology.individual_name(*individual),
                        score, "dropping weak parameter match"
                    );
                }
                keep
            })
            .collect();
        debug!(?queries, found = matches.len(), "parameter matches");
        matches
    }

    fn best_methods(
        &self,
        queries: &[String],
        strategy: &dyn SearchStrategy,
    ) -> BTreeMap<MethodId, f64> {
        let mut best = BTreeMap::new();
        for query in queries {
            let query = query.to_lowercase();
            for (id, method) in self.ontology.methods() {
                let score = strategy.similarity(&query, &method.name);
                if score >= strategy.threshold() {
                    keep_best(&mut best, id, score);
                }
            }
        }
        best
    }

    fn best_individuals(
        &self,
        queries: &[String],
        strategy: &dyn SearchStrategy,
    ) -> BTreeMap<Individual, f64> {
        let mut best = BTreeMap::new();
        for query in queries {
            let query = query.to_lowercase();
            for (id, object) in self.ontology.objects() {
                let score = strategy.similarity(&query, &object.name);
                if score >= strategy.threshold() {
                    let score = if object.name == PLACEHOLDER_PERSON {
                        score / 2.0
                    } else {
                        score
                    };
                    keep_best(&mut best, Individual::Object(id), score);
                }
            }
            for (id, value) in self.ontology.values() {
                if self.ontology.is_typed_object_type(value) {
                    continue;
                }
                let score = strategy.similarity(&query, value);
                if score >= strategy.threshold() {
                    keep_best(&mut best, Individual::Value(id), score);
                }
            }
            for (id, state) in self.ontology.states() {
                let score = strategy.similarity(&query, state);
                if score >= strategy.threshold() {
                    keep_best(&mut best, Individual::State(id), score);
                }
            }
        }
        best
    }

    /// Whether `name` is an object of the typed-object category `data_type`.
    pub fn check_for_typed_objects(&self, name: &str, data_type: &str) -> bool {
        self.ontology.typed_object(name, data_type).is_some()
    }
}

/// Whether any word of `method` after its leading verb occurs in `text`,
/// ignoring case. `"turnOnLight"` matches "the light".
///
/// Words split only before capitals, so digits stay with their word:
/// `"goToRoom2"` needs "room2".
pub fn check_for_substring(method: &str, text: &str) -> bool {
    let text = text.to_lowercase();
    let name = method
        .with_boundaries(&[Boundary::Underscore, Boundary::LowerUpper, Boundary::DigitUpper])
        .to_case(Case::Lower);
    let mut words = name.split(' ');
    words.next();
    words.any(|word| !word.is_empty() && text.contains(word))
}

fn keep_best<K: Ord>(best: &mut BTreeMap<K, f64>, key: K, score: f64) {
    best.entry(key)
        .and_modify(|current| *current = current.max(score))
        .or_insert(score);
}

fn intersect<K: Ord + Copy>(a: &BTreeMap<K, f64>, b: &BTreeMap<K, f64>) -> Vec<(K, f64)> {
    a.iter()
        .filter_map(|(key, left)| b.get(key).map(|right| (*key, (left + right) / 2.0)))
        .collect()
}
