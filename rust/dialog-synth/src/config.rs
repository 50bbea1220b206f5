//! Static configuration for the synthesis pipeline.
//!
//! A [`Config`] is loaded once (usually from JSON) and shared read-only by
//! every utterance processed afterwards. Every field has a default, so a
//! partial document only needs to name the options it changes:
//!
//! ```json
//! { "top_n": 5, "use_permutations": true }
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::SynthError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How many ranked call candidates to keep per instruction.
    pub top_n: usize,
    /// Lemmas removed from instruction names before matching.
    pub name_stop_words: BTreeSet<String>,
    /// Words removed from parameters before matching.
    pub parameter_stop_words: BTreeSet<String>,
    /// POS tags a parameter token must carry to take part in matching.
    pub parameter_pos: BTreeSet<String>,
    /// Use coreference and synonym annotations when present.
    pub use_context: bool,
    /// Also match word-order permutations of multi-word instruction names.
    pub use_permutations: bool,
    /// Append a governing copula ("be") to an instruction's verb group.
    pub use_to_be_modifier: bool,
    /// Also match the surface form of instruction names.
    pub match_unlemmatized: bool,
    pub teaching_override: TeachingOverride,
}

/// Thresholds under which chunk-level evidence overrides a negative
/// teaching classification.
///
/// An utterance is treated as teaching when
/// `probability > min_probability && declarations > min_declarations_with_probability`
/// or when `declarations > min_declarations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeachingOverride {
    pub min_probability: f64,
    pub min_declarations_with_probability: usize,
    pub min_declarations: usize,
}

impl Default for TeachingOverride {
    fn default() -> Self {
        TeachingOverride {
            min_probability: 0.1,
            min_declarations_with_probability: 2,
            min_declarations: 5,
        }
    }
}

impl TeachingOverride {
    pub fn applies(&self, probability: f64, declarations: usize) -> bool {
        (probability > self.min_probability
            && declarations > self.min_declarations_with_probability)
            || declarations > self.min_declarations
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            top_n: 3,
            name_stop_words: words(["mean"]),
            parameter_stop_words: words(["how"]),
            parameter_pos: words(["NN"]),
            use_context: true,
            use_permutations: false,
            use_to_be_modifier: false,
            match_unlemmatized: false,
            teaching_override: TeachingOverride::default(),
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, SynthError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SynthError> {
        if self.top_n == 0 {
            return Err(SynthError::InvalidConfig(
                "top_n must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.teaching_override.min_probability) {
            return Err(SynthError::InvalidConfig(format!(
                "teaching_override.min_probability {} is outside [0, 1]",
                self.teaching_override.min_probability
            )));
        }
        Ok(())
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_context(mut self, use_context: bool) -> Self {
        self.use_context = use_context;
        self
    }

    pub fn with_permutations(mut self, use_permutations: bool) -> Self {
        self.use_permutations = use_permutations;
        self
    }

    pub fn with_to_be_modifier(mut self, use_to_be_modifier: bool) -> Self {
        self.use_to_be_modifier = use_to_be_modifier;
        self
    }

    pub(crate) fn is_name_stop_word(&self, word: &str) -> bool {
        self.name_stop_words.contains(&word.to_lowercase())
    }

    pub(crate) fn is_parameter_stop_word(&self, word: &str) -> bool {
        self.parameter_stop_words.contains(&word.to_lowercase())
    }
}

fn words<const N: usize>(list: [&str; N]) -> BTreeSet<String> {
    list.into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_document_keeps_defaults() {
        let config = Config::from_json(r#"{ "top_n": 5, "use_permutations": true }"#).unwrap();
        assert_eq!(config.top_n, 5);
        assert!(config.use_permutations);
        assert_eq!(config.parameter_pos, words(["NN"]));
        assert_eq!(config.teaching_override, TeachingOverride::default());
    }

    #[test]
    fn zero_top_n_is_rejected() {
        let error = Config::from_json(r#"{ "top_n": 0 }"#).unwrap_err();
        assert!(matches!(error, SynthError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_is_reported() {
        let error = Config::from_json("{ top_n: ").unwrap_err();
        assert!(matches!(error, SynthError::Json(_)));
    }

    #[test]
    fn teaching_override_thresholds() {
        let thresholds = TeachingOverride::default();
        assert!(thresholds.applies(0.2, 3));
        assert!(!thresholds.applies(0.05, 3));
        assert!(thresholds.applies(0.0, 6));
        assert!(!thresholds.applies(0.9, 2));
    }

    #[test]
    fn stop_words_ignore_case() {
        let config = Config::default();
        assert!(config.is_name_stop_word("Mean"));
        assert!(config.is_parameter_stop_word("HOW"));
        assert!(!config.is_parameter_stop_word("door"));
    }
}
