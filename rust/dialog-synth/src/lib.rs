//! # Dialog Synth — Natural Language Commands to Ontology Calls
//!
//! Maps a spoken or typed command, already annotated by an upstream
//! linguistic pipeline, onto calls of a target API described by an ontology.
//! Teaching utterances ("to make coffee you have to ...") additionally yield
//! the signature of the new method being taught.
//!
//! ## Core Ideas
//!
//! - **Instructions are verb-anchored chunks**: every main verb of the SRL
//!   annotation anchors one instruction; its arguments become parameters.
//! - **Labels are voted per chunk**: token-level classifier labels are merged
//!   by majority so each instruction lands in exactly one bucket.
//! - **Matching needs two witnesses**: a name only matches an ontology member
//!   when a precise and a fuzzy similarity measure both accept it.
//! - **Hypotheses are enumerated, then pruned**: every combination of name
//!   and parameter candidates becomes a call, which is type checked, scored,
//!   deduplicated and cut to the best few.
//!
//! ## Architecture
//!
//! ```text
//! UtteranceInput → Utterance (validated, ordered)
//!   → SrlExtractor (chunks, parameters) → CommandBuilder (label merging)
//!     → Command → OntologyMapper
//!       → FunctionNameMapper / FunctionParameterMapper → StringOntologyMatcher
//!         → FunctionCallFinder → FunctionCallScorer → CommandCandidate
//! ```
//!
//! [`MethodSynthesizer`] runs the whole pipeline for one utterance:
//!
//! ```rust
//! use dialog_synth::{Config, MethodSynthesizer, Token, UtteranceInput, kitchen};
//!
//! let ontology = kitchen()?;
//! let synthesizer = MethodSynthesizer::new(&ontology, Config::default())?;
//!
//! let input = UtteranceInput::chained(vec![
//!     Token::new(0, "open", "VB").chunk("VP", "B-VP"),
//!     Token::new(1, "the", "DT").chunk("NP", "B-NP"),
//!     Token::new(2, "fridge", "NN").chunk("NP", "I-NP"),
//! ])
//! .arc(0, 0, "V")
//! .arc(0, 1, "A1")
//! .arc(0, 2, "A1");
//!
//! let synthesis = synthesizer.synthesize(input)?;
//! let best = synthesis.candidate.best_calls().next().map(|call| call.method());
//! assert_eq!(best, ontology.method_by_name("open"));
//! # Ok::<(), dialog_synth::SynthError>(())
//! ```

pub mod candidate;
pub mod combinatorics;
pub mod command;
pub mod config;
pub mod error;
pub mod finder;
pub mod input;
pub mod instruction;
pub mod mapper;
pub mod matcher;
pub mod name;
pub mod ontology;
pub mod parameter;
pub mod report;
pub mod role;
pub mod score;
pub mod scorer;
pub mod srl;
pub mod synthesizer;
pub mod token;

pub use candidate::{
    CommandCandidate, FunctionCallCandidate, FunctionNameCandidate, FunctionParameterCandidate,
    MappingStats, MethodSignatureCandidate, ParameterMapping, ScriptEntry,
};
pub use command::{Command, CommandBuilder};
pub use config::{Config, TeachingOverride};
pub use error::SynthError;
pub use finder::FunctionCallFinder;
pub use input::{ContextAction, ContextEntity, ContextRelation, SrlArc, Utterance, UtteranceInput};
pub use instruction::{Instruction, InstructionKind, Parameter};
pub use mapper::OntologyMapper;
pub use matcher::{FuzzySubsequence, JaroWinkler, SearchStrategy, StringOntologyMatcher};
pub use name::FunctionNameMapper;
pub use ontology::{
    Individual, MethodBuilder, MethodId, ObjectBuilder, Ontology, OntologyBuilder,
    OntologyDocument, kitchen,
};
pub use parameter::FunctionParameterMapper;
pub use report::CommandReport;
pub use role::Label;
pub use scorer::FunctionCallScorer;
pub use srl::{InstructionChunk, SrlExtractor};
pub use synthesizer::{MethodSynthesizer, Synthesis};
pub use token::Token;
