//! Per-utterance entry point.

use tracing::{debug, info};

use crate::candidate::CommandCandidate;
use crate::command::{Command, CommandBuilder};
use crate::config::Config;
use crate::error::SynthError;
use crate::input::{Utterance, UtteranceInput};
use crate::mapper::OntologyMapper;
use crate::ontology::Ontology;
use crate::report::CommandReport;
use crate::role::Label;
use crate::srl::SrlExtractor;

/// The outcome for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub command: Command,
    pub candidate: CommandCandidate,
}

impl Synthesis {
    pub fn report(&self, ontology: &Ontology) -> CommandReport {
        self.candidate.report(ontology)
    }
}

/// Turns annotated utterances into command candidates against one ontology.
///
/// The ontology and configuration are fixed at construction and only read
/// afterwards; every call to [`MethodSynthesizer::synthesize`] works on its
/// own utterance.
pub struct MethodSynthesizer<'o> {
    ontology: &'o Ontology,
    config: Config,
}

impl<'o> MethodSynthesizer<'o> {
    pub fn new(ontology: &'o Ontology, config: Config) -> Result<Self, SynthError> {
        config.validate()?;
        Ok(MethodSynthesizer { ontology, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ontology(&self) -> &'o Ontology {
        self.ontology
    }

    /// Validate `input` and synthesize it.
    pub fn synthesize(&self, input: UtteranceInput) -> Result<Synthesis, SynthError> {
        let utterance = Utterance::new(input)?;
        self.synthesize_utterance(&utterance)
    }

    pub fn synthesize_utterance(&self, utterance: &Utterance) -> Result<Synthesis, SynthError> {
        let teaching = self.is_teaching(utterance)?;
        let builder = CommandBuilder::new(
            utterance,
            SrlExtractor::new(self.config.use_to_be_modifier),
        );
        let command = builder.build(teaching)?;
        debug!(
            teaching = command.is_teaching(),
            instructions = command.instructions().count(),
            "built command"
        );

        let candidate = OntologyMapper::new(self.ontology, &self.config).map(&command, utterance);
        Ok(Synthesis { command, candidate })
    }

    /// Whether to build a teaching command.
    ///
    /// The binary classifier decides first. An utterance it rejected still
    /// counts as teaching when enough tokens were labelled as declaration.
    /// Unlabelled utterances are never overridden.
    pub fn is_teaching(&self, utterance: &Utterance) -> Result<bool, SynthError> {
        if utterance.is_teaching() {
            return Ok(true);
        }
        if utterance.tokens().iter().all(|token| token.teaching_part.is_none()) {
            return Ok(false);
        }

        let declarations = utterance
            .labels()?
            .into_iter()
            .filter(|label| *label == Label::Declaration)
            .count();
        let probability = utterance.teaching_probability();
        let teaching = self
            .config
            .teaching_override
            .applies(probability, declarations);
        if teaching {
            info!(
                probability,
                declarations, "declaration labels override teaching classification"
            );
        }
        Ok(teaching)
    }
}
