//! Commands: the per-utterance bucketing of instructions.
//!
//! The classifier labels every token, but an instruction has to land in
//! exactly one bucket. [`merge_labels`] turns token labels into chunk labels
//! by majority vote; ties look at the neighbouring tokens of the chunk.
//!
//! ```text
//! tokens:  to  make coffee you  have to  press the button
//! labels:  DECL DECL DECL  DESC DESC DESC DESC  DESC DESC
//! chunks:  [make coffee]   [press the button]
//! merged:  DECL            DESC
//! ```

use tracing::debug;

use crate::error::SynthError;
use crate::input::Utterance;
use crate::instruction::{Instruction, InstructionKind};
use crate::role::Label;
use crate::srl::{InstructionChunk, SrlExtractor};

/// An immutable snapshot of one utterance's instructions.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Invoke existing methods.
    Execution { descriptions: Vec<Instruction> },
    /// Define a new method from a declaration and a body.
    Teaching {
        declarations: Vec<Instruction>,
        descriptions: Vec<Instruction>,
        elses: Vec<Instruction>,
    },
}

impl Command {
    pub fn is_teaching(&self) -> bool {
        matches!(self, Command::Teaching { .. })
    }

    pub fn declarations(&self) -> &[Instruction] {
        match self {
            Command::Execution { .. } => &[],
            Command::Teaching { declarations, .. } => declarations,
        }
    }

    pub fn descriptions(&self) -> &[Instruction] {
        match self {
            Command::Execution { descriptions } | Command::Teaching { descriptions, .. } => {
                descriptions
            }
        }
    }

    pub fn elses(&self) -> &[Instruction] {
        match self {
            Command::Execution { .. } => &[],
            Command::Teaching { elses, .. } => elses,
        }
    }

    /// Every instruction, declarations first.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.declarations()
            .iter()
            .chain(self.descriptions())
            .chain(self.elses())
    }
}

/// One label per chunk, decided by majority vote over the chunk's tokens.
///
/// A tie between two or more labels takes the label of the token before the
/// chunk's first token; failing that, the token after the chunk's last
/// token; failing that, [`Label::Description`].
pub fn merge_labels(chunks: &[InstructionChunk], labels: &[Label]) -> Vec<Label> {
    chunks
        .iter()
        .map(|chunk| chunk_label(chunk, labels))
        .collect()
}

fn chunk_label(chunk: &InstructionChunk, labels: &[Label]) -> Label {
    let mut counts = [0usize; 3];
    for index in &chunk.tokens {
        if let Some(label) = labels.get(*index) {
            counts[slot(*label)] += 1;
        }
    }
    let best = counts.iter().copied().max().unwrap_or(0);
    let leaders: Vec<Label> = Label::ALL
        .into_iter()
        .filter(|label| counts[slot(*label)] == best)
        .collect();

    if let [label] = leaders[..] {
        return label;
    }

    let neighbour = chunk
        .first()
        .checked_sub(1)
        .and_then(|before| labels.get(before))
        .or_else(|| labels.get(chunk.last() + 1))
        .copied();
    let label = neighbour.unwrap_or(Label::Description);
    debug!(?leaders, resolved = %label, main = chunk.main, "label tie");
    label
}

fn slot(label: Label) -> usize {
    match label {
        Label::Declaration => 0,
        Label::Description => 1,
        Label::Else => 2,
    }
}

/// Token labels after chunk-level merging. Tokens outside every chunk keep
/// their classifier label.
pub fn merged_prediction(chunks: &[InstructionChunk], labels: &[Label]) -> Vec<Label> {
    let mut merged = labels.to_vec();
    for (chunk, label) in chunks.iter().zip(merge_labels(chunks, labels)) {
        for index in &chunk.tokens {
            if let Some(slot) = merged.get_mut(*index) {
                *slot = label;
            }
        }
    }
    merged
}

/// Space-separated label names, for logs.
pub fn prediction_string(labels: &[Label]) -> String {
    labels
        .iter()
        .map(Label::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Assembles commands from an utterance's chunks.
pub struct CommandBuilder<'u> {
    utterance: &'u Utterance,
    extractor: SrlExtractor,
    chunks: Vec<InstructionChunk>,
}

impl<'u> CommandBuilder<'u> {
    pub fn new(utterance: &'u Utterance, extractor: SrlExtractor) -> Self {
        let chunks = extractor.chunks(utterance);
        CommandBuilder {
            utterance,
            extractor,
            chunks,
        }
    }

    pub fn chunks(&self) -> &[InstructionChunk] {
        &self.chunks
    }

    /// Every chunk as a description.
    pub fn build_execution_command(&self) -> Command {
        let descriptions = self
            .chunks
            .iter()
            .map(|chunk| {
                self.extractor
                    .instruction(self.utterance, chunk, InstructionKind::Description)
            })
            .collect();
        Command::Execution { descriptions }
    }

    /// Bucket chunks by their merged label.
    ///
    /// Without a single declaration chunk there is nothing to teach, and the
    /// execution command is returned instead.
    pub fn build_teaching_command(&self) -> Result<Command, SynthError> {
        let labels = self.utterance.labels()?;
        let merged = merge_labels(&self.chunks, &labels);
        debug!(
            prediction = %prediction_string(&merged_prediction(&self.chunks, &labels)),
            "merged classification"
        );

        if !merged.contains(&Label::Declaration) {
            debug!("no declaration chunk, building execution command");
            return Ok(self.build_execution_command());
        }

        let mut declarations = Vec::new();
        let mut descriptions = Vec::new();
        let mut elses = Vec::new();
        for (chunk, label) in self.chunks.iter().zip(merged) {
            let instruction = self.extractor.instruction(self.utterance, chunk, label.into());
            match label {
                Label::Declaration => declarations.push(instruction),
                Label::Description => descriptions.push(instruction),
                Label::Else => elses.push(instruction),
            }
        }
        Ok(Command::Teaching {
            declarations,
            descriptions,
            elses,
        })
    }

    pub fn build(&self, teaching: bool) -> Result<Command, SynthError> {
        if teaching {
            self.build_teaching_command()
        } else {
            Ok(self.build_execution_command())
        }
    }
}
