//! Verb-anchored chunking over SRL annotations.
//!
//! Each SRL frame is anchored on a predicate token (the target of a "V" arc).
//! A chunk is everything reachable from the anchor over outgoing argument
//! arcs, so nested frames ("open the door that is red") stay inside the
//! instruction that owns them.
//!
//! Verbs that the instruction splitter put into the same instruction
//! ("you have to open ...") are merged into one verb group: the verb that
//! receives an argument arc is the main verb, the rest become modifiers.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use tracing::debug;

use crate::input::Utterance;
use crate::instruction::{Instruction, InstructionKind, Parameter};
use crate::role::{self, is_structural};

const COPULA: &str = "be";
const VERB_PHRASE: &str = "VP";
const VERB_PHRASE_BEGIN: &str = "B-VP";

/// The tokens of one instruction, as indices into the utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionChunk {
    pub main: usize,
    /// Main verb first, then modifier verbs.
    pub verbs: Vec<usize>,
    /// Every token of the chunk, ascending.
    pub tokens: Vec<usize>,
}

impl InstructionChunk {
    pub fn first(&self) -> usize {
        self.tokens[0]
    }

    pub fn last(&self) -> usize {
        self.tokens[self.tokens.len() - 1]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SrlExtractor {
    use_to_be_modifier: bool,
}

impl SrlExtractor {
    pub fn new(use_to_be_modifier: bool) -> Self {
        SrlExtractor { use_to_be_modifier }
    }

    /// Whether the token at `index` anchors an instruction.
    ///
    /// It must be the target of a "V" arc, be tagged as a verb inside a verb
    /// phrase, and not be a modal.
    pub fn is_anchor(utterance: &Utterance, index: usize) -> bool {
        let token = utterance.token(index);
        let mut predicate = false;
        for edge in utterance.incoming(index) {
            if edge.role == role::MODAL {
                return false;
            }
            predicate |= edge.role == role::VERB;
        }
        predicate && token.is_verb() && token.chunk_name == VERB_PHRASE && !token.is_modal()
    }

    /// Anchors grouped by instruction number, main verb first, ordered by the
    /// main verb's position.
    pub fn verb_groups(&self, utterance: &Utterance) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut by_instruction: HashMap<usize, usize> = HashMap::new();

        for index in (0..utterance.len()).filter(|i| Self::is_anchor(utterance, *i)) {
            let instruction = utterance.token(index).instruction_number;
            match by_instruction.get(&instruction).copied() {
                None => {
                    by_instruction.insert(instruction, groups.len());
                    groups.push(vec![index]);
                }
                Some(group) => {
                    let group = &mut groups[group];
                    let main = main_verb(utterance, index, group[0]);
                    debug!(
                        main = %utterance.token(main).value,
                        "merging verbs of instruction {instruction}"
                    );
                    if main == index {
                        group.insert(0, index);
                    } else {
                        group.push(index);
                    }
                }
            }
        }

        if self.use_to_be_modifier {
            for group in &mut groups {
                if let Some(copula) = governing_copula(utterance, group[0]) {
                    if !group.contains(&copula) {
                        group.push(copula);
                    }
                }
            }
        }

        groups.sort_by_key(|group| group[0]);
        groups
    }

    /// One chunk per verb group.
    pub fn chunks(&self, utterance: &Utterance) -> Vec<InstructionChunk> {
        self.verb_groups(utterance)
            .into_iter()
            .map(|verbs| {
                let main = verbs[0];
                let tokens = reachable(utterance, main);
                debug!(
                    verb = %utterance.token(main).value,
                    tokens = ?tokens,
                    "extracted chunk"
                );
                InstructionChunk {
                    main,
                    verbs,
                    tokens,
                }
            })
            .collect()
    }

    /// Parameter groups of a chunk, one per SRL role in first-encounter order.
    ///
    /// Tokens that are predicates or modals are skipped, and a token joins
    /// only the first role it is found under.
    pub fn parameters(&self, utterance: &Utterance, chunk: &InstructionChunk) -> Vec<Parameter> {
        let mut roles: IndexMap<&str, Vec<usize>> = IndexMap::new();
        let mut assigned: BTreeSet<usize> = BTreeSet::new();

        for &index in &chunk.tokens {
            let edges: Vec<_> = utterance.incoming(index).collect();
            if edges.is_empty() || edges.iter().any(|edge| is_structural(&edge.role)) {
                continue;
            }
            for edge in edges {
                if assigned.insert(index) {
                    roles.entry(edge.role.as_str()).or_default().push(index);
                }
            }
        }

        roles
            .into_iter()
            .map(|(role, indices)| {
                let tokens = indices
                    .into_iter()
                    .map(|index| utterance.token(index).clone())
                    .collect();
                Parameter::new(role, tokens)
            })
            .collect()
    }

    /// Build the instruction for `chunk`.
    pub fn instruction(
        &self,
        utterance: &Utterance,
        chunk: &InstructionChunk,
        kind: InstructionKind,
    ) -> Instruction {
        let name_tokens = chunk
            .verbs
            .iter()
            .map(|index| utterance.token(*index).clone())
            .collect();
        Instruction::new(kind, name_tokens, self.parameters(utterance, chunk))
    }
}

/// The main verb of two predicates sharing an instruction.
fn main_verb(utterance: &Utterance, a: usize, b: usize) -> usize {
    let has_argument = |index: usize| {
        utterance
            .incoming(index)
            .any(|edge| edge.role != role::VERB)
    };
    if has_argument(a) {
        a
    } else if has_argument(b) {
        b
    } else if utterance.token(a).position > utterance.token(b).position {
        a
    } else {
        b
    }
}

/// Walk back through the verb phrase of the same instruction looking for a
/// form of "be".
fn governing_copula(utterance: &Utterance, index: usize) -> Option<usize> {
    let mut current = index;
    while current > 0 {
        let previous = current - 1;
        let (act, pred) = (utterance.token(current), utterance.token(previous));
        if pred.chunk_name != VERB_PHRASE
            || act.chunk_iob == VERB_PHRASE_BEGIN
            || pred.instruction_number != act.instruction_number
        {
            return None;
        }
        if pred.lemma.as_deref() == Some(COPULA) {
            return Some(previous);
        }
        current = previous;
    }
    None
}

/// `start` and every token reachable over outgoing argument arcs, ascending.
fn reachable(utterance: &Utterance, start: usize) -> Vec<usize> {
    let mut seen = BTreeSet::from([start]);
    let mut pending = vec![start];
    while let Some(index) = pending.pop() {
        for edge in utterance.outgoing(index) {
            if edge.role != role::VERB && seen.insert(edge.target) {
                pending.push(edge.target);
            }
        }
    }
    seen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::UtteranceInput;
    use crate::token::Token;
    use pretty_assertions::assert_eq;

    fn verb(position: usize, value: &str, instruction: usize) -> Token {
        Token::new(position, value, "VB")
            .lemma(value)
            .chunk("VP", "B-VP")
            .instruction(instruction)
    }

    fn noun(position: usize, value: &str, pos: &str, instruction: usize) -> Token {
        Token::new(position, value, pos)
            .lemma(value)
            .chunk("NP", "I-NP")
            .instruction(instruction)
    }

    /// "open the microwave door"
    fn open_door() -> Utterance {
        let input = UtteranceInput::chained(vec![
            verb(0, "open", 0),
            noun(1, "the", "DT", 0),
            noun(2, "microwave", "NN", 0),
            noun(3, "door", "NN", 0),
        ])
        .arc(0, 0, "V")
        .arc(0, 1, "A1")
        .arc(0, 2, "A1")
        .arc(0, 3, "A1");
        Utterance::new(input).unwrap()
    }

    #[test]
    fn single_verb_chunk() {
        let utterance = open_door();
        let extractor = SrlExtractor::default();
        let chunks = extractor.chunks(&utterance);
        assert_eq!(
            chunks,
            vec![InstructionChunk {
                main: 0,
                verbs: vec![0],
                tokens: vec![0, 1, 2, 3]
            }]
        );
        let parameters = extractor.parameters(&utterance, &chunks[0]);
        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters[0].name, "the microwave door");
        assert_eq!(parameters[0].role, "A1");
    }

    #[test]
    fn modal_verbs_do_not_anchor() {
        let input = UtteranceInput::chained(vec![
            Token::new(0, "can", "MD").chunk("VP", "B-VP"),
            verb(1, "open", 0).chunk("VP", "I-VP"),
            noun(2, "it", "PRP", 0),
        ])
        .arc(0, 0, "V")
        .arc(1, 1, "V")
        .arc(1, 0, "AM-MOD")
        .arc(1, 2, "A1");
        let utterance = Utterance::new(input).unwrap();
        assert!(!SrlExtractor::is_anchor(&utterance, 0));
        assert!(SrlExtractor::is_anchor(&utterance, 1));

        let extractor = SrlExtractor::default();
        let chunks = extractor.chunks(&utterance);
        assert_eq!(chunks.len(), 1);
        let parameters = extractor.parameters(&utterance, &chunks[0]);
        let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["it"]);
    }

    #[test]
    fn verbs_of_one_instruction_merge_under_main_verb() {
        // "you have to open the door": "open" is an argument of "have".
        let input = UtteranceInput::chained(vec![
            noun(0, "you", "PRP", 0),
            verb(1, "have", 0),
            Token::new(2, "to", "TO").chunk("VP", "I-VP").instruction(0),
            verb(3, "open", 0).chunk("VP", "I-VP"),
            noun(4, "door", "NN", 0),
        ])
        .arc(1, 1, "V")
        .arc(1, 0, "A0")
        .arc(1, 3, "A1")
        .arc(3, 3, "V")
        .arc(3, 4, "A1");
        let utterance = Utterance::new(input).unwrap();
        let extractor = SrlExtractor::default();
        assert_eq!(extractor.verb_groups(&utterance), vec![vec![3, 1]]);

        let chunks = extractor.chunks(&utterance);
        assert_eq!(chunks[0].tokens, vec![3, 4]);
        let instruction = extractor.instruction(&utterance, &chunks[0], InstructionKind::Description);
        assert_eq!(instruction.name, "open have");
    }

    #[test]
    fn later_verb_wins_without_arguments() {
        let input = UtteranceInput::chained(vec![verb(0, "go", 0), verb(1, "get", 0)])
            .arc(0, 0, "V")
            .arc(1, 1, "V");
        let utterance = Utterance::new(input).unwrap();
        let groups = SrlExtractor::default().verb_groups(&utterance);
        assert_eq!(groups, vec![vec![1, 0]]);
    }

    #[test]
    fn separate_instructions_stay_apart() {
        let input = UtteranceInput::chained(vec![
            verb(0, "open", 0),
            noun(1, "fridge", "NN", 0),
            verb(2, "take", 1),
            noun(3, "cup", "NN", 1),
        ])
        .arc(0, 0, "V")
        .arc(0, 1, "A1")
        .arc(2, 2, "V")
        .arc(2, 3, "A1");
        let utterance = Utterance::new(input).unwrap();
        let chunks = SrlExtractor::default().chunks(&utterance);
        let tokens: Vec<Vec<usize>> = chunks.iter().map(|c| c.tokens.clone()).collect();
        assert_eq!(tokens, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn cyclic_annotations_terminate() {
        let input = UtteranceInput::chained(vec![
            verb(0, "open", 0),
            noun(1, "door", "NN", 0),
            noun(2, "handle", "NN", 0),
        ])
        .arc(0, 0, "V")
        .arc(0, 1, "A1")
        .arc(1, 2, "A1")
        .arc(2, 1, "A1")
        .arc(2, 0, "AM-LOC");
        let utterance = Utterance::new(input).unwrap();
        let chunks = SrlExtractor::default().chunks(&utterance);
        assert_eq!(chunks[0].tokens, vec![0, 1, 2]);
    }

    #[test]
    fn token_joins_first_role_only() {
        let input = UtteranceInput::chained(vec![
            verb(0, "put", 0),
            noun(1, "cup", "NN", 0),
            noun(2, "table", "NN", 0),
        ])
        .arc(0, 0, "V")
        .arc(0, 1, "A1")
        .arc(0, 2, "A2")
        .arc(0, 1, "A2");
        let utterance = Utterance::new(input).unwrap();
        let extractor = SrlExtractor::default();
        let chunks = extractor.chunks(&utterance);
        let parameters = extractor.parameters(&utterance, &chunks[0]);
        let groups: Vec<(&str, &str)> = parameters
            .iter()
            .map(|p| (p.role.as_str(), p.name.as_str()))
            .collect();
        assert_eq!(groups, vec![("A1", "cup"), ("A2", "table")]);
    }

    #[test]
    fn copula_joins_verb_group() {
        // "the door is opened"
        let input = UtteranceInput::chained(vec![
            noun(0, "door", "NN", 0),
            Token::new(1, "is", "VBZ")
                .lemma("be")
                .chunk("VP", "B-VP")
                .instruction(0),
            verb(2, "opened", 0).chunk("VP", "I-VP"),
        ])
        .arc(2, 2, "V")
        .arc(2, 0, "A1");
        let utterance = Utterance::new(input).unwrap();
        assert_eq!(SrlExtractor::new(false).verb_groups(&utterance), vec![vec![2]]);
        assert_eq!(SrlExtractor::new(true).verb_groups(&utterance), vec![vec![2, 1]]);
    }
}
