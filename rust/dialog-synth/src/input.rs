//! Input layer: the annotated utterance handed over by the linguistic pipeline.
//!
//! An [`UtteranceInput`] is the raw annotation bundle: tokens in no particular
//! order, `next` links that spell out the word order, SRL arcs, context
//! annotations and the output of the binary teaching classifier. All of it is
//! plain serde data, so a pipeline running elsewhere can hand it over as JSON.
//!
//! [`Utterance::new`] checks the bundle and lays the tokens out in utterance
//! order. Every later stage works on the validated [`Utterance`] and refers to
//! tokens by their index in that order.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::SynthError;
use crate::role::Label;
use crate::token::Token;

/// A directed, role-labelled SRL arc between two token positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrlArc {
    pub source: usize,
    pub target: usize,
    pub role: String,
}

/// A relation attached to a context entity, e.g. a resolved anaphora.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRelation {
    /// Relation family, e.g. "referentRelation".
    pub kind: String,
    /// Relation name, e.g. "anaphoraReferent".
    pub name: String,
    pub confidence: f64,
    /// Name of the referenced entity.
    pub referent: String,
}

/// An entity recognised by the context analysis, anchored on tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntity {
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub relations: Vec<ContextRelation>,
    /// Positions of the tokens this entity refers to.
    pub tokens: Vec<usize>,
}

/// An action recognised by the context analysis, anchored on tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAction {
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub tokens: Vec<usize>,
}

/// The raw annotation bundle for one utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtteranceInput {
    pub tokens: Vec<Token>,
    /// `(from, to)` position pairs linking each token to its successor.
    #[serde(default)]
    pub next: Vec<(usize, usize)>,
    #[serde(default)]
    pub srl: Vec<SrlArc>,
    #[serde(default)]
    pub entities: Vec<ContextEntity>,
    #[serde(default)]
    pub actions: Vec<ContextAction>,
    #[serde(default)]
    pub is_teaching: bool,
    #[serde(default)]
    pub teaching_probability: f64,
}

impl UtteranceInput {
    /// Link `tokens` in ascending position order.
    pub fn chained(mut tokens: Vec<Token>) -> Self {
        tokens.sort_by_key(|token| token.position);
        let next = tokens
            .windows(2)
            .map(|pair| (pair[0].position, pair[1].position))
            .collect();
        UtteranceInput {
            tokens,
            next,
            ..Default::default()
        }
    }

    pub fn arc(mut self, source: usize, target: usize, role: impl Into<String>) -> Self {
        self.srl.push(SrlArc {
            source,
            target,
            role: role.into(),
        });
        self
    }

    pub fn teaching(mut self, is_teaching: bool, probability: f64) -> Self {
        self.is_teaching = is_teaching;
        self.teaching_probability = probability;
        self
    }

    pub fn entity(mut self, entity: ContextEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn action(mut self, action: ContextAction) -> Self {
        self.actions.push(action);
        self
    }
}

/// An SRL arc resolved to utterance indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleEdge {
    pub source: usize,
    pub target: usize,
    pub role: String,
}

const REFERENT_RELATION: &str = "referentRelation";
const REFERENT_NAMES: [&str; 2] = ["anaphoraReferent", "objectIdentityReferent"];

/// A validated utterance with tokens in utterance order.
#[derive(Debug, Clone)]
pub struct Utterance {
    tokens: Vec<Token>,
    edges: Vec<RoleEdge>,
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
    entities: Vec<ContextEntity>,
    actions: Vec<ContextAction>,
    is_teaching: bool,
    teaching_probability: f64,
}

impl Utterance {
    pub fn new(input: UtteranceInput) -> Result<Self, SynthError> {
        let UtteranceInput {
            tokens,
            next,
            srl,
            entities,
            actions,
            is_teaching,
            teaching_probability,
        } = input;

        if tokens.is_empty() {
            return Err(SynthError::EmptyUtterance);
        }

        let mut by_position = HashMap::with_capacity(tokens.len());
        for (slot, token) in tokens.iter().enumerate() {
            if by_position.insert(token.position, slot).is_some() {
                return Err(SynthError::DuplicatePosition {
                    position: token.position,
                });
            }
        }

        let order = chain_order(&tokens, &by_position, &next)?;

        if srl.is_empty() {
            return Err(SynthError::NoSrlAnnotations);
        }

        let mut tokens: Vec<Option<Token>> = tokens.into_iter().map(Some).collect();
        let ordered: Vec<Token> = order
            .iter()
            .filter_map(|slot| tokens[*slot].take())
            .collect();

        let index: HashMap<usize, usize> = ordered
            .iter()
            .enumerate()
            .map(|(index, token)| (token.position, index))
            .collect();
        let resolve = |position: usize| {
            index
                .get(&position)
                .copied()
                .ok_or(SynthError::UnknownPosition { position })
        };

        let mut edges = Vec::with_capacity(srl.len());
        let mut incoming = vec![Vec::new(); ordered.len()];
        let mut outgoing = vec![Vec::new(); ordered.len()];
        for arc in srl {
            let edge = RoleEdge {
                source: resolve(arc.source)?,
                target: resolve(arc.target)?,
                role: arc.role,
            };
            outgoing[edge.source].push(edges.len());
            incoming[edge.target].push(edges.len());
            edges.push(edge);
        }

        for position in entities
            .iter()
            .flat_map(|entity| entity.tokens.iter())
            .chain(actions.iter().flat_map(|action| action.tokens.iter()))
        {
            resolve(*position)?;
        }

        Ok(Utterance {
            tokens: ordered,
            edges,
            incoming,
            outgoing,
            entities,
            actions,
            is_teaching,
            teaching_probability,
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> &Token {
        &self.tokens[index]
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_teaching(&self) -> bool {
        self.is_teaching
    }

    pub fn teaching_probability(&self) -> f64 {
        self.teaching_probability
    }

    /// SRL edges ending at the token at `index`.
    pub fn incoming(&self, index: usize) -> impl Iterator<Item = &RoleEdge> {
        self.incoming[index].iter().map(|edge| &self.edges[*edge])
    }

    /// SRL edges starting at the token at `index`.
    pub fn outgoing(&self, index: usize) -> impl Iterator<Item = &RoleEdge> {
        self.outgoing[index].iter().map(|edge| &self.edges[*edge])
    }

    /// The classifier label of every token, in utterance order.
    pub fn labels(&self) -> Result<Vec<Label>, SynthError> {
        self.tokens
            .iter()
            .map(|token| match &token.teaching_part {
                Some(label) => Label::parse(token.position, label),
                None => Err(SynthError::MissingLabel {
                    position: token.position,
                }),
            })
            .collect()
    }

    /// Whether any coreference or synonym annotation is present.
    pub fn has_context(&self) -> bool {
        !self.entities.is_empty() || !self.actions.is_empty()
    }

    /// The referent substituted for `token`, if the context analysis
    /// resolved one.
    ///
    /// Uses the first entity anchored on the token and picks its most
    /// confident anaphora or object-identity relation.
    pub fn coreference(&self, token: &Token) -> Option<&str> {
        let position = token.position;
        let entity = self
            .entities
            .iter()
            .find(|entity| entity.tokens.contains(&position))?;
        entity
            .relations
            .iter()
            .filter(|relation| {
                relation.kind == REFERENT_RELATION
                    && REFERENT_NAMES.contains(&relation.name.as_str())
            })
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|relation| relation.referent.as_str())
    }

    /// Synonyms of entities anchored on `token`.
    pub fn entity_synonyms(&self, token: &Token) -> impl Iterator<Item = &str> {
        let position = token.position;
        self.entities
            .iter()
            .filter(move |entity| entity.tokens.contains(&position))
            .flat_map(|entity| entity.synonyms.iter().map(String::as_str))
    }

    /// Synonyms of actions anchored on `token`.
    pub fn action_synonyms(&self, token: &Token) -> impl Iterator<Item = &str> {
        let position = token.position;
        self.actions
            .iter()
            .filter(move |action| action.tokens.contains(&position))
            .flat_map(|action| action.synonyms.iter().map(String::as_str))
    }
}

/// Walk the `next` links from the unique head and return token slots in
/// utterance order.
fn chain_order(
    tokens: &[Token],
    by_position: &HashMap<usize, usize>,
    next: &[(usize, usize)],
) -> Result<Vec<usize>, SynthError> {
    let slot = |position: usize| {
        by_position
            .get(&position)
            .copied()
            .ok_or(SynthError::UnknownPosition { position })
    };

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); tokens.len()];
    let mut has_predecessor = vec![false; tokens.len()];
    for (from, to) in next {
        let (from_slot, to_slot) = (slot(*from)?, slot(*to)?);
        if has_predecessor[to_slot] {
            return Err(SynthError::BrokenTokenChain {
                reason: format!("position {to} has more than one predecessor"),
            });
        }
        has_predecessor[to_slot] = true;
        successors[from_slot].push(to_slot);
    }

    for (from_slot, targets) in successors.iter().enumerate() {
        if targets.len() > 1 {
            return Err(SynthError::AmbiguousSuccessor {
                position: tokens[from_slot].position,
                count: targets.len(),
            });
        }
    }

    let heads: Vec<usize> = (0..tokens.len())
        .filter(|slot| !has_predecessor[*slot])
        .collect();
    let [head] = heads[..] else {
        return Err(SynthError::BrokenTokenChain {
            reason: format!("expected one first token, found {}", heads.len()),
        });
    };

    let mut order = Vec::with_capacity(tokens.len());
    let mut seen = HashSet::with_capacity(tokens.len());
    let mut current = Some(head);
    while let Some(slot) = current {
        if !seen.insert(slot) {
            return Err(SynthError::BrokenTokenChain {
                reason: format!("cycle at position {}", tokens[slot].position),
            });
        }
        order.push(slot);
        current = successors[slot].first().copied();
    }

    if order.len() != tokens.len() {
        return Err(SynthError::BrokenTokenChain {
            reason: format!(
                "chain reaches {} of {} tokens",
                order.len(),
                tokens.len()
            ),
        });
    }
    Ok(order)
}
