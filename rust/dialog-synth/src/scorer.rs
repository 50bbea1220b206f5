//! Type checking, scoring and deduplication of call candidates.
//!
//! Each candidate's parameter candidates are paired with the method's
//! declared parameters in every injective way. A pair counts only when the
//! candidate is type compatible with the declared parameter:
//!
//! | candidate  | declared type           | compatible when                           |
//! |------------|-------------------------|-------------------------------------------|
//! | primitive  | numeric                 | a token of the parameter is tagged `CD`   |
//! | primitive  | other primitive         | always                                    |
//! | object     | `Object`                | always                                    |
//! | object     | typed-object category   | the object or one sub-object has the type |
//! | value      | enumerated data type    | the value is one of the type's values     |
//! | state      | anything                | the type name is the state's name         |
//!
//! Every pairing with a positive parameter score becomes its own scored
//! candidate, so one finder candidate may yield several.

use tracing::debug;

use crate::candidate::{FunctionCallCandidate, FunctionParameterCandidate, ParameterMapping};
use crate::combinatorics::pairings;
use crate::matcher::{StringOntologyMatcher, check_for_substring};
use crate::ontology::{ANY_OBJECT, Individual, MethodParameter, Ontology, is_numeric_type, is_primitive_type};
use crate::score::{call_score, top_n};

/// A candidate none of whose parameters could be paired is still kept when
/// its name matched better than this.
pub const UNMAPPED_NAME_ACCEPTANCE: f64 = 0.8;

pub struct FunctionCallScorer<'m, 'o> {
    matcher: &'m StringOntologyMatcher<'o>,
}

impl<'m, 'o> FunctionCallScorer<'m, 'o> {
    pub fn new(matcher: &'m StringOntologyMatcher<'o>) -> Self {
        FunctionCallScorer { matcher }
    }

    fn ontology(&self) -> &'o Ontology {
        self.matcher.ontology()
    }

    /// Score every candidate, expanding each into its valid pairings, and
    /// drop duplicates.
    pub fn score(&self, calls: Vec<FunctionCallCandidate>) -> Vec<FunctionCallCandidate> {
        let mut scored = Vec::new();
        for call in calls {
            let method = self.ontology().method(call.method());
            let needed = method.parameters.len();
            let extracted = call.name.instruction.cleared_parameters().len();

            if call.parameters.is_empty() || needed == 0 {
                let score = self.score_unpaired(&call);
                debug!(method = %method.name, score, "scored call without pairing");
                scored.push(FunctionCallCandidate { score, ..call });
                continue;
            }

            let mut mapped_any = false;
            for pairing in pairings(call.parameters.len(), needed) {
                let mut parameter_score = 0.0;
                let mut mapping = Vec::new();
                for (candidate, slot) in call.parameters.iter().zip(pairing) {
                    let Some(slot) = slot else {
                        continue;
                    };
                    if let Some(accepted) = self.compatible(candidate, &method.parameters[slot]) {
                        parameter_score += accepted.score;
                        mapping.push(ParameterMapping {
                            candidate: accepted,
                            parameter: slot,
                        });
                    }
                }
                if parameter_score > 0.0 {
                    let score = call_score(
                        call.name.score,
                        parameter_score,
                        extracted,
                        mapping.len(),
                        needed,
                    );
                    debug!(method = %method.name, mapped = mapping.len(), score, "scored pairing");
                    scored.push(FunctionCallCandidate {
                        name: call.name.clone(),
                        parameters: mapping.iter().map(|m| m.candidate.clone()).collect(),
                        mapping: Some(mapping),
                        score,
                    });
                    mapped_any = true;
                }
            }

            if !mapped_any && call.name.score > UNMAPPED_NAME_ACCEPTANCE {
                let score = call_score(call.name.score, 0.0, extracted, 0, needed);
                debug!(method = %method.name, score, "no parameter fits, keeping name match");
                scored.push(FunctionCallCandidate { score, ..call });
            }
        }

        let scored = deduplicate(self.ontology(), scored);
        debug!(calls = scored.len(), "scored function calls");
        scored
    }

    /// The `n` best scored candidates.
    pub fn rank(&self, calls: Vec<FunctionCallCandidate>, n: usize) -> Vec<FunctionCallCandidate> {
        top_n(self.score(calls), n)
    }

    /// A parameterless method counts as fully satisfied when a parameter
    /// names the rest of the method name, as in "turn on the light" for
    /// `turnOnLight`. Otherwise only the name is scored.
    fn score_unpaired(&self, call: &FunctionCallCandidate) -> f64 {
        let ontology = self.ontology();
        let method = ontology.method(call.method());
        let extracted = call.name.instruction.cleared_parameters();

        if method.parameters.is_empty() {
            let named_by_match = call
                .parameters
                .iter()
                .filter_map(|candidate| candidate.individual)
                .any(|individual| check_for_substring(&method.name, ontology.individual_name(individual)));
            let named_by_text = extracted
                .iter()
                .any(|parameter| check_for_substring(&method.name, parameter.cleared_name()));
            if named_by_match || named_by_text {
                return call_score(call.name.score, 1.0, extracted.len(), 1, 1);
            }
        }
        call_score(call.name.score, 0.0, extracted.len(), 0, method.parameters.len())
    }

    /// The candidate as it would fill `declared`, or `None` if the types do
    /// not fit. An object may be replaced by a fitting sub-object.
    fn compatible(
        &self,
        candidate: &FunctionParameterCandidate,
        declared: &MethodParameter,
    ) -> Option<FunctionParameterCandidate> {
        let ontology = self.ontology();
        let data_type = declared.data_type.as_str();
        let fits = match candidate.individual {
            None if is_numeric_type(data_type) => candidate.parameter.has_cardinal(),
            None => is_primitive_type(data_type),
            Some(Individual::Object(id)) => {
                let object = ontology.object(id);
                if data_type == ANY_OBJECT
                    || self.matcher.check_for_typed_objects(&object.name, data_type)
                {
                    true
                } else {
                    let sub_object = object.sub_objects.iter().copied().find(|sub| {
                        self.matcher
                            .check_for_typed_objects(&ontology.object(*sub).name, data_type)
                    });
                    return sub_object.map(|sub| {
                        debug!(
                            object = %object.name,
                            sub_object = %ontology.object(sub).name,
                            "substituting sub-object"
                        );
                        FunctionParameterCandidate {
                            individual: Some(Individual::Object(sub)),
                            ..candidate.clone()
                        }
                    });
                }
            }
            Some(value @ Individual::Value(_)) => {
                let name = ontology.individual_name(value);
                ontology.data_type(data_type).is_some_and(|enumeration| {
                    enumeration.primitive && enumeration.values.iter().any(|v| v == name)
                })
            }
            Some(state @ Individual::State(_)) => ontology.individual_name(state) == data_type,
        };
        fits.then(|| candidate.clone())
    }
}

/// Keep the first of every group of equivalent candidates.
///
/// Candidates for the same method (or an alias) are equivalent when the
/// method takes no parameters and they stem from the same extracted
/// parameters, or when the method takes parameters and they map the same
/// candidates to the same declared parameters. Unmapped candidates of one
/// method are all equivalent.
pub fn deduplicate(ontology: &Ontology, calls: Vec<FunctionCallCandidate>) -> Vec<FunctionCallCandidate> {
    let mut kept: Vec<FunctionCallCandidate> = Vec::with_capacity(calls.len());
    for call in calls {
        let parameterless = ontology.method(call.method()).parameters.is_empty();
        let duplicate = kept.iter().any(|other| {
            ontology.same_method(call.method(), other.method())
                && if parameterless {
                    same_extracted(&call, other)
                } else {
                    call.same_mapping(other)
                }
        });
        if !duplicate {
            kept.push(call);
        }
    }
    kept
}

fn same_extracted(a: &FunctionCallCandidate, b: &FunctionCallCandidate) -> bool {
    a.parameters
        .iter()
        .map(|candidate| &candidate.parameter)
        .eq(b.parameters.iter().map(|candidate| &candidate.parameter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::candidate::FunctionNameCandidate;
    use crate::instruction::{ClearedInstruction, ClearedParameter, Instruction, InstructionKind, Parameter};
    use crate::ontology::{MethodBuilder, ObjectBuilder, OntologyBuilder, kitchen};
    use crate::token::Token;
    use pretty_assertions::assert_eq;

    fn parameter(position: usize, word: &str, pos: &str) -> Arc<Parameter> {
        let token = Token::new(position, word, pos);
        Arc::new(
            Parameter::new("A1", vec![token.clone()]).with_cleared(ClearedParameter {
                tokens: vec![token],
                name: word.into(),
                synonyms: vec![],
            }),
        )
    }

    fn name(ontology: &Ontology, method: &str, score: f64, parameters: Vec<Arc<Parameter>>) -> FunctionNameCandidate {
        let verb = Token::new(0, method, "VB");
        let instruction = Instruction::new(InstructionKind::Description, vec![verb.clone()], vec![])
            .with_cleared(ClearedInstruction {
                name_tokens: vec![verb],
                name: method.into(),
                surface_name: method.into(),
                synonyms: vec![],
                parameters,
            });
        FunctionNameCandidate {
            score,
            method: ontology.method_by_name(method).unwrap(),
            instruction: Arc::new(instruction),
        }
    }

    fn object(ontology: &Ontology, name: &str) -> Individual {
        ontology
            .objects()
            .find(|(_, o)| o.name == name)
            .map(|(id, _)| Individual::Object(id))
            .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn typed_object_is_mapped() {
        let ontology = kitchen().unwrap();
        let matcher = StringOntologyMatcher::new(&ontology);
        let scorer = FunctionCallScorer::new(&matcher);
        let door = parameter(1, "door", "NN");
        let call = FunctionCallCandidate::new(
            name(&ontology, "open", 1.0, vec![door.clone()]),
            vec![FunctionParameterCandidate::matched(0.9, object(&ontology, "MicrowaveDoor"), door)],
        );

        let scored = scorer.score(vec![call]);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].mapping().len(), 1);
        assert!(close(scored[0].score, 0.9 + 0.4 * 0.9));
    }

    #[test]
    fn sub_object_stands_in() {
        let ontology = kitchen().unwrap();
        let matcher = StringOntologyMatcher::new(&ontology);
        let scorer = FunctionCallScorer::new(&matcher);
        let microwave = parameter(1, "microwave", "NN");
        let call = FunctionCallCandidate::new(
            name(&ontology, "open", 1.0, vec![microwave.clone()]),
            vec![FunctionParameterCandidate::matched(0.9, object(&ontology, "Microwave"), microwave)],
        );

        let scored = scorer.score(vec![call]);
        assert_eq!(
            scored[0].mapping()[0].candidate.individual,
            Some(object(&ontology, "MicrowaveDoor"))
        );
    }

    #[test]
    fn incompatible_object_keeps_strong_name() {
        let ontology = kitchen().unwrap();
        let matcher = StringOntologyMatcher::new(&ontology);
        let scorer = FunctionCallScorer::new(&matcher);
        let cup = parameter(1, "cup", "NN");
        let candidates = vec![FunctionParameterCandidate::matched(0.9, object(&ontology, "Cup"), cup.clone())];

        let strong = FunctionCallCandidate::new(name(&ontology, "open", 1.0, vec![cup.clone()]), candidates.clone());
        let scored = scorer.score(vec![strong]);
        assert_eq!(scored.len(), 1);
        assert!(scored[0].mapping.is_none());
        assert!(close(scored[0].score, 0.9));

        let weak = FunctionCallCandidate::new(name(&ontology, "open", 0.7, vec![cup]), candidates);
        assert!(scorer.score(vec![weak]).is_empty());
    }

    #[test]
    fn numeric_parameter_needs_a_cardinal() {
        let ontology = kitchen().unwrap();
        let matcher = StringOntologyMatcher::new(&ontology);
        let scorer = FunctionCallScorer::new(&matcher);

        let five = parameter(1, "5", "CD");
        let call = FunctionCallCandidate::new(
            name(&ontology, "wait", 1.0, vec![five.clone()]),
            vec![FunctionParameterCandidate::primitive(1.0, five)],
        );
        assert_eq!(scorer.score(vec![call])[0].mapping().len(), 1);

        let long = parameter(1, "long", "JJ");
        let call = FunctionCallCandidate::new(
            name(&ontology, "wait", 0.5, vec![long.clone()]),
            vec![FunctionParameterCandidate::primitive(1.0, long)],
        );
        assert!(scorer.score(vec![call]).is_empty());
    }

    #[test]
    fn values_and_states_check_their_type() {
        let ontology = OntologyBuilder::new()
            .method(MethodBuilder::new("paint").parameter("color", "Color"))
            .method(MethodBuilder::new("set").parameter("state", "Open"))
            .enumeration("Color", ["red"])
            .state("Open")
            .object(ObjectBuilder::new("Door"))
            .build()
            .unwrap();
        let matcher = StringOntologyMatcher::new(&ontology);
        let scorer = FunctionCallScorer::new(&matcher);
        let word = parameter(1, "red", "NN");
        let (red, _) = ontology.values().next().unwrap();
        let (open, _) = ontology.states().next().unwrap();

        let red_call = |method: &str| {
            FunctionCallCandidate::new(
                name(&ontology, method, 0.5, vec![word.clone()]),
                vec![FunctionParameterCandidate::matched(0.9, Individual::Value(red), word.clone())],
            )
        };
        assert_eq!(scorer.score(vec![red_call("paint")]).len(), 1);
        assert!(scorer.score(vec![red_call("set")]).is_empty());

        let open_call = FunctionCallCandidate::new(
            name(&ontology, "set", 0.5, vec![word.clone()]),
            vec![FunctionParameterCandidate::matched(0.9, Individual::State(open), word.clone())],
        );
        assert_eq!(scorer.score(vec![open_call]).len(), 1);
    }

    #[test]
    fn parameterless_method_named_by_parameter() {
        let ontology = kitchen().unwrap();
        let matcher = StringOntologyMatcher::new(&ontology);
        let scorer = FunctionCallScorer::new(&matcher);
        let light = parameter(2, "light", "NN");

        let named = FunctionCallCandidate::new(name(&ontology, "turnOnLight", 0.8, vec![light]), vec![]);
        let scored = scorer.score(vec![named]);
        assert!(close(scored[0].score, 0.48 + 0.4));

        let bare = FunctionCallCandidate::new(name(&ontology, "turnOnLight", 0.8, vec![]), vec![]);
        let scored = scorer.score(vec![bare]);
        assert!(close(scored[0].score, 0.48));
    }

    #[test]
    fn aliases_collapse() {
        let ontology = kitchen().unwrap();
        let matcher = StringOntologyMatcher::new(&ontology);
        let scorer = FunctionCallScorer::new(&matcher);
        let cup = parameter(1, "cup", "NN");
        let candidate = FunctionParameterCandidate::matched(0.9, object(&ontology, "Cup"), cup.clone());

        let calls = ["grasp", "take"]
            .into_iter()
            .map(|method| {
                FunctionCallCandidate::new(name(&ontology, method, 1.0, vec![cup.clone()]), vec![candidate.clone()])
            })
            .collect();
        let scored = scorer.score(calls);
        assert_eq!(scored.len(), 1);
        assert_eq!(ontology.method(scored[0].method()).name, "grasp");
    }

    #[test]
    fn deduplicate_is_idempotent() {
        let ontology = kitchen().unwrap();
        let matcher = StringOntologyMatcher::new(&ontology);
        let scorer = FunctionCallScorer::new(&matcher);
        let door = parameter(1, "door", "NN");
        let fridge = parameter(3, "fridge", "NN");
        let calls = vec![
            FunctionCallCandidate::new(
                name(&ontology, "open", 1.0, vec![door.clone(), fridge.clone()]),
                vec![
                    FunctionParameterCandidate::matched(0.9, object(&ontology, "MicrowaveDoor"), door.clone()),
                    FunctionParameterCandidate::matched(0.8, object(&ontology, "Fridge"), fridge.clone()),
                ],
            ),
            FunctionCallCandidate::new(name(&ontology, "turnOnLight", 0.6, vec![door]), vec![]),
        ];
        let once = scorer.score(calls);
        let twice = deduplicate(&ontology, once.clone());
        assert_eq!(once, twice);
    }
}
