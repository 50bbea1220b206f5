//! Combinatorial generation of call candidates.
//!
//! Every name candidate is combined with the parameter candidate groups of
//! its instruction. Methods whose parameters are all ontology-backed get one
//! call per cartesian combination. Methods taking primitive parameters
//! (strings, numbers) cannot be matched by name, so the finder also offers
//! calls where some matched candidates are replaced by the raw extracted
//! text, plus one call that hands all extracted text to a single primitive.

use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::candidate::{FunctionCallCandidate, FunctionNameCandidate, FunctionParameterCandidate};
use crate::combinatorics::{cartesian_product, choose_slots};
use crate::instruction::Parameter;
use crate::ontology::{Ontology, is_primitive_type};

/// Score given to a matched candidate demoted to a primitive placeholder.
pub const SCORE_PRIMITIVE_PARAMS: f64 = 0.8;

/// Score given to raw extracted text when nothing matched at all.
pub const SCORE_EXTRACTED_PARAMS: f64 = 1.0;

pub struct FunctionCallFinder<'o> {
    ontology: &'o Ontology,
}

impl<'o> FunctionCallFinder<'o> {
    pub fn new(ontology: &'o Ontology) -> Self {
        FunctionCallFinder { ontology }
    }

    pub fn find(
        &self,
        names: &[FunctionNameCandidate],
        groups: &[Vec<FunctionParameterCandidate>],
    ) -> Vec<FunctionCallCandidate> {
        let groups: Vec<Vec<FunctionParameterCandidate>> = groups
            .iter()
            .filter(|group| !group.is_empty())
            .cloned()
            .collect();

        let mut calls = Vec::new();
        for name in names {
            let primitives = self
                .ontology
                .method(name.method)
                .parameters
                .iter()
                .filter(|parameter| is_primitive_type(&parameter.data_type))
                .count();
            let extracted = name.instruction.cleared_parameters();

            if primitives == 0 {
                let before = calls.len();
                calls.extend(
                    cartesian_product(&groups)
                        .map(|combination| FunctionCallCandidate::new(name.clone(), combination)),
                );
                if calls.len() == before {
                    calls.push(FunctionCallCandidate::new(name.clone(), Vec::new()));
                }
            } else if groups.is_empty() {
                let parameters = extracted
                    .iter()
                    .map(|parameter| {
                        FunctionParameterCandidate::primitive(SCORE_EXTRACTED_PARAMS, parameter.clone())
                    })
                    .collect();
                calls.push(FunctionCallCandidate::new(name.clone(), parameters));
            } else {
                calls.extend(self.placeholder_calls(name, &groups, primitives));
                calls.push(concatenated_call(name, extracted));
            }
        }

        debug!(
            names = names.len(),
            calls = calls.len(),
            "function call candidates"
        );
        calls
    }

    /// Calls where exactly `primitives` matched candidates (clamped to the
    /// number of groups) are swapped for their raw extracted parameter.
    fn placeholder_calls(
        &self,
        name: &FunctionNameCandidate,
        groups: &[Vec<FunctionParameterCandidate>],
        primitives: usize,
    ) -> Vec<FunctionCallCandidate> {
        // All candidates of a single group stem from the same extracted
        // parameter, so one placeholder call covers them.
        if let [group] = groups {
            let Some(first) = group.first() else {
                return Vec::new();
            };
            let placeholder =
                FunctionParameterCandidate::primitive(SCORE_PRIMITIVE_PARAMS, first.parameter.clone());
            return vec![FunctionCallCandidate::new(name.clone(), vec![placeholder])];
        }

        cartesian_product(groups)
            .flat_map(|combination| {
                choose_slots(combination.len(), primitives)
                    .map(|mask| {
                        combination
                            .iter()
                            .zip(mask)
                            .map(|(candidate, primitive)| {
                                if primitive {
                                    FunctionParameterCandidate::primitive(
                                        SCORE_PRIMITIVE_PARAMS,
                                        candidate.parameter.clone(),
                                    )
                                } else {
                                    candidate.clone()
                                }
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect::<Vec<_>>()
            })
            .unique_by(|parameters| {
                parameters
                    .iter()
                    .map(|candidate| (candidate.individual, candidate.parameter.positions()))
                    .collect::<Vec<_>>()
            })
            .map(|parameters| FunctionCallCandidate::new(name.clone(), parameters))
            .collect()
    }
}

/// One call taking every extracted parameter as a single primitive.
fn concatenated_call(name: &FunctionNameCandidate, extracted: &[Arc<Parameter>]) -> FunctionCallCandidate {
    let combined = Arc::new(Parameter::concatenated(extracted));
    FunctionCallCandidate::new(
        name.clone(),
        vec![FunctionParameterCandidate::primitive(SCORE_EXTRACTED_PARAMS, combined)],
    )
}
