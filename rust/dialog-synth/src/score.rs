//! Scoring formulas for call candidates.
//!
//! A call's score mixes how well the method name matched with how well its
//! parameters are covered:
//!
//! ```text
//! extracted_weight = max(0, (extracted - needed) / extracted)
//! penalty          = 0.3 * extracted_weight
//! weighted_params  = param_score * (mapped / needed) - penalty
//! bonus            = 1.5 if name_score > 0.9 else 1
//! score            = 0.6 * bonus * name_score + 0.4 * weighted_params
//! ```
//!
//! Extracting more parameters than the method takes is penalised, so a
//! one-parameter method does not win an instruction that clearly names three
//! things. A method without parameters is scored on its name alone.

use crate::candidate::FunctionCallCandidate;

pub const NAME_WEIGHT: f64 = 0.6;
pub const PARAMETER_WEIGHT: f64 = 0.4;
pub const EXTRACTED_PENALTY: f64 = 0.3;
pub const PERFECT_NAME_BONUS: f64 = 1.5;

/// Name scores above this earn [`PERFECT_NAME_BONUS`].
pub const PERFECT_NAME: f64 = 0.9;

/// Parameter coverage weighted by how many of the needed parameters were
/// mapped, minus the penalty for surplus extracted parameters.
pub fn weighted_parameter_score(
    parameter_score: f64,
    extracted: usize,
    mapped: usize,
    needed: usize,
) -> f64 {
    if needed == 0 {
        return 0.0;
    }
    let extracted_weight = if extracted == 0 {
        0.0
    } else {
        ((extracted as f64 - needed as f64) / extracted as f64).max(0.0)
    };
    let mapped_weight = mapped as f64 / needed as f64;
    parameter_score * mapped_weight - EXTRACTED_PENALTY * extracted_weight
}

/// The combined score of a call.
pub fn call_score(
    name_score: f64,
    parameter_score: f64,
    extracted: usize,
    mapped: usize,
    needed: usize,
) -> f64 {
    let bonus = if name_score > PERFECT_NAME {
        PERFECT_NAME_BONUS
    } else {
        1.0
    };
    let name_part = NAME_WEIGHT * bonus * name_score;
    if needed == 0 {
        return name_part;
    }
    name_part
        + PARAMETER_WEIGHT * weighted_parameter_score(parameter_score, extracted, mapped, needed)
}

/// The `n` best calls, best first. Equal scores keep their input order.
pub fn top_n(mut calls: Vec<FunctionCallCandidate>, n: usize) -> Vec<FunctionCallCandidate> {
    calls.sort_by(|a, b| b.score.total_cmp(&a.score));
    calls.truncate(n);
    calls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parameterless_method_scores_name_only() {
        assert!(close(call_score(0.8, 5.0, 3, 3, 0), 0.48));
        assert!(close(call_score(1.0, 0.0, 0, 0, 0), 0.9));
    }

    #[test]
    fn full_coverage_without_surplus() {
        assert!(close(weighted_parameter_score(0.9, 1, 1, 1), 0.9));
        assert!(close(call_score(0.8, 0.9, 1, 1, 1), 0.48 + 0.36));
    }

    #[test]
    fn surplus_parameters_are_penalised() {
        // two extracted, one needed: half of the extraction is surplus
        assert!(close(weighted_parameter_score(1.0, 2, 1, 1), 1.0 - 0.15));
    }

    #[test]
    fn nothing_extracted_has_no_penalty() {
        assert!(close(weighted_parameter_score(0.0, 0, 0, 2), 0.0));
    }

    #[test]
    fn perfect_name_bonus() {
        assert!(call_score(0.91, 0.0, 1, 0, 1) > call_score(0.9, 0.0, 1, 0, 1) * 1.4);
    }
}
