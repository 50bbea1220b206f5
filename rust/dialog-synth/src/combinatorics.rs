//! Lazy combinatorial enumeration with explicit size caps.
//!
//! Candidate expansion multiplies quickly: a call with four parameter groups
//! of five candidates each already has 625 combinations, and pairing them with
//! a method's parameters multiplies again. Everything here is an iterator, and
//! every enumeration is bounded by one of the caps below.

use itertools::{Either, Itertools};
use tracing::warn;

/// Names with more words than this are matched without permutation.
pub const MAX_PERMUTATION_WORDS: usize = 5;

/// Parameter candidates beyond this many are not paired with a method's
/// parameters.
pub const MAX_PAIRING_SLOTS: usize = 8;

/// Cartesian enumeration stops after this many combinations.
pub const MAX_COMBINATIONS: usize = 4096;

/// Every way of picking one element from each group, in group order.
///
/// No groups yield a single empty combination; an empty group yields none.
pub fn cartesian_product<T: Clone>(groups: &[Vec<T>]) -> impl Iterator<Item = Vec<T>> + '_ {
    let combinations = if groups.is_empty() {
        Either::Left(std::iter::once(Vec::new()))
    } else {
        Either::Right(
            groups
                .iter()
                .map(|group| group.iter().cloned())
                .multi_cartesian_product(),
        )
    };
    capped(combinations, MAX_COMBINATIONS, "cartesian product")
}

/// Every injective assignment of `right` indices to `left` slots, where a
/// slot may also stay unassigned when there are fewer right elements than
/// left slots.
///
/// Each yielded vector has one entry per left slot. Duplicate assignments
/// are yielded once. Left slots beyond [`MAX_PAIRING_SLOTS`] are left out.
pub fn pairings(left: usize, right: usize) -> impl Iterator<Item = Vec<Option<usize>>> {
    let left = if left > MAX_PAIRING_SLOTS {
        warn!(left, cap = MAX_PAIRING_SLOTS, "pairing slots capped");
        MAX_PAIRING_SLOTS
    } else {
        left
    };
    let padding = left.saturating_sub(right);
    let slots: Vec<Option<usize>> = (0..right)
        .map(Some)
        .chain(std::iter::repeat_n(None, padding))
        .collect();
    let assignments = slots.into_iter().permutations(left).unique();
    capped(assignments, MAX_COMBINATIONS, "pairing")
}

/// Every way of choosing `count` of `slots` positions, as selection masks.
///
/// `count` is clamped to `slots`.
pub fn choose_slots(slots: usize, count: usize) -> impl Iterator<Item = Vec<bool>> {
    let count = count.min(slots);
    (0..slots).combinations(count).map(move |chosen| {
        let mut mask = vec![false; slots];
        for slot in chosen {
            mask[slot] = true;
        }
        mask
    })
}

/// Word-order permutations of a space-separated name.
///
/// A single word, or a name longer than [`MAX_PERMUTATION_WORDS`], comes back
/// unchanged. The original order is always first.
pub fn word_permutations(name: &str) -> Vec<String> {
    let words: Vec<&str> = name.split_whitespace().collect();
    if words.len() < 2 || words.len() > MAX_PERMUTATION_WORDS {
        return vec![name.to_string()];
    }
    words
        .iter()
        .permutations(words.len())
        .map(|order| order.into_iter().join(" "))
        .unique()
        .collect()
}

fn capped<I: Iterator>(iter: I, cap: usize, what: &'static str) -> impl Iterator<Item = I::Item> {
    iter.enumerate().map_while(move |(index, item)| {
        if index < cap {
            Some(item)
        } else {
            warn!(cap, what, "enumeration capped");
            None
        }
    })
}
