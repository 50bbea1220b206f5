//! SRL role labels and teaching-part labels.
//!
//! Role labels follow PropBank: "V" marks the predicate of a frame,
//! "AM-MOD" a modal adjunct, "A0".."A5" and the other "AM-*" labels the
//! arguments. Only the first two carry meaning for chunking; every other
//! role simply names a parameter group.

use std::fmt;
use std::str::FromStr;

use crate::error::SynthError;

/// The predicate role.
pub const VERB: &str = "V";

/// The modal adjunct role ("can", "should", ...).
pub const MODAL: &str = "AM-MOD";

/// Whether an incoming edge with `role` excludes its target from parameters.
pub fn is_structural(role: &str) -> bool {
    role == VERB || role == MODAL
}

/// The per-token classification of a teaching sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// Part of the declaration of a new method ("to make coffee ...").
    Declaration,
    /// Part of the method body.
    Description,
    /// Anything else.
    Else,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Declaration, Label::Description, Label::Else];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Declaration => "DECL",
            Label::Description => "DESC",
            Label::Else => "ELSE",
        }
    }

    /// Parse a classifier label, reporting the token it came from on failure.
    pub fn parse(position: usize, label: &str) -> Result<Self, SynthError> {
        label.parse().map_err(|_| SynthError::InvalidLabel {
            position,
            label: label.to_string(),
        })
    }
}

impl FromStr for Label {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DECL" => Ok(Label::Declaration),
            "DESC" => Ok(Label::Description),
            "ELSE" => Ok(Label::Else),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
