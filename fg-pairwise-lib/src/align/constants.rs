use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Value to use as a 'negative infinity' score.  Unreachable cells and masked moves hold it.
pub const MIN_SCORE: f64 = f64::NEG_INFINITY;

/// Default score for opening a gap (in addition to its extension).
pub const DEFAULT_GAP_OPEN: f64 = -10.0;

/// Default score for each gapped position.
pub const DEFAULT_GAP_EXTEND: f64 = -1.0;

/// Default number of sub-optimal alignments generated for a Z-score.
pub const DEFAULT_ENSEMBLE_SIZE: usize = 50;

/// The boundary policy of the alignment.  All modes share the same affine-gap recurrence.
///
/// The default alignment mode is Global.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum AlignmentMode {
    /// Needleman-Wunsch: both sequences are consumed in full and terminal gaps are charged.
    #[default]
    Global,
    /// Both sequences are consumed in full, but leading and trailing gaps are free.  When several
    /// end cells tie, the one with the fewest terminal gaps is used.
    GlobalNoTerminalGaps,
    /// Free-shift (glocal): free overhangs on either end.  When several end cells tie, the one
    /// that ends the overlap earliest is used.
    FreeShift,
    /// Smith-Waterman: the best scoring pair of sub-sequences, scores are floored at zero.
    Local,
}

impl AlignmentMode {
    /// True if leading and trailing gaps are not charged.
    pub fn has_free_ends(self) -> bool {
        matches!(
            self,
            AlignmentMode::GlobalNoTerminalGaps | AlignmentMode::FreeShift
        )
    }

    /// True if unaligned prefixes and suffixes are reported as gapped positions.
    pub fn reports_overhangs(self) -> bool {
        !matches!(self, AlignmentMode::Local)
    }
}

impl Display for AlignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::GlobalNoTerminalGaps => write!(f, "global-no-terminal-gaps"),
            Self::FreeShift => write!(f, "free-shift"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl FromStr for AlignmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" | "nw" | "needleman-wunsch" => Ok(AlignmentMode::Global),
            "global-no-terminal-gaps" | "global_no_terminal_gaps" | "no-terminal-gaps"
            | "noterminalgaps" => Ok(AlignmentMode::GlobalNoTerminalGaps),
            "free-shift" | "free_shift" | "freeshift" | "glocal" => Ok(AlignmentMode::FreeShift),
            "local" | "sw" | "smith-waterman" => Ok(AlignmentMode::Local),
            _ => Err(anyhow!("Invalid alignment mode: {}", s)),
        }
    }
}
