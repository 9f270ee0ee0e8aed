use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::alphabet::is_secondary_structure,
};

/// Supplies the affine gap scores used by the aligner.
///
/// Scores are not positive.  `pos` is a template position in `0..=len2`, the boundary between
/// template residues `pos` and `pos + 1`.
///
/// Target residues inserted at boundary `p` score `open(p)` plus `extension(p)` per residue.
/// Deleting template residues `a..=b` scores `(open(a - 1) + open(b)) / 2` plus
/// `(extension(j - 1) + extension(j)) / 2` per residue `j`, so mirroring the boundaries
/// (`p -> len2 - p`) mirrors the cost of every gap.  With constant scores both reduce to
/// `open + k * extension`.
pub trait GapFunction: fmt::Debug + Send + Sync {
    fn open(&self, pos: usize) -> f64;

    fn extension(&self, pos: usize) -> f64;

    /// Mirrors the template positions `0..=len2`, for the reversed control problem.
    fn reverse(&mut self, _len2: usize) {}

    fn box_clone(&self) -> Box<dyn GapFunction>;
}

impl Clone for Box<dyn GapFunction> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

fn check_gap_score(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value <= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} can't be positive (found {value})"
        )))
    }
}

/// Position independent affine gap scores.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineGap {
    open: f64,
    extend: f64,
}

impl AffineGap {
    pub fn new(open: f64, extend: f64) -> Result<Self> {
        check_gap_score("gap_open", open)?;
        check_gap_score("gap_extend", extend)?;
        Ok(Self { open, extend })
    }
}

impl GapFunction for AffineGap {
    fn open(&self, _pos: usize) -> f64 {
        self.open
    }

    fn extension(&self, _pos: usize) -> f64 {
        self.extend
    }

    fn box_clone(&self) -> Box<dyn GapFunction> {
        Box::new(*self)
    }
}

/// Per template position gap scores.  Positions past the end use the last entry.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionalGap {
    open: Vec<f64>,
    extend: Vec<f64>,
}

impl PositionalGap {
    pub fn new(open: Vec<f64>, extend: Vec<f64>) -> Result<Self> {
        if open.is_empty() {
            return Err(Error::InvalidParameter(
                "positional gap scores need at least one position".into(),
            ));
        }
        if open.len() != extend.len() {
            return Err(Error::length_mismatch(
                "gap extension scores",
                open.len(),
                extend.len(),
            ));
        }
        for (&o, &e) in open.iter().zip(extend.iter()) {
            check_gap_score("gap_open", o)?;
            check_gap_score("gap_extend", e)?;
        }
        Ok(Self { open, extend })
    }

    /// Gap scores for a template with the given secondary structure: gaps touching a helix or a
    /// strand are scaled by `factor` (>= 1), gaps in coil keep the base scores.
    pub fn from_secondary(sec: &[u8], open: f64, extend: f64, factor: f64) -> Result<Self> {
        if !(factor.is_finite() && factor >= 1.0) {
            return Err(Error::InvalidParameter(format!(
                "secondary-structure gap factor must be at least one (found {factor})"
            )));
        }
        if let Some(offset) = sec.iter().position(|s| !is_secondary_structure(*s)) {
            return Err(Error::illegal_symbol(
                "template secondary structure",
                sec[offset],
                offset,
            ));
        }
        let in_element = |residue: usize| {
            residue >= 1 && residue <= sec.len() && sec[residue - 1] != b'C'
        };
        let scale = (0..=sec.len())
            .map(|pos| {
                if in_element(pos) || in_element(pos + 1) {
                    factor
                } else {
                    1.0
                }
            })
            .collect::<Vec<_>>();
        Self::new(
            scale.iter().map(|s| open * s).collect(),
            scale.iter().map(|s| extend * s).collect(),
        )
    }

    #[inline(always)]
    fn clamp(&self, pos: usize) -> usize {
        pos.min(self.open.len() - 1)
    }
}

impl GapFunction for PositionalGap {
    fn open(&self, pos: usize) -> f64 {
        self.open[self.clamp(pos)]
    }

    fn extension(&self, pos: usize) -> f64 {
        self.extend[self.clamp(pos)]
    }

    fn reverse(&mut self, len2: usize) {
        for scores in [&mut self.open, &mut self.extend] {
            let last = scores[scores.len() - 1];
            scores.resize(len2 + 1, last);
            scores.reverse();
        }
    }

    fn box_clone(&self) -> Box<dyn GapFunction> {
        Box::new(self.clone())
    }
}
