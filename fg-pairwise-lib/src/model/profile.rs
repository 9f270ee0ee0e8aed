use derive_getters::Getters;
use itertools::Itertools;

use crate::{
    error::{Error, Result},
    model::alphabet::{amino_index, is_gap, AMINO_ACIDS, NUM_AMINO_ACIDS},
};

/// Weight of the background pseudo-count mixed into the frequencies before taking log-odds.
pub const PSEUDOCOUNT_WEIGHT: f64 = 0.1;

/// Uniform amino-acid composition.
pub const UNIFORM_BACKGROUND: [f64; NUM_AMINO_ACIDS] =
    [1.0 / NUM_AMINO_ACIDS as f64; NUM_AMINO_ACIDS];

/// A sequence profile: the per-position distribution over the amino acids in [`AMINO_ACIDS`]
/// order, summarizing a family of sequences.  Positions are 0-based.
#[derive(Clone, Debug, PartialEq, Getters)]
pub struct Profile {
    /// The master (consensus) sequence, one residue per profile column.
    master: Vec<u8>,
    frequencies: Vec<[f64; NUM_AMINO_ACIDS]>,
    background: [f64; NUM_AMINO_ACIDS],
    /// Position specific log-odds, derived from the frequencies and the background.
    pssm: Vec<[f64; NUM_AMINO_ACIDS]>,
    /// Number of distinct amino acids observed in each column.
    distinct: Vec<usize>,
}

impl Profile {
    /// Builds a profile from per-column frequencies, with a uniform background.
    pub fn new(master: &[u8], frequencies: Vec<[f64; NUM_AMINO_ACIDS]>) -> Result<Self> {
        if master.len() != frequencies.len() {
            return Err(Error::length_mismatch(
                "profile frequencies",
                master.len(),
                frequencies.len(),
            ));
        }
        if let Some((pos, _)) = frequencies
            .iter()
            .find_position(|column| column.iter().any(|f| !f.is_finite() || *f < 0.0))
        {
            return Err(Error::InvalidParameter(format!(
                "profile column {} has a negative or non-finite frequency",
                pos + 1
            )));
        }
        let distinct = frequencies
            .iter()
            .map(|column| column.iter().filter(|f| **f > 0.0).count())
            .collect_vec();
        let mut profile = Self {
            master: master.to_vec(),
            frequencies,
            background: UNIFORM_BACKGROUND,
            pssm: Vec::new(),
            distinct,
        };
        profile.update_pssm();
        Ok(profile)
    }

    /// Builds a profile from aligned sequences.  Profile columns are the columns in which the
    /// first (master) row has a residue; gaps and non-standard residues are not counted.  The
    /// background is the (Laplace smoothed) composition of all rows.
    pub fn from_alignment(rows: &[&[u8]]) -> Result<Self> {
        let master = rows
            .first()
            .ok_or_else(|| Error::InvalidParameter("cannot build a profile without rows".into()))?;
        if let Some(row) = rows.iter().find(|row| row.len() != master.len()) {
            return Err(Error::length_mismatch(
                "aligned profile row",
                master.len(),
                row.len(),
            ));
        }

        let mut composition = [1.0; NUM_AMINO_ACIDS];
        let mut frequencies = Vec::with_capacity(master.len());
        let mut master_seq = Vec::with_capacity(master.len());
        for (col, &symbol) in master.iter().enumerate() {
            for row in rows {
                if let Some(code) = amino_index(row[col]) {
                    composition[code] += 1.0;
                }
            }
            if is_gap(symbol) {
                continue;
            }
            let mut counts = [0.0; NUM_AMINO_ACIDS];
            for row in rows {
                if let Some(code) = amino_index(row[col]) {
                    counts[code] += 1.0;
                }
            }
            let total: f64 = counts.iter().sum();
            if total > 0.0 {
                counts.iter_mut().for_each(|c| *c /= total);
            }
            frequencies.push(counts);
            master_seq.push(symbol.to_ascii_uppercase());
        }

        let total: f64 = composition.iter().sum();
        composition.iter_mut().for_each(|c| *c /= total);
        Self::new(&master_seq, frequencies)?.with_background(composition)
    }

    /// Replaces the background frequencies (all must be positive) and recomputes the log-odds.
    pub fn with_background(mut self, background: [f64; NUM_AMINO_ACIDS]) -> Result<Self> {
        if background.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(Error::InvalidParameter(
                "background frequencies must be positive".into(),
            ));
        }
        self.background = background;
        self.update_pssm();
        Ok(self)
    }

    fn update_pssm(&mut self) {
        let background = self.background;
        self.pssm = self
            .frequencies
            .iter()
            .map(|column| {
                let mut log_odds = [0.0; NUM_AMINO_ACIDS];
                for (k, value) in log_odds.iter_mut().enumerate() {
                    let mixed = (column[k] + PSEUDOCOUNT_WEIGHT * background[k])
                        / (1.0 + PSEUDOCOUNT_WEIGHT);
                    *value = (mixed / background[k]).ln();
                }
                log_odds
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency of `symbol` at `pos`; zero for symbols outside [`AMINO_ACIDS`].
    pub fn get_amino_frequency(&self, symbol: u8, pos: usize) -> f64 {
        amino_index(symbol).map_or(0.0, |code| self.frequencies[pos][code])
    }

    /// Frequency of the `code`-th residue of [`AMINO_ACIDS`] at `pos`.
    #[inline(always)]
    pub fn get_amino_frequency_by_code(&self, code: usize, pos: usize) -> f64 {
        self.frequencies[pos][code]
    }

    #[inline(always)]
    pub fn log_odds(&self, code: usize, pos: usize) -> f64 {
        self.pssm[pos][code]
    }

    pub fn num_distinct(&self, pos: usize) -> usize {
        self.distinct[pos]
    }

    /// The residues of [`AMINO_ACIDS`] paired with their frequency at `pos`.
    pub fn column(&self, pos: usize) -> impl Iterator<Item = (u8, f64)> + '_ {
        AMINO_ACIDS.iter().copied().zip(self.frequencies[pos].iter().copied())
    }
}
