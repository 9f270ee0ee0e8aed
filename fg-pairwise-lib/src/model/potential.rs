use derive_getters::Getters;

use crate::{
    error::{Error, Result},
    model::alphabet::NUM_AMINO_ACIDS,
};

/// A position specific threading potential: the energy-like score of placing each amino acid
/// (rows, in [`crate::model::alphabet::AMINO_ACIDS`] order) at each template position
/// (columns, 0-based).
#[derive(Clone, Debug, PartialEq, Getters)]
pub struct ThreadingPotential {
    table: Vec<Vec<f64>>,
    len: usize,
}

impl ThreadingPotential {
    pub fn new(table: Vec<Vec<f64>>) -> Result<Self> {
        if table.len() != NUM_AMINO_ACIDS {
            return Err(Error::length_mismatch(
                "threading potential residue rows",
                NUM_AMINO_ACIDS,
                table.len(),
            ));
        }
        let len = table[0].len();
        if let Some(row) = table.iter().find(|row| row.len() != len) {
            return Err(Error::length_mismatch(
                "threading potential template positions",
                len,
                row.len(),
            ));
        }
        Ok(Self { table, len })
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn get(&self, code: usize, pos: usize) -> f64 {
        self.table[code][pos]
    }
}
