use serde::{Deserialize, Serialize};

use super::data::AlignedPair;

// Moves into the S (best) layer
pub const TB_START: u8 = 0b00;
pub const TB_DIAG: u8 = 0b01;
pub const TB_DEL: u8 = 0b10; // consumes a template residue
pub const TB_INS: u8 = 0b11; // consumes a target residue

const S_MASK: u8 = 0b0011;
const I_EXTENDED: u8 = 0b0100;
const D_EXTENDED: u8 = 0b1000;

/// The moves of the three DP layers at one cell, packed into one byte.
///
/// Bits 0-1 hold the move into the S layer, bit 2 is set when the I layer extends a gap
/// rather than opening one, and bit 3 does the same for the D layer.
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct Cell(u8);

impl Cell {
    #[inline(always)]
    pub fn set_s(&mut self, tb: u8) {
        debug_assert!(tb <= S_MASK);
        self.0 = (self.0 & !S_MASK) | tb;
    }

    #[inline(always)]
    pub fn set_i_extended(&mut self, extended: bool) {
        self.set_flag(I_EXTENDED, extended);
    }

    #[inline(always)]
    pub fn set_d_extended(&mut self, extended: bool) {
        self.set_flag(D_EXTENDED, extended);
    }

    #[inline(always)]
    pub fn get_s(self) -> u8 {
        self.0 & S_MASK
    }

    #[inline(always)]
    pub fn is_i_extended(self) -> bool {
        self.0 & I_EXTENDED != 0
    }

    #[inline(always)]
    pub fn is_d_extended(self) -> bool {
        self.0 & D_EXTENDED != 0
    }

    fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Layer {
    S,
    I,
    D,
}

/// Internal traceback.
#[derive(Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct Traceback {
    rows: usize,
    cols: usize,
    matrix: Vec<Cell>,
}

impl Traceback {
    pub fn with_capacity(m: usize, n: usize) -> Self {
        let rows = m + 1;
        let cols = n + 1;
        Traceback { rows, cols, matrix: Vec::with_capacity(rows * cols) }
    }

    /// Resets every cell to [`TB_START`] for an `m` x `n` problem.
    pub fn init(&mut self, m: usize, n: usize) {
        self.matrix.clear();
        self.resize(m, n, Cell::default());
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, v: Cell) {
        debug_assert!(i < self.rows);
        debug_assert!(j < self.cols);
        self.matrix[i * self.cols + j] = v;
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> &Cell {
        debug_assert!(i < self.rows);
        debug_assert!(j < self.cols);
        &self.matrix[i * self.cols + j]
    }

    pub fn resize(&mut self, m: usize, n: usize, v: Cell) {
        self.rows = m + 1;
        self.cols = n + 1;
        self.matrix.resize(self.rows * self.cols, v);
    }

    /// The path ending in the S layer at `(i, j)`, in N to C order.
    ///
    /// With `overhangs` the residues before the start and after the end of the path are
    /// reported as gap columns, so every residue of both sequences appears exactly once.
    pub fn path(&self, i: usize, j: usize, overhangs: bool) -> Vec<AlignedPair> {
        let (m, n) = (self.rows - 1, self.cols - 1);
        let mut pairs: Vec<AlignedPair> = Vec::with_capacity(m + n);
        if overhangs {
            pairs.extend((i + 1..=m).rev().map(AlignedPair::insertion));
            pairs.extend((j + 1..=n).rev().map(AlignedPair::deletion));
        }

        let (mut i, mut j) = (i, j);
        let mut layer = Layer::S;
        loop {
            let cell = *self.get(i, j);
            match layer {
                Layer::S => match cell.get_s() {
                    TB_START => break,
                    TB_DIAG => {
                        pairs.push(AlignedPair::aligned(i, j));
                        i -= 1;
                        j -= 1;
                    }
                    TB_DEL => layer = Layer::D,
                    _ => layer = Layer::I,
                },
                Layer::I => {
                    pairs.push(AlignedPair::insertion(i));
                    if !cell.is_i_extended() {
                        layer = Layer::S;
                    }
                    i -= 1;
                }
                Layer::D => {
                    pairs.push(AlignedPair::deletion(j));
                    if !cell.is_d_extended() {
                        layer = Layer::S;
                    }
                    j -= 1;
                }
            }
        }

        if overhangs {
            pairs.extend((1..=j).rev().map(AlignedPair::deletion));
            pairs.extend((1..=i).rev().map(AlignedPair::insertion));
        }
        pairs.reverse();
        pairs
    }
}

#[cfg(test)]
pub mod tests {
    use rstest::rstest;

    use super::*;

    fn cell(s: u8, i_extended: bool, d_extended: bool) -> Cell {
        let mut cell = Cell::default();
        cell.set_s(s);
        cell.set_i_extended(i_extended);
        cell.set_d_extended(d_extended);
        cell
    }

    #[rstest]
    #[case(TB_START, false, false)]
    #[case(TB_DIAG, true, false)]
    #[case(TB_DEL, false, true)]
    #[case(TB_INS, true, true)]
    fn test_cell_packing(#[case] s: u8, #[case] i_extended: bool, #[case] d_extended: bool) {
        let mut packed = cell(s, i_extended, d_extended);
        assert_eq!(packed.get_s(), s);
        assert_eq!(packed.is_i_extended(), i_extended);
        assert_eq!(packed.is_d_extended(), d_extended);
        packed.set_s(TB_START);
        assert_eq!(packed.is_i_extended(), i_extended);
        assert_eq!(packed.is_d_extended(), d_extended);
    }

    #[rstest]
    fn test_path_with_gaps() {
        // target AC-D vs template ACED; the D layer at (2, 3) opened the gap
        let mut tb = Traceback::with_capacity(3, 4);
        tb.init(3, 4);
        tb.set(1, 1, cell(TB_DIAG, false, false));
        tb.set(2, 2, cell(TB_DIAG, false, false));
        tb.set(2, 3, cell(TB_DEL, false, false));
        tb.set(3, 4, cell(TB_DIAG, false, false));
        let path = tb.path(3, 4, false);
        assert_eq!(
            path,
            vec![
                AlignedPair::aligned(1, 1),
                AlignedPair::aligned(2, 2),
                AlignedPair::deletion(3),
                AlignedPair::aligned(3, 4),
            ]
        );
    }

    #[rstest]
    fn test_path_with_extended_insertion() {
        let mut tb = Traceback::with_capacity(3, 1);
        tb.init(3, 1);
        tb.set(1, 1, cell(TB_DIAG, false, false));
        tb.set(3, 1, cell(TB_INS, true, false));
        tb.set(2, 1, cell(TB_INS, false, false));
        let path = tb.path(3, 1, false);
        assert_eq!(
            path,
            vec![
                AlignedPair::aligned(1, 1),
                AlignedPair::insertion(2),
                AlignedPair::insertion(3),
            ]
        );
    }

    #[rstest]
    fn test_path_reports_overhangs() {
        // a single aligned pair (2, 2) in a 3 x 3 problem
        let mut tb = Traceback::with_capacity(3, 3);
        tb.init(3, 3);
        tb.set(2, 2, cell(TB_DIAG, false, false));
        let path = tb.path(2, 2, true);
        assert_eq!(
            path,
            vec![
                AlignedPair::insertion(1),
                AlignedPair::deletion(1),
                AlignedPair::aligned(2, 2),
                AlignedPair::deletion(3),
                AlignedPair::insertion(3),
            ]
        );
        assert_eq!(tb.path(2, 2, false), vec![AlignedPair::aligned(2, 2)]);
    }
}
