/// The direction in which the template side of an alignment problem is read.
///
/// Reversing a scorer never copies its (shared) data; it only flips how 1-based template
/// positions are mapped onto the stored, forward-oriented data.  Flipping twice restores the
/// identity mapping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Orientation {
    reversed: bool,
}

impl Orientation {
    pub fn reversed() -> Self {
        Self { reversed: true }
    }

    pub fn is_reversed(self) -> bool {
        self.reversed
    }

    pub fn flip(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Maps the 1-based position `j` onto the 1-based position in forward data of length `len`.
    #[inline(always)]
    pub fn position(self, j: usize, len: usize) -> usize {
        debug_assert!(j >= 1 && j <= len);
        if self.reversed {
            len + 1 - j
        } else {
            j
        }
    }

    /// Maps the 1-based position `j` onto a 0-based offset in forward data of length `len`.
    #[inline(always)]
    pub fn offset(self, j: usize, len: usize) -> usize {
        self.position(j, len) - 1
    }
}
