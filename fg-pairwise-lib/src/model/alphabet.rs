use lazy_static::lazy_static;

pub const NUM_AMINO_ACIDS: usize = 20;

/// The residue order used whenever amino-acid classes are iterated.
pub const AMINO_ACIDS: [u8; NUM_AMINO_ACIDS] = *b"ARNDCQEGHILKMFPSTWYV";

/// Helix, strand and coil.
pub const SECONDARY_STRUCTURE: [u8; 3] = *b"HEC";

/// Secondary-structure classes combined with burial: upper case when buried, lower case when
/// exposed.
pub const MIXED_CLASSES: [u8; 6] = *b"HEChec";

pub const GAP_SYMBOLS: [u8; 2] = *b"-.";

lazy_static! {
    static ref AMINO_INDEX: [Option<usize>; 256] = {
        let mut index = [None; 256];
        for (code, &aa) in AMINO_ACIDS.iter().enumerate() {
            index[aa as usize] = Some(code);
            index[aa.to_ascii_lowercase() as usize] = Some(code);
        }
        index
    };
}

/// Returns the position of `symbol` (case-insensitive) in [`AMINO_ACIDS`].
#[inline(always)]
pub fn amino_index(symbol: u8) -> Option<usize> {
    AMINO_INDEX[symbol as usize]
}

pub fn is_secondary_structure(symbol: u8) -> bool {
    SECONDARY_STRUCTURE.contains(&symbol)
}

pub fn is_gap(symbol: u8) -> bool {
    GAP_SYMBOLS.contains(&symbol)
}

/// Combines a secondary-structure class with a burial flag into a [`MIXED_CLASSES`] symbol.
pub fn mixed_class(secondary: u8, buried: bool) -> u8 {
    if buried {
        secondary.to_ascii_uppercase()
    } else {
        secondary.to_ascii_lowercase()
    }
}
