//! Errors raised while building or querying an alignment problem.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The substitution matrix text or table could not be understood.
    #[error("malformed substitution matrix: {0}")]
    MalformedMatrix(String),

    /// Two inputs that must describe the same positions have different lengths.
    #[error("length mismatch for {what}: expected {expected} but found {found}")]
    LengthMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// A symbol is not part of the alphabet it is checked against.
    #[error("illegal symbol '{symbol}' at offset {offset} in {what}")]
    IllegalSymbol {
        what: String,
        symbol: char,
        offset: usize,
    },

    /// A 1-based position pair outside of `1..=len1` x `1..=len2`.
    #[error("position ({i}, {j}) is outside of (1..={len1}, 1..={len2})")]
    OutOfRange {
        i: usize,
        j: usize,
        len1: usize,
        len2: usize,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no alignment has been computed yet")]
    NotComputed,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn illegal_symbol(what: &str, symbol: u8, offset: usize) -> Self {
        Error::IllegalSymbol {
            what: what.to_string(),
            symbol: symbol as char,
            offset,
        }
    }

    pub(crate) fn length_mismatch(what: &str, expected: usize, found: usize) -> Self {
        Error::LengthMismatch {
            what: what.to_string(),
            expected,
            found,
        }
    }
}
