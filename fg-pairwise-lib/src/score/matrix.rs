use std::io::{BufRead, Write};

use itertools::Itertools;
use lazy_static::lazy_static;

use crate::{
    error::{Error, Result},
    model::alphabet::{AMINO_ACIDS, NUM_AMINO_ACIDS},
};

/// Symbols of the built-in BLOSUM62 matrix.
pub const BLOSUM62_ALPHABET: &[u8] = b"ARNDCQEGHILKMFPSTWYVBZX*";

const NOT_IN_ALPHABET: u8 = u8::MAX;

lazy_static! {
    static ref BLOSUM62: SubstitutionMatrix = {
        let scores = BLOSUM62_ALPHABET
            .iter()
            .cartesian_product(BLOSUM62_ALPHABET.iter())
            .map(|(&a, &b)| f64::from(bio::scores::blosum62(a, b)))
            .collect_vec();
        SubstitutionMatrix::build(BLOSUM62_ALPHABET, scores)
    };

    static ref DEFAULT_SECONDARY: SubstitutionMatrix = {
        #[rustfmt::skip]
        let scores = vec![
        //   H     E     C
            1.0, -1.0, -0.5, // H
           -1.0,  1.0, -0.5, // E
           -0.5, -0.5,  0.5, // C
        ];
        SubstitutionMatrix::build(b"HEC", scores)
    };

    static ref DEFAULT_MIXED: SubstitutionMatrix = {
        let alphabet = b"HEChec";
        let scores = alphabet
            .iter()
            .cartesian_product(alphabet.iter())
            .map(|(&a, &b)| {
                let secondary =
                    DEFAULT_SECONDARY.score(a.to_ascii_uppercase(), b.to_ascii_uppercase());
                let burial = if a.is_ascii_uppercase() == b.is_ascii_uppercase() {
                    0.5
                } else {
                    -0.5
                };
                secondary + burial
            })
            .collect_vec();
        SubstitutionMatrix::build(alphabet, scores)
    };
}

/// A square table of similarity scores indexed by pairs of symbols of an ordered alphabet.
///
/// Immutable once built.  The text format (see [`SubstitutionMatrix::read`]) is the alphabet
/// on the first line followed by the `alphabet.len()²` scores, whitespace separated, in
/// row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct SubstitutionMatrix {
    alphabet: Vec<u8>,
    lookup: [u8; 256],
    scores: Vec<f64>,
}

impl SubstitutionMatrix {
    /// Validated constructor.
    pub fn new(alphabet: &[u8], scores: Vec<f64>) -> Result<Self> {
        if alphabet.is_empty() {
            return Err(Error::MalformedMatrix("the alphabet is empty".into()));
        }
        if alphabet.len() >= NOT_IN_ALPHABET as usize {
            return Err(Error::MalformedMatrix(format!(
                "the alphabet has {} symbols, at most {} are supported",
                alphabet.len(),
                NOT_IN_ALPHABET - 1
            )));
        }
        if let Some(symbol) = alphabet.iter().find(|s| s.is_ascii_whitespace()) {
            return Err(Error::MalformedMatrix(format!(
                "whitespace symbol {symbol:?} in the alphabet"
            )));
        }
        if let Some(symbol) = alphabet.iter().duplicates().next() {
            return Err(Error::MalformedMatrix(format!(
                "duplicate symbol '{}' in the alphabet",
                *symbol as char
            )));
        }
        let expected = alphabet.len() * alphabet.len();
        if scores.len() != expected {
            return Err(Error::MalformedMatrix(format!(
                "expected {expected} scores for an alphabet of {} symbols, found {}",
                alphabet.len(),
                scores.len()
            )));
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(Error::MalformedMatrix("scores must be finite".into()));
        }
        Ok(Self::build(alphabet, scores))
    }

    fn build(alphabet: &[u8], scores: Vec<f64>) -> Self {
        let mut lookup = [NOT_IN_ALPHABET; 256];
        for (index, &symbol) in alphabet.iter().enumerate() {
            lookup[symbol as usize] = index as u8;
        }
        Self {
            alphabet: alphabet.to_vec(),
            lookup,
            scores,
        }
    }

    /// A matrix scoring `match_score` on the diagonal and `mismatch_score` everywhere else.
    pub fn from_match_mismatch(
        alphabet: &[u8],
        match_score: f64,
        mismatch_score: f64,
    ) -> Result<Self> {
        let n = alphabet.len();
        let scores = (0..n)
            .cartesian_product(0..n)
            .map(|(a, b)| if a == b { match_score } else { mismatch_score })
            .collect_vec();
        Self::new(alphabet, scores)
    }

    /// The BLOSUM62 protein matrix over [`BLOSUM62_ALPHABET`].
    pub fn blosum62() -> Self {
        BLOSUM62.clone()
    }

    /// A matrix over the `HEC` secondary-structure classes.
    pub fn default_secondary() -> Self {
        DEFAULT_SECONDARY.clone()
    }

    /// A matrix over the `HEChec` classes (secondary structure combined with burial).
    pub fn default_mixed() -> Self {
        DEFAULT_MIXED.clone()
    }

    /// The ordered alphabet.
    pub fn residues(&self) -> &[u8] {
        &self.alphabet
    }

    /// The number of symbols in the alphabet.
    pub fn size(&self) -> usize {
        self.alphabet.len()
    }

    pub fn index_of(&self, symbol: u8) -> Option<usize> {
        match self.lookup[symbol as usize] {
            NOT_IN_ALPHABET => None,
            index => Some(index as usize),
        }
    }

    pub fn contains(&self, symbol: u8) -> bool {
        self.lookup[symbol as usize] != NOT_IN_ALPHABET
    }

    /// The score of `a` versus `b`.  Both symbols must be in the alphabet.
    #[inline(always)]
    pub fn score(&self, a: u8, b: u8) -> f64 {
        let i = self.lookup[a as usize] as usize;
        let j = self.lookup[b as usize] as usize;
        debug_assert!(i < self.alphabet.len() && j < self.alphabet.len());
        self.scores[i * self.alphabet.len() + j]
    }

    /// The score of `a` versus `b`, or `None` if either is not in the alphabet.
    pub fn try_score(&self, a: u8, b: u8) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Some(self.scores[i * self.alphabet.len() + j])
    }

    #[inline(always)]
    pub fn score_by_index(&self, i: usize, j: usize) -> f64 {
        self.scores[i * self.alphabet.len() + j]
    }

    /// The alphabet index of each residue of [`AMINO_ACIDS`], in that order.
    pub fn amino_acid_indices(&self) -> Result<[usize; NUM_AMINO_ACIDS]> {
        let mut indices = [0; NUM_AMINO_ACIDS];
        for (index, &aa) in indices.iter_mut().zip(AMINO_ACIDS.iter()) {
            *index = self.index_of(aa).ok_or_else(|| {
                Error::MalformedMatrix(format!("amino acid '{}' is missing", aa as char))
            })?;
        }
        Ok(indices)
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.alphabet.len();
        (0..n)
            .cartesian_product(0..n)
            .all(|(i, j)| self.score_by_index(i, j) == self.score_by_index(j, i))
    }

    /// Reads a matrix: the alphabet on the first non-empty line, then the scores.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let alphabet = loop {
            match lines.next() {
                None => return Err(Error::MalformedMatrix("missing alphabet line".into())),
                Some(line) => {
                    let line = line?;
                    let line = line.trim();
                    if !line.is_empty() {
                        break line.as_bytes().to_vec();
                    }
                }
            }
        };
        let mut scores = Vec::with_capacity(alphabet.len() * alphabet.len());
        for line in lines {
            let line = line?;
            for token in line.split_whitespace() {
                let score = token.parse::<f64>().map_err(|_| {
                    Error::MalformedMatrix(format!("could not parse score '{token}'"))
                })?;
                scores.push(score);
            }
        }
        Self::new(&alphabet, scores)
    }

    /// Writes the matrix in the format understood by [`SubstitutionMatrix::read`].
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.alphabet)?;
        writeln!(writer)?;
        for row in self.scores.chunks(self.alphabet.len()) {
            writeln!(writer, "{}", row.iter().join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    pub const PROTEIN: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";

    /// +5 on a match, -1 on a mismatch over the twenty amino acids.
    pub fn five_minus_one() -> SubstitutionMatrix {
        SubstitutionMatrix::from_match_mismatch(PROTEIN, 5.0, -1.0).unwrap()
    }

    fn round_trip(matrix: &SubstitutionMatrix) -> SubstitutionMatrix {
        let mut bytes = Vec::new();
        matrix.write(&mut bytes).unwrap();
        SubstitutionMatrix::read(Cursor::new(bytes)).unwrap()
    }

    #[rstest]
    #[case(SubstitutionMatrix::blosum62())]
    #[case(SubstitutionMatrix::default_secondary())]
    #[case(SubstitutionMatrix::default_mixed())]
    #[case(SubstitutionMatrix::new(b"AB", vec![0.1, -1.0 / 3.0, 1e-9, 12_345.678_9]).unwrap())]
    fn test_write_then_read_is_identity(#[case] matrix: SubstitutionMatrix) {
        let copy = round_trip(&matrix);
        assert_eq!(copy.residues(), matrix.residues());
        assert_eq!(copy, matrix);
    }

    #[rstest]
    fn test_read() {
        let text = "\nABC\n1 2 3\n4 5 6\n7 8\n9\n";
        let matrix = SubstitutionMatrix::read(Cursor::new(text)).unwrap();
        assert_eq!(matrix.residues(), b"ABC");
        assert_eq!(matrix.size(), 3);
        assert_eq!(matrix.score(b'A', b'C'), 3.0);
        assert_eq!(matrix.score(b'C', b'A'), 7.0);
        assert_eq!(matrix.score(b'C', b'C'), 9.0);
        assert!(!matrix.is_symmetric());
    }

    #[rstest]
    #[case("")]
    #[case("AB\n1 2 3\n")]
    #[case("AB\n1 2 3 4 5\n")]
    #[case("AB\n1 2 x 4\n")]
    #[case("AA\n1 2 3 4\n")]
    #[case("AB\n1 2 inf 4\n")]
    fn test_read_malformed(#[case] text: &str) {
        let result = SubstitutionMatrix::read(Cursor::new(text));
        assert!(matches!(result, Err(Error::MalformedMatrix(_))), "{text:?}");
    }

    #[rstest]
    fn test_blosum62() {
        let matrix = SubstitutionMatrix::blosum62();
        assert_eq!(matrix.size(), 24);
        assert_eq!(matrix.score(b'A', b'A'), 4.0);
        assert_eq!(matrix.score(b'W', b'W'), 11.0);
        assert_eq!(matrix.score(b'A', b'R'), -1.0);
        assert!(matrix.is_symmetric());
    }

    #[rstest]
    fn test_lookups() {
        let matrix = five_minus_one();
        assert_eq!(matrix.score(b'A', b'A'), 5.0);
        assert_eq!(matrix.score(b'A', b'C'), -1.0);
        assert_eq!(matrix.try_score(b'A', b'B'), None);
        assert_eq!(matrix.try_score(b'Y', b'Y'), Some(5.0));
        assert_eq!(matrix.index_of(b'C'), Some(1));
        assert!(matrix.contains(b'W'));
        assert!(!matrix.contains(b'w'));
    }

    #[rstest]
    fn test_default_mixed_prefers_same_burial() {
        let matrix = SubstitutionMatrix::default_mixed();
        assert!(matrix.score(b'H', b'H') > matrix.score(b'H', b'h'));
        assert!(matrix.score(b'e', b'e') > matrix.score(b'e', b'H'));
        assert!(matrix.is_symmetric());
    }

    #[rstest]
    fn test_amino_acid_indices() {
        let indices = SubstitutionMatrix::blosum62().amino_acid_indices().unwrap();
        assert_eq!(indices, std::array::from_fn(|k| k));
        let indices = five_minus_one().amino_acid_indices().unwrap();
        assert_eq!(indices[0], 0); // A
        assert_eq!(indices[1], 14); // R
        assert!(SubstitutionMatrix::default_secondary().amino_acid_indices().is_err());
    }
}
