//! Scoring schemes: the per-cell score of the aligner.
//!
//! Every scheme computes `coefficient * term(i, j)`, where the term compares two sequences, a
//! profile and a sequence, or two profiles, and adds the optional secondary-structure and
//! structural terms.  Positions are 1-based.
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::{Error, Result},
    model::{
        alphabet::{is_secondary_structure, NUM_AMINO_ACIDS},
        Profile,
    },
    score::{
        matrix::SubstitutionMatrix,
        profile::ProfileScoring,
        structural::{check_coefficient, SecondaryStructureScorer, StructuralScorer},
    },
    util::orientation::Orientation,
};

/// Default weight of the sequence or profile term.
pub const DEFAULT_COEFFICIENT: f64 = 1.0;

pub trait ScoringScheme: Debug + Send + Sync {
    fn len1(&self) -> usize;

    fn len2(&self) -> usize;

    /// The residue matrix sequences are checked against.
    fn matrix(&self) -> &SubstitutionMatrix;

    /// The score of target position `i` versus template position `j`, without a range check.
    fn score_at(&self, i: usize, j: usize) -> f64;

    /// Reverses the template side in place, including any attached scorer.  Reversing twice
    /// restores the original.
    fn reverse(&mut self);

    fn box_clone(&self) -> Box<dyn ScoringScheme>;

    /// The score of target position `i` versus template position `j`.
    fn scoring(&self, i: usize, j: usize) -> Result<f64> {
        let (len1, len2) = (self.len1(), self.len2());
        if i == 0 || j == 0 || i > len1 || j > len2 {
            Err(Error::OutOfRange { i, j, len1, len2 })
        } else {
            Ok(self.score_at(i, j))
        }
    }

    /// True if `seq` is not empty and made only of symbols of the residue matrix.
    fn check_sequence(&self, seq: &[u8]) -> bool {
        !seq.is_empty() && seq.iter().all(|s| self.matrix().contains(*s))
    }

    /// Like [`ScoringScheme::check_sequence`], reporting the first offending symbol.
    fn validate_sequence(&self, what: &str, seq: &[u8]) -> Result<()> {
        if seq.is_empty() {
            return Err(Error::InvalidParameter(format!("{what} is empty")));
        }
        validate_symbols(what, seq, self.matrix())
    }

    /// A reversed copy, leaving this scheme untouched.
    fn reversed(&self) -> Box<dyn ScoringScheme> {
        let mut scheme = self.box_clone();
        scheme.reverse();
        scheme
    }
}

impl Clone for Box<dyn ScoringScheme> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

fn validate_symbols(what: &str, seq: &[u8], matrix: &SubstitutionMatrix) -> Result<()> {
    match seq.iter().position(|s| !matrix.contains(*s)) {
        Some(offset) => Err(Error::illegal_symbol(what, seq[offset], offset)),
        None => Ok(()),
    }
}

fn validate_non_empty(what: &str, seq: &[u8], matrix: &SubstitutionMatrix) -> Result<()> {
    if seq.is_empty() {
        Ok(())
    } else {
        validate_symbols(what, seq, matrix)
    }
}

/// The optional terms every scheme may carry on top of its sequence or profile term.
#[derive(Clone, Debug, Default)]
struct StructureTerms {
    secondary: Option<SecondaryStructureScorer>,
    structural: Option<Box<dyn StructuralScorer>>,
}

impl StructureTerms {
    #[inline(always)]
    fn score(&self, i: usize, j: usize) -> f64 {
        let mut score = 0.0;
        if let Some(secondary) = &self.secondary {
            score += secondary.scoring_str(i, j);
        }
        if let Some(structural) = &self.structural {
            score += structural.scoring_str(i, j);
        }
        score
    }

    fn reverse(&mut self) {
        if let Some(secondary) = &mut self.secondary {
            secondary.reverse();
        }
        if let Some(structural) = &mut self.structural {
            structural.reverse();
        }
    }

    fn set_structural(
        &mut self,
        scorer: Box<dyn StructuralScorer>,
        target: &[u8],
        len2: usize,
    ) -> Result<()> {
        if scorer.len1() != target.len() {
            return Err(Error::length_mismatch("structural target", target.len(), scorer.len1()));
        }
        if scorer.len2() != len2 {
            return Err(Error::length_mismatch("structural template", len2, scorer.len2()));
        }
        if let Some(offset) = scorer.target().and_then(|residues| {
            residues.iter().zip(target).position(|(a, b)| !a.eq_ignore_ascii_case(b))
        }) {
            return Err(Error::InvalidParameter(format!(
                "structural target differs from the aligned target at offset {offset}"
            )));
        }
        self.structural = Some(scorer);
        Ok(())
    }

    fn set_secondary(
        &mut self,
        (sec1, sec2): (&[u8], &[u8]),
        matrix: Arc<SubstitutionMatrix>,
        coefficient: f64,
        (len1, len2): (usize, usize),
    ) -> Result<()> {
        for (what, sec, len) in [
            ("target secondary structure", sec1, len1),
            ("template secondary structure", sec2, len2),
        ] {
            if sec.len() != len {
                return Err(Error::length_mismatch(what, len, sec.len()));
            }
            if let Some(offset) = sec.iter().position(|s| !is_secondary_structure(*s)) {
                return Err(Error::illegal_symbol(what, sec[offset], offset));
            }
        }
        self.secondary = Some(SecondaryStructureScorer::new(sec1, sec2, matrix, coefficient)?);
        Ok(())
    }
}

/// Sequence versus sequence: a substitution matrix lookup.
#[derive(Clone, Debug)]
pub struct SequenceScoring {
    matrix: Arc<SubstitutionMatrix>,
    seq1: Arc<Vec<u8>>,
    seq2: Arc<Vec<u8>>,
    coefficient: f64,
    orientation: Orientation,
    terms: StructureTerms,
}

impl SequenceScoring {
    pub fn new(matrix: Arc<SubstitutionMatrix>, seq1: &[u8], seq2: &[u8]) -> Result<Self> {
        validate_non_empty("target", seq1, &matrix)?;
        validate_non_empty("template", seq2, &matrix)?;
        Ok(Self {
            matrix,
            seq1: Arc::new(seq1.to_vec()),
            seq2: Arc::new(seq2.to_vec()),
            coefficient: DEFAULT_COEFFICIENT,
            orientation: Orientation::default(),
            terms: StructureTerms::default(),
        })
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Result<Self> {
        check_coefficient(coefficient)?;
        self.coefficient = coefficient;
        Ok(self)
    }

    pub fn with_structural(mut self, scorer: Box<dyn StructuralScorer>) -> Result<Self> {
        self.terms.set_structural(scorer, &self.seq1, self.seq2.len())?;
        Ok(self)
    }

    /// Adds a secondary-structure term; `sec1` and `sec2` must match the sequence lengths.
    pub fn with_secondary_structure(
        mut self,
        sec1: &[u8],
        sec2: &[u8],
        matrix: Arc<SubstitutionMatrix>,
        coefficient: f64,
    ) -> Result<Self> {
        let lens = (self.seq1.len(), self.seq2.len());
        self.terms.set_secondary((sec1, sec2), matrix, coefficient, lens)?;
        Ok(self)
    }
}

impl ScoringScheme for SequenceScoring {
    fn len1(&self) -> usize {
        self.seq1.len()
    }

    fn len2(&self) -> usize {
        self.seq2.len()
    }

    fn matrix(&self) -> &SubstitutionMatrix {
        &self.matrix
    }

    #[inline(always)]
    fn score_at(&self, i: usize, j: usize) -> f64 {
        let b = self.seq2[self.orientation.offset(j, self.seq2.len())];
        self.coefficient * self.matrix.score(self.seq1[i - 1], b) + self.terms.score(i, j)
    }

    fn reverse(&mut self) {
        self.orientation.flip();
        self.terms.reverse();
    }

    fn box_clone(&self) -> Box<dyn ScoringScheme> {
        Box::new(self.clone())
    }
}

/// Profile (target) versus sequence (template): the matrix scores of the template residue
/// against every amino acid, weighted by the profile frequencies.
#[derive(Clone, Debug)]
pub struct ProfileSequenceScoring {
    matrix: Arc<SubstitutionMatrix>,
    profile: Arc<Profile>,
    seq2: Arc<Vec<u8>>,
    /// Matrix index of each amino acid, in profile order.
    indices: [usize; NUM_AMINO_ACIDS],
    coefficient: f64,
    orientation: Orientation,
    terms: StructureTerms,
}

impl ProfileSequenceScoring {
    pub fn new(
        matrix: Arc<SubstitutionMatrix>,
        profile: Arc<Profile>,
        seq2: &[u8],
    ) -> Result<Self> {
        let indices = matrix.amino_acid_indices()?;
        validate_non_empty("target profile", profile.master(), &matrix)?;
        validate_non_empty("template", seq2, &matrix)?;
        Ok(Self {
            matrix,
            profile,
            seq2: Arc::new(seq2.to_vec()),
            indices,
            coefficient: DEFAULT_COEFFICIENT,
            orientation: Orientation::default(),
            terms: StructureTerms::default(),
        })
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Result<Self> {
        check_coefficient(coefficient)?;
        self.coefficient = coefficient;
        Ok(self)
    }

    pub fn with_structural(mut self, scorer: Box<dyn StructuralScorer>) -> Result<Self> {
        self.terms.set_structural(scorer, self.profile.master(), self.seq2.len())?;
        Ok(self)
    }

    pub fn with_secondary_structure(
        mut self,
        sec1: &[u8],
        sec2: &[u8],
        matrix: Arc<SubstitutionMatrix>,
        coefficient: f64,
    ) -> Result<Self> {
        let lens = (self.profile.len(), self.seq2.len());
        self.terms.set_secondary((sec1, sec2), matrix, coefficient, lens)?;
        Ok(self)
    }
}

impl ScoringScheme for ProfileSequenceScoring {
    fn len1(&self) -> usize {
        self.profile.len()
    }

    fn len2(&self) -> usize {
        self.seq2.len()
    }

    fn matrix(&self) -> &SubstitutionMatrix {
        &self.matrix
    }

    fn score_at(&self, i: usize, j: usize) -> f64 {
        let b = self.seq2[self.orientation.offset(j, self.seq2.len())];
        let column = self.matrix.index_of(b).unwrap_or_default();
        let term = self
            .indices
            .iter()
            .enumerate()
            .map(|(code, row)| {
                self.profile.get_amino_frequency_by_code(code, i - 1)
                    * self.matrix.score_by_index(*row, column)
            })
            .sum::<f64>();
        self.coefficient * term + self.terms.score(i, j)
    }

    fn reverse(&mut self) {
        self.orientation.flip();
        self.terms.reverse();
    }

    fn box_clone(&self) -> Box<dyn ScoringScheme> {
        Box::new(self.clone())
    }
}

/// Profile versus profile, delegating the column comparison to a [`ProfileScoring`].
#[derive(Clone, Debug)]
pub struct ProfileProfileScoring {
    matrix: Arc<SubstitutionMatrix>,
    function: Box<dyn ProfileScoring>,
    coefficient: f64,
    terms: StructureTerms,
}

impl ProfileProfileScoring {
    /// `matrix` is the residue alphabet the profile master sequences are checked against.
    pub fn new(matrix: Arc<SubstitutionMatrix>, function: Box<dyn ProfileScoring>) -> Result<Self> {
        validate_non_empty("target profile", function.pair().target().master(), &matrix)?;
        validate_non_empty("template profile", function.pair().template().master(), &matrix)?;
        Ok(Self {
            matrix,
            function,
            coefficient: DEFAULT_COEFFICIENT,
            terms: StructureTerms::default(),
        })
    }

    pub fn with_coefficient(mut self, coefficient: f64) -> Result<Self> {
        check_coefficient(coefficient)?;
        self.coefficient = coefficient;
        Ok(self)
    }

    pub fn with_structural(mut self, scorer: Box<dyn StructuralScorer>) -> Result<Self> {
        let len2 = self.function.len2();
        self.terms.set_structural(scorer, self.function.pair().target().master(), len2)?;
        Ok(self)
    }

    pub fn with_secondary_structure(
        mut self,
        sec1: &[u8],
        sec2: &[u8],
        matrix: Arc<SubstitutionMatrix>,
        coefficient: f64,
    ) -> Result<Self> {
        let lens = (self.function.len1(), self.function.len2());
        self.terms.set_secondary((sec1, sec2), matrix, coefficient, lens)?;
        Ok(self)
    }
}

impl ScoringScheme for ProfileProfileScoring {
    fn len1(&self) -> usize {
        self.function.len1()
    }

    fn len2(&self) -> usize {
        self.function.len2()
    }

    fn matrix(&self) -> &SubstitutionMatrix {
        &self.matrix
    }

    fn score_at(&self, i: usize, j: usize) -> f64 {
        self.coefficient * self.function.scoring_seq(i, j) + self.terms.score(i, j)
    }

    fn reverse(&mut self) {
        self.function.reverse();
        self.terms.reverse();
    }

    fn box_clone(&self) -> Box<dyn ScoringScheme> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
pub mod tests {
    use itertools::Itertools;
    use rstest::rstest;

    use super::*;
    use crate::{
        model::profile::tests::one_hot_profile,
        score::{
            matrix::tests::five_minus_one,
            profile::{tests::one_hot_pair, DotProductScore, SumOfPairsScore},
            structural::{tests::ramp_potential, ThreadingScorer},
        },
    };

    fn matrix() -> Arc<SubstitutionMatrix> {
        Arc::new(five_minus_one())
    }

    fn secondary() -> Arc<SubstitutionMatrix> {
        Arc::new(SubstitutionMatrix::default_secondary())
    }

    fn all_scores(scheme: &dyn ScoringScheme) -> Vec<f64> {
        (1..=scheme.len1())
            .cartesian_product(1..=scheme.len2())
            .map(|(i, j)| scheme.score_at(i, j))
            .collect()
    }

    #[rstest]
    fn test_sequence_scoring() {
        let scheme = SequenceScoring::new(matrix(), b"ACD", b"AWD").unwrap();
        assert_eq!(scheme.scoring(1, 1).unwrap(), 5.0);
        assert_eq!(scheme.scoring(2, 2).unwrap(), -1.0);
        let scheme = scheme.with_coefficient(2.0).unwrap();
        assert_eq!(scheme.scoring(3, 3).unwrap(), 10.0);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 0)]
    #[case(4, 1)]
    #[case(1, 4)]
    fn test_scoring_out_of_range(#[case] i: usize, #[case] j: usize) {
        let scheme = SequenceScoring::new(matrix(), b"ACD", b"AWD").unwrap();
        assert!(matches!(scheme.scoring(i, j), Err(Error::OutOfRange { .. })));
    }

    #[rstest]
    #[case(b"ACDW".as_slice(), true)]
    #[case(b"".as_slice(), false)]
    #[case(b"ACXD".as_slice(), false)]
    #[case(b"acd".as_slice(), false)]
    fn test_check_sequence(#[case] seq: &[u8], #[case] expected: bool) {
        let scheme = SequenceScoring::new(matrix(), b"A", b"A").unwrap();
        assert_eq!(scheme.check_sequence(seq), expected);
        assert_eq!(scheme.validate_sequence("seq", seq).is_ok(), expected);
    }

    #[rstest]
    fn test_illegal_symbols_fail_construction() {
        let result = SequenceScoring::new(matrix(), b"ACD", b"AZD");
        assert!(matches!(result, Err(Error::IllegalSymbol { symbol: 'Z', offset: 1, .. })));
        assert!(SequenceScoring::new(matrix(), b"", b"").is_ok());
    }

    #[rstest]
    fn test_secondary_structure_term() {
        let scheme = SequenceScoring::new(matrix(), b"ACD", b"AWD")
            .unwrap()
            .with_secondary_structure(b"HHC", b"HEC", secondary(), 2.0)
            .unwrap();
        assert_eq!(scheme.scoring(1, 1).unwrap(), 5.0 + 2.0);
        assert_eq!(scheme.scoring(2, 2).unwrap(), -1.0 - 2.0);

        let base = SequenceScoring::new(matrix(), b"ACD", b"AWD").unwrap();
        let short = base.clone().with_secondary_structure(b"HH", b"HEC", secondary(), 1.0);
        assert!(matches!(short, Err(Error::LengthMismatch { .. })));
        let illegal = base.with_secondary_structure(b"HHC", b"HXC", secondary(), 1.0);
        assert!(matches!(illegal, Err(Error::IllegalSymbol { symbol: 'X', .. })));
    }

    #[rstest]
    fn test_structural_term() {
        let threading = ThreadingScorer::new(b"ARD", ramp_potential(3), 1.0).unwrap();
        let scheme = SequenceScoring::new(matrix(), b"ARD", b"ARD")
            .unwrap()
            .with_structural(Box::new(threading.clone()))
            .unwrap();
        assert_eq!(scheme.scoring(2, 2).unwrap(), 5.0 + threading.scoring_str(2, 2));

        let wrong = ThreadingScorer::new(b"ARD", ramp_potential(4), 1.0).unwrap();
        let result = SequenceScoring::new(matrix(), b"ARD", b"ARD")
            .unwrap()
            .with_structural(Box::new(wrong));
        assert!(matches!(result, Err(Error::LengthMismatch { .. })));
    }

    #[rstest]
    fn test_structural_term_must_thread_the_aligned_target() {
        let other = ThreadingScorer::new(b"AKD", ramp_potential(3), 1.0).unwrap();
        let result = SequenceScoring::new(matrix(), b"ARD", b"ARD")
            .unwrap()
            .with_structural(Box::new(other.clone()));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let profile = Arc::new(one_hot_profile(b"ARD"));
        let result = ProfileSequenceScoring::new(matrix(), profile, b"ARD")
            .unwrap()
            .with_structural(Box::new(other));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let lower = ThreadingScorer::new(b"ard", ramp_potential(3), 1.0).unwrap();
        let scheme = SequenceScoring::new(matrix(), b"ARD", b"ARD")
            .unwrap()
            .with_structural(Box::new(lower));
        assert!(scheme.is_ok());
    }

    #[rstest]
    fn test_one_hot_profiles_score_like_sequences() {
        let sequences = SequenceScoring::new(matrix(), b"ACDK", b"AWDKC").unwrap();
        let profile_sequence =
            ProfileSequenceScoring::new(matrix(), Arc::new(one_hot_profile(b"ACDK")), b"AWDKC")
                .unwrap();
        let sum_of_pairs = SumOfPairsScore::new(one_hot_pair(b"ACDK", b"AWDKC"), matrix()).unwrap();
        let profile_profile = ProfileProfileScoring::new(matrix(), Box::new(sum_of_pairs)).unwrap();
        assert_eq!(all_scores(&profile_sequence), all_scores(&sequences));
        assert_eq!(all_scores(&profile_profile), all_scores(&sequences));
    }

    #[rstest]
    fn test_profile_profile_coefficient() {
        let dot = DotProductScore::new(one_hot_pair(b"AC", b"AW"));
        let scheme = ProfileProfileScoring::new(matrix(), Box::new(dot))
            .unwrap()
            .with_coefficient(3.0)
            .unwrap();
        assert_eq!(scheme.scoring(1, 1).unwrap(), 3.0);
        assert_eq!(scheme.scoring(2, 2).unwrap(), 0.0);
    }

    fn decorated_schemes() -> Vec<Box<dyn ScoringScheme>> {
        let threading = || Box::new(ThreadingScorer::new(b"ARDK", ramp_potential(5), 0.5).unwrap());
        let s2s = SequenceScoring::new(matrix(), b"ARDK", b"KWDRA")
            .unwrap()
            .with_secondary_structure(b"HHEC", b"CEEHH", secondary(), 1.0)
            .unwrap()
            .with_structural(threading())
            .unwrap();
        let profile = Arc::new(one_hot_profile(b"ARDK"));
        let p2s = ProfileSequenceScoring::new(matrix(), profile, b"KWDRA")
            .unwrap()
            .with_structural(threading())
            .unwrap();
        let sum_of_pairs = SumOfPairsScore::new(one_hot_pair(b"ARDK", b"KWDRA"), matrix()).unwrap();
        let p2p = ProfileProfileScoring::new(matrix(), Box::new(sum_of_pairs))
            .unwrap()
            .with_secondary_structure(b"HHEC", b"CEEHH", secondary(), 1.0)
            .unwrap()
            .with_structural(threading())
            .unwrap();
        vec![
            Box::new(s2s) as Box<dyn ScoringScheme>,
            Box::new(p2s) as Box<dyn ScoringScheme>,
            Box::new(p2p) as Box<dyn ScoringScheme>,
        ]
    }

    #[rstest]
    fn test_reverse_is_an_involution() {
        for scheme in decorated_schemes() {
            let original = all_scores(scheme.as_ref());
            let mut reversed = scheme.reversed();
            assert_eq!(all_scores(scheme.as_ref()), original);
            for (i, j) in (1..=4).cartesian_product(1..=5) {
                assert_eq!(reversed.score_at(i, j), scheme.score_at(i, 6 - j));
            }
            reversed.reverse();
            assert_eq!(all_scores(reversed.as_ref()), original);
        }
    }
}
