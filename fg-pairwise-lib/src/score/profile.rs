//! Column versus column similarity of two profiles.
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::Result,
    model::{alphabet::NUM_AMINO_ACIDS, Profile},
    score::matrix::SubstitutionMatrix,
    util::orientation::Orientation,
};

/// Default offset of [`EuclideanScore`].
pub const DEFAULT_EUCLIDEAN_OFFSET: f64 = 1.0;

/// The two profiles compared by a [`ProfileScoring`], and the direction the template is read in.
#[derive(Clone, Debug)]
pub struct ProfilePair {
    p1: Arc<Profile>,
    p2: Arc<Profile>,
    orientation: Orientation,
}

impl ProfilePair {
    pub fn new(p1: Arc<Profile>, p2: Arc<Profile>) -> Self {
        Self { p1, p2, orientation: Orientation::default() }
    }

    pub fn target(&self) -> &Profile {
        &self.p1
    }

    pub fn template(&self) -> &Profile {
        &self.p2
    }

    /// The 0-based columns of the 1-based positions `i` and `j`.
    #[inline(always)]
    fn columns(&self, i: usize, j: usize) -> (usize, usize) {
        (i - 1, self.orientation.offset(j, self.p2.len()))
    }
}

/// A similarity of target profile column `i` and template profile column `j` (1-based).
pub trait ProfileScoring: Debug + Send + Sync {
    fn pair(&self) -> &ProfilePair;

    fn pair_mut(&mut self) -> &mut ProfilePair;

    /// The similarity of the 0-based columns `p` of the target and `q` of the template.
    fn score_columns(&self, p: usize, q: usize) -> f64;

    fn box_clone(&self) -> Box<dyn ProfileScoring>;

    fn len1(&self) -> usize {
        self.pair().p1.len()
    }

    fn len2(&self) -> usize {
        self.pair().p2.len()
    }

    fn scoring_seq(&self, i: usize, j: usize) -> f64 {
        let (p, q) = self.pair().columns(i, j);
        self.score_columns(p, q)
    }

    /// Reverses the template profile.  Reversing twice restores the original.
    fn reverse(&mut self) {
        self.pair_mut().orientation.flip();
    }
}

impl Clone for Box<dyn ProfileScoring> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// `offset - sqrt(sum_k (f1[k] - f2[k])^2)`
#[derive(Clone, Debug)]
pub struct EuclideanScore {
    pair: ProfilePair,
    offset: f64,
}

impl EuclideanScore {
    pub fn new(pair: ProfilePair) -> Self {
        Self::with_offset(pair, DEFAULT_EUCLIDEAN_OFFSET)
    }

    pub fn with_offset(pair: ProfilePair, offset: f64) -> Self {
        Self { pair, offset }
    }
}

impl ProfileScoring for EuclideanScore {
    fn pair(&self) -> &ProfilePair {
        &self.pair
    }

    fn pair_mut(&mut self) -> &mut ProfilePair {
        &mut self.pair
    }

    fn score_columns(&self, p: usize, q: usize) -> f64 {
        let (f1, f2) = (&self.pair.p1.frequencies()[p], &self.pair.p2.frequencies()[q]);
        let distance = f1.iter().zip(f2.iter()).map(|(a, b)| (a - b) * (a - b)).sum::<f64>();
        self.offset - distance.sqrt()
    }

    fn box_clone(&self) -> Box<dyn ProfileScoring> {
        Box::new(self.clone())
    }
}

/// The correlation of the two columns, each taken relative to its profile's background.
/// Columns without any variation score zero.
#[derive(Clone, Debug)]
pub struct PearsonScore {
    pair: ProfilePair,
}

impl PearsonScore {
    pub fn new(pair: ProfilePair) -> Self {
        Self { pair }
    }
}

impl ProfileScoring for PearsonScore {
    fn pair(&self) -> &ProfilePair {
        &self.pair
    }

    fn pair_mut(&mut self) -> &mut ProfilePair {
        &mut self.pair
    }

    fn score_columns(&self, p: usize, q: usize) -> f64 {
        let (p1, p2) = (&self.pair.p1, &self.pair.p2);
        let (mut xy, mut xx, mut yy) = (0.0, 0.0, 0.0);
        for k in 0..NUM_AMINO_ACIDS {
            let x = p1.frequencies()[p][k] - p1.background()[k];
            let y = p2.frequencies()[q][k] - p2.background()[k];
            xy += x * y;
            xx += x * x;
            yy += y * y;
        }
        let denominator = (xx * yy).sqrt();
        if denominator > 0.0 {
            xy / denominator
        } else {
            0.0
        }
    }

    fn box_clone(&self) -> Box<dyn ProfileScoring> {
        Box::new(self.clone())
    }
}

/// `sum_k f1[k] * f2[k]`
#[derive(Clone, Debug)]
pub struct DotProductScore {
    pair: ProfilePair,
}

impl DotProductScore {
    pub fn new(pair: ProfilePair) -> Self {
        Self { pair }
    }
}

impl ProfileScoring for DotProductScore {
    fn pair(&self) -> &ProfilePair {
        &self.pair
    }

    fn pair_mut(&mut self) -> &mut ProfilePair {
        &mut self.pair
    }

    fn score_columns(&self, p: usize, q: usize) -> f64 {
        let (f1, f2) = (&self.pair.p1.frequencies()[p], &self.pair.p2.frequencies()[q]);
        f1.iter().zip(f2.iter()).map(|(a, b)| a * b).sum()
    }

    fn box_clone(&self) -> Box<dyn ProfileScoring> {
        Box::new(self.clone())
    }
}

/// `sum_k sum_l f1[k] * f2[l] * sub(k, l)`, over every pair of amino acids.
#[derive(Clone, Debug)]
pub struct SumOfPairsScore {
    pair: ProfilePair,
    matrix: Arc<SubstitutionMatrix>,
    indices: [usize; NUM_AMINO_ACIDS],
}

impl SumOfPairsScore {
    /// Fails when the matrix lacks one of the twenty amino acids.
    pub fn new(pair: ProfilePair, matrix: Arc<SubstitutionMatrix>) -> Result<Self> {
        let indices = matrix.amino_acid_indices()?;
        Ok(Self { pair, matrix, indices })
    }
}

impl ProfileScoring for SumOfPairsScore {
    fn pair(&self) -> &ProfilePair {
        &self.pair
    }

    fn pair_mut(&mut self) -> &mut ProfilePair {
        &mut self.pair
    }

    fn score_columns(&self, p: usize, q: usize) -> f64 {
        let (f1, f2) = (&self.pair.p1.frequencies()[p], &self.pair.p2.frequencies()[q]);
        let mut score = 0.0;
        for (k, a) in f1.iter().enumerate().filter(|(_, a)| **a > 0.0) {
            for (l, b) in f2.iter().enumerate().filter(|(_, b)| **b > 0.0) {
                score += a * b * self.matrix.score_by_index(self.indices[k], self.indices[l]);
            }
        }
        score
    }

    fn box_clone(&self) -> Box<dyn ProfileScoring> {
        Box::new(self.clone())
    }
}

fn cross_log_odds(scored: &Profile, p: usize, weights: &Profile, q: usize) -> f64 {
    (0..NUM_AMINO_ACIDS)
        .map(|k| weights.frequencies()[q][k] * scored.log_odds(k, p))
        .sum()
}

/// Each column's frequencies against the other's log-odds, weighted by the number of distinct
/// amino acids observed in the other column.
#[derive(Clone, Debug)]
pub struct PanchenkoScore {
    pair: ProfilePair,
}

impl PanchenkoScore {
    pub fn new(pair: ProfilePair) -> Self {
        Self { pair }
    }
}

impl ProfileScoring for PanchenkoScore {
    fn pair(&self) -> &ProfilePair {
        &self.pair
    }

    fn pair_mut(&mut self) -> &mut ProfilePair {
        &mut self.pair
    }

    fn score_columns(&self, p: usize, q: usize) -> f64 {
        let (p1, p2) = (self.pair.target(), self.pair.template());
        let n1 = p1.num_distinct(p) as f64;
        let n2 = p2.num_distinct(q) as f64;
        if n1 + n2 == 0.0 {
            return 0.0;
        }
        (n2 * cross_log_odds(p2, q, p1, p) + n1 * cross_log_odds(p1, p, p2, q)) / (n1 + n2)
    }

    fn box_clone(&self) -> Box<dyn ProfileScoring> {
        Box::new(self.clone())
    }
}

/// `sum_k f1[k] * pssm2[k] + sum_k f2[k] * pssm1[k]`
#[derive(Clone, Debug)]
pub struct ZhouScore {
    pair: ProfilePair,
}

impl ZhouScore {
    pub fn new(pair: ProfilePair) -> Self {
        Self { pair }
    }
}

impl ProfileScoring for ZhouScore {
    fn pair(&self) -> &ProfilePair {
        &self.pair
    }

    fn pair_mut(&mut self) -> &mut ProfilePair {
        &mut self.pair
    }

    fn score_columns(&self, p: usize, q: usize) -> f64 {
        let (p1, p2) = (self.pair.target(), self.pair.template());
        cross_log_odds(p2, q, p1, p) + cross_log_odds(p1, p, p2, q)
    }

    fn box_clone(&self) -> Box<dyn ProfileScoring> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
pub mod tests {
    use itertools::Itertools;
    use rstest::rstest;

    use super::*;
    use crate::{model::profile::tests::one_hot_profile, score::matrix::tests::five_minus_one};

    pub fn one_hot_pair(target: &[u8], template: &[u8]) -> ProfilePair {
        ProfilePair::new(
            Arc::new(one_hot_profile(target)),
            Arc::new(one_hot_profile(template)),
        )
    }

    fn mixed_pair() -> ProfilePair {
        let p1 = Profile::from_alignment(&[b"ACDK".as_slice(), b"ACEK", b"SCDR"]).unwrap();
        let rows = [b"GCDKW".as_slice(), b"ACDKW", b"ACNKF", b"AVDKW"];
        let p2 = Profile::from_alignment(&rows).unwrap();
        ProfilePair::new(Arc::new(p1), Arc::new(p2))
    }

    #[rstest]
    fn test_euclidean() {
        let score = EuclideanScore::new(one_hot_pair(b"AC", b"AW"));
        assert_eq!(score.scoring_seq(1, 1), 1.0);
        assert_eq!(score.scoring_seq(2, 2), 1.0 - 2f64.sqrt());
        let score = EuclideanScore::with_offset(one_hot_pair(b"AC", b"AW"), 3.0);
        assert_eq!(score.scoring_seq(1, 1), 3.0);
    }

    #[rstest]
    fn test_pearson() {
        let score = PearsonScore::new(mixed_pair());
        for (i, j) in (1..=4).cartesian_product(1..=5) {
            let r = score.scoring_seq(i, j);
            assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&r), "({i}, {j}) = {r}");
        }
        let identical = PearsonScore::new(one_hot_pair(b"A", b"A"));
        assert!((identical.scoring_seq(1, 1) - 1.0).abs() < 1e-9);
    }

    #[rstest]
    fn test_dot_product() {
        let score = DotProductScore::new(one_hot_pair(b"ACD", b"ACW"));
        assert_eq!(score.scoring_seq(1, 1), 1.0);
        assert_eq!(score.scoring_seq(3, 3), 0.0);
    }

    #[rstest]
    fn test_sum_of_pairs_on_one_hot_profiles_is_the_matrix() {
        let matrix = Arc::new(five_minus_one());
        let score = SumOfPairsScore::new(one_hot_pair(b"ACD", b"AWD"), matrix.clone()).unwrap();
        assert_eq!(score.scoring_seq(1, 1), 5.0);
        assert_eq!(score.scoring_seq(2, 2), -1.0);
        assert_eq!(score.scoring_seq(3, 3), 5.0);
        let secondary = Arc::new(SubstitutionMatrix::default_secondary());
        assert!(SumOfPairsScore::new(one_hot_pair(b"A", b"A"), secondary).is_err());
    }

    #[rstest]
    fn test_information_weighted_scores() {
        let pair = one_hot_pair(b"AC", b"AW");
        let zhou = ZhouScore::new(pair.clone());
        let panchenko = PanchenkoScore::new(pair.clone());
        // one distinct residue per column, so the Panchenko weights are equal
        assert!((panchenko.scoring_seq(1, 1) - zhou.scoring_seq(1, 1) / 2.0).abs() < 1e-12);
        let expected = pair.target().log_odds(0, 0) + pair.template().log_odds(0, 0);
        assert!((zhou.scoring_seq(1, 1) - expected).abs() < 1e-12);
        assert!(zhou.scoring_seq(1, 1) > zhou.scoring_seq(2, 2));
    }

    #[rstest]
    #[case(Box::new(EuclideanScore::new(mixed_pair())))]
    #[case(Box::new(PearsonScore::new(mixed_pair())))]
    #[case(Box::new(DotProductScore::new(mixed_pair())))]
    #[case(Box::new(SumOfPairsScore::new(mixed_pair(), Arc::new(five_minus_one())).unwrap()))]
    #[case(Box::new(PanchenkoScore::new(mixed_pair())))]
    #[case(Box::new(ZhouScore::new(mixed_pair())))]
    fn test_reverse_mirrors_the_template(#[case] score: Box<dyn ProfileScoring>) {
        let (len1, len2) = (score.len1(), score.len2());
        let mut reversed = score.clone();
        reversed.reverse();
        for (i, j) in (1..=len1).cartesian_product(1..=len2) {
            assert_eq!(reversed.scoring_seq(i, j), score.scoring_seq(i, len2 + 1 - j));
        }
        reversed.reverse();
        for (i, j) in (1..=len1).cartesian_product(1..=len2) {
            assert_eq!(reversed.scoring_seq(i, j), score.scoring_seq(i, j));
        }
    }
}
