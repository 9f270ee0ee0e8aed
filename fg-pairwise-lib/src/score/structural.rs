//! Structural evidence added to the per-cell score: secondary structure, PSI-PRED and PHD style
//! predictions, threading potentials, and sums of two of these.
//!
//! All positions taken by [`StructuralScorer::scoring_str`] are 1-based.  Inputs are shared
//! (`Arc`) and never copied by a clone or a reversal.
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::{Error, Result},
    model::{alphabet::amino_index, PhdPrediction, SecondaryPrediction, ThreadingPotential},
    score::matrix::SubstitutionMatrix,
    util::orientation::Orientation,
};

/// A structural bonus or penalty for aligning target position `i` with template position `j`.
pub trait StructuralScorer: Debug + Send + Sync {
    fn len1(&self) -> usize;

    fn len2(&self) -> usize;

    fn scoring_str(&self, i: usize, j: usize) -> f64;

    /// The target sequence the scorer was built on, for scorers that read target residues.
    fn target(&self) -> Option<&[u8]> {
        None
    }

    /// Reverses the template side in place.  Reversing twice restores the original.
    fn reverse(&mut self);

    fn box_clone(&self) -> Box<dyn StructuralScorer>;
}

impl Clone for Box<dyn StructuralScorer> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

pub(crate) fn check_symbols(what: &str, symbols: &[u8], matrix: &SubstitutionMatrix) -> Result<()> {
    match symbols.iter().position(|s| !matrix.contains(*s)) {
        Some(offset) => Err(Error::illegal_symbol(what, symbols[offset], offset)),
        None => Ok(()),
    }
}

pub(crate) fn check_coefficient(coefficient: f64) -> Result<()> {
    if coefficient.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!("coefficient must be finite (found {coefficient})")))
    }
}

/// Secondary structure versus secondary structure, scored by a matrix over `HEC`.
#[derive(Clone, Debug)]
pub struct SecondaryStructureScorer {
    sec1: Arc<Vec<u8>>,
    sec2: Arc<Vec<u8>>,
    matrix: Arc<SubstitutionMatrix>,
    coefficient: f64,
    orientation: Orientation,
}

impl SecondaryStructureScorer {
    pub fn new(
        sec1: &[u8],
        sec2: &[u8],
        matrix: Arc<SubstitutionMatrix>,
        coefficient: f64,
    ) -> Result<Self> {
        check_symbols("target secondary structure", sec1, &matrix)?;
        check_symbols("template secondary structure", sec2, &matrix)?;
        check_coefficient(coefficient)?;
        Ok(Self {
            sec1: Arc::new(sec1.to_vec()),
            sec2: Arc::new(sec2.to_vec()),
            matrix,
            coefficient,
            orientation: Orientation::default(),
        })
    }
}

impl StructuralScorer for SecondaryStructureScorer {
    fn len1(&self) -> usize {
        self.sec1.len()
    }

    fn len2(&self) -> usize {
        self.sec2.len()
    }

    #[inline(always)]
    fn scoring_str(&self, i: usize, j: usize) -> f64 {
        let b = self.sec2[self.orientation.offset(j, self.sec2.len())];
        self.coefficient * self.matrix.score(self.sec1[i - 1], b)
    }

    fn reverse(&mut self) {
        self.orientation.flip();
    }

    fn box_clone(&self) -> Box<dyn StructuralScorer> {
        Box::new(self.clone())
    }
}

/// PSI-PRED style predictions: the class score is weighted by the confidence of both sides.
#[derive(Clone, Debug)]
pub struct PsiPredScorer {
    pred1: Arc<SecondaryPrediction>,
    pred2: Arc<SecondaryPrediction>,
    matrix: Arc<SubstitutionMatrix>,
    coefficient: f64,
    orientation: Orientation,
}

impl PsiPredScorer {
    pub fn new(
        pred1: Arc<SecondaryPrediction>,
        pred2: Arc<SecondaryPrediction>,
        matrix: Arc<SubstitutionMatrix>,
        coefficient: f64,
    ) -> Result<Self> {
        check_symbols("target PSI-PRED classes", pred1.classes(), &matrix)?;
        check_symbols("template PSI-PRED classes", pred2.classes(), &matrix)?;
        check_coefficient(coefficient)?;
        Ok(Self { pred1, pred2, matrix, coefficient, orientation: Orientation::default() })
    }
}

impl StructuralScorer for PsiPredScorer {
    fn len1(&self) -> usize {
        self.pred1.len()
    }

    fn len2(&self) -> usize {
        self.pred2.len()
    }

    fn scoring_str(&self, i: usize, j: usize) -> f64 {
        let p = i - 1;
        let q = self.orientation.offset(j, self.pred2.len());
        self.coefficient
            * self.matrix.score(self.pred1.class(p), self.pred2.class(q))
            * self.pred1.weight(p)
            * self.pred2.weight(q)
    }

    fn reverse(&mut self) {
        self.orientation.flip();
    }

    fn box_clone(&self) -> Box<dyn StructuralScorer> {
        Box::new(self.clone())
    }
}

/// PHD style predictions, scored on the class combined with burial (a matrix over `HEChec`).
#[derive(Clone, Debug)]
pub struct PhdScorer {
    phd1: Arc<PhdPrediction>,
    phd2: Arc<PhdPrediction>,
    matrix: Arc<SubstitutionMatrix>,
    coefficient: f64,
    orientation: Orientation,
}

impl PhdScorer {
    pub fn new(
        phd1: Arc<PhdPrediction>,
        phd2: Arc<PhdPrediction>,
        matrix: Arc<SubstitutionMatrix>,
        coefficient: f64,
    ) -> Result<Self> {
        for (what, phd) in [("target PHD classes", &phd1), ("template PHD classes", &phd2)] {
            let mixed = (0..phd.len()).map(|pos| phd.mixed_class(pos)).collect::<Vec<_>>();
            check_symbols(what, &mixed, &matrix)?;
        }
        check_coefficient(coefficient)?;
        Ok(Self { phd1, phd2, matrix, coefficient, orientation: Orientation::default() })
    }
}

impl StructuralScorer for PhdScorer {
    fn len1(&self) -> usize {
        self.phd1.len()
    }

    fn len2(&self) -> usize {
        self.phd2.len()
    }

    fn scoring_str(&self, i: usize, j: usize) -> f64 {
        let q = self.orientation.offset(j, self.phd2.len());
        self.coefficient * self.matrix.score(self.phd1.mixed_class(i - 1), self.phd2.mixed_class(q))
    }

    fn reverse(&mut self) {
        self.orientation.flip();
    }

    fn box_clone(&self) -> Box<dyn StructuralScorer> {
        Box::new(self.clone())
    }
}

/// The target sequence threaded onto a template potential.  Residues outside the twenty amino
/// acids score zero.
#[derive(Clone, Debug)]
pub struct ThreadingScorer {
    target: Arc<Vec<u8>>,
    potential: Arc<ThreadingPotential>,
    coefficient: f64,
    orientation: Orientation,
}

impl ThreadingScorer {
    pub fn new(
        target: &[u8],
        potential: Arc<ThreadingPotential>,
        coefficient: f64,
    ) -> Result<Self> {
        check_coefficient(coefficient)?;
        Ok(Self {
            target: Arc::new(target.to_vec()),
            potential,
            coefficient,
            orientation: Orientation::default(),
        })
    }
}

impl StructuralScorer for ThreadingScorer {
    fn len1(&self) -> usize {
        self.target.len()
    }

    fn len2(&self) -> usize {
        *self.potential.len()
    }

    fn scoring_str(&self, i: usize, j: usize) -> f64 {
        let q = self.orientation.offset(j, *self.potential.len());
        amino_index(self.target[i - 1])
            .map_or(0.0, |code| self.coefficient * self.potential.get(code, q))
    }

    fn target(&self) -> Option<&[u8]> {
        Some(&self.target)
    }

    fn reverse(&mut self) {
        self.orientation.flip();
    }

    fn box_clone(&self) -> Box<dyn StructuralScorer> {
        Box::new(self.clone())
    }
}

/// The sum of two structural scorers over the same positions.
#[derive(Clone, Debug)]
pub struct CompositeScorer {
    first: Box<dyn StructuralScorer>,
    second: Box<dyn StructuralScorer>,
}

impl CompositeScorer {
    pub fn new(
        first: Box<dyn StructuralScorer>,
        second: Box<dyn StructuralScorer>,
    ) -> Result<Self> {
        if first.len1() != second.len1() {
            return Err(Error::length_mismatch("combined target", first.len1(), second.len1()));
        }
        if first.len2() != second.len2() {
            return Err(Error::length_mismatch("combined template", first.len2(), second.len2()));
        }
        Ok(Self { first, second })
    }

    pub fn threading_phd(threading: ThreadingScorer, phd: PhdScorer) -> Result<Self> {
        Self::new(Box::new(threading), Box::new(phd))
    }

    pub fn threading_psipred(threading: ThreadingScorer, psipred: PsiPredScorer) -> Result<Self> {
        Self::new(Box::new(threading), Box::new(psipred))
    }
}

impl StructuralScorer for CompositeScorer {
    fn len1(&self) -> usize {
        self.first.len1()
    }

    fn len2(&self) -> usize {
        self.first.len2()
    }

    fn scoring_str(&self, i: usize, j: usize) -> f64 {
        self.first.scoring_str(i, j) + self.second.scoring_str(i, j)
    }

    fn target(&self) -> Option<&[u8]> {
        self.first.target().or_else(|| self.second.target())
    }

    fn reverse(&mut self) {
        self.first.reverse();
        self.second.reverse();
    }

    fn box_clone(&self) -> Box<dyn StructuralScorer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
pub mod tests {
    use itertools::Itertools;
    use rstest::rstest;

    use super::*;
    use crate::model::alphabet::NUM_AMINO_ACIDS;

    fn secondary() -> Arc<SubstitutionMatrix> {
        Arc::new(SubstitutionMatrix::default_secondary())
    }

    /// A potential scoring `code + pos / 10` for residue `code` at template position `pos`.
    pub fn ramp_potential(len: usize) -> Arc<ThreadingPotential> {
        let table = (0..NUM_AMINO_ACIDS)
            .map(|code| (0..len).map(|pos| code as f64 + pos as f64 / 10.0).collect())
            .collect();
        Arc::new(ThreadingPotential::new(table).unwrap())
    }

    fn psipred(target: &[u8], template: &[u8]) -> PsiPredScorer {
        PsiPredScorer::new(
            Arc::new(SecondaryPrediction::new(target, &vec![9; target.len()]).unwrap()),
            Arc::new(SecondaryPrediction::new(template, &vec![4; template.len()]).unwrap()),
            secondary(),
            2.0,
        )
        .unwrap()
    }

    fn phd(target: &[u8], template: &[u8]) -> PhdScorer {
        PhdScorer::new(
            Arc::new(PhdPrediction::new(target, &vec![b'b'; target.len()]).unwrap()),
            Arc::new(PhdPrediction::new(template, b"beb").unwrap()),
            Arc::new(SubstitutionMatrix::default_mixed()),
            1.0,
        )
        .unwrap()
    }

    fn all_scores(scorer: &dyn StructuralScorer) -> Vec<f64> {
        (1..=scorer.len1())
            .cartesian_product(1..=scorer.len2())
            .map(|(i, j)| scorer.scoring_str(i, j))
            .collect()
    }

    #[rstest]
    fn test_secondary_structure_scorer() {
        let scorer = SecondaryStructureScorer::new(b"HEC", b"HHC", secondary(), 0.5).unwrap();
        assert_eq!(scorer.scoring_str(1, 1), 0.5);
        assert_eq!(scorer.scoring_str(2, 1), -0.5);
        assert_eq!(scorer.scoring_str(3, 3), 0.25);
        assert!(matches!(
            SecondaryStructureScorer::new(b"HX", b"HH", secondary(), 1.0),
            Err(Error::IllegalSymbol { offset: 1, .. })
        ));
    }

    #[rstest]
    fn test_psipred_weights_by_confidence() {
        let scorer = psipred(b"HE", b"HC");
        // 2.0 * 1.0 * (10 / 10) * (5 / 10)
        assert_eq!(scorer.scoring_str(1, 1), 1.0);
        assert_eq!(scorer.scoring_str(2, 2), 2.0 * -0.5 * 0.5);
    }

    #[rstest]
    fn test_phd_uses_burial() {
        let scorer = phd(b"HHH", b"HHH");
        assert!(scorer.scoring_str(1, 1) > scorer.scoring_str(1, 2));
        assert_eq!(scorer.scoring_str(1, 1), scorer.scoring_str(1, 3));
    }

    #[rstest]
    fn test_threading_scorer() {
        let scorer = ThreadingScorer::new(b"AXR", ramp_potential(4), 2.0).unwrap();
        assert_eq!(scorer.len2(), 4);
        assert_eq!(scorer.scoring_str(1, 1), 0.0);
        assert_eq!(scorer.scoring_str(3, 3), 2.0 * (1.0 + 2.0 / 10.0));
        assert_eq!(scorer.scoring_str(2, 3), 0.0);
    }

    #[rstest]
    fn test_composite_is_the_sum() {
        let threading = ThreadingScorer::new(b"RRR", ramp_potential(3), 1.0).unwrap();
        let phd = phd(b"HEC", b"HEC");
        let composite = CompositeScorer::threading_phd(threading.clone(), phd.clone()).unwrap();
        for (i, j) in (1..=3).cartesian_product(1..=3) {
            assert_eq!(
                composite.scoring_str(i, j),
                threading.scoring_str(i, j) + phd.scoring_str(i, j)
            );
        }
        let short = ThreadingScorer::new(b"RRR", ramp_potential(2), 1.0).unwrap();
        assert!(CompositeScorer::threading_psipred(short, psipred(b"HEC", b"HEC")).is_err());
    }

    #[rstest]
    #[case(Box::new(SecondaryStructureScorer::new(b"HEC", b"HHE", secondary(), 1.0).unwrap()))]
    #[case(Box::new(psipred(b"HEC", b"CHE")))]
    #[case(Box::new(phd(b"HEC", b"ECC")))]
    #[case(Box::new(ThreadingScorer::new(b"ACD", ramp_potential(3), 1.0).unwrap()))]
    #[case(Box::new(CompositeScorer::threading_psipred(
        ThreadingScorer::new(b"ACD", ramp_potential(3), 1.0).unwrap(),
        psipred(b"HEC", b"CHE"),
    ).unwrap()))]
    fn test_reverse_mirrors_the_template(#[case] scorer: Box<dyn StructuralScorer>) {
        let mut reversed = scorer.clone();
        reversed.reverse();
        for (i, j) in (1..=3).cartesian_product(1..=3) {
            assert_eq!(reversed.scoring_str(i, j), scorer.scoring_str(i, 4 - j));
        }
        reversed.reverse();
        assert_eq!(all_scores(reversed.as_ref()), all_scores(scorer.as_ref()));
    }
}
