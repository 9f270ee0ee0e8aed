use log::debug;

use crate::{
    align::{aligner::Aligner, constants::DEFAULT_ENSEMBLE_SIZE},
    error::{Error, Result},
    util::stats::{mean, std_dev},
};

/// Smallest standard deviation used when normalizing, so a degenerate ensemble does not blow up
/// the Z-score.
pub const MIN_STD_DEV: f64 = 1.0;

/// `(forward - mean(ensemble)) / max(std_dev(ensemble), 1)`, with the population standard
/// deviation.
pub fn z_score(forward: f64, ensemble: &[f64]) -> Result<f64> {
    match (mean(ensemble), std_dev(ensemble)) {
        (Some(mu), Some(sigma)) => Ok((forward - mu) / sigma.max(MIN_STD_DEV)),
        _ => Err(Error::InvalidParameter("the control ensemble is empty".into())),
    }
}

/// The significance of an alignment relative to sub-optimal alignments of the target against the
/// reversed template.
///
/// Holds two independent aligners: the forward problem and its reversed control.
#[derive(Clone, Debug)]
pub struct ReverseScore {
    forward: Aligner,
    reverse: Aligner,
    ensemble_size: usize,
}

impl ReverseScore {
    /// Builds the reversed control from a copy of `forward`.
    pub fn new(forward: Aligner) -> Self {
        let reverse = forward.reversed();
        Self::from_aligners(forward, reverse)
    }

    /// Uses `reverse` as the control as is; its scheme is expected to be reversed already.
    pub fn from_aligners(forward: Aligner, reverse: Aligner) -> Self {
        Self { forward, reverse, ensemble_size: DEFAULT_ENSEMBLE_SIZE }
    }

    pub fn with_ensemble_size(mut self, ensemble_size: usize) -> Result<Self> {
        if ensemble_size == 0 {
            return Err(Error::InvalidParameter("the ensemble size must be positive".into()));
        }
        self.ensemble_size = ensemble_size;
        Ok(self)
    }

    pub fn forward(&self) -> &Aligner {
        &self.forward
    }

    pub fn reverse(&self) -> &Aligner {
        &self.reverse
    }

    pub fn get_z_score(&mut self) -> Result<f64> {
        self.get_z_score_with(self.ensemble_size)
    }

    /// Recomputes both alignments and scores the forward one against `n` sub-optimal
    /// alignments of the control.
    pub fn get_z_score_with(&mut self, n: usize) -> Result<f64> {
        if n == 0 {
            return Err(Error::InvalidParameter("the ensemble size must be positive".into()));
        }
        self.forward.recalculate_matrix();
        self.forward.get_multi_match();
        self.reverse.recalculate_matrix();
        self.reverse.get_multi_match();

        let forward = self.forward.get_score()?;
        let ensemble = self.reverse.generate_multi_match_score(n);
        let z = z_score(forward, &ensemble)?;
        debug!("Forward score {} against {} reversed alignments: Z = {:.3}", forward, n, z);
        Ok(z)
    }
}
