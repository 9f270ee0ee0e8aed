pub mod aligner;
pub mod constants;
pub mod data;
pub mod gap;
pub mod traceback;
pub mod zscore;

pub use aligner::Aligner;
pub use constants::AlignmentMode;
pub use data::{AlignedPair, AlignmentData, SecSequenceData, SequenceData};
pub use gap::{AffineGap, GapFunction, PositionalGap};
pub use zscore::{z_score, ReverseScore};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    score::scheme::ScoringScheme,
};

#[derive(Copy, Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
#[builder(name = "Builder", build_fn(name = "build_options"))]
pub struct Options {
    #[builder(default)]
    mode: AlignmentMode,
    #[builder(default = "constants::DEFAULT_GAP_OPEN")]
    gap_open: f64,
    #[builder(default = "constants::DEFAULT_GAP_EXTEND")]
    gap_extend: f64,
    #[builder(default = "constants::DEFAULT_ENSEMBLE_SIZE")]
    ensemble_size: usize,
}

impl Options {
    pub fn mode(&self) -> AlignmentMode {
        self.mode
    }

    pub fn ensemble_size(&self) -> usize {
        self.ensemble_size
    }

    /// The affine gap scores; fails if either is positive.
    pub fn gap(&self) -> Result<AffineGap> {
        AffineGap::new(self.gap_open, self.gap_extend)
    }
}

impl Builder {
    fn options(&self) -> Result<Options> {
        self.build_options().map_err(|e| Error::InvalidParameter(e.to_string()))
    }

    /// Builds an aligner of the target versus the template held by `data`.
    pub fn build_aligner(
        &self,
        data: Box<dyn AlignmentData>,
        scheme: Box<dyn ScoringScheme>,
    ) -> Result<Aligner> {
        let options = self.options()?;
        Aligner::new(data, Box::new(options.gap()?), scheme, options.mode)
    }

    /// Builds the forward aligner and its reversed control.
    pub fn build_reverse_score(
        &self,
        data: Box<dyn AlignmentData>,
        scheme: Box<dyn ScoringScheme>,
    ) -> Result<ReverseScore> {
        let options = self.options()?;
        ReverseScore::new(self.build_aligner(data, scheme)?)
            .with_ensemble_size(options.ensemble_size)
    }
}
