use derive_getters::Getters;

use crate::{
    error::{Error, Result},
    model::alphabet::{is_secondary_structure, mixed_class},
};

/// The largest PSI-PRED style confidence value.
pub const MAX_CONFIDENCE: u8 = 9;

fn check_classes(what: &str, classes: &[u8]) -> Result<()> {
    match classes.iter().position(|c| !is_secondary_structure(*c)) {
        Some(offset) => Err(Error::illegal_symbol(what, classes[offset], offset)),
        None => Ok(()),
    }
}

/// A PSI-PRED style prediction: a secondary-structure class per position with a confidence
/// between zero and [`MAX_CONFIDENCE`].  Positions are 0-based.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
pub struct SecondaryPrediction {
    classes: Vec<u8>,
    confidence: Vec<u8>,
}

impl SecondaryPrediction {
    pub fn new(classes: &[u8], confidence: &[u8]) -> Result<Self> {
        check_classes("secondary-structure prediction", classes)?;
        if classes.len() != confidence.len() {
            return Err(Error::length_mismatch(
                "prediction confidence",
                classes.len(),
                confidence.len(),
            ));
        }
        if let Some(&c) = confidence.iter().find(|c| **c > MAX_CONFIDENCE) {
            return Err(Error::InvalidParameter(format!(
                "confidence {c} is larger than {MAX_CONFIDENCE}"
            )));
        }
        Ok(Self {
            classes: classes.to_vec(),
            confidence: confidence.to_vec(),
        })
    }

    /// A prediction where every position has the maximum confidence.
    pub fn from_classes(classes: &[u8]) -> Result<Self> {
        Self::new(classes, &vec![MAX_CONFIDENCE; classes.len()])
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class(&self, pos: usize) -> u8 {
        self.classes[pos]
    }

    /// The confidence at `pos` scaled to `(0, 1]`.
    pub fn weight(&self, pos: usize) -> f64 {
        f64::from(self.confidence[pos] + 1) / f64::from(MAX_CONFIDENCE + 1)
    }
}

/// A PHD style prediction: a secondary-structure class and a burial class (`b`uried or
/// `e`xposed) per position.  Positions are 0-based.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
pub struct PhdPrediction {
    classes: Vec<u8>,
    burial: Vec<u8>,
}

impl PhdPrediction {
    pub fn new(classes: &[u8], burial: &[u8]) -> Result<Self> {
        check_classes("PHD prediction", classes)?;
        if classes.len() != burial.len() {
            return Err(Error::length_mismatch(
                "PHD burial",
                classes.len(),
                burial.len(),
            ));
        }
        if let Some(offset) = burial.iter().position(|b| *b != b'b' && *b != b'e') {
            return Err(Error::illegal_symbol("PHD burial", burial[offset], offset));
        }
        Ok(Self {
            classes: classes.to_vec(),
            burial: burial.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class(&self, pos: usize) -> u8 {
        self.classes[pos]
    }

    pub fn is_buried(&self, pos: usize) -> bool {
        self.burial[pos] == b'b'
    }

    /// The secondary-structure class combined with burial, see
    /// [`crate::model::alphabet::MIXED_CLASSES`].
    pub fn mixed_class(&self, pos: usize) -> u8 {
        mixed_class(self.classes[pos], self.is_buried(pos))
    }
}
