//! Read-only inputs consumed by the scorers: residue alphabets, sequence profiles,
//! secondary-structure predictions and threading potentials.
pub mod alphabet;
pub mod potential;
pub mod prediction;
pub mod profile;

pub use potential::ThreadingPotential;
pub use prediction::{PhdPrediction, SecondaryPrediction};
pub use profile::Profile;
