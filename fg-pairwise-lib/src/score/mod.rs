//! Per-cell scores: substitution matrices, structural terms, profile column similarities and
//! the scoring schemes that combine them.
pub mod matrix;
pub mod profile;
pub mod scheme;
pub mod structural;

pub use matrix::SubstitutionMatrix;
pub use profile::ProfileScoring;
pub use scheme::ScoringScheme;
pub use structural::StructuralScorer;
