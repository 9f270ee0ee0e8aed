use super::command::{Command, ValueEnum};
use anyhow::anyhow;
use clap::{
    builder::{PossibleValuesParser, TypedValueParser as _},
    Parser,
};
use log::info;
use pairwise::{
    score::SubstitutionMatrix,
    util::{io::write_matrix, version::built_info},
};
use std::{fmt::Display, path::PathBuf, str::FromStr};

/// The built-in matrices.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatrixKind {
    Blosum62,
    Secondary,
    Mixed,
}

impl MatrixKind {
    fn matrix(self) -> SubstitutionMatrix {
        match self {
            Self::Blosum62 => SubstitutionMatrix::blosum62(),
            Self::Secondary => SubstitutionMatrix::default_secondary(),
            Self::Mixed => SubstitutionMatrix::default_mixed(),
        }
    }
}

impl Display for MatrixKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blosum62 => write!(f, "blosum62"),
            Self::Secondary => write!(f, "secondary"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

impl FromStr for MatrixKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blosum62" => Ok(Self::Blosum62),
            "secondary" => Ok(Self::Secondary),
            "mixed" => Ok(Self::Mixed),
            _ => Err(anyhow!("Invalid matrix kind: {}", s)),
        }
    }
}

impl ValueEnum for MatrixKind {
    fn variants<'a>() -> &'a [Self] {
        &[Self::Blosum62, Self::Secondary, Self::Mixed]
    }
}

/// Writes a built-in substitution matrix.
///
/// The output is the alphabet on the first line followed by one row of scores per symbol.  It
/// may be edited and passed back to `align --matrix`.  A `.gz` output is gzip compressed.
#[derive(Parser, Debug, Clone)]
#[clap(version = built_info::VERSION.as_str(), term_width=0)]
pub struct Matrix {
    /// The path to the output matrix file.
    #[clap(long, short = 'o', display_order = 1)]
    output: PathBuf,

    /// The matrix to write:
    /// - blosum62: the BLOSUM62 protein matrix.
    /// - secondary: helix/strand/coil classes (HEC).
    /// - mixed: secondary-structure classes combined with burial (HEChec).
    #[clap(
        long,
        short = 'k',
        value_parser = PossibleValuesParser::new(MatrixKind::possible_values())
            .map(|s| s.parse::<MatrixKind>().unwrap()),
        default_value_t = MatrixKind::Blosum62,
        ignore_case = true,
        display_order = 2,
        verbatim_doc_comment
    )]
    kind: MatrixKind,
}

impl Command for Matrix {
    fn execute(&self) -> anyhow::Result<()> {
        info!("Writing the {} matrix to {}", self.kind, self.output.display());
        write_matrix(&self.output, &self.kind.matrix())
    }
}
