use std::{
    io::{BufRead, Write},
    path::Path,
};

use anyhow::{ensure, Context, Result};
use fgoxide::io::Io;
use seq_io::fasta::{Reader as FastaReader, Record as FastaRecord};

use crate::score::matrix::SubstitutionMatrix;

pub const BUFFER_SIZE: usize = 1024 * 1024;

/// A named sequence read from a FASTA file, upper-cased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedSequence {
    pub name: String,
    pub seq: Vec<u8>,
}

fn header_to_name(header: &[u8]) -> Result<String> {
    let header: std::borrow::Cow<str> = String::from_utf8_lossy(header);
    header
        .split_whitespace()
        .next()
        .map(std::string::ToString::to_string)
        .context("empty sequence name")
}

/// Reads every record of a (possibly gzipped) FASTA file.
pub fn read_fasta<P: AsRef<Path>>(path: &P) -> Result<Vec<NamedSequence>> {
    let fg_io: Io = Io::new(5, BUFFER_SIZE);
    let source: FastaReader<Box<dyn BufRead + Send>> =
        FastaReader::with_capacity(fg_io.new_reader(path)?, BUFFER_SIZE);

    let mut sequences = Vec::new();
    for record in source.into_records() {
        let record = record
            .with_context(|| format!("Error reading FASTA {}", path.as_ref().display()))?;
        sequences.push(NamedSequence {
            name: header_to_name(record.head())?,
            seq: record
                .seq()
                .iter()
                .filter(|base| !base.is_ascii_whitespace())
                .map(u8::to_ascii_uppercase)
                .collect(),
        });
    }
    ensure!(
        !sequences.is_empty(),
        "Found no sequences in the FASTA {}",
        path.as_ref().display()
    );
    Ok(sequences)
}

/// Reads a substitution matrix file (see [`SubstitutionMatrix::read`]).
pub fn read_matrix<P: AsRef<Path>>(path: &P) -> Result<SubstitutionMatrix> {
    let fg_io: Io = Io::new(5, BUFFER_SIZE);
    let reader = fg_io.new_reader(path)?;
    SubstitutionMatrix::read(reader)
        .with_context(|| format!("Error reading matrix {}", path.as_ref().display()))
}

pub fn write_matrix<P: AsRef<Path>>(path: &P, matrix: &SubstitutionMatrix) -> Result<()> {
    let fg_io: Io = Io::new(5, BUFFER_SIZE);
    let mut writer = fg_io.new_writer(path)?;
    matrix
        .write(&mut writer)
        .with_context(|| format!("Error writing matrix {}", path.as_ref().display()))?;
    writer.flush()?;
    Ok(())
}
