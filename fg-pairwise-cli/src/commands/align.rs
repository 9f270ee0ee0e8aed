use super::command::{Command, ValueEnum};
use anyhow::{Context, Result};
use clap::{
    builder::{PossibleValuesParser, TypedValueParser as _},
    Parser,
};
use log::info;
use pairwise::{
    align::{AlignmentData, AlignmentMode, Builder, SequenceData},
    score::{scheme::SequenceScoring, SubstitutionMatrix},
    util::{
        io::{read_fasta, read_matrix, NamedSequence},
        version::built_info,
    },
};
use proglog::{CountFormatterKind, ProgLogBuilder};
use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

impl ValueEnum for AlignmentMode {
    fn variants<'a>() -> &'a [Self] {
        &[
            Self::Global,
            Self::GlobalNoTerminalGaps,
            Self::FreeShift,
            Self::Local,
        ]
    }
}

/// Aligns a target protein sequence against each template of a FASTA library.
///
/// The first record of `--target` is aligned against every record of `--templates` with affine
/// gap penalties.  For each template the alignment is printed in blocks of `--width` columns,
/// followed by its score.
///
/// ## Z-scores
///
/// With `--z-score N` (N > 0) the significance of each alignment is estimated by aligning the
/// target against the reversed template and collecting N sub-optimal alignment scores of that
/// control.  The reported Z-score is the distance of the forward score from the mean of the
/// control scores, in standard deviations (at least one).
#[derive(Parser, Debug, Clone)]
#[clap(version = built_info::VERSION.as_str(), term_width=0)]
pub struct Align {
    /// The path to the FASTA with the target sequence (only the first record is used).
    #[clap(long, short = 't', display_order = 1)]
    target: PathBuf,

    /// The path to the FASTA with the template sequences.
    #[clap(long, short = 'T', display_order = 2)]
    templates: PathBuf,

    /// The path to a substitution matrix file, otherwise BLOSUM62 is used.
    #[clap(long, short = 'M', display_order = 3)]
    matrix: Option<PathBuf>,

    /// The alignment mode:
    /// - global: aligns the full target versus the full template.
    /// - global-no-terminal-gaps: global, but gaps at either end are free.
    /// - free-shift: aligns a sub-sequence of one versus the other, overhangs are free.
    /// - local: aligns a sub-sequence of the target versus a sub-sequence of the template.
    #[clap(
        long,
        short = 'm',
        value_parser = PossibleValuesParser::new(AlignmentMode::possible_values())
            .map(|s| s.parse::<AlignmentMode>().unwrap()),
        default_value_t = AlignmentMode::Global,
        ignore_case = true,
        display_order = 4,
        verbatim_doc_comment
    )]
    mode: AlignmentMode,

    /// Score for a gap open (must not be positive)
    #[clap(
        long,
        short = 'O',
        default_value = "-10",
        allow_hyphen_values = true,
        display_order = 5
    )]
    gap_open: f64,

    /// Score for a gap extend (must not be positive); a gap of size k costs '{O} + {E}*k'
    #[clap(
        long,
        short = 'E',
        default_value = "-1",
        allow_hyphen_values = true,
        display_order = 6
    )]
    gap_extend: f64,

    /// The number of reversed-template alignments used for the Z-score, zero to disable.
    #[clap(long, short = 'z', default_value = "0", display_order = 7)]
    z_score: usize,

    /// The number of alignment columns per output line.
    #[clap(long, short = 'w', default_value = "60", display_order = 8)]
    width: usize,
}

impl Align {
    /// Executes the align command
    pub fn execute(&self) -> anyhow::Result<()> {
        info!("Starting alignment...");
        info!("Reading target FASTA from {}", self.target.display());
        let target = read_fasta(&self.target)?
            .into_iter()
            .next()
            .context("missing target sequence")?;
        info!("Reading templates FASTA from {}", self.templates.display());
        let templates = read_fasta(&self.templates)?;
        let matrix = Arc::new(match &self.matrix {
            Some(path) => {
                info!("Reading substitution matrix from {}", path.display());
                read_matrix(path)?
            }
            None => SubstitutionMatrix::blosum62(),
        });

        let mut builder = Builder::default();
        builder
            .mode(self.mode)
            .gap_open(self.gap_open)
            .gap_extend(self.gap_extend);
        if self.z_score > 0 {
            builder.ensemble_size(self.z_score);
        }

        let progress_logger = ProgLogBuilder::new()
            .name("pairwise-progress")
            .noun("templates")
            .verb("Aligned")
            .unit(100)
            .count_formatter(CountFormatterKind::Comma)
            .build();

        let mut writer = io::stdout().lock();
        for template in &templates {
            let report = self
                .align_one(&builder, &matrix, &target, template)
                .with_context(|| format!("Failed to align template {}", template.name))?;
            writer.write_all(report.as_bytes())?;
            writer.flush()?;
            progress_logger.record();
        }
        info!("Aligned {} against {} templates", target.name, templates.len());
        Ok(())
    }

    /// Aligns the target against one template and renders the alignment, score and Z-score.
    fn align_one(
        &self,
        builder: &Builder,
        matrix: &Arc<SubstitutionMatrix>,
        target: &NamedSequence,
        template: &NamedSequence,
    ) -> Result<String> {
        let data = Box::new(SequenceData::with_names(
            &target.name,
            &target.seq,
            &template.name,
            &template.seq,
        ));
        let scheme = Box::new(SequenceScoring::new(
            Arc::clone(matrix),
            &target.seq,
            &template.seq,
        )?);

        let (rendered, score, z_score) = if self.z_score > 0 {
            let mut scorer = builder.build_reverse_score(data, scheme)?;
            let z_score = scorer.get_z_score()?;
            let forward = scorer.forward();
            (forward.data().format_match(self.width), forward.get_score()?, Some(z_score))
        } else {
            let mut aligner = builder.build_aligner(data, scheme)?;
            aligner.get_multi_match();
            (aligner.data().format_match(self.width), aligner.get_score()?, None)
        };

        let mut report = format!("# {} vs {}\n", target.name, template.name);
        report.push_str(&rendered);
        report.push_str(&format!("score: {score:.3}\n"));
        if let Some(z_score) = z_score {
            report.push_str(&format!("z-score: {z_score:.3}\n"));
        }
        report.push('\n');
        Ok(report)
    }
}

impl Command for Align {
    fn execute(&self) -> anyhow::Result<()> {
        Align::execute(self)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::Align;
    use pairwise::align::AlignmentMode;

    /// Check that the argument parser works
    #[rstest]
    fn test_parse() {
        let align = Align::parse_from(["align", "-t", ".", "-T", "."]);
        assert_eq!(align.mode, AlignmentMode::Global);
        assert_eq!(align.z_score, 0);
    }

    #[rstest]
    fn test_parse_mode_and_gaps() {
        let align = Align::parse_from([
            "align",
            "-t",
            ".",
            "-T",
            ".",
            "--mode",
            "Free-Shift",
            "--gap-open",
            "-8",
            "--gap-extend",
            "-0.5",
            "--z-score",
            "20",
        ]);
        assert_eq!(align.mode, AlignmentMode::FreeShift);
        assert_eq!(align.gap_open, -8.0);
        assert_eq!(align.gap_extend, -0.5);
        assert_eq!(align.z_score, 20);
    }
}
