use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::alphabet::is_secondary_structure,
};

/// Slot of the target (row) sequence.
pub const TARGET: usize = 0;
/// Slot of the template (column) sequence.
pub const TEMPLATE: usize = 1;

const GAP: u8 = b'-';

/// One column of an alignment: a pair of 1-based residue positions, `None` meaning a gap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlignedPair {
    pub target: Option<usize>,
    pub template: Option<usize>,
}

impl AlignedPair {
    pub fn aligned(target: usize, template: usize) -> Self {
        Self { target: Some(target), template: Some(template) }
    }

    /// A target residue aligned against a gap in the template.
    pub fn insertion(target: usize) -> Self {
        Self { target: Some(target), template: None }
    }

    /// A template residue aligned against a gap in the target.
    pub fn deletion(template: usize) -> Self {
        Self { target: None, template: Some(template) }
    }

    pub fn is_aligned(&self) -> bool {
        self.target.is_some() && self.template.is_some()
    }

    fn operation(&self) -> char {
        match (self.target, self.template) {
            (Some(_), Some(_)) => 'M',
            (Some(_), None) => 'I',
            _ => 'D',
        }
    }
}

impl fmt::Display for AlignedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: Option<usize>| p.map_or_else(|| "-".to_string(), |p| p.to_string());
        write!(f, "({}, {})", show(self.target), show(self.template))
    }
}

/// Holds the two sequences of an alignment problem and the most recently recorded match.
///
/// The aligner writes the match here in N to C order, one [`AlignedPair`] per alignment column.
pub trait AlignmentData: fmt::Debug + Send + Sync {
    /// The number of sequence slots.
    fn size(&self) -> usize;

    fn get_sequence(&self, slot: usize) -> &[u8];

    /// The secondary structure of the sequence in `slot`, when known.
    fn get_secondary(&self, _slot: usize) -> Option<&[u8]> {
        None
    }

    fn name(&self, slot: usize) -> &str;

    fn matches(&self) -> &[AlignedPair];

    fn clear_matches(&mut self);

    fn add_match(&mut self, pair: AlignedPair);

    /// Reverses the template sequence and its secondary structure in place.
    fn reverse_template(&mut self);

    fn box_clone(&self) -> Box<dyn AlignmentData>;

    /// The target and template rows of the recorded match, with `-` for gaps.
    fn aligned_rows(&self) -> [Vec<u8>; 2] {
        gapped_rows(self.matches(), self.get_sequence(TARGET), self.get_sequence(TEMPLATE))
    }

    /// The number of aligned columns with identical residues.
    fn identities(&self) -> usize {
        let [target, template] = self.aligned_rows();
        target
            .iter()
            .zip(template.iter())
            .filter(|(a, b)| **a != GAP && a.eq_ignore_ascii_case(b))
            .count()
    }

    /// The recorded match as a CIGAR-like string, target relative to template.
    fn cigar(&self) -> String {
        self.matches()
            .iter()
            .group_by(|pair| pair.operation())
            .into_iter()
            .map(|(op, group)| format!("{}{}", group.count(), op))
            .collect()
    }

    /// Renders the recorded match in blocks of `width` columns.
    fn format_match(&self, width: usize) -> String {
        let width = width.max(1);
        let [target, template] = self.aligned_rows();
        let secondary = match (self.get_secondary(TARGET), self.get_secondary(TEMPLATE)) {
            (Some(sec1), Some(sec2)) => Some(gapped_rows(self.matches(), sec1, sec2)),
            _ => None,
        };
        let name_width = self.name(TARGET).len().max(self.name(TEMPLATE).len());
        let mut next = [1usize, 1usize];
        let mut out = String::new();
        for start in (0..target.len()).step_by(width) {
            let end = (start + width).min(target.len());
            let block = &self.matches()[start..end];
            let [target_span, template_span] = [TARGET, TEMPLATE].map(|slot| {
                let positions = block.iter().filter_map(|pair| {
                    if slot == TARGET {
                        pair.target
                    } else {
                        pair.template
                    }
                });
                let (first, last) = positions.fold((None, None), |(first, _), p| {
                    (first.or(Some(p)), Some(p))
                });
                let span = (first.unwrap_or(next[slot]), last.unwrap_or(next[slot] - 1));
                next[slot] = span.1 + 1;
                span
            });
            let identity: String = target[start..end]
                .iter()
                .zip(template[start..end].iter())
                .map(|(a, b)| if *a != GAP && a.eq_ignore_ascii_case(b) { '|' } else { ' ' })
                .collect();
            let pad = " ".repeat(name_width + 8);
            if let Some([sec1, _]) = &secondary {
                out.push_str(&format!("{pad}{}\n", String::from_utf8_lossy(&sec1[start..end])));
            }
            out.push_str(&format!(
                "{:<name_width$} {:>6} {} {}\n",
                self.name(TARGET),
                target_span.0,
                String::from_utf8_lossy(&target[start..end]),
                target_span.1
            ));
            out.push_str(&format!("{pad}{identity}\n"));
            out.push_str(&format!(
                "{:<name_width$} {:>6} {} {}\n",
                self.name(TEMPLATE),
                template_span.0,
                String::from_utf8_lossy(&template[start..end]),
                template_span.1
            ));
            if let Some([_, sec2]) = &secondary {
                out.push_str(&format!("{pad}{}\n", String::from_utf8_lossy(&sec2[start..end])));
            }
            out.push('\n');
        }
        out
    }
}

impl Clone for Box<dyn AlignmentData> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

fn gapped_rows(matches: &[AlignedPair], row1: &[u8], row2: &[u8]) -> [Vec<u8>; 2] {
    let symbol = |row: &[u8], p: Option<usize>| p.map_or(GAP, |p| row[p - 1]);
    let first = matches.iter().map(|pair| symbol(row1, pair.target)).collect();
    let second = matches.iter().map(|pair| symbol(row2, pair.template)).collect();
    [first, second]
}

/// A target and a template sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceData {
    names: [String; 2],
    sequences: [Vec<u8>; 2],
    matches: Vec<AlignedPair>,
}

impl SequenceData {
    pub fn new(target: &[u8], template: &[u8]) -> Self {
        Self::with_names("target", target, "template", template)
    }

    pub fn with_names(
        target_name: &str,
        target: &[u8],
        template_name: &str,
        template: &[u8],
    ) -> Self {
        Self {
            names: [target_name.to_string(), template_name.to_string()],
            sequences: [target.to_ascii_uppercase(), template.to_ascii_uppercase()],
            matches: Vec::new(),
        }
    }
}

impl AlignmentData for SequenceData {
    fn size(&self) -> usize {
        self.sequences.len()
    }

    fn get_sequence(&self, slot: usize) -> &[u8] {
        &self.sequences[slot]
    }

    fn name(&self, slot: usize) -> &str {
        &self.names[slot]
    }

    fn matches(&self) -> &[AlignedPair] {
        &self.matches
    }

    fn clear_matches(&mut self) {
        self.matches.clear();
    }

    fn add_match(&mut self, pair: AlignedPair) {
        self.matches.push(pair);
    }

    fn reverse_template(&mut self) {
        self.sequences[TEMPLATE].reverse();
    }

    fn box_clone(&self) -> Box<dyn AlignmentData> {
        Box::new(self.clone())
    }
}

/// A target and a template sequence, each with its secondary structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecSequenceData {
    sequences: SequenceData,
    secondary: [Vec<u8>; 2],
}

impl SecSequenceData {
    pub fn new(sequences: SequenceData, target_sec: &[u8], template_sec: &[u8]) -> Result<Self> {
        for (slot, sec) in [(TARGET, target_sec), (TEMPLATE, template_sec)] {
            let what = format!("secondary structure of {}", sequences.name(slot));
            if sec.len() != sequences.get_sequence(slot).len() {
                return Err(Error::length_mismatch(
                    &what,
                    sequences.get_sequence(slot).len(),
                    sec.len(),
                ));
            }
            if let Some(offset) = sec.iter().position(|s| !is_secondary_structure(*s)) {
                return Err(Error::illegal_symbol(&what, sec[offset], offset));
            }
        }
        Ok(Self { sequences, secondary: [target_sec.to_vec(), template_sec.to_vec()] })
    }
}

impl AlignmentData for SecSequenceData {
    fn size(&self) -> usize {
        self.sequences.size()
    }

    fn get_sequence(&self, slot: usize) -> &[u8] {
        self.sequences.get_sequence(slot)
    }

    fn get_secondary(&self, slot: usize) -> Option<&[u8]> {
        Some(&self.secondary[slot])
    }

    fn name(&self, slot: usize) -> &str {
        self.sequences.name(slot)
    }

    fn matches(&self) -> &[AlignedPair] {
        self.sequences.matches()
    }

    fn clear_matches(&mut self) {
        self.sequences.clear_matches();
    }

    fn add_match(&mut self, pair: AlignedPair) {
        self.sequences.add_match(pair);
    }

    fn reverse_template(&mut self) {
        self.sequences.reverse_template();
        self.secondary[TEMPLATE].reverse();
    }

    fn box_clone(&self) -> Box<dyn AlignmentData> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
pub mod tests {
    use rstest::rstest;

    use super::*;

    fn recorded(target: &[u8], template: &[u8], pairs: &[AlignedPair]) -> SequenceData {
        let mut data = SequenceData::new(target, template);
        for pair in pairs {
            data.add_match(*pair);
        }
        data
    }

    #[rstest]
    fn test_pair_display() {
        assert_eq!(AlignedPair::aligned(1, 2).to_string(), "(1, 2)");
        assert_eq!(AlignedPair::insertion(3).to_string(), "(3, -)");
        assert_eq!(AlignedPair::deletion(4).to_string(), "(-, 4)");
    }

    #[rstest]
    fn test_aligned_rows_and_cigar() {
        let data = recorded(
            b"acdg",
            b"ACEFG",
            &[
                AlignedPair::aligned(1, 1),
                AlignedPair::aligned(2, 2),
                AlignedPair::insertion(3),
                AlignedPair::deletion(3),
                AlignedPair::deletion(4),
                AlignedPair::aligned(4, 5),
            ],
        );
        let [target, template] = data.aligned_rows();
        assert_eq!(target, b"ACD--G".to_vec());
        assert_eq!(template, b"AC-EFG".to_vec());
        assert_eq!(data.cigar(), "2M1I2D1M");
        assert_eq!(data.identities(), 3);
    }

    #[rstest]
    fn test_clear_matches() {
        let mut data = recorded(b"A", b"A", &[AlignedPair::aligned(1, 1)]);
        data.clear_matches();
        assert!(data.matches().is_empty());
        assert_eq!(data.cigar(), "");
        assert_eq!(data.format_match(60), "");
    }

    #[rstest]
    fn test_format_match_wraps_blocks() {
        let data = recorded(
            b"ACDE",
            b"ACE",
            &[
                AlignedPair::aligned(1, 1),
                AlignedPair::aligned(2, 2),
                AlignedPair::insertion(3),
                AlignedPair::aligned(4, 3),
            ],
        );
        let expected = [
            "target        1 AC 2",
            "                ||",
            "template      1 AC 2",
            "",
            "target        3 DE 4",
            "                 |",
            "template      3 -E 3",
            "",
            "",
        ]
        .join("\n");
        assert_eq!(data.format_match(2), expected);
    }

    #[rstest]
    fn test_secondary_rows_are_rendered() {
        let mut data =
            SecSequenceData::new(SequenceData::new(b"AC", b"AC"), b"HE", b"CC").unwrap();
        data.add_match(AlignedPair::aligned(1, 1));
        data.add_match(AlignedPair::aligned(2, 2));
        let lines = data.format_match(60).lines().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0].trim(), "HE");
        assert_eq!(lines[4].trim(), "CC");
    }

    #[rstest]
    #[case(b"HE".as_slice(), b"C".as_slice())]
    #[case(b"HX".as_slice(), b"CC".as_slice())]
    fn test_secondary_data_is_validated(#[case] sec1: &[u8], #[case] sec2: &[u8]) {
        assert!(SecSequenceData::new(SequenceData::new(b"AC", b"AC"), sec1, sec2).is_err());
    }

    #[rstest]
    fn test_reverse_template() {
        let mut data =
            SecSequenceData::new(SequenceData::new(b"ACD", b"KLM"), b"HEC", b"HCE").unwrap();
        data.reverse_template();
        assert_eq!(data.get_sequence(TARGET), b"ACD");
        assert_eq!(data.get_sequence(TEMPLATE), b"MLK");
        assert_eq!(data.get_secondary(TEMPLATE), Some(b"ECH".as_slice()));
        data.reverse_template();
        assert_eq!(data.get_sequence(TEMPLATE), b"KLM");
        assert_eq!(data.get_secondary(TEMPLATE), Some(b"HCE".as_slice()));
    }

    #[rstest]
    fn test_format_single_column() {
        let data = recorded(b"A", b"A", &[AlignedPair::aligned(1, 1)]);
        let expected = "target        1 A 1\n                |\ntemplate      1 A 1\n\n";
        assert_eq!(data.format_match(60), expected);
    }

    #[rstest]
    fn test_boxed_clone_is_independent() {
        let data: Box<dyn AlignmentData> = Box::new(SequenceData::new(b"AC", b"AC"));
        let mut copy = data.clone();
        copy.add_match(AlignedPair::aligned(1, 1));
        assert!(data.matches().is_empty());
        assert_eq!(copy.matches().len(), 1);
    }
}
