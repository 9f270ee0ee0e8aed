use bit_set::BitSet;
use log::debug;

use crate::{
    align::{
        constants::{AlignmentMode, MIN_SCORE},
        data::{AlignedPair, AlignmentData, TARGET, TEMPLATE},
        gap::GapFunction,
        traceback::{Cell, Traceback, TB_DEL, TB_DIAG, TB_INS, TB_START},
    },
    error::{Error, Result},
    score::scheme::ScoringScheme,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    /// The DP matrices do not reflect the current scoring scheme.
    Stale,
    /// The DP matrices are filled, no match has been extracted.
    Built,
    /// The optimal match is recorded in the alignment data.
    Extracted,
}

/// A Gotoh style affine-gap aligner of a target (rows, `i`) against a template (columns, `j`).
///
/// `S(i,j)` is the best score of any alignment of the prefixes ending at `(i, j)`.
///
/// `I(i,j)` is the best score such that target residue `i` is aligned with a gap
/// ```ignore
///              .... A   G  x_i
///              .... G  y_j  -
/// ```
///
/// `D(i,j)` is the best score such that template residue `j` is aligned with a gap
/// ```ignore
///              .... A  x_i  -
///              .... G   G  y_j
/// ```
///
/// The four [`AlignmentMode`]s share this recurrence and differ only in how the first row and
/// column are initialized and in which cell the traceback starts.
///
/// Per-cell substitution scores are computed once per (re)build and cached, so masking cells for
/// sub-optimal alignments only repeats the recurrence.
#[allow(non_snake_case)]
#[derive(Clone, Debug)]
pub struct Aligner {
    data: Box<dyn AlignmentData>,
    gap: Box<dyn GapFunction>,
    scheme: Box<dyn ScoringScheme>,
    mode: AlignmentMode,
    /// 1-based target and template positions scored by the scheme; others score zero.
    restriction: Option<(BitSet, BitSet)>,
    scores: Vec<f64>,
    S: Vec<f64>,
    I: Vec<f64>,
    D: Vec<f64>,
    traceback: Traceback,
    /// Cells that may not be entered through a diagonal move.
    masked: BitSet,
    state: State,
    score: Option<f64>,
}

impl Aligner {
    /// Builds an aligner.  The matrices are computed on the first request for a match.
    pub fn new(
        data: Box<dyn AlignmentData>,
        gap: Box<dyn GapFunction>,
        scheme: Box<dyn ScoringScheme>,
        mode: AlignmentMode,
    ) -> Result<Self> {
        let expected = [scheme.len1(), scheme.len2()];
        for slot in [TARGET, TEMPLATE] {
            let seq = data.get_sequence(slot);
            if seq.len() != expected[slot] {
                return Err(Error::length_mismatch(data.name(slot), expected[slot], seq.len()));
            }
            if !seq.is_empty() {
                scheme.validate_sequence(data.name(slot), seq)?;
            }
        }
        Ok(Self {
            data,
            gap,
            scheme,
            mode,
            restriction: None,
            scores: Vec::new(),
            S: Vec::new(),
            I: Vec::new(),
            D: Vec::new(),
            traceback: Traceback::default(),
            masked: BitSet::new(),
            state: State::Stale,
            score: None,
        })
    }

    pub fn len1(&self) -> usize {
        self.scheme.len1()
    }

    pub fn len2(&self) -> usize {
        self.scheme.len2()
    }

    pub fn mode(&self) -> AlignmentMode {
        self.mode
    }

    pub fn data(&self) -> &dyn AlignmentData {
        self.data.as_ref()
    }

    pub fn scheme(&self) -> &dyn ScoringScheme {
        self.scheme.as_ref()
    }

    /// Builds the DP matrices over all positions.  With `update` the existing storage is reused.
    pub fn calculate_matrix(&mut self, update: bool) {
        self.restriction = None;
        self.rebuild(update);
    }

    /// Builds the DP matrices, scoring only the cells whose target position is in `v1` and whose
    /// template position is in `v2` (1-based).  Every other cell contributes a neutral zero.
    pub fn calculate_restricted_matrix(
        &mut self,
        v1: BitSet,
        v2: BitSet,
        update: bool,
    ) -> Result<()> {
        for (what, positions, len) in [("target", &v1, self.len1()), ("template", &v2, self.len2())]
        {
            if let Some(pos) = positions.iter().find(|p| *p == 0 || *p > len) {
                return Err(Error::InvalidParameter(format!(
                    "restricted {what} position {pos} is outside of 1..={len}"
                )));
            }
        }
        self.restriction = Some((v1, v2));
        self.rebuild(update);
        Ok(())
    }

    /// Rebuilds the DP matrices from the current scoring scheme, keeping any restriction.
    pub fn recalculate_matrix(&mut self) {
        let update = !self.S.is_empty();
        self.rebuild(update);
    }

    /// The optimal alignment, computing it if needed.  The match is also recorded in the data.
    pub fn get_multi_match(&mut self) -> &[AlignedPair] {
        if self.state == State::Stale {
            self.recalculate_matrix();
        }
        if self.state == State::Built {
            self.extract();
        }
        self.data.matches()
    }

    /// The score of the most recently extracted optimal alignment.
    pub fn get_score(&self) -> Result<f64> {
        match (self.state, self.score) {
            (State::Extracted, Some(score)) => Ok(score),
            _ => Err(Error::NotComputed),
        }
    }

    /// Scores of `n` sub-optimal alignments, by Waterman-Eggert declumping.
    ///
    /// Each round forbids the aligned pairs of the previous alignment (starting with the optimal
    /// one, which is not reported) and records the best remaining score.  Masks accumulate, so
    /// the scores never increase.  The optimal alignment is restored afterwards.
    pub fn generate_multi_match_score(&mut self, n: usize) -> Vec<f64> {
        let mut path = self.get_multi_match().to_vec();
        let cols = self.len2() + 1;
        let mut scores = Vec::with_capacity(n);
        for _ in 0..n {
            for pair in &path {
                if let (Some(i), Some(j)) = (pair.target, pair.template) {
                    self.masked.insert(i * cols + j);
                }
            }
            self.fill();
            let (i, j, score) = self.best_cell();
            path = self.traceback.path(i, j, false);
            scores.push(score);
        }
        debug!(
            "Generated {} sub-optimal alignments ({} cells masked)",
            n,
            self.masked.len()
        );
        self.masked.clear();
        self.fill();
        self.extract();
        scores
    }

    /// Reverses the template side of the problem in place, for the reversed control alignment.
    ///
    /// Invalidates the matrices; the next request for a match recomputes them.
    pub fn reverse(&mut self) {
        let len2 = self.len2();
        self.scheme.reverse();
        self.gap.reverse(len2);
        self.data.reverse_template();
        if let Some((_, v2)) = &mut self.restriction {
            *v2 = v2.iter().map(|j| len2 + 1 - j).collect();
        }
        self.data.clear_matches();
        self.state = State::Stale;
        self.score = None;
    }

    /// A copy of this aligner with the template side reversed.
    pub fn reversed(&self) -> Self {
        let mut aligner = self.clone();
        aligner.reverse();
        aligner
    }

    fn rebuild(&mut self, update: bool) {
        let (m, n) = (self.len1(), self.len2());
        if !update {
            let cells = (m + 1) * (n + 1);
            self.scores = Vec::with_capacity(m * n);
            self.S = Vec::with_capacity(cells);
            self.I = Vec::with_capacity(cells);
            self.D = Vec::with_capacity(cells);
            self.traceback = Traceback::with_capacity(m, n);
        }
        self.scores.clear();
        for i in 1..=m {
            for j in 1..=n {
                let live = match &self.restriction {
                    Some((v1, v2)) => v1.contains(i) && v2.contains(j),
                    None => true,
                };
                self.scores.push(if live { self.scheme.score_at(i, j) } else { 0.0 });
            }
        }
        self.masked.clear();
        self.fill();
        self.state = State::Built;
        self.score = None;
        debug!(
            "Built {} alignment matrix of {} x {}{}",
            self.mode,
            m,
            n,
            if self.restriction.is_some() { " (restricted)" } else { "" }
        );
    }

    /// Runs the recurrence over the cached per-cell scores, honoring the masked cells.
    ///
    /// Ties prefer the diagonal, then a deletion, then an insertion; gap layers prefer extending
    /// over opening; in local mode a restart wins over a continuation that is not positive.
    fn fill(&mut self) {
        let (m, n) = (self.len1(), self.len2());
        let cols = n + 1;
        let local = self.mode == AlignmentMode::Local;
        let free_ends = local || self.mode.has_free_ends();

        self.traceback.init(m, n);
        for layer in [&mut self.S, &mut self.I, &mut self.D] {
            layer.clear();
            layer.resize((m + 1) * cols, MIN_SCORE);
        }
        self.S[0] = 0.0;

        for i in 0..=m {
            for j in 0..=n {
                if i == 0 && j == 0 {
                    continue;
                }
                let idx = i * cols + j;
                let mut tb = Cell::default();
                if free_ends && (i == 0 || j == 0) {
                    self.S[idx] = 0.0;
                    self.traceback.set(i, j, tb);
                    continue;
                }

                // Insertion
                let mut best_i_score = MIN_SCORE;
                if i > 0 {
                    let extend = self.gap.extension(j);
                    let i_score = self.I[idx - cols] + extend;
                    let s_score = self.S[idx - cols] + self.gap.open(j) + extend;
                    best_i_score = i_score.max(s_score);
                    tb.set_i_extended(i_score >= s_score);
                }

                // Deletion: half of the open score on each side of the deleted run
                let mut best_d_score = MIN_SCORE;
                let mut closed_d_score = MIN_SCORE;
                if j > 0 {
                    let extend = (self.gap.extension(j - 1) + self.gap.extension(j)) / 2.0;
                    let d_score = self.D[idx - 1] + extend;
                    let s_score = self.S[idx - 1] + self.gap.open(j - 1) / 2.0 + extend;
                    best_d_score = d_score.max(s_score);
                    closed_d_score = best_d_score + self.gap.open(j) / 2.0;
                    tb.set_d_extended(d_score >= s_score);
                }

                let mut best_s_score = MIN_SCORE;
                if i > 0 && j > 0 && !self.masked.contains(idx) {
                    best_s_score = self.S[idx - cols - 1] + self.scores[(i - 1) * n + (j - 1)];
                    tb.set_s(TB_DIAG);
                }
                if closed_d_score > best_s_score {
                    best_s_score = closed_d_score;
                    tb.set_s(TB_DEL);
                }
                if best_i_score > best_s_score {
                    best_s_score = best_i_score;
                    tb.set_s(TB_INS);
                }
                if local && 0.0 >= best_s_score {
                    best_s_score = 0.0;
                    tb.set_s(TB_START);
                }

                self.S[idx] = best_s_score;
                self.I[idx] = best_i_score;
                self.D[idx] = best_d_score;
                self.traceback.set(i, j, tb);
            }
        }
    }

    /// The cell the traceback starts from, and its score.
    fn best_cell(&self) -> (usize, usize, f64) {
        let (m, n) = (self.len1(), self.len2());
        match self.mode {
            AlignmentMode::Global => (m, n, self.S[m * (n + 1) + n]),
            AlignmentMode::GlobalNoTerminalGaps => self.first_max(
                std::iter::once((m, n))
                    .chain((0..m).rev().map(|i| (i, n)))
                    .chain((0..n).rev().map(|j| (m, j))),
            ),
            AlignmentMode::FreeShift => {
                self.first_max((0..=n).map(|j| (m, j)).chain((0..m).map(|i| (i, n))))
            }
            AlignmentMode::Local => {
                self.first_max((0..=m).flat_map(|i| (0..=n).map(move |j| (i, j))))
            }
        }
    }

    fn first_max(&self, cells: impl Iterator<Item = (usize, usize)>) -> (usize, usize, f64) {
        let cols = self.len2() + 1;
        let mut best = (0, 0, MIN_SCORE);
        for (i, j) in cells {
            let score = self.S[i * cols + j];
            if score > best.2 {
                best = (i, j, score);
            }
        }
        best
    }

    fn extract(&mut self) {
        let (i, j, score) = self.best_cell();
        let path = self.traceback.path(i, j, self.mode.reports_overhangs());
        self.data.clear_matches();
        for pair in path {
            self.data.add_match(pair);
        }
        self.score = Some(score);
        self.state = State::Extracted;
    }
}
