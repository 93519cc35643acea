//! The single-line per-residue quality format used for CASP QA submissions.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

pub const DEFAULT_WRAP: usize = 20;

#[derive(Debug, Error, PartialEq)]
pub enum CaspLineError {
    #[error("Title not specified")]
    MissingTitle,
    #[error("Invalid global score {0}: must lie in [0, 1]")]
    InvalidGlobalScore(f64),
    #[error("Invalid sequence length: must be at least 1")]
    InvalidSequenceLength,
    #[error("Invalid completeness threshold {0}: must lie in [0, 1]")]
    InvalidCompletenessThreshold(f64),
}

/// One CASP QA line: a title, a global score and one value (or `X`) per residue.
#[derive(Debug, Clone, PartialEq)]
pub struct CaspQaLine {
    pub title: String,
    pub global_score: f64,
    pub sequence_length: usize,
    /// The global score is multiplied by completeness when completeness falls below this.
    pub scale_by_completeness: f64,
    /// Residues per tab-separated block; values of 0 or 1 disable wrapping.
    pub wrap: usize,
    residue_scores: BTreeMap<usize, f64>,
}

impl CaspQaLine {
    pub fn new(title: impl Into<String>, global_score: f64, sequence_length: usize) -> Self {
        Self {
            title: title.into(),
            global_score,
            sequence_length,
            scale_by_completeness: 1.0,
            wrap: DEFAULT_WRAP,
            residue_scores: BTreeMap::new(),
        }
    }

    pub fn scale_by_completeness(mut self, threshold: f64) -> Self {
        self.scale_by_completeness = threshold;
        self
    }

    pub fn wrap(mut self, wrap: usize) -> Self {
        self.wrap = wrap;
        self
    }

    /// Records residue scores keyed by residue number.
    ///
    /// Numbers outside `1..=sequence_length` are ignored; a later value for the same residue
    /// replaces an earlier one.
    pub fn residue_scores<I>(mut self, scores: I) -> Self
    where
        I: IntoIterator<Item = (i64, f64)>,
    {
        for (number, value) in scores {
            if let Ok(n) = usize::try_from(number) {
                if n >= 1 && n <= self.sequence_length {
                    self.residue_scores.insert(n, value);
                }
            }
        }
        self
    }

    /// Fraction of residues `1..=sequence_length` that carry a score.
    pub fn completeness(&self) -> f64 {
        if self.sequence_length == 0 {
            return 0.0;
        }
        self.residue_scores.len() as f64 / self.sequence_length as f64
    }

    pub fn rescaled_global_score(&self) -> f64 {
        let completeness = self.completeness();
        if completeness < self.scale_by_completeness {
            self.global_score * completeness
        } else {
            self.global_score
        }
    }

    fn validate(&self) -> Result<(), CaspLineError> {
        if self.title.is_empty() {
            return Err(CaspLineError::MissingTitle);
        }
        if !(0.0..=1.0).contains(&self.global_score) {
            return Err(CaspLineError::InvalidGlobalScore(self.global_score));
        }
        if self.sequence_length < 1 {
            return Err(CaspLineError::InvalidSequenceLength);
        }
        if !(0.0..=1.0).contains(&self.scale_by_completeness) {
            return Err(CaspLineError::InvalidCompletenessThreshold(
                self.scale_by_completeness,
            ));
        }
        Ok(())
    }

    /// Renders the newline-terminated line.
    ///
    /// # Errors
    ///
    /// Fails on an empty title, a global score or threshold outside `[0, 1]`, or a zero
    /// sequence length.
    pub fn render(&self) -> Result<String, CaspLineError> {
        self.validate()?;

        let mut line = format!("{} {:.3}", self.title, self.rescaled_global_score());
        for i in 1..=self.sequence_length {
            let separator = if self.wrap > 1 && i > 1 && (i - 1) % self.wrap == 0 {
                '\t'
            } else {
                ' '
            };
            line.push(separator);
            match self.residue_scores.get(&i) {
                Some(value) => {
                    let _ = write!(line, "{value:.2}");
                }
                None => line.push('X'),
            }
        }
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_scores_and_gaps_with_space_separators() {
        let line = CaspQaLine::new("T1000TS001_1", 0.51234, 4)
            .residue_scores([(1, 0.5), (2, 0.756), (4, 1.0)])
            .render()
            .unwrap();

        assert_eq!(line, "T1000TS001_1 0.512 0.50 0.76 X 1.00\n");
    }

    #[test]
    fn inserts_a_tab_at_each_wrap_boundary() {
        let line = CaspQaLine::new("M", 0.4, 7)
            .wrap(3)
            .residue_scores((1..=7).map(|i| (i, 0.1)))
            .render()
            .unwrap();

        assert_eq!(line, "M 0.400 0.10 0.10 0.10\t0.10 0.10 0.10\t0.10\n");
    }

    #[test]
    fn wrap_of_one_never_inserts_tabs() {
        let line = CaspQaLine::new("M", 0.4, 3).wrap(1).render().unwrap();
        assert_eq!(line, "M 0.400 X X X\n");
    }

    #[test]
    fn global_score_is_scaled_below_the_completeness_threshold() {
        let partial = CaspQaLine::new("M", 0.8, 4)
            .scale_by_completeness(0.85)
            .residue_scores([(1, 0.2), (2, 0.3), (3, 0.4)]);

        assert_eq!(partial.completeness(), 0.75);
        assert!((partial.rescaled_global_score() - 0.6).abs() < 1e-12);
        assert!(partial.render().unwrap().starts_with("M 0.600 "));

        let complete = partial.clone().residue_scores([(4, 0.5)]);
        assert_eq!(complete.rescaled_global_score(), 0.8);
    }

    #[test]
    fn residues_outside_the_sequence_are_ignored() {
        let line = CaspQaLine::new("M", 1.0, 2).residue_scores([(0, 0.9), (3, 0.9), (-4, 0.9)]);

        assert_eq!(line.completeness(), 0.0);
        assert_eq!(line.render().unwrap(), "M 1.000 X X\n");
    }

    #[test]
    fn rejects_invalid_headers() {
        assert_eq!(
            CaspQaLine::new("", 0.5, 3).render(),
            Err(CaspLineError::MissingTitle)
        );
        assert_eq!(
            CaspQaLine::new("M", 1.5, 3).render(),
            Err(CaspLineError::InvalidGlobalScore(1.5))
        );
        assert_eq!(
            CaspQaLine::new("M", 0.5, 0).render(),
            Err(CaspLineError::InvalidSequenceLength)
        );
        assert_eq!(
            CaspQaLine::new("M", 0.5, 3).scale_by_completeness(-0.1).render(),
            Err(CaspLineError::InvalidCompletenessThreshold(-0.1))
        );
    }
}
