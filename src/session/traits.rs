use std::fmt;

use crate::types::Performance;

/// Outcome of a session so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    /// Cards scored.
    pub reviewed: usize,
    /// Passing scores, when the mode keeps a tally.
    pub correct: Option<usize>,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.correct {
            Some(correct) => write!(f, "Score: {correct}/{}", self.reviewed),
            None => write!(f, "Reviewed {} card(s)", self.reviewed),
        }
    }
}

/// Strategy deciding what a session tracks about each submitted score.
pub trait ScoringMode {
    fn record(&mut self, performance: Performance);
    fn summary(&self) -> SessionSummary;
}

/// Plain study: counts reviews only.
#[derive(Debug, Clone, Default)]
pub struct PlainScoring {
    reviewed: usize,
}

impl ScoringMode for PlainScoring {
    fn record(&mut self, _performance: Performance) {
        self.reviewed += 1;
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            reviewed: self.reviewed,
            correct: None,
        }
    }
}

/// Quiz: keeps a running correct/total tally, where a pass is correct.
#[derive(Debug, Clone, Default)]
pub struct CumulativeScoring {
    correct: usize,
    total: usize,
}

impl ScoringMode for CumulativeScoring {
    fn record(&mut self, performance: Performance) {
        self.total += 1;
        if performance.is_pass() {
            self.correct += 1;
        }
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            reviewed: self.total,
            correct: Some(self.correct),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_counts_passes_as_correct() {
        let mut mode = CumulativeScoring::default();
        for p in [5, 2, 3, 1] {
            mode.record(Performance::new(p).unwrap());
        }
        let summary = mode.summary();
        assert_eq!(summary, SessionSummary { reviewed: 4, correct: Some(2) });
        assert_eq!(summary.to_string(), "Score: 2/4");
    }

    #[test]
    fn plain_only_counts() {
        let mut mode = PlainScoring::default();
        mode.record(Performance::new(1).unwrap());
        assert_eq!(mode.summary().to_string(), "Reviewed 1 card(s)");
    }
}
