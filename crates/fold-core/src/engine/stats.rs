use crate::core::forcefield::term::Term;

/// Diagnostic evaluation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreStats {
    calls: [u64; Term::ALL.len()],
    pub full_passes: u64,
    pub incremental_passes: u64,
}

impl ScoreStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&mut self, term: Term, count: u64) {
        self.calls[term as usize] += count;
    }

    pub fn calls(&self, term: Term) -> u64 {
        self.calls[term as usize]
    }

    pub fn total_calls(&self) -> u64 {
        self.calls.iter().sum()
    }

    /// Adds the per-term counts of `other`; pass counters are left alone.
    pub fn absorb_calls(&mut self, other: &ScoreStats) {
        for term in Term::ALL {
            self.record(term, other.calls(term));
        }
    }
}
