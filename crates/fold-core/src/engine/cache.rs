use crate::core::forcefield::term::{TermValues, Weights};
use std::collections::BTreeMap;

/// Cached contribution of one residue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerResScore {
    pub terms: TermValues,
    /// Signed weighted sum of `terms`.
    pub total: f64,
    /// 1 after the first computation, bumped on every recompute.
    pub version: u64,
}

#[derive(Debug, Default, Clone)]
pub struct ScoreCache {
    data: BTreeMap<usize, PerResScore>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, residue_id: usize) -> Option<&PerResScore> {
        self.data.get(&residue_id)
    }

    /// Entries in ascending residue order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PerResScore)> {
        self.data.iter().map(|(&id, entry)| (id, entry))
    }

    /// Stores freshly computed terms, deriving the total from `weights`.
    pub fn store(&mut self, residue_id: usize, terms: TermValues, weights: &Weights) -> &PerResScore {
        let version = self.data.get(&residue_id).map_or(0, |e| e.version) + 1;
        let entry = PerResScore {
            terms,
            total: terms.weighted_total(weights),
            version,
        };
        self.data.insert(residue_id, entry);
        &self.data[&residue_id]
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
