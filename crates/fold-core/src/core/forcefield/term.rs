use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;
use thiserror::Error;

/// The six scoring terms, in canonical reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Clash,
    Rama,
    Rotamer,
    Ss,
    Compact,
    Hbond,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Unknown score term '{0}'; expected one of clash, rama, rotamer, ss, compact, hbond")]
pub struct ParseTermError(String);

impl Term {
    pub const ALL: [Term; 6] = [
        Term::Clash,
        Term::Rama,
        Term::Rotamer,
        Term::Ss,
        Term::Compact,
        Term::Hbond,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Term::Clash => "clash",
            Term::Rama => "rama",
            Term::Rotamer => "rotamer",
            Term::Ss => "ss",
            Term::Compact => "compact",
            Term::Hbond => "hbond",
        }
    }

    /// Pair terms are evaluated per neighbouring residue and split evenly
    /// between both participants.
    pub fn is_pairwise(&self) -> bool {
        matches!(self, Term::Clash | Term::Compact | Term::Hbond)
    }

    /// `+1.0` for bonuses, `-1.0` for penalties.
    pub fn sense(&self) -> f64 {
        match self {
            Term::Hbond => 1.0,
            _ => -1.0,
        }
    }
}

impl FromStr for Term {
    type Err = ParseTermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Term::ALL
            .into_iter()
            .find(|term| term.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTermError(s.to_string()))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type Weights = BTreeMap<Term, f64>;

/// Default weight of every term.
pub const DEFAULT_TERM_WEIGHT: f64 = 1.0;

pub fn default_weights() -> Weights {
    Term::ALL
        .into_iter()
        .map(|term| (term, DEFAULT_TERM_WEIGHT))
        .collect()
}

#[inline]
pub fn weight_of(weights: &Weights, term: Term) -> f64 {
    weights.get(&term).copied().unwrap_or(DEFAULT_TERM_WEIGHT)
}

/// Raw per-term values for one residue or one structure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TermValues {
    pub clash: f64,
    pub rama: f64,
    pub rotamer: f64,
    pub ss: f64,
    pub compact: f64,
    pub hbond: f64,
}

impl TermValues {
    pub fn get(&self, term: Term) -> f64 {
        match term {
            Term::Clash => self.clash,
            Term::Rama => self.rama,
            Term::Rotamer => self.rotamer,
            Term::Ss => self.ss,
            Term::Compact => self.compact,
            Term::Hbond => self.hbond,
        }
    }

    pub fn get_mut(&mut self, term: Term) -> &mut f64 {
        match term {
            Term::Clash => &mut self.clash,
            Term::Rama => &mut self.rama,
            Term::Rotamer => &mut self.rotamer,
            Term::Ss => &mut self.ss,
            Term::Compact => &mut self.compact,
            Term::Hbond => &mut self.hbond,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Term, f64)> + '_ {
        Term::ALL.into_iter().map(move |term| (term, self.get(term)))
    }

    /// Each value multiplied by its weight, without the sign.
    pub fn weighted(&self, weights: &Weights) -> Self {
        let mut out = Self::default();
        for (term, value) in self.iter() {
            *out.get_mut(term) = value * weight_of(weights, term);
        }
        out
    }

    /// Signed sum of the values: bonuses add, penalties subtract.
    #[inline]
    pub fn signed_total(&self) -> f64 {
        self.iter().map(|(term, value)| term.sense() * value).sum()
    }

    #[inline]
    pub fn weighted_total(&self, weights: &Weights) -> f64 {
        self.weighted(weights).signed_total()
    }
}

impl Add for TermValues {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for TermValues {
    fn add_assign(&mut self, rhs: Self) {
        for term in Term::ALL {
            *self.get_mut(term) += rhs.get(term);
        }
    }
}

impl Mul<f64> for TermValues {
    type Output = Self;

    fn mul(mut self, rhs: f64) -> Self::Output {
        for term in Term::ALL {
            *self.get_mut(term) *= rhs;
        }
        self
    }
}
