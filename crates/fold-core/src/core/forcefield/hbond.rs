use crate::core::utils::geometry::bond_angle;
use nalgebra::{Point3, distance};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub const HBOND_MAX_DISTANCE: f64 = 3.0;
pub const HBOND_MIN_ANGLE: f64 = 120.0;
pub const HBOND_GAMMA: f64 = 1.0;
pub const HBOND_RESIDUE_CAP: usize = 2;

/// Backbone torsions and hydrogen-bonding atoms of one residue.
///
/// A residue acts as a donor when both `n` and `h` are present and as an
/// acceptor when `o` is present.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BackboneSite {
    pub index: usize,
    pub phi: Option<f64>,
    pub psi: Option<f64>,
    pub n: Option<Point3<f64>>,
    pub h: Option<Point3<f64>>,
    pub o: Option<Point3<f64>>,
}

impl BackboneSite {
    pub fn donor(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        Some((self.n?, self.h?))
    }
}

/// Distance between H and the acceptor at most 3.0 Å and D-H-A angle at least 120°.
pub fn is_hbond(donor: &Point3<f64>, hydrogen: &Point3<f64>, acceptor: &Point3<f64>) -> bool {
    distance(hydrogen, acceptor) <= HBOND_MAX_DISTANCE
        && bond_angle(donor, hydrogen, acceptor) >= HBOND_MIN_ANGLE
}

fn donates_to(donor_site: &BackboneSite, acceptor_site: &BackboneSite) -> bool {
    match (donor_site.donor(), acceptor_site.o) {
        (Some((n, h)), Some(o)) => is_hbond(&n, &h, &o),
        _ => false,
    }
}

/// True when either residue donates a hydrogen bond to the other.
pub fn pair_hbond_formed(a: &BackboneSite, b: &BackboneSite) -> bool {
    a.index != b.index && (donates_to(a, b) || donates_to(b, a))
}

/// Symmetric partner map over every qualifying donor/acceptor pair.
///
/// Every site gets an entry, possibly empty.
pub fn hbond_partners(sites: &[BackboneSite]) -> BTreeMap<usize, BTreeSet<usize>> {
    let mut partners: BTreeMap<usize, BTreeSet<usize>> =
        sites.iter().map(|site| (site.index, BTreeSet::new())).collect();

    for donor in sites {
        for acceptor in sites {
            if donor.index == acceptor.index || !donates_to(donor, acceptor) {
                continue;
            }
            partners.entry(donor.index).or_default().insert(acceptor.index);
            partners.entry(acceptor.index).or_default().insert(donor.index);
        }
    }
    partners
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HbondBonus {
    pub total: f64,
    pub per_residue: BTreeMap<usize, f64>,
}

/// Hydrogen-bond bonus over a set of residues.
///
/// Each unordered residue pair is counted once and each residue takes part in
/// at most `per_residue_cap` counted bonds. A counted bond adds `gamma` to the
/// total and `gamma / 2` to both participants.
pub fn hbond_bonus(sites: &[BackboneSite], gamma: f64, per_residue_cap: usize) -> HbondBonus {
    if gamma <= 0.0 || per_residue_cap == 0 {
        return HbondBonus::default();
    }

    let donors: Vec<&BackboneSite> = sites.iter().filter(|s| s.donor().is_some()).collect();
    let acceptors: Vec<&BackboneSite> = sites.iter().filter(|s| s.o.is_some()).collect();
    if donors.is_empty() || acceptors.is_empty() {
        return HbondBonus::default();
    }

    let mut counts: HashMap<usize, usize> = HashMap::new();
    let mut seen_pairs: HashSet<(usize, usize)> = HashSet::new();
    let mut bonus = HbondBonus::default();

    for donor in &donors {
        for acceptor in &acceptors {
            if donor.index == acceptor.index {
                continue;
            }
            let key = (
                donor.index.min(acceptor.index),
                donor.index.max(acceptor.index),
            );
            if seen_pairs.contains(&key) {
                continue;
            }
            let at_cap = |idx: usize| counts.get(&idx).copied().unwrap_or(0) >= per_residue_cap;
            if at_cap(donor.index) || at_cap(acceptor.index) {
                continue;
            }
            if !donates_to(donor, acceptor) {
                continue;
            }

            seen_pairs.insert(key);
            *counts.entry(donor.index).or_default() += 1;
            *counts.entry(acceptor.index).or_default() += 1;

            let share = 0.5 * gamma;
            *bonus.per_residue.entry(donor.index).or_default() += share;
            *bonus.per_residue.entry(acceptor.index).or_default() += share;
            bonus.total += gamma;
        }
    }
    bonus
}
