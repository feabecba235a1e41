use super::hbond::{BackboneSite, hbond_partners};
use std::collections::BTreeSet;
use std::fmt;

pub const HELIX_PHI_RANGE: (f64, f64) = (-90.0, -30.0);
pub const HELIX_PSI_RANGE: (f64, f64) = (-80.0, -10.0);
pub const HELIX_PARTNER_OFFSETS: (usize, usize) = (3, 5);
pub const STRAND_PHI_RANGE: (f64, f64) = (-160.0, -90.0);
pub const STRAND_PSI_RANGE: (f64, f64) = (90.0, 180.0);
pub const STRAND_MIN_PARTNER_OFFSET: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SsLabel {
    Helix,
    Strand,
    Coil,
}

impl SsLabel {
    pub fn code(&self) -> char {
        match self {
            SsLabel::Helix => 'H',
            SsLabel::Strand => 'E',
            SsLabel::Coil => 'C',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'H' => Some(SsLabel::Helix),
            'E' => Some(SsLabel::Strand),
            'C' => Some(SsLabel::Coil),
            _ => None,
        }
    }

    /// Cost of failing to reproduce this label when it is the target.
    pub fn mismatch_weight(&self) -> f64 {
        match self {
            SsLabel::Helix => 1.0,
            SsLabel::Strand => 1.0,
            SsLabel::Coil => 0.0,
        }
    }
}

impl fmt::Display for SsLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[inline]
fn in_range(value: f64, (lower, upper): (f64, f64)) -> bool {
    if lower <= upper {
        (lower..=upper).contains(&value)
    } else {
        value >= lower || value <= upper
    }
}

/// Labels one residue from its torsions and its hydrogen-bond partners.
pub fn classify(site: &BackboneSite, partners: &BTreeSet<usize>) -> SsLabel {
    let (Some(phi), Some(psi)) = (site.phi, site.psi) else {
        return SsLabel::Coil;
    };
    let offset = |partner: &usize| partner.abs_diff(site.index);

    if in_range(phi, HELIX_PHI_RANGE) && in_range(psi, HELIX_PSI_RANGE) {
        let (min, max) = HELIX_PARTNER_OFFSETS;
        if partners.iter().map(offset).any(|d| (min..=max).contains(&d)) {
            return SsLabel::Helix;
        }
    } else if in_range(phi, STRAND_PHI_RANGE) && in_range(psi, STRAND_PSI_RANGE) {
        if partners.iter().map(offset).any(|d| d >= STRAND_MIN_PARTNER_OFFSET) {
            return SsLabel::Strand;
        }
    }
    SsLabel::Coil
}

/// DSSP-lite labels for `sites`, ordered by residue index.
pub fn detect_ss_labels(sites: &[BackboneSite]) -> Vec<SsLabel> {
    let partners = hbond_partners(sites);
    let mut ordered: Vec<&BackboneSite> = sites.iter().collect();
    ordered.sort_by_key(|site| site.index);

    let empty = BTreeSet::new();
    ordered
        .into_iter()
        .map(|site| classify(site, partners.get(&site.index).unwrap_or(&empty)))
        .collect()
}

pub fn labels_to_string(labels: &[SsLabel]) -> String {
    labels.iter().map(SsLabel::code).collect()
}

/// Penalty for detecting `actual` where `target` was requested.
///
/// Unrecognised target characters carry no weight.
pub fn ss_mismatch(actual: SsLabel, target: char) -> f64 {
    match SsLabel::from_code(target) {
        Some(wanted) if wanted != actual => wanted.mismatch_weight(),
        _ => 0.0,
    }
}

/// Per-position mismatch against `target`; positions beyond `labels` count as coil.
pub fn ss_mismatch_penalties(labels: &[SsLabel], target: &str) -> Vec<f64> {
    target
        .chars()
        .enumerate()
        .map(|(i, wanted)| ss_mismatch(labels.get(i).copied().unwrap_or(SsLabel::Coil), wanted))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn helix_sites(phi_values: &[f64]) -> Vec<BackboneSite> {
        phi_values
            .iter()
            .enumerate()
            .map(|(idx, &phi)| {
                let x = idx as f64;
                let o_x = if idx >= 4 { x - 4.0 } else { x + 4.0 };
                BackboneSite {
                    index: idx,
                    phi: Some(phi),
                    psi: Some(-45.0),
                    n: Some(Point3::new(x, -1.0, 0.0)),
                    h: Some(Point3::new(x, 0.0, 0.0)),
                    o: Some(Point3::new(o_x, 1.0, 0.0)),
                }
            })
            .collect()
    }

    #[test]
    fn intact_helix_is_fully_detected() {
        let labels = detect_ss_labels(&helix_sites(&[-60.0; 8]));
        assert_eq!(labels_to_string(&labels), "HHHHHHHH");
        let penalties = ss_mismatch_penalties(&labels, "HHHHHHHH");
        assert_eq!(penalties.iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn broken_helix_residue_is_charged() {
        let mut phis = [-60.0; 8];
        phis[3] = 20.0;
        let labels = detect_ss_labels(&helix_sites(&phis));
        assert_eq!(labels[3], SsLabel::Coil);
        let penalties = ss_mismatch_penalties(&labels, "HHHHHHHH");
        assert_eq!(penalties[3], 1.0);
        assert_eq!(penalties.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn helix_torsions_without_partners_are_coil() {
        let site = BackboneSite {
            index: 0,
            phi: Some(-60.0),
            psi: Some(-45.0),
            ..Default::default()
        };
        assert_eq!(classify(&site, &BTreeSet::new()), SsLabel::Coil);
    }

    #[test]
    fn strand_needs_extended_torsions_and_distant_partner() {
        let site = BackboneSite {
            index: 5,
            phi: Some(-120.0),
            psi: Some(130.0),
            ..Default::default()
        };
        assert_eq!(classify(&site, &BTreeSet::from([9])), SsLabel::Strand);
        assert_eq!(classify(&site, &BTreeSet::from([4])), SsLabel::Coil);
    }

    #[test]
    fn missing_torsions_yield_coil() {
        let site = BackboneSite {
            index: 2,
            phi: None,
            psi: Some(-45.0),
            ..Default::default()
        };
        assert_eq!(classify(&site, &BTreeSet::from([5])), SsLabel::Coil);
    }

    #[test]
    fn labels_are_sorted_by_residue_index() {
        let mut sites = helix_sites(&[-60.0; 8]);
        sites.reverse();
        sites[0].phi = Some(20.0);
        let labels = detect_ss_labels(&sites);
        assert_eq!(labels_to_string(&labels), "HHHHHHHC");
    }

    #[test]
    fn positions_beyond_detected_labels_count_as_coil() {
        let penalties = ss_mismatch_penalties(&[SsLabel::Helix], "HEC");
        assert_eq!(penalties, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn coil_and_unknown_targets_are_free() {
        assert_eq!(ss_mismatch(SsLabel::Helix, 'C'), 0.0);
        assert_eq!(ss_mismatch(SsLabel::Helix, '-'), 0.0);
        assert_eq!(ss_mismatch(SsLabel::Coil, 'e'), 1.0);
    }
}
