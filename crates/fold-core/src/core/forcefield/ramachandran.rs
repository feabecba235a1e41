use super::error::TermError;
use super::potentials::wrap_angle;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const RAMA_BIN_SIZE: f64 = 10.0;
pub const RAMA_BIN_COUNT: usize = 36;
pub const RAMA_MAX_PENALTY: f64 = 10.0;
pub const RAMA_MIN_PROBABILITY: f64 = 1.0e-6;

/// Torsion statistics class used to pick a Ramachandran table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RamaClass {
    General,
    Glycine,
    Proline,
}

impl RamaClass {
    const VALID_NAMES: &'static str = "general, gly, pro";

    pub fn name(&self) -> &'static str {
        match self {
            RamaClass::General => "general",
            RamaClass::Glycine => "gly",
            RamaClass::Proline => "pro",
        }
    }

    // (phi0, psi0, sigma_phi, sigma_psi, weight)
    fn components(&self) -> &'static [(f64, f64, f64, f64, f64)] {
        match self {
            RamaClass::General => &[
                (-60.0, -40.0, 22.0, 18.0, 0.55),
                (-120.0, 130.0, 25.0, 22.0, 0.35),
                (60.0, 40.0, 18.0, 20.0, 0.20),
            ],
            RamaClass::Glycine => &[
                (-80.0, 0.0, 25.0, 22.0, 0.45),
                (80.0, 0.0, 25.0, 20.0, 0.45),
                (-150.0, 150.0, 28.0, 24.0, 0.30),
            ],
            RamaClass::Proline => &[(-65.0, 140.0, 18.0, 18.0, 0.60), (-80.0, -35.0, 16.0, 20.0, 0.25)],
        }
    }

    fn table(&self) -> &'static RamaTable {
        static GENERAL: OnceLock<RamaTable> = OnceLock::new();
        static GLYCINE: OnceLock<RamaTable> = OnceLock::new();
        static PROLINE: OnceLock<RamaTable> = OnceLock::new();

        let cell = match self {
            RamaClass::General => &GENERAL,
            RamaClass::Glycine => &GLYCINE,
            RamaClass::Proline => &PROLINE,
        };
        cell.get_or_init(|| RamaTable::from_components(self.components()))
    }
}

impl FromStr for RamaClass {
    type Err = TermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(RamaClass::General),
            "gly" | "glycine" => Ok(RamaClass::Glycine),
            "pro" | "proline" => Ok(RamaClass::Proline),
            _ => Err(TermError::UnknownResidueClass {
                class: s.to_string(),
                valid: Self::VALID_NAMES.to_string(),
            }),
        }
    }
}

impl fmt::Display for RamaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct RamaTable {
    probabilities: [[f64; RAMA_BIN_COUNT]; RAMA_BIN_COUNT],
}

#[inline]
fn bin_center(index: usize) -> f64 {
    -180.0 + (index as f64 + 0.5) * RAMA_BIN_SIZE
}

impl RamaTable {
    fn from_components(components: &[(f64, f64, f64, f64, f64)]) -> Self {
        let mut probabilities = [[0.0; RAMA_BIN_COUNT]; RAMA_BIN_COUNT];
        for (i, row) in probabilities.iter_mut().enumerate() {
            let phi = bin_center(i);
            for (j, cell) in row.iter_mut().enumerate() {
                let psi = bin_center(j);
                let density: f64 = components
                    .iter()
                    .map(|&(phi0, psi0, sigma_phi, sigma_psi, weight)| {
                        let d_phi = (phi - phi0) / sigma_phi;
                        let d_psi = (psi - psi0) / sigma_psi;
                        weight * (-0.5 * (d_phi * d_phi + d_psi * d_psi)).exp()
                    })
                    .sum();
                *cell = (RAMA_MIN_PROBABILITY + density).min(1.0);
            }
        }
        Self { probabilities }
    }

    fn interpolate(&self, phi: f64, psi: f64) -> f64 {
        let (phi_lo, phi_hi, phi_w) = interpolation_indices(phi);
        let (psi_lo, psi_hi, psi_w) = interpolation_indices(psi);

        let p = &self.probabilities;
        (1.0 - phi_w) * (1.0 - psi_w) * p[phi_lo][psi_lo]
            + phi_w * (1.0 - psi_w) * p[phi_hi][psi_lo]
            + (1.0 - phi_w) * psi_w * p[phi_lo][psi_hi]
            + phi_w * psi_w * p[phi_hi][psi_hi]
    }
}

/// Lower/upper bin indices (wrapping at ±180°) and the weight of the upper bin.
fn interpolation_indices(angle: f64) -> (usize, usize, f64) {
    let coord = (angle + 180.0) / RAMA_BIN_SIZE - 0.5;
    let lower = coord.floor();
    let fraction = coord - lower;
    let lower_index = (lower as i64).rem_euclid(RAMA_BIN_COUNT as i64) as usize;
    let upper_index = (lower_index + 1) % RAMA_BIN_COUNT;
    (lower_index, upper_index, fraction)
}

/// Backbone torsion penalty `-ln p(phi, psi)` clamped to `[0, 10]`.
pub fn ramachandran_penalty(phi: f64, psi: f64, class: RamaClass) -> f64 {
    let probability = class
        .table()
        .interpolate(wrap_angle(phi), wrap_angle(psi))
        .clamp(RAMA_MIN_PROBABILITY, 1.0);
    (-probability.ln()).clamp(0.0, RAMA_MAX_PENALTY)
}

/// Same as [`ramachandran_penalty`] but resolves the class from its name.
pub fn ramachandran_penalty_for(phi: f64, psi: f64, class_name: &str) -> Result<f64, TermError> {
    let class: RamaClass = class_name.parse()?;
    Ok(ramachandran_penalty(phi, psi, class))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_allowed_region_scores_below_disfavoured_region() {
        let allowed = ramachandran_penalty(-60.0, -40.0, RamaClass::General);
        let disfavoured = ramachandran_penalty(50.0, 150.0, RamaClass::General);
        assert!(allowed < disfavoured);
    }

    #[test]
    fn glycine_allowed_region_scores_below_disfavoured_region() {
        let allowed = ramachandran_penalty(80.0, 0.0, RamaClass::Glycine);
        let disfavoured = ramachandran_penalty(10.0, -150.0, RamaClass::Glycine);
        assert!(allowed < disfavoured);
    }

    #[test]
    fn proline_allowed_region_scores_below_disfavoured_region() {
        let allowed = ramachandran_penalty(-65.0, 140.0, RamaClass::Proline);
        let disfavoured = ramachandran_penalty(40.0, -130.0, RamaClass::Proline);
        assert!(allowed < disfavoured);
    }

    #[test]
    fn penalty_stays_within_bounds_everywhere() {
        for class in [RamaClass::General, RamaClass::Glycine, RamaClass::Proline] {
            for phi in (-180..180).step_by(15) {
                for psi in (-180..180).step_by(15) {
                    let value = ramachandran_penalty(phi as f64, psi as f64, class);
                    assert!((0.0..=RAMA_MAX_PENALTY).contains(&value));
                }
            }
        }
    }

    #[test]
    fn angles_are_wrapped_before_lookup() {
        let direct = ramachandran_penalty(-60.0, -40.0, RamaClass::General);
        let wrapped = ramachandran_penalty(300.0, 320.0, RamaClass::General);
        assert!((direct - wrapped).abs() < 1e-9);
    }

    #[test]
    fn interpolation_is_continuous_across_the_180_boundary() {
        let below = ramachandran_penalty(179.999, 100.0, RamaClass::Glycine);
        let above = ramachandran_penalty(-179.999, 100.0, RamaClass::Glycine);
        assert!((below - above).abs() < 1e-2);
    }

    #[test]
    fn interpolation_indices_wrap_at_edges() {
        assert_eq!(interpolation_indices(-180.0).0, RAMA_BIN_COUNT - 1);
        assert_eq!(interpolation_indices(-180.0).1, 0);
        let (lo, hi, w) = interpolation_indices(-175.0);
        assert_eq!((lo, hi), (0, 1));
        assert!(w.abs() < 1e-12);
    }

    #[test]
    fn class_names_and_aliases_parse() {
        assert_eq!("general".parse::<RamaClass>(), Ok(RamaClass::General));
        assert_eq!("GLY".parse::<RamaClass>(), Ok(RamaClass::Glycine));
        assert_eq!("glycine".parse::<RamaClass>(), Ok(RamaClass::Glycine));
        assert_eq!("proline".parse::<RamaClass>(), Ok(RamaClass::Proline));
    }

    #[test]
    fn unknown_class_lists_valid_classes() {
        let err = ramachandran_penalty_for(-60.0, -40.0, "helix").unwrap_err();
        match err {
            TermError::UnknownResidueClass { class, valid } => {
                assert_eq!(class, "helix");
                assert!(valid.contains("general"));
                assert!(valid.contains("gly"));
                assert!(valid.contains("pro"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
