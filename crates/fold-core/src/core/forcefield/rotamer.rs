use super::error::TermError;
use super::potentials::angular_distance;
use crate::core::utils::identifiers::{expected_chi_count, normalize_residue_code};
use itertools::Itertools;
use std::collections::HashMap;

pub const ALPHA_ROT: f64 = 0.02;
pub const ROTAMER_CENTERS: [f64; 3] = [-60.0, 60.0, 180.0];
pub const ROTAMER_HALF_WIDTH: f64 = 35.0;

fn squared_excess(angles: &[f64], centres: &[f64]) -> f64 {
    angles
        .iter()
        .zip(centres)
        .map(|(&angle, &centre)| {
            let extra = (angular_distance(angle, centre) - ROTAMER_HALF_WIDTH).max(0.0);
            extra * extra
        })
        .sum()
}

/// Rotamer penalty for one residue given its type code and χ angles.
///
/// The library is the tensor product of the canonical centres for every χ angle.
/// Angles inside any bin's window cost nothing; otherwise the squared excess
/// to the closest bin is scaled by [`ALPHA_ROT`]. An empty χ list scores 0; a
/// partial one is a [`TermError::MissingChi`].
pub fn rotamer_penalty_for(
    residue: usize,
    residue_type: &str,
    chi_angles: &[f64],
) -> Result<f64, TermError> {
    if chi_angles.is_empty() {
        return Ok(0.0);
    }
    let code = normalize_residue_code(residue_type);
    let known_count = expected_chi_count(&code);
    let expected = known_count.unwrap_or(chi_angles.len());

    if expected == 0 {
        return Ok(0.0);
    }
    if chi_angles.len() < expected {
        return Err(TermError::MissingChi {
            residue,
            residue_type: code,
            expected,
            found: chi_angles.len(),
        });
    }

    // Residues outside the table fall back to a single-angle library.
    let bin_angles = if known_count.is_some() { expected } else { 1 };
    let relevant = &chi_angles[..bin_angles];

    let best = std::iter::repeat_n(ROTAMER_CENTERS, bin_angles)
        .multi_cartesian_product()
        .map(|centres| squared_excess(relevant, &centres))
        .fold(f64::INFINITY, f64::min);

    Ok(if best.is_finite() { ALPHA_ROT * best } else { 0.0 })
}

/// Rotamer penalty for `residue` looked up in index-keyed χ and type maps.
///
/// A residue absent from the χ map is an error when its type expects angles;
/// an entry with an empty list scores 0.
pub fn rotamer_penalty(
    residue: usize,
    chi_map: &HashMap<usize, Vec<f64>>,
    residue_types: &HashMap<usize, String>,
) -> Result<f64, TermError> {
    let residue_type = residue_types
        .get(&residue)
        .ok_or(TermError::UnknownResidue(residue))?;
    match chi_map.get(&residue) {
        Some(chis) => rotamer_penalty_for(residue, residue_type, chis),
        None => {
            let code = normalize_residue_code(residue_type);
            match expected_chi_count(&code) {
                Some(expected) if expected > 0 => Err(TermError::MissingChi {
                    residue,
                    residue_type: code,
                    expected,
                    found: 0,
                }),
                _ => Ok(0.0),
            }
        }
    }
}
