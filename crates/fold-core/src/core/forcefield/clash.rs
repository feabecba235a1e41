use super::error::TermError;
use super::potentials::clash_overlap;
use crate::core::models::atom::Atom;
use crate::core::utils::identifiers::van_der_waals_radius;
use itertools::Itertools;

pub const DEFAULT_SOFTNESS: f64 = 0.2;
pub const DEFAULT_CUTOFF: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClashParams {
    /// Margin (Å) added to every radius sum.
    pub softness: f64,
    /// Pairs at or beyond this distance (Å) are ignored.
    pub cutoff: f64,
}

impl Default for ClashParams {
    fn default() -> Self {
        Self {
            softness: DEFAULT_SOFTNESS,
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

fn radii_of(atoms: &[Atom]) -> Result<Vec<f64>, TermError> {
    atoms
        .iter()
        .map(|atom| {
            van_der_waals_radius(&atom.element)
                .ok_or_else(|| TermError::UnknownElement(atom.element.to_ascii_uppercase()))
        })
        .collect()
}

#[inline]
fn pair_energy(a: &Atom, radius_a: f64, b: &Atom, radius_b: f64, params: &ClashParams) -> f64 {
    let dist_sq = (a.position - b.position).norm_squared();
    if dist_sq >= params.cutoff * params.cutoff {
        return 0.0;
    }
    clash_overlap(dist_sq.sqrt(), radius_a, radius_b, params.softness)
}

/// Total steric clash over every unordered pair of `atoms`.
pub fn clash_energy(atoms: &[Atom], params: &ClashParams) -> Result<f64, TermError> {
    let radii = radii_of(atoms)?;
    Ok((0..atoms.len())
        .tuple_combinations()
        .map(|(i, j)| pair_energy(&atoms[i], radii[i], &atoms[j], radii[j], params))
        .sum())
}

/// Steric clash restricted to pairs with one atom from each set.
pub fn clash_between(
    atoms_a: &[Atom],
    atoms_b: &[Atom],
    params: &ClashParams,
) -> Result<f64, TermError> {
    let radii_a = radii_of(atoms_a)?;
    let radii_b = radii_of(atoms_b)?;
    Ok(atoms_a
        .iter()
        .zip(&radii_a)
        .cartesian_product(atoms_b.iter().zip(&radii_b))
        .map(|((a, &ra), (b, &rb))| pair_energy(a, ra, b, rb, params))
        .sum())
}
