use crate::core::models::atom::Atom;
use crate::core::models::residue::{Residue, ResidueType};
use crate::core::utils::geometry::{
    CO_BOND_LENGTH, HN_BOND_LENGTH, calculate_carbonyl_o_position, calculate_hn_position,
};
use crate::engine::config::EngineConfig;
use crate::engine::error::BuildError;
use crate::engine::scoring::initialise_weights;
use crate::engine::state::State;
use nalgebra::Point3;
use tracing::{info, instrument};

/// Number of input coordinates per residue (N, CA, C).
pub const COORDS_PER_RESIDUE: usize = 3;

/// Builds a scoring state with the default [`EngineConfig`].
///
/// See [`build_state_with`].
pub fn build_state(sequence: &str, coords: &[Point3<f64>]) -> Result<State, BuildError> {
    build_state_with(EngineConfig::default(), sequence, coords)
}

/// Builds a scoring state from a one-letter sequence and its backbone trace.
///
/// `coords` holds N, CA and C of every residue in chain order. Carbonyl O
/// (all but the last residue) and amide H (all but the first residue and
/// prolines) are derived from the trace. The returned state has its grid
/// indexed, an empty score cache and initialised weights.
///
/// # Errors
///
/// Returns [`BuildError`] for an empty sequence, a coordinate count other than
/// three per residue, or a non-finite coordinate.
#[instrument(skip_all, name = "build_state", fields(residues = sequence.chars().count()))]
pub fn build_state_with(
    config: EngineConfig,
    sequence: &str,
    coords: &[Point3<f64>],
) -> Result<State, BuildError> {
    let residue_types: Vec<ResidueType> =
        sequence.chars().map(ResidueType::from_one_letter).collect();
    validate_coords(residue_types.len(), coords)?;

    let backbone: Vec<[Point3<f64>; 3]> = coords
        .chunks_exact(COORDS_PER_RESIDUE)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    let residues: Vec<Residue> = residue_types
        .iter()
        .enumerate()
        .map(|(id, &residue_type)| {
            let [n, ca, c] = backbone[id];
            let mut atoms = vec![
                Atom::backbone("N", n),
                Atom::backbone("CA", ca),
                Atom::backbone("C", c),
            ];
            if let Some(next) = backbone.get(id + 1) {
                if let Some(o) = calculate_carbonyl_o_position(&ca, &c, &next[0], CO_BOND_LENGTH) {
                    atoms.push(Atom::backbone("O", o));
                }
            }
            if residue_type != ResidueType::Proline {
                if let Some(prev) = id.checked_sub(1).map(|p| &backbone[p]) {
                    if let Some(h) = calculate_hn_position(&n, &ca, &prev[2], HN_BOND_LENGTH) {
                        atoms.push(Atom::backbone("H", h));
                    }
                }
            }
            Residue::new(id, residue_type, atoms)
        })
        .collect();

    let mut state = State::new(residues, config);
    initialise_weights(&mut state);
    info!(
        residues = state.len(),
        occupied_cells = state.grid().occupied_cell_count(),
        "Scoring state built."
    );
    Ok(state)
}

fn validate_coords(residue_count: usize, coords: &[Point3<f64>]) -> Result<(), BuildError> {
    if residue_count == 0 {
        return Err(BuildError::EmptySequence);
    }
    let expected = residue_count * COORDS_PER_RESIDUE;
    if coords.len() != expected {
        return Err(BuildError::CoordinateCount {
            expected,
            found: coords.len(),
        });
    }
    if let Some(index) = coords
        .iter()
        .position(|p| !p.coords.iter().all(|v| v.is_finite()))
    {
        return Err(BuildError::NonFiniteCoordinate { index });
    }
    Ok(())
}
