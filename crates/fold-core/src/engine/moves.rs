use super::state::State;
use crate::core::utils::geometry::rotate_about_axis;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

/// Offset magnitude (Å) of the discrete rotamer switch.
pub const ROTAMER_SHIFT: f64 = 0.4;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MoveError {
    #[error("Invalid coordinates for atom '{atom}': {reason}")]
    InvalidPayload { atom: String, reason: String },
}

/// A structured perturbation of one residue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Move {
    /// Rotate about the target's N→CA bond by `delta` degrees.
    Phi { delta: f64 },
    /// Rotate about the target's CA→C bond by `delta` degrees.
    Psi { delta: f64 },
    /// Switch between the two canonical backbone offsets.
    Rotamer { id: u32 },
    /// Place named atoms at explicit coordinates.
    Displace { atoms: BTreeMap<String, Vec<f64>> },
}

impl Move {
    pub fn kind(&self) -> &'static str {
        match self {
            Move::Phi { .. } => "phi",
            Move::Psi { .. } => "psi",
            Move::Rotamer { .. } => "rotamer",
            Move::Displace { .. } => "displace",
        }
    }
}

/// Applies `mv` to residue `residue_id` and returns the ids whose coordinates changed.
///
/// An unknown residue, missing anchor atoms or a zero-angle rotation leave the
/// structure untouched and yield an empty set.
///
/// # Errors
///
/// Returns [`MoveError::InvalidPayload`] when a displacement is not exactly
/// three finite numbers.
pub fn apply_move(
    state: &mut State,
    residue_id: usize,
    mv: &Move,
) -> Result<BTreeSet<usize>, MoveError> {
    let updates = match mv {
        Move::Phi { delta } => phi_updates(state, residue_id, *delta),
        Move::Psi { delta } => psi_updates(state, residue_id, *delta),
        Move::Rotamer { id } => rotamer_updates(state, residue_id, *id),
        Move::Displace { atoms } => displace_updates(state, residue_id, atoms)?,
    };

    let mut changed = BTreeSet::new();
    for (id, positions) in updates {
        if state.write_coords(id, &positions) > 0 {
            changed.insert(id);
        }
    }
    debug!(
        residue = residue_id,
        moved = changed.len(),
        "Applied {} move.",
        mv.kind()
    );
    Ok(changed)
}

type Updates = Vec<(usize, HashMap<String, Point3<f64>>)>;

fn rotation_updates<F>(
    state: &State,
    start: usize,
    origin: Point3<f64>,
    axis: Vector3<f64>,
    delta: f64,
    keep_fixed: F,
) -> Updates
where
    F: Fn(usize, &str) -> bool,
{
    if delta == 0.0 || axis.norm_squared() < 1e-12 {
        return Vec::new();
    }
    state.residues()[start.min(state.len())..]
        .iter()
        .filter_map(|residue| {
            let positions: HashMap<String, Point3<f64>> = residue
                .atoms()
                .iter()
                .filter(|atom| !keep_fixed(residue.id, &atom.name))
                .filter_map(|atom| {
                    rotate_about_axis(&atom.position, &origin, &axis, delta)
                        .map(|p| (atom.name.clone(), p))
                })
                .collect();
            (!positions.is_empty()).then_some((residue.id, positions))
        })
        .collect()
}

fn phi_updates(state: &State, residue_id: usize, delta: f64) -> Updates {
    let Some(residue) = state.residue(residue_id) else {
        return Vec::new();
    };
    let (Some(n), Some(ca)) = (residue.position("N"), residue.position("CA")) else {
        return Vec::new();
    };
    rotation_updates(state, residue_id, n, ca - n, delta, |id, name| {
        id == residue_id && matches!(name, "N" | "CA" | "H")
    })
}

fn psi_updates(state: &State, residue_id: usize, delta: f64) -> Updates {
    let Some(residue) = state.residue(residue_id) else {
        return Vec::new();
    };
    let (Some(ca), Some(c)) = (residue.position("CA"), residue.position("C")) else {
        return Vec::new();
    };
    rotation_updates(state, residue_id + 1, ca, c - ca, delta, |_, _| false)
}

fn rotamer_updates(state: &State, residue_id: usize, rotamer: u32) -> Updates {
    let Some(residue) = state.residue(residue_id) else {
        return Vec::new();
    };
    let d = if rotamer == 0 {
        -ROTAMER_SHIFT
    } else {
        ROTAMER_SHIFT
    };
    let offsets = [
        ("N", Vector3::new(d, 0.0, 0.5 * d)),
        ("CA", Vector3::new(-0.25 * d, 0.25 * d, 0.0)),
    ];
    let positions: HashMap<String, Point3<f64>> = offsets
        .iter()
        .filter_map(|(name, offset)| {
            residue
                .position(name)
                .map(|p| (name.to_string(), p + *offset))
        })
        .collect();
    if positions.is_empty() {
        Vec::new()
    } else {
        vec![(residue_id, positions)]
    }
}

fn displace_updates(
    state: &State,
    residue_id: usize,
    atoms: &BTreeMap<String, Vec<f64>>,
) -> Result<Updates, MoveError> {
    let mut positions = HashMap::with_capacity(atoms.len());
    for (name, values) in atoms {
        let point = parse_point(name, values)?;
        positions.insert(name.clone(), point);
    }
    let Some(residue) = state.residue(residue_id) else {
        return Ok(Vec::new());
    };
    positions.retain(|name, _| residue.atom(name).is_some());
    if positions.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![(residue_id, positions)])
}

fn parse_point(atom: &str, values: &[f64]) -> Result<Point3<f64>, MoveError> {
    let [x, y, z] = values else {
        return Err(MoveError::InvalidPayload {
            atom: atom.to_string(),
            reason: format!("expected 3 components, found {}", values.len()),
        });
    };
    if ![x, y, z].iter().all(|v| v.is_finite()) {
        return Err(MoveError::InvalidPayload {
            atom: atom.to_string(),
            reason: "components must be finite numbers".to_string(),
        });
    }
    Ok(Point3::new(*x, *y, *z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::geometry::dihedral_angle;
    use crate::workflows::build::build_state;

    const TOLERANCE: f64 = 1e-6;

    fn zigzag_state(sequence: &str) -> State {
        let coords: Vec<Point3<f64>> = (0..sequence.len())
            .flat_map(|i| {
                let x = 3.6 * i as f64;
                let flip = if i % 2 == 0 { 1.0 } else { -1.0 };
                [
                    Point3::new(x, 0.0, 0.0),
                    Point3::new(x + 1.2, 0.9 * flip, 0.2),
                    Point3::new(x + 2.4, 0.1 * flip, -0.3),
                ]
            })
            .collect();
        build_state(sequence, &coords).unwrap()
    }

    fn snapshot(state: &State) -> Vec<Vec<Point3<f64>>> {
        state
            .residues()
            .iter()
            .map(|r| r.atoms().iter().map(|a| a.position).collect())
            .collect()
    }

    fn angle_diff(a: f64, b: f64) -> f64 {
        (a - b + 180.0).rem_euclid(360.0) - 180.0
    }

    #[test]
    fn phi_rotation_changes_phi_by_delta_and_moves_downstream() {
        let mut state = zigzag_state("AAAAA");
        let before = snapshot(&state);
        let phi_before = state.phi(2).unwrap();

        let changed = apply_move(&mut state, 2, &Move::Phi { delta: 30.0 }).unwrap();

        assert_eq!(changed, BTreeSet::from([2, 3, 4]));
        assert!((angle_diff(state.phi(2).unwrap(), phi_before) - 30.0).abs() < TOLERANCE);
        let residue = state.residue(2).unwrap();
        assert_eq!(residue.position("N"), Some(before[2][0]));
        assert_eq!(residue.position("CA"), Some(before[2][1]));
        assert_eq!(snapshot(&state)[..2], before[..2]);
        assert!(state.grid().is_consistent());
    }

    #[test]
    fn phi_rotation_keeps_amide_hydrogen_fixed() {
        let mut state = zigzag_state("AAAA");
        let h_before = state.atom_position(2, "H").unwrap();
        apply_move(&mut state, 2, &Move::Phi { delta: -45.0 }).unwrap();
        assert_eq!(state.atom_position(2, "H"), Some(h_before));
    }

    #[test]
    fn psi_rotation_moves_only_downstream_residues() {
        let mut state = zigzag_state("AAAAA");
        let before = snapshot(&state);
        let psi_before = state.psi(1).unwrap();

        let changed = apply_move(&mut state, 1, &Move::Psi { delta: -50.0 }).unwrap();

        assert_eq!(changed, BTreeSet::from([2, 3, 4]));
        assert_eq!(snapshot(&state)[..2], before[..2]);
        assert!((angle_diff(state.psi(1).unwrap(), psi_before) + 50.0).abs() < TOLERANCE);
    }

    #[test]
    fn rotations_preserve_internal_distances() {
        let mut state = zigzag_state("AAAAAA");
        let d_before = nalgebra::distance(
            &state.atom_position(3, "CA").unwrap(),
            &state.atom_position(5, "C").unwrap(),
        );
        apply_move(&mut state, 2, &Move::Phi { delta: 70.0 }).unwrap();
        apply_move(&mut state, 2, &Move::Psi { delta: 40.0 }).unwrap();
        let d_after = nalgebra::distance(
            &state.atom_position(3, "CA").unwrap(),
            &state.atom_position(5, "C").unwrap(),
        );
        assert!((d_before - d_after).abs() < TOLERANCE);
    }

    #[test]
    fn psi_of_last_residue_and_zero_angles_are_noops() {
        let mut state = zigzag_state("AAA");
        let before = snapshot(&state);
        assert!(apply_move(&mut state, 2, &Move::Psi { delta: 20.0 }).unwrap().is_empty());
        assert!(apply_move(&mut state, 1, &Move::Phi { delta: 0.0 }).unwrap().is_empty());
        assert_eq!(snapshot(&state), before);
    }

    #[test]
    fn unknown_residue_yields_empty_update() {
        let mut state = zigzag_state("AAA");
        for mv in [
            Move::Phi { delta: 10.0 },
            Move::Psi { delta: 10.0 },
            Move::Rotamer { id: 1 },
        ] {
            assert!(apply_move(&mut state, 10, &mv).unwrap().is_empty());
        }
    }

    #[test]
    fn missing_anchor_atoms_yield_empty_update() {
        let mut state = zigzag_state("AAA");
        state.residues[1].atoms.retain(|a| a.name != "CA");
        assert!(apply_move(&mut state, 1, &Move::Phi { delta: 10.0 }).unwrap().is_empty());
        assert!(apply_move(&mut state, 1, &Move::Psi { delta: 10.0 }).unwrap().is_empty());
    }

    #[test]
    fn rotamer_switch_applies_deterministic_offsets() {
        let mut state = zigzag_state("AAA");
        let n = state.atom_position(1, "N").unwrap();
        let ca = state.atom_position(1, "CA").unwrap();

        let changed = apply_move(&mut state, 1, &Move::Rotamer { id: 0 }).unwrap();
        assert_eq!(changed, BTreeSet::from([1]));
        assert_eq!(state.atom_position(1, "N"), Some(n + Vector3::new(-0.4, 0.0, -0.2)));
        assert_eq!(state.atom_position(1, "CA"), Some(ca + Vector3::new(0.1, -0.1, 0.0)));

        apply_move(&mut state, 1, &Move::Rotamer { id: 3 }).unwrap();
        let n_back = state.atom_position(1, "N").unwrap();
        assert!((n_back - n).norm() < TOLERANCE);
    }

    #[test]
    fn displace_sets_known_atoms_and_skips_unknown_names() {
        let mut state = zigzag_state("AAA");
        let atoms = BTreeMap::from([
            ("CA".to_string(), vec![9.0, 9.0, 9.0]),
            ("CB".to_string(), vec![1.0, 1.0, 1.0]),
        ]);
        let changed = apply_move(&mut state, 0, &Move::Displace { atoms }).unwrap();
        assert_eq!(changed, BTreeSet::from([0]));
        assert_eq!(state.atom_position(0, "CA"), Some(Point3::new(9.0, 9.0, 9.0)));
        assert_eq!(state.atom_position(0, "CB"), None);
    }

    #[test]
    fn malformed_displacement_is_a_client_error() {
        let mut state = zigzag_state("AAA");
        let before = snapshot(&state);

        let short = BTreeMap::from([("CA".to_string(), vec![1.0, 2.0])]);
        assert!(matches!(
            apply_move(&mut state, 0, &Move::Displace { atoms: short }),
            Err(MoveError::InvalidPayload { .. })
        ));

        let nan = BTreeMap::from([
            ("N".to_string(), vec![0.0, 0.0, 0.0]),
            ("CA".to_string(), vec![1.0, f64::NAN, 2.0]),
        ]);
        let err = apply_move(&mut state, 0, &Move::Displace { atoms: nan }).unwrap_err();
        assert_eq!(
            err,
            MoveError::InvalidPayload {
                atom: "CA".to_string(),
                reason: "components must be finite numbers".to_string(),
            }
        );
        assert_eq!(snapshot(&state), before);
    }

    #[test]
    fn moves_deserialize_from_tagged_toml() {
        let phi: Move = toml::from_str("kind = \"phi\"\ndelta = 15.0").unwrap();
        assert_eq!(phi, Move::Phi { delta: 15.0 });
        let displace: Move =
            toml::from_str("kind = \"displace\"\n[atoms]\nCA = [1.0, 2.0, 3.0]").unwrap();
        assert_eq!(
            displace,
            Move::Displace {
                atoms: BTreeMap::from([("CA".to_string(), vec![1.0, 2.0, 3.0])]),
            }
        );
    }

    #[test]
    fn dihedral_helper_agrees_with_state_phi() {
        let state = zigzag_state("AAA");
        let expected = dihedral_angle(
            &state.atom_position(0, "C").unwrap(),
            &state.atom_position(1, "N").unwrap(),
            &state.atom_position(1, "CA").unwrap(),
            &state.atom_position(1, "C").unwrap(),
        );
        assert_eq!(state.phi(1), expected);
    }
}
