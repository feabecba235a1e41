use super::error::EngineError;
use super::state::State;
use super::stats::ScoreStats;
use crate::core::forcefield::clash::clash_between;
use crate::core::forcefield::hbond::pair_hbond_formed;
use crate::core::forcefield::potentials::{COMPACTNESS_ALPHA, compactness_penalty};
use crate::core::forcefield::ramachandran::ramachandran_penalty;
use crate::core::forcefield::rotamer::rotamer_penalty_for;
use crate::core::forcefield::secondary::{classify, ss_mismatch};
use crate::core::forcefield::term::{Term, TermValues, default_weights};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidueScore {
    pub id: usize,
    pub residue_type: String,
    pub total: f64,
    pub version: u64,
    pub terms: TermValues,
}

/// Aggregate of the cached per-residue contributions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    /// Sum of every residue's signed weighted total.
    pub score: f64,
    /// Per-term `weight × value`, summed over residues.
    pub terms: TermValues,
    pub per_residue: Vec<ResidueScore>,
}

/// Fills the weights with the defaults when none are set.
pub fn initialise_weights(state: &mut State) {
    if state.weights.is_empty() {
        state.weights = default_weights();
    }
}

/// Scores the whole structure, computing every residue the first time it is called.
#[instrument(skip_all, name = "score_total")]
pub fn score_total(state: &mut State) -> Result<ScoreReport, EngineError> {
    initialise_weights(state);
    if state.cache.is_empty() {
        full_pass(state)?;
    }
    Ok(aggregate(state))
}

/// Recomputes only the residues whose contributions can have changed since the
/// last score.
///
/// The invalidation set covers the affected residues and every residue mutated
/// since the last rescore, their chain neighbors, residues near their current
/// atoms, and residues that were near them before they moved.
#[instrument(skip_all, name = "local_rescore", fields(affected = affected.len()))]
pub fn local_rescore(
    state: &mut State,
    affected: &BTreeSet<usize>,
) -> Result<ScoreReport, EngineError> {
    if let Some(&missing) = affected.iter().find(|&&id| id >= state.len()) {
        return Err(EngineError::ResidueNotFound(missing));
    }
    initialise_weights(state);
    if state.cache.is_empty() {
        debug!("Score cache is empty; falling back to a full pass.");
        full_pass(state)?;
        return Ok(aggregate(state));
    }

    let invalidated = invalidation_set(state, affected);
    debug!(
        affected = affected.len(),
        invalidated = invalidated.len(),
        "Rescoring invalidated neighborhood."
    );
    let ids: Vec<usize> = invalidated.into_iter().collect();
    recompute(state, &ids)?;
    state.moved.clear();
    state.stale_neighbors.clear();
    state.stats.incremental_passes += 1;
    Ok(aggregate(state))
}

/// Scores every residue. On failure the cache is left empty so the next
/// score starts over.
fn full_pass(state: &mut State) -> Result<(), EngineError> {
    state.invalidate_all();
    let ids: Vec<usize> = (0..state.len()).collect();
    if let Err(err) = recompute(state, &ids) {
        state.cache.clear();
        return Err(err);
    }
    state.stats.full_passes += 1;
    info!(
        residues = ids.len(),
        term_calls = state.stats.total_calls(),
        "Full scoring pass complete."
    );
    Ok(())
}

/// Marks recorded by the state are read here and only dropped once the
/// rescore has stored every result.
fn invalidation_set(state: &State, affected: &BTreeSet<usize>) -> BTreeSet<usize> {
    let mut mutated = state.moved.clone();
    mutated.extend(affected.iter().copied());

    let mut invalidated = state.stale_neighbors.clone();
    let last = state.len().saturating_sub(1);
    for &id in &mutated {
        invalidated.insert(id);
        if id > 0 {
            invalidated.insert(id - 1);
        }
        if id < last {
            invalidated.insert(id + 1);
        }
    }

    let radius = state.config().interaction_radius;
    let points = mutated
        .iter()
        .filter_map(|&id| state.residue(id))
        .flat_map(|residue| residue.atoms().iter().map(|atom| &atom.position));
    invalidated.extend(state.grid.nearby_residues(points, radius));
    invalidated
}

/// Evaluates `ids` against the current coordinates and stores the results.
///
/// Evaluation only reads the state, so the residues are scored independently
/// (in parallel with the `parallel` feature) and written back afterwards.
/// Nothing is stored unless every residue evaluates.
fn recompute(state: &mut State, ids: &[usize]) -> Result<(), EngineError> {
    let results: Vec<(usize, ResidueEvaluation)> = {
        let snapshot: &State = state;

        #[cfg(not(feature = "parallel"))]
        let iterator = ids.iter();

        #[cfg(feature = "parallel")]
        let iterator = ids.par_iter();

        iterator
            .map(|&id| evaluate_residue(snapshot, id).map(|eval| (id, eval)))
            .collect::<Result<Vec<_>, EngineError>>()?
    };

    for (id, evaluation) in results {
        state.stats.absorb_calls(&evaluation.calls);
        let entry = state.cache.store(id, evaluation.terms, &state.weights);
        trace!(
            residue = id,
            total = entry.total,
            version = entry.version,
            "Residue score recomputed."
        );
    }
    Ok(())
}

fn aggregate(state: &State) -> ScoreReport {
    let mut score = 0.0;
    let mut terms = TermValues::default();
    let per_residue = state
        .cache
        .iter()
        .map(|(id, entry)| {
            score += entry.total;
            terms += entry.terms.weighted(&state.weights);
            ResidueScore {
                id,
                residue_type: state
                    .residue(id)
                    .map_or_else(String::new, |r| r.name().to_string()),
                total: entry.total,
                version: entry.version,
                terms: entry.terms,
            }
        })
        .collect();
    ScoreReport {
        score,
        terms,
        per_residue,
    }
}

pub(crate) struct ResidueEvaluation {
    pub terms: TermValues,
    pub calls: ScoreStats,
}

/// Raw term values of one residue.
///
/// Single-residue terms (rama, rotamer, ss) are charged in full. Pair terms
/// (clash, compact, hbond) are evaluated against every neighbor whose closest
/// atom lies within the interaction radius and charged at half value, so the
/// two participants together carry the whole pair.
pub(crate) fn evaluate_residue(state: &State, id: usize) -> Result<ResidueEvaluation, EngineError> {
    let residue = state.residue(id).ok_or(EngineError::ResidueNotFound(id))?;
    let config = state.config();
    let radius = config.interaction_radius;
    let mut terms = TermValues::default();
    let mut calls = ScoreStats::new();

    let site = state
        .backbone_site(id)
        .ok_or(EngineError::ResidueNotFound(id))?;

    terms.rama = match (site.phi, site.psi) {
        (Some(phi), Some(psi)) => ramachandran_penalty(phi, psi, residue.residue_type.rama_class()),
        _ => 0.0,
    };
    calls.record(Term::Rama, 1);

    terms.rotamer = rotamer_penalty_for(id, residue.name(), residue.chi_angles())?;
    calls.record(Term::Rotamer, 1);

    let candidates: BTreeSet<usize> = state
        .grid
        .nearby_residues(residue.atoms().iter().map(|atom| &atom.position), radius)
        .into_iter()
        .filter(|&other| other != id)
        .collect();

    let mut hbond_partners = BTreeSet::new();
    let clash_params = config.clash_params();
    let centroid = residue.centroid();

    for other_id in candidates {
        let Some(other) = state.residue(other_id) else {
            continue;
        };
        let other_site = state.backbone_site(other_id);
        let bonded = other_site.is_some_and(|o| pair_hbond_formed(&site, &o));
        if bonded {
            hbond_partners.insert(other_id);
        }

        if !within_radius(residue.atoms(), other.atoms(), radius) {
            continue;
        }

        if other_id.abs_diff(id) != 1 {
            terms.clash += 0.5 * clash_between(residue.atoms(), other.atoms(), &clash_params)?;
            calls.record(Term::Clash, 1);
        }

        if let (Some(a), Some(b)) = (centroid, other.centroid()) {
            terms.compact += 0.5 * compactness_penalty(&[a, b], COMPACTNESS_ALPHA);
            calls.record(Term::Compact, 1);
        }

        if bonded {
            terms.hbond += 0.5 * config.hbond_gamma;
        }
        calls.record(Term::Hbond, 1);
    }

    if let Some(wanted) = state.target_ss().and_then(|t| t.chars().nth(id)) {
        terms.ss = ss_mismatch(classify(&site, &hbond_partners), wanted);
    }
    calls.record(Term::Ss, 1);

    Ok(ResidueEvaluation { terms, calls })
}

fn within_radius(
    atoms_a: &[crate::core::models::atom::Atom],
    atoms_b: &[crate::core::models::atom::Atom],
    radius: f64,
) -> bool {
    let radius_sq = radius * radius;
    atoms_a
        .iter()
        .cartesian_product(atoms_b)
        .any(|(a, b)| (a.position - b.position).norm_squared() <= radius_sq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::moves::{Move, apply_move};
    use crate::workflows::build::build_state;
    use nalgebra::Point3;
    use std::collections::HashMap;

    const TOLERANCE: f64 = 1e-6;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    /// Places `d` from `a`, `b`, `c` given |cd|, the angle b-c-d and the torsion a-b-c-d.
    fn place_atom(
        a: &Point3<f64>,
        b: &Point3<f64>,
        c: &Point3<f64>,
        bond: f64,
        angle: f64,
        torsion: f64,
    ) -> Point3<f64> {
        let bc = (c - b).normalize();
        let n = (b - a).cross(&bc).normalize();
        let m = n.cross(&bc);
        let (angle, torsion) = (angle.to_radians(), torsion.to_radians());
        c + bc * (-bond * angle.cos())
            + m * (bond * angle.sin() * torsion.cos())
            + n * (bond * angle.sin() * torsion.sin())
    }

    /// N, CA, C coordinates of a chain with ideal bond geometry and the given (φ, ψ) per residue.
    fn backbone_from_torsions(torsions: &[(f64, f64)]) -> Vec<Point3<f64>> {
        let mut n = Point3::new(0.0, 0.0, 0.0);
        let mut ca = Point3::new(1.458, 0.0, 0.0);
        let theta = 111.2f64.to_radians();
        let mut c = ca + nalgebra::Vector3::new(-theta.cos(), theta.sin(), 0.0) * 1.525;
        let mut coords = vec![n, ca, c];
        for window in torsions.windows(2) {
            let (psi, phi) = (window[0].1, window[1].0);
            let next_n = place_atom(&n, &ca, &c, 1.329, 116.2, psi);
            let next_ca = place_atom(&ca, &c, &next_n, 1.458, 121.7, 180.0);
            let next_c = place_atom(&c, &next_n, &next_ca, 1.525, 111.2, phi);
            (n, ca, c) = (next_n, next_ca, next_c);
            coords.extend([n, ca, c]);
        }
        coords
    }

    fn helix_coords(len: usize) -> Vec<Point3<f64>> {
        backbone_from_torsions(&vec![(-57.0, -47.0); len])
    }

    /// 30 residues on a 5 x 3 x 2 lattice with 6 Å spacing.
    fn lattice_coords() -> Vec<Point3<f64>> {
        (0..30)
            .flat_map(|i| {
                let base = Point3::new(
                    (i % 5) as f64 * 6.0,
                    ((i / 5) % 3) as f64 * 6.0,
                    (i / 15) as f64 * 6.0,
                );
                [
                    base,
                    base + nalgebra::Vector3::new(1.2, 0.8, 0.0),
                    base + nalgebra::Vector3::new(2.2, 0.0, 0.3),
                ]
            })
            .collect()
    }

    fn fresh_score(state: &State) -> f64 {
        let mut fresh = State::new(state.residues().to_vec(), state.config().clone());
        fresh.set_weights(state.weights().clone());
        fresh.set_target_ss(state.target_ss().map(str::to_string));
        score_total(&mut fresh).unwrap().score
    }

    #[test]
    fn first_score_fills_cache_with_one_full_pass() {
        let mut state = build_state("GAVLSKDE", &helix_coords(8)).unwrap();
        assert!(state.cache().is_empty());

        let report = score_total(&mut state).unwrap();

        assert_eq!(state.stats().full_passes, 1);
        assert_eq!(state.cache().len(), 8);
        assert_eq!(report.per_residue.len(), 8);
        assert!(report.per_residue.iter().all(|r| r.version == 1));
        assert!(report.per_residue.windows(2).all(|w| w[0].id < w[1].id));

        score_total(&mut state).unwrap();
        assert_eq!(state.stats().full_passes, 1);
    }

    #[test]
    fn cached_totals_equal_weighted_sum_of_terms() {
        let mut state = build_state("GAVLSKDE", &helix_coords(8)).unwrap();
        let mut weights = default_weights();
        weights.insert(Term::Clash, 0.3);
        weights.insert(Term::Hbond, 2.0);
        state.set_weights(weights.clone());

        let report = score_total(&mut state).unwrap();

        for (_, entry) in state.cache().iter() {
            assert!(f64_approx_equal(entry.total, entry.terms.weighted_total(&weights)));
        }
        let from_terms = report.terms.signed_total();
        assert!(f64_approx_equal(report.score, from_terms));
    }

    #[test]
    fn initialise_weights_keeps_custom_weights() {
        let mut state = build_state("AAA", &helix_coords(3)).unwrap();
        let mut custom = default_weights();
        custom.insert(Term::Rama, 5.0);
        state.set_weights(custom.clone());
        initialise_weights(&mut state);
        assert_eq!(state.weights(), &custom);

        state.set_weights(Default::default());
        initialise_weights(&mut state);
        assert_eq!(state.weights(), &default_weights());
    }

    #[test]
    fn local_rescore_matches_full_recomputation_after_moves() {
        let mut state = build_state("MKALVEGSFTRW", &helix_coords(12)).unwrap();
        state.set_target_ss(Some("CHHHHHHHHHHC".to_string()));
        score_total(&mut state).unwrap();

        let moves = [
            (4, Move::Phi { delta: 25.0 }),
            (7, Move::Psi { delta: -40.0 }),
            (2, Move::Rotamer { id: 1 }),
            (
                9,
                Move::Displace {
                    atoms: [("CA".to_string(), vec![1.0, 2.0, 14.0])].into(),
                },
            ),
            (0, Move::Rotamer { id: 0 }),
            (11, Move::Phi { delta: -90.0 }),
        ];

        for (residue_id, mv) in &moves {
            let affected = apply_move(&mut state, *residue_id, mv).unwrap();
            assert!(!affected.is_empty());
            let report = local_rescore(&mut state, &affected).unwrap();
            let expected = fresh_score(&state);
            assert!(
                f64_approx_equal(report.score, expected),
                "incremental {} vs fresh {} after {mv:?}",
                report.score,
                expected
            );
        }
        assert_eq!(state.stats().full_passes, 1);
        assert_eq!(state.stats().incremental_passes, moves.len() as u64);
    }

    #[test]
    fn chi_update_is_picked_up_by_rescore() {
        let mut state = build_state("ASA", &helix_coords(3)).unwrap();
        let before = score_total(&mut state).unwrap().score;

        state.set_chi_angles(1, vec![120.0]).unwrap();
        let after = local_rescore(&mut state, &BTreeSet::new()).unwrap().score;

        assert!(after < before);
        assert!(f64_approx_equal(after, fresh_score(&state)));
    }

    #[test]
    fn incremental_rescore_uses_fewer_evaluations_than_full_pass() {
        let mut state = build_state(&"G".repeat(30), &lattice_coords()).unwrap();
        score_total(&mut state).unwrap();
        let full_calls = state.stats().total_calls();

        let ca = state.atom_position(7, "CA").unwrap();
        let updates = HashMap::from([(
            "CA".to_string(),
            ca + nalgebra::Vector3::new(0.5, 0.0, 0.0),
        )]);
        state.update_residue_coords(7, &updates).unwrap();
        let report = local_rescore(&mut state, &BTreeSet::from([7])).unwrap();

        let incremental_calls = state.stats().total_calls() - full_calls;
        assert!(incremental_calls > 0);
        assert!(incremental_calls < full_calls);
        assert!(f64_approx_equal(report.score, fresh_score(&state)));

        let untouched = report.per_residue.iter().find(|r| r.id == 0).unwrap();
        assert_eq!(untouched.version, 1);
        let moved = report.per_residue.iter().find(|r| r.id == 7).unwrap();
        assert_eq!(moved.version, 2);
    }

    #[test]
    fn forming_hbond_raises_score_by_gamma() {
        let mut state = build_state(&"G".repeat(6), &lattice_coords()[..18]).unwrap();
        let mut weights = default_weights();
        for term in Term::ALL {
            weights.insert(term, 0.0);
        }
        weights.insert(Term::Hbond, 1.0);
        state.set_weights(weights);

        let n = state.atom_position(3, "N").unwrap();
        let place = |state: &mut State, residue: usize, atoms: &[(&str, Point3<f64>)]| {
            let updates: HashMap<String, Point3<f64>> = atoms
                .iter()
                .map(|(name, p)| (name.to_string(), *p))
                .collect();
            state.update_residue_coords(residue, &updates).unwrap();
        };
        let up = nalgebra::Vector3::new(0.0, 1.0, 0.0);
        place(&mut state, 3, &[("H", n + up)]);
        place(&mut state, 0, &[("O", n + up * 4.5)]);
        let apart = score_total(&mut state).unwrap();

        place(&mut state, 0, &[("O", n + up * 2.8)]);
        let bonded = local_rescore(&mut state, &BTreeSet::from([0])).unwrap();

        let gamma = state.config().hbond_gamma;
        assert!(f64_approx_equal(bonded.score - apart.score, gamma));
        assert!(f64_approx_equal(bonded.terms.hbond - apart.terms.hbond, gamma));
        let share = |report: &ScoreReport, id: usize| {
            report.per_residue.iter().find(|r| r.id == id).unwrap().terms.hbond
        };
        assert!(f64_approx_equal(share(&bonded, 0) - share(&apart, 0), gamma / 2.0));
        assert!(f64_approx_equal(share(&bonded, 3) - share(&apart, 3), gamma / 2.0));
    }

    #[test]
    fn breaking_helix_residue_raises_ss_mismatch() {
        let mut state = build_state("AAAAAAAAAA", &helix_coords(10)).unwrap();
        state.set_target_ss(Some("HHHHHHHHHH".to_string()));
        let intact = score_total(&mut state).unwrap();
        let ss_of = |report: &ScoreReport, id: usize| report.per_residue[id].terms.ss;

        let affected = apply_move(&mut state, 5, &Move::Phi { delta: 80.0 }).unwrap();
        let broken = local_rescore(&mut state, &affected).unwrap();

        assert!(ss_of(&broken, 5) > ss_of(&intact, 5));
        assert!(broken.terms.ss > intact.terms.ss);
        assert!(broken.score < intact.score);
    }

    #[test]
    fn rotamer_errors_are_propagated() {
        let mut state = build_state("AKA", &helix_coords(3)).unwrap();
        state.set_chi_angles(1, vec![-60.0]).unwrap();
        let result = score_total(&mut state);
        assert!(matches!(result, Err(EngineError::Term { .. })));
    }

    #[test]
    fn failed_full_pass_leaves_cache_empty() {
        let mut state = build_state("AKAAAA", &helix_coords(6)).unwrap();
        state.set_chi_angles(1, vec![-60.0]).unwrap();
        assert!(score_total(&mut state).is_err());
        assert!(state.cache().is_empty());
        assert_eq!(state.stats().full_passes, 0);

        state
            .set_chi_angles(1, vec![-60.0, 180.0, 180.0, 180.0])
            .unwrap();
        let report = score_total(&mut state).unwrap();

        assert_eq!(state.stats().full_passes, 1);
        assert_eq!(report.per_residue.len(), 6);
        assert!(f64_approx_equal(report.score, fresh_score(&state)));
    }

    #[test]
    fn failed_rescore_keeps_pending_invalidations() {
        let sequence = format!("K{}", "A".repeat(19));
        let mut state = build_state(&sequence, &helix_coords(20)).unwrap();
        score_total(&mut state).unwrap();

        state.set_chi_angles(0, vec![-60.0]).unwrap();
        let affected = apply_move(&mut state, 15, &Move::Rotamer { id: 0 }).unwrap();
        assert!(!affected.is_empty());
        assert!(local_rescore(&mut state, &affected).is_err());
        assert_eq!(state.cache().get(15).unwrap().version, 1);
        assert_eq!(state.stats().incremental_passes, 0);

        state
            .set_chi_angles(0, vec![-60.0, 180.0, 180.0, 180.0])
            .unwrap();
        let report = local_rescore(&mut state, &BTreeSet::new()).unwrap();

        assert_eq!(state.stats().incremental_passes, 1);
        assert_eq!(state.cache().get(15).unwrap().version, 2);
        assert_eq!(report.per_residue.len(), 20);
        assert!(f64_approx_equal(report.score, fresh_score(&state)));
    }

    #[test]
    fn unknown_affected_residue_is_reported() {
        let mut state = build_state("AAA", &helix_coords(3)).unwrap();
        score_total(&mut state).unwrap();
        let result = local_rescore(&mut state, &BTreeSet::from([3]));
        assert!(matches!(result, Err(EngineError::ResidueNotFound(3))));
    }

    #[test]
    fn local_rescore_on_empty_cache_runs_full_pass() {
        let mut state = build_state("AAAA", &helix_coords(4)).unwrap();
        let report = local_rescore(&mut state, &BTreeSet::from([1])).unwrap();
        assert_eq!(state.stats().full_passes, 1);
        assert_eq!(state.stats().incremental_passes, 0);
        assert_eq!(report.per_residue.len(), 4);
    }

    #[test]
    fn changing_weights_invalidates_cache() {
        let mut state = build_state("AAAA", &helix_coords(4)).unwrap();
        score_total(&mut state).unwrap();
        state.set_weights(default_weights());
        assert!(state.cache().is_empty());
        score_total(&mut state).unwrap();
        assert_eq!(state.stats().full_passes, 2);
    }
}
