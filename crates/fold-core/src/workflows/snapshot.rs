use crate::core::forcefield::clash::clash_energy;
use crate::core::forcefield::hbond::{BackboneSite, HBOND_RESIDUE_CAP, hbond_bonus};
use crate::core::forcefield::potentials::{COMPACTNESS_ALPHA, compactness_penalty};
use crate::core::forcefield::ramachandran::ramachandran_penalty;
use crate::core::forcefield::rotamer::rotamer_penalty;
use crate::core::forcefield::secondary::{detect_ss_labels, labels_to_string, ss_mismatch_penalties};
use crate::core::forcefield::term::{TermValues, default_weights};
use crate::core::models::atom::Atom;
use crate::core::models::residue::ResidueType;
use crate::engine::config::EngineConfig;
use crate::engine::error::EngineError;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// Score of a structure that scores nothing in any term.
pub const BASELINE_SCORE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SnapshotAtom {
    pub element: String,
    pub position: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SnapshotResidue {
    pub index: usize,
    pub residue_type: String,
    #[serde(default)]
    pub chi: Vec<f64>,
    pub phi: Option<f64>,
    pub psi: Option<f64>,
    pub n: Option<[f64; 3]>,
    pub h: Option<[f64; 3]>,
    pub o: Option<[f64; 3]>,
}

impl SnapshotResidue {
    fn site(&self) -> BackboneSite {
        BackboneSite {
            index: self.index,
            phi: self.phi,
            psi: self.psi,
            n: self.n.map(Point3::from),
            h: self.h.map(Point3::from),
            o: self.o.map(Point3::from),
        }
    }
}

/// Explicit structure description scored without building a [`State`](crate::engine::state::State).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SnapshotRequest {
    pub atoms: Vec<SnapshotAtom>,
    pub residues: Vec<SnapshotResidue>,
    pub target_ss: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotResidueScore {
    pub index: usize,
    pub terms: TermValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotReport {
    pub score: f64,
    /// Raw structure-level term values.
    pub terms: TermValues,
    /// Detected secondary structure, one code per residue in index order.
    pub labels: String,
    pub per_residue: Vec<SnapshotResidueScore>,
}

/// Scores `request` with the default configuration.
pub fn evaluate(request: &SnapshotRequest) -> Result<SnapshotReport, EngineError> {
    evaluate_with(request, &EngineConfig::default())
}

/// Scores an explicit atom list and residue table in one pass.
///
/// Clash and compactness run over the atom list and are reported for the
/// structure only. Rotamer and Ramachandran penalties are per residue; the
/// latter needs both torsions. Hydrogen bonds count at most
/// [`HBOND_RESIDUE_CAP`] times per residue. Secondary structure is compared
/// position by position with the target, and positions past the last residue
/// count as coil.
///
/// # Errors
///
/// Returns [`EngineError::Term`] when an atom element has no radius or a
/// residue lacks the χ angles its type requires.
#[instrument(skip_all, name = "snapshot_evaluation", fields(atoms = request.atoms.len(), residues = request.residues.len()))]
pub fn evaluate_with(
    request: &SnapshotRequest,
    config: &EngineConfig,
) -> Result<SnapshotReport, EngineError> {
    let atoms: Vec<Atom> = request
        .atoms
        .iter()
        .map(|a| Atom::new(&a.element, &a.element, Point3::from(a.position)))
        .collect();
    let positions: Vec<Point3<f64>> = atoms.iter().map(|a| a.position).collect();

    let mut terms = TermValues {
        clash: clash_energy(&atoms, &config.clash_params())?,
        compact: compactness_penalty(&positions, COMPACTNESS_ALPHA),
        ..TermValues::default()
    };
    let mut per_residue: BTreeMap<usize, TermValues> = request
        .residues
        .iter()
        .map(|r| (r.index, TermValues::default()))
        .collect();

    let chi_map: HashMap<usize, Vec<f64>> = request
        .residues
        .iter()
        .map(|r| (r.index, r.chi.clone()))
        .collect();
    let residue_types: HashMap<usize, String> = request
        .residues
        .iter()
        .map(|r| (r.index, r.residue_type.clone()))
        .collect();

    for residue in &request.residues {
        let rotamer = rotamer_penalty(residue.index, &chi_map, &residue_types)?;
        let rama = match (residue.phi, residue.psi) {
            (Some(phi), Some(psi)) => {
                let class = residue
                    .residue_type
                    .parse::<ResidueType>()
                    .unwrap_or(ResidueType::Unknown)
                    .rama_class();
                ramachandran_penalty(phi, psi, class)
            }
            _ => 0.0,
        };
        let entry = per_residue.entry(residue.index).or_default();
        entry.rotamer = rotamer;
        entry.rama = rama;
        terms.rotamer += rotamer;
        terms.rama += rama;
    }

    let sites: Vec<BackboneSite> = request.residues.iter().map(SnapshotResidue::site).collect();
    let bonus = hbond_bonus(&sites, config.hbond_gamma, HBOND_RESIDUE_CAP);
    for (&index, &share) in &bonus.per_residue {
        per_residue.entry(index).or_default().hbond = share;
    }
    terms.hbond = bonus.total;

    let labels = if sites.is_empty() {
        Vec::new()
    } else {
        detect_ss_labels(&sites)
    };
    if let Some(target) = &request.target_ss {
        for (position, penalty) in ss_mismatch_penalties(&labels, target).into_iter().enumerate() {
            per_residue.entry(position).or_default().ss = penalty;
            terms.ss += penalty;
        }
    }

    let weights = config.weights.clone().unwrap_or_else(default_weights);
    let score = BASELINE_SCORE + terms.weighted_total(&weights);
    debug!(score, hbond = terms.hbond, ss = terms.ss, "Snapshot evaluated.");

    Ok(SnapshotReport {
        score,
        terms,
        labels: labels_to_string(&labels),
        per_residue: per_residue
            .into_iter()
            .map(|(index, terms)| SnapshotResidueScore { index, terms })
            .collect(),
    })
}
