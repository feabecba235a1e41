use super::cache::ScoreCache;
use super::config::EngineConfig;
use super::error::EngineError;
use super::grid::NeighborGrid;
use super::stats::ScoreStats;
use crate::core::forcefield::hbond::BackboneSite;
use crate::core::forcefield::term::Weights;
use crate::core::models::residue::Residue;
use crate::core::utils::geometry::dihedral_angle;
use nalgebra::Point3;
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

/// A structure under edit together with everything needed to rescore it incrementally.
///
/// Residue ids equal their position in the chain. Every coordinate change goes
/// through [`State::update_residue_coords`], which keeps the residue atoms, the
/// flat atom index and the neighbor grid in step and remembers which residues
/// must be rescored.
#[derive(Debug, Clone)]
pub struct State {
    pub(crate) residues: Vec<Residue>,
    atom_index: HashMap<(usize, String), Point3<f64>>,
    pub(crate) grid: NeighborGrid,
    pub(crate) cache: ScoreCache,
    pub(crate) weights: Weights,
    target_ss: Option<String>,
    pub(crate) stats: ScoreStats,
    config: EngineConfig,
    /// Residues mutated since the last rescore.
    pub(crate) moved: BTreeSet<usize>,
    /// Residues that were near mutated atoms before they moved.
    pub(crate) stale_neighbors: BTreeSet<usize>,
}

impl State {
    /// Indexes `residues` for scoring. The cache starts empty.
    ///
    /// Weights are taken from `config` when present; otherwise they stay empty
    /// until [`initialise_weights`](crate::engine::scoring::initialise_weights) runs.
    pub fn new(residues: Vec<Residue>, config: EngineConfig) -> Self {
        let mut grid = NeighborGrid::new(config.voxel_size);
        let mut atom_index = HashMap::new();
        for residue in &residues {
            grid.index_residue(residue);
            for atom in residue.atoms() {
                atom_index.insert((residue.id, atom.name.clone()), atom.position);
            }
        }
        Self {
            residues,
            atom_index,
            grid,
            cache: ScoreCache::new(),
            weights: config.weights.clone().unwrap_or_default(),
            target_ss: None,
            stats: ScoreStats::new(),
            config,
            moved: BTreeSet::new(),
            stale_neighbors: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn residue(&self, id: usize) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn atom_position(&self, residue_id: usize, atom_name: &str) -> Option<Point3<f64>> {
        self.atom_index
            .get(&(residue_id, atom_name.to_string()))
            .copied()
    }

    pub fn grid(&self) -> &NeighborGrid {
        &self.grid
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn target_ss(&self) -> Option<&str> {
        self.target_ss.as_deref()
    }

    pub fn stats(&self) -> &ScoreStats {
        &self.stats
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the term weights. Cached totals are dropped and recomputed by the next score.
    pub fn set_weights(&mut self, weights: Weights) {
        self.weights = weights;
        self.invalidate_all();
    }

    /// Sets or removes the target secondary-structure string (`H`, `E`, `C` per residue).
    pub fn set_target_ss(&mut self, target: Option<String>) {
        self.target_ss = target;
        self.invalidate_all();
    }

    /// Moves named atoms of one residue.
    ///
    /// Names the residue does not carry are skipped. Returns how many atoms changed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ResidueNotFound`] if `residue_id` is not part of the structure.
    pub fn update_residue_coords(
        &mut self,
        residue_id: usize,
        updates: &HashMap<String, Point3<f64>>,
    ) -> Result<usize, EngineError> {
        if residue_id >= self.residues.len() {
            return Err(EngineError::ResidueNotFound(residue_id));
        }
        Ok(self.write_coords(residue_id, updates))
    }

    /// Replaces the χ angles of one residue and marks it for rescoring.
    pub fn set_chi_angles(&mut self, residue_id: usize, chi_angles: Vec<f64>) -> Result<(), EngineError> {
        let residue = self
            .residues
            .get_mut(residue_id)
            .ok_or(EngineError::ResidueNotFound(residue_id))?;
        residue.chi_angles = chi_angles;
        self.moved.insert(residue_id);
        Ok(())
    }

    pub(crate) fn write_coords(
        &mut self,
        residue_id: usize,
        updates: &HashMap<String, Point3<f64>>,
    ) -> usize {
        let Some(residue) = self.residues.get_mut(residue_id) else {
            return 0;
        };
        if !updates.keys().any(|name| residue.atom(name).is_some()) {
            return 0;
        }

        let radius = self.config.interaction_radius;
        let before = self
            .grid
            .nearby_residues(residue.atoms().iter().map(|atom| &atom.position), radius);
        self.stale_neighbors.extend(before);

        let mut changed = 0;
        for (name, &position) in updates {
            if residue.set_position(name, position) {
                self.atom_index
                    .insert((residue_id, name.clone()), position);
                changed += 1;
            }
        }

        self.grid.clear_residue(residue_id);
        self.grid.index_residue(residue);
        self.moved.insert(residue_id);
        trace!(residue = residue_id, atoms = changed, "Residue coordinates updated.");
        changed
    }

    pub(crate) fn invalidate_all(&mut self) {
        self.cache.clear();
        self.moved.clear();
        self.stale_neighbors.clear();
    }

    /// φ of residue `id` from C(id-1), N, CA, C. `None` for the first residue.
    pub fn phi(&self, id: usize) -> Option<f64> {
        let prev = id.checked_sub(1)?;
        dihedral_angle(
            &self.atom_position(prev, "C")?,
            &self.atom_position(id, "N")?,
            &self.atom_position(id, "CA")?,
            &self.atom_position(id, "C")?,
        )
    }

    /// ψ of residue `id` from N, CA, C, N(id+1). `None` for the last residue.
    pub fn psi(&self, id: usize) -> Option<f64> {
        dihedral_angle(
            &self.atom_position(id, "N")?,
            &self.atom_position(id, "CA")?,
            &self.atom_position(id, "C")?,
            &self.atom_position(id + 1, "N")?,
        )
    }

    /// Torsions and hydrogen-bonding atoms of residue `id`.
    pub fn backbone_site(&self, id: usize) -> Option<BackboneSite> {
        self.residue(id)?;
        Some(BackboneSite {
            index: id,
            phi: self.phi(id),
            psi: self.psi(id),
            n: self.atom_position(id, "N"),
            h: self.atom_position(id, "H"),
            o: self.atom_position(id, "O"),
        })
    }
}
