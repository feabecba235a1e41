use crate::core::models::residue::Residue;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};

/// Integer voxel coordinates.
pub type CellKey = (i64, i64, i64);

/// Uniform voxel grid mapping space to the residues that have atoms there.
///
/// Both directions of the mapping are kept: `cells` answers range queries and
/// `residue_cells` lets a residue be removed without scanning the grid. A
/// residue id is in `cells[c]` exactly when `c` is in `residue_cells[id]`.
/// The grid does not observe coordinates itself; whoever moves a residue must
/// clear and re-index it.
#[derive(Debug, Clone)]
pub struct NeighborGrid {
    voxel_size: f64,
    cells: HashMap<CellKey, HashSet<usize>>,
    residue_cells: HashMap<usize, HashSet<CellKey>>,
}

impl NeighborGrid {
    pub fn new(voxel_size: f64) -> Self {
        Self {
            voxel_size,
            cells: HashMap::new(),
            residue_cells: HashMap::new(),
        }
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    #[inline]
    pub fn cell_key(&self, point: &Point3<f64>) -> CellKey {
        (
            (point.x / self.voxel_size).floor() as i64,
            (point.y / self.voxel_size).floor() as i64,
            (point.z / self.voxel_size).floor() as i64,
        )
    }

    /// Registers every atom of `residue`.
    ///
    /// The residue must not already be indexed; call [`clear_residue`](Self::clear_residue) first
    /// when it moves.
    pub fn index_residue(&mut self, residue: &Residue) {
        let keys: HashSet<CellKey> = residue
            .atoms()
            .iter()
            .map(|atom| self.cell_key(&atom.position))
            .collect();
        for key in &keys {
            self.cells.entry(*key).or_default().insert(residue.id);
        }
        self.residue_cells
            .entry(residue.id)
            .or_default()
            .extend(keys);
    }

    /// Removes `residue_id` from the grid. Unknown ids are ignored.
    pub fn clear_residue(&mut self, residue_id: usize) {
        let Some(keys) = self.residue_cells.remove(&residue_id) else {
            return;
        };
        for key in keys {
            if let Some(occupants) = self.cells.get_mut(&key) {
                occupants.remove(&residue_id);
                if occupants.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    /// Residues with an atom in any voxel within `ceil(radius / voxel_size)`
    /// cells of a query point.
    ///
    /// Every residue with an atom within `radius` of a point is returned; some
    /// residues slightly farther away may be returned as well.
    pub fn nearby_residues<'a, I>(&self, points: I, radius: f64) -> HashSet<usize>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let reach = (radius / self.voxel_size).ceil().max(0.0) as i64;
        let mut found = HashSet::new();
        let mut visited: HashSet<CellKey> = HashSet::new();

        for point in points {
            let (cx, cy, cz) = self.cell_key(point);
            for dx in -reach..=reach {
                for dy in -reach..=reach {
                    for dz in -reach..=reach {
                        let key = (cx + dx, cy + dy, cz + dz);
                        if !visited.insert(key) {
                            continue;
                        }
                        if let Some(occupants) = self.cells.get(&key) {
                            found.extend(occupants.iter().copied());
                        }
                    }
                }
            }
        }
        found
    }

    pub fn cells_of(&self, residue_id: usize) -> Option<&HashSet<CellKey>> {
        self.residue_cells.get(&residue_id)
    }

    pub fn is_indexed(&self, residue_id: usize) -> bool {
        self.residue_cells.contains_key(&residue_id)
    }

    pub fn occupied_cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Checks that both directions of the mapping agree.
    pub fn is_consistent(&self) -> bool {
        let forward = self.residue_cells.iter().all(|(id, keys)| {
            keys.iter()
                .all(|key| self.cells.get(key).is_some_and(|set| set.contains(id)))
        });
        let backward = self.cells.iter().all(|(key, ids)| {
            !ids.is_empty()
                && ids.iter().all(|id| {
                    self.residue_cells
                        .get(id)
                        .is_some_and(|keys| keys.contains(key))
                })
        });
        forward && backward
    }
}
