use crate::error::{CliError, Result};
use foldscore::engine::moves::Move;
use nalgebra::Point3;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// A move applied to one residue, as listed under `[[moves]]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoveEntry {
    pub residue: usize,
    #[serde(flatten)]
    pub change: Move,
}

/// Contents of a structure file given to the `score` command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StructureFile {
    pub sequence: String,
    /// N, CA and C of every residue in chain order.
    pub coords: Vec<[f64; 3]>,
    pub target_ss: Option<String>,
    #[serde(default)]
    pub moves: Vec<MoveEntry>,
}

impl StructureFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading structure from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn points(&self) -> Vec<Point3<f64>> {
        self.coords.iter().copied().map(Point3::from).collect()
    }
}
