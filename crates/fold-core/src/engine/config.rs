use crate::core::forcefield::clash::{ClashParams, DEFAULT_CUTOFF, DEFAULT_SOFTNESS};
use crate::core::forcefield::hbond::HBOND_GAMMA;
use crate::core::forcefield::term::{ParseTermError, Term, Weights};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_INTERACTION_RADIUS: f64 = DEFAULT_CUTOFF;
pub const DEFAULT_VOXEL_SIZE: f64 = DEFAULT_INTERACTION_RADIUS / 2.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(
        "Voxel size {voxel_size} is larger than half the interaction radius {interaction_radius}"
    )]
    VoxelTooCoarse {
        voxel_size: f64,
        interaction_radius: f64,
    },

    #[error("Failed to read config file '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}", path = path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Tunable parameters of the scoring engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Edge length (Å) of a neighbor-grid voxel.
    pub voxel_size: f64,
    /// Pair terms are only evaluated between residues closer than this (Å).
    pub interaction_radius: f64,
    pub clash_softness: f64,
    pub hbond_gamma: f64,
    /// Initial term weights; `None` leaves them to be filled lazily with defaults.
    pub weights: Option<Weights>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            voxel_size: DEFAULT_VOXEL_SIZE,
            interaction_radius: DEFAULT_INTERACTION_RADIUS,
            clash_softness: DEFAULT_SOFTNESS,
            hbond_gamma: HBOND_GAMMA,
            weights: None,
        }
    }
}

impl EngineConfig {
    pub fn clash_params(&self) -> ClashParams {
        ClashParams {
            softness: self.clash_softness,
            cutoff: self.interaction_radius,
        }
    }

    /// Loads a kebab-case TOML file; keys absent from the file keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: EngineConfigFile =
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
        file.into_builder()?.build()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct EngineConfigFile {
    voxel_size: Option<f64>,
    interaction_radius: Option<f64>,
    clash_softness: Option<f64>,
    hbond_gamma: Option<f64>,
    weights: Option<BTreeMap<String, f64>>,
}

impl EngineConfigFile {
    fn into_builder(self) -> Result<EngineConfigBuilder, ConfigError> {
        let mut builder = EngineConfigBuilder::new();
        if let Some(v) = self.voxel_size {
            builder = builder.voxel_size(v);
        }
        if let Some(v) = self.interaction_radius {
            builder = builder.interaction_radius(v);
        }
        if let Some(v) = self.clash_softness {
            builder = builder.clash_softness(v);
        }
        if let Some(v) = self.hbond_gamma {
            builder = builder.hbond_gamma(v);
        }
        if let Some(raw) = self.weights {
            builder = builder.weights(parse_weights(&raw)?);
        }
        Ok(builder)
    }
}

/// Resolves term names to [`Term`]s.
pub fn parse_weights(raw: &BTreeMap<String, f64>) -> Result<Weights, ConfigError> {
    raw.iter()
        .map(|(name, &weight)| {
            let term: Term = name.parse().map_err(|e: ParseTermError| {
                ConfigError::InvalidParameter {
                    name: "weights",
                    reason: e.to_string(),
                }
            })?;
            Ok((term, weight))
        })
        .collect()
}

#[derive(Debug, Default, Clone)]
pub struct EngineConfigBuilder {
    voxel_size: Option<f64>,
    interaction_radius: Option<f64>,
    clash_softness: Option<f64>,
    hbond_gamma: Option<f64>,
    weights: Option<Weights>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voxel_size(mut self, size: f64) -> Self {
        self.voxel_size = Some(size);
        self
    }
    pub fn interaction_radius(mut self, radius: f64) -> Self {
        self.interaction_radius = Some(radius);
        self
    }
    pub fn clash_softness(mut self, softness: f64) -> Self {
        self.clash_softness = Some(softness);
        self
    }
    pub fn hbond_gamma(mut self, gamma: f64) -> Self {
        self.hbond_gamma = Some(gamma);
        self
    }
    pub fn weights(mut self, weights: Weights) -> Self {
        self.weights = Some(weights);
        self
    }
    /// Overrides a single weight, keeping any others already set.
    pub fn weight(mut self, term: Term, weight: f64) -> Self {
        self.weights.get_or_insert_with(Weights::new).insert(term, weight);
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let defaults = EngineConfig::default();
        let interaction_radius = self
            .interaction_radius
            .unwrap_or(defaults.interaction_radius);
        let voxel_size = self
            .voxel_size
            .unwrap_or_else(|| interaction_radius / 2.0);
        let clash_softness = self.clash_softness.unwrap_or(defaults.clash_softness);
        let hbond_gamma = self.hbond_gamma.unwrap_or(defaults.hbond_gamma);

        require_positive("interaction_radius", interaction_radius)?;
        require_positive("voxel_size", voxel_size)?;
        require_finite("clash_softness", clash_softness)?;
        require_finite("hbond_gamma", hbond_gamma)?;
        if clash_softness < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "clash_softness",
                reason: format!("must not be negative, got {clash_softness}"),
            });
        }
        if voxel_size > interaction_radius / 2.0 {
            return Err(ConfigError::VoxelTooCoarse {
                voxel_size,
                interaction_radius,
            });
        }
        if let Some(weights) = &self.weights {
            for (term, &weight) in weights {
                if !weight.is_finite() {
                    return Err(ConfigError::InvalidParameter {
                        name: "weights",
                        reason: format!("weight of '{term}' is not finite"),
                    });
                }
            }
        }

        Ok(EngineConfig {
            voxel_size,
            interaction_radius,
            clash_softness,
            hbond_gamma,
            weights: self.weights,
        })
    }
}

impl From<EngineConfig> for EngineConfigBuilder {
    fn from(config: EngineConfig) -> Self {
        Self {
            voxel_size: Some(config.voxel_size),
            interaction_radius: Some(config.interaction_radius),
            clash_softness: Some(config.clash_softness),
            hbond_gamma: Some(config.hbond_gamma),
            weights: config.weights,
        }
    }
}

fn require_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be finite, got {value}"),
        })
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    require_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be positive, got {value}"),
        })
    }
}
