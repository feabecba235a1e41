use crate::cli::EngineArgs;
use crate::error::{CliError, Result};
use foldscore::core::forcefield::term::Term;
use foldscore::engine::config::{EngineConfig, EngineConfigBuilder};
use foldscore::engine::error::EngineError;
use tracing::debug;

/// Resolves the engine configuration: defaults, then the config file, then
/// command-line overrides.
pub fn resolve_engine_config(args: &EngineArgs) -> Result<EngineConfig> {
    let base = match &args.config {
        Some(path) => {
            debug!("Loading engine configuration from file: {:?}", path);
            EngineConfig::from_toml_file(path).map_err(EngineError::from)?
        }
        None => EngineConfig::default(),
    };

    let mut builder = EngineConfigBuilder::from(base);
    if let Some(radius) = args.radius {
        builder = builder.interaction_radius(radius);
        // Let the voxel follow the new radius unless it is set explicitly too.
        if args.voxel_size.is_none() {
            builder = builder.voxel_size(radius / 2.0);
        }
    }
    if let Some(voxel_size) = args.voxel_size {
        builder = builder.voxel_size(voxel_size);
    }
    for (term, weight) in parse_set_values(&args.set_values)? {
        builder = builder.weight(term, weight);
    }

    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

fn parse_set_values(set_values: &[String]) -> Result<Vec<(Term, f64)>> {
    set_values
        .iter()
        .map(|kv_pair| {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected TERM=WEIGHT.",
                    kv_pair
                ))
            })?;
            let term: Term = key
                .trim()
                .parse()
                .map_err(|e: foldscore::core::forcefield::term::ParseTermError| {
                    CliError::Config(e.to_string())
                })?;
            let weight: f64 = value_str.trim().parse().map_err(|_| {
                CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
            })?;
            Ok((term, weight))
        })
        .collect()
}
