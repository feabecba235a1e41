pub mod evaluate;
pub mod score;

use crate::error::{CliError, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Renders `report` as TOML into `output`, or to standard output when no path is given.
pub(crate) fn emit_report<T: Serialize>(report: &T, output: Option<&Path>) -> Result<()> {
    let rendered = toml::to_string_pretty(report).map_err(|e| CliError::Other(e.into()))?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!("Report written to {:?}", path);
            println!("✓ Report written to: {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
