use super::emit_report;
use crate::cli::EvaluateArgs;
use crate::config::resolve_engine_config;
use crate::error::{CliError, Result};
use foldscore::workflows::snapshot::{SnapshotRequest, evaluate_with};
use tracing::{debug, info};

pub fn run(args: EvaluateArgs) -> Result<()> {
    let config = resolve_engine_config(&args.engine)?;

    debug!("Loading snapshot request from file: {:?}", &args.input);
    let content = std::fs::read_to_string(&args.input)?;
    let request: SnapshotRequest =
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;

    let report = evaluate_with(&request, &config)?;
    info!(score = report.score, labels = %report.labels, "Snapshot evaluated.");
    emit_report(&report, args.output.as_deref())
}
