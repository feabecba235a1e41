use super::emit_report;
use crate::cli::ScoreArgs;
use crate::config::resolve_engine_config;
use crate::error::{CliError, Result};
use crate::structure::StructureFile;
use foldscore::core::forcefield::term::Term;
use foldscore::engine::error::EngineError;
use foldscore::engine::moves::apply_move;
use foldscore::engine::scoring::{ScoreReport, local_rescore, score_total};
use foldscore::engine::stats::ScoreStats;
use foldscore::workflows::build::build_state_with;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct StepReport {
    residue: usize,
    kind: &'static str,
    moved: Vec<usize>,
    report: ScoreReport,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    full_passes: u64,
    incremental_passes: u64,
    term_calls: BTreeMap<&'static str, u64>,
}

impl From<&ScoreStats> for StatsReport {
    fn from(stats: &ScoreStats) -> Self {
        Self {
            full_passes: stats.full_passes,
            incremental_passes: stats.incremental_passes,
            term_calls: Term::ALL
                .into_iter()
                .map(|term| (term.name(), stats.calls(term)))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ScoreTranscript {
    initial: ScoreReport,
    steps: Vec<StepReport>,
    stats: StatsReport,
}

pub fn run(args: ScoreArgs) -> Result<()> {
    let config = resolve_engine_config(&args.engine)?;
    let structure = StructureFile::from_file(&args.structure)?;
    let residue_count = structure.sequence.chars().count();
    if let Some((index, entry)) = structure
        .moves
        .iter()
        .enumerate()
        .find(|(_, entry)| entry.residue >= residue_count)
    {
        return Err(CliError::Argument(format!(
            "Move {} targets residue {}, but the structure has {} residue(s).",
            index + 1,
            entry.residue,
            residue_count
        )));
    }

    info!("Building scoring state for {} residue(s)...", residue_count);
    let mut state = build_state_with(config, &structure.sequence, &structure.points())
        .map_err(EngineError::from)?;
    if structure.target_ss.is_some() {
        state.set_target_ss(structure.target_ss.clone());
    }

    let initial = score_total(&mut state)?;
    info!(score = initial.score, "Initial structure scored.");

    let mut steps = Vec::with_capacity(structure.moves.len());
    for entry in &structure.moves {
        let moved = apply_move(&mut state, entry.residue, &entry.change)
            .map_err(EngineError::from)?;
        if moved.is_empty() {
            warn!(
                residue = entry.residue,
                "The {} move changed no coordinates.",
                entry.change.kind()
            );
        }
        let report = local_rescore(&mut state, &moved)?;
        info!(
            residue = entry.residue,
            score = report.score,
            "Rescored after {} move.",
            entry.change.kind()
        );
        steps.push(StepReport {
            residue: entry.residue,
            kind: entry.change.kind(),
            moved: moved.into_iter().collect(),
            report,
        });
    }

    let transcript = ScoreTranscript {
        initial,
        steps,
        stats: StatsReport::from(state.stats()),
    };
    emit_report(&transcript, args.output.as_deref())
}
