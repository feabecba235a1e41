use super::config::ConfigError;
use super::moves::MoveError;
use crate::core::forcefield::error::TermError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BuildError {
    #[error("Cannot build a structure from an empty sequence")]
    EmptySequence,

    #[error("Expected {expected} backbone coordinates (3 per residue), received {found}")]
    CoordinateCount { expected: usize, found: usize },

    #[error("Coordinate {index} contains a non-finite component")]
    NonFiniteCoordinate { index: usize },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Energy term evaluation failed: {source}")]
    Term {
        #[from]
        source: TermError,
    },

    #[error("Invalid move: {source}")]
    Move {
        #[from]
        source: MoveError,
    },

    #[error("Failed to build structure: {source}")]
    Build {
        #[from]
        source: BuildError,
    },

    #[error("Invalid engine configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Residue {0} not found in structure")]
    ResidueNotFound(usize),
}
