//! # Engine Module
//!
//! The stateful layer of foldscore. It owns a structure under edit and keeps its
//! score up to date as the structure is perturbed.
//!
//! ## Overview
//!
//! A [`state::State`] holds the residues, a flat atom index, a voxel
//! [`grid::NeighborGrid`] and a per-residue [`cache::ScoreCache`]. Moves from
//! [`moves`] write coordinates through the state, which records what changed.
//! [`scoring::local_rescore`] then recomputes only the residues whose
//! neighborhood could have been affected, while [`scoring::score_total`]
//! recomputes everything.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Grid resolution, interaction radius and term weights
//! - **Neighbor Grid** ([`grid`]) - Spatial hashing for radius queries
//! - **Score Cache** ([`cache`]) - Versioned per-residue term values
//! - **Moves** ([`moves`]) - Backbone torsion, rotamer and displacement perturbations
//! - **Scoring** ([`scoring`]) - Full and incremental score passes
//! - **Statistics** ([`stats`]) - Term evaluation counters
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod cache;
pub mod config;
pub mod error;
pub mod grid;
pub mod moves;
pub mod scoring;
pub mod state;
pub mod stats;
