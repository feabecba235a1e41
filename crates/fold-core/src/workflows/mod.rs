//! # Workflows Module
//!
//! High-level entry points for users of foldscore.
//!
//! - **State Construction** ([`build`]) - Turns a one-letter sequence and an N/CA/C
//!   trace into an indexed scoring state with derived O and H atoms.
//! - **Snapshot Evaluation** ([`snapshot`]) - Scores an explicit atom list and
//!   residue table in a single stateless pass.
//!
//! Both validate their inputs at the boundary and report failures through the
//! engine's error types.

pub mod build;
pub mod snapshot;
