//! # foldscore Core Library
//!
//! An incremental scoring engine for coarse protein backbone structures. It
//! scores a chain with six energy terms and, after a local perturbation,
//! rescores only the residues whose surroundings changed.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Atom`, `Residue`),
//!   geometry helpers and the pure energy functions of each scoring term.
//!
//! - **[`engine`]: The Logic Core.** The stateful layer: a `State` with its
//!   neighbor grid and versioned score cache, the moves that perturb it, and the
//!   full and incremental scoring passes.
//!
//! - **[`workflows`]: The Public API.** Entry points that build a scoring state
//!   from a sequence and backbone coordinates, or evaluate a standalone
//!   structure snapshot in one call.

pub mod core;
pub mod engine;
pub mod workflows;
