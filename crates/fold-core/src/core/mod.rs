//! # Core Module
//!
//! This module provides the stateless building blocks of the scoring engine: the
//! structural data models, geometric utilities, and the pure energy term evaluators
//! whose numeric contracts define what a correct per-residue score looks like.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, and residue types
//! - **Energy Terms** ([`forcefield`]) - Clash, Ramachandran, rotamer, hydrogen bond,
//!   secondary structure, and compactness evaluators
//! - **Utilities** ([`utils`]) - Vector geometry and static lookup tables
//!
//! Nothing in this module holds mutable state; the incremental bookkeeping lives in
//! [`crate::engine`].

pub mod forcefield;
pub mod models;
pub mod utils;
