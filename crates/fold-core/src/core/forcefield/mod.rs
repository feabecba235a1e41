//! # Force Field Module
//!
//! Pure evaluators for the six scoring terms. Every function takes explicit
//! inputs, holds no shared mutable state, and fails loudly through
//! [`error::TermError`] on lookup problems instead of silently scoring zero.
//!
//! ## Key Components
//!
//! - [`clash`] - Soft-sphere steric overlap between atoms
//! - [`ramachandran`] - Binned backbone torsion statistics with bilinear interpolation
//! - [`rotamer`] - Distance of χ angles from a canonical rotamer library
//! - [`hbond`] - Backbone hydrogen-bond geometry and the capped bonus
//! - [`secondary`] - DSSP-lite helix/strand/coil labels and target mismatch
//! - [`potentials`] - Scalar kernels shared by the evaluators (angle wrapping, compactness)
//! - [`term`] - The term enumeration, weights, and per-term value records

pub mod clash;
pub mod error;
pub mod hbond;
pub mod potentials;
pub mod ramachandran;
pub mod rotamer;
pub mod secondary;
pub mod term;
