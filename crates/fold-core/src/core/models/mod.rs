//! # Core Models Module
//!
//! Fundamental data structures for a coarse protein structure.
//!
//! - [`atom`] - A named atom with its element and position
//! - [`residue`] - An amino-acid residue owning its atoms and side-chain χ angles
//!
//! ```ignore
//! use foldscore::core::models::{atom::Atom, residue::{Residue, ResidueType}};
//! use nalgebra::Point3;
//!
//! let atoms = vec![
//!     Atom::backbone("N", Point3::new(0.0, 0.0, 0.0)),
//!     Atom::backbone("CA", Point3::new(1.46, 0.0, 0.0)),
//!     Atom::backbone("C", Point3::new(2.0, 1.4, 0.0)),
//! ];
//! let residue = Residue::new(0, ResidueType::from_one_letter('A'), atoms);
//! ```

pub mod atom;
pub mod residue;
