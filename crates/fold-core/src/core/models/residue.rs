use super::atom::Atom;
use crate::core::forcefield::ramachandran::RamaClass;
use crate::core::utils::geometry;
use crate::core::utils::identifiers;
use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidueType {
    // --- Aliphatic, Nonpolar ---
    Alanine,    // ALA
    Glycine,    // GLY
    Isoleucine, // ILE
    Leucine,    // LEU
    Proline,    // PRO
    Valine,     // VAL

    // --- Aromatic ---
    Phenylalanine, // PHE
    Tryptophan,    // TRP
    Tyrosine,      // TYR

    // --- Polar, Uncharged ---
    Asparagine, // ASN
    Cysteine,   // CYS
    Glutamine,  // GLN
    Serine,     // SER
    Threonine,  // THR
    Methionine, // MET

    // --- Charged ---
    Arginine,     // ARG
    Lysine,       // LYS
    AsparticAcid, // ASP
    GlutamicAcid, // GLU
    Histidine,    // HIS

    // --- Anything outside the standard twenty ---
    Unknown, // UNK
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Invalid residue name: '{0}'")]
pub struct ParseResidueTypeError(String);

impl ResidueType {
    pub fn from_one_letter(code: char) -> Self {
        identifiers::three_letter_code(code)
            .parse()
            .unwrap_or(ResidueType::Unknown)
    }

    pub fn to_three_letter(&self) -> &'static str {
        match self {
            ResidueType::Alanine => "ALA",
            ResidueType::Glycine => "GLY",
            ResidueType::Isoleucine => "ILE",
            ResidueType::Leucine => "LEU",
            ResidueType::Proline => "PRO",
            ResidueType::Valine => "VAL",
            ResidueType::Phenylalanine => "PHE",
            ResidueType::Tryptophan => "TRP",
            ResidueType::Tyrosine => "TYR",
            ResidueType::Asparagine => "ASN",
            ResidueType::Cysteine => "CYS",
            ResidueType::Glutamine => "GLN",
            ResidueType::Serine => "SER",
            ResidueType::Threonine => "THR",
            ResidueType::Methionine => "MET",
            ResidueType::Arginine => "ARG",
            ResidueType::Lysine => "LYS",
            ResidueType::AsparticAcid => "ASP",
            ResidueType::GlutamicAcid => "GLU",
            ResidueType::Histidine => "HIS",
            ResidueType::Unknown => identifiers::UNKNOWN_RESIDUE_CODE,
        }
    }

    /// Number of side-chain χ angles this residue type carries.
    ///
    /// Residues outside the standard table are treated as having a single χ angle.
    pub fn expected_chi_count(&self) -> usize {
        identifiers::expected_chi_count(self.to_three_letter()).unwrap_or(1)
    }

    pub fn rama_class(&self) -> RamaClass {
        match self {
            ResidueType::Glycine => RamaClass::Glycine,
            ResidueType::Proline => RamaClass::Proline,
            _ => RamaClass::General,
        }
    }
}

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match identifiers::normalize_residue_code(s).as_str() {
            "ALA" => Ok(ResidueType::Alanine),
            "GLY" => Ok(ResidueType::Glycine),
            "ILE" => Ok(ResidueType::Isoleucine),
            "LEU" => Ok(ResidueType::Leucine),
            "PRO" => Ok(ResidueType::Proline),
            "VAL" => Ok(ResidueType::Valine),
            "PHE" => Ok(ResidueType::Phenylalanine),
            "TRP" => Ok(ResidueType::Tryptophan),
            "TYR" => Ok(ResidueType::Tyrosine),
            "ASN" => Ok(ResidueType::Asparagine),
            "CYS" => Ok(ResidueType::Cysteine),
            "GLN" => Ok(ResidueType::Glutamine),
            "SER" => Ok(ResidueType::Serine),
            "THR" => Ok(ResidueType::Threonine),
            "MET" => Ok(ResidueType::Methionine),
            "ARG" => Ok(ResidueType::Arginine),
            "LYS" => Ok(ResidueType::Lysine),
            "ASP" => Ok(ResidueType::AsparticAcid),
            "GLU" => Ok(ResidueType::GlutamicAcid),
            "HIS" => Ok(ResidueType::Histidine),
            "UNK" => Ok(ResidueType::Unknown),
            _ => Err(ParseResidueTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_three_letter())
    }
}

/// One amino-acid unit of a structure.
///
/// Residues are identified by their 0-based position in the chain and own
/// their atoms exclusively. Atom coordinates change only through the
/// coordinate-update operations of [`State`](crate::engine::state::State).
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    /// The 0-based index of the residue within its structure.
    pub id: usize,
    /// The residue type.
    pub residue_type: ResidueType,
    pub(crate) atoms: Vec<Atom>,
    pub(crate) chi_angles: Vec<f64>,
}

impl Residue {
    /// Canonical χ value assigned to freshly built side chains (gauche-).
    pub const DEFAULT_CHI: f64 = -60.0;

    /// Creates a residue with the given atoms and canonical χ angles.
    ///
    /// # Arguments
    ///
    /// * `id` - The residue index.
    /// * `residue_type` - The amino acid type.
    /// * `atoms` - The atoms owned by the residue, in order.
    ///
    /// # Return
    ///
    /// Returns a new `Residue` whose χ angles sit at the centre of a library rotamer bin.
    pub fn new(id: usize, residue_type: ResidueType, atoms: Vec<Atom>) -> Self {
        let chi_angles = vec![Self::DEFAULT_CHI; residue_type.expected_chi_count()];
        Self {
            id,
            residue_type,
            atoms,
            chi_angles,
        }
    }

    /// The three-letter code of the residue type.
    pub fn name(&self) -> &'static str {
        self.residue_type.to_three_letter()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn chi_angles(&self) -> &[f64] {
        &self.chi_angles
    }

    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|atom| atom.name == name)
    }

    pub fn position(&self, name: &str) -> Option<Point3<f64>> {
        self.atom(name).map(|atom| atom.position)
    }

    pub(crate) fn set_position(&mut self, name: &str, position: Point3<f64>) -> bool {
        match self.atoms.iter_mut().find(|atom| atom.name == name) {
            Some(atom) => {
                atom.position = position;
                true
            }
            None => false,
        }
    }

    pub fn centroid(&self) -> Option<Point3<f64>> {
        geometry::centroid(self.atoms.iter().map(|atom| &atom.position))
    }
}
