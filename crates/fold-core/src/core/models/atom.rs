use nalgebra::Point3;

/// Represents a single atom of a residue.
///
/// Atoms are identified by their name within the owning residue (e.g. "N", "CA",
/// "C", "O", "H"); the residue index is carried by the [`Residue`](super::residue::Residue)
/// that owns them. Every consumer works with this one explicit record, so
/// external representations must be converted at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom within its residue (e.g., "CA").
    pub name: String,
    /// The chemical element symbol (e.g., "C", "N"), used for radius lookups.
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new atom.
    ///
    /// # Arguments
    ///
    /// * `name` - The atom name within its residue.
    /// * `element` - The element symbol.
    /// * `position` - The 3D coordinates.
    ///
    /// # Return
    ///
    /// Returns a new `Atom` instance.
    pub fn new(name: &str, element: &str, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            element: element.to_string(),
            position,
        }
    }

    /// Creates a backbone atom whose element is inferred from the first letter of its name.
    pub fn backbone(name: &str, position: Point3<f64>) -> Self {
        let element: String = name.chars().take(1).collect();
        Self::new(name, &element, position)
    }
}
