use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TermError {
    #[error("Unsupported element '{0}' for clash calculation")]
    UnknownElement(String),

    #[error("Unknown residue class '{class}' for Ramachandran lookup; expected one of {valid}")]
    UnknownResidueClass { class: String, valid: String },

    #[error("Residue {residue} ({residue_type}) expected {expected} chi angles, received {found}")]
    MissingChi {
        residue: usize,
        residue_type: String,
        expected: usize,
        found: usize,
    },

    #[error("Unknown residue index {0} for rotamer lookup")]
    UnknownResidue(usize),
}
