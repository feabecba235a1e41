use phf::{Map, phf_map};

static ONE_TO_THREE_LETTER: Map<char, &'static str> = phf_map! {
    'A' => "ALA", 'R' => "ARG", 'N' => "ASN", 'D' => "ASP", 'C' => "CYS",
    'Q' => "GLN", 'E' => "GLU", 'G' => "GLY", 'H' => "HIS", 'I' => "ILE",
    'L' => "LEU", 'K' => "LYS", 'M' => "MET", 'F' => "PHE", 'P' => "PRO",
    'S' => "SER", 'T' => "THR", 'W' => "TRP", 'Y' => "TYR", 'V' => "VAL",
};

static VAN_DER_WAALS_RADII: Map<&'static str, f64> = phf_map! {
    "C" => 1.70,
    "N" => 1.55,
    "O" => 1.52,
    "S" => 1.80,
    "H" => 1.10,
};

static RESIDUE_CHI_COUNTS: Map<&'static str, usize> = phf_map! {
    "ALA" => 0, "GLY" => 0, "PRO" => 0,
    "SER" => 1, "CYS" => 1, "VAL" => 1, "THR" => 1,
    "ASN" => 2, "ASP" => 2, "LEU" => 2, "ILE" => 2,
    "HIS" => 2, "PHE" => 2, "TYR" => 2, "TRP" => 2,
    "GLN" => 3, "GLU" => 3, "MET" => 3,
    "LYS" => 4, "ARG" => 4,
};

pub const UNKNOWN_RESIDUE_CODE: &str = "UNK";

/// Maps a one-letter amino acid code to its three-letter code.
///
/// Lowercase letters are accepted. Anything outside the twenty standard
/// residues maps to `"UNK"`.
pub fn three_letter_code(one_letter: char) -> &'static str {
    ONE_TO_THREE_LETTER
        .get(&one_letter.to_ascii_uppercase())
        .copied()
        .unwrap_or(UNKNOWN_RESIDUE_CODE)
}

/// Looks up the van der Waals radius (Å) for an element symbol, case-insensitively.
pub fn van_der_waals_radius(element: &str) -> Option<f64> {
    VAN_DER_WAALS_RADII
        .get(element.trim().to_ascii_uppercase().as_str())
        .copied()
}

/// Returns the number of side-chain χ angles expected for a three-letter residue code,
/// or `None` for residues outside the table.
pub fn expected_chi_count(three_letter: &str) -> Option<usize> {
    RESIDUE_CHI_COUNTS
        .get(normalize_residue_code(three_letter).as_str())
        .copied()
}

pub fn normalize_residue_code(code: &str) -> String {
    let trimmed = code.trim().to_ascii_uppercase();
    if trimmed.len() <= 3 {
        trimmed
    } else {
        trimmed.chars().take(3).collect()
    }
}
