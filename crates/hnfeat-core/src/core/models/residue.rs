use super::ids::AtomId;
use phf::{Map, phf_map};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidueType {
    Alanine,       // ALA
    Arginine,      // ARG
    Asparagine,    // ASN
    AsparticAcid,  // ASP
    Cysteine,      // CYS
    Glutamine,     // GLN
    GlutamicAcid,  // GLU
    Glycine,       // GLY
    Histidine,     // HIS
    Isoleucine,    // ILE
    Leucine,       // LEU
    Lysine,        // LYS
    Methionine,    // MET
    Phenylalanine, // PHE
    Proline,       // PRO
    Serine,        // SER
    Threonine,     // THR
    Tryptophan,    // TRP
    Tyrosine,      // TYR
    Valine,        // VAL
}

static THREE_LETTER_CODES: Map<&'static str, ResidueType> = phf_map! {
    "ALA" => ResidueType::Alanine,
    "ARG" => ResidueType::Arginine,
    "ASN" => ResidueType::Asparagine,
    "ASP" => ResidueType::AsparticAcid,
    "CYS" => ResidueType::Cysteine,
    "GLN" => ResidueType::Glutamine,
    "GLU" => ResidueType::GlutamicAcid,
    "GLY" => ResidueType::Glycine,
    "HIS" => ResidueType::Histidine,
    "ILE" => ResidueType::Isoleucine,
    "LEU" => ResidueType::Leucine,
    "LYS" => ResidueType::Lysine,
    "MET" => ResidueType::Methionine,
    "PHE" => ResidueType::Phenylalanine,
    "PRO" => ResidueType::Proline,
    "SER" => ResidueType::Serine,
    "THR" => ResidueType::Threonine,
    "TRP" => ResidueType::Tryptophan,
    "TYR" => ResidueType::Tyrosine,
    "VAL" => ResidueType::Valine,
};

impl ResidueType {
    /// The canonical residue vocabulary, ordered alphabetically by three-letter
    /// code. Position in this array is the residue type id.
    pub const ALL: [ResidueType; 20] = [
        ResidueType::Alanine,
        ResidueType::Arginine,
        ResidueType::Asparagine,
        ResidueType::AsparticAcid,
        ResidueType::Cysteine,
        ResidueType::Glutamine,
        ResidueType::GlutamicAcid,
        ResidueType::Glycine,
        ResidueType::Histidine,
        ResidueType::Isoleucine,
        ResidueType::Leucine,
        ResidueType::Lysine,
        ResidueType::Methionine,
        ResidueType::Phenylalanine,
        ResidueType::Proline,
        ResidueType::Serine,
        ResidueType::Threonine,
        ResidueType::Tryptophan,
        ResidueType::Tyrosine,
        ResidueType::Valine,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn from_three_letter(code: &str) -> Option<Self> {
        THREE_LETTER_CODES
            .get(code.trim().to_ascii_uppercase().as_str())
            .copied()
    }

    pub fn to_three_letter(self) -> &'static str {
        match self {
            ResidueType::Alanine => "ALA",
            ResidueType::Arginine => "ARG",
            ResidueType::Asparagine => "ASN",
            ResidueType::AsparticAcid => "ASP",
            ResidueType::Cysteine => "CYS",
            ResidueType::Glutamine => "GLN",
            ResidueType::GlutamicAcid => "GLU",
            ResidueType::Glycine => "GLY",
            ResidueType::Histidine => "HIS",
            ResidueType::Isoleucine => "ILE",
            ResidueType::Leucine => "LEU",
            ResidueType::Lysine => "LYS",
            ResidueType::Methionine => "MET",
            ResidueType::Phenylalanine => "PHE",
            ResidueType::Proline => "PRO",
            ResidueType::Serine => "SER",
            ResidueType::Threonine => "THR",
            ResidueType::Tryptophan => "TRP",
            ResidueType::Tyrosine => "TYR",
            ResidueType::Valine => "VAL",
        }
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_three_letter())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unrecognized residue type: '{0}'")]
pub struct ParseResidueTypeError(pub String);

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_three_letter(s).ok_or_else(|| ParseResidueTypeError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub index: usize,                       // 0-based position in the featurized sequence
    pub number: isize,                      // Residue sequence number from source file
    pub insertion_code: Option<char>,       // PDB insertion code, if any
    pub name: String,                       // Name as written in the file (e.g. "ALA", "HOH")
    pub residue_type: Option<ResidueType>,  // Canonical type, `None` for non-standard residues
    pub chain_id: char,                     // Chain the residue belongs to
    pub(crate) atoms: Vec<AtomId>,          // Atoms in file order
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its stable ID
}

impl Residue {
    pub(crate) fn new(
        index: usize,
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        chain_id: char,
    ) -> Self {
        let name = name.trim();
        Self {
            index,
            number,
            insertion_code,
            name: name.to_string(),
            residue_type: ResidueType::from_three_letter(name),
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    /// Registers an atom; returns `false` (and ignores the atom) if the residue
    /// already holds an atom of the same name, e.g. a second alternate location.
    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) -> bool {
        if self.atom_name_map.contains_key(atom_name) {
            return false;
        }
        self.atoms.push(atom_id);
        self.atom_name_map.insert(atom_name.to_string(), atom_id);
        true
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atom_name_map.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn residue_ids_are_alphabetical_by_code() {
        let codes: Vec<&str> = ResidueType::ALL.iter().map(|r| r.to_three_letter()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
        assert_eq!(ResidueType::Alanine.id(), 0);
        assert_eq!(ResidueType::Glycine.id(), 7);
        assert_eq!(ResidueType::Valine.id(), 19);
    }

    #[test]
    fn from_id_round_trips_through_vocabulary() {
        for residue_type in ResidueType::ALL {
            assert_eq!(ResidueType::from_id(residue_type.id()), Some(residue_type));
        }
        assert_eq!(ResidueType::from_id(20), None);
    }

    #[test]
    fn from_three_letter_is_case_insensitive_and_rejects_unknowns() {
        assert_eq!(ResidueType::from_three_letter("gly"), Some(ResidueType::Glycine));
        assert_eq!(ResidueType::from_three_letter(" TRP "), Some(ResidueType::Tryptophan));
        assert_eq!(ResidueType::from_three_letter("HOH"), None);
        assert_eq!(ResidueType::from_three_letter("MSE"), None);
        assert!("XYZ".parse::<ResidueType>().is_err());
    }

    #[test]
    fn new_residue_resolves_type_from_name() {
        let residue = Residue::new(3, 12, None, "LYS", 'A');
        assert_eq!(residue.index, 3);
        assert_eq!(residue.number, 12);
        assert_eq!(residue.residue_type, Some(ResidueType::Lysine));
        assert!(residue.atoms().is_empty());

        let water = Residue::new(4, 13, None, "HOH", 'A');
        assert_eq!(water.residue_type, None);
    }

    #[test]
    fn add_atom_ignores_duplicate_names() {
        let mut residue = Residue::new(0, 1, None, "SER", 'A');
        assert!(residue.add_atom("OG", dummy_atom_id(1)));
        assert!(!residue.add_atom("OG", dummy_atom_id(2)));
        assert_eq!(residue.atoms(), &[dummy_atom_id(1)]);
        assert_eq!(residue.get_atom_id_by_name("OG"), Some(dummy_atom_id(1)));
        assert!(residue.has_atom("OG"));
        assert!(!residue.has_atom("CB"));
    }
}
