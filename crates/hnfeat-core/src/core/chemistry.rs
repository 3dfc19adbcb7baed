use super::models::residue::ResidueType;
use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Label emitted for atoms that neither the mapping nor the terminal fallbacks cover.
pub const UNMAPPED_CHEMISTRY_TYPE: &str = "NOT FOUND";

/// Terminal atoms that force-field residue templates usually omit. `H1` has no
/// fallback.
static TERMINAL_FALLBACKS: Map<&'static str, &'static str> = phf_map! {
    "H2" => "H",
    "H3" => "H",
    "OXT" => "O",
};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChemistryTypeEntry {
    pub residue_name: String,
    pub atom_name: String,
    pub chemistry_type: String,
}

/// Maps (residue type, atom name) to a force-field style chemistry label such as
/// an AMBER atom type.
#[derive(Debug, Clone, Default)]
pub struct ChemistryTypeMap {
    entries: HashMap<(ResidueType, String), String>,
}

#[derive(Debug, Error)]
pub enum ChemistryLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Unknown residue '{residue}' in chemistry map '{path}'")]
    UnknownResidue { path: String, residue: String },
    #[error("Conflicting chemistry types for {residue} {atom}: '{first}' and '{second}'")]
    Conflict {
        residue: ResidueType,
        atom: String,
        first: String,
        second: String,
    },
}

impl ChemistryTypeMap {
    pub fn load(path: &Path) -> Result<Self, ChemistryLoadError> {
        let file = std::fs::File::open(path).map_err(|e| ChemistryLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_reader(file, &path.to_string_lossy())
    }

    /// Parses a `residue_name,atom_name,chemistry_type` CSV. `origin` is only
    /// used in error messages.
    pub fn from_reader(reader: impl Read, origin: &str) -> Result<Self, ChemistryLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut map = Self::default();
        for result in csv_reader.deserialize::<ChemistryTypeEntry>() {
            let entry = result.map_err(|e| ChemistryLoadError::Csv {
                path: origin.to_string(),
                source: e,
            })?;
            let residue = ResidueType::from_three_letter(&entry.residue_name).ok_or_else(|| {
                ChemistryLoadError::UnknownResidue {
                    path: origin.to_string(),
                    residue: entry.residue_name.clone(),
                }
            })?;
            map.insert(residue, &entry.atom_name, &entry.chemistry_type)?;
        }
        Ok(map)
    }

    pub fn insert(
        &mut self,
        residue: ResidueType,
        atom_name: &str,
        chemistry_type: &str,
    ) -> Result<(), ChemistryLoadError> {
        let key = (residue, atom_name.trim().to_string());
        if let Some(existing) = self.entries.get(&key) {
            if existing != chemistry_type {
                return Err(ChemistryLoadError::Conflict {
                    residue,
                    atom: key.1,
                    first: existing.clone(),
                    second: chemistry_type.to_string(),
                });
            }
            return Ok(());
        }
        self.entries.insert(key, chemistry_type.to_string());
        Ok(())
    }

    /// Returns the chemistry label of an atom, applying terminal fallbacks and
    /// [`UNMAPPED_CHEMISTRY_TYPE`] for anything else.
    pub fn label_for(&self, residue: ResidueType, atom_name: &str) -> &str {
        let atom_name = atom_name.trim();
        if let Some(label) = self.entries.get(&(residue, atom_name.to_string())) {
            return label;
        }
        TERMINAL_FALLBACKS
            .get(atom_name)
            .copied()
            .unwrap_or(UNMAPPED_CHEMISTRY_TYPE)
    }

    /// The sorted set of labels this map can emit, fallbacks included.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut labels: BTreeSet<String> = self.entries.values().cloned().collect();
        labels.extend(TERMINAL_FALLBACKS.values().map(|s| s.to_string()));
        labels.insert(UNMAPPED_CHEMISTRY_TYPE.to_string());
        labels.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
