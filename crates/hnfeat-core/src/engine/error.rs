use super::config::ConfigError;
use crate::core::chemistry::ChemistryLoadError;
use crate::core::io::pdb::PdbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load chemistry map: {0}")]
    ChemistryMap(#[from] ChemistryLoadError),

    #[error("Failed to read structure: {0}")]
    Structure(#[from] PdbError),

    #[error("Ensemble contains no models")]
    EmptyEnsemble,

    #[error("Received {tables} neighbor tables but the ensemble size is {ensemble_size}")]
    EnsembleSizeExceeded { tables: usize, ensemble_size: usize },

    #[error(
        "Inconsistent {field} for anchor {res_index}, neighbor {neighbor_res_index} {atom_name}: '{first}' vs '{second}'"
    )]
    InconsistentLabels {
        res_index: usize,
        neighbor_res_index: usize,
        atom_name: String,
        field: &'static str,
        first: String,
        second: String,
    },

    #[error("Chemistry-type encoding requested but anchor {res_index} has no chemistry label")]
    MissingChemistryLabel { res_index: usize },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
