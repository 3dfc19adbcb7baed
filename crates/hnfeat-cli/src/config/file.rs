use crate::error::{CliError, Result};
use clap::ValueEnum;
use hnfeat::engine::config as core_config;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileAveraging {
    FixedEnsembleSize,
    ObservedModels,
    RequireComplete,
}

impl From<FileAveraging> for core_config::MetricAveraging {
    fn from(value: FileAveraging) -> Self {
        match value {
            FileAveraging::FixedEnsembleSize => Self::FixedEnsembleSize,
            FileAveraging::ObservedModels => Self::ObservedModels,
            FileAveraging::RequireComplete => Self::RequireComplete,
        }
    }
}

#[derive(Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileLeadingSlot {
    Neighbor,
    AnchorResidue,
}

impl From<FileLeadingSlot> for core_config::LeadingSlot {
    fn from(value: FileLeadingSlot) -> Self {
        match value {
            FileLeadingSlot::Neighbor => Self::Neighbor,
            FileLeadingSlot::AnchorResidue => Self::AnchorResidue,
        }
    }
}

#[derive(Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileField {
    ResidueType,
    Element,
    ChemistryType,
}

impl From<FileField> for core_config::CategoricalField {
    fn from(value: FileField) -> Self {
        match value {
            FileField::ResidueType => Self::ResidueType,
            FileField::Element => Self::Element,
            FileField::ChemistryType => Self::ChemistryType,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSearchConfig {
    pub neighbor_count: Option<usize>,
    pub query_count: Option<usize>,
    pub exclude_hydrogens: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileFrameConfig {
    pub bond_cutoff: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileTransformConfig {
    pub min_displacement: Option<f64>,
    pub scaling_constant: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileAggregationConfig {
    pub ensemble_size: Option<usize>,
    pub top_k: Option<usize>,
    pub averaging: Option<FileAveraging>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileEncodingConfig {
    pub fields: Option<Vec<FileField>>,
    pub leading_slot: Option<FileLeadingSlot>,
    pub include_confidence: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileInputConfig {
    pub chain_id: Option<char>,
    pub chemistry_map: Option<PathBuf>,
}

/// The TOML configuration file. Every table and key is optional.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub search: Option<FileSearchConfig>,
    pub frame: Option<FileFrameConfig>,
    pub transform: Option<FileTransformConfig>,
    pub aggregation: Option<FileAggregationConfig>,
    pub encoding: Option<FileEncodingConfig>,
    pub input: Option<FileInputConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
