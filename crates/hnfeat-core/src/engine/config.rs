use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_QUERY_COUNT: usize = 61;
pub const DEFAULT_BOND_CUTOFF: f64 = 2.0;
pub const DEFAULT_MIN_DISPLACEMENT: f64 = 1e-4;
pub const DEFAULT_SCALING_CONSTANT: f64 = 1.2;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    Invalid {
        parameter: &'static str,
        reason: String,
    },
}

/// How the averaged metric of a neighbor group is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricAveraging {
    /// Sum over contributing models divided by the configured ensemble size.
    /// Neighbors missing from some models are down-weighted.
    #[default]
    FixedEnsembleSize,
    /// Sum divided by the number of models that observed the neighbor.
    ObservedModels,
    /// Like `FixedEnsembleSize`, but groups not observed in every model are dropped.
    RequireComplete,
}

/// What occupies the first slot of an encoded feature row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadingSlot {
    /// Slot 1 is the highest-metric neighbor.
    #[default]
    Neighbor,
    /// Slot 1 describes the anchor residue itself; neighbors follow in slots 2..=K+1.
    AnchorResidue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    ResidueType,
    Element,
    ChemistryType,
}

impl CategoricalField {
    /// Column name prefix, before the `_n_i` slot suffix.
    pub fn column_prefix(self) -> &'static str {
        match self {
            CategoricalField::ResidueType => "res_name_id",
            CategoricalField::Element => "atom_type_id",
            CategoricalField::ChemistryType => "chemistry_type",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Neighbors requested from the index per anchor, before exclusions.
    pub query_count: usize,
    /// Neighbors kept per anchor and model after exclusions.
    pub neighbor_count: usize,
    pub exclude_hydrogens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
    /// Maximum N-C distance for the preceding carbonyl carbon, in Angstroms.
    pub bond_cutoff: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    pub min_displacement: f64,
    pub scaling_constant: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationConfig {
    pub ensemble_size: usize,
    pub top_k: usize,
    pub averaging: MetricAveraging,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodingConfig {
    pub fields: Vec<CategoricalField>,
    pub leading_slot: LeadingSlot,
    pub include_confidence: bool,
}

impl EncodingConfig {
    pub fn uses_chemistry(&self) -> bool {
        self.fields.contains(&CategoricalField::ChemistryType)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeaturizationConfig {
    pub search: SearchConfig,
    pub frame: FrameConfig,
    pub transform: TransformConfig,
    pub aggregation: AggregationConfig,
    pub encoding: EncodingConfig,
    /// Chain to featurize; `None` selects the first chain of each input.
    pub chain_id: Option<char>,
    pub chemistry_map_path: Option<PathBuf>,
}

#[derive(Default)]
pub struct FeaturizationConfigBuilder {
    query_count: Option<usize>,
    neighbor_count: Option<usize>,
    exclude_hydrogens: bool,
    bond_cutoff: Option<f64>,
    min_displacement: Option<f64>,
    scaling_constant: Option<f64>,
    ensemble_size: Option<usize>,
    top_k: Option<usize>,
    averaging: MetricAveraging,
    fields: Option<Vec<CategoricalField>>,
    leading_slot: LeadingSlot,
    include_confidence: bool,
    chain_id: Option<char>,
    chemistry_map_path: Option<PathBuf>,
}

impl FeaturizationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_count(mut self, count: usize) -> Self {
        self.query_count = Some(count);
        self
    }
    pub fn neighbor_count(mut self, count: usize) -> Self {
        self.neighbor_count = Some(count);
        self
    }
    pub fn exclude_hydrogens(mut self, exclude: bool) -> Self {
        self.exclude_hydrogens = exclude;
        self
    }
    pub fn bond_cutoff(mut self, cutoff: f64) -> Self {
        self.bond_cutoff = Some(cutoff);
        self
    }
    pub fn min_displacement(mut self, distance: f64) -> Self {
        self.min_displacement = Some(distance);
        self
    }
    pub fn scaling_constant(mut self, constant: f64) -> Self {
        self.scaling_constant = Some(constant);
        self
    }
    pub fn ensemble_size(mut self, size: usize) -> Self {
        self.ensemble_size = Some(size);
        self
    }
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }
    pub fn averaging(mut self, averaging: MetricAveraging) -> Self {
        self.averaging = averaging;
        self
    }
    pub fn fields(mut self, fields: Vec<CategoricalField>) -> Self {
        self.fields = Some(fields);
        self
    }
    pub fn leading_slot(mut self, slot: LeadingSlot) -> Self {
        self.leading_slot = slot;
        self
    }
    pub fn include_confidence(mut self, include: bool) -> Self {
        self.include_confidence = include;
        self
    }
    pub fn chain_id(mut self, chain_id: Option<char>) -> Self {
        self.chain_id = chain_id;
        self
    }
    pub fn chemistry_map_path(mut self, path: Option<PathBuf>) -> Self {
        self.chemistry_map_path = path;
        self
    }

    pub fn build(self) -> Result<FeaturizationConfig, ConfigError> {
        let search = SearchConfig {
            query_count: self.query_count.unwrap_or(DEFAULT_QUERY_COUNT),
            neighbor_count: self
                .neighbor_count
                .ok_or(ConfigError::MissingParameter("neighbor_count"))?,
            exclude_hydrogens: self.exclude_hydrogens,
        };
        let frame = FrameConfig {
            bond_cutoff: self.bond_cutoff.unwrap_or(DEFAULT_BOND_CUTOFF),
        };
        let transform = TransformConfig {
            min_displacement: self.min_displacement.unwrap_or(DEFAULT_MIN_DISPLACEMENT),
            scaling_constant: self.scaling_constant.unwrap_or(DEFAULT_SCALING_CONSTANT),
        };
        let aggregation = AggregationConfig {
            ensemble_size: self
                .ensemble_size
                .ok_or(ConfigError::MissingParameter("ensemble_size"))?,
            top_k: self.top_k.ok_or(ConfigError::MissingParameter("top_k"))?,
            averaging: self.averaging,
        };
        let encoding = EncodingConfig {
            fields: self
                .fields
                .unwrap_or_else(|| vec![CategoricalField::ResidueType, CategoricalField::Element]),
            leading_slot: self.leading_slot,
            include_confidence: self.include_confidence,
        };

        let config = FeaturizationConfig {
            search,
            frame,
            transform,
            aggregation,
            encoding,
            chain_id: self.chain_id,
            chemistry_map_path: self.chemistry_map_path,
        };
        config.validate()?;
        Ok(config)
    }
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        parameter,
        reason: reason.into(),
    }
}

impl FeaturizationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.neighbor_count == 0 {
            return Err(invalid("neighbor_count", "must be at least 1"));
        }
        if self.search.query_count < self.search.neighbor_count {
            return Err(invalid(
                "query_count",
                format!(
                    "{} is smaller than neighbor_count ({})",
                    self.search.query_count, self.search.neighbor_count
                ),
            ));
        }
        if !(self.frame.bond_cutoff.is_finite() && self.frame.bond_cutoff > 0.0) {
            return Err(invalid("bond_cutoff", "must be a positive distance"));
        }
        if !(self.transform.min_displacement.is_finite() && self.transform.min_displacement >= 0.0)
        {
            return Err(invalid("min_displacement", "must be a non-negative distance"));
        }
        if !(self.transform.scaling_constant.is_finite() && self.transform.scaling_constant > 0.0) {
            return Err(invalid("scaling_constant", "must be positive"));
        }
        if self.aggregation.ensemble_size == 0 {
            return Err(invalid("ensemble_size", "must be at least 1"));
        }
        if self.aggregation.top_k == 0 {
            return Err(invalid("top_k", "must be at least 1"));
        }
        if self.encoding.fields.is_empty() {
            return Err(invalid("fields", "at least one categorical field is required"));
        }
        for (i, field) in self.encoding.fields.iter().enumerate() {
            if self.encoding.fields[..i].contains(field) {
                return Err(invalid(
                    "fields",
                    format!("'{}' is listed twice", field.column_prefix()),
                ));
            }
        }
        if self.encoding.uses_chemistry() && self.chemistry_map_path.is_none() {
            return Err(ConfigError::MissingParameter("chemistry_map_path"));
        }
        Ok(())
    }
}
