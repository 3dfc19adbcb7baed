use hnfeat::engine::config as core_config;

pub struct DefaultsConfig {
    pub neighbor_count: usize,
    pub query_count: usize,
    pub exclude_hydrogens: bool,
    pub bond_cutoff: f64,
    pub min_displacement: f64,
    pub scaling_constant: f64,
    pub top_k: usize,
    pub averaging: core_config::MetricAveraging,
    pub fields: Vec<core_config::CategoricalField>,
    pub leading_slot: core_config::LeadingSlot,
    pub include_confidence: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            neighbor_count: 30,
            query_count: core_config::DEFAULT_QUERY_COUNT,
            exclude_hydrogens: false,
            bond_cutoff: core_config::DEFAULT_BOND_CUTOFF,
            min_displacement: core_config::DEFAULT_MIN_DISPLACEMENT,
            scaling_constant: core_config::DEFAULT_SCALING_CONSTANT,
            top_k: 25,
            averaging: core_config::MetricAveraging::FixedEnsembleSize,
            fields: vec![
                core_config::CategoricalField::ResidueType,
                core_config::CategoricalField::Element,
            ],
            leading_slot: core_config::LeadingSlot::Neighbor,
            include_confidence: false,
        }
    }
}
