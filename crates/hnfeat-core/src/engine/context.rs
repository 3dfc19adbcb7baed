use super::config::FeaturizationConfig;
use super::progress::ProgressReporter;
use crate::core::chemistry::ChemistryTypeMap;

/// Shared, read-only inputs of every pipeline task.
#[derive(Clone, Copy)]
pub struct FeaturizationContext<'a> {
    pub config: &'a FeaturizationConfig,
    pub chemistry: Option<&'a ChemistryTypeMap>,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> FeaturizationContext<'a> {
    pub fn new(
        config: &'a FeaturizationConfig,
        chemistry: Option<&'a ChemistryTypeMap>,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            config,
            chemistry,
            reporter,
        }
    }
}
