use hnfeat::engine::config as core_config;
use hnfeat::workflows::featurize::EnsembleSizing;

pub struct AppConfig {
    pub core_config: core_config::FeaturizationConfig,
    /// `PerInput` when no ensemble size was given anywhere; `core_config` then
    /// carries a placeholder size that each input replaces.
    pub sizing: EnsembleSizing,
}
