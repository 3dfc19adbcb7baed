pub mod aggregate;
pub mod columns;
pub mod featurize;

use crate::error::{CliError, Result};
use hnfeat::core::io::tables;
use hnfeat::core::models::features::{AggregatedTable, FeatureTable};
use std::path::{Path, PathBuf};
use tracing::info;

const CHECKPOINT_PREFIX: &str = "model_";

pub(crate) fn output_path(dir: &Path, stem: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{}_{}.csv", stem, suffix))
}

/// `<dir>/model_<i>.csv`, the checkpoint of one ensemble model.
pub(crate) fn checkpoint_path(dir: &Path, model_index: usize) -> PathBuf {
    dir.join(format!("{}{}.csv", CHECKPOINT_PREFIX, model_index))
}

/// The model index encoded in a checkpoint file name, if it is one.
pub(crate) fn checkpoint_index(path: &Path) -> Option<usize> {
    if !path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(CHECKPOINT_PREFIX)?
        .parse()
        .ok()
}

/// File-name stem used for every table written for `source`.
pub(crate) fn stem_of(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "ensemble".to_string())
}

/// Writes `<stem>_aggregated.csv` and `<stem>_features.csv` into `dir`.
pub(crate) fn write_ensemble_tables(
    dir: &Path,
    stem: &str,
    aggregated: &AggregatedTable,
    features: &FeatureTable,
) -> Result<()> {
    let aggregated_path = output_path(dir, stem, "aggregated");
    tables::write_aggregated_table_to_path(aggregated, &aggregated_path).map_err(|e| {
        CliError::FileParsing {
            path: aggregated_path.clone(),
            source: e.into(),
        }
    })?;

    let features_path = output_path(dir, stem, "features");
    tables::write_feature_table_to_path(features, &features_path).map_err(|e| {
        CliError::FileParsing {
            path: features_path.clone(),
            source: e.into(),
        }
    })?;

    info!(
        "Wrote {:?} and {:?} ({} anchors).",
        aggregated_path,
        features_path,
        features.len()
    );
    Ok(())
}
