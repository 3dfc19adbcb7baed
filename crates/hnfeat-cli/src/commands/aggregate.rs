use super::{checkpoint_index, stem_of, write_ensemble_tables};
use crate::cli::AggregateArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use hnfeat::core::io::tables;
use hnfeat::core::models::features::NeighborTable;
use hnfeat::engine::progress::ProgressReporter;
use hnfeat::workflows::featurize::{self, EnsembleSizing};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn run(args: AggregateArgs) -> Result<()> {
    let mut app_config = build_config(&args.config)?;

    let checkpoint_files = list_checkpoints(&args.checkpoints)?;
    info!(
        "Reading {} neighbor-table checkpoint(s) from {:?}",
        checkpoint_files.len(),
        &args.checkpoints
    );
    let neighbor_tables = read_checkpoints(&checkpoint_files)?;

    if app_config.sizing == EnsembleSizing::PerInput {
        app_config.core_config.aggregation.ensemble_size = neighbor_tables.len();
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Aggregating {} model table(s)...", neighbor_tables.len());
    let (aggregated, features) =
        featurize::aggregate_tables(&neighbor_tables, &app_config.core_config, &reporter)?;

    let stem = args
        .stem
        .clone()
        .unwrap_or_else(|| stem_of(&args.checkpoints));
    std::fs::create_dir_all(&args.output)?;
    write_ensemble_tables(&args.output, &stem, &aggregated, &features)?;

    println!(
        "✓ {}: {} anchor(s) from {} model table(s); tables written to {}",
        stem,
        features.len(),
        neighbor_tables.len(),
        args.output.display()
    );
    Ok(())
}

/// The `model_<i>.csv` checkpoints of one structure, in model order.
///
/// A directory that only holds per-structure subdirectories (the root given to
/// `featurize --checkpoint-dir`) is rejected rather than merged.
fn list_checkpoints(dir: &Path) -> Result<Vec<(usize, PathBuf)>> {
    let mut files = Vec::new();
    let mut structures = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if let Some(name) = path.file_name() {
                structures.push(name.to_string_lossy().into_owned());
            }
            continue;
        }
        match checkpoint_index(&path) {
            Some(model_index) => files.push((model_index, path)),
            None => debug!("Ignoring {:?}; not a model checkpoint.", path),
        }
    }
    files.sort();

    if files.is_empty() {
        if !structures.is_empty() {
            structures.sort();
            return Err(CliError::Argument(format!(
                "{} holds checkpoints of several structures ({}); pass one of these directories",
                dir.display(),
                structures.join(", ")
            )));
        }
        return Err(CliError::Argument(format!(
            "No neighbor-table checkpoints (model_<i>.csv) found in {}",
            dir.display()
        )));
    }
    Ok(files)
}

fn read_checkpoints(files: &[(usize, PathBuf)]) -> Result<Vec<NeighborTable>> {
    files
        .iter()
        .map(|(model_index, path)| {
            tables::read_neighbor_table_from_path(path, *model_index).map_err(|e| {
                CliError::FileParsing {
                    path: path.clone(),
                    source: e.into(),
                }
            })
        })
        .collect()
}
