use super::{checkpoint_path, stem_of, write_ensemble_tables};
use crate::cli::FeaturizeArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use hnfeat::core::io::tables;
use hnfeat::engine::progress::ProgressReporter;
use hnfeat::engine::state::summarize_skips;
use hnfeat::workflows::featurize::{self, FeaturizationResult};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: FeaturizeArgs) -> Result<()> {
    info!("Resolving configuration...");
    let app_config = build_config(&args.config)?;

    std::fs::create_dir_all(&args.output)?;
    if let Some(dir) = &args.checkpoint_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut seen = HashSet::new();
    for input in &args.inputs {
        if !seen.insert(stem_of(input)) {
            warn!(
                "Input {:?} shares its file stem with an earlier input; its tables will overwrite the earlier ones.",
                input
            );
        }
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Featurizing {} input(s)...", args.inputs.len());
    let outcomes = featurize::run_batch(
        &args.inputs,
        &app_config.core_config,
        app_config.sizing,
        &reporter,
    )?;

    let mut failed = 0;
    for outcome in &outcomes {
        let stem = stem_of(&outcome.source);
        match &outcome.result {
            Ok(result) => {
                write_ensemble_tables(&args.output, &stem, &result.aggregated, &result.features)?;
                if let Some(dir) = &args.checkpoint_dir {
                    write_checkpoints(dir, &stem, result)?;
                }
                println!("✓ {}", summary_line(&stem, result));
            }
            Err(e) => {
                failed += 1;
                eprintln!("✗ {}: {}", outcome.source.display(), e);
            }
        }
    }

    println!(
        "Featurized {} of {} input(s); tables written to {}",
        outcomes.len() - failed,
        outcomes.len(),
        args.output.display()
    );

    if failed > 0 && failed == outcomes.len() {
        return Err(CliError::AllInputsFailed(failed));
    }
    Ok(())
}

/// Writes one structure's per-model tables into `<root>/<stem>/`.
fn write_checkpoints(root: &Path, stem: &str, result: &FeaturizationResult) -> Result<()> {
    let dir = root.join(stem);
    std::fs::create_dir_all(&dir)?;
    for table in &result.model_tables {
        let path = checkpoint_path(&dir, table.model_index);
        tables::write_neighbor_table_to_path(table, &path).map_err(|e| {
            CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            }
        })?;
    }
    info!(
        "Wrote {} neighbor-table checkpoint(s) for '{}' to {:?}.",
        result.model_tables.len(),
        stem,
        dir
    );
    Ok(())
}

fn summary_line(stem: &str, result: &FeaturizationResult) -> String {
    let mut line = format!(
        "{}: {} anchor(s) from {} model(s)",
        stem,
        result.features.len(),
        result.model_tables.len()
    );
    let skips = summarize_skips(&result.skips);
    if !skips.is_empty() {
        let parts: Vec<String> = skips
            .iter()
            .map(|(label, count)| format!("{}={}", label, count))
            .collect();
        line.push_str(&format!("; skipped {}", parts.join(", ")));
    }
    line
}
