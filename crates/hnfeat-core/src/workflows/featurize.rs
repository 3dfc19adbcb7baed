use crate::core::chemistry::ChemistryTypeMap;
use crate::core::io::pdb::{PdbFile, PdbReadOptions};
use crate::core::models::features::{AggregatedTable, FeatureTable, NeighborTable};
use crate::core::models::structure::Structure;
use crate::engine::config::FeaturizationConfig;
use crate::engine::context::FeaturizationContext;
use crate::engine::error::EngineError;
use crate::engine::index::StructureIndex;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{ModelOutcome, SkipReason, SkipRecord};
use crate::engine::tasks::{aggregation, encoding, neighbor_search, orientation, transform};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct FeaturizationResult {
    /// One neighbor table per input model, in model order.
    pub model_tables: Vec<NeighborTable>,
    pub skips: Vec<SkipRecord>,
    pub aggregated: AggregatedTable,
    pub features: FeatureTable,
}

/// How [`run_batch`] chooses the ensemble size of each input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnsembleSizing {
    /// Use `aggregation.ensemble_size` from the configuration.
    #[default]
    Configured,
    /// Use the number of models read from each input.
    PerInput,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub source: PathBuf,
    pub result: Result<FeaturizationResult, EngineError>,
}

/// Loads the chemistry map named by the configuration, if any.
pub fn load_chemistry(config: &FeaturizationConfig) -> Result<Option<ChemistryTypeMap>, EngineError> {
    match &config.chemistry_map_path {
        Some(path) => {
            let map = ChemistryTypeMap::load(path)?;
            info!(path = %path.display(), entries = map.len(), "Loaded chemistry map.");
            Ok(Some(map))
        }
        None => Ok(None),
    }
}

/// Runs the per-model stages on one model.
pub fn featurize_model(
    structure: &Structure,
    model_index: usize,
    context: &FeaturizationContext<'_>,
) -> ModelOutcome {
    let config = context.config;
    let Some(index) = StructureIndex::build(structure) else {
        warn!(model = model_index, "Model has no indexable atoms; skipping.");
        return ModelOutcome {
            table: NeighborTable::new(model_index),
            skips: vec![SkipRecord::model(model_index, SkipReason::EmptyModel)],
        };
    };

    let (anchors, mut skips) =
        neighbor_search::run(structure, &index, &config.search, model_index);
    let (oriented, orientation_skips) = orientation::run(anchors, &config.frame, model_index);
    skips.extend(orientation_skips);
    let (table, transform_skips) = transform::run(
        &oriented,
        &config.transform,
        config.search.neighbor_count,
        context.chemistry,
        model_index,
    );
    skips.extend(transform_skips);
    skips.sort_by_key(|skip| skip.residue_index);

    ModelOutcome { table, skips }
}

/// Featurizes one ensemble: every model in parallel, then aggregation and encoding.
#[instrument(skip_all, name = "featurize_workflow", fields(models = models.len()))]
pub fn run(
    models: &[Structure],
    config: &FeaturizationConfig,
    reporter: &ProgressReporter,
) -> Result<FeaturizationResult, EngineError> {
    let chemistry = reporter.stage("Preparation", || load_chemistry(config))?;
    let context = FeaturizationContext::new(config, chemistry.as_ref(), reporter);
    run_with_context(models, &context)
}

fn run_with_context(
    models: &[Structure],
    context: &FeaturizationContext<'_>,
) -> Result<FeaturizationResult, EngineError> {
    if models.is_empty() {
        return Err(EngineError::EmptyEnsemble);
    }
    let reporter = context.reporter;

    reporter.report(Progress::ModelsStart {
        models: models.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = models.iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = models.par_iter().enumerate();

    let outcomes: Vec<ModelOutcome> = iterator
        .map(|(model_index, structure)| {
            let outcome = featurize_model(structure, model_index, context);
            reporter.report(Progress::ModelFinished {
                model_index,
                anchors: outcome.table.anchor_count(),
                skipped: outcome.skips.len(),
            });
            outcome
        })
        .collect();

    reporter.report(Progress::ModelsFinish);

    let mut model_tables = Vec::with_capacity(outcomes.len());
    let mut skips = Vec::new();
    for outcome in outcomes {
        model_tables.push(outcome.table);
        skips.extend(outcome.skips);
    }

    let (aggregated, features) = aggregate_with_context(&model_tables, context)?;
    info!(
        models = model_tables.len(),
        anchors = features.len(),
        skipped = skips.len(),
        "Featurization complete."
    );

    Ok(FeaturizationResult {
        model_tables,
        skips,
        aggregated,
        features,
    })
}

/// Aggregates previously computed neighbor tables and encodes the result.
#[instrument(skip_all, name = "aggregate_workflow", fields(tables = tables.len()))]
pub fn aggregate_tables(
    tables: &[NeighborTable],
    config: &FeaturizationConfig,
    reporter: &ProgressReporter,
) -> Result<(AggregatedTable, FeatureTable), EngineError> {
    let chemistry = reporter.stage("Preparation", || load_chemistry(config))?;
    let context = FeaturizationContext::new(config, chemistry.as_ref(), reporter);
    aggregate_with_context(tables, &context)
}

fn aggregate_with_context(
    tables: &[NeighborTable],
    context: &FeaturizationContext<'_>,
) -> Result<(AggregatedTable, FeatureTable), EngineError> {
    let config = context.config;
    let reporter = context.reporter;

    let aggregated = reporter.stage("Aggregating ensemble", || {
        aggregation::run(tables, &config.aggregation)
    })?;
    let features = reporter.stage("Encoding features", || {
        encoding::run(
            &aggregated,
            &config.encoding,
            config.aggregation.top_k,
            context.chemistry,
        )
    })?;
    Ok((aggregated, features))
}

/// Featurizes several structures in parallel, one ensemble per input path.
///
/// A failing input is reported in its [`BatchOutcome`] and does not affect the
/// others. Only a chemistry map that cannot be loaded fails the whole batch.
#[instrument(skip_all, name = "batch_workflow", fields(inputs = inputs.len()))]
pub fn run_batch(
    inputs: &[PathBuf],
    config: &FeaturizationConfig,
    sizing: EnsembleSizing,
    reporter: &ProgressReporter,
) -> Result<Vec<BatchOutcome>, EngineError> {
    let chemistry = load_chemistry(config)?;
    let options = PdbReadOptions {
        chain_id: config.chain_id,
    };
    let silent = ProgressReporter::new();

    reporter.report(Progress::BatchStart {
        inputs: inputs.len() as u64,
    });

    let process = |path: &PathBuf| -> BatchOutcome {
        let result = PdbFile::read_ensemble(path, &options)
            .map_err(EngineError::from)
            .and_then(|models| {
                let config = match sizing {
                    EnsembleSizing::Configured => Cow::Borrowed(config),
                    EnsembleSizing::PerInput => {
                        let mut sized = config.clone();
                        sized.aggregation.ensemble_size = models.len().max(1);
                        Cow::Owned(sized)
                    }
                };
                let context = FeaturizationContext::new(&config, chemistry.as_ref(), &silent);
                run_with_context(&models, &context)
            });
        if let Err(e) = &result {
            warn!(input = %path.display(), error = %e, "Failed to featurize structure.");
        }
        reporter.report(Progress::InputFinished {
            source: path.clone(),
            succeeded: result.is_ok(),
        });
        BatchOutcome {
            source: path.clone(),
            result,
        }
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<BatchOutcome> = inputs.iter().map(process).collect();

    #[cfg(feature = "parallel")]
    let outcomes: Vec<BatchOutcome> = inputs.par_iter().map(process).collect();

    reporter.report(Progress::BatchFinish);

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        succeeded = outcomes.len() - failed,
        failed, "Batch featurization complete."
    );
    Ok(outcomes)
}
