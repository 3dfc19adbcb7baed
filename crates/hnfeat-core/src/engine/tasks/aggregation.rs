use crate::core::models::features::{
    AggregatedNeighbor, AggregatedTable, NeighborKey, NeighborRecord, NeighborTable,
};
use crate::core::models::residue::ResidueType;
use crate::engine::config::{AggregationConfig, MetricAveraging};
use crate::engine::error::EngineError;
use itertools::Itertools;
use nalgebra::Vector3;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Sums values in ascending `total_cmp` order, making the result independent of
/// the order in which models were supplied.
fn canonical_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    values.into_iter().sum()
}

fn check_label<T: PartialEq + fmt::Debug>(
    key: &NeighborKey,
    field: &'static str,
    first: &T,
    other: &T,
) -> Result<(), EngineError> {
    if first == other {
        return Ok(());
    }
    Err(EngineError::InconsistentLabels {
        res_index: key.res_index,
        neighbor_res_index: key.neighbor_res_index,
        atom_name: key.atom_name.clone(),
        field,
        first: format!("{:?}", first),
        second: format!("{:?}", other),
    })
}

/// Merges the observations of one physical neighbor across models.
///
/// Returns `Ok(None)` when the averaging policy discards the group.
fn merge_group(
    key: &NeighborKey,
    records: &[&NeighborRecord],
    config: &AggregationConfig,
) -> Result<Option<AggregatedNeighbor>, EngineError> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    for record in &records[1..] {
        check_label(key, "atom_type", &first.atom_type, &record.atom_type)?;
        check_label(key, "res_name", &first.res_name, &record.res_name)?;
        check_label(
            key,
            "chemistry_type",
            &first.chemistry_type,
            &record.chemistry_type,
        )?;
    }

    let model_count = records.len();
    if config.averaging == MetricAveraging::RequireComplete && model_count != config.ensemble_size
    {
        return Ok(None);
    }

    let observed = model_count as f64;
    let component =
        |f: fn(&NeighborRecord) -> f64| canonical_sum(records.iter().map(|r| f(r)).collect());
    let direction = Vector3::new(
        component(|r| r.direction.x),
        component(|r| r.direction.y),
        component(|r| r.direction.z),
    ) / observed;
    let metric_sum = component(|r| r.metric);
    let metric = match config.averaging {
        MetricAveraging::FixedEnsembleSize | MetricAveraging::RequireComplete => {
            metric_sum / config.ensemble_size as f64
        }
        MetricAveraging::ObservedModels => metric_sum / observed,
    };

    Ok(Some(AggregatedNeighbor {
        res_index: key.res_index,
        atom_type: first.atom_type,
        res_name: first.res_name,
        direction,
        metric,
        atom_name: key.atom_name.clone(),
        neighbor_res_index: key.neighbor_res_index,
        confidence: component(|r| r.confidence) / observed,
        model_count,
        chemistry_type: first.chemistry_type.clone(),
    }))
}

/// Merges and ranks the groups of one anchor; `None` if fewer than `top_k` remain.
fn select_top_k(
    groups: Vec<(NeighborKey, Vec<&NeighborRecord>)>,
    config: &AggregationConfig,
) -> Result<Option<Vec<AggregatedNeighbor>>, EngineError> {
    let mut merged = Vec::with_capacity(groups.len());
    for (key, records) in &groups {
        if let Some(neighbor) = merge_group(key, records, config)? {
            merged.push(neighbor);
        }
    }
    if merged.len() < config.top_k {
        return Ok(None);
    }
    merged.sort_by(|a, b| {
        b.metric
            .total_cmp(&a.metric)
            .then_with(|| a.key().cmp(&b.key()))
    });
    merged.truncate(config.top_k);
    Ok(Some(merged))
}

fn merge_anchor_types(
    tables: &[NeighborTable],
) -> Result<BTreeMap<usize, ResidueType>, EngineError> {
    let mut anchors: BTreeMap<usize, ResidueType> = BTreeMap::new();
    for table in tables {
        for (&res_index, &residue_type) in &table.anchors {
            match anchors.get(&res_index) {
                Some(&existing) if existing != residue_type => {
                    return Err(EngineError::InconsistentLabels {
                        res_index,
                        neighbor_res_index: res_index,
                        atom_name: "H".to_string(),
                        field: "anchor_res_name",
                        first: existing.to_string(),
                        second: residue_type.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    anchors.insert(res_index, residue_type);
                }
            }
        }
    }
    Ok(anchors)
}

/// Aggregates the neighbor tables of one structure into its top-K table.
///
/// Records are grouped by (anchor, neighbor residue, atom name). The result does
/// not depend on the order of `tables`.
#[instrument(skip_all, name = "aggregation_task", fields(tables = tables.len()))]
pub fn run(
    tables: &[NeighborTable],
    config: &AggregationConfig,
) -> Result<AggregatedTable, EngineError> {
    if tables.len() > config.ensemble_size {
        return Err(EngineError::EnsembleSizeExceeded {
            tables: tables.len(),
            ensemble_size: config.ensemble_size,
        });
    }
    if tables.len() < config.ensemble_size {
        warn!(
            tables = tables.len(),
            ensemble_size = config.ensemble_size,
            "Fewer neighbor tables than the ensemble size."
        );
    }

    let anchor_types = merge_anchor_types(tables)?;

    let mut groups: BTreeMap<NeighborKey, Vec<&NeighborRecord>> = BTreeMap::new();
    for record in tables.iter().flat_map(|t| t.records.iter()) {
        groups.entry(record.key()).or_default().push(record);
    }

    // Keys sort by anchor first, so each anchor's groups are contiguous.
    let per_anchor: Vec<(usize, Vec<(NeighborKey, Vec<&NeighborRecord>)>)> = groups
        .into_iter()
        .chunk_by(|(key, _)| key.res_index)
        .into_iter()
        .map(|(res_index, anchor_groups)| (res_index, anchor_groups.collect()))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let iterator = per_anchor.into_iter();

    #[cfg(feature = "parallel")]
    let iterator = per_anchor.into_par_iter();

    let selected: Vec<(usize, Option<Vec<AggregatedNeighbor>>)> = iterator
        .map(|(res_index, groups)| select_top_k(groups, config).map(|top| (res_index, top)))
        .collect::<Result<_, _>>()?;

    let mut table = AggregatedTable::default();
    for (res_index, top) in selected {
        match top {
            Some(neighbors) => {
                if let Some(&residue_type) = anchor_types.get(&res_index) {
                    table.anchors.insert(res_index, residue_type);
                }
                table.neighbors.insert(res_index, neighbors);
            }
            None => debug!(
                residue = res_index,
                top_k = config.top_k,
                "Dropping anchor with fewer aggregated neighbors than top_k"
            ),
        }
    }

    info!(
        anchors = table.anchor_count(),
        candidates = anchor_types.len(),
        "Aggregation complete."
    );
    Ok(table)
}
