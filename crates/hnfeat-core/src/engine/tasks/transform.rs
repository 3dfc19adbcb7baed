use super::neighbor_search::AnchorNeighbors;
use crate::core::chemistry::ChemistryTypeMap;
use crate::core::models::features::{NeighborRecord, NeighborTable};
use crate::core::utils::geometry::LocalFrame;
use crate::engine::config::TransformConfig;
use crate::engine::state::{SkipReason, SkipRecord};
use tracing::{debug, instrument};

/// Expresses every neighbor of an anchor in the anchor's local frame.
///
/// Neighbors closer to the hydrogen than `min_displacement` are dropped.
pub fn transform_anchor(
    anchor: &AnchorNeighbors<'_>,
    frame: &LocalFrame,
    config: &TransformConfig,
    chemistry: Option<&ChemistryTypeMap>,
) -> Vec<NeighborRecord> {
    anchor
        .neighbors
        .iter()
        .filter_map(|neighbor| {
            let displacement = neighbor.atom.position - anchor.hydrogen;
            let distance = displacement.norm();
            if distance < config.min_displacement {
                return None;
            }
            let direction = frame.rotate(&(displacement / distance));
            Some(NeighborRecord {
                res_index: anchor.res_index,
                atom_type: neighbor.atom.element,
                res_name: neighbor.atom.residue_type,
                direction,
                metric: config.scaling_constant / distance,
                atom_name: neighbor.atom.name.clone(),
                neighbor_res_index: neighbor.atom.residue_index,
                confidence: neighbor.atom.confidence,
                chemistry_type: chemistry.map(|map| {
                    map.label_for(neighbor.atom.residue_type, &neighbor.atom.name)
                        .to_string()
                }),
            })
        })
        .collect()
}

/// Produces the neighbor table of one model; anchors whose row count differs
/// from `expected_rows` are skipped.
#[instrument(skip_all, name = "transform_task", fields(model = model_index))]
pub fn run(
    oriented: &[(AnchorNeighbors<'_>, LocalFrame)],
    config: &TransformConfig,
    expected_rows: usize,
    chemistry: Option<&ChemistryTypeMap>,
    model_index: usize,
) -> (NeighborTable, Vec<SkipRecord>) {
    let mut table = NeighborTable::new(model_index);
    let mut skips = Vec::new();

    for (anchor, frame) in oriented {
        let records = transform_anchor(anchor, frame, config, chemistry);
        if records.len() != expected_rows {
            debug!(
                residue = anchor.res_index,
                found = records.len(),
                expected = expected_rows,
                "Skipping anchor with incomplete neighbor set"
            );
            skips.push(SkipRecord::residue(
                model_index,
                anchor.res_index,
                SkipReason::IncompleteNeighbors {
                    found: records.len(),
                    expected: expected_rows,
                },
            ));
            continue;
        }
        table.push_anchor(anchor.res_index, anchor.residue_type, records);
    }

    (table, skips)
}
