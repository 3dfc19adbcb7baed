use crate::core::chemistry::ChemistryTypeMap;
use crate::core::models::atom::Element;
use crate::core::models::features::{
    AggregatedNeighbor, AggregatedTable, FeatureRow, FeatureTable, FeatureValue,
};
use crate::core::models::residue::ResidueType;
use crate::engine::config::{CategoricalField, EncodingConfig, LeadingSlot};
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use tracing::{info, instrument};

const GEOMETRY_COLUMNS: [&str; 4] = ["dx", "dy", "dz", "metric"];
const CONFIDENCE_COLUMN: &str = "confidence";

/// Number of positional slots per row.
pub fn slot_count(config: &EncodingConfig, top_k: usize) -> usize {
    match config.leading_slot {
        LeadingSlot::Neighbor => top_k,
        LeadingSlot::AnchorResidue => top_k + 1,
    }
}

/// The full, ordered column list of the feature table, starting with `res_index`.
pub fn column_names(config: &EncodingConfig, top_k: usize) -> Vec<String> {
    let mut columns = vec!["res_index".to_string()];
    for slot in 1..=slot_count(config, top_k) {
        let prefixes = config
            .fields
            .iter()
            .map(|f| f.column_prefix())
            .chain(GEOMETRY_COLUMNS)
            .chain(config.include_confidence.then_some(CONFIDENCE_COLUMN));
        columns.extend(prefixes.map(|prefix| format!("{prefix}_n_{slot}")));
    }
    columns
}

/// The values of one slot, independent of whether it holds the anchor or a neighbor.
struct SlotContent<'a> {
    residue_type: ResidueType,
    element: Element,
    chemistry_type: Option<&'a str>,
    direction: Vector3<f64>,
    metric: f64,
    confidence: f64,
}

fn push_slot(
    values: &mut Vec<FeatureValue>,
    slot: &SlotContent<'_>,
    config: &EncodingConfig,
    res_index: usize,
) -> Result<(), EngineError> {
    for field in &config.fields {
        let value = match field {
            CategoricalField::ResidueType => FeatureValue::Integer(slot.residue_type.id() as i64),
            CategoricalField::Element => FeatureValue::Integer(slot.element.id() as i64),
            CategoricalField::ChemistryType => FeatureValue::Label(
                slot.chemistry_type
                    .ok_or(EngineError::MissingChemistryLabel { res_index })?
                    .to_string(),
            ),
        };
        values.push(value);
    }
    values.extend([
        FeatureValue::Float(slot.direction.x),
        FeatureValue::Float(slot.direction.y),
        FeatureValue::Float(slot.direction.z),
        FeatureValue::Float(slot.metric),
    ]);
    if config.include_confidence {
        values.push(FeatureValue::Float(slot.confidence));
    }
    Ok(())
}

fn neighbor_slot<'a>(
    neighbor: &'a AggregatedNeighbor,
    chemistry: Option<&'a ChemistryTypeMap>,
) -> SlotContent<'a> {
    let chemistry_type = neighbor.chemistry_type.as_deref().or_else(|| {
        chemistry.map(|map| map.label_for(neighbor.res_name, &neighbor.atom_name))
    });
    SlotContent {
        residue_type: neighbor.res_name,
        element: neighbor.atom_type,
        chemistry_type,
        direction: neighbor.direction,
        metric: neighbor.metric,
        confidence: neighbor.confidence,
    }
}

/// Pivots the aggregated table into one fixed-width row per anchor.
///
/// Chemistry labels missing from the aggregated rows are looked up in
/// `chemistry` when one is given.
#[instrument(skip_all, name = "encoding_task")]
pub fn run(
    table: &AggregatedTable,
    config: &EncodingConfig,
    top_k: usize,
    chemistry: Option<&ChemistryTypeMap>,
) -> Result<FeatureTable, EngineError> {
    let columns = column_names(config, top_k);
    let mut rows = Vec::with_capacity(table.anchor_count());

    for (&res_index, neighbors) in &table.neighbors {
        if neighbors.len() != top_k {
            return Err(EngineError::Internal(format!(
                "anchor {} has {} aggregated neighbors, expected {}",
                res_index,
                neighbors.len(),
                top_k
            )));
        }

        let mut values = Vec::with_capacity(columns.len() - 1);
        if config.leading_slot == LeadingSlot::AnchorResidue {
            let residue_type = table.anchors.get(&res_index).copied().ok_or_else(|| {
                EngineError::Internal(format!("anchor {} has no residue type", res_index))
            })?;
            let anchor = SlotContent {
                residue_type,
                element: Element::H,
                chemistry_type: chemistry.map(|map| map.label_for(residue_type, "H")),
                direction: Vector3::zeros(),
                metric: 0.0,
                confidence: 0.0,
            };
            push_slot(&mut values, &anchor, config, res_index)?;
        }
        for neighbor in neighbors {
            push_slot(&mut values, &neighbor_slot(neighbor, chemistry), config, res_index)?;
        }

        rows.push(FeatureRow { res_index, values });
    }

    info!(rows = rows.len(), columns = columns.len(), "Encoding complete.");
    Ok(FeatureTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoding(
        fields: Vec<CategoricalField>,
        leading_slot: LeadingSlot,
        include_confidence: bool,
    ) -> EncodingConfig {
        EncodingConfig {
            fields,
            leading_slot,
            include_confidence,
        }
    }

    fn default_encoding() -> EncodingConfig {
        encoding(
            vec![CategoricalField::ResidueType, CategoricalField::Element],
            LeadingSlot::Neighbor,
            false,
        )
    }

    fn neighbor(res_index: usize, name: &str, metric: f64) -> AggregatedNeighbor {
        AggregatedNeighbor {
            res_index,
            atom_type: Element::from_atom_name(name).unwrap(),
            res_name: ResidueType::Tryptophan,
            direction: Vector3::new(0.0, 0.6, 0.8),
            metric,
            atom_name: name.to_string(),
            neighbor_res_index: res_index - 1,
            confidence: 0.75,
            model_count: 1,
            chemistry_type: None,
        }
    }

    fn aggregated() -> AggregatedTable {
        let mut table = AggregatedTable::default();
        for res_index in [2, 9] {
            table.anchors.insert(res_index, ResidueType::Serine);
            table.neighbors.insert(
                res_index,
                vec![neighbor(res_index, "O", 0.9), neighbor(res_index, "CA", 0.4)],
            );
        }
        table
    }

    #[test]
    fn column_names_follow_slot_layout() {
        let columns = column_names(&default_encoding(), 2);
        assert_eq!(
            columns,
            vec![
                "res_index",
                "res_name_id_n_1",
                "atom_type_id_n_1",
                "dx_n_1",
                "dy_n_1",
                "dz_n_1",
                "metric_n_1",
                "res_name_id_n_2",
                "atom_type_id_n_2",
                "dx_n_2",
                "dy_n_2",
                "dz_n_2",
                "metric_n_2",
            ]
        );
    }

    #[test]
    fn column_names_honor_field_order_and_confidence() {
        let config = encoding(
            vec![CategoricalField::Element, CategoricalField::ChemistryType],
            LeadingSlot::AnchorResidue,
            true,
        );
        let columns = column_names(&config, 1);
        assert_eq!(columns.len(), 1 + 2 * 7);
        assert_eq!(columns[1], "atom_type_id_n_1");
        assert_eq!(columns[2], "chemistry_type_n_1");
        assert_eq!(columns[7], "confidence_n_1");
        assert_eq!(columns[14], "confidence_n_2");
    }

    #[test]
    fn rows_are_fixed_width_and_ordered_by_anchor() {
        let config = default_encoding();
        let table = run(&aggregated(), &config, 2, None).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].res_index, 2);
        assert_eq!(table.rows[1].res_index, 9);
        for row in &table.rows {
            assert_eq!(row.values.len() + 1, table.columns.len());
        }
        assert_eq!(
            table.value(0, "res_name_id_n_1"),
            Some(&FeatureValue::Integer(ResidueType::Tryptophan.id() as i64))
        );
        assert_eq!(table.value(0, "atom_type_id_n_1"), Some(&FeatureValue::Integer(3)));
        assert_eq!(table.value(0, "atom_type_id_n_2"), Some(&FeatureValue::Integer(1)));
        assert_eq!(table.value(1, "metric_n_2"), Some(&FeatureValue::Float(0.4)));
    }

    #[test]
    fn anchor_slot_leads_with_zero_geometry() {
        let config = encoding(
            vec![CategoricalField::ResidueType, CategoricalField::Element],
            LeadingSlot::AnchorResidue,
            true,
        );
        let table = run(&aggregated(), &config, 2, None).unwrap();
        assert_eq!(
            table.value(0, "res_name_id_n_1"),
            Some(&FeatureValue::Integer(ResidueType::Serine.id() as i64))
        );
        assert_eq!(table.value(0, "atom_type_id_n_1"), Some(&FeatureValue::Integer(0)));
        assert_eq!(table.value(0, "metric_n_1"), Some(&FeatureValue::Float(0.0)));
        assert_eq!(table.value(0, "metric_n_2"), Some(&FeatureValue::Float(0.9)));
        assert_eq!(table.value(0, "confidence_n_3"), Some(&FeatureValue::Float(0.75)));
    }

    #[test]
    fn chemistry_labels_come_from_rows_or_map() {
        let mut map = ChemistryTypeMap::default();
        map.insert(ResidueType::Tryptophan, "CA", "CX").unwrap();
        map.insert(ResidueType::Serine, "H", "H").unwrap();

        let mut table = aggregated();
        if let Some(rows) = table.neighbors.get_mut(&2) {
            rows[0].chemistry_type = Some("O".into());
        }
        let config = encoding(
            vec![CategoricalField::ChemistryType],
            LeadingSlot::AnchorResidue,
            false,
        );
        let features = run(&table, &config, 2, Some(&map)).unwrap();
        assert_eq!(
            features.value(0, "chemistry_type_n_1"),
            Some(&FeatureValue::Label("H".into()))
        );
        assert_eq!(
            features.value(0, "chemistry_type_n_2"),
            Some(&FeatureValue::Label("O".into()))
        );
        assert_eq!(
            features.value(0, "chemistry_type_n_3"),
            Some(&FeatureValue::Label("CX".into()))
        );
    }

    #[test]
    fn chemistry_encoding_without_labels_fails() {
        let config = encoding(vec![CategoricalField::ChemistryType], LeadingSlot::Neighbor, false);
        let err = run(&aggregated(), &config, 2, None).unwrap_err();
        assert!(matches!(err, EngineError::MissingChemistryLabel { res_index: 2 }));
    }

    #[test]
    fn short_anchor_is_an_internal_error() {
        let mut table = aggregated();
        if let Some(rows) = table.neighbors.get_mut(&9) {
            rows.pop();
        }
        let err = run(&table, &default_encoding(), 2, None).unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));
    }
}
