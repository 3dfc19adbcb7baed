use crate::core::models::atom::Element;
use crate::core::models::features::{
    AggregatedTable, FeatureTable, NeighborRecord, NeighborTable,
};
use crate::core::models::residue::ResidueType;
use nalgebra::Vector3;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

pub const NEIGHBOR_TABLE_COLUMNS: [&str; 10] = [
    "res_index",
    "atom_type_id",
    "res_name_id",
    "dx",
    "dy",
    "dz",
    "metric",
    "atom_name",
    "neighbor_res_index",
    "confidence",
];

pub const CHEMISTRY_TYPE_COLUMN: &str = "chemistry_type";
pub const MODEL_COUNT_COLUMN: &str = "model_count";

#[derive(Debug, Error)]
pub enum TableIoError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}: unknown {field} id {id}")]
    UnknownId {
        row: usize,
        field: &'static str,
        id: u8,
    },
    #[error("Anchor {res_index} has no row for one of its own atoms; its residue type is unknown")]
    MissingAnchorType { res_index: usize },
}

fn open_writer(path: &Path) -> Result<BufWriter<File>, TableIoError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| TableIoError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
}

fn has_chemistry<'a>(mut labels: impl Iterator<Item = &'a Option<String>>) -> bool {
    labels.any(|label| label.is_some())
}

fn geometry_fields(direction: &Vector3<f64>, metric: f64) -> [String; 4] {
    [
        direction.x.to_string(),
        direction.y.to_string(),
        direction.z.to_string(),
        metric.to_string(),
    ]
}

/// Writes one model's neighbor records as CSV.
///
/// The `chemistry_type` column is present only when at least one record carries
/// a chemistry label.
pub fn write_neighbor_table(
    table: &NeighborTable,
    writer: impl Write,
) -> Result<(), TableIoError> {
    let with_chemistry = has_chemistry(table.records.iter().map(|r| &r.chemistry_type));
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = NEIGHBOR_TABLE_COLUMNS.to_vec();
    if with_chemistry {
        header.push(CHEMISTRY_TYPE_COLUMN);
    }
    csv_writer.write_record(&header)?;

    for record in &table.records {
        let [dx, dy, dz, metric] = geometry_fields(&record.direction, record.metric);
        let mut row = vec![
            record.res_index.to_string(),
            record.atom_type.id().to_string(),
            record.res_name.id().to_string(),
            dx,
            dy,
            dz,
            metric,
            record.atom_name.clone(),
            record.neighbor_res_index.to_string(),
            record.confidence.to_string(),
        ];
        if with_chemistry {
            row.push(record.chemistry_type.clone().unwrap_or_default());
        }
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_neighbor_table_to_path(
    table: &NeighborTable,
    path: &Path,
) -> Result<(), TableIoError> {
    write_neighbor_table(table, open_writer(path)?)
}

#[derive(Debug, Deserialize)]
struct NeighborRow {
    res_index: usize,
    atom_type_id: u8,
    res_name_id: u8,
    dx: f64,
    dy: f64,
    dz: f64,
    metric: f64,
    atom_name: String,
    neighbor_res_index: usize,
    confidence: f64,
    chemistry_type: Option<String>,
}

/// Reads a neighbor table checkpoint written by [`write_neighbor_table`].
///
/// Anchor residue types are recovered from each anchor's rows that refer to
/// its own residue (the backbone nitrogen is always among them).
pub fn read_neighbor_table(
    reader: impl Read,
    model_index: usize,
) -> Result<NeighborTable, TableIoError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut table = NeighborTable::new(model_index);

    for (row_num, result) in csv_reader.deserialize::<NeighborRow>().enumerate() {
        let row = result?;
        let atom_type = Element::from_id(row.atom_type_id).ok_or(TableIoError::UnknownId {
            row: row_num + 1,
            field: "atom_type",
            id: row.atom_type_id,
        })?;
        let res_name = ResidueType::from_id(row.res_name_id).ok_or(TableIoError::UnknownId {
            row: row_num + 1,
            field: "res_name",
            id: row.res_name_id,
        })?;
        if row.neighbor_res_index == row.res_index {
            table.anchors.insert(row.res_index, res_name);
        }
        table.records.push(NeighborRecord {
            res_index: row.res_index,
            atom_type,
            res_name,
            direction: Vector3::new(row.dx, row.dy, row.dz),
            metric: row.metric,
            atom_name: row.atom_name,
            neighbor_res_index: row.neighbor_res_index,
            confidence: row.confidence,
            chemistry_type: row.chemistry_type.filter(|label| !label.is_empty()),
        });
    }

    if let Some(orphan) = table
        .records
        .iter()
        .find(|r| !table.anchors.contains_key(&r.res_index))
    {
        return Err(TableIoError::MissingAnchorType {
            res_index: orphan.res_index,
        });
    }
    Ok(table)
}

pub fn read_neighbor_table_from_path(
    path: &Path,
    model_index: usize,
) -> Result<NeighborTable, TableIoError> {
    let file = File::open(path).map_err(|e| TableIoError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    read_neighbor_table(file, model_index)
}

/// Writes the top-K aggregated rows of every retained anchor.
pub fn write_aggregated_table(
    table: &AggregatedTable,
    writer: impl Write,
) -> Result<(), TableIoError> {
    let with_chemistry = has_chemistry(table.rows().map(|r| &r.chemistry_type));
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = NEIGHBOR_TABLE_COLUMNS.to_vec();
    header.push(MODEL_COUNT_COLUMN);
    if with_chemistry {
        header.push(CHEMISTRY_TYPE_COLUMN);
    }
    csv_writer.write_record(&header)?;

    for row in table.rows() {
        let [dx, dy, dz, metric] = geometry_fields(&row.direction, row.metric);
        let mut fields = vec![
            row.res_index.to_string(),
            row.atom_type.id().to_string(),
            row.res_name.id().to_string(),
            dx,
            dy,
            dz,
            metric,
            row.atom_name.clone(),
            row.neighbor_res_index.to_string(),
            row.confidence.to_string(),
            row.model_count.to_string(),
        ];
        if with_chemistry {
            fields.push(row.chemistry_type.clone().unwrap_or_default());
        }
        csv_writer.write_record(&fields)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_aggregated_table_to_path(
    table: &AggregatedTable,
    path: &Path,
) -> Result<(), TableIoError> {
    write_aggregated_table(table, open_writer(path)?)
}

/// Writes the pivoted feature table, one row per anchor.
pub fn write_feature_table(table: &FeatureTable, writer: impl Write) -> Result<(), TableIoError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&table.columns)?;
    for row in &table.rows {
        let fields = std::iter::once(row.res_index.to_string())
            .chain(row.values.iter().map(|v| v.to_string()));
        csv_writer.write_record(fields)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_feature_table_to_path(table: &FeatureTable, path: &Path) -> Result<(), TableIoError> {
    write_feature_table(table, open_writer(path)?)
}
