use super::atom::Element;
use super::residue::ResidueType;
use nalgebra::Vector3;
use std::collections::BTreeMap;
use std::fmt;

/// Identity of one physical neighbor of one anchor, stable across ensemble
/// models: (anchor residue index, neighbor residue index, neighbor atom name).
///
/// The derived ordering is the canonical ordering used for grouping and for
/// tie-breaking during top-K selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NeighborKey {
    pub res_index: usize,
    pub neighbor_res_index: usize,
    pub atom_name: String,
}

/// One (anchor, neighbor atom) pair observed in a single model, expressed in the
/// anchor's local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRecord {
    pub res_index: usize,
    pub atom_type: Element,
    pub res_name: ResidueType,
    /// Unit direction from the amide hydrogen to the neighbor, in the local frame.
    pub direction: Vector3<f64>,
    /// Inverse-distance score, `scaling_constant / distance`.
    pub metric: f64,
    pub atom_name: String,
    pub neighbor_res_index: usize,
    /// Neighbor B-factor scaled by 1/100.
    pub confidence: f64,
    pub chemistry_type: Option<String>,
}

impl NeighborRecord {
    pub fn key(&self) -> NeighborKey {
        NeighborKey {
            res_index: self.res_index,
            neighbor_res_index: self.neighbor_res_index,
            atom_name: self.atom_name.clone(),
        }
    }
}

/// All neighbor records produced from one ensemble model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NeighborTable {
    pub model_index: usize,
    /// Residue type of every anchor that produced rows in this model.
    pub anchors: BTreeMap<usize, ResidueType>,
    pub records: Vec<NeighborRecord>,
}

impl NeighborTable {
    pub fn new(model_index: usize) -> Self {
        Self {
            model_index,
            ..Default::default()
        }
    }

    /// Appends the rows of one anchor.
    pub fn push_anchor(
        &mut self,
        res_index: usize,
        residue_type: ResidueType,
        records: Vec<NeighborRecord>,
    ) {
        self.anchors.insert(res_index, residue_type);
        self.records.extend(records);
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records_for(&self, res_index: usize) -> impl Iterator<Item = &NeighborRecord> {
        self.records
            .iter()
            .filter(move |record| record.res_index == res_index)
    }
}

/// One physical neighbor of an anchor after merging every ensemble model.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedNeighbor {
    pub res_index: usize,
    pub atom_type: Element,
    pub res_name: ResidueType,
    /// Component-wise mean of the per-model directions (not renormalized).
    pub direction: Vector3<f64>,
    pub metric: f64,
    pub atom_name: String,
    pub neighbor_res_index: usize,
    pub confidence: f64,
    /// Number of models that observed this neighbor.
    pub model_count: usize,
    pub chemistry_type: Option<String>,
}

impl AggregatedNeighbor {
    pub fn key(&self) -> NeighborKey {
        NeighborKey {
            res_index: self.res_index,
            neighbor_res_index: self.neighbor_res_index,
            atom_name: self.atom_name.clone(),
        }
    }
}

/// The top-K aggregated neighbors of every retained anchor of one structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatedTable {
    pub anchors: BTreeMap<usize, ResidueType>,
    /// Per anchor, neighbors ordered by descending metric.
    pub neighbors: BTreeMap<usize, Vec<AggregatedNeighbor>>,
}

impl AggregatedTable {
    pub fn anchor_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// All rows, anchors ascending, neighbors by descending metric.
    pub fn rows(&self) -> impl Iterator<Item = &AggregatedNeighbor> {
        self.neighbors.values().flatten()
    }
}

/// A single cell of the pivoted feature table.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Integer(i64),
    Float(f64),
    Label(String),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Integer(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Label(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub res_index: usize,
    /// One value per column after `res_index`.
    pub values: Vec<FeatureValue>,
}

/// One fixed-width row per anchor; `columns` starts with `res_index`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Looks up a cell by anchor row position and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&FeatureValue> {
        let col = self.column_index(column)?;
        // Column 0 is res_index, which is stored outside `values`.
        col.checked_sub(1)
            .and_then(|c| self.rows.get(row).and_then(|r| r.values.get(c)))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
