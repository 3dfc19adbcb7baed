use crate::core::models::features::NeighborTable;
use std::collections::BTreeMap;
use std::fmt;

/// Why the local frame of an anchor could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrientationFailure {
    /// The residue's own backbone N was not among the found neighbors.
    MissingNitrogen,
    /// No carbon of the preceding residue lies within the bond cutoff of N.
    MissingCarbonyl,
    /// The H, N and C positions do not span a plane.
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// The model has no indexable atoms.
    EmptyModel,
    /// The residue is not one of the canonical amino acids.
    NonCanonical,
    /// The residue lacks its amide H or backbone N.
    MissingAmideAtoms,
    Orientation(OrientationFailure),
    /// Fewer usable neighbors than the configured neighbor count.
    IncompleteNeighbors { found: usize, expected: usize },
}

impl SkipReason {
    /// A short stable label used to group skips in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::EmptyModel => "empty-model",
            SkipReason::NonCanonical => "non-canonical",
            SkipReason::MissingAmideAtoms => "missing-amide-atoms",
            SkipReason::Orientation(OrientationFailure::MissingNitrogen) => "missing-nitrogen",
            SkipReason::Orientation(OrientationFailure::MissingCarbonyl) => "missing-carbonyl",
            SkipReason::Orientation(OrientationFailure::Degenerate) => "degenerate-frame",
            SkipReason::IncompleteNeighbors { .. } => "incomplete-neighbors",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::IncompleteNeighbors { found, expected } => {
                write!(f, "{} ({} of {})", self.label(), found, expected)
            }
            _ => f.write_str(self.label()),
        }
    }
}

/// A residue (or whole model) that was left out of a model's neighbor table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRecord {
    pub model_index: usize,
    /// `None` when the whole model was skipped.
    pub residue_index: Option<usize>,
    pub reason: SkipReason,
}

impl SkipRecord {
    pub fn residue(model_index: usize, residue_index: usize, reason: SkipReason) -> Self {
        Self {
            model_index,
            residue_index: Some(residue_index),
            reason,
        }
    }

    pub fn model(model_index: usize, reason: SkipReason) -> Self {
        Self {
            model_index,
            residue_index: None,
            reason,
        }
    }
}

/// Output of the per-model stages.
#[derive(Debug, Clone, Default)]
pub struct ModelOutcome {
    pub table: NeighborTable,
    pub skips: Vec<SkipRecord>,
}

/// Counts skip records per reason label, in label order.
pub fn summarize_skips(skips: &[SkipRecord]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for skip in skips {
        *counts.entry(skip.reason.label()).or_insert(0) += 1;
    }
    counts
}
