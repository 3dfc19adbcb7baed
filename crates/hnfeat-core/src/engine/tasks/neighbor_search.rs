use crate::core::models::atom::Element;
use crate::core::models::residue::{Residue, ResidueType};
use crate::core::models::structure::Structure;
use crate::engine::config::SearchConfig;
use crate::engine::index::{IndexedAtom, StructureIndex};
use crate::engine::state::{SkipReason, SkipRecord};
use nalgebra::Point3;
use tracing::{debug, instrument, trace};

/// Distance below which a found atom is treated as the query hydrogen itself.
pub const SELF_COINCIDENCE_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<'a> {
    pub atom: &'a IndexedAtom,
    pub distance: f64,
}

/// The nearest atoms around one amide hydrogen, nearest first.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorNeighbors<'a> {
    pub res_index: usize,
    pub residue_type: ResidueType,
    pub hydrogen: Point3<f64>,
    pub neighbors: Vec<Neighbor<'a>>,
}

/// Finds the neighbors of one residue's amide hydrogen.
///
/// The hydrogen is excluded by coordinate coincidence rather than identity, so a
/// different atom sharing its exact position is excluded as well.
pub fn find_for_residue<'a>(
    structure: &Structure,
    index: &'a StructureIndex,
    residue: &Residue,
    config: &SearchConfig,
) -> Result<AnchorNeighbors<'a>, SkipReason> {
    let residue_type = residue.residue_type.ok_or(SkipReason::NonCanonical)?;
    let hydrogen = structure
        .residue_atom(residue, "H")
        .ok_or(SkipReason::MissingAmideAtoms)?;
    if !residue.has_atom("N") {
        return Err(SkipReason::MissingAmideAtoms);
    }

    let neighbors = index
        .nearest(&hydrogen.position, config.query_count)
        .into_iter()
        .filter(|(_, distance)| *distance > SELF_COINCIDENCE_TOLERANCE)
        .filter(|(atom, _)| !(config.exclude_hydrogens && atom.element == Element::H))
        .take(config.neighbor_count)
        .map(|(atom, distance)| Neighbor { atom, distance })
        .collect();

    Ok(AnchorNeighbors {
        res_index: residue.index,
        residue_type,
        hydrogen: hydrogen.position,
        neighbors,
    })
}

#[instrument(skip_all, name = "neighbor_search_task", fields(model = model_index))]
pub fn run<'a>(
    structure: &Structure,
    index: &'a StructureIndex,
    config: &SearchConfig,
    model_index: usize,
) -> (Vec<AnchorNeighbors<'a>>, Vec<SkipRecord>) {
    let mut anchors = Vec::new();
    let mut skips = Vec::new();

    for residue in structure.residues() {
        match find_for_residue(structure, index, residue, config) {
            Ok(anchor) => anchors.push(anchor),
            Err(reason) => {
                trace!(residue = residue.index, %reason, "Residue is not an anchor");
                skips.push(SkipRecord::residue(model_index, residue.index, reason));
            }
        }
    }

    debug!(
        anchors = anchors.len(),
        skipped = skips.len(),
        "Neighbor search complete."
    );
    (anchors, skips)
}
