use super::neighbor_search::AnchorNeighbors;
use crate::core::models::atom::Element;
use crate::core::utils::geometry::LocalFrame;
use crate::engine::config::FrameConfig;
use crate::engine::state::{OrientationFailure, SkipReason, SkipRecord};
use tracing::{debug, instrument};

/// Builds the local frame of an anchor from atoms among its found neighbors.
///
/// N is the anchor's own backbone nitrogen. C is the first carbon of the
/// preceding residue (in neighbor order) within `bond_cutoff` of N.
pub fn build_frame(
    anchor: &AnchorNeighbors<'_>,
    config: &FrameConfig,
) -> Result<LocalFrame, OrientationFailure> {
    let nitrogen = anchor
        .neighbors
        .iter()
        .find(|n| n.atom.residue_index == anchor.res_index && n.atom.name == "N")
        .ok_or(OrientationFailure::MissingNitrogen)?;

    let previous = anchor
        .res_index
        .checked_sub(1)
        .ok_or(OrientationFailure::MissingCarbonyl)?;
    let carbon = anchor
        .neighbors
        .iter()
        .find(|n| {
            n.atom.residue_index == previous
                && n.atom.element == Element::C
                && (n.atom.position - nitrogen.atom.position).norm() <= config.bond_cutoff
        })
        .ok_or(OrientationFailure::MissingCarbonyl)?;

    LocalFrame::from_points(
        &anchor.hydrogen,
        &nitrogen.atom.position,
        &carbon.atom.position,
    )
    .map_err(|_| OrientationFailure::Degenerate)
}

#[instrument(skip_all, name = "orientation_task", fields(model = model_index))]
pub fn run<'a>(
    anchors: Vec<AnchorNeighbors<'a>>,
    config: &FrameConfig,
    model_index: usize,
) -> (Vec<(AnchorNeighbors<'a>, LocalFrame)>, Vec<SkipRecord>) {
    let mut oriented = Vec::with_capacity(anchors.len());
    let mut skips = Vec::new();

    for anchor in anchors {
        match build_frame(&anchor, config) {
            Ok(frame) => oriented.push((anchor, frame)),
            Err(failure) => {
                debug!(residue = anchor.res_index, ?failure, "Skipping anchor without a frame");
                skips.push(SkipRecord::residue(
                    model_index,
                    anchor.res_index,
                    SkipReason::Orientation(failure),
                ));
            }
        }
    }
    (oriented, skips)
}
