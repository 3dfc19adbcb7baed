use crate::core::models::atom::Element;
use crate::core::models::ids::AtomId;
use crate::core::models::residue::ResidueType;
use crate::core::models::structure::Structure;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;

/// An atom that takes part in neighbor search, with its residue context resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedAtom {
    pub atom_id: AtomId,
    pub name: String,
    pub element: Element,
    pub residue_index: usize,
    pub residue_type: ResidueType,
    pub position: Point3<f64>,
    /// B-factor scaled by 1/100.
    pub confidence: f64,
}

/// A k-d tree over the indexable atoms of one model.
///
/// Only atoms of canonical residues whose element is one of H, C, N, O, S are
/// indexed.
pub struct StructureIndex {
    atoms: Vec<IndexedAtom>,
    tree: KdTree<f64, 3>,
}

impl StructureIndex {
    /// Returns `None` when the model has no indexable atom.
    pub fn build(structure: &Structure) -> Option<Self> {
        let mut atoms = Vec::with_capacity(structure.atom_count());
        for residue in structure.residues() {
            let Some(residue_type) = residue.residue_type else {
                continue;
            };
            for &atom_id in residue.atoms() {
                let Some(atom) = structure.atom(atom_id) else {
                    continue;
                };
                let Some(element) = atom.element else {
                    continue;
                };
                atoms.push(IndexedAtom {
                    atom_id,
                    name: atom.name.clone(),
                    element,
                    residue_index: residue.index,
                    residue_type,
                    position: atom.position,
                    confidence: atom.b_factor / 100.0,
                });
            }
        }

        if atoms.is_empty() {
            return None;
        }

        let positions: Vec<[f64; 3]> = atoms
            .iter()
            .map(|a| [a.position.x, a.position.y, a.position.z])
            .collect();
        let tree: KdTree<f64, 3> = (&positions).into();
        Some(Self { atoms, tree })
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[IndexedAtom] {
        &self.atoms
    }

    /// The `k` atoms closest to `point`, nearest first, with Euclidean distances.
    pub fn nearest(&self, point: &Point3<f64>, k: usize) -> Vec<(&IndexedAtom, f64)> {
        if k == 0 {
            return Vec::new();
        }
        let query = [point.x, point.y, point.z];
        self.tree
            .nearest_n::<SquaredEuclidean>(&query, k)
            .into_iter()
            .filter_map(|nn| {
                self.atoms
                    .get(nn.item as usize)
                    .map(|atom| (atom, nn.distance.sqrt()))
            })
            .collect()
    }
}
