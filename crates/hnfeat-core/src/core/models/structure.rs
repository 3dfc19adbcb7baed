use super::atom::Atom;
use super::ids::{AtomId, ResidueId};
use super::residue::Residue;
use nalgebra::Point3;
use slotmap::SlotMap;

/// One structural model: the residues of a single chain in sequence order and
/// their atoms.
///
/// A `Structure` is read-only after construction. Residue sequence indices are
/// assigned by [`StructureBuilder`] in insertion order and are contiguous from
/// zero, which is what anchors every output row to its position in the chain.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    atoms: SlotMap<AtomId, Atom>,
    residues: SlotMap<ResidueId, Residue>,
    /// Residue IDs ordered by sequence index.
    sequence: Vec<ResidueId>,
}

impl Structure {
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Returns the residue at a given sequence index.
    pub fn residue_at(&self, index: usize) -> Option<&Residue> {
        self.sequence.get(index).and_then(|&id| self.residues.get(id))
    }

    /// Iterates residues in sequence order.
    pub fn residues(&self) -> impl Iterator<Item = &Residue> + '_ {
        self.sequence.iter().filter_map(|&id| self.residues.get(id))
    }

    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    /// Looks up an atom of a residue by name.
    pub fn residue_atom(&self, residue: &Residue, name: &str) -> Option<&Atom> {
        residue
            .get_atom_id_by_name(name)
            .and_then(|id| self.atoms.get(id))
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue_count(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Incremental builder used by the file readers.
///
/// Residues are opened with [`start_residue`](Self::start_residue); subsequent
/// atoms are attached to the most recently opened residue.
#[derive(Debug, Default)]
pub struct StructureBuilder {
    structure: Structure,
    current_residue: Option<ResidueId>,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_residue(
        &mut self,
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        chain_id: char,
    ) -> &mut Self {
        let index = self.structure.sequence.len();
        let residue = Residue::new(index, number, insertion_code, name, chain_id);
        let id = self.structure.residues.insert(residue);
        self.structure.sequence.push(id);
        self.current_residue = Some(id);
        self
    }

    /// Adds an atom to the current residue.
    ///
    /// Returns `None` when no residue has been started or when the residue
    /// already holds an atom with the same name (alternate locations after the
    /// first are dropped this way).
    pub fn add_atom(
        &mut self,
        name: &str,
        position: Point3<f64>,
        occupancy: f64,
        b_factor: f64,
    ) -> Option<AtomId> {
        let residue_id = self.current_residue?;
        let residue = self.structure.residues.get(residue_id)?;
        let name = name.trim();
        if residue.has_atom(name) {
            return None;
        }

        let mut atom = Atom::new(name, residue_id, position);
        atom.occupancy = occupancy;
        atom.b_factor = b_factor;
        let atom_id = self.structure.atoms.insert(atom);
        if let Some(residue) = self.structure.residues.get_mut(residue_id) {
            residue.add_atom(name, atom_id);
        }
        Some(atom_id)
    }

    pub fn residue_count(&self) -> usize {
        self.structure.sequence.len()
    }

    pub fn build(self) -> Structure {
        self.structure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Element;
    use crate::core::models::residue::ResidueType;

    fn two_residue_structure() -> Structure {
        let mut builder = StructureBuilder::new();
        builder.start_residue(5, None, "GLY", 'A');
        builder.add_atom("N", Point3::new(0.0, 0.0, 0.0), 1.0, 90.0);
        builder.add_atom("CA", Point3::new(1.4, 0.0, 0.0), 1.0, 91.0);
        builder.start_residue(6, Some('A'), "HOH", 'A');
        builder.add_atom("O", Point3::new(5.0, 5.0, 5.0), 0.5, 20.0);
        builder.build()
    }

    #[test]
    fn builder_assigns_contiguous_sequence_indices() {
        let structure = two_residue_structure();
        let indices: Vec<usize> = structure.residues().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(structure.residue_count(), 2);
        assert_eq!(structure.atom_count(), 3);

        let second = structure.residue_at(1).unwrap();
        assert_eq!(second.number, 6);
        assert_eq!(second.insertion_code, Some('A'));
        assert_eq!(second.residue_type, None);
    }

    #[test]
    fn atoms_are_attached_to_current_residue_with_metadata() {
        let structure = two_residue_structure();
        let first = structure.residue_at(0).unwrap();
        assert_eq!(first.residue_type, Some(ResidueType::Glycine));

        let ca = structure.residue_atom(first, "CA").unwrap();
        assert_eq!(ca.element, Some(Element::C));
        assert_eq!(ca.b_factor, 91.0);
        assert_eq!(ca.position, Point3::new(1.4, 0.0, 0.0));
        assert!(structure.residue_atom(first, "CB").is_none());
    }

    #[test]
    fn add_atom_without_residue_is_rejected() {
        let mut builder = StructureBuilder::new();
        assert!(builder.add_atom("N", Point3::origin(), 1.0, 0.0).is_none());
        assert!(builder.build().is_empty());
    }

    #[test]
    fn duplicate_atom_names_keep_first_location() {
        let mut builder = StructureBuilder::new();
        builder.start_residue(1, None, "SER", 'A');
        assert!(builder.add_atom("OG", Point3::new(1.0, 0.0, 0.0), 0.6, 0.0).is_some());
        assert!(builder.add_atom("OG", Point3::new(2.0, 0.0, 0.0), 0.4, 0.0).is_none());
        let structure = builder.build();
        let residue = structure.residue_at(0).unwrap();
        let og = structure.residue_atom(residue, "OG").unwrap();
        assert_eq!(og.position.x, 1.0);
    }
}
