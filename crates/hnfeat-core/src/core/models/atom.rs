use super::ids::ResidueId;
use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chemical element of an atom, restricted to the elements that occur in the
/// twenty canonical amino acids.
///
/// The declaration order is the authoritative id order used by every feature
/// table (`H` = 0 ... `S` = 4). Encoders and decoders must go through
/// [`Element::id`] and [`Element::from_id`] rather than hard-coding numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    /// Hydrogen.
    H,
    /// Carbon.
    C,
    /// Nitrogen.
    N,
    /// Oxygen.
    O,
    /// Sulfur.
    S,
}

impl Element {
    /// The full element vocabulary in id order.
    pub const ALL: [Element; 5] = [Element::H, Element::C, Element::N, Element::O, Element::S];

    /// Returns the stable numeric id of this element.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Looks up an element by its stable numeric id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Returns the one-letter element symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Element::H => "H",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::S => "S",
        }
    }

    /// Infers the element from a PDB-style atom name.
    ///
    /// The name is trimmed and a single leading digit is dropped (`1HD1` is read
    /// as `HD1`), then the first character decides the element. Names whose first
    /// character is not a recognized element yield `None`.
    pub fn from_atom_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        let mut chars = trimmed.chars();
        let first = chars.next()?;
        let symbol = if first.is_ascii_digit() {
            chars.next()?
        } else {
            first
        };
        match symbol.to_ascii_uppercase() {
            'H' => Some(Element::H),
            'C' => Some(Element::C),
            'N' => Some(Element::N),
            'O' => Some(Element::O),
            'S' => Some(Element::S),
            _ => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unrecognized element symbol: '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "H" => Ok(Element::H),
            "C" => Ok(Element::C),
            "N" => Ok(Element::N),
            "O" => Ok(Element::O),
            "S" => Ok(Element::S),
            _ => Err(ParseElementError(s.to_string())),
        }
    }
}

/// An atom of one structural model.
///
/// Atoms are immutable once the model has been parsed; the element is inferred
/// from the atom name at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The trimmed atom name (e.g. "CA", "HD21").
    pub name: String,
    /// The element inferred from the name, `None` if not one of H, C, N, O, S.
    pub element: Option<Element>,
    /// The ID of the parent residue.
    pub residue_id: ResidueId,
    /// Cartesian coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Crystallographic occupancy.
    pub occupancy: f64,
    /// B-factor column; holds per-atom confidence (pLDDT) for predicted models.
    pub b_factor: f64,
}

impl Atom {
    /// Creates an atom with unit occupancy and a zero B-factor.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        let name = name.trim();
        Self {
            name: name.to_string(),
            element: Element::from_atom_name(name),
            residue_id,
            position,
            occupancy: 1.0,
            b_factor: 0.0,
        }
    }
}
