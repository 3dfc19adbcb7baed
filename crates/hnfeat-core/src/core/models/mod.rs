//! # Core Models Module
//!
//! Data structures for one structural model and for the feature tables derived
//! from an ensemble of models.
//!
//! ## Key Components
//!
//! - [`atom`] - Atoms and the fixed element vocabulary ([`atom::Element`])
//! - [`residue`] - Residues and the canonical residue vocabulary ([`residue::ResidueType`])
//! - [`structure`] - One parsed model with sequence-ordered residues, plus its builder
//! - [`features`] - Per-model, aggregated, and pivoted feature tables
//! - [`ids`] - Stable identifiers for atoms and residues
//!
//! ## Usage
//!
//! ```ignore
//! use hnfeat::core::models::structure::StructureBuilder;
//! use nalgebra::Point3;
//!
//! let mut builder = StructureBuilder::new();
//! builder.start_residue(1, None, "ALA", 'A');
//! builder.add_atom("N", Point3::new(0.0, 0.0, 0.0), 1.0, 0.0);
//! let structure = builder.build();
//! ```

pub mod atom;
pub mod features;
pub mod ids;
pub mod residue;
pub mod structure;
