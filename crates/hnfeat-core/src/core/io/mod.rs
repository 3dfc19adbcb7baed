//! Input/output for structure ensembles and feature tables.
//!
//! Structures are read from PDB text through the [`traits::EnsembleFile`]
//! interface. Intermediate and final tables are plain CSV files written with
//! deterministic float formatting so that repeated runs produce identical bytes.

pub mod pdb;
pub mod tables;
pub mod traits;
