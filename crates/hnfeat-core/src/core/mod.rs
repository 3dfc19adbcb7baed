//! # Core Module
//!
//! Fundamental data structures and stateless utilities for amide-hydrogen
//! featurization.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, single-model
//!   structures and the typed neighbor/feature tables
//! - **File I/O** ([`io`]) - PDB ensemble reading and CSV table persistence
//! - **Chemistry Labels** ([`chemistry`]) - Residue/atom-name to chemistry-type mapping
//! - **Geometry** ([`utils`]) - Local coordinate frames

pub mod chemistry;
pub mod io;
pub mod models;
pub mod utils;
