//! # hnfeat Core Library
//!
//! Converts ensembles of protein structural models into fixed-width,
//! rotation-invariant feature vectors that describe the chemical environment of
//! every backbone amide hydrogen, for use as input to chemical-shift predictors.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, the
//!   feature tables and their fixed vocabularies), the local-frame geometry, the
//!   chemistry-type map and PDB/CSV I/O.
//!
//! - **[`engine`]: The Logic Core.** The spatial index and the pipeline stages:
//!   neighbor search, frame construction, geometry transformation, ensemble
//!   aggregation and feature encoding, plus their configuration, errors and
//!   progress reporting.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into
//!   complete runs: featurizing every model of an ensemble in parallel,
//!   aggregating the results and encoding the final feature table.

pub mod core;
pub mod engine;
pub mod workflows;
