//! # Engine Module
//!
//! The featurization engine: a spatial index over each model and the pipeline
//! stages that turn it into neighbor, aggregated and feature tables.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated parameters and their builder
//! - **Spatial Index** ([`index`]) - k-d tree over the indexable atoms of one model
//! - **Tasks** ([`tasks`]) - Neighbor search, local frames, geometry transform,
//!   ensemble aggregation and encoding
//! - **State Tracking** ([`state`]) - Skip records and per-model outcomes
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-level error types
//!
//! Residues that cannot be featurized are skipped locally and recorded; only
//! configuration, I/O and data-consistency problems are errors.

pub mod config;
pub mod context;
pub mod error;
pub mod index;
pub mod progress;
pub mod state;
pub mod tasks;
