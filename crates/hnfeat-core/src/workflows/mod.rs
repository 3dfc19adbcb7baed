//! # Workflows Module
//!
//! High-level entry points that run the complete featurization pipeline.
//!
//! - **Featurization Workflow** ([`featurize`]) - Per-model featurization of an
//!   ensemble in parallel, followed by aggregation and encoding; re-aggregation
//!   of stored neighbor tables; and batch processing of many structures.

pub mod featurize;
