//! Pipeline stages.
//!
//! The per-model stages run in order on one parsed model: [`neighbor_search`]
//! finds the atoms around every amide hydrogen, [`orientation`] builds each
//! anchor's local frame, and [`transform`] expresses the neighbors in that frame.
//! After all models are done, [`aggregation`] merges their tables and
//! [`encoding`] pivots the result into fixed-width rows.

pub mod aggregation;
pub mod encoding;
pub mod neighbor_search;
pub mod orientation;
pub mod transform;
