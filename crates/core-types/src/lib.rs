//! # Perfstat Core Types
//!
//! The shared vocabulary of the workspace: the typed `Observation` row, the
//! read-only `Table` that every stage borrows, and the keys used to partition
//! it into groups.
//!
//! This crate has no knowledge of files, statistics or the command line.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{CorrectionMethod, KeyField, TestMethod};
pub use error::CoreError;
pub use structs::{Group, GroupKey, GroupKeys, Observation, Table, period_year};
