//! # Perfstat Dataset Crate
//!
//! This crate turns a CSV file into the typed, read-only `Table` the analysis
//! stages consume. It is the only place that knows about file formats.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** Encapsulates all file-specific logic behind `load_table`.
//! - **Fail Fast:** Rows are validated against the `Observation` schema at load
//!   time. Malformed text is an error with its line number; a missing cell is
//!   kept as a non-finite value so the group stage can exclude it explicitly.
//!
//! ## Public API
//!
//! - `load_table`: Opens and parses a file using the `[data]` configuration.
//! - `read_table`: The same for any `std::io::Read`.
//! - `DataLoadError`: The specific error types that can be returned from this crate.

pub mod error;
pub mod loader;

pub use error::DataLoadError;
pub use loader::{load_table, read_table};
