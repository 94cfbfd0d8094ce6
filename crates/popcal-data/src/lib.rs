#![deny(missing_docs)]
//! Tabular inputs of a calibration run.
//!
//! The simulator writes one result table per invocation and the field observations are
//! loaded once per run. Both are keyed by `(year, col, row)`; [`ObservedDataset::join`]
//! pairs them up for the likelihood.

pub mod columns;
pub mod dataset;
pub mod digest;
pub mod key;
pub mod table;

pub use columns::ColumnSpec;
pub use dataset::{population_std, JoinedRow, ObservedDataset, SimulationResult};
pub use digest::{file_digest, sha256_hex};
pub use key::RecordKey;
pub use table::{parse_table, read_table, Delimiter, Table};
