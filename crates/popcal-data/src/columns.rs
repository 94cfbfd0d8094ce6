//! Column naming shared by simulated and observed tables.

use serde::{Deserialize, Serialize};

fn default_year() -> String {
    "sim_year".to_string()
}

fn default_col() -> String {
    "col".to_string()
}

fn default_row() -> String {
    "row".to_string()
}

fn default_result() -> String {
    "result".to_string()
}

fn default_observed() -> String {
    "observed".to_string()
}

/// Names of the key and value columns in simulator output and observed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Year key column.
    #[serde(default = "default_year")]
    pub year: String,
    /// Grid column key.
    #[serde(default = "default_col")]
    pub col: String,
    /// Grid row key.
    #[serde(default = "default_row")]
    pub row: String,
    /// Value column written by the simulator.
    #[serde(default = "default_result")]
    pub result: String,
    /// Value column of the observed dataset.
    #[serde(default = "default_observed")]
    pub observed: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            year: default_year(),
            col: default_col(),
            row: default_row(),
            result: default_result(),
            observed: default_observed(),
        }
    }
}

impl ColumnSpec {
    /// Key column names in `(year, col, row)` order.
    pub fn keys(&self) -> [&str; 3] {
        [&self.year, &self.col, &self.row]
    }
}
