//! Delimited text tables with a header row.
//!
//! Simulator builds differ in how they write their result table, so the delimiter is
//! sniffed from the header line: a comma wins, then a tab, otherwise fields are split on
//! runs of whitespace.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use popcal_core::errors::{CalibError, ErrorInfo};

/// Field separator detected for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `,`
    Comma,
    /// `\t`
    Tab,
    /// Any run of spaces or tabs.
    Whitespace,
}

impl Delimiter {
    /// Picks the delimiter from a header line.
    pub fn sniff(header: &str) -> Self {
        if header.contains(',') {
            Delimiter::Comma
        } else if header.contains('\t') {
            Delimiter::Tab
        } else {
            Delimiter::Whitespace
        }
    }
}

/// Header plus string cells, one inner vector per data row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Column names in file order.
    pub headers: Vec<String>,
    /// Data rows, each with exactly `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Index of the named column.
    pub fn column_index(&self, name: &str) -> Result<usize, CalibError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| {
                CalibError::Data(
                    ErrorInfo::new("missing-column", format!("column '{name}' not found"))
                        .with_context("column", name)
                        .with_context("headers", self.headers.join(",")),
                )
            })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads and parses a table from disk.
pub fn read_table(path: &Path) -> Result<Table, CalibError> {
    let text = fs::read_to_string(path).map_err(|err| CalibError::io("table-read", path, err))?;
    parse_table(&text).map_err(|err| match err {
        CalibError::Data(info) => {
            CalibError::Data(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}

/// Parses a table held in memory.
pub fn parse_table(text: &str) -> Result<Table, CalibError> {
    let text = text.trim_start_matches('\u{feff}');
    let header_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| CalibError::Data(ErrorInfo::new("table-empty", "table has no header")))?;

    let delimiter = Delimiter::sniff(header_line);
    let (normalized, separator) = match delimiter {
        Delimiter::Comma => (text.to_string(), b','),
        Delimiter::Tab => (text.to_string(), b'\t'),
        Delimiter::Whitespace => (
            text.lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| line.split_whitespace().collect::<Vec<_>>().join(","))
                .collect::<Vec<_>>()
                .join("\n"),
            b',',
        ),
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(separator)
        .trim(Trim::All)
        .from_reader(normalized.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| wrap_csv("table-header", err))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| wrap_csv("table-record", err))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

fn wrap_csv(code: &str, err: csv::Error) -> CalibError {
    let mut info = ErrorInfo::new(code, "malformed table").with_hint(err.to_string());
    if let Some(position) = err.position() {
        info = info.with_context("line", position.line().to_string());
    }
    CalibError::Data(info)
}
