//! # yojitsu-input
//!
//! Source readers for yojitsu.
//!
//! This crate provides:
//! - Spreadsheet reading via calamine (.xlsx, .xlsm, .xls, .ods)
//! - CSV reading
//! - Tolerant date-column matching and Budget record extraction
//! - Grouping of records into calendar months
//!
//! ## Example
//!
//! ```rust
//! use yojitsu_input::{csv_reader::read_csv_from, load_tables};
//!
//! let data = "日付,室数,宿泊売上\n2025/04/01,80,\"960,000\"\n2025/04/02,72,864000\n";
//! let table = read_csv_from(data.as_bytes(), "budget").unwrap();
//! let loaded = load_tables(&[table]);
//! assert_eq!(loaded.months.len(), 1);
//! assert_eq!(loaded.months[0].records[0].revenue, Some(960_000.0));
//! ```

pub mod csv_reader;
pub mod matcher;
pub mod records;
pub mod table;
pub mod xlsx;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use matcher::{find_date_column, normalize_header, MetricColumns};
pub use records::{extract_records, group_by_month, load_tables, LoadReport, LoadedInput};
pub use table::{SourceTable, SourceValue};

/// Input error
#[derive(Debug, Error)]
pub enum InputError {
    #[error("table '{table}' has no date column")]
    NoDateColumn { table: String },

    #[error("table '{table}' has no rows with a valid date")]
    EmptyDataset { table: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read spreadsheet {path}: {source}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("cannot read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unsupported source format: {0}")]
    UnsupportedFormat(PathBuf),
}

impl InputError {
    /// Whether the error only affects one table of the source
    pub fn is_table_local(&self) -> bool {
        matches!(
            self,
            InputError::NoDateColumn { .. } | InputError::EmptyDataset { .. }
        )
    }
}

/// Supported source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Any workbook calamine reads
    Spreadsheet,
    Csv,
}

/// Detect the source format from the file extension
pub fn detect_format(path: &Path) -> Result<SourceFormat, InputError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => Ok(SourceFormat::Spreadsheet),
        Some("csv") => Ok(SourceFormat::Csv),
        _ => Err(InputError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Read every table of a source file
pub fn read_tables(path: &Path) -> Result<Vec<SourceTable>, InputError> {
    match detect_format(path)? {
        SourceFormat::Spreadsheet => xlsx::read_workbook(path),
        SourceFormat::Csv => csv_reader::read_csv(path).map(|t| vec![t]),
    }
}

/// Read a source file and group its Budget records by month
pub fn load_file(path: &Path) -> Result<LoadedInput, InputError> {
    let tables = read_tables(path)?;
    Ok(load_tables(&tables))
}
