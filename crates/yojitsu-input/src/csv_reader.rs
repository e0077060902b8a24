//! CSV reader

use std::io::Read;
use std::path::Path;

use crate::table::{SourceTable, SourceValue};
use crate::InputError;

/// Read a CSV file as one table named after the file stem
pub fn read_csv(path: &Path) -> Result<SourceTable, InputError> {
    let csv_error = |source| InputError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    read_csv_from(file, name).map_err(csv_error)
}

/// Read CSV from any reader; every field is text until parsed
pub fn read_csv_from<R: Read>(reader: R, name: impl Into<String>) -> Result<SourceTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(SourceValue::text).collect());
    }
    Ok(SourceTable::from_rows(name, rows))
}
