//! Spreadsheet reader (xlsx, xlsm, xls, ods) backed by calamine

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::records::serial_to_datetime;
use crate::table::{SourceTable, SourceValue};
use crate::InputError;

fn convert(data: &Data) -> SourceValue {
    match data {
        Data::Empty | Data::Error(_) | Data::DurationIso(_) => SourceValue::Empty,
        Data::String(s) => SourceValue::text(s),
        Data::Float(f) => SourceValue::Number(*f),
        Data::Int(i) => SourceValue::Number(*i as f64),
        Data::Bool(b) => SourceValue::Bool(*b),
        Data::DateTime(dt) => serial_to_datetime(dt.as_f64())
            .map(SourceValue::DateTime)
            .unwrap_or(SourceValue::Empty),
        Data::DateTimeIso(s) => parse_iso(s)
            .map(SourceValue::DateTime)
            .unwrap_or_else(|| SourceValue::text(s)),
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

/// Every worksheet as a table; the first used row is the header
pub fn read_workbook(path: &Path) -> Result<Vec<SourceTable>, InputError> {
    let spreadsheet_error = |source| InputError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;

    let mut tables = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name).map_err(spreadsheet_error)?;
        let rows: Vec<Vec<SourceValue>> = range
            .rows()
            .map(|row| row.iter().map(convert).collect())
            .collect();
        debug!(sheet = %name, rows = rows.len(), "read worksheet");
        tables.push(SourceTable::from_rows(name, rows));
    }
    Ok(tables)
}
