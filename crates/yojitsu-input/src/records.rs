//! Budget record extraction
//!
//! Turns source tables into per-month Budget records: resolves the date and metric columns,
//! drops rows without a parseable date, and groups what remains by calendar month.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info, warn};
use yojitsu_core::{BudgetRecord, MonthRecords, YearMonth};

use crate::matcher::{find_date_column, MetricColumns};
use crate::table::{SourceTable, SourceValue};
use crate::InputError;

// ============================================================================
// Value parsing
// ============================================================================

const DATE_FORMATS: [&str; 4] = ["%Y/%m/%d", "%Y-%m-%d", "%Y.%m.%d", "%Y年%m月%d日"];

/// Largest serial Excel can display (9999-12-31)
pub const MAX_SERIAL: f64 = 2_958_465.0;

fn serial_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30).map(|d| d.and_time(NaiveTime::MIN))
}

/// Date/time of an Excel serial number in the 1900 date system
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !(1.0..MAX_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    let midnight = serial_epoch()?.checked_add_days(Days::new(days as u64))?;
    midnight.checked_add_signed(chrono::Duration::seconds(seconds))
}

/// Date of a text value in one of the accepted layouts, optionally followed by a time
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS.iter().find_map(|format| {
        let (date, rest) = NaiveDate::parse_and_remainder(text, format).ok()?;
        (rest.is_empty() || rest.starts_with([' ', 'T'])).then_some(date)
    })
}

pub fn parse_date(value: &SourceValue) -> Option<NaiveDate> {
    match value {
        SourceValue::DateTime(dt) => Some(dt.date()),
        SourceValue::Number(n) => serial_to_datetime(*n).map(|dt| dt.date()),
        SourceValue::Text(s) => parse_date_text(s),
        SourceValue::Empty | SourceValue::Bool(_) => None,
    }
}

/// Numeric value of a metric cell; text may carry thousands separators
pub fn parse_number(value: &SourceValue) -> Option<f64> {
    match value {
        SourceValue::Number(n) => Some(*n),
        SourceValue::Text(s) => {
            let cleaned: String = s.chars().filter(|c| !matches!(c, ',' | '，')).collect();
            cleaned.trim().parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Dated rows of one table, in source order
pub fn extract_records(table: &SourceTable) -> Result<Vec<BudgetRecord>, InputError> {
    let date_col = find_date_column(&table.headers).ok_or_else(|| InputError::NoDateColumn {
        table: table.name.clone(),
    })?;
    let columns = MetricColumns::resolve(&table.headers);
    if columns.is_empty() {
        warn!(table = %table.name, "no metric columns, Budget inputs will be blank");
    }

    let metric = |row: usize, col: Option<usize>| col.and_then(|c| parse_number(table.value(row, c)));
    let records: Vec<BudgetRecord> = (0..table.row_count())
        .filter_map(|row| {
            let date = parse_date(table.value(row, date_col))?;
            Some(BudgetRecord {
                date,
                rooms: metric(row, columns.rooms),
                guests: metric(row, columns.guests),
                revenue: metric(row, columns.revenue),
            })
        })
        .collect();

    if records.is_empty() {
        return Err(InputError::EmptyDataset {
            table: table.name.clone(),
        });
    }
    debug!(
        table = %table.name,
        header = %table.headers[date_col],
        kept = records.len(),
        dropped = table.row_count() - records.len(),
        "extracted records"
    );
    Ok(records)
}

/// Records grouped by month, each month sorted by date.
///
/// A repeated date keeps its first occurrence; the repeats are returned.
pub fn group_by_month(
    records: impl IntoIterator<Item = BudgetRecord>,
) -> (Vec<MonthRecords>, Vec<NaiveDate>) {
    let mut by_month: BTreeMap<YearMonth, Vec<BudgetRecord>> = BTreeMap::new();
    for record in records {
        by_month.entry(record.month()).or_default().push(record);
    }

    let mut duplicates = Vec::new();
    let months = by_month
        .into_iter()
        .map(|(month, mut records)| {
            records.sort_by_key(|r| r.date);
            let mut kept: Vec<BudgetRecord> = Vec::with_capacity(records.len());
            for record in records {
                if kept.last().is_some_and(|last| last.date == record.date) {
                    warn!(date = %record.date, "duplicate date, keeping first occurrence");
                    duplicates.push(record.date);
                } else {
                    kept.push(record);
                }
            }
            MonthRecords {
                month,
                records: kept,
            }
        })
        .collect();
    (months, duplicates)
}

// ============================================================================
// Loading
// ============================================================================

/// What happened to the source tables
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Tables that contributed records
    pub tables: Vec<String>,
    /// Tables skipped with the reason
    pub skipped: Vec<InputError>,
    pub duplicate_dates: Vec<NaiveDate>,
}

#[derive(Debug, Default)]
pub struct LoadedInput {
    pub months: Vec<MonthRecords>,
    pub report: LoadReport,
}

impl LoadedInput {
    pub fn earliest_month(&self) -> Option<YearMonth> {
        self.months.first().map(|m| m.month)
    }
}

/// Extract and group the records of all tables.
///
/// Tables without a date column or without dated rows are skipped, not fatal.
pub fn load_tables(tables: &[SourceTable]) -> LoadedInput {
    let mut report = LoadReport::default();
    let mut all = Vec::new();

    for table in tables {
        match extract_records(table) {
            Ok(records) => {
                report.tables.push(table.name.clone());
                all.extend(records);
            }
            Err(e) => {
                warn!(table = %table.name, "{}, skipping", e);
                report.skipped.push(e);
            }
        }
    }

    let (months, duplicates) = group_by_month(all);
    report.duplicate_dates = duplicates;
    info!(
        tables = report.tables.len(),
        months = months.len(),
        "loaded source records"
    );
    LoadedInput { months, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> SourceValue {
        SourceValue::text(s)
    }

    fn table(name: &str, rows: Vec<Vec<SourceValue>>) -> SourceTable {
        SourceTable::from_rows(name, rows)
    }

    #[test]
    fn date_text_layouts() {
        assert_eq!(parse_date_text("2025/04/01"), Some(date(2025, 4, 1)));
        assert_eq!(parse_date_text("2025/4/1"), Some(date(2025, 4, 1)));
        assert_eq!(parse_date_text("2025-04-01 00:00:00"), Some(date(2025, 4, 1)));
        assert_eq!(parse_date_text("2025-04-01T09:30:00"), Some(date(2025, 4, 1)));
        assert_eq!(parse_date_text("2025.12.31"), Some(date(2025, 12, 31)));
        assert_eq!(parse_date_text("2025年4月1日"), Some(date(2025, 4, 1)));
        assert_eq!(parse_date_text("2025/02/30"), None);
        assert_eq!(parse_date_text("合計"), None);
        assert_eq!(parse_date_text("2025/04/01x"), None);
    }

    #[test]
    fn serial_numbers() {
        assert_eq!(parse_date(&SourceValue::Number(45748.0)), Some(date(2025, 4, 1)));
        assert_eq!(parse_date(&SourceValue::Number(45748.75)), Some(date(2025, 4, 1)));
        assert_eq!(parse_date(&SourceValue::Number(1.0)), Some(date(1899, 12, 31)));
        assert_eq!(parse_date(&SourceValue::Number(MAX_SERIAL)), Some(date(9999, 12, 31)));
        assert_eq!(parse_date(&SourceValue::Number(0.0)), None);
        assert_eq!(parse_date(&SourceValue::Number(MAX_SERIAL + 1.0)), None);
        assert_eq!(parse_date(&SourceValue::Bool(true)), None);
    }

    #[test]
    fn numbers_with_separators() {
        assert_eq!(parse_number(&text("1,234,567")), Some(1_234_567.0));
        assert_eq!(parse_number(&text("12.5")), Some(12.5));
        assert_eq!(parse_number(&text("n/a")), None);
        assert_eq!(parse_number(&text("NaN")), None);
        assert_eq!(parse_number(&SourceValue::Empty), None);
    }

    #[test]
    fn rows_without_dates_are_dropped() {
        let t = table(
            "4月",
            vec![
                vec![text("日付"), text("室数"), text("宿泊売上")],
                vec![text("2025/04/02"), SourceValue::Number(70.0), text("840,000")],
                vec![text("合計"), SourceValue::Number(70.0), SourceValue::Empty],
                vec![text("2025/04/01"), text("-"), SourceValue::Number(900_000.0)],
            ],
        );
        let records = extract_records(&t).unwrap();
        assert_eq!(
            records,
            vec![
                BudgetRecord::new(date(2025, 4, 2)).rooms(70.0).revenue(840_000.0),
                BudgetRecord::new(date(2025, 4, 1)).revenue(900_000.0),
            ]
        );
    }

    #[test]
    fn table_errors() {
        let no_date = table("memo", vec![vec![text("室数")], vec![SourceValue::Number(1.0)]]);
        assert!(matches!(
            extract_records(&no_date),
            Err(InputError::NoDateColumn { table }) if table == "memo"
        ));

        let empty = table("5月", vec![vec![text("日付")], vec![text("未定")]]);
        assert!(matches!(
            extract_records(&empty),
            Err(InputError::EmptyDataset { .. })
        ));
    }

    #[test]
    fn grouping_sorts_and_dedups() {
        let records = vec![
            BudgetRecord::new(date(2025, 5, 2)).rooms(2.0),
            BudgetRecord::new(date(2025, 4, 30)).rooms(1.0),
            BudgetRecord::new(date(2025, 5, 1)).rooms(3.0),
            BudgetRecord::new(date(2025, 5, 2)).rooms(9.0),
        ];
        let (months, duplicates) = group_by_month(records);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, YearMonth::new(2025, 4));
        assert_eq!(
            months[1].records,
            vec![
                BudgetRecord::new(date(2025, 5, 1)).rooms(3.0),
                BudgetRecord::new(date(2025, 5, 2)).rooms(2.0),
            ]
        );
        assert_eq!(duplicates, vec![date(2025, 5, 2)]);
    }

    #[test]
    fn load_skips_bad_tables() {
        let tables = vec![
            table("説明", vec![vec![text("メモ")], vec![text("予算表")]]),
            table(
                "4月",
                vec![
                    vec![text("宿泊日"), text("Rooms")],
                    vec![text("2025/04/01"), SourceValue::Number(80.0)],
                ],
            ),
        ];
        let loaded = load_tables(&tables);
        assert_eq!(loaded.report.tables, vec!["4月".to_string()]);
        assert_eq!(loaded.report.skipped.len(), 1);
        assert_eq!(loaded.earliest_month(), Some(YearMonth::new(2025, 4)));
    }
}
