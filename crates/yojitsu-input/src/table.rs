//! Source table model
//!
//! Every reader produces [`SourceTable`]s: a named sheet with a header row and its data
//! rows. Values keep only the distinctions the record extractor needs.

use chrono::NaiveDateTime;

/// One source cell
#[derive(Clone, Debug, PartialEq)]
pub enum SourceValue {
    Empty,
    Number(f64),
    Text(String),
    /// Native spreadsheet date/time
    DateTime(NaiveDateTime),
    Bool(bool),
}

impl SourceValue {
    /// Text cells are trimmed; an all-whitespace text is empty
    pub fn text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            SourceValue::Empty
        } else {
            SourceValue::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SourceValue::Empty)
    }

    /// Header text of a cell in the first row
    pub fn header_text(&self) -> String {
        match self {
            SourceValue::Empty => String::new(),
            SourceValue::Number(n) => n.to_string(),
            SourceValue::Text(s) => s.clone(),
            SourceValue::DateTime(dt) => dt.to_string(),
            SourceValue::Bool(b) => b.to_string(),
        }
    }
}

static EMPTY: SourceValue = SourceValue::Empty;

/// A named tabular dataset
#[derive(Clone, Debug, PartialEq)]
pub struct SourceTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<SourceValue>>,
}

impl SourceTable {
    /// Build from raw rows; the first row is the header
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<SourceValue>>) -> Self {
        let mut rows = rows.into_iter();
        let headers = rows
            .next()
            .map(|header| header.iter().map(SourceValue::header_text).collect())
            .unwrap_or_default();
        Self {
            name: name.into(),
            headers,
            rows: rows.collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Value of a row at a column; short rows read as empty
    pub fn value(&self, row: usize, col: usize) -> &SourceValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_row_becomes_header() {
        let table = SourceTable::from_rows(
            "予算",
            vec![
                vec![SourceValue::text("日付"), SourceValue::text(" 室数 ")],
                vec![SourceValue::text("2025/04/01"), SourceValue::Number(80.0)],
            ],
        );
        assert_eq!(table.headers, vec!["日付".to_string(), "室数".to_string()]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.value(0, 1), &SourceValue::Number(80.0));
        assert_eq!(table.value(0, 5), &SourceValue::Empty);
        assert_eq!(table.value(3, 0), &SourceValue::Empty);
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(SourceValue::text("   ").is_empty());
        assert_eq!(SourceValue::text(" a "), SourceValue::Text("a".into()));
    }
}
