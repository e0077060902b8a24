//! In-memory workbook model
//!
//! The engine produces a [`Workbook`] of [`Sheet`]s whose cells are either literals or
//! formulas. Styling is logical: each cell records its role, tier and display format,
//! and conditional rules mark superseded and negative cells. Writers translate these
//! attributes into concrete fills and fonts.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::calendar::DayKind;
use crate::formula::{CellRange, CellRef, Expr, Formula};
use crate::metric::DisplayFormat;
use crate::period::YearMonth;
use crate::tier::Tier;

/// A literal cell value
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Literal {
    Blank,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

/// Cell content: a literal or a formula for an external engine to evaluate
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Cell {
    Literal(Literal),
    Formula(Formula),
}

impl Cell {
    pub fn blank() -> Self {
        Cell::Literal(Literal::Blank)
    }

    pub fn number(value: f64) -> Self {
        Cell::Literal(Literal::Number(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Literal(Literal::Text(value.into()))
    }

    pub fn formula(expr: Expr) -> Self {
        Cell::Formula(Formula::new(expr))
    }

    /// Literal number for present values, blank otherwise
    pub fn optional(value: Option<f64>) -> Self {
        value.map_or_else(Cell::blank, Cell::number)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Literal(Literal::Blank))
    }

    pub fn as_formula(&self) -> Option<&Formula> {
        match self {
            Cell::Formula(f) => Some(f),
            Cell::Literal(_) => None,
        }
    }

    /// Formula text with leading `=`, if this is a formula
    pub fn formula_text(&self) -> Option<String> {
        self.as_formula().map(Formula::to_excel)
    }
}

/// What a cell is, for styling purposes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CellRole {
    /// Block title in roll-up sheets
    Title,
    /// Column header
    Header,
    /// Row label (metric name, total label)
    Label,
    Date,
    Weekday(DayKind),
    /// Tier value (input or derived)
    Value,
    /// Inter-tier variance
    Variance,
}

/// Logical style attributes of a cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CellStyle {
    pub role: CellRole,
    pub tier: Option<Tier>,
    pub format: Option<DisplayFormat>,
    /// Member of a total or revised-forecast row
    pub emphasized: bool,
}

impl CellStyle {
    pub fn new(role: CellRole) -> Self {
        Self {
            role,
            tier: None,
            format: None,
            emphasized: false,
        }
    }

    pub fn value(tier: Tier, format: DisplayFormat) -> Self {
        Self {
            role: CellRole::Value,
            tier: Some(tier),
            format: Some(format),
            emphasized: false,
        }
    }

    pub fn variance(format: DisplayFormat) -> Self {
        Self {
            role: CellRole::Variance,
            tier: None,
            format: Some(format),
            emphasized: false,
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn emphasized(mut self) -> Self {
        self.emphasized = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellEntry {
    pub cell: Cell,
    pub style: CellStyle,
}

/// Display attribute applied by a conditional rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ConditionalAttribute {
    /// Forecast/On-Hand value replaced by an entered actual
    Superseded,
    /// Negative variance
    Negative,
}

/// A display rule over a range; `condition` is written relative to the range's top-left
/// cell and shifts with each cell of the range.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConditionalRule {
    pub range: CellRange,
    pub condition: Expr,
    pub attribute: ConditionalAttribute,
}

/// Which kind of sheet this is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SheetKind {
    Month(YearMonth),
    YearSummary,
    YearVariance,
}

/// A worksheet: sparse cells, freeze position and conditional rules
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub kind: SheetKind,
    rows: BTreeMap<u32, BTreeMap<u16, CellEntry>>,
    /// `(row, col)` of the first scrolling cell
    pub freeze: Option<(u32, u16)>,
    pub rules: Vec<ConditionalRule>,
    pub column_widths: BTreeMap<u16, f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, kind: SheetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            rows: BTreeMap::new(),
            freeze: None,
            rules: Vec::new(),
            column_widths: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, row: u32, col: u16, cell: Cell, style: CellStyle) {
        self.rows
            .entry(row)
            .or_default()
            .insert(col, CellEntry { cell, style });
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellEntry> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.get(row, col).map(|e| &e.cell)
    }

    /// Address of a cell on this sheet, qualified for use from other sheets
    pub fn address(&self, row: u32, col: u16) -> CellRef {
        CellRef::new(row, col).on_sheet(self.name.clone())
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (u32, u16, &CellEntry)> + '_ {
        self.rows
            .iter()
            .flat_map(|(row, cols)| cols.iter().map(move |(col, e)| (*row, *col, e)))
    }

    pub fn row_count(&self) -> u32 {
        self.rows.keys().next_back().map_or(0, |r| r + 1)
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }
}

/// The generated comparison workbook
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn month_sheets(&self) -> impl Iterator<Item = &Sheet> + '_ {
        self.sheets
            .iter()
            .filter(|s| matches!(s.kind, SheetKind::Month(_)))
    }
}
