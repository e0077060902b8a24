//! Formula expressions
//!
//! Every derived cell in a generated workbook carries an [`Expr`] tree over a small,
//! fixed spreadsheet dialect (`IF`, `IFERROR`, `OR`, `AND`, `ISNUMBER`, `LEN`, `SUM`,
//! `SUMIF`, `SUMIFS`, `COUNT`, `COUNTIFS` plus arithmetic and comparisons). Expressions are
//! never evaluated here; they are rendered to A1-style formula text for a spreadsheet engine.
//!
//! ```rust
//! use yojitsu_core::formula::{CellRef, Expr};
//!
//! let rooms = Expr::cell(CellRef::new(1, 2));
//! let occ = Expr::if_(rooms.clone().is_blank(), Expr::blank(), rooms / Expr::number(120.0));
//! assert_eq!(occ.to_string(), r#"IF(C2="","",C2/120)"#);
//! ```

use serde::Serialize;
use std::fmt;
use std::ops;

// ============================================================================
// Addresses
// ============================================================================

/// Convert a 0-based column index to its spreadsheet letters (0 → A, 26 → AA)
pub fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = col as u32 + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// A single cell address, optionally qualified by sheet name.
///
/// Rows and columns are 0-based; rendering produces 1-based A1 notation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellRef {
    pub sheet: Option<String>,
    pub row: u32,
    pub col: u16,
    pub abs_col: bool,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            sheet: None,
            row,
            col,
            abs_col: false,
        }
    }

    /// Qualify the address with a sheet name
    pub fn on_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Pin the column (`$C2`), used by conditional rules that shift down a range
    pub fn absolute_col(mut self) -> Self {
        self.abs_col = true;
        self
    }

    fn write_a1(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.abs_col {
            f.write_str("$")?;
        }
        write!(f, "{}{}", col_to_letter(self.col), self.row + 1)
    }
}

fn write_sheet_prefix(f: &mut fmt::Formatter<'_>, sheet: &Option<String>) -> fmt::Result {
    match sheet {
        Some(name) => write!(f, "'{}'!", name.replace('\'', "''")),
        None => Ok(()),
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet_prefix(f, &self.sheet)?;
        self.write_a1(f)
    }
}

/// A rectangular block of cells on one sheet
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CellRange {
    pub sheet: Option<String>,
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    pub fn new(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            sheet: None,
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    /// Single-column range spanning `first_row..=last_row`
    pub fn column(col: u16, first_row: u32, last_row: u32) -> Self {
        Self::new(first_row, col, last_row, col)
    }

    pub fn on_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Top-left cell of the range
    pub fn top_left(&self) -> CellRef {
        CellRef {
            sheet: self.sheet.clone(),
            row: self.first_row,
            col: self.first_col,
            abs_col: false,
        }
    }

    /// Iterate all addresses row by row
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.first_row..=self.last_row).flat_map(move |row| {
            (self.first_col..=self.last_col).map(move |col| CellRef {
                sheet: self.sheet.clone(),
                row,
                col,
                abs_col: false,
            })
        })
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sheet_prefix(f, &self.sheet)?;
        write!(
            f,
            "{}{}:{}{}",
            col_to_letter(self.first_col),
            self.first_row + 1,
            col_to_letter(self.last_col),
            self.last_row + 1
        )
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Functions of the emitted dialect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Func {
    If,
    IfError,
    Or,
    And,
    IsNumber,
    Len,
    Sum,
    SumIf,
    SumIfs,
    Count,
    CountIfs,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Func::If => "IF",
            Func::IfError => "IFERROR",
            Func::Or => "OR",
            Func::And => "AND",
            Func::IsNumber => "ISNUMBER",
            Func::Len => "LEN",
            Func::Sum => "SUM",
            Func::SumIf => "SUMIF",
            Func::SumIfs => "SUMIFS",
            Func::Count => "COUNT",
            Func::CountIfs => "COUNTIFS",
        }
    }
}

/// Binary operators of the emitted dialect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt => 1,
            BinOp::Add | BinOp::Sub => 2,
            BinOp::Mul | BinOp::Div => 3,
        }
    }

    /// Operators whose right operand needs parentheses at equal precedence
    fn is_left_assoc_only(self) -> bool {
        matches!(
            self,
            BinOp::Sub | BinOp::Div | BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt
        )
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 1
    }
}

/// A formula expression tree
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Expr {
    Ref(CellRef),
    Range(CellRange),
    Number(f64),
    Text(String),
    Call(Func, Vec<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
}

impl Expr {
    pub fn cell(cell: CellRef) -> Self {
        Expr::Ref(cell)
    }

    pub fn range(range: CellRange) -> Self {
        Expr::Range(range)
    }

    pub fn number(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Expr::Text(value.into())
    }

    /// The empty-string literal `""` used as the blank result of guarded formulas
    pub fn blank() -> Self {
        Expr::Text(String::new())
    }

    pub fn binary(self, op: BinOp, rhs: Expr) -> Self {
        Expr::Binary(Box::new(self), op, Box::new(rhs))
    }

    pub fn equals(self, rhs: Expr) -> Self {
        self.binary(BinOp::Eq, rhs)
    }

    pub fn less_than(self, rhs: Expr) -> Self {
        self.binary(BinOp::Lt, rhs)
    }

    pub fn greater_than(self, rhs: Expr) -> Self {
        self.binary(BinOp::Gt, rhs)
    }

    /// `self=""`
    pub fn is_blank(self) -> Self {
        self.equals(Expr::blank())
    }

    /// `self=0`
    pub fn is_zero(self) -> Self {
        self.equals(Expr::number(0.0))
    }

    pub fn if_(condition: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Call(Func::If, vec![condition, then, otherwise])
    }

    /// `IF(condition,"",value)`
    pub fn blank_if(condition: Expr, value: Expr) -> Self {
        Expr::if_(condition, Expr::blank(), value)
    }

    pub fn if_error(value: Expr, fallback: Expr) -> Self {
        Expr::Call(Func::IfError, vec![value, fallback])
    }

    /// `OR(...)`, collapsing to the single condition when only one is given
    pub fn or(mut conditions: Vec<Expr>) -> Self {
        if conditions.len() == 1 {
            conditions.remove(0)
        } else {
            Expr::Call(Func::Or, conditions)
        }
    }

    pub fn and(conditions: Vec<Expr>) -> Self {
        Expr::Call(Func::And, conditions)
    }

    pub fn is_number(value: Expr) -> Self {
        Expr::Call(Func::IsNumber, vec![value])
    }

    pub fn len(value: Expr) -> Self {
        Expr::Call(Func::Len, vec![value])
    }

    pub fn sum(range: CellRange) -> Self {
        Expr::Call(Func::Sum, vec![Expr::Range(range)])
    }

    pub fn count(range: CellRange) -> Self {
        Expr::Call(Func::Count, vec![Expr::Range(range)])
    }

    /// `SUMIF(range,criteria,sum_range)`
    pub fn sum_if(range: CellRange, criteria: &str, sum_range: CellRange) -> Self {
        Expr::Call(
            Func::SumIf,
            vec![Expr::Range(range), Expr::text(criteria), Expr::Range(sum_range)],
        )
    }

    /// `SUMIFS(sum_range,criteria_range1,criteria1,...)`
    pub fn sum_ifs(sum_range: CellRange, criteria: Vec<(CellRange, &str)>) -> Self {
        let mut args = vec![Expr::Range(sum_range)];
        for (range, criterion) in criteria {
            args.push(Expr::Range(range));
            args.push(Expr::text(criterion));
        }
        Expr::Call(Func::SumIfs, args)
    }

    /// `COUNTIFS(criteria_range1,criteria1,...)`
    pub fn count_ifs(criteria: Vec<(CellRange, &str)>) -> Self {
        let mut args = Vec::new();
        for (range, criterion) in criteria {
            args.push(Expr::Range(range));
            args.push(Expr::text(criterion));
        }
        Expr::Call(Func::CountIfs, args)
    }

    /// All cell addresses this expression reads, ranges expanded to their corners
    pub fn references(&self) -> Vec<CellRef> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, out: &mut Vec<CellRef>) {
        match self {
            Expr::Ref(cell) => out.push(cell.clone()),
            Expr::Range(range) => out.extend(range.cells()),
            Expr::Number(_) | Expr::Text(_) => {}
            Expr::Call(_, args) => args.iter().for_each(|a| a.collect_references(out)),
            Expr::Binary(lhs, _, rhs) => {
                lhs.collect_references(out);
                rhs.collect_references(out);
            }
        }
    }

    /// Names of all sheets referenced by qualified addresses
    pub fn referenced_sheets(&self) -> Vec<String> {
        let mut sheets: Vec<String> = Vec::new();
        self.visit_sheets(&mut sheets);
        sheets
    }

    fn visit_sheets(&self, out: &mut Vec<String>) {
        let mut push = |sheet: &Option<String>| {
            if let Some(name) = sheet {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
        };
        match self {
            Expr::Ref(cell) => push(&cell.sheet),
            Expr::Range(range) => push(&range.sheet),
            Expr::Number(_) | Expr::Text(_) => {}
            Expr::Call(_, args) => args.iter().for_each(|a| a.visit_sheets(out)),
            Expr::Binary(lhs, _, rhs) => {
                lhs.visit_sheets(out);
                rhs.visit_sheets(out);
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary(_, op, _) => op.precedence(),
            Expr::Number(n) if *n < 0.0 => 2,
            _ => 4,
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        write!(f, "{}", value as i64)
    } else {
        write!(f, "{}", value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ref(cell) => write!(f, "{}", cell),
            Expr::Range(range) => write!(f, "{}", range),
            Expr::Number(n) => write_number(f, *n),
            Expr::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::Call(func, args) => {
                write!(f, "{}(", func.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Binary(lhs, op, rhs) => {
                let prec = op.precedence();
                if lhs.precedence() < prec {
                    write!(f, "({})", lhs)?;
                } else {
                    write!(f, "{}", lhs)?;
                }
                f.write_str(op.symbol())?;
                let rhs_prec = rhs.precedence();
                if rhs_prec < prec || (rhs_prec == prec && op.is_left_assoc_only()) {
                    write!(f, "({})", rhs)
                } else {
                    write!(f, "{}", rhs)
                }
            }
        }
    }
}

impl ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Add, rhs)
    }
}

impl ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Sub, rhs)
    }
}

impl ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Mul, rhs)
    }
}

impl ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Div, rhs)
    }
}

/// A formula cell: an expression rendered with a leading `=`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Formula {
    pub expr: Expr,
}

impl Formula {
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    pub fn references(&self) -> Vec<CellRef> {
        self.expr.references()
    }

    /// Formula text including the leading `=`
    pub fn to_excel(&self) -> String {
        format!("={}", self.expr)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "={}", self.expr)
    }
}
