//! Test-only evaluator for the emitted formula dialect
//!
//! Evaluates formula trees against a generated workbook, with Excel's treatment of blank
//! cells and empty strings. Values typed into placeholder cells are supplied with
//! [`Evaluator::set`].

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::HashMap;

use yojitsu_core::formula::{BinOp, Func};
use yojitsu_core::{Cell, CellRange, CellRef, Expr, Literal, Workbook};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Blank,
    Number(f64),
    Text(String),
    Bool(bool),
    Error,
}

impl Value {
    /// Empty cell or empty-string result
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Blank) || matches!(self, Value::Text(s) if s.is_empty())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn to_number(&self) -> Result<f64, ()> {
        match self {
            Value::Blank => Ok(0.0),
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse().map_err(|_| ()),
            Value::Error => Err(()),
        }
    }

    fn truthy(&self) -> Result<bool, ()> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Blank => Ok(false),
            Value::Text(_) | Value::Error => Err(()),
        }
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    use Value::*;
    match (a, b) {
        (Blank, Blank) => Ordering::Equal,
        (Blank, Number(n)) => 0.0_f64.partial_cmp(n).unwrap_or(Ordering::Equal),
        (Number(n), Blank) => n.partial_cmp(&0.0).unwrap_or(Ordering::Equal),
        (Blank, Text(s)) => "".cmp(s.as_str()),
        (Text(s), Blank) => s.as_str().cmp(""),
        (Number(x), Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Text(x), Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Bool(x), Bool(y)) => x.cmp(y),
        (Number(_), _) => Ordering::Less,
        (_, Number(_)) => Ordering::Greater,
        _ => Ordering::Less,
    }
}

/// SUMIF criteria used by the generator: `""` (blank) and `"<>"` (non-blank)
fn matches_criterion(value: &Value, criterion: &str) -> bool {
    match criterion {
        "" => value.is_blank(),
        "<>" => !value.is_blank(),
        other => match (other.parse::<f64>(), value) {
            (Ok(n), Value::Number(v)) => *v == n,
            _ => false,
        },
    }
}

pub struct Evaluator<'a> {
    workbook: &'a Workbook,
    inputs: HashMap<(String, u32, u16), Value>,
}

impl<'a> Evaluator<'a> {
    pub fn new(workbook: &'a Workbook) -> Self {
        Self {
            workbook,
            inputs: HashMap::new(),
        }
    }

    /// Type a number into a cell, as a user would into a placeholder
    pub fn set(&mut self, sheet: &str, row: u32, col: u16, value: f64) {
        self.inputs
            .insert((sheet.to_string(), row, col), Value::Number(value));
    }

    pub fn value(&self, sheet: &str, row: u32, col: u16) -> Value {
        if let Some(v) = self.inputs.get(&(sheet.to_string(), row, col)) {
            return v.clone();
        }
        let Some(cell) = self.workbook.sheet(sheet).and_then(|s| s.cell(row, col)) else {
            return Value::Blank;
        };
        match cell {
            Cell::Literal(Literal::Blank) => Value::Blank,
            Cell::Literal(Literal::Number(n)) => Value::Number(*n),
            Cell::Literal(Literal::Text(s)) => Value::Text(s.clone()),
            Cell::Literal(Literal::Date(_)) => Value::Number(0.0),
            Cell::Formula(f) => self.eval(&f.expr, sheet),
        }
    }

    /// Numeric value of a cell, panicking with context otherwise
    pub fn number(&self, sheet: &str, row: u32, col: u16) -> f64 {
        match self.value(sheet, row, col) {
            Value::Number(n) => n,
            other => panic!("{}!R{}C{} is {:?}, not a number", sheet, row, col, other),
        }
    }

    fn reference(&self, cell: &CellRef, current: &str) -> Value {
        let sheet = cell.sheet.as_deref().unwrap_or(current);
        self.value(sheet, cell.row, cell.col)
    }

    fn range(&self, range: &CellRange, current: &str) -> Vec<Value> {
        range.cells().map(|c| self.reference(&c, current)).collect()
    }

    fn range_arg(&self, expr: &Expr, current: &str) -> Vec<Value> {
        match expr {
            Expr::Range(r) => self.range(r, current),
            other => vec![self.eval(other, current)],
        }
    }

    fn text_arg(&self, expr: &Expr, current: &str) -> String {
        match self.eval(expr, current) {
            Value::Text(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Evaluate an expression; unqualified references resolve on `current`
    pub fn eval(&self, expr: &Expr, current: &str) -> Value {
        match expr {
            Expr::Ref(cell) => self.reference(cell, current),
            Expr::Range(range) => self
                .range(range, current)
                .into_iter()
                .next()
                .unwrap_or(Value::Blank),
            Expr::Number(n) => Value::Number(*n),
            Expr::Text(s) => Value::Text(s.clone()),
            Expr::Binary(lhs, op, rhs) => self.binary(lhs, *op, rhs, current),
            Expr::Call(func, args) => self.call(*func, args, current),
        }
    }

    fn binary(&self, lhs: &Expr, op: BinOp, rhs: &Expr, current: &str) -> Value {
        let a = self.eval(lhs, current);
        let b = self.eval(rhs, current);
        if a == Value::Error || b == Value::Error {
            return Value::Error;
        }
        if op.is_comparison() {
            let ord = compare(&a, &b);
            return Value::Bool(match op {
                BinOp::Eq => ord == Ordering::Equal,
                BinOp::Ne => ord != Ordering::Equal,
                BinOp::Lt => ord == Ordering::Less,
                BinOp::Gt => ord == Ordering::Greater,
                _ => unreachable!(),
            });
        }
        let (Ok(x), Ok(y)) = (a.to_number(), b.to_number()) else {
            return Value::Error;
        };
        match op {
            BinOp::Add => Value::Number(x + y),
            BinOp::Sub => Value::Number(x - y),
            BinOp::Mul => Value::Number(x * y),
            BinOp::Div if y == 0.0 => Value::Error,
            BinOp::Div => Value::Number(x / y),
            _ => unreachable!(),
        }
    }

    fn call(&self, func: Func, args: &[Expr], current: &str) -> Value {
        match func {
            Func::If => match self.eval(&args[0], current).truthy() {
                Ok(true) => self.eval(&args[1], current),
                Ok(false) => args
                    .get(2)
                    .map_or(Value::Bool(false), |e| self.eval(e, current)),
                Err(()) => Value::Error,
            },
            Func::IfError => match self.eval(&args[0], current) {
                Value::Error => self.eval(&args[1], current),
                v => v,
            },
            Func::Or | Func::And => {
                let mut results = Vec::new();
                for arg in args {
                    match self.eval(arg, current).truthy() {
                        Ok(b) => results.push(b),
                        Err(()) => return Value::Error,
                    }
                }
                Value::Bool(if func == Func::Or {
                    results.iter().any(|b| *b)
                } else {
                    results.iter().all(|b| *b)
                })
            }
            Func::IsNumber => Value::Bool(matches!(self.eval(&args[0], current), Value::Number(_))),
            Func::Len => match self.eval(&args[0], current) {
                Value::Blank => Value::Number(0.0),
                Value::Text(s) => Value::Number(s.chars().count() as f64),
                Value::Number(n) => Value::Number(n.to_string().chars().count() as f64),
                Value::Bool(b) => Value::Number(if b { 4.0 } else { 5.0 }),
                Value::Error => Value::Error,
            },
            Func::Sum => {
                let mut total = 0.0;
                for arg in args {
                    for v in self.range_arg(arg, current) {
                        match v {
                            Value::Number(n) => total += n,
                            Value::Error => return Value::Error,
                            _ => {}
                        }
                    }
                }
                Value::Number(total)
            }
            Func::Count => {
                let count = args
                    .iter()
                    .flat_map(|a| self.range_arg(a, current))
                    .filter(|v| matches!(v, Value::Number(_)))
                    .count();
                Value::Number(count as f64)
            }
            Func::SumIf => {
                let criteria = self.range_arg(&args[0], current);
                let criterion = self.text_arg(&args[1], current);
                let sums = self.range_arg(&args[2], current);
                sum_matching(&sums, &[(criteria, criterion)])
            }
            Func::SumIfs => {
                let sums = self.range_arg(&args[0], current);
                let conditions: Vec<(Vec<Value>, String)> = args[1..]
                    .chunks(2)
                    .map(|pair| {
                        (
                            self.range_arg(&pair[0], current),
                            self.text_arg(&pair[1], current),
                        )
                    })
                    .collect();
                sum_matching(&sums, &conditions)
            }
            Func::CountIfs => {
                let conditions: Vec<(Vec<Value>, String)> = args
                    .chunks(2)
                    .map(|pair| {
                        (
                            self.range_arg(&pair[0], current),
                            self.text_arg(&pair[1], current),
                        )
                    })
                    .collect();
                let len = conditions.first().map_or(0, |(values, _)| values.len());
                let count = (0..len)
                    .filter(|&i| {
                        conditions.iter().all(|(values, criterion)| {
                            values.get(i).is_some_and(|c| matches_criterion(c, criterion))
                        })
                    })
                    .count();
                Value::Number(count as f64)
            }
        }
    }
}

fn sum_matching(sums: &[Value], conditions: &[(Vec<Value>, String)]) -> Value {
    let mut total = 0.0;
    for (i, v) in sums.iter().enumerate() {
        let selected = conditions
            .iter()
            .all(|(values, criterion)| values.get(i).is_some_and(|c| matches_criterion(c, criterion)));
        if !selected {
            continue;
        }
        match v {
            Value::Number(n) => total += n,
            Value::Error => return Value::Error,
            _ => {}
        }
    }
    Value::Number(total)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
