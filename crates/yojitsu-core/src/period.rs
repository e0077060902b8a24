//! Calendar months and fiscal windows

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// A calendar month
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month));
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The following month, wrapping December into January of the next year
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// `2025年4月`, used both as month-sheet name and roll-up column label
    pub fn label(&self) -> String {
        format!("{}年{}月", self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Twelve consecutive months starting at the fiscal start month
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FiscalWindow {
    pub start: YearMonth,
}

impl FiscalWindow {
    pub fn new(start_year: i32, start_month: u32) -> Self {
        Self {
            start: YearMonth::new(start_year, start_month),
        }
    }

    pub fn months(&self) -> [YearMonth; 12] {
        let mut months = [self.start; 12];
        for i in 1..12 {
            months[i] = months[i - 1].next();
        }
        months
    }

    pub fn contains(&self, month: YearMonth) -> bool {
        self.months().contains(&month)
    }

    /// Fiscal year a month belongs to, for a given fiscal start month
    pub fn fiscal_year_of(month: YearMonth, start_month: u32) -> i32 {
        if month.month >= start_month {
            month.year
        } else {
            month.year - 1
        }
    }
}
