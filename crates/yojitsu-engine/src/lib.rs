//! # yojitsu-engine
//!
//! Formula synthesis and cross-sheet aggregation.
//!
//! This crate provides:
//! - `DayRowBuilder`: one row per calendar day with Budget inputs and ratio formulas
//! - `MonthSheetAssembler`: entry-tier ratios, variances, Total and Revised-Forecast rows
//! - `CrossSheetReferences`: Total-row addresses per (month, metric, tier)
//! - `YearSummaryAssembler` / `YearVarianceAssembler`: the roll-up sheets
//! - `WorkbookGenerator`: the pipeline tying them together
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use yojitsu_core::calendar::NoHolidays;
//! use yojitsu_core::{BudgetRecord, FiscalWindow, MonthRecords, YearMonth};
//! use yojitsu_engine::{GeneratorOptions, WorkbookGenerator};
//!
//! let april = MonthRecords {
//!     month: YearMonth::new(2025, 4),
//!     records: vec![BudgetRecord::new(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()).rooms(80.0)],
//! };
//! let options = GeneratorOptions::new(120, FiscalWindow::new(2025, 4));
//! let generation = WorkbookGenerator::new(options, &NoHolidays).generate(&[april]);
//! assert_eq!(generation.workbook.sheet_names(), vec!["2025年4月", "年間集計", "年間差異"]);
//! ```

pub mod day_row;
pub mod generator;
pub mod layout;
pub mod month_sheet;
pub mod resolver;
pub mod rollup;
pub mod summary;
pub mod variance;

pub use day_row::{DayRow, DayRowBuilder};
pub use generator::{Generation, GenerationReport, GeneratorOptions, WorkbookGenerator};
pub use layout::{MonthLayout, MonthRows};
pub use month_sheet::{AggregateRow, MonthSheet, MonthSheetAssembler};
pub use resolver::CrossSheetReferences;
pub use summary::{YearSummary, YearSummaryAssembler};
pub use variance::YearVarianceAssembler;
