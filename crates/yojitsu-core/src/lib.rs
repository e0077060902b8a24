//! # yojitsu-core
//!
//! Domain model for the yojitsu budget comparison workbook generator.
//!
//! This crate provides:
//! - The metric catalog and ratio templates (`metric`)
//! - Tiers and tier layouts (`tier`)
//! - The formula expression dialect (`formula`) and the workbook model (`workbook`)
//! - Holiday calendars, fiscal windows, input records and run configuration
//! - The `Renderer` trait and its error type
//!
//! ## Example
//!
//! ```rust
//! use yojitsu_core::{Metric, Tier, TierLayout};
//!
//! let layout = TierLayout::four_tier();
//! assert_eq!(layout.tiers()[0], Tier::Budget);
//! assert_eq!(Metric::Occupancy.display_format().num_format(), "0.0%");
//! ```

use thiserror::Error;

pub mod calendar;
pub mod config;
pub mod formula;
pub mod metric;
pub mod period;
pub mod record;
pub mod tier;
pub mod workbook;

pub use calendar::{DayKind, HolidayCalendar, HolidaySet, HolidaySource, LabelPolicy};
pub use config::{ConfigError, ConfigProvider, RawConfig, RunConfig, TierSetting};
pub use formula::{CellRange, CellRef, Expr, Formula};
pub use metric::{DisplayFormat, Guard, Metric, MetricKind};
pub use period::{FiscalWindow, YearMonth};
pub use record::{BudgetRecord, MonthRecords};
pub use tier::{Tier, TierLayout, TierPair};
pub use workbook::{
    Cell, CellEntry, CellRole, CellStyle, ConditionalAttribute, ConditionalRule, Literal, Sheet,
    SheetKind, Workbook,
};

/// Sheet name of the year summary
pub const YEAR_SUMMARY_SHEET: &str = "年間集計";

/// Sheet name of the year variance
pub const YEAR_VARIANCE_SHEET: &str = "年間差異";

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a workbook model to the output format
    fn render(&self, workbook: &Workbook) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
