//! Cross-sheet reference resolver
//!
//! Filled by the pipeline as each month sheet is finalized; read by the roll-up
//! assemblers. A month that was never recorded resolves to the literal `0` and a day
//! count of zero.

use std::collections::BTreeMap;

use tracing::debug;
use yojitsu_core::{CellRef, Expr, Metric, Tier, YearMonth};

use crate::layout::MonthLayout;
use crate::month_sheet::MonthSheet;

#[derive(Clone, Debug, Default)]
pub struct CrossSheetReferences {
    totals: BTreeMap<(YearMonth, Metric, Tier), CellRef>,
    day_counts: BTreeMap<YearMonth, u32>,
}

impl CrossSheetReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every Total-row address of a finalized month sheet
    pub fn record(&mut self, sheet: &MonthSheet, layout: &MonthLayout) {
        for &tier in layout.tiers().tiers() {
            for metric in Metric::ALL {
                if let Some(cell) = sheet.total_ref(layout, tier, metric) {
                    self.totals.insert((sheet.month, metric, tier), cell);
                }
            }
        }
        self.day_counts.insert(sheet.month, sheet.day_count());
        debug!(
            month = %sheet.month,
            sheet = %sheet.name,
            days = sheet.day_count(),
            "recorded total row references"
        );
    }

    pub fn contains(&self, month: YearMonth) -> bool {
        self.day_counts.contains_key(&month)
    }

    pub fn lookup(&self, month: YearMonth, metric: Metric, tier: Tier) -> Option<&CellRef> {
        self.totals.get(&(month, metric, tier))
    }

    /// Reference to the Total-row cell, or literal `0` when absent
    pub fn resolve(&self, month: YearMonth, metric: Metric, tier: Tier) -> Expr {
        self.lookup(month, metric, tier)
            .map_or_else(|| Expr::number(0.0), |cell| Expr::cell(cell.clone()))
    }

    pub fn day_count(&self, month: YearMonth) -> u32 {
        self.day_counts.get(&month).copied().unwrap_or(0)
    }

    /// Σ day counts over the given months
    pub fn total_day_count(&self, months: &[YearMonth]) -> u32 {
        months.iter().map(|m| self.day_count(*m)).sum()
    }
}
