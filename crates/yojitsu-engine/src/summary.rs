//! Year Summary Assembler
//!
//! Sheet `年間集計`: one block per tier over the twelve months of the fiscal window.
//! Month cells reference the month sheets' Total rows; the annual column sums additive
//! metrics and recomputes ratios from the block's own annual totals.

use std::collections::BTreeMap;

use tracing::debug;
use yojitsu_core::metric::Denominator;
use yojitsu_core::{
    Cell, CellRef, CellStyle, Expr, FiscalWindow, Guard, Metric, Sheet, SheetKind, Tier,
    TierLayout, YearMonth, YEAR_SUMMARY_SHEET,
};

use crate::resolver::CrossSheetReferences;
use crate::rollup::{self, Block};

/// The summary sheet and the position of each tier's block
#[derive(Clone, Debug)]
pub struct YearSummary {
    pub sheet: Sheet,
    pub months: [YearMonth; 12],
    /// Σ day counts over the window
    pub day_count: u32,
    blocks: BTreeMap<Tier, Block>,
}

impl YearSummary {
    pub fn block(&self, tier: Tier) -> Option<Block> {
        self.blocks.get(&tier).copied()
    }

    /// Month cell of a tier's block, qualified for use from other sheets
    pub fn month_ref(&self, tier: Tier, metric: Metric, index: usize) -> Option<CellRef> {
        let block = self.block(tier)?;
        Some(block.month_cell(metric, index).on_sheet(YEAR_SUMMARY_SHEET))
    }

    /// Annual cell of a tier's block, qualified for use from other sheets
    pub fn annual_ref(&self, tier: Tier, metric: Metric) -> Option<CellRef> {
        let block = self.block(tier)?;
        Some(block.annual_cell(metric).on_sheet(YEAR_SUMMARY_SHEET))
    }
}

pub struct YearSummaryAssembler<'a> {
    references: &'a CrossSheetReferences,
    tiers: &'a TierLayout,
    capacity: u32,
    window: FiscalWindow,
}

impl<'a> YearSummaryAssembler<'a> {
    pub fn new(
        references: &'a CrossSheetReferences,
        tiers: &'a TierLayout,
        capacity: u32,
        window: FiscalWindow,
    ) -> Self {
        Self {
            references,
            tiers,
            capacity,
            window,
        }
    }

    pub fn assemble(&self) -> YearSummary {
        let months = self.window.months();
        let day_count = self.references.total_day_count(&months);
        let mut sheet = Sheet::new(YEAR_SUMMARY_SHEET, SheetKind::YearSummary);
        let mut blocks = BTreeMap::new();

        for (index, &tier) in self.tiers.tiers().iter().enumerate() {
            let block = Block::nth(index);
            block.write_frame(&mut sheet, tier.label(), &months, Some(tier));

            for metric in Metric::ALL {
                let style = CellStyle::value(tier, metric.display_format());
                for (i, &month) in months.iter().enumerate() {
                    let expr = self.references.resolve(month, metric, tier);
                    let cell = match expr {
                        Expr::Number(n) => Cell::number(n),
                        other => Cell::formula(other),
                    };
                    sheet.set(block.metric_row(metric), Block::month_col(i), cell, style);
                }
                sheet.set(
                    block.metric_row(metric),
                    rollup::ANNUAL_COL,
                    self.annual(block, metric, day_count),
                    style.emphasized(),
                );
            }
            blocks.insert(tier, block);
        }

        sheet.freeze = Some(rollup::freeze_position());
        rollup::set_widths(&mut sheet);
        debug!(
            start = %self.window.start,
            blocks = blocks.len(),
            day_count,
            "assembled year summary"
        );

        YearSummary {
            sheet,
            months,
            day_count,
            blocks,
        }
    }

    /// Annual aggregate of one metric row
    fn annual(&self, block: Block, metric: Metric, day_count: u32) -> Cell {
        let Some(template) = metric.ratio() else {
            return Cell::formula(Expr::sum(block.months_range(metric)));
        };
        let numerator = Expr::cell(block.annual_cell(template.numerator));
        match template.denominator {
            Denominator::Capacity if day_count == 0 => Cell::blank(),
            Denominator::Capacity => {
                let available = Expr::number(self.capacity as f64) * Expr::number(day_count as f64);
                Cell::formula(template.formula(numerator, available, Guard::None))
            }
            Denominator::Metric(m) => {
                let rooms = Expr::cell(block.annual_cell(m));
                let guard = Guard::When(vec![rooms.clone().is_zero()]);
                Cell::formula(template.formula(numerator, rooms, guard))
            }
        }
    }
}
