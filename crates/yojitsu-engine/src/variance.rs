//! Year Variance Assembler
//!
//! Sheet `年間差異`: one block per tier pair present in the layout, mirroring the summary
//! layout. Month cells subtract the two tiers' summary cells; annual ratio variances are
//! the difference of two independently recomputed annual ratios, never a sum of monthly
//! variances.

use tracing::debug;
use yojitsu_core::metric::Denominator;
use yojitsu_core::{
    Cell, CellStyle, Expr, Metric, Sheet, SheetKind, TierLayout, TierPair, YEAR_VARIANCE_SHEET,
};

use crate::month_sheet::guarded_difference;
use crate::rollup::{self, Block};
use crate::summary::YearSummary;

pub struct YearVarianceAssembler<'a> {
    summary: &'a YearSummary,
    tiers: &'a TierLayout,
    capacity: u32,
}

impl<'a> YearVarianceAssembler<'a> {
    pub fn new(summary: &'a YearSummary, tiers: &'a TierLayout, capacity: u32) -> Self {
        Self {
            summary,
            tiers,
            capacity,
        }
    }

    pub fn assemble(&self) -> Sheet {
        let mut sheet = Sheet::new(YEAR_VARIANCE_SHEET, SheetKind::YearVariance);
        let pairs = self.tiers.year_variance_pairs();

        for (index, pair) in pairs.iter().enumerate() {
            let block = Block::nth(index);
            block.write_frame(&mut sheet, &pair.title(), &self.summary.months, None);

            for metric in Metric::ALL {
                let style = CellStyle::variance(metric.display_format()).with_tier(pair.later);
                for i in 0..self.summary.months.len() {
                    if let Some(expr) = self.month_variance(*pair, metric, i) {
                        sheet.set(
                            block.metric_row(metric),
                            Block::month_col(i),
                            Cell::formula(expr),
                            style,
                        );
                    }
                }
                sheet.set(
                    block.metric_row(metric),
                    rollup::ANNUAL_COL,
                    self.annual(block, *pair, metric),
                    style.emphasized(),
                );
            }
        }

        sheet.rules = rollup::negative_rules((0..pairs.len()).map(Block::nth));
        sheet.freeze = Some(rollup::freeze_position());
        rollup::set_widths(&mut sheet);
        debug!(blocks = pairs.len(), "assembled year variance");
        sheet
    }

    fn month_variance(&self, pair: TierPair, metric: Metric, index: usize) -> Option<Expr> {
        let later = Expr::cell(self.summary.month_ref(pair.later, metric, index)?);
        let earlier = Expr::cell(self.summary.month_ref(pair.earlier, metric, index)?);
        if metric.is_additive() {
            let missing = Expr::or(vec![later.clone().is_blank(), later.clone().is_zero()]);
            Some(Expr::blank_if(missing, later - earlier))
        } else {
            Some(guarded_difference(later, earlier))
        }
    }

    /// Annual variance: additive metrics sum the monthly variances, ratios subtract the
    /// two tiers' annual ratios recomputed from their annual totals
    fn annual(&self, block: Block, pair: TierPair, metric: Metric) -> Cell {
        let Some(template) = metric.ratio() else {
            return Cell::formula(Expr::sum(block.months_range(metric)));
        };
        let annual = |tier, m| self.summary.annual_ref(tier, m).map(Expr::cell);
        let (Some(later_num), Some(earlier_num)) = (
            annual(pair.later, template.numerator),
            annual(pair.earlier, template.numerator),
        ) else {
            return Cell::blank();
        };

        match template.denominator {
            Denominator::Capacity => {
                let days = self.summary.day_count;
                if days == 0 {
                    return Cell::blank();
                }
                let available =
                    || Expr::number(self.capacity as f64) * Expr::number(days as f64);
                let difference =
                    later_num.clone() / available() - earlier_num / available();
                Cell::formula(Expr::blank_if(later_num.is_zero(), difference))
            }
            Denominator::Metric(m) => {
                let (Some(later_den), Some(earlier_den)) =
                    (annual(pair.later, m), annual(pair.earlier, m))
                else {
                    return Cell::blank();
                };
                let difference =
                    later_num / later_den.clone() - earlier_num / earlier_den.clone();
                let missing = Expr::or(vec![later_den.is_zero(), earlier_den.is_zero()]);
                Cell::formula(Expr::blank_if(missing, difference))
            }
        }
    }
}
