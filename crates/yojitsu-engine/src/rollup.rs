//! Block geometry shared by the year summary and year variance sheets
//!
//! ```text
//! title                                      (tier label or pair title)
//! 指標 | 2025年4月 | … | 2026年3月 | 年間合計
//! 室数 |    …      |   |           |   …
//! …      (one row per metric)
//! <empty row>
//! ```

use yojitsu_core::formula::{CellRange, CellRef};
use yojitsu_core::{
    Cell, CellRole, CellStyle, ConditionalAttribute, ConditionalRule, Expr, Metric, Sheet, Tier,
    YearMonth,
};

pub const LABEL_COL: u16 = 0;
pub const FIRST_MONTH_COL: u16 = 1;
pub const ANNUAL_COL: u16 = FIRST_MONTH_COL + 12;
pub const METRIC_HEADER: &str = "指標";
pub const ANNUAL_HEADER: &str = "年間合計";

/// Rows per block: title, header and one row per metric
const BLOCK_HEIGHT: u32 = 2 + Metric::ALL.len() as u32;

/// Position of one block on a roll-up sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub title_row: u32,
}

impl Block {
    /// The `index`-th block, blocks separated by one empty row
    pub fn nth(index: usize) -> Self {
        Self {
            title_row: index as u32 * (BLOCK_HEIGHT + 1),
        }
    }

    pub fn header_row(&self) -> u32 {
        self.title_row + 1
    }

    pub fn metric_row(&self, metric: Metric) -> u32 {
        let index = Metric::ALL.iter().position(|m| *m == metric).unwrap_or(0);
        self.header_row() + 1 + index as u32
    }

    pub fn last_row(&self) -> u32 {
        self.title_row + BLOCK_HEIGHT - 1
    }

    pub fn month_col(index: usize) -> u16 {
        FIRST_MONTH_COL + index as u16
    }

    pub fn month_cell(&self, metric: Metric, index: usize) -> CellRef {
        CellRef::new(self.metric_row(metric), Self::month_col(index))
    }

    pub fn annual_cell(&self, metric: Metric) -> CellRef {
        CellRef::new(self.metric_row(metric), ANNUAL_COL)
    }

    /// The twelve month cells of a metric row
    pub fn months_range(&self, metric: Metric) -> CellRange {
        let row = self.metric_row(metric);
        CellRange::new(row, FIRST_MONTH_COL, row, ANNUAL_COL - 1)
    }

    /// Month and annual cells of every metric row
    pub fn values_range(&self) -> CellRange {
        CellRange::new(
            self.header_row() + 1,
            FIRST_MONTH_COL,
            self.last_row(),
            ANNUAL_COL,
        )
    }

    /// Title, header and metric labels
    pub fn write_frame(
        &self,
        sheet: &mut Sheet,
        title: &str,
        months: &[YearMonth],
        tier: Option<Tier>,
    ) {
        let styled = |role| {
            let style = CellStyle::new(role);
            match tier {
                Some(t) => style.with_tier(t),
                None => style,
            }
        };

        sheet.set(self.title_row, LABEL_COL, Cell::text(title), styled(CellRole::Title));
        sheet.set(
            self.header_row(),
            LABEL_COL,
            Cell::text(METRIC_HEADER),
            styled(CellRole::Header),
        );
        for (i, month) in months.iter().enumerate() {
            sheet.set(
                self.header_row(),
                Self::month_col(i),
                Cell::text(month.label()),
                styled(CellRole::Header),
            );
        }
        sheet.set(
            self.header_row(),
            ANNUAL_COL,
            Cell::text(ANNUAL_HEADER),
            styled(CellRole::Header),
        );
        for metric in Metric::ALL {
            sheet.set(
                self.metric_row(metric),
                LABEL_COL,
                Cell::text(metric.label()),
                styled(CellRole::Label),
            );
        }
    }
}

/// Freeze below the header of the first block, right of the label column
pub fn freeze_position() -> (u32, u16) {
    (Block::nth(0).header_row() + 1, FIRST_MONTH_COL)
}

/// Column widths of a roll-up sheet
pub fn set_widths(sheet: &mut Sheet) {
    sheet.set_column_width(LABEL_COL, 12.0);
    for col in FIRST_MONTH_COL..=ANNUAL_COL {
        sheet.set_column_width(col, 13.0);
    }
}

/// Negative-value rules for every block of a roll-up sheet
pub fn negative_rules(blocks: impl Iterator<Item = Block>) -> Vec<ConditionalRule> {
    blocks
        .map(|block| {
            let range = block.values_range();
            let top = Expr::cell(range.top_left());
            ConditionalRule {
                condition: Expr::and(vec![
                    Expr::is_number(top.clone()),
                    top.less_than(Expr::number(0.0)),
                ]),
                range,
                attribute: ConditionalAttribute::Negative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_geometry() {
        let first = Block::nth(0);
        assert_eq!(first.title_row, 0);
        assert_eq!(first.header_row(), 1);
        assert_eq!(first.metric_row(Metric::Rooms), 2);
        assert_eq!(first.metric_row(Metric::RevPar), 8);
        assert_eq!(first.last_row(), 8);

        let second = Block::nth(1);
        assert_eq!(second.title_row, 10);
        assert_eq!(second.metric_row(Metric::Rooms), 12);
    }

    #[test]
    fn block_cells() {
        let block = Block::nth(0);
        assert_eq!(block.month_cell(Metric::Rooms, 0).to_string(), "B3");
        assert_eq!(block.annual_cell(Metric::Rooms).to_string(), "N3");
        assert_eq!(block.months_range(Metric::Rooms).to_string(), "B3:M3");
        assert_eq!(block.values_range().to_string(), "B3:N9");
        assert_eq!(freeze_position(), (2, 1));
    }
}
