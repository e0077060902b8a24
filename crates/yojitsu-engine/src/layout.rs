//! Month sheet column layout
//!
//! ```text
//! 日付 | 曜日 | 7 × 予算 | 7 × FC | 3 × 差(FC-予算) | 7 × OH | 3 × 差(OH-FC) | 7 × 実績 | 3 × 差(実績-OH)
//! ```
//!
//! Every non-Budget tier block is followed by the variance columns of the pair it forms
//! with the preceding tier.

use std::collections::BTreeMap;

use yojitsu_core::formula::{CellRange, CellRef};
use yojitsu_core::{Metric, Tier, TierLayout, TierPair};

pub const DATE_COL: u16 = 0;
pub const WEEKDAY_COL: u16 = 1;
pub const HEADER_ROW: u32 = 0;
pub const FIRST_DAY_ROW: u32 = 1;

pub const DATE_HEADER: &str = "日付";
pub const WEEKDAY_HEADER: &str = "曜日";
pub const TOTAL_LABEL: &str = "合計";
pub const REVISED_FORECAST_LABEL: &str = "修正月次フォーキャスト";

/// A variance column: `later − earlier` for one metric
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarianceColumn {
    pub pair: TierPair,
    pub metric: Metric,
    pub col: u16,
}

/// Column positions of a month sheet for a given tier layout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthLayout {
    tiers: TierLayout,
    columns: BTreeMap<(Tier, Metric), u16>,
    variances: Vec<VarianceColumn>,
    width: u16,
}

impl MonthLayout {
    pub fn new(tiers: &TierLayout) -> Self {
        let mut columns = BTreeMap::new();
        let mut variances = Vec::new();
        let mut col = WEEKDAY_COL + 1;
        let pairs = tiers.adjacent_pairs();

        for &tier in tiers.tiers() {
            for metric in Metric::ALL {
                columns.insert((tier, metric), col);
                col += 1;
            }
            // Variance columns follow the later tier of each pair
            if let Some(&pair) = pairs.iter().find(|p| p.later == tier) {
                for metric in Metric::VARIANCE {
                    variances.push(VarianceColumn { pair, metric, col });
                    col += 1;
                }
            }
        }

        Self {
            tiers: tiers.clone(),
            columns,
            variances,
            width: col,
        }
    }

    pub fn tiers(&self) -> &TierLayout {
        &self.tiers
    }

    pub fn column(&self, tier: Tier, metric: Metric) -> Option<u16> {
        self.columns.get(&(tier, metric)).copied()
    }

    pub fn variance_columns(&self) -> &[VarianceColumn] {
        &self.variances
    }

    /// First and last column of a tier's metric block
    pub fn tier_block(&self, tier: Tier) -> Option<(u16, u16)> {
        let first = self.column(tier, Metric::Rooms)?;
        let last = self.column(tier, Metric::RevPar)?;
        Some((first, last))
    }

    /// Number of columns in use
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Header text of every column, in column order
    pub fn headers(&self) -> Vec<(u16, String)> {
        let mut headers = vec![
            (DATE_COL, DATE_HEADER.to_string()),
            (WEEKDAY_COL, WEEKDAY_HEADER.to_string()),
        ];
        for (&(tier, metric), &col) in &self.columns {
            headers.push((col, format!("{}_{}", metric.label(), tier.label())));
        }
        for v in &self.variances {
            headers.push((
                v.col,
                format!("差_{}_{}", v.metric.variance_label(), v.pair.short_label()),
            ));
        }
        headers.sort_by_key(|(col, _)| *col);
        headers
    }
}

/// Row positions of a month sheet with `day_count` day rows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthRows {
    pub day_count: u32,
}

impl MonthRows {
    pub fn new(day_count: u32) -> Self {
        Self { day_count }
    }

    pub fn day(&self, index: usize) -> u32 {
        FIRST_DAY_ROW + index as u32
    }

    pub fn last_day(&self) -> u32 {
        FIRST_DAY_ROW + self.day_count - 1
    }

    pub fn total(&self) -> u32 {
        FIRST_DAY_ROW + self.day_count
    }

    pub fn revised(&self) -> u32 {
        self.total() + 1
    }

    /// Day-row range of one column
    pub fn days(&self, col: u16) -> CellRange {
        CellRange::column(col, FIRST_DAY_ROW, self.last_day())
    }

    pub fn total_cell(&self, col: u16) -> CellRef {
        CellRef::new(self.total(), col)
    }
}
