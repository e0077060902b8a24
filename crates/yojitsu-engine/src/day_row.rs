//! Day Row Builder
//!
//! One [`DayRow`] per retained calendar day: the Budget inputs from the source record,
//! Budget ratios linked to the capacity constant, and blank placeholders for every other
//! tier's cells.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use yojitsu_core::calendar::{day_kind, weekday_label};
use yojitsu_core::formula::CellRef;
use yojitsu_core::metric::Denominator;
use yojitsu_core::{
    BudgetRecord, Cell, DayKind, Expr, Guard, HolidayCalendar, LabelPolicy, Metric, Tier,
    TierPair,
};

use crate::layout::MonthLayout;

/// One calendar day of a month sheet
#[derive(Clone, Debug, PartialEq)]
pub struct DayRow {
    pub date: NaiveDate,
    /// Sheet row the day is laid out on
    pub row: u32,
    pub weekday_label: String,
    pub day_kind: DayKind,
    pub cells: BTreeMap<(Tier, Metric), Cell>,
    pub variances: BTreeMap<(TierPair, Metric), Cell>,
}

impl DayRow {
    pub fn cell(&self, tier: Tier, metric: Metric) -> Option<&Cell> {
        self.cells.get(&(tier, metric))
    }
}

/// Builds day rows for one month layout
pub struct DayRowBuilder<'a> {
    layout: &'a MonthLayout,
    capacity: u32,
    calendar: &'a dyn HolidayCalendar,
    label_policy: LabelPolicy,
}

impl<'a> DayRowBuilder<'a> {
    pub fn new(
        layout: &'a MonthLayout,
        capacity: u32,
        calendar: &'a dyn HolidayCalendar,
        label_policy: LabelPolicy,
    ) -> Self {
        Self {
            layout,
            capacity,
            calendar,
            label_policy,
        }
    }

    pub fn build(&self, row: u32, record: &BudgetRecord) -> DayRow {
        let is_holiday = self.calendar.is_holiday(record.date);
        let mut cells = BTreeMap::new();

        for &tier in self.layout.tiers().tiers() {
            for metric in Metric::ALL {
                let cell = match (tier, metric.is_additive()) {
                    (Tier::Budget, true) => Cell::optional(record.value(metric)),
                    (Tier::Budget, false) => self.budget_ratio(row, metric, record),
                    _ => Cell::blank(),
                };
                cells.insert((tier, metric), cell);
            }
        }

        DayRow {
            date: record.date,
            row,
            weekday_label: weekday_label(record.date, is_holiday, self.label_policy),
            day_kind: day_kind(record.date, is_holiday),
            cells,
            variances: BTreeMap::new(),
        }
    }

    /// Direct formula when the operands are known to be present and the denominator
    /// non-zero, guarded template otherwise
    fn budget_ratio(&self, row: u32, metric: Metric, record: &BudgetRecord) -> Cell {
        let Some(template) = metric.ratio() else {
            return Cell::blank();
        };
        let operands_present = template
            .operands()
            .into_iter()
            .all(|m| record.value(m).is_some())
            && match template.denominator {
                Denominator::Capacity => true,
                Denominator::Metric(m) => record.value(m) != Some(0.0),
            };
        let guard = if operands_present {
            Guard::None
        } else {
            Guard::BlankOperands
        };
        ratio_formula(self.layout, Tier::Budget, metric, row, self.capacity, guard)
            .map_or_else(Cell::blank, Cell::formula)
    }
}

/// Same-row ratio formula of `metric` for `tier`
pub(crate) fn ratio_formula(
    layout: &MonthLayout,
    tier: Tier,
    metric: Metric,
    row: u32,
    capacity: u32,
    guard: Guard,
) -> Option<Expr> {
    let template = metric.ratio()?;
    let numerator = Expr::cell(CellRef::new(row, layout.column(tier, template.numerator)?));
    let denominator = match template.denominator {
        Denominator::Capacity => Expr::number(capacity as f64),
        Denominator::Metric(m) => Expr::cell(CellRef::new(row, layout.column(tier, m)?)),
    };
    Some(template.formula(numerator, denominator, guard))
}
