//! Month Sheet Assembler
//!
//! Lays out the day rows of one month and synthesizes every formula of the sheet:
//! guarded ratios for the manually entered tiers, adjacent-tier variances, the Total row
//! and the Revised-Forecast row. Display rules mark superseded Forecast/On-Hand cells and
//! negative variances.

use std::collections::BTreeMap;

use tracing::debug;
use yojitsu_core::formula::{CellRange, CellRef};
use yojitsu_core::metric::Denominator;
use yojitsu_core::{
    Cell, CellRole, CellStyle, ConditionalAttribute, ConditionalRule, Expr, Guard,
    HolidayCalendar, LabelPolicy, Literal, Metric, MonthRecords, Sheet, SheetKind, Tier,
    TierPair, YearMonth,
};

use crate::day_row::{ratio_formula, DayRow, DayRowBuilder};
use crate::layout::{
    MonthLayout, MonthRows, VarianceColumn, DATE_COL, FIRST_DAY_ROW, HEADER_ROW,
    REVISED_FORECAST_LABEL, TOTAL_LABEL, WEEKDAY_COL,
};

/// A Total or Revised-Forecast row
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateRow {
    pub row: u32,
    pub label: &'static str,
    pub cells: BTreeMap<(Tier, Metric), Cell>,
    pub variances: BTreeMap<(TierPair, Metric), Cell>,
}

impl AggregateRow {
    fn new(row: u32, label: &'static str) -> Self {
        Self {
            row,
            label,
            cells: BTreeMap::new(),
            variances: BTreeMap::new(),
        }
    }

    pub fn cell(&self, tier: Tier, metric: Metric) -> Option<&Cell> {
        self.cells.get(&(tier, metric))
    }
}

/// A fully synthesized month sheet
#[derive(Clone, Debug, PartialEq)]
pub struct MonthSheet {
    pub month: YearMonth,
    pub name: String,
    pub rows: MonthRows,
    pub day_rows: Vec<DayRow>,
    pub total: AggregateRow,
    /// Present when both Forecast and Actual tiers exist
    pub revised: Option<AggregateRow>,
    pub rules: Vec<ConditionalRule>,
}

impl MonthSheet {
    pub fn day_count(&self) -> u32 {
        self.rows.day_count
    }

    /// Address of a Total-row cell, qualified with this sheet's name
    pub fn total_ref(&self, layout: &MonthLayout, tier: Tier, metric: Metric) -> Option<CellRef> {
        let col = layout.column(tier, metric)?;
        Some(self.rows.total_cell(col).on_sheet(self.name.clone()))
    }

    /// Lay the month out as a worksheet
    pub fn to_sheet(&self, layout: &MonthLayout) -> Sheet {
        let mut sheet = Sheet::new(self.name.clone(), SheetKind::Month(self.month));

        for (col, header) in layout.headers() {
            let mut style = CellStyle::new(CellRole::Header);
            if let Some(tier) = tier_of_column(layout, col) {
                style = style.with_tier(tier);
            }
            sheet.set(HEADER_ROW, col, Cell::text(header), style);
        }

        for day in &self.day_rows {
            sheet.set(
                day.row,
                DATE_COL,
                Cell::Literal(Literal::Date(day.date)),
                CellStyle::new(CellRole::Date),
            );
            sheet.set(
                day.row,
                WEEKDAY_COL,
                Cell::text(day.weekday_label.clone()),
                CellStyle::new(CellRole::Weekday(day.day_kind)),
            );
            write_tier_cells(&mut sheet, layout, day.row, &day.cells, false);
            write_variance_cells(&mut sheet, layout, day.row, &day.variances, false);
        }

        for aggregate in std::iter::once(&self.total).chain(self.revised.as_ref()) {
            sheet.set(
                aggregate.row,
                DATE_COL,
                Cell::text(aggregate.label),
                CellStyle::new(CellRole::Label).emphasized(),
            );
            write_tier_cells(&mut sheet, layout, aggregate.row, &aggregate.cells, true);
            write_variance_cells(&mut sheet, layout, aggregate.row, &aggregate.variances, true);
        }

        sheet.freeze = Some((FIRST_DAY_ROW, WEEKDAY_COL + 1));
        sheet.rules = self.rules.clone();
        sheet.set_column_width(DATE_COL, 12.0);
        sheet.set_column_width(WEEKDAY_COL, 7.0);
        for col in (WEEKDAY_COL + 1)..layout.width() {
            sheet.set_column_width(col, 12.0);
        }
        sheet
    }
}

fn tier_of_column(layout: &MonthLayout, col: u16) -> Option<Tier> {
    layout.tiers().tiers().iter().copied().find(|&tier| {
        layout
            .tier_block(tier)
            .is_some_and(|(first, last)| (first..=last).contains(&col))
    })
}

fn write_tier_cells(
    sheet: &mut Sheet,
    layout: &MonthLayout,
    row: u32,
    cells: &BTreeMap<(Tier, Metric), Cell>,
    emphasized: bool,
) {
    for (&(tier, metric), cell) in cells {
        let Some(col) = layout.column(tier, metric) else {
            continue;
        };
        let mut style = CellStyle::value(tier, metric.display_format());
        if emphasized {
            style = style.emphasized();
        }
        sheet.set(row, col, cell.clone(), style);
    }
}

fn write_variance_cells(
    sheet: &mut Sheet,
    layout: &MonthLayout,
    row: u32,
    cells: &BTreeMap<(TierPair, Metric), Cell>,
    emphasized: bool,
) {
    for v in layout.variance_columns() {
        let Some(cell) = cells.get(&(v.pair, v.metric)) else {
            continue;
        };
        let mut style = CellStyle::variance(v.metric.display_format());
        if emphasized {
            style = style.emphasized();
        }
        sheet.set(row, v.col, cell.clone(), style);
    }
}

/// `IF(later="","",IFERROR(later-earlier,""))`
pub(crate) fn guarded_difference(later: Expr, earlier: Expr) -> Expr {
    Expr::blank_if(
        later.clone().is_blank(),
        Expr::if_error(later - earlier, Expr::blank()),
    )
}

/// Assembles month sheets for one layout
pub struct MonthSheetAssembler<'a> {
    layout: &'a MonthLayout,
    capacity: u32,
    days: DayRowBuilder<'a>,
}

impl<'a> MonthSheetAssembler<'a> {
    pub fn new(
        layout: &'a MonthLayout,
        capacity: u32,
        calendar: &'a dyn HolidayCalendar,
        label_policy: LabelPolicy,
    ) -> Self {
        Self {
            layout,
            capacity,
            days: DayRowBuilder::new(layout, capacity, calendar, label_policy),
        }
    }

    /// Build the sheet of one month; `None` when the month has no retained rows
    pub fn assemble(&self, records: &MonthRecords) -> Option<MonthSheet> {
        if records.is_empty() {
            return None;
        }
        let rows = MonthRows::new(records.day_count());

        let mut day_rows: Vec<DayRow> = records
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| self.days.build(rows.day(i), record))
            .collect();
        for day in &mut day_rows {
            self.fill_entry_ratios(day);
            self.fill_day_variances(day);
        }

        let total = self.total_row(rows);
        let revised = self.revised_row(rows);
        let rules = self.rules(rows);

        debug!(
            month = %records.month,
            days = rows.day_count,
            rules = rules.len(),
            "assembled month sheet"
        );

        Some(MonthSheet {
            month: records.month,
            name: records.month.label(),
            rows,
            day_rows,
            total,
            revised,
            rules,
        })
    }

    fn has(&self, tier: Tier) -> bool {
        self.layout.tiers().contains(tier)
    }

    fn col(&self, tier: Tier, metric: Metric) -> Option<u16> {
        self.layout.column(tier, metric)
    }

    fn capacity(&self) -> Expr {
        Expr::number(self.capacity as f64)
    }

    /// Capacity scaled by the sheet's day count, `(c*n)`
    fn capacity_days(&self, rows: MonthRows) -> Expr {
        self.capacity() * Expr::number(rows.day_count as f64)
    }

    // ------------------------------------------------------------------------
    // Day rows
    // ------------------------------------------------------------------------

    /// Guarded ratios for every tier entered by hand
    fn fill_entry_ratios(&self, day: &mut DayRow) {
        for tier in self.layout.tiers().non_budget() {
            for metric in Metric::RATIOS {
                if let Some(expr) = ratio_formula(
                    self.layout,
                    tier,
                    metric,
                    day.row,
                    self.capacity,
                    Guard::BlankOperands,
                ) {
                    day.cells.insert((tier, metric), Cell::formula(expr));
                }
            }
        }
    }

    fn fill_day_variances(&self, day: &mut DayRow) {
        for v in self.layout.variance_columns() {
            let (Some(later), Some(earlier)) = (
                self.col(v.pair.later, v.metric),
                self.col(v.pair.earlier, v.metric),
            ) else {
                continue;
            };
            let expr = guarded_difference(
                Expr::cell(CellRef::new(day.row, later)),
                Expr::cell(CellRef::new(day.row, earlier)),
            );
            day.variances.insert((v.pair, v.metric), Cell::formula(expr));
        }
    }

    // ------------------------------------------------------------------------
    // Total row
    // ------------------------------------------------------------------------

    /// Day range of a tier/metric column
    fn days_of(&self, rows: MonthRows, tier: Tier, metric: Metric) -> Option<CellRange> {
        self.col(tier, metric).map(|col| rows.days(col))
    }

    /// On-Hand totals substitute entered actuals day by day
    fn blends_with_actual(&self, tier: Tier) -> bool {
        tier == Tier::OnHand && self.has(Tier::Actual)
    }

    /// `SUM(actual)+SUMIFS(tier,actual,"")`
    fn blended_sum(&self, rows: MonthRows, tier: Tier, metric: Metric) -> Option<Expr> {
        let own = self.days_of(rows, tier, metric)?;
        let actual = self.days_of(rows, Tier::Actual, metric)?;
        Some(Expr::sum(actual.clone()) + Expr::sum_ifs(own, vec![(actual, "")]))
    }

    /// Number of entered values feeding a tier's additive total
    fn entered_count(
        &self,
        rows: MonthRows,
        tier: Tier,
        metric: Metric,
        blended: bool,
    ) -> Option<Expr> {
        let own = Expr::count(self.days_of(rows, tier, metric)?);
        if blended {
            let actual = Expr::count(self.days_of(rows, Tier::Actual, metric)?);
            Some(own + actual)
        } else {
            Some(own)
        }
    }

    fn total_row(&self, rows: MonthRows) -> AggregateRow {
        let mut total = AggregateRow::new(rows.total(), TOTAL_LABEL);

        for &tier in self.layout.tiers().tiers() {
            let blended = self.blends_with_actual(tier);
            for metric in Metric::ADDITIVE {
                let expr = if blended {
                    self.blended_sum(rows, tier, metric)
                } else {
                    self.days_of(rows, tier, metric).map(Expr::sum)
                };
                if let Some(expr) = expr {
                    total.cells.insert((tier, metric), Cell::formula(expr));
                }
            }
            for metric in Metric::RATIOS {
                if let Some(expr) = self.aggregate_ratio(rows, rows.total(), tier, metric, blended)
                {
                    total.cells.insert((tier, metric), Cell::formula(expr));
                }
            }
        }

        for v in self.layout.variance_columns() {
            if let Some(expr) = self.total_variance(rows, v) {
                total.variances.insert((v.pair, v.metric), Cell::formula(expr));
            }
        }
        total
    }

    /// Days contributing to a tier's additive total. A blended day counts once, whether
    /// it takes the actual or the tier's own value.
    fn entered_days(
        &self,
        rows: MonthRows,
        tier: Tier,
        metric: Metric,
        blended: bool,
    ) -> Option<Expr> {
        let own = self.days_of(rows, tier, metric)?;
        if blended {
            let actual = self.days_of(rows, Tier::Actual, metric)?;
            Some(Expr::count(actual.clone()) + Expr::count_ifs(vec![(own, "<>"), (actual, "")]))
        } else {
            Some(Expr::count(own))
        }
    }

    /// Ratio recomputed from the additive cells of an aggregate row.
    ///
    /// Blank when the numerator has no entered values, or when a metric denominator
    /// aggregates to zero. Total-row Occupancy divides by the days with entries; every
    /// other capacity ratio uses the sheet's day count.
    fn aggregate_ratio(
        &self,
        rows: MonthRows,
        row: u32,
        tier: Tier,
        metric: Metric,
        blended: bool,
    ) -> Option<Expr> {
        let template = metric.ratio()?;
        let numerator = Expr::cell(CellRef::new(row, self.col(tier, template.numerator)?));
        let nothing_entered = self
            .entered_count(rows, tier, template.numerator, blended)?
            .is_zero();
        let mut conditions = Vec::new();
        let denominator = match template.denominator {
            Denominator::Capacity => {
                conditions.push(nothing_entered);
                if row == rows.total() && metric == Metric::Occupancy {
                    self.capacity() * self.entered_days(rows, tier, template.numerator, blended)?
                } else {
                    self.capacity_days(rows)
                }
            }
            Denominator::Metric(m) => {
                let den = Expr::cell(CellRef::new(row, self.col(tier, m)?));
                if row == rows.total() {
                    conditions.push(nothing_entered);
                }
                conditions.push(den.clone().is_zero());
                den
            }
        };
        Some(template.formula(numerator, denominator, Guard::When(conditions)))
    }

    fn total_variance(&self, rows: MonthRows, v: &VarianceColumn) -> Option<Expr> {
        let later_col = self.col(v.pair.later, v.metric)?;
        let earlier_col = self.col(v.pair.earlier, v.metric)?;

        if v.metric.is_additive() {
            // Only days where the later tier has an entry count on either side
            let later = rows.days(later_col);
            let earlier = rows.days(earlier_col);
            let difference = Expr::sum_if(later.clone(), "<>", later.clone())
                - Expr::sum_if(later.clone(), "<>", earlier);
            Some(Expr::blank_if(Expr::count(later).is_zero(), difference))
        } else {
            Some(guarded_difference(
                Expr::cell(rows.total_cell(later_col)),
                Expr::cell(rows.total_cell(earlier_col)),
            ))
        }
    }

    // ------------------------------------------------------------------------
    // Revised-Forecast row
    // ------------------------------------------------------------------------

    fn revised_row(&self, rows: MonthRows) -> Option<AggregateRow> {
        if !(self.has(Tier::Forecast) && self.has(Tier::Actual)) {
            return None;
        }
        let mut revised = AggregateRow::new(rows.revised(), REVISED_FORECAST_LABEL);

        for metric in Metric::ADDITIVE {
            let expr = self.blended_sum(rows, Tier::Forecast, metric)?;
            revised.cells.insert((Tier::Forecast, metric), Cell::formula(expr));
        }
        for metric in Metric::RATIOS {
            let expr = self.aggregate_ratio(rows, rows.revised(), Tier::Forecast, metric, true)?;
            revised.cells.insert((Tier::Forecast, metric), Cell::formula(expr));
        }
        Some(revised)
    }

    // ------------------------------------------------------------------------
    // Display rules
    // ------------------------------------------------------------------------

    fn rules(&self, rows: MonthRows) -> Vec<ConditionalRule> {
        let mut rules = Vec::new();

        if let Some(actual_rooms) = self.col(Tier::Actual, Metric::Rooms) {
            let entered = Expr::len(Expr::cell(
                CellRef::new(FIRST_DAY_ROW, actual_rooms).absolute_col(),
            ))
            .greater_than(Expr::number(0.0));
            for tier in [Tier::Forecast, Tier::OnHand] {
                if let Some((first, last)) = self.layout.tier_block(tier) {
                    rules.push(ConditionalRule {
                        range: CellRange::new(FIRST_DAY_ROW, first, rows.last_day(), last),
                        condition: entered.clone(),
                        attribute: ConditionalAttribute::Superseded,
                    });
                }
            }
        }

        for v in self.layout.variance_columns() {
            let range = CellRange::column(v.col, FIRST_DAY_ROW, rows.total());
            let top = Expr::cell(range.top_left());
            rules.push(ConditionalRule {
                condition: Expr::and(vec![
                    Expr::is_number(top.clone()),
                    top.less_than(Expr::number(0.0)),
                ]),
                range,
                attribute: ConditionalAttribute::Negative,
            });
        }
        rules
    }
}
