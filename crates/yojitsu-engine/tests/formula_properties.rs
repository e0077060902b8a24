//! Numeric properties of the generated workbook
//!
//! Each test generates a workbook, types values into placeholder cells where needed,
//! and evaluates the emitted formulas with the test-support evaluator.

mod support;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use support::{assert_close, Evaluator, Value};
use yojitsu_core::calendar::{JapaneseHolidays, NoHolidays};
use yojitsu_core::{
    BudgetRecord, Cell, ConditionalAttribute, FiscalWindow, Literal, Metric, MonthRecords, Tier,
    TierLayout, Workbook, YearMonth,
};
use yojitsu_engine::rollup::Block;
use yojitsu_engine::{GeneratorOptions, MonthLayout, MonthRows, WorkbookGenerator};

const APRIL: &str = "2025年4月";
const MAY: &str = "2025年5月";
const SUMMARY: &str = "年間集計";
const VARIANCE: &str = "年間差異";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month_of(year: i32, month: u32, rooms: &[f64]) -> MonthRecords {
    MonthRecords {
        month: YearMonth::new(year, month),
        records: rooms
            .iter()
            .enumerate()
            .map(|(i, r)| BudgetRecord::new(date(year, month, i as u32 + 1)).rooms(*r))
            .collect(),
    }
}

fn generate(capacity: u32, tiers: TierLayout, months: &[MonthRecords]) -> Workbook {
    let options = GeneratorOptions::new(capacity, FiscalWindow::new(2025, 4)).tiers(tiers);
    WorkbookGenerator::new(options, &NoHolidays)
        .generate(months)
        .workbook
}

fn col(tier: Tier, metric: Metric) -> u16 {
    MonthLayout::new(&TierLayout::four_tier())
        .column(tier, metric)
        .unwrap()
}

// ============================================================================
// Day rows
// ============================================================================

#[test]
fn budget_ratios_evaluate_to_catalog_definitions() {
    let april = MonthRecords {
        month: YearMonth::new(2025, 4),
        records: vec![BudgetRecord::new(date(2025, 4, 1))
            .rooms(60.0)
            .guests(96.0)
            .revenue(720_000.0)],
    };
    let wb = generate(120, TierLayout::four_tier(), &[april]);
    let eval = Evaluator::new(&wb);

    assert_close(eval.number(APRIL, 1, col(Tier::Budget, Metric::Occupancy)), 0.5);
    assert_close(eval.number(APRIL, 1, col(Tier::Budget, Metric::Adr)), 12_000.0);
    assert_close(eval.number(APRIL, 1, col(Tier::Budget, Metric::Dor)), 1.6);
    assert_close(eval.number(APRIL, 1, col(Tier::Budget, Metric::RevPar)), 6_000.0);
}

#[test]
fn budget_ratios_stay_blank_for_missing_operands() {
    let april = MonthRecords {
        month: YearMonth::new(2025, 4),
        records: vec![BudgetRecord::new(date(2025, 4, 1)).rooms(0.0)],
    };
    let wb = generate(120, TierLayout::four_tier(), &[april]);
    let eval = Evaluator::new(&wb);

    assert_close(eval.number(APRIL, 1, col(Tier::Budget, Metric::Occupancy)), 0.0);
    assert!(eval.value(APRIL, 1, col(Tier::Budget, Metric::Adr)).is_blank());
    assert!(eval.value(APRIL, 1, col(Tier::Budget, Metric::Dor)).is_blank());
    assert!(eval.value(APRIL, 1, col(Tier::Budget, Metric::RevPar)).is_blank());
}

#[test]
fn entry_tiers_without_input_are_blank_not_errors() {
    let wb = generate(100, TierLayout::four_tier(), &[month_of(2025, 4, &[50.0, 60.0])]);
    let eval = Evaluator::new(&wb);
    let layout = MonthLayout::new(&TierLayout::four_tier());
    let rows = MonthRows::new(2);

    for tier in [Tier::Forecast, Tier::OnHand, Tier::Actual] {
        for metric in Metric::RATIOS {
            let c = layout.column(tier, metric).unwrap();
            for row in [rows.day(0), rows.day(1), rows.total()] {
                let v = eval.value(APRIL, row, c);
                assert!(v.is_blank(), "{:?} {:?} row {} = {:?}", tier, metric, row, v);
            }
        }
    }
    for v in layout.variance_columns() {
        for row in [rows.day(0), rows.total()] {
            assert!(eval.value(APRIL, row, v.col).is_blank());
        }
    }
}

#[test]
fn entered_forecast_produces_variances() {
    let wb = generate(100, TierLayout::four_tier(), &[month_of(2025, 4, &[50.0, 60.0])]);
    let layout = MonthLayout::new(&TierLayout::four_tier());
    let mut eval = Evaluator::new(&wb);
    eval.set(APRIL, 1, col(Tier::Forecast, Metric::Rooms), 70.0);

    assert_close(eval.number(APRIL, 1, col(Tier::Forecast, Metric::Occupancy)), 0.7);
    let occ_variance = layout
        .variance_columns()
        .iter()
        .find(|v| v.pair.later == Tier::Forecast && v.metric == Metric::Occupancy)
        .unwrap();
    assert_close(eval.number(APRIL, 1, occ_variance.col), 0.2);
    assert!(eval.value(APRIL, 2, occ_variance.col).is_blank());
}

// ============================================================================
// Total and Revised-Forecast rows
// ============================================================================

#[test]
fn total_occupancy_uses_summed_rooms_and_entered_days() {
    let wb = generate(10, TierLayout::four_tier(), &[month_of(2025, 4, &[0.0, 5.0, 5.0])]);
    let eval = Evaluator::new(&wb);
    let total = MonthRows::new(3).total();

    assert_close(eval.number(APRIL, total, col(Tier::Budget, Metric::Rooms)), 10.0);
    assert_close(
        eval.number(APRIL, total, col(Tier::Budget, Metric::Occupancy)),
        10.0 / 10.0 / 3.0,
    );
}

#[test]
fn month_to_date_occupancy_counts_entered_days() {
    let wb = generate(100, TierLayout::four_tier(), &[month_of(2025, 4, &[80.0; 10])]);
    let mut eval = Evaluator::new(&wb);
    let rows = MonthRows::new(10);
    for i in 0..5 {
        eval.set(APRIL, rows.day(i), col(Tier::Actual, Metric::Rooms), 10.0);
        eval.set(APRIL, rows.day(i), col(Tier::Actual, Metric::RoomRevenue), 1_000.0);
    }

    assert_close(
        eval.number(APRIL, rows.total(), col(Tier::Actual, Metric::Occupancy)),
        50.0 / (100.0 * 5.0),
    );
    // RevPAR stays on the full month
    assert_close(
        eval.number(APRIL, rows.total(), col(Tier::Actual, Metric::RevPar)),
        5_000.0 / (100.0 * 10.0),
    );
    assert_close(
        eval.number(APRIL, rows.total(), col(Tier::Budget, Metric::Occupancy)),
        800.0 / (100.0 * 10.0),
    );
    assert_close(
        eval.number(APRIL, rows.revised(), col(Tier::Forecast, Metric::Occupancy)),
        50.0 / (100.0 * 10.0),
    );
}

#[test]
fn revised_forecast_substitutes_actuals() {
    let wb = generate(100, TierLayout::four_tier(), &[month_of(2025, 4, &[80.0; 10])]);
    let mut eval = Evaluator::new(&wb);
    let rows = MonthRows::new(10);
    let fc = col(Tier::Forecast, Metric::Rooms);
    let act = col(Tier::Actual, Metric::Rooms);

    for i in 0..5 {
        eval.set(APRIL, rows.day(i), act, 10.0);
        eval.set(APRIL, rows.day(i), fc, 999.0);
    }
    for i in 5..10 {
        eval.set(APRIL, rows.day(i), fc, 12.0);
    }

    assert_close(eval.number(APRIL, rows.revised(), fc), 110.0);
    assert_close(
        eval.number(APRIL, rows.revised(), col(Tier::Forecast, Metric::Occupancy)),
        110.0 / (100.0 * 10.0),
    );
    // Plain Forecast total still sums the Forecast column
    assert_close(eval.number(APRIL, rows.total(), fc), 5.0 * 999.0 + 60.0);
}

#[test]
fn on_hand_total_blends_actuals() {
    let wb = generate(100, TierLayout::four_tier(), &[month_of(2025, 4, &[80.0; 3])]);
    let mut eval = Evaluator::new(&wb);
    let rows = MonthRows::new(3);
    let oh = col(Tier::OnHand, Metric::Rooms);
    let act = col(Tier::Actual, Metric::Rooms);

    eval.set(APRIL, rows.day(0), act, 40.0);
    eval.set(APRIL, rows.day(1), act, 45.0);
    for i in 0..3 {
        eval.set(APRIL, rows.day(i), oh, 30.0);
    }

    assert_close(eval.number(APRIL, rows.total(), oh), 40.0 + 45.0 + 30.0);
    // Each day counts once, from whichever column it was blended from
    assert_close(
        eval.number(APRIL, rows.total(), col(Tier::OnHand, Metric::Occupancy)),
        115.0 / (100.0 * 3.0),
    );
}

#[test]
fn revised_ratios_blank_without_blended_rooms() {
    let wb = generate(100, TierLayout::four_tier(), &[month_of(2025, 4, &[80.0; 3])]);
    let mut eval = Evaluator::new(&wb);
    let rows = MonthRows::new(3);
    let adr = col(Tier::Forecast, Metric::Adr);
    let dor = col(Tier::Forecast, Metric::Dor);

    assert!(eval.value(APRIL, rows.revised(), adr).is_blank());
    assert!(eval.value(APRIL, rows.revised(), dor).is_blank());

    eval.set(APRIL, rows.day(0), col(Tier::Actual, Metric::Rooms), 0.0);
    eval.set(APRIL, rows.day(0), col(Tier::Actual, Metric::Guests), 2.0);
    eval.set(APRIL, rows.day(0), col(Tier::Actual, Metric::RoomRevenue), 500.0);
    assert_close(eval.number(APRIL, rows.revised(), col(Tier::Forecast, Metric::Rooms)), 0.0);
    assert!(eval.value(APRIL, rows.revised(), adr).is_blank());
    assert!(eval.value(APRIL, rows.revised(), dor).is_blank());

    eval.set(APRIL, rows.day(1), col(Tier::Forecast, Metric::Rooms), 4.0);
    eval.set(APRIL, rows.day(1), col(Tier::Forecast, Metric::Guests), 6.0);
    eval.set(APRIL, rows.day(1), col(Tier::Forecast, Metric::RoomRevenue), 300.0);
    assert_close(eval.number(APRIL, rows.revised(), adr), 800.0 / 4.0);
    assert_close(eval.number(APRIL, rows.revised(), dor), 8.0 / 4.0);
}

#[test]
fn revenue_variance_ignores_days_without_later_entry() {
    let april = MonthRecords {
        month: YearMonth::new(2025, 4),
        records: (1..=3)
            .map(|d| BudgetRecord::new(date(2025, 4, d)).rooms(10.0).revenue(80.0))
            .collect(),
    };
    let wb = generate(100, TierLayout::four_tier(), &[april]);
    let layout = MonthLayout::new(&TierLayout::four_tier());
    let mut eval = Evaluator::new(&wb);
    let rows = MonthRows::new(3);
    eval.set(APRIL, rows.day(0), col(Tier::Forecast, Metric::RoomRevenue), 100.0);

    let revenue_variance = layout
        .variance_columns()
        .iter()
        .find(|v| v.pair.later == Tier::Forecast && v.metric == Metric::RoomRevenue)
        .unwrap();
    assert_close(eval.number(APRIL, rows.total(), revenue_variance.col), 20.0);
}

// ============================================================================
// Roll-ups
// ============================================================================

#[test]
fn absent_month_contributes_zero() {
    let wb = generate(10, TierLayout::four_tier(), &[month_of(2025, 4, &[5.0; 30])]);
    let eval = Evaluator::new(&wb);
    let budget = Block::nth(0);

    // May is the second month of the window and has no sheet
    assert!(wb.sheet(MAY).is_none());
    assert_eq!(
        wb.sheet(SUMMARY).unwrap().cell(budget.metric_row(Metric::Rooms), 2),
        Some(&Cell::number(0.0))
    );
    assert_close(eval.number(SUMMARY, budget.metric_row(Metric::Rooms), 13), 150.0);
    assert_close(
        eval.number(SUMMARY, budget.metric_row(Metric::Occupancy), 13),
        150.0 / 10.0 / 30.0,
    );
}

#[test]
fn annual_occupancy_and_its_variance_are_recomputed() {
    let wb = generate(
        10,
        TierLayout::four_tier(),
        &[month_of(2025, 4, &[5.0; 30]), month_of(2025, 5, &[6.0; 31])],
    );
    let mut eval = Evaluator::new(&wb);
    let rows = MonthRows::new(30);
    for i in 0..30 {
        eval.set(APRIL, rows.day(i), col(Tier::Forecast, Metric::Rooms), 7.0);
    }

    let budget = Block::nth(0);
    let forecast = Block::nth(1);
    let budget_occ = 336.0 / 10.0 / 61.0;
    let forecast_occ = 210.0 / 10.0 / 61.0;
    assert_close(eval.number(SUMMARY, budget.metric_row(Metric::Occupancy), 13), budget_occ);
    assert_close(eval.number(SUMMARY, forecast.metric_row(Metric::Occupancy), 13), forecast_occ);

    // FC − 予算 is the first variance block
    let occ_row = Block::nth(0).metric_row(Metric::Occupancy);
    assert_close(eval.number(VARIANCE, occ_row, 13), forecast_occ - budget_occ);
    // April has a monthly variance, May has none; their sum differs from the annual value
    assert_close(eval.number(VARIANCE, occ_row, 1), 0.7 - 0.5);
    assert!(eval.value(VARIANCE, occ_row, 2).is_blank());
}

#[test]
fn annual_rooms_variance_sums_monthly_variances() {
    let wb = generate(10, TierLayout::three_tier(), &[month_of(2025, 4, &[5.0; 30])]);
    let layout = MonthLayout::new(&TierLayout::three_tier());
    let mut eval = Evaluator::new(&wb);
    let rows = MonthRows::new(30);
    let fc = layout.column(Tier::Forecast, Metric::Rooms).unwrap();
    for i in 0..30 {
        eval.set(APRIL, rows.day(i), fc, 6.0);
    }

    let rooms_row = Block::nth(0).metric_row(Metric::Rooms);
    assert_close(eval.number(VARIANCE, rooms_row, 1), 30.0);
    // Months without Forecast rooms are blank and drop out of the sum
    assert!(eval.value(VARIANCE, rooms_row, 2).is_blank());
    assert_close(eval.number(VARIANCE, rooms_row, 13), 30.0);
}

#[test]
fn roll_up_sheets_hold_no_raw_values() {
    let wb = generate(
        10,
        TierLayout::four_tier(),
        &[month_of(2025, 4, &[5.0; 30]), month_of(2025, 6, &[4.0; 30])],
    );
    let names = wb.sheet_names();
    for name in [SUMMARY, VARIANCE] {
        for (_, _, entry) in wb.sheet(name).unwrap().cells() {
            match &entry.cell {
                Cell::Formula(f) => {
                    for sheet in f.expr.referenced_sheets() {
                        assert!(names.contains(&sheet.as_str()), "dangling {}", sheet);
                    }
                }
                Cell::Literal(Literal::Text(_)) | Cell::Literal(Literal::Blank) => {}
                Cell::Literal(Literal::Number(n)) => assert_eq!(*n, 0.0),
                Cell::Literal(other) => panic!("unexpected literal {:?}", other),
            }
        }
    }
}

// ============================================================================
// Display rules and determinism
// ============================================================================

#[test]
fn entered_actual_supersedes_forecast_row() {
    let wb = generate(100, TierLayout::four_tier(), &[month_of(2025, 4, &[80.0; 3])]);
    let sheet = wb.sheet(APRIL).unwrap();
    let rule = sheet
        .rules
        .iter()
        .find(|r| r.attribute == ConditionalAttribute::Superseded)
        .unwrap();

    let mut eval = Evaluator::new(&wb);
    assert_eq!(eval.eval(&rule.condition, APRIL), Value::Bool(false));
    eval.set(APRIL, 1, col(Tier::Actual, Metric::Rooms), 55.0);
    assert_eq!(eval.eval(&rule.condition, APRIL), Value::Bool(true));
}

#[test]
fn negative_rule_flags_only_negative_numbers() {
    let wb = generate(100, TierLayout::four_tier(), &[month_of(2025, 4, &[80.0; 3])]);
    let sheet = wb.sheet(APRIL).unwrap();
    let rule = sheet
        .rules
        .iter()
        .find(|r| r.attribute == ConditionalAttribute::Negative)
        .unwrap();

    let mut eval = Evaluator::new(&wb);
    assert_eq!(eval.eval(&rule.condition, APRIL), Value::Bool(false));
    eval.set(APRIL, 1, col(Tier::Forecast, Metric::Rooms), 40.0);
    // FC OCC 40% against Budget 80%
    assert_eq!(eval.eval(&rule.condition, APRIL), Value::Bool(true));
}

#[test]
fn generation_is_deterministic() {
    let months = [month_of(2025, 4, &[5.0; 30]), month_of(2025, 7, &[9.0; 31])];
    let first = WorkbookGenerator::new(
        GeneratorOptions::new(25, FiscalWindow::new(2025, 4)),
        &JapaneseHolidays,
    )
    .generate(&months);
    let second = WorkbookGenerator::new(
        GeneratorOptions::new(25, FiscalWindow::new(2025, 4)),
        &JapaneseHolidays,
    )
    .generate(&months);
    assert_eq!(first.workbook, second.workbook);
}
