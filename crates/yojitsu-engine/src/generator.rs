//! Workbook generation pipeline
//!
//! Month sheets first (each recorded in the resolver once its Total row exists), then
//! the year summary, then the year variance sheet.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};
use yojitsu_core::{
    FiscalWindow, HolidayCalendar, LabelPolicy, MonthRecords, RunConfig, TierLayout, Workbook,
    YearMonth,
};

use crate::layout::MonthLayout;
use crate::month_sheet::MonthSheetAssembler;
use crate::resolver::CrossSheetReferences;
use crate::summary::YearSummaryAssembler;
use crate::variance::YearVarianceAssembler;

/// Options of one generation run
#[derive(Clone, Debug)]
pub struct GeneratorOptions {
    pub capacity: u32,
    pub tiers: TierLayout,
    pub label_policy: LabelPolicy,
    pub window: FiscalWindow,
}

impl GeneratorOptions {
    pub fn new(capacity: u32, window: FiscalWindow) -> Self {
        Self {
            capacity,
            tiers: TierLayout::default(),
            label_policy: LabelPolicy::default(),
            window,
        }
    }

    pub fn tiers(mut self, tiers: TierLayout) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn label_policy(mut self, policy: LabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    pub fn from_config(config: &RunConfig, fiscal_year: i32) -> Self {
        Self::new(config.capacity, config.window(fiscal_year))
            .tiers(config.tiers.clone())
            .label_policy(config.label_policy)
    }
}

/// What happened to each input month
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Months that produced a sheet, in sheet order
    pub months: Vec<YearMonth>,
    /// Months without retained rows, or repeated
    pub skipped: Vec<YearMonth>,
    /// Months laid out but not rolled up
    pub outside_window: Vec<YearMonth>,
}

#[derive(Clone, Debug)]
pub struct Generation {
    pub workbook: Workbook,
    pub report: GenerationReport,
}

pub struct WorkbookGenerator<'a> {
    options: GeneratorOptions,
    calendar: &'a dyn HolidayCalendar,
}

impl<'a> WorkbookGenerator<'a> {
    pub fn new(options: GeneratorOptions, calendar: &'a dyn HolidayCalendar) -> Self {
        Self { options, calendar }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn generate(&self, months: &[MonthRecords]) -> Generation {
        let options = &self.options;
        let layout = MonthLayout::new(&options.tiers);
        let assembler = MonthSheetAssembler::new(
            &layout,
            options.capacity,
            self.calendar,
            options.label_policy,
        );

        let mut ordered: Vec<&MonthRecords> = months.iter().collect();
        ordered.sort_by_key(|m| m.month);

        let mut workbook = Workbook::new();
        let mut references = CrossSheetReferences::new();
        let mut report = GenerationReport::default();
        let mut seen = BTreeSet::new();

        for records in ordered {
            if !seen.insert(records.month) {
                warn!(month = %records.month, "duplicate month in input, skipping");
                report.skipped.push(records.month);
                continue;
            }
            let Some(month) = assembler.assemble(records) else {
                warn!(month = %records.month, "no dated rows, sheet omitted");
                report.skipped.push(records.month);
                continue;
            };

            if options.window.contains(month.month) {
                references.record(&month, &layout);
            } else {
                warn!(
                    month = %month.month,
                    window_start = %options.window.start,
                    "month outside fiscal window, not rolled up"
                );
                report.outside_window.push(month.month);
            }

            info!(sheet = %month.name, days = month.day_count(), "generated month sheet");
            report.months.push(month.month);
            workbook.sheets.push(month.to_sheet(&layout));
        }

        let summary = YearSummaryAssembler::new(
            &references,
            &options.tiers,
            options.capacity,
            options.window,
        )
        .assemble();

        let variance = if options.tiers.has_year_variance() {
            Some(YearVarianceAssembler::new(&summary, &options.tiers, options.capacity).assemble())
        } else {
            debug!("fewer than two non-budget tiers, no year variance sheet");
            None
        };

        info!(sheet = %summary.sheet.name, "generated year summary");
        workbook.sheets.push(summary.sheet);
        if let Some(sheet) = variance {
            info!(sheet = %sheet.name, "generated year variance");
            workbook.sheets.push(sheet);
        }

        Generation { workbook, report }
    }
}
