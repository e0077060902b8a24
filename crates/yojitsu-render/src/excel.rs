//! Excel writer for comparison workbooks
//!
//! Translates the logical workbook model into an XLSX file:
//! - Month sheets: tier fills (Budget light blue, Forecast light green), variance columns
//!   light yellow, Saturday/Sunday/holiday weekday colours, frozen header and date columns
//! - Year Summary / Year Variance: block titles, headers and frozen month header
//! - Conditional formats: superseded Forecast/On-Hand rows turn gray when an actual is
//!   entered, negative variances turn red
//!
//! Every derived cell is written as a formula; Excel computes all values on open.

use std::collections::HashMap;
use std::path::Path;

use chrono::Datelike;
use rust_xlsxwriter::{
    ConditionalFormatFormula, ExcelDateTime, Format, FormatAlign, FormatBorder,
    Workbook as XlsxWorkbook, Worksheet, XlsxError,
};
use yojitsu_core::{
    Cell, CellEntry, CellRole, CellStyle, ConditionalAttribute, ConditionalRule, DayKind,
    Literal, RenderError, Renderer, Sheet, Tier, Workbook,
};

const BUDGET_FILL: u32 = 0xE6F2FF;
const FORECAST_FILL: u32 = 0xE6FFE6;
const VARIANCE_FILL: u32 = 0xFFFAD0;
const HEADER_FILL: u32 = 0xF2F2F2;
const SATURDAY_FILL: u32 = 0xDDEEFF;
const SATURDAY_FONT: u32 = 0x003366;
const HOLIDAY_FILL: u32 = 0xFFE5E5;
const HOLIDAY_FONT: u32 = 0x990000;
const SUPERSEDED_FILL: u32 = 0xDDDDDD;
const SUPERSEDED_FONT: u32 = 0x808080;
const NEGATIVE_FONT: u32 = 0xFF0000;

fn xlsx_error(e: XlsxError) -> RenderError {
    RenderError::Format(e.to_string())
}

/// XLSX writer for [`Workbook`]s
#[derive(Clone, Debug)]
pub struct XlsxRenderer {
    /// Number format of date cells
    pub date_format: String,
    /// Whether superseded/negative conditional formats are written
    pub conditional_formats: bool,
}

impl Default for XlsxRenderer {
    fn default() -> Self {
        Self {
            date_format: "yyyy/mm/dd".into(),
            conditional_formats: true,
        }
    }
}

impl XlsxRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the date number format
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Omit conditional formats (static colours only)
    pub fn no_conditional_formats(mut self) -> Self {
        self.conditional_formats = false;
        self
    }

    /// Generate XLSX bytes
    pub fn render_to_bytes(&self, workbook: &Workbook) -> Result<Vec<u8>, RenderError> {
        let mut xlsx = XlsxWorkbook::new();
        let mut formats = FormatCache::new(&self.date_format);

        for sheet in &workbook.sheets {
            let worksheet = xlsx.add_worksheet();
            worksheet.set_name(&sheet.name).map_err(xlsx_error)?;
            self.write_sheet(worksheet, sheet, &mut formats)?;
        }

        xlsx.save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    /// Write the workbook to a file
    pub fn render_to_file(&self, workbook: &Workbook, path: &Path) -> Result<(), RenderError> {
        let bytes = self.render(workbook)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn write_sheet(
        &self,
        worksheet: &mut Worksheet,
        sheet: &Sheet,
        formats: &mut FormatCache,
    ) -> Result<(), RenderError> {
        for (&col, &width) in &sheet.column_widths {
            worksheet.set_column_width(col, width).map_err(xlsx_error)?;
        }

        for (row, col, entry) in sheet.cells() {
            let format = formats.get(entry.style);
            write_cell(worksheet, row, col, entry, format)?;
        }

        if self.conditional_formats {
            for rule in &sheet.rules {
                write_rule(worksheet, rule)?;
            }
        }

        if let Some((row, col)) = sheet.freeze {
            worksheet.set_freeze_panes(row, col).map_err(xlsx_error)?;
        }
        Ok(())
    }
}

impl Renderer for XlsxRenderer {
    type Output = Vec<u8>;

    fn render(&self, workbook: &Workbook) -> Result<Vec<u8>, RenderError> {
        if workbook.sheets.is_empty() {
            return Err(RenderError::InvalidData("No sheets to render".into()));
        }
        self.render_to_bytes(workbook)
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    entry: &CellEntry,
    format: &Format,
) -> Result<(), RenderError> {
    match &entry.cell {
        Cell::Literal(Literal::Blank) => worksheet.write_blank(row, col, format),
        Cell::Literal(Literal::Number(n)) => worksheet.write_number_with_format(row, col, *n, format),
        Cell::Literal(Literal::Text(s)) => worksheet.write_string_with_format(row, col, s, format),
        Cell::Literal(Literal::Date(date)) => {
            let datetime =
                ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)
                    .map_err(xlsx_error)?;
            worksheet.write_datetime_with_format(row, col, &datetime, format)
        }
        Cell::Formula(formula) => {
            worksheet.write_formula_with_format(row, col, formula.to_excel().as_str(), format)
        }
    }
    .map_err(xlsx_error)?;
    Ok(())
}

fn write_rule(worksheet: &mut Worksheet, rule: &ConditionalRule) -> Result<(), RenderError> {
    let format = match rule.attribute {
        ConditionalAttribute::Superseded => Format::new()
            .set_background_color(SUPERSEDED_FILL)
            .set_font_color(SUPERSEDED_FONT),
        ConditionalAttribute::Negative => Format::new().set_font_color(NEGATIVE_FONT),
    };
    let condition = format!("={}", rule.condition);
    let conditional = ConditionalFormatFormula::new()
        .set_rule(condition.as_str())
        .set_format(format);

    let range = &rule.range;
    worksheet
        .add_conditional_format(
            range.first_row,
            range.first_col,
            range.last_row,
            range.last_col,
            &conditional,
        )
        .map_err(xlsx_error)?;
    Ok(())
}

// ============================================================================
// Formats
// ============================================================================

/// One [`Format`] per distinct logical style
struct FormatCache {
    date_format: String,
    formats: HashMap<CellStyle, Format>,
}

impl FormatCache {
    fn new(date_format: &str) -> Self {
        Self {
            date_format: date_format.to_string(),
            formats: HashMap::new(),
        }
    }

    fn get(&mut self, style: CellStyle) -> &Format {
        let date_format = &self.date_format;
        self.formats
            .entry(style)
            .or_insert_with(|| build_format(style, date_format))
    }
}

fn tier_fill(tier: Tier) -> Option<u32> {
    match tier {
        Tier::Budget => Some(BUDGET_FILL),
        Tier::Forecast => Some(FORECAST_FILL),
        Tier::OnHand | Tier::Actual => None,
    }
}

fn build_format(style: CellStyle, date_format: &str) -> Format {
    let mut format = Format::new().set_border(FormatBorder::Thin);

    match style.role {
        CellRole::Title => {
            format = Format::new().set_bold().set_font_size(12);
        }
        CellRole::Header => {
            format = format
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(HEADER_FILL)
                .set_border_top(FormatBorder::Medium)
                .set_border_bottom(FormatBorder::Medium);
        }
        CellRole::Label => {}
        CellRole::Date => {
            format = format.set_num_format(date_format);
        }
        CellRole::Weekday(kind) => {
            format = format.set_align(FormatAlign::Center);
            format = match kind {
                DayKind::Weekday => format,
                DayKind::Saturday => format
                    .set_background_color(SATURDAY_FILL)
                    .set_font_color(SATURDAY_FONT),
                DayKind::SundayOrHoliday => format
                    .set_background_color(HOLIDAY_FILL)
                    .set_font_color(HOLIDAY_FONT),
            };
        }
        CellRole::Value => {
            if let Some(fill) = style.tier.and_then(tier_fill) {
                format = format.set_background_color(fill);
            }
        }
        CellRole::Variance => {
            format = format.set_background_color(VARIANCE_FILL);
        }
    }

    if let Some(display) = style.format {
        format = format.set_num_format(display.num_format());
    }
    if style.emphasized {
        format = format
            .set_bold()
            .set_border_top(FormatBorder::Medium)
            .set_border_bottom(FormatBorder::Medium);
    }
    format
}
