//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Datelike;
use tracing::{info, warn};
use yojitsu_core::{ConfigProvider, RunConfig};
use yojitsu_engine::{Generation, GeneratorOptions, WorkbookGenerator};
use yojitsu_input::LoadedInput;
use yojitsu_render::XlsxRenderer;

/// A configured, generated run ready to be written
pub struct Prepared {
    pub config: RunConfig,
    pub fiscal_year: i32,
    pub input: LoadedInput,
    pub generation: Generation,
}

impl Prepared {
    pub fn output_path(&self) -> PathBuf {
        self.config.output_path(self.fiscal_year)
    }
}

/// Load configuration, read the source and build the workbook model.
///
/// Configuration is validated before the source is opened.
pub fn prepare(provider: &dyn ConfigProvider) -> Result<Prepared> {
    let config = provider.load().context("invalid configuration")?;
    info!(
        capacity = config.capacity,
        start_month = config.start_month,
        source = %config.source.display(),
        "configuration loaded"
    );

    let input = yojitsu_input::load_file(&config.source)
        .with_context(|| format!("failed to read {}", config.source.display()))?;
    if input.months.is_empty() {
        warn!(source = %config.source.display(), "no dated rows found in any table");
    }

    let current_year = chrono::Local::now().year();
    let fiscal_year = config.fiscal_year(input.earliest_month(), current_year);
    let options = GeneratorOptions::from_config(&config, fiscal_year);
    let generation = WorkbookGenerator::new(options, &config.holidays).generate(&input.months);

    Ok(Prepared {
        config,
        fiscal_year,
        input,
        generation,
    })
}

/// Write the workbook (and optionally its JSON model); returns the workbook path
pub fn generate(provider: &dyn ConfigProvider, dump_layout: Option<&Path>) -> Result<PathBuf> {
    let prepared = prepare(provider)?;

    let output = prepared.output_path();
    XlsxRenderer::new()
        .render_to_file(&prepared.generation.workbook, &output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    // Only dumped once the workbook itself is on disk
    if let Some(path) = dump_layout {
        let json = serde_json::to_string_pretty(&prepared.generation.workbook)
            .context("failed to serialize workbook model")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote layout dump");
    }
    Ok(output)
}

/// Human-readable report of what `generate` would produce
pub fn check(provider: &dyn ConfigProvider) -> Result<String> {
    let prepared = prepare(provider)?;
    let report = &prepared.generation.report;
    let input = &prepared.input.report;

    let mut out = String::new();
    out.push_str(&format!("年度: {}年度\n", prepared.fiscal_year));
    out.push_str(&format!("出力先: {}\n", prepared.output_path().display()));
    out.push_str(&format!(
        "シート: {}\n",
        prepared.generation.workbook.sheet_names().join(", ")
    ));
    for error in &input.skipped {
        out.push_str(&format!("スキップ: {}\n", error));
    }
    for month in &report.skipped {
        out.push_str(&format!("スキップ: {}\n", month.label()));
    }
    for month in &report.outside_window {
        out.push_str(&format!("年度外: {}\n", month.label()));
    }
    for date in &input.duplicate_dates {
        out.push_str(&format!("重複日付: {}\n", date.format("%Y/%m/%d")));
    }
    Ok(out)
}
