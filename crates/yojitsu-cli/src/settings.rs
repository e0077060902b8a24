//! Layered configuration
//!
//! Lowest to highest precedence: TOML file, environment, command-line flags. Clap already
//! resolves environment against flags, so only two layers are merged here.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Args;
use tracing::debug;
use yojitsu_core::{
    ConfigError, ConfigProvider, HolidaySource, LabelPolicy, RawConfig, RunConfig, TierSetting,
};

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "yojitsu.toml";

/// Settings shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Budget source (.xlsx, .xlsm, .xls, .ods or .csv)
    #[arg(value_name = "SOURCE")]
    pub source: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Total available rooms
    #[arg(long, env = "YOJITSU_CAPACITY", allow_negative_numbers = true)]
    pub capacity: Option<i64>,

    /// First month of the fiscal year (1-12)
    #[arg(long, env = "YOJITSU_START_MONTH", allow_negative_numbers = true)]
    pub start_month: Option<i64>,

    /// Fiscal start year (default: year in the source file name)
    #[arg(long)]
    pub fiscal_year: Option<i32>,

    /// Output workbook path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Tier layout: four, three, or a comma-separated list such as 予算,FC,実績
    #[arg(long)]
    pub tiers: Option<String>,

    /// Holiday label in the weekday column (append, override)
    #[arg(long)]
    pub label_policy: Option<LabelPolicy>,

    /// Holiday calendar (japan, none)
    #[arg(long)]
    pub holidays: Option<HolidaySource>,

    /// Additional holiday (YYYY-MM-DD); repeatable
    #[arg(long = "extra-holiday", value_name = "DATE")]
    pub extra_holidays: Vec<NaiveDate>,
}

impl ConfigArgs {
    /// Flag and environment layer
    pub fn to_raw(&self) -> RawConfig {
        RawConfig {
            capacity: self.capacity,
            start_month: self.start_month,
            source: self.source.clone(),
            fiscal_year: self.fiscal_year,
            output: self.output.clone(),
            tiers: self.tiers.as_deref().map(parse_tier_setting),
            label_policy: self.label_policy,
            holidays: self.holidays,
            extra_holidays: self.extra_holidays.clone(),
        }
    }

    /// Explicit `--config`, else `yojitsu.toml` in `dir` if present
    pub fn config_file(&self, dir: &Path) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(path.clone());
        }
        let default = dir.join(DEFAULT_CONFIG_FILE);
        default.is_file().then_some(default)
    }
}

fn parse_tier_setting(value: &str) -> TierSetting {
    if value.contains(',') {
        TierSetting::List(value.split(',').map(|s| s.trim().to_string()).collect())
    } else {
        TierSetting::Preset(value.trim().to_string())
    }
}

/// Read a TOML config file; relative paths in it resolve against its directory
pub fn read_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut raw: RawConfig =
        toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
    raw.source = raw.source.map(resolve);
    raw.output = raw.output.map(resolve);
    Ok(raw)
}

/// File layer overlaid by the flag/environment layer
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub file: Option<PathBuf>,
    pub overrides: RawConfig,
}

impl LayeredConfig {
    pub fn new(args: &ConfigArgs, working_dir: &Path) -> Self {
        Self {
            file: args.config_file(working_dir),
            overrides: args.to_raw(),
        }
    }

    pub fn merged(&self) -> Result<RawConfig, ConfigError> {
        let base = match &self.file {
            Some(path) => {
                debug!(path = %path.display(), "reading config file");
                read_config_file(path)?
            }
            None => RawConfig::default(),
        };
        Ok(base.merge(self.overrides.clone()))
    }
}

impl ConfigProvider for LayeredConfig {
    fn load(&self) -> Result<RunConfig, ConfigError> {
        self.merged()?.validate()
    }
}
