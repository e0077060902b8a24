//! Run configuration
//!
//! A [`ConfigProvider`] collects raw settings from wherever it reads them (file,
//! environment, flags) into a [`RawConfig`]; [`RawConfig::validate`] turns that into a
//! typed [`RunConfig`] or a [`ConfigError`] before any input is read.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calendar::{HolidaySet, HolidaySource, LabelPolicy};
use crate::period::{FiscalWindow, YearMonth};
use crate::tier::{Tier, TierLayout};

/// Configuration error; always fatal
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("capacity is not configured")]
    MissingCapacity,

    #[error("capacity must be a positive integer, got {0}")]
    InvalidCapacity(i64),

    #[error("start month is not configured")]
    MissingStartMonth,

    #[error("start month must be between 1 and 12, got {0}")]
    InvalidStartMonth(i64),

    #[error("source file is not configured")]
    MissingSource,

    #[error("invalid tier layout: {0}")]
    InvalidTiers(String),

    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file: {0}")]
    Parse(String),
}

/// Tier layout as written in configuration: a preset name or an explicit list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TierSetting {
    Preset(String),
    List(Vec<String>),
}

impl TierSetting {
    pub fn to_layout(&self) -> Result<TierLayout, ConfigError> {
        match self {
            TierSetting::Preset(name) => match name.trim().to_lowercase().as_str() {
                "four" | "4" => Ok(TierLayout::four_tier()),
                "three" | "3" => Ok(TierLayout::three_tier()),
                other => Err(ConfigError::InvalidTiers(format!("unknown preset '{}'", other))),
            },
            TierSetting::List(names) => {
                let tiers = names
                    .iter()
                    .map(|n| n.parse::<Tier>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(ConfigError::InvalidTiers)?;
                TierLayout::from_tiers(&tiers).map_err(ConfigError::InvalidTiers)
            }
        }
    }
}

/// Unvalidated settings; every field may be missing
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub capacity: Option<i64>,
    pub start_month: Option<i64>,
    pub source: Option<PathBuf>,
    pub fiscal_year: Option<i32>,
    pub output: Option<PathBuf>,
    pub tiers: Option<TierSetting>,
    pub label_policy: Option<LabelPolicy>,
    pub holidays: Option<HolidaySource>,
    pub extra_holidays: Vec<NaiveDate>,
}

impl RawConfig {
    /// Overlay `other` on top of `self`; set fields of `other` win
    pub fn merge(mut self, other: RawConfig) -> Self {
        self.capacity = other.capacity.or(self.capacity);
        self.start_month = other.start_month.or(self.start_month);
        self.source = other.source.or(self.source);
        self.fiscal_year = other.fiscal_year.or(self.fiscal_year);
        self.output = other.output.or(self.output);
        self.tiers = other.tiers.or(self.tiers);
        self.label_policy = other.label_policy.or(self.label_policy);
        self.holidays = other.holidays.or(self.holidays);
        self.extra_holidays.extend(other.extra_holidays);
        self
    }

    /// Check required fields and ranges
    pub fn validate(self) -> Result<RunConfig, ConfigError> {
        let capacity = match self.capacity {
            None => return Err(ConfigError::MissingCapacity),
            Some(c) if c <= 0 || c > u32::MAX as i64 => {
                return Err(ConfigError::InvalidCapacity(c))
            }
            Some(c) => c as u32,
        };
        let start_month = match self.start_month {
            None => return Err(ConfigError::MissingStartMonth),
            Some(m) if !(1..=12).contains(&m) => return Err(ConfigError::InvalidStartMonth(m)),
            Some(m) => m as u32,
        };
        let source = self.source.ok_or(ConfigError::MissingSource)?;
        let tiers = match &self.tiers {
            Some(setting) => setting.to_layout()?,
            None => TierLayout::default(),
        };

        Ok(RunConfig {
            capacity,
            start_month,
            source,
            fiscal_year: self.fiscal_year,
            output: self.output,
            tiers,
            label_policy: self.label_policy.unwrap_or_default(),
            holidays: HolidaySet::new(self.holidays.unwrap_or_default(), self.extra_holidays),
        })
    }
}

/// Validated configuration for one generation run
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub capacity: u32,
    pub start_month: u32,
    pub source: PathBuf,
    pub fiscal_year: Option<i32>,
    pub output: Option<PathBuf>,
    pub tiers: TierLayout,
    pub label_policy: LabelPolicy,
    pub holidays: HolidaySet,
}

impl RunConfig {
    /// Fiscal start year: explicit setting, then a year in the source file name, then the
    /// earliest retained month, then `fallback_year`.
    pub fn fiscal_year(&self, earliest: Option<YearMonth>, fallback_year: i32) -> i32 {
        if let Some(year) = self.fiscal_year {
            return year;
        }
        if let Some(year) = year_in_file_name(&self.source) {
            return year;
        }
        match earliest {
            Some(month) => FiscalWindow::fiscal_year_of(month, self.start_month),
            None => fallback_year,
        }
    }

    pub fn window(&self, fiscal_year: i32) -> FiscalWindow {
        FiscalWindow::new(fiscal_year, self.start_month)
    }

    /// Configured output path, or `予実管理表_<year>年度.xlsx`
    pub fn output_path(&self, fiscal_year: i32) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_output_name(fiscal_year)))
    }
}

pub fn default_output_name(fiscal_year: i32) -> String {
    format!("予実管理表_{}年度.xlsx", fiscal_year)
}

/// First `20xx` year embedded in a file name
pub fn year_in_file_name(path: &Path) -> Option<i32> {
    let name = path.file_name()?.to_string_lossy();
    let re = Regex::new(r"20\d{2}").ok()?;
    re.find(&name).and_then(|m| m.as_str().parse().ok())
}

/// Source of a [`RunConfig`]
pub trait ConfigProvider {
    fn load(&self) -> Result<RunConfig, ConfigError>;
}

impl ConfigProvider for RawConfig {
    fn load(&self) -> Result<RunConfig, ConfigError> {
        self.clone().validate()
    }
}
