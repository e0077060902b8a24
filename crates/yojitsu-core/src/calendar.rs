//! Holiday calendars and weekday labels
//!
//! Day rows carry a Japanese weekday label (`月` … `日`). Holidays are supplied through the
//! [`HolidayCalendar`] trait; [`JapaneseHolidays`] implements the national holiday law
//! (fixed dates, Happy Monday rules, equinoxes, substitute holidays and the sandwiched
//! "citizens' holiday").

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Holiday predicate injected into day-row construction
pub trait HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

/// Calendar without holidays
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// Japanese national holidays
#[derive(Clone, Copy, Debug, Default)]
pub struct JapaneseHolidays;

impl HolidayCalendar for JapaneseHolidays {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        is_national_holiday(date) || is_substitute_holiday(date) || is_citizens_holiday(date)
    }
}

/// Built-in holiday rule set selectable from configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidaySource {
    #[default]
    Japan,
    None,
}

impl FromStr for HolidaySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "japan" | "jp" => Ok(HolidaySource::Japan),
            "none" => Ok(HolidaySource::None),
            other => Err(format!("unknown holiday calendar '{}'", other)),
        }
    }
}

/// A built-in rule set plus explicitly configured dates
#[derive(Clone, Debug, Default)]
pub struct HolidaySet {
    pub source: HolidaySource,
    pub extra: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    pub fn new(source: HolidaySource, extra: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            source,
            extra: extra.into_iter().collect(),
        }
    }
}

impl HolidayCalendar for HolidaySet {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        if self.extra.contains(&date) {
            return true;
        }
        match self.source {
            HolidaySource::Japan => JapaneseHolidays.is_holiday(date),
            HolidaySource::None => false,
        }
    }
}

// ============================================================================
// Japanese holiday rules
// ============================================================================

fn nth_monday(year: i32, month: u32, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Mon, n)
}

fn equinox_day(year: i32, base: f64) -> u32 {
    let offset = (year - 1980) as f64;
    (base + 0.242194 * offset - (offset / 4.0).floor()).floor() as u32
}

/// Vernal equinox day in March (approximation valid 1980-2099)
fn vernal_equinox(year: i32) -> u32 {
    equinox_day(year, 20.8431)
}

/// Autumnal equinox day in September (approximation valid 1980-2099)
fn autumnal_equinox(year: i32) -> u32 {
    equinox_day(year, 23.2488)
}

fn is_national_holiday(date: NaiveDate) -> bool {
    let (y, m, d) = (date.year(), date.month(), date.day());
    let is_nth_monday = |n: u8| nth_monday(y, m, n) == Some(date);

    match m {
        1 => d == 1 || if y >= 2000 { is_nth_monday(2) } else { d == 15 },
        2 => d == 11 || (y >= 2020 && d == 23),
        3 => d == vernal_equinox(y),
        4 => d == 29,
        5 => matches!(d, 3..=5) || (y == 2019 && d == 1),
        7 => match y {
            2020 => d == 23 || d == 24,
            2021 => d == 22 || d == 23,
            y if y >= 2003 => is_nth_monday(3),
            y if y >= 1996 => d == 20,
            _ => false,
        },
        8 => match y {
            2020 => d == 10,
            2021 => d == 8,
            y if y >= 2016 => d == 11,
            _ => false,
        },
        9 => {
            let aged = if y >= 2003 { is_nth_monday(3) } else { d == 15 };
            aged || d == autumnal_equinox(y)
        }
        10 => match y {
            2020 | 2021 => false,
            2019 => d == 22 || is_nth_monday(2),
            y if y >= 2000 => is_nth_monday(2),
            _ => d == 10,
        },
        11 => d == 3 || d == 23,
        12 => (1989..=2018).contains(&y) && d == 23,
        _ => false,
    }
}

/// A holiday falling on Sunday moves to the next day that is not itself a holiday
fn is_substitute_holiday(date: NaiveDate) -> bool {
    if is_national_holiday(date) {
        return false;
    }
    let mut day = date - Duration::days(1);
    while is_national_holiday(day) {
        if day.weekday() == Weekday::Sun {
            return true;
        }
        day -= Duration::days(1);
    }
    false
}

/// A weekday sandwiched between two national holidays is itself a holiday
fn is_citizens_holiday(date: NaiveDate) -> bool {
    date.weekday() != Weekday::Sun
        && !is_national_holiday(date)
        && is_national_holiday(date - Duration::days(1))
        && is_national_holiday(date + Duration::days(1))
}

// ============================================================================
// Day labels
// ============================================================================

/// Holiday marker appended to (or replacing) the weekday label
pub const HOLIDAY_MARKER: &str = "祝";

/// How a holiday is shown in the weekday column
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPolicy {
    /// `土・祝`
    #[default]
    Append,
    /// `祝`
    Override,
}

impl FromStr for LabelPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(LabelPolicy::Append),
            "override" => Ok(LabelPolicy::Override),
            other => Err(format!("unknown label policy '{}'", other)),
        }
    }
}

/// Logical day classification used for weekday highlighting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DayKind {
    Weekday,
    Saturday,
    SundayOrHoliday,
}

/// Japanese single-character weekday name
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
        Weekday::Sun => "日",
    }
}

/// Compose the weekday label for a date
pub fn weekday_label(date: NaiveDate, is_holiday: bool, policy: LabelPolicy) -> String {
    let name = weekday_name(date.weekday());
    match (is_holiday, policy) {
        (false, _) => name.to_string(),
        (true, LabelPolicy::Append) => format!("{}・{}", name, HOLIDAY_MARKER),
        (true, LabelPolicy::Override) => HOLIDAY_MARKER.to_string(),
    }
}

pub fn day_kind(date: NaiveDate, is_holiday: bool) -> DayKind {
    match date.weekday() {
        _ if is_holiday => DayKind::SundayOrHoliday,
        Weekday::Sun => DayKind::SundayOrHoliday,
        Weekday::Sat => DayKind::Saturday,
        _ => DayKind::Weekday,
    }
}
