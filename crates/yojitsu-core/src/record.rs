//! Budget input records

use chrono::NaiveDate;
use serde::Serialize;

use crate::metric::Metric;
use crate::period::YearMonth;

/// One validated source row: a date and its Budget-tier inputs
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetRecord {
    pub date: NaiveDate,
    pub rooms: Option<f64>,
    pub guests: Option<f64>,
    pub revenue: Option<f64>,
}

impl BudgetRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            rooms: None,
            guests: None,
            revenue: None,
        }
    }

    pub fn rooms(mut self, value: f64) -> Self {
        self.rooms = Some(value);
        self
    }

    pub fn guests(mut self, value: f64) -> Self {
        self.guests = Some(value);
        self
    }

    pub fn revenue(mut self, value: f64) -> Self {
        self.revenue = Some(value);
        self
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.date)
    }

    /// Input value of an additive metric; ratios are never stored
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Rooms => self.rooms,
            Metric::Guests => self.guests,
            Metric::RoomRevenue => self.revenue,
            _ => None,
        }
    }
}

/// Retained records of one calendar month, sorted by date without duplicates
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthRecords {
    pub month: YearMonth,
    pub records: Vec<BudgetRecord>,
}

impl MonthRecords {
    pub fn day_count(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_lookup() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let record = BudgetRecord::new(date).rooms(80.0).revenue(960_000.0);
        assert_eq!(record.value(Metric::Rooms), Some(80.0));
        assert_eq!(record.value(Metric::Guests), None);
        assert_eq!(record.value(Metric::RoomRevenue), Some(960_000.0));
        assert_eq!(record.value(Metric::Adr), None);
        assert_eq!(record.month(), YearMonth::new(2025, 4));
    }
}
