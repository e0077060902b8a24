//! Header matching
//!
//! Headers are compared after normalization: trimmed, lowercased, whitespace removed.

use regex::Regex;
use yojitsu_core::Metric;

const DATE_HEADERS: [&str; 3] = ["日付", "宿泊日", "date"];

pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Column holding the stay date.
///
/// An exact match wins over a pattern match anywhere in the header row.
pub fn find_date_column(headers: &[String]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    if let Some(index) = normalized
        .iter()
        .position(|h| DATE_HEADERS.contains(&h.as_str()))
    {
        return Some(index);
    }
    let pattern = Regex::new(r"日\s*付").ok()?;
    headers.iter().zip(&normalized).position(|(raw, h)| {
        pattern.is_match(raw) || h.contains("宿泊日") || h.contains("date")
    })
}

fn metric_aliases(metric: Metric) -> &'static [&'static str] {
    match metric {
        Metric::Rooms => &["室数", "rooms"],
        Metric::Guests => &["人数", "guests"],
        Metric::RoomRevenue => &["宿泊売上", "revenue", "roomrevenue"],
        _ => &[],
    }
}

/// Column positions of the Budget input metrics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricColumns {
    pub rooms: Option<usize>,
    pub guests: Option<usize>,
    pub revenue: Option<usize>,
}

impl MetricColumns {
    pub fn resolve(headers: &[String]) -> Self {
        let find = |metric| {
            let aliases = metric_aliases(metric);
            headers
                .iter()
                .position(|h| aliases.contains(&normalize_header(h).as_str()))
        };
        Self {
            rooms: find(Metric::Rooms),
            guests: find(Metric::Guests),
            revenue: find(Metric::RoomRevenue),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_none() && self.guests.is_none() && self.revenue.is_none()
    }
}
