//! Metric catalog
//!
//! Seven operating metrics: three additive inputs entered per day and four ratios derived
//! from them. The catalog owns the ratio formula templates and the guard policy that keeps a
//! ratio blank instead of letting it divide by a blank or zero operand.

use serde::{Deserialize, Serialize};

use crate::formula::Expr;

/// Operating metric
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    Rooms,
    Guests,
    RoomRevenue,
    Occupancy,
    Adr,
    Dor,
    RevPar,
}

/// Whether a metric is entered or computed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MetricKind {
    Input,
    DerivedRatio,
}

/// Number display of a metric
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DisplayFormat {
    /// `0.0%`
    Percent,
    /// `0.00`
    TwoDecimal,
    /// `#,##0`
    GroupedInteger,
}

impl DisplayFormat {
    pub fn num_format(self) -> &'static str {
        match self {
            DisplayFormat::Percent => "0.0%",
            DisplayFormat::TwoDecimal => "0.00",
            DisplayFormat::GroupedInteger => "#,##0",
        }
    }
}

/// Denominator of a ratio template
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Denominator {
    /// Another metric cell of the same tier
    Metric(Metric),
    /// The property's room capacity (scaled by day count at aggregate level)
    Capacity,
}

/// `numerator / denominator` template of a derived metric
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RatioTemplate {
    pub numerator: Metric,
    pub denominator: Denominator,
}

/// How a synthesized ratio protects itself from blank or zero operands
#[derive(Clone, Debug, PartialEq)]
pub enum Guard {
    /// Direct division; the operands are known to be present
    None,
    /// Blank when the numerator is blank, or a metric denominator is blank or zero
    BlankOperands,
    /// Blank when any of the given conditions holds
    When(Vec<Expr>),
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Rooms,
        Metric::Guests,
        Metric::RoomRevenue,
        Metric::Occupancy,
        Metric::Adr,
        Metric::Dor,
        Metric::RevPar,
    ];

    /// Metrics that are entered per day and summed at aggregate level
    pub const ADDITIVE: [Metric; 3] = [Metric::Rooms, Metric::Guests, Metric::RoomRevenue];

    pub const RATIOS: [Metric; 4] = [Metric::Occupancy, Metric::Adr, Metric::Dor, Metric::RevPar];

    /// Metrics that carry day-level and total-level tier variances
    pub const VARIANCE: [Metric; 3] = [Metric::Occupancy, Metric::Adr, Metric::RoomRevenue];

    pub fn kind(self) -> MetricKind {
        if self.is_additive() {
            MetricKind::Input
        } else {
            MetricKind::DerivedRatio
        }
    }

    pub fn is_additive(self) -> bool {
        matches!(self, Metric::Rooms | Metric::Guests | Metric::RoomRevenue)
    }

    /// Column/row label used in generated sheets
    pub fn label(self) -> &'static str {
        match self {
            Metric::Rooms => "室数",
            Metric::Guests => "人数",
            Metric::RoomRevenue => "宿泊売上",
            Metric::Occupancy => "OCC",
            Metric::Adr => "ADR",
            Metric::Dor => "DOR",
            Metric::RevPar => "RevPAR",
        }
    }

    /// Short label used in variance column headers
    pub fn variance_label(self) -> &'static str {
        match self {
            Metric::RoomRevenue => "売上",
            other => other.label(),
        }
    }

    pub fn display_format(self) -> DisplayFormat {
        match self {
            Metric::Occupancy => DisplayFormat::Percent,
            Metric::Dor => DisplayFormat::TwoDecimal,
            _ => DisplayFormat::GroupedInteger,
        }
    }

    /// Formula template for derived metrics, `None` for inputs
    pub fn ratio(self) -> Option<RatioTemplate> {
        let (numerator, denominator) = match self {
            Metric::Occupancy => (Metric::Rooms, Denominator::Capacity),
            Metric::Adr => (Metric::RoomRevenue, Denominator::Metric(Metric::Rooms)),
            Metric::Dor => (Metric::Guests, Denominator::Metric(Metric::Rooms)),
            Metric::RevPar => (Metric::RoomRevenue, Denominator::Capacity),
            _ => return None,
        };
        Some(RatioTemplate {
            numerator,
            denominator,
        })
    }
}

impl RatioTemplate {
    /// Metrics whose cells feed this ratio
    pub fn operands(&self) -> Vec<Metric> {
        match self.denominator {
            Denominator::Metric(m) => vec![self.numerator, m],
            Denominator::Capacity => vec![self.numerator],
        }
    }

    /// Synthesize the ratio from resolved operand expressions.
    ///
    /// `denominator` is the metric cell for metric denominators, or the capacity expression
    /// (`120`, `(120*30)`) for capacity denominators.
    pub fn formula(&self, numerator: Expr, denominator: Expr, guard: Guard) -> Expr {
        let value = numerator.clone() / denominator.clone();
        match guard {
            Guard::None => value,
            Guard::BlankOperands => {
                let mut conditions = vec![numerator.is_blank()];
                if let Denominator::Metric(_) = self.denominator {
                    conditions.push(denominator.clone().is_blank());
                    conditions.push(denominator.is_zero());
                }
                Expr::blank_if(Expr::or(conditions), value)
            }
            Guard::When(conditions) if conditions.is_empty() => value,
            Guard::When(conditions) => Expr::blank_if(Expr::or(conditions), value),
        }
    }
}
