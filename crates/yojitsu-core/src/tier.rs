//! Data tiers and tier layouts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parallel data series for the same calendar day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Budget,
    Forecast,
    OnHand,
    Actual,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Budget => "予算",
            Tier::Forecast => "FC",
            Tier::OnHand => "OH",
            Tier::Actual => "実績",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "budget" | "予算" => Ok(Tier::Budget),
            "forecast" | "fc" => Ok(Tier::Forecast),
            "onhand" | "on-hand" | "on_hand" | "oh" => Ok(Tier::OnHand),
            "actual" | "実績" => Ok(Tier::Actual),
            other => Err(format!("unknown tier '{}'", other)),
        }
    }
}

/// Ordered `later − earlier` tier comparison
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TierPair {
    pub later: Tier,
    pub earlier: Tier,
}

impl TierPair {
    pub const fn new(later: Tier, earlier: Tier) -> Self {
        Self { later, earlier }
    }

    /// `FC-予算` style label used in month-sheet variance headers
    pub fn short_label(&self) -> String {
        format!("{}-{}", self.later.label(), self.earlier.label())
    }

    /// `FC − 予算` style title used for year variance blocks
    pub fn title(&self) -> String {
        format!("{} − {}", self.later.label(), self.earlier.label())
    }
}

/// Pairs rolled up by the year variance sheet, in block order
pub const YEAR_VARIANCE_PAIRS: [TierPair; 4] = [
    TierPair::new(Tier::Forecast, Tier::Budget),
    TierPair::new(Tier::Actual, Tier::Budget),
    TierPair::new(Tier::OnHand, Tier::Forecast),
    TierPair::new(Tier::Actual, Tier::Forecast),
];

/// The ordered set of tiers laid out in every sheet
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TierLayout {
    tiers: Vec<Tier>,
}

impl TierLayout {
    /// Budget, Forecast, On-Hand, Actual
    pub fn four_tier() -> Self {
        Self {
            tiers: vec![Tier::Budget, Tier::Forecast, Tier::OnHand, Tier::Actual],
        }
    }

    /// Budget, Forecast, Actual
    pub fn three_tier() -> Self {
        Self {
            tiers: vec![Tier::Budget, Tier::Forecast, Tier::Actual],
        }
    }

    /// Build a layout from an explicit list.
    ///
    /// The list must start with Budget and must not repeat a tier; tiers are put in
    /// canonical order.
    pub fn from_tiers(tiers: &[Tier]) -> Result<Self, String> {
        if tiers.first() != Some(&Tier::Budget) {
            return Err("tier list must start with Budget".into());
        }
        let mut sorted = tiers.to_vec();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != tiers.len() {
            return Err("tier list contains duplicates".into());
        }
        Ok(Self { tiers: sorted })
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn contains(&self, tier: Tier) -> bool {
        self.tiers.contains(&tier)
    }

    /// Tiers after Budget
    pub fn non_budget(&self) -> impl Iterator<Item = Tier> + '_ {
        self.tiers.iter().copied().filter(|t| *t != Tier::Budget)
    }

    /// Each tier paired with its predecessor in layout order
    pub fn adjacent_pairs(&self) -> Vec<TierPair> {
        self.tiers
            .windows(2)
            .map(|w| TierPair::new(w[1], w[0]))
            .collect()
    }

    /// Year variance pairs whose tiers are both present
    pub fn year_variance_pairs(&self) -> Vec<TierPair> {
        YEAR_VARIANCE_PAIRS
            .iter()
            .copied()
            .filter(|p| self.contains(p.later) && self.contains(p.earlier))
            .collect()
    }

    /// The year variance sheet needs at least two tiers besides Budget
    pub fn has_year_variance(&self) -> bool {
        self.non_budget().count() >= 2
    }
}

impl Default for TierLayout {
    fn default() -> Self {
        Self::four_tier()
    }
}
