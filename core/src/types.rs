//! Shared primitive types used across every generation stage.
//!
//! Cohort, jurisdiction and category are closed enums. Any table keyed by
//! them is indexed through `index()`, so adding a variant is a compile-time
//! change everywhere a `match` branches on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// A stable, unique identifier for a simulated account (`PLR_0001_MA`).
pub type PlayerId = String;

/// Position of an entity in the population, 0-based.
pub type EntityIndex = usize;

// ── Risk cohort ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cohort {
    LowRisk,
    MediumRisk,
    HighRisk,
    Critical,
}

impl Cohort {
    pub const COUNT: usize = 4;
    pub const ALL: [Cohort; Cohort::COUNT] = [
        Cohort::LowRisk,
        Cohort::MediumRisk,
        Cohort::HighRisk,
        Cohort::Critical,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::LowRisk => 0,
            Self::MediumRisk => 1,
            Self::HighRisk => 2,
            Self::Critical => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowRisk => "low_risk",
            Self::MediumRisk => "medium_risk",
            Self::HighRisk => "high_risk",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cohort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cohort::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown cohort '{s}'"))
    }
}

/// One value per cohort, indexed by `Cohort`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortTable<T>([T; Cohort::COUNT]);

impl<T> CohortTable<T> {
    pub fn from_fn(f: impl FnMut(Cohort) -> T) -> Self {
        Self(Cohort::ALL.map(f))
    }

    pub fn from_array(values: [T; Cohort::COUNT]) -> Self {
        Self(values)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cohort, &T)> {
        Cohort::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Cohort> for CohortTable<T> {
    type Output = T;
    fn index(&self, cohort: Cohort) -> &T {
        &self.0[cohort.index()]
    }
}

impl<T> IndexMut<Cohort> for CohortTable<T> {
    fn index_mut(&mut self, cohort: Cohort) -> &mut T {
        &mut self.0[cohort.index()]
    }
}

// ── Jurisdiction ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Jurisdiction {
    MA,
    NJ,
    PA,
}

impl Jurisdiction {
    pub const COUNT: usize = 3;
    pub const ALL: [Jurisdiction; Jurisdiction::COUNT] =
        [Jurisdiction::MA, Jurisdiction::NJ, Jurisdiction::PA];

    pub fn index(self) -> usize {
        match self {
            Self::MA => 0,
            Self::NJ => 1,
            Self::PA => 2,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::MA => "MA",
            Self::NJ => "NJ",
            Self::PA => "PA",
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Jurisdiction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Jurisdiction::ALL
            .into_iter()
            .find(|j| j.code() == s)
            .ok_or_else(|| format!("unknown jurisdiction '{s}'"))
    }
}

// ── Sport category ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SportCategory {
    Nfl,
    Nba,
    Mlb,
    Nhl,
    Soccer,
    Mma,
    Tennis,
    TableTennis,
}

impl SportCategory {
    pub const COUNT: usize = 8;
    pub const ALL: [SportCategory; SportCategory::COUNT] = [
        SportCategory::Nfl,
        SportCategory::Nba,
        SportCategory::Mlb,
        SportCategory::Nhl,
        SportCategory::Soccer,
        SportCategory::Mma,
        SportCategory::Tennis,
        SportCategory::TableTennis,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Nfl => 0,
            Self::Nba => 1,
            Self::Mlb => 2,
            Self::Nhl => 3,
            Self::Soccer => 4,
            Self::Mma => 5,
            Self::Tennis => 6,
            Self::TableTennis => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nfl => "NFL",
            Self::Nba => "NBA",
            Self::Mlb => "MLB",
            Self::Nhl => "NHL",
            Self::Soccer => "SOCCER",
            Self::Mma => "MMA",
            Self::Tennis => "TENNIS",
            Self::TableTennis => "TABLE_TENNIS",
        }
    }

    /// Market tier: 1.0 for the four major leagues, down to 0.2 for the
    /// thinnest niche market.
    pub fn tier(self) -> f64 {
        match self {
            Self::Nfl | Self::Nba | Self::Mlb | Self::Nhl => 1.0,
            Self::Soccer => 0.7,
            Self::Mma | Self::Tennis => 0.5,
            Self::TableTennis => 0.2,
        }
    }

    pub fn is_major(self) -> bool {
        self.tier() >= 1.0
    }
}

impl fmt::Display for SportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SportCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SportCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown sport category '{s}'"))
    }
}

// ── Market type (sub-category) ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Moneyline,
    Spread,
    Total,
    Prop,
    Parlay,
}

impl MarketType {
    pub const COUNT: usize = 5;
    pub const ALL: [MarketType; MarketType::COUNT] = [
        MarketType::Moneyline,
        MarketType::Spread,
        MarketType::Total,
        MarketType::Prop,
        MarketType::Parlay,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Moneyline => 0,
            Self::Spread => 1,
            Self::Total => 2,
            Self::Prop => 3,
            Self::Parlay => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Moneyline => "moneyline",
            Self::Spread => "spread",
            Self::Total => "total",
            Self::Prop => "prop",
            Self::Parlay => "parlay",
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarketType::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown market type '{s}'"))
    }
}

// ── Outcome ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(Self::Win),
            "loss" => Ok(Self::Loss),
            other => Err(format!("unknown outcome '{other}'")),
        }
    }
}

// ── Assessment scores and behavioural metrics ──────────────────────

/// The four psychometric scores carried by an assessment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentScore {
    SensitivityToLoss,
    SensitivityToReward,
    RiskTolerance,
    DecisionConsistency,
}

impl AssessmentScore {
    pub const ALL: [AssessmentScore; 4] = [
        AssessmentScore::SensitivityToLoss,
        AssessmentScore::SensitivityToReward,
        AssessmentScore::RiskTolerance,
        AssessmentScore::DecisionConsistency,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SensitivityToLoss => "sensitivity_to_loss",
            Self::SensitivityToReward => "sensitivity_to_reward",
            Self::RiskTolerance => "risk_tolerance",
            Self::DecisionConsistency => "decision_consistency",
        }
    }

    /// Position of the latent factor behind this score. Sensitivity to
    /// reward is derived from risk tolerance and has none of its own.
    pub fn latent_index(self) -> Option<usize> {
        match self {
            Self::SensitivityToLoss => Some(0),
            Self::RiskTolerance => Some(1),
            Self::DecisionConsistency => Some(2),
            Self::SensitivityToReward => None,
        }
    }
}

impl fmt::Display for AssessmentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-entity quantities derived from an event history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorMetric {
    /// Share of events placed directly after a loss.
    AfterLossRatio,
    /// Events placed directly after a loss, per week of the window.
    AfterLossPerWeek,
    /// Mean stake after a loss over mean stake after a win.
    EscalationRatio,
    /// Share of events placed between 02:00 and 05:59.
    LateHourFraction,
    /// Mean market tier of the categories bet on.
    MeanMarketTier,
}

impl BehaviorMetric {
    pub const ALL: [BehaviorMetric; 5] = [
        BehaviorMetric::AfterLossRatio,
        BehaviorMetric::AfterLossPerWeek,
        BehaviorMetric::EscalationRatio,
        BehaviorMetric::LateHourFraction,
        BehaviorMetric::MeanMarketTier,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AfterLossRatio => "after_loss_ratio",
            Self::AfterLossPerWeek => "after_loss_per_week",
            Self::EscalationRatio => "escalation_ratio",
            Self::LateHourFraction => "late_hour_fraction",
            Self::MeanMarketTier => "mean_market_tier",
        }
    }
}

impl fmt::Display for BehaviorMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_ordered() {
        for (i, c) in Cohort::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
        for (i, c) in SportCategory::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
        assert!(Cohort::LowRisk < Cohort::Critical);
    }

    #[test]
    fn tokens_round_trip_through_from_str() {
        for c in SportCategory::ALL {
            assert_eq!(c.as_str().parse::<SportCategory>().unwrap(), c);
        }
        for c in Cohort::ALL {
            assert_eq!(c.to_string().parse::<Cohort>().unwrap(), c);
        }
        assert!("XX".parse::<Jurisdiction>().is_err());
    }

    #[test]
    fn serde_tokens_match_csv_tokens() {
        let json = serde_json::to_string(&SportCategory::TableTennis).unwrap();
        assert_eq!(json, "\"TABLE_TENNIS\"");
        let json = serde_json::to_string(&Cohort::MediumRisk).unwrap();
        assert_eq!(json, "\"medium_risk\"");
    }

    #[test]
    fn cohort_table_indexes_by_variant() {
        let mut t = CohortTable::from_fn(|c| c.index() * 10);
        assert_eq!(t[Cohort::HighRisk], 20);
        t[Cohort::HighRisk] = 7;
        assert_eq!(t.iter().map(|(_, v)| *v).sum::<usize>(), 10 + 7 + 30);
    }
}
