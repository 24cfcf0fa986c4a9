//! The generation engine.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Population   (cohorts, jurisdictions, latent factors, demographics)
//!   2. Assessments  (from latent factors)
//!   3. Events       (per-entity state machines, from latent factors)
//!   4. Edge cases   (in-place replacement across all three tables)
//!   5. Validation   (optional, advisory)
//!
//! RULES:
//!   - All randomness flows through the RngBank, one slot per stage.
//!   - Assessments and events both read latent profiles; neither reads the
//!     other's output.
//!   - Validation draws no random numbers.

use crate::{
    assessment::{self, AssessmentRecord},
    behavior::{self, BetEvent},
    config::ValidatedConfig,
    edge_cases::{self, InjectionReport},
    population::{self, Population},
    rng::RngBank,
    types::{CohortTable, Outcome},
    util,
    validation::{self, ValidationReport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Population,
    Assessments,
    Events,
    EdgeCases,
    Validation,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Population => "population",
            Self::Assessments => "assessments",
            Self::Events => "events",
            Self::EdgeCases => "edge_cases",
            Self::Validation => "validation",
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct GeneratedData {
    pub population: Population,
    pub events: Vec<BetEvent>,
    pub assessments: Vec<AssessmentRecord>,
    pub injection: InjectionReport,
    /// `None` when validation was not requested.
    pub report: Option<ValidationReport>,
}

impl GeneratedData {
    pub fn summary(&self) -> RunSummary {
        RunSummary::of(&self.population, &self.events, self.assessments.len())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub players: usize,
    pub events: usize,
    pub assessments: usize,
    pub cohort_counts: CohortTable<usize>,
    /// Sum of all stakes.
    pub handle: f64,
    /// Players' combined result: winnings minus stakes lost.
    pub player_net: f64,
}

impl RunSummary {
    pub fn of(pop: &Population, events: &[BetEvent], assessments: usize) -> Self {
        let handle = events.iter().map(|e| e.amount).sum();
        let player_net = events
            .iter()
            .map(|e| match e.outcome {
                Outcome::Win => util::payout(e.amount, e.odds) - e.amount,
                Outcome::Loss => -e.amount,
            })
            .sum();
        Self {
            players: pop.len(),
            events: events.len(),
            assessments,
            cohort_counts: pop.cohort_counts(),
            handle,
            player_net,
        }
    }
}

pub struct GenerationEngine {
    cfg: ValidatedConfig,
    bank: RngBank,
    validate: bool,
}

impl GenerationEngine {
    pub fn new(cfg: ValidatedConfig) -> Self {
        let bank = RngBank::new(cfg.seed);
        Self {
            cfg,
            bank,
            validate: true,
        }
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.cfg
    }

    pub fn run(&self) -> GeneratedData {
        self.run_with_progress(|_, _| {})
    }

    /// Run every stage in order. `progress` is called once per finished
    /// stage with a short description of what it produced.
    pub fn run_with_progress(&self, mut progress: impl FnMut(Stage, &str)) -> GeneratedData {
        let cfg = &self.cfg;

        let mut population = population::generate_population(cfg, &self.bank);
        progress(Stage::Population, &format!("{} players", population.len()));

        let mut assessments = assessment::generate_assessments(
            &population.players,
            &population.profiles,
            cfg,
            &self.bank,
        );
        progress(Stage::Assessments, &format!("{} assessments", assessments.len()));

        let mut events = behavior::generate_events(&population, cfg, &self.bank);
        progress(Stage::Events, &format!("{} events", events.len()));

        let injection = edge_cases::inject_edge_cases(
            &mut population,
            &mut events,
            &mut assessments,
            cfg,
            &self.bank,
        );
        progress(
            Stage::EdgeCases,
            &format!(
                "{} applied, {} skipped overrides",
                injection.applied.len(),
                injection.skipped.len()
            ),
        );

        let report = if self.validate {
            let report =
                validation::validate(&population.players, &events, &assessments, cfg);
            progress(
                Stage::Validation,
                &format!(
                    "{}/{} checks passed",
                    report.checks.len() - report.failures().len(),
                    report.checks.len()
                ),
            );
            Some(report)
        } else {
            None
        };

        GeneratedData {
            population,
            events,
            assessments,
            injection,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::types::{MarketType, SportCategory};
    use chrono::NaiveDate;

    #[test]
    fn stages_report_in_order() {
        let cfg = GeneratorConfig::test_default(200).validate().unwrap();
        let mut seen = Vec::new();
        let data = GenerationEngine::new(cfg).run_with_progress(|stage, _| seen.push(stage));
        assert_eq!(
            seen,
            vec![
                Stage::Population,
                Stage::Assessments,
                Stage::Events,
                Stage::EdgeCases,
                Stage::Validation
            ]
        );
        assert_eq!(data.population.len(), 200);
        assert!(data.report.is_some());
    }

    #[test]
    fn validation_can_be_skipped() {
        let cfg = GeneratorConfig::test_default(50).validate().unwrap();
        let data = GenerationEngine::new(cfg).with_validation(false).run();
        assert!(data.report.is_none());
    }

    #[test]
    fn summary_nets_wins_against_losses() {
        let ts = NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        let bet = |amount, odds, outcome| BetEvent {
            bet_id: String::new(),
            player_id: "PLR_0001_MA".into(),
            timestamp: ts,
            category: SportCategory::Nfl,
            market_type: MarketType::Spread,
            amount,
            odds,
            outcome,
        };
        let events = vec![bet(100.0, 150, Outcome::Win), bet(50.0, -110, Outcome::Loss)];
        let s = RunSummary::of(&Population::default(), &events, 0);
        assert_eq!(s.handle, 150.0);
        assert!((s.player_net - 100.0).abs() < 1e-9);
    }
}
