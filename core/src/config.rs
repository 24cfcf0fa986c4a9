use crate::{
    error::{ConfigError, GenResult},
    factor::{CorrelatedSampler, CorrelationMatrix},
    types::{
        AssessmentScore, BehaviorMetric, Cohort, CohortTable, Jurisdiction, MarketType,
        SportCategory,
    },
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Latent factor order: sensitivity to loss, risk tolerance, decision
/// consistency, target bet escalation.
pub const LATENT_DIM: usize = 4;

const SHARE_TOLERANCE: f64 = 1e-4;

// ── Simulation window ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationWindow {
    pub start_date: NaiveDate,
    pub days: u32,
    /// Assessments are dated up to this many days before `start_date`.
    pub assessment_lookback_days: u32,
}

impl SimulationWindow {
    pub fn start(&self) -> NaiveDateTime {
        self.start_date.and_time(NaiveTime::MIN)
    }

    /// Last representable second of the window (23:59:59 on the final day).
    pub fn end(&self) -> NaiveDateTime {
        self.start() + Duration::days(i64::from(self.days)) - Duration::seconds(1)
    }

    pub fn weeks(&self) -> f64 {
        f64::from(self.days) / 7.0
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        *ts >= self.start() && *ts <= self.end()
    }

    /// Elapsed fraction of the window at `ts`, in [0, 1].
    pub fn progress(&self, ts: &NaiveDateTime) -> f64 {
        let span = (self.end() - self.start()).num_seconds();
        if span <= 0 {
            return 1.0;
        }
        let elapsed = (*ts - self.start()).num_seconds();
        (elapsed as f64 / span as f64).clamp(0.0, 1.0)
    }
}

// ── Per-cohort behaviour ───────────────────────────────────────────

/// Late-window flat exploration over every category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationBranch {
    /// Exploration is only possible once progress exceeds this.
    pub after_progress: f64,
    pub probability: f64,
}

/// Shape of the niche boost: boost = progress^exponent × boost_scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftProfile {
    pub exponent: f64,
    pub boost_scale: f64,
    #[serde(default)]
    pub exploration: Option<ExplorationBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortProfile {
    /// Probability of chasing after a loss.
    pub chase_probability: (f64, f64),
    /// Clamp range for the target bet escalation ratio.
    pub escalation: (f64, f64),
    pub bets_per_week: (f64, f64),
    /// Baseline fraction of bets placed in the late-night window.
    pub late_hour: (f64, f64),
    pub base_amount: (f64, f64),
    pub win_rate: f64,
    #[serde(default)]
    pub drift: Option<DriftProfile>,
}

/// Ties one per-entity behaviour input to a latent factor. The input is
/// drawn at quantile Φ(weight·z + √(1 − weight²)·ε) of its cohort range,
/// where z is the entity's within-cohort standard score for `factor`.
/// The cohort marginal stays uniform over the range for any weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputCoupling {
    pub factor: AssessmentScore,
    /// In [-1, 1]. Zero draws the input independently of the latent.
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorCoupling {
    pub chase_probability: InputCoupling,
    pub bets_per_week: InputCoupling,
    pub late_hour: InputCoupling,
}

// ── Latent factors ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentConfig {
    pub correlation: Vec<Vec<f64>>,
    pub std_devs: Vec<f64>,
    pub means: BTreeMap<Cohort, Vec<f64>>,
}

// ── Assessment ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// Gaussian noise on the three latent-backed scores, in score points.
    pub noise_sd: f64,
    pub reward_risk_weight: f64,
    pub reward_noise_weight: f64,
    pub score_min: f64,
    pub score_max: f64,
    pub version: String,
}

// ── State machine ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachineConfig {
    pub min_escalation: f64,
    pub max_escalation_multiplier: f64,
    pub late_hour_cap: f64,
    /// Late-hour fraction grows by baseline × step per consecutive loss.
    pub late_hour_step: f64,
    pub chasing_gap_days: f64,
    pub normal_gap_days: f64,
    pub primetime_hour: f64,
    pub primetime_sd_hours: f64,
    /// Inclusive late-night hour window.
    pub late_window: (u32, u32),
    /// Inclusive clip range for primetime hours.
    pub day_hours: (u32, u32),
    pub min_amount: f64,
    pub normal_jitter: (f64, f64),
    pub chasing_jitter: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicsConfig {
    pub min_age: u32,
    pub max_age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCorrelation {
    pub score: AssessmentScore,
    pub metric: BehaviorMetric,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationThresholds {
    /// Acceptable events per entity; scaled by population for the count check.
    pub events_per_entity: (f64, f64),
    pub chi_square_p: f64,
    pub ks_p: f64,
    pub correlation_tolerance: f64,
    pub win_rate_tolerance: f64,
    pub cohort_share_tolerance: f64,
    pub jurisdiction_share_tolerance: f64,
}

// ── Top-level config ───────────────────────────────────────────────

/// Every tunable of a generation run. Deserialised from JSON; omitted
/// top-level sections fall back to [`GeneratorConfig::research_default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub population: usize,
    pub window: SimulationWindow,
    pub cohort_shares: BTreeMap<Cohort, f64>,
    pub jurisdiction_shares: BTreeMap<Jurisdiction, f64>,
    pub category_baseline: BTreeMap<SportCategory, f64>,
    pub market_type_weights: BTreeMap<MarketType, f64>,
    /// Share of the niche boost added to (or taken from) each category.
    pub drift_shifts: BTreeMap<SportCategory, f64>,
    pub cohort_profiles: BTreeMap<Cohort, CohortProfile>,
    pub coupling: BehaviorCoupling,
    pub latent: LatentConfig,
    pub assessment: AssessmentConfig,
    pub state_machine: StateMachineConfig,
    pub demographics: DemographicsConfig,
    pub target_correlations: Vec<TargetCorrelation>,
    pub validation: ValidationThresholds,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::research_default()
    }
}

impl GeneratorConfig {
    /// Research-grounded defaults: 10,000 accounts over a 90-day window
    /// starting 2026-01-01.
    pub fn research_default() -> Self {
        use Cohort::*;
        use SportCategory::*;

        let cohort_shares = BTreeMap::from([
            (LowRisk, 0.90),
            (MediumRisk, 0.08),
            (HighRisk, 0.015),
            (Critical, 0.005),
        ]);
        let jurisdiction_shares = BTreeMap::from([
            (Jurisdiction::MA, 0.40),
            (Jurisdiction::NJ, 0.35),
            (Jurisdiction::PA, 0.25),
        ]);
        let category_baseline = BTreeMap::from([
            (Nfl, 0.40),
            (Nba, 0.25),
            (Mlb, 0.15),
            (Nhl, 0.08),
            (Soccer, 0.06),
            (Mma, 0.03),
            (Tennis, 0.02),
            (TableTennis, 0.01),
        ]);
        let market_type_weights = BTreeMap::from([
            (MarketType::Moneyline, 0.45),
            (MarketType::Spread, 0.25),
            (MarketType::Total, 0.15),
            (MarketType::Prop, 0.10),
            (MarketType::Parlay, 0.05),
        ]);
        let drift_shifts = BTreeMap::from([
            (TableTennis, 0.50),
            (Mma, 0.25),
            (Tennis, 0.25),
            (Nfl, -0.40),
            (Nba, -0.30),
            (Mlb, -0.30),
        ]);

        let cohort_profiles = BTreeMap::from([
            (
                LowRisk,
                CohortProfile {
                    chase_probability: (0.05, 0.75),
                    escalation: (1.4, 2.0),
                    bets_per_week: (2.0, 5.0),
                    late_hour: (0.0, 0.20),
                    base_amount: (10.0, 50.0),
                    win_rate: 0.47,
                    drift: None,
                },
            ),
            (
                MediumRisk,
                CohortProfile {
                    chase_probability: (0.30, 0.80),
                    escalation: (1.4, 2.2),
                    bets_per_week: (10.0, 20.0),
                    late_hour: (0.10, 0.40),
                    base_amount: (25.0, 100.0),
                    win_rate: 0.45,
                    drift: Some(DriftProfile {
                        exponent: 1.5,
                        boost_scale: 0.12,
                        exploration: None,
                    }),
                },
            ),
            (
                HighRisk,
                CohortProfile {
                    chase_probability: (0.70, 0.95),
                    escalation: (2.0, 4.0),
                    bets_per_week: (35.0, 60.0),
                    late_hour: (0.35, 0.65),
                    base_amount: (50.0, 250.0),
                    win_rate: 0.35,
                    drift: Some(DriftProfile {
                        exponent: 2.0,
                        boost_scale: 0.35,
                        exploration: Some(ExplorationBranch {
                            after_progress: 0.7,
                            probability: 0.20,
                        }),
                    }),
                },
            ),
            (
                Critical,
                CohortProfile {
                    chase_probability: (0.85, 0.99),
                    escalation: (3.0, 7.0),
                    bets_per_week: (60.0, 90.0),
                    late_hour: (0.50, 0.70),
                    base_amount: (100.0, 500.0),
                    win_rate: 0.30,
                    drift: Some(DriftProfile {
                        exponent: 2.2,
                        boost_scale: 0.50,
                        exploration: Some(ExplorationBranch {
                            after_progress: 0.7,
                            probability: 0.35,
                        }),
                    }),
                },
            ),
        ]);

        let coupling = BehaviorCoupling {
            chase_probability: InputCoupling {
                factor: AssessmentScore::SensitivityToLoss,
                weight: 1.0,
            },
            bets_per_week: InputCoupling {
                factor: AssessmentScore::RiskTolerance,
                weight: 0.8,
            },
            late_hour: InputCoupling {
                factor: AssessmentScore::DecisionConsistency,
                weight: -0.62,
            },
        };

        let latent = LatentConfig {
            correlation: vec![
                vec![1.00, 0.30, -0.20, 0.72],
                vec![0.30, 1.00, -0.15, 0.58],
                vec![-0.20, -0.15, 1.00, -0.45],
                vec![0.72, 0.58, -0.45, 1.00],
            ],
            std_devs: vec![15.0, 12.0, 10.0, 0.5],
            means: BTreeMap::from([
                (LowRisk, vec![30.0, 35.0, 70.0, 1.0]),
                (MediumRisk, vec![50.0, 55.0, 50.0, 1.5]),
                (HighRisk, vec![70.0, 75.0, 35.0, 2.5]),
                (Critical, vec![85.0, 90.0, 20.0, 4.0]),
            ]),
        };

        Self {
            seed: 42,
            population: 10_000,
            window: SimulationWindow {
                start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or(NaiveDate::MIN),
                days: 90,
                assessment_lookback_days: 90,
            },
            cohort_shares,
            jurisdiction_shares,
            category_baseline,
            market_type_weights,
            drift_shifts,
            cohort_profiles,
            coupling,
            latent,
            assessment: AssessmentConfig {
                noise_sd: 5.0,
                reward_risk_weight: 0.6,
                reward_noise_weight: 0.4,
                score_min: 0.0,
                score_max: 100.0,
                version: "v3.2.1".into(),
            },
            state_machine: StateMachineConfig {
                min_escalation: 0.9,
                max_escalation_multiplier: 5.0,
                late_hour_cap: 0.70,
                late_hour_step: 0.5,
                chasing_gap_days: 0.3,
                normal_gap_days: 1.0,
                primetime_hour: 20.0,
                primetime_sd_hours: 3.0,
                late_window: (2, 5),
                day_hours: (6, 23),
                min_amount: 0.01,
                normal_jitter: (0.8, 1.2),
                chasing_jitter: (0.9, 1.1),
            },
            demographics: DemographicsConfig {
                min_age: 21,
                max_age: 75,
            },
            target_correlations: vec![
                TargetCorrelation {
                    score: AssessmentScore::SensitivityToLoss,
                    metric: BehaviorMetric::EscalationRatio,
                    target: 0.72,
                },
                TargetCorrelation {
                    score: AssessmentScore::RiskTolerance,
                    metric: BehaviorMetric::AfterLossPerWeek,
                    target: 0.58,
                },
                TargetCorrelation {
                    score: AssessmentScore::DecisionConsistency,
                    metric: BehaviorMetric::LateHourFraction,
                    target: -0.45,
                },
            ],
            validation: ValidationThresholds {
                events_per_entity: (45.0, 52.0),
                chi_square_p: 0.05,
                ks_p: 0.05,
                correlation_tolerance: 0.05,
                win_rate_tolerance: 0.07,
                cohort_share_tolerance: 0.01,
                jurisdiction_share_tolerance: 0.02,
            },
        }
    }

    /// Small populations for tests. The event-count band is widened because
    /// a few hundred entities cannot pin the per-entity mean as tightly.
    pub fn test_default(population: usize) -> Self {
        let mut cfg = Self::research_default().with_population(population);
        cfg.validation.events_per_entity = (35.0, 70.0);
        cfg
    }

    pub fn with_population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Read a JSON config file. Sections missing from the file keep their
    /// research defaults. The result is not yet validated.
    pub fn load(path: impl AsRef<Path>) -> GenResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let cfg: GeneratorConfig = serde_json::from_str(&content)?;
        log::debug!("Loaded generator config from {}", path.as_ref().display());
        Ok(cfg)
    }

    /// Check every table and build the indexed, generation-ready form.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        if self.population == 0 {
            return Err(ConfigError::InvalidParameter {
                what: "population".into(),
                value: 0.0,
            });
        }
        if self.window.days == 0 {
            return Err(ConfigError::InvalidParameter {
                what: "window.days".into(),
                value: 0.0,
            });
        }

        let cohort_shares = cohort_table("cohort_shares", &self.cohort_shares, |v| Ok(*v))?;
        check_distribution("cohort_shares", cohort_shares.iter().map(|(_, v)| *v))?;

        let jurisdiction_shares =
            Jurisdiction::ALL.map(|j| self.jurisdiction_shares.get(&j).copied().unwrap_or(0.0));
        check_distribution("jurisdiction_shares", jurisdiction_shares.iter().copied())?;

        let mut category_baseline = [0.0; SportCategory::COUNT];
        for category in SportCategory::ALL {
            category_baseline[category.index()] = *self
                .category_baseline
                .get(&category)
                .ok_or(ConfigError::MissingCategory {
                    table: "category_baseline",
                    category,
                })?;
        }
        check_distribution("category_baseline", category_baseline.iter().copied())?;

        let market_type_weights =
            MarketType::ALL.map(|m| self.market_type_weights.get(&m).copied().unwrap_or(0.0));
        check_distribution("market_type_weights", market_type_weights.iter().copied())?;

        let drift_shifts =
            SportCategory::ALL.map(|c| self.drift_shifts.get(&c).copied().unwrap_or(0.0));

        let profiles = cohort_table("cohort_profiles", &self.cohort_profiles, |p| {
            check_profile(p)?;
            Ok(p.clone())
        })?;

        for (what, c) in [
            ("coupling.chase_probability", &self.coupling.chase_probability),
            ("coupling.bets_per_week", &self.coupling.bets_per_week),
            ("coupling.late_hour", &self.coupling.late_hour),
        ] {
            check_coupling(what, c)?;
        }

        let correlation = CorrelationMatrix::new(&self.latent.correlation)?;
        if correlation.dim() != LATENT_DIM {
            return Err(ConfigError::DimensionMismatch {
                what: "latent correlation matrix",
                expected: LATENT_DIM,
                actual: correlation.dim(),
            });
        }
        let latent_std_devs: [f64; LATENT_DIM] = self
            .latent
            .std_devs
            .as_slice()
            .try_into()
            .map_err(|_| ConfigError::DimensionMismatch {
                what: "latent std devs",
                expected: LATENT_DIM,
                actual: self.latent.std_devs.len(),
            })?;
        for (i, sd) in latent_std_devs.iter().enumerate() {
            if !(*sd > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    what: format!("latent.std_devs[{i}]"),
                    value: *sd,
                });
            }
        }
        let sampler = CorrelatedSampler::new(&correlation, &self.latent.std_devs)?;
        let latent_means = cohort_table("latent.means", &self.latent.means, |means| {
            let arr: [f64; LATENT_DIM] =
                means
                    .as_slice()
                    .try_into()
                    .map_err(|_| ConfigError::DimensionMismatch {
                        what: "latent means",
                        expected: LATENT_DIM,
                        actual: means.len(),
                    })?;
            Ok(arr)
        })?;

        check_state_machine(&self.state_machine)?;
        check_range(
            "demographics.age",
            (
                f64::from(self.demographics.min_age),
                f64::from(self.demographics.max_age),
            ),
        )?;
        check_range("validation.events_per_entity", self.validation.events_per_entity)?;
        if self.assessment.score_min >= self.assessment.score_max {
            return Err(ConfigError::InvalidRange {
                what: "assessment score".into(),
                min: self.assessment.score_min,
                max: self.assessment.score_max,
            });
        }

        Ok(ValidatedConfig {
            seed: self.seed,
            population: self.population,
            window: self.window.clone(),
            cohort_shares,
            jurisdiction_shares,
            category_baseline,
            market_type_weights,
            drift_shifts,
            profiles,
            coupling: self.coupling.clone(),
            sampler,
            latent_means,
            latent_std_devs,
            assessment: self.assessment.clone(),
            state_machine: self.state_machine.clone(),
            demographics: self.demographics.clone(),
            target_correlations: self.target_correlations.clone(),
            validation: self.validation.clone(),
            source: self.clone(),
        })
    }
}

fn cohort_table<V, T>(
    table: &'static str,
    map: &BTreeMap<Cohort, V>,
    mut convert: impl FnMut(&V) -> Result<T, ConfigError>,
) -> Result<CohortTable<T>, ConfigError> {
    let mut values = Vec::with_capacity(Cohort::COUNT);
    for cohort in Cohort::ALL {
        let raw = map
            .get(&cohort)
            .ok_or(ConfigError::MissingCohort { table, cohort })?;
        values.push(convert(raw)?);
    }
    let filled: [T; Cohort::COUNT] =
        values
            .try_into()
            .map_err(|v: Vec<T>| ConfigError::DimensionMismatch {
                what: table,
                expected: Cohort::COUNT,
                actual: v.len(),
            })?;
    Ok(CohortTable::from_array(filled))
}

fn check_distribution(
    table: &'static str,
    values: impl Iterator<Item = f64>,
) -> Result<(), ConfigError> {
    let mut total = 0.0;
    for v in values {
        if !(v >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                what: table.to_string(),
                value: v,
            });
        }
        total += v;
    }
    if (total - 1.0).abs() > SHARE_TOLERANCE {
        return Err(ConfigError::DistributionSum { table, total });
    }
    Ok(())
}

fn check_range(what: &str, (min, max): (f64, f64)) -> Result<(), ConfigError> {
    if !(min <= max) || min < 0.0 {
        return Err(ConfigError::InvalidRange {
            what: what.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

fn check_probability(what: &str, p: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ConfigError::InvalidParameter {
            what: what.to_string(),
            value: p,
        });
    }
    Ok(())
}

fn check_profile(p: &CohortProfile) -> Result<(), ConfigError> {
    check_range("chase_probability", p.chase_probability)?;
    check_range("escalation", p.escalation)?;
    check_range("bets_per_week", p.bets_per_week)?;
    check_range("late_hour", p.late_hour)?;
    check_range("base_amount", p.base_amount)?;
    check_probability("win_rate", p.win_rate)?;
    if let Some(drift) = &p.drift {
        if !(drift.exponent > 0.0) {
            return Err(ConfigError::InvalidParameter {
                what: "drift.exponent".into(),
                value: drift.exponent,
            });
        }
        if let Some(exploration) = &drift.exploration {
            check_probability("drift.exploration.probability", exploration.probability)?;
            check_probability("drift.exploration.after_progress", exploration.after_progress)?;
        }
    }
    Ok(())
}

fn check_coupling(what: &str, c: &InputCoupling) -> Result<(), ConfigError> {
    if c.factor.latent_index().is_none() {
        return Err(ConfigError::UnsupportedCoupling {
            what: what.to_string(),
            factor: c.factor,
        });
    }
    if !(-1.0..=1.0).contains(&c.weight) {
        return Err(ConfigError::InvalidParameter {
            what: format!("{what}.weight"),
            value: c.weight,
        });
    }
    Ok(())
}

fn check_state_machine(sm: &StateMachineConfig) -> Result<(), ConfigError> {
    for (what, gap) in [
        ("state_machine.chasing_gap_days", sm.chasing_gap_days),
        ("state_machine.normal_gap_days", sm.normal_gap_days),
        ("state_machine.max_escalation_multiplier", sm.max_escalation_multiplier),
        ("state_machine.min_amount", sm.min_amount),
    ] {
        if !(gap > 0.0) {
            return Err(ConfigError::InvalidParameter {
                what: what.into(),
                value: gap,
            });
        }
    }
    check_probability("state_machine.late_hour_cap", sm.late_hour_cap)?;
    for (what, (lo, hi)) in [
        ("state_machine.late_window", sm.late_window),
        ("state_machine.day_hours", sm.day_hours),
    ] {
        if lo > hi || hi > 23 {
            return Err(ConfigError::InvalidRange {
                what: what.into(),
                min: f64::from(lo),
                max: f64::from(hi),
            });
        }
    }
    check_range("state_machine.normal_jitter", sm.normal_jitter)?;
    check_range("state_machine.chasing_jitter", sm.chasing_jitter)?;
    Ok(())
}

/// A configuration that has passed [`GeneratorConfig::validate`], with every
/// keyed table flattened to enum-indexed arrays. Generation only accepts
/// this type.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub seed: u64,
    pub population: usize,
    pub window: SimulationWindow,
    pub cohort_shares: CohortTable<f64>,
    pub jurisdiction_shares: [f64; Jurisdiction::COUNT],
    pub category_baseline: [f64; SportCategory::COUNT],
    pub market_type_weights: [f64; MarketType::COUNT],
    pub drift_shifts: [f64; SportCategory::COUNT],
    pub profiles: CohortTable<CohortProfile>,
    pub coupling: BehaviorCoupling,
    pub sampler: CorrelatedSampler,
    pub latent_means: CohortTable<[f64; LATENT_DIM]>,
    pub latent_std_devs: [f64; LATENT_DIM],
    pub assessment: AssessmentConfig,
    pub state_machine: StateMachineConfig,
    pub demographics: DemographicsConfig,
    pub target_correlations: Vec<TargetCorrelation>,
    pub validation: ValidationThresholds,
    source: GeneratorConfig,
}

impl ValidatedConfig {
    pub fn source(&self) -> &GeneratorConfig {
        &self.source
    }

    /// Acceptable total event count for this population.
    pub fn event_count_range(&self) -> (usize, usize) {
        let n = self.population as f64;
        let (lo, hi) = self.validation.events_per_entity;
        ((lo * n).round() as usize, (hi * n).round() as usize)
    }

    /// Target event count for one entity at the given weekly rate.
    pub fn events_for_rate(&self, bets_per_week: f64) -> usize {
        (bets_per_week * f64::from(self.window.days) / 7.0)
            .floor()
            .max(0.0) as usize
    }

    /// Within-cohort standard scores (x − cohort mean) / sd of a latent
    /// draw. Exactly standard normal per factor before any clamping.
    pub fn standard_scores(&self, cohort: Cohort, latent: [f64; LATENT_DIM]) -> [f64; LATENT_DIM] {
        let means = &self.latent_means[cohort];
        std::array::from_fn(|k| (latent[k] - means[k]) / self.latent_std_devs[k])
    }

    /// Win rate expected from the configured cohort mix.
    pub fn expected_win_rate(&self) -> f64 {
        Cohort::ALL
            .iter()
            .map(|c| self.cohort_shares[*c] * self.profiles[*c].win_rate)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_default_validates() {
        let cfg = GeneratorConfig::research_default().validate().unwrap();
        assert_eq!(cfg.event_count_range(), (450_000, 520_000));
        assert_eq!(cfg.window.end().to_string(), "2026-03-31 23:59:59");
        assert_eq!(cfg.events_for_rate(7.0), 90);
        assert!((cfg.expected_win_rate() - 0.46575).abs() < 1e-9);
    }

    #[test]
    fn missing_cohort_is_reported() {
        let mut cfg = GeneratorConfig::research_default();
        cfg.cohort_profiles.remove(&Cohort::Critical);
        assert_eq!(
            cfg.validate().unwrap_err(),
            ConfigError::MissingCohort {
                table: "cohort_profiles",
                cohort: Cohort::Critical
            }
        );
    }

    #[test]
    fn shares_must_sum_to_one() {
        let mut cfg = GeneratorConfig::research_default();
        cfg.jurisdiction_shares.insert(Jurisdiction::PA, 0.30);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::DistributionSum {
                table: "jurisdiction_shares",
                ..
            })
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut cfg = GeneratorConfig::research_default();
        if let Some(p) = cfg.cohort_profiles.get_mut(&Cohort::HighRisk) {
            p.base_amount = (250.0, 50.0);
        }
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidRange { .. })));
    }

    #[test]
    fn coupling_must_name_a_latent_factor() {
        let mut cfg = GeneratorConfig::research_default();
        cfg.coupling.late_hour.factor = AssessmentScore::SensitivityToReward;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::UnsupportedCoupling { .. })
        ));

        let mut cfg = GeneratorConfig::research_default();
        cfg.coupling.bets_per_week.weight = 1.2;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidParameter { .. })));
    }

    #[test]
    fn progress_spans_the_window() {
        let cfg = GeneratorConfig::research_default().validate().unwrap();
        let w = &cfg.window;
        assert_eq!(w.progress(&w.start()), 0.0);
        assert_eq!(w.progress(&w.end()), 1.0);
        let mid = w.start() + Duration::days(45);
        assert!((w.progress(&mid) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn json_round_trip_and_partial_override() {
        let cfg = GeneratorConfig::research_default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);

        let partial: GeneratorConfig =
            serde_json::from_str(r#"{ "seed": 7, "population": 500 }"#).unwrap();
        assert_eq!(partial.seed, 7);
        assert_eq!(partial.population, 500);
        assert_eq!(partial.cohort_profiles, cfg.cohort_profiles);
    }
}
