//! Four-tier validation of generated (or re-read) datasets.
//!
//! TIERS:
//!   1. Count       : table sizes against the configuration.
//!   2. Quality     : identifiers, enumerated values, amounts, timestamps.
//!   3. Distribution: chi-square, K-S, win rate, cohort/jurisdiction mix.
//!   4. Correlation : assessment score vs derived behavioural metric.
//!
//! Failures are reported, never raised. Edge-case entities are boundary
//! configurations by construction and are left out of tiers 3 and 4.
//!
//! Tiers 3 and 4 compare against what the configuration implies for each
//! cohort: category mix at each event's window progress, score marginals
//! per cohort, and correlations inside cohorts.

use crate::{
    assessment::AssessmentRecord,
    behavior::BetEvent,
    config::ValidatedConfig,
    edge_cases, market_drift,
    population::{cohort_counts, jurisdiction_counts, Player},
    stats,
    types::{
        AssessmentScore, BehaviorMetric, Cohort, CohortTable, Jurisdiction, Outcome,
        SportCategory,
    },
    util,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

const LATE_HOURS: std::ops::Range<u32> = 2..6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckTier {
    Count,
    Quality,
    Distribution,
    Correlation,
}

impl CheckTier {
    pub const ALL: [CheckTier; 4] = [
        CheckTier::Count,
        CheckTier::Quality,
        CheckTier::Distribution,
        CheckTier::Correlation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Quality => "quality",
            Self::Distribution => "distribution",
            Self::Correlation => "correlation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub tier: CheckTier,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub checks: BTreeMap<String, CheckResult>,
}

impl ValidationReport {
    fn record(&mut self, name: impl Into<String>, tier: CheckTier, passed: bool, detail: String) {
        let name = name.into();
        if !passed {
            log::warn!("Validation check {name} failed: {detail}");
        }
        self.checks.insert(name, CheckResult { tier, passed, detail });
    }

    pub fn passed(&self) -> bool {
        self.checks.values().all(|c| c.passed)
    }

    pub fn tier_passed(&self, tier: CheckTier) -> bool {
        self.tier(tier).all(|(_, c)| c.passed)
    }

    pub fn tier(&self, tier: CheckTier) -> impl Iterator<Item = (&str, &CheckResult)> {
        self.checks
            .iter()
            .filter(move |(_, c)| c.tier == tier)
            .map(|(name, c)| (name.as_str(), c))
    }

    pub fn failures(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, c)| !c.passed)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.checks.get(name)
    }

    /// Name → pass/fail, the plain map consumers gate on.
    pub fn outcomes(&self) -> BTreeMap<&str, bool> {
        self.checks
            .iter()
            .map(|(name, c)| (name.as_str(), c.passed))
            .collect()
    }
}

// ── Per-entity metrics ─────────────────────────────────────────────

/// Behavioural metrics of one entity, computed over its events in
/// timestamp order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityMetrics {
    pub events: usize,
    pub after_loss_ratio: f64,
    pub after_loss_per_week: f64,
    /// `None` when the entity has no event after a loss or none after a win.
    pub escalation_ratio: Option<f64>,
    pub late_hour_fraction: f64,
    pub mean_market_tier: f64,
    pub win_rate: f64,
}

impl EntityMetrics {
    /// `weeks` is the length of the observation window.
    pub fn from_events(events: &[&BetEvent], weeks: f64) -> Self {
        let mut sorted: Vec<&BetEvent> = events.to_vec();
        sorted.sort_by_key(|e| e.timestamp);
        let n = sorted.len();

        let mut after_loss = Vec::new();
        let mut after_win = Vec::new();
        for pair in sorted.windows(2) {
            match pair[0].outcome {
                Outcome::Loss => after_loss.push(pair[1].amount),
                Outcome::Win => after_win.push(pair[1].amount),
            }
        }
        let escalation_ratio = if after_loss.is_empty() || after_win.is_empty() {
            None
        } else {
            Some(stats::mean(&after_loss) / stats::mean(&after_win).max(0.01))
        };

        let late = sorted.iter().filter(|e| LATE_HOURS.contains(&e.hour())).count();
        let wins = sorted.iter().filter(|e| e.outcome == Outcome::Win).count();
        let tiers: Vec<f64> = sorted.iter().map(|e| e.market_tier()).collect();

        Self {
            events: n,
            after_loss_ratio: after_loss.len() as f64 / n.saturating_sub(1).max(1) as f64,
            after_loss_per_week: after_loss.len() as f64 / weeks.max(f64::MIN_POSITIVE),
            escalation_ratio,
            late_hour_fraction: late as f64 / n.max(1) as f64,
            mean_market_tier: stats::mean(&tiers),
            win_rate: wins as f64 / n.max(1) as f64,
        }
    }

    pub fn metric(&self, which: BehaviorMetric) -> Option<f64> {
        match which {
            BehaviorMetric::AfterLossRatio => Some(self.after_loss_ratio),
            BehaviorMetric::AfterLossPerWeek => Some(self.after_loss_per_week),
            BehaviorMetric::EscalationRatio => self.escalation_ratio,
            BehaviorMetric::LateHourFraction => Some(self.late_hour_fraction),
            BehaviorMetric::MeanMarketTier => Some(self.mean_market_tier),
        }
    }
}

/// Metrics per entity that has at least one event.
pub fn entity_metrics(events: &[BetEvent], weeks: f64) -> HashMap<&str, EntityMetrics> {
    let mut grouped: HashMap<&str, Vec<&BetEvent>> = HashMap::new();
    for e in events {
        grouped.entry(e.player_id.as_str()).or_default().push(e);
    }
    grouped
        .into_iter()
        .map(|(id, evs)| (id, EntityMetrics::from_events(&evs, weeks)))
        .collect()
}

// ── Suite ──────────────────────────────────────────────────────────

/// Run all four tiers.
pub fn validate(
    players: &[Player],
    events: &[BetEvent],
    assessments: &[AssessmentRecord],
    cfg: &ValidatedConfig,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let edge_ids = edge_cases::edge_case_ids();

    count_checks(&mut report, players, events, assessments, cfg);
    quality_checks(&mut report, players, events, assessments, cfg);
    distribution_checks(&mut report, players, events, assessments, cfg, &edge_ids);
    correlation_checks(&mut report, players, events, assessments, cfg, &edge_ids);

    log::info!(
        "Validation: {}/{} checks passed",
        report.checks.len() - report.failures().len(),
        report.checks.len()
    );
    report
}

fn count_checks(
    report: &mut ValidationReport,
    players: &[Player],
    events: &[BetEvent],
    assessments: &[AssessmentRecord],
    cfg: &ValidatedConfig,
) {
    let tier = CheckTier::Count;
    report.record(
        "population_count",
        tier,
        players.len() == cfg.population,
        format!("{} players, expected {}", players.len(), cfg.population),
    );

    let (lo, hi) = cfg.event_count_range();
    report.record(
        "event_count_range",
        tier,
        (lo..=hi).contains(&events.len()),
        format!("{} events, expected [{lo}, {hi}]", events.len()),
    );

    let missing = edge_cases::missing_assessment_ids();
    let removed = players
        .iter()
        .filter(|p| missing.contains(&p.player_id))
        .count();
    let expected = players.len() - removed;
    report.record(
        "assessment_count",
        tier,
        assessments.len() == expected,
        format!(
            "{} assessments, expected {expected} ({removed} removed by edge cases)",
            assessments.len()
        ),
    );
}

fn quality_checks(
    report: &mut ValidationReport,
    players: &[Player],
    events: &[BetEvent],
    assessments: &[AssessmentRecord],
    cfg: &ValidatedConfig,
) {
    let tier = CheckTier::Quality;

    let null_ids = players.iter().filter(|p| p.player_id.trim().is_empty()).count()
        + events.iter().filter(|e| e.player_id.trim().is_empty()).count()
        + assessments.iter().filter(|a| a.player_id.trim().is_empty()).count();
    report.record(
        "no_null_player_ids",
        tier,
        null_ids == 0,
        format!("{null_ids} empty player ids"),
    );

    let unconfigured = players
        .iter()
        .filter(|p| cfg.jurisdiction_shares[p.jurisdiction.index()] <= 0.0)
        .count();
    report.record(
        "valid_jurisdictions",
        tier,
        unconfigured == 0,
        format!("{unconfigured} players in a jurisdiction with no configured share"),
    );

    let mismatched = players
        .iter()
        .filter(|p| {
            util::parse_player_id(&p.player_id).map(|(_, j)| j) != Some(p.jurisdiction)
        })
        .count();
    report.record(
        "player_id_jurisdiction",
        tier,
        mismatched == 0,
        format!("{mismatched} players whose id suffix and jurisdiction disagree"),
    );

    let bad_amounts = events
        .iter()
        .filter(|e| !(e.amount.is_finite() && e.amount > 0.0))
        .count();
    report.record(
        "valid_amounts",
        tier,
        bad_amounts == 0,
        format!("{bad_amounts} events with a non-positive amount"),
    );

    let mut bet_ids_ok = true;
    let mut previous: Option<u64> = None;
    for e in events {
        match util::parse_bet_id(&e.bet_id) {
            Some(n) if previous.map_or(true, |p| n > p) => previous = Some(n),
            _ => {
                bet_ids_ok = false;
                break;
            }
        }
    }
    report.record(
        "unique_bet_ids",
        tier,
        bet_ids_ok,
        "bet ids strictly increasing in table order".to_string(),
    );

    let known: HashSet<&str> = players.iter().map(|p| p.player_id.as_str()).collect();
    let orphans = events.iter().filter(|e| !known.contains(e.player_id.as_str())).count()
        + assessments
            .iter()
            .filter(|a| !known.contains(a.player_id.as_str()))
            .count();
    report.record(
        "events_reference_population",
        tier,
        orphans == 0,
        format!("{orphans} rows reference an unknown player"),
    );

    let outside = events
        .iter()
        .filter(|e| !cfg.window.contains(&e.timestamp))
        .count();
    report.record(
        "timestamps_in_window",
        tier,
        outside == 0,
        format!("{outside} events outside {} .. {}", cfg.window.start(), cfg.window.end()),
    );

    let mut last_seen: HashMap<&str, chrono::NaiveDateTime> = HashMap::new();
    let mut regressions = 0usize;
    for e in events {
        if let Some(prev) = last_seen.insert(e.player_id.as_str(), e.timestamp) {
            if e.timestamp < prev {
                regressions += 1;
            }
        }
    }
    report.record(
        "timestamps_monotonic",
        tier,
        regressions == 0,
        format!("{regressions} events earlier than the entity's previous event"),
    );

    let (lo, hi) = (cfg.assessment.score_min, cfg.assessment.score_max);
    let bad_scores = assessments
        .iter()
        .filter(|a| {
            AssessmentScore::ALL
                .iter()
                .any(|s| !(lo..=hi).contains(&a.score(*s)))
        })
        .count();
    report.record(
        "scores_in_range",
        tier,
        bad_scores == 0,
        format!("{bad_scores} assessments with a score outside [{lo}, {hi}]"),
    );

    let (min_age, max_age) = (cfg.demographics.min_age, cfg.demographics.max_age);
    let bad_ages = players
        .iter()
        .filter(|p| !(min_age..=max_age).contains(&p.age))
        .count();
    report.record(
        "valid_ages",
        tier,
        bad_ages == 0,
        format!("{bad_ages} players outside [{min_age}, {max_age}]"),
    );
}

/// Correlation check with the same small-sample widening as
/// [`share_within`], using the standard error (1 − ρ²)/√n.
fn correlation_within(observed: f64, target: f64, n: usize, tolerance: f64) -> bool {
    let se = (1.0 - target * target) / (n.max(1) as f64).sqrt();
    (observed - target).abs() <= tolerance.max(3.0 * se)
}

/// Share check that tolerates sampling noise on small populations: within
/// the configured tolerance or three standard errors, whichever is wider.
fn share_within(observed: f64, expected: f64, n: usize, tolerance: f64) -> bool {
    let se = (expected * (1.0 - expected) / n.max(1) as f64).sqrt();
    (observed - expected).abs() <= tolerance.max(3.0 * se)
}

fn distribution_checks(
    report: &mut ValidationReport,
    players: &[Player],
    events: &[BetEvent],
    assessments: &[AssessmentRecord],
    cfg: &ValidatedConfig,
    edge_ids: &HashSet<String>,
) {
    let tier = CheckTier::Distribution;
    let th = &cfg.validation;
    let cohort_of = regular_cohorts(players, edge_ids);

    // Every event is tested against the mix its cohort draws from at the
    // event's window progress.
    let mut observed = [0u64; SportCategory::COUNT];
    let mut expected = [0.0; SportCategory::COUNT];
    for e in events {
        let Some(cohort) = cohort_of.get(e.player_id.as_str()) else {
            continue;
        };
        observed[e.category.index()] += 1;
        let progress = cfg.window.progress(&e.timestamp);
        let mix = market_drift::expected_category_mix(cfg, *cohort, progress);
        for (acc, p) in expected.iter_mut().zip(mix) {
            *acc += p;
        }
    }
    match stats::chi_square_gof(&observed, &expected) {
        Some(r) => report.record(
            "category_distribution",
            tier,
            r.p_value > th.chi_square_p,
            format!(
                "chi2={:.3} dof={} p={:.4} n={}",
                r.statistic,
                r.dof,
                r.p_value,
                observed.iter().sum::<u64>()
            ),
        ),
        None => report.record(
            "category_distribution",
            tier,
            false,
            "no events from non-edge entities".to_string(),
        ),
    }

    let regular: Vec<(&AssessmentRecord, Cohort)> = assessments
        .iter()
        .filter_map(|a| cohort_of.get(a.player_id.as_str()).map(|c| (a, *c)))
        .collect();
    let cohorts: Vec<Cohort> = regular.iter().map(|(_, c)| *c).collect();
    for score in [
        AssessmentScore::SensitivityToLoss,
        AssessmentScore::RiskTolerance,
        AssessmentScore::DecisionConsistency,
    ] {
        let values: Vec<f64> = regular.iter().map(|(a, _)| a.score(score)).collect();
        let reference = score_reference(cfg, score, &cohorts);
        let name = format!("ks_{score}");
        match stats::ks_two_sample(&values, &reference) {
            Some(r) => report.record(
                name,
                tier,
                r.p_value > th.ks_p,
                format!("D={:.4} p={:.4} n={}", r.statistic, r.p_value, values.len()),
            ),
            None => report.record(name, tier, false, "no assessments".to_string()),
        }
    }

    let regular_events: Vec<&BetEvent> = events
        .iter()
        .filter(|e| !edge_ids.contains(&e.player_id))
        .collect();
    let wins = regular_events
        .iter()
        .filter(|e| e.outcome == Outcome::Win)
        .count();
    let win_rate = wins as f64 / regular_events.len().max(1) as f64;
    let expected = cfg.expected_win_rate();
    report.record(
        "win_rate",
        tier,
        !regular_events.is_empty() && (win_rate - expected).abs() <= th.win_rate_tolerance,
        format!("{win_rate:.4} vs {expected:.4} ±{}", th.win_rate_tolerance),
    );

    let n = players.len();
    let counts = cohort_counts(players);
    let off: Vec<String> = Cohort::ALL
        .iter()
        .filter(|c| {
            let share = counts[**c] as f64 / n.max(1) as f64;
            !share_within(share, cfg.cohort_shares[**c], n, th.cohort_share_tolerance)
        })
        .map(|c| c.to_string())
        .collect();
    report.record(
        "cohort_distribution",
        tier,
        n > 0 && off.is_empty(),
        format!("cohorts off target: [{}]", off.join(", ")),
    );

    let counts = jurisdiction_counts(players);
    let off: Vec<String> = Jurisdiction::ALL
        .iter()
        .filter(|j| {
            let share = counts[j.index()] as f64 / n.max(1) as f64;
            !share_within(
                share,
                cfg.jurisdiction_shares[j.index()],
                n,
                th.jurisdiction_share_tolerance,
            )
        })
        .map(|j| j.to_string())
        .collect();
    report.record(
        "jurisdiction_distribution",
        tier,
        n > 0 && off.is_empty(),
        format!("jurisdictions off target: [{}]", off.join(", ")),
    );
}

/// Cohort of every non-edge player, by id.
fn regular_cohorts<'a>(
    players: &'a [Player],
    edge_ids: &HashSet<String>,
) -> HashMap<&'a str, Cohort> {
    players
        .iter()
        .filter(|p| !edge_ids.contains(&p.player_id))
        .map(|p| (p.player_id.as_str(), p.cohort))
        .collect()
}

/// Deterministic reference sample for one score: per cohort, evenly spaced
/// quantiles of the latent mean plus assessment noise, clipped to the score
/// range like the scores themselves. One reference value per observed score.
fn score_reference(
    cfg: &ValidatedConfig,
    score: AssessmentScore,
    cohorts: &[Cohort],
) -> Vec<f64> {
    let Some(k) = score.latent_index() else {
        return Vec::new();
    };
    let a = &cfg.assessment;
    let sd = (cfg.latent_std_devs[k].powi(2) + a.noise_sd.powi(2)).sqrt();
    let counts = CohortTable::from_fn(|c| cohorts.iter().filter(|x| **x == c).count());
    let mut reference = Vec::with_capacity(cohorts.len());
    for (cohort, n) in counts.iter() {
        let mean = cfg.latent_means[cohort][k];
        reference.extend(
            stats::normal_quantile_sample(*n, mean, sd)
                .into_iter()
                .map(|v| util::clip(v, a.score_min, a.score_max)),
        );
    }
    reference
}

fn correlation_checks(
    report: &mut ValidationReport,
    players: &[Player],
    events: &[BetEvent],
    assessments: &[AssessmentRecord],
    cfg: &ValidatedConfig,
    edge_ids: &HashSet<String>,
) {
    let metrics = entity_metrics(events, cfg.window.weeks());
    let cohort_of = regular_cohorts(players, edge_ids);
    let tolerance = cfg.validation.correlation_tolerance;

    for target in &cfg.target_correlations {
        let mut groups = Vec::new();
        let mut scores = Vec::new();
        let mut values = Vec::new();
        for a in assessments {
            let Some(cohort) = cohort_of.get(a.player_id.as_str()) else {
                continue;
            };
            let Some(m) = metrics.get(a.player_id.as_str()) else {
                continue;
            };
            if let Some(v) = m.metric(target.metric) {
                groups.push(cohort.index());
                scores.push(a.score(target.score));
                values.push(v);
            }
        }

        // Targets describe the relationship inside a cohort.
        let name = format!("corr_{}_vs_{}", target.score, target.metric);
        match stats::pearson_within_groups(&groups, &scores, &values) {
            Some(r) => report.record(
                name,
                CheckTier::Correlation,
                correlation_within(r, target.target, scores.len(), tolerance),
                format!(
                    "r={r:.3} (pooled {}) target={:.2} ±{tolerance} n={}",
                    stats::pearson(&scores, &values)
                        .map_or_else(|| "n/a".to_string(), |p| format!("{p:.3}")),
                    target.target,
                    scores.len()
                ),
            ),
            None => report.record(
                name,
                CheckTier::Correlation,
                false,
                format!("correlation undefined over {} entities", scores.len()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MarketType;
    use chrono::NaiveDate;

    fn event(hour: u32, day: u32, amount: f64, outcome: Outcome, category: SportCategory) -> BetEvent {
        BetEvent {
            bet_id: String::new(),
            player_id: "PLR_0007_MA".into(),
            timestamp: NaiveDate::from_ymd_opt(2026, 1, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            category,
            market_type: MarketType::Moneyline,
            amount,
            odds: -110,
            outcome,
        }
    }

    #[test]
    fn metrics_follow_previous_outcome() {
        use Outcome::*;
        use SportCategory::*;
        // Deliberately out of order; metrics sort by timestamp.
        let evs = [
            event(20, 3, 40.0, Win, TableTennis),
            event(20, 1, 10.0, Loss, Nfl),
            event(3, 2, 30.0, Win, Nfl),
            event(4, 4, 10.0, Loss, Nfl),
        ];
        let refs: Vec<&BetEvent> = evs.iter().collect();
        let m = EntityMetrics::from_events(&refs, 2.0);
        // Sequence: L10, W30, W40, L10 → after loss: [30]; after win: [40, 10].
        assert_eq!(m.events, 4);
        assert!((m.after_loss_ratio - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.after_loss_per_week - 0.5).abs() < 1e-12);
        assert!((m.escalation_ratio.unwrap() - 30.0 / 25.0).abs() < 1e-12);
        assert!((m.late_hour_fraction - 0.5).abs() < 1e-12);
        assert!((m.mean_market_tier - 3.2 / 4.0).abs() < 1e-12);
        assert!((m.win_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn escalation_ratio_undefined_without_both_sides() {
        let evs = [
            event(12, 1, 10.0, Outcome::Loss, SportCategory::Nfl),
            event(12, 2, 20.0, Outcome::Loss, SportCategory::Nfl),
        ];
        let refs: Vec<&BetEvent> = evs.iter().collect();
        let m = EntityMetrics::from_events(&refs, 1.0);
        assert_eq!(m.escalation_ratio, None);
        assert_eq!(m.metric(BehaviorMetric::AfterLossPerWeek), Some(1.0));
        assert_eq!(m.metric(BehaviorMetric::EscalationRatio), None);

        let single = [event(12, 1, 10.0, Outcome::Win, SportCategory::Nfl)];
        let refs: Vec<&BetEvent> = single.iter().collect();
        assert_eq!(EntityMetrics::from_events(&refs, 1.0).after_loss_ratio, 0.0);
    }

    #[test]
    fn share_tolerance_widens_for_small_samples() {
        assert!(!share_within(0.88, 0.90, 100_000, 0.01));
        assert!(share_within(0.88, 0.90, 1_000, 0.01));
        assert!(share_within(0.905, 0.90, 100_000, 0.01));
    }

    #[test]
    fn correlation_tolerance_widens_for_small_samples() {
        assert!(correlation_within(-0.39, -0.45, 1_000, 0.05));
        assert!(!correlation_within(-0.39, -0.45, 100_000, 0.05));
        assert!(!correlation_within(0.60, 0.72, 1_000, 0.05));
    }

    fn player(index: usize, suffix: Jurisdiction, jurisdiction: Jurisdiction) -> Player {
        Player {
            player_id: util::player_id(index, suffix),
            first_name: "Ada".into(),
            last_name: "Quinn".into(),
            email: "ada.quinn@example.com".into(),
            age: 30,
            jurisdiction,
            cohort: Cohort::LowRisk,
        }
    }

    #[test]
    fn jurisdiction_must_be_configured() {
        use crate::config::GeneratorConfig;
        use Jurisdiction::*;
        let mut raw = GeneratorConfig::test_default(3);
        raw.jurisdiction_shares = BTreeMap::from([(MA, 0.5), (NJ, 0.5), (PA, 0.0)]);
        let cfg = raw.validate().unwrap();
        let players = [player(0, MA, MA), player(1, NJ, NJ), player(2, PA, PA)];

        let mut report = ValidationReport::default();
        quality_checks(&mut report, &players, &[], &[], &cfg);
        assert!(!report.get("valid_jurisdictions").unwrap().passed);
        assert!(report.get("player_id_jurisdiction").unwrap().passed);
    }

    #[test]
    fn id_suffix_mismatch_is_its_own_check() {
        use crate::config::GeneratorConfig;
        use Jurisdiction::*;
        let cfg = GeneratorConfig::test_default(2).validate().unwrap();
        let players = [player(0, MA, MA), player(1, MA, NJ)];

        let mut report = ValidationReport::default();
        quality_checks(&mut report, &players, &[], &[], &cfg);
        assert!(report.get("valid_jurisdictions").unwrap().passed);
        assert!(!report.get("player_id_jurisdiction").unwrap().passed);
    }

    #[test]
    fn report_groups_by_tier() {
        let mut r = ValidationReport::default();
        r.record("a", CheckTier::Count, true, String::new());
        r.record("b", CheckTier::Quality, false, String::new());
        assert!(!r.passed());
        assert!(r.tier_passed(CheckTier::Count));
        assert!(!r.tier_passed(CheckTier::Quality));
        assert_eq!(r.failures(), vec!["b"]);
        assert_eq!(r.outcomes().get("a"), Some(&true));
    }
}
