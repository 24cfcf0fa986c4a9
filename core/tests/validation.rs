//! Validation suite against correctly generated 1,000- and 10,000-entity
//! runs.

use betsynth_core::{
    config::{GeneratorConfig, ValidatedConfig},
    engine::{GeneratedData, GenerationEngine},
    validation::{validate, CheckResult, CheckTier, ValidationReport},
};
use std::sync::OnceLock;

fn generated() -> &'static (ValidatedConfig, GeneratedData) {
    static DATA: OnceLock<(ValidatedConfig, GeneratedData)> = OnceLock::new();
    DATA.get_or_init(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        let cfg = GeneratorConfig::test_default(1_000).validate().unwrap();
        let data = GenerationEngine::new(cfg.clone()).run();
        (cfg, data)
    })
}

fn report() -> &'static ValidationReport {
    generated().1.report.as_ref().expect("validation ran")
}

fn failing(r: &ValidationReport, tier: CheckTier) -> Vec<(&str, &CheckResult)> {
    r.tier(tier).filter(|(_, c)| !c.passed).collect()
}

#[test]
fn every_tier_passes() {
    let r = report();
    for tier in CheckTier::ALL {
        let failed = failing(r, tier);
        assert!(failed.is_empty(), "{} tier failed: {failed:?}", tier.as_str());
    }
    assert!(r.passed());
}

#[test]
fn research_scale_run_passes_distribution_and_correlation() {
    let cfg = GeneratorConfig::research_default().validate().unwrap();
    assert_eq!(cfg.population, 10_000);
    let data = GenerationEngine::new(cfg).run();
    let r = data.report.as_ref().expect("validation ran");
    for tier in [CheckTier::Distribution, CheckTier::Correlation] {
        let failed = failing(r, tier);
        assert!(failed.is_empty(), "{} tier failed: {failed:?}", tier.as_str());
    }
    assert!(r.tier_passed(CheckTier::Distribution));
}

#[test]
fn every_tier_and_target_is_reported() {
    let (cfg, _) = generated();
    let r = report();
    for tier in CheckTier::ALL {
        assert!(r.tier(tier).count() > 0, "no {} checks", tier.as_str());
    }
    assert_eq!(r.tier(CheckTier::Correlation).count(), cfg.target_correlations.len());
    for name in [
        "population_count",
        "event_count_range",
        "assessment_count",
        "no_null_player_ids",
        "valid_jurisdictions",
        "player_id_jurisdiction",
        "valid_amounts",
        "category_distribution",
        "ks_sensitivity_to_loss",
        "ks_risk_tolerance",
        "ks_decision_consistency",
        "corr_sensitivity_to_loss_vs_escalation_ratio",
        "corr_risk_tolerance_vs_after_loss_per_week",
        "corr_decision_consistency_vs_late_hour_fraction",
    ] {
        assert!(r.get(name).is_some(), "missing check {name}");
    }
}

#[test]
fn corrupting_one_amount_fails_only_valid_amounts() {
    let (cfg, data) = generated();
    let baseline = report();

    let mut events = data.events.clone();
    let target = events
        .iter_mut()
        .find(|e| e.player_id == "PLR_0203_PA")
        .expect("whale has events");
    target.amount = -target.amount;

    let corrupted = validate(&data.population.players, &events, &data.assessments, cfg);
    let changed: Vec<&str> = corrupted
        .checks
        .iter()
        .filter(|(name, c)| baseline.checks[name.as_str()].passed != c.passed)
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(changed, vec!["valid_amounts"]);
    assert!(!corrupted.get("valid_amounts").unwrap().passed);
}

#[test]
fn missing_population_rows_fail_counts() {
    let (cfg, data) = generated();
    let players = &data.population.players[..900];
    let r = validate(players, &data.events, &data.assessments, cfg);
    assert!(!r.get("population_count").unwrap().passed);
    assert!(!r.get("events_reference_population").unwrap().passed);
    assert!(!r.passed());
}

#[test]
fn report_serialises_to_json() {
    let r = report();
    let json = serde_json::to_string(r).unwrap();
    let back: ValidationReport = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, r);
    assert!(json.contains("\"tier\":\"quality\""));
}
