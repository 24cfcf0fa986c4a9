//! Betting state machine, amount formulas, timestamps and market drift.

use betsynth_core::{
    behavior::{
        generate_entity_events, BehaviorParams, BettingState, BettingStateMachine, EventOverrides,
    },
    config::{DriftProfile, GeneratorConfig, StateMachineConfig},
    market_drift::{category_distribution, select_category},
    population::generate_population,
    rng::{RngBank, StageSlot},
    stats,
    types::{Cohort, Outcome, SportCategory},
};
use proptest::prelude::*;

fn sm() -> StateMachineConfig {
    GeneratorConfig::research_default().state_machine
}

/// Drive a fresh machine into `state`: chase probability 0.5 so a roll of
/// 0.0 always chases and 0.99 never does.
fn machine_in(state: BettingState) -> BettingStateMachine {
    let mut m = BettingStateMachine::new(20.0, 2.0, 0.5, 0.2, &sm());
    match state {
        BettingState::Normal => {}
        BettingState::Chasing => m.apply(Outcome::Loss, 0.0),
        BettingState::Escalating => {
            m.apply(Outcome::Loss, 0.0);
            m.apply(Outcome::Loss, 0.0);
        }
    }
    assert_eq!(m.state(), state);
    m
}

#[test]
fn transition_table_is_complete() {
    use BettingState::*;
    // (from, outcome, roll) → (to, consecutive losses)
    let table = [
        (Normal, Outcome::Win, 0.0, Normal, 0),
        (Normal, Outcome::Loss, 0.0, Chasing, 1),
        (Normal, Outcome::Loss, 0.99, Normal, 0),
        (Chasing, Outcome::Win, 0.0, Normal, 0),
        (Chasing, Outcome::Loss, 0.0, Escalating, 2),
        (Chasing, Outcome::Loss, 0.99, Normal, 0),
        (Escalating, Outcome::Win, 0.0, Normal, 0),
        (Escalating, Outcome::Loss, 0.0, Escalating, 3),
        (Escalating, Outcome::Loss, 0.99, Normal, 0),
    ];
    for (from, outcome, roll, to, losses) in table {
        let mut m = machine_in(from);
        m.apply(outcome, roll);
        assert_eq!(m.state(), to, "{from:?} + {outcome:?} (roll {roll})");
        assert_eq!(m.consecutive_losses(), losses, "{from:?} + {outcome:?} (roll {roll})");
    }
}

#[test]
fn win_restores_late_hour_baseline() {
    let mut m = machine_in(BettingState::Escalating);
    assert!(m.current_late_hour() > m.late_hour_baseline());
    m.apply(Outcome::Win, 0.0);
    assert_eq!(m.state(), BettingState::Normal);
    assert_eq!(m.consecutive_losses(), 0);
    assert_eq!(m.current_late_hour(), m.late_hour_baseline());
}

#[test]
fn escalating_amount_is_base_times_capped_power() {
    let bank = RngBank::new(1);
    let mut rng = bank.for_stage(StageSlot::Behavior);

    let mut m = BettingStateMachine::new(40.0, 1.8, 1.0, 0.1, &sm());
    m.apply(Outcome::Loss, 0.5);
    m.apply(Outcome::Loss, 0.5);
    assert_eq!(m.state(), BettingState::Escalating);
    assert_eq!(m.consecutive_losses(), 2);
    assert!((m.next_amount(&mut rng) - 40.0 * (1.8f64 * 1.8).min(5.0)).abs() < 1e-9);

    let mut m = BettingStateMachine::new(40.0, 3.0, 1.0, 0.1, &sm());
    m.apply(Outcome::Loss, 0.5);
    m.apply(Outcome::Loss, 0.5);
    assert!((m.next_amount(&mut rng) - 200.0).abs() < 1e-9);
}

#[test]
fn normal_and_chasing_amounts_stay_in_jitter_band() {
    let mut rng = RngBank::new(2).for_stage(StageSlot::Behavior);
    let normal = BettingStateMachine::new(50.0, 2.0, 1.0, 0.1, &sm());
    let chasing = machine_in(BettingState::Chasing);
    for _ in 0..1_000 {
        let a = normal.next_amount(&mut rng);
        assert!((40.0..=60.0).contains(&a));
        let b = chasing.next_amount(&mut rng);
        assert!((20.0 * 2.0 * 0.9..=20.0 * 2.0 * 1.1).contains(&b));
    }
}

#[test]
fn entity_events_are_ordered_positive_and_in_window() {
    let cfg = GeneratorConfig::test_default(300).validate().unwrap();
    let bank = RngBank::new(cfg.seed);
    let pop = generate_population(&cfg, &bank);
    for (i, player, latent) in pop.iter() {
        let mut rng = bank.for_entity(StageSlot::Behavior, i);
        let events =
            generate_entity_events(player, latent, &cfg, &mut rng, &EventOverrides::default());
        assert!(!events.is_empty());
        for pair in events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        for e in &events {
            assert!(e.amount > 0.0);
            assert!(cfg.window.contains(&e.timestamp));
            assert!(e.odds.abs() >= 100);
        }
    }
}

#[test]
fn overrides_force_every_field() {
    let cfg = GeneratorConfig::test_default(10).validate().unwrap();
    let bank = RngBank::new(3);
    let pop = generate_population(&cfg, &bank);
    let start = cfg.window.start();
    let pause = (start + chrono::Duration::days(30), start + chrono::Duration::days(60));
    let overrides = EventOverrides {
        event_count: Some(25),
        outcome: Some(Outcome::Loss),
        category: Some(SportCategory::TableTennis),
        hour: Some(3),
        amount: Some(0.01),
        pause: Some(pause),
    };
    let mut rng = bank.for_entity(StageSlot::EdgeCases, 0);
    let events = generate_entity_events(&pop.players[0], &pop.profiles[0], &cfg, &mut rng, &overrides);
    assert!(events.len() <= 25);
    for e in &events {
        assert_eq!(e.outcome, Outcome::Loss);
        assert_eq!(e.category, SportCategory::TableTennis);
        assert_eq!(e.amount, 0.01);
        assert!(e.timestamp < pause.0 || e.timestamp >= pause.1);
        if e.timestamp != cfg.window.end() && e.timestamp != pause.1 {
            assert_eq!(e.hour(), 3);
        }
    }
}

#[test]
fn baseline_category_draws_pass_chi_square() {
    let cfg = GeneratorConfig::research_default().validate().unwrap();
    let mut rng = RngBank::new(2024).for_stage(StageSlot::Behavior);
    let mut observed = [0u64; SportCategory::COUNT];
    for _ in 0..100_000 {
        observed[select_category(&mut rng, &cfg, Cohort::LowRisk, 0.0).index()] += 1;
    }
    let result = stats::chi_square_gof(&observed, &cfg.category_baseline).unwrap();
    assert_eq!(result.dof, 7);
    assert!(result.p_value > 0.05, "chi2={} p={}", result.statistic, result.p_value);
}

#[test]
fn behaviour_inputs_follow_latent_factors() {
    let cfg = GeneratorConfig::test_default(2_000).validate().unwrap();
    let bank = RngBank::new(cfg.seed);
    let pop = generate_population(&cfg, &bank);

    let (mut z_sens, mut z_risk, mut z_cons) = (Vec::new(), Vec::new(), Vec::new());
    let (mut chase, mut rate, mut late) = (Vec::new(), Vec::new(), Vec::new());
    for (i, player, latent) in pop.iter().filter(|(_, p, _)| p.cohort == Cohort::LowRisk) {
        let mut rng = bank.for_entity(StageSlot::Behavior, i);
        let params = BehaviorParams::sample(&mut rng, &cfg, player.cohort, latent);
        let profile = &cfg.profiles[Cohort::LowRisk];
        assert!(params.chase_probability >= profile.chase_probability.0);
        assert!(params.chase_probability <= profile.chase_probability.1);
        assert!(params.late_hour >= profile.late_hour.0 && params.late_hour <= profile.late_hour.1);

        let z = cfg.standard_scores(player.cohort, latent.to_array());
        z_sens.push(z[0]);
        z_risk.push(z[1]);
        z_cons.push(z[2]);
        chase.push(params.chase_probability);
        rate.push(params.bets_per_week);
        late.push(params.late_hour);
    }
    assert!(stats::pearson(&z_sens, &chase).unwrap() > 0.9);
    assert!(stats::pearson(&z_risk, &rate).unwrap() > 0.6);
    assert!(stats::pearson(&z_cons, &late).unwrap() < -0.4);
}

proptest! {
    #[test]
    fn drift_is_always_a_distribution(
        progress in 0.0f64..=1.0,
        exponent in 0.5f64..4.0,
        boost_scale in 0.0f64..5.0,
    ) {
        let cfg = GeneratorConfig::research_default().validate().unwrap();
        let drift = DriftProfile { exponent, boost_scale, exploration: None };
        let d = category_distribution(&cfg.category_baseline, &cfg.drift_shifts, Some(&drift), progress);
        prop_assert!(d.iter().all(|w| *w >= 0.0));
        prop_assert!((d.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn any_win_resets_from_any_history(
        losses in proptest::collection::vec(0.0f64..1.0, 0..12),
        escalation in 0.5f64..8.0,
        chase in 0.0f64..1.0,
    ) {
        let mut m = BettingStateMachine::new(25.0, escalation, chase, 0.3, &sm());
        for roll in losses {
            m.apply(Outcome::Loss, roll);
            prop_assert!(m.current_late_hour() <= 0.7);
            prop_assert!(m.multiplier(0.5) <= 5.0 || m.state() != BettingState::Escalating);
        }
        m.apply(Outcome::Win, 0.0);
        prop_assert_eq!(m.state(), BettingState::Normal);
        prop_assert_eq!(m.consecutive_losses(), 0);
        prop_assert_eq!(m.current_late_hour(), m.late_hour_baseline());
    }
}
