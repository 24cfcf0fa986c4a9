//! Betting event generation.
//!
//! Each entity runs its own loss-chasing state machine over the simulation
//! window:
//!
//!   NORMAL ──loss, chases, 1st loss──▶ CHASING
//!   CHASING/ESCALATING ──loss, chases, ≥2 losses──▶ ESCALATING
//!   any ──loss, gives up──▶ NORMAL (counter reset)
//!   any ──win──▶ NORMAL (counter reset, late-hour fraction restored)
//!
//! State drives stake size, betting pace and time of day. Category choice
//! comes from `market_drift`. Entities never share state; each one draws
//! from its own RNG stream, so the result does not depend on entity order.

use crate::{
    config::{InputCoupling, StateMachineConfig, ValidatedConfig, LATENT_DIM},
    market_drift,
    population::{LatentProfile, Player, Population},
    rng::{RngBank, StageRng, StageSlot},
    stats,
    types::{Cohort, EntityIndex, MarketType, Outcome, PlayerId, SportCategory},
    util,
};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BettingState {
    Normal,
    Chasing,
    Escalating,
}

impl BettingState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Chasing => "CHASING",
            Self::Escalating => "ESCALATING",
        }
    }
}

// ── State machine ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct BettingStateMachine {
    base_amount: f64,
    target_escalation: f64,
    chase_probability: f64,
    late_hour_baseline: f64,
    max_multiplier: f64,
    late_hour_cap: f64,
    late_hour_step: f64,
    normal_jitter: (f64, f64),
    chasing_jitter: (f64, f64),

    state: BettingState,
    consecutive_losses: u32,
    current_late_hour: f64,
}

impl BettingStateMachine {
    /// Inputs are normalised here: escalation floored at the configured
    /// minimum, chase probability clipped to [0, 1], late-hour baseline
    /// clipped to [0, cap].
    pub fn new(
        base_amount: f64,
        target_escalation: f64,
        chase_probability: f64,
        late_hour_baseline: f64,
        sm: &StateMachineConfig,
    ) -> Self {
        let baseline = util::clip(late_hour_baseline, 0.0, sm.late_hour_cap);
        Self {
            base_amount,
            target_escalation: target_escalation.max(sm.min_escalation),
            chase_probability: util::clip(chase_probability, 0.0, 1.0),
            late_hour_baseline: baseline,
            max_multiplier: sm.max_escalation_multiplier,
            late_hour_cap: sm.late_hour_cap,
            late_hour_step: sm.late_hour_step,
            normal_jitter: sm.normal_jitter,
            chasing_jitter: sm.chasing_jitter,
            state: BettingState::Normal,
            consecutive_losses: 0,
            current_late_hour: baseline,
        }
    }

    pub fn state(&self) -> BettingState {
        self.state
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    pub fn current_late_hour(&self) -> f64 {
        self.current_late_hour
    }

    pub fn late_hour_baseline(&self) -> f64 {
        self.late_hour_baseline
    }

    pub fn base_amount(&self) -> f64 {
        self.base_amount
    }

    pub fn target_escalation(&self) -> f64 {
        self.target_escalation
    }

    pub fn chase_probability(&self) -> f64 {
        self.chase_probability
    }

    pub fn is_chasing(&self) -> bool {
        matches!(self.state, BettingState::Chasing | BettingState::Escalating)
    }

    /// Apply one outcome. `chase_roll` is a uniform draw in [0, 1); the
    /// entity chases iff `chase_roll < chase_probability`. It is ignored
    /// on a win.
    pub fn apply(&mut self, outcome: Outcome, chase_roll: f64) {
        match outcome {
            Outcome::Loss => {
                self.consecutive_losses += 1;
                if chase_roll < self.chase_probability {
                    if self.consecutive_losses == 1 {
                        self.state = BettingState::Chasing;
                    } else {
                        self.state = BettingState::Escalating;
                        let raised = self.late_hour_baseline
                            * (1.0 + f64::from(self.consecutive_losses) * self.late_hour_step);
                        self.current_late_hour = raised.min(self.late_hour_cap);
                    }
                } else {
                    self.state = BettingState::Normal;
                    self.consecutive_losses = 0;
                }
            }
            Outcome::Win => {
                self.state = BettingState::Normal;
                self.consecutive_losses = 0;
                self.current_late_hour = self.late_hour_baseline;
            }
        }
    }

    /// Apply an outcome, drawing the chase roll only when it is needed.
    pub fn process_outcome(&mut self, outcome: Outcome, rng: &mut StageRng) {
        let roll = match outcome {
            Outcome::Loss => rng.next_f64(),
            Outcome::Win => 1.0,
        };
        self.apply(outcome, roll);
    }

    /// Stake multiplier for the current state given a uniform jitter draw
    /// in [0, 1). ESCALATING ignores the jitter.
    pub fn multiplier(&self, jitter: f64) -> f64 {
        let lerp = |(lo, hi): (f64, f64)| lo + (hi - lo) * jitter;
        match self.state {
            BettingState::Normal => lerp(self.normal_jitter),
            BettingState::Chasing => self.target_escalation * lerp(self.chasing_jitter),
            BettingState::Escalating => self
                .target_escalation
                .powi(self.consecutive_losses as i32)
                .min(self.max_multiplier),
        }
    }

    /// Unrounded stake for the next event.
    pub fn next_amount(&self, rng: &mut StageRng) -> f64 {
        let jitter = match self.state {
            BettingState::Escalating => 0.0,
            _ => rng.next_f64(),
        };
        self.base_amount * self.multiplier(jitter)
    }
}

// ── Timestamps ─────────────────────────────────────────────────────

/// Next event time after `current`. The gap is exponential (shorter while
/// chasing), the hour is late-night with probability `late_fraction` and
/// otherwise around primetime. The result is never earlier than `current`
/// and never later than `end`.
pub fn next_timestamp(
    rng: &mut StageRng,
    current: NaiveDateTime,
    end: NaiveDateTime,
    late_fraction: f64,
    chasing: bool,
    forced_hour: Option<u32>,
    sm: &StateMachineConfig,
) -> NaiveDateTime {
    let mean_gap = if chasing {
        sm.chasing_gap_days
    } else {
        sm.normal_gap_days
    };
    let gap_secs = rng.exponential(mean_gap) * SECONDS_PER_DAY;
    let remaining = (end - current).num_seconds().max(0);
    let day = current + Duration::seconds((gap_secs as i64).min(remaining));

    let hour = match forced_hour {
        Some(h) => h.min(23),
        None => sample_hour(rng, late_fraction, sm),
    };
    let minute = rng.int_inclusive(0, 59) as u32;
    let second = rng.int_inclusive(0, 59) as u32;

    let time = NaiveTime::from_hms_opt(hour, minute, second).unwrap_or(NaiveTime::MIN);
    let mut ts = day.date().and_time(time);
    if ts < current {
        ts += Duration::days(1);
    }
    ts.min(end)
}

fn sample_hour(rng: &mut StageRng, late_fraction: f64, sm: &StateMachineConfig) -> u32 {
    if rng.chance(late_fraction) {
        let (lo, hi) = sm.late_window;
        rng.int_inclusive(i64::from(lo), i64::from(hi)) as u32
    } else {
        let (lo, hi) = sm.day_hours;
        // Truncate toward zero, then clip.
        let h = rng.normal(sm.primetime_hour, sm.primetime_sd_hours) as i64;
        h.clamp(i64::from(lo), i64::from(hi)) as u32
    }
}

// ── Events ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetEvent {
    pub bet_id: String,
    pub player_id: PlayerId,
    pub timestamp: NaiveDateTime,
    pub category: SportCategory,
    pub market_type: MarketType,
    pub amount: f64,
    pub odds: i32,
    pub outcome: Outcome,
}

impl BetEvent {
    pub fn market_tier(&self) -> f64 {
        self.category.tier()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

/// Per-entity inputs sampled once from the cohort profile. Chase
/// probability, weekly rate and late-hour baseline follow the entity's
/// latent profile through the configured coupling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorParams {
    pub bets_per_week: f64,
    pub target_events: usize,
    pub base_amount: f64,
    pub chase_probability: f64,
    pub late_hour: f64,
}

impl BehaviorParams {
    pub fn sample(
        rng: &mut StageRng,
        cfg: &ValidatedConfig,
        cohort: Cohort,
        latent: &LatentProfile,
    ) -> Self {
        let profile = &cfg.profiles[cohort];
        let z = cfg.standard_scores(cohort, latent.to_array());
        let coupling = &cfg.coupling;
        let bets_per_week =
            coupled_sample(rng, profile.bets_per_week, &coupling.bets_per_week, &z);
        let base_amount = util::sample_range(rng, profile.base_amount);
        let chase_probability =
            coupled_sample(rng, profile.chase_probability, &coupling.chase_probability, &z);
        let late_hour = coupled_sample(rng, profile.late_hour, &coupling.late_hour, &z);
        Self {
            bets_per_week,
            target_events: cfg.events_for_rate(bets_per_week),
            base_amount,
            chase_probability,
            late_hour,
        }
    }
}

/// Draw from `range` at quantile Φ(w·z + √(1 − w²)·ε), ε ~ N(0, 1).
/// Always consumes one normal draw, whatever the weight.
pub fn coupled_sample(
    rng: &mut StageRng,
    range: (f64, f64),
    coupling: &InputCoupling,
    z: &[f64; LATENT_DIM],
) -> f64 {
    let w = coupling.weight;
    let driver = coupling.factor.latent_index().map_or(0.0, |k| z[k]);
    let mixed = w * driver + (1.0 - w * w).max(0.0).sqrt() * rng.standard_normal();
    range.0 + (range.1 - range.0) * stats::normal_cdf(mixed)
}

/// Forced values for boundary-condition entities. Every field left `None`
/// keeps the generated value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOverrides {
    pub event_count: Option<usize>,
    pub outcome: Option<Outcome>,
    pub category: Option<SportCategory>,
    pub hour: Option<u32>,
    pub amount: Option<f64>,
    /// No events inside [start, end); an event drawn inside is moved to `end`.
    pub pause: Option<(NaiveDateTime, NaiveDateTime)>,
}

/// Generate one entity's event sequence. Draw order per event: timestamp,
/// category, market type, stake, odds, outcome, chase roll. Drift progress
/// is the elapsed fraction of the window at the event's timestamp.
pub fn generate_entity_events(
    player: &Player,
    latent: &LatentProfile,
    cfg: &ValidatedConfig,
    rng: &mut StageRng,
    overrides: &EventOverrides,
) -> Vec<BetEvent> {
    let cohort = player.cohort;
    let sm = &cfg.state_machine;
    let params = BehaviorParams::sample(rng, cfg, cohort, latent);
    let total = overrides.event_count.unwrap_or(params.target_events);
    let mut machine = BettingStateMachine::new(
        params.base_amount,
        latent.target_bet_escalation,
        params.chase_probability,
        params.late_hour,
        sm,
    );
    let win_rate = cfg.profiles[cohort].win_rate;

    let end = cfg.window.end();
    let mut current = cfg.window.start();
    let mut events = Vec::with_capacity(total);

    for _ in 0..total {
        if current >= end {
            break;
        }
        let mut ts = next_timestamp(
            rng,
            current,
            end,
            machine.current_late_hour(),
            machine.is_chasing(),
            overrides.hour,
            sm,
        );
        if let Some((pause_start, pause_end)) = overrides.pause {
            if ts >= pause_start && ts < pause_end {
                ts = pause_end.min(end);
            }
        }

        let progress = cfg.window.progress(&ts);
        let drawn_category = market_drift::select_category(rng, cfg, cohort, progress);
        let category = overrides.category.unwrap_or(drawn_category);
        let market_type = MarketType::ALL[rng.weighted_index(&cfg.market_type_weights)];

        let drawn_amount = machine.next_amount(rng);
        let amount = overrides
            .amount
            .unwrap_or_else(|| util::round_to_cents(drawn_amount.max(sm.min_amount)));

        let odds = util::sample_american_odds(rng, category.tier());

        let drawn_outcome = if rng.chance(win_rate) {
            Outcome::Win
        } else {
            Outcome::Loss
        };
        let outcome = overrides.outcome.unwrap_or(drawn_outcome);
        machine.process_outcome(outcome, rng);

        events.push(BetEvent {
            bet_id: String::new(),
            player_id: player.player_id.clone(),
            timestamp: ts,
            category,
            market_type,
            amount,
            odds,
            outcome,
        });
        current = ts;
    }
    events
}

/// Event stream for the whole population, ids assigned in table order.
pub fn generate_events(pop: &Population, cfg: &ValidatedConfig, bank: &RngBank) -> Vec<BetEvent> {
    let mut events = Vec::new();
    let none = EventOverrides::default();
    for (i, player, latent) in pop.iter() {
        let mut rng = entity_rng(bank, i);
        events.extend(generate_entity_events(player, latent, cfg, &mut rng, &none));
        if (i + 1) % 1_000 == 0 {
            log::debug!("Processed {}/{} players ({} events)", i + 1, pop.len(), events.len());
        }
    }
    renumber_events(&mut events);
    log::info!("Generated {} events for {} players", events.len(), pop.len());
    events
}

pub fn entity_rng(bank: &RngBank, index: EntityIndex) -> StageRng {
    bank.for_entity(StageSlot::Behavior, index)
}

/// Reassign `BET_…` ids so they increase strictly in table order.
pub fn renumber_events(events: &mut [BetEvent]) {
    for (i, e) in events.iter_mut().enumerate() {
        e.bet_id = util::bet_id(i as u64);
    }
}
