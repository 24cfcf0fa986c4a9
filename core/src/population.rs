//! Population generation: cohort and jurisdiction assignment, latent
//! factor draws, demographics.
//!
//! Latent profiles are kept beside the public records, never inside them.
//! Exports only ever see `Player`.

use crate::{
    config::{ValidatedConfig, LATENT_DIM},
    name_generator::NameGenerator,
    rng::{RngBank, StageSlot},
    types::{Cohort, CohortTable, EntityIndex, Jurisdiction, PlayerId},
    util,
};
use serde::{Deserialize, Serialize};

/// Public account record; the only population data that is exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: u32,
    pub jurisdiction: Jurisdiction,
    pub cohort: Cohort,
}

/// Unobserved per-entity traits. Both the assessment generator and the
/// event generator read these; neither reads the other's output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatentProfile {
    pub sensitivity_to_loss: f64,
    pub risk_tolerance: f64,
    pub decision_consistency: f64,
    pub target_bet_escalation: f64,
}

impl LatentProfile {
    pub fn from_array(x: [f64; LATENT_DIM]) -> Self {
        Self {
            sensitivity_to_loss: x[0],
            risk_tolerance: x[1],
            decision_consistency: x[2],
            target_bet_escalation: x[3],
        }
    }

    pub fn to_array(&self) -> [f64; LATENT_DIM] {
        [
            self.sensitivity_to_loss,
            self.risk_tolerance,
            self.decision_consistency,
            self.target_bet_escalation,
        ]
    }
}

/// `players[i]` and `profiles[i]` describe the same entity.
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub players: Vec<Player>,
    pub profiles: Vec<LatentProfile>,
}

impl Population {
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityIndex, &Player, &LatentProfile)> {
        self.players
            .iter()
            .zip(&self.profiles)
            .enumerate()
            .map(|(i, (p, l))| (i, p, l))
    }

    pub fn cohort_counts(&self) -> CohortTable<usize> {
        cohort_counts(&self.players)
    }
}

pub fn cohort_counts(players: &[Player]) -> CohortTable<usize> {
    let mut counts = CohortTable::from_fn(|_| 0usize);
    for p in players {
        counts[p.cohort] += 1;
    }
    counts
}

pub fn jurisdiction_counts(players: &[Player]) -> [usize; Jurisdiction::COUNT] {
    let mut counts = [0usize; Jurisdiction::COUNT];
    for p in players {
        counts[p.jurisdiction.index()] += 1;
    }
    counts
}

/// Clamp a sampled escalation target into the cohort's range and above the
/// global floor. Applied after sampling, so it slightly dampens the
/// designed correlations for this factor.
pub fn clamp_escalation(value: f64, range: (f64, f64), floor: f64) -> f64 {
    util::clip(value, range.0, range.1).max(floor)
}

/// Build the full population for `cfg.population` entities.
pub fn generate_population(cfg: &ValidatedConfig, bank: &RngBank) -> Population {
    let n = cfg.population;
    let mut rng = bank.for_stage(StageSlot::Population);
    let cohort_weights: Vec<f64> = cfg.cohort_shares.iter().map(|(_, v)| *v).collect();

    let mut cohorts = Vec::with_capacity(n);
    let mut jurisdictions = Vec::with_capacity(n);
    for _ in 0..n {
        cohorts.push(Cohort::ALL[rng.weighted_index(&cohort_weights)]);
        jurisdictions.push(Jurisdiction::ALL[rng.weighted_index(&cfg.jurisdiction_shares)]);
    }

    // One latent pass per cohort over exactly that cohort's members.
    let mut profiles = vec![
        LatentProfile::from_array([0.0; LATENT_DIM]);
        n
    ];
    for cohort in Cohort::ALL {
        let means = cfg.latent_means[cohort];
        let range = cfg.profiles[cohort].escalation;
        let mut members = 0usize;
        for (i, _) in cohorts.iter().enumerate().filter(|(_, c)| **c == cohort) {
            let x = cfg.sampler.sample_one(&means, &mut rng);
            let mut arr = [0.0; LATENT_DIM];
            arr.copy_from_slice(&x[..LATENT_DIM]);
            arr[3] = clamp_escalation(arr[3], range, cfg.state_machine.min_escalation);
            profiles[i] = LatentProfile::from_array(arr);
            members += 1;
        }
        log::debug!("Latent factors drawn for {members} {cohort} entities");
    }

    let mut demo_rng = bank.for_stage(StageSlot::Demographics);
    let players: Vec<Player> = (0..n)
        .map(|i| {
            let d = NameGenerator::demographics(
                &mut demo_rng,
                cfg.demographics.min_age,
                cfg.demographics.max_age,
            );
            Player {
                player_id: util::player_id(i, jurisdictions[i]),
                first_name: d.first_name,
                last_name: d.last_name,
                email: d.email,
                age: d.age,
                jurisdiction: jurisdictions[i],
                cohort: cohorts[i],
            }
        })
        .collect();

    log::info!("Generated {} players", players.len());
    Population { players, profiles }
}
