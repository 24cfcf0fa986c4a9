//! Psychometric assessment scores derived from latent profiles.

use crate::{
    config::ValidatedConfig,
    population::{LatentProfile, Player},
    rng::{RngBank, StageRng, StageSlot},
    types::{AssessmentScore, PlayerId},
    util,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub assessment_id: String,
    pub player_id: PlayerId,
    pub assessment_date: NaiveDate,
    pub sensitivity_to_loss: f64,
    pub sensitivity_to_reward: f64,
    pub risk_tolerance: f64,
    pub decision_consistency: f64,
    pub version: String,
}

impl AssessmentRecord {
    pub fn score(&self, which: AssessmentScore) -> f64 {
        match which {
            AssessmentScore::SensitivityToLoss => self.sensitivity_to_loss,
            AssessmentScore::SensitivityToReward => self.sensitivity_to_reward,
            AssessmentScore::RiskTolerance => self.risk_tolerance,
            AssessmentScore::DecisionConsistency => self.decision_consistency,
        }
    }
}

/// Score one entity. Draw order: three noise terms, reward noise, date.
pub fn assess(
    player: &Player,
    latent: &LatentProfile,
    cfg: &ValidatedConfig,
    rng: &mut StageRng,
) -> AssessmentRecord {
    let a = &cfg.assessment;
    let bound = |v: f64| util::clip(v, a.score_min, a.score_max);

    let sensitivity_to_loss = bound(latent.sensitivity_to_loss + rng.normal(0.0, a.noise_sd));
    let risk_tolerance = bound(latent.risk_tolerance + rng.normal(0.0, a.noise_sd));
    let decision_consistency = bound(latent.decision_consistency + rng.normal(0.0, a.noise_sd));
    let sensitivity_to_reward = bound(
        a.reward_risk_weight * risk_tolerance
            + a.reward_noise_weight * rng.uniform(a.score_min, a.score_max),
    );

    let days_back = rng.uniform(0.0, f64::from(cfg.window.assessment_lookback_days));
    let taken_at = cfg.window.start() - Duration::seconds((days_back * SECONDS_PER_DAY) as i64);

    AssessmentRecord {
        assessment_id: util::assessment_id(&player.player_id),
        player_id: player.player_id.clone(),
        assessment_date: taken_at.date(),
        sensitivity_to_loss: util::round_to(sensitivity_to_loss, 2),
        sensitivity_to_reward: util::round_to(sensitivity_to_reward, 2),
        risk_tolerance: util::round_to(risk_tolerance, 2),
        decision_consistency: util::round_to(decision_consistency, 2),
        version: a.version.clone(),
    }
}

/// One assessment per entity, in population order.
pub fn generate_assessments(
    players: &[Player],
    profiles: &[LatentProfile],
    cfg: &ValidatedConfig,
    bank: &RngBank,
) -> Vec<AssessmentRecord> {
    let mut rng = bank.for_stage(StageSlot::Assessment);
    let records: Vec<AssessmentRecord> = players
        .iter()
        .zip(profiles)
        .map(|(p, l)| assess(p, l, cfg, &mut rng))
        .collect();
    log::info!("Generated {} assessments", records.len());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::population::generate_population;
    use crate::stats::pearson;

    #[test]
    fn scores_track_latent_factors() {
        let cfg = GeneratorConfig::test_default(3_000).validate().unwrap();
        let bank = RngBank::new(cfg.seed);
        let pop = generate_population(&cfg, &bank);
        let records = generate_assessments(&pop.players, &pop.profiles, &cfg, &bank);
        assert_eq!(records.len(), pop.len());

        let latent: Vec<f64> = pop.profiles.iter().map(|l| l.sensitivity_to_loss).collect();
        let score: Vec<f64> = records.iter().map(|r| r.sensitivity_to_loss).collect();
        assert!(pearson(&latent, &score).unwrap() > 0.90);

        let latent: Vec<f64> = pop.profiles.iter().map(|l| l.decision_consistency).collect();
        let score: Vec<f64> = records.iter().map(|r| r.decision_consistency).collect();
        assert!(pearson(&latent, &score).unwrap() > 0.90);
    }

    #[test]
    fn records_are_bounded_and_dated_before_start() {
        let cfg = GeneratorConfig::test_default(500).validate().unwrap();
        let bank = RngBank::new(3);
        let pop = generate_population(&cfg, &bank);
        let start = cfg.window.start_date;
        for r in generate_assessments(&pop.players, &pop.profiles, &cfg, &bank) {
            for s in AssessmentScore::ALL {
                assert!((0.0..=100.0).contains(&r.score(s)));
            }
            assert!(r.assessment_date <= start);
            assert!(r.assessment_date >= start - Duration::days(91));
            assert_eq!(r.assessment_id, format!("ASSESS_{}", r.player_id));
            assert_eq!(r.version, "v3.2.1");
        }
    }
}
