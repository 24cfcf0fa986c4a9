//! Market drift: the cohort- and progress-dependent shift of betting
//! volume from major leagues toward niche markets.

use crate::{
    config::{DriftProfile, ValidatedConfig},
    rng::StageRng,
    types::{Cohort, SportCategory},
};

const N: usize = SportCategory::COUNT;

/// Niche boost at `progress` ∈ [0, 1]: progress^exponent × boost_scale.
pub fn niche_boost(drift: Option<&DriftProfile>, progress: f64) -> f64 {
    match drift {
        Some(d) => progress.clamp(0.0, 1.0).powf(d.exponent) * d.boost_scale,
        None => 0.0,
    }
}

/// Category distribution after drift. Shifted weights are clipped at zero
/// and renormalised, so the result is always a probability vector.
pub fn category_distribution(
    baseline: &[f64; N],
    shifts: &[f64; N],
    drift: Option<&DriftProfile>,
    progress: f64,
) -> [f64; N] {
    let boost = niche_boost(drift, progress);
    let mut dist = [0.0; N];
    for i in 0..N {
        dist[i] = (baseline[i] + boost * shifts[i]).max(0.0);
    }
    let total: f64 = dist.iter().sum();
    if total <= 0.0 {
        return [1.0 / N as f64; N];
    }
    for w in &mut dist {
        *w /= total;
    }
    dist
}

/// Pick the category of the next event. Late in the window, cohorts with an
/// exploration branch sometimes ignore drift and pick uniformly.
pub fn select_category(
    rng: &mut StageRng,
    cfg: &ValidatedConfig,
    cohort: Cohort,
    progress: f64,
) -> SportCategory {
    let drift = cfg.profiles[cohort].drift.as_ref();
    if let Some(exploration) = drift.and_then(|d| d.exploration.as_ref()) {
        if progress > exploration.after_progress && rng.chance(exploration.probability) {
            return SportCategory::ALL[rng.next_u64_below(N as u64) as usize];
        }
    }
    let dist = category_distribution(&cfg.category_baseline, &cfg.drift_shifts, drift, progress);
    SportCategory::ALL[rng.weighted_index(&dist)]
}

/// Probability of each category for one event of `cohort` at `progress`,
/// exploration branch included. `select_category` draws from exactly this.
pub fn expected_category_mix(cfg: &ValidatedConfig, cohort: Cohort, progress: f64) -> [f64; N] {
    let drift = cfg.profiles[cohort].drift.as_ref();
    let mut dist = category_distribution(&cfg.category_baseline, &cfg.drift_shifts, drift, progress);
    if let Some(exploration) = drift.and_then(|d| d.exploration.as_ref()) {
        if progress > exploration.after_progress {
            let e = exploration.probability;
            for w in &mut dist {
                *w = (1.0 - e) * *w + e / N as f64;
            }
        }
    }
    dist
}

/// Expected market tier under a category distribution.
pub fn expected_tier(dist: &[f64; N]) -> f64 {
    SportCategory::ALL
        .iter()
        .map(|c| dist[c.index()] * c.tier())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::rng::{RngBank, StageSlot};

    fn cfg() -> ValidatedConfig {
        GeneratorConfig::research_default().validate().unwrap()
    }

    #[test]
    fn no_drift_means_baseline() {
        let cfg = cfg();
        for progress in [0.0, 0.5, 1.0] {
            let d = category_distribution(
                &cfg.category_baseline,
                &cfg.drift_shifts,
                cfg.profiles[Cohort::LowRisk].drift.as_ref(),
                progress,
            );
            for i in 0..N {
                assert!((d[i] - cfg.category_baseline[i]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn drift_moves_mass_to_niche_markets() {
        let cfg = cfg();
        let drift = cfg.profiles[Cohort::Critical].drift.as_ref();
        let early = category_distribution(&cfg.category_baseline, &cfg.drift_shifts, drift, 0.1);
        let late = category_distribution(&cfg.category_baseline, &cfg.drift_shifts, drift, 1.0);
        let tt = SportCategory::TableTennis.index();
        assert!(late[tt] > early[tt]);
        assert!((late[tt] - 0.26).abs() < 1e-3);
        assert!(expected_tier(&late) < expected_tier(&early));
    }

    #[test]
    fn extreme_boost_clips_and_renormalises() {
        let cfg = cfg();
        let drift = DriftProfile {
            exponent: 1.0,
            boost_scale: 3.0,
            exploration: None,
        };
        let d = category_distribution(&cfg.category_baseline, &cfg.drift_shifts, Some(&drift), 1.0);
        assert!(d.iter().all(|w| *w >= 0.0));
        assert_eq!(d[SportCategory::Nfl.index()], 0.0);
        assert!((d.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn exploration_reaches_every_category_late() {
        let cfg = cfg();
        let mut rng = RngBank::new(5).for_stage(StageSlot::Behavior);
        let mut seen = [false; N];
        for _ in 0..5_000 {
            seen[select_category(&mut rng, &cfg, Cohort::Critical, 0.95).index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn draws_match_the_expected_mix() {
        let cfg = cfg();
        let mut rng = RngBank::new(11).for_stage(StageSlot::Behavior);
        for (cohort, progress) in [(Cohort::MediumRisk, 0.6), (Cohort::Critical, 0.9)] {
            let expected = expected_category_mix(&cfg, cohort, progress);
            assert!((expected.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            let draws = 40_000;
            let mut counts = [0usize; N];
            for _ in 0..draws {
                counts[select_category(&mut rng, &cfg, cohort, progress).index()] += 1;
            }
            for i in 0..N {
                let share = counts[i] as f64 / draws as f64;
                assert!((share - expected[i]).abs() < 0.012, "{cohort} category {i}");
            }
        }
        let before = expected_category_mix(&cfg, Cohort::Critical, 0.7);
        let plain = category_distribution(
            &cfg.category_baseline,
            &cfg.drift_shifts,
            cfg.profiles[Cohort::Critical].drift.as_ref(),
            0.7,
        );
        assert_eq!(before, plain);
    }
}
