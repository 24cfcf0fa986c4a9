//! Identifier formatting, range sampling, odds math and date helpers.

use crate::{
    rng::StageRng,
    types::{Jurisdiction, PlayerId},
};
use chrono::{NaiveDate, NaiveDateTime};

pub const PLAYER_ID_PREFIX: &str = "PLR";
pub const BET_ID_PREFIX: &str = "BET";
pub const ASSESSMENT_ID_PREFIX: &str = "ASSESS";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lines most often posted on major-league moneylines.
const COMMON_MAJOR_LINES: [i32; 6] = [-110, -105, -115, -120, 100, 110];

// ── Identifiers ────────────────────────────────────────────────────

/// `PLR_0001_MA` for index 0. The numeric part is 1-based, zero-padded to
/// four digits and grows to six for large populations.
pub fn player_id(index: usize, jurisdiction: Jurisdiction) -> PlayerId {
    format!("{PLAYER_ID_PREFIX}_{:04}_{}", index + 1, jurisdiction.code())
}

/// Inverse of [`player_id`]: returns the 0-based index and jurisdiction.
pub fn parse_player_id(id: &str) -> Option<(usize, Jurisdiction)> {
    let mut parts = id.split('_');
    if parts.next()? != PLAYER_ID_PREFIX {
        return None;
    }
    let digits = parts.next()?;
    let code = parts.next()?;
    if parts.next().is_some() || !(4..=6).contains(&digits.len()) {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: usize = digits.parse().ok()?;
    let jurisdiction = code.parse().ok()?;
    number.checked_sub(1).map(|index| (index, jurisdiction))
}

/// `BET_00000001` for index 0.
pub fn bet_id(index: u64) -> String {
    format!("{BET_ID_PREFIX}_{:08}", index + 1)
}

pub fn parse_bet_id(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(BET_ID_PREFIX)?.strip_prefix('_')?;
    if digits.len() < 8 {
        return None;
    }
    digits.parse::<u64>().ok()?.checked_sub(1)
}

pub fn assessment_id(player_id: &str) -> String {
    format!("{ASSESSMENT_ID_PREFIX}_{player_id}")
}

// ── Numeric helpers ────────────────────────────────────────────────

/// Uniform draw from a (min, max) range.
pub fn sample_range(rng: &mut StageRng, range: (f64, f64)) -> f64 {
    rng.uniform(range.0, range.1)
}

pub fn clip(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ── Odds ───────────────────────────────────────────────────────────

/// American odds for a market of the given tier. Major markets mostly sit
/// on a handful of standard lines; niche markets spread wider. The
/// magnitude is always at least 100.
pub fn sample_american_odds(rng: &mut StageRng, tier: f64) -> i32 {
    let max_magnitude = if tier >= 1.0 {
        if rng.chance(0.7) {
            let i = rng.next_u64_below(COMMON_MAJOR_LINES.len() as u64) as usize;
            return COMMON_MAJOR_LINES[i];
        }
        200
    } else {
        300
    };
    let magnitude = rng.int_inclusive(100, max_magnitude) as i32;
    if rng.chance(0.5) {
        -magnitude
    } else {
        magnitude
    }
}

/// Total return on a winning stake (stake plus profit).
pub fn payout(amount: f64, odds: i32) -> f64 {
    let profit = if odds < 0 {
        amount * (100.0 / f64::from(odds.unsigned_abs()))
    } else {
        amount * (f64::from(odds) / 100.0)
    };
    amount + profit
}

/// Bookmaker's implied win probability for the line.
pub fn implied_probability(odds: i32) -> f64 {
    if odds < 0 {
        let risk = f64::from(odds.unsigned_abs());
        risk / (risk + 100.0)
    } else {
        100.0 / (f64::from(odds) + 100.0)
    }
}

// ── Dates ──────────────────────────────────────────────────────────

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Bucket an hour of day the way downstream temporal analysis does.
pub fn hour_bucket(hour: u32) -> &'static str {
    match hour {
        2..=5 => "late_night",
        10..=17 => "daytime",
        18..=23 => "primetime",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StageSlot};

    #[test]
    fn ids_are_one_based_and_padded() {
        assert_eq!(player_id(0, Jurisdiction::MA), "PLR_0001_MA");
        assert_eq!(player_id(41, Jurisdiction::NJ), "PLR_0042_NJ");
        assert_eq!(player_id(123_455, Jurisdiction::PA), "PLR_123456_PA");
        assert_eq!(bet_id(0), "BET_00000001");
        assert_eq!(bet_id(999_999), "BET_01000000");
        assert_eq!(assessment_id("PLR_0001_MA"), "ASSESS_PLR_0001_MA");
    }

    #[test]
    fn player_id_parses_back() {
        assert_eq!(parse_player_id("PLR_0042_NJ"), Some((41, Jurisdiction::NJ)));
        assert_eq!(parse_player_id("PLR_42_NJ"), None);
        assert_eq!(parse_player_id("PLR_0042_XX"), None);
        assert_eq!(parse_player_id("USR_0042_MA"), None);
        assert_eq!(parse_bet_id("BET_00000010"), Some(9));
    }

    #[test]
    fn payout_matches_american_convention() {
        assert!((payout(100.0, -110) - 190.909_090).abs() < 1e-3);
        assert!((payout(100.0, 150) - 250.0).abs() < 1e-9);
        assert!((implied_probability(-110) - 0.523_809).abs() < 1e-5);
        assert!((implied_probability(100) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn odds_never_fall_inside_the_dead_zone() {
        let mut rng = RngBank::new(11).for_stage(StageSlot::Behavior);
        for tier in [1.0, 0.7, 0.2] {
            for _ in 0..5_000 {
                let o = sample_american_odds(&mut rng, tier);
                assert!(o.abs() >= 100, "odds {o}");
                assert!(o.abs() <= 300);
            }
        }
    }

    #[test]
    fn rounding_and_buckets() {
        assert_eq!(round_to_cents(10.12345), 10.12);
        assert_eq!(round_to_cents(0.005_1), 0.01);
        assert_eq!(hour_bucket(3), "late_night");
        assert_eq!(hour_bucket(20), "primetime");
        assert_eq!(hour_bucket(0), "other");
    }
}
