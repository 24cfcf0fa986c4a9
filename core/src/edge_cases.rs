//! Boundary-condition entities.
//!
//! A fixed table of entries replaces rows of the generated population in
//! place. Each entry is turned into overrides that are applied the same way
//! to all three tables: the population row, the event stream and the
//! assessment. Anything an entry asks for that cannot be represented is
//! reported in the `InjectionReport`, never dropped silently.

use crate::{
    assessment::{self, AssessmentRecord},
    behavior::{self, BetEvent, EventOverrides},
    config::ValidatedConfig,
    population::{clamp_escalation, LatentProfile, Player, Population},
    rng::{RngBank, StageSlot},
    types::{Cohort, Jurisdiction, Outcome, PlayerId, SportCategory},
    util,
};
use chrono::Duration;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Days after window start at which the self-exclusion begins and is
/// reversed.
const SELF_EXCLUSION_DAYS: (i64, i64) = (30, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCaseKind {
    AlwaysWin,
    AlwaysLose,
    SingleBet,
    TableTennisOnly,
    LateNightOnly,
    PennyBettor,
    Whale,
    MissingAssessment,
    NullCategory,
    SelfExclusionReversal,
}

impl EdgeCaseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlwaysWin => "100_percent_win",
            Self::AlwaysLose => "100_percent_loss",
            Self::SingleBet => "single_bet",
            Self::TableTennisOnly => "table_tennis_only",
            Self::LateNightOnly => "3am_only",
            Self::PennyBettor => "penny_bettor",
            Self::Whale => "whale",
            Self::MissingAssessment => "missing_assessment",
            Self::NullCategory => "null_sport",
            Self::SelfExclusionReversal => "self_exclusion_reversal",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCaseSpec {
    /// 1-based population slot; also the numeric part of the id.
    pub number: usize,
    pub jurisdiction: Jurisdiction,
    pub kind: EdgeCaseKind,
    pub description: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub age: u32,
    pub cohort: Cohort,
    pub event_count: usize,
}

impl EdgeCaseSpec {
    pub fn index(&self) -> usize {
        self.number - 1
    }

    pub fn player_id(&self) -> PlayerId {
        util::player_id(self.index(), self.jurisdiction)
    }

    pub fn email(&self) -> String {
        format!(
            "{}.{}@example.com",
            self.first_name.to_ascii_lowercase(),
            self.last_name.to_ascii_lowercase()
        )
    }

    pub fn player(&self) -> Player {
        Player {
            player_id: self.player_id(),
            first_name: self.first_name.to_string(),
            last_name: self.last_name.to_string(),
            email: self.email(),
            age: self.age,
            jurisdiction: self.jurisdiction,
            cohort: self.cohort,
        }
    }

    pub fn has_assessment(&self) -> bool {
        self.kind != EdgeCaseKind::MissingAssessment
    }

    /// Requested behaviour that the closed event schema cannot hold.
    pub fn unsupported(&self) -> Option<&'static str> {
        match self.kind {
            EdgeCaseKind::NullCategory => {
                Some("3 events with a null category: category is a closed, non-nullable column")
            }
            _ => None,
        }
    }

    pub fn overrides(&self, cfg: &ValidatedConfig) -> EventOverrides {
        let mut o = EventOverrides {
            event_count: Some(self.event_count),
            ..EventOverrides::default()
        };
        match self.kind {
            EdgeCaseKind::AlwaysWin => o.outcome = Some(Outcome::Win),
            EdgeCaseKind::AlwaysLose => o.outcome = Some(Outcome::Loss),
            EdgeCaseKind::TableTennisOnly => o.category = Some(SportCategory::TableTennis),
            EdgeCaseKind::LateNightOnly => o.hour = Some(3),
            EdgeCaseKind::PennyBettor => o.amount = Some(0.01),
            EdgeCaseKind::Whale => o.amount = Some(10_000.00),
            EdgeCaseKind::SelfExclusionReversal => {
                let start = cfg.window.start();
                o.pause = Some((
                    start + Duration::days(SELF_EXCLUSION_DAYS.0),
                    start + Duration::days(SELF_EXCLUSION_DAYS.1),
                ));
            }
            EdgeCaseKind::SingleBet
            | EdgeCaseKind::MissingAssessment
            | EdgeCaseKind::NullCategory => {}
        }
        o
    }
}

/// The ten boundary-condition entities.
pub fn edge_case_table() -> Vec<EdgeCaseSpec> {
    use Cohort::*;
    use EdgeCaseKind::*;
    use Jurisdiction::*;

    let spec = |number, jurisdiction, kind, description, first_name, last_name, age, cohort, event_count| {
        EdgeCaseSpec {
            number,
            jurisdiction,
            kind,
            description,
            first_name,
            last_name,
            age,
            cohort,
            event_count,
        }
    };
    vec![
        spec(1, MA, AlwaysWin, "Wins every bet", "Lucky", "Winner", 35, LowRisk, 10),
        spec(2, NJ, AlwaysLose, "Loses every bet", "Unlucky", "Loser", 42, Critical, 15),
        spec(3, PA, SingleBet, "Places exactly one bet", "One", "Timer", 28, LowRisk, 1),
        spec(42, MA, TableTennisOnly, "Bets only on table tennis", "Ping", "Pong", 31, HighRisk, 20),
        spec(99, NJ, LateNightOnly, "Bets only at 3 AM", "Night", "Owl", 39, Critical, 25),
        spec(156, MA, PennyBettor, "Stakes $0.01 every time", "Penny", "Pincher", 65, LowRisk, 50),
        spec(203, PA, Whale, "Stakes $10,000 every time", "High", "Roller", 55, Critical, 30),
        spec(333, NJ, MissingAssessment, "Has no assessment", "Missing", "Data", 44, MediumRisk, 12),
        spec(405, MA, NullCategory, "Some bets lack a category", "Null", "Sport", 37, LowRisk, 18),
        spec(500, PA, SelfExclusionReversal, "Self-excluded, then reversed", "Self", "Excluded", 48, Critical, 22),
    ]
}

pub fn edge_case_ids() -> HashSet<PlayerId> {
    edge_case_table().iter().map(|s| s.player_id()).collect()
}

/// Ids of edge-case entities that must have no assessment row.
pub fn missing_assessment_ids() -> HashSet<PlayerId> {
    edge_case_table()
        .iter()
        .filter(|s| !s.has_assessment())
        .map(|s| s.player_id())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedOverride {
    pub player_id: PlayerId,
    pub kind: EdgeCaseKind,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InjectionReport {
    pub applied: Vec<(PlayerId, EdgeCaseKind)>,
    pub skipped: Vec<SkippedOverride>,
    /// Entries whose slot lies beyond the population.
    pub not_applicable: Vec<PlayerId>,
}

/// Replace edge-case slots in all three tables. Population size is
/// preserved. Running it again on its own output changes nothing.
pub fn inject_edge_cases(
    pop: &mut Population,
    events: &mut Vec<BetEvent>,
    assessments: &mut Vec<AssessmentRecord>,
    cfg: &ValidatedConfig,
    bank: &RngBank,
) -> InjectionReport {
    let n = pop.len();
    let mut report = InjectionReport::default();

    let slot_of: HashMap<PlayerId, usize> = pop
        .players
        .iter()
        .enumerate()
        .map(|(i, p)| (p.player_id.clone(), i))
        .collect();

    let mut events_by_slot: Vec<Vec<BetEvent>> = vec![Vec::new(); n];
    let mut orphan_events = Vec::new();
    for e in events.drain(..) {
        match slot_of.get(&e.player_id) {
            Some(i) => events_by_slot[*i].push(e),
            None => orphan_events.push(e),
        }
    }
    let mut assessment_by_slot: Vec<Option<AssessmentRecord>> = vec![None; n];
    let mut orphan_assessments = Vec::new();
    for a in assessments.drain(..) {
        match slot_of.get(&a.player_id) {
            Some(i) => assessment_by_slot[*i] = Some(a),
            None => orphan_assessments.push(a),
        }
    }

    for spec in edge_case_table() {
        let i = spec.index();
        if i >= n {
            report.not_applicable.push(spec.player_id());
            continue;
        }

        let mut rng = bank.for_entity(StageSlot::EdgeCases, i);
        let player = spec.player();
        let mut x = [0.0; crate::config::LATENT_DIM];
        x.copy_from_slice(&cfg.sampler.sample_one(&cfg.latent_means[spec.cohort], &mut rng));
        x[3] = clamp_escalation(
            x[3],
            cfg.profiles[spec.cohort].escalation,
            cfg.state_machine.min_escalation,
        );
        let latent = LatentProfile::from_array(x);

        assessment_by_slot[i] = if spec.has_assessment() {
            Some(assessment::assess(&player, &latent, cfg, &mut rng))
        } else {
            None
        };
        events_by_slot[i] =
            behavior::generate_entity_events(&player, &latent, cfg, &mut rng, &spec.overrides(cfg));

        if let Some(reason) = spec.unsupported() {
            log::warn!("Edge case {} ({}): skipped override: {reason}", player.player_id, spec.kind.as_str());
            report.skipped.push(SkippedOverride {
                player_id: player.player_id.clone(),
                kind: spec.kind,
                reason,
            });
        }
        report.applied.push((player.player_id.clone(), spec.kind));
        pop.players[i] = player;
        pop.profiles[i] = latent;
    }

    events.extend(events_by_slot.into_iter().flatten());
    events.extend(orphan_events);
    behavior::renumber_events(events);
    assessments.extend(assessment_by_slot.into_iter().flatten());
    assessments.extend(orphan_assessments);

    log::info!(
        "Injected {} edge cases ({} skipped overrides, {} beyond population)",
        report.applied.len(),
        report.skipped.len(),
        report.not_applicable.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_ten_distinct_slots() {
        let table = edge_case_table();
        assert_eq!(table.len(), 10);
        let slots: HashSet<usize> = table.iter().map(|s| s.number).collect();
        assert_eq!(slots.len(), 10);
        assert_eq!(table[0].player_id(), "PLR_0001_MA");
        assert_eq!(table[9].player_id(), "PLR_0500_PA");
        assert_eq!(table[0].email(), "lucky.winner@example.com");
    }

    #[test]
    fn only_missing_assessment_drops_assessment() {
        let ids = missing_assessment_ids();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("PLR_0333_NJ"));
    }

    #[test]
    fn only_null_category_is_unsupported() {
        let unsupported: Vec<EdgeCaseKind> = edge_case_table()
            .iter()
            .filter(|s| s.unsupported().is_some())
            .map(|s| s.kind)
            .collect();
        assert_eq!(unsupported, vec![EdgeCaseKind::NullCategory]);
    }
}
