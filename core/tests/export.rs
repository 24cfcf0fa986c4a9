//! CSV round trips and re-validation from disk.

use betsynth_core::{
    config::GeneratorConfig,
    engine::GenerationEngine,
    export,
    validation::validate,
};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("betsynth-export-{tag}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn tables_survive_a_round_trip() {
    let cfg = GeneratorConfig::test_default(250).validate().unwrap();
    let data = GenerationEngine::new(cfg).with_validation(false).run();
    let dir = temp_dir("roundtrip");
    export::write_all(&dir, &data.population.players, &data.events, &data.assessments).unwrap();

    let tables = export::read_all(&dir).unwrap();
    // Order-insensitive comparison of the public columns.
    let written: HashSet<String> = data
        .population
        .players
        .iter()
        .map(|p| format!("{p:?}"))
        .collect();
    let read: HashSet<String> = tables.players.iter().map(|p| format!("{p:?}")).collect();
    assert_eq!(written, read);
    assert_eq!(tables.events, data.events);
    assert_eq!(tables.assessments, data.assessments);
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn headers_are_the_published_contract() {
    let cfg = GeneratorConfig::test_default(20).validate().unwrap();
    let data = GenerationEngine::new(cfg).with_validation(false).run();
    let dir = temp_dir("headers");
    let paths =
        export::write_all(&dir, &data.population.players, &data.events, &data.assessments).unwrap();

    let first_line = |p: &PathBuf| fs::read_to_string(p).unwrap().lines().next().unwrap().to_string();
    assert_eq!(
        first_line(&paths.players),
        "player_id,first_name,last_name,email,age,jurisdiction,risk_cohort"
    );
    assert_eq!(
        first_line(&paths.bets),
        "bet_id,player_id,bet_timestamp,sport_category,market_type,bet_amount,odds_american,outcome"
    );
    assert!(first_line(&paths.assessments).starts_with("assessment_id,player_id,assessment_date"));

    let bets = fs::read_to_string(&paths.bets).unwrap();
    let row = bets.lines().nth(1).unwrap();
    assert!(row.starts_with("BET_00000001,PLR_0001_MA,2026-"));
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn revalidating_from_disk_matches_memory() {
    let cfg = GeneratorConfig::test_default(300).validate().unwrap();
    let data = GenerationEngine::new(cfg.clone()).run();
    let dir = temp_dir("revalidate");
    export::write_all(&dir, &data.population.players, &data.events, &data.assessments).unwrap();

    let tables = export::read_all(&dir).unwrap();
    let from_disk = validate(&tables.players, &tables.events, &tables.assessments, &cfg);
    assert_eq!(Some(from_disk.outcomes()), data.report.as_ref().map(|r| r.outcomes()));

    let report_path = dir.join(export::REPORT_FILE);
    export::write_report(&report_path, &from_disk).unwrap();
    assert!(fs::read_to_string(report_path).unwrap().contains("population_count"));
    fs::remove_dir_all(dir).unwrap();
}
