//! Configuration errors are fatal and raised before any generation.

use betsynth_core::{
    config::GeneratorConfig,
    error::{ConfigError, GenError},
    types::{Cohort, SportCategory},
};
use std::fs;

#[test]
fn asymmetric_correlation_is_rejected() {
    let mut cfg = GeneratorConfig::research_default();
    cfg.latent.correlation[0][1] = 0.31;
    assert_eq!(
        cfg.validate().unwrap_err(),
        ConfigError::NotSymmetric { row: 0, col: 1 }
    );
}

#[test]
fn non_unit_diagonal_is_rejected() {
    let mut cfg = GeneratorConfig::research_default();
    cfg.latent.correlation[2][2] = 0.9;
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::NonUnitDiagonal { index: 2, .. })
    ));
}

#[test]
fn indefinite_correlation_is_rejected() {
    let mut cfg = GeneratorConfig::research_default();
    // Valid-looking entries, but no covariance matrix has them.
    cfg.latent.correlation = vec![
        vec![1.0, 0.95, -0.95, 0.0],
        vec![0.95, 1.0, 0.95, 0.0],
        vec![-0.95, 0.95, 1.0, 0.0],
        vec![0.0, 0.0, 0.0, 1.0],
    ];
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::NotPositiveDefinite { .. })
    ));
}

#[test]
fn missing_category_and_cohort_are_named() {
    let mut cfg = GeneratorConfig::research_default();
    cfg.category_baseline.remove(&SportCategory::Mma);
    assert_eq!(
        cfg.validate().unwrap_err(),
        ConfigError::MissingCategory {
            table: "category_baseline",
            category: SportCategory::Mma
        }
    );

    let mut cfg = GeneratorConfig::research_default();
    cfg.latent.means.remove(&Cohort::HighRisk);
    assert_eq!(
        cfg.validate().unwrap_err(),
        ConfigError::MissingCohort {
            table: "latent.means",
            cohort: Cohort::HighRisk
        }
    );
}

#[test]
fn zero_population_is_rejected() {
    let cfg = GeneratorConfig::research_default().with_population(0);
    assert!(matches!(cfg.validate(), Err(ConfigError::InvalidParameter { .. })));
}

#[test]
fn load_reads_overrides_from_disk() {
    let dir = std::env::temp_dir().join(format!("betsynth-config-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let path = dir.join("config.json");
    fs::write(&path, r#"{ "seed": 11, "population": 2500 }"#).unwrap();
    let cfg = GeneratorConfig::load(&path).unwrap().validate().unwrap();
    assert_eq!(cfg.seed, 11);
    assert_eq!(cfg.population, 2_500);
    assert_eq!(cfg.source().seed, 11);

    let bad = dir.join("bad.json");
    fs::write(&bad, "{ not json").unwrap();
    assert!(matches!(GeneratorConfig::load(&bad), Err(GenError::Serialization(_))));
    assert!(matches!(
        GeneratorConfig::load(dir.join("absent.json")),
        Err(GenError::Io(_))
    ));
    fs::remove_dir_all(dir).unwrap();
}
