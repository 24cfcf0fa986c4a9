//! Synthetic betting-behaviour data generator.
//!
//! A seeded, single-threaded batch pipeline: correlated latent factors →
//! population → assessments and per-entity betting histories → edge-case
//! injection → validation → CSV (and optional SQLite) output.

pub mod assessment;
pub mod behavior;
pub mod config;
pub mod edge_cases;
pub mod engine;
pub mod error;
pub mod export;
pub mod factor;
pub mod market_drift;
pub mod name_generator;
pub mod population;
pub mod rng;
pub mod stats;
pub mod store;
pub mod types;
pub mod util;
pub mod validation;
