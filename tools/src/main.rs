//! betsynth: command-line runner for the synthetic betting data generator.
//!
//! Usage:
//!   betsynth generate --output-dir data --population 10000 --seed 42
//!   betsynth generate --output-dir data --no-validate --db run.db
//!   betsynth validate --input-dir data --strict
//!   betsynth show-edge-cases

use anyhow::{Context, Result};
use betsynth_core::{
    config::{GeneratorConfig, ValidatedConfig},
    edge_cases,
    engine::{GenerationEngine, GeneratedData},
    export,
    store::{RawTable, RowStore, RunValidation},
    types::Cohort,
    validation::{self, CheckTier, ValidationReport},
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "betsynth")]
#[command(about = "Generate and validate synthetic betting behaviour data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate players, bets and assessments as CSV
    Generate {
        /// Directory the CSV files are written to
        #[arg(short, long, default_value = "data")]
        output_dir: PathBuf,

        /// Number of players (overrides the config file)
        #[arg(short, long)]
        population: Option<usize>,

        /// Master random seed (overrides the config file)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Skip the validation suite
        #[arg(long)]
        no_validate: bool,

        /// Exit non-zero when validation fails
        #[arg(long)]
        strict: bool,

        /// JSON configuration overriding the research defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also load the tables into this SQLite database
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Run the validation suite over an existing output directory
    Validate {
        #[arg(short, long, default_value = "data")]
        input_dir: PathBuf,

        /// Expected number of players (overrides the config file)
        #[arg(short, long)]
        population: Option<usize>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        strict: bool,
    },
    /// List the boundary-condition entities injected into every run
    ShowEdgeCases,
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    match Cli::parse().command {
        Command::Generate {
            output_dir,
            population,
            seed,
            no_validate,
            strict,
            config,
            db,
        } => {
            let cfg = load_config(config.as_deref(), population, seed)?;
            let report = generate(cfg, &output_dir, !no_validate, db.as_deref())?;
            Ok(exit_code(report.as_ref(), strict))
        }
        Command::Validate {
            input_dir,
            population,
            config,
            strict,
        } => {
            let cfg = load_config(config.as_deref(), population, None)?;
            let report = validate_dir(&cfg, &input_dir)?;
            Ok(exit_code(Some(&report), strict))
        }
        Command::ShowEdgeCases => {
            show_edge_cases();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(
    path: Option<&Path>,
    population: Option<usize>,
    seed: Option<u64>,
) -> Result<ValidatedConfig> {
    let mut cfg = match path {
        Some(p) => GeneratorConfig::load(p)
            .with_context(|| format!("loading config {}", p.display()))?,
        None => GeneratorConfig::research_default(),
    };
    if let Some(n) = population {
        cfg = cfg.with_population(n);
    }
    if let Some(s) = seed {
        cfg = cfg.with_seed(s);
    }
    cfg.validate().context("invalid configuration")
}

fn generate(
    cfg: ValidatedConfig,
    output_dir: &Path,
    validate: bool,
    db: Option<&Path>,
) -> Result<Option<ValidationReport>> {
    println!("betsynth: synthetic betting data generator");
    println!("  seed:        {}", cfg.seed);
    println!("  population:  {}", cfg.population);
    println!(
        "  window:      {} .. {}",
        cfg.window.start(),
        cfg.window.end()
    );
    println!("  output:      {}", output_dir.display());
    println!();

    let engine = GenerationEngine::new(cfg).with_validation(validate);
    let data = engine.run_with_progress(|stage, detail| {
        println!("[{:<12}] {detail}", stage.as_str());
    });

    for skipped in &data.injection.skipped {
        println!("  skipped override for {}: {}", skipped.player_id, skipped.reason);
    }
    if !data.injection.not_applicable.is_empty() {
        println!(
            "  edge cases beyond population: {}",
            data.injection.not_applicable.join(", ")
        );
    }

    let paths = export::write_all(
        output_dir,
        &data.population.players,
        &data.events,
        &data.assessments,
    )?;
    println!("[{:<12}] {}", "export", paths.players.display());
    println!("[{:<12}] {}", "export", paths.bets.display());
    println!("[{:<12}] {}", "export", paths.assessments.display());
    if let Some(report) = &data.report {
        export::write_report(&paths.report, report)?;
        println!("[{:<12}] {}", "export", paths.report.display());
    }

    if let Some(db) = db {
        load_database(db, engine.config(), &data)?;
    }

    print_summary(&data);
    if let Some(report) = &data.report {
        print_report(report);
    }
    Ok(data.report)
}

fn load_database(path: &Path, cfg: &ValidatedConfig, data: &GeneratedData) -> Result<()> {
    log::info!("Loading tables into {}", path.display());
    let mut store = RowStore::open(&path.to_string_lossy())?;
    store.migrate()?;

    let now = chrono::Local::now();
    let run_id = format!("run-{}-{}", cfg.seed, now.format("%Y%m%d%H%M%S"));
    let validation = match &data.report {
        Some(r) if r.passed() => RunValidation::Passed,
        Some(_) => RunValidation::Failed,
        None => RunValidation::Skipped,
    };
    store.insert_run(
        &run_id,
        cfg.seed,
        cfg.population,
        env!("CARGO_PKG_VERSION"),
        validation,
        &now.format("%Y-%m-%dT%H:%M:%S").to_string(),
    )?;
    store.insert_players(&run_id, &data.population.players)?;
    store.insert_events(&run_id, &data.events)?;
    store.insert_assessments(&run_id, &data.assessments)?;

    println!(
        "[{:<12}] {} ({run_id}: {} players, {} bets, {} assessments)",
        "database",
        path.display(),
        store.row_count(&run_id, RawTable::Players)?,
        store.row_count(&run_id, RawTable::Bets)?,
        store.row_count(&run_id, RawTable::Assessments)?,
    );
    Ok(())
}

fn validate_dir(cfg: &ValidatedConfig, dir: &Path) -> Result<ValidationReport> {
    let tables = export::read_all(dir)
        .with_context(|| format!("reading tables from {}", dir.display()))?;
    println!(
        "Read {} players, {} bets, {} assessments from {}",
        tables.players.len(),
        tables.events.len(),
        tables.assessments.len(),
        dir.display()
    );
    let report = validation::validate(&tables.players, &tables.events, &tables.assessments, cfg);
    export::write_report(dir.join(export::REPORT_FILE), &report)?;
    print_report(&report);
    Ok(report)
}

fn print_summary(data: &GeneratedData) {
    let s = data.summary();
    println!();
    println!("=== Run summary ===");
    println!("  players:       {}", s.players);
    for cohort in Cohort::ALL {
        let n = s.cohort_counts[cohort];
        println!(
            "    {:<12} {n:>7} ({:.2}%)",
            cohort.as_str(),
            100.0 * n as f64 / s.players.max(1) as f64
        );
    }
    println!("  bets:          {}", s.events);
    println!("  assessments:   {}", s.assessments);
    println!("  total handle:  ${:.2}", s.handle);
    println!("  player net:    ${:.2}", s.player_net);
}

fn print_report(report: &ValidationReport) {
    println!();
    println!("=== Validation ===");
    for tier in CheckTier::ALL {
        let status = if report.tier_passed(tier) { "PASS" } else { "FAIL" };
        println!("  {} [{status}]", tier.as_str());
        for (name, check) in report.tier(tier) {
            let mark = if check.passed { "ok  " } else { "FAIL" };
            println!("    {mark} {name:<44} {}", check.detail);
        }
    }
    let failures = report.failures();
    if failures.is_empty() {
        println!("  all {} checks passed", report.checks.len());
    } else {
        println!(
            "  {} of {} checks failed: {}",
            failures.len(),
            report.checks.len(),
            failures.join(", ")
        );
    }
}

fn show_edge_cases() {
    println!("{:<14} {:<24} {:<16} {:>3} {:<12} {:>5}  description", "player_id", "kind", "name", "age", "cohort", "bets");
    for spec in edge_cases::edge_case_table() {
        let assessment = if spec.has_assessment() { "" } else { " (no assessment)" };
        println!(
            "{:<14} {:<24} {:<16} {:>3} {:<12} {:>5}  {}{assessment}",
            spec.player_id(),
            spec.kind.as_str(),
            format!("{} {}", spec.first_name, spec.last_name),
            spec.age,
            spec.cohort.as_str(),
            spec.event_count,
            spec.description,
        );
        if let Some(reason) = spec.unsupported() {
            println!("{:<14} not applied: {reason}", "");
        }
    }
}

/// Validation is advisory unless `--strict` is given.
fn exit_code(report: Option<&ValidationReport>, strict: bool) -> ExitCode {
    match report {
        Some(r) if strict && !r.passed() => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
