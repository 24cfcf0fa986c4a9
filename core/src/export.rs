//! CSV export and re-import of the three output tables.
//!
//! Column order is fixed and is the contract with downstream loaders.
//! Latent profiles are never written.

use crate::{
    assessment::AssessmentRecord,
    behavior::BetEvent,
    error::{GenError, GenResult},
    population::Player,
    util,
    validation::ValidationReport,
};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const PLAYERS_FILE: &str = "players.csv";
pub const BETS_FILE: &str = "bets.csv";
pub const ASSESSMENTS_FILE: &str = "assessments.csv";
pub const REPORT_FILE: &str = "validation_report.json";

pub const PLAYER_COLUMNS: [&str; 7] = [
    "player_id",
    "first_name",
    "last_name",
    "email",
    "age",
    "jurisdiction",
    "risk_cohort",
];
pub const BET_COLUMNS: [&str; 8] = [
    "bet_id",
    "player_id",
    "bet_timestamp",
    "sport_category",
    "market_type",
    "bet_amount",
    "odds_american",
    "outcome",
];
pub const ASSESSMENT_COLUMNS: [&str; 8] = [
    "assessment_id",
    "player_id",
    "assessment_date",
    "sensitivity_to_loss",
    "sensitivity_to_reward",
    "risk_tolerance",
    "decision_consistency",
    "version",
];

#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub players: PathBuf,
    pub bets: PathBuf,
    pub assessments: PathBuf,
    pub report: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            players: dir.join(PLAYERS_FILE),
            bets: dir.join(BETS_FILE),
            assessments: dir.join(ASSESSMENTS_FILE),
            report: dir.join(REPORT_FILE),
        }
    }
}

// ── Writing ────────────────────────────────────────────────────────

/// Quote a text field when it would otherwise break the row.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn write_players(path: impl AsRef<Path>, players: &[Player]) -> GenResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{}", PLAYER_COLUMNS.join(","))?;
    for p in players {
        writeln!(
            w,
            "{},{},{},{},{},{},{}",
            field(&p.player_id),
            field(&p.first_name),
            field(&p.last_name),
            field(&p.email),
            p.age,
            p.jurisdiction,
            p.cohort,
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_events(path: impl AsRef<Path>, events: &[BetEvent]) -> GenResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{}", BET_COLUMNS.join(","))?;
    for e in events {
        writeln!(
            w,
            "{},{},{},{},{},{:.2},{},{}",
            field(&e.bet_id),
            field(&e.player_id),
            util::format_timestamp(&e.timestamp),
            e.category,
            e.market_type,
            e.amount,
            e.odds,
            e.outcome,
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_assessments(path: impl AsRef<Path>, records: &[AssessmentRecord]) -> GenResult<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{}", ASSESSMENT_COLUMNS.join(","))?;
    for a in records {
        writeln!(
            w,
            "{},{},{},{:.2},{:.2},{:.2},{:.2},{}",
            field(&a.assessment_id),
            field(&a.player_id),
            util::format_date(&a.assessment_date),
            a.sensitivity_to_loss,
            a.sensitivity_to_reward,
            a.risk_tolerance,
            a.decision_consistency,
            field(&a.version),
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_report(path: impl AsRef<Path>, report: &ValidationReport) -> GenResult<()> {
    let w = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(w, report)?;
    Ok(())
}

/// Write all three tables into `dir`, creating it if needed.
pub fn write_all(
    dir: impl AsRef<Path>,
    players: &[Player],
    events: &[BetEvent],
    assessments: &[AssessmentRecord],
) -> GenResult<OutputPaths> {
    fs::create_dir_all(dir.as_ref())?;
    let paths = OutputPaths::in_dir(dir);
    write_players(&paths.players, players)?;
    write_events(&paths.bets, events)?;
    write_assessments(&paths.assessments, assessments)?;
    log::info!(
        "Wrote {} players, {} events, {} assessments to {}",
        players.len(),
        events.len(),
        assessments.len(),
        paths.players.parent().map(|p| p.display().to_string()).unwrap_or_default()
    );
    Ok(paths)
}

// ── Reading ────────────────────────────────────────────────────────

/// Split one CSV row, honouring double-quoted fields.
fn split_row(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => quoted = false,
            ('"', false) if current.is_empty() => quoted = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }
    if quoted {
        return Err("unterminated quoted field".into());
    }
    fields.push(current);
    Ok(fields)
}

/// One parsed row with its position, for error reporting.
struct Row<'a> {
    file: &'a str,
    line: usize,
    fields: Vec<String>,
}

impl Row<'_> {
    fn error(&self, reason: impl Into<String>) -> GenError {
        GenError::Parse {
            file: self.file.to_string(),
            line: self.line,
            reason: reason.into(),
        }
    }

    fn text(&self, i: usize) -> String {
        self.fields[i].clone()
    }

    fn parse<T: FromStr>(&self, i: usize, column: &str) -> GenResult<T> {
        self.fields[i]
            .trim()
            .parse()
            .map_err(|_| self.error(format!("bad {column} '{}'", self.fields[i])))
    }
}

fn read_rows<T>(
    path: &Path,
    columns: &[&str],
    mut convert: impl FnMut(&Row<'_>) -> GenResult<T>,
) -> GenResult<Vec<T>> {
    let file = path.display().to_string();
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let fields = split_row(&line).map_err(|reason| GenError::Parse {
            file: file.clone(),
            line: line_no,
            reason,
        })?;
        let row = Row {
            file: &file,
            line: line_no,
            fields,
        };
        if i == 0 {
            if row.fields != columns {
                return Err(row.error(format!("expected header {}", columns.join(","))));
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if row.fields.len() != columns.len() {
            return Err(row.error(format!(
                "expected {} columns, found {}",
                columns.len(),
                row.fields.len()
            )));
        }
        out.push(convert(&row)?);
    }
    Ok(out)
}

pub fn read_players(path: impl AsRef<Path>) -> GenResult<Vec<Player>> {
    read_rows(path.as_ref(), &PLAYER_COLUMNS, |r| {
        Ok(Player {
            player_id: r.text(0),
            first_name: r.text(1),
            last_name: r.text(2),
            email: r.text(3),
            age: r.parse(4, "age")?,
            jurisdiction: r.parse(5, "jurisdiction")?,
            cohort: r.parse(6, "risk_cohort")?,
        })
    })
}

pub fn read_events(path: impl AsRef<Path>) -> GenResult<Vec<BetEvent>> {
    read_rows(path.as_ref(), &BET_COLUMNS, |r| {
        let timestamp = util::parse_timestamp(&r.fields[2])
            .ok_or_else(|| r.error(format!("bad bet_timestamp '{}'", r.fields[2])))?;
        Ok(BetEvent {
            bet_id: r.text(0),
            player_id: r.text(1),
            timestamp,
            category: r.parse(3, "sport_category")?,
            market_type: r.parse(4, "market_type")?,
            amount: r.parse(5, "bet_amount")?,
            odds: r.parse(6, "odds_american")?,
            outcome: r.parse(7, "outcome")?,
        })
    })
}

pub fn read_assessments(path: impl AsRef<Path>) -> GenResult<Vec<AssessmentRecord>> {
    read_rows(path.as_ref(), &ASSESSMENT_COLUMNS, |r| {
        let assessment_date = util::parse_date(&r.fields[2])
            .ok_or_else(|| r.error(format!("bad assessment_date '{}'", r.fields[2])))?;
        Ok(AssessmentRecord {
            assessment_id: r.text(0),
            player_id: r.text(1),
            assessment_date,
            sensitivity_to_loss: r.parse(3, "sensitivity_to_loss")?,
            sensitivity_to_reward: r.parse(4, "sensitivity_to_reward")?,
            risk_tolerance: r.parse(5, "risk_tolerance")?,
            decision_consistency: r.parse(6, "decision_consistency")?,
            version: r.text(7),
        })
    })
}

/// The three tables as re-read from an output directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub players: Vec<Player>,
    pub events: Vec<BetEvent>,
    pub assessments: Vec<AssessmentRecord>,
}

pub fn read_all(dir: impl AsRef<Path>) -> GenResult<Tables> {
    let paths = OutputPaths::in_dir(dir);
    Ok(Tables {
        players: read_players(&paths.players)?,
        events: read_events(&paths.bets)?,
        assessments: read_assessments(&paths.assessments)?,
    })
}
