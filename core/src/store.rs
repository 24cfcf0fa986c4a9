//! SQLite row sink for generated tables.
//!
//! RULE: Only store.rs talks to the database.
//! It accepts rows and reports counts; it has no query surface beyond that.

use crate::{
    assessment::AssessmentRecord,
    behavior::BetEvent,
    error::GenResult,
    population::Player,
    util,
};
use rusqlite::{params, Connection};

/// Outcome of the validation stage, as recorded on the run ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunValidation {
    Passed,
    Failed,
    Skipped,
}

impl RunValidation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Tables a caller may count rows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTable {
    Players,
    Bets,
    Assessments,
}

impl RawTable {
    fn name(self) -> &'static str {
        match self {
            Self::Players => "raw_player_accounts",
            Self::Bets => "raw_bet_transactions",
            Self::Assessments => "raw_assessments",
        }
    }
}

pub struct RowStore {
    conn: Connection,
}

impl RowStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> GenResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GenResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> GenResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_raw_tables.sql"))?;
        Ok(())
    }

    // ── Run ledger ─────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        seed: u64,
        population: usize,
        version: &str,
        validation: RunValidation,
        created_at: &str,
    ) -> GenResult<()> {
        self.conn.execute(
            "INSERT INTO generation_run (run_id, seed, population, version, validation, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                seed as i64,
                population as i64,
                version,
                validation.as_str(),
                created_at
            ],
        )?;
        Ok(())
    }

    pub fn run_validation(&self, run_id: &str) -> GenResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT validation FROM generation_run WHERE run_id = ?1")?;
        let mut rows = stmt.query(params![run_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    // ── Rows ───────────────────────────────────────────────────
    // One transaction per table.

    pub fn insert_players(&mut self, run_id: &str, players: &[Player]) -> GenResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO raw_player_accounts
                 (run_id, player_id, first_name, last_name, email, age, jurisdiction, risk_cohort)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for p in players {
                stmt.execute(params![
                    run_id,
                    p.player_id,
                    p.first_name,
                    p.last_name,
                    p.email,
                    p.age,
                    p.jurisdiction.code(),
                    p.cohort.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(players.len())
    }

    pub fn insert_events(&mut self, run_id: &str, events: &[BetEvent]) -> GenResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO raw_bet_transactions
                 (run_id, bet_id, player_id, bet_timestamp, sport_category, market_type,
                  bet_amount, odds_american, outcome)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for e in events {
                stmt.execute(params![
                    run_id,
                    e.bet_id,
                    e.player_id,
                    util::format_timestamp(&e.timestamp),
                    e.category.as_str(),
                    e.market_type.as_str(),
                    e.amount,
                    e.odds,
                    e.outcome.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(events.len())
    }

    pub fn insert_assessments(
        &mut self,
        run_id: &str,
        records: &[AssessmentRecord],
    ) -> GenResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO raw_assessments
                 (run_id, assessment_id, player_id, assessment_date, sensitivity_to_loss,
                  sensitivity_to_reward, risk_tolerance, decision_consistency, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for a in records {
                stmt.execute(params![
                    run_id,
                    a.assessment_id,
                    a.player_id,
                    util::format_date(&a.assessment_date),
                    a.sensitivity_to_loss,
                    a.sensitivity_to_reward,
                    a.risk_tolerance,
                    a.decision_consistency,
                    a.version,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn row_count(&self, run_id: &str, table: RawTable) -> GenResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE run_id = ?1", table.name());
        let count = self.conn.query_row(&sql, params![run_id], |row| row.get(0))?;
        Ok(count)
    }
}
