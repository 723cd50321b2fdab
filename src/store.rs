// SQLite persistence for finished auction sessions.
//
// The engine's outbound collaborator boundary: once the sequencer runs dry,
// the final per-team state is written here keyed by a session identifier,
// for later read-only display. Nothing in the bidding path touches the
// database.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};

use crate::auction::session::AuctionSession;

/// SQLite-backed persistence for auction session results.
pub struct Database {
    conn: Mutex<Connection>,
}

/// One team's final state as read back from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamResult {
    pub team_id: String,
    pub team_name: String,
    pub color: String,
    pub budget_remaining: u64,
    pub initial_budget: u64,
    pub needed_roles: Vec<String>,
    pub squad: Vec<SquadEntry>,
}

/// One squad member as read back from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct SquadEntry {
    pub player_id: String,
    pub player_name: String,
    pub role: String,
    pub player_type: String,
    pub price: u64,
    pub is_new_buy: bool,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database
    /// (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS auction_sessions (
                session_id  TEXT PRIMARY KEY,
                recorded_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS team_results (
                session_id       TEXT NOT NULL REFERENCES auction_sessions(session_id),
                team_id          TEXT NOT NULL,
                team_name        TEXT NOT NULL,
                color            TEXT NOT NULL,
                budget_remaining INTEGER NOT NULL,
                initial_budget   INTEGER NOT NULL,
                needed_roles     TEXT NOT NULL,
                PRIMARY KEY (session_id, team_id)
            );

            CREATE TABLE IF NOT EXISTS squad_players (
                session_id  TEXT NOT NULL REFERENCES auction_sessions(session_id),
                team_id     TEXT NOT NULL,
                player_id   TEXT NOT NULL,
                player_name TEXT NOT NULL,
                role        TEXT NOT NULL,
                player_type TEXT NOT NULL,
                price       INTEGER NOT NULL,
                is_new_buy  INTEGER NOT NULL,
                PRIMARY KEY (session_id, team_id, player_id)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock); the database state cannot be trusted after that.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Generate a fresh session identifier.
    pub fn generate_session_id() -> String {
        format!("auction-{}", Utc::now().format("%Y%m%d-%H%M%S"))
    }

    /// Persist the final state of a finished session in one transaction.
    pub fn record_session(&self, session_id: &str, session: &AuctionSession) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin results transaction")?;

        tx.execute(
            "INSERT INTO auction_sessions (session_id, recorded_at) VALUES (?1, ?2)",
            params![session_id, Utc::now().to_rfc3339()],
        )
        .with_context(|| format!("failed to insert session {session_id}"))?;

        for team in &session.teams {
            let needed_roles: Vec<String> = team
                .needed_roles
                .iter()
                .map(|r| r.display_str().to_string())
                .collect();
            let needed_roles = serde_json::to_string(&needed_roles)
                .context("failed to encode needed roles")?;

            tx.execute(
                "INSERT INTO team_results
                     (session_id, team_id, team_name, color, budget_remaining,
                      initial_budget, needed_roles)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session_id,
                    team.team_id,
                    team.team_name,
                    team.color,
                    team.budget as i64,
                    team.initial_budget as i64,
                    needed_roles,
                ],
            )
            .with_context(|| format!("failed to insert team {}", team.team_id))?;

            for player in &team.players {
                tx.execute(
                    "INSERT INTO squad_players
                         (session_id, team_id, player_id, player_name, role,
                          player_type, price, is_new_buy)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        session_id,
                        team.team_id,
                        player.id,
                        player.name,
                        player.role.display_str(),
                        player.player_type.display_str(),
                        player.price.unwrap_or(0) as i64,
                        player.is_new_buy as i64,
                    ],
                )
                .with_context(|| format!("failed to insert squad player {}", player.id))?;
            }
        }

        tx.commit().context("failed to commit session results")?;
        Ok(())
    }

    /// Load every team's final state for a recorded session, squads
    /// included, ordered by team id.
    pub fn load_session(&self, session_id: &str) -> Result<Vec<TeamResult>> {
        let conn = self.conn();

        let mut teams_stmt = conn
            .prepare(
                "SELECT team_id, team_name, color, budget_remaining, initial_budget,
                        needed_roles
                 FROM team_results
                 WHERE session_id = ?1
                 ORDER BY team_id",
            )
            .context("failed to prepare team query")?;

        let mut squad_stmt = conn
            .prepare(
                "SELECT player_id, player_name, role, player_type, price, is_new_buy
                 FROM squad_players
                 WHERE session_id = ?1 AND team_id = ?2
                 ORDER BY player_id",
            )
            .context("failed to prepare squad query")?;

        let rows = teams_stmt
            .query_map(params![session_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .context("failed to query team results")?;

        let mut results = Vec::new();
        for row in rows {
            let (team_id, team_name, color, budget_remaining, initial_budget, needed_roles) =
                row.context("failed to read team result row")?;

            let needed_roles: Vec<String> = serde_json::from_str(&needed_roles)
                .context("failed to decode needed roles")?;

            let squad_rows = squad_stmt
                .query_map(params![session_id, team_id], |row| {
                    Ok(SquadEntry {
                        player_id: row.get(0)?,
                        player_name: row.get(1)?,
                        role: row.get(2)?,
                        player_type: row.get(3)?,
                        price: row.get::<_, i64>(4)? as u64,
                        is_new_buy: row.get::<_, i64>(5)? != 0,
                    })
                })
                .context("failed to query squad players")?;

            let mut squad = Vec::new();
            for entry in squad_rows {
                squad.push(entry.context("failed to read squad row")?);
            }

            results.push(TeamResult {
                team_id,
                team_name,
                color,
                budget_remaining: budget_remaining as u64,
                initial_budget: initial_budget as u64,
                needed_roles,
                squad,
            });
        }

        Ok(results)
    }

    /// List recorded session ids, newest first.
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT session_id FROM auction_sessions ORDER BY recorded_at DESC")
            .context("failed to prepare session list query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("failed to query sessions")?;

        let mut ids = Vec::new();
        for id in rows {
            ids.push(id.context("failed to read session id")?);
        }
        Ok(ids)
    }
}
