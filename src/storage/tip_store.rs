//! Tip Storage
//! Betting companies and published tips in SQLite

use crate::balance::{RawWager, WagerStatus};
use crate::models::{BettingCompany, BettingTip, NewTip};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS betting_companies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    created_at TEXT NOT NULL
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS betting_tips (
    id TEXT PRIMARY KEY,
    betting_company_id TEXT,
    sport TEXT NOT NULL,
    league TEXT NOT NULL,
    match_name TEXT NOT NULL,
    odds REAL NOT NULL,
    stake REAL,
    total_win REAL,
    match_date TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    created_by TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (betting_company_id) REFERENCES betting_companies(id) ON DELETE SET NULL
) WITHOUT ROWID;

CREATE INDEX IF NOT EXISTS idx_betting_tips_match_date
    ON betting_tips(match_date);

CREATE INDEX IF NOT EXISTS idx_betting_tips_status
    ON betting_tips(status, match_date);
"#;

const TIP_SELECT: &str = "SELECT t.id, t.betting_company_id, c.name, t.sport, t.league,
            t.match_name, t.odds, t.stake, t.total_win, t.match_date, t.status,
            t.created_by, t.created_at
     FROM betting_tips t
     LEFT JOIN betting_companies c ON c.id = t.betting_company_id";

fn row_to_tip(row: &Row<'_>) -> rusqlite::Result<BettingTip> {
    let status: String = row.get(10)?;
    Ok(BettingTip {
        id: row.get(0)?,
        betting_company_id: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        company_name: row.get(2)?,
        sport: row.get(3)?,
        league: row.get(4)?,
        match_name: row.get(5)?,
        odds: row.get(6)?,
        stake: row.get(7)?,
        total_win: row.get(8)?,
        match_date: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        status: WagerStatus::parse_lossy(Some(&status)),
        created_by: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn row_to_company(row: &Row<'_>) -> rusqlite::Result<BettingCompany> {
    Ok(BettingCompany {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// Tip and company storage
pub struct TipStore {
    conn: Arc<Mutex<Connection>>,
}

impl TipStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        let store = Self::from_connection(conn)?;
        info!("📊 Tip database initialized at: {}", db_path);
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize tip schema")?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM betting_tips", [], |row| row.get(0))
            .unwrap_or(0);
        debug!("Existing tips in database: {}", count);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // ===== Companies =====

    pub fn create_company(&self, name: &str) -> Result<BettingCompany> {
        let company = BettingCompany {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO betting_companies (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![company.id, company.name, company.created_at],
        )
        .context("Failed to insert betting company")?;

        info!("🏦 Created betting company: {}", company.name);
        Ok(company)
    }

    /// Case-insensitive lookup by name.
    pub fn find_company_by_name(&self, name: &str) -> Result<Option<BettingCompany>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, name, created_at FROM betting_companies WHERE name = ?1 COLLATE NOCASE",
            params![name.trim()],
            row_to_company,
        )
        .optional()
        .context("Failed to look up betting company")
    }

    pub fn get_company(&self, id: &str) -> Result<Option<BettingCompany>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, name, created_at FROM betting_companies WHERE id = ?1",
            params![id],
            row_to_company,
        )
        .optional()
        .context("Failed to load betting company")
    }

    pub fn list_companies(&self) -> Result<Vec<BettingCompany>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, created_at FROM betting_companies ORDER BY name COLLATE NOCASE",
        )?;
        let companies = stmt
            .query_map([], row_to_company)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(companies)
    }

    // ===== Tips =====

    pub fn create_tip(&self, tip: &NewTip, created_by: &str) -> Result<BettingTip> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339();

        {
            let conn = self.conn.lock();
            conn.execute(
                "INSERT INTO betting_tips
                 (id, betting_company_id, sport, league, match_name, odds, stake, total_win,
                  match_date, status, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    id,
                    tip.betting_company_id,
                    tip.sport,
                    tip.league,
                    tip.match_name,
                    tip.odds,
                    tip.stake,
                    tip.total_win,
                    tip.match_date,
                    WagerStatus::Pending.as_str(),
                    created_by,
                    created_at,
                ],
            )
            .context("Failed to insert betting tip")?;
        }

        info!("📝 Tip created: {} ({})", tip.match_name, id);

        self.get_tip(&id)?
            .context("Inserted tip could not be read back")
    }

    pub fn get_tip(&self, id: &str) -> Result<Option<BettingTip>> {
        let conn = self.conn.lock();
        conn.query_row(&format!("{TIP_SELECT} WHERE t.id = ?1"), params![id], row_to_tip)
            .optional()
            .context("Failed to load betting tip")
    }

    /// Returns `false` when no tip has that id.
    pub fn update_tip_status(&self, id: &str, status: WagerStatus) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE betting_tips SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .context("Failed to update tip status")?;

        if changed == 0 {
            warn!("Tip status update matched no rows: {}", id);
        }
        Ok(changed > 0)
    }

    /// Unsettled tips, soonest match first.
    pub fn list_pending_tips(&self) -> Result<Vec<BettingTip>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{TIP_SELECT} WHERE t.status = 'pending' ORDER BY t.match_date ASC"
        ))?;
        let tips = stmt
            .query_map([], row_to_tip)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tips)
    }

    /// Tips whose match date is on or after `cutoff`, newest first.
    pub fn list_tips_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<BettingTip>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{TIP_SELECT} WHERE t.match_date >= ?1 ORDER BY t.match_date DESC"
        ))?;
        let tips = stmt
            .query_map(params![cutoff.to_rfc3339()], row_to_tip)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tips)
    }

    /// Every staked tip joined to its company, ascending by match date.
    ///
    /// Rows are returned as-is; coercion happens in the balance engine.
    pub fn fetch_wagers(&self) -> Result<Vec<RawWager>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT t.id, c.id, c.name, t.stake, t.total_win, t.status,
                        t.match_date, t.created_at
                 FROM betting_tips t
                 LEFT JOIN betting_companies c ON c.id = t.betting_company_id
                 WHERE t.stake IS NOT NULL
                 ORDER BY t.match_date ASC",
            )
            .context("Failed to prepare wager query")?;

        let wagers = stmt
            .query_map([], |row| {
                Ok(RawWager {
                    id: row.get(0)?,
                    provider_id: row.get(1)?,
                    provider_name: row.get(2)?,
                    stake: row.get(3)?,
                    realized_return: row.get(4)?,
                    status: row.get(5)?,
                    event_timestamp: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to fetch betting tips")?;

        Ok(wagers)
    }

    pub fn count_tips(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM betting_tips", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
impl TipStore {
    /// Simulate a broken backing store.
    pub(crate) fn drop_tips_table(&self) {
        self.conn
            .lock()
            .execute_batch("DROP TABLE betting_tips")
            .unwrap();
    }
}
