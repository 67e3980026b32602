//! SQLite schema definitions
//!
//! Tables:
//! - fighter_index: Deduplicated profile URLs
//! - fighters: One statistics row per crawled fighter
//! - fights: Derived fight table in crawl order

use rusqlite::{Connection, Result};

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS fighter_index (
            url TEXT PRIMARY KEY,
            indexed_at TEXT DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    // seq keeps encounter order, which the matchup join depends on
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS fighters (
            seq INTEGER NOT NULL,
            url TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            record TEXT NOT NULL,
            wins INTEGER NOT NULL,
            losses INTEGER NOT NULL,
            draws INTEGER NOT NULL,
            height_cm REAL,
            weight_lbs REAL,
            reach_inch REAL,
            stance TEXT NOT NULL,
            debut INTEGER,
            slpm REAL,
            str_acc REAL,
            sapm REAL,
            str_def REAL,
            td_avg REAL,
            td_acc REAL,
            td_def REAL,
            sub_avg REAL,
            crawled_at TEXT DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS fights (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fighter TEXT NOT NULL,
            opponent TEXT NOT NULL,
            result TEXT NOT NULL,
            fighters_win INTEGER NOT NULL,
            opponents_win INTEGER NOT NULL
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_fighters_seq ON fighters(seq)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_fights_fighter ON fights(fighter)",
        [],
    )?;

    Ok(())
}
