//! SQLite repository for crawled fighter data

use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::path::Path;

use super::schema::create_tables;
use crate::dataset::fights::FightTable;
use crate::types::{FightRecord, FightResult, FighterStatsRecord, FighterUrl};
use crate::{Error, Result};

/// Repository for the fighter index, fighter stats and fight table
pub struct FighterRepository {
    conn: Connection,
}

impl FighterRepository {
    /// Create a new repository, initializing the database if needed
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        create_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Create an in-memory repository (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    // ==================== Fighter index ====================

    /// Replace the stored index
    pub fn save_index(&mut self, urls: &BTreeSet<FighterUrl>) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM fighter_index", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO fighter_index (url) VALUES (?1)")?;
            for url in urls {
                stmt.execute([url.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_index(&self) -> Result<BTreeSet<FighterUrl>> {
        let mut stmt = self.conn.prepare("SELECT url FROM fighter_index")?;
        let urls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|r| r.map(FighterUrl::new))
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        Ok(urls)
    }

    // ==================== Fighters ====================

    /// Replace all stored fighters, keeping the given order
    pub fn replace_fighters(&mut self, fighters: &[FighterStatsRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM fighters", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO fighters
                (seq, url, name, record, wins, losses, draws, height_cm, weight_lbs,
                 reach_inch, stance, debut, slpm, str_acc, sapm, str_def, td_avg,
                 td_acc, td_def, sub_avg)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
                "#,
            )?;
            for (seq, f) in fighters.iter().enumerate() {
                stmt.execute(params![
                    seq as i64,
                    f.url,
                    f.name,
                    f.record,
                    f.wins,
                    f.losses,
                    f.draws,
                    f.height_cm,
                    f.weight_lbs,
                    f.reach_inch,
                    f.stance,
                    f.debut,
                    f.slpm,
                    f.str_acc,
                    f.sapm,
                    f.str_def,
                    f.td_avg,
                    f.td_acc,
                    f.td_def,
                    f.sub_avg,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_fighters(&self) -> Result<Vec<FighterStatsRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT url, name, record, wins, losses, draws, height_cm, weight_lbs,
                   reach_inch, stance, debut, slpm, str_acc, sapm, str_def, td_avg,
                   td_acc, td_def, sub_avg
            FROM fighters
            ORDER BY seq
            "#,
        )?;

        let fighters = stmt
            .query_map([], |row| {
                Ok(FighterStatsRecord {
                    url: row.get(0)?,
                    name: row.get(1)?,
                    record: row.get(2)?,
                    wins: row.get(3)?,
                    losses: row.get(4)?,
                    draws: row.get(5)?,
                    height_cm: row.get(6)?,
                    weight_lbs: row.get(7)?,
                    reach_inch: row.get(8)?,
                    stance: row.get(9)?,
                    debut: row.get(10)?,
                    slpm: row.get(11)?,
                    str_acc: row.get(12)?,
                    sapm: row.get(13)?,
                    str_def: row.get(14)?,
                    td_avg: row.get(15)?,
                    td_acc: row.get(16)?,
                    td_def: row.get(17)?,
                    sub_avg: row.get(18)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(fighters)
    }

    // ==================== Fights ====================

    /// Replace the stored fight table
    pub fn replace_fights(&mut self, fights: &FightTable) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM fights", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO fights (fighter, opponent, result, fighters_win, opponents_win)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for r in fights.records() {
                stmt.execute(params![
                    r.fighter,
                    r.opponent,
                    r.result.as_str(),
                    r.fighters_win,
                    r.opponents_win,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_fights(&self) -> Result<FightTable> {
        let mut stmt = self.conn.prepare(
            "SELECT fighter, opponent, result, fighters_win, opponents_win FROM fights ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i8>(3)?,
                    row.get::<_, i8>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for (fighter, opponent, raw, fighters_win, opponents_win) in rows {
            let result = FightResult::parse(&raw).ok_or_else(|| Error::UnknownResultKind {
                fighter: fighter.clone(),
                opponent: opponent.clone(),
                raw: raw.clone(),
            })?;
            records.push(FightRecord {
                fighter,
                opponent,
                result,
                fighters_win,
                opponents_win,
            });
        }

        Ok(FightTable::from_records(records))
    }

    pub fn fighter_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM fighters", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn fight_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM fights", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_fighter(name: &str) -> FighterStatsRecord {
        FighterStatsRecord {
            url: format!("http://ufcstats.com/fighter-details/{}", name.to_lowercase()),
            name: name.to_string(),
            record: "Record: 10-2-0".to_string(),
            wins: 10,
            losses: 2,
            draws: 0,
            height_cm: Some(180.34),
            weight_lbs: Some(155.0),
            reach_inch: None,
            stance: "Orthodox".to_string(),
            debut: Some(1990),
            slpm: Some(4.1),
            str_acc: Some(0.45),
            sapm: Some(3.2),
            str_def: Some(0.6),
            td_avg: None,
            td_acc: Some(0.4),
            td_def: Some(0.7),
            sub_avg: Some(0.5),
        }
    }

    fn record(fighter: &str, opponent: &str, result: FightResult) -> FightRecord {
        let (fighters_win, opponents_win) = result.indicators();
        FightRecord {
            fighter: fighter.to_string(),
            opponent: opponent.to_string(),
            result,
            fighters_win,
            opponents_win,
        }
    }

    #[test]
    fn test_save_and_load_index() {
        let mut repo = FighterRepository::in_memory().unwrap();
        let urls: BTreeSet<FighterUrl> = ["http://x/b", "http://x/a"].into_iter().map(FighterUrl::from).collect();

        repo.save_index(&urls).unwrap();
        assert_eq!(repo.load_index().unwrap(), urls);

        let smaller: BTreeSet<FighterUrl> = [FighterUrl::from("http://x/c")].into_iter().collect();
        repo.save_index(&smaller).unwrap();
        assert_eq!(repo.load_index().unwrap(), smaller);
    }

    #[test]
    fn test_fighters_keep_crawl_order_and_missing_values() {
        let mut repo = FighterRepository::in_memory().unwrap();
        let fighters = vec![create_test_fighter("Zed"), create_test_fighter("Abe")];

        repo.replace_fighters(&fighters).unwrap();
        let loaded = repo.load_fighters().unwrap();

        assert_eq!(loaded, fighters);
        assert_eq!(loaded[0].reach_inch, None);
        assert_eq!(repo.fighter_count().unwrap(), 2);
    }

    #[test]
    fn test_replace_fights() {
        let mut repo = FighterRepository::in_memory().unwrap();
        let table = FightTable::from_records(vec![
            record("Alpha", "Bravo", FightResult::Win),
            record("Alpha", "Charlie", FightResult::NoContest),
        ]);

        repo.replace_fights(&table).unwrap();
        repo.replace_fights(&table).unwrap();

        assert_eq!(repo.fight_count().unwrap(), 2);
        assert_eq!(repo.load_fights().unwrap(), table);
    }
}
