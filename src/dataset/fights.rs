//! Fight history accumulation and win-indicator derivation.

use serde::{Deserialize, Serialize};

use crate::types::{FightRecord, FightResult};
use crate::{Error, Result};

/// Bouts parsed from one profile page, as parallel columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterBouts {
    pub url: String,
    pub fighter: Vec<String>,
    pub opponent: Vec<String>,
    /// Raw outcome flags, validated when indicators are derived
    pub result: Vec<String>,
}

impl FighterBouts {
    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// Fighter, opponent and result counts must agree
    pub fn check_consistency(&self) -> Result<()> {
        let (fighters, opponents, results) =
            (self.fighter.len(), self.opponent.len(), self.result.len());
        if fighters != opponents || fighters != results {
            return Err(Error::ConsistencyViolation {
                url: self.url.clone(),
                fighters,
                opponents,
                results,
            });
        }
        Ok(())
    }

    /// Consistency plus a recognized outcome for every bout.
    ///
    /// Run per profile so an odd flag fails only the fighter it belongs to.
    pub fn validate(&self) -> Result<()> {
        self.check_consistency()?;
        for ((fighter, opponent), raw) in self.fighter.iter().zip(&self.opponent).zip(&self.result) {
            parse_result(fighter, opponent, raw)?;
        }
        Ok(())
    }
}

fn parse_result(fighter: &str, opponent: &str, raw: &str) -> Result<FightResult> {
    FightResult::parse(raw).ok_or_else(|| Error::UnknownResultKind {
        fighter: fighter.to_string(),
        opponent: opponent.to_string(),
        raw: raw.to_string(),
    })
}

/// Append-only accumulator of per-fighter bouts
#[derive(Debug, Clone, Default)]
pub struct FightHistory {
    fighter: Vec<String>,
    opponent: Vec<String>,
    result: Vec<String>,
}

impl FightHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one fighter's bouts after checking their consistency
    pub fn push(&mut self, bouts: FighterBouts) -> Result<()> {
        bouts.check_consistency()?;
        self.fighter.extend(bouts.fighter);
        self.opponent.extend(bouts.opponent);
        self.result.extend(bouts.result);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// Map every result to its indicator pair.
    ///
    /// Fails with [`Error::UnknownResultKind`] on the first result outside
    /// `win`, `loss`, `draw` and `nc`.
    pub fn derive(self) -> Result<FightTable> {
        let mut records = Vec::with_capacity(self.result.len());

        for ((fighter, opponent), raw) in self.fighter.into_iter().zip(self.opponent).zip(self.result) {
            let result = parse_result(&fighter, &opponent, &raw)?;
            let (fighters_win, opponents_win) = result.indicators();
            records.push(FightRecord {
                fighter,
                opponent,
                result,
                fighters_win,
                opponents_win,
            });
        }

        Ok(FightTable { records })
    }
}

/// Parallel columns keyed the way the fight table is published
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightColumns {
    #[serde(rename = "Fighter")]
    pub fighter: Vec<String>,
    #[serde(rename = "Opponent")]
    pub opponent: Vec<String>,
    #[serde(rename = "Result")]
    pub result: Vec<String>,
    #[serde(rename = "Fighters_Win")]
    pub fighters_win: Vec<i8>,
    #[serde(rename = "Opponents_Win")]
    pub opponents_win: Vec<i8>,
}

/// Immutable table of derived fight records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FightTable {
    records: Vec<FightRecord>,
}

impl FightTable {
    pub fn from_records(records: Vec<FightRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[FightRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The table as a mapping of parallel sequences
    pub fn columns(&self) -> FightColumns {
        let mut columns = FightColumns::default();
        for r in &self.records {
            columns.fighter.push(r.fighter.clone());
            columns.opponent.push(r.opponent.clone());
            columns.result.push(r.result.as_str().to_string());
            columns.fighters_win.push(r.fighters_win);
            columns.opponents_win.push(r.opponents_win);
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bouts(url: &str, rows: &[(&str, &str, &str)]) -> FighterBouts {
        FighterBouts {
            url: url.to_string(),
            fighter: rows.iter().map(|r| r.0.to_string()).collect(),
            opponent: rows.iter().map(|r| r.1.to_string()).collect(),
            result: rows.iter().map(|r| r.2.to_string()).collect(),
        }
    }

    #[test]
    fn test_derive_indicator_pairs() {
        let mut history = FightHistory::new();
        history
            .push(bouts(
                "a",
                &[
                    ("Alpha", "Bravo", "win"),
                    ("Alpha", "Charlie", "loss"),
                    ("Alpha", "Delta", "draw"),
                    ("Alpha", "Echo", "nc"),
                ],
            ))
            .unwrap();

        let table = history.derive().unwrap();
        let pairs: Vec<(i8, i8)> = table
            .records()
            .iter()
            .map(|r| (r.fighters_win, r.opponents_win))
            .collect();
        assert_eq!(pairs, vec![(1, 0), (0, 1), (1, 1), (-1, -1)]);
    }

    #[test]
    fn test_unknown_result_is_an_error() {
        let mut history = FightHistory::new();
        history
            .push(bouts("a", &[("Alpha", "Bravo", "win"), ("Alpha", "Foxtrot", "dq")]))
            .unwrap();

        match history.derive() {
            Err(Error::UnknownResultKind { fighter, opponent, raw }) => {
                assert_eq!(fighter, "Alpha");
                assert_eq!(opponent, "Foxtrot");
                assert_eq!(raw, "dq");
            }
            other => panic!("expected unknown result error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_flags_unknown_result_per_fighter() {
        let good = bouts("a", &[("Alpha", "Bravo", "win"), ("Alpha", "Echo", "nc")]);
        assert!(good.validate().is_ok());

        let odd = bouts("b", &[("Bravo", "Alpha", "loss"), ("Bravo", "Golf", "dq")]);
        match odd.validate() {
            Err(Error::UnknownResultKind { fighter, opponent, raw }) => {
                assert_eq!((fighter.as_str(), opponent.as_str(), raw.as_str()), ("Bravo", "Golf", "dq"));
            }
            other => panic!("expected unknown result error, got {:?}", other),
        }
    }

    #[test]
    fn test_push_rejects_inconsistent_bouts() {
        let mut history = FightHistory::new();
        let mut malformed = bouts("http://ufcstats.com/fighter-details/x", &[("Alpha", "Bravo", "win")]);
        malformed.result.push("loss".to_string());

        match history.push(malformed) {
            Err(Error::ConsistencyViolation { fighters, opponents, results, .. }) => {
                assert_eq!((fighters, opponents, results), (1, 1, 2));
            }
            other => panic!("expected consistency violation, got {:?}", other),
        }
        assert!(history.is_empty());
    }

    #[test]
    fn test_columns_preserve_insertion_order() {
        let mut history = FightHistory::new();
        history.push(bouts("a", &[("Alpha", "Bravo", "win")])).unwrap();
        history.push(bouts("b", &[("Bravo", "Alpha", "loss")])).unwrap();

        let columns = history.derive().unwrap().columns();
        assert_eq!(columns.fighter, vec!["Alpha", "Bravo"]);
        assert_eq!(columns.opponent, vec!["Bravo", "Alpha"]);
        assert_eq!(columns.result, vec!["win", "loss"]);
        assert_eq!(columns.fighters_win, vec![1, 0]);
        assert_eq!(columns.opponents_win, vec![0, 1]);

        let json = serde_json::to_value(&columns).unwrap();
        assert!(json.get("Fighters_Win").is_some());
    }
}
