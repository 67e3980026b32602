//! Matchup feature table.
//!
//! Each fight row is joined with the stats of both participants. A row is
//! `[fighter stats | opponent stats]` labelled with `Fighters_Win`; rows with
//! any missing value are dropped but remembered, so a later name lookup can
//! say why a fighter is absent.

use ndarray::{Array1, Array2};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use super::fights::FightTable;
use crate::types::FighterStatsRecord;
use crate::{Error, Result};

/// Per-fighter feature columns, in table order
pub const STATS_COLUMNS: [&str; 16] = [
    "Wins",
    "Losses",
    "Draws",
    "Height_cm",
    "Weight_lbs",
    "Reach_inch",
    "Stance",
    "Debut",
    "SLpM",
    "StrAcc",
    "SApM",
    "StrDef",
    "TD_Avg",
    "TD_Acc",
    "TD_Def",
    "Sub_Avg",
];

pub const FIGHTER_PREFIX: &str = "Fighter";
pub const OPPONENT_PREFIX: &str = "Opponent";

/// Numeric code of a stance; empty or unrecognized stances are missing
pub fn encode_stance(stance: &str) -> Option<f64> {
    match stance.trim() {
        "Orthodox" => Some(0.0),
        "Southpaw" => Some(1.0),
        "Switch" => Some(2.0),
        "Open Stance" => Some(3.0),
        "Sideways" => Some(4.0),
        _ => None,
    }
}

fn stats_vector(r: &FighterStatsRecord) -> [Option<f64>; 16] {
    [
        Some(r.wins as f64),
        Some(r.losses as f64),
        Some(r.draws as f64),
        r.height_cm,
        r.weight_lbs,
        r.reach_inch,
        encode_stance(&r.stance),
        r.debut.map(f64::from),
        r.slpm,
        r.str_acc,
        r.sapm,
        r.str_def,
        r.td_avg,
        r.td_acc,
        r.td_def,
        r.sub_avg,
    ]
}

/// A fight row left out of the table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRow {
    pub fighter: String,
    pub opponent: String,
    /// Column names with no value
    pub missing: Vec<String>,
}

/// Name columns of the kept rows, plus the rows that were dropped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchupNames {
    pub fighter: Vec<String>,
    pub opponent: Vec<String>,
    pub dropped: Vec<DroppedRow>,
}

impl MatchupNames {
    pub fn len(&self) -> usize {
        self.fighter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fighter.is_empty()
    }

    /// Row index of the first row with `name` in the Fighter column
    pub fn find_fighter(&self, name: &str) -> Result<usize> {
        self.find(name, "Fighter", &self.fighter, &self.opponent, |d| &d.fighter)
    }

    /// Row index of the first row with `name` in the Opponent column
    pub fn find_opponent(&self, name: &str) -> Result<usize> {
        self.find(name, "Opponent", &self.opponent, &self.fighter, |d| &d.opponent)
    }

    fn find(
        &self,
        name: &str,
        column: &str,
        searched: &[String],
        other: &[String],
        dropped_name: impl Fn(&DroppedRow) -> &String,
    ) -> Result<usize> {
        if let Some(row) = searched.iter().position(|n| n == name) {
            return Ok(row);
        }

        let dropped: Vec<&DroppedRow> = self
            .dropped
            .iter()
            .filter(|d| dropped_name(d) == name)
            .collect();

        let cause = if !dropped.is_empty() {
            let mut columns: Vec<&str> = dropped
                .iter()
                .flat_map(|d| d.missing.iter().map(String::as_str))
                .collect();
            columns.sort_unstable();
            columns.dedup();
            format!(
                "{} row(s) were dropped for missing values in {}",
                dropped.len(),
                columns.join(", ")
            )
        } else if other.iter().any(|n| n == name) {
            format!("name only appears in the {} column", other_column(column))
        } else {
            "name does not appear in the fight table".to_string()
        };

        Err(Error::LookupFailure {
            name: name.to_string(),
            column: column.to_string(),
            cause,
        })
    }
}

fn other_column(column: &str) -> &'static str {
    if column == FIGHTER_PREFIX {
        OPPONENT_PREFIX
    } else {
        FIGHTER_PREFIX
    }
}

/// Complete-case feature table built from fights and fighter stats
#[derive(Debug, Clone)]
pub struct MatchupDataset {
    pub names: MatchupNames,
    pub features: Array2<f64>,
    pub outcome: Array1<i64>,
}

impl MatchupDataset {
    /// Join every fight with both fighters' stats.
    ///
    /// Stats are matched by exact name; when several records share a name
    /// the first one wins.
    pub fn build(fighters: &[FighterStatsRecord], fights: &FightTable) -> Result<Self> {
        let mut by_name: HashMap<&str, &FighterStatsRecord> = HashMap::new();
        for f in fighters {
            by_name.entry(f.name.as_str()).or_insert(f);
        }

        let width = STATS_COLUMNS.len() * 2;
        let mut names = MatchupNames::default();
        let mut flat = Vec::with_capacity(fights.len() * width);
        let mut outcome = Vec::with_capacity(fights.len());

        for record in fights.records() {
            let fighter = by_name.get(record.fighter.as_str()).map(|r| stats_vector(r));
            let opponent = by_name.get(record.opponent.as_str()).map(|r| stats_vector(r));

            let mut missing = Vec::new();
            collect_missing(&mut missing, FIGHTER_PREFIX, fighter.as_ref());
            collect_missing(&mut missing, OPPONENT_PREFIX, opponent.as_ref());

            match (fighter, opponent) {
                (Some(f), Some(o)) if missing.is_empty() => {
                    flat.extend(f.iter().chain(o.iter()).flatten());
                    outcome.push(i64::from(record.fighters_win));
                    names.fighter.push(record.fighter.clone());
                    names.opponent.push(record.opponent.clone());
                }
                _ => names.dropped.push(DroppedRow {
                    fighter: record.fighter.clone(),
                    opponent: record.opponent.clone(),
                    missing,
                }),
            }
        }

        info!(
            "Matchup table: {} rows kept, {} dropped for missing values",
            names.len(),
            names.dropped.len()
        );

        let features = Array2::from_shape_vec((names.len(), width), flat)
            .map_err(|e| Error::InvalidDataset(e.to_string()))?;

        Ok(Self {
            names,
            features,
            outcome: Array1::from(outcome),
        })
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    /// Column index splitting a row into fighter and opponent halves
    pub fn stats_bound(&self) -> usize {
        self.features.ncols() / 2
    }

    pub fn feature_names() -> Vec<String> {
        [FIGHTER_PREFIX, OPPONENT_PREFIX]
            .iter()
            .flat_map(|prefix| STATS_COLUMNS.iter().map(move |c| format!("{}_{}", prefix, c)))
            .collect()
    }
}

fn collect_missing(missing: &mut Vec<String>, prefix: &str, stats: Option<&[Option<f64>; 16]>) {
    match stats {
        Some(values) => missing.extend(
            STATS_COLUMNS
                .iter()
                .zip(values)
                .filter(|(_, v)| v.is_none())
                .map(|(c, _)| format!("{}_{}", prefix, c)),
        ),
        None => missing.push(format!("{} stats", prefix)),
    }
}
