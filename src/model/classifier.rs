//! Training and single-fight prediction on the matchup table.

use ndarray::{s, Array1, ArrayView1, ArrayView2, Axis};
use serde::Serialize;
use std::fmt;
use tracing::info;

use super::mlp::{MlpClassifier, MlpParams};
use crate::dataset::matchups::MatchupNames;
use crate::{Error, Result};

/// Predicted outcome of an upcoming fight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    FavoriteWins,
    UnderdogWins,
    Draw,
}

impl Verdict {
    /// 1 is a favorite win, 0 an underdog win, anything else a draw
    pub fn from_label(label: i64) -> Self {
        match label {
            1 => Verdict::FavoriteWins,
            0 => Verdict::UnderdogWins,
            _ => Verdict::Draw,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::FavoriteWins => "favorite wins",
            Verdict::UnderdogWins => "underdog wins",
            Verdict::Draw => "draw",
        }
    }

    /// Verdict naming the winner
    pub fn describe(&self, favorite: &str, underdog: &str) -> String {
        match self {
            Verdict::FavoriteWins => format!("{} wins", favorite),
            Verdict::UnderdogWins => format!("{} wins", underdog),
            Verdict::Draw => format!("{} vs. {} ends in a draw", favorite, underdog),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fit a classifier on standardized features
pub fn prepare_model(
    x_train: ArrayView2<f64>,
    y_train: ArrayView1<i64>,
    params: &MlpParams,
) -> Result<MlpClassifier> {
    let mut model = MlpClassifier::new(params.clone());
    model.fit(x_train, y_train)?;
    info!(
        "Trained {:?} network on {} rows in {} epochs",
        params.hidden_layer_sizes,
        x_train.nrows(),
        model.n_iter()
    );
    Ok(model)
}

/// Train, then predict labels for `x_test`
pub fn return_prediction(
    x_train: ArrayView2<f64>,
    y_train: ArrayView1<i64>,
    x_test: ArrayView2<f64>,
    params: &MlpParams,
) -> Result<Array1<i64>> {
    prepare_model(x_train, y_train, params)?.predict(x_test)
}

/// Input vector for a fight between two fighters.
///
/// The favorite's half comes from the first row listing them as Fighter, the
/// underdog's half from the first row listing them as Opponent.
pub fn matchup_vector(
    favorite: &str,
    underdog: &str,
    stats_data: ArrayView2<f64>,
    names_data: &MatchupNames,
) -> Result<Array1<f64>> {
    if stats_data.nrows() != names_data.len() {
        return Err(Error::InvalidDataset(format!(
            "{} stat rows but {} name rows",
            stats_data.nrows(),
            names_data.len()
        )));
    }

    let favorite_row = names_data.find_fighter(favorite)?;
    let underdog_row = names_data.find_opponent(underdog)?;
    let bound = stats_data.ncols() / 2;

    let favorite_half = stats_data.slice(s![favorite_row, ..bound]);
    let underdog_half = stats_data.slice(s![underdog_row, bound..]);
    Ok(favorite_half.iter().chain(underdog_half.iter()).copied().collect())
}

/// Retrain on the full table and predict the outcome of one fight
pub fn who_wins_the_upcoming_fight(
    favorite: &str,
    underdog: &str,
    stats_data: ArrayView2<f64>,
    outcome: ArrayView1<i64>,
    names_data: &MatchupNames,
    params: &MlpParams,
) -> Result<Verdict> {
    let input = matchup_vector(favorite, underdog, stats_data, names_data)?;

    let model = prepare_model(stats_data, outcome, params)?;
    let predicted = model.predict(input.view().insert_axis(Axis(0)))?;
    let label = predicted
        .get(0)
        .copied()
        .ok_or_else(|| Error::Model("empty prediction".to_string()))?;

    let verdict = Verdict::from_label(label);
    info!("{} vs. {}: {}", favorite, underdog, verdict);
    Ok(verdict)
}
