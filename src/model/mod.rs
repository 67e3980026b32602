//! Fight outcome classifier.

pub mod classifier;
pub mod mlp;

pub use classifier::{
    matchup_vector, prepare_model, return_prediction, who_wins_the_upcoming_fight, Verdict,
};
pub use mlp::{Activation, MlpClassifier, MlpParams, Solver};
