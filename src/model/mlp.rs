//! Multilayer perceptron classifier.
//!
//! Fully connected hidden layers, softmax output over the sorted distinct
//! labels, cross-entropy loss with L2 penalty, minibatch training with Adam
//! or momentum SGD.

use ndarray::{Array, Array1, Array2, ArrayView1, ArrayView2, Axis, Dimension, Zip};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

const BETA_1: f64 = 0.9;
const BETA_2: f64 = 0.999;
const EPSILON: f64 = 1e-8;
const MOMENTUM: f64 = 0.9;
const MAX_BATCH_SIZE: usize = 200;
const PROBA_CLIP: f64 = 1e-10;

/// Hidden layer activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Identity,
    #[default]
    Logistic,
    Tanh,
    Relu,
}

impl Activation {
    fn apply(&self, z: &mut Array2<f64>) {
        match self {
            Activation::Identity => {}
            Activation::Logistic => z.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp())),
            Activation::Tanh => z.mapv_inplace(f64::tanh),
            Activation::Relu => z.mapv_inplace(|v| v.max(0.0)),
        }
    }

    /// Multiply `delta` by the derivative, given the activation output `a`
    fn scale_by_derivative(&self, a: &Array2<f64>, delta: &mut Array2<f64>) {
        match self {
            Activation::Identity => {}
            Activation::Logistic => {
                Zip::from(delta).and(a).for_each(|d, &a| *d *= a * (1.0 - a));
            }
            Activation::Tanh => {
                Zip::from(delta).and(a).for_each(|d, &a| *d *= 1.0 - a * a);
            }
            Activation::Relu => {
                Zip::from(delta).and(a).for_each(|d, &a| {
                    if a <= 0.0 {
                        *d = 0.0;
                    }
                });
            }
        }
    }

    /// Glorot uniform bound factor
    fn init_factor(&self) -> f64 {
        match self {
            Activation::Logistic => 2.0,
            _ => 6.0,
        }
    }
}

/// Weight update rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    /// Stochastic gradient descent with momentum
    Sgd,
    #[default]
    Adam,
}

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct MlpParams {
    pub hidden_layer_sizes: Vec<usize>,
    pub activation: Activation,
    pub solver: Solver,
    /// Maximum number of epochs
    pub max_iter: usize,
    pub learning_rate_init: f64,
    /// L2 penalty
    pub alpha: f64,
    /// Minibatch size; `min(200, n)` when absent
    pub batch_size: Option<usize>,
    pub tol: f64,
    pub n_iter_no_change: usize,
    pub seed: Option<u64>,
}

impl Default for MlpParams {
    fn default() -> Self {
        Self {
            hidden_layer_sizes: vec![28, 24, 18],
            activation: Activation::Logistic,
            solver: Solver::Adam,
            max_iter: 10_000,
            learning_rate_init: 0.001,
            alpha: 0.0001,
            batch_size: None,
            tol: 1e-4,
            n_iter_no_change: 10,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Layer {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

type Gradients = Vec<(Array2<f64>, Array1<f64>)>;

/// Per-parameter optimizer state.
///
/// Adam keeps first and second moments; SGD keeps its velocity in `first`.
struct Optimizer {
    solver: Solver,
    learning_rate: f64,
    t: i32,
    first: Gradients,
    second: Gradients,
}

impl Optimizer {
    fn new(solver: Solver, learning_rate: f64, layers: &[Layer]) -> Self {
        let zeros = || -> Gradients {
            layers
                .iter()
                .map(|l| (Array2::zeros(l.weights.raw_dim()), Array1::zeros(l.bias.len())))
                .collect()
        };
        Self {
            solver,
            learning_rate,
            t: 0,
            first: zeros(),
            second: zeros(),
        }
    }

    fn step(&mut self, layers: &mut [Layer], grads: &Gradients) {
        match self.solver {
            Solver::Adam => {
                self.t += 1;
                let lr = self.learning_rate * (1.0 - BETA_2.powi(self.t)).sqrt()
                    / (1.0 - BETA_1.powi(self.t));
                for (((layer, (gw, gb)), (mw, mb)), (vw, vb)) in layers
                    .iter_mut()
                    .zip(grads)
                    .zip(&mut self.first)
                    .zip(&mut self.second)
                {
                    adam_update(&mut layer.weights, gw, mw, vw, lr);
                    adam_update(&mut layer.bias, gb, mb, vb, lr);
                }
            }
            Solver::Sgd => {
                for ((layer, (gw, gb)), (vw, vb)) in
                    layers.iter_mut().zip(grads).zip(&mut self.first)
                {
                    sgd_update(&mut layer.weights, gw, vw, self.learning_rate);
                    sgd_update(&mut layer.bias, gb, vb, self.learning_rate);
                }
            }
        }
    }
}

fn adam_update<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    lr: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = BETA_1 * *m + (1.0 - BETA_1) * g;
            *v = BETA_2 * *v + (1.0 - BETA_2) * g * g;
            *p -= lr * *m / (v.sqrt() + EPSILON);
        });
}

fn sgd_update<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    velocity: &mut Array<f64, D>,
    lr: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(velocity)
        .for_each(|p, &g, v| {
            *v = MOMENTUM * *v - lr * g;
            *p += *v;
        });
}

fn softmax(z: &mut Array2<f64>) {
    for mut row in z.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
}

/// Feed-forward neural network classifier
#[derive(Debug, Clone)]
pub struct MlpClassifier {
    params: MlpParams,
    classes: Vec<i64>,
    layers: Vec<Layer>,
    loss_curve: Vec<f64>,
}

impl MlpClassifier {
    pub fn new(params: MlpParams) -> Self {
        Self {
            params,
            classes: Vec::new(),
            layers: Vec::new(),
            loss_curve: Vec::new(),
        }
    }

    /// Distinct training labels in ascending order
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Mean training loss per epoch
    pub fn loss_curve(&self) -> &[f64] {
        &self.loss_curve
    }

    pub fn n_iter(&self) -> usize {
        self.loss_curve.len()
    }

    /// Train from scratch on `x` against labels `y`.
    ///
    /// Stops once the epoch loss has failed to improve by `tol` for more
    /// than `n_iter_no_change` consecutive epochs, or after `max_iter`.
    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<i64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 || x.ncols() == 0 {
            return Err(Error::Model("cannot fit on an empty feature table".to_string()));
        }
        if y.len() != n {
            return Err(Error::Model(format!("{} feature rows but {} labels", n, y.len())));
        }
        if self.params.hidden_layer_sizes.contains(&0) {
            return Err(Error::Model("hidden layers must have at least one unit".to_string()));
        }

        let mut classes: Vec<i64> = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(Error::Model(format!(
                "need at least two classes to train, got {:?}",
                classes
            )));
        }

        let mut targets = Array2::<f64>::zeros((n, classes.len()));
        for (i, label) in y.iter().enumerate() {
            if let Ok(col) = classes.binary_search(label) {
                targets[[i, col]] = 1.0;
            }
        }

        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        self.classes = classes;
        self.layers = self.init_layers(x.ncols(), &mut rng);
        self.loss_curve.clear();

        let batch_size = self
            .params
            .batch_size
            .unwrap_or(MAX_BATCH_SIZE)
            .clamp(1, n);
        let mut optimizer =
            Optimizer::new(self.params.solver, self.params.learning_rate_init, &self.layers);
        let mut indices: Vec<usize> = (0..n).collect();
        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0;

        for epoch in 0..self.params.max_iter {
            indices.shuffle(&mut rng);
            let mut accumulated = 0.0;

            for batch in indices.chunks(batch_size) {
                let xb = x.select(Axis(0), batch);
                let yb = targets.select(Axis(0), batch);
                let (loss, grads) = self.backprop(&xb, &yb);
                accumulated += loss * batch.len() as f64;
                optimizer.step(&mut self.layers, &grads);
            }

            let loss = accumulated / n as f64;
            if !loss.is_finite() {
                return Err(Error::Model(format!("loss diverged at epoch {}", epoch + 1)));
            }
            self.loss_curve.push(loss);

            if loss > best_loss - self.params.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            if loss < best_loss {
                best_loss = loss;
            }
            if no_improvement > self.params.n_iter_no_change {
                debug!("Converged after {} epochs, loss {:.6}", epoch + 1, loss);
                return Ok(());
            }
        }

        warn!(
            "Reached max_iter ({}) without converging, loss {:.6}",
            self.params.max_iter, best_loss
        );
        Ok(())
    }

    /// Class probabilities, one column per entry of [`classes`](Self::classes)
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let expected = match self.layers.first() {
            Some(layer) => layer.weights.nrows(),
            None => return Err(Error::Model("model is not fitted".to_string())),
        };
        if x.ncols() != expected {
            return Err(Error::Model(format!(
                "model expects {} features, got {}",
                expected,
                x.ncols()
            )));
        }

        self.forward(&x.to_owned())
            .pop()
            .ok_or_else(|| Error::Model("model has no layers".to_string()))
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<i64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                self.classes[best]
            })
            .collect())
    }

    /// Mean accuracy on `x` against `y`
    pub fn score(&self, x: ArrayView2<f64>, y: ArrayView1<i64>) -> Result<f64> {
        if x.nrows() != y.len() {
            return Err(Error::Model(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Err(Error::Model("cannot score an empty table".to_string()));
        }
        let predicted = self.predict(x)?;
        let correct = predicted.iter().zip(y).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len() as f64)
    }

    fn init_layers(&self, n_features: usize, rng: &mut StdRng) -> Vec<Layer> {
        let mut sizes = Vec::with_capacity(self.params.hidden_layer_sizes.len() + 2);
        sizes.push(n_features);
        sizes.extend_from_slice(&self.params.hidden_layer_sizes);
        sizes.push(self.classes.len());

        let factor = self.params.activation.init_factor();
        sizes
            .windows(2)
            .map(|pair| {
                let (fan_in, fan_out) = (pair[0], pair[1]);
                let bound = (factor / (fan_in + fan_out) as f64).sqrt();
                let dist = Uniform::new(-bound, bound);
                Layer {
                    weights: Array2::from_shape_fn((fan_in, fan_out), |_| dist.sample(rng)),
                    bias: Array1::from_shape_fn(fan_out, |_| dist.sample(rng)),
                }
            })
            .collect()
    }

    /// Activations of every layer, input first and class probabilities last
    fn forward(&self, x: &Array2<f64>) -> Vec<Array2<f64>> {
        let last = self.layers.len().saturating_sub(1);
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(x.clone());

        for (i, layer) in self.layers.iter().enumerate() {
            let mut z = activations[i].dot(&layer.weights) + &layer.bias;
            if i == last {
                softmax(&mut z);
            } else {
                self.params.activation.apply(&mut z);
            }
            activations.push(z);
        }
        activations
    }

    /// Batch loss and parameter gradients
    fn backprop(&self, x: &Array2<f64>, y: &Array2<f64>) -> (f64, Gradients) {
        let m = x.nrows() as f64;
        let activations = self.forward(x);
        let output = &activations[self.layers.len()];

        let log_proba = output.mapv(|p| p.clamp(PROBA_CLIP, 1.0 - PROBA_CLIP).ln());
        let data_loss = -(y * &log_proba).sum() / m;
        let penalty: f64 = self.layers.iter().map(|l| l.weights.mapv(|w| w * w).sum()).sum();
        let loss = data_loss + 0.5 * self.params.alpha * penalty / m;

        let mut delta = output - y;
        let mut grads = Vec::with_capacity(self.layers.len());
        for i in (0..self.layers.len()).rev() {
            let weights = &self.layers[i].weights;
            let gw = (activations[i].t().dot(&delta) + &(weights * self.params.alpha)) / m;
            let gb = delta.sum_axis(Axis(0)) / m;
            if i > 0 {
                delta = delta.dot(&weights.t());
                self.params
                    .activation
                    .scale_by_derivative(&activations[i], &mut delta);
            }
            grads.push((gw, gb));
        }
        grads.reverse();

        (loss, grads)
    }
}
