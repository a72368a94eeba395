use std::collections::HashMap;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tree::{to_positions, Criterion, MaxFeatures, TreeCore, TreeParams};
use super::{argmax, class_indices, not_fitted, Estimator};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Random forests
// ---------------------------------------------------------------------------

/// Draw `n` row indices with replacement.
fn bootstrap(n: usize, rng: &mut StdRng) -> Vec<usize> {
    (0..n).map(|_| rng.random_range(0..n)).collect()
}

/// Grow `n_estimators` trees on bootstrap samples; each tree gets its own
/// seed derived from the forest's generator.
fn grow_forest(
    x: &Array2<f64>,
    y: &[f64],
    n_classes: usize,
    n_estimators: usize,
    criterion: Criterion,
    max_features: MaxFeatures,
    seed: u64,
) -> Vec<TreeCore> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_estimators)
        .map(|_| {
            let params = TreeParams {
                max_features,
                seed: rng.random(),
                ..TreeParams::new(criterion)
            };
            let samples = bootstrap(x.nrows(), &mut rng);
            let mut tree = TreeCore::new(params, n_classes);
            tree.grow(x, y, samples);
            tree
        })
        .collect()
}

/// Bagged Gini trees; each split considers `sqrt(n_features)` features and
/// predictions average the trees' class proportions.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    pub n_estimators: usize,
    pub seed: u64,
    classes: Vec<usize>,
    trees: Vec<TreeCore>,
}

impl RandomForestClassifier {
    pub fn new(seed: u64) -> Self {
        Self {
            n_estimators: 100,
            seed,
            classes: Vec::new(),
            trees: Vec::new(),
        }
    }
}

impl Estimator for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.classes = class_indices(y);
        let positions = to_positions(y, &self.classes);
        self.trees = grow_forest(
            x,
            &positions,
            self.classes.len(),
            self.n_estimators,
            Criterion::Gini,
            MaxFeatures::Sqrt,
            self.seed,
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(not_fitted("RandomForestClassifier"));
        }
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut votes = vec![0.0; self.classes.len()];
                for tree in &self.trees {
                    for (v, p) in votes.iter_mut().zip(tree.value(row)) {
                        *v += p;
                    }
                }
                self.classes[argmax(&votes)] as f64
            })
            .collect())
    }
}

/// Bagged squared-error trees considering every feature; predictions are
/// the mean over trees.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub seed: u64,
    trees: Vec<TreeCore>,
}

impl RandomForestRegressor {
    pub fn new(seed: u64) -> Self {
        Self {
            n_estimators: 100,
            seed,
            trees: Vec::new(),
        }
    }
}

impl Estimator for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let targets = y.to_vec();
        self.trees = grow_forest(
            x,
            &targets,
            0,
            self.n_estimators,
            Criterion::SquaredError,
            MaxFeatures::All,
            self.seed,
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(not_fitted("RandomForestRegressor"));
        }
        let n = self.trees.len() as f64;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.value(row)[0]).sum::<f64>() / n)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Gradient boosting
// ---------------------------------------------------------------------------

/// Shallow regression tree fitted to the current residuals.
fn residual_tree(x: &Array2<f64>, residuals: &[f64], max_depth: usize, seed: u64) -> TreeCore {
    let params = TreeParams {
        max_depth: Some(max_depth),
        seed,
        ..TreeParams::new(Criterion::SquaredError)
    };
    let mut tree = TreeCore::new(params, 0);
    tree.grow(x, residuals, (0..x.nrows()).collect());
    tree
}

/// Squared-error boosting: start from the mean and add shrunken trees fitted
/// to the residuals.
#[derive(Debug, Clone)]
pub struct GradientBoostingRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub seed: u64,
    init: f64,
    stages: Vec<TreeCore>,
}

impl GradientBoostingRegressor {
    pub fn new(seed: u64) -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            seed,
            init: 0.0,
            stages: Vec::new(),
        }
    }
}

impl Estimator for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.init = y.mean().unwrap_or(0.0);
        self.stages.clear();
        let mut current = vec![self.init; y.len()];

        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, f)| t - f).collect();
            let tree = residual_tree(x, &residuals, self.max_depth, self.seed);
            for (i, row) in x.rows().into_iter().enumerate() {
                current[i] += self.learning_rate * tree.value(row)[0];
            }
            self.stages.push(tree);
        }
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.stages.is_empty() && self.n_estimators > 0 {
            return Err(not_fitted("GradientBoostingRegressor"));
        }
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                self.init
                    + self
                        .stages
                        .iter()
                        .map(|t| self.learning_rate * t.value(row)[0])
                        .sum::<f64>()
            })
            .collect())
    }
}

/// Log-loss boosting. Two classes use a single logit per stage; more classes
/// fit one tree per class per stage on the softmax residuals. Leaf values are
/// replaced by a one-step Newton estimate.
#[derive(Debug, Clone)]
pub struct GradientBoostingClassifier {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub seed: u64,
    classes: Vec<usize>,
    init: Vec<f64>,
    /// One entry per stage, each holding one tree per score column.
    stages: Vec<Vec<TreeCore>>,
}

impl GradientBoostingClassifier {
    pub fn new(seed: u64) -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            seed,
            classes: Vec::new(),
            init: Vec::new(),
            stages: Vec::new(),
        }
    }

    fn n_scores(&self) -> usize {
        if self.classes.len() == 2 {
            1
        } else {
            self.classes.len()
        }
    }

    /// Replace every leaf with `scale · Σ residual / Σ hessian` over the
    /// training rows that land in it.
    fn newton_leaves(
        tree: &mut TreeCore,
        x: &Array2<f64>,
        residuals: &[f64],
        hessians: &[f64],
        scale: f64,
    ) {
        let mut sums: HashMap<usize, (f64, f64)> = HashMap::new();
        for (i, row) in x.rows().into_iter().enumerate() {
            let entry = sums.entry(tree.leaf_of(row)).or_insert((0.0, 0.0));
            entry.0 += residuals[i];
            entry.1 += hessians[i];
        }
        for (leaf, (num, den)) in sums {
            let value = if den.abs() < 1e-12 { 0.0 } else { scale * num / den };
            tree.set_leaf_value(leaf, vec![value]);
        }
    }
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

impl Estimator for GradientBoostingClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.classes = class_indices(y);
        self.stages.clear();
        let positions = to_positions(y, &self.classes);
        let n = y.len();
        let k = self.classes.len();

        if k < 2 {
            self.init = vec![0.0];
            return Ok(());
        }

        let n_scores = self.n_scores();
        let priors: Vec<f64> = (0..k)
            .map(|c| positions.iter().filter(|&&p| p as usize == c).count() as f64 / n as f64)
            .collect();
        self.init = if n_scores == 1 {
            vec![(priors[1] / priors[0]).ln()]
        } else {
            priors.iter().map(|p| p.max(1e-12).ln()).collect()
        };

        let mut scores: Vec<Vec<f64>> = vec![self.init.clone(); n];

        for _ in 0..self.n_estimators {
            let probs: Vec<Vec<f64>> = scores.iter().map(|s| score_probs(s)).collect();
            let mut stage = Vec::with_capacity(n_scores);

            for col in 0..n_scores {
                let target_class = if n_scores == 1 { 1 } else { col };
                let prob_col = if n_scores == 1 { 1 } else { col };
                let residuals: Vec<f64> = (0..n)
                    .map(|i| f64::from(positions[i] as usize == target_class) - probs[i][prob_col])
                    .collect();
                let hessians: Vec<f64> = (0..n)
                    .map(|i| probs[i][prob_col] * (1.0 - probs[i][prob_col]))
                    .collect();

                let mut tree = residual_tree(x, &residuals, self.max_depth, self.seed);
                let scale = if n_scores == 1 { 1.0 } else { (k - 1) as f64 / k as f64 };
                Self::newton_leaves(&mut tree, x, &residuals, &hessians, scale);

                for (i, row) in x.rows().into_iter().enumerate() {
                    scores[i][col] += self.learning_rate * tree.value(row)[0];
                }
                stage.push(tree);
            }
            self.stages.push(stage);
        }
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.init.is_empty() {
            return Err(not_fitted("GradientBoostingClassifier"));
        }
        if self.classes.len() < 2 {
            let only = self.classes.first().copied().unwrap_or(0);
            return Ok(Array1::from_elem(x.nrows(), only as f64));
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut score = self.init.clone();
                for stage in &self.stages {
                    for (col, tree) in stage.iter().enumerate() {
                        score[col] += self.learning_rate * tree.value(row)[0];
                    }
                }
                let probs = score_probs(&score);
                self.classes[argmax(&probs)] as f64
            })
            .collect())
    }
}

/// Class probabilities from raw scores: a single logit maps to
/// `[1 − p, p]`, several scores go through softmax.
fn score_probs(scores: &[f64]) -> Vec<f64> {
    if scores.len() == 1 {
        let p = sigmoid(scores[0]);
        return vec![1.0 - p, p];
    }
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}
