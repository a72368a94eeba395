use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{argmax, class_indices, not_fitted, Estimator};
use crate::error::Result;

/// Improvements smaller than this do not justify a split.
const MIN_GAIN: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Gini impurity over class positions (classification).
    Gini,
    /// Sum of squared errors around the node mean (regression).
    SquaredError,
}

/// How many features each split may consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    All,
    Sqrt,
}

impl MaxFeatures {
    fn count(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1).min(n_features),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeParams {
    pub criterion: Criterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub seed: u64,
}

impl TreeParams {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::All,
            seed: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tree core – arena of nodes grown by CART
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Node {
    /// Class proportions (Gini) or a single mean (SquaredError).
    Leaf { value: Vec<f64> },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A binary tree grown greedily. Targets are class positions `0..n_classes`
/// for [`Criterion::Gini`] and real values for [`Criterion::SquaredError`].
#[derive(Debug, Clone)]
pub struct TreeCore {
    params: TreeParams,
    n_classes: usize,
    nodes: Vec<Node>,
}

struct BestSplit {
    cost: f64,
    feature: usize,
    threshold: f64,
}

impl TreeCore {
    pub fn new(params: TreeParams, n_classes: usize) -> Self {
        Self {
            params,
            n_classes,
            nodes: Vec::new(),
        }
    }

    /// Grow the tree on the given rows (repeats allowed, as in bootstrap
    /// samples).
    pub fn grow(&mut self, x: &Array2<f64>, y: &[f64], samples: Vec<usize>) {
        self.nodes.clear();
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        self.build(x, y, samples, 0, &mut rng);
    }

    fn build(
        &mut self,
        x: &Array2<f64>,
        y: &[f64],
        samples: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        let value = self.leaf_value_for(y, &samples);
        self.nodes.push(Node::Leaf { value });

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || samples.len() < self.params.min_samples_split {
            return id;
        }

        let parent_cost = self.cost(y, &samples);
        if parent_cost <= MIN_GAIN {
            return id;
        }

        let Some(best) = self.best_split(x, y, &samples, rng) else {
            return id;
        };
        if best.cost >= parent_cost - MIN_GAIN {
            return id;
        }

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| x[[s, best.feature]] <= best.threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return id;
        }

        let left = self.build(x, y, left_rows, depth + 1, rng);
        let right = self.build(x, y, right_rows, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    fn leaf_value_for(&self, y: &[f64], samples: &[usize]) -> Vec<f64> {
        let n = samples.len().max(1) as f64;
        match self.params.criterion {
            Criterion::Gini => {
                let mut counts = vec![0.0; self.n_classes];
                for &s in samples {
                    counts[y[s] as usize] += 1.0;
                }
                counts.iter().map(|c| c / n).collect()
            }
            Criterion::SquaredError => {
                vec![samples.iter().map(|&s| y[s]).sum::<f64>() / n]
            }
        }
    }

    /// Node cost: `n · gini` or the sum of squared errors.
    fn cost(&self, y: &[f64], samples: &[usize]) -> f64 {
        let n = samples.len() as f64;
        match self.params.criterion {
            Criterion::Gini => {
                let mut counts = vec![0.0; self.n_classes];
                for &s in samples {
                    counts[y[s] as usize] += 1.0;
                }
                n - counts.iter().map(|c| c * c).sum::<f64>() / n
            }
            Criterion::SquaredError => {
                let sum: f64 = samples.iter().map(|&s| y[s]).sum();
                let sum_sq: f64 = samples.iter().map(|&s| y[s] * y[s]).sum();
                sum_sq - sum * sum / n
            }
        }
    }

    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &[f64],
        samples: &[usize],
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let n_features = x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        let m = self.params.max_features.count(n_features);
        if m < n_features {
            features.shuffle(rng);
            features.truncate(m);
        }

        let mut best: Option<BestSplit> = None;
        for feature in features {
            let mut order = samples.to_vec();
            order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            if let Some((cost, threshold)) = self.scan_feature(x, y, &order, feature) {
                if best.as_ref().map_or(true, |b| cost < b.cost) {
                    best = Some(BestSplit {
                        cost,
                        feature,
                        threshold,
                    });
                }
            }
        }
        best
    }

    /// Sweep the sorted rows once, returning the cheapest (cost, threshold).
    fn scan_feature(
        &self,
        x: &Array2<f64>,
        y: &[f64],
        order: &[usize],
        feature: usize,
    ) -> Option<(f64, f64)> {
        let n = order.len();
        if n < 2 {
            return None;
        }
        let mut best: Option<(f64, f64)> = None;

        let consider = |i: usize, cost: f64, best: &mut Option<(f64, f64)>| {
            let a = x[[order[i], feature]];
            let b = x[[order[i + 1], feature]];
            if a == b {
                return;
            }
            if best.map_or(true, |(c, _)| cost < c) {
                let mut threshold = (a + b) / 2.0;
                if threshold >= b {
                    threshold = a;
                }
                *best = Some((cost, threshold));
            }
        };

        match self.params.criterion {
            Criterion::Gini => {
                let mut left = vec![0.0; self.n_classes];
                let mut right = vec![0.0; self.n_classes];
                for &s in order {
                    right[y[s] as usize] += 1.0;
                }
                let mut sq_left = 0.0;
                let mut sq_right: f64 = right.iter().map(|c| c * c).sum();

                for i in 0..n - 1 {
                    let c = y[order[i]] as usize;
                    sq_left += 2.0 * left[c] + 1.0;
                    sq_right -= 2.0 * right[c] - 1.0;
                    left[c] += 1.0;
                    right[c] -= 1.0;

                    let n_left = (i + 1) as f64;
                    let n_right = (n - i - 1) as f64;
                    let cost = (n_left - sq_left / n_left) + (n_right - sq_right / n_right);
                    consider(i, cost, &mut best);
                }
            }
            Criterion::SquaredError => {
                let total: f64 = order.iter().map(|&s| y[s]).sum();
                let total_sq: f64 = order.iter().map(|&s| y[s] * y[s]).sum();
                let mut sum_left = 0.0;

                for i in 0..n - 1 {
                    sum_left += y[order[i]];
                    let sum_right = total - sum_left;
                    let n_left = (i + 1) as f64;
                    let n_right = (n - i - 1) as f64;
                    let cost = total_sq - sum_left * sum_left / n_left - sum_right * sum_right / n_right;
                    consider(i, cost, &mut best);
                }
            }
        }
        best
    }

    /// Index of the leaf a row falls into.
    pub fn leaf_of(&self, row: ArrayView1<f64>) -> usize {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { .. } => return id,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Leaf payload for a row.
    pub fn value(&self, row: ArrayView1<f64>) -> &[f64] {
        match &self.nodes[self.leaf_of(row)] {
            Node::Leaf { value } => value,
            Node::Split { .. } => unreachable!("leaf_of always stops at a leaf"),
        }
    }

    /// Overwrite a leaf payload (used by gradient boosting's Newton step).
    pub fn set_leaf_value(&mut self, leaf: usize, value: Vec<f64>) {
        if let Some(Node::Leaf { value: slot }) = self.nodes.get_mut(leaf) {
            *slot = value;
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Estimators
// ---------------------------------------------------------------------------

/// Map class indices to positions within the sorted list of seen classes.
pub(crate) fn to_positions(y: &Array1<f64>, classes: &[usize]) -> Vec<f64> {
    y.iter()
        .map(|&v| {
            classes
                .binary_search(&(v as usize))
                .map(|p| p as f64)
                .unwrap_or(0.0)
        })
        .collect()
}

/// CART classifier with Gini impurity and unlimited depth.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    pub params: TreeParams,
    classes: Vec<usize>,
    core: Option<TreeCore>,
}

impl DecisionTreeClassifier {
    pub fn new(seed: u64) -> Self {
        Self {
            params: TreeParams {
                seed,
                ..TreeParams::new(Criterion::Gini)
            },
            classes: Vec::new(),
            core: None,
        }
    }
}

impl Estimator for DecisionTreeClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.classes = class_indices(y);
        let positions = to_positions(y, &self.classes);
        let mut core = TreeCore::new(self.params.clone(), self.classes.len());
        core.grow(x, &positions, (0..x.nrows()).collect());
        self.core = Some(core);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let core = self
            .core
            .as_ref()
            .ok_or_else(|| not_fitted("DecisionTreeClassifier"))?;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.classes[argmax(core.value(row))] as f64)
            .collect())
    }
}

/// CART regressor minimising squared error, unlimited depth.
#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    pub params: TreeParams,
    core: Option<TreeCore>,
}

impl DecisionTreeRegressor {
    pub fn new(seed: u64) -> Self {
        Self {
            params: TreeParams {
                seed,
                ..TreeParams::new(Criterion::SquaredError)
            },
            core: None,
        }
    }
}

impl Estimator for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let targets = y.to_vec();
        let mut core = TreeCore::new(self.params.clone(), 0);
        core.grow(x, &targets, (0..x.nrows()).collect());
        self.core = Some(core);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let core = self
            .core
            .as_ref()
            .ok_or_else(|| not_fitted("DecisionTreeRegressor"))?;
        Ok(x.rows().into_iter().map(|row| core.value(row)[0]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn classifier_memorises_training_data() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0]];
        let y = array![0.0, 2.0, 0.0, 2.0];
        let mut tree = DecisionTreeClassifier::new(0);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn regressor_splits_on_step() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let y = array![1.0, 1.0, 1.0, 5.0, 5.0, 5.0];
        let mut tree = DecisionTreeRegressor::new(0);
        tree.fit(&x, &y).unwrap();
        let pred = tree.predict(&array![[0.5], [11.5]]).unwrap();
        assert_eq!(pred, array![1.0, 5.0]);
        assert_eq!(tree.core.as_ref().unwrap().n_leaves(), 2);
    }

    #[test]
    fn depth_limit_is_respected() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 1.0, 2.0, 3.0];
        let mut core = TreeCore::new(
            TreeParams {
                max_depth: Some(1),
                ..TreeParams::new(Criterion::SquaredError)
            },
            0,
        );
        core.grow(&x, y.as_slice().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(core.n_leaves(), 2);
    }

    #[test]
    fn zero_feature_tree_is_a_single_leaf() {
        let x = Array2::<f64>::zeros((3, 0));
        let y = array![1.0, 0.0, 1.0];
        let mut tree = DecisionTreeClassifier::new(0);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), array![1.0, 1.0, 1.0]);
    }
}
