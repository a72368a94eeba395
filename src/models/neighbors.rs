use ndarray::{Array1, Array2, ArrayView1};

use super::{not_fitted, Estimator};
use crate::error::Result;

const DEFAULT_K: usize = 5;

/// Training rows memorised by both neighbour models.
#[derive(Debug, Clone)]
struct Memory {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl Memory {
    /// Indices of the `k` nearest training rows by Euclidean distance.
    /// Equal distances keep training order.
    fn nearest(&self, row: ArrayView1<f64>, k: usize) -> Vec<usize> {
        let mut dists: Vec<(f64, usize)> = self
            .x
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, train)| {
                let d: f64 = train
                    .iter()
                    .zip(row.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                (d, i)
            })
            .collect();
        dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        dists.into_iter().take(k).map(|(_, i)| i).collect()
    }
}

/// Majority vote among the `n_neighbors` closest training rows.
#[derive(Debug, Clone)]
pub struct KNeighborsClassifier {
    pub n_neighbors: usize,
    memory: Option<Memory>,
}

impl Default for KNeighborsClassifier {
    fn default() -> Self {
        Self {
            n_neighbors: DEFAULT_K,
            memory: None,
        }
    }
}

impl Estimator for KNeighborsClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.memory = Some(Memory {
            x: x.clone(),
            y: y.clone(),
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let memory = self
            .memory
            .as_ref()
            .ok_or_else(|| not_fitted("KNeighborsClassifier"))?;
        let k = self.n_neighbors.min(memory.y.len());

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut votes: Vec<(usize, usize)> = Vec::new();
                for i in memory.nearest(row, k) {
                    let class = memory.y[i] as usize;
                    match votes.iter_mut().find(|(c, _)| *c == class) {
                        Some((_, n)) => *n += 1,
                        None => votes.push((class, 1)),
                    }
                }
                // most votes, smallest class on ties
                votes
                    .into_iter()
                    .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                    .map_or(0.0, |(c, _)| c as f64)
            })
            .collect())
    }
}

/// Mean target of the `n_neighbors` closest training rows.
#[derive(Debug, Clone)]
pub struct KNeighborsRegressor {
    pub n_neighbors: usize,
    memory: Option<Memory>,
}

impl Default for KNeighborsRegressor {
    fn default() -> Self {
        Self {
            n_neighbors: DEFAULT_K,
            memory: None,
        }
    }
}

impl Estimator for KNeighborsRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.memory = Some(Memory {
            x: x.clone(),
            y: y.clone(),
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let memory = self
            .memory
            .as_ref()
            .ok_or_else(|| not_fitted("KNeighborsRegressor"))?;
        let k = self.n_neighbors.min(memory.y.len());

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let nearest = memory.nearest(row, k);
                if nearest.is_empty() {
                    return 0.0;
                }
                nearest.iter().map(|&i| memory.y[i]).sum::<f64>() / nearest.len() as f64
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn classifier_uses_local_majority() {
        let x = array![[0.0], [0.1], [0.2], [5.0], [5.1], [5.2], [5.3]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let mut model = KNeighborsClassifier {
            n_neighbors: 3,
            ..Default::default()
        };
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&array![[0.05], [5.05]]).unwrap(), array![0.0, 1.0]);
    }

    #[test]
    fn tie_goes_to_smaller_class() {
        let x = array![[0.0], [1.0]];
        let y = array![1.0, 0.0];
        let mut model = KNeighborsClassifier::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&array![[0.0]]).unwrap(), array![0.0]);
    }

    #[test]
    fn k_is_capped_by_training_size() {
        let x = array![[0.0], [2.0]];
        let y = array![1.0, 3.0];
        let mut model = KNeighborsRegressor::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&array![[100.0]]).unwrap(), array![2.0]);
    }
}
