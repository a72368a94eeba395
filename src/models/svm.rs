//! Kernel support vector machines solved by dual coordinate descent.
//!
//! Both models use an RBF kernel with `gamma = 1 / (n_features · Var(X))`.
//! The bias is folded into the kernel (`K + 1`), which removes the equality
//! constraint from the dual and leaves a box-constrained problem that can be
//! solved one coordinate at a time.

use ndarray::{Array1, Array2, ArrayView1};

use super::{class_indices, not_fitted, Estimator};
use crate::error::Result;

const MAX_EPOCHS: usize = 1000;
const TOL: f64 = 1e-3;

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct RbfKernel {
    gamma: f64,
}

impl RbfKernel {
    /// `gamma = "scale"`; falls back to 1.0 for constant or empty inputs.
    fn scaled_for(x: &Array2<f64>) -> Self {
        let n = x.len();
        if n == 0 {
            return Self { gamma: 1.0 };
        }
        let mean = x.sum() / n as f64;
        let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        let gamma = if var > 0.0 {
            1.0 / (x.ncols() as f64 * var)
        } else {
            1.0
        };
        Self { gamma }
    }

    /// Kernel value plus the constant bias term.
    fn eval(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let dist: f64 = a.iter().zip(b.iter()).map(|(p, q)| (p - q).powi(2)).sum();
        (-self.gamma * dist).exp() + 1.0
    }

    fn gram(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let v = self.eval(x.row(i), x.row(j));
                k[[i, j]] = v;
                k[[j, i]] = v;
            }
        }
        k
    }
}

// ---------------------------------------------------------------------------
// SVC
// ---------------------------------------------------------------------------

/// One binary machine: `f(x) = Σ coef_j · K(x, sv_j)`.
#[derive(Debug, Clone)]
struct BinaryMachine {
    negative: usize,
    positive: usize,
    rows: Vec<usize>,
    coef: Vec<f64>,
}

/// Solve the hinge-loss dual for labels `signs ∈ {−1, +1}`.
fn solve_hinge_dual(k: &Array2<f64>, rows: &[usize], signs: &[f64], c: f64) -> Vec<f64> {
    let n = rows.len();
    let mut alpha = vec![0.0; n];
    // f[i] = Σ_j alpha_j · s_j · K_ij
    let mut f = vec![0.0; n];

    for _ in 0..MAX_EPOCHS {
        let mut max_violation: f64 = 0.0;
        for i in 0..n {
            let kii = k[[rows[i], rows[i]]];
            let grad = signs[i] * f[i] - 1.0;

            let projected = if alpha[i] <= 0.0 {
                grad.min(0.0)
            } else if alpha[i] >= c {
                grad.max(0.0)
            } else {
                grad
            };
            max_violation = max_violation.max(projected.abs());
            if projected == 0.0 {
                continue;
            }

            let new = (alpha[i] - grad / kii).clamp(0.0, c);
            let delta = new - alpha[i];
            if delta != 0.0 {
                alpha[i] = new;
                for j in 0..n {
                    f[j] += delta * signs[i] * k[[rows[i], rows[j]]];
                }
            }
        }
        if max_violation < TOL {
            break;
        }
    }

    alpha.iter().zip(signs).map(|(a, s)| a * s).collect()
}

/// RBF support vector classifier; multiclass problems are split one-vs-one
/// and decided by majority vote.
#[derive(Debug, Clone)]
pub struct SVC {
    pub c: f64,
    kernel: Option<RbfKernel>,
    train: Array2<f64>,
    classes: Vec<usize>,
    machines: Vec<BinaryMachine>,
}

impl Default for SVC {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: None,
            train: Array2::zeros((0, 0)),
            classes: Vec::new(),
            machines: Vec::new(),
        }
    }
}

impl Estimator for SVC {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let kernel = RbfKernel::scaled_for(x);
        let gram = kernel.gram(x);
        self.classes = class_indices(y);
        self.machines.clear();

        for a in 0..self.classes.len() {
            for b in (a + 1)..self.classes.len() {
                let (neg, pos) = (self.classes[a], self.classes[b]);
                let rows: Vec<usize> = (0..y.len())
                    .filter(|&i| y[i] as usize == neg || y[i] as usize == pos)
                    .collect();
                let signs: Vec<f64> = rows
                    .iter()
                    .map(|&i| if y[i] as usize == pos { 1.0 } else { -1.0 })
                    .collect();
                let coef = solve_hinge_dual(&gram, &rows, &signs, self.c);
                self.machines.push(BinaryMachine {
                    negative: neg,
                    positive: pos,
                    rows,
                    coef,
                });
            }
        }

        self.train = x.clone();
        self.kernel = Some(kernel);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let kernel = self.kernel.ok_or_else(|| not_fitted("SVC"))?;
        if self.classes.len() < 2 {
            let only = self.classes.first().copied().unwrap_or(0);
            return Ok(Array1::from_elem(x.nrows(), only as f64));
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut votes = vec![0usize; self.classes.len()];
                for m in &self.machines {
                    let decision: f64 = m
                        .rows
                        .iter()
                        .zip(&m.coef)
                        .filter(|(_, c)| **c != 0.0)
                        .map(|(&j, c)| c * kernel.eval(row, self.train.row(j)))
                        .sum();
                    let winner = if decision > 0.0 { m.positive } else { m.negative };
                    if let Ok(pos) = self.classes.binary_search(&winner) {
                        votes[pos] += 1;
                    }
                }
                // first (smallest) class wins ties
                let best = votes
                    .iter()
                    .enumerate()
                    .fold(0, |best, (i, v)| if *v > votes[best] { i } else { best });
                self.classes[best] as f64
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// SVR
// ---------------------------------------------------------------------------

/// Epsilon-insensitive RBF support vector regression.
///
/// Minimises `½ βᵀKβ − yᵀβ + ε‖β‖₁` over `β ∈ [−C, C]ⁿ`.
#[derive(Debug, Clone)]
pub struct SVR {
    pub c: f64,
    pub epsilon: f64,
    kernel: Option<RbfKernel>,
    train: Array2<f64>,
    beta: Vec<f64>,
}

impl Default for SVR {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.1,
            kernel: None,
            train: Array2::zeros((0, 0)),
            beta: Vec::new(),
        }
    }
}

impl Estimator for SVR {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let kernel = RbfKernel::scaled_for(x);
        let k = kernel.gram(x);
        let n = y.len();
        let mut beta = vec![0.0; n];
        // f[i] = Σ_j beta_j · K_ij
        let mut f = vec![0.0; n];

        for _ in 0..MAX_EPOCHS {
            let mut max_delta: f64 = 0.0;
            for i in 0..n {
                let kii = k[[i, i]];
                let g = f[i] - kii * beta[i] - y[i];
                let shrunk = if g > self.epsilon {
                    g - self.epsilon
                } else if g < -self.epsilon {
                    g + self.epsilon
                } else {
                    0.0
                };
                let new = (-shrunk / kii).clamp(-self.c, self.c);
                let delta = new - beta[i];
                if delta != 0.0 {
                    beta[i] = new;
                    for j in 0..n {
                        f[j] += delta * k[[i, j]];
                    }
                }
                max_delta = max_delta.max(delta.abs());
            }
            if max_delta < TOL * 1e-1 {
                break;
            }
        }

        self.beta = beta;
        self.train = x.clone();
        self.kernel = Some(kernel);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let kernel = self.kernel.ok_or_else(|| not_fitted("SVR"))?;
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                self.beta
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| **b != 0.0)
                    .map(|(j, b)| b * kernel.eval(row, self.train.row(j)))
                    .sum()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn svc_separates_two_groups() {
        let x = array![[0.0, 0.0], [0.3, 0.1], [0.1, 0.4], [3.0, 3.0], [3.2, 2.9], [2.8, 3.1]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = SVC::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&array![[0.2, 0.2], [3.0, 3.1]]).unwrap(), array![0.0, 1.0]);
    }

    #[test]
    fn svc_votes_across_three_classes() {
        let x = array![[0.0, 0.0], [0.2, 0.1], [4.0, 0.0], [4.1, 0.2], [0.0, 4.0], [0.1, 4.2]];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let mut model = SVC::default();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn svr_tracks_a_smooth_target() {
        let x = array![[0.0], [0.5], [1.0], [1.5], [2.0], [2.5], [3.0]];
        let y = x.column(0).mapv(|v| 0.5 * v);
        let mut model = SVR::default();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 0.3, "prediction {p} too far from {t}");
        }
    }
}
