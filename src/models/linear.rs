use ndarray::{Array1, Array2, Axis};

use super::linalg::{column_means, column_scales, solve_symmetric};
use super::{argmax, class_indices, not_fitted, Estimator};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Least squares family: LinearRegression, Ridge
// ---------------------------------------------------------------------------

/// Fitted coefficients plus intercept.
#[derive(Debug, Clone, Default)]
struct LinearFit {
    coef: Array1<f64>,
    intercept: f64,
}

impl LinearFit {
    fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.coef) + self.intercept
    }
}

/// Centre the data, solve `(XᵀX + αI) w = Xᵀy`, recover the intercept.
fn fit_least_squares(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> LinearFit {
    let x_mean = column_means(x);
    let y_mean = y.mean().unwrap_or(0.0);
    let xc = x - &x_mean;
    let yc = y - y_mean;

    let mut gram = xc.t().dot(&xc);
    for i in 0..gram.nrows() {
        gram[[i, i]] += alpha;
    }
    let coef = solve_symmetric(&gram, &xc.t().dot(&yc));
    let intercept = y_mean - x_mean.dot(&coef);

    LinearFit { coef, intercept }
}

/// Ordinary least squares.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    fit: Option<LinearFit>,
}

impl Estimator for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.fit = Some(fit_least_squares(x, y, 0.0));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fit = self.fit.as_ref().ok_or_else(|| not_fitted("LinearRegression"))?;
        Ok(fit.predict(x))
    }
}

/// L2-penalised least squares; the intercept is not penalised.
#[derive(Debug, Clone)]
pub struct Ridge {
    pub alpha: f64,
    fit: Option<LinearFit>,
}

impl Default for Ridge {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            fit: None,
        }
    }
}

impl Estimator for Ridge {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.fit = Some(fit_least_squares(x, y, self.alpha));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fit = self.fit.as_ref().ok_or_else(|| not_fitted("Ridge"))?;
        Ok(fit.predict(x))
    }
}

// ---------------------------------------------------------------------------
// Lasso – coordinate descent
// ---------------------------------------------------------------------------

/// L1-penalised least squares minimising
/// `1/(2n) · ‖y − Xw‖² + α · ‖w‖₁` by cyclic coordinate descent.
#[derive(Debug, Clone)]
pub struct Lasso {
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
    fit: Option<LinearFit>,
}

impl Default for Lasso {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_iter: 1000,
            tol: 1e-4,
            fit: None,
        }
    }
}

fn soft_threshold(v: f64, lambda: f64) -> f64 {
    if v > lambda {
        v - lambda
    } else if v < -lambda {
        v + lambda
    } else {
        0.0
    }
}

impl Estimator for Lasso {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows() as f64;
        let x_mean = column_means(x);
        let y_mean = y.mean().unwrap_or(0.0);
        let xc = x - &x_mean;
        let mut residual = y - y_mean;

        let col_sq: Vec<f64> = xc
            .axis_iter(Axis(1))
            .map(|c| c.dot(&c) / n)
            .collect();
        let mut coef = Array1::<f64>::zeros(x.ncols());

        for _ in 0..self.max_iter {
            let mut max_delta: f64 = 0.0;
            let mut max_coef: f64 = 0.0;

            for j in 0..x.ncols() {
                if col_sq[j] == 0.0 {
                    continue;
                }
                let col = xc.column(j);
                let old = coef[j];
                let rho = col.dot(&residual) / n + col_sq[j] * old;
                let new = soft_threshold(rho, self.alpha) / col_sq[j];

                if new != old {
                    residual.scaled_add(old - new, &col);
                    coef[j] = new;
                }
                max_delta = max_delta.max((new - old).abs());
                max_coef = max_coef.max(new.abs());
            }

            if max_delta <= self.tol * max_coef.max(1e-12) || max_delta == 0.0 {
                break;
            }
        }

        let intercept = y_mean - x_mean.dot(&coef);
        self.fit = Some(LinearFit { coef, intercept });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fit = self.fit.as_ref().ok_or_else(|| not_fitted("Lasso"))?;
        Ok(fit.predict(x))
    }
}

// ---------------------------------------------------------------------------
// LogisticRegression – multinomial, L2, batch gradient descent
// ---------------------------------------------------------------------------

/// Multinomial logistic regression with an L2 penalty of strength `1/C`.
///
/// Features are standardised internally; the softmax weights are fitted by
/// full-batch gradient descent for at most `max_iter` steps.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub learning_rate: f64,
    state: Option<LogisticState>,
}

#[derive(Debug, Clone)]
struct LogisticState {
    classes: Vec<usize>,
    means: Array1<f64>,
    scales: Array1<f64>,
    /// features × classes
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.5,
            state: None,
        }
    }
}

/// Row-wise softmax, in place.
fn softmax_rows(scores: &mut Array2<f64>) {
    for mut row in scores.rows_mut() {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
}

impl Estimator for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let classes = class_indices(y);
        let k = classes.len();
        let n = x.nrows();
        let means = column_means(x);
        let scales = column_scales(x, &means);
        let xs = (x - &means) / &scales;

        let mut onehot = Array2::<f64>::zeros((n, k));
        for (i, &label) in y.iter().enumerate() {
            if let Some(pos) = classes.iter().position(|&c| c == label as usize) {
                onehot[[i, pos]] = 1.0;
            }
        }

        let mut weights = Array2::<f64>::zeros((x.ncols(), k));
        let mut bias = Array1::<f64>::zeros(k);
        let penalty = 1.0 / (self.c * n.max(1) as f64);

        if k > 1 {
            for _ in 0..self.max_iter {
                let mut probs = xs.dot(&weights) + &bias;
                softmax_rows(&mut probs);
                let diff = (probs - &onehot) / n as f64;

                let grad_w = xs.t().dot(&diff) + &weights * penalty;
                let grad_b = diff.sum_axis(Axis(0));

                weights.scaled_add(-self.learning_rate, &grad_w);
                bias.scaled_add(-self.learning_rate, &grad_b);

                let grad_norm = grad_w
                    .iter()
                    .chain(grad_b.iter())
                    .fold(0.0_f64, |m, g| m.max(g.abs()));
                if grad_norm < self.tol {
                    break;
                }
            }
        }

        self.state = Some(LogisticState {
            classes,
            means,
            scales,
            weights,
            bias,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| not_fitted("LogisticRegression"))?;
        let xs = (x - &state.means) / &state.scales;
        let scores = xs.dot(&state.weights) + &state.bias;

        Ok(scores
            .rows()
            .into_iter()
            .map(|row| state.classes[argmax(&row.to_vec())] as f64)
            .collect())
    }
}
