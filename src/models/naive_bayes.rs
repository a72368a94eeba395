use ndarray::{Array1, Array2, Axis};

use super::{argmax, class_indices, not_fitted, Estimator};
use crate::error::Result;

/// Gaussian naive Bayes with per-class feature means and variances.
///
/// `var_smoothing` times the largest feature variance is added to every
/// variance so constant features do not collapse the likelihood.
#[derive(Debug, Clone)]
pub struct GaussianNB {
    pub var_smoothing: f64,
    state: Option<NbState>,
}

#[derive(Debug, Clone)]
struct NbState {
    classes: Vec<usize>,
    log_priors: Vec<f64>,
    /// classes × features
    means: Array2<f64>,
    vars: Array2<f64>,
}

impl Default for GaussianNB {
    fn default() -> Self {
        Self {
            var_smoothing: 1e-9,
            state: None,
        }
    }
}

impl Estimator for GaussianNB {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let classes = class_indices(y);
        let (n, d) = x.dim();

        let overall = x.var_axis(Axis(0), 0.0);
        let max_var = overall.iter().cloned().fold(0.0, f64::max);
        let epsilon = if max_var > 0.0 {
            self.var_smoothing * max_var
        } else {
            self.var_smoothing
        };

        let mut means = Array2::zeros((classes.len(), d));
        let mut vars = Array2::zeros((classes.len(), d));
        let mut log_priors = Vec::with_capacity(classes.len());

        for (ci, &class) in classes.iter().enumerate() {
            let rows: Vec<usize> = (0..n).filter(|&i| y[i] as usize == class).collect();
            let subset = x.select(Axis(0), &rows);
            let mean = subset
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(d));
            let var = subset.var_axis(Axis(0), 0.0) + epsilon;
            means.row_mut(ci).assign(&mean);
            vars.row_mut(ci).assign(&var);
            log_priors.push((rows.len() as f64 / n as f64).ln());
        }

        self.state = Some(NbState {
            classes,
            log_priors,
            means,
            vars,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let state = self.state.as_ref().ok_or_else(|| not_fitted("GaussianNB"))?;
        let two_pi = 2.0 * std::f64::consts::PI;

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let joint: Vec<f64> = (0..state.classes.len())
                    .map(|ci| {
                        let mut ll = state.log_priors[ci];
                        for (j, v) in row.iter().enumerate() {
                            let var = state.vars[[ci, j]];
                            let diff = v - state.means[[ci, j]];
                            ll -= 0.5 * (two_pi * var).ln() + diff * diff / (2.0 * var);
                        }
                        ll
                    })
                    .collect();
                state.classes[argmax(&joint)] as f64
            })
            .collect())
    }
}
