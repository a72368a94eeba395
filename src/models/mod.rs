//! Estimators and the fixed model catalogue.
//!
//! Every estimator works on a dense `Array2<f64>` feature matrix. Regressors
//! fit and predict real values; classifiers receive class indices encoded as
//! `f64` (`0.0, 1.0, ...`) and predict class indices back. Mapping between
//! user labels and indices is the trainer's job.

use std::fmt;

use ndarray::{Array1, Array2};

use crate::error::Result;

pub mod catalogue;
pub mod ensemble;
pub mod linalg;
pub mod linear;
pub mod naive_bayes;
pub mod neighbors;
pub mod svm;
pub mod tree;

pub use catalogue::{model_names, resolve, ModelSpec};

/// Which metric set and target handling applies to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Classification,
    Regression,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Classification => write!(f, "classification"),
            Family::Regression => write!(f, "regression"),
        }
    }
}

/// A trainable model.
pub trait Estimator: fmt::Debug + Send {
    /// Fit on `x` (rows × features) and targets `y` (one per row).
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Sorted distinct class indices present in a classification target.
pub(crate) fn class_indices(y: &Array1<f64>) -> Vec<usize> {
    let mut classes: Vec<usize> = y.iter().map(|&v| v as usize).collect();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Fail prediction on a model that was never fitted.
pub(crate) fn not_fitted(model: &str) -> crate::error::PredictorError {
    crate::error::PredictorError::estimator(format!("{model} is not fitted yet"))
}
