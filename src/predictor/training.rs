use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::encoder::FeatureMatrix;
use crate::data::model::{ColumnData, Label};
use crate::error::{PredictorError, Result};
use crate::models::{Estimator, Family, ModelSpec};

// ---------------------------------------------------------------------------
// TrainTestSplit – seeded row partition
// ---------------------------------------------------------------------------

/// Row indices of the training and held-out partitions.
///
/// `train.len() + test.len()` equals the source row count and both sides are
/// non-empty. The same `(n_rows, test_fraction, seed)` always gives the same
/// partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    pub fn new(n_rows: usize, test_fraction: f64, seed: u64) -> Result<Self> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PredictorError::insufficient(format!(
                "test fraction must lie strictly between 0 and 1, got {test_fraction}"
            )));
        }
        if n_rows == 0 {
            return Err(PredictorError::insufficient("the dataset has no rows"));
        }

        let n_test = (test_fraction * n_rows as f64).ceil() as usize;
        if n_test == 0 || n_test >= n_rows {
            return Err(PredictorError::insufficient(format!(
                "a test fraction of {test_fraction} on {n_rows} rows leaves an empty partition"
            )));
        }

        let mut order: Vec<usize> = (0..n_rows).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
        let train = order.split_off(n_test);

        Ok(Self { train, test: order })
    }

    /// `(train, test)` row counts.
    pub fn sizes(&self) -> (usize, usize) {
        (self.train.len(), self.test.len())
    }
}

// ---------------------------------------------------------------------------
// Target encoding
// ---------------------------------------------------------------------------

/// Maps class labels to the indices classifiers train on.
#[derive(Debug, Clone)]
struct ClassIndex {
    labels: Vec<Label>,
}

impl ClassIndex {
    fn fit(target: &ColumnData) -> Self {
        let mut labels = target.labels();
        labels.sort();
        labels.dedup();
        Self { labels }
    }

    fn encode(&self, target: &ColumnData) -> Array1<f64> {
        target
            .labels()
            .iter()
            .map(|l| self.labels.binary_search(l).unwrap_or(0) as f64)
            .collect()
    }

    /// Map predicted indices back onto labels, keeping the target's type.
    fn decode(&self, indices: &Array1<f64>, like: &ColumnData) -> ColumnData {
        let picked = indices.iter().map(|&i| {
            let pos = (i.max(0.0) as usize).min(self.labels.len().saturating_sub(1));
            &self.labels[pos]
        });
        match like {
            ColumnData::Numeric(_) => ColumnData::Numeric(
                picked
                    .map(|l| match l {
                        Label::Number(v) => *v,
                        Label::Text(_) => f64::NAN,
                    })
                    .collect(),
            ),
            ColumnData::Categorical(_) => {
                ColumnData::Categorical(picked.map(|l| l.to_string()).collect())
            }
        }
    }
}

fn regression_target(target: &ColumnData) -> Result<Array1<f64>> {
    let values = target.as_numeric().ok_or_else(|| {
        PredictorError::estimator("regression models need a numeric target column")
    })?;
    if values.iter().any(|v| !v.is_finite()) {
        return Err(PredictorError::estimator(
            "the target column contains missing or non-finite values",
        ));
    }
    Ok(Array1::from(values.to_vec()))
}

/// Class labels may be text, but numeric labels must all be present.
fn check_class_target(target: &ColumnData) -> Result<()> {
    match target.as_numeric() {
        Some(values) if values.iter().any(|v| !v.is_finite()) => Err(PredictorError::estimator(
            "the target column contains missing or non-finite class labels",
        )),
        _ => Ok(()),
    }
}

fn check_finite(x: &Array2<f64>) -> Result<()> {
    if x.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PredictorError::estimator(
            "the feature matrix contains missing or non-finite values",
        ))
    }
}

// ---------------------------------------------------------------------------
// split_and_fit
// ---------------------------------------------------------------------------

/// A fitted model plus everything the evaluator needs.
#[derive(Debug)]
pub struct FitOutcome {
    pub model: Box<dyn Estimator>,
    pub split: TrainTestSplit,
    pub train_predictions: ColumnData,
    pub y_test: ColumnData,
    pub y_pred: ColumnData,
}

/// Partition the rows, fit a fresh estimator on the training side and
/// predict the held-out side. The test rows never reach `fit`.
pub fn split_and_fit(
    matrix: &FeatureMatrix,
    target: &ColumnData,
    spec: &ModelSpec,
    test_fraction: f64,
    seed: u64,
) -> Result<FitOutcome> {
    if matrix.n_rows() != target.len() {
        return Err(PredictorError::insufficient(format!(
            "feature matrix has {} rows but the target has {}",
            matrix.n_rows(),
            target.len()
        )));
    }

    let split = TrainTestSplit::new(matrix.n_rows(), test_fraction, seed)?;
    let (n_train, n_test) = split.sizes();
    info!(
        "Training {} on {n_train} rows, holding out {n_test} (seed {seed})",
        spec.name
    );

    let x_train = matrix.values.select(Axis(0), &split.train);
    let x_test = matrix.values.select(Axis(0), &split.test);
    check_finite(&x_train)?;
    check_finite(&x_test)?;

    let t_train = target.select(&split.train);
    let y_test = target.select(&split.test);

    let mut model = spec.build(seed);
    let (train_predictions, y_pred) = match spec.family {
        Family::Regression => {
            let y_train = regression_target(&t_train)?;
            model.fit(&x_train, &y_train)?;
            (
                ColumnData::Numeric(model.predict(&x_train)?.to_vec()),
                ColumnData::Numeric(model.predict(&x_test)?.to_vec()),
            )
        }
        Family::Classification => {
            check_class_target(target)?;
            let classes = ClassIndex::fit(&t_train);
            debug!("{} classes in the training partition", classes.labels.len());
            model.fit(&x_train, &classes.encode(&t_train))?;
            (
                classes.decode(&model.predict(&x_train)?, target),
                classes.decode(&model.predict(&x_test)?, target),
            )
        }
    };
    debug!("{} fitted", spec.name);

    Ok(FitOutcome {
        model,
        split,
        train_predictions,
        y_test,
        y_pred,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resolve;
    use ndarray::array;

    fn matrix(values: Array2<f64>) -> FeatureMatrix {
        let feature_names = (0..values.ncols()).map(|i| format!("f{i}")).collect();
        FeatureMatrix {
            values,
            feature_names,
        }
    }

    #[test]
    fn split_sizes_round_up_the_test_side() {
        let split = TrainTestSplit::new(5, 0.2, 42).unwrap();
        assert_eq!(split.sizes(), (4, 1));
        let split = TrainTestSplit::new(11, 0.2, 42).unwrap();
        assert_eq!(split.sizes(), (8, 3));
    }

    #[test]
    fn split_covers_every_row_once() {
        let split = TrainTestSplit::new(20, 0.3, 7).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_reproducible() {
        assert_eq!(
            TrainTestSplit::new(30, 0.2, 42).unwrap(),
            TrainTestSplit::new(30, 0.2, 42).unwrap()
        );
    }

    #[test]
    fn degenerate_fractions_are_rejected() {
        for frac in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                TrainTestSplit::new(10, frac, 0),
                Err(PredictorError::InsufficientData(_))
            ));
        }
        assert!(matches!(
            TrainTestSplit::new(0, 0.2, 0),
            Err(PredictorError::InsufficientData(_))
        ));
        // one row cannot feed both partitions
        assert!(TrainTestSplit::new(1, 0.5, 0).is_err());
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let m = matrix(array![[1.0], [2.0], [3.0]]);
        let target = ColumnData::Numeric(vec![1.0, 2.0]);
        let spec = resolve("LinearRegression").unwrap();
        assert!(matches!(
            split_and_fit(&m, &target, spec, 0.2, 42),
            Err(PredictorError::InsufficientData(_))
        ));
    }

    #[test]
    fn categorical_labels_come_back_as_text() {
        let m = matrix(array![[0.0], [0.1], [0.2], [5.0], [5.1], [5.2], [0.05], [5.05]]);
        let target = ColumnData::Categorical(
            ["no", "no", "no", "yes", "yes", "yes", "no", "yes"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let spec = resolve("DecisionTreeClassifier").unwrap();
        let out = split_and_fit(&m, &target, spec, 0.25, 42).unwrap();
        assert_eq!(out.y_test.len(), 2);
        assert_eq!(out.y_pred, out.y_test);
        assert_eq!(out.train_predictions.len(), 6);
    }

    #[test]
    fn regression_rejects_text_target() {
        let m = matrix(array![[1.0], [2.0], [3.0]]);
        let target = ColumnData::Categorical(vec!["a".into(), "b".into(), "c".into()]);
        let spec = resolve("Ridge").unwrap();
        assert!(matches!(
            split_and_fit(&m, &target, spec, 0.34, 42),
            Err(PredictorError::Estimator(_))
        ));
    }

    #[test]
    fn missing_class_label_is_rejected() {
        let m = matrix(array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]]);
        let target = ColumnData::Numeric(vec![0.0, 1.0, f64::NAN, 1.0, 0.0, 1.0]);
        let spec = resolve("DecisionTreeClassifier").unwrap();
        assert!(matches!(
            split_and_fit(&m, &target, spec, 0.34, 42),
            Err(PredictorError::Estimator(_))
        ));
    }

    #[test]
    fn nan_features_are_rejected() {
        let m = matrix(array![[1.0], [f64::NAN], [3.0], [4.0]]);
        let target = ColumnData::Numeric(vec![1.0, 2.0, 3.0, 4.0]);
        let spec = resolve("LinearRegression").unwrap();
        assert!(matches!(
            split_and_fit(&m, &target, spec, 0.25, 1),
            Err(PredictorError::Estimator(_))
        ));
    }
}
