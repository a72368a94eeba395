//! The fixed, read-only registry of trainable models.

use log::debug;

use super::ensemble::{
    GradientBoostingClassifier, GradientBoostingRegressor, RandomForestClassifier,
    RandomForestRegressor,
};
use super::linear::{Lasso, LinearRegression, LogisticRegression, Ridge};
use super::naive_bayes::GaussianNB;
use super::neighbors::{KNeighborsClassifier, KNeighborsRegressor};
use super::svm::{SVC, SVR};
use super::tree::{DecisionTreeClassifier, DecisionTreeRegressor};
use super::{Estimator, Family};
use crate::error::{PredictorError, Result};

/// A catalogue entry: the model's name, family, and a factory producing a
/// fresh default-configured estimator seeded with `random_state`.
#[derive(Clone, Copy)]
pub struct ModelSpec {
    pub name: &'static str,
    pub family: Family,
    factory: fn(u64) -> Box<dyn Estimator>,
}

impl ModelSpec {
    /// A new, untrained estimator. Nothing is shared between calls.
    pub fn build(&self, seed: u64) -> Box<dyn Estimator> {
        (self.factory)(seed)
    }
}

impl std::fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSpec")
            .field("name", &self.name)
            .field("family", &self.family)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

fn logistic_regression(_: u64) -> Box<dyn Estimator> {
    Box::new(LogisticRegression::default())
}

fn decision_tree_classifier(seed: u64) -> Box<dyn Estimator> {
    Box::new(DecisionTreeClassifier::new(seed))
}

fn random_forest_classifier(seed: u64) -> Box<dyn Estimator> {
    Box::new(RandomForestClassifier::new(seed))
}

fn gradient_boosting_classifier(seed: u64) -> Box<dyn Estimator> {
    Box::new(GradientBoostingClassifier::new(seed))
}

fn svc(_: u64) -> Box<dyn Estimator> {
    Box::new(SVC::default())
}

fn k_neighbors_classifier(_: u64) -> Box<dyn Estimator> {
    Box::new(KNeighborsClassifier::default())
}

fn gaussian_nb(_: u64) -> Box<dyn Estimator> {
    Box::new(GaussianNB::default())
}

fn linear_regression(_: u64) -> Box<dyn Estimator> {
    Box::new(LinearRegression::default())
}

fn ridge(_: u64) -> Box<dyn Estimator> {
    Box::new(Ridge::default())
}

fn lasso(_: u64) -> Box<dyn Estimator> {
    Box::new(Lasso::default())
}

fn decision_tree_regressor(seed: u64) -> Box<dyn Estimator> {
    Box::new(DecisionTreeRegressor::new(seed))
}

fn random_forest_regressor(seed: u64) -> Box<dyn Estimator> {
    Box::new(RandomForestRegressor::new(seed))
}

fn gradient_boosting_regressor(seed: u64) -> Box<dyn Estimator> {
    Box::new(GradientBoostingRegressor::new(seed))
}

fn svr(_: u64) -> Box<dyn Estimator> {
    Box::new(SVR::default())
}

fn k_neighbors_regressor(_: u64) -> Box<dyn Estimator> {
    Box::new(KNeighborsRegressor::default())
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

const fn spec(
    name: &'static str,
    family: Family,
    factory: fn(u64) -> Box<dyn Estimator>,
) -> ModelSpec {
    ModelSpec {
        name,
        family,
        factory,
    }
}

static CATALOGUE: [ModelSpec; 15] = [
    spec("LogisticRegression", Family::Classification, logistic_regression),
    spec("DecisionTreeClassifier", Family::Classification, decision_tree_classifier),
    spec("RandomForestClassifier", Family::Classification, random_forest_classifier),
    spec("GradientBoostingClassifier", Family::Classification, gradient_boosting_classifier),
    spec("SVC", Family::Classification, svc),
    spec("KNeighborsClassifier", Family::Classification, k_neighbors_classifier),
    spec("GaussianNB", Family::Classification, gaussian_nb),
    spec("LinearRegression", Family::Regression, linear_regression),
    spec("Ridge", Family::Regression, ridge),
    spec("Lasso", Family::Regression, lasso),
    spec("DecisionTreeRegressor", Family::Regression, decision_tree_regressor),
    spec("RandomForestRegressor", Family::Regression, random_forest_regressor),
    spec("GradientBoostingRegressor", Family::Regression, gradient_boosting_regressor),
    spec("SVR", Family::Regression, svr),
    spec("KNeighborsRegressor", Family::Regression, k_neighbors_regressor),
];

/// All registered model names, in catalogue order.
pub fn model_names() -> Vec<&'static str> {
    CATALOGUE.iter().map(|s| s.name).collect()
}

/// Look a model up by its exact name.
pub fn resolve(name: &str) -> Result<&'static ModelSpec> {
    match CATALOGUE.iter().find(|s| s.name == name) {
        Some(spec) => {
            debug!("Resolved model '{}' ({})", spec.name, spec.family);
            Ok(spec)
        }
        None => Err(PredictorError::UnsupportedModel {
            name: name.to_string(),
            available: model_names().into_iter().map(String::from).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn catalogue_has_fifteen_unique_names() {
        let mut names = model_names();
        assert_eq!(names.len(), 15);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 15);
    }

    #[test]
    fn families_split_seven_and_eight() {
        let classifiers = CATALOGUE
            .iter()
            .filter(|s| s.family == Family::Classification)
            .count();
        assert_eq!(classifiers, 7);
        assert_eq!(CATALOGUE.len() - classifiers, 8);
    }

    #[test]
    fn unknown_name_lists_every_model() {
        let err = resolve("NotAModel").unwrap_err();
        match err {
            PredictorError::UnsupportedModel { name, available } => {
                assert_eq!(name, "NotAModel");
                assert_eq!(available.len(), 15);
                assert!(available.iter().any(|n| n == "GaussianNB"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn every_model_fits_and_predicts() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0], [5.0, 0.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        for spec in CATALOGUE.iter() {
            let mut model = spec.build(42);
            model.fit(&x, &y).unwrap();
            let pred = model.predict(&x).unwrap();
            assert_eq!(pred.len(), 6, "{}", spec.name);
            assert!(pred.iter().all(|p| p.is_finite()), "{}", spec.name);
        }
    }

    #[test]
    fn builds_are_independent() {
        let spec = resolve("KNeighborsRegressor").unwrap();
        let mut fitted = spec.build(0);
        fitted.fit(&array![[0.0]], &array![1.0]).unwrap();
        let fresh = spec.build(0);
        assert!(fresh.predict(&array![[0.0]]).is_err());
    }
}
