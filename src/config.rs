use serde::Deserialize;

use crate::error::{PredictorError, Result};

fn default_model() -> String {
    "RandomForestClassifier".to_string()
}

fn default_test_size() -> f64 {
    0.2
}

fn default_random_state() -> u64 {
    42
}

/// Options for one training run.
///
/// Every field has a default, so an empty JSON object is a valid payload.
/// `test_size` is validated by the trainer rather than here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    /// Catalogue name of the model to train.
    pub model: String,
    /// Target column; the last column when absent.
    pub label: Option<String>,
    /// Column names to apply positionally to the data.
    pub column: Option<Vec<String>>,
    pub test_size: f64,
    pub random_state: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            model: default_model(),
            label: None,
            column: None,
            test_size: default_test_size(),
            random_state: default_random_state(),
        }
    }
}

impl TrainOptions {
    /// Build options from an untyped payload. `null` means all defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| PredictorError::InvalidOptions(e.to_string()))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
