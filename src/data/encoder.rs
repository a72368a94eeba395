use log::debug;
use ndarray::Array2;

use super::model::{ColumnData, Table};
use crate::error::{PredictorError, Result};

// ---------------------------------------------------------------------------
// FeatureMatrix – numeric features plus their names
// ---------------------------------------------------------------------------

/// Dense numeric feature matrix. `feature_names.len() == values.ncols()`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub values: Array2<f64>,
    pub feature_names: Vec<String>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }
}

// ---------------------------------------------------------------------------
// One-hot encoding of a single categorical column
// ---------------------------------------------------------------------------

/// Categories learned for one categorical column, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBlock {
    pub column: String,
    pub categories: Vec<String>,
}

impl CategoryBlock {
    fn fit(column: &str, values: &[String]) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for v in values {
            if !categories.contains(v) {
                categories.push(v.clone());
            }
        }
        Self {
            column: column.to_string(),
            categories,
        }
    }

    fn feature_names(&self) -> impl Iterator<Item = String> + '_ {
        self.categories
            .iter()
            .map(move |cat| format!("{}_{}", self.column, cat))
    }

    /// Position of `value` within the block; `None` for unseen categories,
    /// which encode as an all-zero row.
    fn position(&self, value: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == value)
    }
}

// ---------------------------------------------------------------------------
// FeatureEncoder
// ---------------------------------------------------------------------------

/// Fitted feature layout: numeric columns pass through in original order,
/// followed by one one-hot block per categorical column.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEncoder {
    label_column: String,
    numeric: Vec<String>,
    categorical: Vec<CategoryBlock>,
}

impl FeatureEncoder {
    /// Learn the feature layout from a training table.
    pub fn fit(table: &Table, label_column: &str) -> Result<Self> {
        if table.column(label_column).is_none() {
            return Err(PredictorError::ColumnNotFound {
                column: label_column.to_string(),
                available: table.column_names(),
            });
        }

        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        for col in table.columns().iter().filter(|c| c.name != label_column) {
            match &col.data {
                ColumnData::Numeric(_) => numeric.push(col.name.clone()),
                ColumnData::Categorical(values) => {
                    categorical.push(CategoryBlock::fit(&col.name, values))
                }
            }
        }

        Ok(Self {
            label_column: label_column.to_string(),
            numeric,
            categorical,
        })
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn category_blocks(&self) -> &[CategoryBlock] {
        &self.categorical
    }

    /// Output feature names, numeric first then every categorical expansion.
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric
            .iter()
            .cloned()
            .chain(self.categorical.iter().flat_map(|b| b.feature_names()))
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|b| b.categories.len())
                .sum::<usize>()
    }

    /// Encode any table with the fitted layout. Categories unseen at fit time
    /// produce all-zero blocks instead of failing.
    pub fn transform(&self, table: &Table) -> Result<FeatureMatrix> {
        let n_rows = table.n_rows();
        let mut values = Array2::<f64>::zeros((n_rows, self.n_features()));

        let mut offset = 0;
        for name in &self.numeric {
            let data = self.lookup(table, name)?;
            let col = data.as_numeric().ok_or_else(|| {
                PredictorError::estimator(format!("column '{name}' is no longer numeric"))
            })?;
            for (row, v) in col.iter().enumerate() {
                values[[row, offset]] = *v;
            }
            offset += 1;
        }

        for block in &self.categorical {
            match self.lookup(table, &block.column)? {
                ColumnData::Categorical(col) => {
                    for (row, v) in col.iter().enumerate() {
                        if let Some(pos) = block.position(v) {
                            values[[row, offset + pos]] = 1.0;
                        }
                    }
                }
                ColumnData::Numeric(_) => {
                    return Err(PredictorError::estimator(format!(
                        "column '{}' is no longer categorical",
                        block.column
                    )))
                }
            }
            offset += block.categories.len();
        }

        Ok(FeatureMatrix {
            values,
            feature_names: self.feature_names(),
        })
    }

    fn lookup<'t>(&self, table: &'t Table, name: &str) -> Result<&'t ColumnData> {
        table
            .column(name)
            .map(|c| &c.data)
            .ok_or_else(|| PredictorError::ColumnNotFound {
                column: name.to_string(),
                available: table.column_names(),
            })
    }
}

/// Split `table` into a feature matrix and the target column.
///
/// Fails with [`PredictorError::ColumnNotFound`] when `label_column` is not a
/// column of the table. A table holding only the label yields a matrix with
/// zero feature columns.
pub fn encode(table: &Table, label_column: &str) -> Result<(FeatureMatrix, ColumnData)> {
    let encoder = FeatureEncoder::fit(table, label_column)?;
    let matrix = encoder.transform(table)?;
    let target = encoder.lookup(table, encoder.label_column())?.clone();

    debug!(
        "encoded {} rows: {} numeric, {} categorical source columns -> {} features",
        matrix.n_rows(),
        encoder.numeric.len(),
        encoder.categorical.len(),
        matrix.n_features()
    );

    Ok((matrix, target))
}
