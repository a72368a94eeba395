use std::path::Path;

use log::info;

use crate::config::TrainOptions;
use crate::data::encoder::encode;
use crate::data::loader::{classify, ClassifiedContent};
use crate::data::model::Table;
use crate::data::source::{load_source, SourceResolver};
use crate::error::{PredictorError, Result};
use crate::models::resolve;
use crate::predictor::{evaluate, render, split_and_fit};

// ---------------------------------------------------------------------------
// Pipeline entry points
// ---------------------------------------------------------------------------

/// What a pipeline run produced. Non-tabular content is handed back as-is,
/// tagged with its classification.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Report(String),
    Text(String),
    Malformed(String),
}

impl PipelineOutcome {
    pub fn report(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Report(r) => Some(r),
            _ => None,
        }
    }
}

/// Encode `table`, train the requested model and render the report.
pub fn train_model(table: &Table, options: &TrainOptions) -> Result<String> {
    let renamed;
    let table = match &options.column {
        Some(names) => {
            renamed = table.with_column_names(names)?;
            &renamed
        }
        None => table,
    };

    let label = match &options.label {
        Some(label) => label.clone(),
        None => table
            .column_names()
            .pop()
            .ok_or_else(|| PredictorError::insufficient("the table has no columns"))?,
    };

    let (matrix, target) = encode(table, &label)?;
    let spec = resolve(&options.model)?;
    info!(
        "Running {} ({}) on {} rows x {} features, target '{label}' ({})",
        spec.name,
        spec.family,
        matrix.n_rows(),
        matrix.n_features(),
        target.kind()
    );

    let fit = split_and_fit(
        &matrix,
        &target,
        spec,
        options.test_size,
        options.random_state,
    )?;
    let result = evaluate(spec.family, &fit.y_test, &fit.y_pred, &target)?;

    Ok(render(spec.name, &label, fit.split.sizes(), &result))
}

fn run_classified(content: ClassifiedContent, options: &TrainOptions) -> Result<PipelineOutcome> {
    match content {
        ClassifiedContent::Tabular(table) => train_model(&table, options).map(PipelineOutcome::Report),
        ClassifiedContent::Text(text) => Ok(PipelineOutcome::Text(text)),
        ClassifiedContent::Malformed(text) => Ok(PipelineOutcome::Malformed(text)),
    }
}

/// Classify raw text and, when it is tabular, train on it.
pub fn run_content(content: &str, options: &TrainOptions) -> Result<PipelineOutcome> {
    run_classified(classify(content), options)
}

/// Resolve a named source, load it and run it through the pipeline.
///
/// `Ok(None)` signals a source the resolver cannot provide as a file.
pub fn load_and_train(
    resolver: &dyn SourceResolver,
    name: &str,
    base_dir: &Path,
    options: &TrainOptions,
) -> anyhow::Result<Option<PipelineOutcome>> {
    match load_source(resolver, name, base_dir)? {
        Some(content) => Ok(Some(run_classified(content, options)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "a,b,target\n1,2,0\n3,4,1\n5,6,0\n7,8,1\n9,10,0";

    #[test]
    fn label_defaults_to_last_column() {
        let options = TrainOptions::default().with_model("LogisticRegression");
        let outcome = run_content(SMALL, &options).unwrap();
        assert!(outcome.report().unwrap().contains("**Target Column:** target"));
    }

    #[test]
    fn text_and_malformed_short_circuit() {
        let options = TrainOptions::default();
        assert_eq!(
            run_content("just a sentence", &options).unwrap(),
            PipelineOutcome::Text("just a sentence".into())
        );
        assert!(matches!(
            run_content("a,b\n1,2,3,4", &options).unwrap(),
            PipelineOutcome::Malformed(_)
        ));
    }

    #[test]
    fn column_option_renames_positionally() {
        let options = TrainOptions {
            model: "LogisticRegression".into(),
            label: Some("y".into()),
            column: Some(vec!["x1".into(), "x2".into(), "y".into()]),
            ..TrainOptions::default()
        };
        let report = run_content(SMALL, &options).unwrap();
        assert!(report.report().unwrap().contains("**Target Column:** y"));
    }

    #[test]
    fn column_option_with_wrong_width_fails() {
        let options = TrainOptions {
            column: Some(vec!["only".into()]),
            ..TrainOptions::default()
        };
        assert!(matches!(
            run_content(SMALL, &options),
            Err(PredictorError::ColumnCountMismatch {
                expected: 3,
                found: 1
            })
        ));
    }
}
