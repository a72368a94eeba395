//! End-to-end runs from raw text to the Markdown report.

use std::fs;

use rusty_predictor::data::encoder::encode;
use rusty_predictor::data::loader::{classify, ClassifiedContent};
use rusty_predictor::data::sample::generate_sample_csv;
use rusty_predictor::data::source::GraphResolver;
use rusty_predictor::models::{model_names, resolve};
use rusty_predictor::predictor::{evaluate, split_and_fit};
use rusty_predictor::{
    load_and_train, run_content, train_model, PipelineOutcome, PredictorError, TrainOptions,
};

const SMALL: &str = "a,b,target\n1,2,0\n3,4,1\n5,6,0\n7,8,1\n9,10,0";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn table(text: &str) -> rusty_predictor::data::model::Table {
    match classify(text) {
        ClassifiedContent::Tabular(t) => t,
        other => panic!("expected tabular content, got {}", other.kind()),
    }
}

fn options(model: &str, label: &str) -> TrainOptions {
    TrainOptions::default().with_model(model).with_label(label)
}

#[test]
fn test_small_logistic_regression_report() {
    init_logger();
    let t = table(SMALL);
    let (matrix, _) = encode(&t, "target").unwrap();
    assert_eq!(matrix.values.dim(), (5, 2));
    assert_eq!(matrix.feature_names, vec!["a", "b"]);

    let report = train_model(&t, &options("LogisticRegression", "target")).unwrap();
    assert!(report.contains("**Model:** LogisticRegression"));
    assert!(report.contains("**Training Samples:** 4"));
    assert!(report.contains("**Test Samples:** 1"));

    let accuracy: f64 = report
        .lines()
        .find_map(|l| l.strip_prefix("**Accuracy:** "))
        .expect("accuracy line")
        .parse()
        .unwrap();
    assert!((0.0..=1.0).contains(&accuracy));
}

#[test]
fn test_unknown_model_lists_catalogue() {
    init_logger();
    let err = train_model(&table(SMALL), &options("NotAModel", "target")).unwrap_err();
    match &err {
        PredictorError::UnsupportedModel { name, available } => {
            assert_eq!(name, "NotAModel");
            assert_eq!(available.len(), 15);
        }
        other => panic!("unexpected error {other}"),
    }
    let message = err.to_string();
    for name in model_names() {
        assert!(message.contains(name), "{name} missing from '{message}'");
    }
}

#[test]
fn test_missing_label_lists_columns() {
    init_logger();
    let err = train_model(&table(SMALL), &options("LogisticRegression", "missing_col")).unwrap_err();
    match err {
        PredictorError::ColumnNotFound { column, available } => {
            assert_eq!(column, "missing_col");
            assert_eq!(available, vec!["a", "b", "target"]);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_numeric_regression_includes_plot() {
    init_logger();
    let csv = "x,noise,y\n1,0.3,2.1\n2,0.1,3.9\n3,0.4,6.2\n4,0.2,8.1\n5,0.5,9.8\n6,0.1,12.2\n7,0.3,13.9\n8,0.2,16.1\n9,0.4,18.0\n10,0.1,20.1";
    let report = train_model(&table(csv), &options("LinearRegression", "y")).unwrap();
    assert!(report.contains("### Regression Metrics"));
    assert!(report.contains("### Plot"));
    assert!(report.contains("![Actual vs Predicted](data:image/png;base64,"));
    assert!(!report.contains("**Accuracy:**"));
}

#[test]
fn test_categorical_target_never_plots() {
    init_logger();
    let csv = "height,colour,kind\n1.0,red,small\n1.2,red,small\n0.9,blue,small\n5.0,blue,large\n5.3,red,large\n4.8,blue,large\n1.1,red,small\n5.1,blue,large\n0.8,blue,small\n5.4,red,large";
    let report = train_model(&table(csv), &options("DecisionTreeClassifier", "kind")).unwrap();
    assert!(report.contains("### Classification Report"));
    assert!(!report.contains("### Plot"));
}

#[test]
fn test_split_and_metrics_are_reproducible() {
    init_logger();
    let t = table(&generate_sample_csv(60, 3));
    let (matrix, target) = encode(&t, "target").unwrap();
    let spec = resolve("RandomForestClassifier").unwrap();

    let first = split_and_fit(&matrix, &target, spec, 0.2, 42).unwrap();
    let second = split_and_fit(&matrix, &target, spec, 0.2, 42).unwrap();
    assert_eq!(first.split, second.split);
    assert_eq!(first.y_pred, second.y_pred);

    let a = evaluate(spec.family, &first.y_test, &first.y_pred, &target).unwrap();
    let b = evaluate(spec.family, &second.y_test, &second.y_pred, &target).unwrap();
    assert_eq!(a, b);

    let opts = TrainOptions::default().with_label("target");
    assert_eq!(train_model(&t, &opts).unwrap(), train_model(&t, &opts).unwrap());
}

#[test]
fn test_binary_and_multiclass_blocks() {
    init_logger();
    let binary = train_model(
        &table(&generate_sample_csv(40, 1)),
        &options("GaussianNB", "target"),
    )
    .unwrap();
    assert!(binary.contains("- **Binary Precision:**"));
    assert!(binary.contains("- **Weighted Precision:**"));
    assert!(binary.contains("- **Macro Precision:**"));

    let multiclass = train_model(
        &table(&generate_sample_csv(40, 1)),
        &options("KNeighborsClassifier", "education"),
    )
    .unwrap();
    assert!(!multiclass.contains("Binary"));
    assert!(multiclass.contains("- **Weighted Precision:**"));
    assert!(multiclass.contains("- **Macro Precision:**"));
}

#[test]
fn test_every_catalogue_model_runs_on_sample_data() {
    init_logger();
    let t = table(&generate_sample_csv(50, 9));
    for name in model_names() {
        let spec = resolve(name).unwrap();
        let label = match spec.family {
            rusty_predictor::models::Family::Classification => "target",
            rusty_predictor::models::Family::Regression => "salary",
        };
        let report = train_model(&t, &options(name, label))
            .unwrap_or_else(|e| panic!("{name} failed: {e}"));
        assert!(report.starts_with(&format!("**Model:** {name}\n")));
    }
}

#[test]
fn test_free_text_is_returned_unchanged() {
    init_logger();
    let text = "Quarterly notes\nNothing tabular here at all";
    assert_eq!(
        run_content(text, &TrainOptions::default()).unwrap(),
        PipelineOutcome::Text(text.to_string())
    );
}

#[test]
fn test_load_and_train_through_graph_resolver() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/train.csv"), generate_sample_csv(30, 5)).unwrap();

    let resolver = GraphResolver::from_json(
        r#"{"nodes": [
            {"name": "training", "type": "file", "importPath": {"module": "data/train.csv"}},
            {"name": "dashboard", "type": "chart"}
        ]}"#,
    )
    .unwrap();
    let opts = options("Ridge", "salary");

    let outcome = load_and_train(&resolver, "training", dir.path(), &opts)
        .unwrap()
        .expect("file source should load");
    assert!(outcome.report().unwrap().contains("**Target Column:** salary"));

    assert!(load_and_train(&resolver, "dashboard", dir.path(), &opts)
        .unwrap()
        .is_none());
    assert!(load_and_train(&resolver, "unknown", dir.path(), &opts)
        .unwrap()
        .is_none());
}
