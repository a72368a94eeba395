use std::collections::BTreeSet;
use std::fmt;

use log::{debug, warn};

use super::plot;
use crate::data::model::{ColumnData, Label};
use crate::error::{PredictorError, Result};
use crate::models::Family;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Precision, recall and F1 for one averaging scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Scores for the designated positive class of a two-class target.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryScores {
    pub positive: Label,
    pub scores: Scores,
}

/// Per-class scores plus the class's support in the test partition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    pub label: Label,
    pub scores: Scores,
    pub support: usize,
}

/// Counts indexed `[actual][predicted]` over `labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    pub labels: Vec<Label>,
    pub counts: Vec<Vec<usize>>,
}

/// Metrics for a classification run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    /// Present only when the full target has exactly two classes.
    pub binary: Option<BinaryScores>,
    pub weighted: Scores,
    pub macro_avg: Scores,
    pub per_class: Vec<ClassScores>,
    pub confusion: ConfusionMatrix,
    pub report: String,
}

/// Error metrics for a regression run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Everything the report formatter consumes. Built once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub family: Family,
    pub classification: Option<ClassificationMetrics>,
    pub regression: Option<RegressionMetrics>,
    /// `data:image/png;base64,...` when the target is numeric and the plot
    /// rendered.
    pub plot: Option<String>,
}

impl EvaluationResult {
    pub fn accuracy(&self) -> Option<f64> {
        self.classification.as_ref().map(|c| c.accuracy)
    }
}

// ---------------------------------------------------------------------------
// evaluate
// ---------------------------------------------------------------------------

/// Score `y_pred` against `y_test`. `y_full` is the whole target column: it
/// decides binary vs. multiclass and the span of the plot's identity line.
pub fn evaluate(
    family: Family,
    y_test: &ColumnData,
    y_pred: &ColumnData,
    y_full: &ColumnData,
) -> Result<EvaluationResult> {
    if y_test.len() != y_pred.len() || y_test.is_empty() {
        return Err(PredictorError::insufficient(format!(
            "cannot score {} predictions against {} test values",
            y_pred.len(),
            y_test.len()
        )));
    }
    debug!("Evaluating {family} predictions on {} rows", y_test.len());

    let (classification, regression) = match family {
        Family::Classification => (Some(classification_metrics(y_test, y_pred, y_full)), None),
        Family::Regression => (None, Some(regression_metrics(y_test, y_pred)?)),
    };

    let plot = match (y_full, y_test, y_pred) {
        (ColumnData::Numeric(full), ColumnData::Numeric(actual), ColumnData::Numeric(pred)) => {
            match plot::actual_vs_predicted(actual, pred, full) {
                Ok(uri) => Some(uri),
                Err(e) => {
                    warn!("Omitting plot: {e}");
                    None
                }
            }
        }
        _ => None,
    };

    Ok(EvaluationResult {
        family,
        classification,
        regression,
        plot,
    })
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn scores_for(label: &Label, actual: &[Label], predicted: &[Label]) -> (Scores, usize) {
    let mut tp = 0;
    let mut predicted_pos = 0;
    let mut support = 0;
    for (a, p) in actual.iter().zip(predicted) {
        if p == label {
            predicted_pos += 1;
            if a == label {
                tp += 1;
            }
        }
        if a == label {
            support += 1;
        }
    }
    let precision = ratio(tp, predicted_pos);
    let recall = ratio(tp, support);
    let scores = Scores {
        precision,
        recall,
        f1: f1(precision, recall),
    };
    (scores, support)
}

fn classification_metrics(
    y_test: &ColumnData,
    y_pred: &ColumnData,
    y_full: &ColumnData,
) -> ClassificationMetrics {
    let actual = y_test.labels();
    let predicted = y_pred.labels();
    let n = actual.len();

    let labels: Vec<Label> = actual
        .iter()
        .chain(&predicted)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let correct = actual.iter().zip(&predicted).filter(|(a, p)| a == p).count();
    let accuracy = ratio(correct, n);

    let per_class: Vec<ClassScores> = labels
        .iter()
        .map(|label| {
            let (scores, support) = scores_for(label, &actual, &predicted);
            ClassScores {
                label: label.clone(),
                scores,
                support,
            }
        })
        .collect();

    let k = per_class.len().max(1) as f64;
    let macro_avg = Scores {
        precision: per_class.iter().map(|c| c.scores.precision).sum::<f64>() / k,
        recall: per_class.iter().map(|c| c.scores.recall).sum::<f64>() / k,
        f1: per_class.iter().map(|c| c.scores.f1).sum::<f64>() / k,
    };
    let weight = |f: fn(&Scores) -> f64| {
        per_class
            .iter()
            .map(|c| f(&c.scores) * c.support as f64)
            .sum::<f64>()
            / n.max(1) as f64
    };
    let weighted = Scores {
        precision: weight(|s: &Scores| s.precision),
        recall: weight(|s: &Scores| s.recall),
        f1: weight(|s: &Scores| s.f1),
    };

    let full_classes: BTreeSet<Label> = y_full.labels().into_iter().collect();
    let binary = if full_classes.len() == 2 {
        full_classes.into_iter().next_back().map(|positive| {
            let (scores, _) = scores_for(&positive, &actual, &predicted);
            BinaryScores { positive, scores }
        })
    } else {
        None
    };

    let confusion = ConfusionMatrix::new(&labels, &actual, &predicted);
    let report = classification_report(&per_class, accuracy, &macro_avg, &weighted, n);

    ClassificationMetrics {
        accuracy,
        binary,
        weighted,
        macro_avg,
        per_class,
        confusion,
        report,
    }
}

impl ConfusionMatrix {
    fn new(labels: &[Label], actual: &[Label], predicted: &[Label]) -> Self {
        let mut counts = vec![vec![0; labels.len()]; labels.len()];
        for (a, p) in actual.iter().zip(predicted) {
            if let (Ok(i), Ok(j)) = (labels.binary_search(a), labels.binary_search(p)) {
                counts[i][j] += 1;
            }
        }
        Self {
            labels: labels.to_vec(),
            counts,
        }
    }
}

/// Fixed-width nested-bracket layout, e.g. `[[2 0]\n [1 3]]`.
impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);

        write!(f, "[")?;
        for (i, row) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, "\n ")?;
            }
            let cells: Vec<String> = row.iter().map(|c| format!("{c:>width$}")).collect();
            write!(f, "[{}]", cells.join(" "))?;
        }
        write!(f, "]")
    }
}

/// Per-class table with accuracy, macro and weighted rows, two decimals.
fn classification_report(
    per_class: &[ClassScores],
    accuracy: f64,
    macro_avg: &Scores,
    weighted: &Scores,
    total: usize,
) -> String {
    let names: Vec<String> = per_class.iter().map(|c| c.label.to_string()).collect();
    let width = names
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .max("weighted avg".len());

    let row = |name: &str, s: &Scores, support: usize| {
        format!(
            "{name:>width$}  {:>9.2} {:>9.2} {:>9.2} {support:>9}\n",
            s.precision, s.recall, s.f1
        )
    };

    let mut out = format!(
        "{:>width$}  {:>9} {:>9} {:>9} {:>9}\n\n",
        "", "precision", "recall", "f1-score", "support"
    );
    for (name, class) in names.iter().zip(per_class) {
        out.push_str(&row(name, &class.scores, class.support));
    }
    out.push('\n');
    out.push_str(&format!(
        "{:>width$}  {:>9} {:>9} {accuracy:>9.2} {total:>9}\n",
        "accuracy", "", ""
    ));
    out.push_str(&row("macro avg", macro_avg, total));
    out.push_str(&row("weighted avg", weighted, total));
    out
}

// ---------------------------------------------------------------------------
// Regression
// ---------------------------------------------------------------------------

fn regression_metrics(y_test: &ColumnData, y_pred: &ColumnData) -> Result<RegressionMetrics> {
    let (actual, pred) = match (y_test.as_numeric(), y_pred.as_numeric()) {
        (Some(a), Some(p)) => (a, p),
        _ => {
            return Err(PredictorError::estimator(
                "regression metrics need numeric targets and predictions",
            ))
        }
    };

    let n = actual.len() as f64;
    let mae = actual.iter().zip(pred).map(|(a, p)| (a - p).abs()).sum::<f64>() / n;
    let ss_res: f64 = actual.iter().zip(pred).map(|(a, p)| (a - p).powi(2)).sum();
    let mse = ss_res / n;
    let mean = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Ok(RegressionMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        r2,
    })
}
