use super::evaluation::{EvaluationResult, Scores};

// ---------------------------------------------------------------------------
// Markdown report
// ---------------------------------------------------------------------------

fn push_scores(lines: &mut Vec<String>, prefix: &str, s: &Scores) {
    lines.push(format!("- **{prefix} Precision:** {:.4}", s.precision));
    lines.push(format!("- **{prefix} Recall:** {:.4}", s.recall));
    lines.push(format!("- **{prefix} F1-Score:** {:.4}", s.f1));
}

/// Render one evaluation as Markdown.
///
/// Section order is fixed (header, scores, per-class, confusion matrix,
/// classification report, plot) and a section without data is left out
/// entirely. The output depends only on the arguments.
pub fn render(
    model_name: &str,
    label_column: &str,
    split_sizes: (usize, usize),
    result: &EvaluationResult,
) -> String {
    let (n_train, n_test) = split_sizes;
    let mut lines = vec![
        format!("**Model:** {model_name}"),
        format!("**Target Column:** {label_column}"),
        format!("**Training Samples:** {n_train}"),
        format!("**Test Samples:** {n_test}"),
    ];
    if let Some(accuracy) = result.accuracy() {
        lines.push(format!("**Accuracy:** {accuracy:.4}"));
    }

    if let Some(c) = &result.classification {
        lines.push("\n### Precision, Recall, F1-Score".into());
        if let Some(binary) = &c.binary {
            push_scores(&mut lines, "Binary", &binary.scores);
        }
        push_scores(&mut lines, "Weighted", &c.weighted);
        push_scores(&mut lines, "Macro", &c.macro_avg);

        if !c.per_class.is_empty() {
            lines.push("\n### Per-Class Metrics".into());
            for class in &c.per_class {
                lines.push(format!("**Class {}:**", class.label));
                lines.push(format!("  - Precision: {:.4}", class.scores.precision));
                lines.push(format!("  - Recall: {:.4}", class.scores.recall));
                lines.push(format!("  - F1-Score: {:.4}", class.scores.f1));
            }

            lines.push("\n### Confusion Matrix".into());
            lines.push(format!("\n```\n{}\n```", c.confusion));
        }

        if !c.report.is_empty() {
            lines.push("\n### Classification Report".into());
            lines.push(format!("\n```\n{}\n```", c.report));
        }
    }

    if let Some(r) = &result.regression {
        lines.push("\n### Regression Metrics".into());
        lines.push(format!("- **MAE:** {:.4}", r.mae));
        lines.push(format!("- **MSE:** {:.4}", r.mse));
        lines.push(format!("- **RMSE:** {:.4}", r.rmse));
        lines.push(format!("- **R²:** {:.4}", r.r2));
    }

    if let Some(uri) = &result.plot {
        lines.push("\n### Plot".into());
        lines.push(format!("![Actual vs Predicted]({uri})"));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnData;
    use crate::models::Family;
    use crate::predictor::evaluation::evaluate;

    fn classification(full: &[&str], test: &[&str], pred: &[&str]) -> EvaluationResult {
        let col = |v: &[&str]| ColumnData::Categorical(v.iter().map(|s| s.to_string()).collect());
        evaluate(Family::Classification, &col(test), &col(pred), &col(full)).unwrap()
    }

    #[test]
    fn sections_appear_in_order() {
        let result = classification(&["a", "b"], &["a", "b"], &["a", "a"]);
        let text = render("SVC", "label", (8, 2), &result);
        let order = [
            "**Model:** SVC",
            "**Target Column:** label",
            "**Training Samples:** 8",
            "**Test Samples:** 2",
            "**Accuracy:** 0.5000",
            "### Precision, Recall, F1-Score",
            "- **Binary Precision:**",
            "- **Weighted Precision:**",
            "- **Macro Precision:**",
            "### Per-Class Metrics",
            "**Class a:**",
            "**Class b:**",
            "### Confusion Matrix",
            "### Classification Report",
        ];
        let mut from = 0;
        for needle in order {
            let at = text[from..]
                .find(needle)
                .unwrap_or_else(|| panic!("'{needle}' missing or out of order"));
            from += at + needle.len();
        }
        assert!(!text.contains("### Plot"));
        assert!(!text.contains("### Regression Metrics"));
    }

    #[test]
    fn multiclass_omits_binary_lines() {
        let result = classification(&["a", "b", "c"], &["a", "b", "c"], &["a", "b", "c"]);
        let text = render("GaussianNB", "y", (6, 3), &result);
        assert!(!text.contains("Binary"));
        assert!(text.contains("```\n[[1 0 0]\n [0 1 0]\n [0 0 1]]\n```"));
    }

    #[test]
    fn regression_report_has_metrics_and_plot() {
        let actual = ColumnData::Numeric(vec![1.0, 2.0, 3.0]);
        let pred = ColumnData::Numeric(vec![1.5, 2.0, 2.5]);
        let result = evaluate(Family::Regression, &actual, &pred, &actual).unwrap();
        let text = render("Ridge", "price", (12, 3), &result);
        assert!(!text.contains("**Accuracy:**"));
        assert!(text.contains("### Regression Metrics"));
        assert!(text.contains("![Actual vs Predicted](data:image/png;base64,"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let result = classification(&["x", "y"], &["x", "y"], &["y", "y"]);
        assert_eq!(
            render("M", "t", (1, 2), &result),
            render("M", "t", (1, 2), &result)
        );
    }
}
