use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::error::{PredictorError, Result};

// ---------------------------------------------------------------------------
// RawContent – the untyped payload handed over by the upstream system
// ---------------------------------------------------------------------------

/// Where a piece of raw content came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Inline,
    File(PathBuf),
}

/// Immutable text payload plus its provenance.
#[derive(Debug, Clone)]
pub struct RawContent {
    text: String,
    provenance: Provenance,
}

impl RawContent {
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provenance: Provenance::Inline,
        }
    }

    /// Read a UTF-8 file into memory.
    pub fn from_file(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)?;
        Ok(Self {
            text,
            provenance: Provenance::File(path),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn is_file(&self) -> bool {
        matches!(self.provenance, Provenance::File(_))
    }
}

// ---------------------------------------------------------------------------
// Column – one named, explicitly typed column
// ---------------------------------------------------------------------------

/// Type tag assigned to every column at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Column values, tagged with their type. Also used for target vectors.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == ColumnKind::Numeric
    }

    /// Numeric view of the values, if the column is numeric.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Categorical(_) => None,
        }
    }

    /// The value at `row` as a class label.
    pub fn label_at(&self, row: usize) -> Label {
        match self {
            ColumnData::Numeric(v) => Label::Number(v[row]),
            ColumnData::Categorical(v) => Label::Text(v[row].clone()),
        }
    }

    /// Every value as a class label, in row order.
    pub fn labels(&self) -> Vec<Label> {
        (0..self.len()).map(|row| self.label_at(row)).collect()
    }

    /// Keep only the given rows, in the given order.
    pub fn select(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&r| v[r].clone()).collect())
            }
        }
    }
}

/// A single named column of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }
}

// ---------------------------------------------------------------------------
// Table – ordered, typed columns of equal length
// ---------------------------------------------------------------------------

/// Parsed tabular data.
///
/// Invariants: every column has the same row count and column names are
/// unique. Both are checked by [`Table::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);

        let mut seen = HashSet::new();
        for col in &columns {
            if col.data.len() != n_rows {
                return Err(PredictorError::insufficient(format!(
                    "column '{}' has {} rows but '{}' has {n_rows}",
                    col.name,
                    col.data.len(),
                    columns[0].name,
                )));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(PredictorError::insufficient(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }

        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Replace the column names positionally, keeping data and types.
    pub fn with_column_names(&self, names: &[String]) -> Result<Table> {
        if names.len() != self.columns.len() {
            return Err(PredictorError::ColumnCountMismatch {
                expected: self.columns.len(),
                found: names.len(),
            });
        }
        let columns = self
            .columns
            .iter()
            .zip(names)
            .map(|(col, name)| Column {
                name: name.clone(),
                data: col.data.clone(),
            })
            .collect();
        Table::new(columns)
    }
}

// ---------------------------------------------------------------------------
// Label – a class label drawn from a numeric or categorical target
// ---------------------------------------------------------------------------

/// A class label. Numeric labels sort numerically, text labels lexically.
#[derive(Debug, Clone)]
pub enum Label {
    Number(f64),
    Text(String),
}

// -- Manual Eq/Ord so labels can live in BTreeSet / be sorted --

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Label::Number(a), Label::Number(b)) => a.total_cmp(b),
            (Label::Text(a), Label::Text(b)) => a.cmp(b),
            (Label::Number(_), Label::Text(_)) => Ordering::Less,
            (Label::Text(_), Label::Number(_)) => Ordering::Greater,
        }
    }
}

impl std::hash::Hash for Label {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Label::Number(v) => v.to_bits().hash(state),
            Label::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Number(v) => write!(f, "{}", format_number(*v)),
            Label::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Integral values print without a fractional part (`1` rather than `1.0`).
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rejects_ragged_columns() {
        let err = Table::new(vec![
            Column::numeric("a", vec![1.0, 2.0]),
            Column::numeric("b", vec![1.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, PredictorError::InsufficientData(_)));
    }

    #[test]
    fn table_rejects_duplicate_names() {
        let err = Table::new(vec![
            Column::numeric("a", vec![1.0]),
            Column::numeric("a", vec![2.0]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rename_requires_matching_width() {
        let table = Table::new(vec![Column::numeric("a", vec![1.0])]).unwrap();
        let err = table
            .with_column_names(&["x".to_string(), "y".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            PredictorError::ColumnCountMismatch { expected: 1, found: 2 }
        ));
        let renamed = table.with_column_names(&["x".to_string()]).unwrap();
        assert_eq!(renamed.column_names(), vec!["x"]);
    }

    #[test]
    fn labels_sort_numerically_and_print_integrally() {
        let mut labels = vec![Label::Number(10.0), Label::Number(2.0), Label::Number(-1.5)];
        labels.sort();
        let shown: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        assert_eq!(shown, vec!["-1.5", "2", "10"]);
    }

    #[test]
    fn raw_content_remembers_where_it_came_from() {
        let inline = RawContent::inline("a,b\n1,2");
        assert_eq!(inline.provenance(), &Provenance::Inline);
        assert!(!inline.is_file());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "a,b\n1,2").unwrap();
        let loaded = RawContent::from_file(&path).unwrap();
        assert_eq!(loaded.provenance(), &Provenance::File(path));
        assert_eq!(loaded.text(), inline.text());
    }
}
