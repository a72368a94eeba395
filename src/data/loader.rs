use log::debug;
use serde::Serialize;

use super::model::{Column, RawContent, Table};
use crate::error::PredictorError;

/// Delimiters recognised when sniffing raw content, in tie-break order.
pub const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Number of leading lines inspected for a delimiter.
const SNIFF_LINES: usize = 5;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Outcome of inspecting raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedContent {
    /// Delimited data, parsed into typed columns.
    Tabular(Table),
    /// Free text; carries the original string.
    Text(String),
    /// Looked delimited but did not parse; carries the original string.
    Malformed(String),
}

impl ClassifiedContent {
    /// Short tag used in logs and data descriptions.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedContent::Tabular(_) => "tabular",
            ClassifiedContent::Text(_) => "text",
            ClassifiedContent::Malformed(_) => "malformed",
        }
    }
}

/// Decide whether `content` is a delimited table, free text, or malformed.
///
/// * fewer than two lines → text, whatever delimiters it contains
/// * no delimiter in the first five lines → text
/// * delimiters present but no data rows or a structural parse error → malformed
pub fn classify(content: &str) -> ClassifiedContent {
    let trimmed = content.trim();
    let lines: Vec<&str> = trimmed.lines().collect();

    if lines.len() < 2 {
        debug!("classified single-line content as text");
        return ClassifiedContent::Text(content.to_string());
    }

    let has_delimiter = lines
        .iter()
        .take(SNIFF_LINES)
        .any(|line| line.contains(DELIMITERS));
    if !has_delimiter {
        debug!("no delimiter in the first {SNIFF_LINES} lines, classified as text");
        return ClassifiedContent::Text(content.to_string());
    }

    match parse_table(trimmed) {
        Ok(table) => {
            debug!(
                "classified content as tabular: {} rows x {} columns",
                table.n_rows(),
                table.n_cols()
            );
            ClassifiedContent::Tabular(table)
        }
        Err(failure) => {
            debug!("delimited content failed to parse: {failure}");
            ClassifiedContent::Malformed(content.to_string())
        }
    }
}

/// Classify a [`RawContent`] payload regardless of where it came from.
pub fn classify_raw(raw: &RawContent) -> ClassifiedContent {
    debug!("classifying content from {:?}", raw.provenance());
    classify(raw.text())
}

// ---------------------------------------------------------------------------
// Delimited parsing
// ---------------------------------------------------------------------------

/// Why delimited content could not become a [`Table`]. Never leaves this crate:
/// the classifier turns it into [`ClassifiedContent::Malformed`].
#[derive(Debug, thiserror::Error)]
pub(crate) enum ParseFailure {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("header row only, no data rows")]
    NoRows,
    #[error("row {row} has {found} fields but the header has {expected}")]
    TooManyFields {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error(transparent)]
    Table(#[from] PredictorError),
}

/// Pick the delimiter occurring most often in the header line.
pub fn sniff_delimiter(header: &str) -> char {
    let mut best = DELIMITERS[0];
    let mut best_count = 0;
    for delim in DELIMITERS {
        let count = header.matches(delim).count();
        if count > best_count {
            best = delim;
            best_count = count;
        }
    }
    best
}

pub(crate) fn parse_table(text: &str) -> Result<Table, ParseFailure> {
    let header_line = text.lines().next().unwrap_or("");
    let delimiter = sniff_delimiter(header_line);
    debug!("parsing delimited content with {delimiter:?}");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = unique_headers(reader.headers()?.iter());

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(ParseFailure::TooManyFields {
                row: row + 1,
                found: record.len(),
                expected: headers.len(),
            });
        }
        // short rows are padded with empty cells
        for (col, column) in cells.iter_mut().enumerate() {
            column.push(record.get(col).unwrap_or("").to_string());
        }
    }

    if cells.first().map_or(true, |c| c.is_empty()) {
        return Err(ParseFailure::NoRows);
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| infer_column(name, values))
        .collect();

    Ok(Table::new(columns)?)
}

/// Fill in empty header names and de-duplicate repeated ones.
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (i, name) in raw.enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {i}")
        } else {
            name.to_string()
        };
        let mut candidate = base.clone();
        let mut suffix = 1;
        while out.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        out.push(candidate);
    }
    out
}

/// A column is numeric when every non-empty cell parses as a float and at
/// least one cell is non-empty. Empty numeric cells become NaN.
fn infer_column(name: String, values: Vec<String>) -> Column {
    let any_present = values.iter().any(|v| !v.is_empty());
    let all_numeric = values
        .iter()
        .all(|v| v.is_empty() || v.parse::<f64>().is_ok());

    if any_present && all_numeric {
        let parsed = values
            .iter()
            .map(|v| v.parse::<f64>().unwrap_or(f64::NAN))
            .collect();
        Column::numeric(name, parsed)
    } else {
        Column::categorical(name, values)
    }
}

// ---------------------------------------------------------------------------
// Data description
// ---------------------------------------------------------------------------

/// Name and inferred type of one column.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: String,
}

/// Summary of a raw payload, suitable for handing back upstream as JSON.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataInfo {
    Csv {
        rows: usize,
        columns: usize,
        column_types: Vec<ColumnInfo>,
        source: String,
    },
    Text {
        length: usize,
        first_line: String,
        source: String,
    },
}

/// Describe a payload: shape and column types for tables, length and first
/// line for anything else.
pub fn describe(raw: &RawContent) -> DataInfo {
    let source = if raw.is_file() { "file" } else { "text" }.to_string();
    match classify_raw(raw) {
        ClassifiedContent::Tabular(table) => DataInfo::Csv {
            rows: table.n_rows(),
            columns: table.n_cols(),
            column_types: table
                .columns()
                .iter()
                .map(|c| ColumnInfo {
                    name: c.name.clone(),
                    kind: c.kind().to_string(),
                })
                .collect(),
            source,
        },
        ClassifiedContent::Text(text) | ClassifiedContent::Malformed(text) => DataInfo::Text {
            length: text.chars().count(),
            first_line: text.lines().next().unwrap_or("").to_string(),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{ColumnData, ColumnKind};

    #[test]
    fn single_line_is_text_even_with_delimiters() {
        for input in ["a,b,c", "x;y", "1|2|3", "a\tb"] {
            assert_eq!(classify(input), ClassifiedContent::Text(input.to_string()));
        }
    }

    #[test]
    fn prose_is_text() {
        let input = "The quick brown fox\njumps over the lazy dog\nand keeps running";
        assert_eq!(classify(input).kind(), "text");
    }

    #[test]
    fn delimited_content_is_tabular() {
        for input in [
            "a,b\n1,2\n3,4",
            "a;b\n1;2\n3;4",
            "a\tb\n1\t2",
            "a|b|c\n1|2|x",
        ] {
            let classified = classify(input);
            assert_eq!(classified.kind(), "tabular", "input: {input:?}");
        }
    }

    #[test]
    fn short_rows_are_padded_with_missing_values() {
        let table = match classify("a,b,c\n1,2\n3,4,5") {
            ClassifiedContent::Tabular(t) => t,
            other => panic!("expected table, got {other:?}"),
        };
        assert_eq!(table.n_rows(), 2);
        match &table.column("c").unwrap().data {
            ColumnData::Numeric(v) => {
                assert!(v[0].is_nan());
                assert_eq!(v[1], 5.0);
            }
            other => panic!("expected numeric column, got {other:?}"),
        }
    }

    #[test]
    fn long_rows_are_malformed() {
        let ragged = "a,b\n1,2\n3,4,5";
        assert_eq!(
            classify(ragged),
            ClassifiedContent::Malformed(ragged.to_string())
        );
    }

    #[test]
    fn header_without_rows_is_malformed() {
        // the quoted header spans both lines, leaving no data rows
        let input = "a,\"b\nc\"";
        assert_eq!(classify(input).kind(), "malformed");
    }

    #[test]
    fn column_types_are_inferred() {
        let table = match classify("age,city,score\n31,Oslo,1.5\n40,Rome,\n22,Oslo,3") {
            ClassifiedContent::Tabular(t) => t,
            other => panic!("expected table, got {other:?}"),
        };
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column("age").unwrap().kind(), ColumnKind::Numeric);
        assert_eq!(table.column("city").unwrap().kind(), ColumnKind::Categorical);
        let score = table.column("score").unwrap();
        match &score.data {
            ColumnData::Numeric(v) => {
                assert_eq!(v[0], 1.5);
                assert!(v[1].is_nan());
            }
            other => panic!("expected numeric, got {other:?}"),
        }
    }

    #[test]
    fn semicolon_wins_when_it_dominates_the_header() {
        assert_eq!(sniff_delimiter("a;b;c,d"), ';');
        assert_eq!(sniff_delimiter("a,b;c"), ',');
        assert_eq!(sniff_delimiter("plain"), ',');
    }

    #[test]
    fn duplicate_and_blank_headers_are_made_unique() {
        let table = match classify("a,a,\n1,2,3\n4,5,6") {
            ClassifiedContent::Tabular(t) => t,
            other => panic!("expected table, got {other:?}"),
        };
        assert_eq!(table.column_names(), vec!["a", "a.1", "Unnamed: 2"]);
    }

    #[test]
    fn describe_reports_shape_and_types() {
        let info = describe(&RawContent::inline("x,label\n1,yes\n2,no"));
        match info {
            DataInfo::Csv {
                rows,
                columns,
                column_types,
                source,
            } => {
                assert_eq!((rows, columns), (2, 2));
                assert_eq!(column_types[0].kind, "numeric");
                assert_eq!(column_types[1].kind, "categorical");
                assert_eq!(source, "text");
            }
            other => panic!("expected csv info, got {other:?}"),
        }

        let text = describe(&RawContent::inline("hello world\nsecond line"));
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["first_line"], "hello world");
    }
}
