// CSV loading: raw bytes -> typed Table

use crate::data::{Column, ColumnKind, Table, Value};
use crate::error::LoadError;
use std::collections::HashSet;

/// Cell contents treated as missing, in addition to the empty string
const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#NA", "#N/A N/A", "1.#IND", "-1.#IND", "1.#QNAN", "-1.#QNAN",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse comma-separated UTF-8 bytes with a header row into a Table.
///
/// Rows shorter than the header are padded with missing cells; longer rows
/// are rejected. Column types are inferred once here and never revisited.
pub fn read_table(bytes: &[u8]) -> Result<Table, LoadError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let raw_headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if raw_headers.is_empty() || (raw_headers.len() == 1 && raw_headers[0].trim().is_empty()) {
        return Err(LoadError::Empty);
    }
    let headers = dedupe_headers(&raw_headers);
    let n_cols = headers.len();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); n_cols];
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() > n_cols {
            return Err(LoadError::Ragged {
                line,
                expected: n_cols,
                found: record.len(),
            });
        }
        if record.len() < n_cols {
            log::warn!(
                "line {}: {} of {} fields present, padding with missing values",
                line,
                record.len(),
                n_cols
            );
        }

        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(record.get(col_idx).and_then(classify_missing));
        }
    }

    let columns: Vec<Column> = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| build_column(name, raw))
        .collect();

    let table = Table::new(columns);
    log::debug!(
        "loaded table with {} rows and {} columns",
        table.n_rows(),
        table.n_cols()
    );
    Ok(table)
}

/// Returns None for missing cells, the raw cell otherwise
fn classify_missing(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Blank names become `Unnamed: <i>`, repeats get `.1`, `.2`, ... suffixes
fn dedupe_headers(raw: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (i, name) in raw.iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name.clone()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// Integer columns with a missing cell are widened to float, since an
/// integer column has no way to hold the gap.
fn infer_kind(raw: &[Option<String>]) -> ColumnKind {
    let present: Vec<&str> = raw.iter().flatten().map(|s| s.trim()).collect();

    if present.is_empty() {
        return ColumnKind::Float;
    }
    if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        if present.len() < raw.len() {
            ColumnKind::Float
        } else {
            ColumnKind::Integer
        }
    } else if present.iter().all(|s| s.parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else if present.iter().all(|s| parse_bool(s).is_some()) {
        ColumnKind::Boolean
    } else {
        ColumnKind::Text
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn build_column(name: String, raw: Vec<Option<String>>) -> Column {
    let kind = infer_kind(&raw);

    // Parsing cannot fail below: infer_kind already checked every present cell
    let values = raw
        .into_iter()
        .map(|cell| match cell {
            None => Value::Missing,
            Some(s) => {
                let t = s.trim();
                match kind {
                    ColumnKind::Integer => t.parse().map(Value::Int).unwrap_or(Value::Missing),
                    ColumnKind::Float => t.parse().map(Value::Float).unwrap_or(Value::Missing),
                    ColumnKind::Boolean => parse_bool(t).map(Value::Bool).unwrap_or(Value::Missing),
                    ColumnKind::Text => Value::Text(s),
                }
            }
        })
        .collect();

    Column::new(name, kind, values)
}
