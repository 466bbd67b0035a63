use crate::data::Table;
use serde::Serialize;
use std::collections::BTreeMap;

/// Upper bound on the preview, whatever the caller asks for
pub const MAX_PREVIEW_ROWS: usize = 10;

pub type PreviewRow = serde_json::Map<String, serde_json::Value>;

/// Result of the upload operation
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    #[serde(rename = "info")]
    pub schema_text: String,
    #[serde(rename = "head")]
    pub preview_rows: Vec<PreviewRow>,
    #[serde(rename = "columns")]
    pub column_names: Vec<String>,
}

/// Summarize a table: rows with any missing cell are dropped first, then the
/// schema description and the first `preview_rows` rows are taken from what
/// is left.
pub fn build_summary(table: &Table, preview_rows: usize) -> Summary {
    let cleaned = table.drop_missing();
    log::debug!(
        "summary: {} of {} rows kept after dropping missing values",
        cleaned.n_rows(),
        table.n_rows()
    );

    Summary {
        schema_text: describe_schema(&cleaned),
        preview_rows: preview(&cleaned, preview_rows),
        column_names: cleaned.column_names(),
    }
}

/// First `limit` rows as JSON objects keyed by column name
pub fn preview(table: &Table, limit: usize) -> Vec<PreviewRow> {
    (0..table.n_rows().min(limit))
        .map(|i| {
            table
                .row(i)
                .map(|(name, value)| (name.to_string(), value.to_json()))
                .collect()
        })
        .collect()
}

/// Per-column schema listing: position, name, non-null count and dtype.
pub fn describe_schema(table: &Table) -> String {
    let n_rows = table.n_rows();
    let mut lines = vec!["Table".to_string()];

    lines.push(match (table.index().first(), table.index().last()) {
        (Some(first), Some(last)) => format!("Index: {} entries, {} to {}", n_rows, first, last),
        _ => "Index: 0 entries".to_string(),
    });
    lines.push(format!("Data columns (total {} columns):", table.n_cols()));

    let name_width = table
        .columns()
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Column".len());

    lines.push(format!(
        " #   {:<name_width$}  Non-Null Count  Dtype",
        "Column",
        name_width = name_width
    ));
    lines.push(format!(
        "---  {:<name_width$}  --------------  -----",
        "------",
        name_width = name_width
    ));

    let mut tally: BTreeMap<&'static str, usize> = BTreeMap::new();
    for (i, column) in table.columns().iter().enumerate() {
        let non_null = format!("{} non-null", column.non_null_count());
        lines.push(format!(
            " {:<3} {:<name_width$}  {:<14}  {}",
            i,
            column.name,
            non_null,
            column.kind.dtype_name(),
            name_width = name_width
        ));
        *tally.entry(column.kind.dtype_name()).or_insert(0) += 1;
    }

    let dtypes: Vec<String> = tally
        .iter()
        .map(|(name, count)| format!("{}({})", name, count))
        .collect();
    lines.push(format!("dtypes: {}", dtypes.join(", ")));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::read_table;

    #[test]
    fn test_summary_drops_rows_with_missing_values() {
        let table = read_table(b"a,b\n1,2\n,4\n5,6\n").unwrap();
        let summary = build_summary(&table, 10);
        assert_eq!(summary.preview_rows.len(), 2);
        // A column that had a blank is typed float64, so 5 previews as 5.0
        assert_eq!(summary.preview_rows[1]["a"], serde_json::json!(5.0));
        assert!(summary.schema_text.contains("float64"));
        assert!(summary.schema_text.contains("Index: 2 entries, 0 to 2"));
        assert!(summary.schema_text.contains("2 non-null"));
    }

    #[test]
    fn test_summary_preview_limit() {
        let mut csv = String::from("n\n");
        for i in 0..25 {
            csv.push_str(&format!("{}\n", i));
        }
        let table = read_table(csv.as_bytes()).unwrap();
        let summary = build_summary(&table, 10);
        assert_eq!(summary.preview_rows.len(), 10);
        assert_eq!(summary.preview_rows[9]["n"], serde_json::json!(9));
    }

    #[test]
    fn test_schema_mentions_every_column() {
        let table = read_table(b"city,population,capital\nRome,2.8,true\n").unwrap();
        let text = describe_schema(&table);
        for name in ["city", "population", "capital"] {
            assert!(text.contains(name), "missing {} in:\n{}", name, text);
        }
        assert!(text.contains("dtypes: bool(1), float64(1), object(1)"));
    }

    #[test]
    fn test_preview_values_are_json_primitives() {
        let table = read_table(b"i,f,b,s\n1,0.5,true,x\n").unwrap();
        let rows = preview(&table, 10);
        for value in rows[0].values() {
            assert!(!value.is_array() && !value.is_object());
        }
        assert_eq!(rows[0]["f"], serde_json::json!(0.5));
        assert_eq!(rows[0]["b"], serde_json::json!(true));
    }

    #[test]
    fn test_preview_keeps_column_order() {
        let table = read_table(b"z,a,m\n1,2,3\n").unwrap();
        let rows = preview(&table, 10);
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_schema_layout() {
        let table = read_table(b"id,name\n1,x\n2,y\n").unwrap();
        let text = describe_schema(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Table");
        assert_eq!(lines[1], "Index: 2 entries, 0 to 1");
        assert_eq!(lines[2], "Data columns (total 2 columns):");
        assert_eq!(lines.last(), Some(&"dtypes: int64(1), object(1)"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_summary_serializes_with_wire_names() {
        let table = read_table(b"a\n1\n").unwrap();
        let json = serde_json::to_value(build_summary(&table, 10)).unwrap();
        assert!(json.get("info").is_some());
        assert!(json.get("head").is_some());
        assert_eq!(json["columns"], serde_json::json!(["a"]));
    }
}
