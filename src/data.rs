use std::fmt;

/// A single cell, typed by the column it lives in.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell. Booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(_) | Value::Missing => None,
        }
    }

    /// Convert to a plain JSON scalar. Non-finite floats become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Missing => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => {
                // Integral floats keep a trailing ".0" so they read as floats
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => write!(f, "NaN"),
        }
    }
}

/// Storage type of a column, decided once when the table is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        !matches!(self, ColumnKind::Text)
    }

    /// Name used in schema descriptions
    pub fn dtype_name(self) -> &'static str {
        match self {
            ColumnKind::Integer => "int64",
            ColumnKind::Float => "float64",
            ColumnKind::Boolean => "bool",
            ColumnKind::Text => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_missing()).count()
    }
}

/// In-memory table: named columns of equal length.
///
/// `index` holds the original row positions so that a cleaned table can
/// still report where its rows came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    index: Vec<usize>,
}

impl Table {
    /// Build a table from columns that already share a length and have
    /// unique names. The loader guarantees both.
    pub fn new(columns: Vec<Column>) -> Self {
        let n_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        debug_assert!(columns.iter().all(|c| c.values.len() == n_rows));
        Self {
            columns,
            index: (0..n_rows).collect(),
        }
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

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Original row positions of the rows still present
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn row(&self, i: usize) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(move |c| (c.name.as_str(), &c.values[i]))
    }

    /// Derive the cleaned table: every row holding any missing cell is removed.
    pub fn drop_missing(&self) -> Table {
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&i| self.columns.iter().all(|c| !c.values[i].is_missing()))
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                values: keep.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();

        Table {
            columns,
            index: keep.iter().map(|&i| self.index[i]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::new(
                "a",
                ColumnKind::Integer,
                vec![Value::Int(1), Value::Missing, Value::Int(5)],
            ),
            Column::new(
                "b",
                ColumnKind::Integer,
                vec![Value::Int(2), Value::Int(4), Value::Int(6)],
            ),
        ])
    }

    #[test]
    fn test_drop_missing_removes_whole_rows() {
        let cleaned = sample().drop_missing();
        assert_eq!(cleaned.n_rows(), 2);
        assert_eq!(cleaned.index(), &[0, 2]);
        assert_eq!(
            cleaned.column("b").unwrap().values,
            vec![Value::Int(2), Value::Int(6)]
        );
    }

    #[test]
    fn test_drop_missing_keeps_original_untouched() {
        let table = sample();
        let _ = table.drop_missing();
        assert_eq!(table.n_rows(), 3);
    }

    #[test]
    fn test_value_display_float() {
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Bool(true).to_string(), "True");
    }

    #[test]
    fn test_value_to_json_non_finite_is_null() {
        assert_eq!(Value::Float(f64::INFINITY).to_json(), serde_json::Value::Null);
        assert_eq!(Value::Missing.to_json(), serde_json::Value::Null);
        assert_eq!(Value::Int(7).to_json(), serde_json::json!(7));
    }

    #[test]
    fn test_bool_is_numeric() {
        assert!(ColumnKind::Boolean.is_numeric());
        assert!(!ColumnKind::Text.is_numeric());
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
    }
}
