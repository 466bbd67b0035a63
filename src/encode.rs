// Categorical encoding: distinct values -> dense integer codes

use crate::data::{Column, ColumnKind, Table, Value};
use crate::error::ValidationError;
use std::collections::HashMap;

/// Hashable identity of a non-missing cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueKey {
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(String),
}

impl ValueKey {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(ValueKey::Int(*i)),
            // -0.0 and 0.0 are the same category
            Value::Float(f) => Some(ValueKey::Float(if *f == 0.0 { 0 } else { f.to_bits() })),
            Value::Bool(b) => Some(ValueKey::Bool(*b)),
            Value::Text(s) => Some(ValueKey::Text(s.clone())),
            Value::Missing => None,
        }
    }
}

/// Codes per row plus the distinct values in code order
#[derive(Debug, Clone, PartialEq)]
pub struct Factorized {
    pub codes: Vec<Option<usize>>,
    pub uniques: Vec<Value>,
}

/// Assign codes in order of first appearance. Missing cells get no code.
pub fn factorize(values: &[Value]) -> Factorized {
    let mut lookup: HashMap<ValueKey, usize> = HashMap::new();
    let mut uniques = Vec::new();

    let codes = values
        .iter()
        .map(|value| {
            let key = ValueKey::of(value)?;
            let code = *lookup.entry(key).or_insert_with(|| {
                uniques.push(value.clone());
                uniques.len() - 1
            });
            Some(code)
        })
        .collect();

    Factorized { codes, uniques }
}

/// Select `columns` from the table and replace every text column with its
/// integer codes. Numeric columns are returned unchanged.
pub fn encode_categoricals(table: &Table, columns: &[&str]) -> Result<Table, ValidationError> {
    let mut encoded = Vec::with_capacity(columns.len());

    for &name in columns {
        let column = table
            .column(name)
            .ok_or_else(|| ValidationError::UnknownColumn(name.to_string()))?;

        if column.kind.is_numeric() {
            encoded.push(column.clone());
            continue;
        }

        let factorized = factorize(&column.values);
        log::debug!(
            "encoded column '{}' into {} codes",
            name,
            factorized.uniques.len()
        );
        let values = factorized
            .codes
            .into_iter()
            .map(|code| match code {
                Some(c) => Value::Int(c as i64),
                None => Value::Missing,
            })
            .collect();
        encoded.push(Column::new(name, ColumnKind::Integer, values));
    }

    Ok(Table::new(encoded))
}
