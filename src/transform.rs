use crate::config::Capabilities;
use crate::data::{Column, ColumnKind, Table, Value};
use crate::encode::{encode_categoricals, factorize};
use crate::error::{Error, Result, ValidationError};
use crate::ir::{AggregatedRow, Aggregation, ColumnSelection, Measure};

/// Main entry point: reduce the selected columns of a table to one measure
/// per category, in first-appearance order of the category values.
///
/// Without a grouping column every distinct primary value is counted.
/// With one, each group gets the mean of the primary column when it is
/// numeric and the group's row count otherwise. Only rows whose primary
/// (or grouping) cell is missing are left out; blanks in other columns do
/// not matter. Category codes come from the categorical encoder.
pub fn aggregate(
    table: &Table,
    selection: &ColumnSelection,
    capabilities: &Capabilities,
) -> Result<Aggregation> {
    selection.validate(table)?;

    // validate() guarantees both lookups succeed
    let primary = table
        .column(&selection.primary)
        .ok_or_else(|| ValidationError::UnknownColumn(selection.primary.clone()))?;

    let aggregation = match &selection.group_by {
        None => count_values(primary)?,
        Some(group_name) => {
            if !capabilities.grouping {
                return Err(Error::unimplemented("grouped aggregation"));
            }
            let group = table
                .column(group_name)
                .ok_or_else(|| ValidationError::UnknownColumn(group_name.clone()))?;
            aggregate_by_group(primary, group)?
        }
    };

    if aggregation.rows.is_empty() {
        return Err(ValidationError::NoData.into());
    }

    log::debug!(
        "aggregated '{}' into {} categories ({:?})",
        selection.primary,
        aggregation.rows.len(),
        aggregation.measure
    );
    Ok(aggregation)
}

/// One row per distinct value with its number of occurrences
fn count_values(column: &Column) -> Result<Aggregation> {
    let factorized = factorize(&column.values);
    let mut counts = vec![0usize; factorized.uniques.len()];
    for code in factorized.codes.iter().flatten() {
        counts[*code] += 1;
    }

    let measures = factorized
        .uniques
        .iter()
        .zip(counts)
        .map(|(value, count)| (value.to_string(), count as f64))
        .collect();

    Ok(Aggregation {
        rows: encode_rows(&column.name, measures)?,
        measure: Measure::Count,
        category_label: column.name.clone(),
        value_label: "count".to_string(),
    })
}

/// Mean of a numeric primary column (or row count of a text one) per group
fn aggregate_by_group(primary: &Column, group: &Column) -> Result<Aggregation> {
    let factorized = factorize(&group.values);
    let n_groups = factorized.uniques.len();
    let numeric = primary.kind.is_numeric();

    let mut sums = vec![0.0f64; n_groups];
    let mut counts = vec![0usize; n_groups];

    for (code, value) in factorized.codes.iter().zip(&primary.values) {
        let Some(code) = *code else { continue };
        if value.is_missing() {
            continue;
        }
        if numeric {
            if let Some(v) = value.as_f64() {
                sums[code] += v;
                counts[code] += 1;
            }
        } else {
            counts[code] += 1;
        }
    }

    // Groups with nothing to measure are dropped
    let measures = factorized
        .uniques
        .iter()
        .enumerate()
        .filter(|(code, _)| counts[*code] > 0)
        .map(|(code, value)| {
            let measure = if numeric {
                sums[code] / counts[code] as f64
            } else {
                counts[code] as f64
            };
            (value.to_string(), measure)
        })
        .collect();

    let (measure, value_label) = if numeric {
        (Measure::Mean, format!("mean of {}", primary.name))
    } else {
        (Measure::Count, "count".to_string())
    };

    Ok(Aggregation {
        rows: encode_rows(&group.name, measures)?,
        measure,
        category_label: group.name.clone(),
        value_label,
    })
}

/// Run the aggregated category labels through the categorical encoder and
/// attach the resulting codes, which become the category axis positions.
fn encode_rows(category: &str, measures: Vec<(String, f64)>) -> Result<Vec<AggregatedRow>> {
    let labels = measures
        .iter()
        .map(|(label, _)| Value::Text(label.clone()))
        .collect();
    let table = Table::new(vec![Column::new(category, ColumnKind::Text, labels)]);
    let encoded = encode_categoricals(&table, &[category])?;
    let codes = encoded
        .columns()
        .first()
        .map(|c| c.values.as_slice())
        .unwrap_or(&[]);

    let rows = measures
        .into_iter()
        .zip(codes)
        .filter_map(|((label, value), code)| match code {
            Value::Int(c) => Some(AggregatedRow {
                label,
                code: *c as usize,
                value,
            }),
            _ => None,
        })
        .collect();
    Ok(rows)
}
