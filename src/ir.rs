use crate::data::Table;
use crate::error::ValidationError;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Barh,
    Pie,
}

impl ChartKind {
    pub fn tag(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Barh => "barh",
            ChartKind::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ChartKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bar" => Ok(ChartKind::Bar),
            "barh" => Ok(ChartKind::Barh),
            "pie" => Ok(ChartKind::Pie),
            other => Err(ValidationError::UnsupportedChart(other.to_string())),
        }
    }
}

/// Which columns to chart and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub primary: String,
    pub group_by: Option<String>,
    pub chart: ChartKind,
}

impl ColumnSelection {
    pub fn new(primary: impl Into<String>, group_by: Option<String>, chart: ChartKind) -> Self {
        Self {
            primary: primary.into(),
            group_by,
            chart,
        }
    }

    /// Check the selection against a table and the chart kind's constraints
    pub fn validate(&self, table: &Table) -> Result<(), ValidationError> {
        for name in std::iter::once(&self.primary).chain(self.group_by.as_ref()) {
            if table.column(name).is_none() {
                return Err(ValidationError::UnknownColumn(name.clone()));
            }
        }
        if self.chart == ChartKind::Pie && self.group_by.is_some() {
            return Err(ValidationError::PieNeedsSingleColumn);
        }
        Ok(())
    }
}

// =============================================================================
// Aggregation output
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub label: String,
    /// Dense first-appearance code of the category, also its axis position
    pub code: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Count,
    Mean,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub rows: Vec<AggregatedRow>,
    pub measure: Measure,
    pub category_label: String,
    pub value_label: String,
}

impl Aggregation {
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }
}

// =============================================================================
// Rendering input
// =============================================================================

/// Inline value labels vs. hover tooltips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    Inline,
    Tooltip,
}

impl Density {
    pub fn for_categories(count: usize, threshold: usize) -> Self {
        if count <= threshold {
            Density::Inline
        } else {
            Density::Tooltip
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSpec {
    pub aggregation: Aggregation,
    pub chart: ChartKind,
    pub density: Density,
}

impl RenderSpec {
    pub fn new(aggregation: Aggregation, chart: ChartKind, threshold: usize) -> Self {
        let density = Density::for_categories(aggregation.rows.len(), threshold);
        Self {
            aggregation,
            chart,
            density,
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.aggregation.rows.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.aggregation.rows.iter().map(|r| r.value).collect()
    }

    /// Number of slots on the category axis
    pub fn positions(&self) -> usize {
        self.aggregation
            .rows
            .iter()
            .map(|r| r.code + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn title(&self) -> String {
        format!(
            "{} by {}",
            self.aggregation.value_label, self.aggregation.category_label
        )
    }

    /// Value annotation shown next to a bar
    pub fn format_value(value: f64) -> String {
        format!("{:.2}", value)
    }

    /// Hover text for one category
    pub fn tooltip(&self, row: &AggregatedRow) -> String {
        format!(
            "{}: {}\n{}: {}\nposition: {}",
            self.aggregation.category_label,
            row.label,
            self.aggregation.value_label,
            Self::format_value(row.value),
            row.code
        )
    }
}
