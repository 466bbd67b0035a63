// Runtime executor: the three operations offered to the serving layer

use crate::config::Config;
use crate::csv_reader;
use crate::document;
use crate::error::{Error, Result};
use crate::graph;
use crate::ir::{ChartKind, ColumnSelection, RenderSpec};
use crate::summary::{self, Summary, MAX_PREVIEW_ROWS};
use crate::transform;

/// Parameters of a plot request as they arrive from a form
#[derive(Debug, Clone, Default)]
pub struct PlotRequest {
    pub column: String,
    pub chart_type: String,
    /// Empty string means no grouping
    pub group_by: Option<String>,
}

impl PlotRequest {
    pub fn new(column: impl Into<String>, chart_type: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            chart_type: chart_type.into(),
            group_by: None,
        }
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by = Some(column.into());
        self
    }

    fn grouping_column(&self) -> Option<String> {
        self.group_by
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(String::from)
    }
}

/// Load the file and describe it: schema text, first rows, column names.
/// The preview never holds more than ten rows, whatever the config says.
pub fn summarize(bytes: &[u8], config: &Config) -> Result<Summary> {
    let table = csv_reader::read_table(bytes)?;
    let preview_rows = config.preview_rows.min(MAX_PREVIEW_ROWS);
    Ok(summary::build_summary(&table, preview_rows))
}

/// Chart the request as an image (PNG or SVG, per `config.render.format`)
pub fn render_image(bytes: &[u8], request: &PlotRequest, config: &Config) -> Result<Vec<u8>> {
    let spec = prepare(bytes, request, config)?;
    let rendered = graph::render_image(&spec, &config.render).map_err(render_error)?;
    log::debug!(
        "rendered {} image: {} bytes, {} value labels, {} tooltips",
        spec.chart,
        rendered.bytes.len(),
        rendered.value_labels,
        rendered.tooltips
    );
    Ok(rendered.bytes)
}

/// Chart the request as a single-page PDF
pub fn render_document(bytes: &[u8], request: &PlotRequest, config: &Config) -> Result<Vec<u8>> {
    let spec = prepare(bytes, request, config)?;
    let pdf = document::render_document(&spec).map_err(render_error)?;
    log::debug!("rendered {} document: {} bytes", spec.chart, pdf.len());
    Ok(pdf)
}

/// Load, validate and aggregate: everything up to drawing. The table is
/// aggregated as loaded; rows only drop out when the charted cells are
/// missing.
pub fn prepare(bytes: &[u8], request: &PlotRequest, config: &Config) -> Result<RenderSpec> {
    let table = csv_reader::read_table(bytes)?;
    let chart: ChartKind = request.chart_type.parse()?;

    let selection = ColumnSelection::new(request.column.clone(), request.grouping_column(), chart);
    selection.validate(&table)?;

    if !config.capabilities.supports(chart) {
        return Err(Error::unimplemented(format!("'{}' charts", chart)));
    }

    let aggregation = transform::aggregate(&table, &selection, &config.capabilities)?;
    let spec = RenderSpec::new(aggregation, chart, config.label_threshold);
    log::debug!(
        "{} categories, density {:?}",
        spec.aggregation.rows.len(),
        spec.density
    );
    Ok(spec)
}

fn render_error(err: anyhow::Error) -> Error {
    log::error!("rendering failed: {:#}", err);
    Error::Render(format!("{:#}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::ir::Density;

    const FRUIT: &[u8] = b"fruit,weight\napple,1.5\npear,2\napple,2.5\n";

    #[test]
    fn test_prepare_counts() {
        let spec = prepare(FRUIT, &PlotRequest::new("fruit", "bar"), &Config::default()).unwrap();
        assert_eq!(spec.labels(), vec!["apple", "pear"]);
        assert_eq!(spec.values(), vec![2.0, 1.0]);
        assert_eq!(spec.density, Density::Inline);
    }

    #[test]
    fn test_prepare_empty_group_by_means_none() {
        let request = PlotRequest::new("fruit", "pie").group_by("  ");
        let spec = prepare(FRUIT, &request, &Config::default()).unwrap();
        assert_eq!(spec.chart, ChartKind::Pie);
    }

    #[test]
    fn test_prepare_grouped_mean() {
        let request = PlotRequest::new("weight", "barh").group_by("fruit");
        let spec = prepare(FRUIT, &request, &Config::default()).unwrap();
        assert_eq!(spec.values(), vec![2.0, 2.0]);
        assert_eq!(spec.aggregation.value_label, "mean of weight");
    }

    #[test]
    fn test_prepare_unknown_chart() {
        let err = prepare(FRUIT, &PlotRequest::new("fruit", "scatter"), &Config::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnsupportedChart(ref t)) if t == "scatter"
        ));
    }

    #[test]
    fn test_prepare_disabled_chart_is_unimplemented() {
        let mut config = Config::default();
        config.capabilities.pie = false;
        let err = prepare(FRUIT, &PlotRequest::new("fruit", "pie"), &config).unwrap_err();
        assert_eq!(err.status(), 501);
    }

    #[test]
    fn test_prepare_load_error() {
        let err = prepare(b"", &PlotRequest::new("fruit", "bar"), &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn test_prepare_ignores_blanks_in_other_columns() {
        let csv = b"k,other\nx,1\ny,\nx,3\n";
        let spec = prepare(csv, &PlotRequest::new("k", "bar"), &Config::default()).unwrap();
        assert_eq!(spec.labels(), vec!["x", "y"]);
        assert_eq!(spec.values(), vec![2.0, 1.0]);
        assert_eq!(spec.aggregation.total(), 3.0);
    }

    #[test]
    fn test_summarize_caps_preview_rows() {
        let mut csv = String::from("n\n");
        for i in 0..25 {
            csv.push_str(&format!("{}\n", i));
        }
        let config = Config {
            preview_rows: 50,
            ..Config::default()
        };
        let summary = summarize(csv.as_bytes(), &config).unwrap();
        assert_eq!(summary.preview_rows.len(), 10);
    }
}
