use crate::config::RenderOptions;
use crate::ir::{ChartKind, Density, RenderSpec};
use crate::palette;
use crate::scale::value_domain;
use crate::OutputFormat;
use anyhow::{bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Share of a category band covered by its bar
const BAR_WIDTH: f64 = 0.8;
/// Longest category label drawn on an axis, in characters
const MAX_LABEL_CHARS: usize = 14;

/// Encoded image plus what ended up on it
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub value_labels: usize,
    pub category_labels: usize,
    pub tooltips: usize,
}

/// Region of the image that reveals `text` on hover
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub points: Vec<(i32, i32)>,
    pub text: String,
}

impl Hotspot {
    fn rect(a: (i32, i32), b: (i32, i32), text: String) -> Self {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        Self {
            points: vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)],
            text,
        }
    }
}

/// Labels and hover regions produced while drawing
#[derive(Debug, Default)]
struct Marks {
    value_labels: usize,
    category_labels: usize,
    hotspots: Vec<Hotspot>,
}

/// Render a chart into a fresh image of the configured format
pub fn render_image(spec: &RenderSpec, options: &RenderOptions) -> Result<Rendered> {
    match options.format {
        OutputFormat::Png => render_png(spec, options.width, options.height),
        OutputFormat::Svg => render_svg(spec, options.width, options.height),
    }
}

fn render_png(spec: &RenderSpec, width: u32, height: u32) -> Result<Rendered> {
    let mut canvas = Canvas::new(width, height)?;
    let marks = canvas.draw(spec)?;
    Ok(Rendered {
        bytes: canvas.encode()?,
        value_labels: marks.value_labels,
        category_labels: marks.category_labels,
        // A raster image cannot carry hover text
        tooltips: 0,
    })
}

fn render_svg(spec: &RenderSpec, width: u32, height: u32) -> Result<Rendered> {
    if width == 0 || height == 0 {
        bail!("Image size must be positive (got {}x{})", width, height);
    }

    let mut svg = String::new();
    let marks = {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        let marks = draw_chart(&root, spec)?;
        root.present().context("Failed to present drawing")?;
        marks
    };

    inject_tooltips(&mut svg, &marks.hotspots)?;

    Ok(Rendered {
        bytes: svg.into_bytes(),
        value_labels: marks.value_labels,
        category_labels: marks.category_labels,
        tooltips: marks.hotspots.len(),
    })
}

/// Pixel buffer owned by a single render call
struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Image size must be positive (got {}x{})", width, height);
        }
        Ok(Canvas {
            buffer: vec![0u8; width as usize * height as usize * 3],
            width,
            height,
        })
    }

    fn draw(&mut self, spec: &RenderSpec) -> Result<Marks> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        let marks = draw_chart(&root, spec)?;
        root.present().context("Failed to present drawing")?;
        Ok(marks)
    }

    /// Finalize and encode the canvas as PNG
    fn encode(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(
                    &self.buffer,
                    self.width,
                    self.height,
                    image::ColorType::Rgb8,
                )
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

fn draw_chart<DB>(root: &DrawingArea<DB, Shift>, spec: &RenderSpec) -> Result<Marks>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if spec.aggregation.rows.is_empty() {
        bail!("Cannot create chart with no data");
    }
    root.fill(&WHITE).context("Failed to fill background")?;

    match spec.chart {
        ChartKind::Bar => draw_bars(root, spec, false),
        ChartKind::Barh => draw_bars(root, spec, true),
        ChartKind::Pie => draw_pie(root, spec),
    }
}

/// Vertical or horizontal bars, one per category, on a 0..n category band axis
fn draw_bars<DB>(root: &DrawingArea<DB, Shift>, spec: &RenderSpec, horizontal: bool) -> Result<Marks>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let rows = &spec.aggregation.rows;
    let inline = spec.density == Density::Inline;
    let (value_lo, value_hi) = value_domain(&spec.values());
    let band = 0.0..spec.positions() as f64;

    let (x_range, y_range) = if horizontal {
        (value_lo..value_hi, band)
    } else {
        (band, value_lo..value_hi)
    };
    let (x_desc, y_desc) = if horizontal {
        (&spec.aggregation.value_label, &spec.aggregation.category_label)
    } else {
        (&spec.aggregation.category_label, &spec.aggregation.value_label)
    };

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(spec.title(), ("sans-serif", 20))
        .x_label_area_size(50)
        .y_label_area_size(if horizontal && inline { 110 } else { 60 })
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")?;

    // Category ticks are replaced by labels at the bar centres (or by nothing)
    let blank = |_: &f64| String::new();
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(x_desc.as_str()).y_desc(y_desc.as_str());
        if horizontal {
            mesh.disable_y_mesh().y_label_formatter(&blank);
        } else {
            mesh.disable_x_mesh().x_label_formatter(&blank);
        }
        mesh.draw().context("Failed to draw mesh")?;
    }

    // Bars sit in the slot given by their category code
    let corners = |code: usize, value: f64| -> [(f64, f64); 2] {
        let lo = code as f64 + (1.0 - BAR_WIDTH) / 2.0;
        let hi = lo + BAR_WIDTH;
        if horizontal {
            [(0.0, lo), (value, hi)]
        } else {
            [(lo, 0.0), (hi, value)]
        }
    };

    let (r, g, b) = palette::BAR;
    let color = RGBColor(r, g, b);
    chart
        .draw_series(
            rows.iter()
                .map(|row| Rectangle::new(corners(row.code, row.value), color.filled())),
        )
        .context("Failed to draw bars")?;

    let mut marks = Marks::default();

    if !inline {
        marks.hotspots = rows
            .iter()
            .map(|row| {
                let [a, b] = corners(row.code, row.value);
                Hotspot::rect(
                    chart.backend_coord(&a),
                    chart.backend_coord(&b),
                    spec.tooltip(row),
                )
            })
            .collect();
        return Ok(marks);
    }

    let value_style = if horizontal {
        TextStyle::from(("sans-serif", 12).into_font()).pos(Pos::new(HPos::Left, VPos::Center))
    } else {
        TextStyle::from(("sans-serif", 12).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom))
    };
    let offset = if horizontal { (4, 0) } else { (0, -4) };
    chart
        .draw_series(rows.iter().map(|row| {
            let centre = row.code as f64 + 0.5;
            let anchor = if horizontal { (row.value, centre) } else { (centre, row.value) };
            EmptyElement::at(anchor)
                + Text::new(RenderSpec::format_value(row.value), offset, value_style.clone())
        }))
        .context("Failed to draw value labels")?;
    marks.value_labels = rows.len();

    let label_style = if horizontal {
        TextStyle::from(("sans-serif", 12).into_font()).pos(Pos::new(HPos::Right, VPos::Center))
    } else {
        TextStyle::from(("sans-serif", 12).into_font()).pos(Pos::new(HPos::Center, VPos::Top))
    };
    for row in rows {
        let centre = row.code as f64 + 0.5;
        let (px, py) = if horizontal {
            let (px, py) = chart.backend_coord(&(value_lo, centre));
            (px - 6, py)
        } else {
            let (px, py) = chart.backend_coord(&(centre, value_lo));
            (px, py + 6)
        };
        root.draw(&Text::new(short_label(&row.label), (px, py), label_style.clone()))
            .context("Failed to draw category label")?;
    }
    marks.category_labels = rows.len();

    Ok(marks)
}

/// Pie drawn directly on the root area; slices start at twelve o'clock and
/// run clockwise.
fn draw_pie<DB>(root: &DrawingArea<DB, Shift>, spec: &RenderSpec) -> Result<Marks>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let total = spec.aggregation.total();
    if !(total > 0.0) {
        bail!("Pie chart needs a positive total (got {})", total);
    }

    let (width, height) = root.dim_in_pixel();
    let title_area = 40;
    root.draw(&Text::new(
        spec.aggregation.category_label.clone(),
        ((width / 2) as i32, 10),
        TextStyle::from(("sans-serif", 20).into_font()).pos(Pos::new(HPos::Center, VPos::Top)),
    ))
    .context("Failed to draw title")?;

    let centre = ((width / 2) as i32, (height as i32 + title_area) / 2);
    let radius = f64::from(width.min(height.saturating_sub(title_area as u32))) * 0.35;
    let inline = spec.density == Density::Inline;
    let at = |angle: f64, r: f64| -> (i32, i32) {
        (
            centre.0 + (r * angle.cos()).round() as i32,
            centre.1 + (r * angle.sin()).round() as i32,
        )
    };

    let mut marks = Marks::default();
    let mut start = -FRAC_PI_2;

    for (i, row) in spec.aggregation.rows.iter().enumerate() {
        let share = row.value / total;
        let sweep = share * TAU;
        let steps = ((share * 120.0).ceil() as usize).max(2);

        let mut points = vec![centre];
        points.extend((0..=steps).map(|s| at(start + sweep * s as f64 / steps as f64, radius)));

        let (r, g, b) = palette::slice_color(i);
        root.draw(&Polygon::new(points.clone(), RGBColor(r, g, b).filled()))
            .context("Failed to draw slice")?;

        let middle = start + sweep / 2.0;
        if inline {
            let hpos = if middle.cos() >= 0.0 { HPos::Left } else { HPos::Right };
            root.draw(&Text::new(
                short_label(&row.label),
                at(middle, radius * 1.08),
                TextStyle::from(("sans-serif", 13).into_font()).pos(Pos::new(hpos, VPos::Center)),
            ))
            .context("Failed to draw slice label")?;
            root.draw(&Text::new(
                format!("{:.1}%", share * 100.0),
                at(middle, radius * 0.6),
                TextStyle::from(("sans-serif", 12).into_font()).pos(Pos::new(HPos::Center, VPos::Center)),
            ))
            .context("Failed to draw slice percentage")?;
            marks.category_labels += 1;
            marks.value_labels += 1;
        } else {
            marks.hotspots.push(Hotspot {
                points,
                text: spec.tooltip(row),
            });
        }

        start += sweep;
    }

    Ok(marks)
}

fn short_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        label.to_string()
    } else {
        let head: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
        format!("{}…", head)
    }
}

/// Append an invisible shape with a `<title>` per hotspot, just before the
/// closing tag, so browsers show the text on hover.
fn inject_tooltips(svg: &mut String, hotspots: &[Hotspot]) -> Result<()> {
    if hotspots.is_empty() {
        return Ok(());
    }
    let end = svg
        .rfind("</svg>")
        .context("SVG output has no closing tag")?;

    let mut overlay = String::from("<g class=\"tooltips\">\n");
    for spot in hotspots {
        let points: Vec<String> = spot
            .points
            .iter()
            .map(|(x, y)| format!("{},{}", x, y))
            .collect();
        overlay.push_str(&format!(
            "<polygon points=\"{}\" fill=\"#000000\" fill-opacity=\"0\"><title>{}</title></polygon>\n",
            points.join(" "),
            escape_xml(&spot.text)
        ));
    }
    overlay.push_str("</g>\n");

    svg.insert_str(end, &overlay);
    Ok(())
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AggregatedRow, Aggregation, Measure};

    fn make_spec(n: usize, chart: ChartKind) -> RenderSpec {
        let rows = (0..n)
            .map(|i| AggregatedRow {
                label: format!("c{}", i),
                code: i,
                value: 10.111 + i as f64,
            })
            .collect();
        let aggregation = Aggregation {
            rows,
            measure: Measure::Mean,
            category_label: "group".to_string(),
            value_label: "mean of v".to_string(),
        };
        RenderSpec::new(aggregation, chart, 10)
    }

    fn options(format: OutputFormat) -> RenderOptions {
        RenderOptions {
            width: 640,
            height: 480,
            format,
        }
    }

    fn is_valid_png(bytes: &[u8]) -> bool {
        bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
    }

    #[test]
    fn test_png_bar_inline_labels() {
        let rendered = render_image(&make_spec(10, ChartKind::Bar), &options(OutputFormat::Png)).unwrap();
        assert!(is_valid_png(&rendered.bytes));
        assert_eq!(rendered.value_labels, 10);
        assert_eq!(rendered.category_labels, 10);
        assert_eq!(rendered.tooltips, 0);
    }

    #[test]
    fn test_png_bar_dense_suppresses_labels() {
        let rendered = render_image(&make_spec(11, ChartKind::Bar), &options(OutputFormat::Png)).unwrap();
        assert!(is_valid_png(&rendered.bytes));
        assert_eq!(rendered.value_labels, 0);
        assert_eq!(rendered.category_labels, 0);
    }

    #[test]
    fn test_svg_bar_inline_has_values_no_tooltips() {
        let rendered = render_image(&make_spec(10, ChartKind::Bar), &options(OutputFormat::Svg)).unwrap();
        let svg = String::from_utf8(rendered.bytes).unwrap();
        assert!(svg.contains("10.11"));
        assert!(svg.contains("19.11"));
        assert!(!svg.contains("<title>"));
    }

    #[test]
    fn test_svg_bar_dense_has_tooltips() {
        let rendered = render_image(&make_spec(11, ChartKind::Bar), &options(OutputFormat::Svg)).unwrap();
        assert_eq!(rendered.tooltips, 11);
        let svg = String::from_utf8(rendered.bytes).unwrap();
        assert_eq!(svg.matches("<title>").count(), 11);
        assert!(svg.contains("group: c10"));
        assert!(!svg.contains(">10.11<"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_barh_renders() {
        let rendered = render_image(&make_spec(3, ChartKind::Barh), &options(OutputFormat::Png)).unwrap();
        assert!(is_valid_png(&rendered.bytes));
        assert_eq!(rendered.value_labels, 3);
    }

    #[test]
    fn test_pie_inline_and_dense() {
        let small = render_image(&make_spec(4, ChartKind::Pie), &options(OutputFormat::Svg)).unwrap();
        assert_eq!(small.category_labels, 4);
        assert_eq!(small.tooltips, 0);

        let dense = render_image(&make_spec(12, ChartKind::Pie), &options(OutputFormat::Svg)).unwrap();
        assert_eq!(dense.category_labels, 0);
        assert_eq!(dense.tooltips, 12);
    }

    #[test]
    fn test_zero_size_is_error() {
        let opts = RenderOptions {
            width: 0,
            height: 480,
            format: OutputFormat::Png,
        };
        assert!(render_image(&make_spec(2, ChartKind::Bar), &opts).is_err());
    }

    #[test]
    fn test_inject_tooltips_escapes_text() {
        let mut svg = String::from("<svg></svg>\n");
        let spot = Hotspot::rect((5, 5), (0, 0), "a<b & c".to_string());
        inject_tooltips(&mut svg, &[spot]).unwrap();
        assert!(svg.contains("<title>a&lt;b &amp; c</title>"));
        assert!(svg.contains("points=\"0,0 5,0 5,5 0,5\""));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_bars_placed_by_code() {
        let mut spec = make_spec(11, ChartKind::Bar);
        spec.aggregation.rows.reverse();
        let mut svg = String::new();
        let marks = {
            let root = SVGBackend::with_string(&mut svg, (640, 480)).into_drawing_area();
            draw_chart(&root, &spec).unwrap()
        };
        // Listed first, but c10 still occupies the rightmost slot
        assert!(marks.hotspots[0].text.starts_with("group: c10\n"));
        assert!(marks.hotspots[0].text.ends_with("position: 10"));
        assert!(marks.hotspots[0].points[0].0 > marks.hotspots[10].points[0].0);
    }

    #[test]
    fn test_short_label() {
        assert_eq!(short_label("short"), "short");
        assert_eq!(short_label("a very long category name").chars().count(), MAX_LABEL_CHARS);
    }
}
