//! Single-page PDF rendering.
//!
//! The page is drawn with PDF path and text operators collected as `lopdf`
//! content operations (points, origin bottom-left) and assembled into a
//! document with `lopdf`. Text uses
//! the built-in Helvetica font, so the document embeds nothing external.
//! Hover tooltips do not exist here: above the label threshold the category
//! and value labels are simply left out.

use crate::ir::{ChartKind, Density, RenderSpec};
use crate::palette;
use crate::scale::{format_tick, nice_ticks, value_domain};
use anyhow::{bail, Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::f64::consts::{FRAC_PI_2, TAU};

/// 8 x 6 inches
const PAGE_WIDTH: f64 = 576.0;
const PAGE_HEIGHT: f64 = 432.0;

const BAR_WIDTH: f64 = 0.8;

/// Plot area inside the page
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f64,
    bottom: f64,
    right: f64,
    top: f64,
}

impl Frame {
    fn width(&self) -> f64 {
        self.right - self.left
    }

    fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

/// Render a chart into PDF bytes
pub fn render_document(spec: &RenderSpec) -> Result<Vec<u8>> {
    if spec.aggregation.rows.is_empty() {
        bail!("Cannot create chart with no data");
    }

    let mut page = ContentWriter::default();
    match spec.chart {
        ChartKind::Bar => draw_bars(&mut page, spec, false)?,
        ChartKind::Barh => draw_bars(&mut page, spec, true)?,
        ChartKind::Pie => draw_pie(&mut page, spec)?,
    }

    assemble(page.finish()?)
}

fn assemble(content: Vec<u8>) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), (PAGE_WIDTH as i64).into(), (PAGE_HEIGHT as i64).into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).context("Failed to write PDF")?;
    Ok(bytes)
}

fn draw_bars(page: &mut ContentWriter, spec: &RenderSpec, horizontal: bool) -> Result<()> {
    let rows = &spec.aggregation.rows;
    let inline = spec.density == Density::Inline;
    let n = spec.positions() as f64;
    let (lo, hi) = value_domain(&spec.values());

    let frame = Frame {
        left: if horizontal && inline { 120.0 } else { 70.0 },
        bottom: 60.0,
        right: PAGE_WIDTH - 20.0,
        top: PAGE_HEIGHT - 45.0,
    };

    // (category position, value) -> page point
    let place = |cat: f64, value: f64| -> (f64, f64) {
        let v = (value - lo) / (hi - lo);
        let c = cat / n;
        if horizontal {
            (frame.left + v * frame.width(), frame.top - c * frame.height())
        } else {
            (frame.left + c * frame.width(), frame.bottom + v * frame.height())
        }
    };

    page.text_centered(&spec.title(), PAGE_WIDTH / 2.0, PAGE_HEIGHT - 30.0, 14.0);

    // Value axis ticks and grid
    page.stroke_color((0.85, 0.85, 0.85));
    for tick in nice_ticks(lo, hi, 6) {
        let (x0, y0) = place(0.0, tick);
        let (x1, y1) = place(n, tick);
        page.line((x0, y0), (x1, y1));
        if horizontal {
            page.text_centered(&format_tick(tick), x0, frame.bottom - 14.0, 9.0);
        } else {
            page.text_right(&format_tick(tick), frame.left - 4.0, y0 - 3.0, 9.0);
        }
    }

    let (r, g, b) = palette::BAR;
    page.fill_color(rgb(r, g, b));
    for row in rows {
        let start = row.code as f64 + (1.0 - BAR_WIDTH) / 2.0;
        let a = place(start, 0.0);
        let b = place(start + BAR_WIDTH, row.value);
        page.rect(a, b);
    }

    page.stroke_color((0.0, 0.0, 0.0));
    page.line((frame.left, frame.bottom), (frame.right, frame.bottom));
    page.line((frame.left, frame.bottom), (frame.left, frame.top));

    let (x_desc, y_desc) = if horizontal {
        (&spec.aggregation.value_label, &spec.aggregation.category_label)
    } else {
        (&spec.aggregation.category_label, &spec.aggregation.value_label)
    };
    page.text_centered(x_desc, frame.left + frame.width() / 2.0, 20.0, 11.0);
    page.text(y_desc, 10.0, frame.top + 8.0, 11.0);

    if inline {
        page.fill_color((0.0, 0.0, 0.0));
        for row in rows {
            let centre = row.code as f64 + 0.5;
            let value = RenderSpec::format_value(row.value);
            let (vx, vy) = place(centre, row.value);
            let (cx, cy) = place(centre, lo);
            if horizontal {
                page.text(&value, vx + 3.0, vy - 3.0, 9.0);
                page.text_right(&row.label, cx - 4.0, cy - 3.0, 9.0);
            } else {
                page.text_centered(&value, vx, vy + 3.0, 9.0);
                page.text_centered(&row.label, cx, cy - 14.0, 9.0);
            }
        }
    }

    Ok(())
}

fn draw_pie(page: &mut ContentWriter, spec: &RenderSpec) -> Result<()> {
    let total = spec.aggregation.total();
    if !(total > 0.0) {
        bail!("Pie chart needs a positive total (got {})", total);
    }

    page.fill_color((0.0, 0.0, 0.0));
    page.text_centered(
        &spec.aggregation.category_label,
        PAGE_WIDTH / 2.0,
        PAGE_HEIGHT - 30.0,
        14.0,
    );

    let centre = (PAGE_WIDTH / 2.0, (PAGE_HEIGHT - 40.0) / 2.0);
    let radius = (PAGE_HEIGHT - 40.0) * 0.35;
    let inline = spec.density == Density::Inline;
    // PDF y grows upwards, so clockwise means decreasing angle
    let at = |angle: f64, r: f64| (centre.0 + r * angle.cos(), centre.1 + r * angle.sin());

    let mut start = FRAC_PI_2;
    for (i, row) in spec.aggregation.rows.iter().enumerate() {
        let share = row.value / total;
        let sweep = share * TAU;
        let steps = ((share * 120.0).ceil() as usize).max(2);

        let mut points = vec![centre];
        points.extend((0..=steps).map(|s| at(start - sweep * s as f64 / steps as f64, radius)));

        let (r, g, b) = palette::slice_color(i);
        page.fill_color(rgb(r, g, b));
        page.polygon(&points);

        if inline {
            let middle = start - sweep / 2.0;
            let (lx, ly) = at(middle, radius * 1.08);
            page.fill_color((0.0, 0.0, 0.0));
            if middle.cos() >= 0.0 {
                page.text(&row.label, lx, ly - 4.0, 10.0);
            } else {
                page.text_right(&row.label, lx, ly - 4.0, 10.0);
            }
            let (px, py) = at(middle, radius * 0.6);
            page.text_centered(&format!("{:.1}%", share * 100.0), px, py - 4.0, 9.0);
        }

        start -= sweep;
    }

    Ok(())
}

fn rgb(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    (
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
    )
}

/// Accumulates content stream operations for one page
#[derive(Default)]
struct ContentWriter {
    ops: Vec<Operation>,
}

impl ContentWriter {
    fn finish(self) -> Result<Vec<u8>> {
        Content {
            operations: self.ops,
        }
        .encode()
        .context("Failed to encode page content")
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.ops.push(Operation::new(operator, operands));
    }

    fn fill_color(&mut self, (r, g, b): (f64, f64, f64)) {
        self.op("rg", vec![real(r), real(g), real(b)]);
    }

    fn stroke_color(&mut self, (r, g, b): (f64, f64, f64)) {
        self.op("RG", vec![real(r), real(g), real(b)]);
    }

    fn rect(&mut self, a: (f64, f64), b: (f64, f64)) {
        let x = a.0.min(b.0);
        let y = a.1.min(b.1);
        self.op(
            "re",
            vec![real(x), real(y), real((a.0 - b.0).abs()), real((a.1 - b.1).abs())],
        );
        self.op("f", vec![]);
    }

    fn line(&mut self, a: (f64, f64), b: (f64, f64)) {
        self.op("m", vec![real(a.0), real(a.1)]);
        self.op("l", vec![real(b.0), real(b.1)]);
        self.op("S", vec![]);
    }

    fn polygon(&mut self, points: &[(f64, f64)]) {
        for (i, &(x, y)) in points.iter().enumerate() {
            self.op(if i == 0 { "m" } else { "l" }, vec![real(x), real(y)]);
        }
        self.op("h", vec![]);
        self.op("f", vec![]);
    }

    fn text(&mut self, text: &str, x: f64, y: f64, size: f64) {
        self.op("BT", vec![]);
        self.op("Tf", vec!["F1".into(), real(size)]);
        self.op("Td", vec![real(x), real(y)]);
        self.op("Tj", vec![Object::string_literal(win_ansi(text))]);
        self.op("ET", vec![]);
    }

    fn text_centered(&mut self, text: &str, x: f64, y: f64, size: f64) {
        self.text(text, x - text_width(text, size) / 2.0, y, size);
    }

    fn text_right(&mut self, text: &str, x: f64, y: f64, size: f64) {
        self.text(text, x - text_width(text, size), y, size);
    }
}

fn real(value: f64) -> Object {
    (value as f32).into()
}

/// Approximate Helvetica advance width
fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.52
}

/// WinAnsi bytes for the built-in font. Characters outside Latin-1 become
/// '?', control characters are dropped and line breaks become spaces.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(b' '),
            c if (c as u32) < 0x20 => None,
            c if (c as u32) <= 0xFF => Some(c as u32 as u8),
            _ => Some(b'?'),
        })
        .collect()
}
