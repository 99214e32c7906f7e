//! Painting contract and an SVG surface.
//!
//! Items paint themselves into any [`Painter`] in scene coordinates. The
//! painter only has to draw paths and text; the item resolves its style and
//! applies its own transform.

use crate::document::{Document, Page};
use crate::geometry::{Rect, Transform};
use crate::model::style::names;
use crate::model::{Alignment, Color, Item, ItemKind, PenStyle, Style};
use crate::path::{Path, fmt_num};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub width: f64,
    pub style: PenStyle,
}

/// Text drawing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Font<'a> {
    pub family: &'a str,
    pub size: f64,
    pub color: Color,
    pub alignment: Alignment,
}

/// Drawing surface an item paints into.
pub trait Painter {
    /// Stroke and/or fill `path`. `None` skips the corresponding pass.
    fn draw_path(&mut self, path: &Path, pen: Option<&Pen>, fill: Option<Color>);

    /// Draw `text` laid out inside `rect`, one line per `\n`.
    fn draw_text(&mut self, rect: &Rect, text: &str, font: &Font<'_>);
}

impl Item {
    /// Paint the item with its resolved style.
    pub fn paint(&self, painter: &mut dyn Painter, defaults: &Style) {
        let style = self.style(defaults);
        let pen = Pen {
            color: style.color(names::PEN_COLOR),
            width: style.number(names::PEN_WIDTH),
            style: style.pen_style(),
        };
        let pen = (pen.style != PenStyle::NoPen && pen.width > 0.0).then_some(pen);

        match &self.kind {
            ItemKind::Group { children } => {
                let mut nested = TransformedPainter {
                    inner: painter,
                    transform: self.transform,
                };
                for child in children {
                    child.paint(&mut nested, defaults);
                }
                return;
            }
            ItemKind::Text => {}
            kind => {
                let fill = kind
                    .has_fill()
                    .then(|| style.color(names::BRUSH_COLOR))
                    .filter(|c| !c.is_transparent());
                let outline = self.centerline(defaults).map_to_scene(&self.transform);
                painter.draw_path(&outline, pen.as_ref(), fill);
                for marker in self.markers(defaults) {
                    let fill = marker.style.is_filled().then_some(pen.map(|p| p.color)).flatten();
                    let path = marker.path.map_to_scene(&self.transform);
                    painter.draw_path(&path, pen.as_ref(), fill);
                }
            }
        }

        if let Some(rect) = self.text_rect(defaults) {
            let font = Font {
                family: style.text(names::FONT_FAMILY),
                size: style.number(names::FONT_SIZE),
                color: style.color(names::TEXT_COLOR),
                alignment: style.alignment(),
            };
            let rect = self.transform.map_rect_to_scene(&rect);
            painter.draw_text(&rect, style.text(names::CAPTION), &font);
        }
    }
}

/// Forwards drawing calls through a group's transform.
struct TransformedPainter<'a> {
    inner: &'a mut dyn Painter,
    transform: Transform,
}

impl Painter for TransformedPainter<'_> {
    fn draw_path(&mut self, path: &Path, pen: Option<&Pen>, fill: Option<Color>) {
        self.inner.draw_path(&path.map_to_scene(&self.transform), pen, fill);
    }

    fn draw_text(&mut self, rect: &Rect, text: &str, font: &Font<'_>) {
        self.inner
            .draw_text(&self.transform.map_rect_to_scene(rect), text, font);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SVG
// ────────────────────────────────────────────────────────────────────────────

/// Painter that accumulates SVG elements.
#[derive(Debug, Default)]
pub struct SvgPainter {
    body: String,
}

impl SvgPainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the accumulated elements in an `<svg>` root of the given size.
    pub fn finish(self, width: f64, height: f64, background: Color) -> String {
        let (w, h) = (fmt_num(width), fmt_num(height));
        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n"
        ));
        if !background.is_transparent() {
            out.push_str(&format!(
                "  <rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" fill=\"{}\"/>\n",
                svg_color(background)
            ));
        }
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

fn svg_color(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

fn dash_array(style: PenStyle, width: f64) -> Option<String> {
    let unit = width.max(0.1);
    let pattern: &[f64] = match style {
        PenStyle::Dash => &[4.0, 2.0],
        PenStyle::Dot => &[1.0, 2.0],
        PenStyle::DashDot => &[4.0, 2.0, 1.0, 2.0],
        PenStyle::Solid | PenStyle::NoPen => return None,
    };
    Some(
        pattern
            .iter()
            .map(|v| fmt_num(v * unit))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

impl Painter for SvgPainter {
    fn draw_path(&mut self, path: &Path, pen: Option<&Pen>, fill: Option<Color>) {
        if path.is_empty() || (pen.is_none() && fill.is_none()) {
            return;
        }
        let mut attrs = String::new();
        match fill {
            Some(c) => {
                attrs.push_str(&format!(" fill=\"{}\"", svg_color(c)));
                if c.a != 255 {
                    attrs.push_str(&format!(" fill-opacity=\"{}\"", fmt_num(c.a as f64 / 255.0)));
                }
            }
            None => attrs.push_str(" fill=\"none\""),
        }
        if let Some(pen) = pen {
            attrs.push_str(&format!(
                " stroke=\"{}\" stroke-width=\"{}\" stroke-linejoin=\"round\"",
                svg_color(pen.color),
                fmt_num(pen.width)
            ));
            if let Some(dashes) = dash_array(pen.style, pen.width) {
                attrs.push_str(&format!(" stroke-dasharray=\"{dashes}\""));
            }
        }
        self.body
            .push_str(&format!("  <path d=\"{}\"{attrs}/>\n", path.to_svg_data()));
    }

    fn draw_text(&mut self, rect: &Rect, text: &str, font: &Font<'_>) {
        let (anchor, x) = match font.alignment {
            Alignment::Left => ("start", rect.left),
            Alignment::Center => ("middle", rect.center().x),
            Alignment::Right => ("end", rect.right),
        };
        let lines: Vec<&str> = text.split('\n').collect();
        let line_height = font.size * 1.2;
        let first_baseline =
            rect.center().y - line_height * (lines.len() as f64 - 1.0) / 2.0 + font.size * 0.35;
        for (i, line) in lines.iter().enumerate() {
            self.body.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" text-anchor=\"{anchor}\">{}</text>\n",
                fmt_num(x),
                fmt_num(first_baseline + i as f64 * line_height),
                html_escape::encode_double_quoted_attribute(font.family),
                fmt_num(font.size),
                svg_color(font.color),
                html_escape::encode_text(line),
            ));
        }
    }
}

/// Render one page as a standalone SVG document sized to the page.
pub fn page_to_svg(document: &Document, page: &Page) -> String {
    let mut painter = SvgPainter::new();
    for item in page.items() {
        item.paint(&mut painter, &document.default_style);
    }
    let settings = &document.settings;
    painter.finish(settings.page_width, settings.page_height, settings.background)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{ArrowStyle, ItemId, PropertyValue};

    #[derive(Default)]
    struct Recorder {
        paths: Vec<(Path, Option<Pen>, Option<Color>)>,
        texts: Vec<(Rect, String)>,
    }

    impl Painter for Recorder {
        fn draw_path(&mut self, path: &Path, pen: Option<&Pen>, fill: Option<Color>) {
            self.paths.push((path.clone(), pen.copied(), fill));
        }

        fn draw_text(&mut self, rect: &Rect, text: &str, _font: &Font<'_>) {
            self.texts.push((*rect, text.to_string()));
        }
    }

    #[test]
    fn test_paint_maps_to_scene() {
        let defaults = Style::default();
        let item =
            Item::line(ItemId(1), Point::ZERO, Point::new(10.0, 0.0)).at(Point::new(5.0, 5.0));
        let mut rec = Recorder::default();
        item.paint(&mut rec, &defaults);
        assert_eq!(rec.paths.len(), 1);
        assert_eq!(rec.paths[0].0.bounding_rect(), Some(Rect::new(5.0, 5.0, 15.0, 5.0)));
        assert!(rec.paths[0].2.is_none());
    }

    #[test]
    fn test_filled_marker_uses_pen_color() {
        let defaults = Style::default();
        let item = Item::line(ItemId(1), Point::ZERO, Point::new(10.0, 0.0))
            .with_property(names::END_ARROW, PropertyValue::Arrow(ArrowStyle::TriangleFilled));
        let mut rec = Recorder::default();
        item.paint(&mut rec, &defaults);
        assert_eq!(rec.paths.len(), 2);
        assert_eq!(rec.paths[1].2, Some(Color::BLACK));
    }

    #[test]
    fn test_text_rect_paints_caption() {
        let defaults = Style::default();
        let item = Item::text_box(ItemId(1), Rect::new(0.0, 0.0, 20.0, 10.0), "a < b");
        let mut svg = SvgPainter::new();
        item.paint(&mut svg, &defaults);
        let out = svg.finish(100.0, 100.0, Color::WHITE);
        assert!(out.contains("a &lt; b"));
        assert!(out.contains("<path d=\"M 0 0"));
    }
}
