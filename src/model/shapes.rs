//! Per-variant geometry: point layouts, outlines, resize math, point
//! insertion and line-end markers.

use crate::geometry::{Point, Rect, cubic_point, distance_to_segment, snap_to_45};
use crate::model::item::{Item, ItemKind};
use crate::model::point::PointKind;
use crate::model::style::{Alignment, ArrowStyle, Style, names};
use crate::path::{Path, stroke_outline};

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.6;
/// Line height as a fraction of the font size.
const LINE_HEIGHT: f64 = 1.2;

// ────────────────────────────────────────────────────────────────────────────
// Point layout
// ────────────────────────────────────────────────────────────────────────────

/// Capabilities of each point for a shape of `kind` with `count` points.
pub(crate) fn point_kinds(kind: &ItemKind, count: usize) -> Vec<PointKind> {
    let is_end = |i: usize| i == 0 || i + 1 == count;
    (0..count)
        .map(|i| match kind {
            ItemKind::Line => PointKind::FREE_CONTROL_CONNECTION,
            ItemKind::Curve if is_end(i) => PointKind::FREE_CONTROL_CONNECTION,
            ItemKind::Curve => PointKind::CONTROL,
            ItemKind::Polyline if is_end(i) => PointKind::FREE_CONTROL_CONNECTION,
            ItemKind::Polyline | ItemKind::Polygon | ItemKind::Rect | ItemKind::TextRect => {
                PointKind::CONTROL_CONNECTION
            }
            // Corners sit at even indices, edge midpoints at odd ones.
            ItemKind::Ellipse | ItemKind::TextEllipse if i % 2 == 0 => PointKind::CONTROL,
            ItemKind::Ellipse | ItemKind::TextEllipse => PointKind::CONTROL_CONNECTION,
            ItemKind::Text | ItemKind::Group { .. } => PointKind::NONE,
        })
        .collect()
}

/// The eight handles of a rectangle: top-left, top-middle, top-right,
/// middle-right, bottom-right, bottom-middle, bottom-left, middle-left.
pub fn rect_handles(rect: &Rect) -> [Point; 8] {
    let (l, t, r, b) = (rect.left, rect.top, rect.right, rect.bottom);
    let cx = (l + r) / 2.0;
    let cy = (t + b) / 2.0;
    [
        Point::new(l, t),
        Point::new(cx, t),
        Point::new(r, t),
        Point::new(r, cy),
        Point::new(r, b),
        Point::new(cx, b),
        Point::new(l, b),
        Point::new(l, cy),
    ]
}

/// Rectangle spanned by handles 0 and 4. Not normalized: a rectangle
/// dragged inside-out keeps its edges in handle order.
pub fn handle_rect(positions: &[Point]) -> Rect {
    match (positions.first(), positions.get(4)) {
        (Some(a), Some(b)) => Rect::new(a.x, a.y, b.x, b.y),
        _ => Rect::bounding(positions.iter().copied()).unwrap_or_default(),
    }
}

/// Width and height of a caption laid out at `font_size`.
pub fn text_size(caption: &str, font_size: f64) -> (f64, f64) {
    let lines: Vec<&str> = caption.split('\n').collect();
    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    (
        widest as f64 * GLYPH_ADVANCE * font_size,
        lines.len() as f64 * LINE_HEIGHT * font_size,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Markers
// ────────────────────────────────────────────────────────────────────────────

/// An arrow head drawn at one end of an open shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub style: ArrowStyle,
    pub tip: Point,
    /// Direction the marker points to, in radians.
    pub angle: f64,
    pub path: Path,
}

/// Outline of a marker of `style` with its tip at `tip`, pointing along
/// `angle`, in the item's local space.
pub fn marker_path(style: ArrowStyle, tip: Point, angle: f64, size: f64) -> Path {
    let (sin, cos) = angle.sin_cos();
    let place = |p: Point| tip + Point::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos);
    let s = size;
    let mut path = Path::new();
    match style {
        ArrowStyle::None => {}
        ArrowStyle::Normal => {
            path.add_polyline(&[
                place(Point::new(-s, -s / 2.0)),
                tip,
                place(Point::new(-s, s / 2.0)),
            ]);
        }
        ArrowStyle::Triangle | ArrowStyle::TriangleFilled => {
            path.add_polygon(&[
                tip,
                place(Point::new(-s, -s / 2.0)),
                place(Point::new(-s, s / 2.0)),
            ]);
        }
        ArrowStyle::Circle | ArrowStyle::CircleFilled => {
            let c = place(Point::new(-s / 2.0, 0.0));
            let r = s / 2.0;
            path.add_ellipse(&Rect::new(c.x - r, c.y - r, c.x + r, c.y + r));
        }
        ArrowStyle::Diamond | ArrowStyle::DiamondFilled => {
            path.add_polygon(&[
                tip,
                place(Point::new(-s / 2.0, -s / 2.0)),
                place(Point::new(-s, 0.0)),
                place(Point::new(-s / 2.0, s / 2.0)),
            ]);
        }
        ArrowStyle::Concave | ArrowStyle::ConcaveFilled => {
            path.add_polygon(&[
                tip,
                place(Point::new(-s, -s / 2.0)),
                place(Point::new(-s * 0.7, 0.0)),
                place(Point::new(-s, s / 2.0)),
            ]);
        }
    }
    path
}

// ────────────────────────────────────────────────────────────────────────────
// Outlines
// ────────────────────────────────────────────────────────────────────────────

/// Hit-testable outline of a variant, or `None` to fall back to the
/// bounding rectangle.
pub(crate) fn outline(item: &Item, defaults: &Style) -> Option<Path> {
    let style = item.style(defaults);
    match &item.kind {
        ItemKind::Line | ItemKind::Curve | ItemKind::Polyline => {
            let width = style.number(names::PEN_WIDTH);
            let mut path = Path::new();
            for poly in item.centerline(defaults).flatten() {
                path.extend(stroke_outline(&poly, width));
            }
            for marker in item.markers(defaults) {
                path.extend(marker.path);
            }
            Some(path)
        }
        ItemKind::Polygon
        | ItemKind::Rect
        | ItemKind::Ellipse
        | ItemKind::TextRect
        | ItemKind::TextEllipse => {
            Some(item.centerline(defaults))
        }
        ItemKind::Text => {
            let mut path = Path::new();
            path.add_rect(&item.geometry_rect(defaults));
            Some(path)
        }
        ItemKind::Group { children } => {
            let mut path = Path::new();
            for child in children {
                path.extend(child.shape(defaults).map_to_scene(&child.transform));
            }
            Some(path)
        }
    }
}

impl Item {
    /// Local extent of the bare geometry, without pen or markers.
    pub fn geometry_rect(&self, defaults: &Style) -> Rect {
        match &self.kind {
            ItemKind::Text => self.text_rect(defaults).unwrap_or_default(),
            _ => Rect::bounding(self.points.iter().map(|p| p.position)).unwrap_or_default(),
        }
    }

    /// Box the caption is laid out in, for text-bearing variants.
    pub fn text_rect(&self, defaults: &Style) -> Option<Rect> {
        let style = self.style(defaults);
        match &self.kind {
            ItemKind::Text => {
                let anchor = self.points.first().map(|p| p.position).unwrap_or_default();
                let (w, h) = text_size(style.text(names::CAPTION), style.number(names::FONT_SIZE));
                let left = match style.alignment() {
                    Alignment::Left => anchor.x,
                    Alignment::Center => anchor.x - w / 2.0,
                    Alignment::Right => anchor.x - w,
                };
                Some(Rect::new(left, anchor.y - h / 2.0, left + w, anchor.y + h / 2.0))
            }
            ItemKind::TextRect | ItemKind::TextEllipse => {
                Some(handle_rect(&self.positions()).normalized())
            }
            _ => None,
        }
    }

    /// Stroked outline of the shape in local space.
    pub fn centerline(&self, defaults: &Style) -> Path {
        let positions = self.positions();
        let mut path = Path::new();
        match &self.kind {
            ItemKind::Curve if positions.len() == 4 => {
                path.move_to(positions[0]);
                path.cubic_to(positions[1], positions[2], positions[3]);
            }
            ItemKind::Line | ItemKind::Curve | ItemKind::Polyline => path.add_polyline(&positions),
            ItemKind::Polygon => path.add_polygon(&positions),
            ItemKind::Rect | ItemKind::TextRect => {
                let radius = self.style(defaults).number(names::CORNER_RADIUS);
                path.add_rounded_rect(&handle_rect(&positions).normalized(), radius, radius);
            }
            ItemKind::Ellipse | ItemKind::TextEllipse => {
                path.add_ellipse(&handle_rect(&positions).normalized());
            }
            ItemKind::Text | ItemKind::Group { .. } => {}
        }
        path
    }

    /// Visible start and end markers of an open shape.
    ///
    /// A marker is suppressed when the segment it sits on is shorter than
    /// the marker itself.
    pub fn markers(&self, defaults: &Style) -> Vec<Marker> {
        if !self.kind.has_markers() || self.points.len() < 2 {
            return Vec::new();
        }
        let style = self.style(defaults);
        let size = style.number(names::ARROW_SIZE);
        let positions = self.positions();
        let last = positions.len() - 1;

        // (tip, point the marker points away from, segment length)
        let (start, end) = match &self.kind {
            ItemKind::Curve if positions.len() == 4 => {
                let [p0, c1, c2, p3] = [positions[0], positions[1], positions[2], positions[3]];
                let chord = p0.distance(p3);
                (
                    (p0, cubic_point(p0, c1, c2, p3, 0.05), chord),
                    (p3, cubic_point(p0, c1, c2, p3, 0.95), chord),
                )
            }
            _ => (
                (positions[0], positions[1], positions[0].distance(positions[1])),
                (
                    positions[last],
                    positions[last - 1],
                    positions[last].distance(positions[last - 1]),
                ),
            ),
        };

        let mut markers = Vec::new();
        for (name, (tip, from, length)) in [(names::START_ARROW, start), (names::END_ARROW, end)] {
            let arrow = style.arrow(name);
            if arrow == ArrowStyle::None || length < size {
                continue;
            }
            let angle = (tip - from).angle();
            markers.push(Marker {
                style: arrow,
                tip,
                angle,
                path: marker_path(arrow, tip, angle, size),
            });
        }
        markers
    }

    // ────────────────────────────────────────────────────────────────────────
    // Resizing
    // ────────────────────────────────────────────────────────────────────────

    /// Move point `index` to the local position `requested`.
    ///
    /// With `snap` set, line and polyline points snap to 45° steps around
    /// their anchor (the other endpoint, or the previous vertex). Dragging a
    /// curve endpoint carries its adjacent control point along; dragging a
    /// rectangle handle moves the corresponding edges and regenerates all
    /// eight handles.
    pub fn resize_point(&mut self, index: usize, requested: Point, snap: bool) {
        let count = self.points.len();
        if index >= count || !self.points[index].is_control() {
            return;
        }
        match self.kind {
            ItemKind::Line | ItemKind::Polyline => {
                let anchor = if index == 0 { 1 } else {
                    index - 1
                };
                let target = if snap && anchor < count {
                    snap_to_45(self.points[anchor].position, requested)
                } else {
                    requested
                };
                self.points[index].position = target;
            }
            ItemKind::Curve if count == 4 && (index == 0 || index == 3) => {
                let delta = requested - self.points[index].position;
                let control = if index == 0 { 1 } else { 2 };
                self.points[index].position = requested;
                self.points[control].position += delta;
            }
            ItemKind::Rect | ItemKind::Ellipse | ItemKind::TextRect | ItemKind::TextEllipse => {
                let mut rect = handle_rect(&self.positions());
                let p = requested;
                match index {
                    0 => (rect.left, rect.top) = (p.x, p.y),
                    1 => rect.top = p.y,
                    2 => (rect.right, rect.top) = (p.x, p.y),
                    3 => rect.right = p.x,
                    4 => (rect.right, rect.bottom) = (p.x, p.y),
                    5 => rect.bottom = p.y,
                    6 => (rect.left, rect.bottom) = (p.x, p.y),
                    _ => rect.left = p.x,
                }
                self.set_positions(&rect_handles(&rect));
            }
            _ => self.points[index].position = requested,
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Point insertion and removal
    // ────────────────────────────────────────────────────────────────────────

    /// Where a vertex requested at local `p` would be inserted: right after
    /// the start of the closest edge. `None` for variants without editable
    /// vertex lists.
    pub fn insertion_index(&self, p: Point) -> Option<usize> {
        let positions = self.positions();
        let edges: Vec<(usize, Point, Point)> = match self.kind {
            ItemKind::Polyline => positions
                .windows(2)
                .enumerate()
                .map(|(i, w)| (i, w[0], w[1]))
                .collect(),
            ItemKind::Polygon => (0..positions.len())
                .map(|i| (i, positions[i], positions[(i + 1) % positions.len()]))
                .collect(),
            _ => return None,
        };
        edges
            .into_iter()
            .min_by(|a, b| {
                distance_to_segment(p, a.1, a.2).total_cmp(&distance_to_segment(p, b.1, b.2))
            })
            .map(|(i, _, _)| i + 1)
    }

    /// Index of the vertex nearest to local `p` if it may be removed.
    ///
    /// Polygons keep at least three vertices, polylines at least two, and a
    /// polyline's endpoints are never removed.
    pub fn removable_point(&self, p: Point) -> Option<usize> {
        let count = self.points.len();
        match self.kind {
            ItemKind::Polygon if count > 3 => self.nearest_point(p, |_| true),
            ItemKind::Polyline if count > 2 => self
                .nearest_point(p, |_| true)
                .filter(|&i| i != 0 && i + 1 != count),
            _ => None,
        }
    }

    /// Capabilities a point inserted at `index` receives.
    pub(crate) fn inserted_point_kind(&self, index: usize) -> PointKind {
        point_kinds(&self.kind, self.points.len() + 1)
            .get(index)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemId;
    use crate::model::style::PropertyValue;

    fn triangle() -> Item {
        Item::polygon(
            ItemId(1),
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)],
        )
    }

    #[test]
    fn test_point_policy() {
        let line = Item::line(ItemId(1), Point::ZERO, Point::new(1.0, 0.0));
        assert!(line.points.iter().all(|p| p.is_free()));

        let polyline = Item::polyline(
            ItemId(2),
            &[Point::ZERO, Point::new(1.0, 0.0), Point::new(2.0, 0.0)],
        );
        assert!(polyline.points[0].is_free() && polyline.points[2].is_free());
        assert!(!polyline.points[1].is_free() && polyline.points[1].is_connection());

        let ellipse = Item::ellipse(ItemId(3), Rect::new(0.0, 0.0, 4.0, 2.0));
        assert!(!ellipse.points[0].is_connection());
        assert!(ellipse.points[1].is_connection());

        let curve = Item::from_type_name(ItemId(4), "curve").unwrap();
        assert!(curve.points[0].is_free() && curve.points[3].is_free());
        assert!(!curve.points[1].is_connection());
    }

    #[test]
    fn test_line_resize_snaps_to_45() {
        let mut line = Item::line(ItemId(1), Point::ZERO, Point::new(5.0, 0.0));
        line.resize_point(1, Point::new(9.0, 4.0), true);
        let end = line.points[1].position;
        assert!((end.x - 9.0).abs() < 1e-9 && (end.y - 9.0).abs() < 1e-9);

        line.resize_point(1, Point::new(9.0, 4.0), false);
        assert_eq!(line.points[1].position, Point::new(9.0, 4.0));
    }

    #[test]
    fn test_rect_handle_resize_regenerates_handles() {
        let mut rect = Item::rect(ItemId(1), Rect::new(0.0, 0.0, 10.0, 10.0));
        rect.resize_point(3, Point::new(20.0, 3.0), false);
        assert_eq!(rect.points[4].position, Point::new(20.0, 10.0));
        assert_eq!(rect.points[1].position, Point::new(10.0, 0.0));
        assert_eq!(rect.points[3].position, Point::new(20.0, 5.0));
    }

    #[test]
    fn test_curve_endpoint_carries_control() {
        let mut curve = Item::curve(
            ItemId(1),
            [Point::ZERO, Point::new(2.0, 2.0), Point::new(8.0, 2.0), Point::new(10.0, 0.0)],
        );
        curve.resize_point(0, Point::new(1.0, 1.0), false);
        assert_eq!(curve.points[1].position, Point::new(3.0, 3.0));
        assert_eq!(curve.points[2].position, Point::new(8.0, 2.0));
    }

    #[test]
    fn test_insertion_index_picks_closest_edge() {
        let tri = triangle();
        assert_eq!(tri.insertion_index(Point::new(5.0, -1.0)), Some(1));
        assert_eq!(tri.insertion_index(Point::new(-1.0, 5.0)), Some(3));
        assert_eq!(tri.insertion_index(Point::new(6.0, 6.0)), Some(2));
    }

    #[test]
    fn test_removal_floors() {
        let tri = triangle();
        assert_eq!(tri.removable_point(Point::ZERO), None);

        let polyline = Item::polyline(
            ItemId(2),
            &[Point::ZERO, Point::new(5.0, 5.0), Point::new(10.0, 0.0)],
        );
        assert_eq!(polyline.removable_point(Point::new(5.0, 4.0)), Some(1));
        assert_eq!(polyline.removable_point(Point::new(0.0, 1.0)), None);
    }

    #[test]
    fn test_marker_suppressed_on_short_segment() {
        let defaults = Style::default();
        let line = Item::line(ItemId(1), Point::ZERO, Point::new(2.0, 0.0))
            .with_property(names::END_ARROW, PropertyValue::Arrow(ArrowStyle::Triangle));
        assert!(line.markers(&defaults).is_empty());

        let line = Item::line(ItemId(1), Point::ZERO, Point::new(20.0, 0.0))
            .with_property(names::END_ARROW, PropertyValue::Arrow(ArrowStyle::Triangle));
        let markers = line.markers(&defaults);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].tip, Point::new(20.0, 0.0));
        assert!(markers[0].angle.abs() < 1e-9);
    }

    #[test]
    fn test_curve_marker_uses_tangent_near_end() {
        let defaults = Style::default();
        let curve = Item::curve(
            ItemId(1),
            [Point::ZERO, Point::new(0.0, 10.0), Point::new(20.0, 10.0), Point::new(20.0, 0.0)],
        )
        .with_property(names::START_ARROW, PropertyValue::Arrow(ArrowStyle::Normal));
        let markers = curve.markers(&defaults);
        assert_eq!(markers.len(), 1);
        // The curve leaves the start heading down, so the marker points up.
        assert!(markers[0].angle < 0.0);
    }

    #[test]
    fn test_text_rect_follows_alignment() {
        let defaults = Style::default();
        let text = Item::text(ItemId(1), "abcde")
            .with_property(names::TEXT_ALIGNMENT, PropertyValue::Align(Alignment::Left));
        let rect = text.text_rect(&defaults).unwrap();
        assert_eq!(rect.left, 0.0);
        assert!((rect.width() - 12.0).abs() < 1e-9);
    }
}
