//! The item sum type and the capability surface shared by all shapes.

use crate::geometry::{Point, Rect, Transform};
use crate::model::point::{ItemPoint, PointKind};
use crate::model::shapes;
use crate::model::style::{PropertyValue, Style, StyleView, names};
use crate::model::{ItemId, PointRef};
use crate::path::Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Shape variant of an [`Item`].
///
/// Geometry of every non-group variant is carried entirely by the item's
/// point list; groups additionally own their child items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Line,
    Curve,
    Polyline,
    Polygon,
    Rect,
    Ellipse,
    Text,
    TextRect,
    TextEllipse,
    Group { children: Vec<Item> },
}

impl ItemKind {
    /// Type tag used by the document format and the item factory.
    pub fn type_name(&self) -> &'static str {
        match self {
            ItemKind::Line => "line",
            ItemKind::Curve => "curve",
            ItemKind::Polyline => "polyline",
            ItemKind::Polygon => "polygon",
            ItemKind::Rect => "rect",
            ItemKind::Ellipse => "ellipse",
            ItemKind::Text => "text",
            ItemKind::TextRect => "textRect",
            ItemKind::TextEllipse => "textEllipse",
            ItemKind::Group { .. } => "group",
        }
    }

    pub fn from_type_name(name: &str) -> Option<ItemKind> {
        Some(match name {
            "line" => ItemKind::Line,
            "curve" => ItemKind::Curve,
            "polyline" => ItemKind::Polyline,
            "polygon" => ItemKind::Polygon,
            "rect" => ItemKind::Rect,
            "ellipse" => ItemKind::Ellipse,
            "text" => ItemKind::Text,
            "textRect" => ItemKind::TextRect,
            "textEllipse" => ItemKind::TextEllipse,
            "group" => ItemKind::Group {
                children: Vec::new(),
            },
            _ => return None,
        })
    }

    /// Smallest number of points the variant may have.
    pub fn min_points(&self) -> usize {
        match self {
            ItemKind::Line | ItemKind::Polyline => 2,
            ItemKind::Polygon => 3,
            ItemKind::Curve => 4,
            ItemKind::Text => 1,
            ItemKind::Rect
            | ItemKind::Ellipse
            | ItemKind::TextRect
            | ItemKind::TextEllipse
            | ItemKind::Group { .. } => 8,
        }
    }

    pub fn has_markers(&self) -> bool {
        matches!(self, ItemKind::Line | ItemKind::Curve | ItemKind::Polyline)
    }

    pub fn has_text(&self) -> bool {
        matches!(self, ItemKind::Text | ItemKind::TextRect | ItemKind::TextEllipse)
    }

    pub fn has_fill(&self) -> bool {
        matches!(
            self,
            ItemKind::Polygon
                | ItemKind::Rect
                | ItemKind::Ellipse
                | ItemKind::TextRect
                | ItemKind::TextEllipse
        )
    }

    /// Style property names the variant responds to.
    pub fn properties(&self) -> Vec<&'static str> {
        let mut list = Vec::new();
        if !matches!(self, ItemKind::Text | ItemKind::Group { .. }) {
            list.extend([names::PEN_COLOR, names::PEN_WIDTH, names::PEN_STYLE]);
        }
        if self.has_fill() {
            list.push(names::BRUSH_COLOR);
        }
        if matches!(self, ItemKind::Rect | ItemKind::TextRect) {
            list.push(names::CORNER_RADIUS);
        }
        if self.has_markers() {
            list.extend([names::START_ARROW, names::END_ARROW, names::ARROW_SIZE]);
        }
        if self.has_text() {
            list.extend([
                names::CAPTION,
                names::FONT_FAMILY,
                names::FONT_SIZE,
                names::TEXT_COLOR,
                names::TEXT_ALIGNMENT,
            ]);
        }
        list
    }
}

/// One placed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub transform: Transform,
    pub points: Vec<ItemPoint>,
    /// Style overrides; unset properties resolve against the document style.
    pub properties: IndexMap<String, PropertyValue>,
    pub selected: bool,
    pub kind: ItemKind,
}

impl Item {
    /// Build an item of `kind` from local point positions, assigning point
    /// capabilities according to the variant.
    pub fn new(id: ItemId, kind: ItemKind, positions: &[Point]) -> Self {
        let kinds = shapes::point_kinds(&kind, positions.len());
        let points = positions
            .iter()
            .zip(kinds)
            .map(|(&p, k)| ItemPoint::new(p, k))
            .collect();
        Self {
            id,
            transform: Transform::default(),
            points,
            properties: IndexMap::new(),
            selected: false,
            kind,
        }
    }

    /// Factory keyed on the type tag, producing a default-sized shape.
    pub fn from_type_name(id: ItemId, type_name: &str) -> Option<Self> {
        let kind = ItemKind::from_type_name(type_name)?;
        let rect = Rect::new(-10.0, -5.0, 10.0, 5.0);
        Some(match kind {
            ItemKind::Line => Item::line(id, Point::new(-10.0, 0.0), Point::new(10.0, 0.0)),
            ItemKind::Curve => Item::curve(
                id,
                [
                    Point::new(-10.0, 0.0),
                    Point::new(-5.0, -5.0),
                    Point::new(5.0, 5.0),
                    Point::new(10.0, 0.0),
                ],
            ),
            ItemKind::Polyline => {
                Item::polyline(id, &[Point::new(-10.0, 0.0), Point::new(10.0, 0.0)])
            }
            ItemKind::Polygon => Item::polygon(
                id,
                &[Point::new(-10.0, 5.0), Point::new(0.0, -5.0), Point::new(10.0, 5.0)],
            ),
            ItemKind::Rect => Item::rect(id, rect),
            ItemKind::Ellipse => Item::ellipse(id, rect),
            ItemKind::Text => Item::new(id, ItemKind::Text, &[Point::ZERO]),
            ItemKind::TextRect => Item::new(id, ItemKind::TextRect, &shapes::rect_handles(&rect)),
            ItemKind::TextEllipse => {
                Item::new(id, ItemKind::TextEllipse, &shapes::rect_handles(&rect))
            }
            ItemKind::Group { .. } => Item::new(id, kind, &shapes::rect_handles(&Rect::default())),
        })
    }

    pub fn line(id: ItemId, start: Point, end: Point) -> Self {
        Item::new(id, ItemKind::Line, &[start, end])
    }

    /// Cubic curve from `[start, control1, control2, end]`.
    pub fn curve(id: ItemId, points: [Point; 4]) -> Self {
        Item::new(id, ItemKind::Curve, &points)
    }

    pub fn polyline(id: ItemId, points: &[Point]) -> Self {
        Item::new(id, ItemKind::Polyline, points)
    }

    pub fn polygon(id: ItemId, points: &[Point]) -> Self {
        Item::new(id, ItemKind::Polygon, points)
    }

    pub fn rect(id: ItemId, rect: Rect) -> Self {
        Item::new(id, ItemKind::Rect, &shapes::rect_handles(&rect))
    }

    pub fn ellipse(id: ItemId, rect: Rect) -> Self {
        Item::new(id, ItemKind::Ellipse, &shapes::rect_handles(&rect))
    }

    pub fn text(id: ItemId, caption: &str) -> Self {
        Item::new(id, ItemKind::Text, &[Point::ZERO])
            .with_property(names::CAPTION, PropertyValue::Text(caption.to_string()))
    }

    pub fn text_box(id: ItemId, rect: Rect, caption: &str) -> Self {
        Item::new(id, ItemKind::TextRect, &shapes::rect_handles(&rect))
            .with_property(names::CAPTION, PropertyValue::Text(caption.to_string()))
    }

    pub fn text_ellipse(id: ItemId, rect: Rect, caption: &str) -> Self {
        Item::new(id, ItemKind::TextEllipse, &shapes::rect_handles(&rect))
            .with_property(names::CAPTION, PropertyValue::Text(caption.to_string()))
    }

    pub fn at(mut self, position: Point) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_property(mut self, name: &str, value: PropertyValue) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn position(&self) -> Point {
        self.transform.position
    }

    pub fn map_to_scene(&self, p: Point) -> Point {
        self.transform.map_to_scene(p)
    }

    pub fn map_from_scene(&self, p: Point) -> Point {
        self.transform.map_from_scene(p)
    }

    pub fn point_ref(&self, index: usize) -> PointRef {
        PointRef::new(self.id, index)
    }

    /// Scene position of point `index`.
    pub fn scene_point(&self, index: usize) -> Option<Point> {
        self.points.get(index).map(|p| self.map_to_scene(p.position))
    }

    /// Local point positions, in order.
    pub fn positions(&self) -> Vec<Point> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Overwrite point positions, keeping capabilities and connections.
    pub(crate) fn set_positions(&mut self, positions: &[Point]) {
        for (point, &p) in self.points.iter_mut().zip(positions) {
            point.position = p;
        }
    }

    pub fn style<'a>(&'a self, defaults: &'a Style) -> StyleView<'a> {
        StyleView::new(&self.properties, defaults)
    }

    pub fn supports_property(&self, name: &str) -> bool {
        self.kind.properties().contains(&name)
    }

    pub fn is_connected(&self) -> bool {
        self.points.iter().any(|p| !p.connections.is_empty())
    }

    /// False for degenerate geometry (zero-length lines, empty polygons,
    /// zero-area rectangles, blank captions); such items are not placed.
    pub fn is_valid(&self, defaults: &Style) -> bool {
        let positions = self.positions();
        if positions.len() < self.kind.min_points() {
            return false;
        }
        match &self.kind {
            ItemKind::Line | ItemKind::Curve => {
                !positions[0].coincides(positions[positions.len() - 1])
            }
            ItemKind::Polyline | ItemKind::Polygon => {
                Rect::bounding(positions).is_some_and(|r| r.width() > 0.0 || r.height() > 0.0)
            }
            ItemKind::Rect | ItemKind::Ellipse | ItemKind::TextRect | ItemKind::TextEllipse => {
                let r = shapes::handle_rect(&positions);
                r.width() != 0.0 && r.height() != 0.0
            }
            ItemKind::Text => !self.style(defaults).text(names::CAPTION).trim().is_empty(),
            ItemKind::Group { children } => !children.is_empty(),
        }
    }

    /// Local extent including half the pen width and any visible markers.
    pub fn bounding_rect(&self, defaults: &Style) -> Rect {
        let half_pen = if self.supports_property(names::PEN_WIDTH) {
            self.style(defaults).half_pen_width()
        } else {
            0.0
        };
        let mut rect = self.geometry_rect(defaults).normalized().adjusted(half_pen);
        for marker in self.markers(defaults) {
            if let Some(bounds) = marker.path.bounding_rect() {
                rect = rect.united(&bounds.adjusted(half_pen));
            }
        }
        rect
    }

    pub fn scene_bounding_rect(&self, defaults: &Style) -> Rect {
        self.transform.map_rect_to_scene(&self.bounding_rect(defaults))
    }

    /// Fillable, hit-testable outline in local coordinates.
    pub fn shape(&self, defaults: &Style) -> Path {
        shapes::outline(self, defaults).unwrap_or_else(|| {
            let mut path = Path::new();
            path.add_rect(&self.bounding_rect(defaults));
            path
        })
    }

    /// True if the scene point hits the item's shape.
    pub fn contains_scene_point(&self, p: Point, defaults: &Style) -> bool {
        self.shape(defaults).contains(self.map_from_scene(p))
    }

    /// Scale the placement and all geometry by `factor` about the scene origin.
    pub fn scale(&mut self, factor: f64) {
        self.transform.position = self.transform.position * factor;
        for point in &mut self.points {
            point.position = point.position * factor;
        }
        if let ItemKind::Group { children } = &mut self.kind {
            for child in children {
                child.scale(factor);
            }
        }
    }

    /// Index of the control point nearest to `local`, if any.
    pub fn nearest_point(
        &self,
        local: Point,
        filter: impl Fn(&ItemPoint) -> bool,
    ) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| filter(p))
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance(local)
                    .total_cmp(&b.position.distance(local))
            })
            .map(|(i, _)| i)
    }

    pub(crate) fn point_kind(&self, index: usize) -> PointKind {
        self.points.get(index).map(|p| p.kind).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_round_trips_type_names() {
        for name in [
            "line", "curve", "polyline", "polygon", "rect", "ellipse", "text", "textRect",
            "textEllipse", "group",
        ] {
            let item = Item::from_type_name(ItemId(1), name).expect("known type");
            assert_eq!(item.type_name(), name);
            assert!(item.points.len() >= item.kind.min_points());
        }
        assert!(Item::from_type_name(ItemId(1), "hexagon").is_none());
    }

    #[test]
    fn test_validity() {
        let defaults = Style::default();
        assert!(Item::line(ItemId(1), Point::ZERO, Point::new(1.0, 0.0)).is_valid(&defaults));
        assert!(!Item::line(ItemId(1), Point::ZERO, Point::ZERO).is_valid(&defaults));
        assert!(!Item::rect(ItemId(2), Rect::new(0.0, 0.0, 0.0, 5.0)).is_valid(&defaults));
        assert!(!Item::text(ItemId(3), "  ").is_valid(&defaults));
        let sliver = Item::polygon(ItemId(4), &[Point::ZERO, Point::new(1.0, 1.0)]);
        assert!(!sliver.is_valid(&defaults));
    }

    #[test]
    fn test_bounding_rect_includes_half_pen() {
        let defaults = Style::default();
        let item = Item::rect(ItemId(1), Rect::new(0.0, 0.0, 10.0, 4.0))
            .with_property(names::PEN_WIDTH, PropertyValue::Number(2.0));
        assert_eq!(item.bounding_rect(&defaults), Rect::new(-1.0, -1.0, 11.0, 5.0));
    }

    #[test]
    fn test_scene_point_uses_transform() {
        let mut item =
            Item::line(ItemId(1), Point::ZERO, Point::new(10.0, 0.0)).at(Point::new(5.0, 5.0));
        item.transform.rotate(Point::new(5.0, 5.0));
        assert_eq!(item.scene_point(1), Some(Point::new(5.0, 15.0)));
    }

    #[test]
    fn test_scale() {
        let mut item =
            Item::line(ItemId(1), Point::ZERO, Point::new(10.0, 0.0)).at(Point::new(1.0, 2.0));
        item.scale(2.0);
        assert_eq!(item.position(), Point::new(2.0, 4.0));
        assert_eq!(item.points[1].position, Point::new(20.0, 0.0));
    }
}
