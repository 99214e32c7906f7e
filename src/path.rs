//! Outline paths used for item shapes, hit-testing and painting.

use crate::geometry::{Point, Rect, Transform, cubic_point};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Cubic approximation constant for a quarter ellipse.
const KAPPA: f64 = 0.552_284_749_8;

/// Number of line segments used when flattening one cubic segment.
const CURVE_STEPS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathElement {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
    Close,
}

/// A sequence of subpaths made of straight and cubic segments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Path {
    pub elements: Vec<PathElement>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn move_to(&mut self, p: Point) {
        self.elements.push(PathElement::MoveTo(p));
    }

    pub fn line_to(&mut self, p: Point) {
        self.elements.push(PathElement::LineTo(p));
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.elements.push(PathElement::CubicTo(c1, c2, end));
    }

    pub fn close(&mut self) {
        self.elements.push(PathElement::Close);
    }

    /// Open polyline through `points`.
    pub fn add_polyline(&mut self, points: &[Point]) {
        if let Some((first, rest)) = points.split_first() {
            self.move_to(*first);
            for p in rest {
                self.line_to(*p);
            }
        }
    }

    pub fn add_polygon(&mut self, points: &[Point]) {
        if !points.is_empty() {
            self.add_polyline(points);
            self.close();
        }
    }

    pub fn add_rect(&mut self, rect: &Rect) {
        self.add_polygon(&rect.corners());
    }

    /// Rectangle with rounded corners; radii are clamped to half the sides.
    pub fn add_rounded_rect(&mut self, rect: &Rect, rx: f64, ry: f64) {
        let rx = rx.min(rect.width() / 2.0).max(0.0);
        let ry = ry.min(rect.height() / 2.0).max(0.0);
        if rx == 0.0 || ry == 0.0 {
            self.add_rect(rect);
            return;
        }
        let (l, t, r, b) = (rect.left, rect.top, rect.right, rect.bottom);
        let kx = rx * KAPPA;
        let ky = ry * KAPPA;
        self.move_to(Point::new(l + rx, t));
        self.line_to(Point::new(r - rx, t));
        self.cubic_to(
            Point::new(r - rx + kx, t),
            Point::new(r, t + ry - ky),
            Point::new(r, t + ry),
        );
        self.line_to(Point::new(r, b - ry));
        self.cubic_to(
            Point::new(r, b - ry + ky),
            Point::new(r - rx + kx, b),
            Point::new(r - rx, b),
        );
        self.line_to(Point::new(l + rx, b));
        self.cubic_to(
            Point::new(l + rx - kx, b),
            Point::new(l, b - ry + ky),
            Point::new(l, b - ry),
        );
        self.line_to(Point::new(l, t + ry));
        self.cubic_to(
            Point::new(l, t + ry - ky),
            Point::new(l + rx - kx, t),
            Point::new(l + rx, t),
        );
        self.close();
    }

    /// Ellipse inscribed in `rect`, built from four cubic quarter arcs.
    pub fn add_ellipse(&mut self, rect: &Rect) {
        let c = rect.center();
        let rx = rect.width() / 2.0;
        let ry = rect.height() / 2.0;
        let kx = rx * KAPPA;
        let ky = ry * KAPPA;
        self.move_to(Point::new(c.x + rx, c.y));
        self.cubic_to(
            Point::new(c.x + rx, c.y + ky),
            Point::new(c.x + kx, c.y + ry),
            Point::new(c.x, c.y + ry),
        );
        self.cubic_to(
            Point::new(c.x - kx, c.y + ry),
            Point::new(c.x - rx, c.y + ky),
            Point::new(c.x - rx, c.y),
        );
        self.cubic_to(
            Point::new(c.x - rx, c.y - ky),
            Point::new(c.x - kx, c.y - ry),
            Point::new(c.x, c.y - ry),
        );
        self.cubic_to(
            Point::new(c.x + kx, c.y - ry),
            Point::new(c.x + rx, c.y - ky),
            Point::new(c.x + rx, c.y),
        );
        self.close();
    }

    /// Append all elements of `other`.
    pub fn extend(&mut self, other: Path) {
        self.elements.extend(other.elements);
    }

    /// Map every vertex and control point through `transform`.
    pub fn map_to_scene(&self, transform: &Transform) -> Path {
        let map = |p: Point| transform.map_to_scene(p);
        Path {
            elements: self
                .elements
                .iter()
                .map(|e| match *e {
                    PathElement::MoveTo(p) => PathElement::MoveTo(map(p)),
                    PathElement::LineTo(p) => PathElement::LineTo(map(p)),
                    PathElement::CubicTo(c1, c2, p) => {
                        PathElement::CubicTo(map(c1), map(c2), map(p))
                    }
                    PathElement::Close => PathElement::Close,
                })
                .collect(),
        }
    }

    /// Conservative bounds including cubic control points.
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::bounding(self.elements.iter().flat_map(|e| match *e {
            PathElement::MoveTo(p) | PathElement::LineTo(p) => vec![p],
            PathElement::CubicTo(c1, c2, p) => vec![c1, c2, p],
            PathElement::Close => vec![],
        }))
    }

    /// Flatten into polylines, one per subpath.
    pub fn flatten(&self) -> Vec<Vec<Point>> {
        let mut subpaths: Vec<Vec<Point>> = Vec::new();
        let mut current: Vec<Point> = Vec::new();
        for e in &self.elements {
            match *e {
                PathElement::MoveTo(p) => {
                    if current.len() > 1 {
                        subpaths.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(p);
                }
                PathElement::LineTo(p) => current.push(p),
                PathElement::CubicTo(c1, c2, p) => {
                    let start = current.last().copied().unwrap_or(c1);
                    for step in 1..=CURVE_STEPS {
                        let t = step as f64 / CURVE_STEPS as f64;
                        current.push(cubic_point(start, c1, c2, p, t));
                    }
                }
                PathElement::Close => {
                    if let Some(first) = current.first().copied() {
                        current.push(first);
                    }
                }
            }
        }
        if current.len() > 1 {
            subpaths.push(current);
        }
        subpaths
    }

    /// Even-odd containment test; each subpath is treated as closed and a
    /// point inside any subpath is contained.
    pub fn contains(&self, p: Point) -> bool {
        self.flatten().iter().any(|poly| polygon_contains(poly, p))
    }

    /// SVG path data (`d` attribute).
    pub fn to_svg_data(&self) -> String {
        let mut d = String::new();
        for e in &self.elements {
            if !d.is_empty() {
                d.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = match *e {
                PathElement::MoveTo(p) => write!(d, "M {} {}", fmt_num(p.x), fmt_num(p.y)),
                PathElement::LineTo(p) => write!(d, "L {} {}", fmt_num(p.x), fmt_num(p.y)),
                PathElement::CubicTo(c1, c2, p) => write!(
                    d,
                    "C {} {} {} {} {} {}",
                    fmt_num(c1.x),
                    fmt_num(c1.y),
                    fmt_num(c2.x),
                    fmt_num(c2.y),
                    fmt_num(p.x),
                    fmt_num(p.y)
                ),
                PathElement::Close => write!(d, "Z"),
            };
        }
        d
    }
}

/// Thick outline around an open polyline, one quad per segment.
pub fn stroke_outline(points: &[Point], width: f64) -> Path {
    let half = width / 2.0;
    let mut path = Path::new();
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let d = b - a;
        let len = d.length();
        if len == 0.0 {
            path.add_rect(&Rect::from_points(a, a).adjusted(half));
            continue;
        }
        let n = Point::new(-d.y / len * half, d.x / len * half);
        let along = Point::new(d.x / len * half, d.y / len * half);
        path.add_polygon(&[a - along + n, b + along + n, b + along - n, a - along - n]);
    }
    path
}

fn polygon_contains(poly: &[Point], p: Point) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Format a coordinate without trailing zeros.
pub(crate) fn fmt_num(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let mut path = Path::new();
        path.add_rect(&Rect::new(0.0, 0.0, 10.0, 5.0));
        assert!(path.contains(Point::new(5.0, 2.0)));
        assert!(!path.contains(Point::new(11.0, 2.0)));
    }

    #[test]
    fn test_ellipse_contains_center_not_corner() {
        let mut path = Path::new();
        path.add_ellipse(&Rect::new(-10.0, -10.0, 10.0, 10.0));
        assert!(path.contains(Point::ZERO));
        assert!(!path.contains(Point::new(9.5, 9.5)));
    }

    #[test]
    fn test_stroke_outline_hits_near_segment() {
        let path = stroke_outline(&[Point::ZERO, Point::new(10.0, 0.0)], 2.0);
        assert!(path.contains(Point::new(5.0, 0.5)));
        assert!(!path.contains(Point::new(5.0, 1.5)));
    }

    #[test]
    fn test_svg_data() {
        let mut path = Path::new();
        path.add_polyline(&[Point::ZERO, Point::new(1.5, -2.0)]);
        path.close();
        assert_eq!(path.to_svg_data(), "M 0 0 L 1.5 -2 Z");
    }
}
