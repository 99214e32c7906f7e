//! Geometry kernel: points, rectangles and the item transform.
//!
//! Every item carries a [`Transform`] (scene-space position, quarter-turn
//! rotation and a horizontal flip). All mapping between item-local and scene
//! coordinates goes through [`Transform::map_to_scene`] and
//! [`Transform::map_from_scene`]; rotations are exact quarter turns so no
//! trigonometry is involved in position mapping.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Distance under which two scene positions are considered coincident.
pub const EPSILON: f64 = 1e-6;

// ────────────────────────────────────────────────────────────────────────────
// Point
// ────────────────────────────────────────────────────────────────────────────

/// A 2D point or offset. The y axis points down, as on screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the point treated as a vector.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// True if both points are within [`EPSILON`] of each other on each axis.
    pub fn coincides(self, other: Point) -> bool {
        (self.x - other.x).abs() <= EPSILON && (self.y - other.y).abs() <= EPSILON
    }

    /// Angle of the vector in radians, measured from the positive x axis.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Rotate by `quarters` × 90°, using the screen convention
    /// `(x, y) → (-y, x)` for a single quarter turn.
    pub fn rotate_quarters(self, quarters: u8) -> Point {
        match quarters % 4 {
            0 => self,
            1 => Point::new(-self.y, self.x),
            2 => Point::new(-self.x, -self.y),
            _ => Point::new(self.y, -self.x),
        }
    }

    pub fn mirror_x(self) -> Point {
        Point::new(-self.x, self.y)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rect
// ────────────────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle stored as its four edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Normalized rectangle spanned by two opposite corners.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Smallest rectangle containing all the given points.
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Rect::from_points(first, first);
        for p in iter {
            rect.left = rect.left.min(p.x);
            rect.top = rect.top.min(p.y);
            rect.right = rect.right.max(p.x);
            rect.bottom = rect.bottom.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right, self.bottom)
    }

    /// Corners in drawing order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }

    pub fn normalized(&self) -> Rect {
        Rect::from_points(self.top_left(), self.bottom_right())
    }

    pub fn united(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Grow (or shrink, for negative `d`) on every side.
    pub fn adjusted(&self, d: f64) -> Rect {
        Rect::new(self.left - d, self.top - d, self.right + d, self.bottom + d)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.contains(other.top_left()) && self.contains(other.bottom_right())
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transform
// ────────────────────────────────────────────────────────────────────────────

/// Placement of an item in the scene.
///
/// local → scene: mirror x (if flipped), rotate by `90° × rotation`, then
/// translate by `position`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Point,
    /// Quarter turns, always in `0..4`.
    pub rotation: u8,
    pub flipped: bool,
}

impl Transform {
    pub fn at(position: Point) -> Self {
        Self {
            position,
            rotation: 0,
            flipped: false,
        }
    }

    pub fn map_to_scene(&self, p: Point) -> Point {
        let p = if self.flipped { p.mirror_x() } else {
            p
        };
        p.rotate_quarters(self.rotation) + self.position
    }

    pub fn map_from_scene(&self, p: Point) -> Point {
        let p = (p - self.position).rotate_quarters((4 - self.rotation) % 4);
        if self.flipped { p.mirror_x() } else { p }
    }

    /// Map a local rectangle to its scene-space bounding rectangle.
    pub fn map_rect_to_scene(&self, rect: &Rect) -> Rect {
        Rect::bounding(rect.corners().map(|c| self.map_to_scene(c))).unwrap_or_default()
    }

    pub fn map_rect_from_scene(&self, rect: &Rect) -> Rect {
        Rect::bounding(rect.corners().map(|c| self.map_from_scene(c))).unwrap_or_default()
    }

    pub fn map_polygon_to_scene(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|&p| self.map_to_scene(p)).collect()
    }

    /// Rotate the placement 90° about `center` in scene space.
    pub fn rotate(&mut self, center: Point) {
        let d = self.position - center;
        self.position = Point::new(center.x - d.y, center.y + d.x);
        self.rotation = (self.rotation + 1) % 4;
    }

    /// Rotate the placement -90° about `center` in scene space.
    pub fn rotate_back(&mut self, center: Point) {
        let d = self.position - center;
        self.position = Point::new(center.x + d.y, center.y - d.x);
        self.rotation = (self.rotation + 3) % 4;
    }

    /// Mirror the placement about the vertical axis through `center`.
    ///
    /// Toggling `flipped` reverses the sense of the quarter-turn rotation, so
    /// the rotation count is negated to keep the result a true mirror image.
    pub fn flip_horizontal(&mut self, center: Point) {
        self.position.x = center.x - (self.position.x - center.x);
        self.flipped = !self.flipped;
        self.rotation = (4 - self.rotation) % 4;
    }

    /// Mirror about the horizontal axis through `center`: two quarter turns
    /// followed by a horizontal mirror.
    pub fn flip_vertical(&mut self, center: Point) {
        self.rotate(center);
        self.rotate(center);
        self.flip_horizontal(center);
    }

    /// Compose a child placement (expressed in this transform's local frame)
    /// into scene space.
    pub fn compose(&self, child: &Transform) -> Transform {
        let child_rotation = if self.flipped {
            (4 - child.rotation) % 4
        } else {
            child.rotation
        };
        Transform {
            position: self.map_to_scene(child.position),
            rotation: (self.rotation + child_rotation) % 4,
            flipped: self.flipped != child.flipped,
        }
    }

    /// Inverse of [`Transform::compose`]: express a scene placement in this
    /// transform's local frame.
    pub fn relative(&self, scene: &Transform) -> Transform {
        let rotation = if self.flipped {
            (self.rotation + 4 - scene.rotation) % 4
        } else {
            (scene.rotation + 4 - self.rotation) % 4
        };
        Transform {
            position: self.map_from_scene(scene.position),
            rotation,
            flipped: self.flipped != scene.flipped,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Curve and segment helpers
// ────────────────────────────────────────────────────────────────────────────

/// Shortest distance from `p` to the segment `a`–`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let ap = p - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return ap.length();
    }

    let dot = ap.x * ab.x + ap.y * ab.y;
    if dot <= 0.0 {
        // Beyond the start point
        ap.length()
    } else if dot >= len_sq {
        // Beyond the end point
        (p - b).length()
    } else {
        // Perpendicular foot lies inside the segment
        (ab.x * ap.y - ab.y * ap.x).abs() / len_sq.sqrt()
    }
}

/// Point on the cubic Bézier `p0, p1, p2, p3` at parameter `t`.
pub fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

/// Snap `requested` so the offset from `anchor` lies on a multiple of 45°.
///
/// The reach is the larger axis component of the drag; on a diagonal it is
/// scaled by √2 so both projected components equal the reach.
pub fn snap_to_45(anchor: Point, requested: Point) -> Point {
    let d = requested - anchor;
    if d.x == 0.0 && d.y == 0.0 {
        return requested;
    }

    let step = std::f64::consts::FRAC_PI_4;
    let octant = (d.angle() / step).round();
    let snapped = octant * step;
    let reach = d.x.abs().max(d.y.abs());
    let length = if (octant as i64).rem_euclid(2) == 1 {
        reach * std::f64::consts::SQRT_2
    } else {
        reach
    };
    anchor + Point::new(length * snapped.cos(), length * snapped.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_quarter_rotation_matches_screen_convention() {
        let p = Point::new(1.0, 0.0);
        assert_eq!(p.rotate_quarters(1), Point::new(-0.0, 1.0));
        assert_eq!(p.rotate_quarters(2), Point::new(-1.0, -0.0));
        assert_eq!(p.rotate_quarters(4), p);
    }

    #[test]
    fn test_rotate_about_center() {
        let mut t = Transform::at(Point::new(10.0, 0.0));
        t.rotate(Point::ZERO);
        assert!(close(t.position, Point::new(0.0, 10.0)));
        assert_eq!(t.rotation, 1);
        t.rotate_back(Point::ZERO);
        assert!(close(t.position, Point::new(10.0, 0.0)));
        assert_eq!(t.rotation, 0);
    }

    #[test]
    fn test_flip_horizontal_is_mirror_for_rotated_items() {
        let center = Point::new(5.0, 5.0);
        let mut t = Transform::at(Point::new(2.0, 3.0));
        t.rotate(center);
        let local = Point::new(4.0, 1.0);
        let before = t.map_to_scene(local);
        t.flip_horizontal(center);
        let after = t.map_to_scene(local);
        assert!(close(after, Point::new(2.0 * center.x - before.x, before.y)));
    }

    #[test]
    fn test_compose_and_relative_are_inverse() {
        let mut parent = Transform::at(Point::new(3.0, -2.0));
        parent.rotate(Point::new(1.0, 1.0));
        parent.flip_horizontal(Point::ZERO);
        let child = Transform {
            position: Point::new(7.0, 4.0),
            rotation: 3,
            flipped: false,
        };
        let scene = parent.compose(&child);
        let back = parent.relative(&scene);
        assert!(close(back.position, child.position));
        assert_eq!(back.rotation, child.rotation);
        assert_eq!(back.flipped, child.flipped);

        let local = Point::new(1.5, -2.5);
        assert!(close(
            scene.map_to_scene(local),
            parent.map_to_scene(child.map_to_scene(local))
        ));
    }

    #[test]
    fn test_distance_to_segment_cases() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(-3.0, 4.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Point::new(13.0, 4.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Point::new(5.0, -2.0), a, b), 2.0);
        assert_eq!(distance_to_segment(Point::new(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn test_cubic_endpoints() {
        let p0 = Point::new(0.0, 0.0);
        let p3 = Point::new(30.0, 0.0);
        let c1 = Point::new(10.0, 10.0);
        let c2 = Point::new(20.0, 10.0);
        assert!(close(cubic_point(p0, c1, c2, p3, 0.0), p0));
        assert!(close(cubic_point(p0, c1, c2, p3, 1.0), p3));
        assert!(close(cubic_point(p0, c1, c2, p3, 0.5), Point::new(15.0, 7.5)));
    }

    #[test]
    fn test_snap_to_45() {
        let snapped = snap_to_45(Point::ZERO, Point::new(9.0, 4.0));
        assert!(close(snapped, Point::new(9.0, 9.0)));

        let snapped = snap_to_45(Point::ZERO, Point::new(9.0, 2.0));
        assert!(close(snapped, Point::new(9.0, 0.0)));

        let snapped = snap_to_45(Point::new(1.0, 1.0), Point::new(1.0, -6.0));
        assert!(close(snapped, Point::new(1.0, -6.0)));
    }

    #[test]
    fn test_rect_bounding_and_union() {
        let r = Rect::bounding([Point::new(3.0, 1.0), Point::new(-1.0, 5.0)]).unwrap();
        assert_eq!(r, Rect::new(-1.0, 1.0, 3.0, 5.0));
        let u = r.united(&Rect::new(0.0, 0.0, 10.0, 2.0));
        assert_eq!(u, Rect::new(-1.0, 0.0, 10.0, 5.0));
        assert!(u.contains_rect(&r));
        assert!(Rect::bounding(std::iter::empty()).is_none());
    }
}
