//! Item points and their capabilities.

use crate::geometry::Point;
use crate::model::PointRef;
use serde::{Deserialize, Serialize};

/// Capabilities of an [`ItemPoint`].
///
/// `control` points take part in resizing, `connection` points can be linked
/// to points on other items, and `free` points may be repositioned by the
/// connection maintainer without changing the shape in an ambiguous way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointKind {
    pub control: bool,
    pub connection: bool,
    pub free: bool,
}

impl PointKind {
    pub const NONE: PointKind = PointKind {
        control: false,
        connection: false,
        free: false,
    };
    pub const CONTROL: PointKind = PointKind {
        control: true,
        connection: false,
        free: false,
    };
    pub const CONNECTION: PointKind = PointKind {
        control: false,
        connection: true,
        free: false,
    };
    pub const CONTROL_CONNECTION: PointKind = PointKind {
        control: true,
        connection: true,
        free: false,
    };
    pub const FREE_CONTROL_CONNECTION: PointKind = PointKind {
        control: true,
        connection: true,
        free: true,
    };
}

/// An addressable anchor of an item, in item-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPoint {
    pub position: Point,
    pub kind: PointKind,
    /// Points on other items this point is linked to. Always mirrored by the
    /// partner's own list.
    pub connections: Vec<PointRef>,
}

impl ItemPoint {
    pub fn new(position: Point, kind: PointKind) -> Self {
        Self {
            position,
            kind,
            connections: Vec::new(),
        }
    }

    pub fn is_control(&self) -> bool {
        self.kind.control
    }

    pub fn is_connection(&self) -> bool {
        self.kind.connection
    }

    pub fn is_free(&self) -> bool {
        self.kind.free
    }

    pub fn is_connected_to(&self, other: PointRef) -> bool {
        self.connections.contains(&other)
    }

    /// Record a link to `other`; duplicates are ignored.
    pub(crate) fn add_connection(&mut self, other: PointRef) {
        if !self.connections.contains(&other) {
            self.connections.push(other);
        }
    }

    pub(crate) fn remove_connection(&mut self, other: PointRef) {
        self.connections.retain(|c| *c != other);
    }
}
