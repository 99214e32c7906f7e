//! Diagram model: items, their points and styles.
//!
//! Items live in page-owned containers and are addressed by [`ItemId`]; a
//! point is addressed by a [`PointRef`] (item id + point index) rather than
//! by reference, so connections never form ownership cycles.

pub mod group;
pub mod item;
pub mod point;
pub mod shapes;
pub mod style;

pub use item::{Item, ItemKind};
pub use point::{ItemPoint, PointKind};
pub use style::{Alignment, ArrowStyle, Color, PenStyle, PropertyValue, Style, StyleView};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an item, unique within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Identifier of a page, unique within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub u64);

/// Address of one point of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointRef {
    pub item: ItemId,
    pub index: usize,
}

impl PointRef {
    pub const fn new(item: ItemId, index: usize) -> Self {
        Self { item, index }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for PointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.item, self.index)
    }
}
