//! Editing core for paged 2D vector diagrams.
//!
//! A [`Document`] holds pages of shape items (lines, curves, polylines,
//! polygons, rectangles, ellipses, text and groups). Points of different
//! items can be connected; connections are kept intact as items move.
//! Every edit goes through [`editor::operations`] and lands on a bounded
//! undo history.
//!
//! The binary `shapebook` creates, inspects, exports and checks document
//! files.

pub mod clipboard;
pub mod document;
pub mod editor;
pub mod format;
pub mod geometry;
pub mod model;
pub mod path;
pub mod render;

pub use document::{Document, DocumentEvent, DocumentSettings, Mode, Page, Units};
pub use geometry::{Point, Rect, Transform};
pub use model::{Item, ItemId, ItemKind, PageId, PointRef, PropertyValue, Style};
