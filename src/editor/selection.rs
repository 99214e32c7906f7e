//! Selection edits.
//!
//! Selection changes are recorded like any other edit so undo restores
//! what was selected when a command ran.
//!
//! # Usage
//!
//! ```rust,ignore
//! use shapebook::editor::selection::{SelectionRect, select_in_rect};
//!
//! let mut rect = SelectionRect::new(Point::new(10.0, 20.0));
//! rect.update(Point::new(100.0, 120.0));
//! select_in_rect(&mut doc, &rect);
//! ```

use crate::document::Document;
use crate::editor::command::{Action, Command};
use crate::geometry::{Point, Rect};
use crate::model::ItemId;

/// Drags shorter than this along both axes count as a click.
pub const MIN_DRAG: f64 = 3.0;

/// A rubber-band rectangle in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub start: Point,
    pub end: Point,
}

impl SelectionRect {
    pub fn new(start: Point) -> Self {
        Self { start, end: start }
    }

    pub fn update(&mut self, end: Point) {
        self.end = end;
    }

    pub fn normalized(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.normalized().contains(p)
    }

    pub fn width(&self) -> f64 {
        (self.end.x - self.start.x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.end.y - self.start.y).abs()
    }

    /// True once the pointer moved far enough to be a drag.
    pub fn is_drag(&self) -> bool {
        self.width() >= MIN_DRAG || self.height() >= MIN_DRAG
    }
}

fn set_selection(doc: &mut Document, after: Vec<ItemId>) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let before = page.selected_ids();
    if before == after {
        return false;
    }
    let action = Action::Select {
        page: page.id(),
        before,
        after,
    };
    doc.push(Command::new("Select", action));
    true
}

/// Select exactly `ids` on the current page. Unknown ids are ignored.
pub fn select_items(doc: &mut Document, ids: &[ItemId]) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let after = page.items().map(|i| i.id).filter(|id| ids.contains(id)).collect();
    set_selection(doc, after)
}

/// Click selection. Without `toggle` the topmost item under `p` becomes the
/// only selected item (or the selection is cleared on empty canvas); with
/// `toggle` that item's selection state flips and the rest is kept.
pub fn select_at(doc: &mut Document, p: Point, toggle: bool) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let hit = page.item_at(p, &doc.default_style);
    let mut after = if toggle { page.selected_ids() } else {
        Vec::new()
    };
    if let Some(id) = hit {
        if let Some(pos) = after.iter().position(|s| *s == id) {
            after.remove(pos);
        } else {
            after.push(id);
        }
    }
    select_items(doc, &after)
}

/// Select every item whose scene extent lies inside the rectangle. A
/// click-sized rectangle falls back to [`select_at`].
pub fn select_in_rect(doc: &mut Document, rect: &SelectionRect) -> bool {
    if !rect.is_drag() {
        return select_at(doc, rect.start, false);
    }
    let Some(page) = doc.current_page() else {
        return false;
    };
    let ids = page.items_in_rect(&rect.normalized(), &doc.default_style);
    set_selection(doc, ids)
}

pub fn clear_selection(doc: &mut Document) -> bool {
    set_selection(doc, Vec::new())
}

pub fn select_all(doc: &mut Document) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let ids = page.item_ids();
    set_selection(doc, ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::operations::place_items;
    use crate::model::Item;

    fn doc_with_rects() -> (Document, ItemId, ItemId) {
        let mut doc = Document::new();
        let a = doc.new_item_id();
        let b = doc.new_item_id();
        place_items(
            &mut doc,
            vec![
                Item::rect(a, Rect::new(0.0, 0.0, 10.0, 10.0)),
                Item::rect(b, Rect::new(50.0, 50.0, 60.0, 60.0)),
            ],
        );
        (doc, a, b)
    }

    #[test]
    fn test_selection_rect_geometry() {
        let mut rect = SelectionRect::new(Point::new(10.0, 20.0));
        rect.update(Point::new(4.0, 22.0));
        assert_eq!(rect.normalized(), Rect::new(4.0, 20.0, 10.0, 22.0));
        assert!(rect.contains(Point::new(5.0, 21.0)));
        assert!(rect.is_drag());
        rect.update(Point::new(11.0, 21.0));
        assert!(!rect.is_drag());
    }

    #[test]
    fn test_click_and_toggle() {
        let (mut doc, a, b) = doc_with_rects();
        assert!(select_at(&mut doc, Point::new(5.0, 5.0), false));
        assert_eq!(doc.current_page().unwrap().selected_ids(), vec![a]);
        assert!(select_at(&mut doc, Point::new(55.0, 55.0), true));
        assert_eq!(doc.current_page().unwrap().selected_ids(), vec![a, b]);
        assert!(select_at(&mut doc, Point::new(5.0, 5.0), true));
        assert_eq!(doc.current_page().unwrap().selected_ids(), vec![b]);
        assert!(select_at(&mut doc, Point::new(30.0, 30.0), false));
        assert!(doc.current_page().unwrap().selected_ids().is_empty());
    }

    #[test]
    fn test_rubber_band_and_undo() {
        let (mut doc, a, _) = doc_with_rects();
        clear_selection(&mut doc);
        let mut rect = SelectionRect::new(Point::new(-5.0, -5.0));
        rect.update(Point::new(20.0, 20.0));
        assert!(select_in_rect(&mut doc, &rect));
        assert_eq!(doc.current_page().unwrap().selected_ids(), vec![a]);
        doc.undo();
        assert!(doc.current_page().unwrap().selected_ids().is_empty());
    }
}
