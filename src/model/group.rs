//! Group aggregation.
//!
//! A group owns its children in its own local frame. Its eight display
//! points track the union of the children's bounding rectangles and are
//! recomputed whenever the children change; they are never set directly.

use crate::geometry::{Point, Rect, Transform};
use crate::model::item::{Item, ItemKind};
use crate::model::shapes::rect_handles;
use crate::model::style::Style;
use crate::model::{ItemId, PointRef};

impl Item {
    /// Build a group from scene-placed `items`.
    ///
    /// The group is positioned at the last item's position and each child's
    /// placement is re-expressed relative to it.
    pub fn group(id: ItemId, items: Vec<Item>, defaults: &Style) -> Item {
        let position = items.last().map(|i| i.position()).unwrap_or_default();
        Item::group_at(id, position, items, defaults)
    }

    /// Build a group placed at `position`, keeping `items` in paint order.
    pub fn group_at(id: ItemId, position: Point, items: Vec<Item>, defaults: &Style) -> Item {
        let frame = Transform::at(position);
        let children = items
            .into_iter()
            .map(|mut child| {
                child.transform = frame.relative(&child.transform);
                child.selected = false;
                child
            })
            .collect();
        let handles = rect_handles(&Rect::default());
        let mut group = Item::new(id, ItemKind::Group { children }, &handles).at(position);
        group.update_group_points(defaults);
        group
    }

    pub fn children(&self) -> &[Item] {
        match &self.kind {
            ItemKind::Group { children } => children,
            _ => &[],
        }
    }

    /// Children placed back in scene space, with the group's transform
    /// composed into each child's own.
    pub fn ungrouped(&self) -> Vec<Item> {
        self.children()
            .iter()
            .map(|child| {
                let mut child = child.clone();
                child.transform = self.transform.compose(&child.transform);
                child
            })
            .collect()
    }

    /// Recompute the display points from the children's extents, nested
    /// groups first.
    pub fn update_group_points(&mut self, defaults: &Style) {
        let ItemKind::Group { children } = &mut self.kind else {
            return;
        };
        for child in children.iter_mut() {
            child.update_group_points(defaults);
        }
        let bounds = children
            .iter()
            .map(|c| c.transform.map_rect_to_scene(&c.bounding_rect(defaults)))
            .reduce(|a, b| a.united(&b))
            .unwrap_or_default();
        self.set_positions(&rect_handles(&bounds));
    }

    /// Give this item and every nested child a fresh id from `next_id`,
    /// rewriting connections between items that were renumbered together.
    /// Returns the `(old, new)` pairs of the top-level item.
    pub fn reassign_ids(
        items: &mut [Item],
        next_id: &mut impl FnMut() -> ItemId,
    ) -> Vec<(ItemId, ItemId)> {
        let mapping: Vec<(ItemId, ItemId)> =
            items.iter().map(|item| (item.id, next_id())).collect();
        for (item, (_, new)) in items.iter_mut().zip(&mapping) {
            item.id = *new;
            if let ItemKind::Group { children } = &mut item.kind {
                Item::reassign_ids(children, &mut *next_id);
            }
        }
        let remap = |r: PointRef| {
            mapping
                .iter()
                .find(|(old, _)| *old == r.item)
                .map(|(_, new)| PointRef::new(*new, r.index))
        };
        for item in items.iter_mut() {
            for point in &mut item.points {
                point.connections = point.connections.iter().filter_map(|&r| remap(r)).collect();
            }
        }
        mapping
    }
}
