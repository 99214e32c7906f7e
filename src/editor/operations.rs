//! Editing operations.
//!
//! Each operation builds exactly one [`Command`] (composite where side
//! effects are involved) and pushes it onto the document's history. An
//! operation whose preconditions do not hold (unknown items, nothing to
//! change) pushes nothing and returns `false`.
//!
//! Operations act on the current page.

use crate::document::{Document, Page, Units, properties};
use crate::editor::command::{Action, Command, Simulation, TransformChange, TransformKind};
use crate::editor::constraints::{
    connect_new_items, connect_points, disconnect, external_connections, maintain_connections,
};
use crate::geometry::{Point, Rect};
use crate::model::{Item, ItemId, ItemKind, ItemPoint, PageId, PointRef, PropertyValue};
use tracing::debug;

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Ids from `ids` present on the page, in paint order.
fn in_paint_order(page: &Page, ids: &[ItemId]) -> Vec<ItemId> {
    page.items().map(|i| i.id).filter(|id| ids.contains(id)).collect()
}

/// Ids from `ids` present on the page, in the caller's order.
fn present(page: &Page, ids: &[ItemId]) -> Vec<ItemId> {
    ids.iter().copied().filter(|id| page.item(*id).is_some()).collect()
}

fn select_command(page: &Page, after: Vec<ItemId>) -> Option<Command> {
    let before = page.selected_ids();
    (before != after).then(|| {
        let action = Action::Select {
            page: page.id(),
            before,
            after,
        };
        Command::new("Select", action)
    })
}

/// Build the removal of `ids`: cut external connections, deselect, remove.
/// Also returns the removed items as they were taken off the page.
fn build_removal(
    doc: &mut Document,
    page_id: PageId,
    ids: &[ItemId],
    text: &str,
) -> Option<(Command, Vec<Item>)> {
    let page = doc.page_by_id(page_id)?;
    let ordered = in_paint_order(page, ids);
    if ordered.is_empty() {
        return None;
    }
    let cuts = external_connections(page, &ordered);

    let mut sim = Simulation::begin(doc, Command::composite(text));
    for (inside, outside) in cuts {
        sim.apply_child(disconnect(page_id, inside, outside));
    }
    let page = sim.doc().page_by_id(page_id)?;
    let remaining: Vec<ItemId> = page
        .selected_ids()
        .into_iter()
        .filter(|id| !ordered.contains(id))
        .collect();
    if let Some(deselect) = select_command(page, remaining) {
        sim.apply_child(deselect);
    }
    let page = sim.doc().page_by_id(page_id)?;
    let items: Vec<(usize, Item)> = ordered
        .iter()
        .filter_map(|&id| Some((page.index_of(id)?, page.item(id)?.clone())))
        .collect();
    let removed = items.iter().map(|(_, item)| item.clone()).collect();
    sim.apply_child(Command::new(text, Action::RemoveItems { page: page_id, items }));
    Some((sim.finish(), removed))
}

/// Center of the union of the items' scene geometry, on the grid when
/// grid snapping is on.
fn transform_center(doc: &Document, page: &Page, ids: &[ItemId]) -> Point {
    let bounds = ids
        .iter()
        .filter_map(|&id| page.item(id))
        .map(|item| item.transform.map_rect_to_scene(&item.geometry_rect(&doc.default_style)))
        .reduce(|a, b| a.united(&b))
        .unwrap_or_default();
    doc.snap_to_grid(bounds.center())
}

// ────────────────────────────────────────────────────────────────────────────
// Placement and removal
// ────────────────────────────────────────────────────────────────────────────

/// Add new items on top of the current page and select them. Invalid items
/// are skipped; the new items are linked to coincident points on the page.
pub fn place_items(doc: &mut Document, items: Vec<Item>) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let page_id = page.id();
    let start = page.len();
    let items: Vec<Item> = items
        .into_iter()
        .filter(|item| item.is_valid(&doc.default_style))
        .map(|mut item| {
            item.selected = false;
            item
        })
        .collect();
    if items.is_empty() {
        return false;
    }
    for item in &items {
        doc.reserve_id(item.id.0);
    }
    let ids: Vec<ItemId> = items.iter().map(|i| i.id).collect();
    let indexed = items.into_iter().enumerate().map(|(i, item)| (start + i, item)).collect();
    place(doc, page_id, indexed, &ids, "Place")
}

/// Shared tail of placement and paste.
pub(crate) fn place(
    doc: &mut Document,
    page: PageId,
    mut items: Vec<(usize, Item)>,
    ids: &[ItemId],
    text: &str,
) -> bool {
    for (_, item) in &mut items {
        item.update_group_points(&doc.default_style);
    }
    let mut sim = Simulation::begin(doc, Command::new(text, Action::AddItems { page, items }));
    connect_new_items(&mut sim, page, ids);
    if let Some(select) = sim
        .doc()
        .page_by_id(page)
        .and_then(|p| select_command(p, ids.to_vec()))
    {
        sim.apply_child(select);
    }
    let command = sim.finish();
    doc.push(command);
    true
}

/// Delete items, cutting their connections to items that stay.
pub fn remove_items(doc: &mut Document, ids: &[ItemId]) -> bool {
    let Some(page) = doc.current_page_id() else {
        return false;
    };
    match build_removal(doc, page, ids, "Delete") {
        Some((command, _)) => {
            doc.push(command);
            true
        }
        None => false,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

/// Move items by `delta`. Non-final steps of one drag merge into a single
/// history entry; the final step also links moved points to coincident
/// points on other items.
pub fn move_items(doc: &mut Document, ids: &[ItemId], delta: Point, is_final: bool) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let page_id = page.id();
    let ids = present(page, ids);
    let changes: Vec<TransformChange> = ids
        .iter()
        .filter_map(|&id| page.item(id))
        .map(|item| {
            let mut after = item.transform;
            after.position += delta;
            TransformChange {
                item: item.id,
                before: item.transform,
                after,
            }
        })
        .collect();
    if changes.is_empty() {
        return false;
    }
    let points: Vec<PointRef> = ids
        .iter()
        .filter_map(|&id| page.item(id))
        .flat_map(|item| (0..item.points.len()).map(move |i| PointRef::new(item.id, i)))
        .collect();

    let action = Action::Transform {
        page: page_id,
        kind: TransformKind::Move,
        changes,
    };
    let mut sim = Simulation::begin(doc, Command::new("Move", action).with_final(is_final));
    maintain_connections(&mut sim, page_id, &ids);
    if is_final {
        connect_points(&mut sim, page_id, &points, &ids);
    }
    let command = sim.finish();
    doc.push(command);
    true
}

/// Drag point `index` of `item` to the scene position `to`.
pub fn resize_point(
    doc: &mut Document,
    item: ItemId,
    index: usize,
    to: Point,
    is_final: bool,
) -> bool {
    resize_points(doc, item, &[(index, to)], is_final)
}

/// Drag two points of one item at once, as when a new shape is spanned
/// between two positions.
pub fn resize_two_points(
    doc: &mut Document,
    item: ItemId,
    first: (usize, Point),
    second: (usize, Point),
    is_final: bool,
) -> bool {
    resize_points(doc, item, &[first, second], is_final)
}

fn resize_points(doc: &mut Document, id: ItemId, moves: &[(usize, Point)], is_final: bool) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let page_id = page.id();
    let Some(item) = page.item(id) else {
        return false;
    };
    if moves
        .iter()
        .any(|&(index, _)| !item.points.get(index).is_some_and(|p| p.is_control()))
    {
        return false;
    }
    let mut resized = item.clone();
    let last = moves.len() - 1;
    for (n, &(index, to)) in moves.iter().enumerate() {
        let local = item.map_from_scene(doc.snap_to_grid(to));
        // Only the last dragged point snaps to 45°; earlier ones are its anchor.
        resized.resize_point(index, local, doc.settings.angle_snap && n == last);
    }
    let before = item.positions();
    let after = resized.positions();
    let points: Vec<usize> = moves.iter().map(|&(index, _)| index).collect();
    let refs: Vec<PointRef> = points.iter().map(|&i| PointRef::new(id, i)).collect();

    let action = Action::Resize {
        page: page_id,
        item: id,
        points,
        before,
        after,
    };
    let mut sim = Simulation::begin(doc, Command::new("Resize", action).with_final(is_final));
    maintain_connections(&mut sim, page_id, &[id]);
    if is_final {
        connect_points(&mut sim, page_id, &refs, &[id]);
    }
    let command = sim.finish();
    doc.push(command);
    true
}

fn transform_items(doc: &mut Document, ids: &[ItemId], kind: TransformKind, text: &str) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let page_id = page.id();
    let ids = present(page, ids);
    if ids.is_empty() {
        return false;
    }
    let center = transform_center(doc, page, &ids);
    let changes = ids
        .iter()
        .filter_map(|&id| page.item(id))
        .map(|item| {
            let mut after = item.transform;
            match kind {
                TransformKind::Move => {}
                TransformKind::Rotate => after.rotate(center),
                TransformKind::RotateBack => after.rotate_back(center),
                TransformKind::FlipHorizontal => after.flip_horizontal(center),
                TransformKind::FlipVertical => after.flip_vertical(center),
            }
            TransformChange {
                item: item.id,
                before: item.transform,
                after,
            }
        })
        .collect();

    let action = Action::Transform {
        page: page_id,
        kind,
        changes,
    };
    let mut sim = Simulation::begin(doc, Command::new(text, action));
    maintain_connections(&mut sim, page_id, &ids);
    let command = sim.finish();
    doc.push(command);
    true
}

/// Rotate items 90° about the center of their combined extent.
pub fn rotate_items(doc: &mut Document, ids: &[ItemId]) -> bool {
    transform_items(doc, ids, TransformKind::Rotate, "Rotate")
}

pub fn rotate_back_items(doc: &mut Document, ids: &[ItemId]) -> bool {
    transform_items(doc, ids, TransformKind::RotateBack, "Rotate back")
}

pub fn flip_horizontal(doc: &mut Document, ids: &[ItemId]) -> bool {
    transform_items(doc, ids, TransformKind::FlipHorizontal, "Flip horizontal")
}

pub fn flip_vertical(doc: &mut Document, ids: &[ItemId]) -> bool {
    transform_items(doc, ids, TransformKind::FlipVertical, "Flip vertical")
}

// ────────────────────────────────────────────────────────────────────────────
// Z-order
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reorder {
    /// One step up, past the next item that is not moved.
    Forward,
    Backward,
    /// To the top of the page.
    Front,
    Back,
}

/// New paint order with `ids` moved as requested.
pub fn reordered(order: &[ItemId], ids: &[ItemId], how: Reorder) -> Vec<ItemId> {
    let moved = |id: &ItemId| ids.contains(id);
    let mut order = order.to_vec();
    match how {
        Reorder::Front => {
            let (sel, rest): (Vec<ItemId>, Vec<ItemId>) = order.iter().partition(|id| moved(id));
            order = rest.into_iter().chain(sel).collect();
        }
        Reorder::Back => {
            let (sel, rest): (Vec<ItemId>, Vec<ItemId>) = order.iter().partition(|id| moved(id));
            order = sel.into_iter().chain(rest).collect();
        }
        Reorder::Forward => {
            for i in (0..order.len().saturating_sub(1)).rev() {
                if moved(&order[i]) && !moved(&order[i + 1]) {
                    order.swap(i, i + 1);
                }
            }
        }
        Reorder::Backward => {
            for i in 1..order.len() {
                if moved(&order[i]) && !moved(&order[i - 1]) {
                    order.swap(i, i - 1);
                }
            }
        }
    }
    order
}

pub fn reorder_items(doc: &mut Document, ids: &[ItemId], how: Reorder) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let before = page.item_ids();
    let after = reordered(&before, ids, how);
    if before == after {
        return false;
    }
    let action = Action::Reorder {
        page: page.id(),
        before,
        after,
    };
    doc.push(Command::new("Reorder", action));
    true
}

// ────────────────────────────────────────────────────────────────────────────
// Grouping
// ────────────────────────────────────────────────────────────────────────────

/// Replace two or more items with one group placed at the position of the
/// last item in `ids`. The group takes the paint slot of the topmost item.
pub fn group_items(doc: &mut Document, ids: &[ItemId]) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let page_id = page.id();
    let ordered = in_paint_order(page, ids);
    if ordered.len() < 2 {
        return false;
    }
    let anchor = present(page, ids).last().and_then(|&id| page.item(id)).map(|i| i.position());
    let Some(anchor) = anchor else { return false };
    let top = ordered.iter().filter_map(|&id| page.index_of(id)).max().unwrap_or(0);
    let index = top + 1 - ordered.len();

    let group_id = doc.new_item_id();
    let Some((removal, removed)) = build_removal(doc, page_id, &ordered, "Group") else {
        return false;
    };
    let group = Item::group_at(group_id, anchor, removed, &doc.default_style);
    debug!(group = %group_id, children = ordered.len(), "group items");

    let mut sim = Simulation::begin(doc, Command::composite("Group"));
    sim.apply_child(removal);
    sim.apply_child(Command::new(
        "Group",
        Action::AddItems {
            page: page_id,
            items: vec![(index, group)],
        },
    ));
    if let Some(select) = sim
        .doc()
        .page_by_id(page_id)
        .and_then(|p| select_command(p, vec![group_id]))
    {
        sim.apply_child(select);
    }
    let command = sim.finish();
    doc.push(command);
    true
}

/// Dissolve groups, putting their children back on the page in the
/// groups' paint slots with the group transform composed in.
pub fn ungroup_items(doc: &mut Document, ids: &[ItemId]) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let page_id = page.id();
    let groups: Vec<(usize, ItemId)> = in_paint_order(page, ids)
        .into_iter()
        .filter(|&id| page.item(id).is_some_and(|i| matches!(i.kind, ItemKind::Group { .. })))
        .filter_map(|id| Some((page.index_of(id)?, id)))
        .collect();
    if groups.is_empty() {
        return false;
    }
    let group_ids: Vec<ItemId> = groups.iter().map(|(_, id)| *id).collect();
    let Some((removal, removed)) = build_removal(doc, page_id, &group_ids, "Ungroup") else {
        return false;
    };

    let mut items = Vec::new();
    let mut offset = 0;
    for (k, ((index, _), group)) in groups.iter().zip(&removed).enumerate() {
        let base = index - k + offset;
        let children = group.ungrouped();
        offset += children.len();
        items.extend(children.into_iter().enumerate().map(|(j, child)| (base + j, child)));
    }
    let children: Vec<ItemId> = items.iter().map(|(_, item)| item.id).collect();

    let mut sim = Simulation::begin(doc, Command::composite("Ungroup"));
    sim.apply_child(removal);
    sim.apply_child(Command::new("Ungroup", Action::AddItems { page: page_id, items }));
    if let Some(select) = sim
        .doc()
        .page_by_id(page_id)
        .and_then(|p| select_command(p, children))
    {
        sim.apply_child(select);
    }
    let command = sim.finish();
    doc.push(command);
    true
}

// ────────────────────────────────────────────────────────────────────────────
// Point editing
// ────────────────────────────────────────────────────────────────────────────

/// Insert a vertex into a polygon or polyline after the start of the edge
/// closest to the scene position `at`.
pub fn insert_point(doc: &mut Document, item: ItemId, at: Point) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let Some(target) = page.item(item) else {
        return false;
    };
    let local = target.map_from_scene(doc.snap_to_grid(at));
    let Some(index) = target.insertion_index(local) else {
        return false;
    };
    let action = Action::InsertPoint {
        page: page.id(),
        item,
        index,
        point: ItemPoint::new(local, target.inserted_point_kind(index)),
    };
    doc.push(Command::new("Insert point", action));
    true
}

/// Remove the vertex nearest to the scene position `at`, if the shape's
/// point floor allows it. The vertex's connections are cut first.
pub fn remove_point(doc: &mut Document, item: ItemId, at: Point) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    let page_id = page.id();
    let Some(target) = page.item(item) else {
        return false;
    };
    let Some(index) = target.removable_point(target.map_from_scene(at)) else {
        return false;
    };
    let here = PointRef::new(item, index);
    let links = target.points[index].connections.clone();

    let mut sim = Simulation::begin(doc, Command::composite("Remove point"));
    for remote in links {
        sim.apply_child(disconnect(page_id, here, remote));
    }
    let Some(point) = sim.doc().page_by_id(page_id).and_then(|p| p.point(here)).cloned() else {
        return false;
    };
    sim.apply_child(Command::new(
        "Remove point",
        Action::RemovePoint {
            page: page_id,
            item,
            index,
            point,
        },
    ));
    let command = sim.finish();
    doc.push(command);
    true
}

// ────────────────────────────────────────────────────────────────────────────
// Properties and pages
// ────────────────────────────────────────────────────────────────────────────

/// Override a style property on every item in `ids` that supports it.
pub fn set_item_property(
    doc: &mut Document,
    ids: &[ItemId],
    name: &str,
    value: PropertyValue,
) -> bool {
    let Some(page) = doc.current_page() else {
        return false;
    };
    if doc.default_style.get(name).is_some_and(|d| !d.same_type(&value)) {
        return false;
    }
    let children: Vec<Command> = ids
        .iter()
        .filter_map(|&id| page.item(id))
        .filter(|item| item.supports_property(name) && item.properties.get(name) != Some(&value))
        .map(|item| {
            Command::new(
                "Set property",
                Action::SetItemProperty {
                    page: page.id(),
                    item: item.id,
                    name: name.to_string(),
                    before: item.properties.get(name).cloned(),
                    after: Some(value.clone()),
                },
            )
        })
        .collect();
    if children.is_empty() {
        return false;
    }
    doc.push(Command::composite(format!("Set {name}")).with_children(children));
    true
}

/// Change a document setting or default style property. A units change
/// goes through [`change_units`] so lengths keep their physical size.
pub fn set_document_property(doc: &mut Document, name: &str, value: PropertyValue) -> bool {
    let Some(before) = doc.property(name) else {
        return false;
    };
    if !before.same_type(&value) || before == value {
        return false;
    }
    if name == properties::UNITS {
        return match &value {
            PropertyValue::Text(t) => Units::parse(t).is_some_and(|units| change_units(doc, units)),
            _ => false,
        };
    }
    let mut probe = doc.settings.clone();
    if doc.settings.property(name).is_some() && !probe.set_property(name, &value) {
        return false;
    }
    let action = Action::SetDocumentProperty {
        name: name.to_string(),
        before,
        after: value,
    };
    doc.push(Command::new(format!("Set {name}"), action));
    true
}

/// Switch units, scaling every length in the document so the drawing keeps
/// its physical size.
pub fn change_units(doc: &mut Document, units: Units) -> bool {
    if doc.settings.units == units {
        return false;
    }
    let factor = doc.settings.units.millimeters() / units.millimeters();
    let before = Box::new(doc.settings.clone());
    let after = Box::new(doc.settings.converted(units));
    let children = doc
        .pages()
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| {
            let before: Vec<Item> = p.items().cloned().collect();
            let after = before
                .iter()
                .cloned()
                .map(|mut item| {
                    item.scale(factor);
                    item.update_group_points(&doc.default_style);
                    item
                })
                .collect();
            Command::new(
                "Scale",
                Action::Replace {
                    page: p.id(),
                    before,
                    after,
                },
            )
        })
        .collect();
    let command = Command::new("Change units", Action::Settings { before, after });
    doc.push(command.with_children(children));
    true
}

pub fn rename_page(doc: &mut Document, index: usize, name: &str) -> bool {
    let Some(page) = doc.page(index) else {
        return false;
    };
    if page.name == name {
        return false;
    }
    let action = Action::RenamePage {
        page: page.id(),
        before: page.name.clone(),
        after: name.to_string(),
    };
    doc.push(Command::new("Rename page", action));
    true
}

/// Insert a new empty page at `index` (clamped to the end).
pub fn insert_page(doc: &mut Document, index: usize, name: &str) -> PageId {
    let id = doc.new_page_id();
    let index = index.min(doc.pages().len());
    let page = Box::new(Page::new(id, name));
    doc.push(Command::new("Insert page", Action::AddPage { index, page }));
    id
}

pub fn add_page(doc: &mut Document, name: &str) -> PageId {
    let index = doc.pages().len();
    insert_page(doc, index, name)
}

/// Remove a page with its items. The last page cannot be removed.
pub fn remove_page(doc: &mut Document, index: usize) -> bool {
    if doc.pages().len() < 2 {
        return false;
    }
    let Some(page) = doc.page(index) else {
        return false;
    };
    let page = Box::new(page.clone());
    doc.push(Command::new("Remove page", Action::RemovePage { index, page }));
    true
}

/// Scene rectangle of the selection on the current page, if any.
pub fn selection_bounds(doc: &Document) -> Option<Rect> {
    let page = doc.current_page()?;
    page.items()
        .filter(|i| i.selected)
        .map(|i| i.scene_bounding_rect(&doc.default_style))
        .reduce(|a, b| a.united(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().map(|&i| ItemId(i)).collect()
    }

    #[test]
    fn test_reordered() {
        let order = ids(&[1, 2, 3, 4]);
        assert_eq!(reordered(&order, &ids(&[1, 2]), Reorder::Forward), ids(&[3, 1, 2, 4]));
        assert_eq!(reordered(&order, &ids(&[3]), Reorder::Backward), ids(&[1, 3, 2, 4]));
        assert_eq!(reordered(&order, &ids(&[1, 3]), Reorder::Front), ids(&[2, 4, 1, 3]));
        assert_eq!(reordered(&order, &ids(&[2, 4]), Reorder::Back), ids(&[2, 4, 1, 3]));
        assert_eq!(reordered(&order, &ids(&[4]), Reorder::Forward), order);
    }

    #[test]
    fn test_place_skips_invalid_items() {
        let mut doc = Document::new();
        let id = doc.new_item_id();
        let degenerate = Item::line(id, Point::ZERO, Point::ZERO);
        assert!(!place_items(&mut doc, vec![degenerate]));
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_set_item_property_and_undo() {
        let mut doc = Document::new();
        let id = doc.new_item_id();
        place_items(&mut doc, vec![Item::line(id, Point::ZERO, Point::new(10.0, 0.0))]);
        assert!(set_item_property(&mut doc, &[id], "pen-width", PropertyValue::Number(2.0)));
        assert!(!set_item_property(&mut doc, &[id], "pen-width", PropertyValue::Bool(true)));
        let black = PropertyValue::Color(crate::model::Color::BLACK);
        assert!(!set_item_property(&mut doc, &[id], "brush-color", black));
        let page = doc.current_page().unwrap();
        assert_eq!(
            page.item(id).unwrap().properties.get("pen-width"),
            Some(&PropertyValue::Number(2.0))
        );
        doc.undo();
        let page = doc.current_page().unwrap();
        assert!(page.item(id).unwrap().properties.get("pen-width").is_none());
    }

    #[test]
    fn test_change_units_scales_geometry() {
        let mut doc = Document::new();
        let id = doc.new_item_id();
        place_items(
            &mut doc,
            vec![Item::line(id, Point::ZERO, Point::new(25.4, 0.0)).at(Point::new(254.0, 0.0))],
        );
        assert!(change_units(&mut doc, Units::Inches));
        let item = doc.current_page().unwrap().item(id).unwrap();
        assert!((item.position().x - 10.0).abs() < 1e-9);
        assert!((item.points[1].position.x - 1.0).abs() < 1e-9);
        assert!((doc.settings.page_width - 210.0 / 25.4).abs() < 1e-9);
        doc.undo();
        assert_eq!(doc.settings.units, Units::Millimeters);
        let item = doc.current_page().unwrap().item(id).unwrap();
        assert_eq!(item.position(), Point::new(254.0, 0.0));
    }

    #[test]
    fn test_units_property_rescales_like_change_units() {
        let mut doc = Document::new();
        let id = doc.new_item_id();
        place_items(&mut doc, vec![Item::line(id, Point::ZERO, Point::new(25.4, 0.0))]);
        assert!(!set_document_property(&mut doc, "units", PropertyValue::Text("furlong".into())));
        assert!(set_document_property(&mut doc, "units", PropertyValue::Text("in".into())));
        assert_eq!(doc.settings.units, Units::Inches);
        assert!((doc.settings.page_width - 210.0 / 25.4).abs() < 1e-9);
        let item = doc.current_page().unwrap().item(id).unwrap();
        assert!((item.points[1].position.x - 1.0).abs() < 1e-9);
        doc.undo();
        assert_eq!(doc.settings.units, Units::Millimeters);
        let item = doc.current_page().unwrap().item(id).unwrap();
        assert_eq!(item.points[1].position, Point::new(25.4, 0.0));
    }

    #[test]
    fn test_group_points_follow_default_pen() {
        let mut doc = Document::new();
        let a = doc.new_item_id();
        let b = doc.new_item_id();
        place_items(&mut doc, vec![Item::line(a, Point::ZERO, Point::new(10.0, 0.0))]);
        place_items(&mut doc, vec![Item::line(b, Point::new(0.0, 20.0), Point::new(10.0, 20.0))]);
        assert!(group_items(&mut doc, &[a, b]));
        let group_id = doc.current_page().unwrap().item_ids()[0];
        let corner = |doc: &Document| {
            doc.current_page().unwrap().item(group_id).unwrap().points[0].position
        };
        assert_eq!(corner(&doc), Point::new(-0.25, -0.25));

        assert!(set_document_property(&mut doc, "pen-width", PropertyValue::Number(2.0)));
        assert_eq!(corner(&doc), Point::new(-1.0, -1.0));
        doc.undo();
        assert_eq!(corner(&doc), Point::new(-0.25, -0.25));
        doc.redo();
        assert_eq!(corner(&doc), Point::new(-1.0, -1.0));
    }

    #[test]
    fn test_change_units_recomputes_group_points() {
        let mut doc = Document::new();
        let a = doc.new_item_id();
        let b = doc.new_item_id();
        place_items(&mut doc, vec![Item::line(a, Point::ZERO, Point::new(25.4, 0.0))]);
        place_items(&mut doc, vec![Item::line(b, Point::new(0.0, 25.4), Point::new(25.4, 25.4))]);
        assert!(group_items(&mut doc, &[a, b]));
        assert!(change_units(&mut doc, Units::Inches));
        let group = doc.current_page().unwrap().items().next().unwrap().clone();
        let mut fresh = group.clone();
        fresh.update_group_points(&doc.default_style);
        assert_eq!(group.points, fresh.points);
        // Pen width stays 0.5 in the new units.
        assert!((group.points[0].position.x + 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_group_ignores_repeated_ids() {
        let mut doc = Document::new();
        let ids: Vec<ItemId> = (0..3).map(|_| doc.new_item_id()).collect();
        for (i, &id) in ids.iter().enumerate() {
            let y = 20.0 * i as f64;
            place_items(&mut doc, vec![Item::line(id, Point::new(0.0, y), Point::new(10.0, y))]);
        }
        assert!(group_items(&mut doc, &[ids[0], ids[1], ids[0]]));
        let page = doc.current_page().unwrap();
        assert_eq!(page.len(), 2);
        let group = page.items().next().unwrap();
        assert_eq!(group.children().len(), 2);
        assert_eq!(page.item_ids()[1], ids[2]);
    }

    #[test]
    fn test_page_commands() {
        let mut doc = Document::new();
        let id = add_page(&mut doc, "Second");
        assert_eq!(doc.pages().len(), 2);
        assert_eq!(doc.page(1).map(|p| p.id()), Some(id));
        assert!(rename_page(&mut doc, 1, "Renamed"));
        assert!(remove_page(&mut doc, 0));
        assert_eq!(doc.pages()[0].name, "Renamed");
        assert!(!remove_page(&mut doc, 0));
        doc.undo();
        doc.undo();
        doc.undo();
        assert_eq!(doc.pages().len(), 1);
        assert_eq!(doc.pages()[0].name, "Page 1");
    }
}
