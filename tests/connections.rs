use shapebook::editor::operations::{
    move_items, place_items, remove_items, resize_point, resize_two_points, rotate_items,
};
use shapebook::editor::{Action, Command};
use shapebook::{Document, Item, ItemId, Point, PointRef, Rect};

fn place(doc: &mut Document, item: impl FnOnce(ItemId) -> Item) -> ItemId {
    let id = doc.new_item_id();
    assert!(place_items(doc, vec![item(id)]));
    id
}

fn count_children(command: &Command, pred: fn(&Action) -> bool) -> usize {
    command
        .children()
        .iter()
        .map(|c| usize::from(pred(c.action())) + count_children(c, pred))
        .sum()
}

fn assert_symmetric(doc: &Document) {
    let problems = doc.check_connections();
    assert!(problems.is_empty(), "{problems:?}");
}

#[test]
fn connect_two_lines_then_follow() {
    let mut doc = Document::new();
    let a = place(&mut doc, |id| Item::line(id, Point::ZERO, Point::new(10.0, 0.0)));
    let b = place(&mut doc, |id| Item::line(id, Point::new(10.0, 0.0), Point::new(10.0, 10.0)));

    let add_b = doc.history().last().unwrap();
    assert_eq!(count_children(add_b, |a| matches!(a, Action::Connect { .. })), 1);
    let page = doc.current_page().unwrap();
    assert!(page.is_connected(PointRef::new(a, 1), PointRef::new(b, 0)));
    assert_symmetric(&doc);

    assert!(resize_point(&mut doc, a, 1, Point::new(15.0, 0.0), true));
    let drag = doc.history().last().unwrap();
    assert_eq!(count_children(drag, |a| matches!(a, Action::Resize { .. })), 1);
    assert_eq!(count_children(drag, |a| matches!(a, Action::Disconnect { .. })), 0);

    let page = doc.current_page().unwrap();
    assert_eq!(page.scene_point(PointRef::new(b, 0)), Some(Point::new(15.0, 0.0)));
    assert_eq!(page.scene_point(PointRef::new(b, 1)), Some(Point::new(10.0, 10.0)));
    assert!(page.is_connected(PointRef::new(a, 1), PointRef::new(b, 0)));
    assert_symmetric(&doc);

    doc.undo();
    let page = doc.current_page().unwrap();
    assert_eq!(page.scene_point(PointRef::new(b, 0)), Some(Point::new(10.0, 0.0)));
    assert!(page.is_connected(PointRef::new(a, 1), PointRef::new(b, 0)));
}

#[test]
fn moving_away_from_fixed_point_disconnects() {
    let mut doc = Document::new();
    let rect = place(&mut doc, |id| Item::rect(id, Rect::new(0.0, 0.0, 20.0, 20.0)));
    let line = place(&mut doc, |id| Item::line(id, Point::new(-20.0, 0.0), Point::ZERO));
    let page = doc.current_page().unwrap();
    assert!(page.is_connected(PointRef::new(line, 1), PointRef::new(rect, 0)));

    assert!(move_items(&mut doc, &[line], Point::new(0.0, 50.0), true));
    let moved = doc.history().last().unwrap();
    assert_eq!(count_children(moved, |a| matches!(a, Action::Disconnect { .. })), 1);
    assert_eq!(count_children(moved, |a| matches!(a, Action::Resize { .. })), 0);
    let page = doc.current_page().unwrap();
    assert!(!page.is_connected(PointRef::new(line, 1), PointRef::new(rect, 0)));
    assert_symmetric(&doc);
}

#[test]
fn moving_fixed_item_drags_free_partner() {
    let mut doc = Document::new();
    let rect = place(&mut doc, |id| Item::rect(id, Rect::new(0.0, 0.0, 20.0, 20.0)));
    let line = place(&mut doc, |id| Item::line(id, Point::new(-20.0, 0.0), Point::ZERO));

    assert!(move_items(&mut doc, &[rect], Point::new(5.0, 5.0), true));
    let page = doc.current_page().unwrap();
    assert_eq!(page.scene_point(PointRef::new(line, 1)), Some(Point::new(5.0, 5.0)));
    assert_eq!(page.scene_point(PointRef::new(line, 0)), Some(Point::new(-20.0, 0.0)));
    assert!(page.is_connected(PointRef::new(line, 1), PointRef::new(rect, 0)));

    assert!(rotate_items(&mut doc, &[rect]));
    assert_symmetric(&doc);
    let page = doc.current_page().unwrap();
    assert_eq!(page.scene_point(PointRef::new(line, 1)), page.scene_point(PointRef::new(rect, 0)));
}

#[test]
fn moving_both_connected_items_keeps_link() {
    let mut doc = Document::new();
    let a = place(&mut doc, |id| Item::line(id, Point::ZERO, Point::new(10.0, 0.0)));
    let b = place(&mut doc, |id| Item::line(id, Point::new(10.0, 0.0), Point::new(10.0, 10.0)));
    assert!(move_items(&mut doc, &[a, b], Point::new(20.0, 20.0), true));
    let moved = doc.history().last().unwrap();
    assert!(moved.children().is_empty());
    assert!(doc.current_page().unwrap().is_connected(PointRef::new(a, 1), PointRef::new(b, 0)));
}

#[test]
fn removing_item_cuts_links_and_undo_restores_them() {
    let mut doc = Document::new();
    let a = place(&mut doc, |id| Item::line(id, Point::ZERO, Point::new(10.0, 0.0)));
    let b = place(&mut doc, |id| Item::line(id, Point::new(10.0, 0.0), Point::new(10.0, 10.0)));
    assert!(remove_items(&mut doc, &[b]));
    let page = doc.current_page().unwrap();
    assert!(page.item(b).is_none());
    assert!(page.item(a).unwrap().points[1].connections.is_empty());
    assert_symmetric(&doc);

    doc.undo();
    let page = doc.current_page().unwrap();
    assert!(page.is_connected(PointRef::new(a, 1), PointRef::new(b, 0)));
    assert_eq!(page.item_ids(), vec![a, b]);
    assert_symmetric(&doc);
}

#[test]
fn dragging_both_ends_snaps_and_drags_partner_once() {
    let mut doc = Document::new();
    doc.settings.angle_snap = true;
    let a = place(&mut doc, |id| Item::line(id, Point::ZERO, Point::new(10.0, 0.0)));
    let b = place(&mut doc, |id| Item::line(id, Point::new(10.0, 0.0), Point::new(10.0, 10.0)));
    let depth = doc.history().len();

    let (first, second) = ((0, Point::new(0.0, 20.0)), (1, Point::new(20.0, 25.0)));
    assert!(resize_two_points(&mut doc, a, first, second, true));
    assert_eq!(doc.history().len(), depth + 1);
    let drag = doc.history().last().unwrap();
    assert!(matches!(drag.action(), Action::Resize { item, .. } if *item == a));
    assert_eq!(count_children(drag, |a| matches!(a, Action::Resize { .. })), 1);
    assert_eq!(count_children(drag, |a| matches!(a, Action::Disconnect { .. })), 0);
    assert_eq!(count_children(drag, |a| matches!(a, Action::Connect { .. })), 0);

    // About 14° from the first point, so the second one snaps to horizontal.
    let page = doc.current_page().unwrap();
    assert_eq!(page.scene_point(PointRef::new(a, 0)), Some(Point::new(0.0, 20.0)));
    assert_eq!(page.scene_point(PointRef::new(a, 1)), Some(Point::new(20.0, 20.0)));
    assert_eq!(page.scene_point(PointRef::new(b, 0)), Some(Point::new(20.0, 20.0)));
    assert_eq!(page.scene_point(PointRef::new(b, 1)), Some(Point::new(10.0, 10.0)));
    assert!(page.is_connected(PointRef::new(a, 1), PointRef::new(b, 0)));
    assert_symmetric(&doc);

    doc.undo();
    let page = doc.current_page().unwrap();
    assert_eq!(page.scene_point(PointRef::new(a, 0)), Some(Point::ZERO));
    assert_eq!(page.scene_point(PointRef::new(a, 1)), Some(Point::new(10.0, 0.0)));
    assert_eq!(page.scene_point(PointRef::new(b, 0)), Some(Point::new(10.0, 0.0)));
    assert!(page.is_connected(PointRef::new(a, 1), PointRef::new(b, 0)));
    assert_symmetric(&doc);
}
