use shapebook::editor::operations::{insert_point, place_items, remove_point, resize_point};
use shapebook::{Document, Item, Point, Rect};

fn polygon(doc: &mut Document, points: &[Point]) -> shapebook::ItemId {
    let id = doc.new_item_id();
    assert!(place_items(doc, vec![Item::polygon(id, points)]));
    id
}

fn point_count(doc: &Document, id: shapebook::ItemId) -> usize {
    doc.current_page().unwrap().item(id).unwrap().points.len()
}

#[test]
fn triangle_keeps_three_points() {
    let mut doc = Document::new();
    let id = polygon(&mut doc, &[Point::ZERO, Point::new(20.0, 0.0), Point::new(10.0, 15.0)]);
    assert!(!remove_point(&mut doc, id, Point::new(20.0, 0.0)));
    assert_eq!(point_count(&doc, id), 3);
}

#[test]
fn quadrilateral_drops_to_three_points() {
    let mut doc = Document::new();
    let id = polygon(
        &mut doc,
        &[Point::ZERO, Point::new(20.0, 0.0), Point::new(20.0, 20.0), Point::new(0.0, 20.0)],
    );
    assert!(remove_point(&mut doc, id, Point::new(19.0, 19.0)));
    assert_eq!(point_count(&doc, id), 3);
    let page = doc.current_page().unwrap();
    assert!(!page.item(id).unwrap().positions().contains(&Point::new(20.0, 20.0)));
    assert!(!remove_point(&mut doc, id, Point::new(20.0, 0.0)));
    doc.undo();
    assert_eq!(point_count(&doc, id), 4);
}

#[test]
fn inserted_point_lands_on_nearest_edge() {
    let mut doc = Document::new();
    let id = polygon(
        &mut doc,
        &[Point::ZERO, Point::new(20.0, 0.0), Point::new(20.0, 20.0), Point::new(0.0, 20.0)],
    );
    assert!(insert_point(&mut doc, id, Point::new(10.0, 1.0)));
    let page = doc.current_page().unwrap();
    let positions = page.item(id).unwrap().positions();
    assert_eq!(positions.len(), 5);
    // Snapped to the 5 mm grid and placed between the first two vertices.
    assert_eq!(positions[1], Point::new(10.0, 0.0));
}

#[test]
fn line_end_snaps_to_nearest_45_degrees() {
    let mut doc = Document::new();
    doc.settings.grid.snap = false;
    doc.settings.angle_snap = true;
    let id = doc.new_item_id();
    place_items(&mut doc, vec![Item::line(id, Point::ZERO, Point::new(5.0, 5.0))]);

    // About 24°, closer to the diagonal than to the horizontal.
    assert!(resize_point(&mut doc, id, 1, Point::new(9.0, 4.0), true));
    let end = doc.current_page().unwrap().item(id).unwrap().positions()[1];
    assert!((end.y.atan2(end.x).to_degrees() - 45.0).abs() < 1e-9, "{end:?}");
    assert!(end.coincides(Point::new(9.0, 9.0)), "{end:?}");

    assert!(resize_point(&mut doc, id, 1, Point::new(9.0, 2.0), true));
    let end = doc.current_page().unwrap().item(id).unwrap().positions()[1];
    assert!(end.coincides(Point::new(9.0, 0.0)), "{end:?}");
}

#[test]
fn rect_corner_drag_keeps_handles_consistent() {
    let mut doc = Document::new();
    let id = doc.new_item_id();
    place_items(&mut doc, vec![Item::rect(id, Rect::new(0.0, 0.0, 20.0, 10.0))]);
    assert!(resize_point(&mut doc, id, 4, Point::new(30.0, 20.0), true));
    let item = doc.current_page().unwrap().item(id).unwrap();
    let p = item.positions();
    assert_eq!(p[0], Point::ZERO);
    assert_eq!(p[4], Point::new(30.0, 20.0));
    // Mid handles follow the corners.
    assert_eq!(p[1], Point::new(15.0, 0.0));
    assert_eq!(p[3], Point::new(30.0, 10.0));
}

#[test]
fn degenerate_shapes_are_not_placed() {
    let mut doc = Document::new();
    let id = doc.new_item_id();
    assert!(!place_items(&mut doc, vec![Item::rect(id, Rect::new(5.0, 5.0, 5.0, 20.0))]));
    assert!(!place_items(&mut doc, vec![Item::text(id, "  ")]));
    assert!(doc.current_page().unwrap().is_empty());
}
