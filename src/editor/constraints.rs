//! Connection maintenance.
//!
//! The predicates decide when two points should be linked or unlinked. The
//! maintainer runs inside a [`Simulation`] after a geometry change: for every
//! connection of the affected items whose ends have drifted apart it either
//! resizes the remote free point back into coincidence or cuts the link.
//! It is a single pass over directly affected points; a follow-resize does
//! not trigger further maintenance on the resized item.

use crate::document::Page;
use crate::editor::command::{Action, Command, Simulation};
use crate::model::{ItemId, PageId, PointRef, Style};
use tracing::trace;

/// True if two unlinked points on different valid items coincide and at
/// least one of them may be moved to keep the link.
pub fn should_connect(page: &Page, a: PointRef, b: PointRef, defaults: &Style) -> bool {
    if a.item == b.item {
        return false;
    }
    let (Some(item_a), Some(item_b)) = (page.item(a.item), page.item(b.item)) else {
        return false;
    };
    let (Some(pa), Some(pb)) = (item_a.points.get(a.index), item_b.points.get(b.index)) else {
        return false;
    };
    if !pa.is_connection() || !pb.is_connection() || !(pa.is_free() || pb.is_free()) {
        return false;
    }
    if pa.is_connected_to(b) || !item_a.is_valid(defaults) || !item_b.is_valid(defaults) {
        return false;
    }
    match (item_a.scene_point(a.index), item_b.scene_point(b.index)) {
        (Some(sa), Some(sb)) => sa.coincides(sb),
        _ => false,
    }
}

/// True if the link from `driving` to `remote` has to be cut: the points
/// have drifted apart and `remote` is not free to follow.
pub fn should_disconnect(page: &Page, driving: PointRef, remote: PointRef) -> bool {
    let (Some(sd), Some(sr)) = (page.scene_point(driving), page.scene_point(remote)) else {
        return true;
    };
    !sd.coincides(sr) && !page.point(remote).is_some_and(|p| p.is_free())
}

/// Connections that leave the given items, as `(inside, outside)` pairs.
pub(crate) fn external_connections(page: &Page, ids: &[ItemId]) -> Vec<(PointRef, PointRef)> {
    let mut pairs = Vec::new();
    for &id in ids {
        let Some(item) = page.item(id) else { continue };
        for (index, point) in item.points.iter().enumerate() {
            for remote in &point.connections {
                if !ids.contains(&remote.item) {
                    pairs.push((PointRef::new(id, index), *remote));
                }
            }
        }
    }
    pairs
}

/// Repair connections of `ids` after their geometry changed.
pub(crate) fn maintain_connections(sim: &mut Simulation<'_>, page: PageId, ids: &[ItemId]) {
    let pairs: Vec<(PointRef, PointRef)> = {
        let Some(p) = sim.doc().page_by_id(page) else {
            return;
        };
        ids.iter()
            .filter_map(|&id| p.item(id))
            .flat_map(|item| {
                item.points.iter().enumerate().flat_map(move |(index, point)| {
                    point
                        .connections
                        .iter()
                        .map(move |remote| (PointRef::new(item.id, index), *remote))
                })
            })
            .collect()
    };

    for (driving, remote) in pairs {
        // Re-checked against the state left by earlier children.
        let Some(p) = sim.doc().page_by_id(page) else {
            return;
        };
        if !p.is_connected(driving, remote) {
            continue;
        }
        let (Some(target), Some(current)) = (p.scene_point(driving), p.scene_point(remote)) else {
            continue;
        };
        if target.coincides(current) {
            continue;
        }
        let child = if should_disconnect(p, driving, remote) {
            trace!(%driving, %remote, "disconnect diverged points");
            disconnect(page, driving, remote)
        } else {
            let Some(item) = p.item(remote.item) else {
                continue;
            };
            trace!(%driving, %remote, "follow resize");
            let mut resized = item.clone();
            resized.resize_point(remote.index, item.map_from_scene(target), false);
            Command::new(
                "Resize",
                Action::Resize {
                    page,
                    item: remote.item,
                    points: vec![remote.index],
                    before: item.positions(),
                    after: resized.positions(),
                },
            )
        };
        sim.apply_child(child);
    }
}

/// Link every point of `incoming` items to coincident eligible points on
/// the other items of the page.
pub(crate) fn connect_new_items(sim: &mut Simulation<'_>, page: PageId, incoming: &[ItemId]) {
    let points: Vec<PointRef> = {
        let Some(p) = sim.doc().page_by_id(page) else {
            return;
        };
        incoming
            .iter()
            .filter_map(|&id| p.item(id))
            .flat_map(|item| (0..item.points.len()).map(move |i| PointRef::new(item.id, i)))
            .collect()
    };
    connect_points(sim, page, &points, incoming);
}

/// Link each of `points` to coincident eligible points on items outside
/// `exclude`.
pub(crate) fn connect_points(
    sim: &mut Simulation<'_>,
    page: PageId,
    points: &[PointRef],
    exclude: &[ItemId],
) {
    let mut links = Vec::new();
    {
        let doc = sim.doc();
        let Some(p) = doc.page_by_id(page) else {
            return;
        };
        for &ours in points {
            for other in p.items().filter(|i| !exclude.contains(&i.id)) {
                for index in 0..other.points.len() {
                    let theirs = PointRef::new(other.id, index);
                    if should_connect(p, ours, theirs, &doc.default_style) {
                        links.push((ours, theirs));
                    }
                }
            }
        }
    }
    for (a, b) in links {
        trace!(%a, %b, "auto connect");
        sim.apply_child(Command::new("Connect", Action::Connect { page, a, b }));
    }
}

pub(crate) fn disconnect(page: PageId, a: PointRef, b: PointRef) -> Command {
    Command::new("Disconnect", Action::Disconnect { page, a, b })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::Item;

    fn page_with_lines() -> Page {
        let mut page = Page::new(PageId(1), "p");
        page.add_item(Item::line(ItemId(1), Point::ZERO, Point::new(10.0, 0.0)));
        page.add_item(Item::line(ItemId(2), Point::new(10.0, 0.0), Point::new(10.0, 10.0)));
        page.add_item(Item::rect(ItemId(3), crate::geometry::Rect::new(10.0, 10.0, 20.0, 20.0)));
        page
    }

    #[test]
    fn test_should_connect_requires_coincidence_and_free_point() {
        let defaults = Style::default();
        let page = page_with_lines();
        let a = PointRef::new(ItemId(1), 1);
        let b = PointRef::new(ItemId(2), 0);
        assert!(should_connect(&page, a, b, &defaults));
        assert!(should_connect(&page, b, a, &defaults));
        assert!(!should_connect(&page, PointRef::new(ItemId(1), 0), b, &defaults));
        assert!(!should_connect(&page, a, PointRef::new(ItemId(1), 0), &defaults));
        // Line end (free) on the rect's top-left corner (not free).
        assert!(should_connect(
            &page,
            PointRef::new(ItemId(2), 1),
            PointRef::new(ItemId(3), 0),
            &defaults
        ));
    }

    #[test]
    fn test_should_disconnect_only_for_fixed_remote() {
        let mut page = page_with_lines();
        let line_end = PointRef::new(ItemId(2), 1);
        let corner = PointRef::new(ItemId(3), 0);
        page.connect(line_end, corner);
        assert!(!should_disconnect(&page, corner, line_end));

        page.item_mut(ItemId(3)).unwrap().transform.position = Point::new(1.0, 0.0);
        // The rect moved; the line end is free and can follow.
        assert!(!should_disconnect(&page, corner, line_end));
        // The line end moved away from the fixed corner.
        assert!(should_disconnect(&page, line_end, corner));
    }
}
