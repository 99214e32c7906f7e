//! Parse `document.xml` into a [`Document`].
//!
//! Items get fresh ids in reading order. Connections are applied level by
//! level once every item of the level has been built.

use crate::document::{Document, Page};
use crate::format::{FORMAT_VERSION, FormatError};
use crate::geometry::{Point, Transform};
use crate::model::{Item, ItemId, ItemKind, PointRef, PropertyValue, Style};
use indexmap::IndexMap;
use roxmltree::Node;
use tracing::warn;

type Result<T> = std::result::Result<T, FormatError>;

pub fn parse_document_xml(text: &str) -> Result<Document> {
    let xml = roxmltree::Document::parse(text)?;
    let root = xml.root_element();
    if !root.has_tag_name("Document") {
        return Err(FormatError::MissingRoot);
    }
    let version: u32 = parse_attr(root, "Version")?;
    if version > FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }

    let mut doc = Document::empty();
    for node in root.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "Settings" => {
                for (name, value) in parse_properties(node)? {
                    if !doc.settings.set_property(&name, &value) {
                        warn!(%name, "ignoring unknown document setting");
                    }
                }
            }
            "Style" => {
                for (name, value) in parse_properties(node)? {
                    if !doc.default_style.set(&name, value) {
                        warn!(%name, "ignoring mistyped default style property");
                    }
                }
            }
            "Page" => {
                let page = parse_page(node, &mut doc)?;
                doc.add_page(page);
            }
            other => warn!(element = other, "ignoring unknown element"),
        }
    }
    if doc.pages().is_empty() {
        return Err(FormatError::NoPages);
    }
    Ok(doc)
}

fn attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| FormatError::MissingAttribute {
        element: node.tag_name().name().to_string(),
        attribute: name.to_string(),
    })
}

fn parse_attr<T: std::str::FromStr>(node: Node<'_, '_>, name: &str) -> Result<T> {
    let value = attr(node, name)?;
    value.parse().map_err(|_| FormatError::InvalidValue {
        attribute: name.to_string(),
        value: value.to_string(),
    })
}

fn elements<'a, 'i>(node: Node<'a, 'i>, tag: &'static str) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(move |n| n.is_element() && n.has_tag_name(tag))
}

fn parse_properties(node: Node<'_, '_>) -> Result<IndexMap<String, PropertyValue>> {
    let mut properties = IndexMap::new();
    for p in elements(node, "P") {
        let name = attr(p, "Name")?;
        let type_name = attr(p, "Type")?;
        let text = p.text().unwrap_or("");
        let value = PropertyValue::parse(type_name, text).ok_or_else(|| FormatError::InvalidValue {
            attribute: name.to_string(),
            value: text.to_string(),
        })?;
        properties.insert(name.to_string(), value);
    }
    Ok(properties)
}

fn parse_page(node: Node<'_, '_>, doc: &mut Document) -> Result<Page> {
    let name = node.attribute("Name").unwrap_or_default();
    let mut page = Page::new(doc.new_page_id(), name);
    let defaults = doc.default_style.clone();
    let mut next_id = || doc.new_item_id();
    for item in parse_level(node, &defaults, &mut next_id)? {
        page.add_item(item);
    }
    Ok(page)
}

/// Items of one level with their internal connections applied.
fn parse_level(
    node: Node<'_, '_>,
    defaults: &Style,
    next_id: &mut impl FnMut() -> ItemId,
) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    for child in elements(node, "Item") {
        items.push(parse_item(child, defaults, next_id)?);
    }
    for connection in elements(node, "Connection") {
        let a = parse_end(connection, "A", &items)?;
        let b = parse_end(connection, "B", &items)?;
        if a.item == b.item {
            return Err(FormatError::BadConnection(format!("{a}-{b}")));
        }
        for (from, to) in [(a, b), (b, a)] {
            if let Some(item) = items.iter_mut().find(|i| i.id == from.item) {
                item.points[from.index].add_connection(to);
            }
        }
    }
    Ok(items)
}

/// Resolve an `item:point` index pair against the level's items.
fn parse_end(node: Node<'_, '_>, name: &str, items: &[Item]) -> Result<PointRef> {
    let value = attr(node, name)?;
    let bad = || FormatError::BadConnection(value.to_string());
    let (item, point) = value.split_once(':').ok_or_else(bad)?;
    let item: usize = item.parse().map_err(|_| bad())?;
    let point: usize = point.parse().map_err(|_| bad())?;
    let target = items.get(item).ok_or_else(bad)?;
    if !target.points.get(point).is_some_and(|p| p.is_connection()) {
        return Err(bad());
    }
    Ok(PointRef::new(target.id, point))
}

fn parse_item(
    node: Node<'_, '_>,
    defaults: &Style,
    next_id: &mut impl FnMut() -> ItemId,
) -> Result<Item> {
    let type_name = attr(node, "Type")?;
    let kind = ItemKind::from_type_name(type_name)
        .ok_or_else(|| FormatError::UnknownItemType(type_name.to_string()))?;
    let transform = Transform {
        position: Point::new(parse_attr(node, "X")?, parse_attr(node, "Y")?),
        rotation: parse_attr::<u8>(node, "Rotation")? % 4,
        flipped: parse_attr(node, "Flipped")?,
    };
    let id = next_id();

    let mut item = if let ItemKind::Group { .. } = kind {
        let children = parse_level(node, defaults, next_id)?;
        let mut group = Item::new(id, ItemKind::Group { children }, &[Point::ZERO; 8]);
        group.update_group_points(defaults);
        group
    } else {
        let positions = elements(node, "Point")
            .map(|p| Ok(Point::new(parse_attr(p, "X")?, parse_attr(p, "Y")?)))
            .collect::<Result<Vec<Point>>>()?;
        if positions.len() < kind.min_points() {
            return Err(FormatError::TooFewPoints {
                kind: type_name.to_string(),
                found: positions.len(),
                needed: kind.min_points(),
            });
        }
        Item::new(id, kind, &positions)
    };
    item.transform = transform;
    item.properties = parse_properties(node)?;
    Ok(item)
}
