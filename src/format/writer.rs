//! Generate `document.xml` text from a [`Document`].
//!
//! Layout:
//!
//! ```xml
//! <Document Version="1">
//!   <Settings>
//!     <P Name="units" Type="text">mm</P>
//!   </Settings>
//!   <Style>
//!     <P Name="pen-color" Type="color">#000000</P>
//!   </Style>
//!   <Page Name="Page 1">
//!     <Item Type="line" X="0" Y="0" Rotation="0" Flipped="false">
//!       <Point X="0" Y="0"/>
//!       <P Name="pen-width" Type="number">1</P>
//!     </Item>
//!     <Connection A="0:1" B="1:0"/>
//!   </Page>
//! </Document>
//! ```

use crate::document::{Document, Page, properties};
use crate::format::FORMAT_VERSION;
use crate::model::{Item, ItemKind, PropertyValue};

/// Generate the XML text for a document, with the XML declaration and
/// 2-space indentation.
pub fn generate_document_xml(document: &Document) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str(&format!("<Document Version=\"{}\">\n", FORMAT_VERSION));

    indent(&mut out, 1);
    out.push_str("<Settings>\n");
    for name in properties::ALL {
        if let Some(value) = document.settings.property(name) {
            write_p(&mut out, 2, name, &value);
        }
    }
    indent(&mut out, 1);
    out.push_str("</Settings>\n");

    indent(&mut out, 1);
    out.push_str("<Style>\n");
    for (name, value) in &document.default_style.properties {
        write_p(&mut out, 2, name, value);
    }
    indent(&mut out, 1);
    out.push_str("</Style>\n");

    for page in document.pages() {
        write_page(&mut out, page, 1);
    }
    out.push_str("</Document>\n");
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an attribute value. Newlines and carriage returns are encoded so
/// they survive attribute normalization.
fn xml_escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_p(out: &mut String, level: usize, name: &str, value: &PropertyValue) {
    indent(out, level);
    let text = value.to_value_string();
    if text.is_empty() {
        out.push_str(&format!(
            "<P Name=\"{}\" Type=\"{}\"/>\n",
            xml_escape_attr(name),
            value.type_name()
        ));
    } else {
        out.push_str(&format!(
            "<P Name=\"{}\" Type=\"{}\">{}</P>\n",
            xml_escape_attr(name),
            value.type_name(),
            xml_escape(&text)
        ));
    }
}

fn write_page(out: &mut String, page: &Page, level: usize) {
    indent(out, level);
    out.push_str(&format!("<Page Name=\"{}\">\n", xml_escape_attr(&page.name)));
    let items: Vec<&Item> = page.items().collect();
    write_level(out, &items, level + 1);
    indent(out, level);
    out.push_str("</Page>\n");
}

/// Items of one level followed by the connections between them.
fn write_level(out: &mut String, items: &[&Item], level: usize) {
    for item in items {
        write_item(out, item, level);
    }
    for ((ia, pa), (ib, pb)) in level_connections(items) {
        indent(out, level);
        out.push_str(&format!("<Connection A=\"{}:{}\" B=\"{}:{}\"/>\n", ia, pa, ib, pb));
    }
}

/// Each link once, with item ids replaced by indices within `items`.
/// Links to items outside the level are not stored.
fn level_connections(items: &[&Item]) -> Vec<((usize, usize), (usize, usize))> {
    let index_of = |id| items.iter().position(|i| i.id == id);
    let mut pairs = Vec::new();
    for (ia, item) in items.iter().enumerate() {
        for (pa, point) in item.points.iter().enumerate() {
            for remote in &point.connections {
                let Some(ib) = index_of(remote.item) else {
                    continue;
                };
                if (ia, pa) < (ib, remote.index) {
                    pairs.push(((ia, pa), (ib, remote.index)));
                }
            }
        }
    }
    pairs
}

fn write_item(out: &mut String, item: &Item, level: usize) {
    indent(out, level);
    let t = &item.transform;
    out.push_str(&format!(
        "<Item Type=\"{}\" X=\"{}\" Y=\"{}\" Rotation=\"{}\" Flipped=\"{}\">\n",
        item.type_name(),
        t.position.x,
        t.position.y,
        t.rotation,
        t.flipped
    ));
    // Group display points are derived from the children.
    if !matches!(item.kind, ItemKind::Group { .. }) {
        for point in &item.points {
            indent(out, level + 1);
            let (x, y) = (point.position.x, point.position.y);
            out.push_str(&format!("<Point X=\"{}\" Y=\"{}\"/>\n", x, y));
        }
    }
    for (name, value) in &item.properties {
        write_p(out, level + 1, name, value);
    }
    let children: Vec<&Item> = item.children().iter().collect();
    write_level(out, &children, level + 1);
    indent(out, level);
    out.push_str("</Item>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{ItemId, PointRef};

    #[test]
    fn test_escape_attr() {
        assert_eq!(xml_escape_attr("a\"b\nc&"), "a&quot;b&#xA;c&amp;");
        assert_eq!(xml_escape("<x>"), "&lt;x&gt;");
    }

    #[test]
    fn test_connections_written_once_by_index() {
        let mut doc = Document::new();
        let page = doc.page_mut(0).unwrap();
        page.add_item(Item::line(ItemId(7), Point::ZERO, Point::new(10.0, 0.0)));
        page.add_item(
            Item::line(ItemId(9), Point::new(10.0, 0.0), Point::new(10.0, 5.0))
                .with_property("pen-width", PropertyValue::Number(1.5)),
        );
        page.connect(PointRef::new(ItemId(7), 1), PointRef::new(ItemId(9), 0));
        let xml = generate_document_xml(&doc);
        assert_eq!(xml.matches("<Connection").count(), 1);
        assert!(xml.contains("<Connection A=\"0:1\" B=\"1:0\"/>"));
        assert!(xml.contains("<P Name=\"pen-width\" Type=\"number\">1.5</P>"));
        assert!(
            xml.contains("<Item Type=\"line\" X=\"0\" Y=\"0\" Rotation=\"0\" Flipped=\"false\">")
        );
    }
}
