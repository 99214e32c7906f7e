//! Copy and paste.
//!
//! A clipboard payload is the magic bytes `SHAPEBOOK`, a little-endian
//! `u32` version and the copied items encoded with bincode. Pasting gives
//! every item a fresh id, keeps connections among the pasted items and
//! drops links to anything that was not copied.

use crate::document::{Document, Page};
use crate::editor::operations;
use crate::geometry::Point;
use crate::model::{Item, ItemId};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

const MAGIC: &[u8; 9] = b"SHAPEBOOK";
const VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    items: Vec<Item>,
}

/// Encode the items `ids` of `page`, in paint order.
pub fn copy(page: &Page, ids: &[ItemId]) -> Result<Vec<u8>> {
    let items: Vec<Item> = page
        .items()
        .filter(|i| ids.contains(&i.id))
        .cloned()
        .map(|mut item| {
            item.selected = false;
            item
        })
        .collect();
    if items.is_empty() {
        bail!("Nothing to copy");
    }
    let mut out = Vec::new();
    out.write_all(MAGIC)?;
    out.write_all(&VERSION.to_le_bytes())?;
    bincode::serde::encode_into_std_write(
        &Payload { items },
        &mut out,
        bincode::config::standard(),
    )?;
    Ok(out)
}

/// Decode a clipboard payload.
pub fn decode(bytes: &[u8]) -> Result<Vec<Item>> {
    let mut reader = bytes;
    let mut magic = [0u8; 9];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        bail!("Invalid magic bytes: expected 'SHAPEBOOK'");
    }
    let mut version_bytes = [0u8; 4];
    reader.read_exact(&mut version_bytes)?;
    let version = u32::from_le_bytes(version_bytes);
    if version != VERSION {
        bail!("Unsupported clipboard version: {}", version);
    }
    let payload: Payload =
        bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())?;
    Ok(payload.items)
}

/// Paste a payload onto the current page, shifted by `offset`, as one
/// undoable command. Returns the ids of the pasted items.
pub fn paste(doc: &mut Document, bytes: &[u8], offset: Point) -> Result<Vec<ItemId>> {
    let mut items = decode(bytes)?;
    Item::reassign_ids(&mut items, &mut || doc.new_item_id());
    for item in &mut items {
        item.transform.position += offset;
    }
    let Some(page) = doc.current_page() else {
        bail!("No current page")
    };
    let (page_id, start) = (page.id(), page.len());
    let ids: Vec<ItemId> = items.iter().map(|i| i.id).collect();
    let indexed = items.into_iter().enumerate().map(|(i, item)| (start + i, item)).collect();
    operations::place(doc, page_id, indexed, &ids, "Paste");
    debug!(count = ids.len(), "paste");
    Ok(ids)
}
