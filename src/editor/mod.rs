//! Document editing.
//!
//! - **Commands**: undoable actions with child side effects and a bounded
//!   history ([`command`])
//! - **Connections**: linking coincident points and keeping links intact as
//!   geometry changes ([`constraints`])
//! - **Operations**: the user-level edits; each pushes one command
//!   ([`operations`])
//! - **Selection**: click, toggle and rubber-band selection ([`selection`])

pub mod command;
pub mod constraints;
pub mod operations;
pub mod selection;

pub use command::{Action, Command, HISTORY_LIMIT, History, TransformChange, TransformKind};
pub use constraints::{should_connect, should_disconnect};
pub use operations::{
    Reorder, add_page, change_units, flip_horizontal, flip_vertical, group_items, insert_page,
    insert_point, move_items, place_items, remove_items, remove_page, remove_point, rename_page,
    reorder_items, resize_point, resize_two_points, rotate_back_items, rotate_items,
    set_document_property, set_item_property, ungroup_items,
};
pub use selection::{
    SelectionRect, clear_selection, select_all, select_at, select_in_rect, select_items,
};
