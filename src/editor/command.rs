//! Undoable commands and the bounded history.
//!
//! A [`Command`] is one [`Action`] plus ordered child commands. Redo applies
//! the action and then the children in order; undo rewinds the children in
//! reverse and then the action. Actions store before and after snapshots,
//! so repeated undo/redo replays are exact.
//!
//! Commands with side effects are built with a [`Simulation`]: the action is
//! applied, the side effects are computed against the mutated state and
//! attached as children (each applied as it is attached), and the whole
//! command is rewound before it is handed to [`Document::push`].

use crate::document::{Document, DocumentEvent, DocumentSettings, Page, properties};
use crate::geometry::{Point, Transform};
use crate::model::{Item, ItemId, ItemPoint, PageId, PointRef, PropertyValue};
use tracing::{debug, trace};

/// Number of commands kept in the history.
pub const HISTORY_LIMIT: usize = 64;

// ────────────────────────────────────────────────────────────────────────────
// Actions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Move,
    Rotate,
    RotateBack,
    FlipHorizontal,
    FlipVertical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformChange {
    pub item: ItemId,
    pub before: Transform,
    pub after: Transform,
}

/// The primitive mutation carried by a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No mutation of its own; the children do the work.
    Composite,
    Transform {
        page: PageId,
        kind: TransformKind,
        changes: Vec<TransformChange>,
    },
    /// Point positions of one item. `points` are the dragged indices.
    Resize {
        page: PageId,
        item: ItemId,
        points: Vec<usize>,
        before: Vec<Point>,
        after: Vec<Point>,
    },
    InsertPoint {
        page: PageId,
        item: ItemId,
        index: usize,
        point: ItemPoint,
    },
    RemovePoint {
        page: PageId,
        item: ItemId,
        index: usize,
        point: ItemPoint,
    },
    /// `(index, item)` pairs in ascending index order.
    AddItems {
        page: PageId,
        items: Vec<(usize, Item)>,
    },
    /// `(index, item)` pairs in ascending index order.
    RemoveItems {
        page: PageId,
        items: Vec<(usize, Item)>,
    },
    Reorder {
        page: PageId,
        before: Vec<ItemId>,
        after: Vec<ItemId>,
    },
    Connect {
        page: PageId,
        a: PointRef,
        b: PointRef,
    },
    Disconnect {
        page: PageId,
        a: PointRef,
        b: PointRef,
    },
    Select {
        page: PageId,
        before: Vec<ItemId>,
        after: Vec<ItemId>,
    },
    /// `None` means the item falls back to the document default.
    SetItemProperty {
        page: PageId,
        item: ItemId,
        name: String,
        before: Option<PropertyValue>,
        after: Option<PropertyValue>,
    },
    SetDocumentProperty {
        name: String,
        before: PropertyValue,
        after: PropertyValue,
    },
    Settings {
        before: Box<DocumentSettings>,
        after: Box<DocumentSettings>,
    },
    RenamePage {
        page: PageId,
        before: String,
        after: String,
    },
    AddPage {
        index: usize,
        page: Box<Page>,
    },
    RemovePage {
        index: usize,
        page: Box<Page>,
    },
    /// Whole-item replacement, matched by id.
    Replace {
        page: PageId,
        before: Vec<Item>,
        after: Vec<Item>,
    },
}

impl Action {
    /// Apply the action forward (`redo`) or backward (`undo`).
    pub(crate) fn apply(&self, doc: &mut Document, forward: bool) {
        match self {
            Action::Composite => {}
            Action::Transform { page, changes, .. } => {
                if let Some(p) = doc.page_by_id_mut(*page) {
                    for change in changes {
                        if let Some(item) = p.item_mut(change.item) {
                            item.transform = *pick(forward, &change.before, &change.after);
                        }
                    }
                }
                let ids = changes.iter().map(|c| c.item).collect();
                doc.emit(DocumentEvent::GeometryChanged(*page, ids));
            }
            Action::Resize {
                page,
                item,
                before,
                after,
                ..
            } => {
                if let Some(i) = doc.page_by_id_mut(*page).and_then(|p| p.item_mut(*item)) {
                    i.set_positions(pick(forward, before, after));
                }
                doc.emit(DocumentEvent::GeometryChanged(*page, vec![*item]));
            }
            Action::InsertPoint {
                page,
                item,
                index,
                point,
            } => {
                point_edit(doc, *page, *item, *index, point, forward);
            }
            Action::RemovePoint {
                page,
                item,
                index,
                point,
            } => {
                point_edit(doc, *page, *item, *index, point, !forward);
            }
            Action::AddItems { page, items } => item_edit(doc, *page, items, forward),
            Action::RemoveItems { page, items } => item_edit(doc, *page, items, !forward),
            Action::Reorder { page, before, after } => {
                if let Some(p) = doc.page_by_id_mut(*page) {
                    p.set_order(pick(forward, before, after));
                }
                doc.emit(DocumentEvent::ItemsChanged(*page));
            }
            Action::Connect { page, a, b } | Action::Disconnect { page, a, b } => {
                let connect = matches!(self, Action::Connect { .. }) == forward;
                trace!(%a, %b, connect, "connection");
                if let Some(p) = doc.page_by_id_mut(*page) {
                    if connect {
                        p.connect(*a, *b);
                    } else {
                        p.disconnect(*a, *b);
                    }
                }
            }
            Action::Select { page, before, after } => {
                if let Some(p) = doc.page_by_id_mut(*page) {
                    p.set_selection(pick(forward, before, after));
                }
                doc.emit(DocumentEvent::SelectionChanged(*page));
            }
            Action::SetItemProperty {
                page,
                item,
                name,
                before,
                after,
            } => {
                if let Some(i) = doc.page_by_id_mut(*page).and_then(|p| p.item_mut(*item)) {
                    match pick(forward, before, after) {
                        Some(value) => {
                            i.properties.insert(name.clone(), value.clone());
                        }
                        None => {
                            i.properties.shift_remove(name);
                        }
                    }
                }
                doc.emit(DocumentEvent::ItemPropertyChanged(*page, *item, name.clone()));
            }
            Action::SetDocumentProperty { name, before, after } => {
                doc.set_property(name, pick(forward, before, after).clone());
            }
            Action::Settings { before, after } => {
                doc.settings = (**pick(forward, before, after)).clone();
                doc.emit(DocumentEvent::DocumentPropertyChanged(properties::UNITS.to_string()));
            }
            Action::RenamePage { page, before, after } => {
                if let Some(p) = doc.page_by_id_mut(*page) {
                    p.name = pick(forward, before, after).clone();
                }
                doc.emit(DocumentEvent::PageChanged(*page));
            }
            Action::AddPage { index, page } => page_edit(doc, *index, page, forward),
            Action::RemovePage { index, page } => page_edit(doc, *index, page, !forward),
            Action::Replace { page, before, after } => {
                if let Some(p) = doc.page_by_id_mut(*page) {
                    for item in pick(forward, before, after) {
                        if let Some(slot) = p.item_mut(item.id) {
                            *slot = item.clone();
                        }
                    }
                }
                doc.emit(DocumentEvent::ItemsChanged(*page));
            }
        }
    }

    /// Key under which successive drag steps merge.
    fn merge_key(&self) -> Option<(PageId, Vec<ItemId>, Vec<usize>)> {
        match self {
            Action::Transform {
                page,
                kind: TransformKind::Move,
                changes,
            } => Some((*page, changes.iter().map(|c| c.item).collect(), Vec::new())),
            Action::Resize {
                page, item, points, ..
            } => Some((*page, vec![*item], points.clone())),
            _ => None,
        }
    }
}

fn pick<T>(forward: bool, before: T, after: T) -> T {
    if forward { after } else { before }
}

fn point_edit(
    doc: &mut Document,
    page: PageId,
    item: ItemId,
    index: usize,
    point: &ItemPoint,
    insert: bool,
) {
    if let Some(p) = doc.page_by_id_mut(page) {
        if insert {
            p.insert_point(item, index, point.clone());
        } else {
            p.remove_point(item, index);
        }
    }
    doc.emit(DocumentEvent::GeometryChanged(page, vec![item]));
}

fn item_edit(doc: &mut Document, page: PageId, items: &[(usize, Item)], insert: bool) {
    if let Some(p) = doc.page_by_id_mut(page) {
        if insert {
            for (index, item) in items {
                p.insert_item(*index, item.clone());
            }
        } else {
            for (_, item) in items.iter().rev() {
                p.remove_item(item.id);
            }
        }
    }
    doc.emit(DocumentEvent::ItemsChanged(page));
}

fn page_edit(doc: &mut Document, index: usize, page: &Page, insert: bool) {
    if insert {
        doc.insert_page(index, page.clone());
    } else {
        doc.remove_page(index);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Command
// ────────────────────────────────────────────────────────────────────────────

/// One undoable operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    text: String,
    action: Action,
    children: Vec<Command>,
    /// Drag steps are non-final; the step on release is final.
    is_final: bool,
}

impl Command {
    pub fn new(text: impl Into<String>, action: Action) -> Self {
        Self {
            text: text.into(),
            action,
            children: Vec::new(),
            is_final: true,
        }
    }

    pub fn composite(text: impl Into<String>) -> Self {
        Self::new(text, Action::Composite)
    }

    /// Attach children that do not depend on each other's effects.
    pub fn with_children(mut self, children: Vec<Command>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn children(&self) -> &[Command] {
        &self.children
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Apply the action, then the children in order.
    pub(crate) fn redo(&self, doc: &mut Document) {
        self.action.apply(doc, true);
        for child in &self.children {
            child.redo(doc);
        }
    }

    /// Rewind the children in reverse order, then the action.
    pub(crate) fn undo(&self, doc: &mut Document) {
        for child in self.children.iter().rev() {
            child.undo(doc);
        }
        self.action.apply(doc, false);
    }

    /// Fold a following drag step into this one. Gives the step back when
    /// the two do not belong to the same drag.
    fn merge(&mut self, next: Command) -> Result<(), Command> {
        if self.is_final
            || self.action.merge_key().is_none()
            || self.action.merge_key() != next.action.merge_key()
        {
            return Err(next);
        }
        match (&mut self.action, next.action) {
            (Action::Transform { changes, .. }, Action::Transform { changes: newer, .. }) => {
                for (change, newer) in changes.iter_mut().zip(newer) {
                    change.after = newer.after;
                }
            }
            (Action::Resize { after, .. }, Action::Resize { after: newer, .. }) => *after = newer,
            _ => unreachable!("merge keys matched"),
        }
        self.children.extend(next.children);
        self.is_final = next.is_final;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulation (build protocol)
// ────────────────────────────────────────────────────────────────────────────

/// Builder that applies a command while its side effects are computed and
/// rewinds it before the command is published.
///
/// Events are muted for the lifetime of the builder. Dropping an unfinished
/// builder rewinds whatever it applied.
pub(crate) struct Simulation<'d> {
    doc: &'d mut Document,
    command: Option<Command>,
}

impl<'d> Simulation<'d> {
    /// Apply `command`'s action (and any children it already carries).
    pub fn begin(doc: &'d mut Document, command: Command) -> Self {
        doc.mute();
        command.redo(doc);
        Self {
            doc,
            command: Some(command),
        }
    }

    pub fn doc(&self) -> &Document {
        self.doc
    }

    /// Document access for nested builders.
    pub fn doc_mut(&mut self) -> &mut Document {
        self.doc
    }

    /// Apply `child` and attach it.
    pub fn apply_child(&mut self, child: Command) {
        child.redo(self.doc);
        if let Some(command) = self.command.as_mut() {
            command.children.push(child);
        }
    }

    pub fn child_count(&self) -> usize {
        self.command.as_ref().map_or(0, |c| c.children.len())
    }

    /// Rewind and return the fully built command.
    pub fn finish(mut self) -> Command {
        let command = self.command.take();
        match command {
            Some(command) => {
                command.undo(self.doc);
                self.doc.unmute();
                command
            }
            None => Command::composite(""),
        }
    }
}

impl Drop for Simulation<'_> {
    fn drop(&mut self) {
        if let Some(command) = self.command.take() {
            command.undo(self.doc);
            self.doc.unmute();
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// History (undo / redo stack)
// ────────────────────────────────────────────────────────────────────────────

/// Bounded undo/redo history with a clean marker.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_size: usize,
    /// Undo depth at which the document was last saved; `None` when that
    /// state can no longer be reached.
    clean_depth: Option<usize>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
            clean_depth: Some(0),
        }
    }

    /// Record an already applied command and clear the redo stack.
    ///
    /// A drag step merges into the top command of the same drag unless the
    /// top is the saved state.
    pub(crate) fn push(&mut self, command: Command) {
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            if self.clean_depth.is_some_and(|d| d > self.undo_stack.len()) {
                self.clean_depth = None;
            }
        }
        let at_clean = self.is_clean();
        let command = match self.undo_stack.last_mut() {
            Some(top) if !at_clean => match top.merge(command) {
                Ok(()) => {
                    trace!("merged drag step");
                    return;
                }
                Err(command) => command,
            },
            _ => command,
        };
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
            self.clean_depth = self.clean_depth.and_then(|d| d.checked_sub(1));
        }
    }

    pub(crate) fn undo(&mut self, doc: &mut Document) -> bool {
        if let Some(command) = self.undo_stack.pop() {
            debug!(text = command.text(), "undo");
            command.undo(doc);
            self.redo_stack.push(command);
            true
        } else {
            false
        }
    }

    pub(crate) fn redo(&mut self, doc: &mut Document) -> bool {
        if let Some(command) = self.redo_stack.pop() {
            debug!(text = command.text(), "redo");
            command.redo(doc);
            self.undo_stack.push(command);
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_text(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.text())
    }

    /// The command the next undo would revert.
    pub fn last(&self) -> Option<&Command> {
        self.undo_stack.last()
    }

    pub fn redo_text(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.text())
    }

    /// Number of commands that can be undone.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.clean_depth == Some(self.undo_stack.len())
    }

    pub(crate) fn set_clean(&mut self) {
        self.clean_depth = Some(self.undo_stack.len());
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.clean_depth = Some(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename(doc: &Document, name: &str) -> Command {
        let page = &doc.pages()[0];
        Command::new(
            "Rename page",
            Action::RenamePage {
                page: page.id(),
                before: page.name.clone(),
                after: name.to_string(),
            },
        )
    }

    #[test]
    fn test_push_undo_redo() {
        let mut doc = Document::new();
        let cmd = rename(&doc, "A");
        doc.push(cmd);
        assert_eq!(doc.pages()[0].name, "A");
        assert!(!doc.is_clean());
        assert!(doc.undo());
        assert_eq!(doc.pages()[0].name, "Page 1");
        assert!(doc.is_clean());
        assert!(doc.redo());
        assert_eq!(doc.pages()[0].name, "A");
        assert!(!doc.redo());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut doc = Document::new();
        for i in 0..(HISTORY_LIMIT + 10) {
            let cmd = rename(&doc, &format!("P{i}"));
            doc.push(cmd);
        }
        assert_eq!(doc.history().len(), HISTORY_LIMIT);
        while doc.undo() {}
        assert_eq!(doc.pages()[0].name, "P9");
        // The saved state was evicted, so no depth is clean any more.
        assert!(!doc.is_clean());
    }

    #[test]
    fn test_clean_state_lost_when_redo_branch_discarded() {
        let mut doc = Document::new();
        let cmd = rename(&doc, "A");
        doc.push(cmd);
        doc.set_clean();
        doc.undo();
        let cmd = rename(&doc, "B");
        doc.push(cmd);
        assert!(!doc.is_clean());
        doc.undo();
        assert!(!doc.is_clean());
    }

    #[test]
    fn test_dropped_simulation_rewinds() {
        let mut doc = Document::new();
        let cmd = rename(&doc, "A");
        {
            let sim = Simulation::begin(&mut doc, cmd);
            assert_eq!(sim.doc().pages()[0].name, "A");
        }
        assert_eq!(doc.pages()[0].name, "Page 1");
    }
}
