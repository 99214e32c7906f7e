//! Pages and the document container.
//!
//! A [`Document`] owns its pages, the shared defaults (units, page size,
//! grid, default style), the current page and mode, and the undo history.
//! Every editing operation receives the document explicitly; there is no
//! global editor state.
//!
//! [`Page`] exposes the raw container API (add, insert and remove items,
//! connect points) used by commands and the format reader. Edits that should
//! be undoable go through [`crate::editor::operations`] instead.

use crate::editor::command::{Command, History};
use crate::geometry::{Point, Rect};
use crate::model::{
    Color, Item, ItemId, ItemKind, ItemPoint, PageId, PointRef, PropertyValue, Style,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Names of the document-level properties.
pub mod properties {
    pub const UNITS: &str = "units";
    pub const PAGE_WIDTH: &str = "page-width";
    pub const PAGE_HEIGHT: &str = "page-height";
    pub const MARGIN_LEFT: &str = "margin-left";
    pub const MARGIN_TOP: &str = "margin-top";
    pub const MARGIN_RIGHT: &str = "margin-right";
    pub const MARGIN_BOTTOM: &str = "margin-bottom";
    pub const BACKGROUND_COLOR: &str = "background-color";
    pub const GRID_SPACING: &str = "grid-spacing";
    pub const GRID_VISIBLE: &str = "grid-visible";
    pub const GRID_SNAP: &str = "grid-snap";
    pub const ANGLE_SNAP: &str = "angle-snap";

    pub const ALL: [&str; 12] = [
        UNITS,
        PAGE_WIDTH,
        PAGE_HEIGHT,
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_RIGHT,
        MARGIN_BOTTOM,
        BACKGROUND_COLOR,
        GRID_SPACING,
        GRID_VISIBLE,
        GRID_SNAP,
        ANGLE_SNAP,
    ];
}

// ────────────────────────────────────────────────────────────────────────────
// Settings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Units {
    #[default]
    Millimeters,
    Inches,
    Points,
}

impl Units {
    /// Length of one unit in millimeters.
    pub fn millimeters(self) -> f64 {
        match self {
            Units::Millimeters => 1.0,
            Units::Inches => 25.4,
            Units::Points => 25.4 / 72.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Units::Millimeters => "mm",
            Units::Inches => "in",
            Units::Points => "pt",
        }
    }

    pub fn parse(name: &str) -> Option<Units> {
        match name {
            "mm" => Some(Units::Millimeters),
            "in" => Some(Units::Inches),
            "pt" => Some(Units::Points),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub spacing: f64,
    pub visible: bool,
    pub snap: bool,
}

/// Document-wide settings, all lengths in [`DocumentSettings::units`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    pub units: Units,
    pub page_width: f64,
    pub page_height: f64,
    pub margin_left: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub background: Color,
    pub grid: Grid,
    /// Snap line and polyline resizes to 45° steps.
    pub angle_snap: bool,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            units: Units::Millimeters,
            page_width: 210.0,
            page_height: 297.0,
            margin_left: 10.0,
            margin_top: 10.0,
            margin_right: 10.0,
            margin_bottom: 10.0,
            background: Color::WHITE,
            grid: Grid {
                spacing: 5.0,
                visible: true,
                snap: true,
            },
            angle_snap: false,
        }
    }
}

impl DocumentSettings {
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        use properties::*;
        Some(match name {
            UNITS => PropertyValue::Text(self.units.name().to_string()),
            PAGE_WIDTH => PropertyValue::Number(self.page_width),
            PAGE_HEIGHT => PropertyValue::Number(self.page_height),
            MARGIN_LEFT => PropertyValue::Number(self.margin_left),
            MARGIN_TOP => PropertyValue::Number(self.margin_top),
            MARGIN_RIGHT => PropertyValue::Number(self.margin_right),
            MARGIN_BOTTOM => PropertyValue::Number(self.margin_bottom),
            BACKGROUND_COLOR => PropertyValue::Color(self.background),
            GRID_SPACING => PropertyValue::Number(self.grid.spacing),
            GRID_VISIBLE => PropertyValue::Bool(self.grid.visible),
            GRID_SNAP => PropertyValue::Bool(self.grid.snap),
            ANGLE_SNAP => PropertyValue::Bool(self.angle_snap),
            _ => return None,
        })
    }

    /// Set a setting by name. Unknown names and mistyped values are
    /// rejected with `false`.
    pub fn set_property(&mut self, name: &str, value: &PropertyValue) -> bool {
        use properties::*;
        match (name, value) {
            (UNITS, PropertyValue::Text(t)) => match Units::parse(t) {
                Some(units) => self.units = units,
                None => return false,
            },
            (PAGE_WIDTH, PropertyValue::Number(n)) => self.page_width = *n,
            (PAGE_HEIGHT, PropertyValue::Number(n)) => self.page_height = *n,
            (MARGIN_LEFT, PropertyValue::Number(n)) => self.margin_left = *n,
            (MARGIN_TOP, PropertyValue::Number(n)) => self.margin_top = *n,
            (MARGIN_RIGHT, PropertyValue::Number(n)) => self.margin_right = *n,
            (MARGIN_BOTTOM, PropertyValue::Number(n)) => self.margin_bottom = *n,
            (BACKGROUND_COLOR, PropertyValue::Color(c)) => self.background = *c,
            (GRID_SPACING, PropertyValue::Number(n)) if *n > 0.0 => self.grid.spacing = *n,
            (GRID_VISIBLE, PropertyValue::Bool(b)) => self.grid.visible = *b,
            (GRID_SNAP, PropertyValue::Bool(b)) => self.grid.snap = *b,
            (ANGLE_SNAP, PropertyValue::Bool(b)) => self.angle_snap = *b,
            _ => return false,
        }
        true
    }

    /// Settings re-expressed in `units`, with every length scaled.
    pub fn converted(&self, units: Units) -> DocumentSettings {
        let f = self.units.millimeters() / units.millimeters();
        DocumentSettings {
            units,
            page_width: self.page_width * f,
            page_height: self.page_height * f,
            margin_left: self.margin_left * f,
            margin_top: self.margin_top * f,
            margin_right: self.margin_right * f,
            margin_bottom: self.margin_bottom * f,
            grid: Grid {
                spacing: self.grid.spacing * f,
                ..self.grid
            },
            ..self.clone()
        }
    }
}

/// Current interaction mode of the editor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Select,
    Scroll,
    Zoom,
    /// Placing new items of the given type tag.
    Place(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Events
// ────────────────────────────────────────────────────────────────────────────

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    /// Items were added to or removed from a page, or reordered.
    ItemsChanged(PageId),
    /// Item geometry (placement or points) changed.
    GeometryChanged(PageId, Vec<ItemId>),
    ItemPropertyChanged(PageId, ItemId, String),
    SelectionChanged(PageId),
    /// A page property (its name) changed.
    PageChanged(PageId),
    /// Pages were added or removed, or the current page changed.
    PagesChanged,
    DocumentPropertyChanged(String),
    ModeChanged,
    CleanChanged(bool),
}

type Listener = Box<dyn FnMut(&DocumentEvent)>;

#[derive(Default)]
struct Listeners(Vec<Listener>);

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listeners({})", self.0.len())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page
// ────────────────────────────────────────────────────────────────────────────

/// One canvas: an ordered list of items, last painted on top.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    id: PageId,
    pub name: String,
    items: IndexMap<ItemId, Item>,
}

impl Page {
    pub fn new(id: PageId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            items: IndexMap::new(),
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    /// Items in paint order.
    pub fn items(&self) -> impl DoubleEndedIterator<Item = &Item> + ExactSizeIterator {
        self.items.values()
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    /// Recompute the display points of every group against `defaults`.
    /// Returns the groups whose points moved.
    pub(crate) fn refresh_groups(&mut self, defaults: &Style) -> Vec<ItemId> {
        let mut changed = Vec::new();
        for item in self.items.values_mut() {
            if !matches!(item.kind, ItemKind::Group { .. }) {
                continue;
            }
            let before = item.positions();
            item.update_group_points(defaults);
            if item.positions() != before {
                changed.push(item.id);
            }
        }
        changed
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.get_index_of(&id)
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.insert(item.id, item);
    }

    /// Insert at `index` in paint order (clamped to the end). Connections
    /// carried by `item` are mirrored onto their partners.
    pub fn insert_item(&mut self, index: usize, item: Item) {
        let id = item.id;
        let links: Vec<(usize, PointRef)> = item
            .points
            .iter()
            .enumerate()
            .flat_map(|(i, p)| p.connections.iter().map(move |c| (i, *c)))
            .collect();
        let index = index.min(self.items.len());
        self.items.shift_insert(index, id, item);
        for (i, remote) in links {
            if let Some(point) = self.point_mut(remote) {
                point.add_connection(PointRef::new(id, i));
            }
        }
    }

    /// Remove an item, returning its former index and the item itself.
    /// Connections to points outside the item are cut on the remaining
    /// partners but kept on the returned item.
    pub fn remove_item(&mut self, id: ItemId) -> Option<(usize, Item)> {
        let (index, _, item) = self.items.shift_remove_full(&id)?;
        for (i, point) in item.points.iter().enumerate() {
            for remote in &point.connections {
                if let Some(p) = self.point_mut(*remote) {
                    p.remove_connection(PointRef::new(id, i));
                }
            }
        }
        Some((index, item))
    }

    /// Reorder items to match `order`, which must hold exactly the page's ids.
    pub(crate) fn set_order(&mut self, order: &[ItemId]) {
        let mut items = std::mem::take(&mut self.items);
        for id in order {
            if let Some(item) = items.shift_remove(id) {
                self.items.insert(*id, item);
            }
        }
        // Anything not named keeps its relative order on top.
        self.items.extend(items);
    }

    pub fn point(&self, r: PointRef) -> Option<&ItemPoint> {
        self.items.get(&r.item)?.points.get(r.index)
    }

    pub(crate) fn point_mut(&mut self, r: PointRef) -> Option<&mut ItemPoint> {
        self.items.get_mut(&r.item)?.points.get_mut(r.index)
    }

    /// Scene position of a point.
    pub fn scene_point(&self, r: PointRef) -> Option<Point> {
        self.items.get(&r.item)?.scene_point(r.index)
    }

    pub fn is_connected(&self, a: PointRef, b: PointRef) -> bool {
        self.point(a).is_some_and(|p| p.is_connected_to(b))
    }

    /// Link two points on both sides.
    pub(crate) fn connect(&mut self, a: PointRef, b: PointRef) {
        if let Some(p) = self.point_mut(a) {
            p.add_connection(b);
        }
        if let Some(p) = self.point_mut(b) {
            p.add_connection(a);
        }
    }

    pub(crate) fn disconnect(&mut self, a: PointRef, b: PointRef) {
        if let Some(p) = self.point_mut(a) {
            p.remove_connection(b);
        }
        if let Some(p) = self.point_mut(b) {
            p.remove_connection(a);
        }
    }

    /// Insert a point into an item, renumbering every reference to the
    /// item's later points.
    pub(crate) fn insert_point(&mut self, id: ItemId, index: usize, point: ItemPoint) {
        self.renumber(id, |i| if i >= index { i + 1 } else { i });
        let links = point.connections.clone();
        if let Some(item) = self.items.get_mut(&id) {
            let index = index.min(item.points.len());
            item.points.insert(index, point);
        }
        for remote in links {
            if let Some(p) = self.point_mut(remote) {
                p.add_connection(PointRef::new(id, index));
            }
        }
    }

    /// Remove a point from an item. Its connections are cut and later
    /// points are renumbered in their partners.
    pub(crate) fn remove_point(&mut self, id: ItemId, index: usize) -> Option<ItemPoint> {
        let item = self.items.get_mut(&id)?;
        if index >= item.points.len() {
            return None;
        }
        let point = item.points.remove(index);
        for remote in &point.connections {
            if let Some(p) = self.point_mut(*remote) {
                p.remove_connection(PointRef::new(id, index));
            }
        }
        self.renumber(id, |i| if i > index { i - 1 } else { i });
        Some(point)
    }

    fn renumber(&mut self, id: ItemId, map: impl Fn(usize) -> usize) {
        for item in self.items.values_mut() {
            for point in &mut item.points {
                for c in &mut point.connections {
                    if c.item == id {
                        c.index = map(c.index);
                    }
                }
            }
        }
    }

    /// Ids of the selected items, in paint order.
    pub fn selected_ids(&self) -> Vec<ItemId> {
        self.items.values().filter(|i| i.selected).map(|i| i.id).collect()
    }

    pub(crate) fn set_selection(&mut self, ids: &[ItemId]) {
        for item in self.items.values_mut() {
            item.selected = ids.contains(&item.id);
        }
    }

    /// Topmost item whose shape contains the scene point.
    pub fn item_at(&self, p: Point, defaults: &Style) -> Option<ItemId> {
        self.items
            .values()
            .rev()
            .find(|item| item.contains_scene_point(p, defaults))
            .map(|item| item.id)
    }

    /// Items whose scene bounds lie entirely inside `rect`, in paint order.
    pub fn items_in_rect(&self, rect: &Rect, defaults: &Style) -> Vec<ItemId> {
        let rect = rect.normalized();
        self.items
            .values()
            .filter(|item| rect.contains_rect(&item.scene_bounding_rect(defaults)))
            .map(|item| item.id)
            .collect()
    }

    /// Describe every broken connection invariant on the page: one-sided
    /// links, links to missing points, links between points of the same
    /// item, and links touching points that are not connection points.
    pub fn check_connections(&self) -> Vec<String> {
        let mut problems = Vec::new();
        check_level(self.items.values(), &mut problems);
        problems
    }
}

fn check_level<'a>(items: impl Iterator<Item = &'a Item> + Clone, problems: &mut Vec<String>) {
    let find = |r: PointRef| {
        items
            .clone()
            .find(|i| i.id == r.item)
            .and_then(|i| i.points.get(r.index))
    };
    for item in items.clone() {
        for (index, point) in item.points.iter().enumerate() {
            let here = PointRef::new(item.id, index);
            for &remote in &point.connections {
                if remote.item == item.id {
                    problems.push(format!("{here} is connected to its own item"));
                }
                if !point.is_connection() {
                    problems.push(format!("{here} is not a connection point"));
                }
                match find(remote) {
                    None => problems.push(format!("{here} refers to missing point {remote}")),
                    Some(other) if !other.is_connected_to(here) => {
                        problems.push(format!("{here} -> {remote} is not mirrored"))
                    }
                    Some(_) => {}
                }
            }
        }
        let children = item.children();
        if !children.is_empty() {
            check_level(children.iter(), problems);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Document {
    pub settings: DocumentSettings,
    pub default_style: Style,
    pages: Vec<Page>,
    current_page: usize,
    mode: Mode,
    pub(crate) history: History,
    next_id: u64,
    listeners: Listeners,
    muted: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document with default settings and one empty page.
    pub fn new() -> Self {
        let mut doc = Self::empty();
        let id = doc.new_page_id();
        doc.pages.push(Page::new(id, "Page 1"));
        doc
    }

    /// A document with default settings and no pages.
    pub(crate) fn empty() -> Self {
        Self {
            settings: DocumentSettings::default(),
            default_style: Style::default(),
            pages: Vec::new(),
            current_page: 0,
            mode: Mode::default(),
            history: History::default(),
            next_id: 1,
            listeners: Listeners::default(),
            muted: 0,
        }
    }

    // ── Ids ──────────────────────────────────────────────────────────────

    pub fn new_item_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn new_page_id(&mut self) -> PageId {
        let id = PageId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Make sure future ids never collide with `id`.
    pub(crate) fn reserve_id(&mut self, id: u64) {
        self.next_id = self.next_id.max(id + 1);
    }

    // ── Pages ────────────────────────────────────────────────────────────

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn page_index(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    pub fn page_by_id(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub(crate) fn page_by_id_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current_page)
    }

    pub fn current_page_id(&self) -> Option<PageId> {
        self.current_page().map(|p| p.id)
    }

    pub fn set_current_page(&mut self, index: usize) {
        if index < self.pages.len() && index != self.current_page {
            self.current_page = index;
            self.emit(DocumentEvent::PagesChanged);
        }
    }

    pub fn add_page(&mut self, page: Page) {
        let index = self.pages.len();
        self.insert_page(index, page);
    }

    pub fn insert_page(&mut self, index: usize, page: Page) {
        let index = index.min(self.pages.len());
        self.pages.insert(index, page);
        if index <= self.current_page && self.pages.len() > 1 {
            self.current_page += 1;
        }
        self.emit(DocumentEvent::PagesChanged);
    }

    /// Remove a page. The current page index follows its page, or moves to
    /// the previous page when the current page itself is removed.
    pub fn remove_page(&mut self, index: usize) -> Option<Page> {
        if index >= self.pages.len() {
            return None;
        }
        let page = self.pages.remove(index);
        if index < self.current_page || (index == self.current_page && index > 0) {
            self.current_page -= 1;
        }
        self.emit(DocumentEvent::PagesChanged);
        Some(page)
    }

    /// Item lookup across all pages.
    pub fn find_item(&self, id: ItemId) -> Option<(PageId, &Item)> {
        self.pages
            .iter()
            .find_map(|p| p.item(id).map(|item| (p.id, item)))
    }

    // ── Mode ─────────────────────────────────────────────────────────────

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            self.mode = mode;
            self.emit(DocumentEvent::ModeChanged);
        }
    }

    // ── Properties ───────────────────────────────────────────────────────

    /// Look up a document setting, falling back to the default style.
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        self.settings
            .property(name)
            .or_else(|| self.default_style.get(name).cloned())
    }

    /// Set a document setting or default style property without recording
    /// an undo step.
    pub fn set_property(&mut self, name: &str, value: PropertyValue) -> bool {
        let changed = if self.settings.property(name).is_some() {
            self.settings.set_property(name, &value)
        } else {
            let styled =
                self.default_style.get(name).is_some() && self.default_style.set(name, value);
            if styled {
                let defaults = &self.default_style;
                let moved: Vec<(PageId, Vec<ItemId>)> = self
                    .pages
                    .iter_mut()
                    .map(|page| (page.id(), page.refresh_groups(defaults)))
                    .filter(|(_, ids)| !ids.is_empty())
                    .collect();
                for (page, ids) in moved {
                    self.emit(DocumentEvent::GeometryChanged(page, ids));
                }
            }
            styled
        };
        if changed {
            self.emit(DocumentEvent::DocumentPropertyChanged(name.to_string()));
        }
        changed
    }

    /// Round a scene position to the grid when grid snapping is enabled.
    pub fn snap_to_grid(&self, p: Point) -> Point {
        let grid = &self.settings.grid;
        if !grid.snap || grid.spacing <= 0.0 {
            return p;
        }
        Point::new(
            (p.x / grid.spacing).round() * grid.spacing,
            (p.y / grid.spacing).round() * grid.spacing,
        )
    }

    // ── Events ───────────────────────────────────────────────────────────

    /// Register a change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&DocumentEvent) + 'static) {
        self.listeners.0.push(Box::new(listener));
    }

    pub(crate) fn emit(&mut self, event: DocumentEvent) {
        if self.muted > 0 {
            return;
        }
        for listener in &mut self.listeners.0 {
            listener(&event);
        }
    }

    pub(crate) fn mute(&mut self) {
        self.muted += 1;
    }

    pub(crate) fn unmute(&mut self) {
        self.muted = self.muted.saturating_sub(1);
    }

    // ── History ──────────────────────────────────────────────────────────

    /// Commit a fully built command: apply it once and record it.
    pub fn push(&mut self, command: Command) {
        debug!(text = command.text(), children = command.children().len(), "push command");
        let was_clean = self.is_clean();
        command.redo(self);
        let mut history = std::mem::take(&mut self.history);
        history.push(command);
        self.history = history;
        self.notify_clean(was_clean);
    }

    pub fn undo(&mut self) -> bool {
        let was_clean = self.is_clean();
        let mut history = std::mem::take(&mut self.history);
        let done = history.undo(self);
        self.history = history;
        self.notify_clean(was_clean);
        done
    }

    pub fn redo(&mut self) -> bool {
        let was_clean = self.is_clean();
        let mut history = std::mem::take(&mut self.history);
        let done = history.redo(self);
        self.history = history;
        self.notify_clean(was_clean);
        done
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_text(&self) -> Option<&str> {
        self.history.undo_text()
    }

    pub fn is_clean(&self) -> bool {
        self.history.is_clean()
    }

    /// Mark the current state as saved.
    pub fn set_clean(&mut self) {
        let was_clean = self.is_clean();
        self.history.set_clean();
        self.notify_clean(was_clean);
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn notify_clean(&mut self, was_clean: bool) {
        let clean = self.is_clean();
        if clean != was_clean {
            self.emit(DocumentEvent::CleanChanged(clean));
        }
    }

    /// Replace content and settings with `other`, keeping listeners.
    /// History is reset and the result is clean.
    pub(crate) fn replace_with(&mut self, other: Document) {
        self.settings = other.settings;
        self.default_style = other.default_style;
        self.pages = other.pages;
        self.current_page = 0;
        self.next_id = other.next_id;
        self.history = History::default();
        self.emit(DocumentEvent::PagesChanged);
        self.emit(DocumentEvent::CleanChanged(true));
    }

    /// Connection invariant violations on every page.
    pub fn check_connections(&self) -> Vec<String> {
        self.pages
            .iter()
            .flat_map(|p| {
                p.check_connections()
                    .into_iter()
                    .map(move |problem| format!("{}: {problem}", p.name))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn line(id: u64, a: (f64, f64), b: (f64, f64)) -> Item {
        Item::line(ItemId(id), Point::new(a.0, a.1), Point::new(b.0, b.1))
    }

    #[test]
    fn test_insert_and_remove_item_mirror_connections() {
        let mut page = Page::new(PageId(1), "p");
        page.add_item(line(1, (0.0, 0.0), (10.0, 0.0)));
        page.add_item(line(2, (10.0, 0.0), (10.0, 10.0)));
        let a = PointRef::new(ItemId(1), 1);
        let b = PointRef::new(ItemId(2), 0);
        page.connect(a, b);
        assert!(page.is_connected(a, b) && page.is_connected(b, a));

        let (index, removed) = page.remove_item(ItemId(2)).unwrap();
        assert_eq!(index, 1);
        assert!(!page.is_connected(a, b));
        assert!(removed.points[0].is_connected_to(a));

        page.insert_item(index, removed);
        assert!(page.is_connected(a, b) && page.is_connected(b, a));
        assert!(page.check_connections().is_empty());
    }

    #[test]
    fn test_point_insertion_renumbers_partners() {
        let mut page = Page::new(PageId(1), "p");
        page.add_item(Item::polyline(
            ItemId(1),
            &[Point::ZERO, Point::new(10.0, 0.0), Point::new(20.0, 0.0)],
        ));
        page.add_item(line(2, (20.0, 0.0), (20.0, 10.0)));
        page.connect(PointRef::new(ItemId(1), 2), PointRef::new(ItemId(2), 0));

        page.insert_point(ItemId(1), 1, ItemPoint::new(Point::new(5.0, 0.0), Default::default()));
        assert!(page.is_connected(PointRef::new(ItemId(2), 0), PointRef::new(ItemId(1), 3)));
        assert!(page.check_connections().is_empty());

        page.remove_point(ItemId(1), 1);
        assert!(page.is_connected(PointRef::new(ItemId(2), 0), PointRef::new(ItemId(1), 2)));
        assert!(page.check_connections().is_empty());
    }

    #[test]
    fn test_check_connections_reports_one_sided_link() {
        let mut page = Page::new(PageId(1), "p");
        page.add_item(line(1, (0.0, 0.0), (10.0, 0.0)));
        page.add_item(line(2, (10.0, 0.0), (10.0, 10.0)));
        page.point_mut(PointRef::new(ItemId(1), 1))
            .unwrap()
            .add_connection(PointRef::new(ItemId(2), 0));
        assert_eq!(page.check_connections().len(), 1);
    }

    #[test]
    fn test_item_at_prefers_topmost() {
        let defaults = Style::default();
        let mut page = Page::new(PageId(1), "p");
        page.add_item(Item::rect(ItemId(1), Rect::new(0.0, 0.0, 10.0, 10.0)));
        page.add_item(Item::rect(ItemId(2), Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert_eq!(page.item_at(Point::new(7.0, 7.0), &defaults), Some(ItemId(2)));
        assert_eq!(page.item_at(Point::new(2.0, 2.0), &defaults), Some(ItemId(1)));
        assert_eq!(page.item_at(Point::new(20.0, 2.0), &defaults), None);
        assert_eq!(
            page.items_in_rect(&Rect::new(-1.0, -1.0, 11.0, 11.0), &defaults),
            vec![ItemId(1)]
        );
    }

    #[test]
    fn test_document_properties_and_events() {
        let mut doc = Document::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        doc.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        assert!(doc.set_property(properties::GRID_SPACING, PropertyValue::Number(2.0)));
        assert!(!doc.set_property(properties::GRID_SPACING, PropertyValue::Bool(true)));
        assert!(doc.set_property("pen-width", PropertyValue::Number(1.0)));
        assert!(!doc.set_property("no-such-thing", PropertyValue::Number(1.0)));
        assert_eq!(doc.property(properties::GRID_SPACING), Some(PropertyValue::Number(2.0)));
        assert_eq!(doc.property(properties::UNITS), Some(PropertyValue::Text("mm".into())));
        assert_eq!(seen.borrow().len(), 2);

        assert_eq!(doc.snap_to_grid(Point::new(2.9, 5.1)), Point::new(2.0, 6.0));
    }

    #[test]
    fn test_remove_current_page_moves_index() {
        let mut doc = Document::new();
        let id = doc.new_page_id();
        doc.add_page(Page::new(id, "Page 2"));
        doc.set_current_page(1);
        doc.remove_page(1);
        assert_eq!(doc.current_page_index(), 0);
        assert!(doc.remove_page(5).is_none());
    }
}
