use std::collections::BTreeMap;
use std::fmt;

use ratatui::prelude::{Direction, Rect};

use super::arena::NodeArena;
use super::node::{LayoutNode, NodeId, NodeKind, Pane};
use super::{Side, extent, mean_weight, split_rects_weighted};
use crate::constants::{DEFAULT_WEIGHT, EDITOR_AREA_IDENT, MIN_SASH_SIZE, ROOT_IDENT};
use crate::environment::SharedHost;
use crate::error::LayoutError;
use crate::part::{PartId, PartKind};
use crate::window::{DetachedPlaceholder, DetachedWindow, DetachedWindowId, FloatRect, WindowRef};

/// The arrangement of one page: the main window tree, its detached windows
/// and the zoom and fast-view state laid over them.
///
/// Every structural change goes through this type. Mutations zoom out first,
/// and containers left without visible panes are folded away (main window)
/// or turn their window into a [`DetachedPlaceholder`] (detached windows).
pub struct LayoutPresentation {
    pub(super) arena: NodeArena,
    pub(super) root: NodeId,
    pub(super) editor_area: Option<NodeId>,
    pub(super) detached: BTreeMap<DetachedWindowId, DetachedWindow>,
    pub(super) hidden_windows: Vec<DetachedPlaceholder>,
    pub(super) next_window: usize,
    pub(super) zoomed: Option<NodeId>,
    pub(super) fast_views: Vec<PartId>,
    pub(super) host: SharedHost,
}

impl LayoutPresentation {
    /// An empty main window: a horizontal root split and nothing else.
    pub fn new(host: SharedHost) -> Self {
        let mut arena = NodeArena::default();
        let root = arena.alloc(ROOT_IDENT, NodeKind::split(Direction::Horizontal));
        Self {
            arena,
            root,
            editor_area: None,
            detached: BTreeMap::new(),
            hidden_windows: Vec::new(),
            next_window: 0,
            zoomed: None,
            fast_views: Vec::new(),
            host,
        }
    }

    /// An empty main window whose root split holds the editor area.
    pub fn with_editor_area(host: SharedHost) -> Self {
        let mut presentation = Self::new(host);
        let area = presentation
            .arena
            .alloc(EDITOR_AREA_IDENT, NodeKind::split(Direction::Horizontal));
        match presentation.arena.push_child(presentation.root, area) {
            Ok(()) => presentation.editor_area = Some(area),
            Err(err) => tracing::warn!(%err, "editor area could not be created"),
        }
        presentation
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn editor_area(&self) -> Option<NodeId> {
        self.editor_area
    }

    pub fn node(&self, id: NodeId) -> Option<&LayoutNode> {
        self.arena.get(id)
    }

    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    pub fn detached_windows(&self) -> impl Iterator<Item = &DetachedWindow> {
        self.detached.values()
    }

    pub fn detached_window(&self, id: DetachedWindowId) -> Option<&DetachedWindow> {
        self.detached.get(&id)
    }

    /// Detached windows closed because all of their panes are hidden.
    pub fn hidden_windows(&self) -> &[DetachedPlaceholder] {
        &self.hidden_windows
    }

    pub fn zoomed(&self) -> Option<NodeId> {
        self.zoomed
    }

    pub fn is_zoomed(&self, node: NodeId) -> bool {
        self.zoomed == Some(node)
    }

    pub fn fast_views(&self) -> &[PartId] {
        &self.fast_views
    }

    pub fn is_fast(&self, part: &PartId) -> bool {
        self.fast_views.contains(part)
    }

    fn is_fixed(&self, node: NodeId) -> bool {
        node == self.root || Some(node) == self.editor_area
    }

    fn holds_editor_area(&self, node: NodeId) -> bool {
        self.editor_area
            .is_some_and(|area| self.arena.is_ancestor(node, area))
    }

    fn window_root(&self, window: WindowRef) -> Option<NodeId> {
        match window {
            WindowRef::Main => Some(self.root),
            WindowRef::Detached(id) => self.detached.get(&id).map(|window| window.folder),
        }
    }

    fn window_roots(&self) -> Vec<NodeId> {
        std::iter::once(self.root)
            .chain(self.detached.values().map(|window| window.folder))
            .collect()
    }

    /// The window a node is shown in. Nodes parked in a hidden detached
    /// window belong to none.
    pub fn window_of(&self, node: NodeId) -> Option<WindowRef> {
        if !self.arena.contains(node) {
            return None;
        }
        let top = self.arena.root_of(node);
        if top == self.root {
            return Some(WindowRef::Main);
        }
        self.detached
            .values()
            .find(|window| window.folder == top)
            .map(|window| WindowRef::Detached(window.id))
    }

    pub fn window_of_part(&self, part: &PartId) -> Option<WindowRef> {
        self.find_pane(part).and_then(|node| self.window_of(node))
    }

    pub fn find_pane(&self, part: &PartId) -> Option<NodeId> {
        self.window_roots()
            .into_iter()
            .find_map(|root| self.arena.find_pane(root, part))
    }

    /// Placeholder left behind by `part`, wherever it is parked.
    pub fn find_placeholder(&self, part: &PartId) -> Option<NodeId> {
        self.window_roots()
            .into_iter()
            .chain(self.hidden_windows.iter().map(|hidden| hidden.folder))
            .find_map(|root| self.arena.find_placeholder(root, part))
    }

    /// Every visible pane, main window first.
    pub fn panes(&self) -> Vec<PartId> {
        self.window_roots()
            .into_iter()
            .flat_map(|root| self.arena.walk(root, false))
            .filter_map(|id| self.arena.get(id).and_then(LayoutNode::pane))
            .map(|pane| pane.id.clone())
            .collect()
    }

    fn folder_of(&self, node: NodeId) -> Option<NodeId> {
        self.arena
            .parent(node)
            .filter(|parent| self.arena.get(*parent).is_some_and(LayoutNode::is_folder))
    }

    /// Show a pane. A placeholder left by the same part is replaced in place,
    /// reopening its detached window or unfolding collapsed containers as
    /// needed; otherwise the pane goes to its default position.
    pub fn add_pane(&mut self, pane: Pane) -> Result<NodeId, LayoutError> {
        self.zoom_out();
        self.fast_views.retain(|id| *id != pane.id);
        if let Some(existing) = self.find_pane(&pane.id) {
            return Ok(existing);
        }
        let placeholder = self
            .window_roots()
            .into_iter()
            .find_map(|root| self.arena.find_placeholder(root, &pane.id));
        if let Some(placeholder) = placeholder {
            return self.replace_placeholder(placeholder, pane);
        }
        let hidden = self
            .hidden_windows
            .iter()
            .position(|hidden| self.arena.find_placeholder(hidden.folder, &pane.id).is_some());
        if let Some(index) = hidden {
            let hidden = self.hidden_windows.remove(index);
            if self.open_window(hidden.folder, hidden.bounds).is_some()
                && let Some(placeholder) = self.arena.find_placeholder(hidden.folder, &pane.id)
            {
                return self.replace_placeholder(placeholder, pane);
            }
            tracing::warn!(part = %pane.id, "detached window could not be reopened");
            self.arena.free(hidden.folder);
        }
        self.place_default(pane)
    }

    fn replace_placeholder(
        &mut self,
        placeholder: NodeId,
        pane: Pane,
    ) -> Result<NodeId, LayoutError> {
        let parent = self
            .arena
            .parent(placeholder)
            .ok_or(LayoutError::Orphan(placeholder))?;
        let part = pane.id.clone();
        let node = self.arena.alloc(part.as_str(), NodeKind::Pane(pane));
        if let Err(err) = self.arena.replace_child(parent, placeholder, node) {
            self.arena.discard(node);
            return Err(err);
        }
        self.arena.discard(placeholder);
        self.restore_collapsed(node)?;
        self.arena.select(node);
        tracing::debug!(part = %part, ?node, "placeholder replaced");
        Ok(node)
    }

    /// Unfold every collapsed container between `node` and its window root.
    fn restore_collapsed(&mut self, node: NodeId) -> Result<(), LayoutError> {
        let mut current = node;
        while let Some(parent) = self.arena.parent(current) {
            let collapsed_here = matches!(
                self.arena.node(parent)?.kind,
                NodeKind::ContainerPlaceholder { collapsed } if collapsed == current
            );
            if !collapsed_here {
                current = parent;
                continue;
            }
            let Some(grand) = self.arena.parent(parent) else {
                break;
            };
            self.arena.replace_child(grand, parent, current)?;
            self.arena.discard(parent);
            tracing::debug!(node = ?current, "collapsed container restored");
        }
        Ok(())
    }

    fn place_default(&mut self, pane: Pane) -> Result<NodeId, LayoutError> {
        let part = pane.id.clone();
        let is_editor = pane.kind == PartKind::Editor;
        let node = self.arena.alloc(part.as_str(), NodeKind::Pane(pane));
        let placed = match self.editor_area {
            Some(area) if is_editor => self
                .workbook(area)
                .and_then(|folder| self.arena.push_child(folder, node)),
            _ => self.arena.push_child(self.root, node),
        };
        if let Err(err) = placed {
            self.arena.discard(node);
            return Err(err);
        }
        self.arena.select(node);
        tracing::debug!(part = %part, ?node, "pane added at default position");
        Ok(node)
    }

    /// The editor area folder new editors open into.
    fn workbook(&mut self, area: NodeId) -> Result<NodeId, LayoutError> {
        let existing = self
            .arena
            .walk(area, false)
            .into_iter()
            .find(|id| self.arena.get(*id).is_some_and(LayoutNode::is_folder));
        if let Some(folder) = existing {
            return Ok(folder);
        }
        let folder = self.arena.alloc("workbook", NodeKind::folder());
        self.arena.push_child(area, folder)?;
        Ok(folder)
    }

    /// Hide a pane, leaving a placeholder in its slot.
    pub fn remove_pane(&mut self, part: &PartId) -> Result<NodeId, LayoutError> {
        self.zoom_out();
        let node = self
            .find_pane(part)
            .ok_or_else(|| LayoutError::UnknownPart(part.clone()))?;
        let parent = self.arena.parent(node).ok_or(LayoutError::Orphan(node))?;
        let window = self.window_of(node);
        let placeholder = self
            .arena
            .alloc(part.as_str(), NodeKind::Placeholder(part.clone()));
        if let Err(err) = self.arena.replace_child(parent, node, placeholder) {
            self.arena.discard(placeholder);
            return Err(err);
        }
        self.arena.free(node);
        tracing::debug!(part = %part, ?placeholder, "pane hidden");
        match window {
            Some(WindowRef::Main) => self.collapse_empty(parent)?,
            Some(WindowRef::Detached(id)) => self.retire_if_empty(id),
            None => {}
        }
        Ok(placeholder)
    }

    /// Fold containers holding only placeholders into container placeholders,
    /// walking up from `start`. The root and the editor area always stay.
    fn collapse_empty(&mut self, start: NodeId) -> Result<(), LayoutError> {
        let mut current = start;
        while !self.is_fixed(current) && !self.holds_editor_area(current) {
            let node = self.arena.node(current)?;
            if !node.is_container()
                || node.children().is_empty()
                || self.arena.has_real_pane(current)
            {
                break;
            }
            let ident = node.ident.clone();
            let Some(parent) = self.arena.parent(current) else {
                break;
            };
            if matches!(
                self.arena.node(parent)?.kind,
                NodeKind::ContainerPlaceholder { .. }
            ) {
                break;
            }
            let holder = self
                .arena
                .alloc(ident, NodeKind::ContainerPlaceholder { collapsed: current });
            self.arena.replace_child(parent, current, holder)?;
            self.arena.set_parent(current, Some(holder))?;
            tracing::debug!(node = ?current, ?holder, "container collapsed");
            current = parent;
        }
        Ok(())
    }

    /// Close a detached window that no longer shows any pane. Hidden panes
    /// keep the window around as a placeholder for when they return.
    fn retire_if_empty(&mut self, id: DetachedWindowId) {
        let Some(folder) = self.detached.get(&id).map(|window| window.folder) else {
            return;
        };
        if self.arena.has_real_pane(folder) {
            return;
        }
        let Some(mut window) = self.detached.remove(&id) else {
            return;
        };
        window.close(&mut *self.host.borrow_mut());
        if self.arena.children(folder).is_empty() {
            self.arena.free(folder);
        } else {
            tracing::debug!(window = ?id, bounds = ?window.bounds, "detached window parked");
            self.hidden_windows.push(DetachedPlaceholder {
                bounds: window.bounds,
                folder,
            });
        }
    }

    pub(super) fn open_window(&mut self, folder: NodeId, bounds: FloatRect) -> Option<DetachedWindowId> {
        let id = DetachedWindowId(self.next_window);
        let window = DetachedWindow::open(&mut *self.host.borrow_mut(), id, folder, bounds)?;
        self.next_window += 1;
        self.detached.insert(id, window);
        Some(id)
    }

    /// Remove a part from the layout for good, placeholder included.
    pub fn dispose_pane(&mut self, part: &PartId) -> Result<(), LayoutError> {
        self.zoom_out();
        self.fast_views.retain(|id| id != part);
        let node = self
            .find_pane(part)
            .or_else(|| self.find_placeholder(part))
            .ok_or_else(|| LayoutError::UnknownPart(part.clone()))?;
        self.take_node(node)?;
        self.arena.free(node);
        tracing::debug!(part = %part, "pane disposed");
        Ok(())
    }

    /// Unlink a node from its container and clean up behind it. Returns the
    /// split weight the node held.
    fn take_node(&mut self, node: NodeId) -> Result<f32, LayoutError> {
        let parent = self.arena.parent(node).ok_or(LayoutError::Orphan(node))?;
        let weight = self.arena.remove_child(parent, node)?;
        self.tidy(parent)?;
        Ok(weight)
    }

    /// Drop empty containers, flatten single-child splits and fold
    /// placeholder-only containers, walking up from `start`.
    fn tidy(&mut self, start: NodeId) -> Result<(), LayoutError> {
        let mut current = start;
        loop {
            if self.is_fixed(current) || !self.arena.contains(current) {
                return Ok(());
            }
            let window = self
                .detached
                .values()
                .find(|window| window.folder == current)
                .map(|window| window.id);
            if let Some(window) = window {
                self.retire_if_empty(window);
                return Ok(());
            }
            if let Some(index) = self
                .hidden_windows
                .iter()
                .position(|hidden| hidden.folder == current)
            {
                if self.arena.children(current).is_empty() {
                    let hidden = self.hidden_windows.remove(index);
                    self.arena.free(hidden.folder);
                }
                return Ok(());
            }
            let Some(parent) = self.arena.parent(current) else {
                return Ok(());
            };
            let node = self.arena.node(current)?;
            let children = node.children().to_vec();
            let is_container = node.is_container();
            let is_split = node.is_split();
            let parent_collapsed = matches!(
                self.arena.node(parent)?.kind,
                NodeKind::ContainerPlaceholder { .. }
            );

            if parent_collapsed {
                if !children.is_empty() {
                    return Ok(());
                }
                let Some(grand) = self.arena.parent(parent) else {
                    return Ok(());
                };
                self.arena.remove_child(grand, parent)?;
                self.arena.free(parent);
                current = grand;
            } else if is_container && children.is_empty() {
                self.arena.remove_child(parent, current)?;
                self.arena.discard(current);
                current = parent;
            } else if is_split && children.len() == 1 {
                let only = children[0];
                self.arena.remove_child(current, only)?;
                self.arena.replace_child(parent, current, only)?;
                self.arena.discard(current);
                current = parent;
            } else {
                if self.window_of(current) == Some(WindowRef::Main) {
                    self.collapse_empty(current)?;
                }
                return Ok(());
            }
        }
    }

    fn ensure_movable(&self, node: NodeId) -> Result<(), LayoutError> {
        if self.is_fixed(node) {
            return Err(LayoutError::Immovable);
        }
        let found = self.arena.node(node)?;
        if !(found.is_pane() || found.is_folder()) {
            return Err(LayoutError::InvalidTarget(node));
        }
        if self.window_of(node).is_none() {
            return Err(LayoutError::Orphan(node));
        }
        Ok(())
    }

    /// Take a pane or folder out of the tree so it can be inserted elsewhere.
    /// A detached window's own folder cannot leave its window, so its tabs
    /// move into a fresh folder and the window closes.
    fn lift(&mut self, source: NodeId) -> Result<NodeId, LayoutError> {
        if self.arena.parent(source).is_some() {
            self.take_node(source)?;
            return Ok(source);
        }
        let folder = self.arena.alloc_container(NodeKind::folder());
        self.transfer_tabs(source, folder)?;
        self.tidy(source)?;
        Ok(folder)
    }

    fn transfer_tabs(&mut self, from: NodeId, to: NodeId) -> Result<(), LayoutError> {
        let selected = self.arena.node(from)?.selected();
        for child in self.arena.children(from) {
            self.arena.remove_child(from, child)?;
            self.arena.push_child(to, child)?;
        }
        if let Some(selected) = selected {
            self.arena.select(selected);
        }
        Ok(())
    }

    pub fn move_pane(
        &mut self,
        part: &PartId,
        side: Side,
        reference: &PartId,
    ) -> Result<(), LayoutError> {
        let source = self
            .find_pane(part)
            .ok_or_else(|| LayoutError::UnknownPart(part.clone()))?;
        let reference = self
            .find_pane(reference)
            .ok_or_else(|| LayoutError::UnknownPart(reference.clone()))?;
        self.move_node(source, side, reference)
    }

    /// Dock `source` against `side` of `reference`. A pane inside a folder
    /// docks against the whole folder.
    pub fn move_node(
        &mut self,
        source: NodeId,
        side: Side,
        reference: NodeId,
    ) -> Result<(), LayoutError> {
        self.zoom_out();
        self.ensure_movable(source)?;
        let anchor = self.folder_of(reference).unwrap_or(reference);
        let anchor_node = self.arena.node(anchor)?;
        if !self.is_fixed(anchor) {
            if !(anchor_node.is_pane() || anchor_node.is_folder()) {
                return Err(LayoutError::InvalidTarget(reference));
            }
            let parent = self
                .arena
                .parent(anchor)
                .ok_or(LayoutError::InvalidTarget(reference))?;
            if !self.arena.node(parent)?.is_split() {
                return Err(LayoutError::InvalidTarget(reference));
            }
        }
        if source == anchor || self.arena.is_ancestor(source, anchor) {
            return Err(LayoutError::SelfReference(source));
        }
        if !self.is_fixed(anchor)
            && self.arena.is_ancestor(anchor, source)
            && self.arena.count_real_panes(anchor) <= self.arena.count_real_panes(source)
        {
            return Err(LayoutError::SelfReference(source));
        }

        let shared = self
            .arena
            .parent(source)
            .filter(|parent| Some(*parent) == self.arena.parent(anchor));
        if let Some(parent) = shared
            && self.arena.node(parent)?.orientation() == Some(side.orientation())
        {
            let weight = self.arena.remove_child(parent, source)?;
            let index = self.arena.child_index(parent, anchor)?;
            let index = if side.leading() { index } else { index + 1 };
            self.arena.insert_child(parent, index, source, weight)?;
            tracing::debug!(node = ?source, ?side, ?anchor, "pane reordered");
            return Ok(());
        }

        let moving = self.lift(source)?;
        if let Err(err) = self.insert_beside(moving, side, anchor) {
            tracing::warn!(%err, node = ?moving, "dock target vanished, using default position");
            self.arena.push_child(self.root, moving)?;
            return Err(err);
        }
        tracing::debug!(node = ?moving, ?side, ?anchor, "pane docked");
        Ok(())
    }

    fn insert_beside(
        &mut self,
        moving: NodeId,
        side: Side,
        anchor: NodeId,
    ) -> Result<(), LayoutError> {
        let orientation = side.orientation();
        if anchor == self.root {
            let node = self.arena.node(anchor)?;
            let current = node.orientation().unwrap_or(orientation);
            if current != orientation && node.children().len() > 1 {
                let weights = node.weights().to_vec();
                let inner = self.arena.alloc_container(NodeKind::split(current));
                for (child, weight) in self.arena.children(anchor).into_iter().zip(weights) {
                    self.arena.remove_child(anchor, child)?;
                    self.arena.insert_child(inner, usize::MAX, child, weight)?;
                }
                self.arena.push_child(anchor, inner)?;
            }
            if let NodeKind::Split {
                orientation: fixed, ..
            } = &mut self.arena.node_mut(anchor)?.kind
            {
                *fixed = orientation;
            }
            let weight = mean_weight(self.arena.node(anchor)?.weights());
            let index = if side.leading() { 0 } else { usize::MAX };
            return self.arena.insert_child(anchor, index, moving, weight);
        }

        let parent = self.arena.parent(anchor).ok_or(LayoutError::Orphan(anchor))?;
        let index = self.arena.child_index(parent, anchor)?;
        if self.arena.node(parent)?.orientation() == Some(orientation) {
            let mut half = DEFAULT_WEIGHT;
            if let NodeKind::Split { weights, .. } = &mut self.arena.node_mut(parent)?.kind
                && let Some(weight) = weights.get_mut(index)
            {
                *weight /= 2.0;
                half = *weight;
            }
            let index = if side.leading() { index } else { index + 1 };
            return self.arena.insert_child(parent, index, moving, half);
        }

        let split = self.arena.alloc_container(NodeKind::split(orientation));
        if let Err(err) = self.arena.replace_child(parent, anchor, split) {
            self.arena.discard(split);
            return Err(err);
        }
        let (first, second) = if side.leading() {
            (moving, anchor)
        } else {
            (anchor, moving)
        };
        self.arena.insert_child(split, 0, first, DEFAULT_WEIGHT)?;
        self.arena.insert_child(split, 1, second, DEFAULT_WEIGHT)
    }

    pub fn stack(&mut self, part: &PartId, reference: &PartId) -> Result<(), LayoutError> {
        let source = self
            .find_pane(part)
            .ok_or_else(|| LayoutError::UnknownPart(part.clone()))?;
        let reference = self
            .find_pane(reference)
            .ok_or_else(|| LayoutError::UnknownPart(reference.clone()))?;
        self.stack_node(source, reference)
    }

    /// Put `source` in the same tab folder as `reference`, wrapping the
    /// reference in a new folder when it has none. A dragged folder brings
    /// all of its tabs.
    pub fn stack_node(&mut self, source: NodeId, reference: NodeId) -> Result<(), LayoutError> {
        self.zoom_out();
        self.ensure_movable(source)?;
        if source == reference || self.arena.is_ancestor(source, reference) {
            return Err(LayoutError::SelfReference(source));
        }
        let target = self.arena.node(reference)?;
        if !(target.is_pane() || target.is_folder()) {
            return Err(LayoutError::InvalidTarget(reference));
        }
        let source_is_folder = self.arena.node(source)?.is_folder();
        let reference_folder = if target.is_folder() {
            Some(reference)
        } else {
            self.folder_of(reference)
        };

        if !source_is_folder
            && let Some(folder) = reference_folder
            && self.folder_of(source) == Some(folder)
        {
            if self.arena.count_real_panes(folder) <= 1 {
                return Err(LayoutError::SelfReference(source));
            }
            self.arena.remove_child(folder, source)?;
            self.arena.push_child(folder, source)?;
            self.arena.select(source);
            return Ok(());
        }

        let folder = self.target_folder(reference)?;
        if source_is_folder {
            self.transfer_tabs(source, folder)?;
            if self.arena.parent(source).is_some() {
                self.take_node(source)?;
                self.arena.discard(source);
            } else {
                self.tidy(source)?;
            }
        } else {
            self.take_node(source)?;
            self.arena.push_child(folder, source)?;
            self.arena.select(source);
        }
        tracing::debug!(node = ?source, ?folder, "stacked");
        Ok(())
    }

    fn target_folder(&mut self, reference: NodeId) -> Result<NodeId, LayoutError> {
        if self.arena.node(reference)?.is_folder() {
            return Ok(reference);
        }
        if let Some(folder) = self.folder_of(reference) {
            return Ok(folder);
        }
        let parent = self
            .arena
            .parent(reference)
            .ok_or(LayoutError::Orphan(reference))?;
        let folder = self.arena.alloc_container(NodeKind::folder());
        if let Err(err) = self.arena.replace_child(parent, reference, folder) {
            self.arena.discard(folder);
            return Err(err);
        }
        self.arena.push_child(folder, reference)?;
        Ok(folder)
    }

    pub fn detach(
        &mut self,
        part: &PartId,
        bounds: FloatRect,
    ) -> Result<Option<DetachedWindowId>, LayoutError> {
        let source = self
            .find_pane(part)
            .ok_or_else(|| LayoutError::UnknownPart(part.clone()))?;
        self.detach_node(source, bounds)
    }

    /// Move a pane, or a folder with all its tabs, into a new floating window.
    /// Returns `None` without touching the layout when the host cannot float
    /// windows.
    pub fn detach_node(
        &mut self,
        source: NodeId,
        bounds: FloatRect,
    ) -> Result<Option<DetachedWindowId>, LayoutError> {
        if !self.host.borrow().supports_floating() {
            tracing::debug!(node = ?source, "detach ignored, host has no floating windows");
            return Ok(None);
        }
        self.zoom_out();
        self.ensure_movable(source)?;

        if let Some(WindowRef::Detached(window)) = self.window_of(source) {
            let folder = self.window_root(WindowRef::Detached(window));
            let lone = folder.is_some_and(|folder| {
                self.arena.count_real_panes(folder) == self.arena.count_real_panes(source)
            });
            if lone {
                self.move_detached_window(window, bounds)?;
                return Ok(Some(window));
            }
        }

        let folder = self.arena.alloc_container(NodeKind::folder());
        let Some(window) = self.open_window(folder, bounds) else {
            self.arena.discard(folder);
            tracing::warn!(node = ?source, "host refused a floating surface");
            return Ok(None);
        };
        if self.arena.node(source)?.is_folder() {
            self.transfer_tabs(source, folder)?;
            if self.arena.parent(source).is_some() {
                self.take_node(source)?;
                self.arena.discard(source);
            } else {
                self.tidy(source)?;
            }
        } else {
            self.take_node(source)?;
            self.arena.push_child(folder, source)?;
            self.arena.select(source);
        }
        tracing::debug!(node = ?source, ?window, "detached");
        Ok(Some(window))
    }

    pub fn move_detached_window(
        &mut self,
        id: DetachedWindowId,
        bounds: FloatRect,
    ) -> Result<(), LayoutError> {
        let window = self
            .detached
            .get_mut(&id)
            .ok_or(LayoutError::UnknownWindow(id))?;
        window.move_to(&mut *self.host.borrow_mut(), bounds);
        tracing::debug!(window = ?id, bounds = ?window.bounds, "detached window moved");
        Ok(())
    }

    pub fn zoom_in(&mut self, part: &PartId) -> Result<bool, LayoutError> {
        let node = self
            .find_pane(part)
            .ok_or_else(|| LayoutError::UnknownPart(part.clone()))?;
        self.zoom_node(node)
    }

    /// Give the whole window to a pane's folder (or to the pane when it has
    /// none). Any other zoom ends. Returns whether the zoom state changed.
    pub fn zoom_node(&mut self, node: NodeId) -> Result<bool, LayoutError> {
        let found = self.arena.node(node)?;
        if !(found.is_pane() || found.is_folder()) || self.is_fixed(node) {
            return Err(LayoutError::InvalidTarget(node));
        }
        if self.window_of(node).is_none() {
            return Err(LayoutError::Orphan(node));
        }
        let unit = self.folder_of(node).unwrap_or(node);
        self.arena.select(node);
        if self.zoomed == Some(unit) {
            return Ok(false);
        }
        self.zoomed = Some(unit);
        tracing::debug!(node = ?unit, "zoomed in");
        Ok(true)
    }

    /// Returns whether a zoom was active.
    pub fn zoom_out(&mut self) -> bool {
        match self.zoomed.take() {
            Some(unit) => {
                tracing::debug!(node = ?unit, "zoomed out");
                true
            }
            None => false,
        }
    }

    /// Whether `node` sits inside the zoomed unit, or nothing is zoomed in
    /// its window.
    pub fn is_within_zoom(&self, node: NodeId) -> bool {
        match self.zoomed {
            None => true,
            Some(unit) if self.window_of(unit) != self.window_of(node) => true,
            Some(unit) => unit == node || self.arena.is_ancestor(unit, node),
        }
    }

    /// Select a pane's tab. Returns whether the selection changed.
    pub fn bring_to_top(&mut self, part: &PartId) -> Result<bool, LayoutError> {
        let node = self
            .find_pane(part)
            .ok_or_else(|| LayoutError::UnknownPart(part.clone()))?;
        Ok(self.arena.select(node))
    }

    /// Minimize a view to a fast view. Its pane is hidden like any other.
    pub fn set_fast(&mut self, part: &PartId) -> Result<(), LayoutError> {
        let node = self
            .find_pane(part)
            .ok_or_else(|| LayoutError::UnknownPart(part.clone()))?;
        let kind = self.arena.node(node)?.pane().map(|pane| pane.kind);
        if kind != Some(PartKind::View) {
            return Err(LayoutError::NotMinimizable(part.clone()));
        }
        self.remove_pane(part)?;
        if !self.fast_views.contains(part) {
            self.fast_views.push(part.clone());
        }
        tracing::debug!(part = %part, "fast view");
        Ok(())
    }

    pub fn restore_fast(&mut self, part: &PartId) -> Result<NodeId, LayoutError> {
        if !self.is_fast(part) {
            return Err(LayoutError::UnknownPart(part.clone()));
        }
        self.add_pane(Pane::view(part.clone()))
    }

    /// Drop a fast view without showing it again. Its placeholder stays.
    pub fn clear_fast(&mut self, part: &PartId) -> bool {
        let before = self.fast_views.len();
        self.fast_views.retain(|id| id != part);
        before != self.fast_views.len()
    }

    /// Hide every pane `keep` rejects.
    pub fn retain_panes<F>(&mut self, keep: F) -> Result<(), LayoutError>
    where
        F: Fn(&PartId) -> bool,
    {
        let doomed: Vec<PartId> = self.panes().into_iter().filter(|id| !keep(id)).collect();
        for part in doomed {
            self.remove_pane(&part)?;
        }
        Ok(())
    }

    /// Shift the sash after the `index`-th visible child of `split` by
    /// `delta` units, using the bounds from the last layout pass.
    pub fn resize_sash(
        &mut self,
        split: NodeId,
        index: usize,
        delta: i16,
    ) -> Result<bool, LayoutError> {
        let node = self.arena.node(split)?;
        let NodeKind::Split {
            orientation,
            children,
            weights,
        } = &node.kind
        else {
            return Err(LayoutError::InvalidTarget(split));
        };
        let visible: Vec<usize> = children
            .iter()
            .enumerate()
            .filter(|(_, child)| self.arena.get(**child).is_some_and(|n| !n.is_placeholder()))
            .map(|(slot, _)| slot)
            .collect();
        if index + 1 >= visible.len() {
            return Ok(false);
        }
        let mut sizes: Vec<i32> = visible
            .iter()
            .map(|slot| {
                self.arena
                    .get(children[*slot])
                    .map_or(0, |child| i32::from(extent(*orientation, child.bounds)))
            })
            .collect();
        let min_size = i32::from(MIN_SASH_SIZE);
        let total_pair = sizes[index] + sizes[index + 1];
        if total_pair < min_size * 2 {
            return Ok(false);
        }
        let left = (sizes[index] + i32::from(delta)).clamp(min_size, total_pair - min_size);
        sizes[index] = left;
        sizes[index + 1] = total_pair - left;

        let visible_weight: f32 = visible.iter().filter_map(|slot| weights.get(*slot)).sum();
        let total_size: i32 = sizes.iter().sum();
        let mut updated = weights.clone();
        for (slot, size) in visible.iter().zip(&sizes) {
            if let Some(weight) = updated.get_mut(*slot) {
                *weight = visible_weight * (*size).max(1) as f32 / total_size as f32;
            }
        }
        if let NodeKind::Split { weights, .. } = &mut self.arena.node_mut(split)?.kind {
            *weights = updated;
        }
        Ok(true)
    }

    pub fn layout(&mut self, area: Rect) -> Vec<(PartId, Rect)> {
        self.regions(WindowRef::Main, area)
    }

    /// Compute bounds for every node of a window and return the visible
    /// panes. Detached windows use their own local area when `area` is
    /// `None`.
    pub fn regions(&mut self, window: WindowRef, area: impl Into<Option<Rect>>) -> Vec<(PartId, Rect)> {
        let Some(root) = self.window_root(window) else {
            return Vec::new();
        };
        let area = area.into().unwrap_or_else(|| match window {
            WindowRef::Detached(id) => self
                .detached
                .get(&id)
                .map(DetachedWindow::area)
                .unwrap_or_default(),
            WindowRef::Main => Rect::default(),
        });
        for id in self.arena.walk(root, true) {
            if let Ok(node) = self.arena.node_mut(id) {
                node.bounds = Rect::default();
            }
        }
        let start = match self.zoomed {
            Some(unit) if self.window_of(unit) == Some(window) => unit,
            _ => root,
        };
        let mut out = Vec::new();
        self.assign_bounds(start, area, true, &mut out);
        out
    }

    fn assign_bounds(
        &mut self,
        id: NodeId,
        area: Rect,
        shown: bool,
        out: &mut Vec<(PartId, Rect)>,
    ) {
        let Some(node) = self.arena.get(id) else {
            return;
        };
        if node.is_placeholder() {
            return;
        }
        let kind = node.kind.clone();
        if let Ok(node) = self.arena.node_mut(id) {
            node.bounds = area;
        }
        match kind {
            NodeKind::Pane(pane) => {
                if shown {
                    out.push((pane.id, area));
                }
            }
            NodeKind::TabFolder { children, selected } => {
                for (index, child) in children.into_iter().enumerate() {
                    self.assign_bounds(child, area, shown && selected == Some(index), out);
                }
            }
            NodeKind::Split {
                orientation,
                children,
                weights,
            } => {
                let visible: Vec<(NodeId, f32)> = children
                    .into_iter()
                    .zip(weights)
                    .filter(|(child, _)| {
                        self.arena.get(*child).is_some_and(|n| !n.is_placeholder())
                    })
                    .collect();
                let shares: Vec<f32> = visible.iter().map(|(_, weight)| *weight).collect();
                let rects = split_rects_weighted(orientation, area, &shares);
                for ((child, _), rect) in visible.into_iter().zip(rects) {
                    self.assign_bounds(child, rect, shown, out);
                }
            }
            NodeKind::Placeholder(_) | NodeKind::ContainerPlaceholder { .. } => {}
        }
    }

    /// Close every floating surface this presentation holds.
    pub fn close_windows(&mut self) {
        let mut host = self.host.borrow_mut();
        for window in self.detached.values_mut() {
            window.close(&mut *host);
        }
    }

    /// One line per window: `main: h(V1 0.50, tabs[*V2, ?V3] 0.50)`.
    ///
    /// `*` marks the selected tab, `?` a placeholder and `~` a collapsed
    /// container. Weights are normalized per split.
    pub fn describe(&self) -> String {
        let mut out = format!("main: {}\n", self.describe_node(self.root));
        for window in self.detached.values() {
            let b = window.bounds;
            out.push_str(&format!(
                "detached {} @ {},{} {}x{}: {}\n",
                window.id.0,
                b.x,
                b.y,
                b.width,
                b.height,
                self.describe_node(window.folder)
            ));
        }
        for hidden in &self.hidden_windows {
            let b = hidden.bounds;
            out.push_str(&format!(
                "hidden @ {},{} {}x{}: {}\n",
                b.x,
                b.y,
                b.width,
                b.height,
                self.describe_node(hidden.folder)
            ));
        }
        if let Some(node) = self.zoomed.and_then(|unit| self.arena.get(unit)) {
            out.push_str(&format!("zoom: {}\n", node.ident));
        }
        if !self.fast_views.is_empty() {
            let fast: Vec<&str> = self.fast_views.iter().map(PartId::as_str).collect();
            out.push_str(&format!("fast: {}\n", fast.join(", ")));
        }
        out
    }

    fn describe_node(&self, id: NodeId) -> String {
        let Some(node) = self.arena.get(id) else {
            return "!".to_string();
        };
        match &node.kind {
            NodeKind::Pane(pane) => pane.id.to_string(),
            NodeKind::Placeholder(part) => format!("?{part}"),
            NodeKind::ContainerPlaceholder { collapsed } => {
                format!("~{}", self.describe_node(*collapsed))
            }
            NodeKind::TabFolder { children, selected } => {
                let tabs: Vec<String> = children
                    .iter()
                    .enumerate()
                    .map(|(index, child)| {
                        let mark = if *selected == Some(index) { "*" } else { "" };
                        format!("{mark}{}", self.describe_node(*child))
                    })
                    .collect();
                format!("tabs[{}]", tabs.join(", "))
            }
            NodeKind::Split {
                orientation,
                children,
                weights,
            } => {
                let total: f32 = weights.iter().sum();
                let parts: Vec<String> = children
                    .iter()
                    .zip(weights)
                    .map(|(child, weight)| {
                        let share = if total > 0.0 { weight / total } else { 0.0 };
                        format!("{} {share:.2}", self.describe_node(*child))
                    })
                    .collect();
                let prefix = if Some(id) == self.editor_area {
                    "editors:"
                } else {
                    ""
                };
                let dir = match orientation {
                    Direction::Horizontal => "h",
                    Direction::Vertical => "v",
                };
                format!("{prefix}{dir}({})", parts.join(", "))
            }
        }
    }
}

impl fmt::Debug for LayoutPresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutPresentation")
            .field("root", &self.root)
            .field("editor_area", &self.editor_area)
            .field("detached", &self.detached)
            .field("hidden_windows", &self.hidden_windows)
            .field("zoomed", &self.zoomed)
            .field("fast_views", &self.fast_views)
            .finish_non_exhaustive()
    }
}
