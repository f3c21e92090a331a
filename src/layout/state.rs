use std::collections::BTreeMap;

use ratatui::prelude::{Direction, Rect};

use super::arena::NodeArena;
use super::node::{LayoutNode, NodeId, NodeKind, Pane};
use super::presentation::LayoutPresentation;
use crate::constants::DEFAULT_WEIGHT;
use crate::environment::SharedHost;
use crate::error::RestoreError;
use crate::part::{PartId, PartKind};
use crate::persist::Memento;
use crate::window::{DetachedPlaceholder, FloatRect};

/// Split weights are stored as integer shares of this total.
const WEIGHT_SCALE: f32 = 10_000.0;

impl LayoutPresentation {
    /// Snapshot every window tree, parked windows, zoom and fast views.
    pub fn save_state(&self) -> Memento {
        let mut memento = Memento::new("layout");
        let mut main = Memento::new("main");
        main.add_child(self.save_node(self.root));
        memento.add_child(main);
        for window in self.detached.values() {
            let mut saved = float_rect_memento("detached", window.bounds);
            saved.add_child(self.save_node(window.folder));
            memento.add_child(saved);
        }
        for hidden in &self.hidden_windows {
            let mut saved = float_rect_memento("detached-placeholder", hidden.bounds);
            saved.add_child(self.save_node(hidden.folder));
            memento.add_child(saved);
        }
        for part in &self.fast_views {
            memento.create_child("fast").set("part", part.as_str());
        }
        memento
    }

    fn save_node(&self, id: NodeId) -> Memento {
        let Some(node) = self.arena.get(id) else {
            return Memento::new("missing");
        };
        let mut saved = match &node.kind {
            NodeKind::Pane(pane) => Memento::new("pane")
                .with("part", pane.id.as_str())
                .with("kind", pane.kind.as_str()),
            NodeKind::Placeholder(part) => Memento::new("placeholder").with("part", part.as_str()),
            NodeKind::ContainerPlaceholder { collapsed } => {
                let mut saved = Memento::new("collapsed");
                saved.add_child(self.save_node(*collapsed));
                saved
            }
            NodeKind::TabFolder { children, selected } => {
                let mut saved = Memento::new("folder");
                if let Some(index) = selected.and_then(|index| i64::try_from(index).ok()) {
                    saved.set("selected", index);
                }
                for child in children {
                    saved.add_child(self.save_node(*child));
                }
                saved
            }
            NodeKind::Split {
                orientation,
                children,
                weights,
            } => {
                let mut saved = Memento::new("split").with(
                    "orientation",
                    match orientation {
                        Direction::Horizontal => "h",
                        Direction::Vertical => "v",
                    },
                );
                let total: f32 = weights.iter().sum();
                for (child, weight) in children.iter().zip(weights) {
                    let share = if total > 0.0 {
                        weight / total
                    } else {
                        1.0 / children.len() as f32
                    };
                    let mut child = self.save_node(*child);
                    child.set("weight", (share * WEIGHT_SCALE).round() as i64);
                    saved.add_child(child);
                }
                saved
            }
        };
        saved
            .set("ident", node.ident.as_str())
            .set("x", node.bounds.x)
            .set("y", node.bounds.y)
            .set("width", node.bounds.width)
            .set("height", node.bounds.height);
        if Some(id) == self.editor_area {
            saved.set("editor-area", true);
        }
        if self.zoomed == Some(id) {
            saved.set("zoomed", true);
        }
        saved
    }

    /// Rebuild a presentation from [`save_state`](Self::save_state) output.
    /// Detached windows reopen through `host`; those the host refuses come
    /// back parked.
    pub fn restore_state(host: SharedHost, memento: &Memento) -> Result<Self, RestoreError> {
        let mut builder = Builder::default();
        let main = memento.require_child("main")?;
        let root_saved = main
            .children()
            .first()
            .ok_or_else(|| RestoreError::MissingChild {
                element: main.kind().to_string(),
                child: "split",
            })?;
        if root_saved.kind() != "split" {
            return Err(RestoreError::InvalidValue {
                element: main.kind().to_string(),
                key: "type",
            });
        }
        let root = builder.node(root_saved)?;

        let mut windows = Vec::new();
        for (kind, parked) in [("detached", false), ("detached-placeholder", true)] {
            for saved in memento.children_of(kind) {
                let bounds = float_rect(saved)?;
                let folder_saved = saved
                    .children()
                    .first()
                    .filter(|child| child.kind() == "folder")
                    .ok_or_else(|| RestoreError::MissingChild {
                        element: saved.kind().to_string(),
                        child: "folder",
                    })?;
                let folder = builder.node(folder_saved)?;
                windows.push((folder, bounds, parked));
            }
        }
        let fast_views = memento
            .children_of("fast")
            .map(|fast| fast.require_str("part").map(PartId::new))
            .collect::<Result<Vec<_>, _>>()?;

        let mut presentation = LayoutPresentation {
            arena: builder.arena,
            root,
            editor_area: builder.editor_area,
            detached: BTreeMap::new(),
            hidden_windows: Vec::new(),
            next_window: 0,
            zoomed: None,
            fast_views,
            host,
        };
        for (folder, bounds, parked) in windows {
            if parked || presentation.open_window(folder, bounds).is_none() {
                presentation.park_panes(folder);
                presentation
                    .hidden_windows
                    .push(DetachedPlaceholder { bounds, folder });
            }
        }
        presentation.zoomed = builder
            .zoomed
            .filter(|node| presentation.window_of(*node).is_some());
        tracing::debug!(
            windows = presentation.detached.len(),
            parked = presentation.hidden_windows.len(),
            "layout restored"
        );
        Ok(presentation)
    }
}

#[derive(Default)]
struct Builder {
    arena: NodeArena,
    editor_area: Option<NodeId>,
    zoomed: Option<NodeId>,
}

impl Builder {
    fn node(&mut self, saved: &Memento) -> Result<NodeId, RestoreError> {
        let ident = saved.require_str("ident")?.to_string();
        let id = match saved.kind() {
            "pane" => {
                let part = saved.require_str("part")?;
                let kind = PartKind::parse(saved.require_str("kind")?).ok_or_else(|| {
                    RestoreError::InvalidValue {
                        element: saved.kind().to_string(),
                        key: "kind",
                    }
                })?;
                self.arena.alloc(ident, NodeKind::Pane(Pane::new(part, kind)))
            }
            "placeholder" => {
                let part = PartId::new(saved.require_str("part")?);
                self.arena.alloc(ident, NodeKind::Placeholder(part))
            }
            "collapsed" => {
                let inner = saved
                    .children()
                    .first()
                    .ok_or_else(|| RestoreError::MissingChild {
                        element: saved.kind().to_string(),
                        child: "node",
                    })?;
                let collapsed = self.node(inner)?;
                let id = self
                    .arena
                    .alloc(ident, NodeKind::ContainerPlaceholder { collapsed });
                self.arena
                    .set_parent(collapsed, Some(id))
                    .map_err(|_| invalid(saved, "children"))?;
                id
            }
            "folder" => {
                let id = self.arena.alloc(ident, NodeKind::folder());
                for child in saved.children() {
                    let child = self.node(child)?;
                    self.arena
                        .push_child(id, child)
                        .map_err(|_| invalid(saved, "children"))?;
                }
                let selected = saved
                    .get_int("selected")
                    .and_then(|index| usize::try_from(index).ok())
                    .and_then(|index| self.arena.children(id).get(index).copied());
                if let Some(selected) = selected {
                    self.arena.select(selected);
                }
                self.arena.fix_selection(id);
                id
            }
            "split" => {
                let orientation = match saved.require_str("orientation")? {
                    "h" => Direction::Horizontal,
                    "v" => Direction::Vertical,
                    _ => return Err(invalid(saved, "orientation")),
                };
                let id = self.arena.alloc(ident, NodeKind::split(orientation));
                for child_saved in saved.children() {
                    let weight = match child_saved.get_int("weight") {
                        None => DEFAULT_WEIGHT,
                        Some(share) if share > 0 => share as f32 / WEIGHT_SCALE,
                        Some(_) => return Err(invalid(child_saved, "weight")),
                    };
                    let child = self.node(child_saved)?;
                    self.arena
                        .insert_child(id, usize::MAX, child, weight)
                        .map_err(|_| invalid(saved, "children"))?;
                }
                id
            }
            other => return Err(RestoreError::UnknownNodeType(other.to_string())),
        };
        let bounds = rect(saved)?;
        if let Ok(node) = self.arena.node_mut(id) {
            node.bounds = bounds;
        }
        if saved.get_bool("editor-area") == Some(true) {
            self.editor_area = Some(id);
        }
        if saved.get_bool("zoomed") == Some(true) {
            self.zoomed = Some(id);
        }
        Ok(id)
    }
}

impl LayoutPresentation {
    /// Turn the panes of a window the host would not reopen into
    /// placeholders, so showing one of them again goes through the usual
    /// placeholder path.
    fn park_panes(&mut self, folder: NodeId) {
        for child in self.arena.children(folder) {
            let Some(pane) = self.arena.get(child).and_then(LayoutNode::pane).cloned() else {
                continue;
            };
            let placeholder = self
                .arena
                .alloc(pane.id.as_str(), NodeKind::Placeholder(pane.id.clone()));
            if self.arena.replace_child(folder, child, placeholder).is_ok() {
                self.arena.free(child);
            } else {
                self.arena.discard(placeholder);
            }
        }
    }
}

fn invalid(saved: &Memento, key: &'static str) -> RestoreError {
    RestoreError::InvalidValue {
        element: saved.kind().to_string(),
        key,
    }
}

fn float_rect_memento(kind: &str, bounds: FloatRect) -> Memento {
    Memento::new(kind)
        .with("x", bounds.x)
        .with("y", bounds.y)
        .with("width", bounds.width)
        .with("height", bounds.height)
}

fn float_rect(saved: &Memento) -> Result<FloatRect, RestoreError> {
    Ok(FloatRect::new(
        saved.require_num("x")?,
        saved.require_num("y")?,
        saved.require_num("width")?,
        saved.require_num("height")?,
    ))
}

/// Node bounds are optional; a node saved before any layout pass has none.
fn rect(saved: &Memento) -> Result<Rect, RestoreError> {
    if saved.get("x").is_none() {
        return Ok(Rect::default());
    }
    Ok(Rect::new(
        saved.require_num("x")?,
        saved.require_num("y")?,
        saved.require_num("width")?,
        saved.require_num("height")?,
    ))
}
