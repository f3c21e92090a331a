use ratatui::prelude::{Direction, Rect};

use crate::part::{PartId, PartKind};

/// Handle of a node in the presentation's arena.
///
/// Handles are never reused, so a stale handle held by a drag gesture or a
/// drop decision resolves to "unknown node" rather than to some other node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// The visual wrapper around one editor or view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pane {
    pub id: PartId,
    pub kind: PartKind,
}

impl Pane {
    pub fn new(id: impl Into<PartId>, kind: PartKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn view(id: impl Into<PartId>) -> Self {
        Self::new(id, PartKind::View)
    }

    pub fn editor(id: impl Into<PartId>) -> Self {
        Self::new(id, PartKind::Editor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Pane(Pane),
    /// Stand-in for a hidden pane, keeping its slot, siblings and weight.
    Placeholder(PartId),
    TabFolder {
        children: Vec<NodeId>,
        selected: Option<usize>,
    },
    Split {
        orientation: Direction,
        children: Vec<NodeId>,
        weights: Vec<f32>,
    },
    /// A container whose panes are all hidden, folded away until one returns.
    ContainerPlaceholder { collapsed: NodeId },
}

impl NodeKind {
    pub fn folder() -> Self {
        NodeKind::TabFolder {
            children: Vec::new(),
            selected: None,
        }
    }

    pub fn split(orientation: Direction) -> Self {
        NodeKind::Split {
            orientation,
            children: Vec::new(),
            weights: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub(crate) ident: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) bounds: Rect,
    pub(crate) kind: NodeKind,
}

impl LayoutNode {
    pub(crate) fn new(ident: String, kind: NodeKind) -> Self {
        Self {
            ident,
            parent: None,
            bounds: Rect::default(),
            kind,
        }
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// Upward link to the owning container. Window roots have none.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn pane(&self) -> Option<&Pane> {
        match &self.kind {
            NodeKind::Pane(pane) => Some(pane),
            _ => None,
        }
    }

    pub fn is_pane(&self) -> bool {
        matches!(self.kind, NodeKind::Pane(_))
    }

    /// Placeholders and collapsed containers take no space on screen.
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Placeholder(_) | NodeKind::ContainerPlaceholder { .. }
        )
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::TabFolder { .. })
    }

    pub fn is_split(&self) -> bool {
        matches!(self.kind, NodeKind::Split { .. })
    }

    pub fn is_container(&self) -> bool {
        self.is_folder() || self.is_split()
    }

    /// Children in on-screen order. A collapsed container's subtree is not
    /// part of the visible child list.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::TabFolder { children, .. } | NodeKind::Split { children, .. } => children,
            _ => &[],
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        match &self.kind {
            NodeKind::TabFolder { children, selected } => {
                selected.and_then(|index| children.get(index).copied())
            }
            _ => None,
        }
    }

    pub fn orientation(&self) -> Option<Direction> {
        match &self.kind {
            NodeKind::Split { orientation, .. } => Some(*orientation),
            _ => None,
        }
    }

    pub fn weights(&self) -> &[f32] {
        match &self.kind {
            NodeKind::Split { weights, .. } => weights,
            _ => &[],
        }
    }
}
