//! Drag and drop policy.
//!
//! [`evaluate`] is a pure function from the facts of a gesture to a
//! decision. [`LayoutPresentation::evaluate_drop`] gathers those facts from
//! the tree and [`LayoutPresentation::apply_drop`] carries a decision out.

use ratatui::prelude::Rect;

use super::node::NodeId;
use super::presentation::LayoutPresentation;
use super::{Side, drop_zone};
use crate::error::LayoutError;
use crate::part::PartKind;
use crate::window::{DetachedWindowId, FloatRect, WindowRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    Center,
    Left,
    Right,
    Top,
    Bottom,
    Offscreen,
    Invalid,
}

impl DropPosition {
    fn from_zone(zone: Option<Side>) -> Self {
        match zone {
            None => DropPosition::Center,
            Some(Side::Left) => DropPosition::Left,
            Some(Side::Right) => DropPosition::Right,
            Some(Side::Top) => DropPosition::Top,
            Some(Side::Bottom) => DropPosition::Bottom,
        }
    }

    pub fn side(self) -> Option<Side> {
        match self {
            DropPosition::Left => Some(Side::Left),
            DropPosition::Right => Some(Side::Right),
            DropPosition::Top => Some(Side::Top),
            DropPosition::Bottom => Some(Side::Bottom),
            _ => None,
        }
    }
}

/// What the pointer is over when the gesture ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Node(NodeId),
    /// The minimize/shortcut bar.
    ShortcutBar,
    /// Outside every window of the page.
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropAction {
    Split { target: NodeId, side: Side },
    Stack { target: NodeId },
    Detach { at: FloatRect },
    MoveWindow { window: DetachedWindowId, at: FloatRect },
    Minimize,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropDecision {
    pub source: NodeId,
    pub position: DropPosition,
    pub action: DropAction,
}

impl DropDecision {
    fn reject(source: NodeId) -> Self {
        Self {
            source,
            position: DropPosition::Invalid,
            action: DropAction::Reject,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.action != DropAction::Reject
    }
}

/// The dragged pane or folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSource {
    pub node: NodeId,
    pub window: WindowRef,
    pub bounds: Rect,
    /// Folder holding the dragged pane, if any.
    pub folder: Option<NodeId>,
    /// The dragged pane is the only visible tab of its folder.
    pub alone_in_folder: bool,
    /// The drag covers every visible pane of a floating window.
    pub alone_in_floating: bool,
    /// Only views are dragged, so the drag may end as fast views.
    pub minimizable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRole {
    Pane { folder: Option<NodeId> },
    Folder,
    EditorArea,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFacts {
    ShortcutBar,
    Outside,
    Node {
        node: NodeId,
        window: WindowRef,
        role: TargetRole,
        bounds: Rect,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropQuery {
    pub source: DragSource,
    pub target: TargetFacts,
    /// Pointer in the coordinates of the target's window.
    pub pointer: (i32, i32),
    pub floating_supported: bool,
}

/// Decide a drop. The first matching rule wins.
pub fn evaluate(query: &DropQuery) -> DropDecision {
    let source = query.source;
    let (node, window, role, bounds) = match query.target {
        TargetFacts::ShortcutBar => {
            if !source.minimizable {
                return DropDecision::reject(source.node);
            }
            return DropDecision {
                source: source.node,
                position: DropPosition::Center,
                action: DropAction::Minimize,
            };
        }
        TargetFacts::Outside => return offscreen(query),
        TargetFacts::Node {
            node,
            window,
            role,
            bounds,
        } => (node, window, role, bounds),
    };

    if window != source.window {
        return offscreen(query);
    }

    let zone = drop_zone(bounds, query.pointer.0, query.pointer.1);
    if role == TargetRole::EditorArea {
        return match zone {
            Some(side) => DropDecision {
                source: source.node,
                position: DropPosition::from_zone(zone),
                action: DropAction::Split { target: node, side },
            },
            None => DropDecision::reject(source.node),
        };
    }

    let target_folder = match role {
        TargetRole::Pane { folder } => folder,
        TargetRole::Folder => Some(node),
        TargetRole::EditorArea | TargetRole::Other => return DropDecision::reject(source.node),
    };

    let position = if window.is_floating() {
        DropPosition::Center
    } else {
        DropPosition::from_zone(zone)
    };

    let onto_self = node == source.node || target_folder == Some(source.node);
    let onto_own_folder =
        source.alone_in_folder && target_folder.is_some() && target_folder == source.folder;
    if onto_self || onto_own_folder {
        return DropDecision::reject(source.node);
    }

    let action = match position.side() {
        Some(side) => DropAction::Split { target: node, side },
        None => DropAction::Stack { target: node },
    };
    DropDecision {
        source: source.node,
        position,
        action,
    }
}

fn offscreen(query: &DropQuery) -> DropDecision {
    let source = query.source;
    if !query.floating_supported {
        return DropDecision::reject(source.node);
    }
    let at = FloatRect::new(
        query.pointer.0,
        query.pointer.1,
        source.bounds.width,
        source.bounds.height,
    );
    let action = match source.window {
        WindowRef::Detached(window) if source.alone_in_floating => {
            DropAction::MoveWindow { window, at }
        }
        _ => DropAction::Detach { at },
    };
    DropDecision {
        source: source.node,
        position: DropPosition::Offscreen,
        action,
    }
}

impl LayoutPresentation {
    fn drag_source(&self, node: NodeId) -> Option<DragSource> {
        let found = self.node(node)?;
        if !(found.is_pane() || found.is_folder()) || Some(node) == self.editor_area() {
            return None;
        }
        let window = self.window_of(node)?;
        let folder = found
            .parent()
            .filter(|parent| self.node(*parent).is_some_and(|p| p.is_folder()));
        let alone_in_folder =
            found.is_pane() && folder.is_some_and(|folder| self.arena.count_real_panes(folder) == 1);
        let alone_in_floating = match window {
            WindowRef::Detached(id) => self.detached_window(id).is_some_and(|window| {
                self.arena.count_real_panes(window.folder) == self.arena.count_real_panes(node)
            }),
            WindowRef::Main => false,
        };
        let minimizable = self.arena.walk(node, false).into_iter().all(|id| {
            self.node(id)
                .and_then(|n| n.pane())
                .is_none_or(|pane| pane.kind == PartKind::View)
        });
        Some(DragSource {
            node,
            window,
            bounds: found.bounds(),
            folder,
            alone_in_folder,
            alone_in_floating,
            minimizable,
        })
    }

    fn target_facts(&self, target: DropTarget) -> Option<TargetFacts> {
        let node = match target {
            DropTarget::ShortcutBar => return Some(TargetFacts::ShortcutBar),
            DropTarget::Outside => return Some(TargetFacts::Outside),
            DropTarget::Node(node) => node,
        };
        let found = self.node(node)?;
        let window = self.window_of(node)?;
        let role = if Some(node) == self.editor_area() {
            TargetRole::EditorArea
        } else if found.is_pane() {
            TargetRole::Pane {
                folder: found
                    .parent()
                    .filter(|parent| self.node(*parent).is_some_and(|p| p.is_folder())),
            }
        } else if found.is_folder() {
            TargetRole::Folder
        } else {
            TargetRole::Other
        };
        Some(TargetFacts::Node {
            node,
            window,
            role,
            bounds: found.bounds(),
        })
    }

    /// Decide what dropping `source` on `target` would do. Uses the bounds of
    /// the last layout pass; never changes the tree.
    pub fn evaluate_drop(&self, source: NodeId, target: DropTarget, pointer: (i32, i32)) -> DropDecision {
        let (Some(source_facts), Some(target_facts)) =
            (self.drag_source(source), self.target_facts(target))
        else {
            return DropDecision::reject(source);
        };
        let decision = evaluate(&DropQuery {
            source: source_facts,
            target: target_facts,
            pointer,
            floating_supported: self.host.borrow().supports_floating(),
        });
        tracing::trace!(?source, ?target, ?decision, "drop evaluated");
        decision
    }

    /// Carry out a decision. Returns whether the layout changed.
    pub fn apply_drop(&mut self, decision: &DropDecision) -> Result<bool, LayoutError> {
        let source = decision.source;
        match decision.action {
            DropAction::Reject => Ok(false),
            DropAction::Split { target, side } => self.move_node(source, side, target).map(|()| true),
            DropAction::Stack { target } => self.stack_node(source, target).map(|()| true),
            DropAction::Detach { at } => Ok(self.detach_node(source, at)?.is_some()),
            DropAction::MoveWindow { window, at } => {
                self.move_detached_window(window, at).map(|()| true)
            }
            DropAction::Minimize => {
                let views: Vec<_> = self
                    .arena
                    .walk(source, false)
                    .into_iter()
                    .filter_map(|id| self.node(id).and_then(|n| n.pane()).map(|p| p.id.clone()))
                    .collect();
                if views.is_empty() {
                    return Err(LayoutError::InvalidTarget(source));
                }
                for part in &views {
                    self.set_fast(part)?;
                }
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(node: usize, window: WindowRef) -> DragSource {
        DragSource {
            node: NodeId(node),
            window,
            bounds: Rect::new(0, 0, 20, 10),
            folder: None,
            alone_in_folder: false,
            alone_in_floating: false,
            minimizable: true,
        }
    }

    fn pane_target(node: usize, window: WindowRef, folder: Option<usize>) -> TargetFacts {
        TargetFacts::Node {
            node: NodeId(node),
            window,
            role: TargetRole::Pane {
                folder: folder.map(NodeId),
            },
            bounds: Rect::new(0, 0, 100, 100),
        }
    }

    fn query(source: DragSource, target: TargetFacts, pointer: (i32, i32)) -> DropQuery {
        DropQuery {
            source,
            target,
            pointer,
            floating_supported: true,
        }
    }

    #[test]
    fn cross_window_drop_goes_offscreen_or_invalid() {
        let other = WindowRef::Detached(DetachedWindowId(0));
        let q = query(source(1, WindowRef::Main), pane_target(2, other, None), (50, 50));
        assert_eq!(evaluate(&q).position, DropPosition::Offscreen);

        let q = DropQuery {
            floating_supported: false,
            ..q
        };
        assert_eq!(evaluate(&q).position, DropPosition::Invalid);
    }

    #[test]
    fn shortcut_bar_minimizes_views_only() {
        let q = query(source(1, WindowRef::Main), TargetFacts::ShortcutBar, (0, 0));
        assert_eq!(evaluate(&q).action, DropAction::Minimize);
        let editor = DragSource {
            minimizable: false,
            ..source(1, WindowRef::Main)
        };
        let q = query(editor, TargetFacts::ShortcutBar, (0, 0));
        assert_eq!(evaluate(&q).action, DropAction::Reject);
    }

    #[test]
    fn editor_area_rejects_center() {
        let target = TargetFacts::Node {
            node: NodeId(9),
            window: WindowRef::Main,
            role: TargetRole::EditorArea,
            bounds: Rect::new(0, 0, 100, 100),
        };
        let q = query(source(1, WindowRef::Main), target, (50, 50));
        assert_eq!(evaluate(&q).position, DropPosition::Invalid);
        let q = query(source(1, WindowRef::Main), target, (50, 95));
        assert_eq!(
            evaluate(&q).action,
            DropAction::Split {
                target: NodeId(9),
                side: Side::Bottom
            }
        );
    }

    #[test]
    fn lone_floating_source_moves_its_window() {
        let window = DetachedWindowId(3);
        let lone = DragSource {
            alone_in_floating: true,
            ..source(1, WindowRef::Detached(window))
        };
        let q = query(lone, TargetFacts::Outside, (200, 40));
        assert_eq!(
            evaluate(&q).action,
            DropAction::MoveWindow {
                window,
                at: FloatRect::new(200, 40, 20, 10)
            }
        );
    }

    #[test]
    fn splits_and_containers_are_not_targets() {
        let target = TargetFacts::Node {
            node: NodeId(4),
            window: WindowRef::Main,
            role: TargetRole::Other,
            bounds: Rect::new(0, 0, 100, 100),
        };
        let q = query(source(1, WindowRef::Main), target, (5, 50));
        assert_eq!(evaluate(&q).action, DropAction::Reject);
    }

    #[test]
    fn stacking_onto_self_or_own_lone_folder_is_rejected() {
        let q = query(source(1, WindowRef::Main), pane_target(1, WindowRef::Main, None), (50, 50));
        assert_eq!(evaluate(&q).position, DropPosition::Invalid);

        let lone = DragSource {
            folder: Some(NodeId(7)),
            alone_in_folder: true,
            ..source(1, WindowRef::Main)
        };
        let folder = TargetFacts::Node {
            node: NodeId(7),
            window: WindowRef::Main,
            role: TargetRole::Folder,
            bounds: Rect::new(0, 0, 100, 100),
        };
        assert_eq!(evaluate(&query(lone, folder, (50, 50))).position, DropPosition::Invalid);
    }

    #[test]
    fn floating_target_forces_center() {
        let window = WindowRef::Detached(DetachedWindowId(0));
        let q = query(source(1, window), pane_target(2, window, Some(5)), (1, 50));
        let decision = evaluate(&q);
        assert_eq!(decision.position, DropPosition::Center);
        assert_eq!(decision.action, DropAction::Stack { target: NodeId(2) });
    }

    #[test]
    fn edges_split_and_center_stacks() {
        let q = query(source(1, WindowRef::Main), pane_target(2, WindowRef::Main, None), (90, 50));
        assert_eq!(
            evaluate(&q).action,
            DropAction::Split {
                target: NodeId(2),
                side: Side::Right
            }
        );
        let q = DropQuery {
            pointer: (50, 50),
            ..q
        };
        assert_eq!(evaluate(&q).action, DropAction::Stack { target: NodeId(2) });
    }
}
