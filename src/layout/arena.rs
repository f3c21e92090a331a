use std::collections::BTreeMap;

use super::node::{LayoutNode, NodeId, NodeKind};
use crate::error::LayoutError;
use crate::part::PartId;

/// Owner of every layout node of a page, across all of its windows.
///
/// Ownership flows parent to child through the child lists; `parent` is a
/// plain handle used for upward navigation only.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena {
    nodes: BTreeMap<NodeId, LayoutNode>,
    next_id: usize,
}

impl NodeArena {
    pub fn alloc(&mut self, ident: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, LayoutNode::new(ident.into(), kind));
        id
    }

    /// Allocate a container with a generated identity such as `folder-7`.
    pub fn alloc_container(&mut self, kind: NodeKind) -> NodeId {
        let prefix = match kind {
            NodeKind::TabFolder { .. } => "folder",
            NodeKind::Split { .. } => "split",
            _ => "node",
        };
        let ident = format!("{prefix}-{}", self.next_id);
        self.alloc(ident, kind)
    }

    pub fn get(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&LayoutNode, LayoutError> {
        self.nodes.get(&id).ok_or(LayoutError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut LayoutNode, LayoutError> {
        self.nodes.get_mut(&id).ok_or(LayoutError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&id)
            .map(|node| node.children().to_vec())
            .unwrap_or_default()
    }

    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<(), LayoutError> {
        self.node_mut(id)?.parent = parent;
        Ok(())
    }

    /// Drop a node and everything below it, collapsed subtrees included.
    pub fn free(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        match node.kind {
            NodeKind::TabFolder { children, .. } | NodeKind::Split { children, .. } => {
                for child in children {
                    self.free(child);
                }
            }
            NodeKind::ContainerPlaceholder { collapsed } => self.free(collapsed),
            NodeKind::Pane(_) | NodeKind::Placeholder(_) => {}
        }
    }

    /// Drop a single node without touching its children.
    pub fn discard(&mut self, id: NodeId) {
        self.nodes.remove(&id);
    }

    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize, LayoutError> {
        let node = self.node(parent)?;
        if let NodeKind::ContainerPlaceholder { collapsed } = node.kind
            && collapsed == child
        {
            return Ok(0);
        }
        node.children()
            .iter()
            .position(|candidate| *candidate == child)
            .ok_or(LayoutError::Orphan(child))
    }

    /// Put `new` in the slot `old` occupies, keeping sibling order and weight.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<(), LayoutError> {
        let index = self.child_index(parent, old)?;
        if !self.contains(new) {
            return Err(LayoutError::UnknownNode(new));
        }
        match &mut self.node_mut(parent)?.kind {
            NodeKind::TabFolder { children, .. } | NodeKind::Split { children, .. } => {
                children[index] = new;
            }
            NodeKind::ContainerPlaceholder { collapsed } => *collapsed = new,
            NodeKind::Pane(_) | NodeKind::Placeholder(_) => {
                return Err(LayoutError::InvalidTarget(parent));
            }
        }
        self.set_parent(old, None)?;
        self.set_parent(new, Some(parent))?;
        self.fix_selection(parent);
        Ok(())
    }

    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
        weight: f32,
    ) -> Result<(), LayoutError> {
        if !self.contains(child) {
            return Err(LayoutError::UnknownNode(child));
        }
        match &mut self.node_mut(parent)?.kind {
            NodeKind::TabFolder { children, selected } => {
                let index = index.min(children.len());
                children.insert(index, child);
                if let Some(current) = selected
                    && index <= *current
                {
                    *current += 1;
                }
            }
            NodeKind::Split {
                children, weights, ..
            } => {
                let index = index.min(children.len());
                children.insert(index, child);
                weights.insert(index.min(weights.len()), weight);
            }
            _ => return Err(LayoutError::InvalidTarget(parent)),
        }
        self.set_parent(child, Some(parent))?;
        self.fix_selection(parent);
        Ok(())
    }

    pub fn push_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LayoutError> {
        let (len, weight) = {
            let node = self.node(parent)?;
            (node.children().len(), super::mean_weight(node.weights()))
        };
        self.insert_child(parent, len, child, weight)
    }

    /// Take `child` out of `parent`'s child list, returning the weight it held.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<f32, LayoutError> {
        let index = self.child_index(parent, child)?;
        let mut weight = crate::constants::DEFAULT_WEIGHT;
        match &mut self.node_mut(parent)?.kind {
            NodeKind::TabFolder { children, selected } => {
                children.remove(index);
                *selected = match *selected {
                    _ if children.is_empty() => None,
                    Some(current) if current > index => Some(current - 1),
                    Some(current) if current == index => Some(index.saturating_sub(1)),
                    other => other,
                };
            }
            NodeKind::Split {
                children, weights, ..
            } => {
                children.remove(index);
                if index < weights.len() {
                    weight = weights.remove(index);
                }
            }
            _ => return Err(LayoutError::InvalidTarget(parent)),
        }
        self.set_parent(child, None)?;
        self.fix_selection(parent);
        Ok(weight)
    }

    /// Keep a folder's selection on a visible tab, preferring the tab that
    /// sits before the old selection.
    pub fn fix_selection(&mut self, folder: NodeId) {
        let Some(node) = self.nodes.get(&folder) else {
            return;
        };
        let NodeKind::TabFolder { children, selected } = &node.kind else {
            return;
        };
        let visible: Vec<bool> = children
            .iter()
            .map(|child| self.nodes.get(child).is_some_and(LayoutNode::is_pane))
            .collect();
        let next = match *selected {
            Some(index) if visible.get(index).copied().unwrap_or(false) => Some(index),
            _ if visible.is_empty() => None,
            current => {
                let start = current.unwrap_or(0).min(visible.len() - 1);
                (0..=start)
                    .rev()
                    .chain(start + 1..visible.len())
                    .find(|index| visible[*index])
            }
        };
        if let Some(node) = self.nodes.get_mut(&folder)
            && let NodeKind::TabFolder { selected, .. } = &mut node.kind
        {
            *selected = next;
        }
    }

    /// Select `child` in its folder. Returns whether the selection changed.
    pub fn select(&mut self, child: NodeId) -> bool {
        let Some(parent) = self.parent(child) else {
            return false;
        };
        let Ok(index) = self.child_index(parent, child) else {
            return false;
        };
        if let Some(node) = self.nodes.get_mut(&parent)
            && let NodeKind::TabFolder { selected, .. } = &mut node.kind
            && *selected != Some(index)
        {
            *selected = Some(index);
            return true;
        }
        false
    }

    /// Walk up to the window root, passing through collapsed containers.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn has_real_pane(&self, id: NodeId) -> bool {
        self.count_real_panes(id) > 0
    }

    pub fn count_real_panes(&self, id: NodeId) -> usize {
        let Some(node) = self.nodes.get(&id) else {
            return 0;
        };
        match &node.kind {
            NodeKind::Pane(_) => 1,
            NodeKind::TabFolder { children, .. } | NodeKind::Split { children, .. } => children
                .iter()
                .map(|child| self.count_real_panes(*child))
                .sum(),
            NodeKind::Placeholder(_) | NodeKind::ContainerPlaceholder { .. } => 0,
        }
    }

    /// Pre-order walk from `root`. With `into_collapsed` the walk also enters
    /// containers folded away behind a `ContainerPlaceholder`.
    pub fn walk(&self, root: NodeId, into_collapsed: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            match &node.kind {
                NodeKind::TabFolder { children, .. } | NodeKind::Split { children, .. } => {
                    stack.extend(children.iter().rev().copied());
                }
                NodeKind::ContainerPlaceholder { collapsed } if into_collapsed => {
                    stack.push(*collapsed);
                }
                _ => {}
            }
        }
        out
    }

    pub fn find_pane(&self, root: NodeId, part: &PartId) -> Option<NodeId> {
        self.walk(root, false).into_iter().find(|id| {
            self.nodes
                .get(id)
                .and_then(LayoutNode::pane)
                .is_some_and(|pane| pane.id == *part)
        })
    }

    pub fn find_placeholder(&self, root: NodeId, part: &PartId) -> Option<NodeId> {
        self.walk(root, true).into_iter().find(|id| {
            self.nodes
                .get(id)
                .is_some_and(|node| matches!(&node.kind, NodeKind::Placeholder(original) if original == part))
        })
    }
}
