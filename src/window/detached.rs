use ratatui::prelude::Rect;

use super::FloatRect;
use crate::host::{HostWindowing, SurfaceId};
use crate::layout::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DetachedWindowId(pub(crate) usize);

/// A floating surface hosting exactly one top-level tab folder.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedWindow {
    pub(crate) id: DetachedWindowId,
    pub(crate) bounds: FloatRect,
    pub(crate) folder: NodeId,
    pub(crate) surface: Option<SurfaceId>,
}

impl DetachedWindow {
    /// Open the host surface for a window. Bounds are raised to the minimum
    /// floor before the host sees them.
    pub(crate) fn open(
        host: &mut dyn HostWindowing,
        id: DetachedWindowId,
        folder: NodeId,
        bounds: FloatRect,
    ) -> Option<Self> {
        let bounds = bounds.with_min_size();
        let surface = host.create_surface(bounds)?;
        tracing::debug!(window = ?id, ?surface, ?bounds, "detached window opened");
        Some(Self {
            id,
            bounds,
            folder,
            surface: Some(surface),
        })
    }

    pub(crate) fn move_to(&mut self, host: &mut dyn HostWindowing, bounds: FloatRect) {
        self.bounds = bounds.with_min_size();
        if let Some(surface) = self.surface {
            host.resize_surface(surface, self.bounds);
        }
    }

    pub(crate) fn close(&mut self, host: &mut dyn HostWindowing) {
        if let Some(surface) = self.surface.take() {
            tracing::debug!(window = ?self.id, ?surface, "detached window closed");
            host.close_surface(surface);
        }
    }

    pub fn id(&self) -> DetachedWindowId {
        self.id
    }

    pub fn bounds(&self) -> FloatRect {
        self.bounds
    }

    pub fn folder(&self) -> NodeId {
        self.folder
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    /// Area the window's folder is laid out in.
    pub fn area(&self) -> Rect {
        self.bounds.local()
    }
}

/// What is left of a detached window whose panes are all hidden: its last
/// bounds and the folder of placeholders, ready to reopen the window when one
/// of them is shown again.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedPlaceholder {
    pub(crate) bounds: FloatRect,
    pub(crate) folder: NodeId,
}

impl DetachedPlaceholder {
    pub fn bounds(&self) -> FloatRect {
        self.bounds
    }

    pub fn folder(&self) -> NodeId {
        self.folder
    }
}
