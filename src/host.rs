//! Host windowing contract.
//!
//! Floating surfaces belong to whatever toolkit embeds the engine. The engine
//! asks for them through [`HostWindowing`] and only keeps the returned handle.

use std::collections::BTreeMap;

use crate::window::FloatRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u64);

pub trait HostWindowing {
    /// Whether the host can show floating surfaces at all. Detaching is a
    /// no-op when it cannot.
    fn supports_floating(&self) -> bool;

    /// Create a floating surface. `None` means the host refused.
    fn create_surface(&mut self, bounds: FloatRect) -> Option<SurfaceId>;

    fn resize_surface(&mut self, surface: SurfaceId, bounds: FloatRect);

    fn close_surface(&mut self, surface: SurfaceId);
}

/// A host without a display. It hands out surface ids and remembers the
/// bounds of every open surface so callers can inspect them.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    floating: bool,
    next_surface: u64,
    open: BTreeMap<SurfaceId, FloatRect>,
    closed: Vec<SurfaceId>,
}

impl HeadlessHost {
    pub fn new(floating: bool) -> Self {
        Self {
            floating,
            ..Self::default()
        }
    }

    pub fn open_surfaces(&self) -> impl Iterator<Item = (SurfaceId, FloatRect)> + '_ {
        self.open.iter().map(|(id, bounds)| (*id, *bounds))
    }

    pub fn surface_bounds(&self, surface: SurfaceId) -> Option<FloatRect> {
        self.open.get(&surface).copied()
    }

    pub fn closed_surfaces(&self) -> &[SurfaceId] {
        &self.closed
    }
}

impl HostWindowing for HeadlessHost {
    fn supports_floating(&self) -> bool {
        self.floating
    }

    fn create_surface(&mut self, bounds: FloatRect) -> Option<SurfaceId> {
        if !self.floating {
            return None;
        }
        self.next_surface += 1;
        let id = SurfaceId(self.next_surface);
        self.open.insert(id, bounds);
        tracing::trace!(surface = ?id, ?bounds, "headless surface created");
        Some(id)
    }

    fn resize_surface(&mut self, surface: SurfaceId, bounds: FloatRect) {
        if let Some(current) = self.open.get_mut(&surface) {
            *current = bounds;
        }
    }

    fn close_surface(&mut self, surface: SurfaceId) {
        if self.open.remove(&surface).is_some() {
            self.closed.push(surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_host_tracks_surfaces() {
        let mut host = HeadlessHost::new(true);
        let bounds = FloatRect::new(0, 0, 60, 60);
        let surface = host.create_surface(bounds).unwrap();
        assert_eq!(host.surface_bounds(surface), Some(bounds));

        let moved = FloatRect::new(10, 10, 80, 60);
        host.resize_surface(surface, moved);
        assert_eq!(host.surface_bounds(surface), Some(moved));

        host.close_surface(surface);
        assert_eq!(host.open_surfaces().count(), 0);
        assert_eq!(host.closed_surfaces(), &[surface]);
    }

    #[test]
    fn host_without_floating_refuses_surfaces() {
        let mut host = HeadlessHost::new(false);
        assert!(!host.supports_floating());
        assert_eq!(host.create_surface(FloatRect::new(0, 0, 50, 50)), None);
    }
}
