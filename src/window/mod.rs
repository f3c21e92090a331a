mod detached;

pub use detached::{DetachedPlaceholder, DetachedWindow, DetachedWindowId};

use ratatui::prelude::Rect;

use crate::constants::{MIN_DETACHED_HEIGHT, MIN_DETACHED_WIDTH};

/// Signed floating rectangle origin with unsigned size.
///
/// Floating surfaces may sit partly off the main window (or on another
/// monitor), so the origin is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloatRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl FloatRect {
    pub fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same origin, size raised to the detached window floor.
    pub fn with_min_size(self) -> Self {
        Self {
            width: self.width.max(MIN_DETACHED_WIDTH),
            height: self.height.max(MIN_DETACHED_HEIGHT),
            ..self
        }
    }

    /// The rectangle in the surface's own coordinates, origin at zero.
    pub fn local(self) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }
}

/// The top-level window a layout node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WindowRef {
    Main,
    Detached(DetachedWindowId),
}

impl WindowRef {
    pub fn is_floating(self) -> bool {
        matches!(self, WindowRef::Detached(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_size_keeps_origin() {
        let rect = FloatRect::new(-10, 5, 20, 80).with_min_size();
        assert_eq!(rect, FloatRect::new(-10, 5, 50, 80));
    }
}
