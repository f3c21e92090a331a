//! Shared crate-wide constants.

/// Smallest width a detached window may be created or moved with.
///
/// Units: host surface units (pixels or terminal cells, whatever the host
/// windowing layer measures in).
pub const MIN_DETACHED_WIDTH: u16 = 50;

/// Smallest height a detached window may be created or moved with.
pub const MIN_DETACHED_HEIGHT: u16 = 50;

/// Fraction of a drop target's width/height treated as an edge zone.
///
/// A pointer within the outer quarter of the target resolves to the matching
/// side; anything further in resolves to the center (stack).
pub const DROP_EDGE_FRACTION: f32 = 0.25;

/// Minimum extent either neighbour keeps when a sash is dragged.
pub const MIN_SASH_SIZE: u16 = 4;

/// Weight given to children of freshly created splits.
pub const DEFAULT_WEIGHT: f32 = 1.0;

/// Identity of the main window's root split.
pub const ROOT_IDENT: &str = "root";

/// Identity of the fixed editor region inside the main window.
pub const EDITOR_AREA_IDENT: &str = "editor-area";
