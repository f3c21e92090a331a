mod arena;
pub mod drop;
pub mod node;
pub mod presentation;
mod state;

pub use drop::{DropAction, DropDecision, DropPosition, DropTarget};
pub use node::{LayoutNode, NodeId, NodeKind, Pane};
pub use presentation::LayoutPresentation;

use ratatui::prelude::{Direction, Rect};

use crate::constants::DROP_EDGE_FRACTION;

/// Edge of a reference node a pane is docked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// Orientation of the split that places two nodes along this side.
    pub fn orientation(self) -> Direction {
        match self {
            Side::Left | Side::Right => Direction::Horizontal,
            Side::Top | Side::Bottom => Direction::Vertical,
        }
    }

    /// Whether the docked node goes before the reference node.
    pub fn leading(self) -> bool {
        matches!(self, Side::Left | Side::Top)
    }
}

/// Resolve a pointer over `rect` to the side it would dock against, or `None`
/// for the center zone. Pointers outside the rect land on the nearest edge.
pub fn drop_zone(rect: Rect, x: i32, y: i32) -> Option<Side> {
    if rect.width == 0 || rect.height == 0 {
        return None;
    }
    let rel_x = (x - i32::from(rect.x)) as f32 / f32::from(rect.width);
    let rel_y = (y - i32::from(rect.y)) as f32 / f32::from(rect.height);
    if rel_y < DROP_EDGE_FRACTION {
        Some(Side::Top)
    } else if rel_y > 1.0 - DROP_EDGE_FRACTION {
        Some(Side::Bottom)
    } else if rel_x < DROP_EDGE_FRACTION {
        Some(Side::Left)
    } else if rel_x > 1.0 - DROP_EDGE_FRACTION {
        Some(Side::Right)
    } else {
        None
    }
}

pub(crate) fn extent(direction: Direction, rect: Rect) -> u16 {
    match direction {
        Direction::Horizontal => rect.width,
        Direction::Vertical => rect.height,
    }
}

pub(crate) fn mean_weight(weights: &[f32]) -> f32 {
    if weights.is_empty() {
        return crate::constants::DEFAULT_WEIGHT;
    }
    weights.iter().sum::<f32>() / weights.len() as f32
}

pub(crate) fn split_rects_weighted(direction: Direction, area: Rect, weights: &[f32]) -> Vec<Rect> {
    let count = weights.len();
    if count == 0 {
        return Vec::new();
    }
    let total_weight: f32 = weights.iter().sum::<f32>();
    let total = extent(direction, area);
    let mut sizes = Vec::with_capacity(count);
    let mut used: u16 = 0;
    for (idx, weight) in weights.iter().enumerate() {
        let size = if idx + 1 == count {
            total.saturating_sub(used)
        } else if total_weight <= 0.0 {
            total / count as u16
        } else {
            ((*weight / total_weight) * f32::from(total)).floor() as u16
        };
        used = used.saturating_add(size);
        sizes.push(size);
    }
    build_rects_from_sizes(direction, area, &sizes)
}

/// Lay `sizes` end to end along `direction`, starting at `area`'s origin.
fn build_rects_from_sizes(direction: Direction, area: Rect, sizes: &[u16]) -> Vec<Rect> {
    let mut offset: u16 = 0;
    sizes
        .iter()
        .map(|&size| {
            let rect = match direction {
                Direction::Horizontal => Rect {
                    x: area.x.saturating_add(offset),
                    width: size,
                    ..area
                },
                Direction::Vertical => Rect {
                    y: area.y.saturating_add(offset),
                    height: size,
                    ..area
                },
            };
            offset = offset.saturating_add(size);
            rect
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_laid_end_to_end() {
        let across = build_rects_from_sizes(Direction::Horizontal, Rect::new(2, 1, 10, 3), &[3, 7]);
        assert_eq!(across, vec![Rect::new(2, 1, 3, 3), Rect::new(5, 1, 7, 3)]);

        let down = build_rects_from_sizes(Direction::Vertical, Rect::new(0, 4, 4, 9), &[2, 3, 4]);
        assert_eq!(down[2], Rect::new(0, 9, 4, 4));
    }

    #[test]
    fn split_rects_weighted_even() {
        let area = Rect {
            x: 0,
            y: 0,
            width: 11,
            height: 1,
        };
        let rects = split_rects_weighted(Direction::Horizontal, area, &[1.0, 1.0]);
        // floor((1/2)*11)=5, remainder 6
        assert_eq!(rects[0].width, 5);
        assert_eq!(rects[1].width, 6);
    }

    #[test]
    fn split_rects_weighted_uneven() {
        let area = Rect::new(0, 0, 100, 20);
        let rects = split_rects_weighted(Direction::Horizontal, area, &[3.0, 1.0]);
        assert_eq!(rects[0].width, 75);
        assert_eq!(rects[1].x, 75);
        assert_eq!(rects[1].width, 25);
    }

    #[test]
    fn drop_zone_quarters() {
        let r = Rect::new(0, 0, 100, 100);
        assert_eq!(drop_zone(r, 50, 5), Some(Side::Top));
        assert_eq!(drop_zone(r, 50, 95), Some(Side::Bottom));
        assert_eq!(drop_zone(r, 5, 50), Some(Side::Left));
        assert_eq!(drop_zone(r, 95, 50), Some(Side::Right));
        assert_eq!(drop_zone(r, 50, 50), None);
        // outside the rect snaps to the nearest edge
        assert_eq!(drop_zone(r, -20, 50), Some(Side::Left));
        assert_eq!(drop_zone(Rect::default(), 0, 0), None);
    }

    #[test]
    fn side_orientation() {
        assert_eq!(Side::Left.orientation(), Direction::Horizontal);
        assert_eq!(Side::Bottom.orientation(), Direction::Vertical);
        assert!(Side::Top.leading());
        assert!(!Side::Right.leading());
    }
}
