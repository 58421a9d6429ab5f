use crate::config::NodeConfig;
use crate::geometry::{Point, Rect};

/// Resolved fill and stroke for one node, after `classDef` application.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStyle {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f32,
}

/// The eight resize handles, named by compass point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        Self::NorthWest,
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
    ];

    pub fn anchor(&self, rect: Rect) -> Point {
        let (left, right) = (rect.x, rect.x + rect.width);
        let (top, bottom) = (rect.y, rect.y + rect.height);
        let center = rect.center();
        match self {
            Self::NorthWest => Point::new(left, top),
            Self::North => Point::new(center.x, top),
            Self::NorthEast => Point::new(right, top),
            Self::East => Point::new(right, center.y),
            Self::SouthEast => Point::new(right, bottom),
            Self::South => Point::new(center.x, bottom),
            Self::SouthWest => Point::new(left, bottom),
            Self::West => Point::new(left, center.y),
        }
    }

    fn moves_west(&self) -> bool {
        matches!(self, Self::NorthWest | Self::West | Self::SouthWest)
    }

    fn moves_east(&self) -> bool {
        matches!(self, Self::NorthEast | Self::East | Self::SouthEast)
    }

    fn moves_north(&self) -> bool {
        matches!(self, Self::NorthWest | Self::North | Self::NorthEast)
    }

    fn moves_south(&self) -> bool {
        matches!(self, Self::SouthWest | Self::South | Self::SouthEast)
    }
}

#[derive(Debug, Clone)]
pub struct NodeItem {
    pub id: String,
    pub label: String,
    pub class_name: Option<String>,
    pub style: NodeStyle,
    pub rect: Rect,
    pub selected: bool,
}

impl NodeItem {
    pub fn contains(&self, p: Point) -> bool {
        self.rect.contains(p)
    }

    /// Which handle (if any) is under the pointer. Only meaningful while the
    /// node is selected; callers gate on that.
    pub fn handle_at(&self, p: Point, config: &NodeConfig) -> Option<ResizeHandle> {
        let grab = config.handle_radius * 2.0;
        ResizeHandle::ALL
            .into_iter()
            .find(|handle| handle.anchor(self.rect).distance_to(p) <= grab)
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.rect.x += dx;
        self.rect.y += dy;
    }

    /// Resize by dragging `handle` by `(dx, dy)`. The opposite edge stays
    /// fixed and both dimensions clamp to `min_size`.
    pub fn resize(&mut self, handle: ResizeHandle, dx: f32, dy: f32, config: &NodeConfig) {
        let min = config.min_size;
        let right = self.rect.x + self.rect.width;
        let bottom = self.rect.y + self.rect.height;

        if handle.moves_west() {
            let left = (self.rect.x + dx).min(right - min);
            self.rect.width = right - left;
            self.rect.x = left;
        } else if handle.moves_east() {
            self.rect.width = (self.rect.width + dx).max(min);
        }

        if handle.moves_north() {
            let top = (self.rect.y + dy).min(bottom - min);
            self.rect.height = bottom - top;
            self.rect.y = top;
        } else if handle.moves_south() {
            self.rect.height = (self.rect.height + dy).max(min);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(rect: Rect) -> NodeItem {
        NodeItem {
            id: "A".to_string(),
            label: "A".to_string(),
            class_name: None,
            style: NodeStyle {
                fill: "#DCDDFF".to_string(),
                stroke: "#6464C8".to_string(),
                stroke_width: 2.0,
            },
            rect,
            selected: true,
        }
    }

    #[test]
    fn east_resize_grows_width_only() {
        let mut node = item(Rect::new(0.0, 0.0, 100.0, 60.0));
        node.resize(ResizeHandle::East, 30.0, 99.0, &NodeConfig::default());
        assert_eq!(node.rect, Rect::new(0.0, 0.0, 130.0, 60.0));
    }

    #[test]
    fn west_resize_compensates_position() {
        let mut node = item(Rect::new(100.0, 0.0, 100.0, 60.0));
        node.resize(ResizeHandle::West, -20.0, 0.0, &NodeConfig::default());
        assert_eq!(node.rect, Rect::new(80.0, 0.0, 120.0, 60.0));
    }

    #[test]
    fn resize_clamps_to_minimum_keeping_opposite_edge() {
        let mut node = item(Rect::new(100.0, 100.0, 100.0, 60.0));
        node.resize(ResizeHandle::NorthWest, 500.0, 500.0, &NodeConfig::default());
        assert_eq!(node.rect.width, 50.0);
        assert_eq!(node.rect.height, 50.0);
        assert_eq!(node.rect.x + node.rect.width, 200.0);
        assert_eq!(node.rect.y + node.rect.height, 160.0);
    }

    #[test]
    fn handle_hit_requires_proximity() {
        let node = item(Rect::new(0.0, 0.0, 100.0, 60.0));
        let config = NodeConfig::default();
        assert_eq!(
            node.handle_at(Point::new(100.0, 60.0), &config),
            Some(ResizeHandle::SouthEast)
        );
        assert_eq!(node.handle_at(Point::new(50.0, 30.0), &config), None);
    }
}
