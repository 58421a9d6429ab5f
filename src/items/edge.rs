use crate::config::EdgeConfig;
use crate::geometry::{self, Point, Rect};
use crate::ir::EdgeKind;
use crate::store::EdgeOverride;

/// Draggable affordances of a selected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeHandle {
    Start,
    End,
    Control1,
    Control2,
}

#[derive(Debug, Clone)]
pub struct EdgeItem {
    pub key: String,
    pub source: String,
    pub target: String,
    pub label: String,
    pub kind: EdgeKind,
    pub selected: bool,
    pub use_bezier: bool,
    /// Anchor displacement from the source node center, user-set.
    pub start_offset: Option<Point>,
    pub end_offset: Option<Point>,
    /// Absolute control points, user-set.
    pub control1: Option<Point>,
    pub control2: Option<Point>,
    /// Resolved endpoints after the last `refresh`.
    pub start: Point,
    pub end: Point,
    source_rect: Rect,
    target_rect: Rect,
}

impl EdgeItem {
    pub fn new(key: &str, source: &str, target: &str, label: &str, kind: EdgeKind) -> Self {
        Self {
            key: key.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            label: label.to_string(),
            kind,
            selected: false,
            use_bezier: false,
            start_offset: None,
            end_offset: None,
            control1: None,
            control2: None,
            start: Point::default(),
            end: Point::default(),
            source_rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            target_rect: Rect::new(0.0, 0.0, 0.0, 0.0),
        }
    }

    pub fn apply_override(&mut self, saved: &EdgeOverride) {
        self.use_bezier = saved.use_bezier;
        self.start_offset = saved.start_offset;
        self.end_offset = saved.end_offset;
        self.control1 = saved.control1;
        self.control2 = saved.control2;
    }

    pub fn as_override(&self) -> EdgeOverride {
        EdgeOverride {
            use_bezier: self.use_bezier,
            start_offset: self.start_offset,
            end_offset: self.end_offset,
            control1: self.control1,
            control2: self.control2,
        }
    }

    /// Re-anchor to the current endpoint rects. Without an offset the anchor
    /// sits on the border nearest the other node; a user offset is applied
    /// from the node center so the anchor follows the node when it moves.
    pub fn refresh(&mut self, source_rect: Rect, target_rect: Rect) {
        self.source_rect = source_rect;
        self.target_rect = target_rect;
        self.start = match self.start_offset {
            Some(offset) => {
                let c = source_rect.center();
                Point::new(c.x + offset.x, c.y + offset.y)
            }
            None => source_rect.border_point_toward(target_rect.center()),
        };
        self.end = match self.end_offset {
            Some(offset) => {
                let c = target_rect.center();
                Point::new(c.x + offset.x, c.y + offset.y)
            }
            None => target_rect.border_point_toward(source_rect.center()),
        };
    }

    /// Control points for the curved form: stored points verbatim, otherwise
    /// seeded along the chord and pushed out along its normal.
    pub fn resolved_controls(&self, config: &EdgeConfig) -> (Point, Point) {
        let (seed1, seed2) = self.seed_controls(config);
        (self.control1.unwrap_or(seed1), self.control2.unwrap_or(seed2))
    }

    fn seed_controls(&self, config: &EdgeConfig) -> (Point, Point) {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len = dx.hypot(dy);
        if len < f32::EPSILON {
            return (self.start, self.end);
        }
        let (ux, uy) = (dx / len, dy / len);
        let (nx, ny) = (-uy, ux);
        let along = config.control_along.max(len * 0.25);
        let normal = config.control_normal;
        (
            Point::new(
                self.start.x + ux * along + nx * normal,
                self.start.y + uy * along + ny * normal,
            ),
            Point::new(
                self.end.x - ux * along + nx * normal,
                self.end.y - uy * along + ny * normal,
            ),
        )
    }

    /// Expanded click zone around the drawn path.
    pub fn hit_test(&self, p: Point, config: &EdgeConfig) -> bool {
        let distance = if self.use_bezier {
            let (c1, c2) = self.resolved_controls(config);
            geometry::cubic_distance(p, self.start, c1, c2, self.end)
        } else {
            geometry::segment_distance(p, self.start, self.end)
        };
        distance <= config.click_tolerance
    }

    /// Handle under the pointer; control handles only exist in curved form.
    pub fn handle_at(&self, p: Point, config: &EdgeConfig) -> Option<EdgeHandle> {
        let grab = config.click_tolerance;
        if p.distance_to(self.start) <= grab {
            return Some(EdgeHandle::Start);
        }
        if p.distance_to(self.end) <= grab {
            return Some(EdgeHandle::End);
        }
        if self.use_bezier {
            let (c1, c2) = self.resolved_controls(config);
            if p.distance_to(c1) <= grab {
                return Some(EdgeHandle::Control1);
            }
            if p.distance_to(c2) <= grab {
                return Some(EdgeHandle::Control2);
            }
        }
        None
    }

    /// Move one handle to `p`. Anchors snap to the owning node's border and
    /// are remembered as center-relative offsets; controls stay absolute.
    pub fn drag_handle(&mut self, handle: EdgeHandle, p: Point) {
        match handle {
            EdgeHandle::Start => {
                let snapped = self.source_rect.border_point_toward(p);
                let c = self.source_rect.center();
                self.start_offset = Some(Point::new(snapped.x - c.x, snapped.y - c.y));
                self.start = snapped;
            }
            EdgeHandle::End => {
                let snapped = self.target_rect.border_point_toward(p);
                let c = self.target_rect.center();
                self.end_offset = Some(Point::new(snapped.x - c.x, snapped.y - c.y));
                self.end = snapped;
            }
            EdgeHandle::Control1 => self.control1 = Some(p),
            EdgeHandle::Control2 => self.control2 = Some(p),
        }
    }

    /// Flip Linear ⇄ Bezier. Switching to the curved form materializes the
    /// seeded controls so later drags start from what is on screen.
    pub fn toggle_bezier(&mut self, config: &EdgeConfig) {
        self.use_bezier = !self.use_bezier;
        if self.use_bezier && self.control1.is_none() && self.control2.is_none() {
            let (c1, c2) = self.seed_controls(config);
            self.control1 = Some(c1);
            self.control2 = Some(c2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_between(a: Rect, b: Rect) -> EdgeItem {
        let mut edge = EdgeItem::new("A|B||arrow", "A", "B", "", EdgeKind::Arrow);
        edge.refresh(a, b);
        edge
    }

    #[test]
    fn anchors_sit_on_facing_borders() {
        let edge = edge_between(
            Rect::new(0.0, 0.0, 100.0, 50.0),
            Rect::new(300.0, 0.0, 100.0, 50.0),
        );
        assert_eq!(edge.start, Point::new(100.0, 25.0));
        assert_eq!(edge.end, Point::new(300.0, 25.0));
    }

    #[test]
    fn start_offset_follows_node_center() {
        let mut edge = edge_between(
            Rect::new(0.0, 0.0, 100.0, 50.0),
            Rect::new(300.0, 0.0, 100.0, 50.0),
        );
        edge.drag_handle(EdgeHandle::Start, Point::new(50.0, 0.0));
        let offset = edge.start_offset.unwrap();

        edge.start_offset = Some(offset);
        edge.refresh(
            Rect::new(40.0, 100.0, 100.0, 50.0),
            Rect::new(300.0, 0.0, 100.0, 50.0),
        );
        let c = Rect::new(40.0, 100.0, 100.0, 50.0).center();
        assert_eq!(edge.start, Point::new(c.x + offset.x, c.y + offset.y));
    }

    #[test]
    fn hit_test_expands_by_tolerance() {
        let edge = edge_between(
            Rect::new(0.0, 0.0, 100.0, 50.0),
            Rect::new(300.0, 0.0, 100.0, 50.0),
        );
        let config = EdgeConfig::default();
        assert!(edge.hit_test(Point::new(200.0, 25.0 + config.click_tolerance - 1.0), &config));
        assert!(!edge.hit_test(Point::new(200.0, 25.0 + config.click_tolerance + 1.0), &config));
    }

    #[test]
    fn toggle_materializes_controls_once() {
        let mut edge = edge_between(
            Rect::new(0.0, 0.0, 100.0, 50.0),
            Rect::new(300.0, 0.0, 100.0, 50.0),
        );
        let config = EdgeConfig::default();
        edge.toggle_bezier(&config);
        assert!(edge.use_bezier);
        let c1 = edge.control1.unwrap();
        edge.toggle_bezier(&config);
        edge.toggle_bezier(&config);
        assert_eq!(edge.control1, Some(c1));
    }

    #[test]
    fn round_trips_through_override() {
        let mut edge = edge_between(
            Rect::new(0.0, 0.0, 100.0, 50.0),
            Rect::new(300.0, 0.0, 100.0, 50.0),
        );
        edge.toggle_bezier(&EdgeConfig::default());
        edge.drag_handle(EdgeHandle::Control1, Point::new(150.0, -40.0));
        let saved = edge.as_override();

        let mut restored = EdgeItem::new("A|B||arrow", "A", "B", "", EdgeKind::Arrow);
        restored.apply_override(&saved);
        assert!(restored.use_bezier);
        assert_eq!(restored.control1, Some(Point::new(150.0, -40.0)));
    }
}
