use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn union(&self, other: Rect) -> Rect {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = (self.x + self.width).max(other.x + other.width);
        let y2 = (self.y + self.height).max(other.y + other.height);
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Point on this rect's border nearest to the straight line from the rect
    /// center toward `target`. Falls back to the center when `target`
    /// coincides with it.
    pub fn border_point_toward(&self, target: Point) -> Point {
        let center = self.center();
        let dx = target.x - center.x;
        let dy = target.y - center.y;
        if dx.abs() < 0.1 && dy.abs() < 0.1 {
            return center;
        }

        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;

        if dx.abs() > dy.abs() {
            let side_x = if dx > 0.0 {
                self.x + self.width
            } else {
                self.x
            };
            if dy != 0.0 {
                let y = center.y + (half_w / dx.abs()) * dy;
                if (y - center.y).abs() <= half_h {
                    return Point::new(side_x, y);
                }
            }
            Point::new(side_x, center.y + if dy > 0.0 { half_h } else { -half_h })
        } else {
            let side_y = if dy > 0.0 {
                self.y + self.height
            } else {
                self.y
            };
            if dx != 0.0 {
                let x = center.x + (half_h / dy.abs()) * dx;
                if (x - center.x).abs() <= half_w {
                    return Point::new(x, side_y);
                }
            }
            Point::new(center.x + if dx > 0.0 { half_w } else { -half_w }, side_y)
        }
    }
}

pub fn cubic_point(p0: Point, c1: Point, c2: Point, p1: Point, t: f32) -> Point {
    let u = 1.0 - t;
    let x = u * u * u * p0.x + 3.0 * u * u * t * c1.x + 3.0 * u * t * t * c2.x + t * t * t * p1.x;
    let y = u * u * u * p0.y + 3.0 * u * u * t * c1.y + 3.0 * u * t * t * c2.y + t * t * t * p1.y;
    Point::new(x, y)
}

pub fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * vx + (p.y - a.y) * vy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + t * vx, a.y + t * vy))
}

/// Distance from `p` to a flattened cubic, used for the expanded click zone
/// around curved edges.
pub fn cubic_distance(p: Point, p0: Point, c1: Point, c2: Point, p1: Point) -> f32 {
    const STEPS: usize = 24;
    let mut best = f32::INFINITY;
    let mut prev = p0;
    for i in 1..=STEPS {
        let t = i as f32 / STEPS as f32;
        let next = cubic_point(p0, c1, c2, p1, t);
        best = best.min(segment_distance(p, prev, next));
        prev = next;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_point_horizontal_neighbor() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        let anchor = rect.border_point_toward(Point::new(300.0, 25.0));
        assert!((anchor.x - 100.0).abs() < 0.001);
        assert!((anchor.y - 25.0).abs() < 0.001);
    }

    #[test]
    fn border_point_vertical_neighbor() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        let anchor = rect.border_point_toward(Point::new(50.0, 400.0));
        assert!((anchor.y - 50.0).abs() < 0.001);
        assert!((anchor.x - 50.0).abs() < 0.001);
    }

    #[test]
    fn border_point_degenerate_target_is_center() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        let anchor = rect.border_point_toward(rect.center());
        assert_eq!(anchor, rect.center());
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((segment_distance(Point::new(-5.0, 0.0), a, b) - 5.0).abs() < 0.001);
        assert!((segment_distance(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 0.001);
    }

    #[test]
    fn cubic_endpoints() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(10.0, 10.0);
        let c = Point::new(5.0, 0.0);
        assert_eq!(cubic_point(p0, c, c, p1, 0.0), p0);
        assert_eq!(cubic_point(p0, c, c, p1, 1.0), p1);
    }
}
