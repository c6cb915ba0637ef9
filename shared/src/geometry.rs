use serde::{Deserialize, Serialize};

/// A point in arena space. Origin is the top-left corner, y grows downwards.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Angle in radians of the direction from `self` towards `other`.
    pub fn angle_to(&self, other: Position) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Point reached by travelling `distance` along `angle`.
    pub fn project(&self, angle: f32, distance: f32) -> Position {
        Position {
            x: self.x + angle.cos() * distance,
            y: self.y + angle.sin() * distance,
        }
    }
}

/// Axis-aligned rectangle, edges inclusive.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Box of the given size centered on `center`.
    pub fn centered(center: Position, width: f32, height: f32) -> Self {
        Self {
            left: center.x - width / 2.0,
            top: center.y - height / 2.0,
            right: center.x + width / 2.0,
            bottom: center.y + height / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Position {
        Position {
            x: (self.left + self.right) / 2.0,
            y: (self.top + self.bottom) / 2.0,
        }
    }

    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    /// Shrinks every edge by `margin`. An axis that would invert collapses onto its midpoint.
    pub fn inset(&self, margin: f32) -> Rect {
        let center = self.center();
        let (left, right) = if self.width() >= 2.0 * margin {
            (self.left + margin, self.right - margin)
        } else {
            (center.x, center.x)
        };
        let (top, bottom) = if self.height() >= 2.0 * margin {
            (self.top + margin, self.bottom - margin)
        } else {
            (center.y, center.y)
        };
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Nearest point inside the rectangle.
    pub fn clamp(&self, point: Position) -> Position {
        Position {
            x: point.x.clamp(self.left, self.right),
            y: point.y.clamp(self.top, self.bottom),
        }
    }

    /// True if any part of the segment `a`-`b` lies inside or on the rectangle.
    pub fn intersects_segment(&self, a: Position, b: Position) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }

        let top_left = Position::new(self.left, self.top);
        let top_right = Position::new(self.right, self.top);
        let bottom_left = Position::new(self.left, self.bottom);
        let bottom_right = Position::new(self.right, self.bottom);

        segments_intersect(a, b, top_left, top_right)
            || segments_intersect(a, b, top_right, bottom_right)
            || segments_intersect(a, b, bottom_right, bottom_left)
            || segments_intersect(a, b, bottom_left, top_left)
    }
}

fn orientation(a: Position, b: Position, c: Position) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Position, b: Position, p: Position) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Tests whether segment `p1`-`p2` touches segment `q1`-`q2`, collinear overlap included.
pub fn segments_intersect(p1: Position, p2: Position, q1: Position, q2: Position) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
