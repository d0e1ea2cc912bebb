//! Box geometry and the distance heuristic.
//!
//! Everything in this module is a pure function over pixel coordinates. The
//! distance estimate is an inverse-square-root heuristic tuned by a scaling
//! constant; it is directional guidance only, not calibrated depth.

use std::fmt::{self, Display, Formatter};

/// Default scaling constant for [`approximate_distance`].
pub const DEFAULT_DISTANCE_SCALE: f64 = 1500.0;

/// Axis-aligned bounding box in integer pixel coordinates.
///
/// Well-formed boxes have `x1 <= x2` and `y1 <= y2`. Degenerate boxes are
/// representable; their area is clamped to zero and downstream code treats
/// them as "no estimate".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Integer midpoint of the box.
    ///
    /// Summed in `i64` so extreme coordinates from an untrusted detector
    /// cannot overflow.
    pub fn center(&self) -> (i32, i32) {
        (
            ((self.x1 as i64 + self.x2 as i64) / 2) as i32,
            ((self.y1 as i64 + self.y2 as i64) / 2) as i32,
        )
    }

    /// Pixel area, clamped so degenerate boxes report zero.
    pub fn area(&self) -> i64 {
        let w = (self.x2 - self.x1).max(0) as i64;
        let h = (self.y2 - self.y1).max(0) as i64;
        w * h
    }
}

/// Coarse horizontal position of a detection within the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Ahead,
    Right,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "on the left"),
            Direction::Ahead => write!(f, "ahead"),
            Direction::Right => write!(f, "on the right"),
        }
    }
}

impl Direction {
    /// Partitions the frame into three equal horizontal thirds.
    ///
    /// Comparisons are strict `<` / `>` against `w/3` and `2w/3` computed in
    /// floating point, so a center sitting exactly on a third boundary reads
    /// as [`Direction::Ahead`].
    pub fn from_center_x(cx: i32, frame_width: u32) -> Self {
        let w = frame_width as f64;
        let cx = cx as f64;
        if cx < w / 3.0 {
            Direction::Left
        } else if cx > 2.0 * w / 3.0 {
            Direction::Right
        } else {
            Direction::Ahead
        }
    }
}

/// Approximate distance in meters from apparent box area.
///
/// Returns `None` for non-positive areas. Monotonically decreasing in area:
/// a larger apparent box means a smaller estimate.
pub fn approximate_distance(area: i64, scaling: f64) -> Option<f64> {
    if area <= 0 {
        return None;
    }
    Some(scaling / (area as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_and_area() {
        let b = BoundingBox::new(75, 75, 125, 125);
        assert_eq!(b.center(), (100, 100));
        assert_eq!(b.area(), 2500);
    }

    #[test]
    fn center_of_extreme_coordinates_does_not_overflow() {
        let b = BoundingBox::new(i32::MAX - 10, i32::MAX - 10, i32::MAX, i32::MAX);
        assert_eq!(b.center(), (i32::MAX - 5, i32::MAX - 5));

        let b = BoundingBox::new(i32::MIN, i32::MIN, i32::MIN + 10, i32::MIN + 10);
        assert_eq!(b.center(), (i32::MIN + 5, i32::MIN + 5));
    }

    #[test]
    fn degenerate_boxes_have_zero_area() {
        assert_eq!(BoundingBox::new(10, 10, 10, 40).area(), 0);
        assert_eq!(BoundingBox::new(40, 10, 10, 40).area(), 0);
        assert_eq!(BoundingBox::new(0, 0, 0, 0).area(), 0);
    }

    #[test]
    fn direction_partition() {
        for w in [1u32, 100, 1920] {
            let third = w as f64 / 3.0;
            let two_thirds = 2.0 * w as f64 / 3.0;
            for cx in 0..=(w as i32) {
                let got = Direction::from_center_x(cx, w);
                let want = if (cx as f64) < third {
                    Direction::Left
                } else if (cx as f64) > two_thirds {
                    Direction::Right
                } else {
                    Direction::Ahead
                };
                assert_eq!(got, want, "cx={} w={}", cx, w);
            }
        }
    }

    #[test]
    fn direction_boundaries_read_as_ahead() {
        // Exact third boundaries fall into Ahead under strict comparison.
        assert_eq!(Direction::from_center_x(100, 300), Direction::Ahead);
        assert_eq!(Direction::from_center_x(200, 300), Direction::Ahead);
        assert_eq!(Direction::from_center_x(99, 300), Direction::Left);
        assert_eq!(Direction::from_center_x(201, 300), Direction::Right);
    }

    #[test]
    fn direction_display_forms() {
        assert_eq!(Direction::Left.to_string(), "on the left");
        assert_eq!(Direction::Ahead.to_string(), "ahead");
        assert_eq!(Direction::Right.to_string(), "on the right");
    }

    #[test]
    fn distance_is_monotonically_decreasing() {
        let areas = [1i64, 100, 2500, 10_000, 1_000_000];
        for pair in areas.windows(2) {
            let near = approximate_distance(pair[1], DEFAULT_DISTANCE_SCALE).unwrap();
            let far = approximate_distance(pair[0], DEFAULT_DISTANCE_SCALE).unwrap();
            assert!(far > near, "area {} vs {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn distance_has_no_estimate_for_degenerate_areas() {
        assert_eq!(approximate_distance(0, DEFAULT_DISTANCE_SCALE), None);
        assert_eq!(approximate_distance(-5, DEFAULT_DISTANCE_SCALE), None);
    }

    #[test]
    fn distance_scenario_value() {
        // 2500 px^2 at the default scale: 1500 / 50 = 30.0 meters.
        let d = approximate_distance(2500, DEFAULT_DISTANCE_SCALE).unwrap();
        assert!((d - 30.0).abs() < 1e-9);
    }
}
