// Shared 2-D geometry for the continuous planners.
//
// Coordinates live in the normalized unit square [0,1]×[0,1].
// Obstacles are circles; collision checks sample segments at a fixed
// resolution so the potential-field and RRT planners agree on what
// "touching an obstacle" means.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A point in normalized planning space.
pub type Point2 = DVec2;
/// A force or velocity in normalized planning space.
pub type Vector2 = DVec2;

/// Smallest denominator used when normalizing a vector.
pub const NORMALIZE_EPSILON: f64 = 1e-4;
/// Segment sampling resolution in space units.
pub const SEGMENT_RESOLUTION: f64 = 0.005;
/// Lower bound on the number of segment samples.
pub const MIN_SEGMENT_SAMPLES: usize = 8;

// ============================================================================
// OBSTACLE
// ============================================================================

/// Circular obstacle. Read-only to every engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Point2,
    pub radius: f64,
}

impl Obstacle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        debug_assert!(radius >= 0.0, "obstacle radius must be non-negative");
        Self {
            center: Point2::new(x, y),
            radius,
        }
    }

    /// Distance from `p` to the obstacle surface, zero when inside.
    #[inline]
    pub fn surface_distance(&self, p: Point2) -> f64 {
        (distance(p, self.center) - self.radius).max(0.0)
    }
}

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Point2, b: Point2) -> f64 {
    (b - a).length()
}

/// Unit vector along `v`, or zero when `v` is shorter than
/// [`NORMALIZE_EPSILON`].
#[inline]
pub fn unit_or_zero(v: Vector2) -> Vector2 {
    let len = v.length();
    if len > NORMALIZE_EPSILON {
        v / len
    } else {
        Vector2::ZERO
    }
}

/// True if `p` lies inside the closed unit square.
#[inline]
pub fn in_unit_square(p: Point2) -> bool {
    (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y)
}

/// Check that the segment `p1 → p2` stays at least `margin` away from every
/// obstacle surface.
///
/// The segment is discretized into `max(8, ceil(len / 0.005))` intervals and
/// every sample (both endpoints included) is tested against every obstacle.
pub fn segment_clear_of_obstacles(
    p1: Point2,
    p2: Point2,
    obstacles: &[Obstacle],
    margin: f64,
) -> bool {
    let span = p2 - p1;
    let steps = ((span.length() / SEGMENT_RESOLUTION).ceil() as usize).max(MIN_SEGMENT_SAMPLES);
    (0..=steps).all(|i| {
        let t = i as f64 / steps as f64;
        let p = p1 + span * t;
        obstacles
            .iter()
            .all(|obs| distance(p, obs.center) >= obs.radius + margin)
    })
}
