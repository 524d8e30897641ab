use serde::{Deserialize, Serialize};

use crate::geom;
use crate::Point;

/// Circular keep-out zone. Scenario obstacle lists are append-only: hazards
/// appear mid-run, they are never removed.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct Obstacle {
    pub center: Point,
    pub radius: f32,
}

impl Obstacle {
    pub fn new(center: Point, radius: f32) -> Obstacle {
        assert!(radius >= 0.0);
        Obstacle { center, radius }
    }

    /// Does the straight segment a-b cross this zone?
    pub fn blocks(&self, a: &Point, b: &Point) -> bool {
        geom::segment_intersects_circle(a, b, &self.center, self.radius)
    }

    pub fn inflated(&self, margin: f32) -> Obstacle {
        Obstacle {
            center: self.center,
            radius: self.radius + margin,
        }
    }
}
