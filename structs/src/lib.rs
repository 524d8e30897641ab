use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod drone;
pub mod geom;
pub mod obstacle;
pub mod plan;
pub mod scenario;
pub mod task;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Point {
        Point { x, y }
    }

    pub fn dist(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn eq_approx(&self, other: &Point) -> bool {
        self.dist(other) < 1e-3
    }
}

/// Expected, recoverable outcomes of planning operations. None of these
/// abort a run; the engine skips, defers, or reports instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("insufficient endurance: need {need:.1} s, have {have:.1} s")]
    InsufficientEndurance { need: f32, have: f32 },
    #[error("no feasible path")]
    NoFeasiblePath,
    #[error("task {0} exceeds every agent's capability")]
    UnassignableTask(String),
}
