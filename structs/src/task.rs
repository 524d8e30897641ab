use serde::{Deserialize, Serialize};

use crate::Point;

/// Task kinds carry their demand: payload weight for deliveries, hover
/// seconds for reconnaissance.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub enum TaskKind {
    Delivery(f32),
    Urgent(f32),
    Recon(f32),
}

impl TaskKind {
    pub fn demand(&self) -> f32 {
        match self {
            TaskKind::Delivery(w) | TaskKind::Urgent(w) => *w,
            TaskKind::Recon(h) => *h,
        }
    }

    /// On-site time: hover duration for recon, zero for drop-offs.
    pub fn service_time(&self) -> f32 {
        match self {
            TaskKind::Recon(h) => *h,
            _ => 0.0,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Task {
    pub id: String,
    pub coord: Point,
    /// Lower is more urgent.
    pub priority: u32,
    pub kind: TaskKind,
    #[serde(default)]
    pub assigned: bool,
}

impl Task {
    pub fn new(id: &str, coord: Point, kind: TaskKind, priority: u32) -> Task {
        Task {
            id: id.to_string(),
            coord,
            priority,
            kind,
            assigned: false,
        }
    }
}
