use serde::{Deserialize, Serialize};

use crate::drone::{Drone, Fleet};
use crate::obstacle::Obstacle;
use crate::task::Task;
use crate::Point;

/// Serde-facing input shape: everything one planning run consumes.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Scenario {
    pub base: Point,
    pub agents: Vec<AgentSpec>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AgentSpec {
    pub id: String,
    pub payload: f32,
    pub endurance: f32,
    pub hover: f32,
}

impl Scenario {
    pub fn fleet(&self) -> Fleet {
        Fleet::new(
            self.base,
            self.agents
                .iter()
                .map(|a| Drone::new(&a.id, a.payload, a.endurance, a.hover, self.base))
                .collect(),
        )
    }
}
