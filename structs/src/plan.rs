use serde::{Deserialize, Serialize};

use crate::Point;

/// Output of a planning run, the shape reporting and visualization consume.
#[derive(Debug, Serialize, Deserialize)]
pub struct MissionPlan {
    pub routes: Vec<AgentRoute>,
    pub assignments: Vec<Assignment>,
    /// Tasks still unassigned when the round bound stopped the run.
    pub unassigned: Vec<String>,
    /// Tasks whose demand exceeds every agent's capability.
    pub unassignable: Vec<String>,
    pub rounds: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentRoute {
    pub agent: String,
    pub waypoints: Vec<(Point, f32)>,
    pub total_time: f32,
    pub recharges: u32,
    pub stranded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub task: String,
    pub agent: String,
}

impl AgentRoute {
    pub fn total_distance(&self) -> f32 {
        self.waypoints
            .iter()
            .zip(self.waypoints.iter().skip(1))
            .map(|((a, _), (b, _))| a.dist(b))
            .sum()
    }
}

impl MissionPlan {
    pub fn makespan(&self) -> f32 {
        self.routes.iter().map(|r| r.total_time).fold(0.0, f32::max)
    }

    pub fn print(&self) {
        for r in &self.routes {
            println!(
                "agent {}  time {:.1}  dist {:.0}  recharges {}{}",
                r.agent,
                r.total_time,
                r.total_distance(),
                r.recharges,
                if r.stranded { "  STRANDED" } else { "" }
            );
            for (p, t) in &r.waypoints {
                println!("  - ({:.0}, {:.0}) @ {:.1}", p.x, p.y, t);
            }
        }
        for a in &self.assignments {
            println!("{} -> {}", a.task, a.agent);
        }
        if !self.unassigned.is_empty() {
            println!("unassigned: {:?}", self.unassigned);
        }
        if !self.unassignable.is_empty() {
            println!("unassignable: {:?}", self.unassignable);
        }
    }
}
