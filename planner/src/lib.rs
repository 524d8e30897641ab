use uavsched_structs::Point;

pub mod assign;
pub mod grid;
pub mod savings;

mod assign_tests;

/// Engine tunables. Defaults match the reference mission profile; callers
/// override individual fields.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    /// Minimum allowed distance between two airborne agents.
    pub min_separation: f32,
    /// Communication range; pairs near this distance get corrected.
    pub max_communication: f32,
    /// Half-width of the band around `max_communication` that counts as near.
    pub comm_tolerance: f32,
    /// Largest single nudge toward the leader for a far pair.
    pub leader_step: f32,
    /// Push-apart distance for a close pair.
    pub separation_step: f32,
    /// A fleet recall fires when any margin drops below this.
    pub recall_margin: f32,
    /// Per-agent landing stagger on a fleet recall.
    pub recall_stagger: f32,
    /// Offset of a tangent detour waypoint.
    pub detour_dist: f32,
    /// Per-route flight time bound for the coverage optimizer.
    pub max_route_time: f32,
    /// Hard stop for the planning loop.
    pub max_rounds: usize,
    /// Knobs for the grid search used on blocked segments.
    pub grid: grid::GridConfig,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            min_separation: 50.0,
            max_communication: 1000.0,
            comm_tolerance: 50.0,
            leader_step: 200.0,
            separation_step: 50.0,
            recall_margin: 20.0,
            recall_stagger: 2.0,
            detour_dist: 100.0,
            max_route_time: 600.0,
            max_rounds: 1000,
            grid: Default::default(),
        }
    }
}

pub(crate) fn lerp(a: &Point, b: &Point, r: f32) -> Point {
    Point {
        x: a.x + (b.x - a.x) * r,
        y: a.y + (b.y - a.y) * r,
    }
}
