use log::warn;
use serde::{Deserialize, Serialize};

use crate::task::TaskKind;
use crate::{Error, Point};

/// Cruise speed in plan units per second; flight time is always
/// distance / CRUISE_SPEED.
pub const CRUISE_SPEED: f32 = 50.0;
/// Time spent on the pad for a battery swap.
pub const RECHARGE_SECS: f32 = 60.0;

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Drone {
    pub id: String,
    pub payload_capacity: f32,
    /// Full flight/hover budget in seconds.
    pub endurance_capacity: f32,
    pub hover_capacity: f32,
    pub base: Point,
    pub pos: Point,
    pub remaining_endurance: f32,
    pub accumulated_time: f32,
    /// Every committed waypoint with the cumulative time at arrival.
    pub path: Vec<(Point, f32)>,
    pub recharge_count: u32,
    pub is_leader: bool,
    /// Terminal: set when a forced recall cannot reach base.
    pub stranded: bool,
}

impl Drone {
    pub fn new(id: &str, payload: f32, endurance: f32, hover: f32, base: Point) -> Drone {
        Drone {
            id: id.to_string(),
            payload_capacity: payload,
            endurance_capacity: endurance,
            hover_capacity: hover,
            base,
            pos: base,
            remaining_endurance: endurance,
            accumulated_time: 0.0,
            path: vec![(base, 0.0)],
            recharge_count: 0,
            is_leader: false,
            stranded: false,
        }
    }

    pub fn dist_to(&self, p: &Point) -> f32 {
        self.pos.dist(p)
    }

    pub fn time_to(&self, p: &Point) -> f32 {
        self.dist_to(p) / CRUISE_SPEED
    }

    /// Endurance left over after flying straight home.
    pub fn endurance_margin(&self) -> f32 {
        self.remaining_endurance - self.time_to(&self.base)
    }

    pub fn can_serve(&self, kind: &TaskKind) -> bool {
        match kind {
            TaskKind::Delivery(w) | TaskKind::Urgent(w) => *w <= self.payload_capacity,
            TaskKind::Recon(h) => *h <= self.hover_capacity,
        }
    }

    /// Commit a straight hop to `target` plus `service_time` on site. Fails
    /// without mutating when the hop would leave less endurance than the
    /// flight home from `target` needs.
    pub fn move_to(&mut self, target: Point, service_time: f32) -> Result<(), Error> {
        let total = self.time_to(&target) + service_time;
        let need = total + target.dist(&self.base) / CRUISE_SPEED;
        if self.remaining_endurance < need {
            return Err(Error::InsufficientEndurance {
                need,
                have: self.remaining_endurance,
            });
        }
        self.remaining_endurance -= total;
        self.accumulated_time += total;
        self.pos = target;
        self.path.push((target, self.accumulated_time));
        Ok(())
    }

    /// Fly home and swap batteries. The path entry records the arrival time;
    /// the recharge stop is added to accumulated time afterwards.
    pub fn return_to_base(&mut self) -> Result<(), Error> {
        let flight = self.time_to(&self.base);
        if self.remaining_endurance < flight {
            warn!(
                "drone {} cannot reach base: need {:.1} s, have {:.1} s",
                self.id, flight, self.remaining_endurance
            );
            return Err(Error::InsufficientEndurance {
                need: flight,
                have: self.remaining_endurance,
            });
        }
        self.accumulated_time += flight;
        self.pos = self.base;
        self.path.push((self.base, self.accumulated_time));
        self.recharge_count += 1;
        self.remaining_endurance = self.endurance_capacity;
        self.accumulated_time += RECHARGE_SECS;
        Ok(())
    }
}

/// The drone set plus the designated leader (always the first drone), which
/// the far-pair correction uses as rally point.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Fleet {
    pub base: Point,
    pub drones: Vec<Drone>,
}

impl Fleet {
    pub fn new(base: Point, mut drones: Vec<Drone>) -> Fleet {
        assert!(!drones.is_empty());
        for d in drones.iter_mut() {
            d.is_leader = false;
        }
        drones[0].is_leader = true;
        Fleet { base, drones }
    }

    pub fn leader(&self) -> &Drone {
        &self.drones[0]
    }

    /// Re-planning handoff: keep position, endurance, and recharge count;
    /// restart path and time accounting from the current position.
    pub fn checkpoint(&mut self) {
        for d in self.drones.iter_mut() {
            d.accumulated_time = 0.0;
            d.path = vec![(d.pos, 0.0)];
        }
    }
}
