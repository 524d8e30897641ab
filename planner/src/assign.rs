use log::{debug, info, trace, warn};
use ordered_float::OrderedFloat;
use tinyvec::TinyVec;
use uavsched_structs::drone::{Fleet, CRUISE_SPEED};
use uavsched_structs::geom::tangent_detour;
use uavsched_structs::obstacle::Obstacle;
use uavsched_structs::plan::{AgentRoute, Assignment, MissionPlan};
use uavsched_structs::task::Task;
use uavsched_structs::{Error, Point};

use crate::{grid, lerp, Params};

/// Run the iterative assignment loop until every assignable task is taken,
/// then send the fleet home. The engine is the sole mutator of fleet and
/// task state for the duration of the call.
pub fn plan(
    fleet: &mut Fleet,
    tasks: &mut [Task],
    obstacles: &[Obstacle],
    params: &Params,
) -> MissionPlan {
    assert!(!fleet.drones.is_empty());
    let n_tasks = tasks.len();
    // Priority order drives the convergence scan and distance tie-breaks;
    // the pick itself stays nearest-first.
    let mut order = (0..n_tasks).collect::<Vec<_>>();
    order.sort_by_key(|&i| tasks[i].priority);

    let mut engine = Engine {
        fleet,
        tasks,
        obstacles,
        params,
        order,
        assignments: Vec::new(),
        unassignable: vec![false; n_tasks],
        rounds: 0,
    };
    engine.run();
    engine.into_plan()
}

/// Discrete re-planning checkpoint: restart each drone's path and time
/// accounting at its current position, keep endurance and recharge state,
/// and run the same loop over the updated scenario.
pub fn replan(
    fleet: &mut Fleet,
    tasks: &mut [Task],
    obstacles: &[Obstacle],
    params: &Params,
) -> MissionPlan {
    info!("replanning from checkpoint");
    fleet.checkpoint();
    plan(fleet, tasks, obstacles, params)
}

struct Engine<'a> {
    fleet: &'a mut Fleet,
    tasks: &'a mut [Task],
    obstacles: &'a [Obstacle],
    params: &'a Params,
    order: Vec<usize>,
    assignments: Vec<(usize, usize)>,
    unassignable: Vec<bool>,
    rounds: usize,
}

impl Engine<'_> {
    fn run(&mut self) {
        #[cfg(feature = "prof")]
        let _p = hprof::enter("assign");
        debug_assert_eq!(self.fleet.drones.iter().filter(|d| d.is_leader).count(), 1);
        debug!(
            "planning {} tasks for {} drones, {} obstacles",
            self.tasks.len(),
            self.fleet.drones.len(),
            self.obstacles.len()
        );
        self.capability_scan();

        let mut breakthrough = true;
        'planning: loop {
            if !self.pending() {
                break;
            }
            if self.rounds == self.params.max_rounds {
                warn!("stopping after {} rounds with tasks unassigned", self.rounds);
                break;
            }
            self.rounds += 1;

            // Pair corrections take strict priority over assignment.
            if self.correct_pair() {
                continue 'planning;
            }

            if !breakthrough || self.margin_low() {
                self.recall_all();
            }

            breakthrough = false;
            for d_idx in 0..self.fleet.drones.len() {
                if self.fleet.drones[d_idx].stranded {
                    continue;
                }
                if self.try_assign(d_idx) {
                    breakthrough = true;
                }
            }

            if !breakthrough {
                breakthrough = self.detour_assign();
            }
        }
        self.go_home();
        info!("planning done in {} rounds", self.rounds);
    }

    fn pending(&self) -> bool {
        self.tasks
            .iter()
            .enumerate()
            .any(|(i, t)| !t.assigned && !self.unassignable[i])
    }

    /// Tasks no agent could ever serve are excluded up front so they cannot
    /// keep the loop alive.
    fn capability_scan(&mut self) {
        for t_idx in 0..self.tasks.len() {
            if self.tasks[t_idx].assigned {
                continue;
            }
            let kind = self.tasks[t_idx].kind;
            if !self.fleet.drones.iter().any(|d| d.can_serve(&kind)) {
                let err = Error::UnassignableTask(self.tasks[t_idx].id.clone());
                warn!("excluded from planning: {}", err);
                self.unassignable[t_idx] = true;
            }
        }
    }

    fn margin_low(&self) -> bool {
        self.fleet
            .drones
            .iter()
            .any(|d| !d.stranded && d.endurance_margin() < self.params.recall_margin)
    }

    /// Scan agent pairs and apply the first correction found: regroup on the
    /// leader near the communication range, push apart below minimum
    /// separation once both have left base.
    fn correct_pair(&mut self) -> bool {
        let leader_pos = self.fleet.leader().pos;
        let n = self.fleet.drones.len();
        for i in 0..n {
            if self.fleet.drones[i].stranded {
                continue;
            }
            for j in (i + 1)..n {
                if self.fleet.drones[j].stranded {
                    continue;
                }
                let d = self.fleet.drones[i].pos.dist(&self.fleet.drones[j].pos);
                trace!(
                    "pair {} {} at {:.0}",
                    self.fleet.drones[i].id,
                    self.fleet.drones[j].id,
                    d
                );
                if (d - self.params.max_communication).abs() < self.params.comm_tolerance {
                    warn!(
                        "{} and {} at {:.0}, near the communication range, regrouping on {}",
                        self.fleet.drones[i].id,
                        self.fleet.drones[j].id,
                        d,
                        self.fleet.leader().id
                    );
                    self.nudge_toward_leader(i, leader_pos);
                    self.nudge_toward_leader(j, leader_pos);
                    return true;
                }
                let off_base_i = !self.fleet.drones[i].pos.eq_approx(&self.fleet.drones[i].base);
                let off_base_j = !self.fleet.drones[j].pos.eq_approx(&self.fleet.drones[j].base);
                if d < self.params.min_separation && off_base_i && off_base_j {
                    warn!(
                        "{} and {} at {:.0}, below minimum separation, pushing apart",
                        self.fleet.drones[i].id, self.fleet.drones[j].id, d
                    );
                    self.push_apart(i, j);
                    return true;
                }
            }
        }
        false
    }

    fn nudge_toward_leader(&mut self, idx: usize, leader_pos: Point) {
        let pos = self.fleet.drones[idx].pos;
        let to_leader = pos.dist(&leader_pos);
        // The leader itself has nowhere to go.
        if to_leader <= 0.0 {
            return;
        }
        let step = self.params.leader_step.min(to_leader);
        let target = lerp(&pos, &leader_pos, step / to_leader);
        let target = self.detour_target(&pos, target);
        if let Err(e) = self.fleet.drones[idx].move_to(target, 0.0) {
            debug!(
                "correction move skipped for {}: {}",
                self.fleet.drones[idx].id, e
            );
        }
    }

    fn push_apart(&mut self, i: usize, j: usize) {
        let (pi, pj) = (self.fleet.drones[i].pos, self.fleet.drones[j].pos);
        let d = pi.dist(&pj);
        let (ux, uy) = if d > 0.0 {
            ((pj.x - pi.x) / d, (pj.y - pi.y) / d)
        } else {
            (1.0, 0.0)
        };
        let step = self.params.separation_step;
        let ti = Point {
            x: pi.x - ux * step,
            y: pi.y - uy * step,
        };
        let tj = Point {
            x: pj.x + ux * step,
            y: pj.y + uy * step,
        };
        let ti = self.detour_target(&pi, ti);
        let tj = self.detour_target(&pj, tj);
        if let Err(e) = self.fleet.drones[i].move_to(ti, 0.0) {
            debug!("correction move skipped for {}: {}", self.fleet.drones[i].id, e);
        }
        if let Err(e) = self.fleet.drones[j].move_to(tj, 0.0) {
            debug!("correction move skipped for {}: {}", self.fleet.drones[j].id, e);
        }
    }

    /// Route a correction move around the first blocking obstacle, if any.
    fn detour_target(&self, from: &Point, to: Point) -> Point {
        for obs in self.obstacles {
            if obs.blocks(from, &to) {
                return tangent_detour(from, &to, obs, self.params.detour_dist);
            }
        }
        to
    }

    /// Best-effort fleet recall with staggered landings. A drone that cannot
    /// reach base is stranded where it is and takes no further part.
    fn recall_all(&mut self) {
        info!("fleet recall: no progress or low endurance margin");
        for i in 0..self.fleet.drones.len() {
            if self.fleet.drones[i].stranded {
                continue;
            }
            match self.fleet.drones[i].return_to_base() {
                Ok(()) => {
                    // Stagger landings by fleet index.
                    self.fleet.drones[i].accumulated_time +=
                        i as f32 * self.params.recall_stagger;
                }
                Err(_) => {
                    let d = &mut self.fleet.drones[i];
                    d.stranded = true;
                    warn!("drone {} stranded at ({:.0}, {:.0})", d.id, d.pos.x, d.pos.y);
                }
            }
        }
    }

    /// Nearest-first pick over unassigned tasks; equal distances fall back
    /// to priority order. Blocked or over-demand candidates are skipped, a
    /// failed move defers to the next candidate, and the agent takes at most
    /// one task per pass.
    fn try_assign(&mut self, d_idx: usize) -> bool {
        let pos = self.fleet.drones[d_idx].pos;
        let mut candidates = self
            .order
            .iter()
            .copied()
            .filter(|&t| !self.tasks[t].assigned && !self.unassignable[t])
            .collect::<TinyVec<[usize; 16]>>();
        candidates.sort_by_key(|&t| OrderedFloat(pos.dist(&self.tasks[t].coord)));

        for t_idx in candidates {
            let task = &self.tasks[t_idx];
            if let Some(obs) = self.obstacles.iter().find(|o| o.blocks(&pos, &task.coord)) {
                trace!(
                    "{}: {} blocked by obstacle at ({:.0}, {:.0})",
                    self.fleet.drones[d_idx].id,
                    task.id,
                    obs.center.x,
                    obs.center.y
                );
                continue;
            }
            if !self.fleet.drones[d_idx].can_serve(&task.kind) {
                trace!(
                    "{}: {} demand {:.0} beyond capacity",
                    self.fleet.drones[d_idx].id,
                    task.id,
                    task.kind.demand()
                );
                continue;
            }
            let coord = task.coord;
            let service = task.kind.service_time();
            match self.fleet.drones[d_idx].move_to(coord, service) {
                Ok(()) => {
                    self.tasks[t_idx].assigned = true;
                    self.assignments.push((t_idx, d_idx));
                    info!(
                        "{} -> {} ({:.0}, {:.0})",
                        self.fleet.drones[d_idx].id,
                        self.tasks[t_idx].id,
                        coord.x,
                        coord.y
                    );
                    return true;
                }
                Err(e) => {
                    debug!(
                        "{} skips {}: {}",
                        self.fleet.drones[d_idx].id, self.tasks[t_idx].id, e
                    );
                }
            }
        }
        false
    }

    /// After a pass with no progress, try one grid detour: the highest
    /// priority task that every capable agent is blocked from reaching
    /// directly, flown by the nearest of them. Failure leaves the task
    /// deferred and the recall rule takes over next round.
    fn detour_assign(&mut self) -> bool {
        let t_idx = self.order.iter().copied().find(|&t| {
            if self.tasks[t].assigned || self.unassignable[t] {
                return false;
            }
            let coord = self.tasks[t].coord;
            let mut capable = self
                .fleet
                .drones
                .iter()
                .filter(|d| !d.stranded && d.can_serve(&self.tasks[t].kind))
                .peekable();
            capable.peek().is_some()
                && capable.all(|d| self.obstacles.iter().any(|o| o.blocks(&d.pos, &coord)))
        });
        let t_idx = match t_idx {
            Some(t) => t,
            None => return false,
        };

        let coord = self.tasks[t_idx].coord;
        let kind = self.tasks[t_idx].kind;
        let d_idx = (0..self.fleet.drones.len())
            .filter(|&i| !self.fleet.drones[i].stranded && self.fleet.drones[i].can_serve(&kind))
            .min_by_key(|&i| OrderedFloat(self.fleet.drones[i].dist_to(&coord)));
        let d_idx = match d_idx {
            Some(i) => i,
            None => return false,
        };

        let others = self
            .fleet
            .drones
            .iter()
            .enumerate()
            .filter(|&(i, d)| i != d_idx && !d.pos.eq_approx(&d.base))
            .map(|(_, d)| d.pos)
            .collect::<Vec<_>>();
        let start = self.fleet.drones[d_idx].pos;
        let path = match grid::find_path(start, coord, self.obstacles, &others, &self.params.grid)
        {
            Ok(p) => p,
            Err(e) => {
                debug!("no detour to {}: {}", self.tasks[t_idx].id, e);
                return false;
            }
        };

        // The whole detour plus the flight home from the goal must fit
        // before any hop is committed.
        let service = kind.service_time();
        let len = path
            .iter()
            .zip(path.iter().skip(1))
            .map(|(a, b)| a.dist(b))
            .sum::<f32>();
        let base = self.fleet.drones[d_idx].base;
        let need = len / CRUISE_SPEED + service + coord.dist(&base) / CRUISE_SPEED;
        if self.fleet.drones[d_idx].remaining_endurance < need {
            debug!(
                "detour to {} does not fit {}: need {:.1} s, have {:.1} s",
                self.tasks[t_idx].id,
                self.fleet.drones[d_idx].id,
                need,
                self.fleet.drones[d_idx].remaining_endurance
            );
            return false;
        }

        // Intermediate hops carry no service time; the goal hop carries all
        // of it. The grid path ends on the exact task coordinate.
        for wp in path.iter().take(path.len() - 1).skip(1) {
            if let Err(e) = self.fleet.drones[d_idx].move_to(*wp, 0.0) {
                warn!("detour hop failed for {}: {}", self.fleet.drones[d_idx].id, e);
                return false;
            }
        }
        if let Err(e) = self.fleet.drones[d_idx].move_to(coord, service) {
            warn!("detour hop failed for {}: {}", self.fleet.drones[d_idx].id, e);
            return false;
        }
        self.tasks[t_idx].assigned = true;
        self.assignments.push((t_idx, d_idx));
        info!(
            "{} -> {} via {} grid waypoints",
            self.fleet.drones[d_idx].id,
            self.tasks[t_idx].id,
            path.len()
        );
        true
    }

    /// Converged: command every active drone home. No recharge on the final
    /// return.
    fn go_home(&mut self) {
        for d in self.fleet.drones.iter_mut() {
            if d.stranded {
                continue;
            }
            let base = d.base;
            if let Err(e) = d.move_to(base, 0.0) {
                d.stranded = true;
                warn!("drone {} cannot make the final return: {}", d.id, e);
            }
        }
    }

    fn into_plan(self) -> MissionPlan {
        let routes = self
            .fleet
            .drones
            .iter()
            .map(|d| AgentRoute {
                agent: d.id.clone(),
                waypoints: d.path.clone(),
                total_time: d.accumulated_time,
                recharges: d.recharge_count,
                stranded: d.stranded,
            })
            .collect();
        let assignments = self
            .assignments
            .iter()
            .map(|&(t, d)| Assignment {
                task: self.tasks[t].id.clone(),
                agent: self.fleet.drones[d].id.clone(),
            })
            .collect();
        let unassignable = self
            .tasks
            .iter()
            .enumerate()
            .filter(|&(i, _)| self.unassignable[i])
            .map(|(_, t)| t.id.clone())
            .collect();
        let unassigned = self
            .tasks
            .iter()
            .enumerate()
            .filter(|&(i, t)| !t.assigned && !self.unassignable[i])
            .map(|(_, t)| t.id.clone())
            .collect();
        MissionPlan {
            routes,
            assignments,
            unassigned,
            unassignable,
            rounds: self.rounds,
        }
    }
}
