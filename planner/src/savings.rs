use log::{debug, info};
use ordered_float::OrderedFloat;
use uavsched_structs::drone::CRUISE_SPEED;
use uavsched_structs::Point;

use crate::{lerp, Params};

/// One multi-stop round trip from the depot. Stops index into the caller's
/// target list; the depot bookends are implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub stops: Vec<usize>,
}

/// Clarke-Wright savings merge: start from one round trip per target, then
/// join routes in descending order of saved distance. A pair is mergeable
/// only while both stops sit next to a depot bookend of different routes,
/// and never below one route per agent.
pub fn merge_routes(depot: &Point, targets: &[Point], n_agents: usize) -> Vec<Route> {
    let mut routes = (0..targets.len())
        .map(|i| Route { stops: vec![i] })
        .collect::<Vec<_>>();

    let mut savings = Vec::new();
    for i in 0..targets.len() {
        for j in i + 1..targets.len() {
            let s = depot.dist(&targets[i]) + depot.dist(&targets[j]) - targets[i].dist(&targets[j]);
            savings.push((OrderedFloat(s), i, j));
        }
    }
    savings.sort();
    savings.reverse();

    for (saving, i, j) in savings {
        if routes.len() <= n_agents.max(1) {
            break;
        }
        let ri = find_route(&routes, i);
        let rj = find_route(&routes, j);
        if ri == rj {
            continue;
        }
        let i_end = routes[ri].stops.first() == Some(&i) || routes[ri].stops.last() == Some(&i);
        let j_end = routes[rj].stops.first() == Some(&j) || routes[rj].stops.last() == Some(&j);
        if !i_end || !j_end {
            continue;
        }

        let second = routes.remove(ri.max(rj));
        let first = routes.remove(ri.min(rj));
        let (mut a, mut b) = if ri < rj {
            (first, second)
        } else {
            (second, first)
        };
        // Orient so i sits at the tail and j at the head, joining i-j at the
        // shared depot seam. Distances are symmetric, so reversal is free.
        if a.stops.last() != Some(&i) {
            a.stops.reverse();
        }
        if b.stops.first() != Some(&j) {
            b.stops.reverse();
        }
        a.stops.extend(b.stops);
        debug!("merged at saving {:.0}: {:?}", saving.0, a.stops);
        routes.push(a);
    }
    routes
}

fn find_route(routes: &[Route], stop: usize) -> usize {
    // Every stop lives in exactly one route.
    routes.iter().position(|r| r.stops.contains(&stop)).unwrap()
}

pub fn route_distance(depot: &Point, targets: &[Point], route: &Route) -> f32 {
    let mut d = 0.0;
    let mut prev = depot;
    for s in &route.stops {
        d += prev.dist(&targets[*s]);
        prev = &targets[*s];
    }
    d + prev.dist(depot)
}

pub fn route_time(depot: &Point, targets: &[Point], route: &Route) -> f32 {
    route_distance(depot, targets, route) / CRUISE_SPEED
}

/// Piecewise-linear position along a route at time `t`, clamped to the
/// depot at both ends.
pub fn position_at(depot: &Point, targets: &[Point], route: &Route, t: f32) -> Point {
    let mut waypoints = Vec::with_capacity(route.stops.len() + 2);
    waypoints.push(*depot);
    waypoints.extend(route.stops.iter().map(|s| targets[*s]));
    waypoints.push(*depot);

    let mut remaining = t.max(0.0) * CRUISE_SPEED;
    for (a, b) in waypoints.iter().zip(waypoints.iter().skip(1)) {
        let leg = a.dist(b);
        if remaining <= leg {
            if leg <= 0.0 {
                return *a;
            }
            return lerp(a, b, remaining / leg);
        }
        remaining -= leg;
    }
    *depot
}

/// Sample every route pair at 1 s steps and test the separation band. The
/// pad is a controlled zone: the minimum-separation check is waived while
/// either position is within that radius of the depot.
pub fn routes_compatible(depot: &Point, targets: &[Point], routes: &[Route], params: &Params) -> bool {
    let horizon = routes
        .iter()
        .map(|r| route_time(depot, targets, r))
        .fold(0.0, f32::max);
    let steps = horizon.ceil() as i32;
    for i in 0..routes.len() {
        for j in i + 1..routes.len() {
            for t in 0..=steps {
                let pa = position_at(depot, targets, &routes[i], t as f32);
                let pb = position_at(depot, targets, &routes[j], t as f32);
                let d = pa.dist(&pb);
                if d > params.max_communication {
                    debug!("routes {} and {} at {} s: {:.0} beyond comm range", i, j, t, d);
                    return false;
                }
                let in_pad = pa.dist(depot) < params.min_separation
                    || pb.dist(depot) < params.min_separation;
                if !in_pad && d < params.min_separation {
                    debug!("routes {} and {} at {} s: {:.0} below separation", i, j, t, d);
                    return false;
                }
            }
        }
    }
    true
}

fn total_distance(depot: &Point, targets: &[Point], routes: &[Route]) -> f32 {
    routes.iter().map(|r| route_distance(depot, targets, r)).sum()
}

fn routes_valid(depot: &Point, targets: &[Point], routes: &[Route], params: &Params) -> bool {
    routes
        .iter()
        .all(|r| route_time(depot, targets, r) <= params.max_route_time)
        && routes_compatible(depot, targets, routes, params)
}

/// Hill-climbing repair: trial-swap single stops between route pairs,
/// keeping a swap only when the swapped plan is valid and either the
/// current plan is not, or total distance strictly improves.
pub fn adjust_routes(depot: &Point, targets: &[Point], routes: &mut Vec<Route>, params: &Params) {
    loop {
        let current_ok = routes_valid(depot, targets, routes, params);
        let current_dist = total_distance(depot, targets, routes);

        let mut applied = false;
        'swap: for i in 0..routes.len() {
            for j in i + 1..routes.len() {
                for k in 0..routes[i].stops.len() {
                    for l in 0..routes[j].stops.len() {
                        let mut trial = routes.clone();
                        let tmp = trial[i].stops[k];
                        trial[i].stops[k] = trial[j].stops[l];
                        trial[j].stops[l] = tmp;

                        if !routes_valid(depot, targets, &trial, params) {
                            continue;
                        }
                        let dist = total_distance(depot, targets, &trial);
                        if !current_ok || dist < current_dist - 1e-3 {
                            debug!(
                                "swap route {} stop {} with route {} stop {}: {:.0} -> {:.0}",
                                i, k, j, l, current_dist, dist
                            );
                            *routes = trial;
                            applied = true;
                            break 'swap;
                        }
                    }
                }
            }
        }
        if !applied {
            break;
        }
    }
}

/// Coverage entry point: savings merge, then constraint-driven adjustment
/// when the merged plan violates separation, communication, or flight-time
/// limits.
pub fn plan_coverage(depot: &Point, targets: &[Point], n_agents: usize, params: &Params) -> Vec<Route> {
    #[cfg(feature = "prof")]
    let _p = hprof::enter("coverage");
    let mut routes = merge_routes(depot, targets, n_agents);
    if !routes_valid(depot, targets, &routes, params) {
        info!("merged routes violate constraints, adjusting");
        adjust_routes(depot, targets, &mut routes, params);
    }
    routes
}
