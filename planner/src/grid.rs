use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use log::{debug, trace};
use ordered_float::OrderedFloat;
use uavsched_structs::obstacle::Obstacle;
use uavsched_structs::{Error, Point};

/// Grid search knobs. Bounds are inclusive world-coordinate limits.
#[derive(Debug, Clone, Copy)]
pub struct GridConfig {
    pub resolution: f32,
    pub min: Point,
    pub max: Point,
    /// Obstacles are grown by this much before the search.
    pub safety_margin: f32,
    /// Keep-out radius around other agents' positions.
    pub separation: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            resolution: 50.0,
            min: Point { x: 0.0, y: 0.0 },
            max: Point {
                x: 2000.0,
                y: 2000.0,
            },
            safety_margin: 50.0,
            separation: 50.0,
        }
    }
}

/// 8-connected A* over a grid anchored at `start`. Step cost and heuristic
/// are both Euclidean, so the result is optimal for the grid's connectivity.
/// A node within one resolution of `goal` ends the search and the exact goal
/// is appended as the final vertex. The returned path starts at `start`.
pub fn find_path(
    start: Point,
    goal: Point,
    obstacles: &[Obstacle],
    others: &[Point],
    cfg: &GridConfig,
) -> Result<Vec<Point>, Error> {
    #[cfg(feature = "prof")]
    let _p = hprof::enter("grid search");

    let inflated = obstacles
        .iter()
        .map(|o| o.inflated(cfg.safety_margin))
        .collect::<Vec<_>>();
    let blocked = |p: &Point| {
        p.x < cfg.min.x
            || p.x > cfg.max.x
            || p.y < cfg.min.y
            || p.y > cfg.max.y
            || inflated.iter().any(|o| o.center.dist(p) <= o.radius)
            || others.iter().any(|q| q.dist(p) < cfg.separation)
    };
    let cell = |c: (i32, i32)| Point {
        x: start.x + c.0 as f32 * cfg.resolution,
        y: start.y + c.1 as f32 * cfg.resolution,
    };

    // (f, g, cell); Reverse turns the max-heap into a min-heap.
    let mut open: BinaryHeap<Reverse<(OrderedFloat<f32>, OrderedFloat<f32>, (i32, i32))>> =
        BinaryHeap::new();
    let mut best_g: HashMap<(i32, i32), f32> = HashMap::new();
    let mut prev: HashMap<(i32, i32), (i32, i32)> = HashMap::new();
    let mut closed: HashSet<(i32, i32)> = HashSet::new();

    open.push(Reverse((
        OrderedFloat(start.dist(&goal)),
        OrderedFloat(0.0),
        (0, 0),
    )));
    best_g.insert((0, 0), 0.0);

    let mut n_ops = 0;
    while let Some(Reverse((_f, OrderedFloat(g), node))) = open.pop() {
        if !closed.insert(node) {
            continue;
        }
        let pos = cell(node);
        n_ops += 1;
        trace!("expand ({}, {}) at ({:.0}, {:.0}) g {:.0}", node.0, node.1, pos.x, pos.y, g);

        if pos.dist(&goal) < cfg.resolution {
            let mut path = vec![goal];
            if !pos.eq_approx(&goal) {
                path.push(pos);
            }
            let mut c = node;
            while let Some(&p) = prev.get(&c) {
                c = p;
                path.push(cell(c));
            }
            path.reverse();
            debug!(
                "grid path ({:.0}, {:.0}) -> ({:.0}, {:.0}): {} vertices, {} expansions",
                start.x, start.y, goal.x, goal.y, path.len(), n_ops
            );
            return Ok(path);
        }

        for dx in -1..=1i32 {
            for dy in -1..=1i32 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nb = (node.0 + dx, node.1 + dy);
                if closed.contains(&nb) {
                    continue;
                }
                let npos = cell(nb);
                if blocked(&npos) {
                    continue;
                }
                let ng = g + pos.dist(&npos);
                if best_g.get(&nb).map(|og| ng < *og).unwrap_or(true) {
                    best_g.insert(nb, ng);
                    prev.insert(nb, node);
                    open.push(Reverse((
                        OrderedFloat(ng + npos.dist(&goal)),
                        OrderedFloat(ng),
                        nb,
                    )));
                }
            }
        }
    }
    debug!("grid search exhausted after {} expansions", n_ops);
    Err(Error::NoFeasiblePath)
}
