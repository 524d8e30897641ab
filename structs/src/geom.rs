use crate::obstacle::Obstacle;
use crate::Point;

/// Exact segment-circle test: project the center onto the line through
/// p1,p2, clamp the parameter to the segment, compare squared distances.
/// A zero-length segment degenerates to a point test on p1.
pub fn segment_intersects_circle(p1: &Point, p2: &Point, center: &Point, radius: f32) -> bool {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let l2 = dx * dx + dy * dy;
    let t = if l2 > 0.0 {
        (((center.x - p1.x) * dx + (center.y - p1.y) * dy) / l2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = p1.x + t * dx - center.x;
    let cy = p1.y + t * dy - center.y;
    cx * cx + cy * cy <= radius * radius
}

/// Single-hop detour waypoint for a blocked segment: offset from `start` by
/// `detour_dist` along the tangent of the radial direction. Returns `end`
/// unchanged when the segment is clear. Callers must re-check blocking and
/// may chain calls; this is a heuristic step, not a full path.
pub fn tangent_detour(start: &Point, end: &Point, obstacle: &Obstacle, detour_dist: f32) -> Point {
    if !obstacle.blocks(start, end) {
        return *end;
    }
    let vx = start.x - obstacle.center.x;
    let vy = start.y - obstacle.center.y;
    let len = (vx * vx + vy * vy).sqrt();
    // Rotate the radial vector 90 degrees. A start exactly on the center has
    // no radial direction; fall back to +x.
    let (tx, ty) = if len > 0.0 {
        (-vy / len, vx / len)
    } else {
        (1.0, 0.0)
    };
    Point {
        x: start.x + tx * detour_dist,
        y: start.y + ty * detour_dist,
    }
}
