//! Phase D — graph assembly, Phase E — altitude interpolation.
//! Operates globally: nodes are every accessible area on every level, so
//! an intermediate level layered `on_top_of` another can inherit altitude
//! across the boundary they share.

use std::collections::VecDeque;

use geo::{Area, Centroid, Line, LineString, Point, Polygon, Relate};

use crate::model::{LevelId, SpaceId};

pub struct AreaNode {
    pub level: LevelId,
    pub geometry: Polygon<f64>,
    pub anchor: Option<f64>,
    /// The space this area mostly came from, threaded through from
    /// classification so the per-space fallback (step 3a below) can group
    /// areas the way the original per-space pass does.
    pub space: Option<SpaceId>,
}

/// Assigns an altitude to every node, per Phase D/E. `base_altitude` is
/// looked up per level for the "no anchors at all" fallback.
pub fn interpolate(nodes: &mut [AreaNode], base_altitude: impl Fn(LevelId) -> f64) {
    let n = nodes.len();
    if n == 0 {
        return;
    }

    let adjacency = build_adjacency(nodes);

    // Phase E step 1: linear assignment along unique shortest paths between
    // anchor pairs that pass only through unanchored nodes.
    loop {
        let anchors: Vec<usize> = (0..n).filter(|&i| nodes[i].anchor.is_some()).collect();
        let mut assigned_any = false;

        'pairs: for ai in 0..anchors.len() {
            for bi in (ai + 1)..anchors.len() {
                let a = anchors[ai];
                let b = anchors[bi];
                let alt_a = nodes[a].anchor.unwrap();
                let alt_b = nodes[b].anchor.unwrap();
                if (alt_a - alt_b).abs() < f64::EPSILON {
                    continue;
                }
                let Some(path) = shortest_path_through_unanchored(&adjacency, nodes, a, b) else {
                    continue;
                };
                if path.len() < 2 {
                    continue;
                }
                let hops = path.len() - 1;
                for (k, &node_idx) in path.iter().enumerate() {
                    if nodes[node_idx].anchor.is_none() {
                        let frac = k as f64 / hops as f64;
                        nodes[node_idx].anchor = Some(alt_a + frac * (alt_b - alt_a));
                        assigned_any = true;
                    }
                }
                if assigned_any {
                    break 'pairs;
                }
            }
        }

        if !assigned_any {
            break;
        }
    }

    // Phase E step 2: unanchored neighbor of an anchored node copies it,
    // to a fixed point.
    loop {
        let mut changed = false;
        for i in 0..n {
            if nodes[i].anchor.is_some() {
                continue;
            }
            if let Some(&neighbor) = adjacency[i].iter().find(|&&j| nodes[j].anchor.is_some()) {
                nodes[i].anchor = nodes[neighbor].anchor;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Phase E step 3: a three-tier fallback for areas still unanchored
    // after steps 1/2, matching the original's `_interpolate_areas`
    // per-space pass followed by `_finalize_level`'s coarser per-level pass:
    //   3a. same-space composite key (polygon distance, then centroid
    //       distance to the competing altitude's areas, then altitude) —
    //       only for areas whose own space has at least one anchored area;
    //   3b. per-level nearest-anchored-area-by-centroid, for whatever step
    //       3a didn't reach (no space, or an unanchored space);
    //   3c. the level has no anchors at all: every area on it falls back to
    //       `base_altitude`.
    let levels: Vec<LevelId> = {
        let mut set: Vec<LevelId> = nodes.iter().map(|n| n.level).collect();
        set.sort_by_key(|l| l.0);
        set.dedup();
        set
    };

    for level in levels {
        let on_level: Vec<usize> = (0..n).filter(|&i| nodes[i].level == level).collect();
        let anchored_on_level: Vec<usize> = on_level.iter().copied().filter(|&i| nodes[i].anchor.is_some()).collect();

        if anchored_on_level.is_empty() {
            let fallback = base_altitude(level);
            for &i in &on_level {
                nodes[i].anchor = Some(fallback);
            }
            continue;
        }

        for &i in &on_level {
            if nodes[i].anchor.is_some() {
                continue;
            }
            let Some(space) = nodes[i].space else { continue };
            let siblings: Vec<usize> = on_level
                .iter()
                .copied()
                .filter(|&j| j != i && nodes[j].space == Some(space) && nodes[j].anchor.is_some())
                .collect();
            if siblings.is_empty() {
                continue;
            }

            let mut by_altitude: Vec<(f64, Vec<usize>)> = Vec::new();
            for &j in &siblings {
                let altitude = nodes[j].anchor.unwrap();
                match by_altitude.iter_mut().find(|(a, _)| (*a - altitude).abs() < 1e-9) {
                    Some((_, members)) => members.push(j),
                    None => by_altitude.push((altitude, vec![j])),
                }
            }

            let centroid_i = nodes[i].geometry.centroid().unwrap_or(Point::new(0.0, 0.0));
            let best = by_altitude
                .iter()
                .map(|(altitude, members)| {
                    let poly_dist = members
                        .iter()
                        .map(|&j| polygon_distance(&nodes[i].geometry, &nodes[j].geometry))
                        .fold(f64::INFINITY, f64::min);
                    let group_centroid = weighted_centroid(members.iter().map(|&j| &nodes[j].geometry));
                    let centroid_dist = euclidean(centroid_i, group_centroid);
                    (poly_dist, centroid_dist, *altitude)
            })
                .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)).then_with(|| a.2.total_cmp(&b.2)));

            if let Some((_, _, altitude)) = best {
                nodes[i].anchor = Some(altitude);
            }
        }

        let anchored_on_level: Vec<usize> = on_level.iter().copied().filter(|&i| nodes[i].anchor.is_some()).collect();
        for &i in &on_level {
            if nodes[i].anchor.is_some() {
                continue;
            }
            let centroid_i = nodes[i].geometry.centroid().unwrap_or(Point::new(0.0, 0.0));
            let best = anchored_on_level
                .iter()
                .map(|&j| {
                    let centroid_j = nodes[j].geometry.centroid().unwrap_or(Point::new(0.0, 0.0));
                    let dist = euclidean(centroid_i, centroid_j);
                    (dist, nodes[j].anchor.unwrap())
            })
                .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)));
            if let Some((_, altitude)) = best {
                nodes[i].anchor = Some(altitude);
            }
        }
    }
}

/// Area-weighted average centroid of a set of pairwise-disjoint polygons —
/// equal to the centroid of their union, without needing to compute it.
fn weighted_centroid<'a>(geometries: impl Iterator<Item = &'a Polygon<f64>>) -> Point<f64> {
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut total_area = 0.0;
    for geometry in geometries {
        let area = geometry.unsigned_area();
        let Some(centroid) = geometry.centroid() else { continue };
        sum_x += centroid.x() * area;
        sum_y += centroid.y() * area;
        total_area += area;
    }
    if total_area > 0.0 {
        Point::new(sum_x / total_area, sum_y / total_area)
    } else {
        Point::new(0.0, 0.0)
    }
}

/// Minimum distance between two polygons' boundaries — exact for
/// disjoint-interior polygons, since the closest pair of points between two
/// such regions always lies on their boundaries.
fn polygon_distance(a: &Polygon<f64>, b: &Polygon<f64>) -> f64 {
    let mut best = f64::INFINITY;
    for ring_a in std::iter::once(a.exterior()).chain(a.interiors()) {
        for ring_b in std::iter::once(b.exterior()).chain(b.interiors()) {
            best = best.min(ring_distance(ring_a, ring_b));
        }
    }
    best
}

fn ring_distance(a: &LineString<f64>, b: &LineString<f64>) -> f64 {
    let mut best = f64::INFINITY;
    for seg_a in a.lines() {
        for seg_b in b.lines() {
            best = best.min(segment_distance(seg_a, seg_b));
            if best == 0.0 {
                return 0.0;
            }
        }
    }
    best
}

fn segment_distance(a: Line<f64>, b: Line<f64>) -> f64 {
    if segments_intersect(a, b) {
        return 0.0;
    }
    point_to_segment_distance(a.start, b)
        .min(point_to_segment_distance(a.end, b))
        .min(point_to_segment_distance(b.start, a))
        .min(point_to_segment_distance(b.end, a))
}

fn point_to_segment_distance(p: geo::Coord<f64>, seg: Line<f64>) -> f64 {
    let (dx, dy) = (seg.end.x - seg.start.x, seg.end.y - seg.start.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((p.x - seg.start.x) * dx + (p.y - seg.start.y) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let proj_x = seg.start.x + t * dx;
    let proj_y = seg.start.y + t * dy;
    ((p.x - proj_x).powi(2) + (p.y - proj_y).powi(2)).sqrt()
}

fn segments_intersect(a: Line<f64>, b: Line<f64>) -> bool {
    let o1 = orientation(a.start, a.end, b.start);
    let o2 = orientation(a.start, a.end, b.end);
    let o3 = orientation(b.start, b.end, a.start);
    let o4 = orientation(b.start, b.end, a.end);

    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == 0 && on_segment(a.start, b.start, a.end))
        || (o2 == 0 && on_segment(a.start, b.end, a.end))
        || (o3 == 0 && on_segment(b.start, a.start, b.end))
        || (o4 == 0 && on_segment(b.start, a.end, b.end))
}

fn orientation(p: geo::Coord<f64>, q: geo::Coord<f64>, r: geo::Coord<f64>) -> i32 {
    let cross = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if cross > 0.0 {
        1
    } else if cross < 0.0 {
        -1
    } else {
        0
    }
}

fn on_segment(p: geo::Coord<f64>, q: geo::Coord<f64>, r: geo::Coord<f64>) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

fn euclidean(a: Point<f64>, b: Point<f64>) -> f64 {
    let dx = a.x() - b.x();
    let dy = a.y() - b.y();
    (dx * dx + dy * dy).sqrt()
}

fn build_adjacency(nodes: &[AreaNode]) -> Vec<Vec<usize>> {
    let n = nodes.len();
    let mut adjacency = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            let im = nodes[i].geometry.relate(&nodes[j].geometry);
            if im.is_touches() && im.matches("****1****").unwrap_or(false) {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
    }
    adjacency
}

/// BFS shortest path from `start` to `goal` that passes only through
/// unanchored intermediate nodes (start/goal themselves are anchors).
fn shortest_path_through_unanchored(
    adjacency: &[Vec<usize>],
    nodes: &[AreaNode],
    start: usize,
    goal: usize,
) -> Option<Vec<usize>> {
    let n = adjacency.len();
    let mut visited = vec![false; n];
    let mut prev = vec![usize::MAX; n];
    let mut queue = VecDeque::new();
    visited[start] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            let mut path = vec![goal];
            let mut node = goal;
            while node != start {
                node = prev[node];
                path.push(node);
            }
            path.reverse();
            return Some(path);
        }
        for &next in &adjacency[current] {
            if visited[next] {
                continue;
            }
            if next != goal && nodes[next].anchor.is_some() {
                continue;
            }
            visited[next] = true;
            prev[next] = current;
            queue.push_back(next);
        }
    }
    None
}
