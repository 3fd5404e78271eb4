//! Ear-clipping triangulation of a (possibly holed) polygon, for step 5 of
//! the level render composer. No triangulation crate is in the dependency
//! stack anywhere in the pack, so this is a small from-scratch
//! implementation: bridge each hole into the exterior ring, then ear-clip
//! the resulting simple polygon.

use geo::{Coord, Polygon};

/// Triangulates `polygon`, returning `(vertices, triangles)` where each
/// triangle is three indices into `vertices`.
pub fn triangulate(polygon: &Polygon<f64>) -> (Vec<Coord<f64>>, Vec<[u32; 3]>) {
    let exterior = open_ring(polygon.exterior());
    let holes: Vec<Vec<Coord<f64>>> = polygon.interiors().iter().map(open_ring).collect();

    if exterior.len() < 3 {
        return (Vec::new(), Vec::new());
    }

    let bridged = bridge_holes(exterior, &holes);
    let triangles = ear_clip(&bridged);
    let faces = triangles.into_iter().map(|[a, b, c]| [a as u32, b as u32, c as u32]).collect();
    (bridged, faces)
}

fn open_ring(ring: &geo::LineString<f64>) -> Vec<Coord<f64>> {
    let mut points: Vec<Coord<f64>> = ring.0.clone();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn dist2(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Connects each hole to the exterior ring via the closest vertex pair, so
/// the ear-clipper can treat the whole thing as one simple polygon.
fn bridge_holes(exterior: Vec<Coord<f64>>, holes: &[Vec<Coord<f64>>]) -> Vec<Coord<f64>> {
    let mut ring = exterior;
    for hole in holes {
        if hole.len() < 3 {
            continue;
        }
        let mut best = (0usize, 0usize, f64::INFINITY);
        for (i, ext_pt) in ring.iter().enumerate() {
            for (j, hole_pt) in hole.iter().enumerate() {
                let d = dist2(*ext_pt, *hole_pt);
                if d < best.2 {
                    best = (i, j, d);
                }
            }
        }
        let (ext_i, hole_j, _) = best;

        let mut hole_rot: Vec<Coord<f64>> = hole[hole_j..].to_vec();
        hole_rot.extend_from_slice(&hole[..hole_j]);

        let mut new_ring = Vec::with_capacity(ring.len() + hole_rot.len() + 2);
        new_ring.extend_from_slice(&ring[..=ext_i]);
        new_ring.extend_from_slice(&hole_rot);
        new_ring.push(hole_rot[0]);
        new_ring.push(ring[ext_i]);
        new_ring.extend_from_slice(&ring[ext_i + 1..]);
        ring = new_ring;
    }
    ring
}

fn signed_area(ring: &[Coord<f64>]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

fn cross(o: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn point_in_triangle(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Standard O(n²) ear clipping; assumes `ring` has no duplicate points and
/// is a simple (non-self-intersecting) polygon once bridged.
fn ear_clip(ring: &[Coord<f64>]) -> Vec<[usize; 3]> {
    let mut indices: Vec<usize> = (0..ring.len()).collect();
    if indices.len() < 3 {
        return Vec::new();
    }
    if signed_area(ring) < 0.0 {
        indices.reverse();
    }

    let mut triangles = Vec::new();
    let max_iterations = ring.len() * ring.len() + 16;
    let mut iterations = 0;

    while indices.len() > 3 && iterations < max_iterations {
        iterations += 1;
        let n = indices.len();
        let mut clipped = false;

        for i in 0..n {
            let prev = indices[(i + n - 1) % n];
            let curr = indices[i];
            let next = indices[(i + 1) % n];
            let (pa, pb, pc) = (ring[prev], ring[curr], ring[next]);

            if cross(pa, pb, pc) <= 0.0 {
                continue; // reflex vertex, can't be an ear
            }

            let is_ear = indices
                .iter()
                .copied()
                .filter(|&idx| idx != prev && idx != curr && idx != next)
                .all(|idx| !point_in_triangle(ring[idx], pa, pb, pc));

            if is_ear {
                triangles.push([prev, curr, next]);
                indices.remove(i);
                clipped = true;
                break;
            }
        }

        if !clipped {
            break; // degenerate geometry; stop instead of looping forever
        }
    }

    if indices.len() == 3 {
        triangles.push([indices[0], indices[1], indices[2]]);
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn square_triangulates_into_two_triangles() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)];
        let (vertices, faces) = triangulate(&square);
        assert_eq!(vertices.len(), 4);
        assert_eq!(faces.len(), 2);
    }

    #[test]
    fn l_shape_triangulates_without_crossing_the_notch() {
        let l_shape = polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 5.0),
            (x: 5.0, y: 5.0), (x: 5.0, y: 10.0), (x: 0.0, y: 10.0),
        ];
        let (_, faces) = triangulate(&l_shape);
        assert_eq!(faces.len(), 4);
    }

    #[test]
    fn polygon_with_hole_bridges_and_triangulates() {
        let exterior = geo::LineString::from(vec![(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)]);
        let hole = geo::LineString::from(vec![(5.0, 5.0), (5.0, 15.0), (15.0, 15.0), (15.0, 5.0)]);
        let donut = Polygon::new(exterior, vec![hole]);
        let (vertices, faces) = triangulate(&donut);
        assert_eq!(vertices.len(), 10); // 4 exterior + 4 hole + 2 duplicated bridge points
        assert!(!faces.is_empty());
    }
}
