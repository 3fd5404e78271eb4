use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};

/// Split `polygons` along `lines`, returning every resulting region.
///
/// A closed line (a ring, as produced by a ramp's or obstacle's own
/// exterior/interior) bounds a real area: it is cut out with an exact
/// `intersection`/`difference` split, no kerf involved. An open line (a
/// stair) has no area of its own: it is cut by node-and-walk — the two
/// points where it crosses a piece's exterior ring are spliced into that
/// ring, and the ring is split into the two arcs between them, each closed
/// off by the portion of the line running between the same two points.
pub fn cut_polygons_with_lines(
    polygons: &MultiPolygon<f64>,
    lines: &[LineString<f64>],
    precision: f64,
) -> Vec<Polygon<f64>> {
    if polygons.0.is_empty() || lines.is_empty() {
        return polygons.0.clone();
    }

    let mut pieces = polygons.0.clone();

    for line in lines.iter().filter(|l| is_closed_ring(l)) {
        pieces = cut_by_ring(&pieces, line);
    }

    for line in lines.iter().filter(|l| !is_closed_ring(l)) {
        pieces = cut_by_chord(&pieces, line);
    }

    pieces.into_iter().filter(|poly| !is_sliver(poly, precision)).collect()
}

fn is_closed_ring(line: &LineString<f64>) -> bool {
    line.0.len() >= 4 && line.0.first() == line.0.last()
}

fn cut_by_ring(pieces: &[Polygon<f64>], ring: &LineString<f64>) -> Vec<Polygon<f64>> {
    use geo::BooleanOps;

    let ring_poly = Polygon::new(ring.clone(), vec![]);
    let ring_mp = MultiPolygon(vec![ring_poly]);

    let mut out = Vec::new();
    for piece in pieces {
        let piece_mp = MultiPolygon(vec![piece.clone()]);
        out.extend(piece_mp.intersection(&ring_mp).0);
        out.extend(piece_mp.difference(&ring_mp).0);
    }
    out
}

fn cut_by_chord(pieces: &[Polygon<f64>], line: &LineString<f64>) -> Vec<Polygon<f64>> {
    let mut worklist = pieces.to_vec();
    let mut out = Vec::new();
    while let Some(piece) = worklist.pop() {
        match split_by_chord(&piece, line) {
            Some((a, b)) => {
                worklist.push(a);
                worklist.push(b);
            }
            None => out.push(piece),
        }
    }
    out
}

/// One point where `line` crosses a piece's exterior ring.
struct Crossing {
    /// Position along the whole cutting line, used to order crossings and
    /// pick a (entry, exit) pair.
    line_s: f64,
    /// Index `i` of the line segment `coords[i] -> coords[i + 1]` the
    /// crossing falls on.
    line_segment: usize,
    /// Index `i` of the ring edge `coords[i] -> coords[i + 1]` the crossing
    /// falls on.
    ring_edge: usize,
    /// Position along that ring edge, in `[0, 1]`.
    ring_t: f64,
    point: Coord<f64>,
}

fn split_by_chord(piece: &Polygon<f64>, line: &LineString<f64>) -> Option<(Polygon<f64>, Polygon<f64>)> {
    let ring = piece.exterior();
    let crossings = dedup_crossings(find_crossings(ring, line));
    if crossings.len() < 2 {
        return None;
    }
    let (c0, c1) = (&crossings[0], &crossings[1]);

    let ring_coords = ring.0.as_slice();
    let n = ring_coords.len() - 1;
    let arc_forward = walk_ring(ring_coords, n, c0, c1);
    let arc_backward = walk_ring(ring_coords, n, c1, c0);
    let chord_forward = chord_between(line, c0, c1);

    // `arc_forward` runs c0 -> c1 along the ring; appending the chord
    // reversed (c1 -> c0, first point dropped since it duplicates
    // `arc_forward`'s last) closes it back into a ring ending where it
    // started. `ring2` mirrors this the other way around.
    let mut ring1 = arc_forward;
    ring1.extend(chord_forward.iter().rev().skip(1));

    let mut ring2 = arc_backward;
    ring2.extend(chord_forward.iter().skip(1));

    let (a, b) = distribute_holes(piece, Polygon::new(LineString(ring1), vec![]), Polygon::new(LineString(ring2), vec![]));
    Some((a, b))
}

/// A hole is attached to whichever of the two new pieces still contains it.
/// A line that also crosses a hole's own boundary is not split there — the
/// hole just travels with one side whole.
fn distribute_holes(piece: &Polygon<f64>, a: Polygon<f64>, b: Polygon<f64>) -> (Polygon<f64>, Polygon<f64>) {
    let mut a_holes = Vec::new();
    let mut b_holes = Vec::new();
    for hole in piece.interiors() {
        let probe = Point::from(hole.0[0]);
        if a.contains(&probe) {
            a_holes.push(hole.clone());
        } else {
            b_holes.push(hole.clone());
        }
    }
    (Polygon::new(a.exterior().clone(), a_holes), Polygon::new(b.exterior().clone(), b_holes))
}

fn find_crossings(ring: &LineString<f64>, line: &LineString<f64>) -> Vec<Crossing> {
    let ring_coords = ring.0.as_slice();
    let line_coords = line.0.as_slice();
    let mut out = Vec::new();
    let mut cum = 0.0;
    for (li, w) in line_coords.windows(2).enumerate() {
        let (l0, l1) = (w[0], w[1]);
        let seg_len = ((l1.x - l0.x).powi(2) + (l1.y - l0.y).powi(2)).sqrt();
        for i in 0..ring_coords.len() - 1 {
            let (r0, r1) = (ring_coords[i], ring_coords[i + 1]);
            if let Some((t, u, point)) = segment_intersection(l0, l1, r0, r1) {
                out.push(Crossing { line_s: cum + t * seg_len, line_segment: li, ring_edge: i, ring_t: u, point });
            }
        }
        cum += seg_len;
    }
    out.sort_by(|a, b| a.line_s.total_cmp(&b.line_s));
    out
}

fn dedup_crossings(crossings: Vec<Crossing>) -> Vec<Crossing> {
    let mut out: Vec<Crossing> = Vec::new();
    for c in crossings {
        let dup = out.last().is_some_and(|last| {
            let dx = last.point.x - c.point.x;
            let dy = last.point.y - c.point.y;
            (dx * dx + dy * dy).sqrt() < 1e-9
        });
        if !dup {
            out.push(c);
        }
    }
    out
}

/// Walk the ring forward (increasing index) from `from`'s crossing point to
/// `to`'s, inserting the ring vertices strictly between them.
fn walk_ring(ring: &[Coord<f64>], n: usize, from: &Crossing, to: &Crossing) -> Vec<Coord<f64>> {
    let mut out = vec![from.point];
    if from.ring_edge == to.ring_edge && to.ring_t >= from.ring_t {
        out.push(to.point);
        return out;
    }
    let mut edge = from.ring_edge;
    loop {
        out.push(ring[(edge + 1) % n]);
        edge = (edge + 1) % n;
        if edge == to.ring_edge {
            break;
        }
    }
    out.push(to.point);
    out
}

/// The portion of `line` from `c0` to `c1`, in line order (`c0.line_s <
/// c1.line_s` is assumed).
fn chord_between(line: &LineString<f64>, c0: &Crossing, c1: &Crossing) -> Vec<Coord<f64>> {
    let coords = line.0.as_slice();
    let mut out = vec![c0.point];
    for i in (c0.line_segment + 1)..=c1.line_segment {
        out.push(coords[i]);
    }
    out.push(c1.point);
    out
}

/// Parametric intersection of segment `p` (`p0 -> p1`) with segment `q`
/// (`q0 -> q1`). Returns `(t, u, point)`, the fraction along each segment,
/// if they cross at a single point within both.
fn segment_intersection(
    p0: Coord<f64>,
    p1: Coord<f64>,
    q0: Coord<f64>,
    q1: Coord<f64>,
) -> Option<(f64, f64, Coord<f64>)> {
    let r = (p1.x - p0.x, p1.y - p0.y);
    let s = (q1.x - q0.x, q1.y - q0.y);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < 1e-12 {
        return None;
    }
    let qp = (q0.x - p0.x, q0.y - p0.y);
    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, u, Coord { x: p0.x + t * r.0, y: p0.y + t * r.1 }))
    } else {
        None
    }
}

/// Drop pieces too small to be real regions rather than jitter at a ring
/// splice's own precision.
fn is_sliver(poly: &Polygon<f64>, precision: f64) -> bool {
    use geo::Area;
    poly.unsigned_area() < precision * precision
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    fn square(min: f64, max: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
                    (x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max),
        ]])
    }

    #[test]
    fn no_lines_returns_input_unchanged() {
        let square = square(0.0, 10.0);
        let pieces = cut_polygons_with_lines(&square, &[], 0.001);
        assert_eq!(pieces, square.0);
    }

    #[test]
    fn a_line_crossing_the_interior_splits_the_square_in_two() {
        let square = square(0.0, 100.0);
        let cut = LineString(vec![Coord { x: 50.0, y: -1.0 }, Coord { x: 50.0, y: 101.0 }]);
        let pieces = cut_polygons_with_lines(&square, &[cut], 0.01);
        assert_eq!(pieces.len(), 2);

        let total: f64 = pieces.iter().map(|p| p.unsigned_area()).sum();
        assert!((total - 10_000.0).abs() < 1e-6, "cutting on exact line geometry must not lose or gain area");
    }

    #[test]
    fn a_line_only_touching_the_boundary_leaves_the_square_whole() {
        let square = square(0.0, 100.0);
        // runs along the exterior, never crossing the interior
        let cut = LineString(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 100.0, y: 0.0 }]);
        let pieces = cut_polygons_with_lines(&square, &[cut], 0.01);
        assert_eq!(pieces.len(), 1);
    }

    #[test]
    fn a_line_wholly_outside_the_polygon_is_a_no_op() {
        let square = square(0.0, 10.0);
        let cut = LineString(vec![Coord { x: 200.0, y: 200.0 }, Coord { x: 300.0, y: 300.0 }]);
        let pieces = cut_polygons_with_lines(&square, &[cut], 0.01);
        assert_eq!(pieces.len(), 1);
    }

    #[test]
    fn a_diagonal_line_splits_the_square_with_no_area_loss() {
        let square = square(0.0, 50.0);
        let cut = LineString(vec![Coord { x: -5.0, y: -5.0 }, Coord { x: 55.0, y: 55.0 }]);
        let pieces = cut_polygons_with_lines(&square, &[cut], 0.01);
        assert_eq!(pieces.len(), 2);
        let total: f64 = pieces.iter().map(|p| p.unsigned_area()).sum();
        assert!((total - 2_500.0).abs() < 1e-6);
    }

    #[test]
    fn a_closed_ring_cuts_out_its_enclosed_area_exactly() {
        let outer = square(0.0, 100.0);
        let ring = polygon![(x: 20.0, y: 20.0), (x: 40.0, y: 20.0), (x: 40.0, y: 40.0), (x: 20.0, y: 40.0)]
            .exterior()
            .clone();
        let pieces = cut_polygons_with_lines(&outer, &[ring], 0.01);
        let total: f64 = pieces.iter().map(|p| p.unsigned_area()).sum();
        assert!((total - 10_000.0).abs() < 1e-6);
    }
}
