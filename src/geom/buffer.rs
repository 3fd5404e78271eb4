use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};

/// Widen a linestring into a polygon, flat-capped, by unioning a rectangle
/// per segment. Adjacent segment rectangles overlap at shared vertices,
/// which gives a mitre-like join on convex turns; sharp concave turns can
/// leave a small notch rather than a true mitre point.
pub fn buffered_geometry(line: &LineString<f64>, width: f64) -> MultiPolygon<f64> {
    let half = width / 2.0;
    if half <= 0.0 {
        return MultiPolygon(Vec::new());
    }

    let rects: Vec<MultiPolygon<f64>> = line
        .0
        .windows(2)
        .filter_map(|seg| segment_rect(seg[0], seg[1], half))
        .map(|poly| MultiPolygon(vec![poly]))
        .collect();

    rects
        .into_iter()
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| MultiPolygon(Vec::new()))
}

fn segment_rect(start: Coord<f64>, end: Coord<f64>, half_width: f64) -> Option<Polygon<f64>> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return None;
    }
    // unit normal, rotated 90 degrees from the segment direction
    let nx = -dy / len * half_width;
    let ny = dx / len * half_width;

    let ring = LineString(vec![
            Coord { x: start.x + nx, y: start.y + ny },
            Coord { x: end.x + nx, y: end.y + ny },
            Coord { x: end.x - nx, y: end.y - ny },
            Coord { x: start.x - nx, y: start.y - ny },
            Coord { x: start.x + nx, y: start.y + ny },
    ]);
    Some(Polygon::new(ring, Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn buffering_a_straight_segment_yields_expected_area() {
        let line = LineString(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 0.0 }]);
        let buffered = buffered_geometry(&line, 2.0);
        assert_eq!(buffered.0.len(), 1);
        let area = buffered.unsigned_area();
        assert!((area - 20.0).abs() < 1e-9);
    }

    #[test]
    fn zero_width_yields_empty_result() {
        let line = LineString(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 0.0 }]);
        assert!(buffered_geometry(&line, 0.0).0.is_empty());
    }

    #[test]
    fn degenerate_point_line_yields_empty_result() {
        let line = LineString(vec![Coord { x: 0.0, y: 0.0 }]);
        assert!(buffered_geometry(&line, 2.0).0.is_empty());
    }
}
