use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Snap every coordinate to a `precision`-sized grid, drop the resulting
/// repeated points, and put rings into a canonical rotation/order so two
/// geometries that are the same shape compare equal regardless of how
/// they were constructed, so a freshly computed area and a persisted one
/// compare equal without float-representation noise.
pub fn snap_to_grid_and_fully_normalized(geom: &MultiPolygon<f64>, precision: f64) -> MultiPolygon<f64> {
    let mut polygons: Vec<Polygon<f64>> = geom
        .0
        .iter()
        .map(|poly| snap_polygon(poly, precision))
        .filter(|poly| !poly.exterior().0.is_empty())
        .collect();

    polygons.sort_by(|a, b| cmp_ring(a.exterior(), b.exterior()));
    MultiPolygon(polygons)
}

fn snap_polygon(poly: &Polygon<f64>, precision: f64) -> Polygon<f64> {
    let exterior = snap_ring(poly.exterior(), precision);
    let interiors: Vec<LineString<f64>> = poly
        .interiors()
        .iter()
        .map(|ring| snap_ring(ring, precision))
        .filter(|ring| !ring.0.is_empty())
        .collect();
    let mut interiors = interiors;
    interiors.sort_by(|a, b| cmp_ring(a, b));
    Polygon::new(exterior, interiors)
}

fn snap_ring(ring: &LineString<f64>, precision: f64) -> LineString<f64> {
    if precision <= 0.0 {
        return dedup_closed(&ring.0);
    }
    let snapped: Vec<Coord<f64>> = ring
        .0
        .iter()
        .map(|c| Coord {
            x: (c.x / precision).round() * precision,
            y: (c.y / precision).round() * precision,
    })
        .collect();
    let deduped = dedup_closed(&snapped);
    canonicalize_rotation(deduped)
}

fn dedup_closed(coords: &[Coord<f64>]) -> LineString<f64> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for &c in coords {
        if out.last().map(|p| *p == c).unwrap_or(false) {
            continue;
        }
        out.push(c);
    }
    if out.len() < 4 {
        return LineString(Vec::new());
    }
    LineString(out)
}

/// Rotate a closed ring so it starts at its lexicographically smallest
/// coordinate, so the same ring traced from any starting point normalizes
/// identically.
fn canonicalize_rotation(ring: LineString<f64>) -> LineString<f64> {
    let coords = &ring.0;
    if coords.len() < 4 {
        return ring;
    }
    // last point duplicates the first (closed ring); rotate the open prefix.
    let open = &coords[..coords.len() - 1];
    let min_idx = open
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| cmp_coord(a, b))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut rotated: Vec<Coord<f64>> = open[min_idx..].iter().chain(open[..min_idx].iter()).copied().collect();
    rotated.push(rotated[0]);
    LineString(rotated)
}

fn cmp_coord(a: &Coord<f64>, b: &Coord<f64>) -> std::cmp::Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}

fn cmp_ring(a: &LineString<f64>, b: &LineString<f64>) -> std::cmp::Ordering {
    a.0.len()
        .cmp(&b.0.len())
        .then_with(|| {
            a.0.iter()
                .zip(b.0.iter())
                .map(|(ca, cb)| cmp_coord(ca, cb))
                .find(|o| *o != std::cmp::Ordering::Equal)
                .unwrap_or(std::cmp::Ordering::Equal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn snapping_removes_float_jitter() {
        let a: MultiPolygon<f64> = MultiPolygon(vec![polygon![
                    (x: 0.0, y: 0.0), (x: 10.00000001, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0),
        ]]);
        let b: MultiPolygon<f64> = MultiPolygon(vec![polygon![
                    (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0),
        ]]);
        assert_eq!(
            snap_to_grid_and_fully_normalized(&a, 1e-4),
            snap_to_grid_and_fully_normalized(&b, 1e-4)
        );
    }

    #[test]
    fn rotation_does_not_affect_normalized_form() {
        let a: MultiPolygon<f64> = MultiPolygon(vec![polygon![
                    (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0),
        ]]);
        let b: MultiPolygon<f64> = MultiPolygon(vec![polygon![
                    (x: 10.0, y: 10.0), (x: 0.0, y: 10.0), (x: 0.0, y: 0.0), (x: 10.0, y: 0.0),
        ]]);
        assert_eq!(
            snap_to_grid_and_fully_normalized(&a, 1e-4),
            snap_to_grid_and_fully_normalized(&b, 1e-4)
        );
    }
}
