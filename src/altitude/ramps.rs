//! Phase F — ramp reconstruction. Ramps were cut away from the
//! accessible geometry in Phase B; here they're restored once the flat
//! areas around them have assigned altitudes.

use geo::{BooleanOps, Coord, MultiPolygon, Point, Relate};

use crate::model::AltitudeAreaPoint;

use super::interpolate::AreaNode;

pub enum RampOutcome {
    /// Ramp touches ≥2 distinct altitudes: emit it as its own ramp area.
    Ramp(MultiPolygon<f64>, Vec<AltitudeAreaPoint>),
    /// Ramp touches exactly one altitude: fold it into that flat node,
    /// identified by index into the level's node list.
    MergeIntoFlat(usize),
    /// Ramp touches no known altitude: falls back to `base_altitude`,
    /// folded into whichever flat node already carries it, or left
    /// standalone at that altitude if none does.
    Fallback(f64),
}

/// Reconstruct one ramp polygon against the level's already-interpolated
/// flat nodes and any markers that fall inside the ramp.
pub fn reconstruct_ramp(
    ramp: &MultiPolygon<f64>,
    flat_nodes: &[AreaNode],
    markers_in_level: &[(Point<f64>, f64)],
    base_altitude: f64,
) -> RampOutcome {
    let mut touching: Vec<(usize, f64)> = Vec::new();
    for (i, node) in flat_nodes.iter().enumerate() {
        let im = MultiPolygon(vec![node.geometry.clone()]).relate(ramp);
        if im.is_intersects() {
            if let Some(altitude) = node.anchor {
                touching.push((i, altitude));
            }
        }
    }

    let mut altitudes: Vec<f64> = touching.iter().map(|(_, a)| *a).collect();
    for (point, altitude) in markers_in_level {
        if ramp.0.iter().any(|poly| point_in_poly(poly, *point)) {
            altitudes.push(*altitude);
        }
    }
    altitudes.sort_by(|a, b| a.total_cmp(b));
    altitudes.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

    match altitudes.len() {
        0 => RampOutcome::Fallback(base_altitude),
        1 => {
            if let Some((i, _)) = touching.first() {
                RampOutcome::MergeIntoFlat(*i)
            } else {
                RampOutcome::Fallback(altitudes[0])
            }
        }
        _ => {
            let points = boundary_points(ramp, &touching, flat_nodes);
            RampOutcome::Ramp(ramp.clone(), points)
        }
    }
}

fn point_in_poly(poly: &geo::Polygon<f64>, point: Point<f64>) -> bool {
    use geo::Contains;
    poly.contains(&point)
}

/// One point per touching altitude, taken from the shared boundary between
/// the ramp and that flat area — the defining points a renderer
/// interpolates the ramp's surface between.
fn boundary_points(
    ramp: &MultiPolygon<f64>,
    touching: &[(usize, f64)],
    flat_nodes: &[AreaNode],
) -> Vec<AltitudeAreaPoint> {
    let mut points = Vec::new();
    for &(i, altitude) in touching {
        let node_mp = MultiPolygon(vec![flat_nodes[i].geometry.clone()]);
        let shared = ramp.intersection(&node_mp);
        let coord: Option<Coord<f64>> = shared
            .0
            .iter()
            .find_map(|poly| poly.exterior().0.first().copied())
            .or_else(|| flat_nodes[i].geometry.exterior().0.first().copied());
        if let Some(coordinates) = coord {
            points.push(AltitudeAreaPoint { coordinates, altitude });
        }
    }
    points
}
