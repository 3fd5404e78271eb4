//! Step 5 of the level render composer : turn one level's
//! cropped 2D geometries into a triangulated floor mesh plus the
//! extrusions (walls, doors, restricted spaces, wall base) a client
//! renders as 3D polyhedra.

use geo::{Contains, MultiPolygon};

use crate::model::{AltitudeArea, Extrusion, MeshFace, MeshVertex, Obstacle};

use super::triangulate::triangulate;

/// Triangulates `area` and assigns each vertex an altitude by nearest
/// distance to the area's anchor points (flat areas anchor at their own
/// centroid; ramps anchor at their boundary [`AltitudeAreaPoint`]s) and a
/// clear height reduced by whichever on-floor obstacle covers it.
pub fn mesh_altitude_area(
    area: &AltitudeArea,
    obstacles: &[Obstacle],
    default_height: f64,
) -> (Vec<MeshVertex>, Vec<MeshFace>) {
    let anchors = altitude_anchors(area);
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for polygon in &area.geometry.0 {
        let (coords, tris) = triangulate(polygon);
        let base = vertices.len() as u32;
        for coord in coords {
            let altitude = nearest_altitude(&anchors, coord.x, coord.y);
            let height = vertex_height(coord.x, coord.y, default_height, obstacles);
            vertices.push(MeshVertex { x: coord.x, y: coord.y, altitude, height });
        }
        for tri in tris {
            faces.push([tri[0] + base, tri[1] + base, tri[2] + base]);
        }
    }
    (vertices, faces)
}

fn altitude_anchors(area: &AltitudeArea) -> Vec<(f64, f64, f64)> {
    use geo::Centroid;
    match &area.surface {
        crate::model::AltitudeSurface::Flat(altitude) => area
            .geometry
            .0
            .iter()
            .filter_map(|p| p.centroid())
            .map(|c| (c.x(), c.y(), *altitude))
            .collect(),
        crate::model::AltitudeSurface::Interpolated(points) => {
            points.iter().map(|p| (p.coordinates.x, p.coordinates.y, p.altitude)).collect()
        }
    }
}

fn nearest_altitude(anchors: &[(f64, f64, f64)], x: f64, y: f64) -> f64 {
    anchors
        .iter()
        .map(|&(ax, ay, alt)| (((ax - x).powi(2) + (ay - y).powi(2)), alt))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, alt)| alt)
        .unwrap_or(0.0)
}

/// Per-vertex height above the floor (step 5): `default_height`
/// minus the height of whichever obstacle contains the point, else
/// `default_height` unchanged. A simplification over layered obstacle
/// stacking: only the first containing obstacle found is applied.
pub fn vertex_height(x: f64, y: f64, default_height: f64, obstacles: &[Obstacle]) -> f64 {
    let point = geo::Point::new(x, y);
    for obstacle in obstacles {
        if obstacle.altitude == 0.0 && obstacle.geometry.contains(&point) {
            return (default_height - obstacle.height).max(0.0);
        }
    }
    default_height
}

/// Builds one [`Extrusion`] per exterior+hole ring of `area`, descending
/// from `upper` to `lower`.
pub fn extrude(area: &MultiPolygon<f64>, lower: f64, upper: f64) -> Vec<Extrusion> {
    let mut result = Vec::new();
    for polygon in &area.0 {
        result.push(Extrusion { ring: ring_coords(polygon.exterior()), lower, upper });
        for interior in polygon.interiors() {
            result.push(Extrusion { ring: ring_coords(interior), lower, upper });
        }
    }
    result
}

fn ring_coords(ring: &geo::LineString<f64>) -> Vec<(f64, f64)> {
    ring.0.iter().map(|c| (c.x, c.y)).collect()
}

/// Walls: `buildings.difference(accessible_area).difference(doors)`
/// (testable property #8), extruded from `floor - 0.7` to `ceiling`.
pub fn wall_extrusions(walls: &MultiPolygon<f64>, floor: f64, ceiling: f64) -> Vec<Extrusion> {
    extrude(walls, floor - 0.7, ceiling)
}

/// Doors are extruded only through the door-height band, leaving a gap
/// above so the client can still render a lintel.
pub fn door_extrusions(doors: &MultiPolygon<f64>, floor: f64, door_height: f64, ceiling: f64) -> Vec<Extrusion> {
    extrude(doors, floor + door_height, ceiling - 1.0)
}

pub fn restricted_indoor_extrusions(restricted: &MultiPolygon<f64>, floor: f64, ceiling: f64) -> Vec<Extrusion> {
    extrude(restricted, floor, ceiling)
}

/// The building's base skirt, always descending to `min_altitude - 0.7` so
/// it doesn't float above whatever sits below it.
pub fn wall_base(buildings: &MultiPolygon<f64>, min_altitude: f64, floor: f64) -> Vec<Extrusion> {
    extrude(buildings, min_altitude - 0.7, floor)
}
