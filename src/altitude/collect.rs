//! Phase A — per-level collection.

use geo::{BooleanOps, Contains, MultiPolygon};

use crate::model::{Building, Door, Level, Space};

use super::types::{CollectedLevel, RaisedObstacle};

/// Collect one level's accessible geometry, obstacles, ramps, stairs and
/// admitted markers from its raw entities.
pub fn collect_level(
    level: &Level,
    buildings: &[Building],
    spaces: &[Space],
    doors: &[Door],
    precision: f64,
) -> CollectedLevel {
    let buildings_geom = union_all(buildings.iter().map(|b| &b.geometry));

    let mut accessible = MultiPolygon(Vec::new());
    let mut onfloor_obstacles = MultiPolygon(Vec::new());
    let mut raised_obstacles = Vec::new();
    let mut ramps = Vec::new();
    let mut stairs = Vec::new();
    let mut markers = Vec::new();
    let mut space_areas = Vec::new();

    for space in spaces {
        let mut this_area = MultiPolygon(vec![]);
        this_area.0.extend(space.geometry.0.iter().cloned());

        if space.outside {
            this_area = this_area.difference(&buildings_geom);
        }

        let unrestricted_columns = union_all(
            space
                .columns
                .iter()
                .filter(|c| c.access_restriction.is_none())
                .map(|c| &c.geometry),
        );
        this_area = this_area.difference(&unrestricted_columns);

        let holes = union_all(space.holes.iter().map(|h| &h.geometry));
        this_area = this_area.difference(&holes);

        let space_clip = buffer_round(&this_area, precision);

        for marker in &space.altitudemarkers {
            if space_clip.0.iter().any(|poly| poly.contains(&marker.point)) {
                markers.push((marker.point, marker.altitude));
            } else {
                log::warn!(
                    target: "c3nav::altitude",
                    "altitude marker {:?} lies outside its space {:?}, skipping",
                    marker.id,
                    space.id
                );
            }
        }

        for obstacle in &space.obstacles {
            if obstacle.altitude == 0.0 {
                onfloor_obstacles = onfloor_obstacles.union(&obstacle.geometry);
            } else {
                raised_obstacles.push(RaisedObstacle {
                        geometry: obstacle.geometry.clone(),
                        altitude: obstacle.altitude,
                });
            }
        }

        for lo in &space.lineobstacles {
            let geometry = lo.buffered_geometry();
            if lo.altitude == 0.0 {
                onfloor_obstacles = onfloor_obstacles.union(&geometry);
            } else {
                raised_obstacles.push(RaisedObstacle {
                        geometry,
                        altitude: lo.altitude,
                });
            }
        }

        for ramp in &space.ramps {
            ramps.push(ramp.geometry.clone());
        }
        for stair in &space.stairs {
            stairs.push(stair.geometry.clone());
        }

        space_areas.push((space.id, space_clip.clone()));
        accessible = accessible.union(&space_clip);
    }

    for door in doors {
        accessible = accessible.union(&door.geometry);
    }

    CollectedLevel {
        level: level.id,
        base_altitude: level.base_altitude,
        accessible,
        onfloor_obstacles,
        raised_obstacles,
        ramps,
        stairs,
        markers,
        space_areas,
    }
}

fn union_all<'a>(geoms: impl Iterator<Item = &'a MultiPolygon<f64>>) -> MultiPolygon<f64> {
    geoms
        .cloned()
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| MultiPolygon(Vec::new()))
}

/// Buffer outward by `precision` with a round join, used to absorb
/// sub-precision gaps left by the subtractions above ( Phase A
/// step 2).
fn buffer_round(geom: &MultiPolygon<f64>, precision: f64) -> MultiPolygon<f64> {
    if geom.0.is_empty() || precision <= 0.0 {
        return geom.clone();
    }
    // Approximate a round buffer with a fine-stepped polygon offset per
    // ring point; good enough at the sub-precision scale this is used at.
    let mut out = geom.clone();
    for poly in &geom.0 {
        let rect = crate::geom::buffered_geometry(poly.exterior(), precision * 2.0);
        out = out.union(&rect);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LevelId, SpaceId};
    use geo::polygon;

    fn square(min: f64, max: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
                    (x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max),
        ]])
    }

    fn basic_level() -> Level {
        Level {
            id: LevelId(1),
            base_altitude: 0.0,
            default_height: 3.0,
            door_height: 2.0,
            on_top_of: None,
            short_label: "0".into(),
        }
    }

    #[test]
    fn a_single_space_becomes_the_accessible_area() {
        let level = basic_level();
        let space = Space {
            id: SpaceId(1),
            level: level.id,
            geometry: square(0.0, 100.0),
            outside: false,
            columns: vec![],
            holes: vec![],
            obstacles: vec![],
            lineobstacles: vec![],
            stairs: vec![],
            ramps: vec![],
            altitudemarkers: vec![],
            areas: vec![],
        };
        let collected = collect_level(&level, &[], &[space], &[], 0.01);
        assert!(!collected.accessible.0.is_empty());
    }

    #[test]
    fn marker_outside_the_space_is_dropped() {
        use geo::Point;
        use crate::model::{AltitudeMarker, AltitudeMarkerId};

        let level = basic_level();
        let space = Space {
            id: SpaceId(1),
            level: level.id,
            geometry: square(0.0, 10.0),
            outside: false,
            columns: vec![],
            holes: vec![],
            obstacles: vec![],
            lineobstacles: vec![],
            stairs: vec![],
            ramps: vec![],
            altitudemarkers: vec![AltitudeMarker {
                    id: AltitudeMarkerId(1),
                    point: Point::new(500.0, 500.0),
                    altitude: 1.0,
            }],
            areas: vec![],
        };
        let collected = collect_level(&level, &[], &[space], &[], 0.01);
        assert!(collected.markers.is_empty());
    }
}
