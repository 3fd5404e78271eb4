//! Altitude pipeline (C3): turns raw level/space/obstacle
//! entities into the canonical set of [`AltitudeArea`] rows, phases A-H.

mod classify;
mod collect;
mod diff;
mod interpolate;
mod ramps;
mod obstacles;
mod types;

pub use diff::{diff_areas, AreaDiff};
pub use types::CollectedLevel;

use std::time::Instant;

use geo::{BooleanOps, Contains, MultiPolygon, Point};

use crate::geom::{calculate_precision, snap_to_grid_and_fully_normalized};
use crate::model::{
    AltitudeArea, AltitudeAreaId, AltitudeSurface, Building, Door, Level, LevelId, Space,
};

use interpolate::AreaNode;

pub struct LevelInput<'a> {
    pub level: &'a Level,
    pub buildings: &'a [Building],
    pub spaces: &'a [Space],
    pub doors: &'a [Door],
}

/// Run the full pipeline over a batch of levels and diff the result
/// against `existing`. Returns the new canonical area set plus the diff
/// that should actually be persisted (Phase H).
pub fn build_altitude_areas(
    levels: &[LevelInput],
    existing: &[AltitudeArea],
    mut next_id: impl FnMut() -> AltitudeAreaId,
) -> (Vec<AltitudeArea>, AreaDiff) {
    let started = Instant::now();

    let precision = {
        let all_geoms: Vec<&MultiPolygon<f64>> = levels
            .iter()
            .flat_map(|l| l.buildings.iter().map(|b| &b.geometry))
            .chain(levels.iter().flat_map(|l| l.spaces.iter().map(|s| &s.geometry)))
            .collect();
        calculate_precision(all_geoms.into_iter())
    };

    let collected: Vec<CollectedLevel> = levels
        .iter()
        .map(|input| collect::collect_level(input.level, input.buildings, input.spaces, input.doors, precision))
        .collect();

    // Phase B/C per level.
    let mut nodes: Vec<AreaNode> = Vec::new();
    let mut obstacle_pieces_by_level: Vec<(LevelId, Vec<geo::Polygon<f64>>)> = Vec::new();
    let mut node_range_by_level: Vec<(LevelId, std::ops::Range<usize>)> = Vec::new();

    for level_data in &collected {
        let (accessible, obstacles) = classify::classify_level(level_data, precision);
        let start = nodes.len();
        for (piece, space) in accessible {
            nodes.push(AreaNode { level: level_data.level, geometry: piece, anchor: None, space });
        }
        node_range_by_level.push((level_data.level, start..nodes.len()));
        obstacle_pieces_by_level.push((level_data.level, obstacles));
    }

    // Phase D — anchor assignment: a marker admitted in Phase A anchors the
    // one accessible piece it now falls inside; warn if zero or multiple.
    for level_data in &collected {
        let range = node_range_by_level
            .iter()
            .find(|(level, _)| *level == level_data.level)
            .map(|(_, r)| r.clone())
            .unwrap_or(0..0);

        for &(point, altitude) in &level_data.markers {
            let containing: Vec<usize> = range
                .clone()
                .filter(|&i| nodes[i].geometry.contains(&point))
                .collect();
            match containing.as_slice() {
                [only] => nodes[*only].anchor = Some(altitude),
                [] => log::warn!(target: "c3nav::altitude", "marker at {:?} on level {:?} landed in no accessible piece after cutting", point, level_data.level),
                _ => log::warn!(target: "c3nav::altitude", "marker at {:?} on level {:?} landed in multiple accessible pieces after cutting", point, level_data.level),
            }
        }
    }

    let base_altitudes: ahash::AHashMap<LevelId, f64> =
    collected.iter().map(|l| (l.level, l.base_altitude)).collect();
    interpolate::interpolate(&mut nodes, |level| *base_altitudes.get(&level).unwrap_or(&0.0));

    // Phase F — ramp reconstruction, per level.
    let mut ramp_areas: Vec<(LevelId, MultiPolygon<f64>, Vec<crate::model::AltitudeAreaPoint>)> = Vec::new();
    for level_data in &collected {
        let range = node_range_by_level
            .iter()
            .find(|(level, _)| *level == level_data.level)
            .map(|(_, r)| r.clone())
            .unwrap_or(0..0);

        for ramp in &level_data.ramps {
            let slice = &nodes[range.clone()];
            match ramps::reconstruct_ramp(ramp, slice, &level_data.markers, level_data.base_altitude) {
                ramps::RampOutcome::Ramp(geometry, points) => {
                    ramp_areas.push((level_data.level, geometry, points));
                }
                ramps::RampOutcome::MergeIntoFlat(idx) => {
                    let node = &mut nodes[range.start + idx];
                    node.geometry = union_poly(&node.geometry, ramp);
                }
                ramps::RampOutcome::Fallback(altitude) => {
                    log::warn!(target: "c3nav::altitude", "ramp on level {:?} touches no known altitude, falling back to {}", level_data.level, altitude);
                    let existing_flat = range.clone().find(|&i| matches_altitude(nodes[i].anchor, altitude));
                    match existing_flat {
                        Some(i) => nodes[i].geometry = union_poly(&nodes[i].geometry, ramp),
                        None => {
                            for poly in &ramp.0 {
                                nodes.push(AreaNode { level: level_data.level, geometry: poly.clone(), anchor: Some(altitude), space: None });
                            }
                        }
                    }
                }
            }
        }
    }

    // Phase G — obstacle reassignment, per level.
    for (level, obstacles) in &obstacle_pieces_by_level {
        let range = node_range_by_level
            .iter()
            .find(|(l, _)| l == level)
            .map(|(_, r)| r.clone())
            .unwrap_or(0..0);
        let slice = &nodes[range.clone()];
        let assignments = obstacles::reassign_obstacles(obstacles, slice);
        for (obstacle, assignment) in obstacles.iter().zip(assignments) {
            if let Some(local_idx) = assignment {
                let node = &mut nodes[range.start + local_idx];
                node.geometry = union_poly_single(&node.geometry, obstacle);
            }
        }
    }

    // Final assembly: group same-level, same-altitude flat nodes into one
    // AltitudeArea; ramp areas become their own rows.
    let mut new_areas: Vec<AltitudeArea> = Vec::new();
    for &(level, ref range) in &node_range_by_level {
        let mut by_altitude: Vec<(f64, MultiPolygon<f64>)> = Vec::new();
        for i in range.clone() {
            let altitude = nodes[i].anchor.unwrap_or_else(|| *base_altitudes.get(&level).unwrap_or(&0.0));
            match by_altitude.iter_mut().find(|(a, _)| matches_altitude(Some(*a), altitude)) {
                Some((_, geom)) => *geom = geom.union(&MultiPolygon(vec![nodes[i].geometry.clone()])),
                None => by_altitude.push((altitude, MultiPolygon(vec![nodes[i].geometry.clone()]))),
            }
        }
        for (altitude, geometry) in by_altitude {
            let snapped = snap_to_grid_and_fully_normalized(&geometry, precision);
            if snapped.0.is_empty() {
                continue;
            }
            new_areas.push(AltitudeArea {
                    id: AltitudeAreaId(0),
                    level,
                    geometry: snapped,
                    surface: AltitudeSurface::Flat(altitude),
            });
        }
    }
    for (level, geometry, points) in ramp_areas {
        let snapped = snap_to_grid_and_fully_normalized(&geometry, precision);
        if snapped.0.is_empty() {
            continue;
        }
        new_areas.push(AltitudeArea {
                id: AltitudeAreaId(0),
                level,
                geometry: snapped,
                surface: AltitudeSurface::Interpolated(points),
        });
    }

    let diff = diff::diff_areas(existing, new_areas, &mut next_id);

    log::info!(
        target: "c3nav::altitude",
        "{} (took {:.2}s)",
        diff.summary(),
        started.elapsed().as_secs_f64()
    );

    let mut final_set: Vec<AltitudeArea> = existing
        .iter()
        .filter(|a| !diff.deleted.contains(&a.id))
        .cloned()
        .collect();
    final_set.retain(|a| !diff.updated.iter().any(|u| u.id == a.id));
    final_set.extend(diff.updated.iter().cloned());
    final_set.extend(diff.created.iter().cloned());

    (final_set, diff)
}

fn matches_altitude(anchor: Option<f64>, altitude: f64) -> bool {
    anchor.map(|a| (a - altitude).abs() < 1e-9).unwrap_or(false)
}

fn union_poly(a: &geo::Polygon<f64>, b: &MultiPolygon<f64>) -> geo::Polygon<f64> {
    let merged = MultiPolygon(vec![a.clone()]).union(b);
    merged.0.into_iter().next().unwrap_or_else(|| a.clone())
}

fn union_poly_single(a: &geo::Polygon<f64>, b: &geo::Polygon<f64>) -> geo::Polygon<f64> {
    let merged = MultiPolygon(vec![a.clone()]).union(&MultiPolygon(vec![b.clone()]));
    merged.0.into_iter().next().unwrap_or_else(|| a.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AltitudeMarker, AltitudeMarkerId, LevelId, SpaceId, Stair, StairId};
    use geo::{polygon, Coord, LineString};

    fn square(min: f64, max: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
                    (x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max),
        ]])
    }

    /// S1: one space [0,100]x[0,100], stairs at x=30,50,70, markers at
    /// (20,50)=1.00 and (80,50)=2.00 (S1).
    #[test]
    fn s1_straight_ramp_interpolation() {
        let level = Level {
            id: LevelId(1),
            base_altitude: 0.0,
            default_height: 3.0,
            door_height: 2.0,
            on_top_of: None,
            short_label: "0".into(),
        };
        let space = Space {
            id: SpaceId(1),
            level: level.id,
            geometry: square(0.0, 100.0),
            outside: false,
            columns: vec![],
            holes: vec![],
            obstacles: vec![],
            lineobstacles: vec![],
            stairs: vec![
                Stair { id: StairId(1), geometry: LineString(vec![Coord { x: 30.0, y: -1.0 }, Coord { x: 30.0, y: 101.0 }]) },
                Stair { id: StairId(2), geometry: LineString(vec![Coord { x: 50.0, y: -1.0 }, Coord { x: 50.0, y: 101.0 }]) },
                Stair { id: StairId(3), geometry: LineString(vec![Coord { x: 70.0, y: -1.0 }, Coord { x: 70.0, y: 101.0 }]) },
            ],
            ramps: vec![],
            altitudemarkers: vec![
                AltitudeMarker { id: AltitudeMarkerId(1), point: Point::new(20.0, 50.0), altitude: 1.00 },
                AltitudeMarker { id: AltitudeMarkerId(2), point: Point::new(80.0, 50.0), altitude: 2.00 },
            ],
            areas: vec![],
        };

        let mut next = 0u32;
        let (areas, diff) = build_altitude_areas(
            &[LevelInput { level: &level, buildings: &[], spaces: &[space], doors: &[] }],
            &[],
            || {
                next += 1;
                AltitudeAreaId(next)
            },
        );

        assert_eq!(diff.created.len(), 4);
        let mut altitudes: Vec<f64> = areas
            .iter()
            .map(|a| match &a.surface {
                AltitudeSurface::Flat(v) => *v,
                AltitudeSurface::Interpolated(_) => f64::NAN,
        })
            .collect();
        altitudes.sort_by(|a, b| a.total_cmp(b));
        let expected = [1.00, 1.3333333, 1.6666667, 2.00];
        for (got, want) in altitudes.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-4, "got {got}, want {want}");
        }
    }

    /// S4: two spaces offset by 200m each get their own marker's altitude,
    /// no interpolation across the gap (S4).
    #[test]
    fn s4_disconnected_spaces_keep_independent_altitudes() {
        let level = Level {
            id: LevelId(1),
            base_altitude: 0.0,
            default_height: 3.0,
            door_height: 2.0,
            on_top_of: None,
            short_label: "0".into(),
        };
        let space_a = Space {
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
            altitudemarkers: vec![AltitudeMarker { id: AltitudeMarkerId(1), point: Point::new(5.0, 5.0), altitude: 1.0 }],
            areas: vec![],
        };
        let space_b = Space {
            id: SpaceId(2),
            level: level.id,
            geometry: square(200.0, 210.0),
            outside: false,
            columns: vec![],
            holes: vec![],
            obstacles: vec![],
            lineobstacles: vec![],
            stairs: vec![],
            ramps: vec![],
            altitudemarkers: vec![AltitudeMarker { id: AltitudeMarkerId(2), point: Point::new(205.0, 205.0), altitude: 9.0 }],
            areas: vec![],
        };

        let mut next = 0u32;
        let (areas, _) = build_altitude_areas(
            &[LevelInput { level: &level, buildings: &[], spaces: &[space_a, space_b], doors: &[] }],
            &[],
            || {
                next += 1;
                AltitudeAreaId(next)
            },
        );

        let mut altitudes: Vec<f64> = areas
            .iter()
            .map(|a| match &a.surface {
                AltitudeSurface::Flat(v) => *v,
                AltitudeSurface::Interpolated(_) => f64::NAN,
        })
            .collect();
        altitudes.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(altitudes, vec![1.0, 9.0]);
    }
}
