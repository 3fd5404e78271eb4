//! Level render composer (C4): for one render level, gather its
//! relevant sublevels, crop each to the holes above it, derive walls and
//! restricted-space masks, triangulate, and extrude.

mod crop;
mod mesh;
mod triangulate;

use ahash::{AHashMap, AHashSet};
use geo::{BooleanOps, MultiPolygon};

use crate::index::Index;
use crate::model::{
    AccessRestrictionId, AltitudeArea, Building, ColumnId, Door, Level, LevelGeometries, LevelId,
    LevelRenderData, Space,
};

/// Everything the composer needs about one sublevel's entities. Spaces
/// carry their own holes/columns; altitude areas come from the altitude
/// pipeline's output for that level.
pub struct LevelRenderInput<'a> {
    pub level: &'a Level,
    pub buildings: &'a [Building],
    pub doors: &'a [Door],
    pub spaces: &'a [Space],
    pub altitude_areas: &'a [AltitudeArea],
}

fn union_all(polys: impl Iterator<Item = MultiPolygon<f64>>) -> MultiPolygon<f64> {
    polys.fold(MultiPolygon(Vec::new()), |acc, p| acc.union(&p))
}

/// Candidate ids whose geometry's bbox intersects `region`, via the spatial
/// index — a superset of the true intersectors, narrowing what `union_all`
/// has to fold before the caller's own exact `intersection` clip. `None`
/// region (nothing cropped yet) means everything is a candidate.
fn relevant<Id: Copy + Eq + std::hash::Hash>(
    region: Option<&MultiPolygon<f64>>,
    items: impl Iterator<Item = (Id, MultiPolygon<f64>)>,
) -> Option<AHashSet<Id>> {
    let region = region?;
    let index = Index::build(items);
    Some(index.intersection_candidates(region).into_iter().collect())
}

fn holes_for(input: &LevelRenderInput) -> MultiPolygon<f64> {
    union_all(input.spaces.iter().flat_map(|s| s.holes.iter().map(|h| h.geometry.clone())))
}

fn buildings_for(input: &LevelRenderInput, region: Option<&MultiPolygon<f64>>) -> MultiPolygon<f64> {
    let candidates = relevant(region, input.buildings.iter().map(|b| (b.id, b.geometry.clone())));
    union_all(
        input
            .buildings
            .iter()
            .filter(|b| candidates.as_ref().map_or(true, |c| c.contains(&b.id)))
            .map(|b| b.geometry.clone()),
    )
}

fn doors_for(input: &LevelRenderInput, region: Option<&MultiPolygon<f64>>) -> MultiPolygon<f64> {
    let candidates = relevant(region, input.doors.iter().map(|d| (d.id, d.geometry.clone())));
    union_all(
        input
            .doors
            .iter()
            .filter(|d| candidates.as_ref().map_or(true, |c| c.contains(&d.id)))
            .map(|d| d.geometry.clone()),
    )
}

fn accessible_for(input: &LevelRenderInput, region: Option<&MultiPolygon<f64>>) -> MultiPolygon<f64> {
    let candidates = relevant(region, input.altitude_areas.iter().map(|a| (a.id, a.geometry.clone())));
    union_all(
        input
            .altitude_areas
            .iter()
            .filter(|a| candidates.as_ref().map_or(true, |c| c.contains(&a.id)))
            .map(|a| a.geometry.clone()),
    )
}

/// Restricted columns are left accessible-but-gated rather than subtracted
/// (Phase A step 2); `Space` itself carries no restriction of its
/// own in this model, so the restricted mask is the union of its columns'.
fn restricted_for(input: &LevelRenderInput, region: Option<&MultiPolygon<f64>>) -> MultiPolygon<f64> {
    let restricted_columns: Vec<(ColumnId, MultiPolygon<f64>)> = input
        .spaces
        .iter()
        .flat_map(|s| s.columns.iter())
        .filter(|c| c.access_restriction.is_some())
        .map(|c| (c.id, c.geometry.clone()))
        .collect();
    let candidates = relevant(region, restricted_columns.iter().cloned());
    union_all(
        restricted_columns
            .into_iter()
            .filter(|(id, _)| candidates.as_ref().map_or(true, |c| c.contains(id)))
            .map(|(_, geom)| geom),
    )
}

/// Composes one render level's full artifact: the cropped sublevel stack,
/// the darken area, and the access-restriction regions touched (step 4),
/// keyed by [`AccessRestrictionId`] for whoever merges them map-wide.
pub fn compose_level_render(
    render_level: &Level,
    all_levels: &[&Level],
    inputs: &AHashMap<LevelId, LevelRenderInput>,
) -> (LevelRenderData, AHashMap<AccessRestrictionId, MultiPolygon<f64>>) {
    let sublevel_order = crop::relevant_sublevels(all_levels, render_level);

    let holes: AHashMap<LevelId, MultiPolygon<f64>> = sublevel_order
        .iter()
        .filter_map(|id| inputs.get(id).map(|input| (*id, holes_for(input))))
        .collect();
    let crop_masks = crop::compute_crop_masks(&sublevel_order, &holes);

    let mut geometries = Vec::with_capacity(crop_masks.len());
    let mut darken_area = MultiPolygon(Vec::new());
    let mut restrictions: AHashMap<AccessRestrictionId, MultiPolygon<f64>> = AHashMap::default();
    let mut lowest_important_level = render_level.id;

    // Non-intermediate levels above the current one in iteration order, used
    // for cross-level wall shortening ("walls are shortened to sit under
    // the next level's altitude areas where they overlap").
    let mut previous_accessible: Option<MultiPolygon<f64>> = None;

    for (level_id, crop) in &crop_masks {
        let Some(input) = inputs.get(level_id) else { continue };
        lowest_important_level = *level_id;

        let clip = |geom: &MultiPolygon<f64>| match crop {
            Some(mask) => geom.intersection(mask),
            None => geom.clone(),
        };

        let buildings = clip(&buildings_for(input, crop.as_ref()));
        let doors = clip(&doors_for(input, crop.as_ref()));
        let accessible = clip(&accessible_for(input, crop.as_ref()));
        let altitudeareas = accessible.clone();
        let restricted = clip(&restricted_for(input, crop.as_ref()));
        let restricted_indoors = restricted.intersection(&buildings);
        let restricted_outdoors = restricted.difference(&buildings);
        let walls = buildings.difference(&accessible).difference(&doors);

        for column in input.spaces.iter().flat_map(|s| s.columns.iter()) {
            if let Some(restriction) = column.access_restriction {
                restrictions
                    .entry(restriction)
                    .and_modify(|existing| *existing = existing.union(&column.geometry))
                    .or_insert_with(|| column.geometry.clone());
            }
        }

        let floor = input.level.base_altitude;
        let ceiling = floor + input.level.default_height;

        let (wall_extrusions, shortened_darken) = match &previous_accessible {
            Some(above) if !above.0.is_empty() => shorten_walls(&walls, above, floor, ceiling),
            _ => (mesh::wall_extrusions(&walls, floor, ceiling), MultiPolygon(Vec::new())),
        };
        darken_area = darken_area.union(&shortened_darken);

        let door_extrusions = mesh::door_extrusions(&doors, floor, input.level.door_height, ceiling);
        let restricted_indoor_extrusions = mesh::restricted_indoor_extrusions(&restricted_indoors, floor, ceiling);
        let wall_base = mesh::wall_base(&buildings, render_level.base_altitude, floor);

        let obstacles: Vec<_> = input.spaces.iter().flat_map(|s| s.obstacles.iter().cloned()).collect();
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for area in input.altitude_areas {
            let (area_vertices, area_faces) = mesh::mesh_altitude_area(area, &obstacles, input.level.default_height);
            let base = vertices.len() as u32;
            vertices.extend(area_vertices);
            faces.extend(area_faces.into_iter().map(|f| [f[0] + base, f[1] + base, f[2] + base]));
        }

        if let Some(mask) = crop {
            darken_area = darken_area.union(mask);
        }

        geometries.push(LevelGeometries {
                level: *level_id,
                buildings,
                walls,
                doors,
                altitudeareas,
                heightareas: MultiPolygon(Vec::new()),
                restricted_spaces_indoors: restricted_indoors,
                restricted_spaces_outdoors: restricted_outdoors,
                vertices,
                faces,
                wall_extrusions,
                door_extrusions,
                restricted_indoor_extrusions,
                wall_base,
        });

        previous_accessible = Some(accessible);
    }

    let render_data = LevelRenderData {
        base_altitude: render_level.base_altitude,
        lowest_important_level,
        levels: geometries,
        darken_area,
    };
    (render_data, restrictions)
}

/// Splits `walls` into the part sitting under the level above's accessible
/// footprint (shortened to that level's floor) and the rest (full height),
/// returning their combined extrusions plus the shortened region (for the
/// darken overlay).
fn shorten_walls(
    walls: &MultiPolygon<f64>,
    upper_accessible: &MultiPolygon<f64>,
    floor: f64,
    ceiling: f64,
) -> (Vec<crate::model::Extrusion>, MultiPolygon<f64>) {
    let shortened_region = walls.intersection(upper_accessible);
    let full_height_region = walls.difference(upper_accessible);

    let mut extrusions = mesh::extrude(&full_height_region, floor - 0.7, ceiling);
    extrusions.extend(mesh::extrude(&shortened_region, floor - 0.7, floor));
    (extrusions, shortened_region)
}
