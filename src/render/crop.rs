//! Steps 1-2 of the level render composer: which sublevels
//! contribute to a render level, and the crop mask each one is seen
//! through.

use ahash::AHashMap;
use geo::{BooleanOps, MultiPolygon};

use crate::model::{Level, LevelId};

/// This level, its `on_top_of` children, and every lower non-intermediate
/// level — ordered top-down (render level first).
pub fn relevant_sublevels(levels: &[&Level], render_level: &Level) -> Vec<LevelId> {
    let mut result = vec![render_level.id];

    let mut children: Vec<&&Level> =
    levels.iter().filter(|l| l.on_top_of == Some(render_level.id)).collect();
    children.sort_by(|a, b| a.base_altitude.total_cmp(&b.base_altitude));
    result.extend(children.iter().map(|l| l.id));

    let mut lower: Vec<&&Level> = levels
        .iter()
        .filter(|l| !l.is_intermediate() && l.base_altitude < render_level.base_altitude)
        .collect();
    lower.sort_by(|a, b| b.base_altitude.total_cmp(&a.base_altitude));
    result.extend(lower.iter().map(|l| l.id));

    result
}

/// Walks `sublevels` top-down, emitting `(level, crop)` for every level that
/// is still at least partly visible. `holes` is the per-level union of
/// space holes. The render level itself always has no crop.
pub fn compute_crop_masks(
    sublevels: &[LevelId],
    holes: &AHashMap<LevelId, MultiPolygon<f64>>,
) -> Vec<(LevelId, Option<MultiPolygon<f64>>)> {
    let mut result = Vec::with_capacity(sublevels.len());
    if sublevels.is_empty() {
        return result;
    }

    result.push((sublevels[0], None));
    let mut crop: Option<MultiPolygon<f64>> = None;

    for window in sublevels.windows(2) {
        let above = window[0];
        let current = window[1];
        let above_holes = holes.get(&above).cloned().unwrap_or_default();
        crop = Some(match crop {
                None => above_holes,
                Some(existing) => existing.intersection(&above_holes),
        });

        if crop.as_ref().map(|c| c.0.is_empty()).unwrap_or(true) {
            break;
        }
        result.push((current, crop.clone()));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn level(id: u32, base_altitude: f64, on_top_of: Option<u32>) -> Level {
        Level {
            id: LevelId(id),
            base_altitude,
            default_height: 3.0,
            door_height: 2.0,
            on_top_of: on_top_of.map(LevelId),
            short_label: id.to_string(),
        }
    }

    fn square(min: f64, max: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
                    (x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max),
        ]])
    }

    #[test]
    fn relevant_sublevels_includes_mezzanine_and_lower_floors() {
        let ground = level(1, 0.0, None);
        let mezzanine = level(2, 1.5, Some(1));
        let upper = level(3, 3.0, None);
        let levels = vec![&ground, &mezzanine, &upper];

        let order = relevant_sublevels(&levels, &upper);
        assert_eq!(order, vec![LevelId(3), LevelId(1)]);
    }

    #[test]
    fn crop_stops_once_a_level_has_no_hole() {
        let ground = level(1, 0.0, None);
        let upper = level(2, 3.0, None);
        let levels = vec![&ground, &upper];
        let order = relevant_sublevels(&levels, &upper);

        let mut holes = AHashMap::default();
        holes.insert(LevelId(2), square(0.0, 10.0));

        let masks = compute_crop_masks(&order, &holes);
        assert_eq!(masks.len(), 2);
        assert_eq!(masks[0], (LevelId(2), None));
        assert!(masks[1].1.is_some());
    }

    #[test]
    fn crop_empty_when_upper_level_has_no_holes() {
        let ground = level(1, 0.0, None);
        let upper = level(2, 3.0, None);
        let levels = vec![&ground, &upper];
        let order = relevant_sublevels(&levels, &upper);

        let holes = AHashMap::default();
        let masks = compute_crop_masks(&order, &holes);
        assert_eq!(masks.len(), 1, "ground floor isn't visible with no hole above it");
    }
}
