//! Phase H — persistence with minimal churn : diff freshly
//! computed areas against what's already stored so unaffected areas keep
//! their id and only the parts that actually changed are written.

use geo::{Area, BooleanOps, MultiPolygon};

use crate::model::{AltitudeArea, AltitudeAreaId, AltitudeSurface};

#[derive(Debug, Default)]
pub struct AreaDiff {
    pub created: Vec<AltitudeArea>,
    pub updated: Vec<AltitudeArea>,
    pub deleted: Vec<AltitudeAreaId>,
}

impl AreaDiff {
    pub fn summary(&self) -> String {
        format!(
            "{} modified, {} created, {} deleted",
            self.updated.len(),
            self.created.len(),
            self.deleted.len()
        )
    }
}

/// `next_id` hands out ids for genuinely new areas; existing areas keep
/// their id whether unchanged or updated in place.
pub fn diff_areas(
    existing: &[AltitudeArea],
    mut new_areas: Vec<AltitudeArea>,
    mut next_id: impl FnMut() -> AltitudeAreaId,
) -> AreaDiff {
    let mut diff = AreaDiff::default();
    let mut remaining_existing: Vec<&AltitudeArea> = existing.iter().collect();

    // Exact match pass: same altitude, same normalized geometry.
    new_areas.retain(|new_area| {
            if let Some(pos) = remaining_existing
                .iter()
                .position(|old| surfaces_match(&old.surface, &new_area.surface) && old.geometry == new_area.geometry)
            {
                remaining_existing.remove(pos);
                false
            } else {
                true
            }
    });

    // Overlap match pass: same altitude, pick the existing area with
    // maximum overlap, update its geometry in place.
    let mut still_new = Vec::new();
    for new_area in new_areas {
        let best = remaining_existing
            .iter()
            .enumerate()
            .filter(|(_, old)| surfaces_match(&old.surface, &new_area.surface))
            .map(|(idx, old)| (idx, overlap_area(&old.geometry, &new_area.geometry)))
            .filter(|(_, overlap)| *overlap > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((idx, _)) => {
                let old = remaining_existing.remove(idx);
                diff.updated.push(AltitudeArea {
                        id: old.id,
                        level: new_area.level,
                        geometry: new_area.geometry,
                        surface: new_area.surface,
                });
            }
            None => still_new.push(new_area),
        }
    }

    for old in remaining_existing {
        diff.deleted.push(old.id);
    }

    for mut new_area in still_new {
        new_area.id = next_id();
        diff.created.push(new_area);
    }

    diff
}

fn surfaces_match(a: &AltitudeSurface, b: &AltitudeSurface) -> bool {
    match (a, b) {
        (AltitudeSurface::Flat(x), AltitudeSurface::Flat(y)) => (x - y).abs() < 1e-9,
        (AltitudeSurface::Interpolated(_), AltitudeSurface::Interpolated(_)) => true,
        _ => false,
    }
}

fn overlap_area(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> f64 {
    a.intersection(b).0.iter().map(|p| p.unsigned_area()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LevelId;
    use geo::polygon;

    fn square(min: f64, max: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
                    (x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max),
        ]])
    }

    fn flat(id: u32, geometry: MultiPolygon<f64>, altitude: f64) -> AltitudeArea {
        AltitudeArea {
            id: AltitudeAreaId(id),
            level: LevelId(1),
            geometry,
            surface: AltitudeSurface::Flat(altitude),
        }
    }

    #[test]
    fn identical_area_is_neither_created_updated_nor_deleted() {
        let existing = vec![flat(1, square(0.0, 10.0), 1.0)];
        let new_areas = vec![flat(0, square(0.0, 10.0), 1.0)];
        let mut next = 100u32;
        let diff = diff_areas(&existing, new_areas, || {
                next += 1;
                AltitudeAreaId(next)
        });
        assert!(diff.created.is_empty());
        assert!(diff.updated.is_empty());
        assert!(diff.deleted.is_empty());
    }

    #[test]
    fn overlapping_area_with_shifted_bounds_updates_in_place() {
        let existing = vec![flat(1, square(0.0, 10.0), 1.0)];
        let new_areas = vec![flat(0, square(0.5, 10.5), 1.0)];
        let mut next = 100u32;
        let diff = diff_areas(&existing, new_areas, || {
                next += 1;
                AltitudeAreaId(next)
        });
        assert_eq!(diff.updated.len(), 1);
        assert_eq!(diff.updated[0].id, AltitudeAreaId(1));
        assert!(diff.created.is_empty());
        assert!(diff.deleted.is_empty());
    }

    #[test]
    fn disjoint_new_area_is_created_and_old_one_deleted() {
        let existing = vec![flat(1, square(0.0, 10.0), 1.0)];
        let new_areas = vec![flat(0, square(500.0, 510.0), 1.0)];
        let mut next = 100u32;
        let diff = diff_areas(&existing, new_areas, || {
                next += 1;
                AltitudeAreaId(next)
        });
        assert_eq!(diff.created.len(), 1);
        assert_eq!(diff.deleted, vec![AltitudeAreaId(1)]);
    }
}
