//! Change tracker (C8): a process-wide accumulator of the map regions
//! touched by a job run, keyed by level, so downstream consumers (tile
//! server, renderer) invalidate only what changed.

use ahash::AHashMap;
use geo::{BooleanOps, MultiPolygon};

use crate::model::LevelId;

/// One job run's worth of accumulated change regions. Reset at the start
/// of a run; persisted next to the job's artifacts on completion.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    regions: AHashMap<LevelId, MultiPolygon<f64>>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        ChangeTracker::default()
    }

    /// Clear all accumulated regions, starting a fresh run.
    pub fn reset(&mut self) {
        self.regions.clear();
    }

    /// Record that `geometry` on `level` changed. `force` re-registers even
    /// an entity whose own dirty flag says it didn't change, for callers
    /// that can't trust that flag — a child removed from a parent that
    /// itself stays undeleted must still be forced through, regardless of
    /// the entity's own "was I actually deleted" bookkeeping (see
    /// [`crate::ancestry`]).
    pub fn register_change(&mut self, level: LevelId, geometry: &MultiPolygon<f64>, force: bool) {
        if geometry.0.is_empty() && !force {
            return;
        }
        self.union_in(level, geometry);
    }

    pub fn register_delete(&mut self, level: LevelId, geometry: &MultiPolygon<f64>) {
        self.union_in(level, geometry);
    }

    fn union_in(&mut self, level: LevelId, geometry: &MultiPolygon<f64>) {
        self.regions
            .entry(level)
            .and_modify(|existing| *existing = existing.union(geometry))
            .or_insert_with(|| geometry.clone());
    }

    pub fn changed_levels(&self) -> impl Iterator<Item = &LevelId> {
        self.regions.keys()
    }

    pub fn region_for(&self, level: LevelId) -> Option<&MultiPolygon<f64>> {
        self.regions.get(&level)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(min: f64, max: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
                    (x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max),
        ]])
    }

    #[test]
    fn reset_clears_all_accumulated_regions() {
        let mut tracker = ChangeTracker::new();
        tracker.register_change(LevelId(1), &square(0.0, 10.0), false);
        assert!(!tracker.is_empty());
        tracker.reset();
        assert!(tracker.is_empty());
    }

    #[test]
    fn empty_geometry_is_ignored_unless_forced() {
        let mut tracker = ChangeTracker::new();
        tracker.register_change(LevelId(1), &MultiPolygon(Vec::new()), false);
        assert!(tracker.is_empty());

        tracker.register_change(LevelId(1), &MultiPolygon(Vec::new()), true);
        assert!(tracker.region_for(LevelId(1)).is_some());
    }

    #[test]
    fn changes_on_the_same_level_accumulate() {
        let mut tracker = ChangeTracker::new();
        tracker.register_change(LevelId(1), &square(0.0, 10.0), false);
        tracker.register_change(LevelId(1), &square(20.0, 30.0), false);
        let region = tracker.region_for(LevelId(1)).unwrap();
        assert_eq!(region.0.len(), 2);
    }
}
