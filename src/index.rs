//! Spatial index (C2): a batch-built, read-only R-tree over arbitrary ids,
//! generalized over a caller-supplied id type instead of a bare `Vec` index.

use geo::{BoundingRect, MultiPolygon, Relate};
use rstar::{RTree, RTreeObject, AABB};

#[derive(Debug, Clone)]
struct Entry {
    pos: usize,
    bbox: geo::Rect<f64>,
}

impl RTreeObject for Entry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// A static R-tree built once per query batch; the core never mutates an
/// index between queries.
pub struct Index<Id> {
    items: Vec<(Id, MultiPolygon<f64>)>,
    rtree: RTree<Entry>,
}

impl<Id: Clone> Index<Id> {
    pub fn new() -> Self {
        Index {
            items: Vec::new(),
            rtree: RTree::new(),
        }
    }

    /// Build an index over every `(id, geom)` pair in one batch. Geometries
    /// with no bounding rect (empty multipolygons) are skipped; they can
    /// never intersect anything.
    pub fn build(items: impl IntoIterator<Item = (Id, MultiPolygon<f64>)>) -> Self {
        let items: Vec<(Id, MultiPolygon<f64>)> = items.into_iter().collect();
        let entries: Vec<Entry> = items
            .iter()
            .enumerate()
            .filter_map(|(pos, (_, geom))| geom.bounding_rect().map(|bbox| Entry { pos, bbox }))
            .collect();
        Index {
            items,
            rtree: RTree::bulk_load(entries),
        }
    }

    /// Ids whose bounding box intersects `query`'s bounding box. A superset
    /// of actual intersectors; false positives are allowed, false
    /// negatives are not.
    pub fn intersection_candidates(&self, query: &MultiPolygon<f64>) -> Vec<Id> {
        let Some(bbox) = query.bounding_rect() else {
            return Vec::new();
        };
        let envelope = AABB::from_corners(bbox.min().into(), bbox.max().into());
        self.rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| self.items[entry.pos].0.clone())
            .collect()
    }

    /// Ids whose actual geometry intersects `query`'s geometry, verified
    /// via DE-9IM after the bbox prefilter.
    pub fn intersection(&self, query: &MultiPolygon<f64>) -> Vec<Id> {
        let Some(bbox) = query.bounding_rect() else {
            return Vec::new();
        };
        let envelope = AABB::from_corners(bbox.min().into(), bbox.max().into());
        self.rtree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|entry| {
                let (id, geom) = &self.items[entry.pos];
                geom.relate(query).is_intersects().then(|| id.clone())
        })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<Id: Clone> Default for Index<Id> {
    fn default() -> Self {
        Self::new()
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
    fn intersecting_query_finds_overlapping_entry() {
        let index = Index::build([(1u32, square(0.0, 10.0)), (2u32, square(100.0, 110.0))]);
        let hits = index.intersection(&square(5.0, 15.0));
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn disjoint_query_finds_nothing() {
        let index = Index::build([(1u32, square(0.0, 10.0))]);
        assert!(index.intersection(&square(50.0, 60.0)).is_empty());
    }

    #[test]
    fn candidate_query_can_overapproximate_but_never_misses() {
        let index = Index::build([(1u32, square(0.0, 10.0))]);
        let candidates = index.intersection_candidates(&square(5.0, 15.0));
        assert!(candidates.contains(&1));
    }

    #[test]
    fn empty_index_returns_no_hits() {
        let index: Index<u32> = Index::new();
        assert!(index.intersection(&square(0.0, 10.0)).is_empty());
    }
}
