//! Authoritative map-data store contract: the editor's
//! database, read by the processing core and written back to only for the
//! derived tables it owns (altitude areas, ancestries, render artifacts).
//! Writes are upserts by id — rows with a matching id are replaced in
//! place, unmatched ids are inserted — and reads append to a durable,
//! append-only [`MapUpdate`] log that every job keys its progress off.
//!
//! This module is contracts only — no real database backend. A Postgres
//! implementation would hold a connection pool and translate each method
//! into row-locking selects and bulk upserts; [`InMemoryMapDataStore`]
//! stands in for it in tests.

use ahash::AHashMap;

use crate::model::{
    AltitudeArea, AltitudeAreaId, Building, BuildingId, Door, DoorId, Level, LevelId, LocationTag,
    MapUpdate, MapUpdateKind, Parentage, ParentageId, Space, SpaceId,
};

/// Everything the processing core reads from or writes back to the
/// authoritative store.
pub trait MapDataStore {
    fn levels(&self) -> Vec<Level>;
    fn buildings(&self, level: LevelId) -> Vec<Building>;
    fn spaces(&self, level: LevelId) -> Vec<Space>;
    fn doors(&self, level: LevelId) -> Vec<Door>;
    fn altitude_areas(&self, level: LevelId) -> Vec<AltitudeArea>;
    fn location_tags(&self) -> Vec<LocationTag>;
    fn parentages(&self) -> Vec<Parentage>;

    /// Upsert by id: rows whose id matches an existing row are replaced in
    /// place, unmatched ids are inserted.
    fn upsert_altitude_areas(&mut self, areas: &[AltitudeArea]);
    fn delete_altitude_areas(&mut self, ids: &[AltitudeAreaId]);

    fn upsert_parentages(&mut self, parentages: &[Parentage]);
    fn delete_parentages(&mut self, ids: &[ParentageId]);

    /// Append a new row to the update log, returning it with its assigned
    /// id. Every processing job keys its "how far have I gotten" state off
    /// this log.
    fn append_update(&mut self, kind: MapUpdateKind, created_at: i64) -> MapUpdate;

    fn next_altitude_area_id(&mut self) -> AltitudeAreaId;
    fn next_parentage_id(&mut self) -> ParentageId;
}

/// In-memory reference implementation: no row-level locking, since there's
/// only ever one caller in-process and ids alone are enough to model
/// upsert-by-id semantics.
#[derive(Debug, Default)]
pub struct InMemoryMapDataStore {
    levels: Vec<Level>,
    buildings: AHashMap<LevelId, Vec<Building>>,
    spaces: AHashMap<LevelId, Vec<Space>>,
    doors: AHashMap<LevelId, Vec<Door>>,
    altitude_areas: AHashMap<AltitudeAreaId, AltitudeArea>,
    location_tags: Vec<LocationTag>,
    parentages: AHashMap<ParentageId, Parentage>,
    updates: Vec<MapUpdate>,
    next_update_id: u64,
    next_area_id: u32,
    next_parentage_id: u32,
}

impl InMemoryMapDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_level(&mut self, level: Level) {
        self.levels.push(level);
    }

    pub fn push_building(&mut self, building: Building) {
        self.buildings.entry(building.level).or_default().push(building);
    }

    pub fn push_space(&mut self, space: Space) {
        self.spaces.entry(space.level).or_default().push(space);
    }

    pub fn push_door(&mut self, door: Door) {
        self.doors.entry(door.level).or_default().push(door);
    }

    pub fn push_location_tag(&mut self, tag: LocationTag) {
        self.location_tags.push(tag);
    }

    pub fn space_id_exists(&self, id: SpaceId) -> bool {
        self.spaces.values().flatten().any(|s| s.id == id)
    }

    pub fn building_id_exists(&self, id: BuildingId) -> bool {
        self.buildings.values().flatten().any(|b| b.id == id)
    }

    pub fn door_id_exists(&self, id: DoorId) -> bool {
        self.doors.values().flatten().any(|d| d.id == id)
    }
}

impl MapDataStore for InMemoryMapDataStore {
    fn levels(&self) -> Vec<Level> {
        self.levels.clone()
    }

    fn buildings(&self, level: LevelId) -> Vec<Building> {
        self.buildings.get(&level).cloned().unwrap_or_default()
    }

    fn spaces(&self, level: LevelId) -> Vec<Space> {
        self.spaces.get(&level).cloned().unwrap_or_default()
    }

    fn doors(&self, level: LevelId) -> Vec<Door> {
        self.doors.get(&level).cloned().unwrap_or_default()
    }

    fn altitude_areas(&self, level: LevelId) -> Vec<AltitudeArea> {
        self.altitude_areas.values().filter(|a| a.level == level).cloned().collect()
    }

    fn location_tags(&self) -> Vec<LocationTag> {
        self.location_tags.clone()
    }

    fn parentages(&self) -> Vec<Parentage> {
        self.parentages.values().cloned().collect()
    }

    fn upsert_altitude_areas(&mut self, areas: &[AltitudeArea]) {
        for area in areas {
            self.altitude_areas.insert(area.id, area.clone());
        }
    }

    fn delete_altitude_areas(&mut self, ids: &[AltitudeAreaId]) {
        for id in ids {
            self.altitude_areas.remove(id);
        }
    }

    fn upsert_parentages(&mut self, parentages: &[Parentage]) {
        for parentage in parentages {
            self.parentages.insert(parentage.id, *parentage);
        }
    }

    fn delete_parentages(&mut self, ids: &[ParentageId]) {
        for id in ids {
            self.parentages.remove(id);
        }
    }

    fn append_update(&mut self, kind: MapUpdateKind, created_at: i64) -> MapUpdate {
        self.next_update_id += 1;
        let update = MapUpdate { id: crate::model::MapUpdateId(self.next_update_id), kind, created_at };
        self.updates.push(update.clone());
        update
    }

    fn next_altitude_area_id(&mut self) -> AltitudeAreaId {
        self.next_area_id += 1;
        AltitudeAreaId(self.next_area_id)
    }

    fn next_parentage_id(&mut self) -> ParentageId {
        self.next_parentage_id += 1;
        ParentageId(self.next_parentage_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AltitudeSurface, LevelId};
    use geo::MultiPolygon;

    #[test]
    fn upsert_replaces_matching_id_and_inserts_new_ones() {
        let mut store = InMemoryMapDataStore::new();
        let area = AltitudeArea {
            id: AltitudeAreaId(1),
            level: LevelId(1),
            geometry: MultiPolygon(Vec::new()),
            surface: AltitudeSurface::Flat(0.0),
        };
        store.upsert_altitude_areas(&[area.clone()]);
        assert_eq!(store.altitude_areas(LevelId(1)).len(), 1);

        let replaced = AltitudeArea { surface: AltitudeSurface::Flat(5.0),..area };
        store.upsert_altitude_areas(&[replaced]);
        let rows = store.altitude_areas(LevelId(1));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].surface, AltitudeSurface::Flat(5.0));
    }

    #[test]
    fn append_update_assigns_increasing_ids() {
        let mut store = InMemoryMapDataStore::new();
        let first = store.append_update(MapUpdateKind::Direct, 100);
        let second = store.append_update(MapUpdateKind::Management, 200);
        assert!(second.id.0 > first.id.0);
    }
}
