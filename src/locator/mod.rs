//! Indoor locator: fingerprint store plus the three-tier
//! `locate()` classifier (trilateration, weighted centroid, nearest
//! fingerprint).

mod fingerprint;
mod trilateration;
mod types;

pub use fingerprint::LocatorSpace;
pub use trilateration::Anchor;
pub use types::{
    IBeaconScanReading, LocatedPosition, LocatorPeer, LocatorPoint, PeerIdentifier, ScanData, ScanDataValue,
    WifiScanReading,
};

use ahash::{AHashMap, AHashSet};

use crate::config::Config;
use crate::model::{LevelId, SpaceId};

/// Resolves an estimated `(x, y, z)` to a level — ordinarily a routing
/// component's job; the locator only needs a narrow seam onto it.
pub trait LevelResolver {
    fn level_for_point(&self, x: f64, y: f64, z: f64) -> LevelId;
    fn representative_point(&self, space: SpaceId) -> Option<(LevelId, f64, f64)>;
}

#[derive(Debug, Default)]
pub struct Locator {
    peers: Vec<LocatorPeer>,
    peer_lookup: AHashMap<PeerIdentifier, usize>,
    xyz: Vec<(i64, i64, i64)>,
    spaces: AHashMap<SpaceId, LocatorSpace>,
}

impl Locator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_peer_id(&mut self, identifier: &PeerIdentifier) -> usize {
        if let Some(&id) = self.peer_lookup.get(identifier) {
            return id;
        }
        let id = self.peers.len();
        self.peers.push(LocatorPeer { identifier: identifier.clone(), xyz: None, space_id: None });
        self.peer_lookup.insert(identifier.clone(), id);
        id
    }

    pub fn find_peer_id(&self, identifier: &PeerIdentifier) -> Option<usize> {
        self.peer_lookup.get(identifier).copied()
    }

    pub fn set_peer_position(&mut self, identifier: &PeerIdentifier, xyz: (i64, i64, i64), space_id: SpaceId) {
        let id = self.get_peer_id(identifier);
        self.peers[id].xyz = Some(xyz);
        self.peers[id].space_id = Some(space_id);
        if self.xyz.len() <= id {
            self.xyz.resize(id + 1, (0, 0, 0));
        }
        self.xyz[id] = xyz;
    }

    pub fn add_space(&mut self, space: LocatorSpace) {
        self.spaces.insert(space.pk, space);
    }

    pub fn convert_wifi_scan(&mut self, readings: &[WifiScanReading], config: &Config, create_peers: bool) -> ScanData {
        let mut result = ScanData::default();
        for reading in readings {
            if !config.accepts_ssid(&reading.ssid) {
                continue;
            }
            let candidates = [
                PeerIdentifier::Wifi(reading.bssid.clone()),
                PeerIdentifier::Wifi(reading.ap_name.clone()),
            ];
            let mut seen = AHashSet::default();
            for identifier in &candidates {
                let peer_id = if create_peers {
                    Some(self.get_peer_id(identifier))
                } else {
                    self.find_peer_id(identifier)
                };
                if let Some(peer_id) = peer_id {
                    if seen.insert(peer_id) {
                        result.insert(
                            peer_id,
                            ScanDataValue { rssi: Some(reading.rssi), distance: reading.distance, ibeacon_range: None },
                        );
                    }
                }
            }
        }
        result
    }

    pub fn convert_ibeacon_scan(&mut self, readings: &[IBeaconScanReading], create_peers: bool) -> ScanData {
        let mut result = ScanData::default();
        for reading in readings {
            let identifier = PeerIdentifier::IBeacon { uuid: reading.uuid.clone(), major: reading.major, minor: reading.minor };
            let peer_id = if create_peers { Some(self.get_peer_id(&identifier)) } else { self.find_peer_id(&identifier) };
            if let Some(peer_id) = peer_id {
                result.insert(peer_id, ScanDataValue { rssi: None, ibeacon_range: Some(reading.distance), distance: None });
            }
        }
        result
    }

    /// Averages duplicate peer readings across every converted scan, the
    /// way `convert_scans` merges wifi + ibeacon lists.
    pub fn merge_scans(scans: &[ScanData]) -> ScanData {
        let mut by_peer: AHashMap<usize, Vec<ScanDataValue>> = AHashMap::default();
        for scan in scans {
            for (&peer_id, value) in scan {
                by_peer.entry(peer_id).or_default().push(*value);
            }
        }
        by_peer.into_iter().map(|(peer_id, values)| (peer_id, ScanDataValue::average(&values))).collect()
    }

    pub fn locate(
        &self,
        scan: &ScanData,
        resolver: &impl LevelResolver,
        excluded_spaces: &AHashSet<SpaceId>,
    ) -> Option<LocatedPosition> {
        if scan.is_empty() {
            return None;
        }
        if let Some(result) = self.locate_range(scan, resolver) {
            return Some(result);
        }
        if let Some(result) = self.locate_by_beacon_positions(scan, resolver) {
            return Some(result);
        }
        self.locate_rssi(scan, resolver, excluded_spaces)
    }

    fn locate_range(&self, scan: &ScanData, resolver: &impl LevelResolver) -> Option<LocatedPosition> {
        let anchors: Vec<Anchor> = scan
            .iter()
            .filter_map(|(&peer_id, value)| {
                let xyz = self.xyz.get(peer_id)?;
                let distance = value.distance?;
                Some(Anchor { xyz: (xyz.0 as f64, xyz.1 as f64, xyz.2 as f64), range: distance * 100.0 })
        })
            .collect();

        if anchors.len() < 3 {
            return None;
        }
        let dims = if anchors.len() >= 4 { 3 } else { 2 };

        let centroid = |axis: fn(&Anchor) -> f64| anchors.iter().map(axis).sum::<f64>() / anchors.len() as f64;
        let initial_guess = if dims == 3 {
            vec![centroid(|a| a.xyz.0), centroid(|a| a.xyz.1), centroid(|a| a.xyz.2)]
        } else {
            vec![centroid(|a| a.xyz.0), centroid(|a| a.xyz.1)]
        };

        let min = |axis: fn(&Anchor) -> f64| anchors.iter().map(axis).fold(f64::INFINITY, f64::min);
        let max = |axis: fn(&Anchor) -> f64| anchors.iter().map(axis).fold(f64::NEG_INFINITY, f64::max);
        let (pad_xy, pad_z) = (200.0, 100.0);
        let lower = if dims == 3 {
            vec![min(|a| a.xyz.0) - pad_xy, min(|a| a.xyz.1) - pad_xy, min(|a| a.xyz.2) - pad_z]
        } else {
            vec![min(|a| a.xyz.0) - pad_xy, min(|a| a.xyz.1) - pad_xy]
        };
        let upper = if dims == 3 {
            vec![max(|a| a.xyz.0) + pad_xy, max(|a| a.xyz.1) + pad_xy, max(|a| a.xyz.2) + pad_z]
        } else {
            vec![max(|a| a.xyz.0) + pad_xy, max(|a| a.xyz.1) + pad_xy]
        };

        let result = trilateration::solve(&anchors, dims, &initial_guess, &lower, &upper);
        let z = if dims == 3 { result[2] } else { 0.0 };
        let level = resolver.level_for_point(result[0], result[1], z - 130.0);

        Some(LocatedPosition { level, x: result[0] / 100.0, y: result[1] / 100.0, z: Some(z / 100.0), score: None })
    }

    fn locate_by_beacon_positions(&self, scan: &ScanData, resolver: &impl LevelResolver) -> Option<LocatedPosition> {
        let space_id = self.strongest_anchored_space(scan)?;
        if let Some((space_id, x, y)) = fingerprint::weighted_centroid(&self.peers, scan) {
            let (level, _, _) = resolver.representative_point(space_id)?;
            return Some(LocatedPosition { level, x, y, z: None, score: None });
        }
        let (level, x, y) = resolver.representative_point(space_id)?;
        Some(LocatedPosition { level, x, y, z: None, score: None })
    }

    fn strongest_anchored_space(&self, scan: &ScanData) -> Option<SpaceId> {
        scan.iter()
            .filter_map(|(&peer_id, value)| Some((self.peers.get(peer_id)?.space_id?, value.rssi?)))
            .max_by_key(|&(_, rssi)| rssi)
            .map(|(space_id, _)| space_id)
    }

    fn locate_rssi(
        &self,
        scan: &ScanData,
        resolver: &impl LevelResolver,
        excluded_spaces: &AHashSet<SpaceId>,
    ) -> Option<LocatedPosition> {
        let (space_id, x, y, score) = fingerprint::nearest_fingerprint(&self.spaces, scan, excluded_spaces)?;
        let (level, _, _) = resolver.representative_point(space_id)?;
        Some(LocatedPosition { level, x, y, z: None, score: Some(score) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver(LevelId);
    impl LevelResolver for FixedResolver {
        fn level_for_point(&self, _x: f64, _y: f64, _z: f64) -> LevelId {
            self.0
        }
        fn representative_point(&self, _space: SpaceId) -> Option<(LevelId, f64, f64)> {
            Some((self.0, 0.0, 0.0))
        }
    }

    #[test]
    fn empty_scan_locates_to_nothing() {
        let locator = Locator::new();
        let resolver = FixedResolver(LevelId(1));
        assert!(locator.locate(&ScanData::default(), &resolver, &AHashSet::default()).is_none());
    }

    #[test]
    fn three_ranging_peers_trigger_trilateration() {
        let mut locator = Locator::new();
        let a = PeerIdentifier::Wifi("a".into());
        let b = PeerIdentifier::Wifi("b".into());
        let c = PeerIdentifier::Wifi("c".into());
        locator.set_peer_position(&a, (0, 0, 0), SpaceId(1));
        locator.set_peer_position(&b, (1000, 0, 0), SpaceId(1));
        locator.set_peer_position(&c, (0, 1000, 0), SpaceId(1));

        let mut scan = ScanData::default();
        scan.insert(locator.find_peer_id(&a).unwrap(), ScanDataValue { distance: Some(7.07),..Default::default() });
        scan.insert(locator.find_peer_id(&b).unwrap(), ScanDataValue { distance: Some(7.07),..Default::default() });
        scan.insert(locator.find_peer_id(&c).unwrap(), ScanDataValue { distance: Some(7.07),..Default::default() });

        let resolver = FixedResolver(LevelId(1));
        let result = locator.locate(&scan, &resolver, &AHashSet::default()).unwrap();
        assert!((result.x - 5.0).abs() < 0.5, "x={}", result.x);
        assert!((result.y - 5.0).abs() < 0.5, "y={}", result.y);
    }

    /// bug fix: `locate_rssi` must return the found location, not `None`.
    #[test]
    fn locate_rssi_returns_the_found_location_not_none() {
        let mut locator = Locator::new();
        let peer = PeerIdentifier::Wifi("x".into());
        let peer_id = locator.get_peer_id(&peer);

        let mut point_values = ScanData::default();
        point_values.insert(peer_id, ScanDataValue { rssi: Some(-40),..Default::default() });
        locator.add_space(LocatorSpace::build(
                SpaceId(1),
                vec![LocatorPoint { x: 3.0, y: 4.0, values: point_values }],
        ));

        let mut scan = ScanData::default();
        scan.insert(peer_id, ScanDataValue { rssi: Some(-42),..Default::default() });

        let resolver = FixedResolver(LevelId(2));
        let result = locator.locate(&scan, &resolver, &AHashSet::default());
        assert!(result.is_some(), "must return Some when a fingerprint match exists");
        assert_eq!(result.unwrap().level, LevelId(2));
    }
}
