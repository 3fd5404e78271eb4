//! Per-space fingerprint matrix and the two non-ranging classifiers:
//! weighted centroid and nearest fingerprint.

use ahash::{AHashMap, AHashSet};

use crate::model::SpaceId;

use super::types::{LocatorPeer, LocatorPoint, PeerIdentifier, ScanData, NO_SIGNAL};

/// One space's fingerprint matrix: `levels[point][peer] = rssi²`, `NO_SIGNAL`
/// where a peer was never seen at that point.
pub struct LocatorSpace {
    pub pk: SpaceId,
    pub points: Vec<LocatorPoint>,
    peer_ids: AHashSet<usize>,
    peer_index: AHashMap<usize, usize>,
    levels: Vec<Vec<i64>>,
}

impl LocatorSpace {
    pub fn build(pk: SpaceId, points: Vec<LocatorPoint>) -> Self {
        let mut peer_ids = AHashSet::default();
        for point in &points {
            peer_ids.extend(point.values.keys().copied());
        }
        let peer_index: AHashMap<usize, usize> =
        peer_ids.iter().enumerate().map(|(i, &peer_id)| (peer_id, i)).collect();

        let mut levels = vec![vec![NO_SIGNAL; peer_index.len()]; points.len()];
        for (i, point) in points.iter().enumerate() {
            for (&peer_id, value) in &point.values {
                if let Some(rssi) = value.rssi {
                    levels[i][peer_index[&peer_id]] = (rssi as i64).pow(2);
                }
            }
        }

        LocatorSpace { pk, points, peer_ids, peer_index, levels }
    }

    pub fn knows_peer(&self, peer_id: usize) -> bool {
        self.peer_ids.contains(&peer_id)
    }

    /// Best matching recorded point for `scan`. The client's single
    /// strongest peer must be known to this space at all, else `None`.
    pub fn best_point(&self, scan: &ScanData, needed_peer_id: usize) -> Option<(&LocatorPoint, f64)> {
        if !self.knows_peer(needed_peer_id) {
            return None;
        }

        let mut penalty: i64 = 0;
        for (&peer_id, value) in scan {
            if !self.peer_ids.contains(&peer_id) {
                if let Some(rssi) = value.rssi {
                    penalty += (rssi as i64 - NO_SIGNAL).pow(2);
                }
            }
        }

        let shared: Vec<(usize, i64)> = scan
            .iter()
            .filter_map(|(&peer_id, value)| {
                let idx = *self.peer_index.get(&peer_id)?;
                Some((idx, value.rssi? as i64))
        })
            .collect();

        let mut best: Option<(usize, f64)> = None;
        for (point_idx, row) in self.levels.iter().enumerate() {
            let needed_col = self.peer_index[&needed_peer_id];
            if row[needed_col] <= 0 {
                continue;
            }
            let score = shared.iter().map(|&(col, rssi)| (row[col] - rssi).pow(2)).sum::<i64>() + penalty;
            let score = score as f64 / scan.len().max(1) as f64;
            if best.map(|(_, b)| score < b).unwrap_or(true) {
                best = Some((point_idx, score));
            }
        }

        best.map(|(idx, score)| (&self.points[idx], score))
    }
}

/// Runs `Space::best_point` over every space: pick the `(space, point)`
/// with the lowest score.
pub fn nearest_fingerprint(
    spaces: &AHashMap<SpaceId, LocatorSpace>,
    scan: &ScanData,
    excluded: &AHashSet<SpaceId>,
) -> Option<(SpaceId, f64, f64, f64)> {
    let &needed_peer_id = scan.iter().max_by_key(|(_, v)| v.rssi.unwrap_or(i32::MIN))?.0;

    let mut best: Option<(SpaceId, &LocatorPoint, f64)> = None;
    for (&pk, space) in spaces {
        if excluded.contains(&pk) {
            continue;
        }
        if let Some((point, score)) = space.best_point(scan, needed_peer_id) {
            if best.as_ref().map(|(_, _, b)| score < *b).unwrap_or(true) {
                best = Some((pk, point, score));
            }
        }
    }

    best.map(|(pk, point, score)| (pk, point.x, point.y, score))
}

/// Weighted centroid within the space of the strongest anchored peer.
pub fn weighted_centroid(peers: &[LocatorPeer], scan: &ScanData) -> Option<(SpaceId, f64, f64)> {
    let anchored: Vec<(usize, i32)> = scan
        .iter()
        .filter(|(&peer_id, _)| peers[peer_id].space_id.is_some())
        .filter_map(|(&peer_id, value)| value.rssi.map(|rssi| (peer_id, rssi)))
        .collect();

    let &(best_peer_id, _) = anchored.iter().max_by_key(|(_, rssi)| *rssi)?;
    let space_id = peers[best_peer_id].space_id?;

    let mut in_space: Vec<(usize, i32)> = anchored
        .into_iter()
        .filter(|&(peer_id, _)| peers[peer_id].space_id == Some(space_id))
        .collect();
    in_space.sort_by(|a, b| b.1.cmp(&a.1));

    let mut seen_xyz = AHashSet::default();
    let mut deduped = Vec::new();
    for (peer_id, rssi) in in_space {
        if let Some(xyz) = peers[peer_id].xyz {
            if !seen_xyz.insert(xyz) {
                continue;
            }
            deduped.push((peer_id, rssi, xyz));
        }
        if deduped.len() == 3 {
            break;
        }
    }

    let total_weight: f64 = deduped.iter().map(|&(_, rssi, _)| (rssi + 90).max(0) as f64).sum();
    if total_weight == 0.0 {
        return None; // caller falls back to the space's representative point
    }

    let mut x = 0.0;
    let mut y = 0.0;
    for &(_, rssi, xyz) in &deduped {
        let weight = (rssi + 90).max(0) as f64 / total_weight;
        x += xyz.0 as f64 * weight;
        y += xyz.1 as f64 * weight;
    }
    Some((space_id, x / 100.0, y / 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap as Map;

    fn scan(entries: &[(usize, i32)]) -> ScanData {
        entries
            .iter()
            .map(|&(id, rssi)| (id, crate::locator::types::ScanDataValue { rssi: Some(rssi),..Default::default() }))
            .collect()
    }

    #[test]
    fn nearest_fingerprint_picks_the_closest_recorded_point() {
        let mut points_a = Vec::new();
        points_a.push(LocatorPoint { x: 0.0, y: 0.0, values: scan(&[(0, -40), (1, -60)]) });
        points_a.push(LocatorPoint { x: 10.0, y: 10.0, values: scan(&[(0, -70), (1, -30)]) });
        let space = LocatorSpace::build(crate::model::SpaceId(1), points_a);

        let mut spaces = Map::default();
        spaces.insert(space.pk, space);

        let client_scan = scan(&[(0, -42), (1, -58)]);
        let (pk, x, y, _) = nearest_fingerprint(&spaces, &client_scan, &AHashSet::default()).unwrap();
        assert_eq!(pk, crate::model::SpaceId(1));
        assert_eq!((x, y), (0.0, 0.0));
    }

    #[test]
    fn weighted_centroid_averages_the_top_three_anchors() {
        let peers = vec![
            LocatorPeer {
                identifier: PeerIdentifier::Wifi("aa".into()),
                xyz: Some((0, 0, 0)),
                space_id: Some(crate::model::SpaceId(1)),
            },
            LocatorPeer {
                identifier: PeerIdentifier::Wifi("bb".into()),
                xyz: Some((1000, 0, 0)),
                space_id: Some(crate::model::SpaceId(1)),
            },
        ];
        let client_scan = scan(&[(0, -40), (1, -80)]);
        let (space_id, x, _y) = weighted_centroid(&peers, &client_scan).unwrap();
        assert_eq!(space_id, crate::model::SpaceId(1));
        assert!(x > 0.0 && x < 10.0, "weighted toward the stronger peer but not all the way: {x}");
    }
}
