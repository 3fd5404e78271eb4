use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::model::{LevelId, SpaceId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerIdentifier {
    Wifi(String),
    Dect(String),
    IBeacon { uuid: String, major: u16, minor: u16 },
}

/// A known beacon: a Wi-Fi AP, DECT base, or iBeacon, placed at `xyz`
/// (centimeters, stored as fixed integers so scores are reproducible
/// across builds) once it's been located in a space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorPeer {
    pub identifier: PeerIdentifier,
    pub xyz: Option<(i64, i64, i64)>,
    pub space_id: Option<SpaceId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanDataValue {
    pub rssi: Option<i32>,
    pub ibeacon_range: Option<f64>,
    pub distance: Option<f64>,
}

impl ScanDataValue {
    pub fn average(items: &[ScanDataValue]) -> Self {
        let rssi: Vec<i32> = items.iter().filter_map(|i| i.rssi).collect();
        let ibeacon_range: Vec<f64> = items.iter().filter_map(|i| i.ibeacon_range).collect();
        let distance: Vec<f64> = items.iter().filter_map(|i| i.distance).collect();
        ScanDataValue {
            rssi: (!rssi.is_empty()).then(|| rssi.iter().sum::<i32>() / rssi.len() as i32),
            ibeacon_range: (!ibeacon_range.is_empty())
                .then(|| ibeacon_range.iter().sum::<f64>() / ibeacon_range.len() as f64),
            distance: (!distance.is_empty()).then(|| distance.iter().sum::<f64>() / distance.len() as f64),
        }
    }
}

/// Peer id -> reading, for one scan.
pub type ScanData = AHashMap<usize, ScanDataValue>;

#[derive(Debug, Clone)]
pub struct LocatorPoint {
    pub x: f64,
    pub y: f64,
    pub values: ScanData,
}

/// A raw Wi-Fi scan result as reported by a client before it's resolved to
/// a peer id.
#[derive(Debug, Clone)]
pub struct WifiScanReading {
    pub ssid: String,
    pub bssid: String,
    pub ap_name: String,
    pub rssi: i32,
    pub distance: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IBeaconScanReading {
    pub uuid: String,
    pub major: u16,
    pub minor: u16,
    pub distance: f64,
}

/// The result of a `locate()` call.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedPosition {
    pub level: LevelId,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub score: Option<f64>,
}

/// `(rssi)²` sentinel for "this peer was not seen at all", chosen so a
/// missing peer scores as badly as one heard at -90 dBm.
pub const NO_SIGNAL: i64 = 8100;
