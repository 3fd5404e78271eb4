use geo::{Coord, MultiPolygon};
use serde::{Deserialize, Serialize};

use super::LevelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AltitudeAreaId(pub u32);

/// A point on an altitude area's boundary with a known altitude, used to
/// interpolate the area's surface ( Phase F, ramps and the
/// nearest-distance fallback).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeAreaPoint {
    pub coordinates: Coord<f64>,
    pub altitude: f64,
}

/// Either the area is flat at one altitude, or its surface is defined by
/// a set of boundary points a renderer interpolates between (a ramp).
/// The original models this as two nullable fields on one row with the
/// invariant "exactly one is set"; an enum makes that invariant
/// unrepresentable-if-violated instead of merely documented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AltitudeSurface {
    Flat(f64),
    Interpolated(Vec<AltitudeAreaPoint>),
}

/// The unit of altitude assignment produced by the altitude pipeline
/// : a maximal region of one level with one [`AltitudeSurface`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltitudeArea {
    pub id: AltitudeAreaId,
    pub level: LevelId,
    pub geometry: MultiPolygon<f64>,
    pub surface: AltitudeSurface,
}

impl AltitudeArea {
    /// The representative altitude used for any caller that doesn't care
    /// about ramp interpolation (e.g. level render compositing).
    pub fn representative_altitude(&self) -> f64 {
        match &self.surface {
            AltitudeSurface::Flat(a) => *a,
            AltitudeSurface::Interpolated(points) => {
                let sum: f64 = points.iter().map(|p| p.altitude).sum();
                sum / points.len().max(1) as f64
            }
        }
    }
}
