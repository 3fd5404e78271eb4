use geo::{LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};

use super::{AccessRestrictionId, LevelId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpaceId(pub u32);

/// An accessible polygon on exactly one level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    pub level: LevelId,
    pub geometry: MultiPolygon<f64>,
    /// If set, this space is clipped against the union of its level's
    /// buildings (Phase A step 2).
    pub outside: bool,
    pub columns: Vec<Column>,
    pub holes: Vec<Hole>,
    pub obstacles: Vec<Obstacle>,
    pub lineobstacles: Vec<LineObstacle>,
    pub stairs: Vec<Stair>,
    pub ramps: Vec<Ramp>,
    pub altitudemarkers: Vec<AltitudeMarker>,
    pub areas: Vec<Area>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(pub u32);

/// A non-accessible polygon inside a space; subtracted from the space's
/// accessible area unless it carries an access restriction, in which case
/// it is left accessible-but-gated (Phase A step 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub geometry: MultiPolygon<f64>,
    pub access_restriction: Option<AccessRestrictionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HoleId(pub u32);

/// A gap in the space's floor, always subtracted from the accessible area
/// (and the channel through which a level below shows through).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hole {
    pub id: HoleId,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

/// A polygonal obstacle with a height and an altitude offset from the
/// floor it sits on. `altitude == 0.0` obstacles are "on-floor" and get
/// absorbed into the floor's altitude area during Phase A/C; non-zero
/// obstacles are raised and handled in Phase G.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub geometry: MultiPolygon<f64>,
    pub height: f64,
    pub altitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineObstacleId(pub u32);

/// A linestring obstacle widened by `width` into a polygon at build time
/// ( `buffered_geometry`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineObstacle {
    pub id: LineObstacleId,
    pub geometry: LineString<f64>,
    pub width: f64,
    pub height: f64,
    pub altitude: f64,
}

impl LineObstacle {
    /// Widen this line obstacle into the polygon used for altitude-area
    /// cutting (: `buffered_geometry(line, width, cap=FLAT, join=MITRE)`).
    pub fn buffered_geometry(&self) -> MultiPolygon<f64> {
        crate::geom::buffered_geometry(&self.geometry, self.width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StairId(pub u32);

/// A cut line inducing an altitude-area boundary (Phase B).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stair {
    pub id: StairId,
    pub geometry: LineString<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RampId(pub u32);

/// A polygon cut away in Phase B and reconstructed in Phase F once its
/// boundary altitudes are known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ramp {
    pub id: RampId,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AltitudeMarkerId(pub u32);

/// A point carrying a known ground altitude; anchors whichever accessible
/// area it falls inside (Phase A step 4, Phase D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AltitudeMarker {
    pub id: AltitudeMarkerId,
    pub point: Point<f64>,
    pub altitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaId(pub u32);

/// A subset polygon of a space with no altitude-pipeline role of its own;
/// carried through for render-time attribution (e.g. colored sub-regions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub geometry: Polygon<f64>,
}
