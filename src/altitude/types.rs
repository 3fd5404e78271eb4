use geo::{LineString, MultiPolygon, Point};

use crate::model::{LevelId, SpaceId};

/// A raised (non-zero altitude) obstacle carried through Phase B/G intact;
/// on-floor obstacles (`altitude == 0`) are folded into the floor geometry
/// in Phase A instead and never reach this type.
#[derive(Debug, Clone)]
pub struct RaisedObstacle {
    pub geometry: MultiPolygon<f64>,
    pub altitude: f64,
}

/// Everything Phase A extracts from one level's raw entities.
#[derive(Debug, Clone)]
pub struct CollectedLevel {
    pub level: LevelId,
    pub base_altitude: f64,
    /// Union of every accessible region on the level (spaces, clipped,
    /// plus doors), before cutting.
    pub accessible: MultiPolygon<f64>,
    /// Union of on-floor obstacles (`altitude == 0`), subtracted from
    /// `accessible` during classification in Phase B.
    pub onfloor_obstacles: MultiPolygon<f64>,
    pub raised_obstacles: Vec<RaisedObstacle>,
    pub ramps: Vec<MultiPolygon<f64>>,
    pub stairs: Vec<LineString<f64>>,
    /// Markers admitted in Phase A (inside some space's accessible area).
    pub markers: Vec<(Point<f64>, f64)>,
    /// Each space's own clipped area, kept alongside the unioned
    /// `accessible` geometry so later phases can attribute a cut piece back
    /// to the space it mostly came from.
    pub space_areas: Vec<(SpaceId, MultiPolygon<f64>)>,
}
