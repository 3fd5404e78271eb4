use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use super::LevelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

/// The indoor envelope of a level. Spaces marked `outside` are clipped
/// against the union of their level's buildings (Phase A).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub level: LevelId,
    pub geometry: MultiPolygon<f64>,
}
