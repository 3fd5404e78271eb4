use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use super::{LevelId, SpaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DoorId(pub u32);

/// A polygon connecting two spaces; participates in the walkable geometry
/// union ( Phase A step 5: "Include doors as accessible area").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Door {
    pub id: DoorId,
    pub level: LevelId,
    pub connects: (SpaceId, SpaceId),
    pub geometry: MultiPolygon<f64>,
}
