//! The map data model: entities authored by the editor (out of scope)
//! and the derivative records the Map Processing Core produces from them.

mod altitude_area;
mod building;
mod door;
mod job;
mod level;
mod map_update;
mod render_data;
mod space;
mod tag;

pub use altitude_area::{AltitudeArea, AltitudeAreaId};
pub use building::{Building, BuildingId};
pub use door::{Door, DoorId};
pub use job::{Job, JobStatus, JobType};
pub use level::{Level, LevelId};
pub use map_update::{MapUpdate, MapUpdateId, MapUpdateKind, UpdateTuple};
pub use render_data::{Extrusion, LevelGeometries, LevelRenderData, MeshFace, MeshVertex};
pub use space::{
    AltitudeMarker, AltitudeMarkerId, Area, AreaId, Column, ColumnId, Hole, HoleId, LineObstacle,
    LineObstacleId, Obstacle, ObstacleId, Ramp, RampId, Space, SpaceId, Stair, StairId,
};
pub use tag::{
    Ancestry, AncestryPath, FillAndBorderColor, LabelSettingsId, LocationId, LocationTag, Parentage, ParentageId,
    ThemeId,
};

/// An access-restriction tag id; zero-sized newtype shared by every entity
/// that can be gated behind a restriction (columns, location tags,...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct AccessRestrictionId(pub u32);
