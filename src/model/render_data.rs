use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use super::LevelId;

/// One vertex of the triangulated 3D mesh (step 5): position, the
/// altitude assigned by nearest-neighbor interpolation over altitude-area
/// anchor points, and the clear height above the floor at that point
/// (reduced where an on-floor obstacle covers it).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub x: f64,
    pub y: f64,
    pub altitude: f64,
    pub height: f64,
}

/// Triangle face, indices into the owning [`LevelGeometries`]'s `vertices`.
pub type MeshFace = [u32; 3];

/// A vertical polyhedron side: the ring extruded between `lower` and
/// `upper` ( step 5 — walls, doors, restricted-space masks, and
/// the wall base are each a set of these, not part of the floor mesh).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extrusion {
    pub ring: Vec<(f64, f64)>,
    pub lower: f64,
    pub upper: f64,
}

/// The cropped, triangulated geometry for one sublevel contributing to a
/// render level ( step 2-3: sublevels below the primary level are
/// cropped to the holes above them so lower floors show through).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelGeometries {
    pub level: LevelId,
    pub buildings: MultiPolygon<f64>,
    pub walls: MultiPolygon<f64>,
    pub doors: MultiPolygon<f64>,
    pub altitudeareas: MultiPolygon<f64>,
    pub heightareas: MultiPolygon<f64>,
    pub restricted_spaces_indoors: MultiPolygon<f64>,
    pub restricted_spaces_outdoors: MultiPolygon<f64>,
    pub vertices: Vec<MeshVertex>,
    pub faces: Vec<MeshFace>,
    pub wall_extrusions: Vec<Extrusion>,
    pub door_extrusions: Vec<Extrusion>,
    pub restricted_indoor_extrusions: Vec<Extrusion>,
    /// Descends to `min_altitude - 0.7` so the building doesn't float above
    /// the levels below it.
    pub wall_base: Vec<Extrusion>,
}

/// One `(level, theme)` render artifact : everything a
/// client needs to draw one non-intermediate level and the sublevels
/// showing through its holes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelRenderData {
    pub base_altitude: f64,
    /// The lowest non-intermediate level whose holes are still relevant to
    /// this render level ( step 1: "all lower non-intermediate
    /// levels needed for hole show-through").
    pub lowest_important_level: LevelId,
    pub levels: Vec<LevelGeometries>,
    /// Region darkened in the client to indicate depth below the current
    /// level (accumulated from sublevel crop masks).
    pub darken_area: MultiPolygon<f64>,
}
