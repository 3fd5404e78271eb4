//! Geometry kernel (C1): polygon cutting, grid snapping, and the small
//! conversions the rest of the pipeline needs from `geo`'s boolean ops.
//!
//! Degenerate or empty results are returned as empty collections rather
//! than errors — callers must not assume a non-empty result.

mod buffer;
mod convert;
mod cut;
mod normalize;
mod precision;

pub use buffer::buffered_geometry;
pub use convert::{assert_multilinestring, assert_multipolygon};
pub use cut::cut_polygons_with_lines;
pub use normalize::snap_to_grid_and_fully_normalized;
pub use precision::calculate_precision;
