//! Geometric image transformations using perspective warps.
//!
//! The transforms follow the pixel centre convention: pixel `(u, v)` of a raster
//! covers the unit square `[u, u + 1) x [v, v + 1)` and its value sits at the
//! continuous position `(u + 0.5, v + 0.5)`.

mod perspective;

pub use perspective::{resample_perspective, warp_perspective, WarpConfig};
