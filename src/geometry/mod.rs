//! Boundary geometry: rings, bounding regions and resampling kernels.
//!
//! This module provides:
//! - **Rings**: explicit multi-ring polyline collections replacing
//!   sentinel-delimited point arrays
//! - **Bounding region**: canonical bbox + closed clockwise boundary
//!   polygon ("boubox"), derivable from a box, a polygon or raster axes
//! - **Resampling kernels**: uniform arc-length resampling, moving-average
//!   smoothing, and density-aware coarsening

mod region;
mod resample;
mod rings;

pub use region::{bbox_of, BoundingRegion, RegionError};
pub use resample::{
    coarsen_collection, coarsen_ring, haversine_m, resample_collection, resample_ring,
    smooth_collection, smooth_ring, spacing_in_degrees,
};
pub use rings::{Ring, RingCollection};
