//! # coastprep
//!
//! Geometric preprocessing for coastal ocean mesh generation.
//!
//! This crate turns raw geospatial inputs into a mesh-ready boundary
//! description and bathymetry sampler:
//! - Bounding regions (box, polygon or raster-derived, with the closed
//!   clockwise "boubox" polygon form)
//! - Shoreline classification into outer/mainland/inner rings, with
//!   resampling, smoothing and density-aware coarsening
//! - Connectivity repair: point-in-polygon consistency checking and
//!   BFS-based closure of the outer boundary around open water
//! - Windowed raster loading (NetCDF, GeoTIFF, in-memory) with
//!   antimeridian stitching and invalid-cell repair
//! - Bilinear bathymetry interpolation and iso-contour extraction
//!
//! The entry point is [`pipeline::GeodataConfig`] → [`pipeline::Geodata`].

pub mod boundary;
pub mod geometry;
pub mod pipeline;
pub mod raster;
pub mod types;

// Re-export main types for convenience
pub use boundary::{
    check_consistency, classify, expand_all, BoundaryError, BoundarySource, ClassifiedShoreline,
    ClassifierParams, ConnectivityPartition, OffsetWeirGenerator, Pslg, RawBoundary,
    RawPointsSource, RepairError, RingKind, ShapefileSource, WeirFeature, WeirGenerator,
    WeirGeometry, DEFAULT_SMOOTHING_WINDOW,
};
pub use geometry::{BoundingRegion, RegionError, Ring, RingCollection};
pub use pipeline::{Geodata, GeodataConfig, GeodataError};
#[cfg(feature = "netcdf")]
pub use raster::NetcdfSource;
pub use raster::{
    load_window, trace_iso_contour, BathyInterpolant, GeoTiffSource, MemoryRaster, RasterError,
    RasterGrid, RasterSource,
};
pub use types::Bbox;
