//! Raster bathymetry: sources, windowed loading, interpolation and
//! iso-contour extraction.
//!
//! The flow is source → window → interpolant: a [`RasterSource`] serves
//! axes and windowed reads, [`load_window`] normalizes a sub-grid into a
//! canonical [`RasterGrid`], and [`BathyInterpolant`] turns that grid
//! into a continuous height field. [`trace_iso_contour`] walks a grid at
//! a fixed level to recover shoreline-like rings.

mod contour;
mod geotiff;
mod interpolant;
mod source;
mod window;

pub use contour::trace_iso_contour;
pub use geotiff::GeoTiffSource;
pub use interpolant::BathyInterpolant;
#[cfg(feature = "netcdf")]
pub use source::NetcdfSource;
pub use source::{MemoryRaster, RasterError, RasterSource, LAT_NAMES, LON_NAMES};
pub use window::{load_window, RasterGrid, INVALID_THRESHOLD};
