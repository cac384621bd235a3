//! Raster data sources.
//!
//! A [`RasterSource`] exposes 1-D coordinate axes by variable name and
//! windowed reads of a named 2-D height variable. Adapters are provided
//! for NetCDF DEMs (requires the `netcdf` feature), GeoTIFF files, and
//! in-memory grids for synthetic domains and tests.

use thiserror::Error;

/// Recognized longitude variable names, probed in order.
pub const LON_NAMES: &[&str] = &["lon", "longitude", "x", "lon_rho", "nav_lon"];

/// Recognized latitude variable names, probed in order.
pub const LAT_NAMES: &[&str] = &["lat", "latitude", "y", "lat_rho", "nav_lat"];

/// Error type for raster operations.
#[derive(Debug, Error)]
pub enum RasterError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// NetCDF library error
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    /// TIFF decoding error
    #[error("TIFF error: {0}")]
    Tiff(String),

    /// None of the candidate variable names resolved
    #[error("missing raster variable: {0}")]
    MissingVariable(String),

    /// Axis/matrix shape or monotonicity violation
    #[error("invalid raster grid: {0}")]
    InvalidGrid(String),
}

impl From<tiff::TiffError> for RasterError {
    fn from(e: tiff::TiffError) -> Self {
        RasterError::Tiff(e.to_string())
    }
}

/// A raster of heights on a rectilinear lon/lat grid.
///
/// Implementations serve 1-D axes by candidate variable name and 2-D
/// windowed reads indexed `[ix][iy]` (x-axis index first).
pub trait RasterSource {
    /// Read a coordinate axis, trying candidate names in order.
    ///
    /// Fails with [`RasterError::MissingVariable`] only after exhausting
    /// the candidate list.
    fn axis(&self, names: &[&str]) -> Result<Vec<f64>, RasterError>;

    /// Name of the height variable: the first variable with exactly two
    /// dimensions.
    fn height_variable(&self) -> Result<String, RasterError>;

    /// Windowed read of `var` over `[x0, x1) × [y0, y1)` axis indices,
    /// returned as `values[ix][iy]`.
    fn read_window(
        &self,
        var: &str,
        x0: usize,
        x1: usize,
        y0: usize,
        y1: usize,
    ) -> Result<Vec<Vec<f64>>, RasterError>;
}

// ============================================================================
// In-memory source
// ============================================================================

/// In-memory raster for synthetic grids and tests.
#[derive(Clone, Debug)]
pub struct MemoryRaster {
    /// Longitude axis (any monotonic order)
    pub x: Vec<f64>,
    /// Latitude axis (any monotonic order)
    pub y: Vec<f64>,
    /// Heights indexed `[ix][iy]`
    pub values: Vec<Vec<f64>>,
}

impl MemoryRaster {
    /// Create a raster from axes and a height function z(x, y).
    pub fn from_fn(x: Vec<f64>, y: Vec<f64>, z: impl Fn(f64, f64) -> f64) -> Self {
        let values = x
            .iter()
            .map(|&xv| y.iter().map(|&yv| z(xv, yv)).collect())
            .collect();
        Self { x, y, values }
    }

    /// Create a raster from axes and explicit `[ix][iy]` values.
    pub fn new(x: Vec<f64>, y: Vec<f64>, values: Vec<Vec<f64>>) -> Result<Self, RasterError> {
        if values.len() != x.len() || values.iter().any(|col| col.len() != y.len()) {
            return Err(RasterError::InvalidGrid(format!(
                "value matrix must be {}x{}",
                x.len(),
                y.len()
            )));
        }
        Ok(Self { x, y, values })
    }
}

impl RasterSource for MemoryRaster {
    fn axis(&self, names: &[&str]) -> Result<Vec<f64>, RasterError> {
        for &name in names {
            if LON_NAMES.contains(&name) {
                return Ok(self.x.clone());
            }
            if LAT_NAMES.contains(&name) {
                return Ok(self.y.clone());
            }
        }
        Err(RasterError::MissingVariable(names.join(" or ")))
    }

    fn height_variable(&self) -> Result<String, RasterError> {
        Ok("z".to_string())
    }

    fn read_window(
        &self,
        _var: &str,
        x0: usize,
        x1: usize,
        y0: usize,
        y1: usize,
    ) -> Result<Vec<Vec<f64>>, RasterError> {
        if x1 > self.x.len() || y1 > self.y.len() || x0 > x1 || y0 > y1 {
            return Err(RasterError::InvalidGrid(format!(
                "window [{x0}, {x1}) x [{y0}, {y1}) out of range"
            )));
        }
        Ok(self.values[x0..x1]
            .iter()
            .map(|col| col[y0..y1].to_vec())
            .collect())
    }
}

// ============================================================================
// NetCDF source
// ============================================================================

/// NetCDF DEM source.
///
/// Axis variables are located by candidate-name probing; the height
/// variable is the first one with exactly two dimensions. Dimension
/// order `(lat, lon)` and `(lon, lat)` are both handled.
#[cfg(feature = "netcdf")]
pub struct NetcdfSource {
    file: netcdf::File,
    lat_dim: Option<String>,
}

#[cfg(feature = "netcdf")]
impl NetcdfSource {
    /// Open a NetCDF file as a raster source.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, RasterError> {
        let file = netcdf::open(path)?;

        // Remember which dimension carries latitude so windowed reads can
        // be transposed into [ix][iy] order.
        let mut lat_dim = None;
        for &name in LAT_NAMES {
            if let Some(var) = file.variable(name) {
                if var.dimensions().len() == 1 {
                    lat_dim = Some(var.dimensions()[0].name());
                    break;
                }
            }
        }

        Ok(Self { file, lat_dim })
    }
}

#[cfg(feature = "netcdf")]
impl RasterSource for NetcdfSource {
    fn axis(&self, names: &[&str]) -> Result<Vec<f64>, RasterError> {
        for &name in names {
            if let Some(var) = self.file.variable(name) {
                if var.dimensions().len() == 1 {
                    let data: Vec<f64> = var.get_values(..)?;
                    return Ok(data);
                }
            }
        }
        Err(RasterError::MissingVariable(names.join(" or ")))
    }

    fn height_variable(&self) -> Result<String, RasterError> {
        for var in self.file.variables() {
            if var.dimensions().len() == 2 {
                return Ok(var.name());
            }
        }
        Err(RasterError::MissingVariable(
            "no 2-D raster variable found".to_string(),
        ))
    }

    fn read_window(
        &self,
        var: &str,
        x0: usize,
        x1: usize,
        y0: usize,
        y1: usize,
    ) -> Result<Vec<Vec<f64>>, RasterError> {
        let variable = self
            .file
            .variable(var)
            .ok_or_else(|| RasterError::MissingVariable(var.to_string()))?;

        let dims = variable.dimensions();
        if dims.len() != 2 {
            return Err(RasterError::InvalidGrid(format!(
                "variable {var} has {} dimensions, expected 2",
                dims.len()
            )));
        }

        // DEMs conventionally store (lat, lon); trust the detected
        // latitude dimension name, defaulting to lat-major.
        let lat_major = match &self.lat_dim {
            Some(lat) => &dims[0].name() == lat,
            None => true,
        };

        let nx = x1 - x0;
        let ny = y1 - y0;
        let mut out = vec![vec![0.0f64; ny]; nx];

        if lat_major {
            let flat: Vec<f64> = variable.get_values((y0..y1, x0..x1))?;
            for j in 0..ny {
                for i in 0..nx {
                    out[i][j] = flat[j * nx + i];
                }
            }
        } else {
            let flat: Vec<f64> = variable.get_values((x0..x1, y0..y1))?;
            for i in 0..nx {
                out[i].copy_from_slice(&flat[i * ny..(i + 1) * ny]);
            }
        }

        Ok(out)
    }
}
