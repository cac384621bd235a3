//! GeoTIFF raster source.
//!
//! Decodes a single-band GeoTIFF and serves it through [`RasterSource`].
//! Georeferencing comes from the ModelPixelScale (tag 33550) and
//! ModelTiepoint (tag 33922) tags; axes are pixel centers. Uses the pure
//! Rust `tiff` crate, so no system libraries are required.

use std::fs::File;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use super::source::{RasterError, RasterSource, LAT_NAMES, LON_NAMES};

/// GeoTIFF-backed raster source.
///
/// The whole band is decoded at load time; windowed reads are served
/// from memory. The latitude axis is descending, as stored in the file —
/// the window loader normalizes orientation.
pub struct GeoTiffSource {
    /// Longitude axis (pixel centers, ascending)
    x: Vec<f64>,
    /// Latitude axis (pixel centers, descending)
    y: Vec<f64>,
    /// Heights in row-major file order (`rows[j][i]`, row 0 = northernmost)
    rows: Vec<Vec<f64>>,
}

impl GeoTiffSource {
    /// Open a GeoTIFF file as a raster source.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        let file = File::open(&path)?;
        let mut decoder = Decoder::new(file)?;

        let (width, height) = decoder.dimensions()?;
        let width = width as usize;
        let height = height as usize;

        // ModelTiepoint format: [I, J, K, X, Y, Z]
        // ModelPixelScale format: [ScaleX, ScaleY, ScaleZ]
        let scale = decoder
            .get_tag_f64_vec(Tag::Unknown(33550))
            .map_err(|_| RasterError::MissingVariable("ModelPixelScale".to_string()))?;
        let tiepoint = decoder
            .get_tag_f64_vec(Tag::Unknown(33922))
            .map_err(|_| RasterError::MissingVariable("ModelTiepoint".to_string()))?;

        if tiepoint.len() < 6 || scale.len() < 2 {
            return Err(RasterError::InvalidGrid(
                "truncated GeoTIFF geotransform tags".to_string(),
            ));
        }

        let origin_x = tiepoint[3];
        let origin_y = tiepoint[4];
        let pixel_w = scale[0];
        let pixel_h = scale[1];

        let x: Vec<f64> = (0..width)
            .map(|i| origin_x + (i as f64 + 0.5) * pixel_w)
            .collect();
        let y: Vec<f64> = (0..height)
            .map(|j| origin_y - (j as f64 + 0.5) * pixel_h)
            .collect();

        let flat: Vec<f64> = match decoder.read_image()? {
            DecodingResult::U8(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::U16(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::U32(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::I8(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::I16(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::I32(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::F32(data) => data.into_iter().map(|v| v as f64).collect(),
            DecodingResult::F64(data) => data,
        };

        if flat.len() < width * height {
            return Err(RasterError::InvalidGrid(format!(
                "decoded {} samples for a {width}x{height} image",
                flat.len()
            )));
        }

        let rows: Vec<Vec<f64>> = (0..height)
            .map(|j| flat[j * width..(j + 1) * width].to_vec())
            .collect();

        Ok(Self { x, y, rows })
    }
}

impl RasterSource for GeoTiffSource {
    fn axis(&self, names: &[&str]) -> Result<Vec<f64>, RasterError> {
        // TIFF axes are positional; any recognized lon/lat alias resolves.
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
        Ok("band1".to_string())
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
        Ok((x0..x1)
            .map(|i| (y0..y1).map(|j| self.rows[j][i]).collect())
            .collect())
    }
}
