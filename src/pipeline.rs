//! Geodata pipeline: validated configuration in, processed geodata out.
//!
//! [`GeodataConfig`] gathers the region extent, optional shoreline and
//! raster sources, weirs and tuning knobs, validates them once, and
//! [`Geodata::build`] runs the pipeline: region derivation, raster
//! windowing, shoreline classification, consistency checking and weir
//! expansion. Closure repair and iso-contour extraction are follow-up
//! operations on the built value; contour extraction feeds back through
//! the same factory and returns a brand-new `Geodata`.
//!
//! # Example
//!
//! ```
//! use coastprep::pipeline::{Geodata, GeodataConfig};
//! use coastprep::types::Bbox;
//!
//! let config = GeodataConfig::new(500.0).with_bbox(Bbox::new(-80.0, -70.0, 30.0, 40.0));
//! let geodata = Geodata::build(config).unwrap();
//! assert_eq!(geodata.shoreline.outer.rings[0].len(), 5);
//! assert_eq!(geodata.origin, (-80.0, 30.0));
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::boundary::{
    check_consistency, classify, close, expand_all, select_seed, BoundaryError, BoundarySource,
    ClassifiedShoreline, ClassifierParams, OffsetWeirGenerator, RawBoundary, RawPointsSource,
    RepairError, RingKind, WeirFeature, WeirGenerator, WeirGeometry, DEFAULT_SMOOTHING_WINDOW,
};
use crate::geometry::{resample_collection, BoundingRegion, RegionError, RingCollection};
use crate::raster::{load_window, trace_iso_contour, BathyInterpolant, RasterError, RasterSource};
use crate::types::Bbox;

/// Error type for the geodata pipeline.
#[derive(Debug, Error)]
pub enum GeodataError {
    /// No bbox, polygon, raster or boundary source to derive an extent from
    #[error("no spatial extent: provide a bbox, a polygon, a raster or a boundary source")]
    MissingExtent,

    /// Minimum edge length unset, zero or negative
    #[error("minimum edge length must be positive, got {0}")]
    InvalidEdgeLength(f64),

    /// Iso-contour extraction without a raster
    #[error("iso-contour extraction requires a bathymetry raster")]
    RasterRequired,

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error(transparent)]
    Repair(#[from] RepairError),

    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Pipeline configuration, validated once at build time.
///
/// Exactly one of bbox, polygon, raster or boundary source must pin the
/// spatial extent (checked in that order); everything else is optional.
pub struct GeodataConfig {
    min_edge_length: f64,
    bbox: Option<Bbox>,
    polygon: Option<Vec<(f64, f64)>>,
    shoreline: Option<Arc<dyn BoundarySource>>,
    raster: Option<Arc<dyn RasterSource>>,
    backup_raster: Option<Arc<dyn RasterSource>>,
    weirs: Vec<WeirFeature>,
    weir_generator: Arc<dyn WeirGenerator>,
    spacing_ratio: f64,
    smoothing_window: usize,
    floodplain: bool,
    seed: Option<(f64, f64)>,
}

impl Clone for GeodataConfig {
    fn clone(&self) -> Self {
        Self {
            min_edge_length: self.min_edge_length,
            bbox: self.bbox,
            polygon: self.polygon.clone(),
            shoreline: self.shoreline.clone(),
            raster: self.raster.clone(),
            backup_raster: self.backup_raster.clone(),
            weirs: self.weirs.clone(),
            weir_generator: self.weir_generator.clone(),
            spacing_ratio: self.spacing_ratio,
            smoothing_window: self.smoothing_window,
            floodplain: self.floodplain,
            seed: self.seed,
        }
    }
}

impl GeodataConfig {
    /// Configuration with the given minimum mesh edge length in meters.
    pub fn new(min_edge_length: f64) -> Self {
        Self {
            min_edge_length,
            bbox: None,
            polygon: None,
            shoreline: None,
            raster: None,
            backup_raster: None,
            weirs: Vec::new(),
            weir_generator: Arc::new(OffsetWeirGenerator),
            spacing_ratio: 2.0,
            smoothing_window: 0,
            floodplain: false,
            seed: None,
        }
    }

    pub fn with_bbox(mut self, bbox: Bbox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Arbitrary closed region polygon; the trailing closure point is
    /// optional.
    pub fn with_polygon(mut self, polygon: Vec<(f64, f64)>) -> Self {
        self.polygon = Some(polygon);
        self
    }

    pub fn with_shoreline(mut self, source: Arc<dyn BoundarySource>) -> Self {
        self.shoreline = Some(source);
        self
    }

    pub fn with_raster(mut self, source: Arc<dyn RasterSource>) -> Self {
        self.raster = Some(source);
        self
    }

    /// Coarser raster used only to repair invalid cells of the primary.
    pub fn with_backup_raster(mut self, source: Arc<dyn RasterSource>) -> Self {
        self.backup_raster = Some(source);
        self
    }

    pub fn with_weirs(mut self, weirs: Vec<WeirFeature>) -> Self {
        self.weirs = weirs;
        self
    }

    pub fn with_weir_generator(mut self, generator: Arc<dyn WeirGenerator>) -> Self {
        self.weir_generator = generator;
        self
    }

    /// Boundary points per minimum edge (default 2).
    pub fn with_spacing_ratio(mut self, ratio: f64) -> Self {
        self.spacing_ratio = ratio;
        self
    }

    /// Moving-average window for shoreline smoothing. `0` selects the
    /// default window of [`DEFAULT_SMOOTHING_WINDOW`] points; `1`
    /// disables smoothing.
    pub fn with_smoothing_window(mut self, window: usize) -> Self {
        self.smoothing_window = window;
        self
    }

    /// Floodplain domain: land is the meshed side, inverting the
    /// consistency verdict.
    pub fn with_floodplain(mut self, floodplain: bool) -> Self {
        self.floodplain = floodplain;
        self
    }

    /// Explicit open-water seed for closure repair, overriding
    /// bathymetry-derived selection.
    pub fn with_seed(mut self, seed: (f64, f64)) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<(), GeodataError> {
        if !(self.min_edge_length > 0.0) {
            return Err(GeodataError::InvalidEdgeLength(self.min_edge_length));
        }
        if self.bbox.is_none()
            && self.polygon.is_none()
            && self.raster.is_none()
            && self.shoreline.is_none()
        {
            return Err(GeodataError::MissingExtent);
        }
        Ok(())
    }

    fn classifier_params(&self) -> ClassifierParams {
        let smoothing_window = if self.smoothing_window == 0 {
            DEFAULT_SMOOTHING_WINDOW
        } else {
            self.smoothing_window
        };
        ClassifierParams {
            min_edge_length: self.min_edge_length,
            spacing_ratio: self.spacing_ratio,
            smoothing_window,
        }
    }

    /// Derive the bounding region in precedence order: bbox, polygon,
    /// raster axes, boundary-source extent.
    fn derive_region(&self) -> Result<BoundingRegion, GeodataError> {
        if let Some(bbox) = self.bbox {
            return Ok(BoundingRegion::from_bbox(bbox));
        }
        if let Some(polygon) = &self.polygon {
            return Ok(BoundingRegion::from_polygon(polygon)?);
        }
        if let Some(raster) = &self.raster {
            return Ok(BoundingRegion::from_raster(raster.as_ref())?);
        }
        if let Some(source) = &self.shoreline {
            let world = BoundingRegion::from_bbox(Bbox::new(-180.0, 180.0, -90.0, 90.0));
            let raw = source.load(&world)?;
            let bbox = crate::boundary::source_extent(&raw).ok_or(GeodataError::MissingExtent)?;
            return Ok(BoundingRegion::from_bbox(bbox));
        }
        Err(GeodataError::MissingExtent)
    }
}

/// Processed geodata: the classified shoreline, the bathymetry
/// interpolant and the expanded weir geometry for one region.
pub struct Geodata {
    pub region: BoundingRegion,
    pub shoreline: ClassifiedShoreline,
    pub bathy: Option<BathyInterpolant>,
    /// Reference origin: raster grid lower-left when a raster exists,
    /// bbox lower-left otherwise
    pub origin: (f64, f64),
    pub weirs: WeirGeometry,
    config: GeodataConfig,
}

// The retained configuration holds trait objects, so Debug is written out
// by hand over the data fields.
impl fmt::Debug for Geodata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Geodata")
            .field("region", &self.region)
            .field("shoreline", &self.shoreline)
            .field("bathy", &self.bathy.as_ref().map(|b| b.envelope()))
            .field("origin", &self.origin)
            .field("weir_points", &self.weirs.points.len())
            .finish_non_exhaustive()
    }
}

impl Geodata {
    /// Run the pipeline.
    pub fn build(config: GeodataConfig) -> Result<Self, GeodataError> {
        config.validate()?;
        let region = config.derive_region()?;

        let backup = match &config.backup_raster {
            Some(src) => {
                let grid = load_window(src.as_ref(), &region.bbox, None)?;
                Some(BathyInterpolant::new(grid))
            }
            None => None,
        };
        let bathy = match &config.raster {
            Some(src) => {
                let grid = load_window(src.as_ref(), &region.bbox, backup.as_ref())?;
                Some(BathyInterpolant::new(grid))
            }
            None => None,
        };

        let origin = match &bathy {
            Some(interp) => interp.origin(),
            None => region.bbox.lower_left(),
        };

        let raw = match &config.shoreline {
            Some(source) => source.load(&region)?,
            None => RawBoundary::default(),
        };

        let mut shoreline = classify(&raw, &region, &config.classifier_params());

        // The check compares classified membership against the raw rings;
        // with no mainland the outer boundary is synthetic and the
        // comparison would be meaningless.
        if raw.mainland.ring_count() > 0 {
            let mut reference = raw.mainland.clone();
            reference.append(raw.inner.clone());
            shoreline.inpoly_flip =
                check_consistency(&shoreline, &region, &reference, config.floodplain);
        } else if config.floodplain {
            shoreline.inpoly_flip = true;
        }

        let weirs = expand_all(&config.weirs, config.weir_generator.as_ref());

        // Each weir's bank loop is a faux island: it joins the inner
        // collection so membership tests and downstream meshing see it.
        for weir in &config.weirs {
            let ring = config.weir_generator.expand(weir).to_ring();
            if !ring.is_empty() {
                shoreline.inner.push(ring);
                shoreline.inner_kinds.push(RingKind::Weir);
            }
        }

        Ok(Self {
            region,
            shoreline,
            bathy,
            origin,
            weirs,
            config,
        })
    }

    /// Re-run the membership consistency check against an explicit
    /// reference coastline, updating the flip flag.
    pub fn check_consistency(&mut self, reference: &RingCollection) -> bool {
        self.shoreline.inpoly_flip = check_consistency(
            &self.shoreline,
            &self.region,
            reference,
            self.config.floodplain,
        );
        self.shoreline.inpoly_flip
    }

    /// Close the outer boundary around the connected component reachable
    /// from open water.
    ///
    /// The seed comes from the configuration when set, otherwise from
    /// bathymetry; with neither, closure cannot run.
    pub fn close(&mut self) -> Result<(), GeodataError> {
        let seed = match self.config.seed {
            Some(seed) => seed,
            None => match &self.bathy {
                Some(bathy) => select_seed(&self.region, bathy, self.config.min_edge_length)?,
                None => return Err(GeodataError::Repair(RepairError::SeedRequired)),
            },
        };
        close(
            &mut self.shoreline,
            &self.region,
            seed,
            self.config.min_edge_length,
        )?;
        Ok(())
    }

    /// Extract the iso-contour of the bathymetry at `level` and run it
    /// back through the pipeline as a shoreline, yielding a brand-new
    /// `Geodata`. `self` is never mutated.
    pub fn extract_contour(&self, level: f64) -> Result<Geodata, GeodataError> {
        let raster = self
            .config
            .raster
            .as_ref()
            .ok_or(GeodataError::RasterRequired)?;

        let grid = load_window(raster.as_ref(), &self.region.bbox, None)?;
        let contour = trace_iso_contour(&grid, level);
        let spacing = self.config.classifier_params().target_spacing() / 2.0;
        let resampled = resample_collection(&contour, spacing);

        let config = self
            .config
            .clone()
            .with_bbox(self.region.bbox)
            .with_shoreline(Arc::new(RawPointsSource::from_rings(resampled)));
        Geodata::build(config)
    }

    /// One-line counts for logs and reports.
    pub fn summary(&self) -> String {
        format!(
            "region {} | outer {} ring(s), mainland {}, inner {} | bathy {} | weir node(s) {} | flip {}",
            self.region.bbox,
            self.shoreline.outer.ring_count(),
            self.shoreline.mainland.ring_count(),
            self.shoreline.inner.ring_count(),
            if self.bathy.is_some() { "yes" } else { "no" },
            self.weirs.points.len(),
            self.shoreline.inpoly_flip,
        )
    }
}
