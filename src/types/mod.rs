//! Core shared types.

mod bounds;

pub use bounds::Bbox;

/// Mean Earth radius in meters, used for great-circle arc lengths.
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Meters per degree of latitude on the mean sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS * std::f64::consts::PI / 180.0;
