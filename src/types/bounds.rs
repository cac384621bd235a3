//! 2D geographic bounding box.

use std::fmt;

/// Geographic bounding box in lon/lat degrees.
///
/// Stores the spatial extent of a rectangular domain with
/// clear semantics for each boundary. The box may straddle the
/// antimeridian, in which case `x_max > 180` while `x_min < 180`
/// (e.g. `[170, 190]` covers 170°E to 170°W).
///
/// # Example
///
/// ```
/// use coastprep::types::Bbox;
///
/// // Western Atlantic domain
/// let bbox = Bbox::new(-80.0, -70.0, 30.0, 40.0);
///
/// assert_eq!(bbox.width(), 10.0);
/// assert_eq!(bbox.height(), 10.0);
/// assert_eq!(bbox.lower_left(), (-80.0, 30.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bbox {
    /// Minimum x-coordinate (western boundary, degrees east)
    pub x_min: f64,
    /// Maximum x-coordinate (eastern boundary, degrees east)
    pub x_max: f64,
    /// Minimum y-coordinate (southern boundary, degrees north)
    pub y_min: f64,
    /// Maximum y-coordinate (northern boundary, degrees north)
    pub y_max: f64,
}

impl Bbox {
    /// Create a new bounding box.
    ///
    /// # Panics
    ///
    /// Panics if `x_max <= x_min` or `y_max <= y_min`.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        assert!(
            x_max > x_min,
            "x_max ({}) must be greater than x_min ({})",
            x_max,
            x_min
        );
        assert!(
            y_max > y_min,
            "y_max ({}) must be greater than y_min ({})",
            y_max,
            y_min
        );

        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Box width (x_max - x_min).
    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Box height (y_max - y_min).
    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Center point (x, y).
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Lower-left corner (x_min, y_min).
    ///
    /// Used as the pipeline reference origin when no raster is supplied.
    #[inline]
    pub fn lower_left(&self) -> (f64, f64) {
        (self.x_min, self.y_min)
    }

    /// Check if a point is inside the box (inclusive).
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Whether the box straddles the ±180° meridian.
    ///
    /// True when the eastern edge extends past 180° while the western
    /// edge is still west of it.
    #[inline]
    pub fn crosses_antimeridian(&self) -> bool {
        self.x_max > 180.0 && self.x_min < 180.0
    }

    /// Return bounds as tuple (x_min, x_max, y_min, y_max).
    #[inline]
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.x_min, self.x_max, self.y_min, self.y_max)
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lon [{:.4}, {:.4}], lat [{:.4}, {:.4}]",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_creation() {
        let b = Bbox::new(-80.0, -70.0, 30.0, 40.0);
        assert_eq!(b.x_min, -80.0);
        assert_eq!(b.x_max, -70.0);
        assert_eq!(b.y_min, 30.0);
        assert_eq!(b.y_max, 40.0);
    }

    #[test]
    fn test_dimensions() {
        let b = Bbox::new(0.0, 10.0, 0.0, 5.0);
        assert_eq!(b.width(), 10.0);
        assert_eq!(b.height(), 5.0);
        assert_eq!(b.center(), (5.0, 2.5));
        assert_eq!(b.lower_left(), (0.0, 0.0));
    }

    #[test]
    fn test_contains() {
        let b = Bbox::new(0.0, 10.0, 0.0, 5.0);
        assert!(b.contains(5.0, 2.5));
        assert!(b.contains(0.0, 0.0));
        assert!(b.contains(10.0, 5.0));
        assert!(!b.contains(-0.1, 2.5));
        assert!(!b.contains(5.0, 5.1));
    }

    #[test]
    fn test_antimeridian_detection() {
        let wrapped = Bbox::new(170.0, 190.0, -10.0, 10.0);
        assert!(wrapped.crosses_antimeridian());

        let plain = Bbox::new(-80.0, -70.0, 30.0, 40.0);
        assert!(!plain.crosses_antimeridian());
    }

    #[test]
    #[should_panic(expected = "x_max")]
    fn test_invalid_x() {
        Bbox::new(10.0, 0.0, 0.0, 5.0);
    }

    #[test]
    #[should_panic(expected = "y_max")]
    fn test_invalid_y() {
        Bbox::new(0.0, 10.0, 5.0, 0.0);
    }
}
