//! Shoreline boundary processing.
//!
//! Everything between raw boundary input and a mesh-ready shoreline:
//! sources ([`BoundarySource`] adapters), classification into
//! outer/mainland/inner rings, the planar graph + BFS machinery,
//! consistency checking and closure repair, and weir expansion.

mod classify;
mod pslg;
mod repair;
mod source;
mod weir;

pub use classify::{classify, ClassifiedShoreline, ClassifierParams, DEFAULT_SMOOTHING_WINDOW};
pub use pslg::{ConnectivityPartition, Pslg};
pub use repair::{check_consistency, close, select_seed, RepairError};
pub use source::{
    source_extent, BoundaryError, BoundarySource, RawBoundary, RawPointsSource, RingKind,
    ShapefileSource,
};
pub use weir::{expand_all, OffsetWeirGenerator, WeirFeature, WeirGenerator, WeirGeometry};
