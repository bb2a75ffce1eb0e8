//! Fixed-resolution 2D rasters for binning scattered point data.
//!
//! Implements the accumulation primitives used by the projection engine:
//! - Dense histograms (array-backed)
//! - Sparse histograms (map-backed, for very large rasters)
//! - Adaptive selection between the two
//! - Enhanced-coverage binning (weight spread over neighbouring bins)
//!
//! All primitives share the same direct coordinate-to-bin arithmetic, see
//! [`BinRange::index_of`]. Points outside the range are pinned to the edge
//! bins rather than dropped, so the total deposited weight always equals the
//! input weight.

pub mod adaptive;
pub mod bins;
pub mod coverage;
pub mod error;
pub mod histogram;
pub mod scratch;
pub mod sparse;

mod grid;

pub use adaptive::{adaptive_hist2d_data, adaptive_hist2d_weight, HistogramStrategy, SPARSE_THRESHOLD};
pub use bins::BinRange;
pub use coverage::{coverage_radius, hist2d_data_enhanced, hist2d_weight_enhanced};
pub use error::{RasterError, RasterResult};
pub use grid::Raster;
pub use histogram::{hist2d_data, hist2d_weight};
pub use scratch::{scratch_capacity, with_scratch_raster};
pub use sparse::{hist2d_data_sparse, hist2d_weight_sparse, SparseHistogram};
