//! Dense/sparse selection by target resolution.
//!
//! Above [`SPARSE_THRESHOLD`] bins per side the histogram is first collected
//! in a [`SparseHistogram`] and then scattered into the output. The choice
//! only affects memory and speed: when `out` starts zeroed the result is
//! bit-identical to the dense primitive.

use crate::bins::BinRange;
use crate::error::RasterResult;
use crate::grid::Raster;
use crate::histogram::{hist2d_data, hist2d_weight};
use crate::sparse::{hist2d_data_sparse, hist2d_weight_sparse, SparseHistogram};
use serde::{Deserialize, Serialize};

/// Bins per side above which the sparse representation is used.
pub const SPARSE_THRESHOLD: usize = 2048;

/// Accumulator representation for one histogram pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistogramStrategy {
    Dense,
    Sparse,
}

impl HistogramStrategy {
    /// Sparse when either side exceeds `threshold`.
    pub fn select(nx: usize, ny: usize, threshold: usize) -> Self {
        if nx.max(ny) > threshold {
            HistogramStrategy::Sparse
        } else {
            HistogramStrategy::Dense
        }
    }
}

fn scatter(hist: &SparseHistogram, out: &mut Raster) -> RasterResult<()> {
    out.check_shape(hist.shape())?;
    for ((i, j), v) in hist.iter() {
        out.add_at(i, j, v);
    }
    Ok(())
}

/// Weight-only histogram with automatic representation choice.
pub fn adaptive_hist2d_weight(
    x: &[f64],
    y: &[f64],
    weights: &[f64],
    range_x: &BinRange,
    range_y: &BinRange,
    threshold: usize,
    out: &mut Raster,
) -> RasterResult<HistogramStrategy> {
    let strategy = HistogramStrategy::select(range_x.len, range_y.len, threshold);
    match strategy {
        HistogramStrategy::Dense => hist2d_weight(x, y, weights, range_x, range_y, out)?,
        HistogramStrategy::Sparse => {
            let hist = hist2d_weight_sparse(x, y, weights, range_x, range_y)?;
            tracing::trace!(occupied = hist.occupied(), "sparse weight histogram");
            scatter(&hist, out)?;
        }
    }
    Ok(strategy)
}

/// Data-weighted histogram with automatic representation choice.
#[allow(clippy::too_many_arguments)]
pub fn adaptive_hist2d_data(
    x: &[f64],
    y: &[f64],
    data: &[f64],
    weights: &[f64],
    range_x: &BinRange,
    range_y: &BinRange,
    threshold: usize,
    out: &mut Raster,
) -> RasterResult<HistogramStrategy> {
    let strategy = HistogramStrategy::select(range_x.len, range_y.len, threshold);
    match strategy {
        HistogramStrategy::Dense => hist2d_data(x, y, data, weights, range_x, range_y, out)?,
        HistogramStrategy::Sparse => {
            let hist = hist2d_data_sparse(x, y, data, weights, range_x, range_y)?;
            tracing::trace!(occupied = hist.occupied(), "sparse data histogram");
            scatter(&hist, out)?;
        }
    }
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select() {
        assert_eq!(HistogramStrategy::select(2048, 2048, SPARSE_THRESHOLD), HistogramStrategy::Dense);
        assert_eq!(HistogramStrategy::select(2049, 16, SPARSE_THRESHOLD), HistogramStrategy::Sparse);
        assert_eq!(HistogramStrategy::select(16, 4096, SPARSE_THRESHOLD), HistogramStrategy::Sparse);
        assert_eq!(HistogramStrategy::select(100, 100, 64), HistogramStrategy::Sparse);
    }

    #[test]
    fn test_both_paths_agree_with_low_threshold() {
        let rx = BinRange::unit(1, 32).unwrap();
        let ry = BinRange::unit(1, 16).unwrap();
        let x: Vec<f64> = (0..200).map(|i| (i % 37) as f64 * 0.9).collect();
        let y: Vec<f64> = (0..200).map(|i| (i % 19) as f64 * 0.85).collect();
        let w: Vec<f64> = (0..200).map(|i| 0.1 + (i % 7) as f64).collect();
        let d: Vec<f64> = (0..200).map(|i| (i as f64).sin()).collect();

        let mut dense = Raster::zeros(32, 16);
        let mut sparse = Raster::zeros(32, 16);
        assert_eq!(
            adaptive_hist2d_weight(&x, &y, &w, &rx, &ry, 1024, &mut dense).unwrap(),
            HistogramStrategy::Dense
        );
        assert_eq!(
            adaptive_hist2d_weight(&x, &y, &w, &rx, &ry, 8, &mut sparse).unwrap(),
            HistogramStrategy::Sparse
        );
        assert_eq!(dense, sparse);

        let mut dense = Raster::zeros(32, 16);
        let mut sparse = Raster::zeros(32, 16);
        adaptive_hist2d_data(&x, &y, &d, &w, &rx, &ry, 1024, &mut dense).unwrap();
        adaptive_hist2d_data(&x, &y, &d, &w, &rx, &ry, 8, &mut sparse).unwrap();
        assert_eq!(dense, sparse);
    }
}
