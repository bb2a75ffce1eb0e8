//! Map-backed histograms for very large rasters.
//!
//! Only occupied bins are stored. A [`SparseHistogram`] is owned by a single
//! task; concurrent writers each build their own and merge the dense results.

use crate::bins::BinRange;
use crate::error::{check_len, RasterResult};
use crate::grid::Raster;
use std::collections::HashMap;

/// Bin-index pair to accumulated value.
#[derive(Debug, Clone, Default)]
pub struct SparseHistogram {
    nx: usize,
    ny: usize,
    bins: HashMap<(usize, usize), f64>,
}

impl SparseHistogram {
    pub fn new(range_x: &BinRange, range_y: &BinRange) -> Self {
        Self {
            nx: range_x.len,
            ny: range_y.len,
            bins: HashMap::new(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Number of occupied bins.
    pub fn occupied(&self) -> usize {
        self.bins.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.bins.get(&(i, j)).copied().unwrap_or(0.0)
    }

    /// Occupied bins in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.bins.iter().map(|(&k, &v)| (k, v))
    }

    #[inline]
    fn add(&mut self, i: usize, j: usize, value: f64) {
        *self.bins.entry((i, j)).or_insert(0.0) += value;
    }

    /// Materialize as a zero-filled dense raster.
    pub fn to_dense(&self) -> Raster {
        let mut out = Raster::zeros(self.nx, self.ny);
        for (&(i, j), &v) in &self.bins {
            out.add_at(i, j, v);
        }
        out
    }

    /// Zero `out`, reshape it to this histogram and scatter the occupied bins.
    pub fn write_dense(&self, out: &mut Raster) {
        out.reset(self.nx, self.ny);
        for (&(i, j), &v) in &self.bins {
            out.add_at(i, j, v);
        }
    }
}

/// Sparse counterpart of [`crate::hist2d_weight`].
pub fn hist2d_weight_sparse(
    x: &[f64],
    y: &[f64],
    weights: &[f64],
    range_x: &BinRange,
    range_y: &BinRange,
) -> RasterResult<SparseHistogram> {
    check_len("y", x.len(), y.len())?;
    check_len("weights", x.len(), weights.len())?;

    let mut hist = SparseHistogram::new(range_x, range_y);
    for ((&xi, &yi), &w) in x.iter().zip(y).zip(weights) {
        hist.add(range_x.index_of(xi), range_y.index_of(yi), w);
    }
    Ok(hist)
}

/// Sparse counterpart of [`crate::hist2d_data`].
pub fn hist2d_data_sparse(
    x: &[f64],
    y: &[f64],
    data: &[f64],
    weights: &[f64],
    range_x: &BinRange,
    range_y: &BinRange,
) -> RasterResult<SparseHistogram> {
    check_len("y", x.len(), y.len())?;
    check_len("data", x.len(), data.len())?;
    check_len("weights", x.len(), weights.len())?;

    let mut hist = SparseHistogram::new(range_x, range_y);
    for (((&xi, &yi), &d), &w) in x.iter().zip(y).zip(data).zip(weights) {
        hist.add(range_x.index_of(xi), range_y.index_of(yi), d * w);
    }
    Ok(hist)
}
