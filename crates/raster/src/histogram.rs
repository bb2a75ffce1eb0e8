//! Dense 2D histogram primitives.
//!
//! Both functions add into a caller-supplied raster of shape
//! `(range_x.len, range_y.len)`; they never zero it first.

use crate::bins::BinRange;
use crate::error::{check_len, RasterResult};
use crate::grid::Raster;

/// Accumulate `weights[i]` into the bin containing `(x[i], y[i])`.
pub fn hist2d_weight(
    x: &[f64],
    y: &[f64],
    weights: &[f64],
    range_x: &BinRange,
    range_y: &BinRange,
    out: &mut Raster,
) -> RasterResult<()> {
    check_len("y", x.len(), y.len())?;
    check_len("weights", x.len(), weights.len())?;
    out.check_shape((range_x.len, range_y.len))?;

    for ((&xi, &yi), &w) in x.iter().zip(y).zip(weights) {
        out.add_at(range_x.index_of(xi), range_y.index_of(yi), w);
    }
    Ok(())
}

/// Accumulate `data[i] * weights[i]` into the bin containing `(x[i], y[i])`.
///
/// Dividing the result by the matching [`hist2d_weight`] raster gives the
/// weighted mean of `data` per bin.
pub fn hist2d_data(
    x: &[f64],
    y: &[f64],
    data: &[f64],
    weights: &[f64],
    range_x: &BinRange,
    range_y: &BinRange,
    out: &mut Raster,
) -> RasterResult<()> {
    check_len("y", x.len(), y.len())?;
    check_len("data", x.len(), data.len())?;
    check_len("weights", x.len(), weights.len())?;
    out.check_shape((range_x.len, range_y.len))?;

    for (((&xi, &yi), &d), &w) in x.iter().zip(y).zip(data).zip(weights) {
        out.add_at(range_x.index_of(xi), range_y.index_of(yi), d * w);
    }
    Ok(())
}
