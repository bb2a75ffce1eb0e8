//! Enhanced-coverage binning.
//!
//! Each point is spread over every bin whose centre lies within `radius`
//! (in bin units) of the point, with kernel weight
//! `max(0.1, 1 - (d / radius)^2)`. Kernel weights are normalized per point,
//! so the deposited total always equals the point's weight. A point with no
//! bin inside the radius falls back to its nearest (clamped) bin.

use crate::bins::BinRange;
use crate::error::{check_len, RasterResult};
use crate::grid::Raster;

/// Floor of the quadratic kernel.
const MIN_KERNEL_WEIGHT: f64 = 0.1;

/// Coverage radius for a level whose cells span `scale_factor` output bins
/// per side: the half-diagonal of the cell footprint, never below one bin.
pub fn coverage_radius(scale_factor: f64) -> f64 {
    (0.5 * scale_factor * std::f64::consts::SQRT_2).max(1.0)
}

#[inline]
fn kernel(distance: f64, radius: f64) -> f64 {
    let q = distance / radius;
    (1.0 - q * q).max(MIN_KERNEL_WEIGHT)
}

/// Reusable per-call buffer of `(i, j, kernel)` candidates.
struct Spreader<'a> {
    range_x: &'a BinRange,
    range_y: &'a BinRange,
    radius: f64,
    taps: Vec<(usize, usize, f64)>,
}

impl<'a> Spreader<'a> {
    fn new(range_x: &'a BinRange, range_y: &'a BinRange, radius: f64) -> Self {
        // Taps never extend past the grid, however coarse the level.
        let side = (2.0 * radius.ceil() + 1.0).min(usize::MAX as f64) as usize;
        let capacity = side.min(range_x.len) * side.min(range_y.len);
        Self {
            range_x,
            range_y,
            radius,
            taps: Vec::with_capacity(capacity),
        }
    }

    fn deposit(&mut self, x: f64, y: f64, value: f64, out: &mut Raster) {
        let fx = self.range_x.position_of(x);
        let fy = self.range_y.position_of(y);
        self.taps.clear();

        if fx.is_finite() && fy.is_finite() {
            let last_x = self.range_x.len as f64 - 1.0;
            let last_y = self.range_y.len as f64 - 1.0;
            let i_lo = (fx - self.radius).ceil().max(0.0);
            let i_hi = (fx + self.radius).floor().min(last_x);
            let j_lo = (fy - self.radius).ceil().max(0.0);
            let j_hi = (fy + self.radius).floor().min(last_y);

            if i_lo <= i_hi && j_lo <= j_hi {
                let mut total = 0.0;
                for i in (i_lo as usize)..=(i_hi as usize) {
                    for j in (j_lo as usize)..=(j_hi as usize) {
                        let d = (i as f64 - fx).hypot(j as f64 - fy);
                        if d <= self.radius {
                            let k = kernel(d, self.radius);
                            total += k;
                            self.taps.push((i, j, k));
                        }
                    }
                }
                if total > 0.0 {
                    for &(i, j, k) in &self.taps {
                        out.add_at(i, j, value * k / total);
                    }
                    return;
                }
            }
        }

        out.add_at(self.range_x.index_of(x), self.range_y.index_of(y), value);
    }
}

/// Weight-only histogram with neighbourhood spreading.
pub fn hist2d_weight_enhanced(
    x: &[f64],
    y: &[f64],
    weights: &[f64],
    range_x: &BinRange,
    range_y: &BinRange,
    radius: f64,
    out: &mut Raster,
) -> RasterResult<()> {
    check_len("y", x.len(), y.len())?;
    check_len("weights", x.len(), weights.len())?;
    out.check_shape((range_x.len, range_y.len))?;

    let mut spreader = Spreader::new(range_x, range_y, radius.max(f64::MIN_POSITIVE));
    for ((&xi, &yi), &w) in x.iter().zip(y).zip(weights) {
        spreader.deposit(xi, yi, w, out);
    }
    Ok(())
}

/// Data-weighted histogram with neighbourhood spreading.
#[allow(clippy::too_many_arguments)]
pub fn hist2d_data_enhanced(
    x: &[f64],
    y: &[f64],
    data: &[f64],
    weights: &[f64],
    range_x: &BinRange,
    range_y: &BinRange,
    radius: f64,
    out: &mut Raster,
) -> RasterResult<()> {
    check_len("y", x.len(), y.len())?;
    check_len("data", x.len(), data.len())?;
    check_len("weights", x.len(), weights.len())?;
    out.check_shape((range_x.len, range_y.len))?;

    let mut spreader = Spreader::new(range_x, range_y, radius.max(f64::MIN_POSITIVE));
    for (((&xi, &yi), &d), &w) in x.iter().zip(y).zip(data).zip(weights) {
        spreader.deposit(xi, yi, d * w, out);
    }
    Ok(())
}
