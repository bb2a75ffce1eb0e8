//! Per-level AMR processing.
//!
//! A cell at `level` spans `scale_factor = res / 2^level` output pixels per
//! side. Coarse cells are sampled on an `n x n` sub-grid across their
//! footprint (`n = ceil(scale_factor)`), every sample carrying the cell's full
//! weight, and the level's histograms are multiplied by `1 / n^2` before
//! merging. For whole-number scale factors this is the usual `1 / s^2` level
//! correction and the total deposited weight of every cell is preserved.

use crate::context::{AccumulationContext, WEIGHT_SLOT};
use crate::error::raster_error;
use crate::types::LevelSummary;
use amr_common::ProjectionResult;
use raster::{
    adaptive_hist2d_data, adaptive_hist2d_weight, coverage_radius, hist2d_data_enhanced,
    hist2d_weight_enhanced, with_scratch_raster, BinRange, Raster, RasterResult,
};
use rayon::prelude::*;
use tracing::{debug, trace};

/// Resolution mapping of one AMR level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelScale {
    pub level: u32,
    /// Output pixels per cell side.
    pub scale_factor: f64,
    /// Samples per cell side.
    pub subsamples: usize,
    /// Factor applied to the level's histograms.
    pub correction_factor: f64,
}

impl LevelScale {
    pub fn new(level: u32, resolution: usize) -> Self {
        let scale_factor = resolution as f64 / 2f64.powi(level as i32);
        let subsamples = if scale_factor > 1.0 {
            scale_factor.ceil() as usize
        } else {
            1
        };
        Self {
            level,
            scale_factor,
            subsamples,
            correction_factor: 1.0 / (subsamples * subsamples) as f64,
        }
    }

    /// Cell centre of a level-native grid coordinate on the output pixel axis.
    #[inline]
    pub fn rescale(&self, raw: i64) -> f64 {
        (raw as f64 - 0.5) * self.scale_factor + 0.5
    }

    /// Sample offsets from the cell centre along one axis.
    pub fn offsets(&self) -> Vec<f64> {
        let n = self.subsamples as f64;
        let step = self.scale_factor / n;
        (0..self.subsamples)
            .map(|k| (k as f64 + 0.5) * step - 0.5 * self.scale_factor)
            .collect()
    }
}

/// A histogrammed column, read per row.
#[derive(Debug, Clone, Copy)]
pub enum SlotColumn<'a> {
    Values(&'a [f64]),
    /// Second moment of a column.
    Squared(&'a [f64]),
}

impl SlotColumn<'_> {
    #[inline]
    pub fn at(&self, row: usize) -> f64 {
        match self {
            SlotColumn::Values(v) => v[row],
            SlotColumn::Squared(v) => v[row] * v[row],
        }
    }
}

/// Read-only inputs shared by every level of a call.
#[derive(Debug, Clone)]
pub struct LevelInputs<'a> {
    /// Grid coordinates along the horizontal plane axis.
    pub horizontal: &'a [i64],
    /// Grid coordinates along the vertical plane axis.
    pub vertical: &'a [i64],
    pub levels: &'a [u32],
    /// Rows taking part in the call (mask and slab applied).
    pub selected: &'a [bool],
    pub weights: &'a [f64],
    /// Data slots in accumulation order.
    pub slots: Vec<(String, SlotColumn<'a>)>,
    pub range_x: BinRange,
    pub range_y: BinRange,
    /// Pixels across the full box.
    pub resolution: usize,
    pub enhanced_coverage: bool,
    pub sparse_threshold: usize,
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Weight,
    Slot(usize),
}

/// Selected cells of one level, already on the output pixel axis.
struct LevelCells {
    rows: Vec<usize>,
    x: Vec<f64>,
    y: Vec<f64>,
    weights: Vec<f64>,
}

impl LevelCells {
    fn gather(inputs: &LevelInputs<'_>, scale: &LevelScale) -> Self {
        let rows: Vec<usize> = (0..inputs.levels.len())
            .filter(|&r| inputs.selected[r] && inputs.levels[r] == scale.level)
            .collect();
        let x = rows.iter().map(|&r| scale.rescale(inputs.horizontal[r])).collect();
        let y = rows.iter().map(|&r| scale.rescale(inputs.vertical[r])).collect();
        let weights = rows.iter().map(|&r| inputs.weights[r]).collect();
        Self {
            rows,
            x,
            y,
            weights,
        }
    }

    /// Call `f` once per footprint sample position with shifted coordinates.
    fn for_each_sample<F>(&self, scale: &LevelScale, mut f: F) -> RasterResult<()>
    where
        F: FnMut(&[f64], &[f64]) -> RasterResult<()>,
    {
        if scale.subsamples == 1 {
            return f(&self.x, &self.y);
        }
        let offsets = scale.offsets();
        let mut xs = vec![0.0; self.x.len()];
        let mut ys = vec![0.0; self.y.len()];
        for &dx in &offsets {
            for (s, &x) in xs.iter_mut().zip(&self.x) {
                *s = x + dx;
            }
            for &dy in &offsets {
                for (s, &y) in ys.iter_mut().zip(&self.y) {
                    *s = y + dy;
                }
                f(&xs, &ys)?;
            }
        }
        Ok(())
    }
}

fn deposit(
    ctx: &AccumulationContext,
    inputs: &LevelInputs<'_>,
    scale: &LevelScale,
    cells: &LevelCells,
    target: Target,
) -> ProjectionResult<()> {
    let (rx, ry) = (&inputs.range_x, &inputs.range_y);
    let (name, data): (&str, Option<Vec<f64>>) = match target {
        Target::Weight => (WEIGHT_SLOT, None),
        Target::Slot(k) => {
            let (name, column) = &inputs.slots[k];
            (name.as_str(), Some(cells.rows.iter().map(|&r| column.at(r)).collect()))
        }
    };
    let w = &cells.weights;

    with_scratch_raster(rx.len, ry.len, |scratch: &mut Raster| {
        let factor = if inputs.enhanced_coverage {
            let radius = coverage_radius(scale.scale_factor);
            let binned = match &data {
                None => hist2d_weight_enhanced(&cells.x, &cells.y, w, rx, ry, radius, scratch),
                Some(d) => {
                    hist2d_data_enhanced(&cells.x, &cells.y, d, w, rx, ry, radius, scratch)
                }
            };
            binned.map_err(|e| raster_error(name, e))?;
            1.0
        } else {
            let threshold = inputs.sparse_threshold;
            cells
                .for_each_sample(scale, |xs, ys| {
                    let strategy = match &data {
                        None => adaptive_hist2d_weight(xs, ys, w, rx, ry, threshold, scratch),
                        Some(d) => adaptive_hist2d_data(xs, ys, d, w, rx, ry, threshold, scratch),
                    };
                    strategy.map(|_| ())
                })
                .map_err(|e| raster_error(name, e))?;
            scale.correction_factor
        };

        match target {
            Target::Weight => ctx.merge_weight(scale.level, scratch, factor),
            Target::Slot(_) => ctx.merge_slot(scale.level, name, scratch, factor),
        }
    })
}

/// Bin every selected cell of `level` into the weight raster and all data
/// slots of `ctx`.
///
/// With `parallel_slots` the weight and slot histograms of this level run as
/// separate tasks on the current rayon pool. Levels without selected cells are
/// recorded as skipped.
pub fn process_level(
    ctx: &AccumulationContext,
    inputs: &LevelInputs<'_>,
    level: u32,
    parallel_slots: bool,
) -> ProjectionResult<LevelSummary> {
    let scale = LevelScale::new(level, inputs.resolution);
    let cells = LevelCells::gather(inputs, &scale);

    let summary = LevelSummary {
        level,
        cells: cells.rows.len(),
        scale_factor: scale.scale_factor,
        correction_factor: if inputs.enhanced_coverage {
            1.0
        } else {
            scale.correction_factor
        },
        skipped: cells.rows.is_empty(),
    };

    if summary.skipped {
        debug!(level = level, "no cells at level, skipping");
        ctx.record_level(summary.clone())?;
        return Ok(summary);
    }

    trace!(
        level = level,
        cells = summary.cells,
        scale_factor = scale.scale_factor,
        subsamples = scale.subsamples,
        "binning level"
    );

    let targets: Vec<Target> = std::iter::once(Target::Weight)
        .chain((0..inputs.slots.len()).map(Target::Slot))
        .collect();

    if parallel_slots {
        targets
            .par_iter()
            .try_for_each(|&t| deposit(ctx, inputs, &scale, &cells, t))?;
    } else {
        targets
            .iter()
            .try_for_each(|&t| deposit(ctx, inputs, &scale, &cells, t))?;
    }

    ctx.record_level(summary.clone())?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_scale() {
        let s = LevelScale::new(0, 4);
        assert_eq!(s.scale_factor, 4.0);
        assert_eq!(s.subsamples, 4);
        assert_eq!(s.correction_factor, 1.0 / 16.0);
        assert_eq!(s.offsets(), vec![-1.5, -0.5, 0.5, 1.5]);

        let s = LevelScale::new(1, 4);
        assert_eq!(s.correction_factor, 0.25);

        let s = LevelScale::new(3, 4);
        assert_eq!(s.scale_factor, 0.5);
        assert_eq!(s.subsamples, 1);
        assert_eq!(s.correction_factor, 1.0);
        assert_eq!(s.offsets(), vec![0.0]);
    }

    #[test]
    fn test_non_integer_scale_conserves_samples() {
        let s = LevelScale::new(2, 10);
        assert_eq!(s.scale_factor, 2.5);
        assert_eq!(s.subsamples, 3);
        assert!((s.correction_factor * 9.0 - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_rescale_formula() {
        // (raw - 0.5) / 2^level * res + 0.5
        let s = LevelScale::new(1, 4);
        assert_eq!(s.rescale(1), 1.5);
        assert_eq!(s.rescale(2), 3.5);
        let s = LevelScale::new(2, 4);
        assert_eq!(s.rescale(3), 3.0);
    }

    fn inputs<'a>(
        h: &'a [i64],
        v: &'a [i64],
        levels: &'a [u32],
        selected: &'a [bool],
        weights: &'a [f64],
        rho: &'a [f64],
    ) -> LevelInputs<'a> {
        LevelInputs {
            horizontal: h,
            vertical: v,
            levels,
            selected,
            weights,
            slots: vec![("rho".to_string(), SlotColumn::Values(rho))],
            range_x: BinRange::unit(1, 4).unwrap(),
            range_y: BinRange::unit(1, 4).unwrap(),
            resolution: 4,
            enhanced_coverage: false,
            sparse_threshold: 2048,
        }
    }

    #[test]
    fn test_process_level_spreads_coarse_cell() {
        let (h, v, l, sel, w, rho) = ([1], [1], [0], [true], [8.0], [2.0]);
        let inputs = inputs(&h, &v, &l, &sel, &w, &rho);
        let ctx = AccumulationContext::new((4, 4), ["rho"]);
        let summary = process_level(&ctx, &inputs, 0, false).unwrap();
        assert_eq!(summary.cells, 1);
        assert!(!summary.skipped);

        let done = ctx.finish().unwrap();
        assert!(done.weight.data().iter().all(|&x| x == 0.5));
        assert!(done.data["rho"].data().iter().all(|&x| x == 1.0));
    }

    #[test]
    fn test_process_level_skips_empty_level() {
        let (h, v, l, sel, w, rho) = ([1], [1], [0], [true], [8.0], [2.0]);
        let inputs = inputs(&h, &v, &l, &sel, &w, &rho);
        let ctx = AccumulationContext::new((4, 4), ["rho"]);
        let summary = process_level(&ctx, &inputs, 1, false).unwrap();
        assert!(summary.skipped);
        assert_eq!(ctx.levels_skipped(), 1);
        assert_eq!(ctx.finish().unwrap().weight.sum(), 0.0);
    }

    #[test]
    fn test_unselected_rows_ignored() {
        let (h, v, l, sel, w, rho) = ([1, 2], [1, 2], [2, 2], [true, false], [1.0, 5.0], [0.0, 0.0]);
        let inputs = inputs(&h, &v, &l, &sel, &w, &rho);
        let ctx = AccumulationContext::new((4, 4), ["rho"]);
        process_level(&ctx, &inputs, 2, true).unwrap();
        let done = ctx.finish().unwrap();
        assert_eq!(done.weight.sum(), 1.0);
        assert_eq!(done.weight.get(0, 0), Some(1.0));
    }

    #[test]
    fn test_squared_slot() {
        let v = [3.0, -2.0];
        assert_eq!(SlotColumn::Squared(&v).at(1), 4.0);
        assert_eq!(SlotColumn::Values(&v).at(0), 3.0);
    }
}
