//! Per-call accumulation state.
//!
//! An [`AccumulationContext`] owns the weight raster and one raster per data
//! slot, all allocated up front. Workers never insert keys: a merge into an
//! unknown slot is an error, not an allocation. The single mutex guards only
//! the raster contents of this call, so independent calls never contend.

use crate::error::raster_error;
use crate::types::LevelSummary;
use amr_common::{ProjectionError, ProjectionResult};
use raster::Raster;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Name used for the weight accumulator in error messages.
pub const WEIGHT_SLOT: &str = "weight";

#[derive(Debug)]
struct Accumulators {
    weight: Raster,
    data: BTreeMap<String, Raster>,
    summaries: Vec<LevelSummary>,
}

/// Finished accumulators of a call.
#[derive(Debug)]
pub struct Accumulated {
    pub weight: Raster,
    pub data: BTreeMap<String, Raster>,
    /// One entry per processed or skipped level, sorted by level.
    pub summaries: Vec<LevelSummary>,
}

#[derive(Debug)]
pub struct AccumulationContext {
    shape: (usize, usize),
    inner: Mutex<Accumulators>,
    levels_processed: AtomicUsize,
    levels_skipped: AtomicUsize,
    cells_binned: AtomicUsize,
    merges: AtomicUsize,
}

impl AccumulationContext {
    /// Allocate the weight raster and every slot at `shape`.
    pub fn new<I, S>(shape: (usize, usize), slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data = slots
            .into_iter()
            .map(|name| (name.into(), Raster::zeros(shape.0, shape.1)))
            .collect();
        Self {
            shape,
            inner: Mutex::new(Accumulators {
                weight: Raster::zeros(shape.0, shape.1),
                data,
                summaries: Vec::new(),
            }),
            levels_processed: AtomicUsize::new(0),
            levels_skipped: AtomicUsize::new(0),
            cells_binned: AtomicUsize::new(0),
            merges: AtomicUsize::new(0),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Whether `slot` was allocated.
    pub fn has_slot(&self, slot: &str) -> bool {
        self.inner
            .lock()
            .map(|acc| acc.data.contains_key(slot))
            .unwrap_or(false)
    }

    /// `weight += histogram * factor` under the call's lock.
    pub fn merge_weight(&self, level: u32, histogram: &Raster, factor: f64) -> ProjectionResult<()> {
        let mut acc = self
            .inner
            .lock()
            .map_err(|_| ProjectionError::LockPoisoned(level))?;
        acc.weight
            .add_scaled(histogram, factor)
            .map_err(|e| raster_error(WEIGHT_SLOT, e))?;
        self.merges.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// `slot += histogram * factor` under the call's lock.
    pub fn merge_slot(
        &self,
        level: u32,
        slot: &str,
        histogram: &Raster,
        factor: f64,
    ) -> ProjectionResult<()> {
        let mut acc = self
            .inner
            .lock()
            .map_err(|_| ProjectionError::LockPoisoned(level))?;
        let target = acc
            .data
            .get_mut(slot)
            .ok_or_else(|| ProjectionError::MissingSlot {
                variable: slot.to_string(),
                level,
            })?;
        target
            .add_scaled(histogram, factor)
            .map_err(|e| raster_error(slot, e))?;
        self.merges.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Record the outcome of one level.
    pub fn record_level(&self, summary: LevelSummary) -> ProjectionResult<()> {
        if summary.skipped {
            self.levels_skipped.fetch_add(1, Ordering::Relaxed);
        } else {
            self.levels_processed.fetch_add(1, Ordering::Relaxed);
            self.cells_binned.fetch_add(summary.cells, Ordering::Relaxed);
        }
        let level = summary.level;
        self.inner
            .lock()
            .map_err(|_| ProjectionError::LockPoisoned(level))?
            .summaries
            .push(summary);
        Ok(())
    }

    pub fn levels_processed(&self) -> usize {
        self.levels_processed.load(Ordering::Relaxed)
    }

    pub fn levels_skipped(&self) -> usize {
        self.levels_skipped.load(Ordering::Relaxed)
    }

    pub fn levels_done(&self) -> usize {
        self.levels_processed() + self.levels_skipped()
    }

    pub fn cells_binned(&self) -> usize {
        self.cells_binned.load(Ordering::Relaxed)
    }

    /// Number of histograms merged so far.
    pub fn merges(&self) -> usize {
        self.merges.load(Ordering::Relaxed)
    }

    /// Take the rasters, checking every one against the allocated shape.
    pub fn finish(self) -> ProjectionResult<Accumulated> {
        let shape = self.shape;
        let acc = self
            .inner
            .into_inner()
            .map_err(|_| ProjectionError::LockPoisoned(0))?;

        if acc.weight.shape() != shape {
            return Err(ProjectionError::shape_mismatch(
                WEIGHT_SLOT,
                shape,
                acc.weight.shape(),
            ));
        }
        for (name, raster) in &acc.data {
            if raster.shape() != shape {
                return Err(ProjectionError::shape_mismatch(
                    name.as_str(),
                    shape,
                    raster.shape(),
                ));
            }
        }

        let mut summaries = acc.summaries;
        summaries.sort_by_key(|s| s.level);
        Ok(Accumulated {
            weight: acc.weight,
            data: acc.data,
            summaries,
        })
    }
}
