//! Thread-local scratch rasters for per-task histograms.
//!
//! Each worker computes a level/variable histogram into its own scratch
//! raster before merging it into shared state. Reusing one buffer per thread
//! avoids a full-resolution allocation for every (level, variable) task.
//!
//! ## Usage
//!
//! ```ignore
//! use raster::with_scratch_raster;
//!
//! let total = with_scratch_raster(512, 512, |scratch| {
//!     hist2d_weight(&x, &y, &w, &range_x, &range_y, scratch)?;
//!     Ok(scratch.sum())
//! })?;
//! ```
//!
//! The closure must not call `with_scratch_raster` again on the same thread.

use crate::grid::Raster;
use std::cell::RefCell;

thread_local! {
    static SCRATCH: RefCell<Raster> = RefCell::new(Raster::default());
}

/// Run `f` with this thread's scratch raster, reshaped to `(nx, ny)` and
/// zero-filled.
#[inline]
pub fn with_scratch_raster<F, R>(nx: usize, ny: usize, f: F) -> R
where
    F: FnOnce(&mut Raster) -> R,
{
    SCRATCH.with(|buf| {
        let mut buf = buf.borrow_mut();
        buf.reset(nx, ny);
        f(&mut buf)
    })
}

/// Element capacity of this thread's scratch raster.
pub fn scratch_capacity() -> usize {
    SCRATCH.with(|buf| buf.borrow().capacity())
}
