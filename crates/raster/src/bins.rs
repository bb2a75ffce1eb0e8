//! Evenly spaced bin sequences and coordinate-to-bin arithmetic.

use crate::error::{RasterError, RasterResult};
use serde::{Deserialize, Serialize};

/// An ascending, evenly spaced sequence of bin positions
/// `min, min + step, ..., min + (len - 1) * step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinRange {
    pub min: f64,
    pub step: f64,
    pub len: usize,
}

impl BinRange {
    pub fn new(min: f64, step: f64, len: usize) -> RasterResult<Self> {
        if !min.is_finite() {
            return Err(RasterError::InvalidBins(format!("non-finite start {}", min)));
        }
        if step.is_nan() || step <= 0.0 || step.is_infinite() {
            return Err(RasterError::InvalidBins(format!(
                "step must be positive and finite, got {}",
                step
            )));
        }
        if len == 0 {
            return Err(RasterError::InvalidBins("at least one bin required".into()));
        }
        Ok(Self { min, step, len })
    }

    /// Integer bin positions `first..=last` with unit step.
    pub fn unit(first: i64, last: i64) -> RasterResult<Self> {
        if last < first {
            return Err(RasterError::InvalidBins(format!(
                "empty range {}..={}",
                first, last
            )));
        }
        Self::new(first as f64, 1.0, (last - first + 1) as usize)
    }

    pub fn max(&self) -> f64 {
        self.value(self.len - 1)
    }

    #[inline]
    pub fn value(&self, k: usize) -> f64 {
        self.min + k as f64 * self.step
    }

    /// Zero-based bin for `coord`.
    ///
    /// Uses `round((coord - min) / step) + 1` clamped to `[1, len]`, minus one.
    /// Coordinates beyond either end land in the first or last bin.
    #[inline]
    pub fn index_of(&self, coord: f64) -> usize {
        let raw = (((coord - self.min) / self.step).round() as i64).saturating_add(1);
        (raw.clamp(1, self.len as i64) - 1) as usize
    }

    /// Continuous zero-based bin position of `coord`, unclamped.
    #[inline]
    pub fn position_of(&self, coord: f64) -> f64 {
        (coord - self.min) / self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_of_rounds_to_nearest() {
        let r = BinRange::unit(1, 4).unwrap();
        assert_eq!(r.index_of(1.0), 0);
        assert_eq!(r.index_of(1.49), 0);
        assert_eq!(r.index_of(1.5), 1);
        assert_eq!(r.index_of(3.6), 3);
    }

    #[test]
    fn test_index_of_clamps_out_of_range() {
        let r = BinRange::unit(1, 4).unwrap();
        assert_eq!(r.index_of(-100.0), 0);
        assert_eq!(r.index_of(4.6), 3);
        assert_eq!(r.index_of(1.0e300), 3);
        assert_eq!(r.index_of(f64::NAN), 0);
    }

    #[test]
    fn test_non_unit_step() {
        let r = BinRange::new(0.0, 0.25, 8).unwrap();
        assert_eq!(r.index_of(0.3), 1);
        assert_eq!(r.index_of(1.74), 7);
        assert!((r.max() - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(BinRange::new(0.0, 0.0, 4).is_err());
        assert!(BinRange::new(0.0, 1.0, 0).is_err());
        assert!(BinRange::unit(5, 4).is_err());
    }
}
