//! Error types for raster operations.

use thiserror::Error;

/// Errors raised by histogram primitives and raster arithmetic.
#[derive(Debug, Error, PartialEq)]
pub enum RasterError {
    #[error("raster shape {actual:?} does not match expected {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("array '{array}' has {actual} entries, expected {expected}")]
    LengthMismatch {
        array: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid bin range: {0}")]
    InvalidBins(String),
}

/// Result type for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;

/// Check that a parallel input array matches the coordinate count.
pub(crate) fn check_len(array: &'static str, expected: usize, actual: usize) -> RasterResult<()> {
    if expected != actual {
        return Err(RasterError::LengthMismatch {
            array,
            expected,
            actual,
        });
    }
    Ok(())
}
