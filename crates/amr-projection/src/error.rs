//! Mapping of raster primitive failures into projection errors.

use amr_common::ProjectionError;
use raster::RasterError;

/// Attach the variable (or accumulator) name to a raster failure.
pub(crate) fn raster_error(variable: &str, err: RasterError) -> ProjectionError {
    match err {
        RasterError::ShapeMismatch { expected, actual } => {
            ProjectionError::shape_mismatch(variable, expected, actual)
        }
        RasterError::LengthMismatch {
            array,
            expected,
            actual,
        } => ProjectionError::ColumnLengthMismatch {
            column: format!("{} ({})", variable, array),
            expected,
            actual,
        },
        RasterError::InvalidBins(msg) => ProjectionError::InvalidResolution(msg),
    }
}
