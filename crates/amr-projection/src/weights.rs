//! Weight field per weighting mode.

use amr_common::{CellSource, ProjectionError, ProjectionResult, Weighting};
use std::borrow::Cow;

/// Column read directly for mass weighting.
pub const MASS_COLUMN: &str = "mass";
/// Column combined with the cell volume when no mass column exists.
pub const DENSITY_COLUMN: &str = "rho";

/// Volume of a cell at `level` in code units.
#[inline]
pub fn cell_volume(boxlen: f64, level: u32) -> f64 {
    (boxlen / 2f64.powi(level as i32)).powi(3)
}

/// Check that a named column has one value per row.
pub fn checked_column<'a, S>(source: &'a S, name: &str) -> ProjectionResult<&'a [f64]>
where
    S: CellSource + ?Sized,
{
    let column = source
        .column(name)
        .ok_or_else(|| ProjectionError::MissingColumn(name.to_string()))?;
    if column.len() != source.row_count() {
        return Err(ProjectionError::ColumnLengthMismatch {
            column: name.to_string(),
            expected: source.row_count(),
            actual: column.len(),
        });
    }
    Ok(column)
}

/// Per-row weights for `weighting`.
///
/// Mass weighting reads the `mass` column, or derives `rho * cell_volume`
/// when only `rho` is present.
pub fn weight_field<'a, S>(source: &'a S, weighting: Weighting) -> ProjectionResult<Cow<'a, [f64]>>
where
    S: CellSource + ?Sized,
{
    let boxlen = source.boxlen();
    let levels = source.levels();
    match weighting {
        Weighting::Mass => {
            if source.has_column(MASS_COLUMN) {
                return checked_column(source, MASS_COLUMN).map(Cow::Borrowed);
            }
            if source.has_column(DENSITY_COLUMN) {
                let rho = checked_column(source, DENSITY_COLUMN)?;
                return Ok(Cow::Owned(
                    rho.iter()
                        .zip(levels)
                        .map(|(&d, &l)| d * cell_volume(boxlen, l))
                        .collect(),
                ));
            }
            Err(ProjectionError::MissingWeightColumn {
                weighting: weighting.to_string(),
                column: MASS_COLUMN.to_string(),
            })
        }
        Weighting::Volume => Ok(Cow::Owned(
            levels.iter().map(|&l| cell_volume(boxlen, l)).collect(),
        )),
        Weighting::None => Ok(Cow::Owned(vec![1.0; source.row_count()])),
    }
}
