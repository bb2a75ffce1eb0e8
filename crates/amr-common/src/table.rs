//! Column-oriented cell tables.
//!
//! One row per simulation cell (or particle). Grid coordinates are integers
//! relative to the row's refinement level: the cell centre sits at
//! `(coordinate - 0.5) / 2^level` in box units.

use crate::axis::Axis;
use crate::error::{ProjectionError, ProjectionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only column access to simulation cells.
///
/// Implementations must be shareable across worker threads; the engine never
/// mutates a source.
pub trait CellSource: Sync {
    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Box length in code units.
    fn boxlen(&self) -> f64;

    /// Integer grid coordinates along `axis`.
    fn coordinates(&self, axis: Axis) -> &[i64];

    /// Refinement level per row.
    fn levels(&self) -> &[u32];

    /// A named physical-quantity column.
    fn column(&self, name: &str) -> Option<&[f64]>;

    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Row indices selected by `mask`, failing when its length differs from
    /// the row count.
    fn masked_rows(&self, mask: &[bool]) -> ProjectionResult<Vec<usize>> {
        if mask.len() != self.row_count() {
            return Err(ProjectionError::mask_length_mismatch(
                self.row_count(),
                mask.len(),
            ));
        }
        Ok(mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect())
    }
}

/// In-memory cell table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellTable {
    /// Box length in code units.
    pub boxlen: f64,
    pub cx: Vec<i64>,
    pub cy: Vec<i64>,
    pub cz: Vec<i64>,
    pub level: Vec<u32>,
    /// Physical-quantity columns keyed by variable name.
    #[serde(default)]
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl CellTable {
    /// Create an empty table for a box of the given length.
    pub fn new(boxlen: f64) -> Self {
        Self {
            boxlen,
            ..Default::default()
        }
    }

    /// Append a cell. Columns not mentioned in `values` are padded with zero.
    pub fn push_cell(&mut self, level: u32, coords: [i64; 3], values: &[(&str, f64)]) {
        let row = self.level.len();
        self.cx.push(coords[0]);
        self.cy.push(coords[1]);
        self.cz.push(coords[2]);
        self.level.push(level);

        for (name, value) in values {
            let column = self
                .columns
                .entry((*name).to_string())
                .or_insert_with(|| vec![0.0; row]);
            column.push(*value);
        }
        for column in self.columns.values_mut() {
            if column.len() == row {
                column.push(0.0);
            }
        }
    }

    /// Add or replace a whole column.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.insert(name.into(), values);
        self
    }

    /// Check that every column has one entry per row.
    pub fn validate(&self) -> ProjectionResult<()> {
        let rows = self.level.len();
        let coords = [("cx", self.cx.len()), ("cy", self.cy.len()), ("cz", self.cz.len())];
        for (name, len) in coords {
            if len != rows {
                return Err(ProjectionError::ColumnLengthMismatch {
                    column: name.to_string(),
                    expected: rows,
                    actual: len,
                });
            }
        }
        for (name, column) in &self.columns {
            if column.len() != rows {
                return Err(ProjectionError::ColumnLengthMismatch {
                    column: name.clone(),
                    expected: rows,
                    actual: column.len(),
                });
            }
        }
        if self.boxlen.is_nan() || self.boxlen <= 0.0 {
            return Err(ProjectionError::Config(format!(
                "boxlen must be positive, got {}",
                self.boxlen
            )));
        }
        Ok(())
    }
}

impl CellSource for CellTable {
    fn row_count(&self) -> usize {
        self.level.len()
    }

    fn boxlen(&self) -> f64 {
        self.boxlen
    }

    fn coordinates(&self, axis: Axis) -> &[i64] {
        match axis {
            Axis::X => &self.cx,
            Axis::Y => &self.cy,
            Axis::Z => &self.cz,
        }
    }

    fn levels(&self) -> &[u32] {
        &self.level
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|c| c.as_slice())
    }
}
