//! Small hand-checkable fixtures.

use amr_common::{CellTable, ScaleTable};
use std::io::Write;
use tempfile::NamedTempFile;

/// Resolution used with [`two_level_table`].
pub const TWO_LEVEL_RESOLUTION: usize = 4;

/// Total `rho` mass deposited by [`two_level_table`] at unit weights.
pub const TWO_LEVEL_TOTAL: f64 = 15.0;

/// One level-1 cell with `rho = 10` in the lower-left quadrant and one
/// level-2 cell with `rho = 5` at grid `(4, 4)`, both with `mass = 1`.
///
/// Projected along z at resolution 4 in sum mode with no weighting, the
/// level-1 cell spreads `10 / 4` over each of the four lower-left pixels and
/// the level-2 cell lands entirely in pixel `(4, 4)`.
pub fn two_level_table() -> CellTable {
    let mut table = CellTable::new(1.0);
    table.push_cell(
        1,
        [1, 1, 1],
        &[("rho", 10.0), ("mass", 1.0), ("vx", 2.0), ("vy", 0.0)],
    );
    table.push_cell(
        2,
        [4, 4, 1],
        &[("rho", 5.0), ("mass", 1.0), ("vx", 4.0), ("vy", 0.0)],
    );
    table
}

/// Scale table with a length unit `u10` worth 10 code lengths and a velocity
/// unit `u2` worth 2 code velocities.
pub fn scale_table() -> ScaleTable {
    let mut table = ScaleTable::identity();
    table.insert("u10", 10.0);
    table.insert("u2", 2.0);
    table
}

/// Write `table` as JSON into a temporary file that lives as long as the
/// returned handle.
pub fn write_table_json(table: &CellTable) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    let json = serde_json::to_vec(table).expect("serialize cell table");
    file.write_all(&json).expect("write cell table");
    file.flush().expect("flush cell table");
    file
}
