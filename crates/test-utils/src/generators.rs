//! Synthetic AMR cell tables.
//!
//! All generators produce the columns `rho`, `mass`, `vx`, `vy`, `vz` and
//! `p` in code units, with `mass = rho * cell_volume`.

use amr_common::CellTable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn cell_volume(boxlen: f64, level: u32) -> f64 {
    (boxlen / 2f64.powi(level as i32)).powi(3)
}

/// Box-fraction centre of a cell.
pub fn cell_center(level: u32, coords: [i64; 3]) -> [f64; 3] {
    let n = 2f64.powi(level as i32);
    [
        (coords[0] as f64 - 0.5) / n,
        (coords[1] as f64 - 0.5) / n,
        (coords[2] as f64 - 0.5) / n,
    ]
}

/// Push a cell whose fields follow a rotating, centrally concentrated
/// profile around the box centre.
fn push_profile_cell(table: &mut CellTable, level: u32, coords: [i64; 3]) {
    let [x, y, z] = cell_center(level, coords);
    let (dx, dy, dz) = (x - 0.5, y - 0.5, z - 0.5);
    let r2 = dx * dx + dy * dy + dz * dz;
    let rho = 1.0 + 10.0 / (1.0 + 100.0 * r2);
    let mass = rho * cell_volume(table.boxlen, level);
    table.push_cell(
        level,
        coords,
        &[
            ("rho", rho),
            ("mass", mass),
            ("vx", -dy),
            ("vy", dx),
            ("vz", 0.1 * dz),
            ("p", 0.5 * rho),
        ],
    );
}

/// Every cell of one refinement level, `8^level` cells.
pub fn uniform_level(level: u32, boxlen: f64) -> CellTable {
    let n = 1i64 << level;
    let mut table = CellTable::new(boxlen);
    for i in 1..=n {
        for j in 1..=n {
            for k in 1..=n {
                push_profile_cell(&mut table, level, [i, j, k]);
            }
        }
    }
    table
}

/// A valid AMR tiling: the box at `base_level`, refined down to `max_level`
/// inside a sphere of box-fraction `radius` around the centre.
///
/// Leaf cells never overlap and cover the whole box exactly once.
pub fn refined_sphere(base_level: u32, max_level: u32, radius: f64) -> CellTable {
    fn refine(table: &mut CellTable, level: u32, coords: [i64; 3], max_level: u32, radius: f64) {
        let c = cell_center(level, coords);
        let half_diag = 0.5 * 3f64.sqrt() / 2f64.powi(level as i32);
        let dist = ((c[0] - 0.5).powi(2) + (c[1] - 0.5).powi(2) + (c[2] - 0.5).powi(2)).sqrt();
        if level < max_level && dist - half_diag < radius {
            for di in 0..2 {
                for dj in 0..2 {
                    for dk in 0..2 {
                        let child = [
                            2 * coords[0] - 1 + di,
                            2 * coords[1] - 1 + dj,
                            2 * coords[2] - 1 + dk,
                        ];
                        refine(table, level + 1, child, max_level, radius);
                    }
                }
            }
        } else {
            push_profile_cell(table, level, coords);
        }
    }

    let n = 1i64 << base_level;
    let mut table = CellTable::new(1.0);
    for i in 1..=n {
        for j in 1..=n {
            for k in 1..=n {
                refine(&mut table, base_level, [i, j, k], max_level, radius);
            }
        }
    }
    table
}

/// `n` independent random cells with levels in `levels`, reproducible from
/// `seed`. Cells may overlap; useful for accumulation properties only.
pub fn random_cells(n: usize, levels: std::ops::RangeInclusive<u32>, seed: u64) -> CellTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table = CellTable::new(1.0);
    for _ in 0..n {
        let level = rng.gen_range(levels.clone());
        let side = 1i64 << level;
        let coords = [
            rng.gen_range(1..=side),
            rng.gen_range(1..=side),
            rng.gen_range(1..=side),
        ];
        let rho: f64 = rng.gen_range(0.1..10.0);
        table.push_cell(
            level,
            coords,
            &[
                ("rho", rho),
                ("mass", rho * cell_volume(1.0, level)),
                ("vx", rng.gen_range(-1.0..1.0)),
                ("vy", rng.gen_range(-1.0..1.0)),
                ("vz", rng.gen_range(-1.0..1.0)),
                ("p", rng.gen_range(0.0..2.0)),
            ],
        );
    }
    table
}

/// Total of a named column.
pub fn column_sum(table: &CellTable, name: &str) -> f64 {
    table
        .columns
        .get(name)
        .map(|c| c.iter().sum())
        .unwrap_or(0.0)
}
