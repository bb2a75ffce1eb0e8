//! Cell-table input files.
//!
//! The input is a JSON object holding a [`CellTable`] plus optional code
//! units and row mask:
//!
//! ```json
//! {
//!   "boxlen": 1.0,
//!   "cx": [1, 4], "cy": [1, 4], "cz": [1, 1],
//!   "level": [1, 2],
//!   "columns": { "rho": [10.0, 5.0] },
//!   "code_units": { "unit_l": 3.0857e21, "unit_d": 1e-24, "unit_t": 3.156e15 }
//! }
//! ```

use crate::config::ProjectorConfig;
use amr_common::{CellTable, CodeUnits, ScaleTable};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectorInput {
    #[serde(flatten)]
    pub cells: CellTable,
    #[serde(default)]
    pub code_units: Option<CodeUnits>,
    #[serde(default)]
    pub mask: Option<Vec<bool>>,
}

impl ProjectorInput {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        let input: ProjectorInput = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse cell table: {}", path.display()))?;
        input
            .cells
            .validate()
            .with_context(|| format!("Invalid cell table: {}", path.display()))?;

        info!(
            path = %path.display(),
            rows = input.cells.level.len(),
            columns = ?input.cells.columns.keys().collect::<Vec<_>>(),
            "Loaded cell table"
        );
        Ok(input)
    }

    /// Scale table from the input's code units, falling back to the
    /// configuration's, plus any extra units from the configuration.
    pub fn scale_table(&self, config: &ProjectorConfig) -> ScaleTable {
        let mut table = match self.code_units.or(config.code_units) {
            Some(units) => ScaleTable::from_code_units(units),
            None => {
                debug!("No code units given, only code-unit output is available");
                ScaleTable::identity()
            }
        };
        for (name, factor) in &config.units {
            table.insert(name.clone(), *factor);
        }
        table
    }
}
