//! Request and result types of a projection call.

use amr_common::{
    AccumulationMode, Axis, Direction, MapMode, SpatialRange, Weighting, STANDARD_UNIT,
};
use raster::{BinRange, Raster};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything that defines one projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    /// Output variables, see [`amr_common::VariableKind::classify`].
    pub variables: Vec<String>,

    /// One unit per variable. Empty means code units for all of them.
    #[serde(default)]
    pub units: Vec<String>,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default)]
    pub weighting: Weighting,

    #[serde(default)]
    pub mode: AccumulationMode,

    /// Pixels across the full box. Takes precedence over `pixel_size`.
    #[serde(default)]
    pub resolution: Option<usize>,

    /// Pixel edge length in the range unit.
    #[serde(default)]
    pub pixel_size: Option<f64>,

    /// Level whose cell size sets the default resolution `2^lmax`; defaults
    /// to the deepest level present.
    #[serde(default)]
    pub lmax: Option<u32>,

    #[serde(default)]
    pub range: SpatialRange,

    /// Row selection aligned with the cell table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<bool>>,
}

impl ProjectionRequest {
    pub fn new<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
            units: Vec::new(),
            direction: Direction::default(),
            weighting: Weighting::default(),
            mode: AccumulationMode::default(),
            resolution: None,
            pixel_size: None,
            lmax: None,
            range: SpatialRange::default(),
            mask: None,
        }
    }

    pub fn with_units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.units = units.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_mode(mut self, mode: AccumulationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_pixel_size(mut self, pixel_size: f64) -> Self {
        self.pixel_size = Some(pixel_size);
        self
    }

    pub fn with_lmax(mut self, lmax: u32) -> Self {
        self.lmax = Some(lmax);
        self
    }

    pub fn with_range(mut self, range: SpatialRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_mask(mut self, mask: Vec<bool>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Unit requested for the variable at `index`.
    pub fn unit_for(&self, index: usize) -> &str {
        self.units
            .get(index)
            .map(|u| u.as_str())
            .unwrap_or(STANDARD_UNIT)
    }
}

/// Per-level accounting of one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level: u32,
    /// Cells binned at this level.
    pub cells: usize,
    /// Output pixels per cell side at this level.
    pub scale_factor: f64,
    /// Factor applied to every histogram of this level before merging.
    pub correction_factor: f64,
    /// True when the level held no selected cells.
    pub skipped: bool,
}

/// Grid description shared by every map of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMetadata {
    pub direction: Direction,
    /// (horizontal, vertical) axes of the maps.
    pub plane_axes: (Axis, Axis),
    /// Pixels across the full box.
    pub resolution: usize,
    /// Map shape `(length1, length2)`.
    pub shape: (usize, usize),
    /// Pixel index ranges along the two plane axes (1-based).
    pub bins: (BinRange, BinRange),
    /// Selected region as box fractions, `[min, max]` per axis x, y, z.
    pub ranges: [[f64; 2]; 3],
    /// `[h_min, h_max, v_min, v_max]` in `length_unit`.
    pub extent: [f64; 4],
    /// `extent` relative to the reference centre.
    pub center_extent: [f64; 4],
    /// Reference centre in `length_unit`.
    pub center: [f64; 3],
    pub length_unit: String,
    /// Pixel edge length in `length_unit`.
    pub pixel_size: f64,
    /// Width over height of `extent`.
    pub aspect_ratio: f64,
    pub boxlen: f64,
    pub weighting: Weighting,
    pub mode: AccumulationMode,
    /// Shallowest and deepest level covered.
    pub level_range: (u32, u32),
}

/// The result of [`crate::project`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionMaps {
    pub maps: BTreeMap<String, Raster>,
    pub units: BTreeMap<String, String>,
    pub modes: BTreeMap<String, MapMode>,
    pub metadata: GridMetadata,
    pub levels: Vec<LevelSummary>,
}

impl ProjectionMaps {
    pub fn map(&self, variable: &str) -> Option<&Raster> {
        self.maps.get(variable)
    }

    pub fn unit(&self, variable: &str) -> Option<&str> {
        self.units.get(variable).map(|u| u.as_str())
    }

    pub fn mode(&self, variable: &str) -> Option<MapMode> {
        self.modes.get(variable).copied()
    }

    /// Number of cells binned across all levels.
    pub fn cells_binned(&self) -> usize {
        self.levels.iter().map(|l| l.cells).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
