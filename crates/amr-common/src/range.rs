//! Spatial selection of the projected region.

use crate::axis::Axis;
use crate::error::{ProjectionError, ProjectionResult};
use crate::units::STANDARD_UNIT;
use serde::{Deserialize, Serialize};

/// Requested region, in `range_unit` lengths.
///
/// With a `center`, the per-axis ranges are offsets from it; without one they
/// are absolute positions. Missing ranges cover the whole box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialRange {
    #[serde(default)]
    pub xrange: Option<[f64; 2]>,
    #[serde(default)]
    pub yrange: Option<[f64; 2]>,
    #[serde(default)]
    pub zrange: Option<[f64; 2]>,
    #[serde(default)]
    pub center: Option<[f64; 3]>,
    #[serde(default = "default_range_unit")]
    pub range_unit: String,
}

fn default_range_unit() -> String {
    STANDARD_UNIT.to_string()
}

impl Default for SpatialRange {
    fn default() -> Self {
        Self {
            xrange: None,
            yrange: None,
            zrange: None,
            center: None,
            range_unit: default_range_unit(),
        }
    }
}

/// A [`SpatialRange`] converted to box fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxRegion {
    /// `[min, max]` per axis.
    pub bounds: [[f64; 2]; 3],
    /// Reference centre per axis.
    pub center: [f64; 3],
}

impl BoxRegion {
    pub fn full() -> Self {
        Self {
            bounds: [[0.0, 1.0]; 3],
            center: [0.5; 3],
        }
    }

    pub fn axis(&self, axis: Axis) -> [f64; 2] {
        self.bounds[axis.index()]
    }

    /// Whether a box-fraction position lies inside the region along `axis`.
    pub fn contains(&self, axis: Axis, position: f64) -> bool {
        let [lo, hi] = self.axis(axis);
        position >= lo && position <= hi
    }
}

impl SpatialRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_center(mut self, center: [f64; 3]) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.range_unit = unit.into();
        self
    }

    pub fn with_range(mut self, axis: Axis, range: [f64; 2]) -> Self {
        match axis {
            Axis::X => self.xrange = Some(range),
            Axis::Y => self.yrange = Some(range),
            Axis::Z => self.zrange = Some(range),
        }
        self
    }

    fn range(&self, axis: Axis) -> Option<[f64; 2]> {
        match axis {
            Axis::X => self.xrange,
            Axis::Y => self.yrange,
            Axis::Z => self.zrange,
        }
    }

    /// Convert to box fractions.
    ///
    /// `unit_factor` is the number of `range_unit` lengths per code length.
    /// Bounds are clipped to the box; an empty interval after clipping is an
    /// error naming the axis.
    pub fn resolve(&self, boxlen: f64, unit_factor: f64) -> ProjectionResult<BoxRegion> {
        if boxlen.is_nan() || boxlen <= 0.0 {
            return Err(ProjectionError::Config(format!(
                "boxlen must be positive, got {}",
                boxlen
            )));
        }
        if unit_factor.is_nan() || unit_factor <= 0.0 {
            return Err(ProjectionError::unknown_unit("range", &self.range_unit));
        }
        let to_box = |v: f64| v / unit_factor / boxlen;

        let center = match self.center {
            Some(c) => [to_box(c[0]), to_box(c[1]), to_box(c[2])],
            None => [0.5; 3],
        };

        let mut bounds = [[0.0, 1.0]; 3];
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let Some([a, b]) = self.range(axis) else {
                continue;
            };
            if a.is_nan() || b.is_nan() || a >= b {
                return Err(ProjectionError::invalid_range(
                    axis,
                    format!("lower bound {} is not below upper bound {}", a, b),
                ));
            }
            let (lo, hi) = match self.center {
                Some(_) => (center[axis.index()] + to_box(a), center[axis.index()] + to_box(b)),
                None => (to_box(a), to_box(b)),
            };
            let lo = lo.clamp(0.0, 1.0);
            let hi = hi.clamp(0.0, 1.0);
            if lo >= hi {
                return Err(ProjectionError::invalid_range(
                    axis,
                    "range lies outside the simulation box",
                ));
            }
            bounds[axis.index()] = [lo, hi];
        }

        Ok(BoxRegion { bounds, center })
    }
}
