//! Common types shared across the AMR projection workspace.
//!
//! The projection engine only talks to simulation data through the narrow
//! interfaces defined here: a [`CellSource`] for column access, a
//! [`UnitConverter`] for unit scaling and an optional boolean mask.

pub mod axis;
pub mod error;
pub mod range;
pub mod table;
pub mod units;
pub mod variable;
pub mod weighting;

pub use axis::{Axis, Direction};
pub use error::{ProjectionError, ProjectionResult};
pub use range::{BoxRegion, SpatialRange};
pub use table::{CellSource, CellTable};
pub use units::{CodeUnits, ScaleTable, UnitConverter, UnitScale, STANDARD_UNIT};
pub use variable::{RadiusKind, VariableKind, WeightQuantity};
pub use weighting::{AccumulationMode, MapMode, Weighting};
