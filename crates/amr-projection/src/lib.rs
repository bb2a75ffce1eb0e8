//! AMR-aware 2D projection engine.
//!
//! Converts variable-resolution cell data (grid position, refinement level,
//! physical quantities) into fixed-resolution 2D maps while conserving the
//! integrated weight across levels.
//!
//! # Architecture
//!
//! ```text
//! project(source, request, converter, config)
//!      │
//!      ├─► GridGeometry::resolve      resolution, bin ranges, extents
//!      │
//!      ├─► plan variables             VariableKind per name, unit factors
//!      │
//!      ├─► AccumulationContext::new   every slot allocated up front
//!      │
//!      ├─► process_level (rayon)      per level or per variable
//!      │         │
//!      │         └─► scratch histogram ─► merge × correction under lock
//!      │
//!      └─► post-processing            weighted average, dispersion,
//!                                     surface density, radius/angle maps
//! ```
//!
//! # Example
//!
//! ```ignore
//! use amr_projection::{project, ProjectionConfig, ProjectionRequest};
//! use amr_common::{CellTable, ScaleTable};
//!
//! let request = ProjectionRequest::new(["sd", "vx"])
//!     .with_units(["Msol_pc2", "km_s"])
//!     .with_resolution(512);
//! let maps = project(&table, &request, &scales, &ProjectionConfig::from_env())?;
//! let sd = maps.map("sd").unwrap();
//! ```

pub mod config;
pub mod context;
pub mod geometry;
pub mod level;
pub mod postprocess;
pub mod projection;
pub mod threading;
pub mod types;
pub mod weights;

mod error;

pub use config::ProjectionConfig;
pub use context::{Accumulated, AccumulationContext};
pub use geometry::GridGeometry;
pub use level::{process_level, LevelInputs, LevelScale, SlotColumn};
pub use postprocess::{
    angle_map, combine_dispersions, derive_dispersion, pixel_angle, radius_map, weighted_average,
    Moment,
};
pub use projection::project;
pub use threading::should_use_variable_threading;
pub use types::{GridMetadata, LevelSummary, ProjectionMaps, ProjectionRequest};
pub use weights::{cell_volume, weight_field};

pub use amr_common::{ProjectionError, ProjectionResult};
