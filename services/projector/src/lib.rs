//! Command-line projection of AMR cell tables.
//!
//! Reads a JSON cell table, projects it with [`amr_projection::project`] and
//! writes the maps and grid metadata as JSON.

pub mod config;
pub mod input;
pub mod run;

pub use config::{LogFormat, LoggingConfig, ProjectorConfig};
pub use input::ProjectorInput;
pub use run::{run, write_maps, ProjectionOptions, RunArgs};
