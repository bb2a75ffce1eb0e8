//! Error types for AMR projection.

use thiserror::Error;

/// Result type alias using ProjectionError.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors that abort a projection call.
///
/// Every variant names the variable, level or array whose invariant was
/// violated so that multi-variable batch calls can be debugged from the
/// message alone.
#[derive(Debug, Error)]
pub enum ProjectionError {
    // === Configuration Errors ===
    #[error("mask length mismatch: mask has {actual} entries but the cell table has {expected} rows")]
    MaskLengthMismatch { expected: usize, actual: usize },

    #[error("column '{column}' has {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown weighting mode: {0} (expected mass, volume or none)")]
    UnknownWeighting(String),

    #[error("unknown accumulation mode: {0} (expected standard or sum)")]
    UnknownMode(String),

    #[error("unknown projection direction: {0} (expected x, y or z)")]
    UnknownDirection(String),

    #[error("weighting '{weighting}' requires column '{column}' which is not present in the cell table")]
    MissingWeightColumn { weighting: String, column: String },

    #[error("variable '{0}' is not present in the cell table")]
    MissingColumn(String),

    #[error("variable '{variable}' cannot be produced with weighting '{weighting}'")]
    IncompatibleWeighting { variable: String, weighting: String },

    #[error("unknown unit '{unit}' requested for variable '{variable}'")]
    UnknownUnit { variable: String, unit: String },

    #[error("{variables} variables were requested but {units} units were given")]
    UnitCountMismatch { variables: usize, units: usize },

    #[error("no variables requested")]
    NoVariables,

    #[error("invalid range for axis {axis}: {message}")]
    InvalidRange { axis: String, message: String },

    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("configuration error: {0}")]
    Config(String),

    // === Internal invariant violations ===
    #[error("raster for '{variable}' has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        variable: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("no pre-allocated accumulation slot for '{variable}' (level {level})")]
    MissingSlot { variable: String, level: u32 },

    #[error("accumulation lock poisoned while merging level {0}")]
    LockPoisoned(u32),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl ProjectionError {
    /// Create a MaskLengthMismatch error.
    pub fn mask_length_mismatch(expected: usize, actual: usize) -> Self {
        Self::MaskLengthMismatch { expected, actual }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(
        variable: impl Into<String>,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        Self::ShapeMismatch {
            variable: variable.into(),
            expected,
            actual,
        }
    }

    /// Create an InvalidRange error.
    pub fn invalid_range(axis: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::InvalidRange {
            axis: axis.to_string(),
            message: message.into(),
        }
    }

    /// Create an UnknownUnit error.
    pub fn unknown_unit(variable: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::UnknownUnit {
            variable: variable.into(),
            unit: unit.into(),
        }
    }

    /// Whether the error stems from caller input rather than an internal invariant.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            Self::ShapeMismatch { .. }
                | Self::MissingSlot { .. }
                | Self::LockPoisoned(_)
                | Self::ThreadPool(_)
        )
    }
}

impl From<serde_json::Error> for ProjectionError {
    fn from(err: serde_json::Error) -> Self {
        ProjectionError::Config(format!("JSON error: {}", err))
    }
}
