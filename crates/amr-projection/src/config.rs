//! Configuration for the projection engine.

use raster::SPARSE_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Execution options shared by every projection call.
///
/// These never change the numerical result beyond floating-point summation
/// order; they only control how the work is scheduled and reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Upper bound on worker threads per call. `1` runs everything on the
    /// calling thread.
    pub max_threads: usize,

    /// Bins per side above which histograms use the sparse representation.
    pub sparse_threshold: usize,

    /// Spread each cell over the neighbourhood of its footprint instead of
    /// sub-sampling it.
    pub enhanced_coverage: bool,

    /// Emit per-call summaries at info level.
    pub verbose: bool,

    /// Emit a progress event after every finished level.
    pub show_progress: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            max_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            sparse_threshold: SPARSE_THRESHOLD,
            enhanced_coverage: false,
            verbose: false,
            show_progress: false,
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

impl ProjectionConfig {
    /// Single-threaded configuration, mostly for tests and reproducible runs.
    pub fn sequential() -> Self {
        Self {
            max_threads: 1,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `PROJECTION_*` environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("PROJECTION_MAX_THREADS") {
            if let Ok(n) = val.parse() {
                self.max_threads = n;
            }
        }

        if let Ok(val) = std::env::var("PROJECTION_SPARSE_THRESHOLD") {
            if let Ok(n) = val.parse() {
                self.sparse_threshold = n;
            }
        }

        if let Ok(val) = std::env::var("PROJECTION_ENHANCED_COVERAGE") {
            self.enhanced_coverage = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("PROJECTION_VERBOSE") {
            self.verbose = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("PROJECTION_SHOW_PROGRESS") {
            self.show_progress = parse_flag(&val);
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_threads == 0 {
            return Err("max_threads must be > 0".to_string());
        }

        if self.sparse_threshold == 0 {
            return Err("sparse_threshold must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ProjectionConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.max_threads >= 1);
        assert_eq!(config.sparse_threshold, 2048);
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = ProjectionConfig {
            max_threads: 0,
            ..ProjectionConfig::sequential()
        };
        assert!(config.validate().is_err());

        let config = ProjectionConfig {
            sparse_threshold: 0,
            ..ProjectionConfig::sequential()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: ProjectionConfig =
            serde_json::from_str(r#"{"max_threads": 3, "verbose": true}"#).unwrap();
        assert_eq!(config.max_threads, 3);
        assert!(config.verbose);
        assert!(!config.enhanced_coverage);
        assert_eq!(config.sparse_threshold, SPARSE_THRESHOLD);
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag("0"));
    }
}
