//! Projector configuration file.
//!
//! A single YAML file with optional sections:
//!
//! ```yaml
//! projection:
//!   max_threads: ${PROJECTOR_THREADS:-4}
//!   enhanced_coverage: false
//! logging:
//!   level: info
//!   format: json
//! code_units:
//!   unit_l: 3.0857e21
//!   unit_d: 6.77e-23
//!   unit_t: 3.156e15
//! units:
//!   Myr: 1.0e-3
//! ```
//!
//! Supports environment variable substitution using ${VAR} syntax.

use amr_common::CodeUnits;
use amr_projection::ProjectionConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectorConfig {
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Code units used when the input file carries none.
    #[serde(default)]
    pub code_units: Option<CodeUnits>,
    /// Extra named scale factors, code value times factor.
    #[serde(default)]
    pub units: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl ProjectorConfig {
    /// Load from a YAML file, then apply `PROJECTION_*` environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Parse YAML content, expanding `${VAR}` references first.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let mut config: ProjectorConfig = if expanded.trim().is_empty() {
            ProjectorConfig::default()
        } else {
            serde_yaml::from_str(&expanded).context("Failed to parse YAML")?
        };
        config.projection = config.projection.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, used without `--config`.
    pub fn from_env() -> Self {
        Self {
            projection: ProjectionConfig::from_env(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.projection
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid projection config: {}", e))?;
        for (name, factor) in &self.units {
            anyhow::ensure!(
                factor.is_finite() && *factor > 0.0,
                "Unit '{}' must have a positive finite factor, got {}",
                name,
                factor
            );
        }
        if let Some(units) = &self.code_units {
            anyhow::ensure!(
                units.unit_l > 0.0 && units.unit_d > 0.0 && units.unit_t > 0.0,
                "Code units must be positive"
            );
        }
        Ok(())
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }
            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}
