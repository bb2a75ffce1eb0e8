//! One projection run: input file in, JSON maps out.

use crate::config::ProjectorConfig;
use crate::input::ProjectorInput;
use amr_common::{AccumulationMode, Axis, Direction, SpatialRange, Weighting};
use amr_projection::{project, ProjectionMaps, ProjectionRequest};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Projection parameters as given on the command line.
#[derive(Debug, Clone)]
pub struct ProjectionOptions {
    pub variables: Vec<String>,
    pub units: Vec<String>,
    pub direction: String,
    pub weighting: String,
    pub mode: String,
    pub resolution: Option<usize>,
    pub pixel_size: Option<f64>,
    pub lmax: Option<u32>,
    pub xrange: Option<Vec<f64>>,
    pub yrange: Option<Vec<f64>>,
    pub zrange: Option<Vec<f64>>,
    pub center: Option<Vec<f64>>,
    pub range_unit: String,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            variables: Vec::new(),
            units: Vec::new(),
            direction: "z".to_string(),
            weighting: "mass".to_string(),
            mode: "standard".to_string(),
            resolution: None,
            pixel_size: None,
            lmax: None,
            xrange: None,
            yrange: None,
            zrange: None,
            center: None,
            range_unit: "standard".to_string(),
        }
    }
}

fn pair(name: &str, values: &[f64]) -> Result<[f64; 2]> {
    match values {
        [a, b] => Ok([*a, *b]),
        _ => anyhow::bail!("--{} takes two values, got {}", name, values.len()),
    }
}

impl ProjectionOptions {
    /// Build the engine request, attaching the input's row mask.
    pub fn to_request(&self, mask: Option<Vec<bool>>) -> Result<ProjectionRequest> {
        let direction: Direction = self.direction.parse()?;
        let weighting: Weighting = self.weighting.parse()?;
        let mode: AccumulationMode = self.mode.parse()?;

        let mut range = SpatialRange::new().with_unit(self.range_unit.clone());
        for (axis, name, values) in [
            (Axis::X, "xrange", &self.xrange),
            (Axis::Y, "yrange", &self.yrange),
            (Axis::Z, "zrange", &self.zrange),
        ] {
            if let Some(values) = values {
                range = range.with_range(axis, pair(name, values)?);
            }
        }
        if let Some(center) = &self.center {
            match center.as_slice() {
                [x, y, z] => range = range.with_center([*x, *y, *z]),
                _ => anyhow::bail!("--center takes three values, got {}", center.len()),
            }
        }

        let mut request = ProjectionRequest::new(self.variables.iter().cloned())
            .with_units(self.units.iter().cloned())
            .with_direction(direction)
            .with_weighting(weighting)
            .with_mode(mode)
            .with_range(range);
        if let Some(res) = self.resolution {
            request = request.with_resolution(res);
        }
        if let Some(size) = self.pixel_size {
            request = request.with_pixel_size(size);
        }
        if let Some(lmax) = self.lmax {
            request = request.with_lmax(lmax);
        }
        if let Some(mask) = mask {
            request = request.with_mask(mask);
        }
        Ok(request)
    }
}

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub options: ProjectionOptions,
}

/// Load the input, project it and write the result when an output path is
/// given.
pub fn run(args: &RunArgs, config: &ProjectorConfig) -> Result<ProjectionMaps> {
    let start = Instant::now();
    let input = ProjectorInput::load(&args.input)?;
    let converter = input.scale_table(config);
    let request = args.options.to_request(input.mask.clone())?;

    let maps = project(&input.cells, &request, &converter, &config.projection)
        .context("Projection failed")?;

    info!(
        variables = ?request.variables,
        shape = ?maps.metadata.shape,
        cells = maps.cells_binned(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Projection complete"
    );

    if let Some(output) = &args.output {
        write_maps(&maps, output)?;
    }
    Ok(maps)
}

pub fn write_maps(maps: &ProjectionMaps, path: &Path) -> Result<()> {
    let json = maps.to_json().context("Failed to serialize maps")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote projection maps");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(vars: &[&str]) -> ProjectionOptions {
        ProjectionOptions {
            variables: vars.iter().map(|v| v.to_string()).collect(),
            ..ProjectionOptions::default()
        }
    }

    #[test]
    fn test_to_request_parses_enums() {
        let opts = ProjectionOptions {
            direction: "x".to_string(),
            weighting: "volume".to_string(),
            mode: "sum".to_string(),
            resolution: Some(64),
            ..options(&["rho"])
        };
        let request = opts.to_request(None).unwrap();
        assert_eq!(request.direction, Direction::X);
        assert_eq!(request.weighting, Weighting::Volume);
        assert_eq!(request.mode, AccumulationMode::Sum);
        assert_eq!(request.resolution, Some(64));
    }

    #[test]
    fn test_to_request_ranges() {
        let opts = ProjectionOptions {
            zrange: Some(vec![0.25, 0.75]),
            center: Some(vec![0.5, 0.5, 0.5]),
            ..options(&["sd"])
        };
        let request = opts.to_request(Some(vec![true, false])).unwrap();
        assert_eq!(request.range.zrange, Some([0.25, 0.75]));
        assert_eq!(request.range.center, Some([0.5, 0.5, 0.5]));
        assert_eq!(request.mask, Some(vec![true, false]));
    }

    #[test]
    fn test_to_request_rejects_bad_values() {
        let bad_dir = ProjectionOptions {
            direction: "w".to_string(),
            ..options(&["rho"])
        };
        assert!(bad_dir.to_request(None).is_err());

        let bad_range = ProjectionOptions {
            xrange: Some(vec![0.1]),
            ..options(&["rho"])
        };
        assert!(bad_range.to_request(None).is_err());

        let bad_center = ProjectionOptions {
            center: Some(vec![0.5, 0.5]),
            ..options(&["rho"])
        };
        assert!(bad_center.to_request(None).is_err());
    }
}
