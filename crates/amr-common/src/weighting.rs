//! Weighting and accumulation modes.

use crate::error::ProjectionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field every cell contributes to the implicit weight raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// Cell mass, from a `mass` column or `rho * cell_volume`.
    #[default]
    Mass,
    /// Cell volume, `(boxlen / 2^level)^3`.
    Volume,
    /// Unit weight per cell.
    None,
}

impl Weighting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weighting::Mass => "mass",
            Weighting::Volume => "volume",
            Weighting::None => "none",
        }
    }
}

impl FromStr for Weighting {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mass" => Ok(Weighting::Mass),
            "volume" | "vol" => Ok(Weighting::Volume),
            "none" => Ok(Weighting::None),
            other => Err(ProjectionError::UnknownWeighting(other.to_string())),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether data rasters are divided by the weight raster after accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccumulationMode {
    /// Weighted averages: data sums divided by weight sums.
    #[default]
    Standard,
    /// Raw weighted sums, no division.
    Sum,
}

impl FromStr for AccumulationMode {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(AccumulationMode::Standard),
            "sum" => Ok(AccumulationMode::Sum),
            other => Err(ProjectionError::UnknownMode(other.to_string())),
        }
    }
}

/// Tag describing how an output map was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapMode {
    MassWeighted,
    VolumeWeighted,
    Summed,
    /// Closed-form per-pixel evaluation (radius, angle).
    Analytic,
}

impl MapMode {
    /// Mode tag for a data variable under the given weighting and mode.
    pub fn for_data(weighting: Weighting, mode: AccumulationMode) -> Self {
        match (mode, weighting) {
            (AccumulationMode::Sum, _) | (_, Weighting::None) => MapMode::Summed,
            (AccumulationMode::Standard, Weighting::Mass) => MapMode::MassWeighted,
            (AccumulationMode::Standard, Weighting::Volume) => MapMode::VolumeWeighted,
        }
    }
}

impl fmt::Display for MapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MapMode::MassWeighted => "mass-weighted",
            MapMode::VolumeWeighted => "volume-weighted",
            MapMode::Summed => "summed",
            MapMode::Analytic => "analytic",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weighting() {
        assert_eq!("MASS".parse::<Weighting>().unwrap(), Weighting::Mass);
        assert_eq!("vol".parse::<Weighting>().unwrap(), Weighting::Volume);
        assert_eq!("none".parse::<Weighting>().unwrap(), Weighting::None);

        let err = "luminosity".parse::<Weighting>().unwrap_err();
        assert!(err.to_string().contains("luminosity"));
    }

    #[test]
    fn test_map_mode_for_data() {
        assert_eq!(
            MapMode::for_data(Weighting::Mass, AccumulationMode::Standard),
            MapMode::MassWeighted
        );
        assert_eq!(
            MapMode::for_data(Weighting::Volume, AccumulationMode::Standard),
            MapMode::VolumeWeighted
        );
        assert_eq!(
            MapMode::for_data(Weighting::Mass, AccumulationMode::Sum),
            MapMode::Summed
        );
        assert_eq!(
            MapMode::for_data(Weighting::None, AccumulationMode::Standard),
            MapMode::Summed
        );
    }
}
