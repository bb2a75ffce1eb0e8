//! Classification of requested output variables.
//!
//! Each requested name is resolved once per call into a [`VariableKind`]; the
//! engine dispatches on the tag instead of re-checking name lists.

use serde::{Deserialize, Serialize};

/// Quantities read straight off the weight raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightQuantity {
    /// Column-integrated mass per unit pixel area.
    SurfaceDensity,
    /// Integrated mass per pixel.
    Mass,
    /// Integrated volume per pixel.
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusKind {
    Cylindrical,
    Spherical,
}

/// What a requested variable name means to the projection engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Derived from the weight raster, no data histogram.
    Weight(WeightQuantity),
    /// A column of the cell table, histogrammed and weight-averaged.
    PlainData,
    /// Distance of each pixel centre from the reference centre.
    Radius(RadiusKind),
    /// Azimuth of each pixel centre around the reference centre.
    Angle,
    /// Dispersion of one column from its first and second moments.
    Dispersion(String),
    /// Combined dispersion of `vx`, `vy` and `vz`.
    TotalDispersion,
}

/// Velocity components feeding [`VariableKind::TotalDispersion`].
pub const VELOCITY_COMPONENTS: [&str; 3] = ["vx", "vy", "vz"];

impl VariableKind {
    /// Resolve a variable name.
    pub fn classify(name: &str) -> Self {
        match name {
            "sd" | "surface_density" | "Σ" => return VariableKind::Weight(WeightQuantity::SurfaceDensity),
            "mass" => return VariableKind::Weight(WeightQuantity::Mass),
            "volume" | "vol" => return VariableKind::Weight(WeightQuantity::Volume),
            "r_cylinder" => return VariableKind::Radius(RadiusKind::Cylindrical),
            "r_sphere" => return VariableKind::Radius(RadiusKind::Spherical),
            "phi" | "ϕ" => return VariableKind::Angle,
            "sigma" | "σ" => return VariableKind::TotalDispersion,
            _ => {}
        }

        let base = name
            .strip_prefix("sigma_")
            .or_else(|| name.strip_prefix('σ'));
        match base {
            Some(base) if !base.is_empty() => VariableKind::Dispersion(base.to_string()),
            _ => VariableKind::PlainData,
        }
    }

    /// Cell-table columns needed to produce the variable.
    pub fn required_columns<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        match self {
            VariableKind::PlainData => vec![name],
            VariableKind::Dispersion(base) => vec![base.as_str()],
            VariableKind::TotalDispersion => VELOCITY_COMPONENTS.to_vec(),
            VariableKind::Weight(_) | VariableKind::Radius(_) | VariableKind::Angle => Vec::new(),
        }
    }
}
