//! Unit conversion interface and a scale-factor table.
//!
//! The engine works in code units throughout and multiplies each finished map
//! by the factor returned from a [`UnitConverter`].

use crate::error::{ProjectionError, ProjectionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the identity unit.
pub const STANDARD_UNIT: &str = "standard";

// cgs constants
const CM_PER_KM: f64 = 1.0e5;
const CM_PER_AU: f64 = 1.495_978_707e13;
const CM_PER_LY: f64 = 9.460_730_472_580_8e17;
const CM_PER_PC: f64 = 3.085_677_581_491_367e18;
const CM_PER_KPC: f64 = CM_PER_PC * 1.0e3;
const CM_PER_MPC: f64 = CM_PER_PC * 1.0e6;
const G_PER_MSOL: f64 = 1.988_47e33;

/// Multiplicative factor from code units into a target unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitScale {
    pub factor: f64,
    pub label: String,
}

impl UnitScale {
    pub fn standard() -> Self {
        Self {
            factor: 1.0,
            label: STANDARD_UNIT.to_string(),
        }
    }
}

/// Resolves `(variable, unit)` into a scale factor.
///
/// Implementations must be deterministic and free of side effects.
pub trait UnitConverter: Sync {
    fn scale(&self, variable: &str, unit: &str) -> ProjectionResult<UnitScale>;
}

/// Code-to-cgs factors of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeUnits {
    /// Code length in cm.
    pub unit_l: f64,
    /// Code density in g/cm^3.
    pub unit_d: f64,
    /// Code time in s.
    pub unit_t: f64,
}

impl CodeUnits {
    pub fn unit_m(&self) -> f64 {
        self.unit_d * self.unit_l.powi(3)
    }

    pub fn unit_v(&self) -> f64 {
        self.unit_l / self.unit_t
    }
}

/// Lookup table of named scale factors.
///
/// `standard` always resolves to 1. Lookups ignore the variable name, which is
/// only used in error messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaleTable {
    #[serde(default)]
    scales: BTreeMap<String, f64>,
}

impl ScaleTable {
    /// Table containing only the identity unit.
    pub fn identity() -> Self {
        let mut table = Self::default();
        table.insert(STANDARD_UNIT, 1.0);
        table.insert("radian", 1.0);
        table.insert("degree", 180.0 / std::f64::consts::PI);
        table
    }

    /// Table for a snapshot with the given code units.
    pub fn from_code_units(units: CodeUnits) -> Self {
        let mut table = Self::identity();
        let l = units.unit_l;
        let m = units.unit_m();
        let v = units.unit_v();
        let d = units.unit_d;
        let sd = d * l;

        table.insert("cm", l);
        table.insert("km", l / CM_PER_KM);
        table.insert("au", l / CM_PER_AU);
        table.insert("ly", l / CM_PER_LY);
        table.insert("pc", l / CM_PER_PC);
        table.insert("kpc", l / CM_PER_KPC);
        table.insert("Mpc", l / CM_PER_MPC);

        table.insert("g", m);
        table.insert("kg", m / 1.0e3);
        table.insert("Msol", m / G_PER_MSOL);

        table.insert("cm_s", v);
        table.insert("km_s", v / CM_PER_KM);

        table.insert("g_cm3", d);
        table.insert("Msol_pc3", d * CM_PER_PC.powi(3) / G_PER_MSOL);
        table.insert("Msol_kpc3", d * CM_PER_KPC.powi(3) / G_PER_MSOL);

        table.insert("g_cm2", sd);
        table.insert("Msol_pc2", sd * CM_PER_PC.powi(2) / G_PER_MSOL);
        table.insert("Msol_kpc2", sd * CM_PER_KPC.powi(2) / G_PER_MSOL);

        table
    }

    pub fn insert(&mut self, unit: impl Into<String>, factor: f64) {
        self.scales.insert(unit.into(), factor);
    }

    pub fn get(&self, unit: &str) -> Option<f64> {
        if unit == STANDARD_UNIT {
            return Some(1.0);
        }
        self.scales.get(unit).copied()
    }
}

impl UnitConverter for ScaleTable {
    fn scale(&self, variable: &str, unit: &str) -> ProjectionResult<UnitScale> {
        let factor = self
            .get(unit)
            .ok_or_else(|| ProjectionError::unknown_unit(variable, unit))?;
        Ok(UnitScale {
            factor,
            label: unit.to_string(),
        })
    }
}
