//! Spatial axes and projection directions.

use crate::error::ProjectionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three spatial axes of the simulation box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Index into `[x, y, z]` triples.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Name of the integer grid-coordinate column for this axis.
    pub fn coordinate_column(self) -> &'static str {
        match self {
            Axis::X => "cx",
            Axis::Y => "cy",
            Axis::Z => "cz",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line-of-sight direction of a projection.
///
/// The two remaining axes form the output plane, in right-handed order
/// for `z` and `x`, and `(x, z)` for `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    X,
    Y,
    #[default]
    Z,
}

impl Direction {
    /// The (horizontal, vertical) axes of the output plane.
    pub fn plane_axes(self) -> (Axis, Axis) {
        match self {
            Direction::X => (Axis::Y, Axis::Z),
            Direction::Y => (Axis::X, Axis::Z),
            Direction::Z => (Axis::X, Axis::Y),
        }
    }

    /// The axis collapsed by the projection.
    pub fn depth_axis(self) -> Axis {
        match self {
            Direction::X => Axis::X,
            Direction::Y => Axis::Y,
            Direction::Z => Axis::Z,
        }
    }
}

impl FromStr for Direction {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "x" => Ok(Direction::X),
            "y" => Ok(Direction::Y),
            "z" => Ok(Direction::Z),
            other => Err(ProjectionError::UnknownDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.depth_axis().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_axes() {
        assert_eq!(Direction::Z.plane_axes(), (Axis::X, Axis::Y));
        assert_eq!(Direction::Y.plane_axes(), (Axis::X, Axis::Z));
        assert_eq!(Direction::X.plane_axes(), (Axis::Y, Axis::Z));
        assert_eq!(Direction::X.depth_axis(), Axis::X);
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!("Z".parse::<Direction>().unwrap(), Direction::Z);
        assert_eq!(" y ".parse::<Direction>().unwrap(), Direction::Y);
        assert!("w".parse::<Direction>().is_err());
    }
}
