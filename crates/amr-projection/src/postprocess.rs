//! Map post-processing: weighted averages, dispersions and analytic maps.

use crate::geometry::GridGeometry;
use raster::{Raster, RasterResult};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Divide an accumulated data raster by the weight raster in place.
///
/// Bins without weight become 0.
pub fn weighted_average(data: &mut Raster, weight: &Raster) -> RasterResult<()> {
    data.divide_by(weight)
}

/// A moment map together with the unit factor its values carry.
///
/// `scale` is the factor of the underlying variable: a first-moment map in
/// `km_s` has scale `unit_v / 1e5`, a second-moment map of the same variable
/// carries that factor squared.
#[derive(Debug, Clone, Copy)]
pub struct Moment<'a> {
    pub map: &'a Raster,
    pub scale: f64,
}

impl<'a> Moment<'a> {
    /// A map in code units.
    pub fn code(map: &'a Raster) -> Self {
        Self { map, scale: 1.0 }
    }

    pub fn scaled(map: &'a Raster, scale: f64) -> Self {
        Self { map, scale }
    }
}

/// `sqrt(max(0, <v^2> - <v>^2)) * out_scale`.
///
/// Both moments are brought back to code units before subtracting, so maps
/// delivered in different units combine correctly. Rounding that makes the
/// difference slightly negative yields 0.
pub fn derive_dispersion(
    mean: Moment<'_>,
    mean_sq: Moment<'_>,
    out_scale: f64,
) -> RasterResult<Raster> {
    mean_sq.map.check_shape(mean.map.shape())?;
    let (nx, ny) = mean.map.shape();
    let m_scale = mean.scale;
    let sq_scale = mean_sq.scale * mean_sq.scale;

    let data = mean
        .map
        .data()
        .iter()
        .zip(mean_sq.map.data())
        .map(|(&m, &m2)| {
            let m = m / m_scale;
            let m2 = m2 / sq_scale;
            (m2 - m * m).max(0.0).sqrt() * out_scale
        })
        .collect();
    Raster::from_vec(nx, ny, data)
}

/// `sqrt(sum sigma_i^2)` over per-component dispersion maps.
pub fn combine_dispersions(components: &[Raster]) -> RasterResult<Raster> {
    let Some(first) = components.first() else {
        return Ok(Raster::default());
    };
    let (nx, ny) = first.shape();
    let mut total = Raster::zeros(nx, ny);
    for sigma in components {
        sigma.check_shape((nx, ny))?;
        for (t, &s) in total.data_mut().iter_mut().zip(sigma.data()) {
            *t += s * s;
        }
    }
    total.map_inplace(f64::sqrt);
    Ok(total)
}

/// Azimuth of an in-plane offset, in `[0, 2pi)`.
///
/// Points on the vertical axis are resolved without a division; the origin
/// maps to 0.
pub fn pixel_angle(dx: f64, dy: f64) -> f64 {
    if dx == 0.0 {
        return if dy > 0.0 {
            FRAC_PI_2
        } else if dy < 0.0 {
            PI + FRAC_PI_2
        } else {
            0.0
        };
    }
    let angle = dy.atan2(dx);
    let angle = if angle < 0.0 { angle + TAU } else { angle };
    if angle >= TAU {
        0.0
    } else {
        angle
    }
}

/// In-plane distance of every pixel centre from the reference centre, in
/// `length_unit`. Cylindrical and spherical radii coincide on the projected
/// plane.
pub fn radius_map(geometry: &GridGeometry, length_scale: f64) -> Raster {
    let (nx, ny) = geometry.shape();
    let (cx, cy) = geometry.plane_center();
    let to_unit = geometry.boxlen * length_scale;
    Raster::from_fn(nx, ny, |i, j| {
        let (px, py) = geometry.pixel_center(i, j);
        ((px - cx) * to_unit).hypot((py - cy) * to_unit)
    })
}

/// Azimuth of every pixel centre around the reference centre, times
/// `angle_scale` (1 for radians).
pub fn angle_map(geometry: &GridGeometry, angle_scale: f64) -> Raster {
    let (nx, ny) = geometry.shape();
    let (cx, cy) = geometry.plane_center();
    Raster::from_fn(nx, ny, |i, j| {
        let (px, py) = geometry.pixel_center(i, j);
        pixel_angle(px - cx, py - cy) * angle_scale
    })
}
