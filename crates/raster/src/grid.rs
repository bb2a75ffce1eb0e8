//! Dense 2D raster of f64 values.

use crate::error::{RasterError, RasterResult};
use serde::{Deserialize, Serialize};

/// A fixed-size 2D array with shape `(nx, ny)`.
///
/// Storage is first-axis major: element `(i, j)` lives at `i * ny + j`, so a
/// raster built from bin ranges `(range_x, range_y)` has shape
/// `(range_x.len(), range_y.len())`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Raster {
    nx: usize,
    ny: usize,
    data: Vec<f64>,
}

impl Raster {
    /// Create a zero-filled raster.
    pub fn zeros(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            data: vec![0.0; nx * ny],
        }
    }

    /// Create a raster by evaluating `f(i, j)` for every element.
    pub fn from_fn<F>(nx: usize, ny: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut data = Vec::with_capacity(nx * ny);
        for i in 0..nx {
            for j in 0..ny {
                data.push(f(i, j));
            }
        }
        Self { nx, ny, data }
    }

    /// Wrap existing first-axis-major data.
    pub fn from_vec(nx: usize, ny: usize, data: Vec<f64>) -> RasterResult<Self> {
        if data.len() != nx * ny {
            return Err(RasterError::LengthMismatch {
                array: "data",
                expected: nx * ny,
                actual: data.len(),
            });
        }
        Ok(Self { nx, ny, data })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.nx || j >= self.ny {
            return None;
        }
        Some(self.data[i * self.ny + j])
    }

    /// Add `value` to element `(i, j)`. Indices must be in bounds.
    #[inline]
    pub(crate) fn add_at(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.ny + j] += value;
    }

    /// Reshape to `(nx, ny)` and zero every element, keeping the allocation.
    pub fn reset(&mut self, nx: usize, ny: usize) {
        self.nx = nx;
        self.ny = ny;
        self.data.clear();
        self.data.resize(nx * ny, 0.0);
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    pub fn check_shape(&self, expected: (usize, usize)) -> RasterResult<()> {
        if self.shape() != expected {
            return Err(RasterError::ShapeMismatch {
                expected,
                actual: self.shape(),
            });
        }
        Ok(())
    }

    /// `self += other * factor`, element-wise.
    pub fn add_scaled(&mut self, other: &Raster, factor: f64) -> RasterResult<()> {
        other.check_shape(self.shape())?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b * factor;
        }
        Ok(())
    }

    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.data {
            *v *= factor;
        }
    }

    pub fn map_inplace<F>(&mut self, mut f: F)
    where
        F: FnMut(f64) -> f64,
    {
        for v in &mut self.data {
            *v = f(*v);
        }
    }

    /// Element-wise `self / weight`, yielding 0 wherever the weight is 0.
    pub fn divide_by(&mut self, weight: &Raster) -> RasterResult<()> {
        weight.check_shape(self.shape())?;
        for (v, &w) in self.data.iter_mut().zip(&weight.data) {
            *v = if w == 0.0 { 0.0 } else { *v / w };
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Smallest and largest finite values, `None` if there are none.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_first_axis_major() {
        let r = Raster::from_fn(2, 3, |i, j| (i * 10 + j) as f64);
        assert_eq!(r.shape(), (2, 3));
        assert_eq!(r.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(r.get(1, 2), Some(12.0));
        assert_eq!(r.get(2, 0), None);
    }

    #[test]
    fn test_add_scaled_shape_check() {
        let mut a = Raster::zeros(2, 2);
        let b = Raster::from_fn(2, 2, |_, _| 4.0);
        a.add_scaled(&b, 0.25).unwrap();
        assert_eq!(a.sum(), 4.0);

        let c = Raster::zeros(3, 2);
        assert_eq!(
            a.add_scaled(&c, 1.0),
            Err(RasterError::ShapeMismatch {
                expected: (2, 2),
                actual: (3, 2)
            })
        );
    }

    #[test]
    fn test_divide_by_zero_weight_is_zero() {
        let mut data = Raster::from_vec(1, 3, vec![2.0, 5.0, 0.0]).unwrap();
        let weight = Raster::from_vec(1, 3, vec![2.0, 0.0, 0.0]).unwrap();
        data.divide_by(&weight).unwrap();
        assert_eq!(data.data(), &[1.0, 0.0, 0.0]);
        assert!(data.data().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_min_max_ignores_non_finite() {
        let r = Raster::from_vec(1, 4, vec![3.0, f64::NAN, -1.0, f64::INFINITY]).unwrap();
        assert_eq!(r.min_max(), Some((-1.0, 3.0)));
        assert_eq!(Raster::zeros(0, 0).min_max(), None);
    }

    #[test]
    fn test_reset_reuses_allocation() {
        let mut r = Raster::from_fn(4, 4, |_, _| 1.0);
        r.reset(2, 3);
        assert_eq!(r.shape(), (2, 3));
        assert_eq!(r.sum(), 0.0);
    }
}
