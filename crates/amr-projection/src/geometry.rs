//! Output grid resolution, bin ranges and extents.
//!
//! Pixel `k` (1-based) along a plane axis covers box fractions
//! `[(k - 1) / res, k / res]`, so its centre sits at `(k - 0.5) / res`. A cell
//! centre at box fraction `p` maps to the continuous pixel coordinate
//! `p * res + 0.5`, which is exactly `k` at the centre of pixel `k`.

use crate::types::{GridMetadata, ProjectionRequest};
use amr_common::{Axis, BoxRegion, Direction, ProjectionError, ProjectionResult, UnitConverter};
use raster::BinRange;

/// Deepest level accepted for the default `2^lmax` resolution.
const MAX_DEFAULT_LEVEL: u32 = 30;

/// Resolved output grid of one call.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    pub direction: Direction,
    /// (horizontal, vertical) plane axes.
    pub plane: (Axis, Axis),
    /// Pixels across the full box.
    pub resolution: usize,
    pub range_x: BinRange,
    pub range_y: BinRange,
    pub region: BoxRegion,
    pub boxlen: f64,
    pub length_unit: String,
    /// `length_unit` lengths per code length.
    pub length_factor: f64,
    /// Shallowest and deepest level covered.
    pub level_range: (u32, u32),
}

fn plane_bins(bounds: [f64; 2], resolution: usize) -> ProjectionResult<BinRange> {
    let res = resolution as f64;
    let first = ((bounds[0] * res).floor() as i64 + 1).clamp(1, resolution as i64);
    let last = ((bounds[1] * res).ceil() as i64).clamp(first, resolution as i64);
    BinRange::unit(first, last).map_err(|e| ProjectionError::InvalidResolution(e.to_string()))
}

impl GridGeometry {
    /// Resolve the grid for `request` over a box of length `boxlen`.
    ///
    /// `level_range` is the level span of the selected cells, `None` when no
    /// cell is selected.
    pub fn resolve<C>(
        boxlen: f64,
        level_range: Option<(u32, u32)>,
        request: &ProjectionRequest,
        converter: &C,
    ) -> ProjectionResult<Self>
    where
        C: UnitConverter + ?Sized,
    {
        let length_unit = request.range.range_unit.clone();
        let length_factor = converter.scale("range", &length_unit)?.factor;
        let region = request.range.resolve(boxlen, length_factor)?;

        let (lmin, lmax_data) = level_range.unwrap_or((0, 0));
        let lmax = request.lmax.unwrap_or(lmax_data);

        let resolution = match (request.resolution, request.pixel_size) {
            (Some(0), _) => {
                return Err(ProjectionError::InvalidResolution(
                    "resolution must be > 0".to_string(),
                ))
            }
            (Some(res), _) => res,
            (None, Some(size)) => {
                if size.is_nan() || size <= 0.0 || size.is_infinite() {
                    return Err(ProjectionError::InvalidResolution(format!(
                        "pixel size must be positive and finite, got {}",
                        size
                    )));
                }
                ((boxlen * length_factor / size).round() as usize).max(1)
            }
            (None, None) => {
                if lmax > MAX_DEFAULT_LEVEL {
                    return Err(ProjectionError::InvalidResolution(format!(
                        "default resolution 2^{} is too large, set resolution or pixel_size",
                        lmax
                    )));
                }
                1usize << lmax
            }
        };

        let plane = request.direction.plane_axes();
        let range_x = plane_bins(region.axis(plane.0), resolution)?;
        let range_y = plane_bins(region.axis(plane.1), resolution)?;

        Ok(Self {
            direction: request.direction,
            plane,
            resolution,
            range_x,
            range_y,
            region,
            boxlen,
            length_unit,
            length_factor,
            level_range: (lmin, lmax_data.max(lmin)),
        })
    }

    /// Map shape `(length1, length2)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.range_x.len, self.range_y.len)
    }

    /// Pixel edge length in code units.
    pub fn pixel_size(&self) -> f64 {
        self.boxlen / self.resolution as f64
    }

    /// Pixel area in code units.
    pub fn pixel_area(&self) -> f64 {
        self.pixel_size().powi(2)
    }

    /// Box fraction of the centre of zero-based pixel `(i, j)`.
    pub fn pixel_center(&self, i: usize, j: usize) -> (f64, f64) {
        let res = self.resolution as f64;
        (
            (self.range_x.value(i) - 0.5) / res,
            (self.range_y.value(j) - 0.5) / res,
        )
    }

    /// Reference centre projected onto the plane, in box fractions.
    pub fn plane_center(&self) -> (f64, f64) {
        (
            self.region.center[self.plane.0.index()],
            self.region.center[self.plane.1.index()],
        )
    }

    /// Whether a cell lies inside the line-of-sight slab.
    pub fn in_slab(&self, level: u32, depth_coordinate: i64) -> bool {
        let position = (depth_coordinate as f64 - 0.5) / 2f64.powi(level as i32);
        self.region.contains(self.direction.depth_axis(), position)
    }

    /// Pixel-edge extent `[h_min, h_max, v_min, v_max]` in `length_unit`.
    pub fn extent(&self) -> [f64; 4] {
        let to_unit = self.boxlen * self.length_factor / self.resolution as f64;
        [
            (self.range_x.min - 1.0) * to_unit,
            self.range_x.max() * to_unit,
            (self.range_y.min - 1.0) * to_unit,
            self.range_y.max() * to_unit,
        ]
    }

    /// Reference centre in `length_unit`.
    pub fn center(&self) -> [f64; 3] {
        let to_unit = self.boxlen * self.length_factor;
        let c = self.region.center;
        [c[0] * to_unit, c[1] * to_unit, c[2] * to_unit]
    }

    /// [`GridGeometry::extent`] relative to the reference centre.
    pub fn center_extent(&self) -> [f64; 4] {
        let [h0, h1, v0, v1] = self.extent();
        let c = self.center();
        let ch = c[self.plane.0.index()];
        let cv = c[self.plane.1.index()];
        [h0 - ch, h1 - ch, v0 - cv, v1 - cv]
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.range_x.len as f64 / self.range_y.len as f64
    }

    pub fn metadata(&self, request: &ProjectionRequest) -> GridMetadata {
        GridMetadata {
            direction: self.direction,
            plane_axes: self.plane,
            resolution: self.resolution,
            shape: self.shape(),
            bins: (self.range_x, self.range_y),
            ranges: self.region.bounds,
            extent: self.extent(),
            center_extent: self.center_extent(),
            center: self.center(),
            length_unit: self.length_unit.clone(),
            pixel_size: self.pixel_size() * self.length_factor,
            aspect_ratio: self.aspect_ratio(),
            boxlen: self.boxlen,
            weighting: request.weighting,
            mode: request.mode,
            level_range: self.level_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_common::{ScaleTable, SpatialRange};

    fn resolve(request: &ProjectionRequest) -> ProjectionResult<GridGeometry> {
        GridGeometry::resolve(1.0, Some((3, 6)), request, &ScaleTable::identity())
    }

    #[test]
    fn test_default_resolution_from_lmax() {
        let geom = resolve(&ProjectionRequest::new(["rho"])).unwrap();
        assert_eq!(geom.resolution, 64);
        assert_eq!(geom.shape(), (64, 64));
        assert_eq!(geom.range_x, BinRange::unit(1, 64).unwrap());
        assert_eq!(geom.level_range, (3, 6));

        let geom = resolve(&ProjectionRequest::new(["rho"]).with_lmax(4)).unwrap();
        assert_eq!(geom.resolution, 16);
    }

    #[test]
    fn test_pixel_size_sets_resolution() {
        let mut table = ScaleTable::identity();
        table.insert("kpc", 100.0);
        let request = ProjectionRequest::new(["rho"])
            .with_pixel_size(0.5)
            .with_range(SpatialRange::new().with_unit("kpc"));
        let geom = GridGeometry::resolve(1.0, Some((0, 2)), &request, &table).unwrap();
        assert_eq!(geom.resolution, 200);
        assert!((geom.metadata(&request).pixel_size - 0.5).abs() < 1e-12);
        assert!((geom.extent()[1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_resolution() {
        assert!(resolve(&ProjectionRequest::new(["rho"]).with_resolution(0)).is_err());
        assert!(resolve(&ProjectionRequest::new(["rho"]).with_pixel_size(-1.0)).is_err());
        assert!(resolve(&ProjectionRequest::new(["rho"]).with_lmax(40)).is_err());
    }

    #[test]
    fn test_sub_window_bins_and_extent() {
        let range = SpatialRange::new()
            .with_range(Axis::X, [0.25, 0.5])
            .with_range(Axis::Y, [0.0, 1.0]);
        let request = ProjectionRequest::new(["rho"])
            .with_resolution(8)
            .with_range(range);
        let geom = resolve(&request).unwrap();
        assert_eq!(geom.range_x, BinRange::unit(3, 4).unwrap());
        assert_eq!(geom.shape(), (2, 8));
        assert_eq!(geom.extent(), [0.25, 0.5, 0.0, 1.0]);
        assert_eq!(geom.aspect_ratio(), 0.25);
        let (cx, _) = geom.pixel_center(0, 0);
        assert!((cx - 0.3125).abs() < 1e-12);
    }

    #[test]
    fn test_direction_selects_plane() {
        let request = ProjectionRequest::new(["rho"])
            .with_resolution(8)
            .with_direction(Direction::Y)
            .with_range(SpatialRange::new().with_range(Axis::Z, [0.0, 0.5]));
        let geom = resolve(&request).unwrap();
        assert_eq!(geom.plane, (Axis::X, Axis::Z));
        assert_eq!(geom.shape(), (8, 4));
    }

    #[test]
    fn test_slab_selection() {
        let request = ProjectionRequest::new(["rho"])
            .with_resolution(4)
            .with_range(SpatialRange::new().with_range(Axis::Z, [0.0, 0.5]));
        let geom = resolve(&request).unwrap();
        // level 2 cells: centres at 0.125, 0.375, 0.625, 0.875
        assert!(geom.in_slab(2, 1));
        assert!(geom.in_slab(2, 2));
        assert!(!geom.in_slab(2, 3));
        assert!(!geom.in_slab(2, 4));
    }

    #[test]
    fn test_center_extent() {
        let range = SpatialRange::new().with_center([0.5, 0.5, 0.5]);
        let request = ProjectionRequest::new(["rho"]).with_resolution(4).with_range(range);
        let geom = resolve(&request).unwrap();
        assert_eq!(geom.center_extent(), [-0.5, 0.5, -0.5, 0.5]);
        assert_eq!(geom.plane_center(), (0.5, 0.5));
    }
}
