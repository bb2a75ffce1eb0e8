//! The projection entry point.
//!
//! One call runs a linear pipeline: validate the request, resolve the grid,
//! plan the variables, bin every level into a fresh [`AccumulationContext`],
//! then turn the accumulators into the requested maps.

use crate::config::ProjectionConfig;
use crate::context::{Accumulated, AccumulationContext};
use crate::error::raster_error;
use crate::geometry::GridGeometry;
use crate::level::{process_level, LevelInputs, LevelScale, SlotColumn};
use crate::postprocess::{
    angle_map, combine_dispersions, derive_dispersion, radius_map, weighted_average, Moment,
};
use crate::threading::should_use_variable_threading;
use crate::types::{ProjectionMaps, ProjectionRequest};
use crate::weights::{checked_column, weight_field};
use amr_common::variable::VELOCITY_COMPONENTS;
use amr_common::{
    AccumulationMode, Axis, CellSource, MapMode, ProjectionError, ProjectionResult,
    UnitConverter, UnitScale, VariableKind, WeightQuantity, Weighting,
};
use raster::Raster;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A requested variable after classification and unit lookup.
#[derive(Debug, Clone)]
struct PlannedVariable {
    name: String,
    kind: VariableKind,
    scale: UnitScale,
}

/// Accumulator slot of the second moment of `base`.
fn second_moment_slot(base: &str) -> String {
    format!("{}^2", base)
}

fn check_weighting(name: &str, kind: &VariableKind, weighting: Weighting) -> ProjectionResult<()> {
    let compatible = match kind {
        VariableKind::Weight(WeightQuantity::SurfaceDensity)
        | VariableKind::Weight(WeightQuantity::Mass) => weighting == Weighting::Mass,
        VariableKind::Weight(WeightQuantity::Volume) => weighting == Weighting::Volume,
        VariableKind::Dispersion(_) | VariableKind::TotalDispersion => {
            weighting != Weighting::None
        }
        VariableKind::PlainData | VariableKind::Radius(_) | VariableKind::Angle => true,
    };
    if compatible {
        Ok(())
    } else {
        Err(ProjectionError::IncompatibleWeighting {
            variable: name.to_string(),
            weighting: weighting.to_string(),
        })
    }
}

fn plan_variables<S, C>(
    source: &S,
    request: &ProjectionRequest,
    converter: &C,
) -> ProjectionResult<Vec<PlannedVariable>>
where
    S: CellSource + ?Sized,
    C: UnitConverter + ?Sized,
{
    if request.variables.is_empty() {
        return Err(ProjectionError::NoVariables);
    }
    if !request.units.is_empty() && request.units.len() != request.variables.len() {
        return Err(ProjectionError::UnitCountMismatch {
            variables: request.variables.len(),
            units: request.units.len(),
        });
    }

    request
        .variables
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let kind = VariableKind::classify(name);
            check_weighting(name, &kind, request.weighting)?;
            for column in kind.required_columns(name) {
                checked_column(source, column)?;
            }
            let scale = converter.scale(name, request.unit_for(i))?;
            Ok(PlannedVariable {
                name: name.clone(),
                kind,
                scale,
            })
        })
        .collect()
}

/// Histogram slots needed by the plan, keyed by slot name.
fn plan_slots<'a, S>(
    source: &'a S,
    plan: &[PlannedVariable],
) -> ProjectionResult<BTreeMap<String, SlotColumn<'a>>>
where
    S: CellSource + ?Sized,
{
    let mut slots = BTreeMap::new();
    let add_moments = |slots: &mut BTreeMap<String, SlotColumn<'a>>, base: &str| {
        let column = checked_column(source, base)?;
        slots.insert(base.to_string(), SlotColumn::Values(column));
        slots.insert(second_moment_slot(base), SlotColumn::Squared(column));
        Ok::<(), ProjectionError>(())
    };

    for var in plan {
        match &var.kind {
            VariableKind::PlainData => {
                let column = checked_column(source, &var.name)?;
                slots.insert(var.name.clone(), SlotColumn::Values(column));
            }
            VariableKind::Dispersion(base) => add_moments(&mut slots, base)?,
            VariableKind::TotalDispersion => {
                for base in VELOCITY_COMPONENTS {
                    add_moments(&mut slots, base)?;
                }
            }
            VariableKind::Weight(_) | VariableKind::Radius(_) | VariableKind::Angle => {}
        }
    }
    Ok(slots)
}

fn check_table_shape<S>(source: &S) -> ProjectionResult<()>
where
    S: CellSource + ?Sized,
{
    let rows = source.row_count();
    if source.levels().len() != rows {
        return Err(ProjectionError::ColumnLengthMismatch {
            column: "level".to_string(),
            expected: rows,
            actual: source.levels().len(),
        });
    }
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let len = source.coordinates(axis).len();
        if len != rows {
            return Err(ProjectionError::ColumnLengthMismatch {
                column: axis.coordinate_column().to_string(),
                expected: rows,
                actual: len,
            });
        }
    }
    Ok(())
}

/// Project `source` onto a 2D grid.
///
/// Either every requested map is produced or the call fails; nothing is
/// shared with other calls.
pub fn project<S, C>(
    source: &S,
    request: &ProjectionRequest,
    converter: &C,
    config: &ProjectionConfig,
) -> ProjectionResult<ProjectionMaps>
where
    S: CellSource + ?Sized,
    C: UnitConverter + ?Sized,
{
    let start = Instant::now();
    config.validate().map_err(ProjectionError::Config)?;
    check_table_shape(source)?;

    let rows = source.row_count();
    let levels = source.levels();

    let mut selected = vec![request.mask.is_none(); rows];
    if let Some(mask) = &request.mask {
        for row in source.masked_rows(mask)? {
            selected[row] = true;
        }
    }

    let level_range = levels
        .iter()
        .zip(&selected)
        .filter(|(_, &keep)| keep)
        .fold(None, |acc: Option<(u32, u32)>, (&l, _)| match acc {
            None => Some((l, l)),
            Some((lo, hi)) => Some((lo.min(l), hi.max(l))),
        });

    let geometry = GridGeometry::resolve(source.boxlen(), level_range, request, converter)?;
    let plan = plan_variables(source, request, converter)?;
    let weights = weight_field(source, request.weighting)?;

    let depth = source.coordinates(geometry.direction.depth_axis());
    let mut outside_slab = 0usize;
    for ((keep, &level), &z) in selected.iter_mut().zip(levels).zip(depth) {
        if *keep && !geometry.in_slab(level, z) {
            *keep = false;
            outside_slab += 1;
        }
    }
    let total_cells = selected.iter().filter(|&&keep| keep).count();

    debug!(
        rows = rows,
        selected = total_cells,
        outside_slab = outside_slab,
        resolution = geometry.resolution,
        shape = ?geometry.shape(),
        direction = %geometry.direction,
        weighting = %request.weighting,
        "projection grid resolved"
    );

    let slots = plan_slots(source, &plan)?;
    let ctx = AccumulationContext::new(geometry.shape(), slots.keys().cloned());
    let (h_axis, v_axis) = geometry.plane;
    let inputs = LevelInputs {
        horizontal: source.coordinates(h_axis),
        vertical: source.coordinates(v_axis),
        levels,
        selected: &selected,
        weights: &weights,
        slots: slots.into_iter().collect(),
        range_x: geometry.range_x,
        range_y: geometry.range_y,
        resolution: geometry.resolution,
        enhanced_coverage: config.enhanced_coverage,
        sparse_threshold: config.sparse_threshold,
    };

    let level_list: Vec<u32> = match level_range {
        Some((lo, hi)) => (lo..=hi).collect(),
        None => Vec::new(),
    };
    if let Some(&deepest) = level_list.last() {
        let scale = LevelScale::new(deepest, geometry.resolution);
        if scale.scale_factor < 1.0 {
            warn!(
                level = deepest,
                scale_factor = scale.scale_factor,
                "cells smaller than one pixel are binned to their nearest pixel"
            );
        }
    }

    let variable_threading = should_use_variable_threading(
        inputs.slots.len(),
        config.max_threads,
        level_list.len(),
        total_cells,
    );

    let n_levels = level_list.len();
    let run_level = |level: u32, parallel_slots: bool| -> ProjectionResult<()> {
        let summary = process_level(&ctx, &inputs, level, parallel_slots)?;
        if config.show_progress {
            info!(
                level = level,
                cells = summary.cells,
                done = ctx.levels_done(),
                total = n_levels,
                "level finished"
            );
        }
        Ok(())
    };

    if config.max_threads > 1 && n_levels > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_threads)
            .build()
            .map_err(|e| ProjectionError::ThreadPool(e.to_string()))?;
        pool.install(|| {
            if variable_threading {
                level_list.iter().try_for_each(|&l| run_level(l, true))
            } else {
                level_list.par_iter().try_for_each(|&l| run_level(l, false))
            }
        })?;
    } else {
        level_list.iter().try_for_each(|&l| run_level(l, false))?;
    }

    let levels_processed = ctx.levels_processed();
    let levels_skipped = ctx.levels_skipped();
    let accumulated = ctx.finish()?;

    let mut maps = BTreeMap::new();
    let mut units = BTreeMap::new();
    let mut modes = BTreeMap::new();
    for var in &plan {
        let (map, mode) = build_map(var, &accumulated, &geometry, request)?;
        if map.shape() != geometry.shape() {
            return Err(ProjectionError::shape_mismatch(
                var.name.as_str(),
                geometry.shape(),
                map.shape(),
            ));
        }
        maps.insert(var.name.clone(), map);
        units.insert(var.name.clone(), var.scale.label.clone());
        modes.insert(var.name.clone(), mode);
    }

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if config.verbose {
        info!(
            variables = ?request.variables,
            resolution = geometry.resolution,
            shape = ?geometry.shape(),
            cells = total_cells,
            levels_processed = levels_processed,
            levels_skipped = levels_skipped,
            variable_threading = variable_threading,
            elapsed_ms = elapsed_ms,
            "projection finished"
        );
    } else {
        debug!(
            cells = total_cells,
            levels_processed = levels_processed,
            elapsed_ms = elapsed_ms,
            "projection finished"
        );
    }

    Ok(ProjectionMaps {
        maps,
        units,
        modes,
        metadata: geometry.metadata(request),
        levels: accumulated.summaries,
    })
}

/// Weighted mean of one accumulated slot, in code units.
fn slot_average(acc: &Accumulated, slot: &str, level: u32) -> ProjectionResult<Raster> {
    let mut map = acc
        .data
        .get(slot)
        .cloned()
        .ok_or_else(|| ProjectionError::MissingSlot {
            variable: slot.to_string(),
            level,
        })?;
    weighted_average(&mut map, &acc.weight).map_err(|e| raster_error(slot, e))?;
    Ok(map)
}

fn dispersion(acc: &Accumulated, base: &str, level: u32, out_scale: f64) -> ProjectionResult<Raster> {
    let mean = slot_average(acc, base, level)?;
    let mean_sq = slot_average(acc, &second_moment_slot(base), level)?;
    derive_dispersion(Moment::code(&mean), Moment::code(&mean_sq), out_scale)
        .map_err(|e| raster_error(base, e))
}

fn build_map(
    var: &PlannedVariable,
    acc: &Accumulated,
    geometry: &GridGeometry,
    request: &ProjectionRequest,
) -> ProjectionResult<(Raster, MapMode)> {
    let factor = var.scale.factor;
    let deepest = geometry.level_range.1;
    let data_mode = MapMode::for_data(request.weighting, request.mode);

    match &var.kind {
        VariableKind::Weight(quantity) => {
            let mut map = acc.weight.clone();
            let normalization = match quantity {
                WeightQuantity::SurfaceDensity => geometry.pixel_area(),
                WeightQuantity::Mass | WeightQuantity::Volume => 1.0,
            };
            map.scale(factor / normalization);
            Ok((map, MapMode::Summed))
        }
        VariableKind::PlainData => {
            let mut map = if matches!(data_mode, MapMode::Summed) {
                acc.data.get(&var.name).cloned().ok_or_else(|| {
                    ProjectionError::MissingSlot {
                        variable: var.name.clone(),
                        level: deepest,
                    }
                })?
            } else {
                slot_average(acc, &var.name, deepest)?
            };
            map.scale(factor);
            Ok((map, data_mode))
        }
        VariableKind::Dispersion(base) => {
            let map = dispersion(acc, base, deepest, factor)?;
            Ok((map, MapMode::for_data(request.weighting, AccumulationMode::Standard)))
        }
        VariableKind::TotalDispersion => {
            let components = VELOCITY_COMPONENTS
                .iter()
                .map(|base| dispersion(acc, base, deepest, 1.0))
                .collect::<ProjectionResult<Vec<_>>>()?;
            let mut map =
                combine_dispersions(&components).map_err(|e| raster_error(&var.name, e))?;
            map.scale(factor);
            Ok((map, MapMode::for_data(request.weighting, AccumulationMode::Standard)))
        }
        VariableKind::Radius(_) => Ok((radius_map(geometry, factor), MapMode::Analytic)),
        VariableKind::Angle => Ok((angle_map(geometry, factor), MapMode::Analytic)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amr_common::{CellTable, ScaleTable};

    fn two_level_table() -> CellTable {
        let mut t = CellTable::new(1.0);
        t.push_cell(0, [1, 1, 1], &[("mass", 10.0), ("vx", 1.0)]);
        t.push_cell(1, [3, 3, 1], &[("mass", 5.0), ("vx", 4.0)]);
        t
    }

    #[test]
    fn test_end_to_end_two_levels() {
        let table = two_level_table();
        let request = ProjectionRequest::new(["mass"]).with_resolution(4);
        let maps = project(
            &table,
            &request,
            &ScaleTable::identity(),
            &ProjectionConfig::sequential(),
        )
        .unwrap();

        let mass = maps.map("mass").unwrap();
        assert_eq!(mass.shape(), (4, 4));
        assert!((mass.sum() - 15.0).abs() < 1e-12);
        // level 0: 10 / 16 everywhere; level 1 cell pinned to the far corner
        assert!((mass.get(0, 0).unwrap() - 0.625).abs() < 1e-12);
        assert!((mass.get(3, 3).unwrap() - 5.625).abs() < 1e-12);

        assert_eq!(maps.levels.len(), 2);
        assert_eq!(maps.levels[0].correction_factor, 1.0 / 16.0);
        assert_eq!(maps.levels[1].correction_factor, 0.25);
        assert_eq!(maps.metadata.level_range, (0, 1));
    }

    #[test]
    fn test_plain_variable_is_mass_weighted() {
        let table = two_level_table();
        let request = ProjectionRequest::new(["vx"]).with_resolution(4);
        let maps = project(
            &table,
            &request,
            &ScaleTable::identity(),
            &ProjectionConfig::sequential(),
        )
        .unwrap();
        let vx = maps.map("vx").unwrap();
        assert!((vx.get(0, 0).unwrap() - 1.0).abs() < 1e-12);
        // (0.625 * 1 + 5 * 4) / 5.625
        assert!((vx.get(3, 3).unwrap() - 20.625 / 5.625).abs() < 1e-12);
        assert_eq!(maps.mode("vx"), Some(MapMode::MassWeighted));
    }

    #[test]
    fn test_sum_mode_skips_division() {
        let table = two_level_table();
        let request = ProjectionRequest::new(["vx"])
            .with_resolution(4)
            .with_mode(AccumulationMode::Sum);
        let maps = project(
            &table,
            &request,
            &ScaleTable::identity(),
            &ProjectionConfig::sequential(),
        )
        .unwrap();
        assert!((maps.map("vx").unwrap().sum() - 30.0).abs() < 1e-12);
        assert_eq!(maps.mode("vx"), Some(MapMode::Summed));
    }

    #[test]
    fn test_incompatible_weighting() {
        let table = two_level_table();
        let request = ProjectionRequest::new(["sd"])
            .with_resolution(4)
            .with_weighting(Weighting::Volume);
        let err = project(
            &table,
            &request,
            &ScaleTable::identity(),
            &ProjectionConfig::sequential(),
        )
        .unwrap_err();
        assert!(matches!(err, ProjectionError::IncompatibleWeighting { .. }));
    }

    #[test]
    fn test_missing_variable_column() {
        let table = two_level_table();
        let request = ProjectionRequest::new(["sigma_vy"]).with_resolution(4);
        let err = project(
            &table,
            &request,
            &ScaleTable::identity(),
            &ProjectionConfig::sequential(),
        )
        .unwrap_err();
        assert!(matches!(err, ProjectionError::MissingColumn(ref c) if c == "vy"));
    }

    #[test]
    fn test_unit_count_mismatch() {
        let table = two_level_table();
        let request = ProjectionRequest::new(["mass", "vx"]).with_units(["standard"]);
        let err = project(
            &table,
            &request,
            &ScaleTable::identity(),
            &ProjectionConfig::sequential(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::UnitCountMismatch {
                variables: 2,
                units: 1
            }
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let table = two_level_table();
        let config = ProjectionConfig {
            max_threads: 0,
            ..ProjectionConfig::sequential()
        };
        let err = project(
            &table,
            &ProjectionRequest::new(["mass"]),
            &ScaleTable::identity(),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, ProjectionError::Config(_)));
    }
}
