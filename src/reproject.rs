use crate::crs;
use crate::error::{Result, TransitionError};
use crate::geotransform::GeoTransform;
use crate::io::ClassifiedRaster;
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use log::{debug, info, warn};
use ndarray::Array2;

/// Upper bound on either output dimension, to catch runaway extents.
const MAX_OUTPUT_DIM: usize = 100_000;

/// Output grid for a warp: north-up, square pixels, covering the transformed
/// source extent with about as many pixels as the source has.
pub fn suggest_output_grid(
    bounds: [f64; 4],
    src_cols: usize,
    src_rows: usize,
) -> Option<(GeoTransform, usize, usize)> {
    let [min_x, min_y, max_x, max_y] = bounds;
    let width = max_x - min_x;
    let height = max_y - min_y;
    if !(width > 0.0 && height > 0.0) || src_cols == 0 || src_rows == 0 {
        return None;
    }

    let resolution = ((width * height) / (src_cols as f64 * src_rows as f64)).sqrt();
    let cols = (width / resolution).round().max(1.0) as usize;
    let rows = (height / resolution).round().max(1.0) as usize;
    if cols > MAX_OUTPUT_DIM || rows > MAX_OUTPUT_DIM {
        return None;
    }

    Some((
        GeoTransform::north_up(min_x, max_y, width / cols as f64, -height / rows as f64),
        cols,
        rows,
    ))
}

/// Warp a class grid into `target` by nearest-neighbour inverse mapping.
///
/// Every output pixel centre is transformed back into the source system and
/// takes the value of the source pixel it falls in, or the no-data sentinel
/// when it falls outside the source grid.
pub fn reproject_nearest(
    raster: &ClassifiedRaster,
    target: &SpatialRef,
    resource: &str,
) -> Result<ClassifiedRaster> {
    let source = crs::from_wkt(&raster.projection, resource)?;
    let (src_rows, src_cols) = raster.shape();

    let forward = crs::transformer(&source, target, resource)?;
    let inverse = crs::transformer(target, &source, resource)?;

    let src_bounds = raster.geotransform.bounds(src_cols, src_rows);
    let dst_bounds = crs::transform_bounds(&forward, src_bounds, resource)?;

    let (dst_gt, dst_cols, dst_rows) = suggest_output_grid(dst_bounds, src_cols, src_rows)
        .ok_or_else(|| {
            TransitionError::geometry(resource, "cannot derive an output grid for reprojection")
        })?;

    info!(
        "Reprojecting {}x{} -> {}x{} (pixel size {:.3})",
        src_cols, src_rows, dst_cols, dst_rows, dst_gt.pixel_width
    );

    let mut grid = Array2::from_elem((dst_rows, dst_cols), raster.nodata);
    let mut xs = vec![0.0; dst_cols];
    let mut ys = vec![0.0; dst_cols];
    let mut failed_rows = 0usize;

    for row in 0..dst_rows {
        for col in 0..dst_cols {
            let (x, y) = dst_gt.pixel_center(col, row);
            xs[col] = x;
            ys[col] = y;
        }

        if !transform_row(&inverse, &mut xs, &mut ys) {
            failed_rows += 1;
        }

        for (col, (&x, &y)) in xs.iter().zip(ys.iter()).enumerate() {
            let hit = source_index(&raster.geotransform, x, y, src_cols, src_rows);
            if let Some((src_col, src_row)) = hit {
                grid[[row, col]] = raster.grid[[src_row, src_col]];
            }
        }
    }

    if failed_rows > 0 {
        warn!(
            "{} output row(s) had points outside the source projection domain",
            failed_rows
        );
    }

    Ok(ClassifiedRaster {
        grid,
        geotransform: dst_gt,
        projection: target
            .to_wkt()
            .map_err(|e| TransitionError::geometry(resource, e))?,
        nodata: raster.nodata,
    })
}

/// Transform a row of points in one call, falling back to point-by-point when
/// the batch fails. Points that cannot be transformed become NaN.
fn transform_row(ct: &CoordTransform, xs: &mut [f64], ys: &mut [f64]) -> bool {
    let (orig_x, orig_y) = (xs.to_vec(), ys.to_vec());
    if ct.transform_coords(xs, ys, &mut []).is_ok() {
        return true;
    }

    debug!("Batch transform failed, retrying point by point");
    for i in 0..xs.len() {
        let mut x = [orig_x[i]];
        let mut y = [orig_y[i]];
        if ct.transform_coords(&mut x, &mut y, &mut []).is_ok() {
            xs[i] = x[0];
            ys[i] = y[0];
        } else {
            xs[i] = f64::NAN;
            ys[i] = f64::NAN;
        }
    }
    false
}

/// Source pixel containing world point (x, y), if any.
fn source_index(
    gt: &GeoTransform,
    x: f64,
    y: f64,
    cols: usize,
    rows: usize,
) -> Option<(usize, usize)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let (col, row) = gt.invert(x, y)?;
    if col < 0.0 || row < 0.0 {
        return None;
    }
    let (col, row) = (col.floor() as usize, row.floor() as usize);
    if col >= cols || row >= rows {
        return None;
    }
    Some((col, row))
}
