//! All-touched polygon clipping of class grids.
//!
//! The boundary is burned into an in-memory byte raster laid out like the class
//! grid, with GDAL's all-touched rule: every pixel the polygon covers or whose
//! footprint any boundary edge crosses is selected.

use crate::classes::ClassCode;
use crate::error::{Result, TransitionError};
use crate::geotransform::GeoTransform;
use gdal::raster::{rasterize, RasterizeOptions};
use gdal::spatial_ref::CoordTransform;
use gdal::vector::Geometry;
use gdal::DriverManager;
use log::debug;
use ndarray::{s, Array2};

const BURN_VALUE: f64 = 1.0;

/// Study-area boundary: one or more polygons in a single coordinate system.
#[derive(Debug, Clone)]
pub struct Boundary {
    /// One owned geometry per polygon part.
    pub parts: Vec<Geometry>,
    /// WKT of the coordinate reference system.
    pub projection: String,
    pub name: String,
}

impl Boundary {
    /// Copy of the boundary with every part transformed by `ct`.
    pub fn transformed(&self, ct: &CoordTransform, projection: String) -> Result<Boundary> {
        let parts = self
            .parts
            .iter()
            .map(|part| {
                part.transform(ct)
                    .map_err(|e| TransitionError::geometry(self.name.as_str(), e))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Boundary {
            parts,
            projection,
            name: self.name.clone(),
        })
    }
}

/// Pixels of a `rows` x `cols` grid whose footprint touches any boundary part.
///
/// `parts` must already be in the grid's coordinate system.
pub fn all_touched_mask(
    rows: usize,
    cols: usize,
    geotransform: &GeoTransform,
    parts: &[Geometry],
) -> Result<Array2<bool>> {
    if rows == 0 || cols == 0 || parts.is_empty() {
        return Ok(Array2::from_elem((rows, cols), false));
    }

    let driver = DriverManager::get_driver_by_name("MEM")?;
    let mut dataset = driver.create_with_band_type::<u8, _>("", cols, rows, 1)?;
    dataset.set_geo_transform(&geotransform.to_gdal())?;

    let burn_values = vec![BURN_VALUE; parts.len()];
    let options = RasterizeOptions {
        all_touched: true,
        ..Default::default()
    };
    rasterize(&mut dataset, &[1], parts, &burn_values, Some(options))
        .map_err(|e| TransitionError::geometry("boundary mask", e))?;

    let band = dataset.rasterband(1)?;
    let buffer = band.read_as::<u8>((0, 0), (cols, rows), (cols, rows), None)?;
    let burned: Vec<bool> = buffer.into_iter().map(|v| v != 0).collect();
    let mask = Array2::from_shape_vec((rows, cols), burned)?;

    debug!(
        "Boundary touches {} of {} pixels",
        mask.iter().filter(|&&m| m).count(),
        rows * cols
    );
    Ok(mask)
}

/// Crop `grid` to the bounding box of `mask` and set unmasked cells to `nodata`.
///
/// Returns `None` when the mask selects nothing.
pub fn crop_to_mask(
    grid: &Array2<ClassCode>,
    geotransform: &GeoTransform,
    mask: &Array2<bool>,
    nodata: ClassCode,
) -> Option<(Array2<ClassCode>, GeoTransform)> {
    let mut row_range: Option<(usize, usize)> = None;
    let mut col_range: Option<(usize, usize)> = None;

    for ((row, col), &keep) in mask.indexed_iter() {
        if !keep {
            continue;
        }
        row_range = Some(match row_range {
            Some((lo, hi)) => (lo.min(row), hi.max(row)),
            None => (row, row),
        });
        col_range = Some(match col_range {
            Some((lo, hi)) => (lo.min(col), hi.max(col)),
            None => (col, col),
        });
    }

    let (r0, r1) = row_range?;
    let (c0, c1) = col_range?;

    let mut cropped = grid.slice(s![r0..=r1, c0..=c1]).to_owned();
    let sub_mask = mask.slice(s![r0..=r1, c0..=c1]);
    cropped.zip_mut_with(&sub_mask, |value, &keep| {
        if !keep {
            *value = nodata;
        }
    });

    debug!(
        "Clip window rows {}..={}, cols {}..={} ({}x{})",
        r0,
        r1,
        c0,
        c1,
        c1 - c0 + 1,
        r1 - r0 + 1
    );
    Some((cropped, geotransform.shifted(c0, r0)))
}
