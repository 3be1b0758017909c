use crate::classes::ClassCode;
use crate::clip::Boundary;
use crate::error::{Result, TransitionError};
use crate::geotransform::GeoTransform;
use gdal::raster::RasterBand;
use gdal::vector::{Geometry, LayerAccess};
use gdal::Dataset;
use log::{debug, info, warn};
use ndarray::Array2;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct RasterMetadata {
    pub geotransform: GeoTransform,
    pub projection: String,
    pub nodata: Option<f64>,
}

/// A grid of class codes in a known frame, with its no-data sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRaster {
    pub grid: Array2<ClassCode>,
    pub geotransform: GeoTransform,
    /// WKT of the coordinate reference system.
    pub projection: String,
    pub nodata: ClassCode,
}

impl ClassifiedRaster {
    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.grid.dim()
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Read a single-band categorical raster and its metadata.
pub fn read_input_raster(path: &Path) -> Result<(Array2<ClassCode>, RasterMetadata)> {
    info!("Opening input raster: {}", path.display());
    let dataset = Dataset::open(path).map_err(|e| TransitionError::input(display(path), e))?;

    let band_count = dataset.raster_count();
    if band_count != 1 {
        return Err(TransitionError::input(
            display(path),
            format!("expected a single-band categorical raster, found {} bands", band_count),
        ));
    }

    let rasterband: RasterBand = dataset
        .rasterband(1)
        .map_err(|e| TransitionError::input(display(path), e))?;

    let width = rasterband.x_size() as usize;
    let height = rasterband.y_size() as usize;

    if width == 0 || height == 0 {
        return Err(TransitionError::input(
            display(path),
            format!("raster has invalid dimensions {}x{}", width, height),
        ));
    }

    let nodata = rasterband.no_data_value();
    let geotransform = dataset
        .geo_transform()
        .map_err(|e| TransitionError::input(display(path), format!("missing geotransform: {}", e)))?;

    debug!("Raster dimensions: {}x{}", width, height);
    debug!("Geotransform: {:?}", geotransform);

    let buffer = rasterband
        .read_as::<ClassCode>((0, 0), (width, height), (width, height), None)
        .map_err(|e| TransitionError::input(display(path), e))?;
    let data_vec: Vec<ClassCode> = buffer.into_iter().collect();
    let data = Array2::from_shape_vec((height, width), data_vec)?;

    let metadata = RasterMetadata {
        geotransform: GeoTransform::from_gdal(geotransform),
        projection: dataset.projection(),
        nodata,
    };

    Ok((data, metadata))
}

/// Read every polygonal feature of the first layer of a vector file.
pub fn read_boundary(path: &Path) -> Result<Boundary> {
    info!("Opening boundary: {}", path.display());
    let dataset = Dataset::open(path).map_err(|e| TransitionError::input(display(path), e))?;

    if dataset.layer_count() == 0 {
        return Err(TransitionError::input(display(path), "no vector layer found"));
    }
    let mut layer = dataset
        .layer(0)
        .map_err(|e| TransitionError::input(display(path), e))?;

    let projection = match layer.spatial_ref() {
        Some(srs) => srs
            .to_wkt()
            .map_err(|e| TransitionError::geometry(display(path), e))?,
        None => {
            return Err(TransitionError::geometry(
                display(path),
                "boundary layer has no coordinate reference system",
            ))
        }
    };

    let mut parts = Vec::new();
    for feature in layer.features() {
        if let Some(geometry) = feature.geometry() {
            collect_polygons(geometry, &mut parts);
        }
    }

    if parts.is_empty() {
        return Err(TransitionError::input(
            display(path),
            "boundary contains no polygon geometry",
        ));
    }

    debug!("Boundary has {} polygon part(s)", parts.len());
    Ok(Boundary {
        parts,
        projection,
        name: display(path),
    })
}

/// Flatten polygons out of multi-part geometries into owned parts.
fn collect_polygons(geometry: &Geometry, out: &mut Vec<Geometry>) {
    match geometry.geometry_name().as_str() {
        "POLYGON" => {
            if geometry.geometry_count() > 0 {
                out.push(Geometry::clone(geometry));
            }
        }
        "MULTIPOLYGON" | "GEOMETRYCOLLECTION" => {
            for i in 0..geometry.geometry_count() {
                collect_polygons(&geometry.get_geometry(i), out);
            }
        }
        other => warn!("Skipping non-polygon boundary geometry: {}", other),
    }
}
