use crate::clip::{self, Boundary};
use crate::config::{NoDataPolicy, PipelineConfig};
use crate::crs;
use crate::error::{Result, TransitionError};
use crate::io::{self, ClassifiedRaster};
use crate::reproject;
use gdal::spatial_ref::SpatialRef;
use log::{debug, info};
use std::path::Path;

/// Opens categorical rasters, brings them into the reference system and clips
/// them to a study-area boundary.
pub struct RasterLoader {
    reference: SpatialRef,
    reference_epsg: u32,
    nodata: NoDataPolicy,
}

impl RasterLoader {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            reference: crs::reference(config.reference_epsg)?,
            reference_epsg: config.reference_epsg,
            nodata: config.nodata,
        })
    }

    pub fn reference_epsg(&self) -> u32 {
        self.reference_epsg
    }

    /// Load `path` and clip it to `boundary` with the all-touched rule.
    pub fn load(&self, path: &Path, boundary: &Boundary) -> Result<ClassifiedRaster> {
        let resource = path.display().to_string();
        let (grid, metadata) = io::read_input_raster(path)?;
        let nodata = self.nodata.resolve(metadata.nodata);
        debug!("No-data sentinel for {}: {}", resource, nodata);

        let mut raster = ClassifiedRaster {
            grid,
            geotransform: metadata.geotransform,
            projection: metadata.projection,
            nodata,
        };

        let raster_srs = crs::from_wkt(&raster.projection, &resource)?;
        if !crs::same_crs(&raster_srs, &self.reference) {
            info!(
                "Reprojecting {} to EPSG:{}",
                resource, self.reference_epsg
            );
            raster = reproject::reproject_nearest(&raster, &self.reference, &resource)?;
        }

        let boundary = self.boundary_in_frame_of(boundary, &raster)?;
        clip_raster(&raster, &boundary, &resource)
    }

    /// The boundary expressed in the raster's coordinate system.
    fn boundary_in_frame_of(
        &self,
        boundary: &Boundary,
        raster: &ClassifiedRaster,
    ) -> Result<Boundary> {
        let boundary_srs = crs::from_wkt(&boundary.projection, &boundary.name)?;
        let raster_srs = crs::from_wkt(&raster.projection, &boundary.name)?;
        if crs::same_crs(&boundary_srs, &raster_srs) {
            return Ok(boundary.clone());
        }
        debug!("Transforming boundary {} to the raster system", boundary.name);
        let ct = crs::transformer(&boundary_srs, &raster_srs, &boundary.name)?;
        boundary.transformed(&ct, raster.projection.clone())
    }
}

/// Clip a raster already in the boundary's frame.
pub fn clip_raster(
    raster: &ClassifiedRaster,
    boundary: &Boundary,
    resource: &str,
) -> Result<ClassifiedRaster> {
    let (rows, cols) = raster.shape();
    let mask = clip::all_touched_mask(rows, cols, &raster.geotransform, &boundary.parts)?;

    let (grid, geotransform) =
        clip::crop_to_mask(&raster.grid, &raster.geotransform, &mask, raster.nodata).ok_or_else(
            || TransitionError::geometry(resource, "boundary does not overlap the raster"),
        )?;

    if grid.iter().all(|&v| v == raster.nodata) {
        return Err(TransitionError::geometry(
            resource,
            "clipped raster holds only no-data pixels",
        ));
    }

    let (clip_rows, clip_cols) = grid.dim();
    info!("Clipped {} to {}x{}", resource, clip_cols, clip_rows);

    Ok(ClassifiedRaster {
        grid,
        geotransform,
        projection: raster.projection.clone(),
        nodata: raster.nodata,
    })
}
