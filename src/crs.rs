use crate::error::{Result, TransitionError};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use log::{debug, warn};

/// Points sampled along each edge when transforming a bounding box.
const DENSIFY_POINTS: usize = 21;

/// Spatial reference for an EPSG code, with x/y (easting, northing) axis order.
pub fn from_epsg(epsg: u32) -> Result<SpatialRef> {
    let mut srs = SpatialRef::from_epsg(epsg)
        .map_err(|e| TransitionError::geometry(format!("EPSG:{}", epsg), e))?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// Spatial reference parsed from WKT, with x/y axis order.
pub fn from_wkt(wkt: &str, resource: &str) -> Result<SpatialRef> {
    if wkt.trim().is_empty() {
        return Err(TransitionError::geometry(
            resource,
            "no coordinate reference system defined",
        ));
    }
    let mut srs = SpatialRef::from_wkt(wkt).map_err(|e| TransitionError::geometry(resource, e))?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// The reference system every raster is compared in. Must be projected.
pub fn reference(epsg: u32) -> Result<SpatialRef> {
    let srs = from_epsg(epsg)?;
    if srs.is_geographic() {
        return Err(TransitionError::geometry(
            format!("EPSG:{}", epsg),
            "reference system must be projected, not geographic",
        ));
    }
    if srs.is_projected() {
        let units = srs.linear_units();
        if (units - 1.0).abs() > 0.01 {
            warn!(
                "Reference system EPSG:{} has non-metre linear units ({:.6})",
                epsg, units
            );
        }
    }
    Ok(srs)
}

/// EPSG code of a spatial reference, if it carries one.
pub fn epsg_code(srs: &SpatialRef) -> Option<u32> {
    match srs.auth_name() {
        Ok(name) if name.eq_ignore_ascii_case("EPSG") => {
            srs.auth_code().ok().and_then(|c| u32::try_from(c).ok())
        }
        _ => None,
    }
}

/// True when both references describe the same coordinate system.
pub fn same_crs(a: &SpatialRef, b: &SpatialRef) -> bool {
    match (epsg_code(a), epsg_code(b)) {
        (Some(ca), Some(cb)) => ca == cb,
        _ => a == b,
    }
}

/// Coordinate transform between two systems.
pub fn transformer(src: &SpatialRef, dst: &SpatialRef, resource: &str) -> Result<CoordTransform> {
    CoordTransform::new(src, dst).map_err(|e| {
        TransitionError::geometry(resource, format!("cannot reconcile coordinate systems: {}", e))
    })
}

/// Transform coordinate arrays in place.
pub fn transform_points(
    ct: &CoordTransform,
    xs: &mut [f64],
    ys: &mut [f64],
    resource: &str,
) -> Result<()> {
    ct.transform_coords(xs, ys, &mut [])
        .map_err(|e| TransitionError::geometry(resource, format!("coordinate transform failed: {}", e)))
}

/// Transform (min_x, min_y, max_x, max_y), sampling along the edges so curved
/// images of straight edges are enclosed.
pub fn transform_bounds(ct: &CoordTransform, bounds: [f64; 4], resource: &str) -> Result<[f64; 4]> {
    let [min_x, min_y, max_x, max_y] = bounds;
    let mut xs = Vec::with_capacity(DENSIFY_POINTS * 4);
    let mut ys = Vec::with_capacity(DENSIFY_POINTS * 4);

    for i in 0..DENSIFY_POINTS {
        let t = i as f64 / (DENSIFY_POINTS - 1) as f64;
        let x = min_x + t * (max_x - min_x);
        let y = min_y + t * (max_y - min_y);
        xs.extend_from_slice(&[x, x, min_x, max_x]);
        ys.extend_from_slice(&[min_y, max_y, y, y]);
    }

    transform_points(ct, &mut xs, &mut ys, resource)?;

    let mut out = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        out[0] = out[0].min(x);
        out[1] = out[1].min(y);
        out[2] = out[2].max(x);
        out[3] = out[3].max(y);
    }

    if !(out[0] < out[2] && out[1] < out[3]) {
        return Err(TransitionError::geometry(
            resource,
            "extent collapses when transformed to the target system",
        ));
    }
    debug!("Transformed bounds {:?} -> {:?}", bounds, out);
    Ok(out)
}
