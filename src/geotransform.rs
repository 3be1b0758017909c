/// Affine pixel-to-world transform in GDAL coefficient order.
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform without rotation terms.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// World coordinates of fractional pixel position (col, row).
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// Centre of pixel (col, row).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Fractional (col, row) of a world coordinate, `None` for a singular transform.
    pub fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let col = (dx * self.pixel_height - dy * self.row_rotation) / det;
        let row = (dy * self.pixel_width - dx * self.col_rotation) / det;
        Some((col, row))
    }

    /// Transform of the sub-grid starting at pixel (col_off, row_off).
    pub fn shifted(&self, col_off: usize, row_off: usize) -> Self {
        let (x, y) = self.apply(col_off as f64, row_off as f64);
        Self {
            origin_x: x,
            origin_y: y,
            ..*self
        }
    }

    /// (min_x, min_y, max_x, max_y) covered by a grid of `cols` x `rows` pixels.
    pub fn bounds(&self, cols: usize, rows: usize) -> [f64; 4] {
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(cols as f64, 0.0),
            self.apply(0.0, rows as f64),
            self.apply(cols as f64, rows as f64),
        ];
        let mut bounds = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
        for (x, y) in corners {
            bounds[0] = bounds[0].min(x);
            bounds[1] = bounds[1].min(y);
            bounds[2] = bounds[2].max(x);
            bounds[3] = bounds[3].max(y);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_gdal_round_trip_order() {
        let coeffs = [100.0, 30.0, 0.0, 500.0, 0.0, -30.0];
        let gt = GeoTransform::from_gdal(coeffs);
        assert_eq!(gt.origin_x, 100.0);
        assert_eq!(gt.pixel_height, -30.0);
        assert_eq!(gt.to_gdal(), coeffs);
    }

    #[test]
    fn test_pixel_center() {
        let gt = GeoTransform::north_up(0.0, 100.0, 10.0, -10.0);
        assert_eq!(gt.pixel_center(0, 0), (5.0, 95.0));
        assert_eq!(gt.pixel_center(2, 3), (25.0, 65.0));
    }

    #[test]
    fn test_invert_matches_apply() {
        let gt = GeoTransform {
            origin_x: 10.0,
            pixel_width: 2.0,
            row_rotation: 0.5,
            origin_y: 50.0,
            col_rotation: 0.25,
            pixel_height: -2.0,
        };
        let (x, y) = gt.apply(3.5, 7.25);
        let (col, row) = gt.invert(x, y).unwrap();
        assert!(approx_eq(col, 3.5));
        assert!(approx_eq(row, 7.25));
    }

    #[test]
    fn test_singular_transform_has_no_inverse() {
        let gt = GeoTransform::north_up(0.0, 0.0, 0.0, -1.0);
        assert!(gt.invert(1.0, 1.0).is_none());
    }

    #[test]
    fn test_bounds_and_shift() {
        let gt = GeoTransform::north_up(0.0, 100.0, 10.0, -10.0);
        assert_eq!(gt.bounds(4, 2), [0.0, 80.0, 40.0, 100.0]);
        let sub = gt.shifted(1, 2);
        assert_eq!(sub.origin_x, 10.0);
        assert_eq!(sub.origin_y, 80.0);
        assert_eq!(sub.pixel_width, 10.0);
    }
}
