// src/grid/geobox.rs

/// Spatial reference of a grid: CRS text plus the affine geotransform
/// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoBox {
    pub crs: String,
    pub geo_transform: [f64; 6],
}

impl GeoBox {
    pub fn new(crs: impl Into<String>, geo_transform: [f64; 6]) -> Self {
        Self {
            crs: crs.into(),
            geo_transform,
        }
    }

    /// CRS identifier, or `None` when the grid carries an empty one
    pub fn crs(&self) -> Option<&str> {
        let crs = self.crs.trim();
        (!crs.is_empty()).then_some(crs)
    }

    /// Geobox of the sub-window starting at (`row_off`, `col_off`)
    pub fn window(&self, row_off: usize, col_off: usize) -> Self {
        let [x0, pw, rr, y0, cr, ph] = self.geo_transform;
        let (r, c) = (row_off as f64, col_off as f64);
        Self {
            crs: self.crs.clone(),
            geo_transform: [x0 + c * pw + r * rr, pw, rr, y0 + c * cr + r * ph, cr, ph],
        }
    }
}
