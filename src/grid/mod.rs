// src/grid/mod.rs
pub mod chunked;
pub mod geobox;
pub mod time;

use std::ops::Range;

use ndarray::{s, Array3, ArrayView3};

use crate::error::{PhenologyError, Result};

pub use chunked::{ChunkSpec, ChunkedGrid, GridSource, Tile, TileIterator, Window};
pub use geobox::GeoBox;
pub use time::TimeAxis;

/// In-memory vegetation index time series with dimensions (row, column, time).
///
/// Missing observations are `NaN`.
#[derive(Debug, Clone)]
pub struct TimeSeriesGrid {
    values: Array3<f32>,
    time: TimeAxis,
    geobox: Option<GeoBox>,
}

impl TimeSeriesGrid {
    pub fn new(values: Array3<f32>, time: TimeAxis) -> Result<Self> {
        let (rows, cols, len) = values.dim();
        if len != time.len() {
            return Err(PhenologyError::ShapeMismatch {
                expected: vec![rows, cols, time.len()],
                actual: vec![rows, cols, len],
            });
        }
        Ok(Self {
            values,
            time,
            geobox: None,
        })
    }

    /// Build from row-major data laid out as `[row][col][time]`
    pub fn from_vec(data: Vec<f32>, rows: usize, cols: usize, time: TimeAxis) -> Result<Self> {
        let len = time.len();
        let actual = data.len();
        let values = Array3::from_shape_vec((rows, cols, len), data).map_err(|_| {
            PhenologyError::ShapeMismatch {
                expected: vec![rows * cols * len],
                actual: vec![actual],
            }
        })?;
        Self::new(values, time)
    }

    pub fn with_geobox(mut self, geobox: GeoBox) -> Self {
        self.geobox = Some(geobox);
        self
    }

    /// (rows, cols, time)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    /// (rows, cols) of a single time slice
    pub fn spatial_shape(&self) -> (usize, usize) {
        let (rows, cols, _) = self.values.dim();
        (rows, cols)
    }

    pub fn values(&self) -> ArrayView3<'_, f32> {
        self.values.view()
    }

    pub fn time(&self) -> &TimeAxis {
        &self.time
    }

    pub fn geobox(&self) -> Option<&GeoBox> {
        self.geobox.as_ref()
    }

    /// CRS of the grid if it has a non-empty one
    pub fn crs(&self) -> Option<&str> {
        self.geobox.as_ref().and_then(GeoBox::crs)
    }

    /// Spatial sub-grid keeping the full time axis
    pub fn window(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Self> {
        let (nrows, ncols, _) = self.values.dim();
        if rows.start > rows.end || cols.start > cols.end || rows.end > nrows || cols.end > ncols {
            return Err(PhenologyError::InvalidInput(format!(
                "window {rows:?} x {cols:?} outside grid of {nrows} x {ncols}"
            )));
        }
        Ok(Self {
            values: self.values.slice(s![rows.clone(), cols.clone(), ..]).to_owned(),
            time: self.time.clone(),
            geobox: self.geobox.as_ref().map(|gb| gb.window(rows.start, cols.start)),
        })
    }

    /// Wrap the grid as a lazily read chunked grid
    pub fn chunk(self, chunks: ChunkSpec) -> Result<ChunkedGrid> {
        let (rows, cols, _) = self.values.dim();
        let time = self.time.clone();
        let geobox = self.geobox.clone();
        let grid = ChunkedGrid::new(std::sync::Arc::new(self), (rows, cols), time, chunks)?;
        Ok(match geobox {
            Some(gb) => grid.with_geobox(gb),
            None => grid,
        })
    }
}

impl GridSource for TimeSeriesGrid {
    fn read(&self, window: &Window) -> Result<Array3<f32>> {
        let (rows, cols, len) = self.values.dim();
        if window.rows.end > rows || window.cols.end > cols || window.time.end > len {
            return Err(PhenologyError::Source(format!(
                "window {window:?} outside grid of {rows} x {cols} x {len}"
            )));
        }
        Ok(self
            .values
            .slice(s![
                window.rows.clone(),
                window.cols.clone(),
                window.time.clone()
            ])
            .to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn axis(n: usize) -> TimeAxis {
        let t0 = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        TimeAxis::new((0..n).map(|i| t0 + Duration::days(10 * i as i64)).collect()).unwrap()
    }

    #[test]
    fn time_length_must_match_axis() {
        let err = TimeSeriesGrid::new(Array3::zeros((2, 2, 3)), axis(4)).unwrap_err();
        assert!(matches!(err, PhenologyError::ShapeMismatch { .. }));
    }

    #[test]
    fn window_keeps_time_and_shifts_geobox() {
        let data: Vec<f32> = (0..4 * 3 * 2).map(|v| v as f32).collect();
        let grid = TimeSeriesGrid::from_vec(data, 4, 3, axis(2))
            .unwrap()
            .with_geobox(GeoBox::new("EPSG:4326", [0.0, 1.0, 0.0, 10.0, 0.0, -1.0]));

        let sub = grid.window(1..3, 1..3).unwrap();
        assert_eq!(sub.shape(), (2, 2, 2));
        assert_eq!(sub.values()[[0, 0, 1]], grid.values()[[1, 1, 1]]);
        assert_eq!(sub.geobox().unwrap().geo_transform[0], 1.0);
        assert_eq!(sub.geobox().unwrap().geo_transform[3], 9.0);
    }

    #[test]
    fn window_out_of_bounds_is_rejected() {
        let grid = TimeSeriesGrid::new(Array3::zeros((2, 2, 1)), axis(1)).unwrap();
        assert!(grid.window(0..3, 0..1).is_err());
    }
}
