// src/grid/chunked.rs
use std::{fmt, ops::Range, sync::Arc};

use ndarray::{concatenate, Array3, Axis};

use crate::error::{PhenologyError, Result};
use crate::grid::{GeoBox, TimeAxis, TimeSeriesGrid};
use crate::processing::parallel::{ProcessingMode, TileScheduler};

/// A window of the (row, column, time) grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
    pub time: Range<usize>,
}

/// Anything that can hand out windows of a (row, column, time) grid on demand.
pub trait GridSource: Send + Sync {
    fn read(&self, window: &Window) -> Result<Array3<f32>>;
}

/// Chunk lengths along (row, column, time)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    pub rows: usize,
    pub cols: usize,
    pub time: usize,
}

impl ChunkSpec {
    pub fn new(rows: usize, cols: usize, time: usize) -> Self {
        Self { rows, cols, time }
    }
}

/// A spatial tile of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub row_offset: usize,
    pub col_offset: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Tile {
    pub fn new(row_offset: usize, col_offset: usize, rows: usize, cols: usize) -> Self {
        Self {
            row_offset,
            col_offset,
            rows,
            cols,
        }
    }

    pub fn row_range(&self) -> Range<usize> {
        self.row_offset..self.row_offset + self.rows
    }

    pub fn col_range(&self) -> Range<usize> {
        self.col_offset..self.col_offset + self.cols
    }
}

/// Row-major iterator over tiles covering a grid exactly once
pub struct TileIterator {
    total_rows: usize,
    total_cols: usize,
    tile_rows: usize,
    tile_cols: usize,
    current_row: usize,
    current_col: usize,
}

impl TileIterator {
    pub fn new(total_rows: usize, total_cols: usize, tile_rows: usize, tile_cols: usize) -> Self {
        Self {
            total_rows,
            total_cols,
            tile_rows: tile_rows.max(1),
            tile_cols: tile_cols.max(1),
            current_row: 0,
            current_col: 0,
        }
    }
}

impl Iterator for TileIterator {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.total_rows || self.total_cols == 0 {
            return None;
        }

        let rows = self.tile_rows.min(self.total_rows - self.current_row);
        let cols = self.tile_cols.min(self.total_cols - self.current_col);
        let tile = Tile::new(self.current_row, self.current_col, rows, cols);

        self.current_col += self.tile_cols;
        if self.current_col >= self.total_cols {
            self.current_col = 0;
            self.current_row += self.tile_rows;
        }

        Some(tile)
    }
}

/// A lazily read (row, column, time) grid split into chunks.
///
/// Values stay in the [`GridSource`] until a tile is read. The grid also
/// carries the scheduler that runs work over its tiles.
#[derive(Clone)]
pub struct ChunkedGrid {
    source: Arc<dyn GridSource>,
    shape: (usize, usize),
    time: TimeAxis,
    chunks: ChunkSpec,
    geobox: Option<GeoBox>,
    scheduler: Arc<dyn TileScheduler>,
}

impl ChunkedGrid {
    pub fn new(
        source: Arc<dyn GridSource>,
        shape: (usize, usize),
        time: TimeAxis,
        chunks: ChunkSpec,
    ) -> Result<Self> {
        if chunks.rows == 0 || chunks.cols == 0 || chunks.time == 0 {
            return Err(PhenologyError::InvalidInput(format!(
                "chunk lengths must be positive, got {chunks:?}"
            )));
        }
        Ok(Self {
            source,
            shape,
            time,
            chunks,
            geobox: None,
            scheduler: Arc::new(ProcessingMode::default()),
        })
    }

    pub fn with_geobox(mut self, geobox: GeoBox) -> Self {
        self.geobox = Some(geobox);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn TileScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn chunks(&self) -> ChunkSpec {
        self.chunks
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn time(&self) -> &TimeAxis {
        &self.time
    }

    pub fn geobox(&self) -> Option<&GeoBox> {
        self.geobox.as_ref()
    }

    pub fn crs(&self) -> Option<&str> {
        self.geobox.as_ref().and_then(GeoBox::crs)
    }

    pub fn scheduler(&self) -> &Arc<dyn TileScheduler> {
        &self.scheduler
    }

    /// Same grid with the whole time axis in a single chunk
    pub fn with_time_unchunked(mut self) -> Self {
        self.chunks.time = self.time.len().max(1);
        self
    }

    /// Spatial tiles following the row/column chunking
    pub fn tiles(&self) -> Vec<Tile> {
        TileIterator::new(self.shape.0, self.shape.1, self.chunks.rows, self.chunks.cols).collect()
    }

    /// Read one spatial tile with every time chunk joined along time
    pub fn read_tile(&self, tile: &Tile) -> Result<TimeSeriesGrid> {
        let len = self.time.len();
        let mut parts = Vec::with_capacity(len.div_ceil(self.chunks.time).max(1));
        let mut start = 0;
        while start < len || parts.is_empty() {
            let end = (start + self.chunks.time).min(len);
            let window = Window {
                rows: tile.row_range(),
                cols: tile.col_range(),
                time: start..end,
            };
            let part = self.source.read(&window)?;
            if part.dim() != (tile.rows, tile.cols, end - start) {
                let (r, c, t) = part.dim();
                return Err(PhenologyError::ShapeMismatch {
                    expected: vec![tile.rows, tile.cols, end - start],
                    actual: vec![r, c, t],
                });
            }
            parts.push(part);
            start = end;
        }

        let values = if parts.len() == 1 {
            parts.remove(0)
        } else {
            let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
            concatenate(Axis(2), &views).map_err(|e| PhenologyError::Source(e.to_string()))?
        };

        let grid = TimeSeriesGrid::new(values, self.time.clone())?;
        Ok(match &self.geobox {
            Some(gb) => grid.with_geobox(gb.window(tile.row_offset, tile.col_offset)),
            None => grid,
        })
    }
}

impl fmt::Debug for ChunkedGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedGrid")
            .field("shape", &self.shape)
            .field("time", &self.time.len())
            .field("chunks", &self.chunks)
            .field("geobox", &self.geobox)
            .field("scheduler", &self.scheduler.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn grid(rows: usize, cols: usize, len: usize) -> TimeSeriesGrid {
        let t0 = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let time = TimeAxis::new((0..len).map(|i| t0 + Duration::days(i as i64)).collect()).unwrap();
        let data = (0..rows * cols * len).map(|v| v as f32).collect();
        TimeSeriesGrid::from_vec(data, rows, cols, time).unwrap()
    }

    #[test]
    fn tiles_cover_grid_once() {
        let (rows, cols) = (10, 7);
        let mut covered = vec![vec![0u8; cols]; rows];
        for tile in TileIterator::new(rows, cols, 4, 3) {
            for r in tile.row_range() {
                for c in tile.col_range() {
                    covered[r][c] += 1;
                }
            }
        }
        assert!(covered.iter().flatten().all(|&n| n == 1));
    }

    #[test]
    fn read_tile_joins_time_chunks() {
        let g = grid(4, 4, 5);
        let expected = g.window(2..4, 0..2).unwrap();
        let chunked = g.chunk(ChunkSpec::new(2, 2, 2)).unwrap();

        let tiles = chunked.tiles();
        assert_eq!(tiles.len(), 4);
        let tile = tiles[2];
        assert_eq!((tile.row_offset, tile.col_offset), (2, 0));

        let read = chunked.read_tile(&tile).unwrap();
        assert_eq!(read.values(), expected.values());
    }

    #[test]
    fn unchunked_time_spans_axis() {
        let chunked = grid(2, 2, 6).chunk(ChunkSpec::new(1, 1, 2)).unwrap();
        assert_eq!(chunked.with_time_unchunked().chunks().time, 6);
    }

    #[test]
    fn zero_chunk_is_rejected() {
        assert!(grid(2, 2, 2).chunk(ChunkSpec::new(0, 1, 1)).is_err());
    }
}
