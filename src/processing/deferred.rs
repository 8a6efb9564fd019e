// src/processing/deferred.rs
use std::sync::Arc;

use log::debug;
use ndarray::s;

use crate::error::{PhenologyError, Result};
use crate::grid::{ChunkedGrid, Tile};
use crate::processing::config::PhenologyConfig;
use crate::processing::parallel::{TileTask, TILE_MAPPING_SINCE};
use crate::processing::phenology::compute_phenology;
use crate::processing::stats::{PhenologyDataset, Stat, StatBand, StatDtype, StatList};

/// Output schema of a deferred run: spatial shape and one typed field per
/// requested statistic. Holds no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhenologyTemplate {
    shape: (usize, usize),
    fields: Vec<(Stat, StatDtype)>,
}

impl PhenologyTemplate {
    pub fn new(shape: (usize, usize), stats: &StatList) -> Self {
        Self {
            shape,
            fields: stats.iter().map(|stat| (stat, stat.dtype())).collect(),
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn fields(&self) -> &[(Stat, StatDtype)] {
        &self.fields
    }

    /// Full-size dataset with every cell missing
    fn allocate(&self) -> PhenologyDataset {
        let mut dataset = PhenologyDataset::new(self.shape);
        for &(stat, dtype) in &self.fields {
            dataset.insert(stat, StatBand::missing(dtype, self.shape));
        }
        dataset
    }

    fn check(&self, tile: &Tile, dataset: &PhenologyDataset) -> Result<()> {
        let mismatch = |reason: String| PhenologyError::TemplateMismatch {
            row_offset: tile.row_offset,
            col_offset: tile.col_offset,
            reason,
        };

        if dataset.len() != self.fields.len() {
            return Err(mismatch(format!(
                "expected {} variables, got {}",
                self.fields.len(),
                dataset.len()
            )));
        }
        for &(stat, dtype) in &self.fields {
            let band = dataset
                .get(stat)
                .ok_or_else(|| mismatch(format!("missing variable {stat}")))?;
            if band.dtype() != dtype {
                return Err(mismatch(format!(
                    "{stat} has dtype {:?}, expected {dtype:?}",
                    band.dtype()
                )));
            }
            if band.shape() != (tile.rows, tile.cols) {
                return Err(mismatch(format!(
                    "{stat} has shape {:?}, expected {:?}",
                    band.shape(),
                    (tile.rows, tile.cols)
                )));
            }
        }
        Ok(())
    }
}

/// A phenology run scheduled over the spatial tiles of a chunked grid.
///
/// Nothing is read until [`DeferredPhenology::compute`] is called.
#[derive(Debug)]
pub struct DeferredPhenology {
    grid: ChunkedGrid,
    config: PhenologyConfig,
    template: PhenologyTemplate,
    crs: Option<String>,
}

impl DeferredPhenology {
    /// Plan a deferred run.
    ///
    /// Fails with `UnsupportedEnvironment` when the grid's scheduler predates
    /// tile mapping. The time axis is forced into a single chunk per tile.
    pub fn new(grid: ChunkedGrid, config: PhenologyConfig) -> Result<Self> {
        let scheduler = grid.scheduler();
        if scheduler.version() < TILE_MAPPING_SINCE {
            return Err(PhenologyError::UnsupportedEnvironment {
                engine: scheduler.name().to_string(),
                found: scheduler.version().to_string(),
                required: TILE_MAPPING_SINCE.to_string(),
            });
        }

        let template = PhenologyTemplate::new(grid.shape(), &config.stats);
        let grid = grid.with_time_unchunked();
        let crs = grid.crs().map(str::to_string);

        debug!(
            "deferred phenology: {} tiles of {}x{}, {} time steps, scheduler {}",
            grid.tiles().len(),
            grid.chunks().rows,
            grid.chunks().cols,
            grid.time().len(),
            grid.scheduler().name()
        );

        Ok(Self {
            grid,
            config,
            template,
            crs,
        })
    }

    pub fn template(&self) -> &PhenologyTemplate {
        &self.template
    }

    /// CRS the materialized dataset will carry
    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn config(&self) -> &PhenologyConfig {
        &self.config
    }

    pub fn tiles(&self) -> Vec<Tile> {
        self.grid.tiles()
    }

    /// Run every tile and assemble the full dataset; blocks until all tiles
    /// are done.
    pub fn compute(&self) -> Result<PhenologyDataset> {
        let grid = self.grid.clone();
        let config = self.config.clone();
        let task: TileTask = Arc::new(move |tile: &Tile| {
            let tile_grid = grid.read_tile(tile)?;
            compute_phenology(&tile_grid, &config)
        });

        let results = self.grid.scheduler().run(self.grid.tiles(), task)?;

        let mut dataset = self.template.allocate();
        for (tile, part) in results {
            self.template.check(&tile, &part)?;
            for (stat, band) in part.iter() {
                if let Some(target) = dataset.get_mut(stat) {
                    write_tile(target, &tile, band);
                }
            }
        }

        dataset.assign_crs(self.crs.as_deref());
        Ok(dataset)
    }
}

fn write_tile(target: &mut StatBand, tile: &Tile, band: &StatBand) {
    let window = s![tile.row_range(), tile.col_range()];
    match (target, band) {
        (StatBand::Int16(dst), StatBand::Int16(src)) => dst.slice_mut(window).assign(src),
        (StatBand::Float32(dst), StatBand::Float32(src)) => dst.slice_mut(window).assign(src),
        // dtypes were checked against the template
        _ => {}
    }
}
