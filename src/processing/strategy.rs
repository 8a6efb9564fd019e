// src/processing/strategy.rs
use crate::error::Result;
use crate::grid::{ChunkedGrid, TimeSeriesGrid};
use crate::processing::config::PhenologyConfig;
use crate::processing::deferred::DeferredPhenology;
use crate::processing::phenology::compute_phenology;
use crate::processing::stats::PhenologyDataset;

/// Input accepted by [`phenology`]
#[derive(Debug)]
pub enum PhenologyInput<'a> {
    InMemory(&'a TimeSeriesGrid),
    Chunked(ChunkedGrid),
}

impl<'a> From<&'a TimeSeriesGrid> for PhenologyInput<'a> {
    fn from(grid: &'a TimeSeriesGrid) -> Self {
        PhenologyInput::InMemory(grid)
    }
}

impl From<ChunkedGrid> for PhenologyInput<'_> {
    fn from(grid: ChunkedGrid) -> Self {
        PhenologyInput::Chunked(grid)
    }
}

/// Result of [`phenology`]: ready now, or scheduled for later
#[derive(Debug)]
pub enum PhenologyOutput {
    Eager(PhenologyDataset),
    Deferred(DeferredPhenology),
}

impl PhenologyOutput {
    pub fn is_deferred(&self) -> bool {
        matches!(self, PhenologyOutput::Deferred(_))
    }

    pub fn crs(&self) -> Option<&str> {
        match self {
            PhenologyOutput::Eager(ds) => ds.crs(),
            PhenologyOutput::Deferred(deferred) => deferred.crs(),
        }
    }

    /// The dataset, running any scheduled tiles first
    pub fn compute(self) -> Result<PhenologyDataset> {
        match self {
            PhenologyOutput::Eager(ds) => Ok(ds),
            PhenologyOutput::Deferred(deferred) => deferred.compute(),
        }
    }
}

/// How a phenology run is executed
pub trait ExecutionStrategy {
    fn execute(self, config: &PhenologyConfig) -> Result<PhenologyOutput>;
}

/// Computes the whole grid on the calling thread
pub struct EagerStrategy<'a> {
    grid: &'a TimeSeriesGrid,
}

impl<'a> EagerStrategy<'a> {
    pub fn new(grid: &'a TimeSeriesGrid) -> Self {
        Self { grid }
    }
}

impl ExecutionStrategy for EagerStrategy<'_> {
    fn execute(self, config: &PhenologyConfig) -> Result<PhenologyOutput> {
        compute_phenology(self.grid, config).map(PhenologyOutput::Eager)
    }
}

/// Plans one run per spatial tile of a chunked grid
pub struct DeferredStrategy {
    grid: ChunkedGrid,
}

impl DeferredStrategy {
    pub fn new(grid: ChunkedGrid) -> Self {
        Self { grid }
    }
}

impl ExecutionStrategy for DeferredStrategy {
    fn execute(self, config: &PhenologyConfig) -> Result<PhenologyOutput> {
        DeferredPhenology::new(self.grid, config.clone()).map(PhenologyOutput::Deferred)
    }
}

/// Land surface phenology metrics of a vegetation index time series.
///
/// In-memory grids are computed right away. Chunked grids return a
/// [`DeferredPhenology`] whose tiles run when the output is computed.
pub fn phenology<'a>(
    input: impl Into<PhenologyInput<'a>>,
    config: &PhenologyConfig,
) -> Result<PhenologyOutput> {
    match input.into() {
        PhenologyInput::InMemory(grid) => EagerStrategy::new(grid).execute(config),
        PhenologyInput::Chunked(grid) => DeferredStrategy::new(grid).execute(config),
    }
}
