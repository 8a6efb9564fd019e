// src/lib.rs
pub mod batch;
pub mod error;
pub mod grid;
pub mod processing;
pub mod utils;

pub use error::{PhenologyError, Result};
pub use grid::{ChunkSpec, ChunkedGrid, GeoBox, TimeAxis, TimeSeriesGrid};
pub use processing::{
    phenology, EosMethod, PhenologyConfig, PhenologyDataset, PhenologyOutput, SosMethod, Stat,
    StatBand,
};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
