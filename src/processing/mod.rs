// src/processing/mod.rs
pub mod config;
pub mod deferred;
pub mod extremum;
pub mod landmarks;
pub mod parallel;
pub mod phenology;
pub mod stats;
pub mod strategy;

// Re-export main components
pub use config::{EosMethod, PhenologyConfig, SosMethod};
pub use deferred::{DeferredPhenology, PhenologyTemplate};
pub use extremum::{nan_arg_extremum, Extremum};
pub use parallel::{EngineVersion, ProcessingMode, TileScheduler, TileTask, WorkerPool};
pub use phenology::{compute_phenology, Landmarks};
pub use stats::{PhenologyDataset, Stat, StatBand, StatDtype, StatList};
pub use strategy::{phenology, PhenologyInput, PhenologyOutput};
