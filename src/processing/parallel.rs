// src/processing/parallel.rs
use std::{
    fmt, mem, panic,
    sync::Arc,
    thread::{self, JoinHandle},
};

use log::debug;
use parking_lot::Mutex;
use rayon::iter::{IntoParallelIterator, ParallelIterator as _};

use crate::error::{PhenologyError, Result};
use crate::grid::Tile;
use crate::processing::stats::PhenologyDataset;

/// Version of a tile scheduling engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl EngineVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version of the schedulers shipped with this crate
pub const ENGINE_VERSION: EngineVersion = EngineVersion::new(1, 2, 0);

/// Oldest engine able to map a function over tiles against an output template
pub const TILE_MAPPING_SINCE: EngineVersion = EngineVersion::new(1, 0, 0);

/// Work run once per spatial tile
pub type TileTask = Arc<dyn Fn(&Tile) -> Result<PhenologyDataset> + Send + Sync>;

/// Runs a task over spatial tiles.
///
/// Tiles share nothing, so implementations are free to run them in any
/// order or concurrently. Results come back in the order of `tiles`; if any
/// tile fails, the error of the first failing tile is returned.
pub trait TileScheduler: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> EngineVersion {
        ENGINE_VERSION
    }

    fn run(&self, tiles: Vec<Tile>, task: TileTask) -> Result<Vec<(Tile, PhenologyDataset)>>;
}

/// Rayon backed scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// One tile after another on the calling thread
    Sequential,
    /// Rayon's global pool
    #[default]
    Parallel,
    /// A dedicated rayon pool with this many threads
    ParallelWith(usize),
}

impl TileScheduler for ProcessingMode {
    fn name(&self) -> &str {
        match self {
            ProcessingMode::Sequential => "sequential",
            ProcessingMode::Parallel => "rayon",
            ProcessingMode::ParallelWith(_) => "rayon-pool",
        }
    }

    fn run(&self, tiles: Vec<Tile>, task: TileTask) -> Result<Vec<(Tile, PhenologyDataset)>> {
        debug!("{}: scheduling {} tiles", self.name(), tiles.len());
        let work = |tile: Tile| task(&tile).map(|ds| (tile, ds));

        match self {
            ProcessingMode::Sequential => tiles.into_iter().map(work).collect(),
            ProcessingMode::Parallel => tiles.into_par_iter().map(work).collect(),
            ProcessingMode::ParallelWith(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(*threads)
                    .build()
                    .map_err(|e| PhenologyError::Source(format!("failed to build thread pool: {e}")))?;
                pool.install(|| tiles.into_par_iter().map(work).collect())
            }
        }
    }
}

struct TileRequest {
    slot: usize,
    tile: Tile,
}

type TileSlots = Arc<Mutex<Vec<Option<Result<PhenologyDataset>>>>>;

/// Fixed set of worker threads fed with tile requests over a channel
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: Option<usize>) -> Self {
        Self {
            workers: workers.unwrap_or_else(num_cpus::get).max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TileScheduler for WorkerPool {
    fn name(&self) -> &str {
        "worker-pool"
    }

    fn run(&self, tiles: Vec<Tile>, task: TileTask) -> Result<Vec<(Tile, PhenologyDataset)>> {
        let threads = self.workers.min(tiles.len()).max(1);
        debug!("worker-pool: {} tiles on {} threads", tiles.len(), threads);

        let slots: TileSlots = Arc::new(Mutex::new((0..tiles.len()).map(|_| None).collect()));
        let (req_tx, req_rx) = flume::unbounded::<TileRequest>();

        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(threads);
        for _ in 0..threads {
            let req_rx = req_rx.clone();
            let task = Arc::clone(&task);
            let slots = Arc::clone(&slots);

            workers.push(thread::spawn(move || {
                for TileRequest { slot, tile } in req_rx {
                    let result = task(&tile);
                    slots.lock()[slot] = Some(result);
                }
            }));
        }
        drop(req_rx);

        for (slot, &tile) in tiles.iter().enumerate() {
            if req_tx.send(TileRequest { slot, tile }).is_err() {
                break;
            }
        }
        drop(req_tx);

        let mut errors = Vec::new();
        for worker in workers {
            if let Err(e) = worker.join() {
                errors.push(e);
            }
        }
        if !errors.is_empty() {
            panic::resume_unwind(Box::new(errors));
        }

        let slots = mem::take(&mut *slots.lock());
        tiles
            .into_iter()
            .zip(slots)
            .map(|(tile, slot)| match slot {
                Some(result) => result.map(|ds| (tile, ds)),
                None => Err(PhenologyError::Source(format!(
                    "tile {},{} was never processed",
                    tile.row_offset, tile.col_offset
                ))),
            })
            .collect()
    }
}
