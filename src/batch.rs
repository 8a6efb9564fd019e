// src/batch.rs
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::grid::{ChunkSpec, TimeSeriesGrid};
use crate::processing::{
    phenology, EosMethod, PhenologyConfig, PhenologyDataset, SosMethod, StatList, WorkerPool,
};

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub jobs: Vec<Job>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GlobalParams {
    #[serde(default)]
    pub method_sos: SosMethod,
    #[serde(default)]
    pub method_eos: EosMethod,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_tile_size")]
    pub tile_rows: usize,
    #[serde(default = "default_tile_size")]
    pub tile_cols: usize,
    pub workers: Option<usize>,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            method_sos: SosMethod::default(),
            method_eos: EosMethod::default(),
            verbose: false,
            tile_rows: default_tile_size(),
            tile_cols: default_tile_size(),
            workers: None,
        }
    }
}

fn default_tile_size() -> usize {
    256
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Job {
    pub name: String,
    #[serde(default)]
    pub stats: StatList,
    pub method_sos: Option<SosMethod>,
    pub method_eos: Option<EosMethod>,
    pub tiled: Option<bool>,
}

impl BatchConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid batch configuration")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch configuration {}", path.display()))?;
        Self::from_json_str(&content)
    }
}

/// Run every job of `config` against `grid`, in order.
pub fn run_batch(config: &BatchConfig, grid: &TimeSeriesGrid) -> Result<Vec<(String, PhenologyDataset)>> {
    let global = &config.global;
    info!("Starting batch processing with {} jobs...", config.jobs.len());

    let mut results = Vec::with_capacity(config.jobs.len());
    for (i, job) in config.jobs.iter().enumerate() {
        let tiled = job.tiled.unwrap_or(false);
        info!(
            "[{}/{}] {} ({} stats{})",
            i + 1,
            config.jobs.len(),
            job.name,
            job.stats.len(),
            if tiled { ", tiled" } else { "" }
        );

        let pheno = PhenologyConfig::new(job.stats.clone())
            .with_method_sos(job.method_sos.unwrap_or(global.method_sos))
            .with_method_eos(job.method_eos.unwrap_or(global.method_eos))
            .with_verbose(global.verbose);

        let output = if tiled {
            let chunks = ChunkSpec::new(global.tile_rows, global.tile_cols, grid.time().len().max(1));
            let chunked = grid
                .clone()
                .chunk(chunks)
                .with_context(|| format!("Job '{}': cannot chunk input grid", job.name))?
                .with_scheduler(Arc::new(WorkerPool::new(global.workers)));
            phenology(chunked, &pheno)
        } else {
            phenology(grid, &pheno)
        };

        let dataset = output
            .and_then(|out| out.compute())
            .with_context(|| format!("Job '{}' failed", job.name))?;
        results.push((job.name.clone(), dataset));
    }

    info!("Batch processing complete!");
    Ok(results)
}
