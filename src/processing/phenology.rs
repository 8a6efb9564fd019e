// src/processing/phenology.rs
use log::info;
use ndarray::{Array2, Array3, ArrayView3, Axis, Zip};

use crate::error::Result;
use crate::grid::{TimeAxis, TimeSeriesGrid};
use crate::processing::config::{EosMethod, PhenologyConfig, SosMethod};
use crate::processing::landmarks::{self, DayGrid, SeasonPoint};
use crate::processing::stats::{PhenologyDataset, Stat, StatBand};
use crate::utils::{all_nan, to_int16};

/// Every season landmark of a grid, computed in dependency order
#[derive(Debug, Clone)]
pub struct Landmarks {
    pub peak_value: Array2<f32>,
    pub peak_position: DayGrid,
    pub trough: Array2<f32>,
    pub amplitude: Array2<f32>,
    pub start: SeasonPoint,
    pub start_position: DayGrid,
    pub end: SeasonPoint,
    pub end_position: DayGrid,
    pub length: DayGrid,
    pub green_up_rate: Array2<f32>,
    pub senescence_rate: Array2<f32>,
}

impl Landmarks {
    pub fn compute(
        values: ArrayView3<'_, f32>,
        time: &TimeAxis,
        method_sos: SosMethod,
        method_eos: EosMethod,
    ) -> Self {
        let peak_value = landmarks::peak_value(values);
        let peak_index = landmarks::peak_index(values);
        let peak_position = landmarks::peak_position(&peak_index, time);
        let trough = landmarks::trough_value(values);
        let amplitude = landmarks::amplitude(&peak_value, &trough);
        let start = landmarks::start_of_season_value(values, &peak_index, time, method_sos);
        let start_position = landmarks::start_of_season_position(&start, time);
        let end = landmarks::end_of_season_value(values, &peak_index, time, method_eos);
        let end_position = landmarks::end_of_season_position(&end, time);
        let length = landmarks::season_length(&start_position, &end_position, time);
        let green_up_rate =
            landmarks::green_up_rate(&peak_value, &start.value, &peak_position, &start_position);
        let senescence_rate =
            landmarks::senescence_rate(&end.value, &peak_value, &end_position, &peak_position);

        Self {
            peak_value,
            peak_position,
            trough,
            amplitude,
            start,
            start_position,
            end,
            end_position,
            length,
            green_up_rate,
            senescence_rate,
        }
    }

    /// The landmark behind `stat`, cast to its output dtype
    pub fn band(&self, stat: Stat) -> StatBand {
        match stat {
            Stat::Sos => StatBand::Int16(to_int16(&self.start_position)),
            Stat::Pos => StatBand::Int16(to_int16(&self.peak_position)),
            Stat::Eos => StatBand::Int16(to_int16(&self.end_position)),
            Stat::Los => StatBand::Int16(to_int16(&self.length)),
            Stat::Trough => StatBand::Float32(self.trough.clone()),
            Stat::VSos => StatBand::Float32(self.start.value.clone()),
            Stat::VPos => StatBand::Float32(self.peak_value.clone()),
            Stat::VEos => StatBand::Float32(self.end.value.clone()),
            Stat::Aos => StatBand::Float32(self.amplitude.clone()),
            Stat::Rog => StatBand::Float32(self.green_up_rate.clone()),
            Stat::Ros => StatBand::Float32(self.senescence_rate.clone()),
        }
    }
}

/// True where every time sample of a pixel is `NaN`
pub fn all_nan_mask(values: ArrayView3<'_, f32>) -> Array2<bool> {
    values.map_axis(Axis(2), all_nan)
}

/// Copy of `values` with fully missing pixels set to zero
pub fn zero_fill(values: ArrayView3<'_, f32>, mask: &Array2<bool>) -> Array3<f32> {
    let mut filled = values.to_owned();
    Zip::from(filled.lanes_mut(Axis(2)))
        .and(mask)
        .for_each(|mut lane, &missing| {
            if missing {
                lane.fill(0.0);
            }
        });
    filled
}

/// Land surface phenology statistics of an in-memory grid.
///
/// All landmarks are computed whatever was requested; only the requested
/// statistics are returned, in request order. Pixels without any
/// observation are missing in every band.
pub fn compute_phenology(grid: &TimeSeriesGrid, config: &PhenologyConfig) -> Result<PhenologyDataset> {
    let mask = all_nan_mask(grid.values());
    let filled = zero_fill(grid.values(), &mask);

    if config.verbose {
        info!("      Phenology...");
    }
    let landmarks = Landmarks::compute(
        filled.view(),
        grid.time(),
        config.method_sos,
        config.method_eos,
    );

    let mut dataset = PhenologyDataset::new(grid.spatial_shape());
    for stat in config.stats.iter() {
        if config.verbose {
            info!("         {stat}");
        }
        let mut band = landmarks.band(stat);
        band.mask(&mask);
        dataset.insert(stat, band);
    }

    dataset.assign_crs(grid.crs());
    Ok(dataset)
}
