// src/processing/landmarks.rs
//! Season landmarks: pure per-pixel reductions over the time axis.
//!
//! Every function takes only the landmarks it depends on. Value inputs are
//! expected to have all-NaN pixels already zero filled.

use ndarray::{Array1, Array2, Array3, ArrayView3, Axis, Zip};

use crate::grid::TimeAxis;
use crate::processing::config::{EosMethod, SosMethod};
use crate::processing::extremum::{nan_arg_extremum, Extremum};
use crate::utils::{gradient, nan_max, nan_median, nan_min};

const TIME: Axis = Axis(2);

/// Per-pixel time index, `None` where it is undefined
pub type IndexGrid = Array2<Option<usize>>;

/// Per-pixel day-of-year or day count, `None` where it is undefined
pub type DayGrid = Array2<Option<i16>>;

/// A selected sample per pixel: its value and time index
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonPoint {
    pub value: Array2<f32>,
    pub index: IndexGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Greening,
    Senescing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pick {
    /// Most negative distance to the median
    BelowMedian,
    /// Smallest absolute distance to the median
    NearestMedian,
}

/// vPOS
pub fn peak_value(values: ArrayView3<'_, f32>) -> Array2<f32> {
    values.map_axis(TIME, nan_max)
}

pub fn peak_index(values: ArrayView3<'_, f32>) -> IndexGrid {
    nan_arg_extremum(values, TIME, Extremum::Max)
}

/// POS
pub fn peak_position(peak_index: &IndexGrid, time: &TimeAxis) -> DayGrid {
    day_of_year_at(peak_index, time)
}

/// Trough
pub fn trough_value(values: ArrayView3<'_, f32>) -> Array2<f32> {
    values.map_axis(TIME, nan_min)
}

/// AOS
pub fn amplitude(peak_value: &Array2<f32>, trough_value: &Array2<f32>) -> Array2<f32> {
    peak_value - trough_value
}

/// vSOS, taken from the rising samples strictly before the peak
pub fn start_of_season_value(
    values: ArrayView3<'_, f32>,
    peak_index: &IndexGrid,
    time: &TimeAxis,
    method: SosMethod,
) -> SeasonPoint {
    let pick = match method {
        SosMethod::First => Pick::BelowMedian,
        SosMethod::Median => Pick::NearestMedian,
    };
    select(side_candidates(values, peak_index, time, Side::Greening), pick)
}

/// SOS
pub fn start_of_season_position(start: &SeasonPoint, time: &TimeAxis) -> DayGrid {
    day_of_year_at(&start.index, time)
}

/// vEOS, taken from the falling samples strictly after the peak
pub fn end_of_season_value(
    values: ArrayView3<'_, f32>,
    peak_index: &IndexGrid,
    time: &TimeAxis,
    method: EosMethod,
) -> SeasonPoint {
    let pick = match method {
        EosMethod::Last => Pick::BelowMedian,
        EosMethod::Median => Pick::NearestMedian,
    };
    select(side_candidates(values, peak_index, time, Side::Senescing), pick)
}

/// EOS
pub fn end_of_season_position(end: &SeasonPoint, time: &TimeAxis) -> DayGrid {
    day_of_year_at(&end.index, time)
}

/// LOS. Seasons crossing a year boundary wrap around the largest
/// day-of-year of the series instead of going negative.
pub fn season_length(start: &DayGrid, end: &DayGrid, time: &TimeAxis) -> DayGrid {
    let year_end = time.max_day_of_year().unwrap_or(0) as i32;
    Zip::from(start).and(end).map_collect(|&sos, &eos| {
        let (sos, eos) = (sos?, eos?);
        let days = eos as i32 - sos as i32;
        let days = if days >= 0 { days } else { year_end + days };
        Some(days as i16)
    })
}

/// ROG
pub fn green_up_rate(
    peak_value: &Array2<f32>,
    start_value: &Array2<f32>,
    peak_position: &DayGrid,
    start_position: &DayGrid,
) -> Array2<f32> {
    Zip::from(peak_value)
        .and(start_value)
        .and(peak_position)
        .and(start_position)
        .map_collect(|&vpos, &vsos, &pos, &sos| rate(vpos - vsos, pos, sos))
}

/// ROS
pub fn senescence_rate(
    end_value: &Array2<f32>,
    peak_value: &Array2<f32>,
    end_position: &DayGrid,
    peak_position: &DayGrid,
) -> Array2<f32> {
    Zip::from(end_value)
        .and(peak_value)
        .and(end_position)
        .and(peak_position)
        .map_collect(|&veos, &vpos, &eos, &pos| rate(veos - vpos, eos, pos))
}

fn rate(rise: f32, to: Option<i16>, from: Option<i16>) -> f32 {
    match (to, from) {
        (Some(to), Some(from)) => rise / (to as f32 - from as f32),
        _ => f32::NAN,
    }
}

fn day_of_year_at(index: &IndexGrid, time: &TimeAxis) -> DayGrid {
    let doy = time.day_of_year();
    index.mapv(|i| i.map(|i| doy[i]))
}

/// Samples on one side of the peak whose time derivative points toward the
/// peak (rising before it, falling after it). Everything else is `NaN`.
fn side_candidates(
    values: ArrayView3<'_, f32>,
    peak_index: &IndexGrid,
    time: &TimeAxis,
    side: Side,
) -> Array3<f32> {
    let timestamps = time.timestamps();
    let coords = time.offsets_seconds();
    let mut out = Array3::from_elem(values.raw_dim(), f32::NAN);

    Zip::from(out.lanes_mut(TIME))
        .and(values.lanes(TIME))
        .and(peak_index)
        .for_each(|mut out_lane, lane, &peak| {
            let Some(peak) = peak else {
                return;
            };
            let peak_time = timestamps[peak];

            let side_lane: Array1<f32> = lane
                .iter()
                .zip(timestamps)
                .map(|(&v, t)| {
                    let keep = match side {
                        Side::Greening => *t < peak_time,
                        Side::Senescing => *t > peak_time,
                    };
                    if keep {
                        v
                    } else {
                        f32::NAN
                    }
                })
                .collect();

            let slope = gradient(side_lane.view(), coords);
            for (i, (cell, d)) in out_lane.iter_mut().zip(slope).enumerate() {
                let toward_peak = match side {
                    Side::Greening => d > 0.0,
                    Side::Senescing => d < 0.0,
                };
                if toward_peak {
                    *cell = side_lane[i];
                }
            }
        });

    out
}

fn select(candidates: Array3<f32>, pick: Pick) -> SeasonPoint {
    let median = candidates.map_axis(TIME, nan_median);

    let mut distance = candidates.clone();
    Zip::from(distance.lanes_mut(TIME))
        .and(&median)
        .for_each(|mut lane, &m| {
            lane.mapv_inplace(|v| match pick {
                Pick::BelowMedian => v - m,
                Pick::NearestMedian => (v - m).abs(),
            })
        });

    let index = nan_arg_extremum(distance.view(), TIME, Extremum::Min);
    let value = Zip::from(candidates.lanes(TIME))
        .and(&index)
        .map_collect(|lane, &i| i.map_or(f32::NAN, |i| lane[i]));

    SeasonPoint { value, index }
}
