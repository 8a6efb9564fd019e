// src/grid/time.rs
use chrono::{Datelike, NaiveDateTime};

use crate::error::{PhenologyError, Result};

/// Ordered timestamps of the time dimension.
///
/// Day-of-year and numeric offsets are derived once at construction; every
/// landmark reads them instead of touching the timestamps again.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    timestamps: Vec<NaiveDateTime>,
    day_of_year: Vec<i16>,
    offsets: Vec<f64>,
}

impl TimeAxis {
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Result<Self> {
        if let Some(i) = timestamps.windows(2).position(|w| w[1] < w[0]) {
            return Err(PhenologyError::InvalidInput(format!(
                "timestamps must be sorted ascending ({} follows {})",
                timestamps[i + 1],
                timestamps[i]
            )));
        }

        let day_of_year = timestamps.iter().map(|t| t.ordinal() as i16).collect();
        let offsets = match timestamps.first() {
            Some(&origin) => timestamps
                .iter()
                .map(|t| t.signed_duration_since(origin).num_milliseconds() as f64 / 1000.0)
                .collect(),
            None => Vec::new(),
        };

        Ok(Self {
            timestamps,
            day_of_year,
            offsets,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Day-of-year (1..=366) of every sample
    pub fn day_of_year(&self) -> &[i16] {
        &self.day_of_year
    }

    /// Seconds since the first sample; the coordinate used for derivatives
    pub fn offsets_seconds(&self) -> &[f64] {
        &self.offsets
    }

    pub fn max_day_of_year(&self) -> Option<i16> {
        self.day_of_year.iter().copied().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn day_of_year_follows_calendar() {
        let axis = TimeAxis::new(vec![at(2020, 1, 1), at(2020, 3, 1), at(2020, 12, 31)]).unwrap();
        // 2020 is a leap year
        assert_eq!(axis.day_of_year(), &[1, 61, 366]);
        assert_eq!(axis.max_day_of_year(), Some(366));
    }

    #[test]
    fn offsets_are_seconds_from_first_sample() {
        let axis = TimeAxis::new(vec![at(2021, 1, 1), at(2021, 1, 2), at(2021, 1, 4)]).unwrap();
        assert_eq!(axis.offsets_seconds(), &[0.0, 86_400.0, 259_200.0]);
    }

    #[test]
    fn unsorted_timestamps_are_rejected() {
        let err = TimeAxis::new(vec![at(2021, 2, 1), at(2021, 1, 1)]).unwrap_err();
        assert!(matches!(err, PhenologyError::InvalidInput(_)));
    }

    #[test]
    fn empty_axis_has_no_max_day() {
        let axis = TimeAxis::new(Vec::new()).unwrap();
        assert!(axis.is_empty());
        assert_eq!(axis.max_day_of_year(), None);
    }
}
