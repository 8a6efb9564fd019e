// src/processing/stats.rs
use std::{fmt, str::FromStr};

use itertools::Itertools;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{PhenologyError, Result};
use crate::utils::NODATA_INT16;

/// Phenology statistics that can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    /// Day-of-year of the start of season
    #[serde(rename = "SOS")]
    Sos,
    /// Day-of-year of the peak of season
    #[serde(rename = "POS")]
    Pos,
    /// Day-of-year of the end of season
    #[serde(rename = "EOS")]
    Eos,
    /// Minimum value
    #[serde(rename = "Trough")]
    Trough,
    /// Value at the start of season
    #[serde(rename = "vSOS")]
    VSos,
    /// Value at the peak of season
    #[serde(rename = "vPOS")]
    VPos,
    /// Value at the end of season
    #[serde(rename = "vEOS")]
    VEos,
    /// Length of season in days
    #[serde(rename = "LOS")]
    Los,
    /// Amplitude of season
    #[serde(rename = "AOS")]
    Aos,
    /// Rate of greening
    #[serde(rename = "ROG")]
    Rog,
    /// Rate of senescence
    #[serde(rename = "ROS")]
    Ros,
}

/// Storage type of an output band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatDtype {
    Int16,
    Float32,
}

impl Stat {
    pub const ALL: [Stat; 11] = [
        Stat::Sos,
        Stat::Pos,
        Stat::Eos,
        Stat::Trough,
        Stat::VSos,
        Stat::VPos,
        Stat::VEos,
        Stat::Los,
        Stat::Aos,
        Stat::Rog,
        Stat::Ros,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stat::Sos => "SOS",
            Stat::Pos => "POS",
            Stat::Eos => "EOS",
            Stat::Trough => "Trough",
            Stat::VSos => "vSOS",
            Stat::VPos => "vPOS",
            Stat::VEos => "vEOS",
            Stat::Los => "LOS",
            Stat::Aos => "AOS",
            Stat::Rog => "ROG",
            Stat::Ros => "ROS",
        }
    }

    pub fn dtype(self) -> StatDtype {
        match self {
            Stat::Sos | Stat::Pos | Stat::Eos | Stat::Los => StatDtype::Int16,
            _ => StatDtype::Float32,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stat {
    type Err = PhenologyError;

    fn from_str(s: &str) -> Result<Self> {
        Stat::ALL
            .into_iter()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| {
                PhenologyError::config(
                    "stats",
                    s,
                    format!("expected one of {}", Stat::ALL.iter().join(", ")),
                )
            })
    }
}

/// Requested statistics: non-empty, in request order, without duplicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stat>", into = "Vec<Stat>")]
pub struct StatList(Vec<Stat>);

impl StatList {
    pub fn new(stats: impl IntoIterator<Item = Stat>) -> Result<Self> {
        let stats: Vec<Stat> = stats.into_iter().unique().collect();
        if stats.is_empty() {
            return Err(PhenologyError::config(
                "stats",
                "[]",
                "at least one statistic must be requested",
            ));
        }
        Ok(Self(stats))
    }

    pub fn all() -> Self {
        Self(Stat::ALL.to_vec())
    }

    /// Parse labels such as `["vPOS", "Trough"]`
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        let stats = labels
            .iter()
            .map(|label| label.as_ref().trim().parse())
            .collect::<Result<Vec<Stat>>>()?;
        Self::new(stats)
    }

    pub fn iter(&self) -> impl Iterator<Item = Stat> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, stat: Stat) -> bool {
        self.0.contains(&stat)
    }

    pub fn as_slice(&self) -> &[Stat] {
        &self.0
    }
}

impl Default for StatList {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Stat> for StatList {
    fn from(stat: Stat) -> Self {
        Self(vec![stat])
    }
}

impl TryFrom<Vec<Stat>> for StatList {
    type Error = PhenologyError;

    fn try_from(stats: Vec<Stat>) -> Result<Self> {
        Self::new(stats)
    }
}

impl TryFrom<&[Stat]> for StatList {
    type Error = PhenologyError;

    fn try_from(stats: &[Stat]) -> Result<Self> {
        Self::new(stats.iter().copied())
    }
}

impl From<StatList> for Vec<Stat> {
    fn from(list: StatList) -> Self {
        list.0
    }
}

/// Comma separated labels, e.g. `"vPOS"` or `"SOS,EOS,LOS"`
impl FromStr for StatList {
    type Err = PhenologyError;

    fn from_str(s: &str) -> Result<Self> {
        let labels: Vec<&str> = s.split(',').filter(|l| !l.trim().is_empty()).collect();
        Self::from_labels(&labels)
    }
}

/// One 2D output band.
///
/// Missing cells are [`NODATA_INT16`] in int16 bands and `NaN` in float32 bands.
#[derive(Debug, Clone, PartialEq)]
pub enum StatBand {
    Int16(Array2<i16>),
    Float32(Array2<f32>),
}

impl StatBand {
    /// A band of the given dtype with every cell missing
    pub fn missing(dtype: StatDtype, shape: (usize, usize)) -> Self {
        match dtype {
            StatDtype::Int16 => StatBand::Int16(Array2::from_elem(shape, NODATA_INT16)),
            StatDtype::Float32 => StatBand::Float32(Array2::from_elem(shape, f32::NAN)),
        }
    }

    pub fn dtype(&self) -> StatDtype {
        match self {
            StatBand::Int16(_) => StatDtype::Int16,
            StatBand::Float32(_) => StatDtype::Float32,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            StatBand::Int16(a) => a.dim(),
            StatBand::Float32(a) => a.dim(),
        }
    }

    pub fn as_int16(&self) -> Option<&Array2<i16>> {
        match self {
            StatBand::Int16(a) => Some(a),
            StatBand::Float32(_) => None,
        }
    }

    pub fn as_float32(&self) -> Option<&Array2<f32>> {
        match self {
            StatBand::Float32(a) => Some(a),
            StatBand::Int16(_) => None,
        }
    }

    pub fn is_missing(&self, row: usize, col: usize) -> bool {
        match self {
            StatBand::Int16(a) => a[[row, col]] == NODATA_INT16,
            StatBand::Float32(a) => a[[row, col]].is_nan(),
        }
    }

    /// Mark every cell where `mask` is true as missing
    pub fn mask(&mut self, mask: &Array2<bool>) {
        match self {
            StatBand::Int16(a) => Zip::from(a).and(mask).for_each(|v, &m| {
                if m {
                    *v = NODATA_INT16;
                }
            }),
            StatBand::Float32(a) => Zip::from(a).and(mask).for_each(|v, &m| {
                if m {
                    *v = f32::NAN;
                }
            }),
        }
    }
}

/// Labeled collection of 2D phenology bands
#[derive(Debug, Clone, PartialEq)]
pub struct PhenologyDataset {
    shape: (usize, usize),
    bands: Vec<(Stat, StatBand)>,
    crs: Option<String>,
}

impl PhenologyDataset {
    pub fn new(shape: (usize, usize)) -> Self {
        Self {
            shape,
            bands: Vec::new(),
            crs: None,
        }
    }

    /// Add a band, replacing any band already stored under `stat`
    pub fn insert(&mut self, stat: Stat, band: StatBand) {
        match self.bands.iter_mut().find(|(s, _)| *s == stat) {
            Some((_, existing)) => *existing = band,
            None => self.bands.push((stat, band)),
        }
    }

    pub fn get(&self, stat: Stat) -> Option<&StatBand> {
        self.bands.iter().find(|(s, _)| *s == stat).map(|(_, b)| b)
    }

    pub(crate) fn get_mut(&mut self, stat: Stat) -> Option<&mut StatBand> {
        self.bands.iter_mut().find(|(s, _)| *s == stat).map(|(_, b)| b)
    }

    pub fn stats(&self) -> Vec<Stat> {
        self.bands.iter().map(|(s, _)| *s).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, &StatBand)> + '_ {
        self.bands.iter().map(|(s, b)| (*s, b))
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    /// Attach a CRS when one is known; `None` leaves the dataset unchanged
    pub fn assign_crs(&mut self, crs: Option<&str>) {
        if let Some(crs) = crs.map(str::trim).filter(|c| !c.is_empty()) {
            self.crs = Some(crs.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for stat in Stat::ALL {
            assert_eq!(stat.name().parse::<Stat>().unwrap(), stat);
        }
        assert!("sos".parse::<Stat>().is_err());
    }

    #[test]
    fn stat_list_drops_duplicates_in_order() {
        let list = StatList::new([Stat::Los, Stat::Sos, Stat::Los]).unwrap();
        assert_eq!(list.as_slice(), &[Stat::Los, Stat::Sos]);
    }

    #[test]
    fn single_label_becomes_list() {
        let list: StatList = "vPOS".parse().unwrap();
        assert_eq!(list.as_slice(), &[Stat::VPos]);
        assert_eq!(StatList::from(Stat::Aos).len(), 1);
    }

    #[test]
    fn empty_request_is_rejected() {
        assert!(matches!(
            StatList::new([]),
            Err(PhenologyError::InvalidConfiguration { field: "stats", .. })
        ));
    }

    #[test]
    fn dataset_crs_ignores_absent_values() {
        let mut ds = PhenologyDataset::new((1, 1));
        ds.assign_crs(None);
        ds.assign_crs(Some(""));
        assert_eq!(ds.crs(), None);
        ds.assign_crs(Some("EPSG:6933"));
        assert_eq!(ds.crs(), Some("EPSG:6933"));
    }
}
