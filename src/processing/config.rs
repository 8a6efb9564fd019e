// src/processing/config.rs
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{PhenologyError, Result};
use crate::processing::stats::StatList;

/// How the start-of-season sample is picked on the greening side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SosMethod {
    /// Rising sample furthest below the median of the rising samples
    #[default]
    First,
    /// Rising sample closest to that median
    Median,
}

/// How the end-of-season sample is picked on the senescing side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EosMethod {
    /// Falling sample furthest below the median of the falling samples
    #[default]
    Last,
    /// Falling sample closest to that median
    Median,
}

impl FromStr for SosMethod {
    type Err = PhenologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first" => Ok(SosMethod::First),
            "median" => Ok(SosMethod::Median),
            other => Err(PhenologyError::config(
                "method_sos",
                other,
                "method_sos should be either 'median' or 'first'",
            )),
        }
    }
}

impl FromStr for EosMethod {
    type Err = PhenologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "last" => Ok(EosMethod::Last),
            "median" => Ok(EosMethod::Median),
            other => Err(PhenologyError::config(
                "method_eos",
                other,
                "method_eos should be either 'median' or 'last'",
            )),
        }
    }
}

impl fmt::Display for SosMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SosMethod::First => "first",
            SosMethod::Median => "median",
        })
    }
}

impl fmt::Display for EosMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EosMethod::Last => "last",
            EosMethod::Median => "median",
        })
    }
}

impl TryFrom<String> for SosMethod {
    type Error = PhenologyError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl TryFrom<String> for EosMethod {
    type Error = PhenologyError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<SosMethod> for String {
    fn from(method: SosMethod) -> Self {
        method.to_string()
    }
}

impl From<EosMethod> for String {
    fn from(method: EosMethod) -> Self {
        method.to_string()
    }
}

/// Per-invocation settings of the phenology pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhenologyConfig {
    pub stats: StatList,
    pub method_sos: SosMethod,
    pub method_eos: EosMethod,
    /// Narrate progress through the `log` facade; no effect on results
    pub verbose: bool,
}

impl Default for PhenologyConfig {
    fn default() -> Self {
        Self {
            stats: StatList::all(),
            method_sos: SosMethod::First,
            method_eos: EosMethod::Last,
            verbose: true,
        }
    }
}

impl PhenologyConfig {
    pub fn new(stats: impl Into<StatList>) -> Self {
        Self {
            stats: stats.into(),
            ..Self::default()
        }
    }

    /// Build from the textual configuration surface
    pub fn from_labels<S: AsRef<str>>(stats: &[S], method_sos: &str, method_eos: &str) -> Result<Self> {
        Ok(Self {
            method_sos: method_sos.parse()?,
            method_eos: method_eos.parse()?,
            stats: StatList::from_labels(stats)?,
            verbose: false,
        })
    }

    pub fn with_method_sos(mut self, method: SosMethod) -> Self {
        self.method_sos = method;
        self
    }

    pub fn with_method_eos(mut self, method: EosMethod) -> Self {
        self.method_eos = method;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::stats::Stat;

    #[test]
    fn unknown_methods_are_invalid_configuration() {
        let err = "last".parse::<SosMethod>().unwrap_err();
        assert!(matches!(
            err,
            PhenologyError::InvalidConfiguration { field: "method_sos", .. }
        ));
        let err = "first".parse::<EosMethod>().unwrap_err();
        assert!(matches!(
            err,
            PhenologyError::InvalidConfiguration { field: "method_eos", .. }
        ));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: PhenologyConfig =
            serde_json::from_str(r#"{"stats": ["vPOS", "Trough"], "method_sos": "median"}"#).unwrap();
        assert_eq!(config.stats.as_slice(), &[Stat::VPos, Stat::Trough]);
        assert_eq!(config.method_sos, SosMethod::Median);
        assert_eq!(config.method_eos, EosMethod::Last);
        assert!(config.verbose);
    }

    #[test]
    fn bad_method_in_json_is_reported() {
        let err = serde_json::from_str::<PhenologyConfig>(r#"{"method_eos": "first"}"#).unwrap_err();
        assert!(err.to_string().contains("method_eos"));
    }
}
