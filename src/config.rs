//! Run configuration, optionally loaded from TOML.
//!
//! ```toml
//! target = "202509"
//! data_file = "GLB.Ts+dSST.txt"
//! window_lengths = [18, 21, 24, 27, 30]
//!
//! [[bins]]
//! name = "<100"
//! upper = 99.5
//!
//! [reference]
//! "<100" = 0.006
//! ```
//!
//! Every key is optional; omitted keys take their defaults.

use crate::core::month::parse_year_month;
use crate::data::DEFAULT_ENSO_URL;
use crate::error::{ForecastError, Result};
use crate::pipeline::backtest::{BacktestConfig, DEFAULT_MIN_TRAIN_MONTHS, DEFAULT_WINDOWS};
use crate::pipeline::probability::PredictionBin;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Month to forecast when none is configured.
pub const DEFAULT_TARGET: &str = "202509";

/// Local GISTEMP table.
pub const DEFAULT_DATA_FILE: &str = "GLB.Ts+dSST.txt";

/// Start of the modern-era history used for modelling.
pub const DEFAULT_HISTORY_START: &str = "197001";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Outcome bins in hundredths of a degree, with half-unit edges so that
/// they cover the real line exactly once.
pub fn default_bins() -> Vec<PredictionBin> {
    vec![
        PredictionBin::new("<100", None, Some(99.5)),
        PredictionBin::new("100-104", Some(99.5), Some(104.5)),
        PredictionBin::new("105-109", Some(104.5), Some(109.5)),
        PredictionBin::new("110-114", Some(109.5), Some(114.5)),
        PredictionBin::new("115-119", Some(114.5), Some(119.5)),
        PredictionBin::new(">119", Some(119.5), None),
    ]
}

/// Consensus probabilities shown next to the model's.
pub fn default_reference() -> BTreeMap<String, f64> {
    [
        ("<100", 0.006),
        ("100-104", 0.015),
        ("105-109", 0.014),
        ("110-114", 0.14),
        ("115-119", 0.41),
        (">119", 0.49),
    ]
    .into_iter()
    .map(|(name, p)| (name.to_string(), p))
    .collect()
}

/// Settings for one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Target month as `YYYYMM`.
    pub target: String,
    pub data_file: PathBuf,
    pub enso_url: String,
    /// First month of the modelling history as `YYYYMM`; empty keeps all.
    pub history_start: String,
    pub window_lengths: Vec<usize>,
    pub min_train_months: usize,
    pub http_timeout_secs: u64,
    pub bins: Vec<PredictionBin>,
    pub reference: BTreeMap<String, f64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            enso_url: DEFAULT_ENSO_URL.to_string(),
            history_start: DEFAULT_HISTORY_START.to_string(),
            window_lengths: DEFAULT_WINDOWS.to_vec(),
            min_train_months: DEFAULT_MIN_TRAIN_MONTHS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            bins: default_bins(),
            reference: default_reference(),
        }
    }
}

fn config_error(message: impl Into<String>) -> ForecastError {
    ForecastError::Config(message.into())
}

impl ForecastConfig {
    /// Load a TOML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| config_error(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
            .map_err(|e| config_error(format!("{}: {e}", path.display())))
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| config_error(e.to_string()))
    }

    /// Target month.
    pub fn target_month(&self) -> Result<NaiveDate> {
        parse_year_month(&self.target)
            .map_err(|_| config_error(format!("target '{}' is not a YYYYMM month", self.target)))
    }

    /// First history month, if the history is restricted.
    pub fn history_start_month(&self) -> Result<Option<NaiveDate>> {
        if self.history_start.trim().is_empty() {
            return Ok(None);
        }
        parse_year_month(&self.history_start).map(Some).map_err(|_| {
            config_error(format!(
                "history_start '{}' is not a YYYYMM month",
                self.history_start
            ))
        })
    }

    pub fn backtest(&self) -> BacktestConfig {
        BacktestConfig {
            windows: self.window_lengths.clone(),
            min_train_months: self.min_train_months,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Check every setting, reporting the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.target_month()?;
        self.history_start_month()?;

        if self.window_lengths.is_empty() {
            return Err(config_error("window_lengths must not be empty"));
        }
        if self.window_lengths.contains(&0) {
            return Err(config_error("window lengths must be positive"));
        }
        if self.min_train_months == 0 {
            return Err(config_error("min_train_months must be positive"));
        }
        if self.http_timeout_secs == 0 {
            return Err(config_error("http_timeout_secs must be positive"));
        }
        if self.enso_url.trim().is_empty() {
            return Err(config_error("enso_url must not be empty"));
        }

        if self.bins.is_empty() {
            return Err(config_error("at least one bin is required"));
        }
        let mut names = HashSet::new();
        for bin in &self.bins {
            if !names.insert(bin.name.as_str()) {
                return Err(config_error(format!("duplicate bin name '{}'", bin.name)));
            }
            if let (Some(lower), Some(upper)) = (bin.lower, bin.upper) {
                if !(lower < upper) {
                    return Err(config_error(format!(
                        "bin '{}' has lower {lower} not below upper {upper}",
                        bin.name
                    )));
                }
            }
        }
        for (name, p) in &self.reference {
            if !(0.0..=1.0).contains(p) {
                return Err(config_error(format!(
                    "reference probability for '{name}' must lie in [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::month::month_start;
    use crate::pipeline::probability::check_partition;
    use std::io::Write;

    #[test]
    fn defaults_are_valid_and_partition_the_line() {
        let config = ForecastConfig::default();
        config.validate().unwrap();
        assert_eq!(config.target_month().unwrap(), month_start(2025, 9).unwrap());
        assert_eq!(
            config.history_start_month().unwrap(),
            Some(month_start(1970, 1).unwrap())
        );
        assert!(check_partition(&config.bins).is_empty());
        let total: f64 = config.reference.values().sum();
        assert!((total - 1.075).abs() < 1e-9);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ForecastConfig::from_toml(
            r#"
            target = "202406"
            window_lengths = [18, 24]
            "#,
        )
        .unwrap();
        assert_eq!(config.target, "202406");
        assert_eq!(config.window_lengths, vec![18, 24]);
        assert_eq!(config.min_train_months, 36);
        assert_eq!(config.bins, default_bins());
    }

    #[test]
    fn bins_and_reference_from_toml() {
        let config = ForecastConfig::from_toml(
            r#"
            [[bins]]
            name = "cold"
            upper = 110.0

            [[bins]]
            name = "warm"
            lower = 110.0

            [reference]
            cold = 0.3
            warm = 0.7
            "#,
        )
        .unwrap();
        assert_eq!(config.bins[0], PredictionBin::new("cold", None, Some(110.0)));
        assert_eq!(config.bins[1], PredictionBin::new("warm", Some(110.0), None));
        assert_eq!(config.reference["warm"], 0.7);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ForecastConfig::from_toml("targt = \"202509\"").unwrap_err();
        assert!(matches!(err, ForecastError::Config(_)));
    }

    #[test]
    fn validation_failures_are_config_errors() {
        let cases: Vec<Box<dyn Fn(&mut ForecastConfig)>> = vec![
            Box::new(|c| c.target = "2025-09".to_string()),
            Box::new(|c| c.history_start = "1970".to_string()),
            Box::new(|c| c.window_lengths.clear()),
            Box::new(|c| c.window_lengths.push(0)),
            Box::new(|c| c.bins.clear()),
            Box::new(|c| c.bins.push(PredictionBin::new("<100", None, Some(1.0)))),
            Box::new(|c| c.bins[1].upper = Some(90.0)),
            Box::new(|c| {
                c.reference.insert("x".to_string(), 1.5);
            }),
        ];
        for mutate in cases {
            let mut config = ForecastConfig::default();
            mutate(&mut config);
            assert!(matches!(config.validate(), Err(ForecastError::Config(_))));
        }
    }

    #[test]
    fn empty_history_start_keeps_everything() {
        let config = ForecastConfig {
            history_start: String::new(),
            ..Default::default()
        };
        assert_eq!(config.history_start_month().unwrap(), None);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "min_train_months = 48").unwrap();
        let config = ForecastConfig::load(file.path()).unwrap();
        assert_eq!(config.min_train_months, 48);

        let err = ForecastConfig::load(Path::new("/nonexistent/forecast.toml")).unwrap_err();
        assert!(matches!(err, ForecastError::Config(_)));
    }
}
