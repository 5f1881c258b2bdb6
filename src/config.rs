//! `spot-cost.toml` configuration.
//!
//! ```toml
//! [sources]
//! spot_prices = "spot_prices.csv"
//! consumption = "consumption.csv"
//!
//! [rates]
//! flat_cents = [5.18, 20.0]
//! threshold_cents = 20.0
//!
//! [report]
//! since = ["2022-01-01 00:00:00", "2022-08-29 00:00:00"]
//! hourly_breakdown = true
//!
//! [solar]
//! mode = "measured"
//! archives = ["archive-1-15.6.2022.json", "archive-16-30.6.2022.json"]
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::archive::{self, DEFAULT_CHANNEL};
use crate::error::ConfigError;
use crate::loaders::{DEFAULT_CONSUMPTION_FORMAT, DEFAULT_SPOT_PRICE_FORMAT};
use crate::series::Timestamp;
use crate::solar::{
    DEFAULT_DAILY_CURVE, DEFAULT_MAX_CAPACITY_KWH, FoldCalendar, ReferenceProfile, SolarProduction,
};
use crate::statistics::{DEFAULT_FLAT_RATES_CENTS, ReportSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub sources: SourcesConfig,

    #[serde(default)]
    pub rates: RatesConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub solar: SolarConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub spot_prices: PathBuf,

    #[serde(default = "default_spot_price_format")]
    pub spot_price_format: String,

    pub consumption: PathBuf,

    #[serde(default = "default_consumption_format")]
    pub consumption_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesConfig {
    #[serde(default = "default_flat_rates")]
    pub flat_cents: Vec<f64>,

    #[serde(default)]
    pub threshold_cents: Option<f64>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            flat_cents: default_flat_rates(),
            threshold_cents: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Window starts, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`.
    #[serde(default = "default_since")]
    pub since: Vec<String>,

    #[serde(default)]
    pub hourly_breakdown: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            since: default_since(),
            hourly_breakdown: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SolarConfig {
    #[default]
    None,
    Synthetic {
        #[serde(default = "default_max_capacity")]
        max_capacity_kwh: f64,

        #[serde(default = "default_curve")]
        curve: Vec<f64>,
    },
    Measured {
        archives: Vec<PathBuf>,

        #[serde(default = "default_channel")]
        channel: String,

        #[serde(default = "default_year")]
        year: i32,

        #[serde(default = "default_season_start")]
        season_start: u32,

        #[serde(default = "default_season_end")]
        season_end: u32,

        #[serde(default = "default_reference_month")]
        reference_month: u32,
    },
}

fn default_spot_price_format() -> String {
    DEFAULT_SPOT_PRICE_FORMAT.to_string()
}

fn default_consumption_format() -> String {
    DEFAULT_CONSUMPTION_FORMAT.to_string()
}

fn default_flat_rates() -> Vec<f64> {
    DEFAULT_FLAT_RATES_CENTS.to_vec()
}

fn default_since() -> Vec<String> {
    vec!["2022-01-01 00:00:00".to_string()]
}

fn default_max_capacity() -> f64 {
    DEFAULT_MAX_CAPACITY_KWH
}

fn default_curve() -> Vec<f64> {
    DEFAULT_DAILY_CURVE.to_vec()
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_year() -> i32 {
    FoldCalendar::default().year
}

fn default_season_start() -> u32 {
    FoldCalendar::default().season_start
}

fn default_season_end() -> u32 {
    FoldCalendar::default().season_end
}

fn default_reference_month() -> u32 {
    FoldCalendar::default().reference_month
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or a bare date (midnight).
pub fn parse_since(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, validates and resolves relative paths against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.sources.spot_prices);
        resolve(&mut self.sources.consumption);
        if let SolarConfig::Measured { archives, .. } = &mut self.solar {
            archives.iter_mut().for_each(resolve);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report.since.is_empty() {
            return Err(ConfigError::Invalid(
                "report.since needs at least one timestamp".to_string(),
            ));
        }
        self.since_timestamps()?;

        if let Some(rate) = self.rates.flat_cents.iter().find(|r| !r.is_finite()) {
            return Err(ConfigError::Invalid(format!("flat rate {rate} is not a number")));
        }
        if let Some(threshold) = self.rates.threshold_cents.filter(|t| !t.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "threshold {threshold} is not a number"
            )));
        }

        match &self.solar {
            SolarConfig::None => {}
            SolarConfig::Synthetic {
                max_capacity_kwh,
                curve,
            } => {
                if curve.len() != 24 {
                    return Err(ConfigError::Invalid(format!(
                        "solar.curve needs 24 hourly factors, got {}",
                        curve.len()
                    )));
                }
                let usable = |v: f64| v.is_finite() && v >= 0.0;
                if !curve.iter().all(|f| usable(*f)) || !usable(*max_capacity_kwh) {
                    return Err(ConfigError::Invalid(
                        "solar production must be a finite, non-negative number".to_string(),
                    ));
                }
            }
            SolarConfig::Measured {
                archives,
                season_start,
                season_end,
                reference_month,
                ..
            } => {
                if archives.is_empty() {
                    return Err(ConfigError::Invalid(
                        "measured solar needs at least one archive".to_string(),
                    ));
                }
                let month = 1_u32..=12;
                if !month.contains(season_start)
                    || !month.contains(season_end)
                    || !month.contains(reference_month)
                {
                    return Err(ConfigError::Invalid(
                        "solar months must be between 1 and 12".to_string(),
                    ));
                }
                if season_start > season_end {
                    return Err(ConfigError::Invalid(format!(
                        "solar season starts after it ends ({season_start} > {season_end})"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn since_timestamps(&self) -> Result<Vec<Timestamp>, ConfigError> {
        self.report
            .since
            .iter()
            .map(|s| {
                parse_since(s)
                    .ok_or_else(|| ConfigError::Invalid(format!("invalid since timestamp '{s}'")))
            })
            .collect()
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            flat_rates_cents: self.rates.flat_cents.clone(),
            hourly_breakdown: self.report.hourly_breakdown,
            threshold_cents: self.rates.threshold_cents,
        }
    }
}

impl SolarConfig {
    /// Builds the production profile, reading measured archives if needed.
    pub fn build(&self) -> Result<SolarProduction, ConfigError> {
        match self {
            Self::None => Ok(SolarProduction::None),
            Self::Synthetic {
                max_capacity_kwh,
                curve,
            } => {
                let curve: [f64; 24] = curve.as_slice().try_into().map_err(|_| {
                    ConfigError::Invalid("solar.curve needs 24 hourly factors".to_string())
                })?;
                Ok(SolarProduction::SyntheticDailyCurve {
                    curve,
                    max_capacity_kwh: *max_capacity_kwh,
                })
            }
            Self::Measured {
                archives,
                channel,
                year,
                season_start,
                season_end,
                reference_month,
            } => {
                let calendar = FoldCalendar {
                    year: *year,
                    season_start: *season_start,
                    season_end: *season_end,
                    reference_month: *reference_month,
                };
                let ranges = archives
                    .iter()
                    .map(|path| archive::load_archive(path, channel).and_then(|t| t.hourly()))
                    .collect::<Result<Vec<_>, _>>()?;
                let profile = ReferenceProfile::from_hourly(&ranges, &calendar)?;
                Ok(SolarProduction::MeasuredCalendarFold { profile, calendar })
            }
        }
    }

    /// Year of the measured data, if the profile is tied to one.
    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Measured { year, .. } => Some(*year),
            Self::None | Self::Synthetic { .. } => None,
        }
    }
}
