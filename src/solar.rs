//! Expected solar self-production per hour.
//!
//! A [`SolarProduction`] is chosen once when the configuration is loaded and
//! never switched afterwards. Every variant answers in kWh for one hour.

use chrono::{Datelike, Duration, NaiveDate, Timelike};
use tracing::{debug, warn};

use crate::error::SolarError;
use crate::series::{HourlySeries, Timestamp, hour};

/// Fraction of peak capacity produced in each hour of the day.
pub const DEFAULT_DAILY_CURVE: [f64; 24] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.1, 0.3, 0.6, 0.75, 0.8, 0.8, //
    0.85, 0.95, 0.8, 0.75, 0.5, 0.3, //
    0.1, 0.0, 0.0, 0.0, 0.0, 0.0,
];

pub const DEFAULT_MAX_CAPACITY_KWH: f64 = 2.0;

/// Which year the measured data belongs to, when panels produce, and which
/// month the measurements were taken in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldCalendar {
    pub year: i32,
    pub season_start: u32,
    pub season_end: u32,
    pub reference_month: u32,
}

impl Default for FoldCalendar {
    fn default() -> Self {
        Self {
            year: 2022,
            season_start: 3,
            season_end: 10,
            reference_month: 6,
        }
    }
}

impl FoldCalendar {
    pub fn in_season(&self, month: u32) -> bool {
        (self.season_start..=self.season_end).contains(&month)
    }

    /// Maps `t` onto the reference month. Day 31 becomes day 30; `None` if the
    /// reference month has no such day.
    pub fn fold(&self, t: Timestamp) -> Option<Timestamp> {
        let day = if t.day() == 31 { 30 } else { t.day() };
        hour(t.year(), self.reference_month, day, t.hour())
    }
}

/// Hourly production (Wh) measured during the reference month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceProfile {
    wh: HourlySeries,
}

impl ReferenceProfile {
    /// Merges hourly measured sub-ranges into one table. The sub-ranges must
    /// not share any hour and must lie inside the calendar's reference month.
    pub fn from_hourly(
        ranges: &[HourlySeries],
        calendar: &FoldCalendar,
    ) -> Result<Self, SolarError> {
        let mut wh = HourlySeries::new();
        for range in ranges {
            for (at, value) in range.iter() {
                if at.year() != calendar.year || at.month() != calendar.reference_month {
                    return Err(SolarError::OutsideReferenceMonth {
                        at,
                        year: calendar.year,
                        month: calendar.reference_month,
                    });
                }
                if wh.insert(at, value).is_some() {
                    return Err(SolarError::OverlappingRanges { at });
                }
            }
        }
        let profile = Self { wh };
        if profile.is_empty() {
            warn!("measured production has no samples, every hour reads 0");
        }
        debug!(
            hours = profile.len(),
            first = ?profile.wh.first_key(),
            last = ?profile.wh.last_key(),
            "merged measured production"
        );
        Ok(profile)
    }

    pub fn wh_at(&self, at: &Timestamp) -> Option<f64> {
        self.wh.get(at)
    }

    pub fn len(&self) -> usize {
        self.wh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wh.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolarProduction {
    /// No panels.
    None,
    /// Same curve every day, scaled by the peak hourly output.
    SyntheticDailyCurve {
        curve: [f64; 24],
        max_capacity_kwh: f64,
    },
    /// Every in-season month reuses the measured reference month. This is an
    /// approximation: only the reference month itself is real data.
    MeasuredCalendarFold {
        profile: ReferenceProfile,
        calendar: FoldCalendar,
    },
}

impl SolarProduction {
    pub fn synthetic() -> Self {
        Self::SyntheticDailyCurve {
            curve: DEFAULT_DAILY_CURVE,
            max_capacity_kwh: DEFAULT_MAX_CAPACITY_KWH,
        }
    }

    /// kWh produced during the hour starting at `t`.
    pub fn apply(&self, t: Timestamp) -> Result<f64, SolarError> {
        match self {
            Self::None => Ok(0.0),
            Self::SyntheticDailyCurve {
                curve,
                max_capacity_kwh,
            } => Ok(curve[t.hour() as usize] * max_capacity_kwh),
            Self::MeasuredCalendarFold { profile, calendar } => {
                if t.year() != calendar.year {
                    return Err(SolarError::UnsupportedYear {
                        year: t.year(),
                        supported: calendar.year,
                    });
                }
                if !calendar.in_season(t.month()) {
                    return Ok(0.0);
                }
                let wh = calendar
                    .fold(t)
                    .and_then(|folded| profile.wh_at(&folded))
                    .unwrap_or(0.0);
                Ok(wh / 1000.0)
            }
        }
    }
}

/// Production per calendar month of one year.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyProductionSummary {
    pub year: i32,
    /// `(month, kWh)` for months 1 through 12.
    pub months: Vec<(u32, f64)>,
    pub total_kwh: f64,
}

pub fn monthly_production(
    solar: &SolarProduction,
    year: i32,
) -> Result<MonthlyProductionSummary, SolarError> {
    let mut months = Vec::with_capacity(12);
    for month in 1..=12 {
        let (Some(start), Some(end)) = (month_start(year, month), next_month_start(year, month))
        else {
            continue;
        };
        let mut kwh = 0.0;
        let mut t = start;
        while t < end {
            kwh += solar.apply(t)?;
            t += Duration::hours(1);
        }
        months.push((month, kwh));
    }
    let total_kwh = months.iter().map(|(_, kwh)| kwh).sum();
    Ok(MonthlyProductionSummary {
        year,
        months,
        total_kwh,
    })
}

fn month_start(year: i32, month: u32) -> Option<Timestamp> {
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

fn next_month_start(year: i32, month: u32) -> Option<Timestamp> {
    if month == 12 {
        month_start(year + 1, 1)
    } else {
        month_start(year, month + 1)
    }
}
