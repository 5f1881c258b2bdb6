//! Consumption and cost statistics for one report window.

use std::collections::BTreeMap;

use chrono::Timelike;

use crate::error::ReportError;
use crate::pricing::PriceResolver;
use crate::series::{HourlySeries, Timestamp};

/// Cents → currency unit.
const CENTS: f64 = 0.01;

pub const DEFAULT_FLAT_RATES_CENTS: [f64; 2] = [5.18, 20.0];

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    /// Flat rates (cents/kWh) to compare spot pricing against.
    pub flat_rates_cents: Vec<f64>,
    pub hourly_breakdown: bool,
    /// List hours priced above this rate (cents/kWh) that drew from the grid.
    pub threshold_cents: Option<f64>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            flat_rates_cents: DEFAULT_FLAT_RATES_CENTS.to_vec(),
            hourly_breakdown: false,
            threshold_cents: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub at: Timestamp,
    pub kwh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatCost {
    pub rate_cents: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
}

impl PriceStats {
    /// Statistics over `first` and `rest`; there is always at least one price.
    fn of(first: f64, rest: &[f64]) -> Self {
        let mut sorted = Vec::with_capacity(rest.len() + 1);
        sorted.push(first);
        sorted.extend_from_slice(rest);
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        Self {
            min: sorted[0],
            max: sorted[n - 1],
            avg: sorted.iter().sum::<f64>() / n as f64,
            median: lower_median(&sorted),
        }
    }
}

/// Spot price statistics for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourOfDayPrices {
    pub hour: u32,
    pub samples: usize,
    pub raw: PriceStats,
    /// Same statistics with each price rounded to a whole cent first.
    pub rounded: PriceStats,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpensiveHour {
    pub at: Timestamp,
    pub net_kwh: f64,
    pub price_cents: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub since: Timestamp,
    pub first: Timestamp,
    pub last: Timestamp,
    pub hours: usize,
    pub total_kwh: f64,
    pub average_kwh: f64,
    /// Smallest value; ties go to the earliest hour.
    pub min: Entry,
    /// Largest value; ties go to the earliest hour.
    pub max: Entry,
    pub median_kwh: f64,
    pub flat_costs: Vec<FlatCost>,
    pub spot_cost: f64,
    /// The flat rate (cents/kWh) that would have cost the same as spot pricing.
    pub effective_spot_rate_cents: f64,
    pub hourly_prices: Vec<HourOfDayPrices>,
    pub expensive_hours: Vec<ExpensiveHour>,
}

/// Element at index `(n - 1) / 2` of an already sorted slice.
pub fn lower_median(sorted: &[f64]) -> f64 {
    sorted[(sorted.len() - 1) / 2]
}

pub fn compute<P: PriceResolver + ?Sized>(
    net: &HourlySeries,
    prices: &P,
    since: Timestamp,
    settings: &ReportSettings,
) -> Result<Report, ReportError> {
    let window: Vec<Entry> = net.since(since).map(|(at, kwh)| Entry { at, kwh }).collect();
    let (Some(&first), Some(&last)) = (window.first(), window.last()) else {
        return Err(ReportError::EmptyRange { since });
    };

    // The window is in ascending time order, so strict comparisons keep the
    // earliest hour on ties.
    let mut min = first;
    let mut max = first;
    for entry in &window[1..] {
        if entry.kwh < min.kwh {
            min = *entry;
        }
        if entry.kwh > max.kwh {
            max = *entry;
        }
    }

    let total_kwh: f64 = window.iter().map(|e| e.kwh).sum();
    if total_kwh == 0.0 {
        return Err(ReportError::ZeroConsumption { since });
    }
    let average_kwh = total_kwh / window.len() as f64;

    let mut sorted: Vec<f64> = window.iter().map(|e| e.kwh).collect();
    sorted.sort_by(f64::total_cmp);
    let median_kwh = lower_median(&sorted);

    let flat_costs = settings
        .flat_rates_cents
        .iter()
        .map(|&rate_cents| FlatCost {
            rate_cents,
            cost: total_kwh * rate_cents * CENTS,
        })
        .collect();

    let priced = window
        .iter()
        .map(|e| prices.price_at(e.at).map(|price| (*e, price)))
        .collect::<Result<Vec<_>, _>>()?;

    let spot_cost: f64 = priced.iter().map(|(e, price)| e.kwh * price * CENTS).sum();
    let effective_spot_rate_cents = spot_cost / total_kwh * 100.0;

    let hourly_prices = if settings.hourly_breakdown {
        hour_of_day_prices(&priced)
    } else {
        Vec::new()
    };

    let expensive_hours = match settings.threshold_cents {
        Some(threshold) => priced
            .iter()
            .filter(|(e, price)| *price > threshold && e.kwh > 0.0)
            .map(|(e, price)| ExpensiveHour {
                at: e.at,
                net_kwh: e.kwh,
                price_cents: *price,
            })
            .collect(),
        None => Vec::new(),
    };

    Ok(Report {
        since,
        first: first.at,
        last: last.at,
        hours: window.len(),
        total_kwh,
        average_kwh,
        min,
        max,
        median_kwh,
        flat_costs,
        spot_cost,
        effective_spot_rate_cents,
        hourly_prices,
        expensive_hours,
    })
}

fn hour_of_day_prices(priced: &[(Entry, f64)]) -> Vec<HourOfDayPrices> {
    // first price of each hour, then the rest
    let mut by_hour: BTreeMap<u32, (f64, Vec<f64>)> = BTreeMap::new();
    for (e, price) in priced {
        by_hour
            .entry(e.at.hour())
            .and_modify(|(_, rest)| rest.push(*price))
            .or_insert((*price, Vec::new()));
    }

    by_hour
        .into_iter()
        .map(|(hour, (first, rest))| {
            let rounded: Vec<f64> = rest.iter().map(|p| p.round()).collect();
            HourOfDayPrices {
                hour,
                samples: rest.len() + 1,
                raw: PriceStats::of(first, &rest),
                rounded: PriceStats::of(first.round(), &rounded),
            }
        })
        .collect()
}
