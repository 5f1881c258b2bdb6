use crate::error::PriceError;
use crate::series::{HourlySeries, Timestamp, day_start};

/// Looks up the price (cents/kWh) that applies to an hour.
pub trait PriceResolver {
    fn price_at(&self, at: Timestamp) -> Result<f64, PriceError>;
}

/// Spot prices in cents/kWh.
///
/// Some feeds publish a single price per day for parts of the year, so a
/// missing hour falls back to the price stored at midnight of that day.
#[derive(Debug, Clone, Default)]
pub struct SpotPrices {
    series: HourlySeries,
}

impl SpotPrices {
    pub fn new(series: HourlySeries) -> Self {
        Self { series }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Mean over every loaded price, `None` when nothing was loaded.
    pub fn average(&self) -> Option<f64> {
        self.series.mean()
    }
}

impl PriceResolver for SpotPrices {
    fn price_at(&self, at: Timestamp) -> Result<f64, PriceError> {
        self.series
            .get(&at)
            .or_else(|| self.series.get(&day_start(at)))
            .ok_or(PriceError::Missing { at })
    }
}
