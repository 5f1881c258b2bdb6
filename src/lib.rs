//! Household electricity cost under spot pricing.
//!
//! Spot prices, metered consumption and optional solar production are
//! aligned hour by hour; [`statistics::compute`] then reports consumption and
//! cost for a window starting at a given hour.

pub mod archive;
pub mod config;
pub mod error;
pub mod loaders;
pub mod normalize;
pub mod pricing;
pub mod series;
pub mod solar;
pub mod statistics;

pub use config::Config;
pub use error::{ConfigError, ParseError, PriceError, ReportError, SolarError};
pub use normalize::net_consumption;
pub use pricing::{PriceResolver, SpotPrices};
pub use series::{HourlySeries, Timestamp};
pub use solar::{FoldCalendar, MonthlyProductionSummary, SolarProduction, monthly_production};
pub use statistics::{Report, ReportSettings, compute};
