//! CSV readers for spot prices and metered consumption.
//!
//! Both sources are two-column files with one header row: an hourly
//! timestamp followed by a number. Column names differ between providers, so
//! rows are read by position.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{info, warn};

use crate::error::ParseError;
use crate::pricing::SpotPrices;
use crate::series::{HourlySeries, Timestamp, is_hour_aligned};

pub const DEFAULT_SPOT_PRICE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_CONSUMPTION_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

fn parse_timestamp(value: &str, format: &str, line: u64) -> Result<Timestamp, ParseError> {
    let at = NaiveDateTime::parse_from_str(value, format).map_err(|_| {
        ParseError::InvalidTimestamp {
            line,
            value: value.to_string(),
            format: format.to_string(),
        }
    })?;
    if !is_hour_aligned(&at) {
        return Err(ParseError::NotHourAligned {
            line,
            value: value.to_string(),
        });
    }
    Ok(at)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn store(series: &mut HourlySeries, at: Timestamp, value: f64, line: u64) {
    if let Some(previous) = series.insert(at, value) {
        warn!(%at, line, previous, value, "duplicate hour, keeping the later row");
    }
}

/// Reads `timestamp,cents` rows.
pub fn read_spot_prices<R: Read>(reader: R, format: &str) -> Result<SpotPrices, ParseError> {
    let mut csv_reader = csv_reader(reader);
    let mut series = HourlySeries::new();

    let mut record = StringRecord::new();
    while csv_reader.read_record(&mut record)? {
        let (timestamp, cents): (String, f64) = record.deserialize(None)?;
        let line = line_of(&record);
        let at = parse_timestamp(&timestamp, format, line)?;
        store(&mut series, at, cents, line);
    }

    Ok(SpotPrices::new(series))
}

/// Reads `timestamp,kWh` rows. Rows with a blank value are meter readings that
/// do not exist yet and are skipped.
pub fn read_consumption<R: Read>(reader: R, format: &str) -> Result<HourlySeries, ParseError> {
    let mut csv_reader = csv_reader(reader);
    let mut series = HourlySeries::new();
    let mut blank = 0usize;

    let mut record = StringRecord::new();
    while csv_reader.read_record(&mut record)? {
        let (timestamp, kwh): (String, Option<f64>) = record.deserialize(None)?;
        let Some(kwh) = kwh else {
            blank += 1;
            continue;
        };
        let line = line_of(&record);
        let at = parse_timestamp(&timestamp, format, line)?;
        store(&mut series, at, kwh, line);
    }

    if blank > 0 {
        info!(blank, "skipped consumption rows without a reading");
    }
    Ok(series)
}

pub fn load_spot_prices(path: &Path, format: &str) -> Result<SpotPrices, ParseError> {
    let file = File::open(path)?;
    let prices = read_spot_prices(BufReader::new(file), format)?;
    info!(path = %path.display(), hours = prices.len(), "loaded spot prices");
    Ok(prices)
}

pub fn load_consumption(path: &Path, format: &str) -> Result<HourlySeries, ParseError> {
    let file = File::open(path)?;
    let consumption = read_consumption(BufReader::new(file), format)?;
    info!(path = %path.display(), hours = consumption.len(), "loaded consumption");
    Ok(consumption)
}
