//! Inverter archive documents (`GetArchiveData` JSON exports).
//!
//! Each document covers one sub-range of the reference month. Samples are
//! keyed by seconds since the sub-range start and carry energy in Wh.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::Deserialize;
use tracing::info;

use crate::error::ParseError;
use crate::series::{HourlySeries, Timestamp};

pub const DEFAULT_CHANNEL: &str = "inverter/1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ArchiveDocument {
    body: ArchiveBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ArchiveBody {
    data: HashMap<String, ArchiveChannel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ArchiveChannel {
    start: DateTime<FixedOffset>,
    data: ChannelData,
}

#[derive(Debug, Deserialize)]
struct ChannelData {
    #[serde(rename = "EnergyReal_WAC_Sum_Produced")]
    produced: ProducedEnergy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProducedEnergy {
    unit: String,
    values: HashMap<String, f64>,
}

/// Raw samples of one measured sub-range.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProductionTable {
    /// Local start of the sub-range.
    pub start: Timestamp,
    /// Seconds since `start` → Wh.
    pub samples: BTreeMap<u64, f64>,
}

impl RawProductionTable {
    /// Sums samples into hour buckets keyed by `start + offset / 3600` hours.
    /// An offset that lands outside the representable calendar is rejected.
    pub fn hourly(&self) -> Result<HourlySeries, ParseError> {
        let mut buckets: BTreeMap<Timestamp, f64> = BTreeMap::new();
        for (&offset, &wh) in &self.samples {
            let at = i64::try_from(offset / 3600)
                .ok()
                .and_then(TimeDelta::try_hours)
                .and_then(|hours| self.start.checked_add_signed(hours))
                .ok_or_else(|| ParseError::InvalidOffset(offset.to_string()))?;
            *buckets.entry(at).or_insert(0.0) += wh;
        }
        Ok(buckets.into_iter().collect())
    }
}

pub fn read_archive<R: Read>(reader: R, channel: &str) -> Result<RawProductionTable, ParseError> {
    let mut document: ArchiveDocument = serde_json::from_reader(reader)?;
    let channel_data = document
        .body
        .data
        .remove(channel)
        .ok_or_else(|| ParseError::MissingChannel(channel.to_string()))?;

    let produced = channel_data.data.produced;
    if produced.unit != "Wh" {
        return Err(ParseError::UnexpectedUnit(produced.unit));
    }

    let samples = produced
        .values
        .into_iter()
        .map(|(offset, wh)| {
            offset
                .trim()
                .parse::<u64>()
                .map(|secs| (secs, wh))
                .map_err(|_| ParseError::InvalidOffset(offset))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(RawProductionTable {
        start: channel_data.start.naive_local(),
        samples,
    })
}

pub fn load_archive(path: &Path, channel: &str) -> Result<RawProductionTable, ParseError> {
    let file = File::open(path)?;
    let table = read_archive(BufReader::new(file), channel)?;
    info!(
        path = %path.display(),
        start = %table.start,
        samples = table.samples.len(),
        "loaded measured production"
    );
    Ok(table)
}
