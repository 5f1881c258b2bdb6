use std::collections::BTreeMap;
use std::collections::btree_map;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// An hour in naive local time. Minute and second are always zero.
pub type Timestamp = NaiveDateTime;

/// Builds a timestamp from calendar fields, `None` if the date or hour does not exist.
pub fn hour(year: i32, month: u32, day: u32, hour: u32) -> Option<Timestamp> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)
}

/// Midnight of the same calendar day.
pub fn day_start(t: Timestamp) -> Timestamp {
    t.date().and_time(NaiveTime::MIN)
}

pub fn is_hour_aligned(t: &Timestamp) -> bool {
    t.minute() == 0 && t.second() == 0 && t.nanosecond() == 0
}

/// Hourly values keyed by timestamp, iterated in ascending time order.
///
/// Gaps are allowed; a missing key means "no reading", never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries {
    values: BTreeMap<Timestamp, f64>,
}

impl HourlySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` at `at`, returning the value it replaced.
    pub fn insert(&mut self, at: Timestamp, value: f64) -> Option<f64> {
        self.values.insert(at, value)
    }

    pub fn get(&self, at: &Timestamp) -> Option<f64> {
        self.values.get(at).copied()
    }

    pub fn contains(&self, at: &Timestamp) -> bool {
        self.values.contains_key(at)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, f64)> + '_ {
        self.values.iter().map(|(t, v)| (*t, *v))
    }

    /// Entries at or after `since`.
    pub fn since(&self, since: Timestamp) -> impl Iterator<Item = (Timestamp, f64)> + '_ {
        self.values.range(since..).map(|(t, v)| (*t, *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.values.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.values().copied()
    }

    pub fn first_key(&self) -> Option<Timestamp> {
        self.values.keys().next().copied()
    }

    pub fn last_key(&self) -> Option<Timestamp> {
        self.values.keys().next_back().copied()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values().sum::<f64>() / self.values.len() as f64)
    }
}

impl FromIterator<(Timestamp, f64)> for HourlySeries {
    fn from_iter<I: IntoIterator<Item = (Timestamp, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for HourlySeries {
    type Item = (Timestamp, f64);
    type IntoIter = btree_map::IntoIter<Timestamp, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_in_time_order_regardless_of_insertion() {
        let mut s = HourlySeries::new();
        s.insert(hour(2022, 1, 2, 0).unwrap(), 3.0);
        s.insert(hour(2022, 1, 1, 5).unwrap(), 2.0);
        s.insert(hour(2022, 1, 1, 0).unwrap(), 1.0);

        let values: Vec<f64> = s.values().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(s.first_key(), hour(2022, 1, 1, 0));
        assert_eq!(s.last_key(), hour(2022, 1, 2, 0));
    }

    #[test]
    fn since_is_inclusive() {
        let s: HourlySeries = (0..4)
            .map(|h| (hour(2022, 3, 1, h).unwrap(), f64::from(h)))
            .collect();

        let kept: Vec<f64> = s.since(hour(2022, 3, 1, 2).unwrap()).map(|(_, v)| v).collect();
        assert_eq!(kept, vec![2.0, 3.0]);
    }

    #[test]
    fn insert_replaces_existing_value() {
        let mut s = HourlySeries::new();
        let t = hour(2022, 1, 1, 0).unwrap();
        assert_eq!(s.insert(t, 1.0), None);
        assert_eq!(s.insert(t, 4.0), Some(1.0));
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(&t), Some(4.0));
    }

    #[test]
    fn mean_of_empty_series_is_none() {
        assert_eq!(HourlySeries::new().mean(), None);
    }

    #[test]
    fn day_start_keeps_date() {
        let t = hour(2022, 6, 15, 14).unwrap();
        assert_eq!(day_start(t), hour(2022, 6, 15, 0).unwrap());
        assert!(is_hour_aligned(&t));
        assert!(hour(2022, 2, 30, 0).is_none());
    }
}
