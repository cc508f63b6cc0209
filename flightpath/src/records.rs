//! Hours of acoustic data available for a deployment.

use crate::FlightpathError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use log::debug;
use std::{collections::BTreeSet, path::Path};

/// The set of hours a deployment recorded, keyed by the top of the
/// hour in site local time.
///
/// NVSPL files hold one hour each, so a flight can only be compared
/// against measurements when the hour it started in is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordIndex {
    hours: BTreeSet<NaiveDateTime>,
}

impl RecordIndex {
    /// Returns an index of the hours containing each of `times`.
    pub fn from_hours(times: impl IntoIterator<Item = NaiveDateTime>) -> Self {
        Self {
            hours: times.into_iter().map(truncate_to_hour).collect(),
        }
    }

    /// Returns an index of every NVSPL file for `station` (unit code
    /// followed by site code, e.g. `DENATRLA`) directly inside `dir`.
    ///
    /// Files are expected to be named
    /// `NVSPL_{station}_{YYYY}_{MM}_{DD}_{HH}.txt`; anything else in
    /// the directory is skipped.
    pub fn from_nvspl_dir(dir: &Path, station: &str) -> Result<Self, FlightpathError> {
        let mut hours = BTreeSet::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(std::ffi::OsStr::to_str) else {
                continue;
            };
            match parse_nvspl_name(name) {
                Some((file_station, hour)) if file_station == station => {
                    hours.insert(hour);
                }
                _ => debug!("skipping {name}"),
            }
        }
        if hours.is_empty() {
            return Err(FlightpathError::NoRecords {
                station: station.to_string(),
                dir: dir.to_owned(),
            });
        }
        Ok(Self { hours })
    }

    /// Returns `true` if the hour containing `time` was recorded.
    pub fn contains_hour(&self, time: NaiveDateTime) -> bool {
        self.hours.contains(&truncate_to_hour(time))
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.hours.first().map(NaiveDateTime::date)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.hours.last().map(NaiveDateTime::date)
    }

    /// Returns `true` if `day` falls between the first and last
    /// recorded days, inclusive.
    ///
    /// This is the date range the track query is bounded by.
    pub fn covers_day(&self, day: NaiveDate) -> bool {
        match (self.first_day(), self.last_day()) {
            (Some(first), Some(last)) => first <= day && day <= last,
            _ => false,
        }
    }
}

/// Truncates `time` to the top of its hour.
pub(crate) fn truncate_to_hour(time: NaiveDateTime) -> NaiveDateTime {
    time.date().and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(time.hour()))
}

/// Splits `NVSPL_{station}_{YYYY}_{MM}_{DD}_{HH}.txt` into the station
/// and the hour it covers.
fn parse_nvspl_name(name: &str) -> Option<(&str, NaiveDateTime)> {
    let stem = name.strip_prefix("NVSPL_")?.strip_suffix(".txt")?;
    let mut parts = stem.rsplitn(5, '_');
    let hour: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    let station = parts.next()?;
    let time = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)?;
    Some((station, time))
}
