//! Lining model results up against what the microphone measured.

use crate::{NmsimError, SpectralResult, BAND_LABELS, COMPARISON_BANDS};
use chrono::{NaiveDateTime, TimeDelta, Timelike};
use flightpath::{parse_timestamp, TIMESTAMP_FORMAT};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

/// Name of an NVSPL table's timestamp column.
pub const TIME_COLUMN: &str = "STime";

/// One second of measured (or predicted) one-third-octave levels,
/// 12.5 Hz through 12.5 kHz.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSample {
    pub time: NaiveDateTime,
    pub bands_db: [f64; COMPARISON_BANDS],
}

/// NVSPL column holding a band, e.g. `H12p5` for 12.5 Hz.
pub fn nvspl_column(label: &str) -> String {
    format!("H{}", label.replace('.', "p"))
}

fn comparison_labels() -> &'static [&'static str] {
    &BAND_LABELS[1..]
}

/// Reads an NVSPL table.
///
/// Only `STime` and the comparison band columns are used; any other
/// column is ignored. Empty level cells read as NaN.
pub fn read_nvspl<R: Read>(rdr: R) -> Result<Vec<MeasurementSample>, NmsimError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(rdr);
    let headers = rdr.headers()?.clone();
    let index_of = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| NmsimError::MissingColumn(name.to_string()))
    };
    let time_idx = index_of(TIME_COLUMN)?;
    let band_idx = comparison_labels()
        .iter()
        .map(|label| index_of(&nvspl_column(label)))
        .collect::<Result<Vec<usize>, _>>()?;

    let mut samples = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let bad = |reason| NmsimError::Measurement { row, reason };
        let time = record
            .get(time_idx)
            .and_then(parse_timestamp)
            .ok_or_else(|| bad("bad STime"))?;
        let mut bands_db = [f64::NAN; COMPARISON_BANDS];
        for (band, &idx) in bands_db.iter_mut().zip(&band_idx) {
            *band = match record.get(idx).unwrap_or_default() {
                "" => f64::NAN,
                cell => cell.parse().map_err(|_| bad("level is not a number"))?,
            };
        }
        samples.push(MeasurementSample { time, bands_db });
    }
    Ok(samples)
}

pub fn read_nvspl_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<MeasurementSample>, NmsimError> {
    read_nvspl(File::open(path)?)
}

/// Reads the hourly NVSPL files of `station` in `dir` covering `from`
/// through `to`, sorted by time.
///
/// Hours without a file are skipped.
pub fn load_measurements(
    dir: &Path,
    station: &str,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<MeasurementSample>, NmsimError> {
    let mut samples = Vec::new();
    let mut hour = from.date().and_hms_opt(from.hour(), 0, 0).unwrap_or(from);
    while hour <= to {
        let path = dir.join(format!(
            "NVSPL_{station}_{}.txt",
            hour.format("%Y_%m_%d_%H")
        ));
        if path.is_file() {
            samples.extend(read_nvspl_from_path(&path)?);
        } else {
            warn!("no measurements for {station} at {hour}");
        }
        hour += TimeDelta::hours(1);
    }
    samples.sort_by_key(|sample| sample.time);
    debug!("loaded {} measured seconds", samples.len());
    Ok(samples)
}

/// How results are placed against measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignSettings {
    /// Site local time minus UTC (hours).
    pub utc_offset_hours: i32,

    /// Context kept on either side of the result (minutes).
    pub pad_minutes: u32,

    /// Written where the model has no value.
    pub missing_value: f64,
}

impl Default for AlignSettings {
    fn default() -> Self {
        Self {
            utc_offset_hours: -8,
            pad_minutes: 5,
            missing_value: -99.9,
        }
    }
}

/// Model and measurement over the same window.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// First second of the window.
    pub start: NaiveDateTime,

    /// Last second of the window.
    pub end: NaiveDateTime,

    /// The result with padding on both sides, one sample per second
    /// from `start` through `end`.
    pub predicted: Vec<MeasurementSample>,

    /// Measurements within the window.
    pub measured: Vec<MeasurementSample>,
}

/// Aligns `result` with `measured`.
///
/// The window is the result's span widened by `pad_minutes` on each
/// side. Returns `None` for an empty result.
pub fn align(
    result: &SpectralResult,
    measured: &[MeasurementSample],
    settings: &AlignSettings,
) -> Option<Comparison> {
    let pad = TimeDelta::minutes(i64::from(settings.pad_minutes));
    let start = result.start()? - pad;
    let end = result.end()? + pad;
    let missing = [settings.missing_value; COMPARISON_BANDS];

    let padding = |from: NaiveDateTime| {
        (1..=pad.num_seconds()).map(move |s| MeasurementSample {
            time: from + TimeDelta::seconds(s),
            bands_db: missing,
        })
    };
    let mut predicted: Vec<MeasurementSample> = padding(start - TimeDelta::seconds(1)).collect();
    predicted.extend(result.seconds.iter().map(|second| {
        let mut bands_db = missing;
        for (band, &level) in bands_db.iter_mut().zip(second.comparison_bands()) {
            if !level.is_nan() {
                *band = level;
            }
        }
        MeasurementSample {
            time: second.time,
            bands_db,
        }
    }));
    predicted.extend(padding(result.end()?));

    let measured: Vec<MeasurementSample> = measured
        .iter()
        .filter(|sample| start <= sample.time && sample.time <= end)
        .cloned()
        .collect();
    info!(
        "window {start} to {end}; model: {} s, measured: {} s",
        predicted.len(),
        measured.len()
    );
    Some(Comparison {
        start,
        end,
        predicted,
        measured,
    })
}

/// Writes `comparison` as CSV: `time`, `source` (`model` or
/// `measured`) and one column per band, named as in NVSPL tables.
pub fn write_comparison<W: Write>(w: W, comparison: &Comparison) -> Result<(), NmsimError> {
    let mut wtr = csv::Writer::from_writer(w);
    let mut header = vec!["time".to_string(), "source".to_string()];
    header.extend(comparison_labels().iter().map(|label| nvspl_column(label)));
    wtr.write_record(&header)?;

    let rows = comparison
        .predicted
        .iter()
        .map(|sample| ("model", sample))
        .chain(comparison.measured.iter().map(|sample| ("measured", sample)));
    for (source, sample) in rows {
        let mut record = vec![
            sample.time.format(TIMESTAMP_FORMAT).to_string(),
            source.to_string(),
        ];
        record.extend(sample.bands_db.iter().map(|level| format!("{level:.1}")));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
