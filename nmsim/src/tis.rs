//! Time history (`.tis`) results: what the site heard, per band, per
//! second.

use crate::{NmsimError, ProjectDir};
use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeDelta, Utc};
use log::{debug, warn};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

/// One-third-octave band centers (Hz) reported by the model.
pub const BAND_LABELS: [&str; 32] = [
    "10", "12.5", "15.8", "20", "25", "31.5", "40", "50", "63", "80", "100", "125", "160", "200",
    "250", "315", "400", "500", "630", "800", "1000", "1250", "1600", "2000", "2500", "3150",
    "4000", "5000", "6300", "8000", "10000", "12500",
];

/// Bands measurements can be compared on: all but the 10 Hz band.
pub const COMPARISON_BANDS: usize = BAND_LABELS.len() - 1;

const HEADER_END: &str = "---End File Header---";

/// Data rows start this many lines after the header terminator.
const DATA_OFFSET: usize = 10;

/// Longest span a result covers.
const MAX_TIME_S: f64 = 24.0 * 3600.0;

/// Header plus a day of one second rows.
const MAX_LINES: usize = 18 + 24 * 3600;

/// Sample number, time, F, A and the bands. Rows carry a trailing
/// 20 kHz band as well, which is ignored.
const COLUMNS: usize = 4 + BAND_LABELS.len();

const DECIBELS_PER_CENTIBEL: f64 = 0.1;

/// One row of a result file, levels in decibels.
#[derive(Debug, Clone, PartialEq)]
pub struct TisRow {
    pub sample: u32,
    /// Seconds from the trajectory's start.
    pub time_s: f64,
    pub f: f64,
    /// Overall level.
    pub a_db: f64,
    pub bands_db: [f64; 32],
}

/// Parses the rows of a result file.
///
/// At most a day of rows is read. The last data line is a trailer,
/// not a row, and is dropped.
pub fn parse_tis<R: BufRead>(rdr: R) -> Result<Vec<TisRow>, NmsimError> {
    let lines = rdr
        .lines()
        .take(MAX_LINES)
        .collect::<Result<Vec<String>, _>>()?;
    let header_end = lines
        .iter()
        .position(|line| line.trim_end() == HEADER_END)
        .ok_or(NmsimError::TisHeader)?;

    let mut data: Vec<(usize, &str)> = lines
        .iter()
        .enumerate()
        .skip(header_end + DATA_OFFSET)
        .map(|(n, line)| (n + 1, line.as_str()))
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();
    data.pop();

    data.into_iter()
        .map(|(line_number, line)| parse_row(line_number, line))
        .collect()
}

/// Reads the rows of the result file at `path`.
pub fn read_tis<P: AsRef<Path>>(path: P) -> Result<Vec<TisRow>, NmsimError> {
    let path = path.as_ref();
    let rows = parse_tis(BufReader::new(File::open(path)?))?;
    debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn parse_row(line: usize, text: &str) -> Result<TisRow, NmsimError> {
    let bad = |reason| NmsimError::TisRow { line, reason };
    let values = text
        .split_whitespace()
        .take(COLUMNS)
        .map(str::parse::<f64>)
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|_| bad("not a number"))?;
    if values.len() < COLUMNS {
        return Err(bad("too few columns"));
    }
    let sample = values[0];
    if !(sample.is_finite() && sample >= 0.0) {
        return Err(bad("bad sample number"));
    }
    let time_s = values[1];
    if !(0.0..=MAX_TIME_S).contains(&time_s) {
        return Err(bad("bad time"));
    }
    let mut bands_db = [0.0; 32];
    for (band, value) in bands_db.iter_mut().zip(&values[4..]) {
        *band = value * DECIBELS_PER_CENTIBEL;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let sample = sample as u32;
    Ok(TisRow {
        sample,
        time_s,
        f: values[2],
        a_db: values[3] * DECIBELS_PER_CENTIBEL,
        bands_db,
    })
}

/// One second of a resampled result. Levels are NaN when no row fell
/// into the second.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralSecond {
    pub time: NaiveDateTime,
    pub a_db: f64,
    pub bands_db: [f64; 32],
}

impl SpectralSecond {
    /// Levels of the bands measurements are compared on.
    pub fn comparison_bands(&self) -> &[f64] {
        &self.bands_db[1..]
    }
}

/// A result on an unbroken one second time axis in site local time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectralResult {
    pub seconds: Vec<SpectralSecond>,
}

impl SpectralResult {
    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.seconds.first().map(|s| s.time)
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.seconds.last().map(|s| s.time)
    }
}

/// Puts `rows` on a one second axis.
///
/// Each row is placed at `start_utc` plus its time, shifted by
/// `utc_offset_hours` into local time, and falls into the second it
/// starts in. Seconds holding several rows get the median of each
/// level. The axis runs from the first occupied second to the last with
/// no gaps. Rows timed outside of a day from the start are skipped.
pub fn resample(rows: &[TisRow], start_utc: DateTime<Utc>, utc_offset_hours: i32) -> SpectralResult {
    let Some(origin) = TimeDelta::try_hours(i64::from(utc_offset_hours))
        .and_then(|offset| start_utc.naive_utc().checked_add_signed(offset))
    else {
        warn!("UTC offset of {utc_offset_hours} h is out of range");
        return SpectralResult::default();
    };
    let mut bins: BTreeMap<NaiveDateTime, Vec<&TisRow>> = BTreeMap::new();
    for row in rows {
        let Some(time) = row_offset(row.time_s).and_then(|offset| origin.checked_add_signed(offset))
        else {
            warn!("skipping sample {} at {} s", row.sample, row.time_s);
            continue;
        };
        bins.entry(time.trunc_subsecs(0)).or_default().push(row);
    }

    let (Some(&first), Some(&last)) = (bins.keys().next(), bins.keys().next_back()) else {
        return SpectralResult::default();
    };
    let mut seconds = Vec::new();
    let mut time = first;
    while time <= last {
        let second = match bins.get(&time) {
            Some(bin) => {
                let mut bands_db = [f64::NAN; 32];
                for (n, band) in bands_db.iter_mut().enumerate() {
                    *band = median(bin.iter().map(|row| row.bands_db[n]));
                }
                SpectralSecond {
                    time,
                    a_db: median(bin.iter().map(|row| row.a_db)),
                    bands_db,
                }
            }
            None => SpectralSecond {
                time,
                a_db: f64::NAN,
                bands_db: [f64::NAN; 32],
            },
        };
        seconds.push(second);
        let Some(next) = time.checked_add_signed(TimeDelta::seconds(1)) else {
            break;
        };
        time = next;
    }
    debug!("resampled {} rows to {} seconds", rows.len(), seconds.len());
    SpectralResult { seconds }
}

fn row_offset(time_s: f64) -> Option<TimeDelta> {
    if !(0.0..=MAX_TIME_S).contains(&time_s) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let millis = (time_s * 1000.0).round() as i64;
    TimeDelta::try_milliseconds(millis)
}

/// Median of the non-NaN `values`; the mean of the middle two for an
/// even count, NaN if there are none.
pub fn median(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    values.sort_unstable_by(f64::total_cmp);
    let n = values.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => values[n / 2],
        _ => (values[n / 2 - 1] + values[n / 2]) / 2.0,
    }
}

/// Pairs every result in `project` with the trajectory that produced
/// it, as `(trajectory, result)`.
///
/// Results are named `{site}_{trajectory}.tis` after the project's site
/// file. Results whose trajectory is gone are skipped.
pub fn pair_results(project: &ProjectDir) -> Result<Vec<(PathBuf, PathBuf)>, NmsimError> {
    let site = project.site_file()?;
    let prefix = format!(
        "{}_",
        site.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    let mut pairs = Vec::new();
    for result in project.result_files()? {
        let Some(stem) = result.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(trajectory_stem) = stem.strip_prefix(&prefix) else {
            debug!("{} is not a result for {}", result.display(), site.display());
            continue;
        };
        let trajectory = project
            .trajectory_dir()
            .join(format!("{trajectory_stem}.trj"));
        if trajectory.is_file() {
            pairs.push((trajectory, result));
        } else {
            warn!("no trajectory for {}", result.display());
        }
    }
    Ok(pairs)
}
