//! Trajectory (`.trj`) files: where the aircraft is, second by second.

use crate::NmsimError;
use chrono::{DateTime, NaiveDateTime, Utc};
use flightpath::{geodesy::UtmZone, RetainedFlight, TrackPoint};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

const START_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NAME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Values written to every row or header of a trajectory that the
/// track data has no measurement for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryFormat {
    /// Engine power (percent).
    pub power: f64,

    /// Bank angle, right wing down (degrees).
    pub roll: f64,

    /// Ambient temperature (°F).
    pub temperature: f64,

    /// Relative humidity (percent).
    pub humidity: f64,
}

impl Default for TrajectoryFormat {
    fn default() -> Self {
        Self {
            power: 95.0,
            roll: 0.0,
            temperature: 59.0,
            humidity: 70.0,
        }
    }
}

/// The parts of a trajectory header that vary between flights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrajectoryHeader {
    pub registration: String,
    /// Time of the first point, which elapsed times count from.
    pub start_utc: DateTime<Utc>,
    pub zone: UtmZone,
}

impl TrajectoryHeader {
    pub fn for_flight(flight: &RetainedFlight) -> Result<Self, NmsimError> {
        let start_utc = flight
            .points
            .iter()
            .map(|point| point.utc)
            .min()
            .ok_or(NmsimError::EmptyTrajectory)?;
        Ok(Self {
            registration: flight.registration.clone(),
            start_utc,
            zone: flight.zone,
        })
    }

    /// `{registration}_{YYYYMMDD}_{HHMMSS}.trj`
    pub fn file_name(&self) -> String {
        trajectory_file_name(&self.registration, self.start_utc)
    }

    /// Reads the header of the trajectory file at `path`.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, NmsimError> {
        Self::parse(BufReader::new(File::open(path)?))
    }

    pub fn parse<R: BufRead>(rdr: R) -> Result<Self, NmsimError> {
        let mut zone = None;
        let mut flight = None;
        for line in rdr.lines().take(HEADER_LINES) {
            let line = line?;
            if let Some(number) = line.trim_start().strip_prefix("UTM Zone") {
                let number: u8 = number
                    .trim()
                    .parse()
                    .map_err(|_| NmsimError::TrajectoryHeader("bad UTM zone"))?;
                zone = Some(UtmZone::try_from(number)?);
            } else if let Some(rest) = line.strip_prefix("FLIGHT ") {
                flight = Some(parse_flight_line(rest)?);
            }
        }
        let zone = zone.ok_or(NmsimError::TrajectoryHeader("no UTM zone"))?;
        let (registration, start_utc) =
            flight.ok_or(NmsimError::TrajectoryHeader("no FLIGHT line"))?;
        Ok(Self {
            registration,
            start_utc,
            zone,
        })
    }
}

const HEADER_LINES: usize = 16;

/// Name of the trajectory file for a flight by `registration` starting
/// at `start_utc`.
pub fn trajectory_file_name(registration: &str, start_utc: DateTime<Utc>) -> String {
    format!("{registration}_{}.trj", start_utc.format(NAME_FORMAT))
}

/// Recovers the registration from a trajectory file name made by
/// [`trajectory_file_name`].
pub fn registration_from_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let mut parts = stem.rsplitn(3, '_');
    let time = parts.next()?;
    let date = parts.next()?;
    let registration = parts.next()?;
    let stamp_ok = time.len() == 6
        && date.len() == 8
        && time.bytes().chain(date.bytes()).all(|b| b.is_ascii_digit());
    (stamp_ok && !registration.is_empty()).then(|| registration.to_string())
}

fn parse_flight_line(rest: &str) -> Result<(String, DateTime<Utc>), NmsimError> {
    let (registration, start) = rest
        .split_once(" beginning ")
        .ok_or(NmsimError::TrajectoryHeader("bad FLIGHT line"))?;
    let start = start.trim_end().strip_suffix(" UTC").unwrap_or(start);
    let start = NaiveDateTime::parse_from_str(start.trim(), START_FORMAT)
        .map_err(|_| NmsimError::TrajectoryHeader("bad start time"))?;
    Ok((registration.to_string(), start.and_utc()))
}

/// Writes a trajectory: the header block followed by one row per
/// point.
///
/// Every row holds nine 15 character fields with three decimals:
/// elapsed seconds, x, y, altitude (meters), heading, climb angle,
/// speed (knots), power and roll.
pub fn write_trajectory<W: Write>(
    mut w: W,
    header: &TrajectoryHeader,
    points: &[TrackPoint],
    format: &TrajectoryFormat,
) -> Result<(), NmsimError> {
    let TrajectoryHeader {
        registration,
        start_utc,
        zone,
    } = header;
    write!(
        w,
        "Flight track trajectory variable description:\n \
         time - time in seconds from the reference time\n \
         Xpos - x coordinate (UTM)\n \
         Ypos - y coordinate (UTM)\n \
         UTM Zone  {zone}\n \
         Zpos - z coordinate in meters MSL\n \
         heading - aircraft compass bearing in degrees\n \
         climbANG - aircraft climb angle in degrees\n \
         vel - aircraft velocity in knots\n \
         power - % engine power\n \
         roll - bank angle (right wing down), degrees\n\
         FLIGHT {registration} beginning {} UTC\n\
         TEMP.  {:.1}\n\
         Humid.  {:.1}\n\
         \n         \
         time(s)        Xpos           Ypos           Zpos         heading        \
         climbANG       Vel            power          rol\n",
        start_utc.format(START_FORMAT),
        format.temperature,
        format.humidity,
    )?;
    for point in points {
        writeln!(
            w,
            "{:15.3}{:15.3}{:15.3}{:15.3}{:15.3}{:15.3}{:15.3}{:15.3}{:15.3}",
            point.elapsed_s,
            point.x,
            point.y,
            point.altitude_m(),
            point.heading,
            point.climb_angle_deg,
            point.knots,
            format.power,
            format.roll,
        )?;
    }
    w.flush()?;
    Ok(())
}

/// Writes a trajectory into `dir`, named after its header, and returns
/// the file's path.
pub fn write_trajectory_file(
    dir: &Path,
    header: &TrajectoryHeader,
    points: &[TrackPoint],
    format: &TrajectoryFormat,
) -> Result<PathBuf, NmsimError> {
    if points.is_empty() {
        return Err(NmsimError::EmptyTrajectory);
    }
    let path = dir.join(header.file_name());
    write_trajectory(BufWriter::new(File::create(&path)?), header, points, format)?;
    debug!("wrote {} points to {}", points.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{
        registration_from_name, trajectory_file_name, write_trajectory, write_trajectory_file,
        TrajectoryFormat, TrajectoryHeader,
    };
    use chrono::{NaiveDate, TimeDelta};
    use flightpath::{geodesy::UtmZone, PointOrigin, TrackPoint};
    use std::path::Path;

    const HEADER: &str = "\
Flight track trajectory variable description:
 time - time in seconds from the reference time
 Xpos - x coordinate (UTM)
 Ypos - y coordinate (UTM)
 UTM Zone  6
 Zpos - z coordinate in meters MSL
 heading - aircraft compass bearing in degrees
 climbANG - aircraft climb angle in degrees
 vel - aircraft velocity in knots
 power - % engine power
 roll - bank angle (right wing down), degrees
FLIGHT N12345 beginning 2019-06-14 21:20:05 UTC
TEMP.  59.0
Humid.  70.0

         time(s)        Xpos           Ypos           Zpos         heading        climbANG       Vel            power          rol
";

    fn header() -> TrajectoryHeader {
        TrajectoryHeader {
            registration: "N12345".to_string(),
            start_utc: NaiveDate::from_ymd_opt(2019, 6, 14)
                .unwrap()
                .and_hms_opt(21, 20, 5)
                .unwrap()
                .and_utc(),
            zone: UtmZone::try_from(6_u8).unwrap(),
        }
    }

    fn point(elapsed_s: f64) -> TrackPoint {
        let utc = header().start_utc + TimeDelta::seconds(1);
        TrackPoint {
            origin: PointOrigin::Fix,
            utc,
            local: utc.naive_utc() - TimeDelta::hours(8),
            elapsed_s,
            longitude: -149.0,
            latitude: 63.7,
            altitude_ft: 1000.0,
            heading: 87.25,
            knots: 104.5,
            x: 450_123.4567,
            y: 7_064_321.0,
            climb_angle_deg: -2.5,
        }
    }

    #[test]
    fn test_header_and_rows() {
        let mut out = Vec::new();
        write_trajectory(
            &mut out,
            &header(),
            &[point(0.0), point(1.25)],
            &TrajectoryFormat::default(),
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let (head, rows) = text.split_at(HEADER.len());
        assert_eq!(head, HEADER);
        assert_eq!(HEADER.lines().count(), 16);
        let rows: Vec<&str> = rows.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            "          1.250     450123.457    7064321.000        304.800         87.250         -2.500        104.500         95.000          0.000"
        );
        assert!(rows.iter().all(|row| row.len() == 9 * 15));
    }

    #[test]
    fn test_configurable_placeholders() {
        let format = TrajectoryFormat {
            power: 80.0,
            roll: 5.0,
            temperature: 41.0,
            humidity: 55.5,
        };
        let mut out = Vec::new();
        write_trajectory(&mut out, &header(), &[point(0.0)], &format).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("TEMP.  41.0\nHumid.  55.5\n"));
        assert!(text.ends_with("         80.000          5.000\n"));
    }

    #[test]
    fn test_file_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_trajectory_file(
            tmp.path(),
            &header(),
            &[point(0.0)],
            &TrajectoryFormat::default(),
        )
        .unwrap();
        assert!(path.ends_with("N12345_20190614_212005.trj"));
        assert_eq!(TrajectoryHeader::read(&path).unwrap(), header());
        assert!(write_trajectory_file(tmp.path(), &header(), &[], &TrajectoryFormat::default())
            .is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(
            trajectory_file_name("N12345", header().start_utc),
            "N12345_20190614_212005.trj"
        );
        assert_eq!(
            registration_from_name(Path::new("/p/03_TRAJECTORY/N12345_20190614_212005.trj")),
            Some("N12345".to_string())
        );
        assert_eq!(
            registration_from_name(Path::new("N_A_B_20190614_212005.trj")),
            Some("N_A_B".to_string())
        );
        assert_eq!(registration_from_name(Path::new("track.trj")), None);
        assert_eq!(registration_from_name(Path::new("N1_2019_212005.trj")), None);
    }
}
