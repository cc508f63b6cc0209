use crate::FlightpathError;
use chrono::{DateTime, NaiveDateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One GPS fix as returned by the flight track database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightFix {
    pub flight_id: u64,

    /// FAA registration (N-number) of the aircraft.
    pub registration: String,

    #[serde(rename = "utc_datetime", with = "timestamp::utc")]
    pub utc: DateTime<Utc>,

    /// Wall clock time at the monitoring site.
    #[serde(rename = "ak_datetime", with = "timestamp::local")]
    pub local: NaiveDateTime,

    pub longitude: f64,

    pub latitude: f64,

    /// Altitude above ground (feet).
    pub altitude_ft: f64,

    /// Compass heading (degrees).
    pub heading: f64,

    /// Ground speed (knots).
    pub knots: f64,
}

impl FlightFix {
    /// Checks the fields a trajectory can't be built without.
    ///
    /// `row` is only used to point at the offending input.
    pub fn validate(&self, row: usize) -> Result<(), FlightpathError> {
        let invalid = |reason| FlightpathError::InvalidFix {
            flight_id: self.flight_id,
            row,
            reason,
        };
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid("longitude outside of [-180, 180]"));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(invalid("latitude outside of [-90, 90]"));
        }
        if !self.altitude_ft.is_finite() {
            return Err(invalid("altitude is not a number"));
        }
        if !self.heading.is_finite() || !self.knots.is_finite() {
            return Err(invalid("heading or speed is not a number"));
        }
        Ok(())
    }
}

/// All fixes of a single flight, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightTrack {
    pub flight_id: u64,
    pub registration: String,
    pub fixes: Vec<FlightFix>,
}

impl FlightTrack {
    /// Returns a track built from `fixes`, sorted by time.
    ///
    /// Fixes with equal timestamps keep their input order.
    pub fn new(flight_id: u64, mut fixes: Vec<FlightFix>) -> Self {
        fixes.sort_by_key(|fix| fix.utc);
        let registration = fixes
            .first()
            .map(|fix| fix.registration.clone())
            .unwrap_or_default();
        Self {
            flight_id,
            registration,
            fixes,
        }
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// Groups a table of fixes into tracks, ordered by flight id.
pub fn group_tracks(fixes: impl IntoIterator<Item = FlightFix>) -> Vec<FlightTrack> {
    fixes
        .into_iter()
        .into_group_map_by(|fix| fix.flight_id)
        .into_iter()
        .sorted_unstable_by_key(|(flight_id, _)| *flight_id)
        .map(|(flight_id, fixes)| FlightTrack::new(flight_id, fixes))
        .collect()
}

/// Serde adapters for the database's `YYYY-MM-DD HH:MM:SS[.f]`
/// timestamps.
///
/// A `T` separator is accepted as well since some exports are ISO
/// 8601.
pub(crate) mod timestamp {
    use crate::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;

    const PARSE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        PARSE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }

    pub mod local {
        use chrono::NaiveDateTime;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(&t.format(super::TIMESTAMP_FORMAT))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
            let raw = String::deserialize(d)?;
            super::parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp {raw:?}")))
        }
    }

    pub mod utc {
        use chrono::{DateTime, Utc};
        use serde::{Deserializer, Serializer};

        pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
            super::local::serialize(&t.naive_utc(), s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
            super::local::deserialize(d).map(|t| t.and_utc())
        }
    }
}
