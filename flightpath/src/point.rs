use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Where a [`TrackPoint`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointOrigin {
    /// A GPS fix from the database.
    Fix,
    /// Filled in between two fixes by [`densify`](crate::densify).
    Interpolated,
}

/// A point on a trajectory in the deployment's projected plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub origin: PointOrigin,

    pub utc: DateTime<Utc>,

    /// Wall clock time at the monitoring site.
    pub local: NaiveDateTime,

    /// Seconds since the first point of the track.
    pub elapsed_s: f64,

    pub longitude: f64,

    pub latitude: f64,

    /// Altitude above ground (feet).
    pub altitude_ft: f64,

    /// Compass heading (degrees).
    pub heading: f64,

    /// Ground speed (knots).
    pub knots: f64,

    /// UTM easting (meters).
    pub x: f64,

    /// UTM northing (meters).
    pub y: f64,

    /// Angle between the direction of travel and the horizontal
    /// (degrees, positive climbing).
    pub climb_angle_deg: f64,
}

impl TrackPoint {
    /// Returns the point a fraction `f` of the way from `self` to
    /// `other`, interpolating every numeric attribute linearly.
    ///
    /// Timestamps follow the interpolated elapsed time, rounded to the
    /// millisecond.
    pub fn lerp(&self, other: &TrackPoint, f: f64) -> TrackPoint {
        let lerp = |a: f64, b: f64| a + (b - a) * f;
        let elapsed_s = lerp(self.elapsed_s, other.elapsed_s);
        #[allow(clippy::cast_possible_truncation)]
        let offset = TimeDelta::milliseconds(((elapsed_s - self.elapsed_s) * 1000.0).round() as i64);
        TrackPoint {
            origin: PointOrigin::Interpolated,
            utc: self.utc + offset,
            local: self.local + offset,
            elapsed_s,
            longitude: lerp(self.longitude, other.longitude),
            latitude: lerp(self.latitude, other.latitude),
            altitude_ft: lerp(self.altitude_ft, other.altitude_ft),
            heading: lerp(self.heading, other.heading),
            knots: lerp(self.knots, other.knots),
            x: lerp(self.x, other.x),
            y: lerp(self.y, other.y),
            climb_angle_deg: lerp(self.climb_angle_deg, other.climb_angle_deg),
        }
    }

    /// Altitude in meters.
    pub fn altitude_m(&self) -> f64 {
        self.altitude_ft * crate::METERS_PER_FOOT
    }
}
