//! Selecting the flights a deployment could have heard.

use crate::{
    FlightTrack, FlightpathError, MonitoringDeployment, PointOrigin, RecordIndex, TrackPoint,
    METERS_PER_FOOT,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use geo::geometry::{Coord, Polygon};
use geodesy::{Utm, UtmZone};
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Knobs for [`FlightFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Flights whose closest approach is farther than this are dropped
    /// (kilometers, inclusive).
    pub search_radius_km: f64,

    /// Climb angles steeper than this, up or down, are GPS noise and
    /// get reset to 0 (degrees).
    pub climb_angle_max_deg: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            search_radius_km: 20.0,
            climb_angle_max_deg: 20.0,
        }
    }
}

/// Where and when a flight passed nearest to the microphone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosestApproach {
    pub flight_id: u64,

    /// Planar distance to the site (kilometers).
    pub distance_km: f64,

    pub utc: DateTime<Utc>,

    pub local: NaiveDateTime,
}

/// A flight that survived filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RetainedFlight {
    pub flight_id: u64,
    pub registration: String,
    pub zone: UtmZone,
    /// Every fix, projected, with climb angles attached.
    pub points: Vec<TrackPoint>,
    pub closest: ClosestApproach,
}

impl RetainedFlight {
    /// Time of the first fix.
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|point| point.utc)
    }
}

/// Why a flight was left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// One point does not a trajectory make.
    SinglePoint,

    /// The hour the flight started in has no NVSPL file.
    NoAcousticRecord { start: NaiveDateTime },

    /// The flight never came within the search radius.
    OutsideRadius {
        start: NaiveDateTime,
        distance_km: f64,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::SinglePoint => write!(f, "has a single point"),
            RejectReason::NoAcousticRecord { start } => {
                write!(f, "starting {start} has no matching acoustic record")
            }
            RejectReason::OutsideRadius { start, distance_km } => write!(
                f,
                "starting {start} was not within the search radius ({distance_km:.1} km)"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub flight_id: u64,
    pub reason: RejectReason,
}

/// The result of running a [`FlightFilter`] over a set of tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub zone: UtmZone,

    /// The microphone in the projected plane.
    pub site: Coord<f64>,

    pub retained: Vec<RetainedFlight>,

    pub rejected: Vec<Rejection>,
}

impl FilterOutcome {
    /// No flight coincides with the deployment.
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    pub fn closest_approaches(&self) -> impl Iterator<Item = &ClosestApproach> {
        self.retained.iter().map(|flight| &flight.closest)
    }
}

enum Verdict {
    Retained(RetainedFlight),
    Rejected(RejectReason),
}

/// Selects flights relevant to one monitoring deployment.
pub struct FlightFilter<'a> {
    deployment: &'a MonitoringDeployment,
    records: &'a RecordIndex,
    settings: FilterSettings,
    utm: Utm,
    site: Coord<f64>,
}

impl<'a> FlightFilter<'a> {
    pub fn new(
        deployment: &'a MonitoringDeployment,
        records: &'a RecordIndex,
        settings: FilterSettings,
    ) -> Result<Self, FlightpathError> {
        let utm = Utm::for_longitude(deployment.longitude())?;
        let site = utm.to_projected(deployment.position)?;
        info!(
            "{}{}: {:.0}, {:.0} - UTM zone {}",
            deployment.station(),
            deployment.year,
            site.x,
            site.y,
            utm.zone()
        );
        Ok(Self {
            deployment,
            records,
            settings,
            utm,
            site,
        })
    }

    pub fn zone(&self) -> UtmZone {
        self.utm.zone()
    }

    /// The microphone in the projected plane.
    pub fn site(&self) -> Coord<f64> {
        self.site
    }

    /// Circle of `search_radius_km` around the microphone, in
    /// geographic coordinates.
    ///
    /// This is the spatial mask handed to the track query; `run`
    /// itself measures distance in the projected plane.
    pub fn catchment(&self) -> Result<Polygon<f64>, FlightpathError> {
        Ok(geodesy::point_buffer(
            self.deployment.latitude(),
            self.deployment.longitude(),
            self.settings.search_radius_km,
        )?)
    }

    /// Evaluates every track and folds the verdicts into a new
    /// outcome. `tracks` is left untouched.
    pub fn run(&self, tracks: &[FlightTrack]) -> Result<FilterOutcome, FlightpathError> {
        let mut outcome = FilterOutcome {
            zone: self.zone(),
            site: self.site,
            retained: Vec::new(),
            rejected: Vec::new(),
        };
        for track in tracks {
            match self.evaluate(track)? {
                Verdict::Retained(flight) => {
                    info!(
                        "#{} expected closest at {} {:0.1}km",
                        flight.flight_id, flight.closest.local, flight.closest.distance_km
                    );
                    outcome.retained.push(flight);
                }
                Verdict::Rejected(reason) => {
                    info!("flight #{} {reason}", track.flight_id);
                    outcome.rejected.push(Rejection {
                        flight_id: track.flight_id,
                        reason,
                    });
                }
            }
        }
        Ok(outcome)
    }

    fn evaluate(&self, track: &FlightTrack) -> Result<Verdict, FlightpathError> {
        let (first, last) = match (track.fixes.first(), track.fixes.last()) {
            (Some(first), Some(last)) if track.len() > 1 => (first, last),
            _ => return Ok(Verdict::Rejected(RejectReason::SinglePoint)),
        };
        debug!(
            "flight #{}; fixes: {}, from {} to {}",
            track.flight_id,
            track.len(),
            first.local,
            last.local
        );

        let start = first.local;
        if !self.records.contains_hour(start) {
            return Ok(Verdict::Rejected(RejectReason::NoAcousticRecord { start }));
        }

        let projected = track
            .fixes
            .iter()
            .map(|fix| {
                self.utm.to_projected(Coord {
                    x: fix.longitude,
                    y: fix.latitude,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let coords: Vec<[f64; 3]> = projected
            .iter()
            .zip(&track.fixes)
            .map(|(xy, fix)| [xy.x, xy.y, fix.altitude_ft * METERS_PER_FOOT])
            .collect();
        let climb = climb_angles(&coords, self.settings.climb_angle_max_deg);

        let points: Vec<TrackPoint> = track
            .fixes
            .iter()
            .zip(projected)
            .zip(climb)
            .map(|((fix, xy), climb_angle_deg)| TrackPoint {
                origin: PointOrigin::Fix,
                utc: fix.utc,
                local: fix.local,
                elapsed_s: seconds_between(start, fix.local),
                longitude: fix.longitude,
                latitude: fix.latitude,
                altitude_ft: fix.altitude_ft,
                heading: fix.heading,
                knots: fix.knots,
                x: xy.x,
                y: xy.y,
                climb_angle_deg,
            })
            .collect();

        let closest = self.closest_approach(track.flight_id, &points);
        if closest.distance_km <= self.settings.search_radius_km {
            Ok(Verdict::Retained(RetainedFlight {
                flight_id: track.flight_id,
                registration: track.registration.clone(),
                zone: self.zone(),
                points,
                closest,
            }))
        } else {
            Ok(Verdict::Rejected(RejectReason::OutsideRadius {
                start,
                distance_km: closest.distance_km,
            }))
        }
    }

    /// `points` must not be empty.
    fn closest_approach(&self, flight_id: u64, points: &[TrackPoint]) -> ClosestApproach {
        let distance_m = |point: &TrackPoint| (point.x - self.site.x).hypot(point.y - self.site.y);
        let (point, meters) = points
            .iter()
            .map(|point| (point, distance_m(point)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map_or((None, f64::INFINITY), |(point, meters)| (Some(point), meters));
        ClosestApproach {
            flight_id,
            distance_km: meters / 1000.0,
            utc: point.map(|p| p.utc).unwrap_or_default(),
            local: point.map(|p| p.local).unwrap_or_default(),
        }
    }
}

/// Runs a [`FlightFilter`] for `deployment` over `tracks`.
pub fn filter(
    deployment: &MonitoringDeployment,
    tracks: &[FlightTrack],
    settings: FilterSettings,
    records: &RecordIndex,
) -> Result<FilterOutcome, FlightpathError> {
    FlightFilter::new(deployment, records, settings)?.run(tracks)
}

/// Returns the climb angle (degrees) at each of `coords` (x, y, z
/// meters), measured along the segment to the following point.
///
/// Angles steeper than `max_deg` and undefined angles (two identical
/// points) become 0. The last point has no outgoing segment and
/// repeats the angle before it.
pub fn climb_angles(coords: &[[f64; 3]], max_deg: f64) -> Vec<f64> {
    let mut angles: Vec<f64> = coords
        .iter()
        .tuple_windows()
        .map(|(a, b)| {
            let v = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            let degrees = (v[2] / norm).asin().to_degrees();
            if degrees.is_finite() && degrees.abs() <= max_deg {
                degrees
            } else {
                0.0
            }
        })
        .collect();
    if let Some(&last) = angles.last() {
        angles.push(last);
    }
    angles
}

fn seconds_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let millis = (end - start).num_milliseconds() as f64;
    millis / 1000.0
}
