//! # Flight paths
//!
//! `flightpath` turns raw GPS fixes from the flight track database
//! into trajectories NMSIM can fly: tracks are selected against a
//! monitoring deployment ([`FlightFilter`]) and then filled in to
//! roughly one point per second ([`densify`]).

mod deployment;
mod densify;
mod error;
mod filter;
mod fix;
mod ingest;
mod math;
mod point;
mod records;

pub use crate::{
    deployment::MonitoringDeployment,
    densify::{densify, interpolation_steps},
    error::FlightpathError,
    filter::{
        climb_angles, filter, ClosestApproach, FilterOutcome, FilterSettings, FlightFilter,
        RejectReason, Rejection, RetainedFlight,
    },
    fix::{group_tracks, timestamp::parse as parse_timestamp, FlightFix, FlightTrack},
    ingest::{read_fixes, read_fixes_from_path},
    point::{PointOrigin, TrackPoint},
    records::RecordIndex,
};
pub use geodesy;

/// Meters per international foot.
pub const METERS_PER_FOOT: f64 = 0.3048;

/// Timestamp layout used by the track database and NVSPL tables.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
