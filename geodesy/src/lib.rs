//! # Geodesy
//!
//! `geodesy` converts geographic coordinates into the projected
//! (UTM) plane NMSIM works in and builds the circular catchment used
//! to pick candidate flights around a monitoring site.

mod aeqd;
mod buffer;
mod error;
mod utm;

pub use crate::{
    aeqd::AzimuthalEquidistant,
    buffer::{point_buffer, point_buffer_with_segments, DEFAULT_SEGMENTS},
    error::GeodesyError,
    utm::{to_geographic, to_projected, zone_of, zone_of_western_extent, Utm, UtmZone},
};
pub use geo;

/// Mean earth radius in meters.
///
/// Same value [geo] uses for its haversine algorithms so that
/// distances on the buffer agree with `HaversineDistance`.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;
