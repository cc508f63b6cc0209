//! Circular catchment around a monitoring site.

use crate::{AzimuthalEquidistant, GeodesyError};
use geo::geometry::{Coord, LineString, Polygon};
use log::debug;
use std::f64::consts::TAU;

/// Vertices used to approximate the circle, 16 per quadrant.
pub const DEFAULT_SEGMENTS: usize = 64;

/// Returns a polygon, in geographic coordinates, enclosing every point
/// within `radius_km` of `(lat, lon)`.
///
/// The circle is drawn in an azimuthal equidistant plane centered on
/// the site and then unprojected, so it stays round on the ground at
/// any latitude instead of being squashed like a buffer built in
/// degrees would be.
pub fn point_buffer(lat: f64, lon: f64, radius_km: f64) -> Result<Polygon<f64>, GeodesyError> {
    point_buffer_with_segments(lat, lon, radius_km, DEFAULT_SEGMENTS)
}

/// Same as [`point_buffer`] with an explicit vertex count.
pub fn point_buffer_with_segments(
    lat: f64,
    lon: f64,
    radius_km: f64,
    segments: usize,
) -> Result<Polygon<f64>, GeodesyError> {
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return Err(GeodesyError::Radius(radius_km));
    }
    let aeqd = AzimuthalEquidistant::new(Coord { x: lon, y: lat })?;
    let radius_m = radius_km * 1000.0;
    let segments = segments.max(3);

    #[allow(clippy::cast_precision_loss)]
    let ring: Vec<Coord<f64>> = (0..segments)
        .map(|n| {
            let theta = TAU * n as f64 / segments as f64;
            aeqd.unproject(Coord {
                x: radius_m * theta.cos(),
                y: radius_m * theta.sin(),
            })
        })
        .collect();
    debug!("buffer; center: ({lat}, {lon}), radius_km: {radius_km}, segments: {segments}");

    // `Polygon::new` closes the ring.
    Ok(Polygon::new(LineString::from(ring), vec![]))
}
