//! Spherical azimuthal equidistant projection.
//!
//! Distances and bearings from the projection's origin are true, which
//! is what a catchment circle around a monitoring site needs.
//!
//! See Snyder, _Map Projections: A Working Manual_ (USGS PP 1395),
//! pp. 191-202.

use crate::{GeodesyError, MEAN_EARTH_RADIUS};
use geo::geometry::Coord;

/// An azimuthal equidistant plane centered on `origin`.
#[derive(Debug, Clone, Copy)]
pub struct AzimuthalEquidistant {
    /// Longitude of the origin (radians).
    lon0: f64,
    sin_lat0: f64,
    cos_lat0: f64,
}

impl AzimuthalEquidistant {
    /// Returns a projection centered on `origin` (x: longitude, y:
    /// latitude).
    pub fn new(origin: Coord<f64>) -> Result<Self, GeodesyError> {
        if !(-90.0..=90.0).contains(&origin.y) {
            return Err(GeodesyError::Latitude(origin.y));
        }
        if !origin.x.is_finite() {
            return Err(GeodesyError::Longitude(origin.x));
        }
        let (sin_lat0, cos_lat0) = origin.y.to_radians().sin_cos();
        Ok(Self {
            lon0: origin.x.to_radians(),
            sin_lat0,
            cos_lat0,
        })
    }

    /// Projects a geographic coordinate to plane meters.
    pub fn project(&self, coord: Coord<f64>) -> Coord<f64> {
        let (sin_lat, cos_lat) = coord.y.to_radians().sin_cos();
        let (sin_dlon, cos_dlon) = (coord.x.to_radians() - self.lon0).sin_cos();
        let cos_c = (self.sin_lat0 * sin_lat + self.cos_lat0 * cos_lat * cos_dlon).clamp(-1.0, 1.0);
        let c = cos_c.acos();
        let k = if c == 0.0 { 1.0 } else { c / c.sin() };
        Coord {
            x: MEAN_EARTH_RADIUS * k * cos_lat * sin_dlon,
            y: MEAN_EARTH_RADIUS * k * (self.cos_lat0 * sin_lat - self.sin_lat0 * cos_lat * cos_dlon),
        }
    }

    /// Returns the geographic coordinate of a point in the plane.
    pub fn unproject(&self, Coord { x, y }: Coord<f64>) -> Coord<f64> {
        let rho = x.hypot(y);
        if rho == 0.0 {
            return Coord {
                x: self.lon0.to_degrees(),
                y: self.sin_lat0.atan2(self.cos_lat0).to_degrees(),
            };
        }
        let c = rho / MEAN_EARTH_RADIUS;
        let (sin_c, cos_c) = c.sin_cos();
        let lat = (cos_c * self.sin_lat0 + y * sin_c * self.cos_lat0 / rho).asin();
        let lon = self.lon0
            + (x * sin_c).atan2(rho * self.cos_lat0 * cos_c - y * self.sin_lat0 * sin_c);
        Coord {
            x: lon.to_degrees(),
            y: lat.to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AzimuthalEquidistant;
    use approx::assert_abs_diff_eq;
    use geo::{
        geometry::{Coord, Point},
        HaversineDistance,
    };

    const TALKEETNA: Coord = Coord {
        x: -150.1,
        y: 62.32,
    };

    #[test]
    fn test_origin_maps_to_zero() {
        let aeqd = AzimuthalEquidistant::new(TALKEETNA).unwrap();
        let Coord { x, y } = aeqd.project(TALKEETNA);
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-9);
        let origin = aeqd.unproject(Coord { x: 0.0, y: 0.0 });
        assert_abs_diff_eq!(origin.x, TALKEETNA.x, epsilon = 1e-12);
        assert_abs_diff_eq!(origin.y, TALKEETNA.y, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_from_origin_is_true() {
        let aeqd = AzimuthalEquidistant::new(TALKEETNA).unwrap();
        let target = Coord { x: -149.2, y: 62.9 };
        let projected = aeqd.project(target);
        let expected = Point::from(TALKEETNA).haversine_distance(&Point::from(target));
        assert_abs_diff_eq!(projected.x.hypot(projected.y), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip() {
        let aeqd = AzimuthalEquidistant::new(TALKEETNA).unwrap();
        for (x, y) in [(20_000.0, 0.0), (-5_000.0, 12_500.0), (0.0, -50_000.0)] {
            let geographic = aeqd.unproject(Coord { x, y });
            let planar = aeqd.project(geographic);
            assert_abs_diff_eq!(planar.x, x, epsilon = 1e-6);
            assert_abs_diff_eq!(planar.y, y, epsilon = 1e-6);
        }
    }
}
