//! Universal Transverse Mercator on the GRS80 ellipsoid (NAD83 / UTM
//! zone N).
//!
//! Uses Krüger's series to third order in `n`, which is good to well
//! under a millimeter inside a zone and still sub-meter a few degrees
//! outside of it. Tracks that wander into a neighboring zone are
//! projected into the deployment's zone, so that matters.
//!
//! # References
//!
//! 1. [Krüger series](https://en.wikipedia.org/wiki/Transverse_Mercator:_flattening_series)
//! 1. [UTM](https://en.wikipedia.org/wiki/Universal_Transverse_Mercator_coordinate_system)

use crate::GeodesyError;
use geo::geometry::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a zone in degrees longitude.
const ZONE_WIDTH_DEG: f64 = 6.0;

/// Number of UTM zones.
const ZONE_COUNT: u8 = 60;

/// Scale factor on the central meridian.
const K0: f64 = 0.9996;

/// Easting of the central meridian (meters).
const FALSE_EASTING: f64 = 500_000.0;

/// GRS80 semi-major axis (meters).
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// GRS80 flattening.
const FLATTENING: f64 = 1.0 / 298.257_222_101;

/// A UTM zone number in `1..=60`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct UtmZone(u8);

impl UtmZone {
    /// Returns an iterator over every zone, west to east.
    pub fn all() -> impl Iterator<Item = UtmZone> {
        (1..=ZONE_COUNT).map(UtmZone)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Western edge of this zone in degrees longitude.
    pub fn west_boundary(self) -> i32 {
        -180 + 6 * (i32::from(self.0) - 1)
    }

    /// Central meridian of this zone in degrees longitude.
    pub fn central_meridian(self) -> f64 {
        f64::from(self.west_boundary()) + ZONE_WIDTH_DEG / 2.0
    }
}

impl TryFrom<u8> for UtmZone {
    type Error = GeodesyError;

    fn try_from(zone: u8) -> Result<Self, Self::Error> {
        if (1..=ZONE_COUNT).contains(&zone) {
            Ok(UtmZone(zone))
        } else {
            Err(GeodesyError::ZoneNumber(zone))
        }
    }
}

impl From<UtmZone> for u8 {
    fn from(zone: UtmZone) -> u8 {
        zone.0
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the zone whose 6° band contains `longitude`.
///
/// Band edges belong to the zone to their east, so -180 is zone 1 and
/// -174 is zone 2. Longitudes outside of `[-180, 180)` are rejected
/// rather than wrapped.
pub fn zone_of(longitude: f64) -> Result<UtmZone, GeodesyError> {
    if !(-180.0..180.0).contains(&longitude) {
        return Err(GeodesyError::Longitude(longitude));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let zone = ((longitude + 180.0) / ZONE_WIDTH_DEG).floor() as u8 + 1;
    // `longitude + 180.0` can round up to 360 just below the antimeridian.
    Ok(UtmZone(zone.min(ZONE_COUNT)))
}

/// Returns the zone for a study area given the longitude of its
/// western extent.
///
/// NMSIM references a whole project to the westernmost edge of its
/// elevation grid, so the project zone is the one whose western
/// boundary sits at or just west of `west_longitude`.
pub fn zone_of_western_extent(west_longitude: f64) -> Result<UtmZone, GeodesyError> {
    if !west_longitude.is_finite() {
        return Err(GeodesyError::Longitude(west_longitude));
    }
    #[allow(clippy::cast_possible_truncation)]
    let nearest_west = 6 * (west_longitude / ZONE_WIDTH_DEG).floor() as i32;
    UtmZone::all()
        .find(|zone| zone.west_boundary() == nearest_west)
        .ok_or(GeodesyError::ZoneBoundary(nearest_west))
}

/// Projects a `(lat, lon)` pair into `zone`, returning `(x, y)` as
/// (easting, northing) meters.
pub fn to_projected(lat: f64, lon: f64, zone: UtmZone) -> Result<(f64, f64), GeodesyError> {
    let Coord { x, y } = Utm::new(zone).to_projected(Coord { x: lon, y: lat })?;
    Ok((x, y))
}

/// Inverse of [`to_projected`], returning `(lat, lon)`.
pub fn to_geographic(x: f64, y: f64, zone: UtmZone) -> (f64, f64) {
    let Coord { x: lon, y: lat } = Utm::new(zone).to_geographic(Coord { x, y });
    (lat, lon)
}

/// A transverse mercator projection for one UTM zone.
#[derive(Debug, Clone)]
pub struct Utm {
    zone: UtmZone,
    /// Central meridian (radians).
    lon0: f64,
    /// `k0` times the rectifying radius.
    k0_a: f64,
    /// Eccentricity-like term used for conformal latitude.
    c: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl Utm {
    pub fn new(zone: UtmZone) -> Self {
        let n = FLATTENING / (2.0 - FLATTENING);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n2 * n2;
        let rectifying_radius = SEMI_MAJOR_AXIS / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0);
        Self {
            zone,
            lon0: zone.central_meridian().to_radians(),
            k0_a: K0 * rectifying_radius,
            c: 2.0 * n.sqrt() / (1.0 + n),
            alpha: [
                n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3,
                13.0 / 48.0 * n2 - 3.0 / 5.0 * n3,
                61.0 / 240.0 * n3,
            ],
            beta: [
                n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3,
                1.0 / 48.0 * n2 + 1.0 / 15.0 * n3,
                17.0 / 480.0 * n3,
            ],
            delta: [
                2.0 * n - 2.0 / 3.0 * n2 - 2.0 * n3,
                7.0 / 3.0 * n2 - 8.0 / 5.0 * n3,
                56.0 / 15.0 * n3,
            ],
        }
    }

    /// Returns the projection for the zone containing `longitude`.
    pub fn for_longitude(longitude: f64) -> Result<Self, GeodesyError> {
        zone_of(longitude).map(Self::new)
    }

    pub fn zone(&self) -> UtmZone {
        self.zone
    }

    /// Projects `coord` (x: longitude, y: latitude) into this zone.
    ///
    /// Northings are measured from the equator, so points in the
    /// southern hemisphere come out negative.
    pub fn to_projected(&self, coord: Coord<f64>) -> Result<Coord<f64>, GeodesyError> {
        let Coord { x: lon, y: lat } = coord;
        if !(lat > -90.0 && lat < 90.0) {
            return Err(GeodesyError::Latitude(lat));
        }
        if !lon.is_finite() {
            return Err(GeodesyError::Longitude(lon));
        }
        let phi = lat.to_radians();
        let d_lambda = lon.to_radians() - self.lon0;
        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - self.c * (self.c * sin_phi).atanh()).sinh();
        let xi = t.atan2(d_lambda.cos());
        let eta = (d_lambda.sin() / (1.0 + t * t).sqrt()).atanh();

        let (mut easting, mut northing) = (eta, xi);
        for (j, alpha) in (1..=3_i32).map(f64::from).zip(self.alpha) {
            easting += alpha * (2.0 * j * xi).cos() * (2.0 * j * eta).sinh();
            northing += alpha * (2.0 * j * xi).sin() * (2.0 * j * eta).cosh();
        }

        Ok(Coord {
            x: FALSE_EASTING + self.k0_a * easting,
            y: self.k0_a * northing,
        })
    }

    /// Returns the geographic coordinate (x: longitude, y: latitude)
    /// of a point in this zone.
    pub fn to_geographic(&self, coord: Coord<f64>) -> Coord<f64> {
        let xi = coord.y / self.k0_a;
        let eta = (coord.x - FALSE_EASTING) / self.k0_a;

        let (mut xi_p, mut eta_p) = (xi, eta);
        for (j, beta) in (1..=3_i32).map(f64::from).zip(self.beta) {
            xi_p -= beta * (2.0 * j * xi).sin() * (2.0 * j * eta).cosh();
            eta_p -= beta * (2.0 * j * xi).cos() * (2.0 * j * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let phi = (1..=3_i32)
            .map(f64::from)
            .zip(self.delta)
            .fold(chi, |phi, (j, delta)| phi + delta * (2.0 * j * chi).sin());
        let lambda = self.lon0 + eta_p.sinh().atan2(xi_p.cos());

        Coord {
            x: lambda.to_degrees(),
            y: phi.to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{to_geographic, to_projected, zone_of, zone_of_western_extent, Utm, UtmZone};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use geo::geometry::Coord;

    #[test]
    fn test_zone_of_every_band() {
        for zone in UtmZone::all() {
            let west = f64::from(zone.west_boundary());
            for offset in [0.0, 0.5, 3.0, 5.999] {
                assert_eq!(zone_of(west + offset).unwrap(), zone, "{}", west + offset);
            }
        }
    }

    #[test]
    fn test_zone_boundaries() {
        assert_eq!(zone_of(-180.0).unwrap().number(), 1);
        assert_eq!(zone_of(-174.0).unwrap().number(), 2);
        assert_eq!(zone_of(-174.0 - f64::EPSILON * 200.0).unwrap().number(), 1);
        assert_eq!(zone_of(-150.0).unwrap().number(), 6);
        assert_eq!(zone_of(0.0).unwrap().number(), 31);
        assert_eq!(zone_of(179.999_999_999_999_97).unwrap().number(), 60);
    }

    #[test]
    fn test_zone_of_rejects_out_of_range() {
        assert!(zone_of(180.0).is_err());
        assert!(zone_of(-180.000_1).is_err());
        assert!(zone_of(f64::NAN).is_err());
        assert!(UtmZone::try_from(0_u8).is_err());
        assert!(UtmZone::try_from(61_u8).is_err());
    }

    #[test]
    fn test_zone_of_western_extent() {
        assert_eq!(zone_of_western_extent(-151.2).unwrap().number(), 5);
        assert_eq!(zone_of_western_extent(-150.0).unwrap().number(), 6);
        assert_eq!(zone_of_western_extent(-180.0).unwrap().number(), 1);
        assert!(zone_of_western_extent(180.0).is_err());
    }

    #[test]
    fn test_central_meridian() {
        let zone = UtmZone::try_from(6_u8).unwrap();
        assert_relative_eq!(zone.central_meridian(), -147.0);
        let utm = Utm::new(zone);
        let Coord { x, y } = utm.to_projected(Coord { x: -147.0, y: 0.0 }).unwrap();
        assert_abs_diff_eq!(x, 500_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_meridian_arc_at_45_degrees() {
        // k0 times the GRS80 meridian arc length from the equator to 45°N.
        let zone = UtmZone::try_from(6_u8).unwrap();
        let (x, y) = to_projected(45.0, -147.0, zone).unwrap();
        assert_abs_diff_eq!(x, 500_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y, 4_982_950.400, epsilon = 1e-3);
    }

    #[test]
    fn test_symmetric_about_central_meridian() {
        let zone = UtmZone::try_from(5_u8).unwrap();
        let (east_x, east_y) = to_projected(63.0695, -151.0074, zone).unwrap();
        let (west_x, west_y) = to_projected(63.0695, -154.9926, zone).unwrap();
        assert_abs_diff_eq!(east_x - 500_000.0, 500_000.0 - west_x, epsilon = 1e-6);
        assert_abs_diff_eq!(east_y, west_y, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip() {
        let samples = [
            (63.0695, -151.0074),
            (63.7, -149.0),
            (61.2, -149.9),
            (70.0, -141.5),
            (44.2705, -71.30325),
            (0.0, 0.0),
            (-33.9, 18.4),
        ];
        for (lat, lon) in samples {
            let zone = zone_of(lon).unwrap();
            let (x, y) = to_projected(lat, lon, zone).unwrap();
            let (lat_rt, lon_rt) = to_geographic(x, y, zone);
            // 1e-7° is roughly a centimeter.
            assert_abs_diff_eq!(lat, lat_rt, epsilon = 1e-7);
            assert_abs_diff_eq!(lon, lon_rt, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_round_trip_outside_zone() {
        // Flights are projected into the deployment's zone even after
        // crossing into the next one.
        let zone = UtmZone::try_from(5_u8).unwrap();
        let (x, y) = to_projected(63.5, -148.5, zone).unwrap();
        let (lat, lon) = to_geographic(x, y, zone);
        assert_abs_diff_eq!(lat, 63.5, epsilon = 1e-7);
        assert_abs_diff_eq!(lon, -148.5, epsilon = 1e-7);
    }

    #[test]
    fn test_rejects_poles() {
        let zone = UtmZone::try_from(1_u8).unwrap();
        assert!(to_projected(90.0, -177.0, zone).is_err());
        assert!(to_projected(f64::NAN, -177.0, zone).is_err());
    }
}
