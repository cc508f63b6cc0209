use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeodesyError {
    #[error("longitude {0} is outside of [-180, 180)")]
    Longitude(f64),

    #[error("latitude {0} is outside of (-90, 90)")]
    Latitude(f64),

    #[error("no UTM zone starts at {0}°")]
    ZoneBoundary(i32),

    #[error("invalid UTM zone number {0}")]
    ZoneNumber(u8),

    #[error("invalid buffer radius {0} km")]
    Radius(f64),
}
