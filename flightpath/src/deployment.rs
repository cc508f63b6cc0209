use geo::geometry::Coord;
use serde::{Deserialize, Serialize};

/// An acoustic monitoring deployment: one microphone at one site for
/// one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringDeployment {
    /// Four letter park unit code, e.g. `DENA`.
    pub unit: String,

    /// Site code within the unit, e.g. `TRLA` or `002`.
    pub site: String,

    pub year: i32,

    /// Microphone location (x: longitude, y: latitude).
    pub position: Coord<f64>,

    /// Microphone height above ground (meters).
    pub mic_height_m: f64,
}

impl MonitoringDeployment {
    /// Unit and site code run together, e.g. `DENATRLA`.
    ///
    /// Used as the site file's label and in NVSPL file names.
    pub fn station(&self) -> String {
        format!("{}{}", self.unit, self.site)
    }

    pub fn latitude(&self) -> f64 {
        self.position.y
    }

    pub fn longitude(&self) -> f64 {
        self.position.x
    }
}
