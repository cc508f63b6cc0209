use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser};
use nmsim::{
    flightpath::{
        geodesy::geo::geometry::Coord, FilterSettings, MonitoringDeployment,
    },
    AlignSettings, ControlSettings, TrajectoryFormat,
};
use std::{path::PathBuf, str::FromStr};

/// Prepare flight trajectories for NMSIM and check its predictions
/// against measured sound levels.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub enum Cli {
    /// Create a project's folder tree.
    Project(Project),

    /// Write the catchment around a site as GeoJSON.
    Buffer(Buffer),

    /// Select, densify and write the flights a deployment could have
    /// heard.
    Tracks(Tracks),

    /// Run the model on a project's trajectories.
    Run(Run),

    /// Compare model results with measured spectra.
    Compare(Compare),
}

/// A "lat,lon" pair.
#[derive(Clone, Debug, Copy)]
pub struct LatLon(pub Coord<f64>);

impl FromStr for LatLon {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (lat_str, lon_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid lat,lon"))?;
        let lat = f64::from_str(lat_str.trim())?;
        let lon = f64::from_str(lon_str.trim())?;
        Ok(Self(Coord { y: lat, x: lon }))
    }
}

#[derive(Debug, Clone, Args)]
pub struct Project {
    /// Project root directory.
    #[arg(short, long)]
    pub project: PathBuf,

    /// Park unit code, e.g. DENA. Prints the unit's DEM.
    #[arg(long, requires_all = ["dem_table", "raster_dir"])]
    pub unit: Option<String>,

    /// CSV table mapping UNIT_CODE to DEM_Name.
    #[arg(long)]
    pub dem_table: Option<PathBuf>,

    /// Folder holding the DEMs named in the table.
    #[arg(long)]
    pub raster_dir: Option<PathBuf>,

    /// Western extent of the study area, in degrees. Prints the
    /// project's UTM zone and elevation file.
    #[arg(long, allow_negative_numbers = true)]
    pub west: Option<f64>,
}

#[derive(Debug, Clone, Args)]
pub struct Buffer {
    /// Site "lat,lon".
    #[arg(long, allow_hyphen_values = true)]
    pub site: LatLon,

    /// Catchment radius, in kilometers.
    #[arg(short, long, default_value_t = 20.0)]
    pub radius_km: f64,

    /// Vertices on the circle.
    #[arg(long, default_value_t = 64)]
    pub segments: usize,

    /// Output file, stdout when absent.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct Tracks {
    /// Project root directory.
    #[arg(short, long)]
    pub project: PathBuf,

    /// Export of the flight track query (CSV).
    #[arg(short, long)]
    pub tracks: PathBuf,

    /// Directory of the deployment's hourly NVSPL files.
    #[arg(short, long)]
    pub nvspl: PathBuf,

    /// Park unit code, e.g. DENA.
    #[arg(long)]
    pub unit: String,

    /// Site code within the unit, e.g. TRLA.
    #[arg(long)]
    pub site: String,

    #[arg(long)]
    pub year: i32,

    /// Microphone "lat,lon".
    #[arg(long, allow_hyphen_values = true)]
    pub location: LatLon,

    /// Microphone height above ground, in meters.
    #[arg(long)]
    pub mic_height: f64,

    /// Farthest closest approach a flight may have, in kilometers.
    #[arg(short, long, default_value_t = 20.0)]
    pub radius_km: f64,

    /// Climb angles steeper than this are reset to 0, in degrees.
    #[arg(long, default_value_t = 20.0)]
    pub climb_max: f64,

    /// Engine power written to every trajectory row, in percent.
    #[arg(long, default_value_t = 95.0)]
    pub power: f64,

    /// Bank angle written to every trajectory row, in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub roll: f64,
}

impl Tracks {
    pub fn deployment(&self) -> MonitoringDeployment {
        MonitoringDeployment {
            unit: self.unit.clone(),
            site: self.site.clone(),
            year: self.year,
            position: self.location.0,
            mic_height_m: self.mic_height,
        }
    }

    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            search_radius_km: self.radius_km,
            climb_angle_max_deg: self.climb_max,
        }
    }

    pub fn trajectory_format(&self) -> TrajectoryFormat {
        TrajectoryFormat {
            power: self.power,
            roll: self.roll,
            ..TrajectoryFormat::default()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct Run {
    /// Project root directory.
    #[arg(short, long)]
    pub project: PathBuf,

    /// Acoustic source descriptor.
    #[arg(short, long)]
    pub source: PathBuf,

    /// Only run trajectories flown by this aircraft.
    #[arg(short, long)]
    pub registration: Option<String>,

    /// Model batch processor. Defaults to Nord2000batch.exe two
    /// levels above the project.
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Ground impedance raster.
    #[arg(long)]
    pub impedance: Option<PathBuf>,

    #[arg(long, default_value_t = 500.0)]
    pub evaluation_interval: f64,
}

impl Run {
    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            evaluation_interval: self.evaluation_interval,
            impedance: self.impedance.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct Compare {
    /// Project root directory.
    #[arg(short, long)]
    pub project: PathBuf,

    /// Directory of the deployment's hourly NVSPL files.
    #[arg(short, long)]
    pub nvspl: PathBuf,

    /// Unit and site code run together, e.g. DENATRLA.
    #[arg(short, long)]
    pub station: String,

    /// Offset of the site's clock from UTC, in hours.
    #[arg(long, default_value_t = -8, allow_negative_numbers = true)]
    pub utc_offset: i32,

    /// Minutes added on both sides of each predicted event.
    #[arg(long, default_value_t = 5)]
    pub pad_minutes: u32,

    /// Written where the model predicted nothing.
    #[arg(long, default_value_t = -99.9, allow_negative_numbers = true)]
    pub missing_value: f64,
}

impl Compare {
    pub fn align_settings(&self) -> AlignSettings {
        AlignSettings {
            utc_offset_hours: self.utc_offset,
            pad_minutes: self.pad_minutes,
            missing_value: self.missing_value,
        }
    }
}
