use flightpath::{geodesy::GeodesyError, FlightpathError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NmsimError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Flightpath(#[from] FlightpathError),

    #[error("{0}")]
    Geodesy(#[from] GeodesyError),

    #[error("project directory {0} does not exist")]
    NoProject(PathBuf),

    #[error("no elevation (.flt) file in {0}")]
    NoElevationFile(PathBuf),

    #[error("no site (.sit) file in {0}")]
    NoSiteFile(PathBuf),

    #[error("missing input file {0}")]
    MissingInput(PathBuf),

    #[error("model binary {0} not found")]
    ModelNotFound(PathBuf),

    #[error("unit {unit} not found in {table}")]
    UnitNotFound { unit: String, table: PathBuf },

    #[error("{field} {value} does not fit its {width} character column")]
    FieldWidth {
        field: &'static str,
        value: String,
        width: usize,
    },

    #[error("malformed site file: {0}")]
    Site(&'static str),

    #[error("malformed trajectory header: {0}")]
    TrajectoryHeader(&'static str),

    #[error("trajectory has no points")]
    EmptyTrajectory,

    #[error("no header terminator in result file")]
    TisHeader,

    #[error("malformed result row {line}: {reason}")]
    TisRow { line: usize, reason: &'static str },

    #[error("measurement table is missing column {0}")]
    MissingColumn(String),

    #[error("malformed measurement row {row}: {reason}")]
    Measurement { row: usize, reason: &'static str },
}
