use geodesy::GeodesyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlightpathError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Geodesy(#[from] GeodesyError),

    #[error("invalid fix for flight {flight_id} on row {row}: {reason}")]
    InvalidFix {
        flight_id: u64,
        row: usize,
        reason: &'static str,
    },

    #[error("no NVSPL files for {station} in {dir}")]
    NoRecords { station: String, dir: PathBuf },
}
