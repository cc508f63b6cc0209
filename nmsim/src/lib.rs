//! # NMSIM
//!
//! Everything that touches the NMSIM model's files: the canonical
//! project directory, the fixed-width site, trajectory, control and
//! batch formats, invoking the batch processor, and reading its
//! spectral (`.tis`) output back for comparison with measurements.

mod compare;
mod control;
mod driver;
mod error;
mod project;
mod site;
mod tis;
mod trajectory;

pub use crate::{
    compare::{
        align, load_measurements, nvspl_column, read_nvspl, read_nvspl_from_path,
        write_comparison, AlignSettings, Comparison, MeasurementSample,
    },
    control::{BatchFile, ControlFile, ControlSettings},
    driver::{invoke, plan_runs, ModelOutput, ModelRun, MODEL_BINARY},
    error::NmsimError,
    project::{dem_for_unit, dem_path, elevation_file_name, DirStatus, ProjectDir, SUBFOLDERS},
    site::SiteFile,
    tis::{
        median, pair_results, parse_tis, read_tis, resample, SpectralResult, SpectralSecond,
        TisRow, BAND_LABELS, COMPARISON_BANDS,
    },
    trajectory::{
        registration_from_name, trajectory_file_name, write_trajectory, write_trajectory_file,
        TrajectoryFormat, TrajectoryHeader,
    },
};
pub use flightpath;
