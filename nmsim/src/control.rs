//! Control (`.nms`) and batch files: how the model is told what to run.

use crate::NmsimError;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Run parameters shared by every control file of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSettings {
    /// The control file's numeric parameter, written `{:11.4}`.
    pub evaluation_interval: f64,

    /// Ground impedance raster. `None` writes the `-` placeholder.
    pub impedance: Option<PathBuf>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            evaluation_interval: 500.0,
            impedance: None,
        }
    }
}

/// One model scenario: a terrain, a receiver, a trajectory and a
/// source.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFile {
    pub elevation: PathBuf,
    pub impedance: Option<PathBuf>,
    pub site: PathBuf,
    pub trajectory: PathBuf,
    /// Acoustic source descriptor.
    pub source: PathBuf,
    pub evaluation_interval: f64,
}

impl ControlFile {
    /// Renders the file. Note the last line has no line terminator.
    pub fn render(&self) -> String {
        let impedance = self
            .impedance
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display().to_string());
        format!(
            "{}\n{impedance}\n{}\n{}\n-\n-\n{}\n{:11.4}   \n-\n-",
            self.elevation.display(),
            self.site.display(),
            self.trajectory.display(),
            self.source.display(),
            self.evaluation_interval,
        )
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), NmsimError> {
        fs::write(path, self.render())?;
        Ok(())
    }
}

/// A site-based analysis of one control file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    pub control: PathBuf,
    /// Result path without its `.tis` extension, which the model adds.
    pub output: PathBuf,
}

impl BatchFile {
    /// Renders the file: DBF output off, no time offset, and no final
    /// line terminator.
    pub fn render(&self) -> String {
        format!(
            "open\n{}\nsite\n{}\ndbf: no\nhrs: 0\nmin: 0\nsec: 0.0",
            self.control.display(),
            self.output.display(),
        )
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), NmsimError> {
        fs::write(path, self.render())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BatchFile, ControlFile, ControlSettings};
    use std::{fs, path::PathBuf};

    fn control(impedance: Option<PathBuf>) -> ControlFile {
        ControlFile {
            elevation: PathBuf::from("/p/Input_Data/01_ELEVATION/elevation_nad83_utm6.flt"),
            impedance,
            site: PathBuf::from("/p/Input_Data/05_SITES/DENATRLA.sit"),
            trajectory: PathBuf::from("/p/Input_Data/03_TRAJECTORY/N12345_20190614_212005.trj"),
            source: PathBuf::from("/nmsim/Sources/C172.src"),
            evaluation_interval: ControlSettings::default().evaluation_interval,
        }
    }

    #[test]
    fn test_control_without_impedance() {
        assert_eq!(
            control(None).render(),
            "/p/Input_Data/01_ELEVATION/elevation_nad83_utm6.flt\n\
             -\n\
             /p/Input_Data/05_SITES/DENATRLA.sit\n\
             /p/Input_Data/03_TRAJECTORY/N12345_20190614_212005.trj\n\
             -\n\
             -\n\
             /nmsim/Sources/C172.src\n   500.0000   \n-\n-"
        );
    }

    #[test]
    fn test_control_with_impedance() {
        let rendered = control(Some(PathBuf::from("/p/landcover.flt"))).render();
        assert_eq!(rendered.lines().nth(1), Some("/p/landcover.flt"));
        assert_eq!(rendered.lines().count(), 10);
        assert!(!rendered.ends_with('\n'));
    }

    #[test]
    fn test_batch() {
        let batch = BatchFile {
            control: PathBuf::from("/p/control_N12345_20190614_212005.nms"),
            output: PathBuf::from("/p/Output_Data/TIG_TIS/DENATRLA_N12345_20190614_212005"),
        };
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("batch.txt");
        batch.write(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "open\n\
             /p/control_N12345_20190614_212005.nms\n\
             site\n\
             /p/Output_Data/TIG_TIS/DENATRLA_N12345_20190614_212005\n\
             dbf: no\nhrs: 0\nmin: 0\nsec: 0.0"
        );
    }
}
