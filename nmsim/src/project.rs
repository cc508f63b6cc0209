//! The canonical NMSIM project directory.

use crate::{driver::MODEL_BINARY, NmsimError};
use flightpath::geodesy::UtmZone;
use log::{debug, info};
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

const ELEVATION: &str = "Input_Data/01_ELEVATION";
const IMPEDANCE: &str = "Input_Data/02_IMPEDANCE";
const TRAJECTORY: &str = "Input_Data/03_TRAJECTORY";
const SITES: &str = "Input_Data/05_SITES";
const SITE_OUTPUT: &str = "Output_Data/SITE";
const TIG_TIS: &str = "Output_Data/TIG_TIS";

/// Every folder of a project, relative to its root, parents first.
pub const SUBFOLDERS: [&str; 14] = [
    "Input_Data",
    ELEVATION,
    IMPEDANCE,
    TRAJECTORY,
    "Input_Data/04_LAYERS",
    SITES,
    "Input_Data/06_AMBIENCE",
    "Input_Data/07_WEATHER",
    "Input_Data/08_TREES",
    "Output_Data",
    "Output_Data/ASCII",
    "Output_Data/IMAGES",
    SITE_OUTPUT,
    TIG_TIS,
];

/// What [`ProjectDir::create`] did with a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirStatus {
    Created,
    Existed,
}

/// A project directory on disk.
///
/// Paths handed out by a `ProjectDir` are what the control and batch
/// files tell the model to read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDir {
    root: PathBuf,
}

impl ProjectDir {
    /// Creates the project layout under `root`, creating `root` too if
    /// needed.
    ///
    /// Folders that are already there are left alone and reported as
    /// [`DirStatus::Existed`].
    pub fn create<P: AsRef<Path>>(
        root: P,
    ) -> Result<(Self, Vec<(&'static str, DirStatus)>), NmsimError> {
        let root = root.as_ref().to_owned();
        let mut statuses = Vec::with_capacity(SUBFOLDERS.len());
        for folder in SUBFOLDERS {
            let path = root.join(folder);
            let status = if path.is_dir() {
                DirStatus::Existed
            } else {
                fs::create_dir_all(&path)?;
                DirStatus::Created
            };
            debug!("{}: {status:?}", path.display());
            statuses.push((folder, status));
        }
        info!("project directory ready at {}", root.display());
        Ok((Self { root }, statuses))
    }

    /// Opens an existing project.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, NmsimError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(NmsimError::NoProject(root.to_owned()));
        }
        Ok(Self {
            root: root.to_owned(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn elevation_dir(&self) -> PathBuf {
        self.root.join(ELEVATION)
    }

    pub fn impedance_dir(&self) -> PathBuf {
        self.root.join(IMPEDANCE)
    }

    pub fn trajectory_dir(&self) -> PathBuf {
        self.root.join(TRAJECTORY)
    }

    pub fn sites_dir(&self) -> PathBuf {
        self.root.join(SITES)
    }

    /// Where the model writes its `.tis` results.
    pub fn results_dir(&self) -> PathBuf {
        self.root.join(TIG_TIS)
    }

    /// Where model/measurement comparisons are exported.
    pub fn comparison_dir(&self) -> PathBuf {
        self.root.join(SITE_OUTPUT)
    }

    /// Site file path for a station, e.g. `05_SITES/DENATRLA.sit`.
    pub fn site_path(&self, station: &str) -> PathBuf {
        self.sites_dir().join(format!("{station}.sit"))
    }

    /// The first elevation raster, by name.
    pub fn elevation_file(&self) -> Result<PathBuf, NmsimError> {
        let dir = self.elevation_dir();
        first_with_extension(&dir, "flt")?.ok_or(NmsimError::NoElevationFile(dir))
    }

    /// The first impedance raster, by name, if the project has one.
    pub fn impedance_file(&self) -> Result<Option<PathBuf>, NmsimError> {
        first_with_extension(&self.impedance_dir(), "flt")
    }

    /// The first site file, by name.
    pub fn site_file(&self) -> Result<PathBuf, NmsimError> {
        let dir = self.sites_dir();
        first_with_extension(&dir, "sit")?.ok_or(NmsimError::NoSiteFile(dir))
    }

    /// Every trajectory file, sorted by name.
    pub fn trajectory_files(&self) -> Result<Vec<PathBuf>, NmsimError> {
        files_with_extension(&self.trajectory_dir(), "trj")
    }

    /// Every result file, sorted by name.
    pub fn result_files(&self) -> Result<Vec<PathBuf>, NmsimError> {
        files_with_extension(&self.results_dir(), "tis")
    }

    /// Where the model batch processor is expected when no path is
    /// given: two levels above the project, as in an NMSIM install's
    /// `Data` folder.
    pub fn default_model_path(&self) -> PathBuf {
        self.root.join("..").join("..").join(MODEL_BINARY)
    }
}

/// File name of a project's elevation raster for `zone`.
pub fn elevation_file_name(zone: UtmZone) -> String {
    format!("elevation_nad83_utm{}.flt", zone.number())
}

/// Looks up `unit`'s DEM file name in a CSV table with `UNIT_CODE` and
/// `DEM_Name` columns.
pub fn dem_for_unit<R: Read>(table: R, unit: &str) -> Result<Option<String>, NmsimError> {
    #[derive(serde::Deserialize)]
    struct Row {
        #[serde(rename = "UNIT_CODE")]
        unit_code: String,
        #[serde(rename = "DEM_Name")]
        dem_name: String,
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(table);
    for row in rdr.deserialize::<Row>() {
        let row = row?;
        if row.unit_code == unit {
            return Ok(Some(row.dem_name));
        }
    }
    Ok(None)
}

/// Path of `unit`'s DEM inside `raster_dir`, per the lookup table at
/// `table`.
pub fn dem_path(table: &Path, raster_dir: &Path, unit: &str) -> Result<PathBuf, NmsimError> {
    let name = dem_for_unit(fs::File::open(table)?, unit)?.ok_or_else(|| {
        NmsimError::UnitNotFound {
            unit: unit.to_string(),
            table: table.to_owned(),
        }
    })?;
    Ok(raster_dir.join(name))
}

fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, NmsimError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn first_with_extension(dir: &Path, ext: &str) -> Result<Option<PathBuf>, NmsimError> {
    Ok(files_with_extension(dir, ext)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::{dem_for_unit, dem_path, elevation_file_name, DirStatus, ProjectDir, SUBFOLDERS};
    use crate::NmsimError;
    use flightpath::geodesy::UtmZone;
    use std::fs;

    #[test]
    fn test_create_and_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("DENATRLA2019");
        let (project, statuses) = ProjectDir::create(&root).unwrap();
        assert_eq!(statuses.len(), 14);
        assert!(statuses.iter().all(|(_, s)| *s == DirStatus::Created));
        for folder in SUBFOLDERS {
            assert!(root.join(folder).is_dir(), "{folder}");
        }

        let (_, statuses) = ProjectDir::create(&root).unwrap();
        assert!(statuses.iter().all(|(_, s)| *s == DirStatus::Existed));

        assert_eq!(ProjectDir::open(&root).unwrap(), project);
        assert!(matches!(
            ProjectDir::open(tmp.path().join("nope")),
            Err(NmsimError::NoProject(_))
        ));
    }

    #[test]
    fn test_lookups() {
        let tmp = tempfile::tempdir().unwrap();
        let (project, _) = ProjectDir::create(tmp.path()).unwrap();
        assert!(matches!(
            project.elevation_file(),
            Err(NmsimError::NoElevationFile(_))
        ));
        assert!(matches!(project.site_file(), Err(NmsimError::NoSiteFile(_))));
        assert_eq!(project.impedance_file().unwrap(), None);
        assert!(project.trajectory_files().unwrap().is_empty());

        fs::write(project.elevation_dir().join("elevation_nad83_utm6.flt"), b"").unwrap();
        fs::write(project.elevation_dir().join("elevation_nad83_utm6.hdr"), b"").unwrap();
        fs::write(project.site_path("DENATRLA"), b"").unwrap();
        for name in ["N2_20190614_140000.trj", "N1_20190614_132005.trj"] {
            fs::write(project.trajectory_dir().join(name), b"").unwrap();
        }

        assert!(project
            .elevation_file()
            .unwrap()
            .ends_with("01_ELEVATION/elevation_nad83_utm6.flt"));
        assert!(project.site_file().unwrap().ends_with("DENATRLA.sit"));
        let trajectories = project.trajectory_files().unwrap();
        assert_eq!(trajectories.len(), 2);
        assert!(trajectories[0].ends_with("N1_20190614_132005.trj"));
    }

    #[test]
    fn test_default_model_path() {
        let project = ProjectDir::open(std::env::temp_dir()).unwrap();
        let model = project.default_model_path();
        assert!(model.ends_with("../../Nord2000batch.exe"));
    }

    #[test]
    fn test_elevation_file_name() {
        let zone = UtmZone::try_from(6_u8).unwrap();
        assert_eq!(elevation_file_name(zone), "elevation_nad83_utm6.flt");
    }

    #[test]
    fn test_dem_lookup() {
        let table = "\
UNIT_CODE,DEM_Name
DENA,dena_dem_ifsar.tif
GAAR, gaar_dem.tif
";
        assert_eq!(
            dem_for_unit(table.as_bytes(), "GAAR").unwrap().as_deref(),
            Some("gaar_dem.tif")
        );
        assert_eq!(dem_for_unit(table.as_bytes(), "YUCH").unwrap(), None);

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("units.csv");
        fs::write(&path, table).unwrap();
        let dem = dem_path(&path, tmp.path(), "DENA").unwrap();
        assert_eq!(dem, tmp.path().join("dena_dem_ifsar.tif"));
        assert!(matches!(
            dem_path(&path, tmp.path(), "YUCH"),
            Err(NmsimError::UnitNotFound { .. })
        ));
    }
}
