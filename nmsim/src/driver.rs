//! Planning and running NMSIM batch jobs.

use crate::{
    trajectory::registration_from_name, BatchFile, ControlFile, ControlSettings, NmsimError,
    ProjectDir,
};
use log::{info, warn};
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

/// File name of the model's batch processor.
pub const MODEL_BINARY: &str = "Nord2000batch.exe";

/// One model invocation: a trajectory flown past the project's site.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRun {
    /// Aircraft registration, when the trajectory's name carries one.
    pub registration: Option<String>,
    pub control: ControlFile,
    pub control_path: PathBuf,
    pub batch: BatchFile,
    pub batch_path: PathBuf,
    /// The `.tis` file the run produces.
    pub output: PathBuf,
}

impl ModelRun {
    /// Writes this run's control and batch files.
    pub fn write(&self) -> Result<(), NmsimError> {
        self.control.write(&self.control_path)?;
        self.batch.write(&self.batch_path)?;
        Ok(())
    }

    /// Writes the run's files and runs `model` on them, blocking until
    /// it exits.
    pub fn execute(&self, model: &Path) -> Result<ModelOutput, NmsimError> {
        if !model.is_file() {
            return Err(NmsimError::ModelNotFound(model.to_owned()));
        }
        for input in [&self.control.site, &self.control.trajectory] {
            if !input.is_file() {
                return Err(NmsimError::MissingInput(input.clone()));
            }
        }
        self.write()?;
        info!("{}", self.control.trajectory.display());
        invoke(model, &self.batch_path)
    }
}

/// What the model printed, and how it exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutput {
    pub status: ExitStatus,
    /// Non-blank console lines, stdout and stderr interleaved as
    /// printed.
    pub lines: Vec<String>,
}

impl ModelOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Plans one run per trajectory in `project`, optionally only those
/// flown by `registration`.
///
/// Every run pairs its trajectory with the project's first elevation
/// and site files. Nothing is written; see [`ModelRun::execute`].
pub fn plan_runs(
    project: &ProjectDir,
    source: &Path,
    registration: Option<&str>,
    settings: &ControlSettings,
) -> Result<Vec<ModelRun>, NmsimError> {
    let elevation = project.elevation_file()?;
    let site = project.site_file()?;
    if !source.is_file() {
        return Err(NmsimError::MissingInput(source.to_owned()));
    }
    if let Some(impedance) = settings.impedance.as_ref().filter(|p| !p.is_file()) {
        return Err(NmsimError::MissingInput(impedance.clone()));
    }
    let site_stem = file_stem(&site);

    let mut runs = Vec::new();
    for trajectory in project.trajectory_files()? {
        let flown_by = registration_from_name(&trajectory);
        if registration.is_some() && flown_by.as_deref() != registration {
            continue;
        }
        let stem = file_stem(&trajectory);
        let output = project.results_dir().join(format!("{site_stem}_{stem}.tis"));
        let control_path = project.root().join(format!("control_{stem}.nms"));
        runs.push(ModelRun {
            registration: flown_by,
            control: ControlFile {
                elevation: elevation.clone(),
                impedance: settings.impedance.clone(),
                site: site.clone(),
                trajectory: trajectory.clone(),
                source: source.to_owned(),
                evaluation_interval: settings.evaluation_interval,
            },
            batch: BatchFile {
                control: control_path.clone(),
                output: output.with_extension(""),
            },
            control_path,
            batch_path: project.root().join(format!("batch_{stem}.txt")),
            output,
        });
    }
    Ok(runs)
}

/// Runs `model` with `batch` as its only argument and collects its
/// console output. Stdout and stderr share one pipe, so lines come
/// back in the order the model printed them.
///
/// A non-zero exit is not an error; it is reported in the returned
/// [`ModelOutput`] alongside whatever the model printed.
pub fn invoke(model: &Path, batch: &Path) -> Result<ModelOutput, NmsimError> {
    if !model.is_file() {
        return Err(NmsimError::ModelNotFound(model.to_owned()));
    }
    if !batch.is_file() {
        return Err(NmsimError::MissingInput(batch.to_owned()));
    }
    let (mut console, writer) = io::pipe()?;
    let mut child = {
        let mut command = Command::new(model);
        command.arg(batch).stdout(writer.try_clone()?).stderr(writer);
        command.spawn()?
    };
    // The command is dropped with our ends of the pipe, so the read
    // ends when the model exits.
    let mut bytes = Vec::new();
    console.read_to_end(&mut bytes)?;
    let status = child.wait()?;
    let lines = console_lines(&bytes);

    info!("the following lines are directly from NMSIM:");
    for line in &lines {
        info!("\t{line}");
    }
    if !status.success() {
        warn!("{} exited with {status}", model.display());
    }
    Ok(ModelOutput { status, lines })
}

fn console_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{invoke, plan_runs};
    use crate::{ControlSettings, NmsimError, ProjectDir};
    use std::{fs, path::Path};

    fn project(tmp: &Path) -> ProjectDir {
        let (project, _) = ProjectDir::create(tmp.join("DENATRLA2019")).unwrap();
        fs::write(project.elevation_dir().join("elevation_nad83_utm6.flt"), b"").unwrap();
        fs::write(project.site_path("DENATRLA"), b"").unwrap();
        for name in ["N12345_20190614_212005.trj", "N777_20190615_080000.trj"] {
            fs::write(project.trajectory_dir().join(name), b"").unwrap();
        }
        project
    }

    fn source(tmp: &Path) -> std::path::PathBuf {
        let path = tmp.join("C172.src");
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_plan_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        let source = source(tmp.path());
        let runs = plan_runs(&project, &source, None, &ControlSettings::default()).unwrap();
        assert_eq!(runs.len(), 2);

        let run = &runs[0];
        assert_eq!(run.registration.as_deref(), Some("N12345"));
        assert!(run
            .output
            .ends_with("Output_Data/TIG_TIS/DENATRLA_N12345_20190614_212005.tis"));
        assert!(run
            .batch
            .output
            .ends_with("TIG_TIS/DENATRLA_N12345_20190614_212005"));
        assert_eq!(
            run.control_path,
            project.root().join("control_N12345_20190614_212005.nms")
        );
        assert_eq!(run.batch.control, run.control_path);
        assert!(run.control.site.ends_with("DENATRLA.sit"));
        assert_eq!(run.control.impedance, None);

        // Planning writes nothing, and no two runs share a file.
        assert!(!run.control_path.exists());
        assert_ne!(runs[0].batch_path, runs[1].batch_path);
        assert_ne!(runs[0].control_path, runs[1].control_path);
    }

    #[test]
    fn test_plan_runs_by_registration() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        let source = source(tmp.path());
        let settings = ControlSettings::default();
        let runs = plan_runs(&project, &source, Some("N777"), &settings).unwrap();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].control.trajectory.ends_with("N777_20190615_080000.trj"));
        assert!(plan_runs(&project, &source, Some("N1"), &settings)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_plan_runs_missing_inputs() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        let settings = ControlSettings::default();
        assert!(matches!(
            plan_runs(&project, &tmp.path().join("nope.src"), None, &settings),
            Err(NmsimError::MissingInput(_))
        ));

        let source = source(tmp.path());
        let with_impedance = ControlSettings {
            impedance: Some(tmp.path().join("landcover.flt")),
            ..ControlSettings::default()
        };
        assert!(matches!(
            plan_runs(&project, &source, None, &with_impedance),
            Err(NmsimError::MissingInput(_))
        ));

        fs::remove_file(project.site_path("DENATRLA")).unwrap();
        assert!(matches!(
            plan_runs(&project, &source, None, &settings),
            Err(NmsimError::NoSiteFile(_))
        ));
    }

    #[test]
    fn test_model_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        let source = source(tmp.path());
        let runs = plan_runs(&project, &source, None, &ControlSettings::default()).unwrap();
        let model = project.default_model_path();
        assert!(matches!(
            runs[0].execute(&model),
            Err(NmsimError::ModelNotFound(_))
        ));
        assert!(!runs[0].batch_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_passes_batch_file() {
        let tmp = tempfile::tempdir().unwrap();
        let project = project(tmp.path());
        let source = source(tmp.path());
        let runs = plan_runs(&project, &source, None, &ControlSettings::default()).unwrap();
        let run = &runs[1];

        // `cat` echoes the batch file back.
        let output = run.execute(Path::new("/bin/cat")).unwrap();
        assert!(output.success());
        assert_eq!(output.lines.len(), 8);
        assert_eq!(output.lines[0], "open");
        assert_eq!(Path::new(&output.lines[1]), run.control_path);
        assert_eq!(output.lines[7], "sec: 0.0");
        assert_eq!(
            fs::read_to_string(&run.control_path).unwrap(),
            run.control.render()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_keeps_console_order() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("batch.txt");
        fs::write(
            &script,
            "echo 'reading site' >&2\n\
             echo 'computing'\n\
             echo 'no trajectory' >&2\n\
             echo 'done'\n",
        )
        .unwrap();
        let output = invoke(Path::new("/bin/sh"), &script).unwrap();
        assert!(output.success());
        assert_eq!(
            output.lines,
            vec!["reading site", "computing", "no trajectory", "done"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_invoke_collects_console() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("batch.txt");
        fs::write(
            &script,
            "echo 'NMSIM batch processor'\n\
             printf 'computing\\r\\n\\r\\n   \\r\\n'\n\
             echo 'no site file' >&2\n\
             exit 3\n",
        )
        .unwrap();
        let output = invoke(Path::new("/bin/sh"), &script).unwrap();
        assert!(!output.success());
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(
            output.lines,
            vec!["NMSIM batch processor", "computing", "no site file"]
        );
        assert!(matches!(
            invoke(Path::new("/bin/sh"), &tmp.path().join("missing.txt")),
            Err(NmsimError::MissingInput(_))
        ));
    }
}
