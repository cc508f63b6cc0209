use crate::options::Run;
use anyhow::Result;
use log::{info, warn};
use nmsim::{plan_runs, ProjectDir};

impl Run {
    pub fn run(&self) -> Result<()> {
        let project = ProjectDir::open(&self.project)?;
        let mut settings = self.control_settings();
        if settings.impedance.is_none() {
            settings.impedance = project.impedance_file()?;
        }
        let runs = plan_runs(
            &project,
            &self.source,
            self.registration.as_deref(),
            &settings,
        )?;
        if runs.is_empty() {
            warn!("no trajectories to run in {}", project.trajectory_dir().display());
            return Ok(());
        }

        let model = self
            .model
            .clone()
            .unwrap_or_else(|| project.default_model_path());
        let mut failed = 0;
        for (n, run) in runs.iter().enumerate() {
            info!("run {} of {}", n + 1, runs.len());
            if !run.execute(&model)?.success() {
                failed += 1;
            }
        }
        if failed > 0 {
            warn!("{failed} of {} runs exited with an error", runs.len());
        } else {
            info!("{} runs finished", runs.len());
        }
        Ok(())
    }
}

