use crate::{options::Compare, progress};
use anyhow::Result;
use chrono::TimeDelta;
use log::{info, warn};
use nmsim::{
    align, load_measurements, pair_results, read_tis, resample, write_comparison, ProjectDir,
    TrajectoryHeader,
};
use std::{fs::File, io::BufWriter};

impl Compare {
    pub fn run(&self) -> Result<()> {
        let project = ProjectDir::open(&self.project)?;
        let settings = self.align_settings();
        let pairs = pair_results(&project)?;
        if pairs.is_empty() {
            warn!("no results in {}", project.results_dir().display());
            return Ok(());
        }

        let pad = TimeDelta::minutes(i64::from(settings.pad_minutes));
        let out_dir = project.comparison_dir();
        let pb = progress::bar("Comparing".to_string(), pairs.len() as u64)?;
        for (trajectory, result) in &pairs {
            pb.inc(1);
            let header = TrajectoryHeader::read(trajectory)?;
            let spectral = resample(&read_tis(result)?, header.start_utc, settings.utc_offset_hours);
            let (Some(start), Some(end)) = (spectral.start(), spectral.end()) else {
                warn!("{} holds no levels", result.display());
                continue;
            };
            let measured = load_measurements(&self.nvspl, &self.station, start - pad, end + pad)?;
            let Some(comparison) = align(&spectral, &measured, &settings) else {
                continue;
            };

            let stem = trajectory
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let path = out_dir.join(format!("{stem}_comparison.csv"));
            write_comparison(BufWriter::new(File::create(&path)?), &comparison)?;
            info!("{}: {}", header.registration, path.display());
        }
        pb.finish_and_clear();
        Ok(())
    }
}
