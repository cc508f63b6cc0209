use crate::{
    buffer::{catchment_geojson, write_geojson},
    options::Tracks,
    progress,
};
use anyhow::Result;
use log::{info, warn};
use nmsim::{
    flightpath::{
        densify, group_tracks, read_fixes_from_path, FlightFilter, RecordIndex, METERS_PER_FOOT,
    },
    write_trajectory_file, ProjectDir, SiteFile, TrajectoryHeader,
};

impl Tracks {
    pub fn run(&self) -> Result<()> {
        let project = ProjectDir::open(&self.project)?;
        let deployment = self.deployment();
        let station = deployment.station();

        let records = RecordIndex::from_nvspl_dir(&self.nvspl, &station)?;
        if let (Some(first_day), Some(last_day)) = (records.first_day(), records.last_day()) {
            info!(
                "{station}: {} hours recorded between {first_day} and {last_day}",
                records.len()
            );
        }

        let fixes = read_fixes_from_path(&self.tracks)?;
        let fix_count = fixes.len();
        let tracks = group_tracks(
            fixes
                .into_iter()
                .filter(|fix| records.covers_day(fix.local.date())),
        );
        info!("{} flights in {fix_count} fixes", tracks.len());

        let filter = FlightFilter::new(&deployment, &records, self.filter_settings())?;
        let site = SiteFile {
            x: filter.site().x,
            y: filter.site().y,
            height_m: deployment.mic_height_m,
            label: station.clone(),
            elevation: project.elevation_file()?,
        };
        info!(
            "microphone height {:.2} feet",
            deployment.mic_height_m / METERS_PER_FOOT
        );
        let site_path = project.site_path(&station);
        site.write(&site_path)?;
        info!("wrote {}", site_path.display());
        write_geojson(
            &project
                .sites_dir()
                .join(format!("{station}_catchment.geojson")),
            &catchment_geojson(
                &filter.catchment()?,
                deployment.position,
                self.radius_km,
            ),
        )?;

        let outcome = filter.run(&tracks)?;
        if outcome.is_empty() {
            warn!("no tracks in the export coincide with this deployment");
            return Ok(());
        }
        info!(
            "{} tracks coincide with this deployment, {} rejected",
            outcome.retained.len(),
            outcome.rejected.len()
        );

        let format = self.trajectory_format();
        let trajectory_dir = project.trajectory_dir();
        let pb = progress::bar("Writing trajectories".to_string(), outcome.retained.len() as u64)?;
        for flight in &outcome.retained {
            let points = densify(&flight.points);
            let header = TrajectoryHeader::for_flight(flight)?;
            let path = write_trajectory_file(&trajectory_dir, &header, &points, &format)?;
            info!(
                "#{}: {} points, {}",
                flight.flight_id,
                points.len(),
                path.display()
            );
            pb.inc(1);
        }
        pb.finish_and_clear();

        let closest: Vec<_> = outcome.closest_approaches().collect();
        println!("{}", serde_json::to_string_pretty(&closest)?);
        Ok(())
    }
}
