use crate::options::Project;
use anyhow::Result;
use log::info;
use nmsim::{
    dem_path, elevation_file_name, flightpath::geodesy::zone_of_western_extent, DirStatus,
    ProjectDir,
};

impl Project {
    pub fn run(&self) -> Result<()> {
        let (project, folders) = ProjectDir::create(&self.project)?;
        let existed = folders
            .iter()
            .filter(|(_, status)| *status == DirStatus::Existed)
            .count();
        info!(
            "{}: {} folders created, {existed} already there",
            project.root().display(),
            folders.len() - existed
        );

        if let Some(west) = self.west {
            let zone = zone_of_western_extent(west)?;
            info!("the project is in UTM zone {zone}");
            println!(
                "{}",
                project.elevation_dir().join(elevation_file_name(zone)).display()
            );
        }

        if let (Some(unit), Some(table), Some(raster_dir)) =
            (&self.unit, &self.dem_table, &self.raster_dir)
        {
            println!("{}", dem_path(table, raster_dir, unit)?.display());
        }
        Ok(())
    }
}
