use crate::options::{Buffer, LatLon};
use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use log::info;
use nmsim::flightpath::geodesy::{
    geo::geometry::{Coord, Polygon},
    point_buffer_with_segments,
};
use std::{fs::File, io::Write, path::Path};

impl Buffer {
    pub fn run(&self) -> Result<()> {
        let LatLon(site) = self.site;
        let polygon = point_buffer_with_segments(site.y, site.x, self.radius_km, self.segments)?;
        let geojson = catchment_geojson(&polygon, site, self.radius_km);
        match &self.out {
            Some(path) => write_geojson(path, &geojson)?,
            None => println!("{geojson}"),
        }
        Ok(())
    }
}

/// A feature collection holding the catchment around `site`.
pub fn catchment_geojson(polygon: &Polygon<f64>, site: Coord<f64>, radius_km: f64) -> GeoJson {
    let mut properties = JsonObject::new();
    properties.insert("latitude".to_string(), site.y.into());
    properties.insert("longitude".to_string(), site.x.into());
    properties.insert("radius_km".to_string(), radius_km.into());
    let feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::from(polygon))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    };
    GeoJson::from(FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    })
}

pub fn write_geojson(path: &Path, geojson: &GeoJson) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{geojson}")?;
    info!("wrote catchment to {}", path.display());
    Ok(())
}
