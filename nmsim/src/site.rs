//! Site (`.sit`) files: where the receiver is.

use crate::NmsimError;
use log::debug;
use std::{
    fs,
    path::{Path, PathBuf},
};

const X_WIDTH: usize = 19;
const Y_WIDTH: usize = 9;
const HEIGHT_WIDTH: usize = 10;
const LABEL_WIDTH: usize = 20;

// Column ranges of the receiver line.
const X_COLS: (usize, usize) = (0, X_WIDTH);
const Y_COLS: (usize, usize) = (X_COLS.1 + 1, X_COLS.1 + 1 + Y_WIDTH);
const HEIGHT_COLS: (usize, usize) = (Y_COLS.1 + 1, Y_COLS.1 + 1 + HEIGHT_WIDTH);
const LABEL_START: usize = HEIGHT_COLS.1 + 1;

/// A single receiver site.
///
/// On disk:
///
/// ```text
///     0
///     1
///              500000.  7000000.  10.50000 BITH002
/// /path/to/elevation.flt
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SiteFile {
    /// UTM easting (meters).
    pub x: f64,

    /// UTM northing (meters).
    pub y: f64,

    /// Receiver height above ground (meters).
    pub height_m: f64,

    /// Up to 20 characters, usually the station code.
    pub label: String,

    /// Elevation raster the site refers to.
    pub elevation: PathBuf,
}

impl SiteFile {
    /// Renders the file, failing if a value would overflow its column.
    pub fn render(&self) -> Result<String, NmsimError> {
        if !(self.x.is_finite() && self.y.is_finite() && self.height_m.is_finite()) {
            return Err(NmsimError::Site("coordinates must be finite"));
        }
        let x = fixed("x", format!("{:19.0}", self.x), X_WIDTH)?;
        let y = fixed("y", format!("{:9.0}", self.y), Y_WIDTH)?;
        let height = fixed("height", format!("{:10.5}", self.height_m), HEIGHT_WIDTH)?;
        let label = fixed("label", format!("{:<20}", self.label), LABEL_WIDTH)?;
        Ok(format!(
            "    0\n    1\n{x}.{y}.{height} {label}\n{}\n",
            self.elevation.display()
        ))
    }

    /// Writes the file, replacing whatever is at `path`.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), NmsimError> {
        let path = path.as_ref();
        fs::write(path, self.render()?)?;
        debug!("wrote site {} to {}", self.label, path.display());
        Ok(())
    }

    pub fn parse(s: &str) -> Result<Self, NmsimError> {
        let mut lines = s.lines();
        let (Some(_), Some(_), Some(receiver), Some(elevation)) =
            (lines.next(), lines.next(), lines.next(), lines.next())
        else {
            return Err(NmsimError::Site("expected four lines"));
        };
        let column = |(start, end): (usize, usize)| {
            receiver
                .get(start..end)
                .and_then(|s| s.trim().parse::<f64>().ok())
        };
        let x = column(X_COLS).ok_or(NmsimError::Site("bad x column"))?;
        let y = column(Y_COLS).ok_or(NmsimError::Site("bad y column"))?;
        let height_m = column(HEIGHT_COLS).ok_or(NmsimError::Site("bad height column"))?;
        let label = receiver
            .get(LABEL_START..)
            .map(|s| s.chars().take(LABEL_WIDTH).collect::<String>())
            .ok_or(NmsimError::Site("missing label"))?;
        Ok(Self {
            x,
            y,
            height_m,
            label: label.trim_end().to_string(),
            elevation: PathBuf::from(elevation.trim_end()),
        })
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, NmsimError> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

fn fixed(field: &'static str, value: String, width: usize) -> Result<String, NmsimError> {
    if value.chars().count() == width {
        Ok(value)
    } else {
        Err(NmsimError::FieldWidth {
            field,
            value: value.trim().to_string(),
            width,
        })
    }
}
