//! Reading flight track database exports.

use crate::{FlightFix, FlightpathError};
use log::debug;
use std::{fs::File, io::Read, path::Path};

/// Reads and validates every fix in a CSV export of the track
/// database.
///
/// The export needs the columns `flight_id`, `registration`,
/// `utc_datetime`, `ak_datetime`, `longitude`, `latitude`,
/// `altitude_ft`, `heading` and `knots`, in any order. Extra columns
/// are ignored.
pub fn read_fixes<R: Read>(rdr: R) -> Result<Vec<FlightFix>, FlightpathError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut fixes = Vec::new();
    for (row, record) in rdr.deserialize::<FlightFix>().enumerate() {
        let fix = record?;
        fix.validate(row)?;
        fixes.push(fix);
    }
    Ok(fixes)
}

pub fn read_fixes_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<FlightFix>, FlightpathError> {
    debug!("reading fixes from {:?}", path.as_ref());
    read_fixes(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::{read_fixes, read_fixes_from_path};
    use crate::FlightpathError;
    use std::io::Write;

    const EXPORT: &str = "\
flight_id,registration,utc_datetime,ak_datetime,longitude,latitude,altitude_ft,heading,knots,operator
42,N12345,2019-06-14 21:20:05,2019-06-14 13:20:05,-149.10,63.70,1500,87.5,105,Talkeetna Air
42,N12345,2019-06-14 21:20:10,2019-06-14 13:20:10,-149.09,63.70,1510,88.0,106,Talkeetna Air
7,N98765,2019-06-14T22:00:00,2019-06-14T14:00:00,-150.00,63.10,900,270,90,K2
";

    #[test]
    fn test_read_fixes() {
        let fixes = read_fixes(EXPORT.as_bytes()).unwrap();
        assert_eq!(fixes.len(), 3);
        assert_eq!(fixes[0].flight_id, 42);
        assert_eq!(fixes[0].registration, "N12345");
        assert_eq!(fixes[1].altitude_ft, 1510.0);
        assert_eq!(
            fixes[2].utc.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2019-06-14 22:00:00"
        );
        assert_eq!(fixes[2].local.format("%H:%M").to_string(), "14:00");
    }

    #[test]
    fn test_rejects_invalid_rows() {
        let export = "\
flight_id,registration,utc_datetime,ak_datetime,longitude,latitude,altitude_ft,heading,knots
1,N1,2019-06-14 21:20:05,2019-06-14 13:20:05,-149.1,63.7,1500,87.5,105
1,N1,2019-06-14 21:20:10,2019-06-14 13:20:10,-149.1,163.7,1500,87.5,105
";
        match read_fixes(export.as_bytes()) {
            Err(FlightpathError::InvalidFix { flight_id, row, .. }) => {
                assert_eq!((flight_id, row), (1, 1));
            }
            other => panic!("expected InvalidFix, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_timestamp() {
        let export = "\
flight_id,registration,utc_datetime,ak_datetime,longitude,latitude,altitude_ft,heading,knots
1,N1,yesterday,2019-06-14 13:20:05,-149.1,63.7,1500,87.5,105
";
        assert!(matches!(
            read_fixes(export.as_bytes()),
            Err(FlightpathError::Csv(_))
        ));
    }

    #[test]
    fn test_read_fixes_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXPORT.as_bytes()).unwrap();
        let fixes = read_fixes_from_path(file.path()).unwrap();
        assert_eq!(fixes.len(), 3);
    }
}
