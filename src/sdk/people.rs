use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::{error::Error, fs::File, io::Read, path::Path};

use crate::sdk::meetpoint::PersonInput;

#[derive(Debug, Deserialize)]
struct PersonRecord {
    lat: f64,
    lng: f64,
    #[serde(default)]
    transport: Option<String>,
}

/// Loads participants from a CSV file with a `lat,lng,transport` header.
pub fn load_people<P: AsRef<Path>>(csv_path: P) -> Result<Vec<PersonInput>, Box<dyn Error>> {
    let file = File::open(csv_path)?;
    read_people(file)
}

/// Same as [`load_people`] for any reader. The transport column is optional
/// and an empty cell means the default mode.
pub fn read_people<R: Read>(reader: R) -> Result<Vec<PersonInput>, Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut people = Vec::new();
    for (line, result) in rdr.deserialize::<PersonRecord>().enumerate() {
        let record = result.map_err(|e| format!("people CSV row {}: {}", line + 1, e))?;
        people.push(PersonInput {
            lat: record.lat,
            lng: record.lng,
            transport_mode: record.transport.filter(|t| !t.is_empty()),
        });
    }

    if people.is_empty() {
        return Err("people CSV contains no rows".into());
    }
    Ok(people)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_rows_with_optional_transport() {
        let csv = "lat,lng,transport\n55.66, 37.80, bike\n55.64,37.52,\n55.70,37.60\n";
        let people = read_people(csv.as_bytes()).unwrap();
        assert_eq!(people.len(), 3);
        assert_eq!(people[0].lat, 55.66);
        assert_eq!(people[0].lng, 37.80);
        assert_eq!(people[0].transport_mode.as_deref(), Some("bike"));
        assert_eq!(people[1].transport_mode, None);
        assert_eq!(people[2].transport_mode, None);
    }

    #[test]
    fn test_bad_number_reports_row() {
        let csv = "lat,lng,transport\n55.66,east,car\n";
        let err = read_people(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 1"), "{}", err);
    }

    #[test]
    fn test_empty_file_is_rejected() {
        assert!(read_people("lat,lng,transport\n".as_bytes()).is_err());
    }
}
