use std::fs::File;
use std::io::Read;

use crate::error::LoadError;

#[derive(Debug, serde::Deserialize, Clone, PartialEq)]
pub struct Record {
    pub work_year: i32,
    pub experience_level: String,
    pub remote_ratio: i64,
    pub company_location: String,
    pub salary_in_usd: f64,
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Loads every row from `source`, which is either a local path or an http(s) URL.
pub fn read_data(source: &str) -> Result<Vec<Record>, LoadError> {
    if is_remote(source) {
        log::info!("Fetching salary table from {source}");
        let response = reqwest::blocking::get(source).map_err(|cause| LoadError::Http {
            url: source.to_string(),
            cause,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: source.to_string(),
                status: status.as_u16(),
            });
        }
        read_records(response, source)
    } else {
        log::info!("Reading salary table from {source}");
        let file = File::open(source).map_err(|cause| LoadError::Io {
            source_name: source.to_string(),
            cause,
        })?;
        read_records(file, source)
    }
}

pub fn read_records<R: Read>(reader: R, source_name: &str) -> Result<Vec<Record>, LoadError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::<Record>::new();
    for result in rdr.deserialize() {
        // Columns beyond the five the board needs are skipped by serde.
        let record: Record = result.map_err(|cause| LoadError::Csv {
            line: cause.position().map(|p| p.line()).unwrap_or(0),
            cause,
        })?;
        records.push(record);
    }
    if records.is_empty() {
        return Err(LoadError::Empty(source_name.to_string()));
    }
    log::info!("Loaded {} rows from {source_name}", records.len());
    Ok(records)
}
