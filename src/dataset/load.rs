use std::fs;
use std::path::Path;

use tracing::info;

use super::parse::parse_records;
use super::record::Record;
use crate::error::{Result, SunburstError};

pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let raw = fs::read_to_string(path).map_err(|source| SunburstError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = parse_records(&raw)?;
    info!(path = %path.display(), records = records.len(), "loaded thesis records");
    Ok(records)
}
