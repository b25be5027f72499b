//! Line-delimited JSON.
//!
//! Made for arrays of records large enough that you'll want to append or
//! concatenate them later: one serialized record per line, and a bad line
//! never sinks the rest of the batch.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::error;

use crate::error::Result;

pub const EOL: &str = "\n";

/// Serialize each record on its own line.
pub fn stringify<T: Serialize>(records: &[T]) -> Result<String> {
    let lines = records
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(lines.join(EOL))
}

/// Decode every line on its own.
///
/// Lines that fail to decode are logged with their (zero-based) line number
/// and skipped. Blank lines are skipped quietly.
pub fn parse<T: DeserializeOwned>(data: &str) -> Vec<T> {
    data.split(EOL)
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() {
                return None;
            }

            match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    error!(line = i, error = %e, "Could not parse JSONL line");
                    None
                }
            }
        })
        .collect()
}

pub async fn read_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let data = tokio::fs::read_to_string(path).await?;
    Ok(parse(&data))
}

pub async fn write_file<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<()> {
    let data = stringify(records)?;
    tokio::fs::write(path, data).await?;
    Ok(())
}
