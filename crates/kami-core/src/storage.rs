//! Read fact files from disk and write exports back out.

use crate::error::KamiError;
use crate::fact::Fact;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON array of raw fact records.
///
/// Records are decoded separately with [`decode_facts`] so a caller can skip
/// individual bad records instead of losing the whole file.
pub fn read_fact_records(path: &Path) -> Result<Vec<serde_json::Value>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read facts from {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("{} is not a JSON array of fact records", path.display()))
}

/// Decode every record, keeping its index for error reporting.
pub fn decode_facts(records: Vec<serde_json::Value>) -> Vec<(usize, Result<Fact, KamiError>)> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| (i, Fact::from_record(record)))
        .collect()
}

/// Write `contents` to `<dir>/<file_name>`, creating `dir` if needed.
pub fn write_output(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote export");
    Ok(path)
}
