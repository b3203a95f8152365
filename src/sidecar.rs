use crate::models::TimestampRecord;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Serialize records as a JSON array of `[name, seconds]` pairs with
/// 4-space indentation.
pub fn to_json(records: &[TimestampRecord]) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

pub fn from_json(s: &str) -> Result<Vec<TimestampRecord>> {
    let records: Vec<TimestampRecord> = serde_json::from_str(s)?;
    Ok(records)
}

/// Create or overwrite the sidecar at `path`.
pub fn save(path: &Path, records: &[TimestampRecord]) -> Result<()> {
    let json = to_json(records)?;
    std::fs::write(path, json)
        .with_context(|| format!("writing sidecar {}", path.display()))?;
    tracing::debug!("wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<Vec<TimestampRecord>> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading sidecar {}", path.display()))?;
    let records = from_json(&s).with_context(|| format!("parsing sidecar {}", path.display()))?;
    tracing::debug!("loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}
