//! Snapshot reading: gzip -> UTF-8 -> JSON -> target records
//!
//! Every recognized target field is normalized to text exactly once, here, so
//! the aggregator never deals with missing keys or mixed JSON types.

use crate::error::{json_kind, SnapshotError};
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// One work item as listed in a snapshot's `targets` array
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TargetRecord {
    #[serde(deserialize_with = "scalar_text")]
    pub request_id: String,
    #[serde(deserialize_with = "scalar_text")]
    pub target_id: String,
    #[serde(deserialize_with = "scalar_text")]
    pub host: String,
    #[serde(deserialize_with = "scalar_text")]
    pub ip: String,
    #[serde(rename = "type", deserialize_with = "scalar_text")]
    pub target_type: String,
    #[serde(deserialize_with = "scalar_text")]
    pub method: String,
    #[serde(deserialize_with = "scalar_text")]
    pub port: String,
    #[serde(deserialize_with = "scalar_text")]
    pub use_ssl: String,
    #[serde(deserialize_with = "scalar_text")]
    pub path: String,
}

/// Render any JSON value as the text written to CSV.
///
/// Booleans use `True`/`False`, the spelling existing timeline CSVs carry.
fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    })
}

/// Contents of a snapshot's `targets` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotTargets {
    /// `targets` was an array (possibly empty)
    Targets(Vec<TargetRecord>),
    /// `targets` was null or missing
    NoTargets,
}

/// A successfully read snapshot, located and timestamped
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub path: PathBuf,
    pub capture_timestamp: u64,
    pub origin_id: String,
    pub targets: SnapshotTargets,
}

/// Decompress and parse one snapshot file.
pub fn read_snapshot(path: &Path) -> Result<SnapshotTargets, SnapshotError> {
    let file = File::open(path)?;
    let mut bytes = Vec::new();
    MultiGzDecoder::new(file).read_to_end(&mut bytes)?;
    let text = String::from_utf8(bytes)?;
    parse_snapshot(&text)
}

/// Parse the JSON text of a snapshot.
///
/// The file is accepted or rejected as a whole: one malformed target rejects
/// every target in it.
pub fn parse_snapshot(text: &str) -> Result<SnapshotTargets, SnapshotError> {
    let document: Value = serde_json::from_str(text)?;
    let mut fields = match document {
        Value::Object(fields) => fields,
        other => {
            return Err(SnapshotError::NotAnObject {
                found: json_kind(&other),
            })
        }
    };

    match fields.remove("targets") {
        None | Some(Value::Null) => Ok(SnapshotTargets::NoTargets),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| -> Result<TargetRecord, SnapshotError> {
                if item.is_object() {
                    Ok(serde_json::from_value(item)?)
                } else {
                    Err(SnapshotError::InvalidTarget {
                        index,
                        found: json_kind(&item),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(SnapshotTargets::Targets),
        Some(other) => Err(SnapshotError::InvalidTargets {
            found: json_kind(&other),
        }),
    }
}
