// Snapshot tree fixtures shared by integration tests

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `json` gzip-compressed as `<root>/<dir>/get_targets.<ts>.json.gz`.
///
/// An empty `dir` places the file directly under `root`.
pub fn write_snapshot(root: &Path, dir: &str, ts: u64, json: &str) -> PathBuf {
    write_gz(root, dir, &format!("get_targets.{ts}.json.gz"), json.as_bytes())
}

/// Write arbitrary bytes gzip-compressed under `<root>/<dir>/<name>`.
pub fn write_gz(root: &Path, dir: &str, name: &str, bytes: &[u8]) -> PathBuf {
    let parent = root.join(dir);
    fs::create_dir_all(&parent).unwrap();
    let path = parent.join(name);
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap();
    path
}

/// A `targets` document with one target per `(request_id, host)` pair
pub fn targets_json(targets: &[(&str, &str)]) -> String {
    let items: Vec<serde_json::Value> = targets
        .iter()
        .map(|(request_id, host)| {
            serde_json::json!({
                "request_id": request_id,
                "target_id": format!("t-{request_id}"),
                "host": host,
                "ip": "10.0.0.1",
                "type": "http",
                "method": "GET",
                "port": 443,
                "use_ssl": true,
                "path": "/"
            })
        })
        .collect();
    serde_json::json!({ "targets": items }).to_string()
}
