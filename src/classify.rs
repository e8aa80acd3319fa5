//! Path classification for snapshot discovery
//!
//! Snapshot files are named `get_targets.<epoch>.json.gz`. The server that
//! produced them is encoded in the name of the directory holding them,
//! `logs_<ipv4>` with an optional `:<port>` suffix.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static CAPTURE_FILE: OnceLock<Regex> = OnceLock::new();
static ORIGIN_DIR: OnceLock<Regex> = OnceLock::new();

fn capture_file_regex() -> &'static Regex {
    // Anchored at the start only: `get_targets.1.json.gz.bak` still matches.
    CAPTURE_FILE
        .get_or_init(|| Regex::new(r"^get_targets\.([0-9]+)\.json\.gz").expect("static pattern"))
}

fn origin_dir_regex() -> &'static Regex {
    ORIGIN_DIR.get_or_init(|| {
        Regex::new(r"^logs_([0-9]{1,3}(?:\.[0-9]{1,3}){3})(?::[0-9]+)?$").expect("static pattern")
    })
}

/// Extract the capture timestamp (epoch seconds) from a snapshot file name.
///
/// Returns `None` for anything that is not a snapshot file, including digit
/// runs too large for a `u64`.
pub fn capture_timestamp(file_name: &str) -> Option<u64> {
    let caps = capture_file_regex().captures(file_name)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Extract the origin id (dotted quad) from a directory name, or `""`.
pub fn origin_id(dir_name: &str) -> String {
    origin_dir_regex()
        .captures(dir_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Origin id for a file, taken from its immediate parent directory only.
pub fn origin_for_path(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .map(origin_id)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_capture_timestamp_matches_snapshot_name() {
        assert_eq!(
            capture_timestamp("get_targets.1729094169.json.gz"),
            Some(1_729_094_169)
        );
    }

    #[test]
    fn test_capture_timestamp_tolerates_trailing_suffix() {
        assert_eq!(capture_timestamp("get_targets.42.json.gz.1"), Some(42));
    }

    #[test]
    fn test_capture_timestamp_requires_prefix_at_start() {
        assert_eq!(capture_timestamp("old_get_targets.42.json.gz"), None);
        assert_eq!(capture_timestamp("get_targets.json.gz"), None);
        assert_eq!(capture_timestamp("get_targets.42.json"), None);
        assert_eq!(capture_timestamp("get_targets.4a2.json.gz"), None);
        assert_eq!(capture_timestamp(""), None);
    }

    #[test]
    fn test_capture_timestamp_overflow_is_not_a_snapshot() {
        assert_eq!(
            capture_timestamp("get_targets.99999999999999999999999.json.gz"),
            None
        );
    }

    #[test]
    fn test_origin_id_plain_and_with_port() {
        assert_eq!(origin_id("logs_212.192.31.34"), "212.192.31.34");
        assert_eq!(origin_id("logs_195.35.19.138:8080"), "195.35.19.138");
    }

    #[test]
    fn test_origin_id_rejects_other_names() {
        assert_eq!(origin_id("logs_"), "");
        assert_eq!(origin_id("logs_1.2.3"), "");
        assert_eq!(origin_id("logs_1.2.3.4:"), "");
        assert_eq!(origin_id("logs_1.2.3.4.5"), "");
        assert_eq!(origin_id("xlogs_1.2.3.4"), "");
        assert_eq!(origin_id("logs_1234.2.3.4"), "");
        assert_eq!(origin_id("archive"), "");
    }

    #[test]
    fn test_origin_id_does_not_range_check_octets() {
        assert_eq!(origin_id("logs_999.0.0.1"), "999.0.0.1");
    }

    #[test]
    fn test_origin_for_path_uses_immediate_parent_only() {
        let direct = PathBuf::from("/data/logs_1.2.3.4/get_targets.1.json.gz");
        assert_eq!(origin_for_path(&direct), "1.2.3.4");

        let nested = PathBuf::from("/data/logs_1.2.3.4/2024/get_targets.1.json.gz");
        assert_eq!(origin_for_path(&nested), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_origin_for_path_non_utf8_parent() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = OsStr::from_bytes(b"logs_\xff1.2.3.4");
        let path = Path::new("/data").join(dir).join("get_targets.1.json.gz");
        assert_eq!(origin_for_path(&path), "");
    }

    #[test]
    fn test_origin_for_path_without_parent() {
        assert_eq!(origin_for_path(Path::new("get_targets.1.json.gz")), "");
    }
}
