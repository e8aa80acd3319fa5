//! Timeline aggregation
//!
//! Walks a directory tree of `get_targets` snapshots and collapses repeated
//! observations of the same request into one row bounded by the first and
//! last capture time it was seen at.
//!
//! Two grouping modes are supported:
//! - [`GroupingMode::PerOrigin`]: one row per (server, request id)
//! - [`GroupingMode::CrossOrigin`]: one row per request id, listing every
//!   server that issued it
//!
//! Snapshots that report `targets: null` never merge; each becomes its own
//! row after all grouped rows.

use crate::classify;
use crate::snapshot::{self, Snapshot, SnapshotTargets, TargetRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use walkdir::WalkDir;

/// How target records are keyed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingMode {
    /// Key on (origin id, request id)
    #[default]
    PerOrigin,
    /// Key on request id alone, collecting origin ids
    CrossOrigin,
}

/// Order in which read snapshots are folded into groups
///
/// Representative fields of a group come from the first record folded in, so
/// this decides which observation a row describes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotOrder {
    /// Earliest capture first (ties keep walk order)
    #[default]
    Capture,
    /// Directory walk order (file names sorted within each directory)
    Walk,
}

/// Aggregation settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub mode: GroupingMode,
    pub order: SnapshotOrder,
}

/// Where a row came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOrigin {
    /// Per-origin rows and null-target events carry a single origin id ("" if unknown)
    Single(String),
    /// Cross-origin rows carry every non-empty origin id that contributed
    Merged(HashSet<String>),
}

impl RowOrigin {
    /// Sorted, deduplicated origin ids joined with `,`
    pub fn joined(&self) -> String {
        match self {
            RowOrigin::Single(origin) => origin.clone(),
            RowOrigin::Merged(origins) => {
                let mut sorted: Vec<&str> = origins.iter().map(String::as_str).collect();
                sorted.sort_unstable();
                sorted.join(",")
            }
        }
    }
}

/// What a row summarizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// All target records sharing a grouping key
    Grouped,
    /// One snapshot whose `targets` was null or missing
    NullTargets,
}

/// One output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRow {
    pub kind: RowKind,
    pub first_seen: u64,
    pub last_seen: u64,
    pub origin: RowOrigin,
    /// Representative record (first folded in); blank for null-target events
    pub target: TargetRecord,
}

/// Counters collected while scanning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Files whose name matched the snapshot pattern
    pub files_visited: u64,
    pub snapshots_read: u64,
    pub snapshots_failed: u64,
    pub null_target_events: u64,
    pub target_records: u64,
}

/// Result of one aggregation run
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub mode: GroupingMode,
    pub rows: Vec<TimelineRow>,
    pub stats: ScanStats,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    /// `None` in cross-origin mode
    origin: Option<String>,
    request_id: String,
}

#[derive(Debug)]
struct GroupAccumulator {
    first_seen: u64,
    last_seen: u64,
    origins: HashSet<String>,
    representative: TargetRecord,
}

impl GroupAccumulator {
    fn new(timestamp: u64, representative: TargetRecord) -> Self {
        Self {
            first_seen: timestamp,
            last_seen: timestamp,
            origins: HashSet::new(),
            representative,
        }
    }

    fn observe(&mut self, timestamp: u64) {
        self.first_seen = self.first_seen.min(timestamp);
        self.last_seen = self.last_seen.max(timestamp);
    }
}

/// Incremental fold of snapshots into timeline rows
///
/// Groups are emitted in the order their key was first seen.
#[derive(Debug)]
pub struct TimelineFolder {
    mode: GroupingMode,
    index: HashMap<GroupKey, usize>,
    groups: Vec<(GroupKey, GroupAccumulator)>,
    null_events: Vec<TimelineRow>,
    stats: ScanStats,
}

impl TimelineFolder {
    pub fn new(mode: GroupingMode) -> Self {
        Self::with_stats(mode, ScanStats::default())
    }

    /// Start from counters already collected by the scan; the fold adds its own.
    pub fn with_stats(mode: GroupingMode, stats: ScanStats) -> Self {
        Self {
            mode,
            index: HashMap::new(),
            groups: Vec::new(),
            null_events: Vec::new(),
            stats,
        }
    }

    /// Fold one snapshot's records (or its null-targets event).
    pub fn fold(&mut self, snapshot: &Snapshot) {
        let timestamp = snapshot.capture_timestamp;
        tracing::trace!(path = %snapshot.path.display(), timestamp, "Folding snapshot");
        let records = match &snapshot.targets {
            SnapshotTargets::NoTargets => {
                self.stats.null_target_events += 1;
                self.null_events.push(TimelineRow {
                    kind: RowKind::NullTargets,
                    first_seen: timestamp,
                    last_seen: timestamp,
                    origin: self.null_event_origin(&snapshot.origin_id),
                    target: TargetRecord::default(),
                });
                return;
            }
            SnapshotTargets::Targets(records) => records,
        };

        for record in records {
            self.stats.target_records += 1;
            let key = GroupKey {
                origin: match self.mode {
                    GroupingMode::PerOrigin => Some(snapshot.origin_id.clone()),
                    GroupingMode::CrossOrigin => None,
                },
                request_id: record.request_id.clone(),
            };

            let slot = match self.index.get(&key) {
                Some(&slot) => {
                    self.groups[slot].1.observe(timestamp);
                    slot
                }
                None => {
                    let slot = self.groups.len();
                    self.index.insert(key.clone(), slot);
                    self.groups
                        .push((key, GroupAccumulator::new(timestamp, record.clone())));
                    slot
                }
            };

            if self.mode == GroupingMode::CrossOrigin && !snapshot.origin_id.is_empty() {
                self.groups[slot].1.origins.insert(snapshot.origin_id.clone());
            }
        }
    }

    fn null_event_origin(&self, origin_id: &str) -> RowOrigin {
        match self.mode {
            GroupingMode::PerOrigin => RowOrigin::Single(origin_id.to_string()),
            GroupingMode::CrossOrigin => {
                let mut origins = HashSet::new();
                if !origin_id.is_empty() {
                    origins.insert(origin_id.to_string());
                }
                RowOrigin::Merged(origins)
            }
        }
    }

    /// Grouped rows first, then null-target events.
    pub fn finish(self) -> Aggregation {
        let mut rows: Vec<TimelineRow> = self
            .groups
            .into_iter()
            .map(|(key, group)| TimelineRow {
                kind: RowKind::Grouped,
                first_seen: group.first_seen,
                last_seen: group.last_seen,
                origin: match key.origin {
                    Some(origin) => RowOrigin::Single(origin),
                    None => RowOrigin::Merged(group.origins),
                },
                target: group.representative,
            })
            .collect();
        rows.extend(self.null_events);

        Aggregation {
            mode: self.mode,
            rows,
            stats: self.stats,
        }
    }
}

/// Find and read every snapshot under `root`, in walk order.
///
/// Unreadable snapshots and walk errors are logged and skipped.
pub fn scan_snapshots(root: &Path) -> (Vec<Snapshot>, ScanStats) {
    let mut snapshots = Vec::new();
    let mut stats = ScanStats::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to walk snapshot tree");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let Some(capture_timestamp) = entry
            .file_name()
            .to_str()
            .and_then(classify::capture_timestamp)
        else {
            tracing::trace!(path = %path.display(), "Not a snapshot file");
            continue;
        };
        stats.files_visited += 1;

        match snapshot::read_snapshot(path) {
            Ok(targets) => {
                stats.snapshots_read += 1;
                tracing::debug!(path = %path.display(), capture_timestamp, "Read snapshot");
                snapshots.push(Snapshot {
                    path: path.to_path_buf(),
                    capture_timestamp,
                    origin_id: classify::origin_for_path(path),
                    targets,
                });
            }
            Err(err) => {
                stats.snapshots_failed += 1;
                tracing::warn!(path = %path.display(), error = %err, "Failed to read snapshot");
            }
        }
    }

    (snapshots, stats)
}

/// Fold already-read snapshots in the configured order.
pub fn fold_snapshots(snapshots: Vec<Snapshot>, config: &AggregateConfig) -> Aggregation {
    fold_with_stats(snapshots, config, ScanStats::default())
}

fn fold_with_stats(
    mut snapshots: Vec<Snapshot>,
    config: &AggregateConfig,
    stats: ScanStats,
) -> Aggregation {
    if config.order == SnapshotOrder::Capture {
        // stable: equal timestamps keep walk order
        snapshots.sort_by_key(|s| s.capture_timestamp);
    }

    let mut folder = TimelineFolder::with_stats(config.mode, stats);
    for snapshot in &snapshots {
        folder.fold(snapshot);
    }
    folder.finish()
}

/// Scan `root` and build the timeline.
pub fn aggregate(root: &Path, config: &AggregateConfig) -> Aggregation {
    let (snapshots, scan_stats) = scan_snapshots(root);
    let aggregation = fold_with_stats(snapshots, config, scan_stats);

    tracing::info!(
        root = %root.display(),
        files = aggregation.stats.files_visited,
        failed = aggregation.stats.snapshots_failed,
        records = aggregation.stats.target_records,
        null_events = aggregation.stats.null_target_events,
        rows = aggregation.rows.len(),
        "Aggregated snapshots"
    );
    aggregation
}
