//! CLI argument parsing for target-timeline

use crate::aggregate::{AggregateConfig, GroupingMode, SnapshotOrder};
use crate::csv_output::CsvOptions;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "target-timeline")]
#[command(version)]
#[command(
    about = "Merge get_targets snapshots into first/last-seen CSV rows",
    long_about = None
)]
pub struct Cli {
    /// Directory to scan (default: the directory containing this executable)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// One row per request id with all issuing servers in `server_ips`
    #[arg(short = 'm', long = "merge-origins")]
    pub merge_origins: bool,

    /// Order snapshots are folded in; decides which observation a row shows
    #[arg(long = "order", value_enum, default_value = "capture")]
    pub order: SnapshotOrder,

    /// Add the target `path` column
    #[arg(long = "include-path")]
    pub include_path: bool,

    /// Verbose diagnostics on stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn aggregate_config(&self) -> AggregateConfig {
        AggregateConfig {
            mode: if self.merge_origins {
                GroupingMode::CrossOrigin
            } else {
                GroupingMode::PerOrigin
            },
            order: self.order,
        }
    }

    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            include_path: self.include_path,
        }
    }
}
