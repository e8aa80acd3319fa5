//! target-timeline - collapse periodic `get_targets` snapshots into timelines
//!
//! A scanned tree holds gzip-compressed JSON snapshots named
//! `get_targets.<epoch>.json.gz`, optionally inside `logs_<ipv4>[:port]`
//! directories naming the server that issued them. Repeated observations of
//! the same request are folded into one row spanning the first and last
//! capture time, and the result is written as CSV.

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod csv_output;
pub mod error;
pub mod snapshot;
