//! CSV output format for timeline rows
//!
//! Column order is fixed per grouping mode. Quoting follows the minimal
//! dialect spreadsheet tools expect: fields containing a comma, quote or line
//! break are wrapped in quotes with inner quotes doubled. Lines end in CRLF.

use crate::aggregate::{Aggregation, GroupingMode, TimelineRow};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::{self, Write};

/// Emission settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Add the target `path` column after `use_ssl`
    pub include_path: bool,
}

/// One output column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    ServerIp,
    FirstSeen,
    LastSeen,
    TargetId,
    RequestId,
    Host,
    Ip,
    Type,
    Method,
    Port,
    UseSsl,
    Path,
    ServerIps,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::ServerIp => "server_ip",
            Column::FirstSeen => "first_seen",
            Column::LastSeen => "last_seen",
            Column::TargetId => "target_id",
            Column::RequestId => "request_id",
            Column::Host => "host",
            Column::Ip => "ip",
            Column::Type => "type",
            Column::Method => "method",
            Column::Port => "port",
            Column::UseSsl => "use_ssl",
            Column::Path => "path",
            Column::ServerIps => "server_ips",
        }
    }
}

/// Columns for a grouping mode, in output order
pub fn columns(mode: GroupingMode, options: &CsvOptions) -> Vec<Column> {
    let mut columns = Vec::with_capacity(13);
    if mode == GroupingMode::PerOrigin {
        columns.push(Column::ServerIp);
    }
    columns.extend([
        Column::FirstSeen,
        Column::LastSeen,
        Column::TargetId,
        Column::RequestId,
        Column::Host,
        Column::Ip,
        Column::Type,
        Column::Method,
        Column::Port,
        Column::UseSsl,
    ]);
    if options.include_path {
        columns.push(Column::Path);
    }
    if mode == GroupingMode::CrossOrigin {
        columns.push(Column::ServerIps);
    }
    columns
}

/// CSV output formatter
#[derive(Debug)]
pub struct CsvOutput<'a> {
    aggregation: &'a Aggregation,
    columns: Vec<Column>,
}

impl<'a> CsvOutput<'a> {
    pub fn new(aggregation: &'a Aggregation, options: &CsvOptions) -> Self {
        Self {
            aggregation,
            columns: columns(aggregation.mode, options),
        }
    }

    fn header(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Escape CSV field (handle commas, quotes, line breaks)
    fn escape_field(field: &str) -> Cow<'_, str> {
        if field.contains([',', '"', '\n', '\r']) {
            Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
        } else {
            Cow::Borrowed(field)
        }
    }

    fn field<'r>(row: &'r TimelineRow, column: Column) -> Cow<'r, str> {
        let target = &row.target;
        match column {
            Column::ServerIp | Column::ServerIps => Cow::Owned(row.origin.joined()),
            Column::FirstSeen => Cow::Owned(row.first_seen.to_string()),
            Column::LastSeen => Cow::Owned(row.last_seen.to_string()),
            Column::TargetId => Cow::Borrowed(target.target_id.as_str()),
            Column::RequestId => Cow::Borrowed(target.request_id.as_str()),
            Column::Host => Cow::Borrowed(target.host.as_str()),
            Column::Ip => Cow::Borrowed(target.ip.as_str()),
            Column::Type => Cow::Borrowed(target.target_type.as_str()),
            Column::Method => Cow::Borrowed(target.method.as_str()),
            Column::Port => Cow::Borrowed(target.port.as_str()),
            Column::UseSsl => Cow::Borrowed(target.use_ssl.as_str()),
            Column::Path => Cow::Borrowed(target.path.as_str()),
        }
    }

    fn format_row(&self, row: &TimelineRow) -> String {
        self.columns
            .iter()
            .map(|&column| Self::escape_field(&Self::field(row, column)).into_owned())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Generate CSV output as string; empty when there are no rows.
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        if self.aggregation.is_empty() {
            return output;
        }

        output.push_str(&self.header());
        output.push_str("\r\n");
        for row in &self.aggregation.rows {
            output.push_str(&self.format_row(row));
            output.push_str("\r\n");
        }
        output
    }

    /// Write header and rows; writes nothing at all when there are no rows.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.to_csv().as_bytes())
    }
}

/// Write an aggregation as CSV.
pub fn write_csv<W: Write>(
    aggregation: &Aggregation,
    options: &CsvOptions,
    writer: &mut W,
) -> io::Result<()> {
    CsvOutput::new(aggregation, options).write_to(writer)
}
