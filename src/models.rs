use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::{AnalyzerError, Result};

/// Columns of the contract events log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    EventId,
    PreviousEventId,
    TxHash,
    EventType,
    ContractAddress,
    Sender,
    Status,
    BlockNumber,
    BlockTimestamp,
    GasUsed,
    TxIndex,
    NodeRegion,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::EventId,
        Column::PreviousEventId,
        Column::TxHash,
        Column::EventType,
        Column::ContractAddress,
        Column::Sender,
        Column::Status,
        Column::BlockNumber,
        Column::BlockTimestamp,
        Column::GasUsed,
        Column::TxIndex,
        Column::NodeRegion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::EventId => "event_id",
            Column::PreviousEventId => "previous_event_id",
            Column::TxHash => "tx_hash",
            Column::EventType => "event_type",
            Column::ContractAddress => "contract_address",
            Column::Sender => "sender",
            Column::Status => "status",
            Column::BlockNumber => "block_number",
            Column::BlockTimestamp => "block_timestamp",
            Column::GasUsed => "gas_used",
            Column::TxIndex => "tx_index",
            Column::NodeRegion => "node_region",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// One row of the events log. Every field is nullable; an empty cell is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRecord {
    pub event_id: Option<String>,
    pub previous_event_id: Option<String>,
    pub tx_hash: Option<String>,
    pub event_type: Option<String>,
    pub contract_address: Option<String>,
    pub sender: Option<String>,
    pub status: Option<String>,
    pub block_number: Option<i64>,
    pub block_timestamp: Option<DateTime<Utc>>,
    pub gas_used: Option<i64>,
    pub tx_index: Option<i64>,
    pub node_region: Option<String>,
}

impl EventRecord {
    pub fn is_null(&self, column: Column) -> bool {
        match column {
            Column::EventId => self.event_id.is_none(),
            Column::PreviousEventId => self.previous_event_id.is_none(),
            Column::TxHash => self.tx_hash.is_none(),
            Column::EventType => self.event_type.is_none(),
            Column::ContractAddress => self.contract_address.is_none(),
            Column::Sender => self.sender.is_none(),
            Column::Status => self.status.is_none(),
            Column::BlockNumber => self.block_number.is_none(),
            Column::BlockTimestamp => self.block_timestamp.is_none(),
            Column::GasUsed => self.gas_used.is_none(),
            Column::TxIndex => self.tx_index.is_none(),
            Column::NodeRegion => self.node_region.is_none(),
        }
    }
}

/// A header the log carries outside the known schema. Only its null count is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraColumn {
    pub name: String,
    /// Number of known columns that precede it in the header.
    pub known_before: usize,
    pub null_count: usize,
}

/// The loaded events log: the recognized columns in header order plus every row.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    pub columns: Vec<Column>,
    pub extra_columns: Vec<ExtraColumn>,
    pub records: Vec<EventRecord>,
}

impl EventTable {
    /// Table carrying the full schema; handy when rows are built in code.
    pub fn from_records(records: Vec<EventRecord>) -> Self {
        EventTable {
            columns: Column::ALL.to_vec(),
            extra_columns: Vec::new(),
            records,
        }
    }

    /// Null count of every column, known or extra, in header order.
    pub fn null_counts(&self) -> Vec<(&str, usize)> {
        let mut counts = Vec::with_capacity(self.columns.len() + self.extra_columns.len());
        let extras_at = |idx: usize| {
            self.extra_columns
                .iter()
                .filter(move |e| e.known_before == idx)
                .map(|e| (e.name.as_str(), e.null_count))
        };

        for (idx, &column) in self.columns.iter().enumerate() {
            counts.extend(extras_at(idx));
            let nulls = self.records.iter().filter(|r| r.is_null(column)).count();
            counts.push((column.name(), nulls));
        }
        counts.extend(extras_at(self.columns.len()));
        counts
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Fails with `MissingColumns` naming every absent column.
    pub fn require(&self, analysis: &'static str, columns: &[Column]) -> Result<()> {
        let missing: Vec<&'static str> = columns
            .iter()
            .filter(|c| !self.has_column(**c))
            .map(|c| c.name())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalyzerError::MissingColumns {
                analysis,
                columns: missing,
            })
        }
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

fn serialize_timestamp<S>(ts: &Option<DateTime<Utc>>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match ts {
        Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
        None => serializer.serialize_none(),
    }
}

/// A group key with its row count, used by the "top N" lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    #[serde(serialize_with = "serialize_timestamp")]
    pub earliest: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub latest: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanEvent {
    pub event_id: Option<String>,
    pub previous_event_id: Option<String>,
    pub contract_address: Option<String>,
    pub event_type: Option<String>,
    pub block_number: Option<i64>,
}

impl OrphanEvent {
    pub const HEADER: [&'static str; 5] = [
        "event_id",
        "previous_event_id",
        "contract_address",
        "event_type",
        "block_number",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanStats {
    pub total_events: usize,
    pub events_with_previous_id: usize,
    pub orphan_events: usize,
    pub orphan_percentage: f64,
    pub orphan_vs_total_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanSummary {
    #[serde(flatten)]
    pub stats: OrphanStats,
    pub top_contracts_with_orphans: Vec<GroupCount>,
    pub orphan_events_by_type: Vec<GroupCount>,
    pub orphan_time_range: Option<TimeRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderActivity {
    pub sender: String,
    pub block_number: i64,
    pub event_count: usize,
    pub rank_in_sender_activity: usize,
}

impl SenderActivity {
    pub const HEADER: [&'static str; 4] = [
        "sender",
        "block_number",
        "event_count",
        "rank_in_sender_activity",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderStats {
    pub total_senders: usize,
    pub avg_events_per_sender: Option<f64>,
    pub median_events_per_sender: Option<f64>,
    pub max_events_in_block: Option<usize>,
    pub min_events_in_block: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSender {
    pub sender: String,
    pub event_count: usize,
    pub rank_in_sender_activity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderSummary {
    #[serde(flatten)]
    pub stats: SenderStats,
    pub top_senders: Vec<TopSender>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeDelta {
    pub event_id: Option<String>,
    pub contract_address: Option<String>,
    pub event_type: Option<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub block_timestamp: Option<DateTime<Utc>>,
    pub seconds_since_last_event: Option<f64>,
}

impl TimeDelta {
    pub const HEADER: [&'static str; 5] = [
        "event_id",
        "contract_address",
        "event_type",
        "block_timestamp",
        "seconds_since_last_event",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeDeltaStats {
    pub total_contracts: usize,
    pub total_events_with_deltas: usize,
    pub avg_time_delta_seconds: Option<f64>,
    pub median_time_delta_seconds: Option<f64>,
    pub min_time_delta_seconds: Option<f64>,
    pub max_time_delta_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeDeltaSummary {
    #[serde(flatten)]
    pub stats: TimeDeltaStats,
    pub top_contracts_by_activity: Vec<GroupCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotBehavior {
    pub sender: String,
    pub event_count: usize,
    pub avg_time_between_events: Option<f64>,
    pub is_bot_like: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Missing,
    InvalidReorgedChain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataIssue {
    pub column: String,
    pub issue_type: IssueType,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    BotBehavior,
    DataIssue,
}

/// One line of the combined bonus export. Bot rows leave the issue fields
/// empty and issue rows leave the sender fields empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusRow {
    pub sender: Option<String>,
    pub event_count: Option<usize>,
    pub avg_time_between_events: Option<f64>,
    pub is_bot_like: Option<bool>,
    pub analysis_type: AnalysisType,
    pub column: Option<String>,
    pub issue_type: Option<IssueType>,
    pub count: Option<usize>,
}

impl BonusRow {
    pub const HEADER: [&'static str; 8] = [
        "sender",
        "event_count",
        "avg_time_between_events",
        "is_bot_like",
        "analysis_type",
        "column",
        "issue_type",
        "count",
    ];
}

impl From<&BotBehavior> for BonusRow {
    fn from(b: &BotBehavior) -> Self {
        BonusRow {
            sender: Some(b.sender.clone()),
            event_count: Some(b.event_count),
            avg_time_between_events: b.avg_time_between_events,
            is_bot_like: Some(b.is_bot_like),
            analysis_type: AnalysisType::BotBehavior,
            column: None,
            issue_type: None,
            count: None,
        }
    }
}

impl From<&DataIssue> for BonusRow {
    fn from(i: &DataIssue) -> Self {
        BonusRow {
            sender: None,
            event_count: None,
            avg_time_between_events: None,
            is_bot_like: None,
            analysis_type: AnalysisType::DataIssue,
            column: Some(i.column.clone()),
            issue_type: Some(i.issue_type),
            count: Some(i.count),
        }
    }
}

/// Descriptive statistics of one numeric column, nulls excluded. `std` is the
/// sample deviation; quartiles interpolate linearly between ranks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusSummary {
    pub bot_like_senders: usize,
    pub event_count: Describe,
    pub avg_time_between_events: Describe,
    pub data_issues: Vec<DataIssue>,
}
