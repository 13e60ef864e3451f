use crate::config::NA_VALUES;
use crate::error::{AnalyzerError, Result};
use crate::models::{Column, EventRecord, EventTable, ExtraColumn};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use std::path::Path;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Reads the events log at `path` into an `EventTable`.
///
/// Header names are trimmed. Text columns stay nullable strings, `block_number`,
/// `gas_used` and `tx_index` become nullable integers and `block_timestamp` is
/// parsed into a UTC timestamp. Empty cells and the usual NA spellings (`NA`,
/// `NaN`, `null`, `None`, ...) are null. Headers this crate does not know keep
/// only their null count.
pub fn load_contract_events<P: AsRef<Path>>(path: P) -> Result<EventTable> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalyzerError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new().trim(Trim::Headers).from_path(path)?;
    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(AnalyzerError::EmptyData(path.to_path_buf()));
    }

    let mut layout: Vec<(usize, Column)> = Vec::new();
    let mut extras: Vec<(usize, ExtraColumn)> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        match Column::from_name(name) {
            Some(column) => layout.push((idx, column)),
            None => {
                debug!("Untyped column {:?} in {}", name, path.display());
                extras.push((
                    idx,
                    ExtraColumn {
                        name: name.to_string(),
                        known_before: layout.len(),
                        null_count: 0,
                    },
                ));
            }
        }
    }
    if layout.is_empty() {
        warn!("No recognized columns in {}", path.display());
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        for (idx, extra) in extras.iter_mut() {
            if is_na(row.get(*idx).unwrap_or("")) {
                extra.null_count += 1;
            }
        }
        records.push(parse_row(&row, &layout)?);
    }

    if records.is_empty() {
        return Err(AnalyzerError::EmptyData(path.to_path_buf()));
    }

    info!(
        "Loaded {} events ({} columns) from {}",
        records.len(),
        layout.len(),
        path.display()
    );

    Ok(EventTable {
        columns: layout.iter().map(|(_, c)| *c).collect(),
        extra_columns: extras.into_iter().map(|(_, e)| e).collect(),
        records,
    })
}

fn parse_row(row: &StringRecord, layout: &[(usize, Column)]) -> Result<EventRecord> {
    let line = row.position().map(|p| p.line()).unwrap_or(0);
    let mut record = EventRecord::default();

    for &(idx, column) in layout {
        let raw = row.get(idx).unwrap_or("");
        match column {
            Column::EventId => record.event_id = text(raw),
            Column::PreviousEventId => record.previous_event_id = text(raw),
            Column::TxHash => record.tx_hash = text(raw),
            Column::EventType => record.event_type = text(raw),
            Column::ContractAddress => record.contract_address = text(raw),
            Column::Sender => record.sender = text(raw),
            Column::Status => record.status = text(raw),
            Column::NodeRegion => record.node_region = text(raw),
            Column::BlockNumber => record.block_number = integer(raw, line, column)?,
            Column::GasUsed => record.gas_used = integer(raw, line, column)?,
            Column::TxIndex => record.tx_index = integer(raw, line, column)?,
            Column::BlockTimestamp => {
                record.block_timestamp = if is_na(raw) {
                    None
                } else {
                    Some(parse_timestamp(raw).ok_or_else(|| malformed(raw, line, column))?)
                }
            }
        }
    }

    Ok(record)
}

fn is_na(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || NA_VALUES.contains(&trimmed)
}

fn text(raw: &str) -> Option<String> {
    if is_na(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

fn integer(raw: &str, line: u64, column: Column) -> Result<Option<i64>> {
    if is_na(raw) {
        return Ok(None);
    }
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| malformed(raw, line, column))
}

fn malformed(raw: &str, line: u64, column: Column) -> AnalyzerError {
    AnalyzerError::Malformed {
        line,
        column: column.name(),
        value: raw.to_string(),
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff][±HH:MM]`, the same with a `T`
/// separator, or a bare date. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
