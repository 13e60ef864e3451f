use crate::analize::{mean, median, min_max, top_counts, AnalysisState};
use crate::config::TOP_N;
use crate::csv::export_time_deltas_csv;
use crate::error::Result;
use crate::models::{Column, EventRecord, EventTable, TimeDelta, TimeDeltaStats, TimeDeltaSummary};
use chrono::{DateTime, Utc};
use log::info;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

const ANALYSIS: &str = "time delta calculation";

#[derive(Debug, Clone, PartialEq)]
pub struct TimeDeltaReport {
    pub deltas: Vec<TimeDelta>,
    pub stats: TimeDeltaStats,
}

/// Seconds between consecutive events of the same contract, in timestamp order.
pub struct TimeDeltaCalculator<'a> {
    table: &'a EventTable,
    state: AnalysisState<TimeDeltaReport>,
}

impl<'a> TimeDeltaCalculator<'a> {
    pub fn new(table: &'a EventTable) -> Self {
        TimeDeltaCalculator {
            table,
            state: AnalysisState::Uninitialized,
        }
    }

    pub fn state(&self) -> &AnalysisState<TimeDeltaReport> {
        &self.state
    }

    /// Rows come back sorted by `(contract_address, block_timestamp)` with
    /// nulls last; the first row of each contract has no delta.
    pub fn calculate_time_deltas(&mut self) -> Result<&[TimeDelta]> {
        self.table
            .require(ANALYSIS, &[Column::BlockTimestamp, Column::ContractAddress])?;

        let mut sorted: Vec<&EventRecord> = self.table.records.iter().collect();
        sorted.sort_by(|a, b| {
            nulls_last(&a.contract_address, &b.contract_address)
                .then_with(|| nulls_last(&a.block_timestamp, &b.block_timestamp))
        });

        let mut deltas = Vec::with_capacity(sorted.len());
        let mut previous: Option<&EventRecord> = None;
        for record in sorted {
            let seconds_since_last_event = match (previous, record.contract_address.as_ref()) {
                (Some(prev), Some(contract)) if prev.contract_address.as_ref() == Some(contract) => {
                    match (prev.block_timestamp, record.block_timestamp) {
                        (Some(from), Some(to)) => Some(seconds_between(from, to)),
                        _ => None,
                    }
                }
                _ => None,
            };

            deltas.push(TimeDelta {
                event_id: record.event_id.clone(),
                contract_address: record.contract_address.clone(),
                event_type: record.event_type.clone(),
                block_timestamp: record.block_timestamp,
                seconds_since_last_event,
            });
            previous = Some(record);
        }

        let stats = time_delta_stats(&deltas);
        info!(
            "Computed {} time deltas across {} contracts",
            stats.total_events_with_deltas, stats.total_contracts
        );

        self.state = AnalysisState::Computed(TimeDeltaReport { deltas, stats });
        self.time_deltas().map(|d| d.as_slice())
    }

    pub fn time_deltas(&self) -> Result<&Vec<TimeDelta>> {
        Ok(&self.state.result(ANALYSIS, "time_deltas")?.deltas)
    }

    pub fn stats(&self) -> Result<&TimeDeltaStats> {
        Ok(&self.state.result(ANALYSIS, "stats")?.stats)
    }

    pub fn summary(&self) -> Result<TimeDeltaSummary> {
        let report = self.state.result(ANALYSIS, "summary")?;
        Ok(TimeDeltaSummary {
            stats: report.stats.clone(),
            top_contracts_by_activity: top_counts(
                report.deltas.iter().map(|d| d.contract_address.as_deref()),
                Some(TOP_N),
            ),
        })
    }

    pub fn export<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let report = self.state.result(ANALYSIS, "export")?;
        export_time_deltas_csv(&report.deltas, path.as_ref())?;
        self.state.mark_exported();
        Ok(())
    }
}

fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let elapsed = to - from;
    match elapsed.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => elapsed.num_seconds() as f64,
    }
}

fn time_delta_stats(deltas: &[TimeDelta]) -> TimeDeltaStats {
    let values: Vec<f64> = deltas
        .iter()
        .filter_map(|d| d.seconds_since_last_event)
        .collect();
    let contracts: HashSet<&str> = deltas
        .iter()
        .filter_map(|d| d.contract_address.as_deref())
        .collect();
    let (min, max) = min_max(&values);

    TimeDeltaStats {
        total_contracts: contracts.len(),
        total_events_with_deltas: values.len(),
        avg_time_delta_seconds: mean(&values),
        median_time_delta_seconds: median(&values),
        min_time_delta_seconds: min,
        max_time_delta_seconds: max,
    }
}

/// Runs the calculator once and returns the sorted delta rows with their summary.
pub fn calculate_time_deltas(table: &EventTable) -> Result<(Vec<TimeDelta>, TimeDeltaSummary)> {
    let mut calculator = TimeDeltaCalculator::new(table);
    let deltas = calculator.calculate_time_deltas()?.to_vec();
    let summary = calculator.summary()?;
    Ok((deltas, summary))
}
