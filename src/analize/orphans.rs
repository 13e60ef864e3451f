use crate::analize::{top_counts, AnalysisState};
use crate::config::TOP_N;
use crate::csv::export_orphan_events_csv;
use crate::error::Result;
use crate::models::{Column, EventTable, OrphanEvent, OrphanStats, OrphanSummary, TimeRange};
use log::info;
use std::collections::HashSet;
use std::path::Path;

const ANALYSIS: &str = "orphan detection";

const REQUIRED: [Column; 5] = [
    Column::EventId,
    Column::PreviousEventId,
    Column::ContractAddress,
    Column::EventType,
    Column::BlockNumber,
];

#[derive(Debug, Clone, PartialEq)]
pub struct OrphanReport {
    pub orphans: Vec<OrphanEvent>,
    pub stats: OrphanStats,
}

/// Finds events whose `previous_event_id` points at an id missing from the table.
pub struct OrphanDetector<'a> {
    table: &'a EventTable,
    state: AnalysisState<OrphanReport>,
}

impl<'a> OrphanDetector<'a> {
    pub fn new(table: &'a EventTable) -> Self {
        OrphanDetector {
            table,
            state: AnalysisState::Uninitialized,
        }
    }

    pub fn state(&self) -> &AnalysisState<OrphanReport> {
        &self.state
    }

    pub fn find_orphan_events(&mut self) -> Result<&[OrphanEvent]> {
        self.table.require(ANALYSIS, &REQUIRED)?;

        let known_ids: HashSet<&str> = self
            .table
            .records
            .iter()
            .filter_map(|r| r.event_id.as_deref())
            .collect();

        let mut events_with_previous = 0;
        let mut orphans = Vec::new();
        for record in &self.table.records {
            let Some(previous) = record.previous_event_id.as_deref() else {
                continue;
            };
            events_with_previous += 1;

            if !known_ids.contains(previous) {
                orphans.push(OrphanEvent {
                    event_id: record.event_id.clone(),
                    previous_event_id: record.previous_event_id.clone(),
                    contract_address: record.contract_address.clone(),
                    event_type: record.event_type.clone(),
                    block_number: record.block_number,
                });
            }
        }

        let stats = orphan_stats(self.table.len(), events_with_previous, orphans.len());
        info!(
            "Found {} orphan events among {} chained events ({:.2}%)",
            stats.orphan_events, stats.events_with_previous_id, stats.orphan_percentage
        );

        self.state = AnalysisState::Computed(OrphanReport { orphans, stats });
        self.orphan_events().map(|o| o.as_slice())
    }

    pub fn orphan_events(&self) -> Result<&Vec<OrphanEvent>> {
        Ok(&self.state.result(ANALYSIS, "orphan_events")?.orphans)
    }

    pub fn stats(&self) -> Result<&OrphanStats> {
        Ok(&self.state.result(ANALYSIS, "stats")?.stats)
    }

    pub fn summary(&self) -> Result<OrphanSummary> {
        let report = self.state.result(ANALYSIS, "summary")?;

        let top_contracts_with_orphans = top_counts(
            report.orphans.iter().map(|o| o.contract_address.as_deref()),
            Some(TOP_N),
        );
        let orphan_events_by_type =
            top_counts(report.orphans.iter().map(|o| o.event_type.as_deref()), None);

        let orphan_time_range = if self.table.has_column(Column::BlockTimestamp) {
            let stamps = self.table.records.iter().filter_map(|r| r.block_timestamp);
            Some(TimeRange {
                earliest: stamps.clone().min(),
                latest: stamps.max(),
            })
        } else {
            None
        };

        Ok(OrphanSummary {
            stats: report.stats.clone(),
            top_contracts_with_orphans,
            orphan_events_by_type,
            orphan_time_range,
        })
    }

    pub fn export<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let report = self.state.result(ANALYSIS, "export")?;
        export_orphan_events_csv(&report.orphans, path.as_ref())?;
        self.state.mark_exported();
        Ok(())
    }
}

fn orphan_stats(total_events: usize, events_with_previous_id: usize, orphan_events: usize) -> OrphanStats {
    OrphanStats {
        total_events,
        events_with_previous_id,
        orphan_events,
        orphan_percentage: percentage(orphan_events, events_with_previous_id),
        orphan_vs_total_percentage: percentage(orphan_events, total_events),
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Runs the detector once and returns the orphan rows with their summary.
pub fn find_orphan_events(table: &EventTable) -> Result<(Vec<OrphanEvent>, OrphanSummary)> {
    let mut detector = OrphanDetector::new(table);
    let orphans = detector.find_orphan_events()?.to_vec();
    let summary = detector.summary()?;
    Ok((orphans, summary))
}
