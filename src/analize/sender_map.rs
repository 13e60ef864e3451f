use crate::analize::{mean, median, AnalysisState};
use crate::config::TOP_N;
use crate::csv::export_sender_activity_csv;
use crate::error::Result;
use crate::models::{Column, EventTable, SenderActivity, SenderStats, SenderSummary, TopSender};
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

const ANALYSIS: &str = "sender mapping";

#[derive(Debug, Clone, PartialEq)]
pub struct SenderReport {
    pub activity: Vec<SenderActivity>,
    pub stats: SenderStats,
}

/// Finds each sender's busiest block and ranks senders by that block's event count.
pub struct SenderMapper<'a> {
    table: &'a EventTable,
    state: AnalysisState<SenderReport>,
}

impl<'a> SenderMapper<'a> {
    pub fn new(table: &'a EventTable) -> Self {
        SenderMapper {
            table,
            state: AnalysisState::Uninitialized,
        }
    }

    pub fn state(&self) -> &AnalysisState<SenderReport> {
        &self.state
    }

    pub fn map_sender_activity(&mut self) -> Result<&[SenderActivity]> {
        self.table
            .require(ANALYSIS, &[Column::Sender, Column::BlockNumber])?;

        let mut per_block: HashMap<(&str, i64), usize> = HashMap::new();
        for record in &self.table.records {
            if let (Some(sender), Some(block)) = (record.sender.as_deref(), record.block_number) {
                *per_block.entry((sender, block)).or_insert(0) += 1;
            }
        }
        debug!("{} distinct (sender, block) pairs", per_block.len());

        // Busiest block per sender; equal counts keep the lowest block number.
        let mut busiest: HashMap<&str, (i64, usize)> = HashMap::new();
        for ((sender, block), count) in per_block {
            busiest
                .entry(sender)
                .and_modify(|best| {
                    if count > best.1 || (count == best.1 && block < best.0) {
                        *best = (block, count);
                    }
                })
                .or_insert((block, count));
        }

        let mut activity: Vec<SenderActivity> = busiest
            .into_iter()
            .map(|(sender, (block_number, event_count))| SenderActivity {
                sender: sender.to_string(),
                block_number,
                event_count,
                rank_in_sender_activity: 0,
            })
            .collect();
        activity.sort_by(|a, b| {
            b.event_count
                .cmp(&a.event_count)
                .then_with(|| a.sender.cmp(&b.sender))
        });
        assign_min_ranks(&mut activity);

        let stats = sender_stats(&activity);
        info!(
            "Mapped {} senders, busiest block holds {} events",
            stats.total_senders,
            stats.max_events_in_block.unwrap_or(0)
        );

        self.state = AnalysisState::Computed(SenderReport { activity, stats });
        self.sender_activity().map(|a| a.as_slice())
    }

    pub fn sender_activity(&self) -> Result<&Vec<SenderActivity>> {
        Ok(&self.state.result(ANALYSIS, "sender_activity")?.activity)
    }

    pub fn stats(&self) -> Result<&SenderStats> {
        Ok(&self.state.result(ANALYSIS, "stats")?.stats)
    }

    pub fn summary(&self) -> Result<SenderSummary> {
        let report = self.state.result(ANALYSIS, "summary")?;

        let mut ranked: Vec<&SenderActivity> = report.activity.iter().collect();
        ranked.sort_by_key(|a| a.rank_in_sender_activity);
        let top_senders = ranked
            .into_iter()
            .take(TOP_N)
            .map(|a| TopSender {
                sender: a.sender.clone(),
                event_count: a.event_count,
                rank_in_sender_activity: a.rank_in_sender_activity,
            })
            .collect();

        Ok(SenderSummary {
            stats: report.stats.clone(),
            top_senders,
        })
    }

    pub fn export<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let report = self.state.result(ANALYSIS, "export")?;
        export_sender_activity_csv(&report.activity, path.as_ref())?;
        self.state.mark_exported();
        Ok(())
    }
}

/// Competition ranking over rows already sorted by `event_count` descending:
/// equal counts share a rank and the next count's rank skips past them.
fn assign_min_ranks(sorted: &mut [SenderActivity]) {
    let mut rank = 0;
    let mut previous = None;
    for (idx, row) in sorted.iter_mut().enumerate() {
        if previous != Some(row.event_count) {
            rank = idx + 1;
            previous = Some(row.event_count);
        }
        row.rank_in_sender_activity = rank;
    }
}

fn sender_stats(activity: &[SenderActivity]) -> SenderStats {
    let counts: Vec<f64> = activity.iter().map(|a| a.event_count as f64).collect();
    SenderStats {
        total_senders: activity.len(),
        avg_events_per_sender: mean(&counts),
        median_events_per_sender: median(&counts),
        max_events_in_block: activity.iter().map(|a| a.event_count).max(),
        min_events_in_block: activity.iter().map(|a| a.event_count).min(),
    }
}

/// Runs the mapper once and returns the per-sender rows with their summary.
pub fn map_sender_activity(table: &EventTable) -> Result<(Vec<SenderActivity>, SenderSummary)> {
    let mut mapper = SenderMapper::new(table);
    let activity = mapper.map_sender_activity()?.to_vec();
    let summary = mapper.summary()?;
    Ok((activity, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sender: &str, event_count: usize) -> SenderActivity {
        SenderActivity {
            sender: sender.to_string(),
            block_number: 1,
            event_count,
            rank_in_sender_activity: 0,
        }
    }

    #[test]
    fn ranks_skip_after_ties() {
        let mut rows = vec![row("a", 5), row("b", 5), row("c", 3), row("d", 3), row("e", 1)];
        assign_min_ranks(&mut rows);
        let ranks: Vec<usize> = rows.iter().map(|r| r.rank_in_sender_activity).collect();
        assert_eq!(ranks, vec![1, 1, 3, 3, 5]);
    }
}
