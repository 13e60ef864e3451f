use crate::analize::time_delta::seconds_between;
use crate::analize::{mean, min_max, quantile, sample_std, AnalysisState};
use crate::config::{BOT_MAX_AVG_GAP_SECS, BOT_MIN_EVENTS, REORGED_STATUS};
use crate::csv::export_bonus_csv;
use crate::error::Result;
use crate::models::{
    BonusRow, BonusSummary, BotBehavior, Column, DataIssue, Describe, EventTable, IssueType,
};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

const ANALYSIS: &str = "bonus analysis";

#[derive(Default)]
struct SenderAcc {
    count: usize,
    last: Option<DateTime<Utc>>,
    gap_sum: f64,
    gaps: usize,
}

/// Bot-likeness heuristics per sender plus a scan for data-quality issues.
pub struct BonusAnalyzer<'a> {
    table: &'a EventTable,
    bot_behavior: AnalysisState<Vec<BotBehavior>>,
    data_issues: AnalysisState<Vec<DataIssue>>,
}

impl<'a> BonusAnalyzer<'a> {
    pub fn new(table: &'a EventTable) -> Self {
        BonusAnalyzer {
            table,
            bot_behavior: AnalysisState::Uninitialized,
            data_issues: AnalysisState::Uninitialized,
        }
    }

    /// Gaps are taken between a sender's rows in table order, so an unsorted
    /// log can produce negative gaps. A gap next to a null timestamp is skipped.
    pub fn detect_bot_behavior(&mut self) -> Result<&[BotBehavior]> {
        self.table.require(
            ANALYSIS,
            &[Column::Sender, Column::BlockTimestamp, Column::EventId],
        )?;

        let mut order: Vec<&str> = Vec::new();
        let mut per_sender: HashMap<&str, SenderAcc> = HashMap::new();
        for record in &self.table.records {
            let Some(sender) = record.sender.as_deref() else {
                continue;
            };
            let acc = per_sender.entry(sender).or_insert_with(|| {
                order.push(sender);
                SenderAcc::default()
            });

            if acc.count > 0 {
                if let (Some(from), Some(to)) = (acc.last, record.block_timestamp) {
                    acc.gap_sum += seconds_between(from, to);
                    acc.gaps += 1;
                }
            }
            acc.count += 1;
            acc.last = record.block_timestamp;
        }

        let mut behavior: Vec<BotBehavior> = order
            .into_iter()
            .filter_map(|sender| per_sender.get(sender).map(|acc| (sender, acc)))
            .map(|(sender, acc)| {
                let avg_time_between_events = if acc.gaps > 0 {
                    Some(acc.gap_sum / acc.gaps as f64)
                } else {
                    None
                };
                BotBehavior {
                    sender: sender.to_string(),
                    event_count: acc.count,
                    avg_time_between_events,
                    is_bot_like: is_bot_like(acc.count, avg_time_between_events),
                }
            })
            .collect();
        behavior.sort_by(|a, b| {
            b.event_count
                .cmp(&a.event_count)
                .then_with(|| a.sender.cmp(&b.sender))
        });

        let flagged = behavior.iter().filter(|b| b.is_bot_like).count();
        if flagged > 0 {
            warn!("{} of {} senders look bot-like", flagged, behavior.len());
        } else {
            info!("No bot-like senders among {}", behavior.len());
        }

        self.bot_behavior = AnalysisState::Computed(behavior);
        self.bot_behavior().map(|b| b.as_slice())
    }

    pub fn detect_data_issues(&mut self) -> Result<&[DataIssue]> {
        let mut issues: Vec<DataIssue> = self
            .table
            .null_counts()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(column, count)| DataIssue {
                column: column.to_string(),
                issue_type: IssueType::Missing,
                count,
            })
            .collect();

        if self.table.has_column(Column::Status) && self.table.has_column(Column::PreviousEventId) {
            let count = self
                .table
                .records
                .iter()
                .filter(|r| r.status.as_deref() == Some(REORGED_STATUS) && r.previous_event_id.is_some())
                .count();
            if count > 0 {
                issues.push(DataIssue {
                    column: Column::Status.name().to_string(),
                    issue_type: IssueType::InvalidReorgedChain,
                    count,
                });
            }
        }

        info!("Found {} data issues", issues.len());
        self.data_issues = AnalysisState::Computed(issues);
        self.data_issues().map(|i| i.as_slice())
    }

    pub fn bot_behavior(&self) -> Result<&Vec<BotBehavior>> {
        self.bot_behavior.result(ANALYSIS, "bot_behavior")
    }

    pub fn data_issues(&self) -> Result<&Vec<DataIssue>> {
        self.data_issues.result(ANALYSIS, "data_issues")
    }

    pub fn summary(&self) -> Result<BonusSummary> {
        let behavior = self.bot_behavior.result(ANALYSIS, "summary")?;
        let issues = self.data_issues.result(ANALYSIS, "summary")?;

        let counts: Vec<f64> = behavior.iter().map(|b| b.event_count as f64).collect();
        let gaps: Vec<f64> = behavior
            .iter()
            .filter_map(|b| b.avg_time_between_events)
            .collect();

        Ok(BonusSummary {
            bot_like_senders: behavior.iter().filter(|b| b.is_bot_like).count(),
            event_count: describe(&counts),
            avg_time_between_events: describe(&gaps),
            data_issues: issues.clone(),
        })
    }

    /// Bot rows followed by issue rows, each tagged with its analysis type.
    pub fn combined_rows(&self) -> Result<Vec<BonusRow>> {
        let behavior = self.bot_behavior.result(ANALYSIS, "export")?;
        let issues = self.data_issues.result(ANALYSIS, "export")?;

        Ok(behavior
            .iter()
            .map(BonusRow::from)
            .chain(issues.iter().map(BonusRow::from))
            .collect())
    }

    pub fn export<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let rows = self.combined_rows()?;
        export_bonus_csv(&rows, path.as_ref())?;
        self.bot_behavior.mark_exported();
        self.data_issues.mark_exported();
        Ok(())
    }
}

fn is_bot_like(event_count: usize, avg_gap: Option<f64>) -> bool {
    event_count > BOT_MIN_EVENTS && avg_gap.map_or(false, |gap| gap < BOT_MAX_AVG_GAP_SECS)
}

fn describe(values: &[f64]) -> Describe {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let (min, max) = min_max(values);

    Describe {
        count: values.len(),
        mean: mean(values),
        std: sample_std(values),
        min,
        p25: quantile(&sorted, 0.25),
        p50: quantile(&sorted, 0.5),
        p75: quantile(&sorted, 0.75),
        max,
    }
}

/// Runs both detections and returns the per-sender rows with the combined summary.
pub fn analyze_bonus(table: &EventTable) -> Result<(Vec<BotBehavior>, BonusSummary)> {
    let mut analyzer = BonusAnalyzer::new(table);
    let behavior = analyzer.detect_bot_behavior()?.to_vec();
    analyzer.detect_data_issues()?;
    let summary = analyzer.summary()?;
    Ok((behavior, summary))
}
