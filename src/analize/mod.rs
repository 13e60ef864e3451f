pub mod bonus;
pub mod orphans;
pub mod sender_map;
pub mod time_delta;

use crate::error::{AnalyzerError, Result};
use crate::models::GroupCount;
use std::collections::HashMap;

/// Lifecycle of one analyzer: nothing computed yet, a computed result, or a
/// computed result that has also been written out.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState<T> {
    Uninitialized,
    Computed(T),
    Exported(T),
}

impl<T> AnalysisState<T> {
    /// Borrows the result, or reports `operation` as called too early.
    pub fn result(&self, analysis: &'static str, operation: &'static str) -> Result<&T> {
        match self {
            AnalysisState::Computed(r) | AnalysisState::Exported(r) => Ok(r),
            AnalysisState::Uninitialized => Err(AnalyzerError::NotComputed {
                analysis,
                operation,
            }),
        }
    }

    pub fn is_computed(&self) -> bool {
        !matches!(self, AnalysisState::Uninitialized)
    }

    pub fn is_exported(&self) -> bool {
        matches!(self, AnalysisState::Exported(_))
    }

    /// Moves a computed result into `Exported`. No-op otherwise.
    pub(crate) fn mark_exported(&mut self) {
        *self = match std::mem::replace(self, AnalysisState::Uninitialized) {
            AnalysisState::Computed(r) => AnalysisState::Exported(r),
            other => other,
        };
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile(&sorted, 0.5)
}

/// Quantile `q` of ascending `sorted`, interpolating linearly between ranks.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Sample standard deviation; needs at least two values.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}

pub(crate) fn min_max(values: &[f64]) -> (Option<f64>, Option<f64>) {
    let min = values.iter().copied().min_by(|a, b| a.total_cmp(b));
    let max = values.iter().copied().max_by(|a, b| a.total_cmp(b));
    (min, max)
}

/// Counts non-null keys, most frequent first, ties by key. `limit` caps the list.
pub(crate) fn top_counts<'a, I>(keys: I, limit: Option<usize>) -> Vec<GroupCount>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in keys.into_iter().flatten() {
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut groups: Vec<GroupCount> = counts
        .into_iter()
        .map(|(key, count)| GroupCount {
            key: key.to_string(),
            count,
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

    if let Some(limit) = limit {
        groups.truncate(limit);
    }
    groups
}
