/// # Modules Overview
///
/// This crate analyzes a CSV log of blockchain contract events: it loads the log
/// into an in-memory table, runs four independent analyses over it (orphan
/// events, per-sender block clustering, per-contract time deltas and bot/data
/// quality heuristics) and writes each result to a CSV file.

/// `analize`
///
/// The four analyzers. Each one borrows the loaded `EventTable`, computes its
/// result once, then serves summaries and exports from that result:
/// * `orphans::OrphanDetector` – events whose predecessor id is not in the log.
/// * `sender_map::SenderMapper` – each sender's busiest block, ranked.
/// * `time_delta::TimeDeltaCalculator` – seconds between a contract's events.
/// * `bonus::BonusAnalyzer` – bot-like senders and data-quality issues.
///
/// Calling a summary or export before the compute step returns
/// `AnalyzerError::NotComputed`.
///
/// Example usage:
/// ```rust,ignore
/// let mut detector = analize::orphans::OrphanDetector::new(&table);
/// detector.find_orphan_events()?;
/// let summary = detector.summary()?;
/// detector.export("outputs/task1_orphan_events.csv")?;
/// ```
pub mod analize;

pub mod config;

/// `csv`
///
/// Writers for the analysis artifacts. Parent directories are created on demand
/// and the header row is written even for empty results.
pub mod csv;

pub mod error;

/// `loader`
///
/// Reads the events log with typed columns: nullable text, nullable integers for
/// `block_number`, `gas_used` and `tx_index`, and a parsed `block_timestamp`.
///
/// Example usage:
/// ```rust,ignore
/// let table = loader::load_contract_events("data/contract_events.csv")?;
/// ```
pub mod loader;

/// `models`
///
/// Core data structures:
/// * `EventRecord` / `EventTable` – one log row and the loaded log.
/// * `Column` – the known log columns and their header names.
/// * Result rows (`OrphanEvent`, `SenderActivity`, `TimeDelta`, `BotBehavior`,
///   `DataIssue`, `BonusRow`) and the per-analysis stats and summaries.
pub mod models;

pub use analize::bonus::{analyze_bonus, BonusAnalyzer};
pub use analize::orphans::{find_orphan_events, OrphanDetector};
pub use analize::sender_map::{map_sender_activity, SenderMapper};
pub use analize::time_delta::{calculate_time_deltas, TimeDeltaCalculator};
pub use analize::AnalysisState;
pub use error::{AnalyzerError, Result};
pub use loader::load_contract_events;
pub use models::{EventRecord, EventTable};
