use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use event_analyzer::config::{
    BONUS_OUTPUT, DEFAULT_INPUT, ORPHANS_OUTPUT, SENDER_ACTIVITY_OUTPUT, TIME_DELTAS_OUTPUT, TOP_N,
};
use event_analyzer::models::{
    BonusSummary, BotBehavior, IssueType, OrphanEvent, OrphanSummary, SenderSummary,
    TimeDeltaSummary,
};
use event_analyzer::{
    load_contract_events, BonusAnalyzer, EventTable, OrphanDetector, Result, SenderMapper,
    TimeDeltaCalculator,
};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Parser, Debug)]
#[command(name = "event-analyzer")]
#[command(about = "Data-quality and behavior analysis for contract event logs")]
#[command(version)]
struct Cli {
    /// Contract events CSV.
    #[arg(long, global = true, default_value = DEFAULT_INPUT)]
    input: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Events whose previous_event_id does not exist in the log.
    Orphans(OutputArgs),
    /// Busiest block per sender, ranked.
    Senders(OutputArgs),
    /// Seconds between consecutive events of each contract.
    TimeDeltas(OutputArgs),
    /// Bot-like senders and data-quality issues.
    Bonus(OutputArgs),
    /// Every analysis over a single load, written to the default outputs.
    All,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Destination CSV; defaults to the analysis' file under outputs/.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl OutputArgs {
    fn path_or(&self, default: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(default))
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let table = load_contract_events(&cli.input)?;

    match cli.command {
        Commands::Orphans(args) => {
            let (orphans, summary) = run_orphans(&table, &args.path_or(ORPHANS_OUTPUT))?;
            print_orphans(&orphans);
            report("Orphan Event Detection", &summary)?;
        }
        Commands::Senders(args) => {
            let summary = run_senders(&table, &args.path_or(SENDER_ACTIVITY_OUTPUT))?;
            print_top_senders(&summary);
            report("Sender Activity Mapping", &summary)?;
        }
        Commands::TimeDeltas(args) => {
            let summary = run_time_deltas(&table, &args.path_or(TIME_DELTAS_OUTPUT))?;
            report("Time Delta Calculation", &summary)?;
        }
        Commands::Bonus(args) => {
            let (behavior, summary) = run_bonus(&table, &args.path_or(BONUS_OUTPUT))?;
            print_bonus(&behavior, &summary);
            report("Bot Behavior and Data Quality", &summary)?;
        }
        Commands::All => {
            let table = Arc::new(table);
            let (orphans, senders, deltas, bonus) = tokio::try_join!(
                spawn_analysis(&table, ORPHANS_OUTPUT, run_orphans),
                spawn_analysis(&table, SENDER_ACTIVITY_OUTPUT, run_senders),
                spawn_analysis(&table, TIME_DELTAS_OUTPUT, run_time_deltas),
                spawn_analysis(&table, BONUS_OUTPUT, run_bonus),
            )?;

            let (orphans, orphan_summary) = orphans?;
            print_orphans(&orphans);
            report("Orphan Event Detection", &orphan_summary)?;

            let senders = senders?;
            print_top_senders(&senders);
            report("Sender Activity Mapping", &senders)?;

            report("Time Delta Calculation", &deltas?)?;

            let (behavior, bonus_summary) = bonus?;
            print_bonus(&behavior, &bonus_summary);
            report("Bot Behavior and Data Quality", &bonus_summary)?;
        }
    }

    Ok(())
}

fn spawn_analysis<T, F>(table: &Arc<EventTable>, output: &'static str, run: F) -> JoinHandle<Result<T>>
where
    T: Send + 'static,
    F: FnOnce(&EventTable, &Path) -> Result<T> + Send + 'static,
{
    let table = Arc::clone(table);
    tokio::task::spawn_blocking(move || run(&table, Path::new(output)))
}

fn run_orphans(table: &EventTable, output: &Path) -> Result<(Vec<OrphanEvent>, OrphanSummary)> {
    let mut detector = OrphanDetector::new(table);
    let orphans = detector.find_orphan_events()?.to_vec();
    detector.export(output)?;
    Ok((orphans, detector.summary()?))
}

fn run_senders(table: &EventTable, output: &Path) -> Result<SenderSummary> {
    let mut mapper = SenderMapper::new(table);
    mapper.map_sender_activity()?;
    mapper.export(output)?;
    mapper.summary()
}

fn run_time_deltas(table: &EventTable, output: &Path) -> Result<TimeDeltaSummary> {
    let mut calculator = TimeDeltaCalculator::new(table);
    calculator.calculate_time_deltas()?;
    calculator.export(output)?;
    calculator.summary()
}

fn run_bonus(table: &EventTable, output: &Path) -> Result<(Vec<BotBehavior>, BonusSummary)> {
    let mut analyzer = BonusAnalyzer::new(table);
    let behavior = analyzer.detect_bot_behavior()?.to_vec();
    analyzer.detect_data_issues()?;
    analyzer.export(output)?;
    Ok((behavior, analyzer.summary()?))
}

fn cell<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(header);
    table
}

fn print_orphans(orphans: &[OrphanEvent]) {
    println!("Orphan events ({}):", orphans.len());
    let mut table = new_table(OrphanEvent::HEADER.to_vec());
    for o in orphans {
        table.add_row(vec![
            cell(&o.event_id),
            cell(&o.previous_event_id),
            cell(&o.contract_address),
            cell(&o.event_type),
            cell(&o.block_number),
        ]);
    }
    println!("{}\n", table);
}

fn print_top_senders(summary: &SenderSummary) {
    println!("Top senders:");
    let mut table = new_table(vec!["sender", "event_count", "rank"]);
    for s in &summary.top_senders {
        table.add_row(vec![
            s.sender.clone(),
            s.event_count.to_string(),
            s.rank_in_sender_activity.to_string(),
        ]);
    }
    println!("{}\n", table);
}

fn print_bonus(behavior: &[BotBehavior], summary: &BonusSummary) {
    println!("Bot-like Behavior (Top {}):", TOP_N);
    let mut bots = new_table(vec![
        "sender",
        "event_count",
        "avg_time_between_events",
        "is_bot_like",
    ]);
    for b in behavior.iter().take(TOP_N) {
        bots.add_row(vec![
            b.sender.clone(),
            b.event_count.to_string(),
            b.avg_time_between_events
                .map(|gap| format!("{:.2}", gap))
                .unwrap_or_default(),
            b.is_bot_like.to_string(),
        ]);
    }
    println!("{}\n", bots);

    println!("Data Quality Issues:");
    let mut issues = new_table(vec!["column", "issue_type", "count"]);
    for i in &summary.data_issues {
        let issue_type = match i.issue_type {
            IssueType::Missing => "missing",
            IssueType::InvalidReorgedChain => "invalid_reorged_chain",
        };
        issues.add_row(vec![i.column.clone(), issue_type.to_string(), i.count.to_string()]);
    }
    println!("{}\n", issues);
}

fn report<S: Serialize>(title: &str, summary: &S) -> serde_json::Result<()> {
    info!("{} finished", title);
    println!("{} Results:", title);
    println!("{}\n", serde_json::to_string_pretty(summary)?);
    Ok(())
}
