/// Input file read when no `--input` is given.
pub const DEFAULT_INPUT: &str = "data/contract_events.csv";

pub const ORPHANS_OUTPUT: &str = "outputs/task1_orphan_events.csv";
pub const SENDER_ACTIVITY_OUTPUT: &str = "outputs/sender_activity.csv";
pub const TIME_DELTAS_OUTPUT: &str = "outputs/time_deltas.csv";
pub const BONUS_OUTPUT: &str = "outputs/bonus_analysis.csv";

/// A sender needs strictly more events than this to be considered bot-like.
pub const BOT_MIN_EVENTS: usize = 100;
/// ...and an average gap strictly below this many seconds.
pub const BOT_MAX_AVG_GAP_SECS: f64 = 10.0;

/// Size of every "top" list in the summaries.
pub const TOP_N: usize = 10;

pub const REORGED_STATUS: &str = "Reorged";

/// Cell values read as null, on top of the empty cell.
pub const NA_VALUES: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];
