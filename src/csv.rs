use crate::error::Result;
use crate::models::{BonusRow, OrphanEvent, SenderActivity, TimeDelta};
use csv::Writer;
use log::info;
use serde::Serialize;
use std::{fs, path::Path};

/// Writes `rows` to `path`, creating missing parent directories. The header
/// is written even when there are no rows.
pub fn write_rows<T: Serialize>(rows: &[T], header: &[&str], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut wtr = Writer::from_path(path)?;
    if rows.is_empty() {
        wtr.write_record(header)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn export_orphan_events_csv(orphans: &[OrphanEvent], path: &Path) -> Result<()> {
    write_rows(orphans, &OrphanEvent::HEADER, path)
}

pub fn export_sender_activity_csv(activity: &[SenderActivity], path: &Path) -> Result<()> {
    write_rows(activity, &SenderActivity::HEADER, path)
}

pub fn export_time_deltas_csv(deltas: &[TimeDelta], path: &Path) -> Result<()> {
    write_rows(deltas, &TimeDelta::HEADER, path)
}

pub fn export_bonus_csv(rows: &[BonusRow], path: &Path) -> Result<()> {
    write_rows(rows, &BonusRow::HEADER, path)
}
