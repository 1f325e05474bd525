//! Reporting entry points: read the journal, reconstruct sessions,
//! aggregate, and render plain-text tables for the CLI.

use std::path::Path;

use labmon_core::aggregate::aggregate_sessions;
use labmon_core::journal::{read_journal, JournalError};
use labmon_core::replay::{reconstruct_sessions, ReplayConfig};
use labmon_core::types::{AggregatedUsage, UsageSession};

/// Reconstruct all closed sessions from the journal at `path`.
pub fn load_sessions(path: &Path, config: &ReplayConfig) -> Result<Vec<UsageSession>, JournalError> {
    let parsed = read_journal(path)?;
    if parsed.skipped > 0 {
        tracing::warn!(
            skipped = parsed.skipped,
            journal = %path.display(),
            "dropped malformed journal lines"
        );
    }
    Ok(reconstruct_sessions(&parsed.snapshots, config))
}

/// Reconstruct and aggregate in one pass.
pub fn load_report(path: &Path, config: &ReplayConfig) -> Result<Vec<AggregatedUsage>, JournalError> {
    let sessions = load_sessions(path, config)?;
    Ok(aggregate_sessions(&sessions))
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

pub fn format_sessions(sessions: &[UsageSession]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:<16} {:<20} {:<16} {:<16} {:>8}\n",
        "DATE", "INSTRUMENT", "OPERATOR", "METHOD", "SAMPLE", "HOURS"
    ));
    for session in sessions {
        out.push_str(&format!(
            "{:<12} {:<16} {:<20} {:<16} {:<16} {:>8.2}\n",
            session.date,
            session.instrument,
            or_dash(&session.operator),
            or_dash(&session.method),
            or_dash(&session.sample),
            session.duration_hours,
        ));
    }
    out
}

pub fn format_report(rows: &[AggregatedUsage]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:<16} {:<20} {:<16} {:>8}\n",
        "DATE", "INSTRUMENT", "OPERATOR", "METHOD", "HOURS"
    ));
    for row in rows {
        out.push_str(&format!(
            "{:<12} {:<16} {:<20} {:<16} {:>8.2}\n",
            row.date,
            row.instrument,
            or_dash(&row.operator),
            or_dash(&row.method),
            row.duration_hours,
        ));
    }
    out
}
