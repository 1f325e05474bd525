//! Session reconstruction: replays the snapshot journal through a
//! per-instrument state machine and emits closed usage sessions.
//!
//! The replay is a pure function of the journal contents. The pipeline
//! recomputes from scratch on every reporting request instead of
//! persisting sessions incrementally, so identical input must always
//! produce an identical session list.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{InstrumentState, Snapshot, UsageSession};

/// Heuristic constants for session reconstruction.
///
/// Short idle readings between polls are common measurement noise
/// around sample-to-sample transitions; the gap tolerance absorbs
/// them, while a longer gap means the instrument was genuinely
/// released. The defaults are the tuned production values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// A non-Running observation this many minutes (or less) after the
    /// last Running observation is treated as a transient blip; a
    /// strictly larger gap closes the session.
    pub idle_gap_minutes: i64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { idle_gap_minutes: 10 }
    }
}

/// Tracked state for one instrument's in-progress session. Operator,
/// method and sample are captured from the opening Running observation.
struct OpenSession {
    date: NaiveDate,
    instrument: String,
    operator: Option<String>,
    method: Option<String>,
    sample: Option<String>,
    start: DateTime<Utc>,
}

/// Round a duration in hours to 2 decimals.
pub(crate) fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Close a session at `close_at`. Sessions whose rounded duration is
/// zero are discarded, not emitted.
fn close_session(open: OpenSession, close_at: DateTime<Utc>) -> Option<UsageSession> {
    let seconds = close_at.signed_duration_since(open.start).num_seconds();
    let duration_hours = round_hours(seconds as f64 / 3600.0);
    if duration_hours <= 0.0 {
        return None;
    }
    Some(UsageSession {
        date: open.date,
        instrument: open.instrument,
        operator: open.operator,
        method: open.method,
        sample: open.sample,
        start: open.start,
        end: close_at,
        duration_hours,
    })
}

/// Reconstruct usage sessions from the full snapshot journal.
///
/// Records are sorted ascending by timestamp (the collector writes in
/// order, but the journal is not trusted to be ordered) and partitioned
/// by instrument name. Each instrument's subsequence is replayed
/// independently, so cross-instrument interleaving in the journal never
/// affects the outcome for any single instrument.
pub fn reconstruct_sessions(snapshots: &[Snapshot], config: &ReplayConfig) -> Vec<UsageSession> {
    let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);

    let mut by_instrument: BTreeMap<&str, Vec<&Snapshot>> = BTreeMap::new();
    for snapshot in ordered {
        by_instrument
            .entry(snapshot.name.as_str())
            .or_default()
            .push(snapshot);
    }

    let mut sessions = Vec::new();
    for stream in by_instrument.into_values() {
        replay_instrument(&stream, config, &mut sessions);
    }
    sessions
}

/// Replay one instrument's time-ordered observations.
fn replay_instrument(stream: &[&Snapshot], config: &ReplayConfig, out: &mut Vec<UsageSession>) {
    let idle_gap = Duration::minutes(config.idle_gap_minutes);
    let mut open: Option<OpenSession> = None;
    let mut last_running_at: Option<DateTime<Utc>> = None;

    for snapshot in stream {
        match snapshot.state {
            InstrumentState::Running => {
                if open.is_none() {
                    open = Some(OpenSession {
                        date: snapshot.timestamp.date_naive(),
                        instrument: snapshot.name.clone(),
                        operator: snapshot.full_user_name.clone(),
                        method: snapshot.acquisition_method.clone(),
                        sample: snapshot.sample_name.clone(),
                        start: snapshot.timestamp,
                    });
                }
                // The only state that advances last_running_at.
                last_running_at = Some(snapshot.timestamp);
            }
            // PreRun is pure noise: it neither opens, closes, nor
            // extends a session.
            InstrumentState::PreRun => {}
            InstrumentState::Idle
            | InstrumentState::NotReady
            | InstrumentState::NotConnected => {
                // A session can only be open after at least one Running
                // observation set last_running_at.
                let Some(last_running) = last_running_at else {
                    continue;
                };
                if open.is_none() {
                    continue;
                }
                let gap = snapshot.timestamp.signed_duration_since(last_running);
                if gap <= idle_gap {
                    // Transient blip between polls; the session stays open.
                    continue;
                }
                // The instrument was genuinely released: close at the
                // last Running observation, not at this one.
                if let Some(session) = open.take() {
                    out.extend(close_session(session, last_running));
                }
                last_running_at = None;
            }
        }
    }

    // End of stream: a still-open session closes at the last Running
    // observation, never at the time of the final journal entry.
    if let (Some(session), Some(last_running)) = (open, last_running_at) {
        out.extend(close_session(session, last_running));
    }
}
