//! Background collector: drives the poll client on a fixed interval
//! and appends one snapshot per instrument to the journal.
//!
//! At most one collection cycle is in flight at a time. The cycle
//! state sits behind a `try_lock`ed mutex; a tick (or a manual
//! trigger) that arrives while a cycle is running is skipped, not
//! queued.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;

use labmon_core::types::Snapshot;

use crate::client::{ClientError, PollClient};
use crate::journal::JournalWriter;
use crate::transport::{InstrumentDto, SchedulerTransport};

#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("journal append failed: {0}")]
    Journal(#[from] labmon_core::journal::JournalError),
}

/// What a collection attempt did.
#[derive(Debug, PartialEq, Eq)]
pub enum CollectOutcome {
    /// A cycle ran and appended this many snapshots.
    Collected(usize),
    /// Another cycle was already in flight; nothing was done.
    Skipped,
}

struct CycleState<T> {
    client: PollClient<T>,
    writer: JournalWriter,
}

pub struct Collector<T> {
    state: Mutex<CycleState<T>>,
    interval: Duration,
}

impl<T: SchedulerTransport> Collector<T> {
    pub fn new(client: PollClient<T>, writer: JournalWriter, interval: Duration) -> Self {
        Self {
            state: Mutex::new(CycleState { client, writer }),
            interval,
        }
    }

    /// Poll on the configured interval until the task is dropped.
    ///
    /// A failed cycle is logged and does not stop the loop; the next
    /// tick retries from scratch (including re-authentication if the
    /// token was cleared).
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.collect_now().await {
                Ok(CollectOutcome::Collected(count)) => {
                    tracing::info!(snapshots = count, "collection cycle complete");
                }
                Ok(CollectOutcome::Skipped) => {
                    tracing::debug!("collection cycle already in flight, skipping tick");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "collection cycle failed");
                }
            }
        }
    }

    /// Run one collection cycle now, unless one is already in flight.
    pub async fn collect_now(&self) -> Result<CollectOutcome, CycleError> {
        let Ok(mut state) = self.state.try_lock() else {
            return Ok(CollectOutcome::Skipped);
        };

        let instruments = state.client.fetch_instruments().await?;
        tracing::debug!(
            instruments = instruments.len(),
            queued = total_queued(&instruments),
            "polled scheduler"
        );

        let now = Utc::now();
        let snapshots: Vec<Snapshot> = instruments
            .iter()
            .map(|dto| snapshot_from_dto(dto, now))
            .collect();
        state.writer.append(&snapshots)?;
        Ok(CollectOutcome::Collected(snapshots.len()))
    }
}

/// Scheduler-wide queue depth across all instruments. Widened to u64
/// so untrusted per-instrument counts can never overflow the sum.
fn total_queued(instruments: &[InstrumentDto]) -> u64 {
    instruments
        .iter()
        .filter_map(|dto| dto.workload.as_ref())
        .filter_map(|w| w.total_queued_analyses)
        .map(u64::from)
        .sum()
}

/// Turn a scheduler instrument into a journal snapshot. Detail fields
/// are carried only for states that have an active or pending run.
fn snapshot_from_dto(dto: &InstrumentDto, timestamp: chrono::DateTime<Utc>) -> Snapshot {
    let state = dto.state.state;
    let run = if state.has_run_details() {
        dto.current_run.as_ref()
    } else {
        None
    };
    Snapshot {
        timestamp,
        name: dto.name.clone(),
        state,
        sample_name: run.and_then(|r| r.sample_name.clone()),
        full_user_name: run.and_then(|r| r.full_user_name.clone()),
        acquisition_method: run.and_then(|r| r.acquisition_method.clone()),
    }
}
