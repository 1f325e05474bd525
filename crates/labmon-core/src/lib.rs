//! Pure telemetry core: the snapshot data model, journal parsing, and
//! the session reconstruction/aggregation algorithms.
//!
//! Everything here is synchronous and allocation-only over an in-memory
//! copy of the journal, so multiple readers may reconstruct concurrently
//! without locking. The collection side lives in `labmon-agent`.

pub mod aggregate;
pub mod journal;
pub mod replay;
pub mod types;
