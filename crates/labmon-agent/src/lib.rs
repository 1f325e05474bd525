//! Collection agent: the authenticated poll client, the single-flight
//! background collector, the journal writer, and the reporting entry
//! points that hand reconstructed usage data to callers.

pub mod client;
pub mod collector;
pub mod journal;
pub mod report;
pub mod transport;
