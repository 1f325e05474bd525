mod session;
mod snapshot;
mod state;

pub use session::{AggregatedUsage, UsageSession};
pub use snapshot::Snapshot;
pub use state::InstrumentState;
