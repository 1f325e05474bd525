use serde::{Deserialize, Serialize};

/// Instrument state as reported by the scheduler service.
///
/// Serialized as the exact PascalCase strings the service and the
/// snapshot journal use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentState {
    Running,
    PreRun,
    Idle,
    NotReady,
    NotConnected,
}

impl InstrumentState {
    /// True for the states that carry run detail fields (sample name,
    /// operator, acquisition method).
    pub fn has_run_details(self) -> bool {
        matches!(self, Self::Running | Self::PreRun)
    }
}
