use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::InstrumentState;

/// One observation of one instrument at one poll tick.
///
/// Journal lines serialize this struct directly, one JSON object per
/// line. Detail fields are non-null only when the instrument is
/// Running or PreRun. Snapshots are immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub state: InstrumentState,
    pub sample_name: Option<String>,
    pub full_user_name: Option<String>,
    pub acquisition_method: Option<String>,
}
