use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A reconstructed interval of continuous instrument use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSession {
    /// Day of the opening observation.
    pub date: NaiveDate,
    pub instrument: String,
    pub operator: Option<String>,
    pub method: Option<String>,
    pub sample: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Rounded to 2 decimals; always > 0 for emitted sessions.
    pub duration_hours: f64,
}

/// One utilization report row: every session sharing
/// `(date, instrument, operator, method)` merged together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedUsage {
    pub date: NaiveDate,
    pub instrument: String,
    pub operator: Option<String>,
    pub method: Option<String>,
    /// Sample name of the first-seen session in the merge group,
    /// retained as-is rather than recomputed.
    pub sample: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_hours: f64,
}
