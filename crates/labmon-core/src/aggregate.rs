//! Merges reconstructed sessions sharing a composite identity key into
//! one utilization report row per key.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::replay::round_hours;
use crate::types::{AggregatedUsage, UsageSession};

type GroupKey = (NaiveDate, String, Option<String>, Option<String>);

/// Group sessions by `(date, instrument, operator, method)`, summing
/// durations and widening each group's span to
/// `[min(start), max(end)]`. Key uniqueness is the only identity; the
/// first-seen session's sample name is retained for the group.
///
/// Output rows follow key order, so repeated runs over the same input
/// produce identical tables.
pub fn aggregate_sessions(sessions: &[UsageSession]) -> Vec<AggregatedUsage> {
    let mut groups: BTreeMap<GroupKey, AggregatedUsage> = BTreeMap::new();

    for session in sessions {
        let key = (
            session.date,
            session.instrument.clone(),
            session.operator.clone(),
            session.method.clone(),
        );
        match groups.entry(key) {
            Entry::Occupied(mut entry) => {
                let row = entry.get_mut();
                row.duration_hours += session.duration_hours;
                row.start = row.start.min(session.start);
                row.end = row.end.max(session.end);
            }
            Entry::Vacant(entry) => {
                entry.insert(AggregatedUsage {
                    date: session.date,
                    instrument: session.instrument.clone(),
                    operator: session.operator.clone(),
                    method: session.method.clone(),
                    sample: session.sample.clone(),
                    start: session.start,
                    end: session.end,
                    duration_hours: session.duration_hours,
                });
            }
        }
    }

    // Re-round the sums so float dust never leaks into the report.
    groups
        .into_values()
        .map(|mut row| {
            row.duration_hours = round_hours(row.duration_hours);
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, min, 0).unwrap()
    }

    fn session(
        instrument: &str,
        operator: &str,
        method: &str,
        sample: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        duration_hours: f64,
    ) -> UsageSession {
        UsageSession {
            date: start.date_naive(),
            instrument: instrument.to_string(),
            operator: Some(operator.to_string()),
            method: Some(method.to_string()),
            sample: Some(sample.to_string()),
            start,
            end,
            duration_hours,
        }
    }

    #[test]
    fn matching_keys_merge_into_one_row() {
        let sessions = vec![
            session("X", "U", "M", "S-a", at(9, 0), at(10, 0), 1.0),
            session("X", "U", "M", "S-b", at(14, 0), at(14, 30), 0.5),
        ];
        let rows = aggregate_sessions(&sessions);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.duration_hours, 1.5);
        assert_eq!(row.start, at(9, 0));
        assert_eq!(row.end, at(14, 30));
        // First-seen sample is retained, not recomputed.
        assert_eq!(row.sample.as_deref(), Some("S-a"));
    }

    #[test]
    fn differing_key_components_stay_separate() {
        let sessions = vec![
            session("X", "U", "M", "S", at(9, 0), at(10, 0), 1.0),
            session("X", "V", "M", "S", at(10, 0), at(11, 0), 1.0),
            session("X", "U", "N", "S", at(11, 0), at(12, 0), 1.0),
            session("Y", "U", "M", "S", at(12, 0), at(13, 0), 1.0),
        ];
        let rows = aggregate_sessions(&sessions);
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn sessions_on_different_days_stay_separate() {
        let day2 = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let mut second = session("X", "U", "M", "S", day2, day2, 1.0);
        second.end = day2 + chrono::Duration::hours(1);
        let sessions = vec![
            session("X", "U", "M", "S", at(9, 0), at(10, 0), 1.0),
            second,
        ];
        assert_eq!(aggregate_sessions(&sessions).len(), 2);
    }

    #[test]
    fn summed_duration_is_rounded() {
        let sessions = vec![
            session("X", "U", "M", "S", at(9, 0), at(9, 10), 0.17),
            session("X", "U", "M", "S", at(10, 0), at(10, 10), 0.17),
            session("X", "U", "M", "S", at(11, 0), at(11, 10), 0.17),
        ];
        let rows = aggregate_sessions(&sessions);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].duration_hours, 0.51);
    }

    #[test]
    fn missing_operator_and_method_group_together() {
        let mut a = session("X", "U", "M", "S", at(9, 0), at(10, 0), 1.0);
        a.operator = None;
        a.method = None;
        let mut b = session("X", "U", "M", "S", at(11, 0), at(12, 0), 1.0);
        b.operator = None;
        b.method = None;

        let rows = aggregate_sessions(&[a, b]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].duration_hours, 2.0);
    }

    #[test]
    fn empty_input_yields_empty_table() {
        assert!(aggregate_sessions(&[]).is_empty());
    }
}
