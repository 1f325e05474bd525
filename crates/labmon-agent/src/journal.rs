//! Append-only snapshot journal writer.
//!
//! One JSON object per line, one line per instrument per poll. The
//! reconstructor in `labmon-core` reads the same file back; the writer
//! never truncates or rewrites existing lines.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use labmon_core::journal::JournalError;
use labmon_core::types::Snapshot;

pub struct JournalWriter {
    path: PathBuf,
}

impl JournalWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line per snapshot and flush.
    pub fn append(&self, snapshots: &[Snapshot]) -> Result<(), JournalError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        for snapshot in snapshots {
            let line = serde_json::to_string(snapshot)?;
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
        self.sync(writer.into_inner().map_err(|e| e.into_error())?)
    }

    fn sync(&self, file: File) -> Result<(), JournalError> {
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use labmon_core::journal::read_journal;
    use labmon_core::types::{InstrumentState, Snapshot};

    use super::*;

    fn snapshot(name: &str, state: InstrumentState) -> Snapshot {
        Snapshot {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            name: name.to_string(),
            state,
            sample_name: None,
            full_user_name: None,
            acquisition_method: None,
        }
    }

    #[test]
    fn written_lines_read_back_through_core() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.ndjson");
        let writer = JournalWriter::new(&path);

        writer
            .append(&[
                snapshot("GC-01", InstrumentState::Running),
                snapshot("HPLC-2", InstrumentState::Idle),
            ])
            .unwrap();

        let parsed = read_journal(&path).unwrap();
        assert_eq!(parsed.snapshots.len(), 2);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.snapshots[0].name, "GC-01");
    }

    #[test]
    fn append_extends_rather_than_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.ndjson");
        let writer = JournalWriter::new(&path);

        writer.append(&[snapshot("GC-01", InstrumentState::Running)]).unwrap();
        writer.append(&[snapshot("GC-01", InstrumentState::Idle)]).unwrap();

        let parsed = read_journal(&path).unwrap();
        assert_eq!(parsed.snapshots.len(), 2);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/journal.ndjson");
        let writer = JournalWriter::new(&path);

        writer.append(&[snapshot("GC-01", InstrumentState::Running)]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_batch_still_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.ndjson");
        JournalWriter::new(&path).append(&[]).unwrap();
        assert!(path.exists());
    }
}
