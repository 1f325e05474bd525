//! Read side of the snapshot journal: newline-delimited JSON, one
//! snapshot per instrument per poll tick.
//!
//! The journal is append-only and written by exactly one collector
//! process; the append side lives in `labmon-agent`. Reconstruction
//! failures are record-local: a malformed line is dropped and counted,
//! never fatal to the run.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::types::Snapshot;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("malformed journal line: {0}")]
    Json(#[from] serde_json::Error),

    #[error("journal io error: {0}")]
    Io(#[from] io::Error),
}

/// Result of parsing a full journal.
#[derive(Debug, Default)]
pub struct ParsedJournal {
    pub snapshots: Vec<Snapshot>,
    /// Lines that failed to parse and were dropped.
    pub skipped: usize,
}

/// Parse a single journal line.
pub fn parse_line(line: &str) -> Result<Snapshot, JournalError> {
    Ok(serde_json::from_str(line)?)
}

/// Parse the whole journal text. Blank lines are ignored; malformed
/// records (invalid JSON or an unparsable timestamp) are counted and
/// dropped so one bad line never aborts a reconstruction run.
pub fn parse_journal(text: &str) -> ParsedJournal {
    let mut parsed = ParsedJournal::default();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(snapshot) => parsed.snapshots.push(snapshot),
            Err(_) => parsed.skipped += 1,
        }
    }
    parsed
}

/// Read and parse a journal file. A missing file is an empty journal,
/// not an error.
pub fn read_journal(path: &Path) -> Result<ParsedJournal, JournalError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(parse_journal(&text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ParsedJournal::default()),
        Err(e) => Err(e.into()),
    }
}
