//! Append-only session history.
//!
//! Each processed worry is appended to a JSON-lines file as a
//! [`HistoryEntry`] with an RFC 3339 timestamp. The log is write-once: the
//! pipeline never mutates old entries, and loading tolerates a missing
//! file. This is a run log, not conversation state — nothing is fed back
//! into prompts.

use crate::chain::WorryReport;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One logged run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// RFC 3339 timestamp of when the run completed.
    pub timestamp: String,
    pub report: WorryReport,
}

/// Handle to an append-only JSONL history file.
#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one report as a single JSON line. Creates the file (and
    /// parent directory) on first use.
    pub fn append(&self, report: &WorryReport) -> Result<(), String> {
        let entry = HistoryEntry {
            timestamp: Utc::now().to_rfc3339(),
            report: report.clone(),
        };
        let line = serde_json::to_string(&entry)
            .map_err(|e| format!("failed to serialize history entry: {e}"))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create history directory: {e}"))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| format!("failed to open history file: {e}"))?;
        writeln!(file, "{line}").map_err(|e| format!("failed to write history entry: {e}"))?;

        debug!("appended history entry to {}", self.path.display());
        Ok(())
    }

    /// Load all entries. A missing file is an empty history; a corrupt
    /// line is an error (the file is ours alone to write).
    pub fn load(&self) -> Result<Vec<HistoryEntry>, String> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)
            .map_err(|e| format!("failed to read history file: {e}"))?;
        data.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| format!("corrupt history line: {e}"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ReportMetadata;

    fn sample_report(worry: &str) -> WorryReport {
        WorryReport {
            worry: worry.to_string(),
            overthinker: "doom".into(),
            therapist: "calm".into(),
            executive: "verdict".into(),
            metadata: ReportMetadata {
                model: "test-model".into(),
                mode: "sequential".into(),
                stage_sequence: vec!["Overthinker".into(), "Therapist".into(), "Executive".into()],
                elapsed_ms: 42,
                prompt_tokens: 10,
                completion_tokens: 20,
            },
        }
    }

    #[test]
    fn append_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let history = History::new(dir.path().join("history.jsonl"));

        history.append(&sample_report("first")).unwrap();
        history.append(&sample_report("second")).unwrap();

        let entries = history.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].report.worry, "first");
        assert_eq!(entries[1].report.worry, "second");
        assert!(!entries[0].timestamp.is_empty());
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = History::new(dir.path().join("nonexistent.jsonl"));
        assert!(history.load().unwrap().is_empty());
    }

    #[test]
    fn append_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let history = History::new(dir.path().join("logs").join("history.jsonl"));
        history.append(&sample_report("w")).unwrap();
        assert_eq!(history.load().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        std::fs::write(&path, "not json\n").unwrap();
        assert!(History::new(&path).load().is_err());
    }
}
