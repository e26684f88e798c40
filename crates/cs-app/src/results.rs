use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// One row of the persistent results table.
#[derive(Debug, Serialize)]
pub struct TrialRecord {
    pub trial_id: usize,
    /// "A" (stationary control) or "B" (swept).
    pub condition: String,
    /// Nominal chirp rate in Hz/s (jitter excluded).
    pub chirp_rate: f64,
    /// Trial-level mean |ρ| summary.
    pub rho_mean_abs: f64,
    /// RFC 3339 completion time.
    pub timestamp: String,
}

/// Append-only CSV sink for trial results.
///
/// The header row is written only when the file is created; existing rows
/// are never disturbed, so interrupted experiments can be resumed against
/// the same file.
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Append one record, creating the file (with header) on first use.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or written.
    pub fn append(&self, record: &TrialRecord) -> Result<()> {
        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("cannot open results file {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record([
                "trial_id",
                "condition",
                "chirp_rate",
                "rho_mean_abs",
                "timestamp",
            ])?;
        }
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(trial_id: usize, rho: f64) -> TrialRecord {
        TrialRecord {
            trial_id,
            condition: "B".into(),
            chirp_rate: 500.0,
            rho_mean_abs: rho,
            timestamp: "2026-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn header_written_once_and_rows_appended() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("results.csv");
        let results = ResultsLog::new(&path);

        results.append(&record(1, 0.91))?;
        results.append(&record(2, 0.07))?;

        let content = std::fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "trial_id,condition,chirp_rate,rho_mean_abs,timestamp"
        );
        assert!(lines[1].starts_with("1,B,500"));
        assert!(lines[2].starts_with("2,B,500"));
        Ok(())
    }

    #[test]
    fn existing_rows_are_preserved() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("results.csv");
        std::fs::write(
            &path,
            "trial_id,condition,chirp_rate,rho_mean_abs,timestamp\n7,A,0.0,0.01,t0\n",
        )?;

        ResultsLog::new(&path).append(&record(8, 0.5))?;

        let content = std::fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("7,A"));
        assert!(lines[2].starts_with("8,B"));
        Ok(())
    }
}
