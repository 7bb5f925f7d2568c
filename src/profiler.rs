//! Lightweight execution profiler.
//!
//! A [`Profiler`] measures wall time between `start` and `stop` and
//! writes one serde-serialized summary file per run into its log
//! directory. The scoped form starts on construction and stops when the
//! guard drops.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ProfilerError {
    #[error("profiler was not started")]
    NotStarted,

    #[error("failed to write profile summary: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize profile summary: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Summary of a single profiled run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Run counter within this profiler, starting at 1.
    pub run: u64,

    /// Wall time of the run in microseconds.
    pub elapsed_us: u64,
}

/// Wall-time profiler writing per-run summaries to a directory.
#[derive(Debug)]
pub struct Profiler {
    log_dir: PathBuf,
    runs: u64,
    started: Option<Instant>,
}

impl Profiler {
    /// Create a profiler writing summaries into `log_dir`.
    ///
    /// The directory is created when the first summary is written.
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            runs: 0,
            started: None,
        }
    }

    /// Directory this profiler writes into.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Number of completed runs.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Begin timing a run. Restarts the clock if already running.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Finish the current run and write its summary file.
    ///
    /// Fails with [`ProfilerError::NotStarted`] when `start` was never
    /// called. Returns the path of the written summary.
    pub fn stop(&mut self) -> Result<PathBuf, ProfilerError> {
        let started = self.started.take().ok_or(ProfilerError::NotStarted)?;
        let elapsed = started.elapsed();
        self.runs += 1;

        let summary = ProfileSummary {
            run: self.runs,
            elapsed_us: elapsed.as_micros() as u64,
        };

        fs::create_dir_all(&self.log_dir)?;
        let path = self.log_dir.join(format!("profile-{:04}.json", self.runs));
        fs::write(&path, serde_json::to_vec_pretty(&summary)?)?;

        info!(
            run = summary.run,
            elapsed_us = summary.elapsed_us,
            path = %path.display(),
            "Profile run complete"
        );
        Ok(path)
    }

    /// Profile the lifetime of the returned guard.
    pub fn scope(&mut self) -> ProfilerScope<'_> {
        self.start();
        ProfilerScope { profiler: self }
    }
}

/// Scoped profiling: times from construction to drop.
#[derive(Debug)]
pub struct ProfilerScope<'a> {
    profiler: &'a mut Profiler,
}

impl Drop for ProfilerScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.profiler.stop() {
            warn!(error = %e, "Failed to finish profile run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut profiler = Profiler::new(dir.path());

        profiler.start();
        let path = profiler.stop().unwrap();
        assert!(path.exists());
        assert_eq!(profiler.runs(), 1);

        let summary: ProfileSummary =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(summary.run, 1);
    }

    #[test]
    fn test_stop_without_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut profiler = Profiler::new(dir.path());
        assert!(matches!(profiler.stop(), Err(ProfilerError::NotStarted)));
    }

    #[test]
    fn test_scoped_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut profiler = Profiler::new(dir.path());
        {
            let _scope = profiler.scope();
        }
        assert_eq!(profiler.runs(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_consecutive_runs_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut profiler = Profiler::new(dir.path());

        profiler.start();
        let first = profiler.stop().unwrap();
        profiler.start();
        let second = profiler.stop().unwrap();

        assert_ne!(first, second);
        assert_eq!(profiler.runs(), 2);
    }
}
