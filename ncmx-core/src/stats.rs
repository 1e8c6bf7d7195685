use serde::Serialize;

use crate::batch::{BatchReport, JobFailure};

#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub workers: usize,
    pub bytes: u64,
    pub elapsed_secs: f64,
    pub mib_per_sec: f64,
    pub failures: Vec<JobFailure>,
}

impl RunSummary {
    /// `bytes_of` picks the byte count credited to each success.
    pub fn from_report<T>(report: &BatchReport<T>, bytes_of: impl Fn(&T) -> u64) -> Self {
        let bytes: u64 = report.succeeded.iter().map(bytes_of).sum();
        let elapsed_secs = report.elapsed.as_secs_f64();
        let mib_per_sec = if elapsed_secs > 0.0 {
            bytes as f64 / (1024.0 * 1024.0) / elapsed_secs
        } else {
            0.0
        };
        Self {
            succeeded: report.succeeded.len(),
            failed: report.failed.len(),
            skipped: report.skipped,
            workers: report.workers,
            bytes,
            elapsed_secs,
            mib_per_sec,
            failures: report.failed.clone(),
        }
    }
}
