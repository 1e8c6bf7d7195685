//! Bounded worker pool over independent per-file jobs.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{ErrorKind, NcmError, Result};
use crate::record::CompletionRecord;

pub const DEFAULT_MAX_WORKERS: usize = 4;

/// One input file waiting to be processed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// File stem; the key stored in the completion record.
    pub id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct JobFailure {
    pub id: String,
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug)]
pub struct BatchReport<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<JobFailure>,
    /// Candidates already present in the record.
    pub skipped: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

impl<T> BatchReport<T> {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `min(available parallelism, jobs, cap)`, never below one.
pub fn worker_count(jobs: usize, cap: usize) -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.min(jobs).min(cap).max(1)
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// List files directly inside `dir` whose extension is in `exts`
/// (case-insensitive). Sorted by path.
pub fn list_candidates(dir: &Path, exts: &[&str]) -> Result<Vec<Candidate>> {
    let mut out = Vec::new();
    for e in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let e = e.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        if !e.file_type().is_file() || !has_extension(e.path(), exts) {
            continue;
        }
        let Some(id) = e.path().file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!(path = %e.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        out.push(Candidate {
            id: id.to_string(),
            path: e.path().to_path_buf(),
        });
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));

    // `song.ncm` and `song.NCM` share an id and an output path; the first
    // in path order wins.
    let mut seen = HashSet::new();
    out.retain(|c| {
        let first = seen.insert(c.id.clone());
        if !first {
            tracing::warn!(id = %c.id, path = %c.path.display(), "duplicate identifier, skipped");
        }
        first
    });
    Ok(out)
}

/// Split candidates into (pending, already recorded count).
pub fn pending(candidates: Vec<Candidate>, record: &CompletionRecord) -> (Vec<Candidate>, usize) {
    let before = candidates.len();
    let todo: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| !record.contains(&c.id))
        .collect();
    let skipped = before - todo.len();
    (todo, skipped)
}

/// Run `job` for every candidate on a pool of `workers` threads.
///
/// Each success is appended to `record` before it counts as done. A failing
/// job is reported and never stops its siblings.
pub fn run_batch<T, F>(
    candidates: &[Candidate],
    record: &CompletionRecord,
    workers: usize,
    job: F,
) -> Result<BatchReport<T>>
where
    T: Send,
    F: Fn(&Candidate) -> Result<T> + Sync,
{
    let started = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("ncmx-worker-{i}"))
        .build()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let results: Vec<std::result::Result<T, JobFailure>> = pool.install(|| {
        candidates
            .par_iter()
            .map(|c| {
                let res = job(c).and_then(|out| {
                    record.append(&c.id)?;
                    Ok(out)
                });
                res.map_err(|e| failure(c, e))
            })
            .collect()
    });

    let mut report = BatchReport {
        succeeded: Vec::new(),
        failed: Vec::new(),
        skipped: 0,
        workers: workers.max(1),
        elapsed: Duration::ZERO,
    };
    for r in results {
        match r {
            Ok(v) => report.succeeded.push(v),
            Err(f) => report.failed.push(f),
        }
    }
    report.elapsed = started.elapsed();
    Ok(report)
}

fn failure(c: &Candidate, e: NcmError) -> JobFailure {
    tracing::warn!(id = %c.id, kind = %e.kind(), "failed: {e}");
    JobFailure {
        id: c.id.clone(),
        path: c.path.clone(),
        kind: e.kind(),
        message: e.to_string(),
    }
}
