//! Durable completion record: one identifier per line, append-only.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{NcmError, Result};

pub struct CompletionRecord {
    path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    done: HashSet<String>,
    f: File,
}

impl CompletionRecord {
    /// Load every recorded identifier and keep the file open for appends.
    /// A missing file is created empty.
    pub fn open(path: &Path) -> Result<Self> {
        let mut f = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;
        let mut text = String::new();
        f.read_to_string(&mut text)?;

        let done: HashSet<String> = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();

        // Keep the next append on a line of its own.
        if !text.is_empty() && !text.ends_with('\n') {
            f.write_all(b"\n")?;
            f.flush()?;
        }

        tracing::debug!(path = %path.display(), entries = done.len(), "completion record loaded");
        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner { done, f }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // The set only grows after its line is on disk, so a guard left
    // poisoned by a panicking worker still holds a consistent view.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().done.contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `id` as one line. Returns false when it was already recorded.
    pub fn append(&self, id: &str) -> Result<bool> {
        if id.is_empty() || id.contains(['\n', '\r']) {
            return Err(NcmError::format(format!(
                "identifier {id:?} cannot be stored as a single line"
            )));
        }
        let mut g = self.lock();
        if g.done.contains(id) {
            return Ok(false);
        }
        let line = format!("{id}\n");
        g.f.write_all(line.as_bytes())?;
        g.f.flush()?;
        g.done.insert(id.to_string());
        Ok(true)
    }
}
