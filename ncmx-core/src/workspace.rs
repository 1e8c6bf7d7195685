//! Staging directories and record files of a working folder.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

pub const ORIGINAL_DIR: &str = "01_original";
pub const DECRYPTED_DIR: &str = "02_decrypted";
pub const COMPRESSED_DIR: &str = "03_compressed";
pub const DECODED_RECORD: &str = "cracked.txt";
pub const TRANSCODED_RECORD: &str = "compressed.txt";
/// Legacy output folder of older encoder runs.
pub const LEGACY_RESULT_DIR: &str = "result";

const DECRYPTED_EXTS: &[&str] = &["flac", "wav", "m4a", "aac", "ogg"];

#[derive(Clone, Debug)]
pub struct Workspace {
    pub root: PathBuf,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Moved {
    pub containers: usize,
    pub audio: usize,
    pub mp3: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct DirStatus {
    pub name: &'static str,
    pub exists: bool,
    pub files: u64,
    pub bytes: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Status {
    pub dirs: Vec<DirStatus>,
    pub decoded_records: usize,
    pub transcoded_records: usize,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn original(&self) -> PathBuf {
        self.root.join(ORIGINAL_DIR)
    }

    pub fn decrypted(&self) -> PathBuf {
        self.root.join(DECRYPTED_DIR)
    }

    pub fn compressed(&self) -> PathBuf {
        self.root.join(COMPRESSED_DIR)
    }

    pub fn decoded_record(&self) -> PathBuf {
        self.root.join(DECODED_RECORD)
    }

    pub fn transcoded_record(&self) -> PathBuf {
        self.root.join(TRANSCODED_RECORD)
    }

    /// Create missing staging directories and empty record files.
    pub fn ensure(&self) -> Result<()> {
        for d in [self.original(), self.decrypted(), self.compressed()] {
            if !d.is_dir() {
                fs::create_dir_all(&d)?;
                tracing::info!(dir = %d.display(), "created");
            }
        }
        for r in [self.decoded_record(), self.transcoded_record()] {
            if !r.exists() {
                fs::File::create(&r)?;
                tracing::info!(file = %r.display(), "created");
            }
        }
        Ok(())
    }

    /// Move stray files from the root (and the legacy `result/` folder) into
    /// their staging directory. Existing targets are never overwritten.
    pub fn organize(&self) -> Result<Moved> {
        self.ensure()?;
        let mut moved = Moved::default();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let ext = extension_lower(&path);
            let (dest, counter) = match ext.as_deref() {
                Some("ncm") => (self.original(), &mut moved.containers),
                Some(e) if DECRYPTED_EXTS.contains(&e) => (self.decrypted(), &mut moved.audio),
                Some("mp3") => (self.compressed(), &mut moved.mp3),
                _ => continue,
            };
            if move_into(&path, &dest)? {
                *counter += 1;
            }
        }

        let legacy = self.root.join(LEGACY_RESULT_DIR);
        if legacy.is_dir() {
            for entry in fs::read_dir(&legacy)? {
                let path = entry?.path();
                if path.is_file()
                    && extension_lower(&path).as_deref() == Some("mp3")
                    && move_into(&path, &self.compressed())?
                {
                    moved.mp3 += 1;
                }
            }
            match fs::remove_dir(&legacy) {
                Ok(()) => tracing::info!(dir = %legacy.display(), "removed empty legacy folder"),
                Err(_) => tracing::warn!(dir = %legacy.display(), "legacy folder not empty, kept"),
            }
        }
        Ok(moved)
    }

    pub fn status(&self) -> Result<Status> {
        let mut dirs = Vec::new();
        for (name, path) in [
            (ORIGINAL_DIR, self.original()),
            (DECRYPTED_DIR, self.decrypted()),
            (COMPRESSED_DIR, self.compressed()),
        ] {
            let (mut files, mut bytes) = (0u64, 0u64);
            let exists = path.is_dir();
            if exists {
                for e in walkdir::WalkDir::new(&path).min_depth(1) {
                    let e = e.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
                    if e.file_type().is_file() {
                        bytes += e.metadata().map(|m| m.len()).unwrap_or(0);
                        if e.depth() == 1 {
                            files += 1;
                        }
                    }
                }
            }
            dirs.push(DirStatus {
                name,
                exists,
                files,
                bytes,
            });
        }
        Ok(Status {
            dirs,
            decoded_records: count_lines(&self.decoded_record())?,
            transcoded_records: count_lines(&self.transcoded_record())?,
        })
    }
}

fn extension_lower(p: &Path) -> Option<String> {
    p.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn move_into(file: &Path, dir: &Path) -> Result<bool> {
    let Some(name) = file.file_name() else {
        return Ok(false);
    };
    let target = dir.join(name);
    if target.exists() {
        tracing::warn!(file = %file.display(), "target exists, left in place");
        return Ok(false);
    }
    if fs::rename(file, &target).is_err() {
        // cross-device: copy then remove
        fs::copy(file, &target)?;
        fs::remove_file(file)?;
    }
    tracing::info!(from = %file.display(), to = %target.display(), "moved");
    Ok(true)
}

fn count_lines(p: &Path) -> Result<usize> {
    match fs::read_to_string(p) {
        Ok(s) => Ok(s.lines().filter(|l| !l.trim().is_empty()).count()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::new(root.path());
        ws.ensure().unwrap();
        std::fs::write(ws.decoded_record(), "kept\n").unwrap();
        ws.ensure().unwrap();
        assert!(ws.original().is_dir() && ws.decrypted().is_dir() && ws.compressed().is_dir());
        assert_eq!(std::fs::read_to_string(ws.decoded_record()).unwrap(), "kept\n");
    }

    #[test]
    fn organize_sorts_stray_files() {
        let root = tempfile::tempdir().unwrap();
        let r = root.path();
        std::fs::write(r.join("a.ncm"), b"1").unwrap();
        std::fs::write(r.join("b.FLAC"), b"2").unwrap();
        std::fs::write(r.join("c.mp3"), b"3").unwrap();
        std::fs::write(r.join("notes.txt"), b"4").unwrap();
        std::fs::create_dir(r.join("result")).unwrap();
        std::fs::write(r.join("result").join("d.mp3"), b"5").unwrap();

        let ws = Workspace::new(r);
        ws.ensure().unwrap();
        std::fs::write(ws.original().join("dup.ncm"), b"old").unwrap();
        std::fs::write(r.join("dup.ncm"), b"new").unwrap();

        let moved = ws.organize().unwrap();
        assert_eq!(moved.containers, 1);
        assert_eq!(moved.audio, 1);
        assert_eq!(moved.mp3, 2);
        assert!(ws.original().join("a.ncm").is_file());
        assert!(ws.decrypted().join("b.FLAC").is_file());
        assert!(ws.compressed().join("c.mp3").is_file());
        assert!(ws.compressed().join("d.mp3").is_file());
        assert!(r.join("notes.txt").is_file());
        assert!(!r.join("result").exists());
        // never overwrite
        assert_eq!(std::fs::read(ws.original().join("dup.ncm")).unwrap(), b"old");
        assert!(r.join("dup.ncm").is_file());
    }

    #[test]
    fn status_counts_files_and_records() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::new(root.path());
        ws.ensure().unwrap();
        std::fs::write(ws.original().join("x.ncm"), vec![0u8; 10]).unwrap();
        std::fs::write(ws.decoded_record(), "a\nb\n\n").unwrap();
        let s = ws.status().unwrap();
        assert_eq!(s.dirs[0].files, 1);
        assert_eq!(s.dirs[0].bytes, 10);
        assert_eq!(s.decoded_records, 2);
        assert_eq!(s.transcoded_records, 0);
    }
}
