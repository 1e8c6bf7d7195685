//! One container in, one audio file out.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::batch::{self, BatchReport, Candidate, DEFAULT_MAX_WORKERS};
use crate::container::header::ContainerLayout;
use crate::container::source::{ReadStrategy, open_container};
use crate::crypto::keybox::{KeyMaterial, KeystreamTable};
use crate::error::{NcmError, Result};
use crate::meta::TrackMetadata;
use crate::read::payload::{DEFAULT_BUF_SIZE, decrypt_payload};
use crate::record::CompletionRecord;
use crate::util::hash_forward::HashingForward;

pub const CONTAINER_EXT: &str = "ncm";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecodeOptions {
    pub strategy: ReadStrategy,
    /// I/O buffer for the payload loop; has no effect on output bytes.
    pub buf_size: usize,
    /// Upper bound on the worker pool.
    pub max_workers: usize,
    pub extension: String,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strategy: ReadStrategy::Buffered,
            buf_size: DEFAULT_BUF_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            extension: CONTAINER_EXT.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DecodeOutcome {
    pub id: String,
    pub output: PathBuf,
    pub format: String,
    pub payload_bytes: u64,
    /// blake3 of the written audio, hex.
    pub digest: String,
    pub elapsed: Duration,
}

/// Everything recoverable from a container without writing output.
#[derive(Clone, Debug, Serialize)]
pub struct Inspection {
    pub path: PathBuf,
    pub file_len: u64,
    pub key_blob_len: usize,
    pub meta_blob_len: usize,
    pub cover_off: u64,
    pub cover_len: u64,
    pub payload_off: u64,
    pub payload_len: u64,
    pub key_hex: String,
    pub metadata: TrackMetadata,
}

/// Decode `job.path` into `out_dir/<id>.<format>`.
///
/// The output file is only created once the key and metadata have been
/// recovered, so header, key and metadata failures leave nothing behind.
pub fn decode_file(job: &Candidate, out_dir: &Path, opts: &DecodeOptions) -> Result<DecodeOutcome> {
    let started = Instant::now();
    let mut src = open_container(&job.path, opts.strategy)?;
    let layout: &ContainerLayout = src.layout();
    tracing::debug!(
        id = %job.id,
        payload_off = layout.payload_off,
        payload_len = layout.payload_len,
        cover_len = layout.cover_len,
        "container parsed"
    );

    let key = KeyMaterial::recover(layout.key_blob.clone())?;
    let table = KeystreamTable::from_key(&key);
    drop(key);

    let meta = TrackMetadata::recover(&layout.meta_blob)?;
    let format = meta.output_format()?.to_string();
    let payload_len = layout.payload_len;

    let output = out_dir.join(format!("{}.{}", job.id, format));
    if is_same_file(&output, &job.path)? {
        return Err(NcmError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("output {} would overwrite its own input", output.display()),
        )));
    }
    let out = File::create(&output)?;
    let mut w = HashingForward::new(BufWriter::new(out));
    let mut payload = src.payload()?;
    let payload_bytes = decrypt_payload(&mut payload, payload_len, &table, &mut w, opts.buf_size)?;
    let (_, digest) = w.finish()?;

    let elapsed = started.elapsed();
    tracing::info!(
        id = %job.id,
        format = %format,
        bytes = payload_bytes,
        ms = elapsed.as_millis() as u64,
        "decoded"
    );
    Ok(DecodeOutcome {
        id: job.id.clone(),
        output,
        format,
        payload_bytes,
        digest,
        elapsed,
    })
}

fn is_same_file(a: &Path, b: &Path) -> Result<bool> {
    if a == b {
        return Ok(true);
    }
    if !a.exists() {
        return Ok(false);
    }
    Ok(std::fs::canonicalize(a)? == std::fs::canonicalize(b)?)
}

pub fn inspect_file(path: &Path, strategy: ReadStrategy) -> Result<Inspection> {
    let file_len = std::fs::metadata(path)?.len();
    let src = open_container(path, strategy)?;
    let l = src.layout();
    let key = KeyMaterial::recover(l.key_blob.clone())?;
    let metadata = TrackMetadata::recover(&l.meta_blob)?;
    Ok(Inspection {
        path: path.to_path_buf(),
        file_len,
        key_blob_len: l.key_blob.len(),
        meta_blob_len: l.meta_blob.len(),
        cover_off: l.cover_off,
        cover_len: l.cover_len,
        payload_off: l.payload_off,
        payload_len: l.payload_len,
        key_hex: hex::encode(key.as_bytes()),
        metadata,
    })
}

/// Decode every pending container in `in_dir` into `out_dir`.
pub fn decode_dir(
    in_dir: &Path,
    out_dir: &Path,
    record: &CompletionRecord,
    opts: &DecodeOptions,
) -> Result<BatchReport<DecodeOutcome>> {
    let found = batch::list_candidates(in_dir, &[opts.extension.as_str()])?;
    let (todo, skipped) = batch::pending(found, record);
    let workers = batch::worker_count(todo.len(), opts.max_workers);
    tracing::info!(
        pending = todo.len(),
        skipped,
        workers,
        input = %in_dir.display(),
        "decode batch starting"
    );
    let mut report = batch::run_batch(&todo, record, workers, |c| decode_file(c, out_dir, opts))?;
    report.skipped = skipped;
    Ok(report)
}
