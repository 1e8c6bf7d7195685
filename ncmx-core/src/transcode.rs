//! Hand-off to an external encoder process.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::batch::{self, BatchReport, Candidate, DEFAULT_MAX_WORKERS};
use crate::error::{NcmError, Result};
use crate::record::CompletionRecord;

/// Extensions picked up from the decrypted directory.
pub const TRANSCODE_INPUT_EXTS: &[&str] = &["flac", "mp3", "wav", "m4a", "aac"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeProfile {
    pub codec: String,
    pub bitrate: String,
    pub sample_rate: u32,
    pub preset: String,
    pub extension: String,
}

impl Default for TranscodeProfile {
    fn default() -> Self {
        Self {
            codec: "libmp3lame".into(),
            bitrate: "128k".into(),
            sample_rate: 44_100,
            preset: "fast".into(),
            extension: "mp3".into(),
        }
    }
}

pub trait Transcoder: Send + Sync {
    fn name(&self) -> &str;
    fn transcode(&self, input: &Path, output: &Path) -> Result<()>;
}

pub struct FfmpegTranscoder {
    pub program: PathBuf,
    pub profile: TranscodeProfile,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            profile: TranscodeProfile::default(),
        }
    }
}

impl FfmpegTranscoder {
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let p = &self.profile;
        let mut v: Vec<OsString> = ["-y", "-loglevel", "error", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        v.push(input.as_os_str().to_owned());
        let rate = p.sample_rate.to_string();
        for s in [
            "-c:a",
            p.codec.as_str(),
            "-b:a",
            p.bitrate.as_str(),
            "-ar",
            rate.as_str(),
            "-threads",
            "0",
            "-preset",
            p.preset.as_str(),
        ] {
            v.push(OsString::from(s));
        }
        v.push(output.as_os_str().to_owned());
        v
    }
}

impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        let out = Command::new(&self.program)
            .args(self.args(input, output))
            .output()?;
        if !out.status.success() {
            return Err(NcmError::ExternalTool {
                program: self.program.display().to_string(),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TranscodeOutcome {
    pub id: String,
    pub output: PathBuf,
    pub input_size: u64,
    pub output_size: u64,
    /// Percentage saved, `(1 - out/in) * 100`.
    pub ratio: f64,
    pub elapsed: Duration,
}

pub fn transcode_file(
    t: &dyn Transcoder,
    job: &Candidate,
    out_dir: &Path,
    extension: &str,
) -> Result<TranscodeOutcome> {
    let started = Instant::now();
    let output = out_dir.join(format!("{}.{}", job.id, extension));
    t.transcode(&job.path, &output)?;
    let input_size = std::fs::metadata(&job.path)?.len();
    let output_size = std::fs::metadata(&output)?.len();
    let ratio = if input_size > 0 {
        (1.0 - output_size as f64 / input_size as f64) * 100.0
    } else {
        0.0
    };
    tracing::info!(id = %job.id, tool = t.name(), input_size, output_size, "transcoded");
    Ok(TranscodeOutcome {
        id: job.id.clone(),
        output,
        input_size,
        output_size,
        ratio,
        elapsed: started.elapsed(),
    })
}

#[derive(Clone, Debug)]
pub struct TranscodeOptions {
    pub max_workers: usize,
    pub extension: String,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            extension: TranscodeProfile::default().extension,
        }
    }
}

pub fn transcode_dir(
    t: &dyn Transcoder,
    in_dir: &Path,
    out_dir: &Path,
    record: &CompletionRecord,
    opts: &TranscodeOptions,
) -> Result<BatchReport<TranscodeOutcome>> {
    let found = batch::list_candidates(in_dir, TRANSCODE_INPUT_EXTS)?;
    let (todo, skipped) = batch::pending(found, record);
    let workers = batch::worker_count(todo.len(), opts.max_workers);
    tracing::info!(pending = todo.len(), skipped, workers, "transcode batch starting");
    let mut report = batch::run_batch(&todo, record, workers, |c| {
        transcode_file(t, c, out_dir, &opts.extension)
    })?;
    report.skipped = skipped;
    Ok(report)
}
