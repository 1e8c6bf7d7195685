use std::path::PathBuf;

use ncmx_core::error::{NcmError, Result};
use ncmx_core::stats::RunSummary;
use ncmx_core::transcode::TranscodeProfile;
use ncmx_core::{
    CompletionRecord, DecodeOptions, FfmpegTranscoder, ReadStrategy, TranscodeOptions, Workspace,
    decode_dir, inspect_file, transcode_dir,
};

fn print_json<T: serde::Serialize>(v: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(v).map_err(|e| NcmError::Io(e.into()))?;
    println!("{s}");
    Ok(())
}

fn print_summary(verb: &str, summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        return print_json(summary);
    }
    eprintln!(
        "{verb}: {} ok, {} failed, {} skipped ({} workers, {:.1} MiB in {:.2}s, {:.1} MiB/s)",
        summary.succeeded,
        summary.failed,
        summary.skipped,
        summary.workers,
        summary.bytes as f64 / (1024.0 * 1024.0),
        summary.elapsed_secs,
        summary.mib_per_sec,
    );
    Ok(())
}

/// Returns `Ok(false)` when at least one file failed.
#[allow(clippy::too_many_arguments)]
pub fn handle_decode(
    root: PathBuf,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    record: Option<PathBuf>,
    max_workers: usize,
    buf_size: usize,
    strategy: ReadStrategy,
    extension: String,
    json: bool,
) -> Result<bool> {
    let ws = Workspace::new(root);
    let input = input.unwrap_or_else(|| ws.original());
    let output = output.unwrap_or_else(|| ws.decrypted());
    let record_path = record.unwrap_or_else(|| ws.decoded_record());
    std::fs::create_dir_all(&output)?;

    let record = CompletionRecord::open(&record_path)?;
    eprintln!("record: {} ({} done)", record.path().display(), record.len());
    let opts = DecodeOptions {
        strategy,
        buf_size,
        max_workers,
        extension,
    };
    let report = decode_dir(&input, &output, &record, &opts)?;

    for o in &report.succeeded {
        eprintln!("ok    {} -> {} ({} bytes)", o.id, o.output.display(), o.payload_bytes);
    }
    for f in &report.failed {
        eprintln!("FAIL  {} [{}] {}", f.id, f.kind, f.message);
    }
    let summary = RunSummary::from_report(&report, |o| o.payload_bytes);
    print_summary("decode", &summary, json)?;
    Ok(report.is_clean())
}

pub fn handle_transcode(
    root: PathBuf,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    record: Option<PathBuf>,
    max_workers: usize,
    ffmpeg: PathBuf,
    json: bool,
) -> Result<bool> {
    let ws = Workspace::new(root);
    let input = input.unwrap_or_else(|| ws.decrypted());
    let output = output.unwrap_or_else(|| ws.compressed());
    let record_path = record.unwrap_or_else(|| ws.transcoded_record());
    std::fs::create_dir_all(&output)?;

    let record = CompletionRecord::open(&record_path)?;
    eprintln!("record: {} ({} done)", record.path().display(), record.len());
    let transcoder = FfmpegTranscoder {
        program: ffmpeg,
        profile: TranscodeProfile::default(),
    };
    let opts = TranscodeOptions {
        max_workers,
        ..Default::default()
    };
    let report = transcode_dir(&transcoder, &input, &output, &record, &opts)?;

    for o in &report.succeeded {
        eprintln!(
            "ok    {} -> {} ({:.1}% smaller)",
            o.id,
            o.output.display(),
            o.ratio
        );
    }
    for f in &report.failed {
        eprintln!("FAIL  {} [{}] {}", f.id, f.kind, f.message);
    }
    let summary = RunSummary::from_report(&report, |o| o.input_size);
    print_summary("transcode", &summary, json)?;
    Ok(report.is_clean())
}

pub fn handle_inspect(file: PathBuf, strategy: ReadStrategy, json: bool) -> Result<()> {
    let i = inspect_file(&file, strategy)?;
    if json {
        return print_json(&i);
    }
    println!("file      {} ({} bytes)", i.path.display(), i.file_len);
    println!("key blob  {} bytes", i.key_blob_len);
    println!("meta blob {} bytes", i.meta_blob_len);
    println!("cover     off={} len={}", i.cover_off, i.cover_len);
    println!("payload   off={} len={}", i.payload_off, i.payload_len);
    println!("key       {}", i.key_hex);
    let m = &i.metadata;
    println!("format    {}", m.format.as_deref().unwrap_or("-"));
    if let Some(name) = &m.music_name {
        println!("title     {name}");
    }
    let artists = m.artists();
    if !artists.is_empty() {
        println!("artist    {}", artists.join(", "));
    }
    if let Some(album) = &m.album {
        println!("album     {album}");
    }
    if let Some(b) = m.bitrate {
        println!("bitrate   {b}");
    }
    if let Some(d) = m.duration {
        println!("duration  {:.1}s", d / 1000.0);
    }
    Ok(())
}

pub fn handle_init(root: PathBuf) -> Result<()> {
    Workspace::new(root).ensure()?;
    eprintln!("init: OK");
    Ok(())
}

pub fn handle_organize(root: PathBuf) -> Result<()> {
    let moved = Workspace::new(root).organize()?;
    eprintln!(
        "organize: {} containers, {} audio, {} mp3 moved",
        moved.containers, moved.audio, moved.mp3
    );
    Ok(())
}

pub fn handle_status(root: PathBuf, json: bool) -> Result<()> {
    let s = Workspace::new(root).status()?;
    if json {
        return print_json(&s);
    }
    for d in &s.dirs {
        if d.exists {
            println!("{:<14} {:>6} files {:>12} bytes", d.name, d.files, d.bytes);
        } else {
            println!("{:<14} (missing)", d.name);
        }
    }
    println!("decoded records    {}", s.decoded_records);
    println!("transcoded records {}", s.transcoded_records);
    Ok(())
}
