#![deny(unsafe_code)]

pub mod error;

pub mod util {
    pub mod hash_forward;
}

pub mod crypto {
    pub mod hex;
    pub mod keybox;
    pub mod keys;
    pub mod unwrap;
}

pub mod container {
    pub mod header;
    pub mod source;
}

pub mod read {
    pub mod payload;
}

pub mod meta;
pub mod record;

pub mod batch;
pub mod decode;
pub mod stats;
pub mod transcode;
pub mod workspace;

// Re-exports: stable API surface
pub use container::source::ReadStrategy;
pub use decode::{DecodeOptions, DecodeOutcome, decode_dir, decode_file, inspect_file};
pub use error::{ErrorKind, NcmError, Result};
pub use record::CompletionRecord;
pub use transcode::{FfmpegTranscoder, TranscodeOptions, Transcoder, transcode_dir};
pub use workspace::Workspace;
