use clap::{Parser, Subcommand};
use ncmx_core::ReadStrategy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "ncmx: NCM container decoder", long_about = None)]
pub struct Cli {
    /// Raise log level to debug (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StrategyArg {
    Buffered,
    Mapped,
}

impl From<StrategyArg> for ReadStrategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Buffered => ReadStrategy::Buffered,
            StrategyArg::Mapped => ReadStrategy::Mapped,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode every pending container of a directory
    Decode {
        /// Working folder holding the staging directories
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Input directory (defaults to <root>/01_original)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to <root>/02_decrypted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Completion record (defaults to <root>/cracked.txt)
        #[arg(long)]
        record: Option<PathBuf>,

        #[arg(long, default_value_t = ncmx_core::batch::DEFAULT_MAX_WORKERS)]
        max_workers: usize,

        /// Payload buffer size in bytes
        #[arg(long, default_value_t = ncmx_core::read::payload::DEFAULT_BUF_SIZE)]
        buf_size: usize,

        #[arg(long = "read-strategy", value_enum, default_value_t = StrategyArg::Buffered)]
        strategy: StrategyArg,

        /// Container file extension
        #[arg(long, default_value = ncmx_core::decode::CONTAINER_EXT)]
        extension: String,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Re-encode decoded audio with an external encoder
    Transcode {
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Input directory (defaults to <root>/02_decrypted)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to <root>/03_compressed)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Completion record (defaults to <root>/compressed.txt)
        #[arg(long)]
        record: Option<PathBuf>,

        #[arg(long, default_value_t = ncmx_core::batch::DEFAULT_MAX_WORKERS)]
        max_workers: usize,

        /// Encoder program
        #[arg(long, default_value = "ffmpeg")]
        ffmpeg: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Show layout, key and metadata of one container
    Inspect {
        file: PathBuf,

        #[arg(long = "read-strategy", value_enum, default_value_t = StrategyArg::Buffered)]
        strategy: StrategyArg,

        #[arg(long)]
        json: bool,
    },

    /// Create staging directories and record files
    Init {
        #[arg(default_value = ".")]
        root: PathBuf,
    },

    /// Move stray files into their staging directory
    Organize {
        #[arg(default_value = ".")]
        root: PathBuf,
    },

    /// Summarize staging directories and records
    Status {
        #[arg(default_value = ".")]
        root: PathBuf,

        #[arg(long)]
        json: bool,
    },
}
