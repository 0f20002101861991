use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "encodewatch")]
#[command(author, version, about = "Run ffmpeg transcodes and follow their progress")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcode a media file, reporting progress as it runs
    Transcode {
        /// Input file to transcode
        #[arg(required = true)]
        input: PathBuf,

        /// Output file (overwritten if it exists)
        #[arg(required = true)]
        output: PathBuf,

        /// Video codec, e.g. libx264
        #[arg(long)]
        video_codec: Option<String>,

        /// Audio codec, e.g. aac
        #[arg(long)]
        audio_codec: Option<String>,

        /// Constant rate factor
        #[arg(long)]
        crf: Option<u32>,

        /// Encoder preset, e.g. medium
        #[arg(long)]
        preset: Option<String>,

        /// Print progress as JSON lines
        #[arg(long)]
        json: bool,

        /// Extra ffmpeg arguments, placed before the output path
        #[arg(last = true)]
        extra: Vec<String>,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
