//! # encodewatch-av
//!
//! Run ffmpeg transcode jobs and follow their progress.
//!
//! This crate provides functionality for:
//! - Describing a job: a validated, probed input plus the engine arguments
//! - Supervising the engine process with a one-shot completion signal
//! - Tailing the engine's stderr into de-duplicated progress percentages
//! - Locating ffmpeg/ffprobe and probing media with ffprobe
//!
//! ## Example
//!
//! ```no_run
//! use encodewatch_av::{tail, EncodeOptions, FfprobeProber, JobDescriptor, Supervisor};
//! use tokio_stream::StreamExt;
//!
//! # async fn run() -> encodewatch_av::Result<()> {
//! let options = EncodeOptions {
//!     video_codec: Some("libx264".into()),
//!     crf: Some(20),
//!     ..EncodeOptions::default()
//! };
//! let job = JobDescriptor::probe("/media/in.mkv", "/media/out.mp4", &FfprobeProber::default())?
//!     .with_args(&options);
//!
//! let started = Supervisor::new("ffmpeg").start(&job);
//! let mut progress = tail(started.diagnostics, &job);
//! while let Some(update) = progress.next().await {
//!     println!("{:.1}% at {}", update.progress, update.current_time);
//! }
//! started.completion.wait().await
//! # }
//! ```

mod error;
pub mod args;
pub mod job;
pub mod probe;
pub mod supervisor;
pub mod tail;
pub mod tools;

// Re-exports
pub use args::{ArgumentBuilder, EncodeOptions};
pub use error::{Error, Result};
pub use job::JobDescriptor;
pub use probe::{FfprobeProber, Probe};
pub use supervisor::{Completion, DiagnosticStream, StartedJob, Supervisor, OVERWRITE_FLAG};
pub use tail::{tail, ProgressStream, ProgressTracker, SplitStrategy, TokenCodec};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo};

pub use encodewatch_common::{JobId, MediaKind, MediaMetadata, ProgressUpdate};
