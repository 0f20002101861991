//! Media metadata and progress types.
//!
//! [`MediaMetadata`] mirrors the JSON document `ffprobe -print_format json
//! -show_format -show_streams` produces. Only the fields encodewatch reads are
//! modelled; unknown fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// Classification of a job's source media.
///
/// Decides how the engine's diagnostic stream is tokenized: video encodes
/// overwrite a single status line with carriage returns, everything else
/// reports line by line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

// ---------------------------------------------------------------------------
// MediaMetadata
// ---------------------------------------------------------------------------

/// Probe record for a media file: container format plus its streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    #[serde(default)]
    pub format: Format,

    #[serde(default)]
    pub streams: Vec<Stream>,
}

impl MediaMetadata {
    /// Total duration in seconds.
    ///
    /// An empty or unparsable duration yields `0.0`; callers dividing by it get
    /// `inf`/`NaN` rather than an error.
    pub fn duration_secs(&self) -> f64 {
        self.format.duration.trim().parse().unwrap_or(0.0)
    }

    /// `Video` if any stream is a video stream, `Audio` otherwise.
    pub fn media_kind(&self) -> MediaKind {
        if self.streams.iter().any(Stream::is_video) {
            MediaKind::Video
        } else {
            MediaKind::Audio
        }
    }

    /// First video stream, if any.
    pub fn primary_video(&self) -> Option<&Stream> {
        self.streams.iter().find(|s| s.is_video())
    }
}

/// Container-level properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Format {
    #[serde(default)]
    pub filename: String,

    #[serde(default)]
    pub nb_streams: u32,

    #[serde(default)]
    pub format_name: String,

    #[serde(default)]
    pub format_long_name: Option<String>,

    #[serde(default)]
    pub start_time: Option<String>,

    /// Duration in seconds, kept as the decimal string ffprobe reports.
    #[serde(default, deserialize_with = "string_or_number")]
    pub duration: String,

    #[serde(default)]
    pub size: Option<String>,

    #[serde(default)]
    pub bit_rate: Option<String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// A single elementary stream inside the container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    #[serde(default)]
    pub index: u32,

    #[serde(default)]
    pub codec_name: Option<String>,

    #[serde(default)]
    pub codec_long_name: Option<String>,

    /// Media kind as reported by the prober ("video", "audio", "subtitle", ...).
    #[serde(default)]
    pub codec_type: String,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default)]
    pub pix_fmt: Option<String>,

    #[serde(default)]
    pub r_frame_rate: Option<String>,

    #[serde(default)]
    pub channels: Option<u32>,

    #[serde(default)]
    pub sample_rate: Option<String>,

    #[serde(default)]
    pub bit_rate: Option<String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Stream {
    pub fn is_video(&self) -> bool {
        self.codec_type == "video"
    }
}

/// Accept `"12.5"` as well as `12.5` for duration-like fields.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

// ---------------------------------------------------------------------------
// ProgressUpdate
// ---------------------------------------------------------------------------

/// Point-in-time progress snapshot of a running job.
///
/// `progress` is a percentage of the source duration. It is not clamped, so a
/// wrong duration estimate can push it past 100 or make it `NaN`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub progress: f64,
    pub current_time: String,
    pub current_bitrate: String,
    pub frames_processed: String,
}
