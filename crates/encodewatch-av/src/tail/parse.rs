//! Progress token parsing.

use encodewatch_common::ProgressUpdate;
use regex::Regex;
use std::sync::LazyLock;

// ffmpeg pads some fields, e.g. `frame=  120`.
static FIELD_PADDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=\s+").expect("invalid field padding regex"));

/// Parse one diagnostic token into a progress update.
///
/// Returns `None` unless the token carries both `time=` and `bitrate=`.
/// Malformed values never fail the parse: an unreadable time counts as zero
/// seconds and a zero duration yields `inf` or `NaN`.
pub fn parse_token(token: &str, duration_secs: f64) -> Option<ProgressUpdate> {
    if !(token.contains("time=") && token.contains("bitrate=")) {
        return None;
    }

    let collapsed = FIELD_PADDING.replace_all(token, "=");

    let mut update = ProgressUpdate::default();
    for field in collapsed.split_whitespace() {
        let mut parts = field.split('=');
        let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        match name {
            "frame" => update.frames_processed = value.to_string(),
            "time" => update.current_time = value.to_string(),
            "bitrate" => update.current_bitrate = value.to_string(),
            _ => {}
        }
    }

    update.progress = (timestamp_to_secs(&update.current_time) * 100.0) / duration_secs;
    Some(update)
}

/// Convert an `hh:mm:ss.fraction` timestamp into seconds.
///
/// Anything without exactly three components is zero; an unparsable
/// component counts as zero.
pub fn timestamp_to_secs(timestamp: &str) -> f64 {
    let parts: Vec<&str> = timestamp.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return 0.0;
    };

    let component = |s: &str| s.parse::<f64>().unwrap_or(0.0);
    component(*hours) * 3600.0 + component(*minutes) * 60.0 + component(*seconds)
}

/// Turns tokens into updates, dropping repeats of the last emitted percentage.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    duration_secs: f64,
    last_progress: f64,
}

impl ProgressTracker {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            last_progress: 0.0,
        }
    }

    /// Returns an update only when its percentage differs from the last one
    /// emitted. `NaN` never compares equal, so it is always emitted.
    pub fn observe(&mut self, token: &[u8]) -> Option<ProgressUpdate> {
        let token = String::from_utf8_lossy(token);
        let update = parse_token(&token, self.duration_secs)?;

        if update.progress == self.last_progress {
            return None;
        }
        self.last_progress = update.progress;
        Some(update)
    }
}
