//! FFprobe-based media probing.

use super::Probe;
use crate::tools::{self, FFPROBE};
use crate::{Error, Result};
use encodewatch_common::MediaMetadata;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// ffprobe JSON document; `-show_error` adds the `error` object on failure.
#[derive(Debug, Deserialize)]
struct FfprobeDocument {
    #[serde(flatten)]
    metadata: MediaMetadata,
    #[serde(default)]
    error: Option<FfprobeError>,
}

#[derive(Debug, Deserialize)]
struct FfprobeError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    string: String,
}

/// Probes media files by running ffprobe and parsing its JSON report.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: PathBuf,
}

impl FfprobeProber {
    /// Use the ffprobe binary at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate ffprobe from a configured path or `PATH`.
    pub fn locate(config_path: Option<&Path>) -> Result<Self> {
        tools::get_tool_path(FFPROBE, config_path).map(Self::new)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command_args(path: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            path.to_string_lossy().into_owned(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            "-show_error".to_string(),
        ]
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new(FFPROBE)
    }
}

impl Probe for FfprobeProber {
    fn probe(&self, path: &Path) -> Result<MediaMetadata> {
        let command = Self::command_args(path);
        tracing::debug!("Probing {:?} with {:?}", path, self.program);

        let output = Command::new(&self.program)
            .args(&command)
            .output()
            .map_err(|e| Error::probe_failed(command.clone(), e.to_string(), ""))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            return Err(Error::probe_failed(command, output.status.to_string(), stdout));
        }

        parse_document(&stdout).map_err(|message| Error::probe_failed(command, message, stdout))
    }
}

fn parse_document(json: &str) -> std::result::Result<MediaMetadata, String> {
    let document: FfprobeDocument = serde_json::from_str(json).map_err(|e| e.to_string())?;

    if let Some(err) = document.error {
        return Err(format!("ffprobe error {}: {}", err.code, err.string));
    }

    Ok(document.metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encodewatch_common::MediaKind;

    #[test]
    fn test_parse_document() {
        let json = r#"{
            "streams": [
                {"index": 0, "codec_name": "hevc", "codec_type": "video", "width": 3840, "height": 2160},
                {"index": 1, "codec_name": "truehd", "codec_type": "audio", "channels": 8}
            ],
            "format": {"filename": "movie.mkv", "nb_streams": 2, "format_name": "matroska,webm", "duration": "7200.000000"}
        }"#;

        let metadata = parse_document(json).unwrap();
        assert_eq!(metadata.media_kind(), MediaKind::Video);
        assert_eq!(metadata.duration_secs(), 7200.0);
        assert_eq!(metadata.streams[1].channels, Some(8));
    }

    #[test]
    fn test_parse_document_reports_ffprobe_error() {
        let json = r#"{"error": {"code": -2, "string": "No such file or directory"}}"#;
        let message = parse_document(json).unwrap_err();
        assert_eq!(message, "ffprobe error -2: No such file or directory");
    }

    #[test]
    fn test_parse_document_rejects_garbage() {
        assert!(parse_document("not json").is_err());
    }

    #[test]
    fn test_command_args() {
        let args = FfprobeProber::command_args(Path::new("/media/in.mkv"));
        assert_eq!(
            args,
            vec![
                "-i",
                "/media/in.mkv",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-show_error"
            ]
        );
    }

    #[test]
    fn test_missing_binary_is_probe_failure() {
        let prober = FfprobeProber::new("/definitely/not/here/ffprobe");
        let err = prober.probe(Path::new("/media/in.mkv")).unwrap_err();
        match err {
            Error::ProbeFailed { command, output, .. } => {
                assert_eq!(command[1], "/media/in.mkv");
                assert!(output.is_empty());
            }
            other => panic!("expected ProbeFailed, got {other:?}"),
        }
    }
}
