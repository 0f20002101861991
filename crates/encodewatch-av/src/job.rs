//! Job descriptors.

use crate::args::ArgumentBuilder;
use crate::probe::Probe;
use crate::{Error, Result};
use encodewatch_common::{JobId, MediaKind, MediaMetadata};
use std::path::{Path, PathBuf};

/// Everything needed to run and monitor one transcode.
///
/// The input is verified to exist and has already been probed, so the source
/// duration is known before the engine starts.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    id: JobId,
    input: PathBuf,
    output: PathBuf,
    metadata: MediaMetadata,
    args: Vec<String>,
}

impl JobDescriptor {
    /// Validate `input`, probe it, and build a descriptor with no engine arguments.
    ///
    /// This blocks for as long as the prober runs.
    ///
    /// # Errors
    ///
    /// - [`Error::InputMissing`] if `input` is empty.
    /// - [`Error::InputNotFound`] if `input` does not exist.
    /// - Whatever the prober returns, normally [`Error::ProbeFailed`].
    pub fn probe<P>(input: impl AsRef<Path>, output: impl AsRef<Path>, prober: &P) -> Result<Self>
    where
        P: Probe + ?Sized,
    {
        let input = input.as_ref();

        if input.as_os_str().is_empty() {
            return Err(Error::InputMissing);
        }

        match std::fs::metadata(input) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::input_not_found(input));
            }
            _ => {}
        }

        let metadata = prober.probe(input)?;

        let job = Self {
            id: JobId::new(),
            input: input.to_path_buf(),
            output: output.as_ref().to_path_buf(),
            metadata,
            args: Vec::new(),
        };

        tracing::debug!(
            job = %job.id,
            "Prepared job {:?} -> {:?} ({}, {}s)",
            job.input,
            job.output,
            job.media_kind(),
            job.metadata.format.duration
        );

        Ok(job)
    }

    /// Attach the engine arguments produced by `builder`.
    #[must_use]
    pub fn with_args<B>(mut self, builder: &B) -> Self
    where
        B: ArgumentBuilder + ?Sized,
    {
        self.args = builder.build_args(&self);
        self
    }

    /// Attach a ready-made engine argument list.
    #[must_use]
    pub fn with_raw_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Engine arguments, without the overwrite flag the supervisor injects.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn media_kind(&self) -> MediaKind {
        self.metadata.media_kind()
    }

    pub fn duration_secs(&self) -> f64 {
        self.metadata.duration_secs()
    }

    #[cfg(test)]
    pub(crate) fn for_test(metadata: MediaMetadata, args: Vec<String>) -> Self {
        Self {
            id: JobId::new(),
            input: PathBuf::from("/test/input.mkv"),
            output: PathBuf::from("/test/output.mp4"),
            metadata,
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encodewatch_common::{Format, Stream};
    use std::cell::Cell;

    fn video_metadata(duration: &str) -> MediaMetadata {
        MediaMetadata {
            format: Format {
                duration: duration.to_string(),
                ..Format::default()
            },
            streams: vec![Stream {
                codec_type: "video".to_string(),
                ..Stream::default()
            }],
        }
    }

    #[test]
    fn empty_input_is_missing() {
        let prober = |_: &Path| -> Result<MediaMetadata> { panic!("must not probe") };
        let err = JobDescriptor::probe("", "out.mp4", &prober).unwrap_err();
        assert!(matches!(err, Error::InputMissing));
    }

    #[test]
    fn nonexistent_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mkv");
        let prober = |_: &Path| -> Result<MediaMetadata> { panic!("must not probe") };

        let err = JobDescriptor::probe(&missing, "out.mp4", &prober).unwrap_err();
        match err {
            Error::InputNotFound { path } => assert_eq!(path, missing),
            other => panic!("expected InputNotFound, got {other:?}"),
        }
    }

    #[test]
    fn probe_failure_is_propagated() {
        let input = tempfile::NamedTempFile::new().unwrap();
        let prober = |_: &Path| -> Result<MediaMetadata> {
            Err(Error::probe_failed(vec!["-i".into()], "exit status: 1", "garbage"))
        };

        let err = JobDescriptor::probe(input.path(), "out.mp4", &prober).unwrap_err();
        assert!(matches!(err, Error::ProbeFailed { .. }));
        assert_eq!(err.captured_output(), Some("garbage"));
    }

    #[test]
    fn successful_probe_populates_descriptor() {
        let input = tempfile::NamedTempFile::new().unwrap();
        let calls = Cell::new(0);
        let prober = |path: &Path| -> Result<MediaMetadata> {
            calls.set(calls.get() + 1);
            assert_eq!(path, input.path());
            Ok(video_metadata("20"))
        };

        let job = JobDescriptor::probe(input.path(), "/tmp/out.mp4", &prober).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(job.input(), input.path());
        assert_eq!(job.output(), Path::new("/tmp/out.mp4"));
        assert_eq!(job.media_kind(), MediaKind::Video);
        assert_eq!(job.duration_secs(), 20.0);
        assert!(job.args().is_empty());
    }

    #[test]
    fn args_come_from_builder() {
        let job = JobDescriptor::for_test(video_metadata("10"), Vec::new());
        let builder = |job: &JobDescriptor| -> Vec<String> {
            vec![
                "-i".to_string(),
                job.input().display().to_string(),
                job.output().display().to_string(),
            ]
        };

        let job = job.with_args(&builder);
        assert_eq!(job.args(), ["-i", "/test/input.mkv", "/test/output.mp4"]);

        let job = job.with_raw_args(vec!["-version".to_string()]);
        assert_eq!(job.args(), ["-version"]);
    }
}
