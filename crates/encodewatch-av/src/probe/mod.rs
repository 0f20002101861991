//! Media metadata probing.
//!
//! A [`JobDescriptor`](crate::JobDescriptor) needs the source duration and
//! stream layout before progress can be normalized. Anything implementing
//! [`Probe`] can supply it; [`FfprobeProber`] shells out to ffprobe.

mod ffprobe;

pub use ffprobe::FfprobeProber;

use crate::Result;
use encodewatch_common::MediaMetadata;
use std::path::Path;

/// Source of media metadata for a job input.
pub trait Probe {
    /// Inspect `path` and return its metadata.
    ///
    /// Failures should be reported as [`Error::ProbeFailed`](crate::Error::ProbeFailed).
    fn probe(&self, path: &Path) -> Result<MediaMetadata>;
}

impl<F> Probe for F
where
    F: Fn(&Path) -> Result<MediaMetadata>,
{
    fn probe(&self, path: &Path) -> Result<MediaMetadata> {
        self(path)
    }
}
