//! Engine argument construction.
//!
//! The supervisor treats a job's arguments as opaque. [`EncodeOptions`] is the
//! stock [`ArgumentBuilder`] covering the common ffmpeg encode settings; any
//! `Fn(&JobDescriptor) -> Vec<String>` works as well.

use crate::JobDescriptor;
use serde::{Deserialize, Serialize};

/// Produces the ordered engine argument list for a job.
///
/// The leading overwrite flag is injected by the supervisor and must not be
/// part of the returned list.
pub trait ArgumentBuilder {
    fn build_args(&self, job: &JobDescriptor) -> Vec<String>;
}

impl<F> ArgumentBuilder for F
where
    F: Fn(&JobDescriptor) -> Vec<String>,
{
    fn build_args(&self, job: &JobDescriptor) -> Vec<String> {
        self(job)
    }
}

/// Common encode settings rendered as ffmpeg arguments.
///
/// Unset options are left to ffmpeg's defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EncodeOptions {
    /// Suppress the ffmpeg banner on stderr.
    #[serde(default)]
    pub hide_banner: bool,

    /// Input seek position, e.g. `00:01:00`.
    #[serde(default)]
    pub seek: Option<String>,

    /// Limit output duration, e.g. `30` or `00:00:30`.
    #[serde(default)]
    pub duration: Option<String>,

    #[serde(default)]
    pub video_codec: Option<String>,

    /// e.g. `2M`.
    #[serde(default)]
    pub video_bitrate: Option<String>,

    #[serde(default)]
    pub frame_rate: Option<f64>,

    /// `WIDTHxHEIGHT`.
    #[serde(default)]
    pub resolution: Option<String>,

    /// e.g. `16:9`.
    #[serde(default)]
    pub aspect: Option<String>,

    #[serde(default)]
    pub pixel_format: Option<String>,

    #[serde(default)]
    pub preset: Option<String>,

    #[serde(default)]
    pub crf: Option<u32>,

    #[serde(default)]
    pub audio_codec: Option<String>,

    /// e.g. `192k`.
    #[serde(default)]
    pub audio_bitrate: Option<String>,

    #[serde(default)]
    pub audio_channels: Option<u32>,

    #[serde(default)]
    pub audio_rate: Option<u32>,

    /// Raw arguments placed just before the output path.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl EncodeOptions {
    /// Fill every unset option in `self` from `defaults`.
    #[must_use]
    pub fn or(self, defaults: &EncodeOptions) -> Self {
        Self {
            hide_banner: self.hide_banner || defaults.hide_banner,
            seek: self.seek.or_else(|| defaults.seek.clone()),
            duration: self.duration.or_else(|| defaults.duration.clone()),
            video_codec: self.video_codec.or_else(|| defaults.video_codec.clone()),
            video_bitrate: self.video_bitrate.or_else(|| defaults.video_bitrate.clone()),
            frame_rate: self.frame_rate.or(defaults.frame_rate),
            resolution: self.resolution.or_else(|| defaults.resolution.clone()),
            aspect: self.aspect.or_else(|| defaults.aspect.clone()),
            pixel_format: self.pixel_format.or_else(|| defaults.pixel_format.clone()),
            preset: self.preset.or_else(|| defaults.preset.clone()),
            crf: self.crf.or(defaults.crf),
            audio_codec: self.audio_codec.or_else(|| defaults.audio_codec.clone()),
            audio_bitrate: self.audio_bitrate.or_else(|| defaults.audio_bitrate.clone()),
            audio_channels: self.audio_channels.or(defaults.audio_channels),
            audio_rate: self.audio_rate.or(defaults.audio_rate),
            extra_args: if self.extra_args.is_empty() {
                defaults.extra_args.clone()
            } else {
                self.extra_args
            },
        }
    }
}

impl ArgumentBuilder for EncodeOptions {
    fn build_args(&self, job: &JobDescriptor) -> Vec<String> {
        let mut args = Vec::new();

        if self.hide_banner {
            args.push("-hide_banner".to_string());
        }
        if let Some(seek) = &self.seek {
            push_pair(&mut args, "-ss", seek);
        }

        push_pair(&mut args, "-i", job.input().to_string_lossy());

        if let Some(duration) = &self.duration {
            push_pair(&mut args, "-t", duration);
        }
        if let Some(codec) = &self.video_codec {
            push_pair(&mut args, "-c:v", codec);
        }
        if let Some(bitrate) = &self.video_bitrate {
            push_pair(&mut args, "-b:v", bitrate);
        }
        if let Some(rate) = self.frame_rate {
            push_pair(&mut args, "-r", rate.to_string());
        }
        if let Some(resolution) = &self.resolution {
            push_pair(&mut args, "-s", resolution);
        }
        if let Some(aspect) = &self.aspect {
            push_pair(&mut args, "-aspect", aspect);
        }
        if let Some(pix_fmt) = &self.pixel_format {
            push_pair(&mut args, "-pix_fmt", pix_fmt);
        }
        if let Some(preset) = &self.preset {
            push_pair(&mut args, "-preset", preset);
        }
        if let Some(crf) = self.crf {
            push_pair(&mut args, "-crf", crf.to_string());
        }
        if let Some(codec) = &self.audio_codec {
            push_pair(&mut args, "-c:a", codec);
        }
        if let Some(bitrate) = &self.audio_bitrate {
            push_pair(&mut args, "-b:a", bitrate);
        }
        if let Some(channels) = self.audio_channels {
            push_pair(&mut args, "-ac", channels.to_string());
        }
        if let Some(rate) = self.audio_rate {
            push_pair(&mut args, "-ar", rate.to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args.push(job.output().to_string_lossy().into_owned());
        args
    }
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: impl AsRef<str>) {
    args.push(flag.to_string());
    args.push(value.as_ref().to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use encodewatch_common::MediaMetadata;

    fn job() -> JobDescriptor {
        JobDescriptor::for_test(MediaMetadata::default(), Vec::new())
    }

    #[test]
    fn default_options_only_name_input_and_output() {
        let args = EncodeOptions::default().build_args(&job());
        assert_eq!(args, vec!["-i", "/test/input.mkv", "/test/output.mp4"]);
    }

    #[test]
    fn options_render_in_ffmpeg_order() {
        let options = EncodeOptions {
            hide_banner: true,
            seek: Some("00:01:00".into()),
            duration: Some("30".into()),
            video_codec: Some("libx264".into()),
            video_bitrate: Some("2M".into()),
            frame_rate: Some(23.976),
            resolution: Some("1280x720".into()),
            aspect: Some("16:9".into()),
            pixel_format: Some("yuv420p".into()),
            preset: Some("slow".into()),
            crf: Some(18),
            audio_codec: Some("aac".into()),
            audio_bitrate: Some("192k".into()),
            audio_channels: Some(2),
            audio_rate: Some(48000),
            extra_args: vec!["-movflags".into(), "+faststart".into()],
        };

        let args = options.build_args(&job());
        assert_eq!(
            args,
            vec![
                "-hide_banner", "-ss", "00:01:00", "-i", "/test/input.mkv", "-t", "30",
                "-c:v", "libx264", "-b:v", "2M", "-r", "23.976", "-s", "1280x720",
                "-aspect", "16:9", "-pix_fmt", "yuv420p", "-preset", "slow", "-crf", "18",
                "-c:a", "aac", "-b:a", "192k", "-ac", "2", "-ar", "48000",
                "-movflags", "+faststart", "/test/output.mp4",
            ]
        );
    }

    #[test]
    fn overwrite_flag_is_never_emitted() {
        let args = EncodeOptions {
            hide_banner: true,
            ..EncodeOptions::default()
        }
        .build_args(&job());
        assert!(!args.iter().any(|a| a == "-y"));
    }

    #[test]
    fn explicit_options_win_over_defaults() {
        let defaults = EncodeOptions {
            video_codec: Some("libx265".into()),
            crf: Some(22),
            extra_args: vec!["-map".into(), "0".into()],
            ..EncodeOptions::default()
        };
        let merged = EncodeOptions {
            crf: Some(18),
            ..EncodeOptions::default()
        }
        .or(&defaults);

        assert_eq!(merged.video_codec.as_deref(), Some("libx265"));
        assert_eq!(merged.crf, Some(18));
        assert_eq!(merged.extra_args, vec!["-map", "0"]);
    }
}
