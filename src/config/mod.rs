mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./encodewatch.toml",
        "~/.config/encodewatch/config.toml",
        "/etc/encodewatch/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let tools = [
        ("ffmpeg", &config.tools.ffmpeg_path),
        ("ffprobe", &config.tools.ffprobe_path),
    ];
    for (name, path) in tools {
        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("Configured {} path does not exist: {:?}", name, path);
            }
        }
    }

    let encode = &config.encode;
    if let Some(rate) = encode.frame_rate {
        if rate.is_nan() || rate <= 0.0 {
            anyhow::bail!("encode.frame_rate must be positive, got {}", rate);
        }
    }
    if encode.audio_channels == Some(0) {
        anyhow::bail!("encode.audio_channels cannot be 0");
    }
    if encode.audio_rate == Some(0) {
        anyhow::bail!("encode.audio_rate cannot be 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert!(config.tools.ffmpeg_path.is_none());
        assert_eq!(config.encode, encodewatch_av::EncodeOptions::default());
    }

    #[test]
    fn encode_section_is_parsed() {
        let file = write_config(
            r#"
[encode]
hide_banner = true
video_codec = "libx264"
crf = 20
frame_rate = 29.97
extra_args = ["-movflags", "+faststart"]
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(config.encode.hide_banner);
        assert_eq!(config.encode.video_codec.as_deref(), Some("libx264"));
        assert_eq!(config.encode.crf, Some(20));
        assert_eq!(config.encode.frame_rate, Some(29.97));
        assert_eq!(config.encode.extra_args, vec!["-movflags", "+faststart"]);
    }

    #[test]
    fn existing_tool_paths_are_accepted() {
        let tool = tempfile::NamedTempFile::new().unwrap();
        let file = write_config(&format!(
            "[tools]\nffmpeg_path = {:?}\n",
            tool.path().display().to_string()
        ));
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.tools.ffmpeg_path.as_deref(), Some(tool.path()));
    }

    #[test]
    fn missing_tool_path_is_rejected() {
        let file = write_config("[tools]\nffprobe_path = \"/nonexistent/ffprobe\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("ffprobe"), "{err}");
    }

    #[test]
    fn nonpositive_encode_settings_are_rejected() {
        for body in [
            "frame_rate = 0.0",
            "frame_rate = -24.0",
            "audio_channels = 0",
            "audio_rate = 0",
        ] {
            let file = write_config(&format!("[encode]\n{body}\n"));
            assert!(load_config(file.path()).is_err(), "accepted {body}");
        }
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let file = write_config("[encode\ncrf = ");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = load_config_or_default(Some(Path::new("/nonexistent/encodewatch.toml")))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
