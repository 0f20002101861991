mod cli;

use encodewatch::config;
use encodewatch_av::{tail, tools, EncodeOptions, FfprobeProber, JobDescriptor, Probe, Supervisor};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use futures::StreamExt;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "encodewatch=debug,encodewatch_av=trace,encodewatch_common=debug".to_string()
        } else {
            "encodewatch=info,encodewatch_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Transcode {
            input,
            output,
            video_codec,
            audio_codec,
            crf,
            preset,
            json,
            extra,
        } => {
            let overrides = EncodeOptions {
                video_codec,
                audio_codec,
                crf,
                preset,
                extra_args: extra,
                ..EncodeOptions::default()
            };
            transcode(&input, &output, overrides, json, cli.config.as_deref())
        }
        Commands::Probe { file, json } => probe_file(&file, json, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("encodewatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn transcode(
    input: &Path,
    output: &Path,
    overrides: EncodeOptions,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let ffmpeg = tools::get_tool_path(tools::FFMPEG, config.tools.ffmpeg_path.as_deref())?;
    let prober = FfprobeProber::locate(config.tools.ffprobe_path.as_deref())?;

    tracing::info!("Probing {:?}", input);
    let options = overrides.or(&config.encode);
    let job = JobDescriptor::probe(input, output, &prober)
        .with_context(|| format!("Failed to prepare job for {:?}", input))?
        .with_args(&options);

    if !json {
        println!("Job: {}", job.id());
        println!("Input: {} ({}, {}s)", input.display(), job.media_kind(), job.duration_secs());
        println!("Output: {}", output.display());
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_job(job, ffmpeg, json))
}

async fn run_job(job: JobDescriptor, ffmpeg: PathBuf, json: bool) -> Result<()> {
    let started = Supervisor::new(ffmpeg).start(&job);
    if let Some(ref err) = started.attach_error {
        tracing::warn!("Running without progress: {}", err);
    }

    let mut progress = tail(started.diagnostics, &job);
    let report = async {
        while let Some(update) = progress.next().await {
            if json {
                println!("{}", serde_json::to_string(&update)?);
            } else {
                println!(
                    "{:6.2}%  time={}  bitrate={}",
                    update.progress, update.current_time, update.current_bitrate
                );
            }
        }
        Ok::<_, anyhow::Error>(())
    };

    let (reported, finished) = tokio::join!(report, started.completion.wait());
    finished.with_context(|| format!("Transcode of {:?} failed", job.input()))?;
    reported?;

    if !json {
        println!("\nTranscode complete: {}", job.output().display());
    }
    Ok(())
}

fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let prober = FfprobeProber::locate(config.tools.ffprobe_path.as_deref())?;
    let metadata = prober.probe(file)?;

    if json {
        let json_str = serde_json::to_string_pretty(&metadata)?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!(
        "Container: {}",
        metadata
            .format
            .format_long_name
            .as_deref()
            .unwrap_or(&metadata.format.format_name)
    );
    println!("Kind: {}", metadata.media_kind());
    println!("Duration: {:.2}s", metadata.duration_secs());
    if let Some(ref bit_rate) = metadata.format.bit_rate {
        println!("Bitrate: {} b/s", bit_rate);
    }

    println!("\nStreams: {}", metadata.streams.len());
    for stream in &metadata.streams {
        print!(
            "  [{}] {} {}",
            stream.index,
            stream.codec_type,
            stream.codec_name.as_deref().unwrap_or("unknown")
        );
        if let (Some(width), Some(height)) = (stream.width, stream.height) {
            print!(" {}x{}", width, height);
        }
        if let Some(channels) = stream.channels {
            print!(" {}ch", channels);
        }
        if let Some(ref rate) = stream.sample_rate {
            print!(" {} Hz", rate);
        }
        println!();
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = tools::check_tools(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    );
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to run transcodes.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!(
                "  ffmpeg: {}",
                config
                    .tools
                    .ffmpeg_path
                    .as_deref()
                    .map_or("(PATH)".into(), |p| p.display().to_string())
            );
            println!(
                "  ffprobe: {}",
                config
                    .tools
                    .ffprobe_path
                    .as_deref()
                    .map_or("(PATH)".into(), |p| p.display().to_string())
            );
            let encode = &config.encode;
            println!(
                "  Video codec: {}",
                encode.video_codec.as_deref().unwrap_or("(ffmpeg default)")
            );
            println!(
                "  Audio codec: {}",
                encode.audio_codec.as_deref().unwrap_or("(ffmpeg default)")
            );
            if let Some(crf) = encode.crf {
                println!("  CRF: {}", crf);
            }
            println!("  Extra args: {}", encode.extra_args.len());
        }
        None => {
            println!("No config file specified, using defaults");
        }
    }

    Ok(())
}
