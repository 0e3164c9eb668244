//! Command line front end
//!
//! `aac-transcode encode in.pcm out.aac` and `aac-transcode decode in.m4a
//! out.pcm` drive the two pipelines; `inspect` and `codecs` report on ADTS
//! files and on the linked encoder.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aac_transcode::{LogFormat, Result};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "aac-transcode";

/// Default filter when neither `--log-level` nor `RUST_LOG` is given
const DEFAULT_LOG_FILTER: &str = "aac_transcode=info,ffmpeg=warn";

/// Raw 16-bit PCM to AAC, and back.
#[derive(Parser, Debug)]
#[command(name = "aac-transcode")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. `debug` or `aac_transcode=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode raw s16le stereo 44.1 kHz PCM into AAC (.aac, .m4a or .mp4).
    Encode {
        /// Raw PCM input
        input: PathBuf,
        /// Destination; the extension picks the container
        output: PathBuf,
    },
    /// Decode the first audio stream of a file into raw s16le PCM.
    Decode {
        /// Compressed audio input
        input: PathBuf,
        /// Raw PCM destination
        output: PathBuf,
    },
    /// Report the ADTS frames of a raw .aac file.
    Inspect {
        /// ADTS file
        file: PathBuf,
    },
    /// Show what the linked AAC encoder accepts.
    Codecs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref(), cli.log_format);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(1)
        }
    }
}

fn run(command: Command) -> Result<()> {
    aac_transcode::init()?;
    aac_transcode::install_log_filter();
    tracing::debug!(
        "{} v{} on {}",
        APP_NAME,
        VERSION,
        aac_transcode::ffmpeg_version_info()
    );

    match command {
        Command::Encode { input, output } => {
            print_json(&aac_transcode::encode_file(&input, &output)?)
        }
        Command::Decode { input, output } => print_json(&aac_transcode::decode(&input, &output)?),
        Command::Inspect { file } => print_json(&aac_transcode::inspect_adts(&file)?),
        Command::Codecs => print_json(&aac_transcode::encoder_capabilities()?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| aac_transcode::TranscodeError::InvalidInput(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn init_logging(log_level: Option<&str>, format: LogFormat) {
    let filter = match log_level {
        Some(level) => tracing_subscriber::EnvFilter::try_new(level).ok(),
        None => tracing_subscriber::EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_encode() {
        let cli = Cli::try_parse_from([
            "aac-transcode",
            "--log-format",
            "json",
            "encode",
            "in.pcm",
            "out.m4a",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Command::Encode { input, output } => {
                assert_eq!(input, PathBuf::from("in.pcm"));
                assert_eq!(output, PathBuf::from("out.m4a"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_decode_requires_output() {
        assert!(Cli::try_parse_from(["aac-transcode", "decode", "in.m4a"]).is_err());
    }
}
