use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediabridge_core::{
    load_config_or_default, validate_config, Config, ConverterError, FormatSet, MediaInput,
    MediaPlugin, ReadableFormat, WritableFormat, WriteOutcome,
};

const USAGE: &str = "\
usage: mediabridge probe <file>...
       mediabridge convert <format> <input> <output>";

/// Conversions failing with a retryable error are attempted this many times.
const CONVERT_ATTEMPTS: u32 = 2;

#[derive(Debug)]
enum Command {
    Probe(Vec<PathBuf>),
    Convert {
        format: String,
        input: PathBuf,
        output: PathBuf,
    },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        match args {
            [cmd, files @ ..] if cmd == "probe" && !files.is_empty() => {
                Ok(Self::Probe(files.iter().map(PathBuf::from).collect()))
            }
            [cmd, format, input, output] if cmd == "convert" => Ok(Self::Convert {
                format: format.to_lowercase(),
                input: PathBuf::from(input),
                output: PathBuf::from(output),
            }),
            _ => bail!("{}", USAGE),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    // Determine config path
    let config_path = std::env::var("MEDIABRIDGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("mediabridge.toml"));

    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Extracting binaries to {:?}", config.binaries.extract_dir());

    // Resolution spawns blocking processes; keep it off the runtime threads.
    let mut plugin = tokio::task::spawn_blocking(move || initialise(&config))
        .await
        .context("Binary resolution task panicked")??;

    let mut registry = FormatSet::new();
    plugin.load(&mut registry);

    let result = match command {
        Command::Probe(files) => probe(&registry, &files).await,
        Command::Convert {
            format,
            input,
            output,
        } => convert(&registry, &format, &input, &output).await,
    };

    plugin.unload(&mut registry);
    result
}

fn initialise(config: &Config) -> Result<MediaPlugin> {
    MediaPlugin::initialise(config).context("Failed to locate the media engine")
}

async fn probe(registry: &FormatSet, files: &[PathBuf]) -> Result<()> {
    for file in files {
        let mut matched = Vec::new();
        for reader in registry.readers() {
            match reader.read(MediaInput::File(file.clone())).await {
                Ok(_staged) => matched.push(reader.name().to_string()),
                Err(e) if e.is_no_match() => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to probe {:?}", file));
                }
            }
        }

        if matched.is_empty() {
            println!("{}: unknown", file.display());
        } else {
            println!("{}: {}", file.display(), matched.join(", "));
        }
    }
    Ok(())
}

async fn convert(registry: &FormatSet, format: &str, input: &Path, output: &Path) -> Result<()> {
    let Some(writer) = registry.writable(format) else {
        bail!(
            "No writer registered for {:?} (available: {})",
            format,
            registry.writable_names().join(", ")
        );
    };

    let mut attempt = 1;
    loop {
        let mut destination = tokio::fs::File::create(output)
            .await
            .with_context(|| format!("Failed to create {:?}", output))?;

        let outcome = writer
            .write(MediaInput::File(input.to_path_buf()), &mut destination)
            .await;
        drop(destination);

        match outcome {
            WriteOutcome::Success => {
                info!("Wrote {} to {:?}", format, output);
                return Ok(());
            }
            WriteOutcome::Fail(e) if should_retry(&e, attempt) => {
                warn!("Attempt {} to convert {:?} failed, retrying: {}", attempt, input, e);
                attempt += 1;
            }
            WriteOutcome::Fail(e) => {
                let _ = tokio::fs::remove_file(output).await;
                return Err(e).with_context(|| format!("Failed to convert {:?}", input));
            }
            WriteOutcome::WrongFormat => {
                let _ = tokio::fs::remove_file(output).await;
                bail!("{:?} cannot be written as {}", input, format);
            }
        }
    }
}

/// Whether a failed conversion is worth another attempt.
fn should_retry(error: &ConverterError, attempt: u32) -> bool {
    attempt < CONVERT_ATTEMPTS && error.is_retryable()
}
