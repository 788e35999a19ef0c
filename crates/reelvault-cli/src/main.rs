//! Reelvault CLI: bulk media ingestion to S3-compatible storage and signed URL tooling.
//!
//! Storage is configured with S3_BUCKET, S3_ENDPOINT (or R2_ACCOUNT_ID) and the usual
//! AWS_* credentials; signing with SIGNING_BASE_URL and SIGNING_SECRET. A `.env` file in
//! the working directory is read first.

use anyhow::Context;
use clap::{Parser, Subcommand};
use reelvault_cli::{format_outcome, format_summary, init_tracing, LinkReport, ProgressTracker};
use reelvault_core::{describe_ttl, parse_ttl, AppError, Config, ErrorMetadata, SigningConfig};
use reelvault_services::{
    create_storage, event_channel, TokenIssuer, TokenVerifier, TransferEngine,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "reelvault", about = "Media ingestion and signed URL CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload every video file under a folder
    Upload {
        /// Local folder to scan recursively
        folder: PathBuf,
        /// Key prefix (defaults to UPLOAD_PREFIX or "video/")
        prefix: Option<String>,
        /// Upload even when the object already exists
        #[arg(long)]
        no_skip_existing: bool,
        /// Maximum concurrent uploads
        #[arg(long)]
        concurrency: Option<usize>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload a single file to an exact key
    UploadFile {
        /// Local file path
        path: PathBuf,
        /// Destination object key
        key: String,
    },
    /// Generate a signed URL
    Link {
        /// Resource path, e.g. video/intro.mp4
        resource_path: String,
        /// Lifetime: seconds or 1h, 6h, 24h, 1d, 7d, 1w, 30d, 1m
        ttl: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a signed URL against the configured secret
    Verify {
        /// Full signed URL
        url: String,
    },
    /// Check that the configured storage is reachable
    Check,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Log an engine error with its code and hint before handing it to anyhow.
fn report(error: AppError) -> anyhow::Error {
    tracing::error!(code = error.error_code(), error = %error, "Command failed");
    if let Some(action) = error.suggested_action() {
        eprintln!("hint: {}", action);
    }
    error.into()
}

fn warn_placeholders(signing: &SigningConfig) {
    for warning in signing.warnings() {
        tracing::warn!("{}", warning);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            folder,
            prefix,
            no_skip_existing,
            concurrency,
            json,
        } => upload(folder, prefix, !no_skip_existing, concurrency, json).await,
        Commands::UploadFile { path, key } => upload_file(path, key).await,
        Commands::Link {
            resource_path,
            ttl,
            json,
        } => link(&resource_path, ttl.as_deref(), json),
        Commands::Verify { url } => verify(&url),
        Commands::Check => check().await,
    }
}

async fn build_engine(config: &Config) -> anyhow::Result<TransferEngine> {
    let storage = create_storage(&config.storage)
        .await
        .context("Failed to initialize storage")?;
    Ok(TransferEngine::new(storage, &config.ingest))
}

async fn upload(
    folder: PathBuf,
    prefix: Option<String>,
    skip_existing: bool,
    concurrency: Option<usize>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let prefix = prefix.unwrap_or_else(|| config.ingest.default_prefix.clone());

    let (events_tx, mut events_rx) = event_channel();
    let mut engine = build_engine(&config).await?.with_events(events_tx);
    if let Some(n) = concurrency {
        engine = engine.with_max_concurrent(n);
    }

    let printer = tokio::spawn(async move {
        let mut tracker = ProgressTracker::new();
        while let Some(event) = events_rx.recv().await {
            if let Some(line) = tracker.observe(&event) {
                println!("{}", line);
            }
        }
    });

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling upload");
            signal_cancel.cancel();
        }
    });

    let result = engine
        .run_batch_with_cancel(&folder, &prefix, skip_existing, &cancel)
        .await;
    drop(engine);
    let _ = printer.await;
    let stats = result.map_err(report)?;

    if stats.total() == 0 && !stats.cancelled {
        eprintln!("No video files found in {}", folder.display());
    }

    if json {
        print_json(&stats)?;
    } else {
        println!();
        println!("{}", format_summary(&stats));
    }

    Ok(if stats.cancelled {
        ExitCode::from(130)
    } else if stats.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn upload_file(path: PathBuf, key: String) -> anyhow::Result<ExitCode> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let engine = build_engine(&config).await?;

    let outcome = engine.upload_single(&path, &key).await.map_err(report)?;
    println!("{}", format_outcome(&key, &outcome));

    Ok(if outcome.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn link(resource_path: &str, ttl: Option<&str>, json: bool) -> anyhow::Result<ExitCode> {
    let signing = SigningConfig::from_env().context("Failed to load signing configuration")?;
    warn_placeholders(&signing);

    let ttl_secs = match ttl {
        Some(value) => parse_ttl(value)?,
        None => signing.default_ttl_secs,
    };
    let ttl_arg = i64::try_from(ttl_secs).context("TTL is too large")?;

    let issuer = TokenIssuer::new(&signing);
    let capability = issuer.capability(resource_path, ttl_arg)?;
    let url = capability.to_url(issuer.base_url());
    let report = LinkReport::new(url, resource_path, capability.expires_at, ttl_secs);

    if json {
        print_json(&report)?;
    } else {
        println!("{}", report.url);
        match &report.expires_at_utc {
            Some(at) => eprintln!("Valid for {} (until {})", report.valid_for, at),
            None => eprintln!("Valid for {}", describe_ttl(ttl_secs)),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn verify(url: &str) -> anyhow::Result<ExitCode> {
    let signing = SigningConfig::from_env().context("Failed to load signing configuration")?;
    warn_placeholders(&signing);

    match TokenVerifier::new(&signing).verify_url(url) {
        Ok(capability) => {
            println!("valid: {}", capability.resource_path);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("invalid: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn check() -> anyhow::Result<ExitCode> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let storage = create_storage(&config.storage)
        .await
        .context("Failed to initialize storage")?;

    match storage.probe().await {
        Ok(()) => {
            println!(
                "ok: {} storage reachable at {}",
                storage.backend_type(),
                storage.location()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("unreachable: {} ({})", storage.location(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}
