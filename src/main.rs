//! airgap-ur - animated QR frame streams for air-gapped payload transfer
//!
//! Usage:
//!   airgap-ur encode [--type T] [FILE]   Print frames for a payload, one per line
//!   airgap-ur decode [FILE] [-o OUT]     Read frame lines until the payload is recovered

use airgap_ur::cli::{Cli, Command};
use airgap_ur::config::{self, Config};
use airgap_ur::error::{HostError, Result};
use airgap_ur::host::{self, DecodeJob, DisplayOptions, EncodeJob};
use airgap_ur::logging::init_tracing;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref());
    debug!("Config: {:?}", config);

    let rt = tokio::runtime::Runtime::new().map_err(|e| HostError::Runtime { source: e })?;

    let result = rt.block_on(execute(cli.command, config));

    // A pending stdin read would otherwise hold the runtime open
    rt.shutdown_background();
    result
}

async fn execute(command: Command, config: Config) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    host::spawn_shutdown_listener(shutdown.clone());

    match command {
        Command::Encode {
            ur_type,
            input,
            max_fragment_len,
            interval_ms,
            count,
            lowercase,
        } => {
            let overrides = EncodeOverrides {
                max_fragment_len,
                interval_ms,
                count,
                lowercase,
            };
            let job = encode_job(ur_type, input, overrides, &config)?;
            let shown = host::run_encode(&job, shutdown).await?;
            info!("Shown {} frames", shown);
            Ok(())
        }
        Command::Decode {
            input,
            output,
            timeout_secs,
        } => {
            let job = decode_job(input, output, timeout_secs, &config);
            let summary = host::run_decode(&job, shutdown).await?;
            // Summary goes to stderr; stdout may carry the payload
            match serde_json::to_string(&summary) {
                Ok(json) => eprintln!("{}", json),
                Err(e) => debug!("Cannot serialize summary: {}", e),
            }
            Ok(())
        }
    }
}

/// `encode` flags that override config values
struct EncodeOverrides {
    max_fragment_len: Option<usize>,
    interval_ms: Option<u64>,
    count: Option<u64>,
    lowercase: bool,
}

/// Merge `encode` flags over the config file
fn encode_job(
    ur_type: String,
    input: Option<PathBuf>,
    overrides: EncodeOverrides,
    config: &Config,
) -> Result<EncodeJob> {
    let mut encoder = config.encoder.clone();
    if let Some(max) = overrides.max_fragment_len {
        encoder.max_fragment_len = max;
    }
    let interval_ms = overrides.interval_ms.unwrap_or(config.display.interval_ms);
    if interval_ms == 0 {
        return Err(HostError::ConfigValidation {
            field: "interval_ms",
            reason: "must be at least 1".into(),
        });
    }

    Ok(EncodeJob {
        ur_type,
        input,
        encoder,
        display: DisplayOptions {
            interval: Duration::from_millis(interval_ms),
            limit: overrides.count,
            uppercase: config.display.uppercase && !overrides.lowercase,
        },
    })
}

/// Merge `decode` flags over the config file
fn decode_job(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    timeout_secs: Option<u64>,
    config: &Config,
) -> DecodeJob {
    let timeout_secs = timeout_secs.unwrap_or(config.scanner.timeout_secs);
    DecodeJob {
        input,
        output,
        timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        max_line_len: config.scanner.max_line_len,
    }
}
