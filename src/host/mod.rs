//! CLI host: display and scan loops around the encoder and decoder
//!
//! - `display`: timer-driven frame output (the animated QR side)
//! - `scanner`: line-driven frame input (the camera side)
//! - `stats`: counters shared by both
//!
//! The host does NOT handle QR rendering or camera capture; frames enter
//! and leave as text lines.

pub mod display;
pub mod scanner;
pub mod stats;

pub use display::{run_display, DisplayOptions, FrameSink, LineSink};
pub use scanner::{run_scan, LineParser, ScanSession, ScanSummary};
pub use stats::{Stats, StatsSnapshot};

use crate::error::{HostError, Result};
use crate::ur::{Encoder, EncoderConfig, Ur};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};

/// Everything the `encode` command needs
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub ur_type: String,
    /// Payload file (None = stdin)
    pub input: Option<PathBuf>,
    pub encoder: EncoderConfig,
    pub display: DisplayOptions,
}

/// Everything the `decode` command needs
#[derive(Debug, Clone)]
pub struct DecodeJob {
    /// Frame lines file (None = stdin)
    pub input: Option<PathBuf>,
    /// Payload destination (None = stdout)
    pub output: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub max_line_len: usize,
}

/// Set `shutdown` on SIGINT/SIGTERM (Ctrl-C elsewhere)
pub fn spawn_shutdown_listener(shutdown: Arc<AtomicBool>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        tokio::spawn(async move {
            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Cannot install signal handlers: {}", e);
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
            shutdown.store(true, Ordering::SeqCst);
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.store(true, Ordering::SeqCst);
        });
    }
}

/// Read the whole payload from a file or stdin
pub async fn read_payload(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => tokio::fs::read(path).await.map_err(|e| HostError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
        None => {
            let mut payload = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut payload)
                .await
                .map_err(|e| HostError::Stdio { source: e })?;
            Ok(payload)
        }
    }
}

/// Write the recovered payload to a file or stdout
pub async fn write_payload(path: Option<&Path>, payload: &[u8]) -> Result<()> {
    match path {
        Some(path) => tokio::fs::write(path, payload)
            .await
            .map_err(|e| HostError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(payload)
                .await
                .map_err(|e| HostError::Stdio { source: e })?;
            stdout
                .flush()
                .await
                .map_err(|e| HostError::Stdio { source: e })
        }
    }
}

/// Encode a payload and show its frames until the limit or shutdown
pub async fn run_encode(job: &EncodeJob, shutdown: Arc<AtomicBool>) -> Result<u64> {
    let payload = read_payload(job.input.as_deref()).await?;
    let ur = Ur::new(job.ur_type.as_str(), payload)?;
    let mut encoder = Encoder::with_config(ur, &job.encoder)?;

    info!(
        "Showing '{}' payload: {} bytes in {} fragments, every {:?}",
        job.ur_type,
        encoder.ur().message().len(),
        encoder.fragment_count(),
        job.display.interval
    );

    let stats = Stats::new();
    let mut sink = LineSink::new(std::io::stdout());
    run_display(&mut encoder, &mut sink, &job.display, shutdown, &stats).await
}

/// Scan frames until the payload is recovered, then write it out
pub async fn run_decode(job: &DecodeJob, shutdown: Arc<AtomicBool>) -> Result<ScanSummary> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = match &job.input {
        Some(path) => Box::new(tokio::fs::File::open(path).await.map_err(|e| HostError::Io {
            path: path.clone(),
            source: e,
        })?),
        None => Box::new(tokio::io::stdin()),
    };

    let mut session = ScanSession::new(Arc::new(Stats::new()));
    scan_with_timeout(reader, &mut session, job, shutdown).await?;

    let ur = session.finish()?;
    write_payload(job.output.as_deref(), ur.message()).await?;

    session.summary().ok_or(HostError::ScanIncomplete {
        recovered: 0,
        expected: 0,
    })
}

async fn scan_with_timeout<R: AsyncRead + Unpin>(
    reader: R,
    session: &mut ScanSession,
    job: &DecodeJob,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    let scan = run_scan(reader, session, job.max_line_len, shutdown);
    match job.timeout {
        Some(limit) => tokio::time::timeout(limit, scan)
            .await
            .map_err(|_| HostError::ScanTimeout {
                secs: limit.as_secs(),
            })?,
        None => scan.await,
    }
}
