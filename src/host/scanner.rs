//! Scan loop
//!
//! A camera-side reader (or a pipe from one) delivers decoded QR strings as
//! text lines. `LineParser` splits the byte stream into lines, and
//! `ScanSession` feeds each line to the decoder and keeps the counters.

use super::stats::Stats;
use crate::constants::{SCAN_READ_BUFFER_SIZE, SHUTDOWN_POLL_INTERVAL_MS};
use crate::error::{DecodeError, HostError, Result};
use crate::fountain::Receipt;
use crate::ur::{Decoder, Ur};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

// =============================================================================
// Line splitting
// =============================================================================

/// Splits a byte stream into trimmed, non-empty text lines
pub struct LineParser {
    buffer: Vec<u8>,
    /// Lines longer than this are dropped whole
    max_line_len: usize,
    /// Inside an oversize line; skip until the next newline
    discarding: bool,
}

impl LineParser {
    pub fn new(max_line_len: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(1024),
            max_line_len,
            discarding: false,
        }
    }

    /// Feed new data and extract complete lines
    pub fn feed(&mut self, data: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in data {
            if byte == b'\n' {
                if self.discarding {
                    self.discarding = false;
                    self.buffer.clear();
                } else if let Some(line) = self.take_line() {
                    lines.push(line);
                }
                continue;
            }
            if self.discarding {
                continue;
            }

            self.buffer.push(byte);
            if self.buffer.len() > self.max_line_len {
                warn!("Discarding line longer than {} bytes", self.max_line_len);
                self.buffer.clear();
                self.discarding = true;
            }
        }

        lines
    }

    /// Flush a final line that had no trailing newline
    pub fn finish(&mut self) -> Option<String> {
        if self.discarding {
            self.discarding = false;
            self.buffer.clear();
            return None;
        }
        self.take_line()
    }

    fn take_line(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.buffer);
        // Non-UTF-8 lines cannot be frames
        let text = String::from_utf8(raw).ok()?;
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

// =============================================================================
// Scan session
// =============================================================================

/// Summary printed once a payload is recovered
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub ur_type: String,
    pub message_len: usize,
    pub fragments: usize,
    pub accepted: u64,
    pub duplicate: u64,
    pub malformed: u64,
    pub foreign: u64,
}

/// Decoder plus bookkeeping for one scan
pub struct ScanSession {
    decoder: Decoder,
    stats: Arc<Stats>,
}

impl ScanSession {
    pub fn new(stats: Arc<Stats>) -> Self {
        Self {
            decoder: Decoder::new(),
            stats,
        }
    }

    /// Process one scanned line
    ///
    /// Returns `Ok(true)` once the payload is complete. Malformed and
    /// foreign frames are counted and skipped; corruption is returned.
    pub fn process_line(&mut self, line: &str) -> Result<bool> {
        match self.decoder.receive(line) {
            Ok(Receipt::Accepted) => {
                self.stats.add_accepted();
                info!(
                    "Progress {:.0}% ({}/{} fragments, {} parts)",
                    self.decoder.estimated_percent_complete() * 100.0,
                    self.decoder.recovered_fragment_count(),
                    self.decoder.expected_fragment_count(),
                    self.decoder.processed_parts_count()
                );
            }
            Ok(Receipt::Duplicate) => {
                self.stats.add_duplicate();
                debug!("Duplicate frame");
            }
            Err(e @ DecodeError::Foreign { .. }) => {
                self.stats.add_foreign();
                warn!("Skipping frame: {}", e);
            }
            Err(e) if e.is_fatal() => return Err(HostError::Decode(e)),
            Err(e) => {
                self.stats.add_malformed();
                warn!("Skipping line: {}", e);
            }
        }
        Ok(self.decoder.is_complete())
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// The recovered payload, or why there is none
    pub fn finish(&self) -> Result<Ur> {
        match self.decoder.result() {
            Ok(ur) => Ok(ur.clone()),
            Err(DecodeError::Incomplete {
                recovered,
                expected,
            }) => Err(HostError::ScanIncomplete {
                recovered,
                expected,
            }),
            Err(e) => Err(HostError::Decode(e)),
        }
    }

    pub fn summary(&self) -> Option<ScanSummary> {
        let ur = self.decoder.result().ok()?;
        let stats = self.stats.snapshot();
        Some(ScanSummary {
            ur_type: ur.ur_type().to_string(),
            message_len: ur.message().len(),
            fragments: self.decoder.expected_fragment_count(),
            accepted: stats.accepted,
            duplicate: stats.duplicate,
            malformed: stats.malformed,
            foreign: stats.foreign,
        })
    }
}

/// Read lines from `reader` into `session` until complete, EOF or shutdown
pub async fn run_scan<R: AsyncRead + Unpin>(
    mut reader: R,
    session: &mut ScanSession,
    max_line_len: usize,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    let mut parser = LineParser::new(max_line_len);
    let mut buf = vec![0u8; SCAN_READ_BUFFER_SIZE];
    let poll = Duration::from_millis(SHUTDOWN_POLL_INTERVAL_MS);

    while !shutdown.load(Ordering::Relaxed) {
        tokio::select! {
            read = reader.read(&mut buf) => {
                let n = read.map_err(|e| HostError::Stdio { source: e })?;
                if n == 0 {
                    if let Some(line) = parser.finish() {
                        session.process_line(&line)?;
                    }
                    debug!("Scan input closed");
                    break;
                }
                for line in parser.feed(&buf[..n]) {
                    if session.process_line(&line)? {
                        return Ok(());
                    }
                }
            }
            _ = tokio::time::sleep(poll) => {}
        }
    }

    Ok(())
}
