//! Display loop
//!
//! Pulls the next frame from the encoder on a fixed interval and hands it to
//! a sink (stdout for the CLI, where a QR renderer can pick it up).
//!
//! The loop does NOT handle:
//! - QR rendering (the sink's concern)
//! - Signal handling (the caller sets the shutdown flag)

use super::stats::Stats;
use crate::constants::SHUTDOWN_POLL_INTERVAL_MS;
use crate::error::{HostError, Result};
use crate::ur::Encoder;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Destination for displayed frames
pub trait FrameSink: Send {
    /// Show one frame
    fn show(&mut self, frame: &str) -> std::io::Result<()>;
}

/// Writes one frame per line and flushes after each
pub struct LineSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> FrameSink for LineSink<W> {
    fn show(&mut self, frame: &str) -> std::io::Result<()> {
        writeln!(self.writer, "{}", frame)?;
        self.writer.flush()
    }
}

/// Display loop settings
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub interval: Duration,
    /// Stop after this many frames (None = until shutdown)
    pub limit: Option<u64>,
    pub uppercase: bool,
}

/// Run the display loop until the frame limit or shutdown
///
/// Returns the number of frames shown.
pub async fn run_display<S: FrameSink>(
    encoder: &mut Encoder,
    sink: &mut S,
    options: &DisplayOptions,
    shutdown: Arc<AtomicBool>,
    stats: &Stats,
) -> Result<u64> {
    let mut ticker = tokio::time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let poll = Duration::from_millis(SHUTDOWN_POLL_INTERVAL_MS);

    let mut shown = 0u64;
    let mut announced = false;

    while !shutdown.load(Ordering::Relaxed) {
        if options.limit.is_some_and(|limit| shown >= limit) {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                let mut frame = encoder.next_part();
                if options.uppercase {
                    frame.make_ascii_uppercase();
                }
                sink.show(&frame).map_err(|e| HostError::Stdio { source: e })?;
                stats.add_shown();
                shown += 1;

                if !announced && encoder.is_complete() {
                    announced = true;
                    info!(
                        "All {} fragments shown ({} frames per cycle)",
                        encoder.fragment_count(),
                        encoder.cycle_len()
                    );
                }
            }
            _ = tokio::time::sleep(poll) => {}
        }
    }

    debug!("Display stopped after {} frames", shown);
    Ok(shown)
}
