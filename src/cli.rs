//! Command-line interface definition using clap
//!
//! Flags given here override the matching config file values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// Move binary payloads across an air gap as animated QR frame streams
#[derive(Parser, Debug)]
#[command(name = "airgap-ur")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file (default: ./airgap-ur.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the frame stream for a payload, one frame per line
    Encode {
        /// Payload type tag, e.g. crypto-psbt
        #[arg(long = "type", value_name = "TYPE", default_value = "bytes")]
        ur_type: String,

        /// Payload file (default: stdin)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Largest fragment in bytes (overrides config)
        #[arg(long, value_name = "BYTES")]
        max_fragment_len: Option<usize>,

        /// Delay between frames (overrides config)
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,

        /// Stop after this many frames (default: until interrupted)
        #[arg(long, value_name = "N")]
        count: Option<u64>,

        /// Keep frames lowercase
        #[arg(long)]
        lowercase: bool,
    },

    /// Read frame lines until the payload is recovered
    Decode {
        /// Frame lines file (default: stdin)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Write the payload here (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Give up after this many seconds (overrides config, 0 = never)
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
    },
}

// =============================================================================
// Tests
// =============================================================================
