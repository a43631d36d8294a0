//! Application-wide constants
//!
//! Centralized constants to avoid duplication and ensure consistency.

// =============================================================================
// Wire format
// =============================================================================

/// URI scheme prefixed to every frame
pub const UR_SCHEME: &str = "ur";

/// Maximum accepted type tag length
pub const MAX_TYPE_LEN: usize = 64;

// =============================================================================
// Fragmentation
// =============================================================================

/// Default maximum fragment length (bytes), sized for a dense animated QR
pub const DEFAULT_MAX_FRAGMENT_LEN: usize = 400;

/// Default minimum fragment length (bytes)
pub const DEFAULT_MIN_FRAGMENT_LEN: usize = 10;

/// Repair parts per cycle, in basis points of the fragment count
pub const DEFAULT_REPAIR_RATIO_BPS: u32 = 10_000;

/// Basis points in 100%
pub const BPS_SCALE: u32 = 10_000;

/// Largest payload accepted by the encoder or announced by a frame (bytes)
pub const MAX_MESSAGE_LEN: usize = 16 * 1024 * 1024;

/// Largest fragment count accepted by the encoder or announced by a frame
pub const MAX_SEQ_LEN: usize = 65_535;

// =============================================================================
// Decoding
// =============================================================================

/// Parts a typical scan needs per pure fragment, used for progress estimates
pub const EXPECTED_PARTS_FACTOR: f64 = 1.75;

/// Progress estimate ceiling while the payload is still incomplete
pub const MAX_INCOMPLETE_PROGRESS: f64 = 0.99;

// =============================================================================
// Host
// =============================================================================

/// Default delay between displayed frames (milliseconds)
pub const DEFAULT_DISPLAY_INTERVAL_MS: u64 = 100;

/// Shutdown flag polling interval (milliseconds)
pub const SHUTDOWN_POLL_INTERVAL_MS: u64 = 100;

/// Maximum scanned line length before the line is discarded (bytes)
pub const DEFAULT_MAX_LINE_LEN: usize = 16_384;

/// Read buffer size for scanner input (bytes)
pub const SCAN_READ_BUFFER_SIZE: usize = 4096;

/// Config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "airgap-ur.toml";
