//! Centralized error types
//!
//! - `EncodeError`: rejected encoder construction
//! - `DecodeError`: per-frame and per-session decoder failures
//! - `HostError`: everything the CLI host can fail on
//!
//! Use `Result<T>` as shorthand for `std::result::Result<T, HostError>`.

use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Encoder
// =============================================================================

/// Encoder construction errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Maximum fragment length must be at least one byte
    InvalidFragmentLength { max: usize },
    /// Type tag is empty or contains characters outside `a-z0-9-`
    InvalidType { ur_type: String },
    /// Message is longer than `MAX_MESSAGE_LEN`
    MessageTooLarge { len: usize },
    /// Fragment limit splits the message into more than `MAX_SEQ_LEN` parts
    TooManyFragments { count: usize, max: usize },
}

impl std::error::Error for EncodeError {}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFragmentLength { max } => {
                write!(f, "Invalid maximum fragment length: {}", max)
            }
            Self::InvalidType { ur_type } => write!(f, "Invalid type tag: '{}'", ur_type),
            Self::MessageTooLarge { len } => write!(f, "Message too large: {} bytes", len),
            Self::TooManyFragments { count, max } => {
                write!(f, "Too many fragments: {} (limit {})", count, max)
            }
        }
    }
}

// =============================================================================
// Decoder
// =============================================================================

/// Decoder errors
///
/// `Malformed`, `Foreign` and `Incomplete` leave the decoder usable.
/// `Corrupted` is final for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame string could not be parsed
    Malformed { reason: String },
    /// Frame parses but belongs to a different payload than the session
    Foreign {
        field: &'static str,
        expected: String,
        actual: String,
    },
    /// Reassembled payload does not match the advertised checksum
    Corrupted { expected: u32, actual: u32 },
    /// Result requested before every fragment was recovered
    Incomplete { recovered: usize, expected: usize },
}

impl DecodeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub(crate) fn foreign(
        field: &'static str,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::Foreign {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Whether the decoder must be reset before it can accept frames again
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Corrupted { .. })
    }
}

impl std::error::Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "Malformed frame: {}", reason),
            Self::Foreign {
                field,
                expected,
                actual,
            } => write!(
                f,
                "Foreign frame: {} is {}, session expects {}",
                field, actual, expected
            ),
            Self::Corrupted { expected, actual } => write!(
                f,
                "Payload checksum mismatch: expected {:08x}, got {:08x}",
                expected, actual
            ),
            Self::Incomplete {
                recovered,
                expected,
            } => write!(
                f,
                "Payload incomplete: {}/{} fragments recovered",
                recovered, expected
            ),
        }
    }
}

// =============================================================================
// Host
// =============================================================================

/// All CLI host errors
#[derive(Debug)]
pub enum HostError {
    // === IO ===
    /// File system operation failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Reading stdin or writing stdout failed
    Stdio { source: std::io::Error },
    /// Config file could not be read
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },

    // === Codec ===
    /// Encoder rejected the payload or its settings
    Encode(EncodeError),
    /// Decoder hit a fatal error
    Decode(DecodeError),

    // === Scan ===
    /// Scan did not complete within the configured timeout
    ScanTimeout { secs: u64 },
    /// Input ended before the payload was recovered
    ScanIncomplete { recovered: usize, expected: usize },

    // === Runtime ===
    /// Tokio runtime creation failed
    Runtime { source: std::io::Error },
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. }
            | Self::ConfigRead { source, .. }
            | Self::Stdio { source }
            | Self::Runtime { source } => Some(source),
            Self::Encode(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "IO error: {}: {}", path.display(), source),
            Self::Stdio { source } => write!(f, "Standard stream error: {}", source),
            Self::ConfigRead { path, .. } => {
                write!(f, "Cannot read config: {}", path.display())
            }
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::Encode(e) => write!(f, "{}", e),
            Self::Decode(e) => write!(f, "{}", e),
            Self::ScanTimeout { secs } => write!(f, "Scan timed out after {}s", secs),
            Self::ScanIncomplete {
                recovered,
                expected,
            } => write!(
                f,
                "Input ended before payload was recovered ({}/{} fragments)",
                recovered, expected
            ),
            Self::Runtime { .. } => write!(f, "Failed to create runtime"),
        }
    }
}

impl From<EncodeError> for HostError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<DecodeError> for HostError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// Alias for Result with HostError
pub type Result<T> = std::result::Result<T, HostError>;
