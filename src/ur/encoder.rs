//! Frame stream encoder
//!
//! Wraps the fountain encoder and renders each part as a wire string. A
//! payload that fits one fragment is emitted as the same single-part frame
//! on every call.

use super::Ur;
use crate::codec::{encode_frame, Frame};
use crate::constants::{DEFAULT_MAX_FRAGMENT_LEN, DEFAULT_MIN_FRAGMENT_LEN, DEFAULT_REPAIR_RATIO_BPS};
use crate::error::EncodeError;
use crate::fountain::FountainEncoder;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fragmentation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Upper bound on fragment bytes per frame
    pub max_fragment_len: usize,
    /// Lower bound on fragment bytes per frame (clamped to the maximum)
    pub min_fragment_len: usize,
    /// Repair parts per cycle in basis points of the fragment count
    /// (10000 = one repair part per pure fragment, 0 = pure fragments only)
    pub repair_ratio_bps: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_fragment_len: DEFAULT_MAX_FRAGMENT_LEN,
            min_fragment_len: DEFAULT_MIN_FRAGMENT_LEN,
            repair_ratio_bps: DEFAULT_REPAIR_RATIO_BPS,
        }
    }
}

/// Produces the frame strings for one payload
#[derive(Debug, Clone)]
pub struct Encoder {
    ur: Ur,
    fountain: FountainEncoder,
    /// Cached frame when the payload fits one fragment
    single: Option<String>,
    parts_emitted: u64,
}

impl Encoder {
    /// Encoder with default settings and the given fragment limit
    pub fn new(ur: Ur, max_fragment_len: usize) -> Result<Self, EncodeError> {
        Self::with_config(
            ur,
            &EncoderConfig {
                max_fragment_len,
                ..EncoderConfig::default()
            },
        )
    }

    pub fn with_config(ur: Ur, config: &EncoderConfig) -> Result<Self, EncodeError> {
        let fountain = FountainEncoder::with_limits(
            ur.message(),
            config.min_fragment_len,
            config.max_fragment_len,
            config.repair_ratio_bps,
        )?;

        let single = fountain.is_single_part().then(|| {
            encode_frame(&Frame::Single {
                ur_type: ur.ur_type().to_string(),
                message: ur.message().clone(),
            })
        });

        debug!(
            "Encoder for '{}': {} bytes, {} fragments of {} bytes, cycle {}",
            ur.ur_type(),
            ur.message().len(),
            fountain.fragment_count(),
            fountain.fragment_len(),
            fountain.cycle_len()
        );

        Ok(Self {
            ur,
            fountain,
            single,
            parts_emitted: 0,
        })
    }

    /// Next frame of the infinite, deterministic sequence
    pub fn next_part(&mut self) -> String {
        self.parts_emitted += 1;
        if let Some(single) = &self.single {
            return single.clone();
        }

        let part = self.fountain.next_part();
        encode_frame(&Frame::Multi {
            ur_type: self.ur.ur_type().to_string(),
            part,
        })
    }

    /// Restart the sequence from its first frame
    pub fn reset(&mut self) {
        self.fountain.reset();
        self.parts_emitted = 0;
    }

    pub fn ur(&self) -> &Ur {
        &self.ur
    }

    pub fn is_single_part(&self) -> bool {
        self.single.is_some()
    }

    /// Pure fragment count (1 for a single-part payload)
    pub fn fragment_count(&self) -> usize {
        self.fountain.fragment_count().max(1)
    }

    pub fn fragment_len(&self) -> usize {
        self.fountain.fragment_len()
    }

    /// Sequence number of the last multi-part frame (0 before the first)
    pub fn seq_num(&self) -> u32 {
        self.fountain.seq_num()
    }

    /// Frames per cycle
    pub fn cycle_len(&self) -> usize {
        if self.is_single_part() {
            1
        } else {
            self.fountain.cycle_len()
        }
    }

    pub fn parts_emitted(&self) -> u64 {
        self.parts_emitted
    }

    /// Whether every fragment has been shown at least once
    pub fn is_complete(&self) -> bool {
        if self.is_single_part() {
            self.parts_emitted > 0
        } else {
            self.fountain.is_complete()
        }
    }
}
