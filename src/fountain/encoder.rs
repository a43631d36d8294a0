//! Cyclic fountain encoder
//!
//! Parts come in cycles of `F + R`: the `F` pure fragments in order, then
//! `R` repair parts with fresh sequence numbers. A scanner that joins
//! mid-stream sees every pure fragment again within one cycle, and repair
//! parts fill the gaps left by missed frames.

use super::{fragment_len, partition, xor_into, FragmentChooser};
use crate::codec::{checksum, Part};
use crate::constants::{
    BPS_SCALE, DEFAULT_MIN_FRAGMENT_LEN, DEFAULT_REPAIR_RATIO_BPS, MAX_MESSAGE_LEN, MAX_SEQ_LEN,
};
use crate::error::EncodeError;
use bytes::Bytes;

#[derive(Debug, Clone)]
pub struct FountainEncoder {
    message_len: usize,
    checksum: u32,
    fragment_len: usize,
    fragments: Vec<Bytes>,
    chooser: FragmentChooser,
    /// Repair parts emitted after each round of pure fragments
    repair_per_cycle: usize,
    /// Position within the current cycle
    cycle_pos: usize,
    /// Sequence number handed to the next repair part
    next_repair_seq: u32,
    /// Sequence number of the last part produced (0 before the first)
    last_seq: u32,
    parts_emitted: u64,
}

impl FountainEncoder {
    /// Split `message` into fragments of at most `max_fragment_len` bytes
    pub fn new(message: &[u8], max_fragment_len: usize) -> Result<Self, EncodeError> {
        Self::with_limits(
            message,
            DEFAULT_MIN_FRAGMENT_LEN,
            max_fragment_len,
            DEFAULT_REPAIR_RATIO_BPS,
        )
    }

    pub fn with_limits(
        message: &[u8],
        min_fragment_len: usize,
        max_fragment_len: usize,
        repair_ratio_bps: u32,
    ) -> Result<Self, EncodeError> {
        if max_fragment_len == 0 {
            return Err(EncodeError::InvalidFragmentLength {
                max: max_fragment_len,
            });
        }
        if message.len() > MAX_MESSAGE_LEN {
            return Err(EncodeError::MessageTooLarge { len: message.len() });
        }

        let fragment_len = fragment_len(message.len(), min_fragment_len, max_fragment_len);
        let count = match fragment_len {
            0 => 0,
            len => message.len().div_ceil(len),
        };
        if count > MAX_SEQ_LEN {
            return Err(EncodeError::TooManyFragments {
                count,
                max: MAX_SEQ_LEN,
            });
        }
        let fragments = partition(message, fragment_len);
        let seq_len = fragments.len();
        let repair_per_cycle =
            (seq_len as u64 * repair_ratio_bps as u64).div_ceil(BPS_SCALE as u64) as usize;

        Ok(Self {
            message_len: message.len(),
            checksum: checksum(message),
            fragment_len,
            chooser: FragmentChooser::new(seq_len),
            fragments,
            repair_per_cycle,
            cycle_pos: 0,
            next_repair_seq: seq_len as u32 + 1,
            last_seq: 0,
            parts_emitted: 0,
        })
    }

    /// Produce the next part of the infinite sequence
    ///
    /// Must not be called for an empty message (no fragments).
    pub fn next_part(&mut self) -> Part {
        let seq_len = self.fragments.len();
        let seq_num = if self.cycle_pos < seq_len {
            self.cycle_pos as u32 + 1
        } else {
            let seq = self.next_repair_seq;
            self.next_repair_seq = seq.checked_add(1).unwrap_or(seq_len as u32 + 1);
            seq
        };

        self.cycle_pos = (self.cycle_pos + 1) % self.cycle_len().max(1);
        self.last_seq = seq_num;
        self.parts_emitted += 1;

        Part {
            seq_num,
            seq_len,
            message_len: self.message_len,
            checksum: self.checksum,
            data: self.mix(seq_num),
        }
    }

    fn mix(&self, seq_num: u32) -> Bytes {
        let indexes = self.chooser.choose(seq_num, self.checksum);
        if let [index] = indexes.as_slice() {
            if let Some(fragment) = self.fragments.get(*index) {
                return fragment.clone();
            }
        }

        let mut data = vec![0u8; self.fragment_len];
        for index in indexes {
            if let Some(fragment) = self.fragments.get(index) {
                xor_into(&mut data, fragment);
            }
        }
        Bytes::from(data)
    }

    /// Restart from the first pure fragment
    pub fn reset(&mut self) {
        self.cycle_pos = 0;
        self.next_repair_seq = self.fragments.len() as u32 + 1;
        self.last_seq = 0;
        self.parts_emitted = 0;
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn fragment_len(&self) -> usize {
        self.fragment_len
    }

    pub fn message_len(&self) -> usize {
        self.message_len
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Sequence number of the last part produced
    pub fn seq_num(&self) -> u32 {
        self.last_seq
    }

    /// Parts per cycle (pure plus repair)
    pub fn cycle_len(&self) -> usize {
        self.fragments.len() + self.repair_per_cycle
    }

    pub fn repair_per_cycle(&self) -> usize {
        self.repair_per_cycle
    }

    /// Whether every pure fragment has been emitted at least once
    pub fn is_complete(&self) -> bool {
        self.parts_emitted >= self.fragments.len() as u64
    }

    /// Whether the message fits a single frame
    pub fn is_single_part(&self) -> bool {
        self.fragments.len() <= 1
    }
}
