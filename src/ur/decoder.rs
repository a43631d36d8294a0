//! Frame stream decoder
//!
//! Accepts scanned frame strings in any order. The first accepted frame
//! fixes the type tag and session header; frames of another payload are
//! rejected as foreign without disturbing progress.

use super::Ur;
use crate::codec::{checksum, decode_frame, Frame, Part};
use crate::error::DecodeError;
use crate::fountain::{FountainDecoder, Receipt};
use bytes::Bytes;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Decoder {
    expected_type: Option<String>,
    fountain: FountainDecoder,
    result: Option<Ur>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one scanned frame string
    ///
    /// `Malformed` and `Foreign` errors leave the decoder unchanged.
    /// `Corrupted` ends the session until `reset`.
    pub fn receive(&mut self, text: &str) -> Result<Receipt, DecodeError> {
        if let Err(e) = self.fountain.result() {
            if e.is_fatal() {
                return Err(e);
            }
        }

        let frame = decode_frame(text)?;
        if let Some(expected) = &self.expected_type {
            if expected != frame.ur_type() {
                return Err(DecodeError::foreign("type", expected, frame.ur_type()));
            }
        }

        let receipt = match frame {
            Frame::Single { ur_type, message } => self.receive_single(ur_type, message)?,
            Frame::Multi { ur_type, part } => self.receive_part(ur_type, &part)?,
        };
        Ok(receipt)
    }

    fn receive_single(&mut self, ur_type: String, message: Bytes) -> Result<Receipt, DecodeError> {
        if let Some(done) = &self.result {
            same_payload(done.message(), message.len(), checksum(&message))?;
            return Ok(Receipt::Duplicate);
        }

        if let Some(header) = self.fountain.header() {
            let actual = checksum(&message);
            if actual != header.checksum {
                return Err(DecodeError::foreign(
                    "checksum",
                    format_args!("{:08x}", header.checksum),
                    format_args!("{:08x}", actual),
                ));
            }
            if message.len() != header.message_len {
                return Err(DecodeError::foreign(
                    "message length",
                    header.message_len,
                    message.len(),
                ));
            }
        }

        debug!("Single-part '{}' payload: {} bytes", ur_type, message.len());
        self.expected_type = Some(ur_type.clone());
        self.result = Some(Ur { ur_type, message });
        Ok(Receipt::Accepted)
    }

    fn receive_part(&mut self, ur_type: String, part: &Part) -> Result<Receipt, DecodeError> {
        if let Some(done) = &self.result {
            same_payload(done.message(), part.message_len, part.checksum)?;
            return Ok(Receipt::Duplicate);
        }

        let receipt = self.fountain.receive(part)?;
        if self.expected_type.is_none() {
            self.expected_type = Some(ur_type.clone());
        }

        if let Ok(message) = self.fountain.result() {
            self.result = Some(Ur {
                ur_type,
                message: message.clone(),
            });
        }
        Ok(receipt)
    }

    /// Whether the payload has been recovered and verified
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// The recovered payload
    ///
    /// `Incomplete` until every fragment is known; `Corrupted` if the
    /// reassembled bytes failed their checksum.
    pub fn result(&self) -> Result<&Ur, DecodeError> {
        match &self.result {
            Some(ur) => Ok(ur),
            None => Err(self
                .fountain
                .result()
                .err()
                .unwrap_or(DecodeError::Incomplete {
                    recovered: 0,
                    expected: 0,
                })),
        }
    }

    /// Start over, discarding all progress
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Type tag fixed by the first accepted frame
    pub fn expected_type(&self) -> Option<&str> {
        self.expected_type.as_deref()
    }

    pub fn expected_fragment_count(&self) -> usize {
        if self.result.is_some() && self.fountain.header().is_none() {
            return 1;
        }
        self.fountain.expected_fragment_count()
    }

    pub fn recovered_fragment_count(&self) -> usize {
        if self.result.is_some() {
            return self.expected_fragment_count();
        }
        self.fountain.recovered_fragment_count()
    }

    pub fn processed_parts_count(&self) -> usize {
        if self.result.is_some() && self.fountain.header().is_none() {
            return 1;
        }
        self.fountain.processed_parts_count()
    }

    /// Rough completion estimate in `[0, 1]`
    pub fn estimated_percent_complete(&self) -> f64 {
        if self.result.is_some() {
            1.0
        } else {
            self.fountain.estimated_percent_complete()
        }
    }
}

/// After completion, only frames of the recovered payload count as duplicates
fn same_payload(done: &[u8], message_len: usize, actual: u32) -> Result<(), DecodeError> {
    let expected = checksum(done);
    if actual != expected {
        return Err(DecodeError::foreign(
            "checksum",
            format_args!("{:08x}", expected),
            format_args!("{:08x}", actual),
        ));
    }
    if message_len != done.len() {
        return Err(DecodeError::foreign("message length", done.len(), message_len));
    }
    Ok(())
}
