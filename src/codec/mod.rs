//! Frame codec
//!
//! Converts frames to and from their wire strings:
//!
//! - single part: `ur:<type>/<bytewords(message)>`
//! - multi part: `ur:<type>/<seq>-<len>/<bytewords(cbor(part))>`
//!
//! Bytewords are always minimal style on the wire. Parsing is
//! case-insensitive so frames survive the uppercase alphanumeric QR mode.

pub mod bytewords;
pub mod cbor;

use crate::constants::{MAX_TYPE_LEN, UR_SCHEME};
use crate::error::DecodeError;
use bytes::Bytes;
use bytewords::Style;
use crc::{Crc, CRC_32_ISO_HDLC};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// CRC-32 (ISO-HDLC) of `data`
///
/// Used both for the bytewords trailer and the whole-message checksum.
pub fn checksum(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// Whether `ur_type` is a valid type tag (`[a-z0-9-]+`)
pub fn is_valid_type(ur_type: &str) -> bool {
    !ur_type.is_empty()
        && ur_type.len() <= MAX_TYPE_LEN
        && ur_type
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// One fragment-carrying unit of a multi-part transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// 1-based sequence number; values above `seq_len` are mixed parts
    pub seq_num: u32,
    /// Number of pure fragments the message is split into
    pub seq_len: usize,
    /// Unpadded message length
    pub message_len: usize,
    /// CRC-32 of the whole message
    pub checksum: u32,
    /// Fragment bytes (pure or XOR of several fragments)
    pub data: Bytes,
}

impl Part {
    /// Whether this part carries exactly one fragment by construction
    pub fn is_pure(&self) -> bool {
        self.seq_num as usize <= self.seq_len
    }

    pub fn fragment_len(&self) -> usize {
        self.data.len()
    }
}

/// A parsed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Whole message in one frame
    Single { ur_type: String, message: Bytes },
    /// One part of a fountain-coded message
    Multi { ur_type: String, part: Part },
}

impl Frame {
    pub fn ur_type(&self) -> &str {
        match self {
            Self::Single { ur_type, .. } | Self::Multi { ur_type, .. } => ur_type,
        }
    }
}

/// Serialize a frame to its lowercase wire string
pub fn encode_frame(frame: &Frame) -> String {
    let mut out = String::new();
    out.push_str(UR_SCHEME);
    out.push(':');
    out.push_str(frame.ur_type());
    out.push('/');

    match frame {
        Frame::Single { message, .. } => {
            bytewords::encode_into(message, Style::Minimal, &mut out);
        }
        Frame::Multi { part, .. } => {
            out.push_str(&format!("{}-{}/", part.seq_num, part.seq_len));
            bytewords::encode_into(&cbor::encode_part(part), Style::Minimal, &mut out);
        }
    }
    out
}

/// Parse a wire string into a frame
pub fn decode_frame(text: &str) -> Result<Frame, DecodeError> {
    let text = text.trim().to_ascii_lowercase();

    let rest = text
        .strip_prefix(UR_SCHEME)
        .and_then(|r| r.strip_prefix(':'))
        .ok_or_else(|| DecodeError::malformed("missing 'ur:' scheme"))?;

    let components: Vec<&str> = rest.split('/').collect();
    let (ur_type, seq, body) = match components.as_slice() {
        [ur_type, body] => (*ur_type, None, *body),
        [ur_type, seq, body] => (*ur_type, Some(*seq), *body),
        _ => {
            return Err(DecodeError::malformed(format!(
                "expected 2 or 3 path components, got {}",
                components.len()
            )))
        }
    };

    if !is_valid_type(ur_type) {
        return Err(DecodeError::malformed(format!(
            "invalid type tag '{}'",
            ur_type
        )));
    }

    let body = bytewords::decode(body, Style::Minimal)
        .map_err(|e| DecodeError::malformed(e.to_string()))?;

    let Some(seq) = seq else {
        return Ok(Frame::Single {
            ur_type: ur_type.to_string(),
            message: Bytes::from(body),
        });
    };

    let (seq_num, seq_len) = parse_sequence(seq)?;
    let part = cbor::decode_part(&body)?;
    if part.seq_num != seq_num || part.seq_len != seq_len as usize {
        return Err(DecodeError::malformed(format!(
            "path says {}-{}, body says {}-{}",
            seq_num, seq_len, part.seq_num, part.seq_len
        )));
    }

    Ok(Frame::Multi {
        ur_type: ur_type.to_string(),
        part,
    })
}

/// Parse `<seq>-<len>`
fn parse_sequence(seq: &str) -> Result<(u32, u32), DecodeError> {
    let invalid = || DecodeError::malformed(format!("invalid sequence component '{}'", seq));

    let (num, len) = seq.split_once('-').ok_or_else(invalid)?;
    let parse = |s: &str| -> Result<u32, DecodeError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        s.parse().map_err(|_| invalid())
    };

    let num = parse(num)?;
    let len = parse(len)?;
    if num == 0 || len == 0 {
        return Err(invalid());
    }
    Ok((num, len))
}
