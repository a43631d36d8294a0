//! CBOR body of a multi-part frame
//!
//! `[seq_num, seq_len, message_len, checksum, data]` as a definite-length
//! array of unsigned integers followed by a byte string. Integers use the
//! shortest encoding so frames match other UR implementations byte for byte.

use super::Part;
use crate::constants::{MAX_MESSAGE_LEN, MAX_SEQ_LEN};
use crate::error::DecodeError;
use bytes::Bytes;
use ciborium::Value;

const PART_FIELDS: usize = 5;

/// Serialize a part to CBOR bytes
pub fn encode_part(part: &Part) -> Vec<u8> {
    let value = Value::Array(vec![
        Value::Integer(part.seq_num.into()),
        Value::Integer((part.seq_len as u64).into()),
        Value::Integer((part.message_len as u64).into()),
        Value::Integer(part.checksum.into()),
        Value::Bytes(part.data.to_vec()),
    ]);

    let mut out = Vec::with_capacity(part.data.len() + 24);
    // Writing a Value into a Vec cannot fail
    ciborium::ser::into_writer(&value, &mut out).expect("CBOR serialization into Vec failed");
    out
}

/// Parse and validate a part from CBOR bytes
pub fn decode_part(bytes: &[u8]) -> Result<Part, DecodeError> {
    let mut reader = bytes;
    let value: Value = ciborium::de::from_reader(&mut reader)
        .map_err(|e| DecodeError::malformed(format!("invalid CBOR: {}", e)))?;
    if !reader.is_empty() {
        return Err(DecodeError::malformed(format!(
            "{} trailing bytes after CBOR part",
            reader.len()
        )));
    }

    let Value::Array(items) = value else {
        return Err(DecodeError::malformed("CBOR part is not an array"));
    };
    if items.len() != PART_FIELDS {
        return Err(DecodeError::malformed(format!(
            "CBOR part has {} fields, expected {}",
            items.len(),
            PART_FIELDS
        )));
    }

    let mut items = items.into_iter();
    let seq_num = next_u32(&mut items, "seq_num")?;
    let seq_len = next_u32(&mut items, "seq_len")? as usize;
    let message_len = next_u32(&mut items, "message_len")? as usize;
    let checksum = next_u32(&mut items, "checksum")?;
    let data = match items.next() {
        Some(Value::Bytes(data)) => Bytes::from(data),
        _ => return Err(DecodeError::malformed("CBOR part data is not a byte string")),
    };

    let part = Part {
        seq_num,
        seq_len,
        message_len,
        checksum,
        data,
    };
    validate(&part)?;
    Ok(part)
}

fn next_u32(
    items: &mut impl Iterator<Item = Value>,
    field: &'static str,
) -> Result<u32, DecodeError> {
    match items.next() {
        Some(Value::Integer(i)) => {
            let n: i128 = i.into();
            u32::try_from(n)
                .map_err(|_| DecodeError::malformed(format!("{} out of range: {}", field, n)))
        }
        _ => Err(DecodeError::malformed(format!(
            "{} is not an unsigned integer",
            field
        ))),
    }
}

/// Structural checks that make a part safe to feed to the fountain decoder
fn validate(part: &Part) -> Result<(), DecodeError> {
    if part.seq_num == 0 {
        return Err(DecodeError::malformed("sequence number is zero"));
    }
    if part.seq_len == 0 {
        return Err(DecodeError::malformed("sequence length is zero"));
    }
    if part.data.is_empty() {
        return Err(DecodeError::malformed("fragment is empty"));
    }
    if part.message_len == 0 {
        return Err(DecodeError::malformed("message length is zero"));
    }
    if part.message_len > MAX_MESSAGE_LEN {
        return Err(DecodeError::malformed(format!(
            "message length {} exceeds limit {}",
            part.message_len, MAX_MESSAGE_LEN
        )));
    }
    if part.seq_len > MAX_SEQ_LEN {
        return Err(DecodeError::malformed(format!(
            "sequence length {} exceeds limit {}",
            part.seq_len, MAX_SEQ_LEN
        )));
    }
    // The message splits into exactly `seq_len` fragments of this size
    let expected = part.message_len.div_ceil(part.data.len());
    if part.seq_len != expected {
        return Err(DecodeError::malformed(format!(
            "sequence length {} does not match {} bytes in fragments of {}",
            part.seq_len,
            part.message_len,
            part.data.len()
        )));
    }
    Ok(())
}
