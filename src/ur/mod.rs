//! Typed payloads and their frame-level encoder and decoder
//!
//! - `Ur`: immutable payload bytes plus a type tag such as `crypto-psbt`
//! - `Encoder`: turns a `Ur` into an endless stream of frame strings
//! - `Decoder`: turns scanned frame strings back into a `Ur`

pub mod decoder;
pub mod encoder;

pub use decoder::Decoder;
pub use encoder::{Encoder, EncoderConfig};

use crate::codec::is_valid_type;
use crate::error::EncodeError;
use bytes::Bytes;

/// Uniform resource: a typed binary payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ur {
    ur_type: String,
    message: Bytes,
}

impl Ur {
    /// Create a payload, validating the type tag (`[a-z0-9-]+`)
    pub fn new(ur_type: impl Into<String>, message: impl Into<Bytes>) -> Result<Self, EncodeError> {
        let ur_type = ur_type.into();
        if !is_valid_type(&ur_type) {
            return Err(EncodeError::InvalidType { ur_type });
        }
        Ok(Self {
            ur_type,
            message: message.into(),
        })
    }

    pub fn ur_type(&self) -> &str {
        &self.ur_type
    }

    pub fn message(&self) -> &Bytes {
        &self.message
    }

    pub fn into_message(self) -> Bytes {
        self.message
    }
}
