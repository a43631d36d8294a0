//! Animated multi-frame QR transport for air-gapped signing
//!
//! A payload tagged with a type (e.g. `crypto-psbt`) is split into
//! fountain-coded frames small enough for one QR code each. The display
//! side cycles through `Encoder::next_part()`; the scanning side feeds
//! whatever it reads into `Decoder::receive()` in any order until
//! `is_complete()`.
//!
//! ```
//! use airgap_ur::{Decoder, Encoder, Ur};
//!
//! let ur = Ur::new("bytes", vec![7u8; 1000]).unwrap();
//! let mut encoder = Encoder::new(ur.clone(), 100).unwrap();
//! let mut decoder = Decoder::new();
//! while !decoder.is_complete() {
//!     decoder.receive(&encoder.next_part()).unwrap();
//! }
//! assert_eq!(decoder.result().unwrap(), &ur);
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod fountain;
pub mod host;
pub mod logging;
pub mod ur;

pub use codec::{decode_frame, encode_frame, Frame, Part};
pub use error::{DecodeError, EncodeError, HostError};
pub use fountain::Receipt;
pub use ur::{Decoder, Encoder, EncoderConfig, Ur};
