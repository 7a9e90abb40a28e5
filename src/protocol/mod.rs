//! Protocol Layer: Length-Prefixed Framing
//!
//! Prinsip desain:
//! - One frame = one logical message
//! - Fixed-size header: 16-bit unit count, network byte order
//! - Body units have a fixed width, so buffers are sized from the header

mod encoder;
mod message;

pub use encoder::{decode_units, encode_frame, encode_units, Decoder};
pub use message::{FrameHeader, PacketUnit, HEADER_SIZE, MAX_PAYLOAD_LEN};
