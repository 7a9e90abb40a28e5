//! Wire Frame Format
//!
//! Layout:
//! ┌─────────────────────────────────────────────────────┐
//! │ FrameHeader (2 bytes, u16 big-endian, unit count)   │
//! ├─────────────────────────────────────────────────────┤
//! │ Body (exactly `len` units, each `U::WIDTH` bytes)   │
//! └─────────────────────────────────────────────────────┘
//!
//! The header counts protocol units, not bytes. With the default `u8` unit
//! both are the same.

use std::fmt::Debug;

/// Fixed-width element of a frame body.
///
/// Units travel in network byte order. The width is fixed per type so the
/// receiver can size its body buffer straight from the header.
pub trait PacketUnit: Copy + Default + Debug + PartialEq + Send + 'static {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Write the unit in big-endian order into `out[..WIDTH]`.
    fn write_be(self, out: &mut [u8]);

    /// Read a unit from `bytes[..WIDTH]`.
    fn read_be(bytes: &[u8]) -> Self;
}

macro_rules! impl_packet_unit {
    ($($ty:ty),*) => {
        $(
            impl PacketUnit for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                #[inline(always)]
                fn write_be(self, out: &mut [u8]) {
                    out[..Self::WIDTH].copy_from_slice(&self.to_be_bytes());
                }

                #[inline(always)]
                fn read_be(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::WIDTH]);
                    <$ty>::from_be_bytes(raw)
                }
            }
        )*
    };
}

impl_packet_unit!(u8, i8, u16, i16, u32, i32);

/// Header size on the wire
pub const HEADER_SIZE: usize = std::mem::size_of::<u16>();

/// Largest body (in units) a header can describe
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Length prefix of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    len: u16,
}

impl FrameHeader {
    /// Header for a body of `len` units, `None` if it does not fit.
    #[inline(always)]
    pub fn for_payload(len: usize) -> Option<Self> {
        u16::try_from(len).ok().map(|len| Self { len })
    }

    /// Body length in units
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Body length in bytes for unit type `U`
    #[inline(always)]
    pub fn body_bytes<U: PacketUnit>(&self) -> usize {
        self.len() * U::WIDTH
    }

    /// Total frame size (header + body) in bytes
    #[inline(always)]
    pub fn total_size<U: PacketUnit>(&self) -> usize {
        HEADER_SIZE + self.body_bytes::<U>()
    }

    #[inline(always)]
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        self.len.to_be_bytes()
    }

    #[inline(always)]
    pub fn decode(bytes: [u8; HEADER_SIZE]) -> Self {
        Self {
            len: u16::from_be_bytes(bytes),
        }
    }
}
