//! Frame Body Encoder/Decoder
//!
//! Converts between unit slices and their wire bytes. Framing itself (header
//! then body, resumable across partial I/O) lives in the sending and
//! reception handlers; this module only knows how a body looks on the wire.

use super::message::{FrameHeader, PacketUnit, HEADER_SIZE};

/// Append the wire bytes of `units` to `out`.
#[inline]
pub fn encode_units<U: PacketUnit>(units: &[U], out: &mut Vec<u8>) {
    let start = out.len();
    out.resize(start + units.len() * U::WIDTH, 0);
    for (unit, chunk) in units
        .iter()
        .zip(out[start..].chunks_exact_mut(U::WIDTH))
    {
        unit.write_be(chunk);
    }
}

/// Rebuild units from a complete body.
///
/// Trailing bytes that do not form a whole unit are ignored; the reception
/// buffer is always sized to a multiple of `U::WIDTH`.
#[inline]
pub fn decode_units<U: PacketUnit>(bytes: &[u8]) -> Vec<U> {
    bytes.chunks_exact(U::WIDTH).map(U::read_be).collect()
}

/// Encode a whole frame (header + body) into a fresh buffer.
///
/// Returns `None` when the payload does not fit the header.
pub fn encode_frame<U: PacketUnit>(units: &[U]) -> Option<Vec<u8>> {
    let header = FrameHeader::for_payload(units.len())?;
    let mut out = Vec::with_capacity(header.total_size::<U>());
    out.extend_from_slice(&header.encode());
    encode_units(units, &mut out);
    Some(out)
}

/// Zero-copy decoder over a buffer holding complete frames back to back
pub struct Decoder<'a> {
    buffer: &'a [u8],
    read_pos: usize,
}

impl<'a> Decoder<'a> {
    #[inline(always)]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            read_pos: 0,
        }
    }

    /// Next complete frame as `(header, body bytes)`, `None` once the
    /// remaining bytes do not hold a whole frame.
    #[allow(clippy::should_implement_trait)]
    pub fn next<U: PacketUnit>(&mut self) -> Option<(FrameHeader, &'a [u8])> {
        if self.read_pos + HEADER_SIZE > self.buffer.len() {
            return None;
        }

        let mut raw = [0u8; HEADER_SIZE];
        raw.copy_from_slice(&self.buffer[self.read_pos..self.read_pos + HEADER_SIZE]);
        let header = FrameHeader::decode(raw);

        let body_start = self.read_pos + HEADER_SIZE;
        let body_end = body_start + header.body_bytes::<U>();
        if body_end > self.buffer.len() {
            return None;
        }

        self.read_pos = body_end;
        Some((header, &self.buffer[body_start..body_end]))
    }

    /// Remaining bytes
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.read_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MAX_PAYLOAD_LEN;

    #[test]
    fn test_encode_decode_bytes() {
        let frame = encode_frame(b"Hello, peer!".as_slice()).unwrap();
        assert_eq!(&frame[..HEADER_SIZE], &[0, 12]);

        let mut decoder = Decoder::new(&frame);
        let (header, body) = decoder.next::<u8>().unwrap();
        assert_eq!(header.len(), 12);
        assert_eq!(body, b"Hello, peer!");
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn test_encode_decode_wide_units() {
        let units: Vec<u16> = vec![1, 256, 65535];
        let frame = encode_frame(&units).unwrap();
        assert_eq!(frame, vec![0, 3, 0, 1, 1, 0, 0xFF, 0xFF]);

        let mut decoder = Decoder::new(&frame);
        let (_, body) = decoder.next::<u16>().unwrap();
        assert_eq!(decode_units::<u16>(body), units);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut wire = encode_frame(&[1u8, 2, 3]).unwrap();
        wire.extend(encode_frame::<u8>(&[]).unwrap());
        wire.extend(encode_frame(&[9u8]).unwrap());

        let mut decoder = Decoder::new(&wire);
        let bodies: Vec<Vec<u8>> = std::iter::from_fn(|| decoder.next::<u8>())
            .map(|(_, body)| body.to_vec())
            .collect();
        assert_eq!(bodies, vec![vec![1, 2, 3], vec![], vec![9]]);
    }

    #[test]
    fn test_incomplete_frame() {
        let frame = encode_frame(&[1u8, 2, 3]).unwrap();
        let mut decoder = Decoder::new(&frame[..4]);
        assert!(decoder.next::<u8>().is_none());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let units = vec![0u8; MAX_PAYLOAD_LEN + 1];
        assert!(encode_frame(&units).is_none());
    }
}
