//! Frame encoding and decoding.
//!
//! Every message on the TCP stream is
//!
//! ```text
//! +------------------+---------------------------+
//! | Length (4B BE)   | Payload (Length bytes)    |
//! +------------------+---------------------------+
//! ```
//!
//! [`FrameCodec`] is stateless: it frames one payload, decodes one header, or
//! unwraps one complete frame. Reassembly across partial reads is the caller's
//! job; [`FrameDecoder`] does it for hosts consuming the client's raw chunks.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::core::{FRAME_HEADER_SIZE, MAX_WIRE_PAYLOAD};

/// Frame codec errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Outgoing payload exceeds the configured maximum.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Payload size.
        size: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Incoming length prefix is outside the accepted range.
    #[error("invalid frame length: {length} (max {max})")]
    InvalidLength {
        /// Declared length.
        length: u32,
        /// Maximum allowed.
        max: usize,
    },

    /// Fewer than four bytes where a header was expected.
    #[error("truncated header: {0} bytes")]
    TruncatedHeader(usize),

    /// Declared length disagrees with the bytes that follow it.
    #[error("length mismatch: header says {declared}, body has {actual}")]
    LengthMismatch {
        /// Length from the header.
        declared: usize,
        /// Bytes actually present.
        actual: usize,
    },
}

/// Decode a length prefix. Any four bytes form a valid `u32`.
pub fn decode_header(header: [u8; FRAME_HEADER_SIZE]) -> u32 {
    u32::from_be_bytes(header)
}

/// Length-prefix codec with an optional size ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    max_payload: Option<usize>,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl FrameCodec {
    /// Codec rejecting payloads above `max_payload` bytes.
    pub const fn new(max_payload: usize) -> Self {
        Self {
            max_payload: Some(max_payload),
        }
    }

    /// Codec limited only by what a `u32` prefix can describe.
    pub const fn unbounded() -> Self {
        Self { max_payload: None }
    }

    /// Codec from a configured limit, where `0` means unbounded.
    pub const fn with_limit(limit: usize) -> Self {
        if limit == 0 {
            Self::unbounded()
        } else {
            Self::new(limit)
        }
    }

    /// Configured ceiling, if any.
    pub fn max_payload(&self) -> Option<usize> {
        self.max_payload
    }

    /// Effective ceiling including the wire limit.
    pub fn limit(&self) -> usize {
        self.max_payload.map_or(MAX_WIRE_PAYLOAD, |max| max.min(MAX_WIRE_PAYLOAD))
    }

    /// Check that a payload of `size` bytes may be sent.
    pub fn check_len(&self, size: usize) -> Result<(), FrameError> {
        let max = self.limit();
        if size > max {
            return Err(FrameError::PayloadTooLarge { size, max });
        }
        Ok(())
    }

    /// Frame a payload: 4-byte big-endian length followed by the bytes.
    pub fn encode(&self, payload: &[u8]) -> Result<Bytes, FrameError> {
        self.check_len(payload.len())?;

        let mut frame = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
        frame.put_u32(payload.len() as u32);
        frame.put_slice(payload);
        Ok(frame.freeze())
    }

    /// Accept or reject a received length prefix.
    pub fn validate_length(&self, length: u32) -> Result<usize, FrameError> {
        let max = self.limit();
        let len = length as usize;
        if len > max {
            return Err(FrameError::InvalidLength { length, max });
        }
        Ok(len)
    }

    /// Unwrap exactly one complete frame.
    pub fn decode(&self, frame: &[u8]) -> Result<Bytes, FrameError> {
        let Some((header, body)) = frame.split_first_chunk::<FRAME_HEADER_SIZE>() else {
            return Err(FrameError::TruncatedHeader(frame.len()));
        };

        let declared = self.validate_length(decode_header(*header))?;
        if declared != body.len() {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: body.len(),
            });
        }
        Ok(Bytes::copy_from_slice(body))
    }
}

/// Incremental frame decoder for byte streams.
///
/// Feed raw chunks via [`FrameDecoder::feed`] and collect complete payloads.
/// Partial frames are buffered for the next call.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    codec: FrameCodec,
    buf: BytesMut,
}

impl FrameDecoder {
    /// Decoder enforcing `codec`'s size ceiling.
    pub fn new(codec: FrameCodec) -> Self {
        Self {
            codec,
            buf: BytesMut::new(),
        }
    }

    /// Append bytes and extract every complete payload.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLength` as soon as a header exceeds the ceiling; the
    /// stream is unusable after that and the decoder should be discarded.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Bytes>, FrameError> {
        self.buf.extend_from_slice(bytes);
        let mut payloads = Vec::new();

        while let Some(header) = self.buf.first_chunk::<FRAME_HEADER_SIZE>() {
            let len = self.codec.validate_length(decode_header(*header))?;
            if self.buf.len() < FRAME_HEADER_SIZE + len {
                break;
            }

            self.buf.advance(FRAME_HEADER_SIZE);
            payloads.push(self.buf.split_to(len).freeze());
        }

        Ok(payloads)
    }

    /// Whether bytes of an unfinished frame are buffered.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Number of buffered bytes.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wire_bytes() {
        let codec = FrameCodec::new(1024);
        let frame = codec.encode(b"A").unwrap();
        assert_eq!(hex::encode(&frame), "0000000141");

        let empty = codec.encode(b"").unwrap();
        assert_eq!(hex::encode(&empty), "00000000");
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = FrameCodec::new(2048);
        let payloads: [&[u8]; 4] = [b"", b"x", &[0xFF; 2048], b"{\"type\":\"palette\"}"];
        for payload in payloads {
            let frame = codec.encode(payload).unwrap();
            assert_eq!(frame.len(), FRAME_HEADER_SIZE + payload.len());
            assert_eq!(codec.decode(&frame).unwrap(), payload);
        }
    }

    #[test]
    fn test_encode_too_large() {
        let codec = FrameCodec::new(1024);
        let err = codec.encode(&[0u8; 1025]).unwrap_err();
        assert_eq!(err, FrameError::PayloadTooLarge { size: 1025, max: 1024 });
    }

    #[test]
    fn test_with_limit_zero_is_unbounded() {
        let codec = FrameCodec::with_limit(0);
        assert_eq!(codec.max_payload(), None);
        assert_eq!(codec.limit(), MAX_WIRE_PAYLOAD);
        assert!(codec.validate_length(u32::MAX).is_ok());
    }

    #[test]
    fn test_decode_header_big_endian() {
        assert_eq!(decode_header([0x00, 0x1E, 0x84, 0x80]), 2_000_000);
        assert_eq!(decode_header([0xFF, 0xFF, 0xFF, 0xFF]), u32::MAX);
    }

    #[test]
    fn test_validate_length() {
        let codec = FrameCodec::new(1_048_576);
        assert_eq!(codec.validate_length(0).unwrap(), 0);
        assert_eq!(codec.validate_length(1_048_576).unwrap(), 1_048_576);
        assert_eq!(
            codec.validate_length(2_000_000).unwrap_err(),
            FrameError::InvalidLength {
                length: 2_000_000,
                max: 1_048_576
            }
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let codec = FrameCodec::new(1024);
        assert_eq!(codec.decode(&[0, 0]).unwrap_err(), FrameError::TruncatedHeader(2));

        let short = hex::decode("00000005414243").unwrap();
        assert_eq!(
            codec.decode(&short).unwrap_err(),
            FrameError::LengthMismatch {
                declared: 5,
                actual: 3
            }
        );

        let huge = hex::decode("0000ffff").unwrap();
        assert!(matches!(
            codec.decode(&huge).unwrap_err(),
            FrameError::InvalidLength { .. }
        ));
    }

    #[test]
    fn test_decoder_reassembles_split_frames() {
        let codec = FrameCodec::new(1024);
        let mut wire = Vec::new();
        wire.extend_from_slice(&codec.encode(b"hello").unwrap());
        wire.extend_from_slice(&codec.encode(b"").unwrap());
        wire.extend_from_slice(&codec.encode(b"world").unwrap());

        let mut decoder = FrameDecoder::new(codec);
        let mut out = Vec::new();
        // Byte-at-a-time exercises every split point, header included.
        for byte in &wire {
            out.extend(decoder.feed(std::slice::from_ref(byte)).unwrap());
        }

        assert_eq!(out, vec![Bytes::from_static(b"hello"), Bytes::new(), Bytes::from_static(b"world")]);
        assert!(!decoder.has_partial());
    }

    #[test]
    fn test_decoder_buffers_partial() {
        let codec = FrameCodec::new(1024);
        let frame = codec.encode(b"partial").unwrap();
        let mut decoder = FrameDecoder::new(codec);

        assert!(decoder.feed(&frame[..6]).unwrap().is_empty());
        assert!(decoder.has_partial());
        assert_eq!(decoder.buffered(), 6);

        let out = decoder.feed(&frame[6..]).unwrap();
        assert_eq!(out, vec![Bytes::from_static(b"partial")]);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decoder_rejects_oversized_header() {
        let mut decoder = FrameDecoder::new(FrameCodec::new(1024));
        let err = decoder.feed(&hex::decode("00001000").unwrap()).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { length: 4096, .. }));
    }
}
