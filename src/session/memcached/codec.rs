//! Frames the binary protocol over a byte stream.
//!
//! Used with `tokio_util::codec::Framed`, so the session works with whole
//! packets instead of raw bytes. The codec is direction-agnostic: it reads and
//! writes requests and responses alike.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use super::protocol::{Packet, HEADER_LEN, REQUEST_MAGIC, RESPONSE_MAGIC};
use crate::error::{BackendError, BackendErrorKind};

/// Largest packet body accepted in either direction.
pub const MAX_BODY_LEN: usize = 32 * 1024 * 1024;

// == Codec Error ==
/// Framing failure while reading or writing packets.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Underlying stream failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// First header byte is neither the request nor the response magic
    #[error("bad magic byte 0x{0:02x}")]
    BadMagic(u8),

    /// Body length is over the codec's limit
    #[error("frame body of {0} bytes exceeds limit")]
    FrameTooLarge(usize),

    /// Header length fields do not add up
    #[error("inconsistent length fields: {0}")]
    InvalidLengths(String),
}

impl From<CodecError> for BackendError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => BackendError::from(e),
            other => BackendError::new(BackendErrorKind::Protocol, other.to_string()),
        }
    }
}

// == Binary Codec ==
/// Splits a byte stream into [`Packet`]s and writes them back out.
#[derive(Debug, Clone)]
pub struct BinaryCodec {
    /// Largest body accepted in either direction
    max_body_len: usize,
}

impl BinaryCodec {
    /// Creates a codec limited to [`MAX_BODY_LEN`] bytes per body.
    pub fn new() -> Self {
        Self {
            max_body_len: MAX_BODY_LEN,
        }
    }

    /// Creates a codec with a custom body limit.
    pub fn with_max_body_len(max_body_len: usize) -> Self {
        Self { max_body_len }
    }
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BinaryCodec {
    type Item = Packet;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, CodecError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let magic = src[0];
        if magic != REQUEST_MAGIC && magic != RESPONSE_MAGIC {
            return Err(CodecError::BadMagic(magic));
        }

        let key_len = u16::from_be_bytes([src[2], src[3]]) as usize;
        let extras_len = src[4] as usize;
        let body_len = u32::from_be_bytes([src[8], src[9], src[10], src[11]]) as usize;

        if body_len > self.max_body_len {
            return Err(CodecError::FrameTooLarge(body_len));
        }
        if extras_len + key_len > body_len {
            return Err(CodecError::InvalidLengths(format!(
                "extras {} + key {} > body {}",
                extras_len, key_len, body_len
            )));
        }

        // Wait for the whole body before splitting anything off
        let frame_len = HEADER_LEN + body_len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let mut header = src.split_to(HEADER_LEN);
        let mut body = src.split_to(body_len).freeze();

        let magic = header.get_u8();
        let opcode = header.get_u8();
        header.advance(3); // key_len, extras_len
        let data_type = header.get_u8();
        let vbucket_or_status = header.get_u16();
        header.advance(4); // body_len
        let opaque = header.get_u32();
        let cas = header.get_u64();

        let extras = body.split_to(extras_len);
        let key = body.split_to(key_len);

        Ok(Some(Packet {
            magic,
            opcode,
            data_type,
            vbucket_or_status,
            opaque,
            cas,
            extras,
            key,
            value: body,
        }))
    }
}

impl Encoder<Packet> for BinaryCodec {
    type Error = CodecError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), CodecError> {
        let body_len = packet.body_len();
        if body_len > self.max_body_len {
            return Err(CodecError::FrameTooLarge(body_len));
        }
        let key_len = u16::try_from(packet.key.len())
            .map_err(|_| CodecError::InvalidLengths(format!("key of {} bytes", packet.key.len())))?;
        let extras_len = u8::try_from(packet.extras.len()).map_err(|_| {
            CodecError::InvalidLengths(format!("extras of {} bytes", packet.extras.len()))
        })?;

        dst.reserve(HEADER_LEN + body_len);
        dst.put_u8(packet.magic);
        dst.put_u8(packet.opcode);
        dst.put_u16(key_len);
        dst.put_u8(extras_len);
        dst.put_u8(packet.data_type);
        dst.put_u16(packet.vbucket_or_status);
        dst.put_u32(body_len as u32);
        dst.put_u32(packet.opaque);
        dst.put_u64(packet.cas);
        dst.put_slice(&packet.extras);
        dst.put_slice(&packet.key);
        dst.put_slice(&packet.value);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::memcached::protocol::{OP_GET, OP_SET, STATUS_KEY_NOT_FOUND};
    use bytes::Bytes;

    #[test]
    fn test_encode_get_header_layout() {
        let mut codec = BinaryCodec::new();
        let mut packet = Packet::get("abc");
        packet.opaque = 7;

        let mut buf = BytesMut::new();
        codec.encode(packet, &mut buf).unwrap();

        assert_eq!(buf.len(), HEADER_LEN + 3);
        assert_eq!(buf[0], REQUEST_MAGIC);
        assert_eq!(buf[1], OP_GET);
        assert_eq!(&buf[2..4], &[0, 3]); // key length
        assert_eq!(buf[4], 0); // extras length
        assert_eq!(&buf[8..12], &[0, 0, 0, 3]); // body length
        assert_eq!(&buf[12..16], &[0, 0, 0, 7]); // opaque
        assert_eq!(&buf[HEADER_LEN..], b"abc");
    }

    #[test]
    fn test_decode_waits_for_full_frame() {
        let mut codec = BinaryCodec::new();
        let mut encoded = BytesMut::new();
        codec
            .encode(Packet::set("key", Bytes::from_static(b"value"), 60), &mut encoded)
            .unwrap();

        let tail = encoded.split_off(HEADER_LEN + 4);
        let mut src = encoded;

        assert!(codec.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(&tail);
        let packet = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(packet.opcode, OP_SET);
        assert_eq!(&packet.key[..], b"key");
        assert_eq!(&packet.value[..], b"value");
        assert_eq!(packet.expiry(), Some(60));
        assert!(src.is_empty());
    }

    #[test]
    fn test_decode_response_status() {
        let mut codec = BinaryCodec::new();
        let mut request = Packet::get("missing");
        request.opaque = 99;
        let response = Packet::response_to(&request, STATUS_KEY_NOT_FOUND, Bytes::from_static(b"Not found"));

        let mut buf = BytesMut::new();
        codec.encode(response.clone(), &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();

        assert_eq!(decoded, response);
        assert_eq!(decoded.status(), STATUS_KEY_NOT_FOUND);
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut codec = BinaryCodec::new();
        let mut buf = BytesMut::from(&[0x42u8; HEADER_LEN][..]);

        assert!(matches!(codec.decode(&mut buf), Err(CodecError::BadMagic(0x42))));
    }

    #[test]
    fn test_decode_rejects_oversized_body() {
        let mut codec = BinaryCodec::with_max_body_len(16);
        let mut encoded = BytesMut::new();
        BinaryCodec::new()
            .encode(Packet::append("k", Bytes::from(vec![0u8; 32])), &mut encoded)
            .unwrap();

        assert!(matches!(codec.decode(&mut encoded), Err(CodecError::FrameTooLarge(33))));
    }

    #[test]
    fn test_encode_rejects_oversized_key() {
        let mut codec = BinaryCodec::new();
        let key = "k".repeat(u16::MAX as usize + 1);
        let mut buf = BytesMut::new();

        let result = codec.encode(Packet::get(&key), &mut buf);
        assert!(matches!(result, Err(CodecError::InvalidLengths(_))));
    }

    #[test]
    fn test_codec_error_converts_to_protocol_kind() {
        let err: BackendError = CodecError::BadMagic(0x00).into();
        assert_eq!(err.kind(), BackendErrorKind::Protocol);
    }
}
