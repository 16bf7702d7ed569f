//! Binary Protocol Definitions
//!
//! Packet layout, opcodes and status codes of the memcached binary protocol.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::BackendErrorKind;

// == Constants ==
/// Fixed size of every packet header.
pub const HEADER_LEN: usize = 24;

// Magic bytes
pub const REQUEST_MAGIC: u8 = 0x80;
pub const RESPONSE_MAGIC: u8 = 0x81;

// Opcodes
pub const OP_GET: u8 = 0x00;
pub const OP_SET: u8 = 0x01;
pub const OP_DELETE: u8 = 0x04;
pub const OP_APPEND: u8 = 0x0E;
pub const OP_SASL_AUTH: u8 = 0x21;
pub const OP_SELECT_BUCKET: u8 = 0x89;

// Response status codes
pub const STATUS_SUCCESS: u16 = 0x0000;
pub const STATUS_KEY_NOT_FOUND: u16 = 0x0001;
pub const STATUS_KEY_EXISTS: u16 = 0x0002;
pub const STATUS_VALUE_TOO_LARGE: u16 = 0x0003;
pub const STATUS_INVALID_ARGUMENTS: u16 = 0x0004;
pub const STATUS_NOT_STORED: u16 = 0x0005;
pub const STATUS_AUTH_ERROR: u16 = 0x0020;
pub const STATUS_UNKNOWN_COMMAND: u16 = 0x0081;
pub const STATUS_NOT_SUPPORTED: u16 = 0x0083;
pub const STATUS_TEMPORARY_FAILURE: u16 = 0x0086;

// == Status Mapping ==
/// Maps a response status to its error category, or None on success.
pub fn status_kind(status: u16) -> Option<BackendErrorKind> {
    match status {
        STATUS_SUCCESS => None,
        STATUS_KEY_NOT_FOUND => Some(BackendErrorKind::KeyNotFound),
        STATUS_KEY_EXISTS => Some(BackendErrorKind::KeyExists),
        STATUS_VALUE_TOO_LARGE => Some(BackendErrorKind::ValueTooLarge),
        STATUS_INVALID_ARGUMENTS => Some(BackendErrorKind::InvalidArguments),
        STATUS_NOT_STORED => Some(BackendErrorKind::NotStored),
        STATUS_AUTH_ERROR => Some(BackendErrorKind::AuthFailed),
        STATUS_UNKNOWN_COMMAND => Some(BackendErrorKind::UnknownCommand),
        STATUS_TEMPORARY_FAILURE => Some(BackendErrorKind::TemporaryFailure),
        other => Some(BackendErrorKind::Status(other)),
    }
}

// == Packet ==
/// One binary protocol packet, request or response.
///
/// Layout: [magic][opcode][key_len: u16][extras_len: u8][data_type][vbucket or status: u16]
/// [body_len: u32][opaque: u32][cas: u64] then extras, key and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub magic: u8,
    pub opcode: u8,
    pub data_type: u8,
    /// vbucket id on requests, status on responses
    pub vbucket_or_status: u16,
    pub opaque: u32,
    pub cas: u64,
    pub extras: Bytes,
    pub key: Bytes,
    pub value: Bytes,
}

impl Packet {
    // == Constructors ==
    /// Builds a request for vbucket 0 with no CAS.
    pub fn request(opcode: u8, key: Bytes, extras: Bytes, value: Bytes) -> Self {
        Self {
            magic: REQUEST_MAGIC,
            opcode,
            data_type: 0,
            vbucket_or_status: 0,
            opaque: 0,
            cas: 0,
            extras,
            key,
            value,
        }
    }

    /// Builds a response answering `request` with the given status and value.
    pub fn response_to(request: &Packet, status: u16, value: Bytes) -> Self {
        Self {
            magic: RESPONSE_MAGIC,
            opcode: request.opcode,
            data_type: 0,
            vbucket_or_status: status,
            opaque: request.opaque,
            cas: 0,
            extras: Bytes::new(),
            key: Bytes::new(),
            value,
        }
    }

    /// GET request for `key`.
    pub fn get(key: &str) -> Self {
        Self::request(OP_GET, Bytes::copy_from_slice(key.as_bytes()), Bytes::new(), Bytes::new())
    }

    /// SET carries flags and expiry as extras.
    pub fn set(key: &str, value: Bytes, expiry: u32) -> Self {
        let mut extras = BytesMut::with_capacity(8);
        extras.put_u32(0);
        extras.put_u32(expiry);
        Self::request(OP_SET, Bytes::copy_from_slice(key.as_bytes()), extras.freeze(), value)
    }

    /// DELETE request for `key` with CAS 0, so the removal is unconditional.
    pub fn delete(key: &str) -> Self {
        Self::request(OP_DELETE, Bytes::copy_from_slice(key.as_bytes()), Bytes::new(), Bytes::new())
    }

    /// APPEND request; the server keeps the key's flags and expiry.
    pub fn append(key: &str, value: Bytes) -> Self {
        Self::request(OP_APPEND, Bytes::copy_from_slice(key.as_bytes()), Bytes::new(), value)
    }

    /// SASL PLAIN authentication with an empty authzid.
    pub fn sasl_plain(username: &str, password: &str) -> Self {
        let mut payload = BytesMut::with_capacity(username.len() + password.len() + 2);
        payload.put_u8(0);
        payload.put_slice(username.as_bytes());
        payload.put_u8(0);
        payload.put_slice(password.as_bytes());
        Self::request(OP_SASL_AUTH, Bytes::from_static(b"PLAIN"), Bytes::new(), payload.freeze())
    }

    /// SELECT_BUCKET request binding the connection to `bucket`.
    pub fn select_bucket(bucket: &str) -> Self {
        Self::request(
            OP_SELECT_BUCKET,
            Bytes::copy_from_slice(bucket.as_bytes()),
            Bytes::new(),
            Bytes::new(),
        )
    }

    // == Accessors ==
    /// Status of a response packet.
    pub fn status(&self) -> u16 {
        self.vbucket_or_status
    }

    /// Combined length of extras, key and value.
    pub fn body_len(&self) -> usize {
        self.extras.len() + self.key.len() + self.value.len()
    }

    /// Expiry field of a SET request, if present.
    pub fn expiry(&self) -> Option<u32> {
        if self.extras.len() < 8 {
            return None;
        }
        let raw = &self.extras[4..8];
        Some(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}
