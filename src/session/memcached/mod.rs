//! Memcached Binary Protocol Session
//!
//! Talks to a memcached-protocol endpoint, such as a Couchbase data node,
//! over a single TCP connection.

mod codec;
pub mod protocol;

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::error::{BackendError, BackendErrorKind, ConnectError};
use crate::session::CacheSession;

pub use codec::{BinaryCodec, CodecError, MAX_BODY_LEN};
pub use protocol::Packet;

use protocol::{status_kind, RESPONSE_MAGIC, STATUS_NOT_SUPPORTED};

// == Memcached Session ==
/// A session over one connection.
///
/// Requests are serialized: each caller holds the connection from sending
/// its request until its response has been read.
#[derive(Debug)]
pub struct MemcachedSession {
    conn: Mutex<Framed<TcpStream, BinaryCodec>>,
    next_opaque: AtomicU32,
}

impl MemcachedSession {
    /// Connects to `address` and opens `bucket` with `password`.
    ///
    /// SASL PLAIN is skipped when `password` is empty. Servers without
    /// bucket selection are accepted as long as authentication succeeded.
    pub async fn connect(
        address: &str,
        bucket: &str,
        password: &str,
    ) -> Result<Self, ConnectError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| ConnectError::Connect {
                address: address.to_string(),
                source,
            })?;
        stream.set_nodelay(true).ok();

        let session = Self::from_stream(stream);
        session
            .open_bucket(bucket, password)
            .await
            .map_err(|source| ConnectError::OpenBucket {
                bucket: bucket.to_string(),
                source,
            })?;

        info!("Opened bucket '{}' at {}", bucket, address);
        Ok(session)
    }

    /// Wraps an already connected stream without authenticating.
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            conn: Mutex::new(Framed::new(stream, BinaryCodec::new())),
            next_opaque: AtomicU32::new(1),
        }
    }

    async fn open_bucket(&self, bucket: &str, password: &str) -> Result<(), BackendError> {
        if !password.is_empty() {
            self.call(Packet::sasl_plain(bucket, password)).await?;
        }

        match self.call(Packet::select_bucket(bucket)).await {
            Ok(_) => Ok(()),
            Err(e)
                if matches!(
                    e.kind(),
                    BackendErrorKind::UnknownCommand
                        | BackendErrorKind::Status(STATUS_NOT_SUPPORTED)
                ) =>
            {
                debug!("Server does not support bucket selection: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Sends one request and waits for its response.
    ///
    /// Non-success statuses are returned as errors carrying the server's message.
    async fn call(&self, mut request: Packet) -> Result<Packet, BackendError> {
        let opaque = self.next_opaque.fetch_add(1, Ordering::Relaxed);
        request.opaque = opaque;
        let opcode = request.opcode;

        let response = {
            let mut conn = self.conn.lock().await;
            conn.send(request).await?;

            loop {
                let packet = match conn.next().await {
                    Some(frame) => frame?,
                    None => {
                        return Err(BackendError::new(
                            BackendErrorKind::Io,
                            "connection closed by backend",
                        ))
                    }
                };

                // A caller cancelled mid-request leaves its response behind
                if packet.opaque != opaque {
                    warn!("Discarding stale response with opaque {}", packet.opaque);
                    continue;
                }
                break packet;
            }
        };

        if response.magic != RESPONSE_MAGIC || response.opcode != opcode {
            return Err(BackendError::new(
                BackendErrorKind::Protocol,
                format!(
                    "unexpected response magic 0x{:02x} opcode 0x{:02x} to opcode 0x{:02x}",
                    response.magic, response.opcode, opcode
                ),
            ));
        }

        match status_kind(response.status()) {
            None => Ok(response),
            Some(kind) => Err(BackendError::new(
                kind,
                String::from_utf8_lossy(&response.value).into_owned(),
            )),
        }
    }
}

#[async_trait]
impl CacheSession for MemcachedSession {
    async fn get(&self, key: &str) -> Result<Bytes, BackendError> {
        let response = self.call(Packet::get(key)).await?;
        Ok(response.value)
    }

    async fn upsert(&self, key: &str, value: Bytes, ttl_secs: u32) -> Result<(), BackendError> {
        self.call(Packet::set(key, value, ttl_secs)).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.call(Packet::delete(key)).await?;
        Ok(())
    }

    async fn append(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
        self.call(Packet::append(key, value)).await?;
        Ok(())
    }
}
