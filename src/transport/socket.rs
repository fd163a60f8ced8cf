//! TCP helpers shared by both transports.
//!
//! Provides bounded-wait reads for framed input and a [`Dialer`] for
//! outbound connections from an optional fixed local port.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::{TcpSocket, TcpStream, lookup_host};
use tokio::time::{Instant, timeout, timeout_at};

use super::error::{TransportError, TransportResult};
use super::frame::{FrameCodec, decode_header};
use crate::core::{DEFAULT_CONNECT_TIMEOUT, FRAME_HEADER_SIZE};

/// Fill `buf[filled..]`, giving the remaining bytes `window` to arrive.
///
/// End-of-stream before the buffer is full is [`TransportError::ConnectionClosed`]
/// when nothing had been read yet, [`TransportError::Truncated`] otherwise.
pub async fn read_exact_within<R>(
    reader: &mut R,
    buf: &mut [u8],
    mut filled: usize,
    window: Duration,
) -> TransportResult<()>
where
    R: AsyncRead + Unpin,
{
    let expected = buf.len();
    let deadline = Instant::now() + window;

    while filled < expected {
        match timeout_at(deadline, reader.read(&mut buf[filled..])).await {
            Err(_) => {
                return Err(TransportError::DeadlineElapsed {
                    read: filled,
                    expected,
                });
            }
            Ok(Ok(0)) if filled == 0 => return Err(TransportError::ConnectionClosed),
            Ok(Ok(0)) => {
                return Err(TransportError::Truncated {
                    read: filled,
                    expected,
                });
            }
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Read one frame and return its body.
///
/// Waits without limit for the first header byte, so idle peers are fine.
/// After that the rest of the header, and then the body, must each arrive
/// within `window`. The length is checked against `codec` before any body
/// byte is read or buffer allocated.
pub async fn read_frame<R>(
    reader: &mut R,
    codec: &FrameCodec,
    window: Duration,
) -> TransportResult<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_SIZE];
    let first = reader.read(&mut header).await?;
    if first == 0 {
        return Err(TransportError::ConnectionClosed);
    }
    read_exact_within(reader, &mut header, first, window).await?;

    let len = codec.validate_length(decode_header(header))?;
    let mut body = BytesMut::zeroed(len);
    match read_exact_within(reader, &mut body, 0, window).await {
        Ok(()) => Ok(body.freeze()),
        // A close right after the header still leaves the frame unfinished.
        Err(TransportError::ConnectionClosed) => Err(TransportError::Truncated {
            read: 0,
            expected: len,
        }),
        Err(e) => Err(e),
    }
}

/// Outbound TCP connector.
#[derive(Debug, Clone)]
pub struct Dialer {
    host: String,
    port: u16,
    local_port: Option<u16>,
    connect_timeout: Duration,
}

impl Dialer {
    /// Dialer for `host:port` with an OS-chosen local port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            local_port: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Bind the local end to a fixed port (`None` lets the OS choose).
    pub fn local_port(mut self, port: Option<u16>) -> Self {
        self.local_port = port;
        self
    }

    /// Bound for name resolution plus the TCP handshake.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// `host:port` as dialed.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve and connect.
    pub async fn connect(&self) -> TransportResult<TcpStream> {
        timeout(self.connect_timeout, self.connect_inner())
            .await
            .map_err(|_| TransportError::ConnectTimeout(self.connect_timeout))?
    }

    async fn connect_inner(&self) -> TransportResult<TcpStream> {
        let addr = lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| TransportError::Unresolved(self.target()))?;

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        if let Some(port) = self.local_port {
            let local = match addr {
                SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
                SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)),
            };
            socket.set_reuseaddr(true)?;
            socket.bind(local)?;
        }

        let stream = socket.connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}
