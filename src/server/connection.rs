//! Per-peer connection handling.
//!
//! Every accepted socket is split in two tasks on the transport thread:
//!
//! - a **reader** that unframes peer input onto the bridge, and
//! - a **writer** that drains this peer's queue of pre-framed broadcasts.
//!
//! Either task reports its terminal error to the server loop as a
//! [`PeerEvent`]; the loop owns the registry and decides what to drop.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout, timeout_at};

use crate::core::Notice;
use crate::transport::{Bridge, FrameCodec, Outbound, TransportError, read_frame};

/// Identifier of an accepted peer. Monotonic, never reused while the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    /// First id handed out by a fresh server.
    pub const FIRST: PeerId = PeerId(1);

    /// Raw value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// The id after this one.
    pub fn next(self) -> PeerId {
        PeerId(self.0.wrapping_add(1))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle events reported by peer tasks.
#[derive(Debug)]
pub(crate) enum PeerEvent {
    /// The peer's reader or writer stopped.
    Closed { id: PeerId, reason: TransportError },
}

/// Registry entry for one active peer.
#[derive(Debug)]
pub(crate) struct Peer {
    id: PeerId,
    addr: SocketAddr,
    queue: mpsc::UnboundedSender<Bytes>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Peer {
    /// Split `stream` and start the reader and writer tasks.
    pub(crate) fn spawn(
        id: PeerId,
        stream: TcpStream,
        addr: SocketAddr,
        codec: FrameCodec,
        read_deadline: Duration,
        bridge: Bridge,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!(target: "satlink::server", "peer {id}: set_nodelay failed: {e}");
        }
        let (read_half, write_half) = stream.into_split();
        let (queue, pending) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_loop(
            id,
            read_half,
            codec,
            read_deadline,
            bridge,
            events.clone(),
        ));
        let writer = tokio::spawn(write_loop(id, write_half, pending, events));

        Self {
            id,
            addr,
            queue,
            reader,
            writer,
        }
    }

    pub(crate) fn id(&self) -> PeerId {
        self.id
    }

    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Queue an already framed message. Returns `false` if the writer is gone.
    pub(crate) fn send(&self, frame: Bytes) -> bool {
        self.queue.send(frame).is_ok()
    }

    /// Tear down immediately, discarding anything still queued.
    pub(crate) fn abort(self) {
        self.reader.abort();
        self.writer.abort();
    }

    /// Let the writer flush what is queued until `deadline`, then close.
    pub(crate) async fn close(self, deadline: Instant) {
        let Peer {
            id,
            queue,
            reader,
            mut writer,
            ..
        } = self;
        reader.abort();
        drop(queue);
        if timeout_at(deadline, &mut writer).await.is_err() {
            log::debug!(target: "satlink::server", "peer {id}: flush timed out");
            writer.abort();
        }
    }
}

async fn read_loop(
    id: PeerId,
    mut reader: OwnedReadHalf,
    codec: FrameCodec,
    window: Duration,
    bridge: Bridge,
    events: mpsc::UnboundedSender<PeerEvent>,
) {
    let reason = loop {
        match read_frame(&mut reader, &codec, window).await {
            Ok(body) => {
                log::trace!(target: "satlink::server", "peer {id}: {} byte payload", body.len());
                bridge.emit(Outbound::Payload(body));
            }
            Err(e) => break e,
        }
    };
    let _ = events.send(PeerEvent::Closed { id, reason });
}

async fn write_loop(
    id: PeerId,
    mut writer: OwnedWriteHalf,
    mut pending: mpsc::UnboundedReceiver<Bytes>,
    events: mpsc::UnboundedSender<PeerEvent>,
) {
    while let Some(frame) = pending.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            let _ = events.send(PeerEvent::Closed {
                id,
                reason: e.into(),
            });
            return;
        }
    }
    // Queue closed by the server: orderly close.
    let _ = writer.shutdown().await;
}

/// Tell an over-limit newcomer why it is turned away, then close it.
///
/// The body is the notice's JSON form in a single frame. Bounded by `within`.
pub(crate) async fn reject(mut stream: TcpStream, notice: Notice, within: Duration) {
    let Ok(frame) = FrameCodec::unbounded().encode(&notice.to_json()) else {
        return;
    };
    let _ = timeout(within, async {
        stream.write_all(&frame).await?;
        stream.shutdown().await
    })
    .await;
}
