//! Hub-side transport.
//!
//! Listens for satellites, unframes what they send onto the bridge and
//! broadcasts every host payload to all of them.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::connection::{Peer, PeerEvent, PeerId, reject};
use crate::core::Notice;
use crate::settings::{ServerSettings, Timing};
use crate::transport::{
    Bridge, FrameCodec, StateCell, StopSignal, TransportError, TransportResult,
};

const LOG_TARGET: &str = "satlink::server";

/// The hub transport. Consumed by [`ServerTransport::run`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use satlink::server::ServerTransport;
/// use satlink::settings::{Role, ServerSettings, Timing};
/// use satlink::transport::{Bridge, StateCell, StopSignal};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = ServerSettings::builder().port(30000).build()?;
/// let bridge = Bridge::new();
/// let state = Arc::new(StateCell::new(Role::Server));
/// let stop = StopSignal::new();
///
/// let server = ServerTransport::new(settings, Timing::default(), bridge, state, stop.clone());
/// tokio::spawn(server.run());
/// // ... later
/// stop.request();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ServerTransport {
    settings: ServerSettings,
    timing: Timing,
    bridge: Bridge,
    state: Arc<StateCell>,
    stop: StopSignal,
    codec: FrameCodec,
    peers: BTreeMap<PeerId, Peer>,
    next_id: PeerId,
}

impl ServerTransport {
    /// Prepare a server. Nothing is bound until [`run`](Self::run).
    pub fn new(
        settings: ServerSettings,
        timing: Timing,
        bridge: Bridge,
        state: Arc<StateCell>,
        stop: StopSignal,
    ) -> Self {
        let codec = FrameCodec::new(settings.max_message_size());
        Self {
            settings,
            timing,
            bridge,
            state,
            stop,
            codec,
            peers: BTreeMap::new(),
            next_id: PeerId::FIRST,
        }
    }

    /// Bind, serve until stop is requested, then shut down.
    ///
    /// Only a bind failure ends this early, as [`TransportError::Bind`].
    pub async fn run(mut self) -> TransportResult<()> {
        let addr = self.settings.bind_addr();
        let listener =
            match TcpListener::bind((self.settings.host(), self.settings.port())).await {
                Ok(listener) => listener,
                Err(source) => {
                    self.notify(Notice::fatal(format!("Bind failed on {addr}: {source}")));
                    return Err(TransportError::Bind { addr, source });
                }
            };

        let local = listener.local_addr()?;
        self.state.set_local_addr(Some(local));
        self.state.set_connected_count(0);
        self.notify(Notice::info(format!(
            "Listening on {local} (max {} connections)",
            self.settings.max_connections()
        )));

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let stop = self.stop.clone();
        let bridge = self.bridge.clone();

        while !stop.is_requested() {
            tokio::select! {
                biased;

                _ = stop.wait() => break,

                Some(event) = events_rx.recv() => self.on_peer_event(event),

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.admit(stream, peer, &events_tx),
                    Err(e) => {
                        self.notify(Notice::warning(format!("Accept failed: {e}")));
                        stop.sleep(self.timing.poll_interval).await;
                    }
                },

                _ = bridge.inbound().wait() => self.broadcast(),
            }
        }

        drop(listener);
        self.shutdown().await;
        Ok(())
    }

    fn admit(
        &mut self,
        stream: TcpStream,
        addr: SocketAddr,
        events: &mpsc::UnboundedSender<PeerEvent>,
    ) {
        let current = self.peers.len();
        let max = self.settings.max_connections();
        if current >= max {
            let reason = format!("too many connections (current={current}, max={max})");
            self.notify(Notice::warning(format!(
                "Connection rejected from {addr}: {reason}"
            )));
            let notice = Notice::error(format!("Connection rejected: {reason}"));
            tokio::spawn(reject(stream, notice, self.timing.flush_timeout));
            return;
        }

        let id = self.next_id;
        self.next_id = id.next();
        let peer = Peer::spawn(
            id,
            stream,
            addr,
            self.codec,
            self.timing.read_deadline,
            self.bridge.clone(),
            events.clone(),
        );
        self.peers.insert(id, peer);
        self.state.set_connected_count(self.peers.len());
        self.notify(Notice::info(format!(
            "Client connected: id={id}, remote={addr} ({}/{max})",
            self.peers.len()
        )));
    }

    fn on_peer_event(&mut self, event: PeerEvent) {
        let PeerEvent::Closed { id, reason } = event;
        // Both halves may report; only the first one finds the peer.
        let Some(peer) = self.peers.remove(&id) else {
            return;
        };
        let addr = peer.addr();
        peer.abort();
        self.state.set_connected_count(self.peers.len());

        let notice = if reason.is_peer_close() {
            Notice::info(format!("Client disconnected: id={id}, remote={addr}"))
        } else {
            Notice::warning(format!("Client dropped: id={id}, remote={addr} ({reason})"))
        };
        self.notify(notice);
    }

    /// Frame every queued host payload once and hand it to each peer's writer.
    fn broadcast(&mut self) {
        for payload in self.bridge.inbound().drain() {
            let frame = match self.codec.encode(&payload) {
                Ok(frame) => frame,
                Err(e) => {
                    self.notify(Notice::warning(format!("Payload skipped: {e}")));
                    continue;
                }
            };
            if self.peers.is_empty() {
                log::debug!(target: LOG_TARGET, "no peers, {} byte payload discarded", payload.len());
                continue;
            }
            for peer in self.peers.values() {
                if !peer.send(frame.clone()) {
                    log::debug!(target: LOG_TARGET, "peer {} writer already closed", peer.id());
                }
            }
        }
    }

    async fn shutdown(&mut self) {
        // Whatever the host queued before stopping still goes out.
        if !self.bridge.inbound().is_empty() {
            self.broadcast();
        }

        let deadline = Instant::now() + self.timing.flush_timeout;
        let peers = std::mem::take(&mut self.peers);
        for peer in peers.into_values() {
            peer.close(deadline).await;
        }

        self.state.set_connected_count(0);
        self.state.set_local_addr(None);
        self.notify(Notice::info("Server stopped"));
    }

    fn notify(&self, notice: Notice) {
        self.bridge.notice(LOG_TARGET, notice);
    }
}
