//! Host-side handle for a running transport.
//!
//! A [`Link`] owns one dedicated OS thread running a single-threaded tokio
//! runtime with either the hub or the satellite transport on it. The host
//! talks to it only through the [`Bridge`] queues and the state snapshot, so
//! it never blocks on socket I/O.
//!
//! ```no_run
//! use std::time::Duration;
//! use satlink::{Link, TransportSettings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = TransportSettings::from_path("satlink.json")?;
//! let link = Link::spawn(settings)?;
//!
//! link.send(&b"palette:v1"[..])?;
//! if link.wait(Duration::from_millis(50)) {
//!     for entry in link.drain() {
//!         println!("{entry:?}");
//!     }
//! }
//! link.shutdown()?;
//! # Ok(())
//! # }
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;

use crate::client::ClientTransport;
use crate::core::{Notice, OutboundHandler};
use crate::server::ServerTransport;
use crate::settings::{Role, TransportSettings};
use crate::transport::{
    Bridge, FrameCodec, Outbound, StateCell, StopSignal, TransportError, TransportResult,
    TransportState,
};

const LOG_TARGET: &str = "satlink::link";

/// A running transport and its host-side queues.
///
/// Dropping the link requests stop and joins the transport thread.
#[derive(Debug)]
pub struct Link {
    role: Role,
    bridge: Bridge,
    state: Arc<StateCell>,
    stop: StopSignal,
    codec: FrameCodec,
    thread: Option<JoinHandle<TransportResult<()>>>,
}

impl Link {
    /// Start the transport selected by `settings.role()` on its own thread,
    /// exchanging data through `bridge`.
    ///
    /// Fails only if the thread cannot be spawned. Bind and runtime failures
    /// happen on the thread; they arrive as a `Fatal` notice and as the
    /// result of [`Link::shutdown`].
    pub fn start(settings: TransportSettings, bridge: Bridge) -> TransportResult<Self> {
        let role = settings.role();
        let state = Arc::new(StateCell::new(role));
        let stop = StopSignal::new();
        let codec = match role {
            Role::Server => FrameCodec::new(settings.server_settings().max_message_size()),
            Role::Client => settings
                .client_settings()
                .max_message_size()
                .map_or(FrameCodec::unbounded(), FrameCodec::new),
        };

        let thread = {
            let bridge = bridge.clone();
            let state = Arc::clone(&state);
            let stop = stop.clone();
            thread::Builder::new()
                .name(format!("satlink-{role}"))
                .spawn(move || run_transport(settings, bridge, state, stop))
                .map_err(TransportError::Runtime)?
        };
        log::debug!(target: LOG_TARGET, "{role} transport thread started");

        Ok(Self {
            role,
            bridge,
            state,
            stop,
            codec,
            thread: Some(thread),
        })
    }

    /// [`Link::start`] with a fresh bridge.
    pub fn spawn(settings: TransportSettings) -> TransportResult<Self> {
        Self::start(settings, Bridge::new())
    }

    /// Role of the running transport.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The shared queues, e.g. to install a wake hook.
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Queue `payload` for the peer(s).
    ///
    /// Oversized payloads fail with [`FrameError::PayloadTooLarge`]. A
    /// satellite that is not connected refuses with [`TransportError::LinkDown`]
    /// instead of queueing stale data. A hub queues even with no peers; the
    /// payload is discarded at broadcast time.
    ///
    /// [`FrameError::PayloadTooLarge`]: crate::transport::FrameError::PayloadTooLarge
    pub fn send(&self, payload: impl Into<Bytes>) -> TransportResult<()> {
        let payload = payload.into();
        self.codec.check_len(payload.len())?;
        if self.role == Role::Client && !self.state.is_connected() {
            log::warn!(
                target: LOG_TARGET,
                "link down, dropping {} byte payload",
                payload.len()
            );
            return Err(TransportError::LinkDown);
        }
        self.bridge.push_inbound(payload);
        Ok(())
    }

    /// Take everything delivered so far.
    pub fn drain(&self) -> Vec<Outbound> {
        self.bridge.drain_outbound()
    }

    /// Block until something is delivered or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> bool {
        self.bridge.wait_outbound(timeout)
    }

    /// Drain and hand every entry to `handler`, in order. Returns how many.
    pub fn dispatch<H: OutboundHandler + ?Sized>(&self, handler: &mut H) -> usize {
        let entries = self.drain();
        let count = entries.len();
        for entry in entries {
            match entry {
                Outbound::Ready => handler.on_ready(),
                Outbound::Payload(payload) => handler.on_payload(payload),
                Outbound::Notice(notice) => handler.on_notice(&notice),
            }
        }
        count
    }

    /// Current state snapshot.
    pub fn state(&self) -> TransportState {
        self.state.snapshot()
    }

    /// Active peers (hub role).
    pub fn connected_count(&self) -> usize {
        self.state.connected_count()
    }

    /// Whether the upstream link is up (satellite role).
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Address the hub listener bound, once bound.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state.local_addr()
    }

    /// Whether the transport thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the transport, wait for it, and return how it ended.
    pub fn shutdown(mut self) -> TransportResult<()> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> TransportResult<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        self.stop.request();
        thread.join().unwrap_or_else(|_| {
            Err(TransportError::Runtime(io::Error::other(
                "transport thread panicked",
            )))
        })
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if let Err(e) = self.stop_and_join() {
            log::debug!(target: LOG_TARGET, "transport ended with error: {e}");
        }
    }
}

/// Body of the transport thread.
fn run_transport(
    settings: TransportSettings,
    bridge: Bridge,
    state: Arc<StateCell>,
    stop: StopSignal,
) -> TransportResult<()> {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            bridge.notice(
                LOG_TARGET,
                Notice::fatal(format!("Transport runtime failed to start: {e}")),
            );
            return Err(TransportError::Runtime(e));
        }
    };

    let timing = *settings.timing();
    match settings.role() {
        Role::Server => {
            let server = ServerTransport::new(
                settings.server_settings().clone(),
                timing,
                bridge,
                state,
                stop,
            );
            runtime.block_on(server.run())
        }
        Role::Client => {
            let client = ClientTransport::new(
                settings.client_settings().clone(),
                timing,
                bridge,
                state,
                stop,
            );
            runtime.block_on(client.run())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use crate::core::NoticeLevel;
    use crate::settings::{ClientSettings, ServerSettings};
    use crate::transport::{FrameDecoder, FrameError};

    fn hub(max_connections: usize) -> Link {
        let settings = ServerSettings::builder()
            .host("127.0.0.1")
            .port(0)
            .max_connections(max_connections)
            .build()
            .unwrap();
        let link = Link::spawn(TransportSettings::server(settings)).unwrap();
        until(Duration::from_secs(5), || link.local_addr().is_some());
        link
    }

    fn satellite(hub: &Link) -> Link {
        let port = hub.local_addr().unwrap().port();
        let settings = ClientSettings::builder()
            .remote_host("127.0.0.1")
            .remote_port(port)
            .reconnect_interval(Duration::from_secs(1))
            .build()
            .unwrap();
        Link::spawn(TransportSettings::client(settings)).unwrap()
    }

    fn until(limit: Duration, mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + limit;
        while !done() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Collects frames out of a satellite's raw chunks.
    struct Collector {
        decoder: FrameDecoder,
        frames: Vec<Bytes>,
        readies: usize,
        notices: Vec<Notice>,
    }

    impl Collector {
        fn new() -> Self {
            Self {
                decoder: FrameDecoder::new(FrameCodec::unbounded()),
                frames: Vec::new(),
                readies: 0,
                notices: Vec::new(),
            }
        }
    }

    impl OutboundHandler for Collector {
        fn on_payload(&mut self, payload: Bytes) {
            self.frames.extend(self.decoder.feed(&payload).unwrap());
        }

        fn on_ready(&mut self) {
            self.readies += 1;
        }

        fn on_notice(&mut self, notice: &Notice) {
            self.notices.push(notice.clone());
        }
    }

    fn pump_until(link: &Link, collector: &mut Collector, mut done: impl FnMut(&Collector) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(collector) {
            assert!(Instant::now() < deadline, "condition not reached in time");
            if link.wait(Duration::from_millis(50)) {
                link.dispatch(collector);
            }
        }
    }

    #[test]
    fn test_round_trip_between_links() {
        let hub = hub(5);
        let sat = satellite(&hub);
        until(Duration::from_secs(5), || sat.is_connected() && hub.connected_count() == 1);
        assert_eq!(hub.state(), TransportState::Server { connected_count: 1 });
        assert_eq!(sat.state(), TransportState::Client { connected: true });

        sat.send(&b"ping"[..]).unwrap();
        let mut received = Vec::new();
        until(Duration::from_secs(5), || {
            received.extend(hub.drain().into_iter().filter_map(|o| o.as_payload().cloned()));
            !received.is_empty()
        });
        assert_eq!(received, vec![Bytes::from_static(b"ping")]);

        hub.send(&b"pong"[..]).unwrap();
        let mut collector = Collector::new();
        pump_until(&sat, &mut collector, |c| !c.frames.is_empty());
        assert_eq!(collector.readies, 1);
        assert_eq!(collector.frames, vec![Bytes::from_static(b"pong")]);

        sat.shutdown().unwrap();
        until(Duration::from_secs(5), || hub.connected_count() == 0);
        hub.shutdown().unwrap();
    }

    #[test]
    fn test_third_satellite_rejected() {
        let hub = hub(2);
        let first = satellite(&hub);
        let second = satellite(&hub);
        until(Duration::from_secs(5), || hub.connected_count() == 2);

        let third = satellite(&hub);
        let mut collector = Collector::new();
        pump_until(&third, &mut collector, |c| !c.frames.is_empty());
        let json: serde_json::Value = serde_json::from_slice(&collector.frames[0]).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["level"], "error");
        assert!(
            json["msg"]
                .as_str()
                .unwrap()
                .starts_with("Connection rejected: too many connections")
        );
        assert_eq!(hub.connected_count(), 2);

        hub.send(&b"A"[..]).unwrap();
        for sat in [&first, &second] {
            let mut collector = Collector::new();
            pump_until(sat, &mut collector, |c| !c.frames.is_empty());
            assert_eq!(collector.frames, vec![Bytes::from_static(b"A")]);
        }

        drop(third);
        drop(first);
        drop(second);
        hub.shutdown().unwrap();
    }

    #[test]
    fn test_send_checks() {
        let hub = hub(1);
        let err = hub.send(vec![0u8; 1_048_577]).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Frame(FrameError::PayloadTooLarge { size: 1_048_577, .. })
        ));
        // No peers yet: accepted and discarded at broadcast time.
        hub.send(&b"early"[..]).unwrap();

        let port = {
            let spare = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            spare.local_addr().unwrap().port()
        };
        let settings = ClientSettings::builder()
            .remote_host("127.0.0.1")
            .remote_port(port)
            .build()
            .unwrap();
        let sat = Link::spawn(TransportSettings::client(settings)).unwrap();
        assert!(matches!(sat.send(&b"x"[..]), Err(TransportError::LinkDown)));
        assert!(sat.is_running());

        drop(sat);
        hub.shutdown().unwrap();
    }

    #[test]
    fn test_bind_failure_surfaces_on_shutdown() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let settings = ServerSettings::builder()
            .host("127.0.0.1")
            .port(taken.local_addr().unwrap().port())
            .build()
            .unwrap();
        let link = Link::spawn(TransportSettings::server(settings)).unwrap();

        assert!(link.wait(Duration::from_secs(5)));
        let notice = link.drain().pop().unwrap();
        assert_eq!(notice.as_notice().unwrap().level, NoticeLevel::Fatal);
        until(Duration::from_secs(5), || !link.is_running());

        let err = link.shutdown().unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));
    }

    #[test]
    fn test_wake_hook_fires_on_delivery() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let bridge = Bridge::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        bridge.set_wake_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let settings = ServerSettings::builder().host("127.0.0.1").port(0).build().unwrap();
        let link = Link::start(TransportSettings::server(settings), bridge).unwrap();
        until(Duration::from_secs(5), || wakes.load(Ordering::SeqCst) > 0);
        link.shutdown().unwrap();
    }
}
