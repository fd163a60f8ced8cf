//! Satellite-side transport.
//!
//! Keeps one upstream connection alive. Host payloads are framed on the way
//! out; whatever the hub sends comes back as raw chunks, so the host can
//! reassemble frames with a [`FrameDecoder`](crate::transport::FrameDecoder).

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::WriteHalf;
use tokio::time::timeout;

use crate::core::{Notice, READ_CHUNK_SIZE};
use crate::settings::{ClientSettings, Timing};
use crate::transport::{
    Bridge, Dialer, FrameCodec, Outbound, StateCell, StopSignal, TransportError, TransportResult,
};

const LOG_TARGET: &str = "satlink::client";

/// Where the client is in its connect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    /// Not connected; waiting out the reconnect interval.
    Disconnected,
    /// Connect attempt in flight.
    Connecting,
    /// Link up.
    Connected,
    /// Shut down. Terminal.
    Stopped,
}

/// The satellite transport. Consumed by [`ClientTransport::run`].
#[derive(Debug)]
pub struct ClientTransport {
    settings: ClientSettings,
    timing: Timing,
    bridge: Bridge,
    state: Arc<StateCell>,
    stop: StopSignal,
    dialer: Dialer,
    codec: FrameCodec,
    phase: ClientPhase,
}

impl ClientTransport {
    /// Prepare a client. Nothing is dialed until [`run`](Self::run).
    pub fn new(
        settings: ClientSettings,
        timing: Timing,
        bridge: Bridge,
        state: Arc<StateCell>,
        stop: StopSignal,
    ) -> Self {
        let dialer = Dialer::new(settings.remote_host(), settings.remote_port())
            .local_port(settings.local_port())
            .connect_timeout(timing.connect_timeout);
        let codec = settings
            .max_message_size()
            .map_or(FrameCodec::unbounded(), FrameCodec::new);

        Self {
            settings,
            timing,
            bridge,
            state,
            stop,
            dialer,
            codec,
            phase: ClientPhase::Disconnected,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    /// Connect, pump and reconnect until stop is requested.
    ///
    /// Connection problems are never returned; they are reported as notices
    /// and retried after the reconnect interval.
    pub async fn run(mut self) -> TransportResult<()> {
        let stop = self.stop.clone();
        let target = self.dialer.target();

        while !stop.is_requested() {
            self.enter(ClientPhase::Connecting);
            let attempt = tokio::select! {
                biased;
                _ = stop.wait() => break,
                attempt = self.dialer.connect() => attempt,
            };

            let stream = match attempt {
                Ok(stream) => stream,
                Err(e) => {
                    self.link_down();
                    self.notify(Notice::error(format!("Connection failed to {target}: {e}")));
                    if !self.stop.sleep(self.settings.reconnect_interval()).await {
                        break;
                    }
                    continue;
                }
            };

            self.enter(ClientPhase::Connected);
            self.state.set_connected(true);
            let local = stream
                .local_addr()
                .map_or_else(|_| "?".to_string(), |addr| addr.to_string());
            self.notify(Notice::info(format!("Connected to {target} (local {local})")));
            self.bridge.emit(Outbound::Ready);

            let outcome = self.pump(stream).await;
            self.link_down();
            match outcome {
                Ok(()) => break,
                Err(e) => {
                    self.notify(Notice::warning(format!("Connection to {target} lost: {e}")));
                    if !self.back_off().await {
                        break;
                    }
                }
            }
        }

        self.enter(ClientPhase::Stopped);
        self.state.set_connected(false);
        self.notify(Notice::info("Client stopped"));
        Ok(())
    }

    /// Move bytes both ways until the link fails (`Err`) or stop is requested (`Ok`).
    async fn pump(&self, mut stream: TcpStream) -> TransportResult<()> {
        let stop = self.stop.clone();
        let bridge = self.bridge.clone();
        let (mut reader, mut writer) = stream.split();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            tokio::select! {
                biased;

                _ = stop.wait() => {
                    let flushed = timeout(self.timing.flush_timeout, self.send_pending(&mut writer)).await;
                    if !matches!(flushed, Ok(Ok(()))) {
                        log::debug!(target: LOG_TARGET, "shutdown flush incomplete");
                    }
                    let _ = timeout(self.timing.flush_timeout, writer.shutdown()).await;
                    return Ok(());
                }

                read = reader.read(&mut chunk) => match read? {
                    0 => return Err(TransportError::ConnectionClosed),
                    n => bridge.emit(Outbound::Payload(Bytes::copy_from_slice(&chunk[..n]))),
                },

                _ = bridge.inbound().wait() => self.send_pending(&mut writer).await?,
            }
        }
    }

    /// Frame and write queued host payloads one at a time.
    ///
    /// A failed write loses only the entry in flight; later ones stay queued
    /// for the next connection.
    ///
    /// Every write races the stop signal. Once stop is requested the frame in
    /// flight gets `flush_timeout` to finish and is abandoned after that, so
    /// a hub that stopped reading cannot hold the transport open.
    async fn send_pending(&self, writer: &mut WriteHalf<'_>) -> TransportResult<()> {
        while let Some(payload) = self.bridge.inbound().pop() {
            let frame = match self.codec.encode(&payload) {
                Ok(frame) => frame,
                Err(e) => {
                    self.notify(Notice::warning(format!("Payload skipped: {e}")));
                    continue;
                }
            };

            let write = writer.write_all(&frame);
            tokio::pin!(write);
            tokio::select! {
                biased;

                written = &mut write => written?,

                _ = self.stop.wait() => {
                    match timeout(self.timing.flush_timeout, &mut write).await {
                        Ok(written) => written?,
                        Err(_) => log::debug!(
                            target: LOG_TARGET,
                            "stalled write of {} bytes abandoned",
                            frame.len()
                        ),
                    }
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Announce the retry after a lost link and sleep the reconnect interval.
    /// `false` if stop interrupted it.
    async fn back_off(&self) -> bool {
        let interval = self.settings.reconnect_interval();
        self.notify(Notice::info(format!(
            "Reconnecting in {}s…",
            interval.as_secs()
        )));
        self.stop.sleep(interval).await
    }

    fn enter(&mut self, phase: ClientPhase) {
        log::debug!(target: LOG_TARGET, "{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn link_down(&mut self) {
        self.enter(ClientPhase::Disconnected);
        self.state.set_connected(false);
    }

    fn notify(&self, notice: Notice) {
        self.bridge.notice(LOG_TARGET, notice);
    }
}
