//! Collaborator traits.
//!
//! The transport never interprets payloads. Hosts plug their payload
//! generators and event glue in through these traits.

use bytes::Bytes;

use super::notice::Notice;

/// Consumer of everything the transport pushes onto the `outbound` queue.
///
/// Implementations run on the host thread, inside [`crate::Link::dispatch`].
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use satlink::core::OutboundHandler;
///
/// #[derive(Default)]
/// struct Mirror {
///     handshakes: usize,
///     received: Vec<Bytes>,
/// }
///
/// impl OutboundHandler for Mirror {
///     fn on_payload(&mut self, payload: Bytes) {
///         self.received.push(payload);
///     }
///
///     fn on_ready(&mut self) {
///         // Upstream (re)connected: replay the handshake sequence.
///         self.handshakes += 1;
///     }
/// }
/// ```
pub trait OutboundHandler {
    /// Bytes received from a peer.
    ///
    /// Server role: one complete frame body per call. Client role: a raw
    /// stream chunk, which may hold partial or several frames (feed it to a
    /// [`crate::transport::FrameDecoder`]).
    fn on_payload(&mut self, payload: Bytes);

    /// The client transport has just (re)connected.
    fn on_ready(&mut self) {}

    /// A lifecycle notice. Defaults to forwarding it to the `log` facade.
    fn on_notice(&mut self, notice: &Notice) {
        notice.log("satlink::host");
    }
}
