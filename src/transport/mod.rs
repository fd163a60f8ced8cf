//! Satlink - Transport Layer
//!
//! Pieces shared by the hub and satellite transports:
//!
//! - **Framing**: [`FrameCodec`] and [`FrameDecoder`] for the length-prefixed wire format
//! - **Bridge**: [`Bridge`] queues between the host thread and the transport thread
//! - **State**: [`StateCell`] / [`TransportState`] observable snapshot
//! - **Shutdown**: [`StopSignal`] cooperative stop flag
//! - **Sockets**: bounded-wait frame reads and the outbound [`Dialer`]
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐          ┌──────────────────────────────┐
//! │       Host thread        │          │      Transport thread        │
//! │                          │ inbound  │  (single-threaded runtime)   │
//! │  payload generators ─────┼─────────▶│  frame ─▶ write to peer(s)   │
//! │                          │          │                              │
//! │  event glue ◀────────────┼──────────│  read ─▶ unframe (server)    │
//! │      ▲ wake hook         │ outbound │  notices, Ready (client)     │
//! │      └───────────────────┼──────────│                              │
//! │  reads TransportState ◀──┼──────────│  publishes state             │
//! └──────────────────────────┘          └──────────────────────────────┘
//! ```

mod bridge;
mod error;
mod frame;
mod signal;
mod socket;
mod state;

pub use bridge::*;
pub use error::*;
pub use frame::*;
pub use signal::StopSignal;
pub use socket::*;
pub use state::*;
