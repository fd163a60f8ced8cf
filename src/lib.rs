//! # Satlink
//!
//! Hub/satellite link for mirroring runtime state between two processes over
//! a private TCP channel.
//!
//! A background thread owns every socket. The host application only pushes
//! payloads onto a queue and drains what arrives, so it never blocks on I/O:
//!
//! - **Framing**: every payload travels as `[u32 big-endian length][bytes]`
//! - **Hub**: listens, accepts up to `max_connections` satellites, broadcasts
//! - **Satellite**: one upstream connection, reconnected forever
//! - **Bridge**: two thread-safe FIFO queues plus a wake-up signal
//!
//! ## Feature Flags
//!
//! - `server` (default): hub transport
//! - `client` (default): satellite transport
//!
//! [`Link`] needs both.
//!
//! ## Modules
//!
//! - [`core`]: constants, errors, notices and the [`OutboundHandler`] trait
//! - [`transport`]: framing, bridge queues, state snapshot, socket helpers
//! - [`settings`]: validated configuration and the JSON document loader
//! - [`server`] / [`client`]: the two transports
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use satlink::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = TransportSettings::from_json_str(
//!     r#"{ "socket": { "role": "server", "server": { "port": 30000 } } }"#,
//! )?;
//! let link = Link::spawn(settings)?;
//!
//! link.send(&b"palette:v1"[..])?;
//! while link.wait(Duration::from_millis(100)) {
//!     for entry in link.drain() {
//!         if let Some(payload) = entry.as_payload() {
//!             println!("{} bytes from a satellite", payload.len());
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Settings and transport plumbing (always included)
pub mod settings;
pub mod transport;

// Satellite transport (feature-gated)
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod client;

// Hub transport (feature-gated)
#[cfg(feature = "server")]
#[cfg_attr(docsrs, doc(cfg(feature = "server")))]
pub mod server;

// Host handle (needs both transports)
#[cfg(all(feature = "client", feature = "server"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "client", feature = "server"))))]
mod link;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{Notice, NoticeLevel, OutboundHandler, SatlinkError};
    pub use crate::settings::{ClientSettings, Role, ServerSettings, Timing, TransportSettings};
    pub use crate::transport::{
        Bridge, FrameCodec, FrameDecoder, FrameError, Outbound, TransportError, TransportResult,
        TransportState,
    };

    #[cfg(all(feature = "client", feature = "server"))]
    pub use crate::link::Link;
}

// Re-export commonly used items at crate root
pub use core::{Notice, NoticeLevel, OutboundHandler, SatlinkError};
pub use settings::{Role, TransportSettings};
pub use transport::{Bridge, FrameCodec, Outbound, TransportError, TransportState};

#[cfg(all(feature = "client", feature = "server"))]
pub use link::Link;
