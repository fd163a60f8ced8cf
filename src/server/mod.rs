//! Satlink - Hub Transport
//!
//! Accepts up to `max_connections` satellites and broadcasts host payloads to
//! all of them. Over-limit newcomers receive a framed rejection notice.

mod connection;
#[allow(clippy::module_inception)]
mod server;

pub use connection::PeerId;
pub use server::*;
