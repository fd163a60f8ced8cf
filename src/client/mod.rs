//! Satlink - Satellite Transport
//!
//! Maintains the single upstream link to a hub, reconnecting forever.

#[allow(clippy::module_inception)]
mod client;

pub use client::*;
