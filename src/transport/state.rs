//! Observable transport state.
//!
//! Written only by the transport thread; the host reads it at any time without
//! blocking. Reads are eventually consistent and never ahead of the transport.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::settings::Role;

/// Snapshot of what the transport currently sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Hub side.
    Server {
        /// Active peer connections.
        connected_count: usize,
    },
    /// Satellite side.
    Client {
        /// Whether the upstream link is up.
        connected: bool,
    },
}

impl TransportState {
    /// At least one usable connection exists.
    pub fn is_linked(&self) -> bool {
        match *self {
            TransportState::Server { connected_count } => connected_count > 0,
            TransportState::Client { connected } => connected,
        }
    }
}

/// Shared cell behind [`TransportState`].
#[derive(Debug)]
pub struct StateCell {
    role: Role,
    connected_count: AtomicUsize,
    connected: AtomicBool,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl StateCell {
    /// Fresh, disconnected state for `role`.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            connected_count: AtomicUsize::new(0),
            connected: AtomicBool::new(false),
            local_addr: Mutex::new(None),
        }
    }

    /// Role this cell describes.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> TransportState {
        match self.role {
            Role::Server => TransportState::Server {
                connected_count: self.connected_count(),
            },
            Role::Client => TransportState::Client {
                connected: self.is_connected(),
            },
        }
    }

    /// Active peer count (server role; always `0` for clients).
    pub fn connected_count(&self) -> usize {
        self.connected_count.load(Ordering::Acquire)
    }

    /// Whether the upstream link is up (client role; always `false` for servers).
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Address the listener is bound to, once bound (server role).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    pub(crate) fn set_connected_count(&self, count: usize) {
        self.connected_count.store(count, Ordering::Release);
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub(crate) fn set_local_addr(&self, addr: Option<SocketAddr>) {
        *self.local_addr.lock() = addr;
    }
}
