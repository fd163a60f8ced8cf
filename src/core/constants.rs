//! Protocol and runtime constants.
//!
//! Wire constants are fixed by the framing format and MUST NOT be changed.
//! Timing and limit constants are defaults; deployments override them through
//! [`crate::settings`].

use std::time::Duration;

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Length prefix size (u32, big-endian).
pub const FRAME_HEADER_SIZE: usize = 4;

/// Largest body a length prefix can describe.
pub const MAX_WIRE_PAYLOAD: usize = u32::MAX as usize;

// =============================================================================
// SERVER LIMITS
// =============================================================================

/// Default bind host.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_SERVER_PORT: u16 = 300;

/// Default number of simultaneously connected satellites.
pub const DEFAULT_MAX_CONNECTIONS: usize = 5;

/// Lower bound for `max_connections`.
pub const MIN_MAX_CONNECTIONS: usize = 1;

/// Default maximum accepted frame body (1 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Lower bound for `max_message_size`.
pub const MIN_MAX_MESSAGE_SIZE: usize = 1024;

// =============================================================================
// CLIENT
// =============================================================================

/// Default delay between reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Lower bound for the reconnect delay.
pub const MIN_RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// Size of a single read from the upstream socket.
pub const READ_CHUNK_SIZE: usize = 8192;

// =============================================================================
// TIMING
// =============================================================================

/// Back-off after a failed accept. The transports have no polling cycle;
/// this is the only delay the interval controls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Window for the rest of a header or body to arrive once its first byte did.
pub const DEFAULT_READ_DEADLINE: Duration = Duration::from_millis(200);

/// Upper bound for a single TCP connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Budget for flushing queued writes when the transport stops.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_millis(200);
