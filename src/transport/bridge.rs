//! Host ↔ transport bridge.
//!
//! Two FIFO queues cross the thread boundary:
//!
//! ```text
//!            push_inbound()                    inbound().wait().await
//!   host ─────────────────────▶ [ inbound  ] ─────────────────────────▶ transport
//!   host ◀───────────────────── [ outbound ] ◀───────────────────────── transport
//!        drain_outbound() /                    emit() + wake hook
//!        wait_outbound()
//! ```
//!
//! Wake-ups are level-triggered. Any number of pushes before the consumer
//! looks collapse into "queue non-empty", so consumers drain until empty on
//! every wake-up instead of assuming one wake-up per message.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::{Condvar, Mutex, RwLock};
use tokio::sync::Notify;

use crate::core::Notice;

/// Unbounded multi-producer FIFO with blocking and async waits.
///
/// Producers never block. Host threads wait with [`MessageQueue::wait_timeout`];
/// the transport thread awaits [`MessageQueue::wait`].
pub struct MessageQueue<T> {
    items: Mutex<VecDeque<T>>,
    /// Wakes host threads blocked in `wait_timeout`.
    ready: Condvar,
    /// Wakes the transport task; holds at most one permit.
    notify: Notify,
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MessageQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<T> MessageQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// Append an item and wake any waiter.
    pub fn push(&self, item: T) {
        self.items.lock().push_back(item);
        self.ready.notify_all();
        self.notify.notify_one();
    }

    /// Take the oldest item.
    pub fn pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Take every queued item, oldest first.
    pub fn drain(&self) -> Vec<T> {
        let taken = std::mem::take(&mut *self.items.lock());
        taken.into()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Block the calling thread until the queue is non-empty or `timeout`
    /// elapses. Returns whether items are available. Nothing is consumed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock();
        while items.is_empty() {
            if self.ready.wait_until(&mut items, deadline).timed_out() {
                return !items.is_empty();
            }
        }
        true
    }

    /// Resolve once the queue is non-empty. Nothing is consumed.
    ///
    /// Cancel-safe: dropping the future loses no items.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if !self.is_empty() {
                return;
            }
            notified.await;
        }
    }
}

/// An entry on the `outbound` queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// The client transport has just connected; emitted once per connect,
    /// before any peer data.
    Ready,
    /// Bytes received from a peer, framing already stripped on the server.
    Payload(Bytes),
    /// Lifecycle notice.
    Notice(Notice),
}

impl Outbound {
    /// Payload bytes, if this entry carries any.
    pub fn as_payload(&self) -> Option<&Bytes> {
        match self {
            Outbound::Payload(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Notice, if this entry is one.
    pub fn as_notice(&self) -> Option<&Notice> {
        match self {
            Outbound::Notice(notice) => Some(notice),
            _ => None,
        }
    }
}

/// Host callback run on the transport thread after every outbound push.
pub type WakeHook = Arc<dyn Fn() + Send + Sync>;

struct BridgeInner {
    inbound: MessageQueue<Bytes>,
    outbound: MessageQueue<Outbound>,
    wake: RwLock<Option<WakeHook>>,
}

/// The pair of queues plus wake-up signal shared by host and transport.
///
/// Cheap to clone; all clones refer to the same queues.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("inbound", &self.inner.inbound.len())
            .field("outbound", &self.inner.outbound.len())
            .finish()
    }
}

impl Bridge {
    /// Create a bridge with empty queues and no wake hook.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                inbound: MessageQueue::new(),
                outbound: MessageQueue::new(),
                wake: RwLock::new(None),
            }),
        }
    }

    /// Host → transport queue.
    pub fn inbound(&self) -> &MessageQueue<Bytes> {
        &self.inner.inbound
    }

    /// Transport → host queue.
    pub fn outbound(&self) -> &MessageQueue<Outbound> {
        &self.inner.outbound
    }

    /// Queue raw bytes for transmission. Framing happens on the transport.
    pub fn push_inbound(&self, payload: impl Into<Bytes>) {
        self.inner.inbound.push(payload.into());
    }

    /// Take everything the transport has delivered so far.
    pub fn drain_outbound(&self) -> Vec<Outbound> {
        self.inner.outbound.drain()
    }

    /// Block until `outbound` is non-empty or `timeout` elapses.
    pub fn wait_outbound(&self, timeout: Duration) -> bool {
        self.inner.outbound.wait_timeout(timeout)
    }

    /// Install a callback fired after each outbound push, e.g. to schedule a
    /// drain on the host's own event loop. Replaces any previous hook.
    ///
    /// The hook runs on the transport thread and must not block.
    pub fn set_wake_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.inner.wake.write() = Some(Arc::new(hook));
    }

    /// Remove the wake hook.
    pub fn clear_wake_hook(&self) {
        *self.inner.wake.write() = None;
    }

    /// Push onto `outbound` and wake the host.
    pub(crate) fn emit(&self, item: Outbound) {
        self.inner.outbound.push(item);
        let hook = self.inner.wake.read().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Log a notice under `target` and deliver it to the host.
    pub(crate) fn notice(&self, target: &str, notice: Notice) {
        notice.log(target);
        self.emit(Outbound::Notice(notice));
    }
}
