//! Lifecycle notices emitted by the transport thread.
//!
//! Notices travel to the host on the `outbound` queue next to peer payloads,
//! and are mirrored to the `log` facade on the transport thread. The server
//! also sends one, framed, to a peer it rejects.

use serde::Serialize;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Routine lifecycle event (connect, disconnect, listening).
    Info,
    /// A single connection was lost or refused; the transport carries on.
    Warning,
    /// An attempt failed and will be retried.
    Error,
    /// The transport thread is exiting and will not retry.
    Fatal,
}

impl NoticeLevel {
    /// Map onto the `log` crate's levels.
    pub fn as_log_level(self) -> log::Level {
        match self {
            NoticeLevel::Info => log::Level::Info,
            NoticeLevel::Warning => log::Level::Warn,
            NoticeLevel::Error | NoticeLevel::Fatal => log::Level::Error,
        }
    }
}

/// A status message describing a connection lifecycle event.
///
/// Serializes as `{"type":"log","level":"...","msg":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "log")]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Human-readable description.
    #[serde(rename = "msg")]
    pub message: String,
}

impl Notice {
    /// Create a notice.
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Shorthand for an [`NoticeLevel::Info`] notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    /// Shorthand for a [`NoticeLevel::Warning`] notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    /// Shorthand for an [`NoticeLevel::Error`] notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    /// Shorthand for a [`NoticeLevel::Fatal`] notice.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Fatal, message)
    }

    /// Write this notice to the `log` facade under `target`.
    pub fn log(&self, target: &str) {
        log::log!(target: target, self.level.as_log_level(), "{}", self.message);
    }

    /// JSON body used when the notice is sent over the wire.
    pub fn to_json(&self) -> Vec<u8> {
        // A struct of a unit enum and a String always serializes.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_wire_json() {
        let notice = Notice::error("Connection rejected: too many connections (current=2, max=2)");
        let value: serde_json::Value = serde_json::from_slice(&notice.to_json()).unwrap();

        assert_eq!(value["type"], "log");
        assert_eq!(value["level"], "error");
        assert_eq!(
            value["msg"],
            "Connection rejected: too many connections (current=2, max=2)"
        );
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(NoticeLevel::Info.as_log_level(), log::Level::Info);
        assert_eq!(NoticeLevel::Warning.as_log_level(), log::Level::Warn);
        assert_eq!(NoticeLevel::Fatal.as_log_level(), log::Level::Error);
        assert!(NoticeLevel::Fatal > NoticeLevel::Warning);
    }

    #[test]
    fn test_display() {
        assert_eq!(Notice::info("Listening").to_string(), "[Info] Listening");
    }
}
