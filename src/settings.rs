//! Transport settings.
//!
//! Settings are validated once and immutable afterwards. There are two ways in:
//!
//! - **Builders** ([`ServerSettings::builder`], [`ClientSettings::builder`]) are
//!   strict: any out-of-range value is a [`ConfigError`].
//! - **Configuration documents** ([`TransportSettings::from_json_str`]) follow
//!   the deployment format. Missing keys take defaults, and numbers below their
//!   minimum are raised to it with a warning, so a hand-edited file still
//!   starts. Malformed values (unknown role, bad port, empty host) are errors.
//!
//! ```json
//! { "socket": {
//!     "role": "client",
//!     "server": { "host": "10.0.0.2", "port": 30000 },
//!     "client": { "port": -1, "reconnect_interval": 5 } } }
//! ```
//!
//! A client without `remote_host`/`remote_port` dials the `server` host/port.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::core::{
    ConfigError, DEFAULT_CONNECT_TIMEOUT, DEFAULT_FLUSH_TIMEOUT, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_POLL_INTERVAL, DEFAULT_READ_DEADLINE,
    DEFAULT_RECONNECT_INTERVAL, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, MIN_MAX_CONNECTIONS,
    MIN_MAX_MESSAGE_SIZE, MIN_RECONNECT_INTERVAL, SatlinkError,
};

/// Which side of the link this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Hub: listens and accepts several satellites.
    #[default]
    Server,
    /// Satellite: keeps one upstream connection alive.
    Client,
}

impl Role {
    /// Lowercase name as used in configuration documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Role::Server),
            "client" => Ok(Role::Client),
            _ => Err(ConfigError::UnknownRole(s.to_string())),
        }
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// Hub-side settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    host: String,
    port: u16,
    max_connections: usize,
    max_message_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ServerSettings {
    /// Start a strict builder from the defaults.
    pub fn builder() -> ServerSettingsBuilder {
        ServerSettingsBuilder {
            settings: Self::default(),
        }
    }

    /// Bind host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Bind port (`0` = OS-assigned).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Simultaneous peers before newcomers are rejected.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Largest frame body accepted from a peer.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// `host:port` as bound.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_host("server.host", &self.host)?;
        require_min(
            "server.max_connections",
            self.max_connections as u64,
            MIN_MAX_CONNECTIONS as u64,
        )?;
        require_min(
            "server.max_message_size",
            self.max_message_size as u64,
            MIN_MAX_MESSAGE_SIZE as u64,
        )
    }
}

/// Builder for [`ServerSettings`].
#[derive(Debug)]
pub struct ServerSettingsBuilder {
    settings: ServerSettings,
}

impl ServerSettingsBuilder {
    /// Set the bind host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.settings.host = host.into();
        self
    }

    /// Set the bind port.
    pub fn port(mut self, port: u16) -> Self {
        self.settings.port = port;
        self
    }

    /// Set the peer limit (at least 1).
    pub fn max_connections(mut self, max: usize) -> Self {
        self.settings.max_connections = max;
        self
    }

    /// Set the frame body limit (at least 1024).
    pub fn max_message_size(mut self, max: usize) -> Self {
        self.settings.max_message_size = max;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<ServerSettings, ConfigError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Satellite-side settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    remote_host: String,
    remote_port: u16,
    local_port: Option<u16>,
    reconnect_interval: Duration,
    max_message_size: Option<usize>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            remote_host: DEFAULT_SERVER_HOST.to_string(),
            remote_port: DEFAULT_SERVER_PORT,
            local_port: None,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_message_size: None,
        }
    }
}

impl ClientSettings {
    /// Start a strict builder from the defaults.
    pub fn builder() -> ClientSettingsBuilder {
        ClientSettingsBuilder {
            settings: Self::default(),
        }
    }

    /// Hub host to dial.
    pub fn remote_host(&self) -> &str {
        &self.remote_host
    }

    /// Hub port to dial.
    pub fn remote_port(&self) -> u16 {
        self.remote_port
    }

    /// Fixed local port, or `None` to let the OS choose.
    pub fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    /// Delay between connection attempts.
    pub fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    /// Largest payload this side will frame, if limited.
    pub fn max_message_size(&self) -> Option<usize> {
        self.max_message_size
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_host("client.remote_host", &self.remote_host)?;
        if self.reconnect_interval < MIN_RECONNECT_INTERVAL {
            return Err(ConfigError::BelowMinimum {
                field: "client.reconnect_interval",
                min: MIN_RECONNECT_INTERVAL.as_secs(),
                value: self.reconnect_interval.as_secs(),
            });
        }
        if let Some(max) = self.max_message_size {
            require_min(
                "client.max_message_size",
                max as u64,
                MIN_MAX_MESSAGE_SIZE as u64,
            )?;
        }
        Ok(())
    }
}

/// Builder for [`ClientSettings`].
#[derive(Debug)]
pub struct ClientSettingsBuilder {
    settings: ClientSettings,
}

impl ClientSettingsBuilder {
    /// Set the hub host.
    pub fn remote_host(mut self, host: impl Into<String>) -> Self {
        self.settings.remote_host = host.into();
        self
    }

    /// Set the hub port.
    pub fn remote_port(mut self, port: u16) -> Self {
        self.settings.remote_port = port;
        self
    }

    /// Pin the local port (`None` = OS chooses).
    pub fn local_port(mut self, port: Option<u16>) -> Self {
        self.settings.local_port = port;
        self
    }

    /// Set the reconnect delay (at least one second).
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.settings.reconnect_interval = interval;
        self
    }

    /// Limit outgoing payloads (at least 1024 bytes).
    pub fn max_message_size(mut self, max: Option<usize>) -> Self {
        self.settings.max_message_size = max;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<ClientSettings, ConfigError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

// =============================================================================
// TIMING
// =============================================================================

/// Transport tunables. Defaults suit a LAN or loopback link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Back-off after a failed accept, and nothing else.
    ///
    /// Both transports are event driven: reads, queued payloads and stop
    /// requests wake them directly, so there is no polling cycle to tune. The
    /// name stays for compatibility with `timing.poll_interval_ms` documents.
    pub poll_interval: Duration,
    /// Window for the rest of a header or body once its first byte arrived.
    pub read_deadline: Duration,
    /// Bound for one client connect attempt, resolution included.
    pub connect_timeout: Duration,
    /// Budget for flushing queued writes on shutdown or rejection.
    pub flush_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_deadline: DEFAULT_READ_DEADLINE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

impl Timing {
    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("timing.poll_interval", self.poll_interval),
            ("timing.read_deadline", self.read_deadline),
            ("timing.connect_timeout", self.connect_timeout),
            ("timing.flush_timeout", self.flush_timeout),
        ];
        for (field, value) in fields {
            if value.is_zero() {
                return Err(ConfigError::BelowMinimum { field, min: 1, value: 0 });
            }
        }
        Ok(())
    }
}

// =============================================================================
// TRANSPORT SETTINGS
// =============================================================================

/// Complete, validated configuration for one transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    role: Role,
    server: ServerSettings,
    client: ClientSettings,
    timing: Timing,
}

impl TransportSettings {
    /// Hub role.
    pub fn server(server: ServerSettings) -> Self {
        Self {
            role: Role::Server,
            server,
            client: ClientSettings::default(),
            timing: Timing::default(),
        }
    }

    /// Satellite role.
    pub fn client(client: ClientSettings) -> Self {
        Self {
            role: Role::Client,
            server: ServerSettings::default(),
            client,
            timing: Timing::default(),
        }
    }

    /// Replace the timing tunables.
    pub fn with_timing(mut self, timing: Timing) -> Result<Self, ConfigError> {
        timing.validate()?;
        self.timing = timing;
        Ok(self)
    }

    /// Selected role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Hub settings (meaningful for [`Role::Server`]).
    pub fn server_settings(&self) -> &ServerSettings {
        &self.server
    }

    /// Satellite settings (meaningful for [`Role::Client`]).
    pub fn client_settings(&self) -> &ClientSettings {
        &self.client
    }

    /// Timing tunables.
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Parse a configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let doc: RawDocument = serde_json::from_str(json)?;
        doc.socket.resolve()
    }

    /// Build from an already parsed configuration document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let doc: RawDocument = serde_json::from_value(value)?;
        doc.socket.resolve()
    }

    /// Read and parse a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SatlinkError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&json)?)
    }
}

// =============================================================================
// CONFIGURATION DOCUMENT
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDocument {
    socket: RawSocket,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSocket {
    role: Option<String>,
    server: RawServer,
    client: RawClient,
    timing: RawTiming,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawServer {
    host: Option<String>,
    port: Option<i64>,
    max_connections: Option<i64>,
    max_message_size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawClient {
    remote_host: Option<String>,
    remote_port: Option<i64>,
    /// Local bind port; `-1`, `0` or `"auto"` mean OS-chosen.
    port: Option<RawPort>,
    reconnect_interval: Option<i64>,
    max_message_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPort {
    Number(i64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTiming {
    poll_interval_ms: Option<u64>,
    read_deadline_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
    flush_timeout_ms: Option<u64>,
}

impl RawSocket {
    fn resolve(self) -> Result<TransportSettings, ConfigError> {
        let role = match self.role.as_deref() {
            Some(role) => role.parse()?,
            None => Role::default(),
        };
        let server = self.server.resolve()?;
        let client = self.client.resolve(&server)?;
        let timing = self.timing.resolve();

        let settings = TransportSettings {
            role,
            server,
            client,
            timing,
        };
        settings.server.validate()?;
        settings.client.validate()?;
        settings.timing.validate()?;
        Ok(settings)
    }
}

impl RawServer {
    fn resolve(self) -> Result<ServerSettings, ConfigError> {
        let defaults = ServerSettings::default();
        Ok(ServerSettings {
            host: self.host.unwrap_or(defaults.host),
            port: match self.port {
                Some(port) => port_from("server.port", port)?,
                None => defaults.port,
            },
            max_connections: self.max_connections.map_or(defaults.max_connections, |v| {
                raise_to("server.max_connections", v, MIN_MAX_CONNECTIONS as u64) as usize
            }),
            max_message_size: self.max_message_size.map_or(defaults.max_message_size, |v| {
                raise_to("server.max_message_size", v, MIN_MAX_MESSAGE_SIZE as u64) as usize
            }),
        })
    }
}

impl RawClient {
    fn resolve(self, server: &ServerSettings) -> Result<ClientSettings, ConfigError> {
        let defaults = ClientSettings::default();
        let local_port = match self.port {
            None => None,
            Some(RawPort::Number(-1 | 0)) => None,
            Some(RawPort::Number(port)) => Some(port_from("client.port", port)?),
            Some(RawPort::Text(text)) if text.trim().eq_ignore_ascii_case("auto") => None,
            Some(RawPort::Text(text)) => match text.trim().parse::<i64>() {
                Ok(-1 | 0) => None,
                Ok(port) => Some(port_from("client.port", port)?),
                Err(_) => {
                    return Err(ConfigError::InvalidPort {
                        field: "client.port",
                        value: text,
                    });
                }
            },
        };

        Ok(ClientSettings {
            remote_host: self.remote_host.unwrap_or_else(|| server.host.clone()),
            remote_port: match self.remote_port {
                Some(port) => port_from("client.remote_port", port)?,
                None => server.port,
            },
            local_port,
            reconnect_interval: self.reconnect_interval.map_or(
                defaults.reconnect_interval,
                |secs| {
                    Duration::from_secs(raise_to(
                        "client.reconnect_interval",
                        secs,
                        MIN_RECONNECT_INTERVAL.as_secs(),
                    ))
                },
            ),
            max_message_size: self.max_message_size.map(|v| {
                raise_to("client.max_message_size", v, MIN_MAX_MESSAGE_SIZE as u64) as usize
            }),
        })
    }
}

impl RawTiming {
    fn resolve(self) -> Timing {
        let defaults = Timing::default();
        let ms = |field: &'static str, value: Option<u64>, default: Duration| {
            value.map_or(default, |v| {
                Duration::from_millis(raise_to(field, v.min(i64::MAX as u64) as i64, 1))
            })
        };
        Timing {
            poll_interval: ms("timing.poll_interval_ms", self.poll_interval_ms, defaults.poll_interval),
            read_deadline: ms("timing.read_deadline_ms", self.read_deadline_ms, defaults.read_deadline),
            connect_timeout: ms(
                "timing.connect_timeout_ms",
                self.connect_timeout_ms,
                defaults.connect_timeout,
            ),
            flush_timeout: ms("timing.flush_timeout_ms", self.flush_timeout_ms, defaults.flush_timeout),
        }
    }
}

fn port_from(field: &'static str, value: i64) -> Result<u16, ConfigError> {
    u16::try_from(value).map_err(|_| ConfigError::InvalidPort {
        field,
        value: value.to_string(),
    })
}

fn raise_to(field: &'static str, value: i64, min: u64) -> u64 {
    match u64::try_from(value) {
        Ok(v) if v >= min => v,
        _ => {
            log::warn!("{field}={value} is below the minimum, using {min}");
            min
        }
    }
}

fn require_host(field: &'static str, host: &str) -> Result<(), ConfigError> {
    if host.trim().is_empty() {
        return Err(ConfigError::EmptyHost { field });
    }
    Ok(())
}

fn require_min(field: &'static str, value: u64, min: u64) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::BelowMinimum { field, min, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("server".parse::<Role>().unwrap(), Role::Server);
        assert_eq!(" Client ".parse::<Role>().unwrap(), Role::Client);
        assert_eq!(
            "relay".parse::<Role>().unwrap_err(),
            ConfigError::UnknownRole("relay".into())
        );
        assert_eq!(Role::Client.to_string(), "client");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = TransportSettings::from_json_str("{}").unwrap();
        assert_eq!(settings.role(), Role::Server);

        let server = settings.server_settings();
        assert_eq!(server.host(), "127.0.0.1");
        assert_eq!(server.port(), 300);
        assert_eq!(server.max_connections(), 5);
        assert_eq!(server.max_message_size(), 1_048_576);

        let client = settings.client_settings();
        assert_eq!(client.local_port(), None);
        assert_eq!(client.reconnect_interval(), Duration::from_secs(5));
        assert_eq!(*settings.timing(), Timing::default());
    }

    #[test]
    fn test_full_document() {
        let settings = TransportSettings::from_json_str(
            r#"{ "socket": {
                "role": "client",
                "server": { "host": "10.0.0.2", "port": 30000,
                            "max_connections": 2, "max_message_size": 4096 },
                "client": { "remote_host": "hub.lan", "remote_port": 30001,
                            "port": 40000, "reconnect_interval": 2 },
                "timing": { "read_deadline_ms": 50, "poll_interval_ms": 5 } } }"#,
        )
        .unwrap();

        assert_eq!(settings.role(), Role::Client);
        assert_eq!(settings.server_settings().bind_addr(), "10.0.0.2:30000");
        assert_eq!(settings.server_settings().max_connections(), 2);

        let client = settings.client_settings();
        assert_eq!(client.remote_host(), "hub.lan");
        assert_eq!(client.remote_port(), 30001);
        assert_eq!(client.local_port(), Some(40000));
        assert_eq!(client.reconnect_interval(), Duration::from_secs(2));

        assert_eq!(settings.timing().read_deadline, Duration::from_millis(50));
        assert_eq!(settings.timing().poll_interval, Duration::from_millis(5));
        assert_eq!(settings.timing().connect_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_timing_defaults() {
        let timing = Timing::default();
        assert_eq!(timing.poll_interval, Duration::from_millis(20));
        assert_eq!(timing.read_deadline, Duration::from_millis(200));
        assert_eq!(timing.flush_timeout, Duration::from_millis(200));
        assert_eq!(TransportSettings::from_json_str("{}").unwrap().timing(), &timing);
    }

    #[test]
    fn test_client_target_defaults_to_server() {
        let settings = TransportSettings::from_json_str(
            r#"{ "socket": { "role": "client", "server": { "host": "10.1.1.1", "port": 19132 } } }"#,
        )
        .unwrap();
        assert_eq!(settings.client_settings().remote_host(), "10.1.1.1");
        assert_eq!(settings.client_settings().remote_port(), 19132);
    }

    #[test]
    fn test_document_clamps_minimums() {
        let settings = TransportSettings::from_json_str(
            r#"{ "socket": {
                "server": { "max_connections": 0, "max_message_size": 10 },
                "client": { "reconnect_interval": -3 } } }"#,
        )
        .unwrap();
        assert_eq!(settings.server_settings().max_connections(), 1);
        assert_eq!(settings.server_settings().max_message_size(), 1024);
        assert_eq!(settings.client_settings().reconnect_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_local_port_sentinels() {
        for port in [r#"-1"#, r#"0"#, r#""auto""#, r#""AUTO""#, r#""-1""#] {
            let json = format!(r#"{{ "socket": {{ "client": {{ "port": {port} }} }} }}"#);
            let settings = TransportSettings::from_json_str(&json).unwrap();
            assert_eq!(settings.client_settings().local_port(), None, "port {port}");
        }

        let settings =
            TransportSettings::from_json_str(r#"{ "socket": { "client": { "port": "40001" } } }"#)
                .unwrap();
        assert_eq!(settings.client_settings().local_port(), Some(40001));
    }

    #[test]
    fn test_document_rejects_malformed() {
        let err = TransportSettings::from_json_str(r#"{ "socket": { "role": "peer" } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRole(_)));

        let err = TransportSettings::from_json_str(r#"{ "socket": { "server": { "port": 70000 } } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { field: "server.port", .. }));

        let err = TransportSettings::from_json_str(r#"{ "socket": { "client": { "port": -5 } } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { field: "client.port", .. }));

        let err = TransportSettings::from_json_str(r#"{ "socket": { "server": { "host": " " } } }"#)
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptyHost { field: "server.host" });

        let err = TransportSettings::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_value() {
        let value = serde_json::json!({ "socket": { "role": "server", "server": { "port": 0 } } });
        let settings = TransportSettings::from_value(value).unwrap();
        assert_eq!(settings.server_settings().port(), 0);
    }

    #[test]
    fn test_builders_are_strict() {
        let server = ServerSettings::builder()
            .host("0.0.0.0")
            .port(30000)
            .max_connections(2)
            .build()
            .unwrap();
        assert_eq!(server.bind_addr(), "0.0.0.0:30000");

        let err = ServerSettings::builder().max_connections(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::BelowMinimum { field: "server.max_connections", .. }));

        let err = ServerSettings::builder().max_message_size(512).build().unwrap_err();
        assert!(matches!(err, ConfigError::BelowMinimum { min: 1024, value: 512, .. }));

        let err = ClientSettings::builder()
            .reconnect_interval(Duration::from_millis(500))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::BelowMinimum { field: "client.reconnect_interval", .. }));

        let err = ClientSettings::builder().remote_host("").build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyHost { field: "client.remote_host" });
    }

    #[test]
    fn test_with_timing_validates() {
        let settings = TransportSettings::server(ServerSettings::default());
        let timing = Timing {
            read_deadline: Duration::ZERO,
            ..Timing::default()
        };
        assert!(settings.clone().with_timing(timing).is_err());

        let timing = Timing {
            read_deadline: Duration::from_millis(50),
            ..Timing::default()
        };
        let settings = settings.with_timing(timing).unwrap();
        assert_eq!(settings.timing().read_deadline, Duration::from_millis(50));
    }
}
